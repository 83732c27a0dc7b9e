// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use crate::CowStr;

/// How the samples recorded within one period are folded into a single value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Method {
    /// Total of all samples
    #[default]
    Sum,
    /// Integer mean of all samples
    Average,
    /// Largest sample
    Maximum,
}

/// Definition of a metric: its category name, aggregation [`Method`] and optional rate window.
///
/// For a rate such as QPS use [`Method::Sum`] with a one second window:
///
/// ```
/// use std::time::Duration;
/// use harvest_core::MetricDef;
///
/// let qps = MetricDef::sum("api_qps").per(Duration::from_secs(1));
/// assert_eq!(qps.window(), Some(Duration::from_secs(1)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct MetricDef {
    category: CowStr,
    method: Method,
    #[cfg_attr(feature = "serde", serde(default))]
    window: Option<Duration>,
}

impl MetricDef {
    /// Create a definition without rate normalization
    pub fn new(category: impl Into<CowStr>, method: Method) -> Self {
        Self {
            category: category.into(),
            method,
            window: None,
        }
    }

    /// Shorthand for [`Method::Sum`]
    pub fn sum(category: impl Into<CowStr>) -> Self {
        Self::new(category, Method::Sum)
    }

    /// Shorthand for [`Method::Average`]
    pub fn average(category: impl Into<CowStr>) -> Self {
        Self::new(category, Method::Average)
    }

    /// Shorthand for [`Method::Maximum`]
    pub fn maximum(category: impl Into<CowStr>) -> Self {
        Self::new(category, Method::Maximum)
    }

    /// Report the value as a rate per `window` of the actually elapsed period.
    ///
    /// Ignored for [`Method::Maximum`]. A zero window disables normalization.
    pub fn per(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// The category name
    pub fn category(&self) -> &str {
        &self.category
    }

    pub(crate) fn category_cow(&self) -> &CowStr {
        &self.category
    }

    /// The aggregation method
    pub fn method(&self) -> Method {
        self.method
    }

    /// The rate normalization window, if any
    pub fn window(&self) -> Option<Duration> {
        self.window
    }
}
