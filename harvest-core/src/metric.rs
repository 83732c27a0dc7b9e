// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::{MetricDef, Slot};

/// Handle that instrumentation code records samples through.
///
/// A handle is cheap to clone. A disabled handle ([`Metric::disabled`], also the
/// [`Default`]) accepts every call and does nothing, so call sites never need to care whether
/// metrics are configured.
///
/// ```
/// use harvest_core::Metric;
///
/// let metric = Metric::disabled();
/// metric.add(1);
/// metric.add_for_tag("/foo", 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Metric {
    slot: Option<Arc<Slot>>,
}

impl Metric {
    /// Handle recording into `slot`
    pub fn new(slot: Arc<Slot>) -> Self {
        Self { slot: Some(slot) }
    }

    /// Handle that drops every sample
    pub fn disabled() -> Self {
        Self { slot: None }
    }

    /// Whether samples go anywhere
    pub fn is_enabled(&self) -> bool {
        self.slot.is_some()
    }

    /// The definition behind this handle, if enabled
    pub fn def(&self) -> Option<&MetricDef> {
        self.slot.as_deref().map(Slot::def)
    }

    /// Record `value` into the metric
    pub fn add(&self, value: i64) {
        if let Some(slot) = &self.slot {
            slot.record(value);
        }
    }

    /// Record `value` for `tag`.
    ///
    /// The value is also recorded into the untagged metric, there is no need to call
    /// [`Metric::add`] as well.
    pub fn add_for_tag(&self, tag: &str, value: i64) {
        if let Some(slot) = &self.slot {
            slot.record_for_tag(tag, value);
        }
    }
}

impl From<Arc<Slot>> for Metric {
    fn from(slot: Arc<Slot>) -> Self {
        Self::new(slot)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, UNIX_EPOCH},
    };

    use assert2::check;

    use super::Metric;
    use crate::{MetricDef, Slot};

    #[test]
    fn disabled_handle_is_noop() {
        let metric = Metric::default();
        check!(!metric.is_enabled());
        check!(metric.def().is_none());
        metric.add(1);
        metric.add_for_tag("tag", 1);
    }

    #[test]
    fn records_into_slot() {
        let slot = Arc::new(Slot::new(MetricDef::maximum("max_proctime"), UNIX_EPOCH));
        let metric = Metric::from(slot.clone());
        check!(metric.def().map(MetricDef::category) == Some("max_proctime"));

        for v in [4, 100, 17] {
            metric.clone().add(v);
        }
        let entries = slot.drain(UNIX_EPOCH + Duration::from_secs(1));
        check!(entries.len() == 1);
        check!(entries[0].value == 100);
    }
}
