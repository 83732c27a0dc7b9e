// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The batch shape handed to a [`Sink`](crate::Sink).

use std::time::SystemTime;

use crate::{CowStr, Entry};

/// One value in a batch
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Datum {
    /// Metric category
    pub name: CowStr,
    /// Extra dimension such as an API name, empty for the aggregate
    pub tag: String,
    /// Computed value
    pub value: i64,
}

impl Datum {
    /// Create a datum
    pub fn new(name: impl Into<CowStr>, tag: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            value,
        }
    }
}

impl From<Entry> for Datum {
    fn from(entry: Entry) -> Self {
        Self {
            name: entry.category,
            tag: entry.tag,
            value: entry.value,
        }
    }
}

/// Everything drained in one snapshot
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Stats {
    /// When the snapshot was taken
    pub time: SystemTime,
    /// Values in registration order, each metric's aggregate before its tags
    pub metrics: Vec<Datum>,
}

impl Stats {
    /// Create an empty batch
    pub fn new(time: SystemTime) -> Self {
        Self {
            time,
            metrics: Vec::new(),
        }
    }

    /// Number of values in the batch
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the batch holds no values
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Split into batches of at most `max_items` values sharing this batch's time.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is zero.
    pub fn chunks(&self, max_items: usize) -> impl Iterator<Item = Stats> + '_ {
        self.metrics.chunks(max_items).map(|chunk| Stats {
            time: self.time,
            metrics: chunk.to_vec(),
        })
    }
}

impl Extend<Entry> for Stats {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        self.metrics.extend(iter.into_iter().map(Datum::from));
    }
}
