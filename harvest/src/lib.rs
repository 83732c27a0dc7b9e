// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use harvest_core::{
    BoxSink, Datum, Entry, Method, Metric, MetricDef, Sink, SinkError, Slot, Stats,
};
pub use harvest_timesource::TimeSource;

pub use crate::error::{BuildError, SendError};
pub use crate::registry::Registry;
pub use crate::reporter::{MetricReporter, MetricReporterBuilder};

mod error;
pub mod naming;
mod registry;
mod reporter;
pub mod sink;

/// Test utilities for code that records or delivers metrics.
#[cfg(any(test, feature = "test-util"))]
pub mod test_util;
