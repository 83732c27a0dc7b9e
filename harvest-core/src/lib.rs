// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use crate::counter::Counter;
pub use crate::def::{Method, MetricDef};
pub use crate::metric::Metric;
pub use crate::sink::{BoxSink, SendFuture, Sink, SinkError};
pub use crate::slot::{Entry, Slot};
pub use crate::stats::{Datum, Stats};

pub(crate) type CowStr = std::borrow::Cow<'static, str>;

pub mod counter;
mod def;
mod metric;
pub mod sink;
pub mod slot;
pub mod stats;
