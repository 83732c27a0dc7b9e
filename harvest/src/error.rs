// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, time::Duration};

use harvest_core::SinkError;

/// Why delivering one snapshot failed. The snapshot is dropped either way.
#[derive(Debug)]
pub enum SendError {
    /// The sink reported a failure
    Sink(SinkError),
    /// The sink did not finish within the configured send timeout
    Timeout(Duration),
    /// The reporter was shut down before the delivery could run
    ShutDown,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sink(err) => fmt::Display::fmt(err, f),
            Self::Timeout(timeout) => write!(f, "metrics delivery timed out after {timeout:?}"),
            Self::ShutDown => f.write_str("metric reporter is shut down"),
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sink(err) => Some(err),
            Self::Timeout(_) | Self::ShutDown => None,
        }
    }
}

impl From<SinkError> for SendError {
    fn from(value: SinkError) -> Self {
        Self::Sink(value)
    }
}

/// Invalid reporter configuration. Reported by
/// [`MetricReporterBuilder::build`](crate::MetricReporterBuilder::build) so that a
/// misconfigured sink stops startup instead of silently dropping metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// The sink reported a zero delivery interval
    ZeroInterval,
    /// The send timeout is zero, so every delivery would fail
    ZeroSendTimeout,
    /// A sink was configured outside of a tokio runtime
    NoRuntime,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInterval => f.write_str("sink delivery interval must be greater than zero"),
            Self::ZeroSendTimeout => f.write_str("send timeout must be greater than zero"),
            Self::NoRuntime => {
                f.write_str("a metric reporter with a sink must be built inside a tokio runtime")
            }
        }
    }
}

impl std::error::Error for BuildError {}
