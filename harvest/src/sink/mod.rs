// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Ready-made [`Sink`](crate::Sink) implementations and adapters.

use std::{fmt, time::Duration};

pub use chunked::Chunked;
#[cfg(feature = "json")]
pub use json_lines::JsonLines;

mod chunked;
#[cfg(feature = "json")]
mod json_lines;

/// How often sinks in this module deliver unless configured otherwise.
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(60);

/// Invalid sink configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A batch limit of zero would never deliver anything
    ZeroBatchLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroBatchLimit => f.write_str("batch limit must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}
