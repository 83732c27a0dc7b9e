// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    io::Write,
    sync::{Mutex, PoisonError},
    time::{Duration, UNIX_EPOCH},
};

use harvest_core::{Sink, SinkError, Stats};
use serde::Serialize;

use super::DEFAULT_SEND_INTERVAL;
use crate::naming::format_name;

#[derive(Serialize)]
struct Line<'a> {
    timestamp: u64,
    name: &'a str,
    value: i64,
}

/// Writes every value as one JSON object per line, e.g.
/// `{"timestamp":1700000000000,"name":"svc_api_count-foo_bar","value":3}`.
///
/// `timestamp` is the snapshot time in milliseconds since the epoch and `name` is built with
/// [`format_name`] from the configured prefix, the category and the tag. The writer is
/// flushed after every batch.
#[derive(Debug)]
pub struct JsonLines<W> {
    writer: Mutex<W>,
    interval: Duration,
    prefix: String,
}

impl<W: Write + Send> JsonLines<W> {
    /// Write to `writer` every [`DEFAULT_SEND_INTERVAL`]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            interval: DEFAULT_SEND_INTERVAL,
            prefix: String::new(),
        }
    }

    /// Change the delivery interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Prepend `prefix` to every name as-is
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Sink for JsonLines<W> {
    fn interval(&self) -> Duration {
        self.interval
    }

    async fn send(&self, stats: Stats) -> Result<(), SinkError> {
        let timestamp = stats
            .time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        for datum in &stats.metrics {
            let name = format_name(&self.prefix, &datum.name, &datum.tag);
            let line = Line {
                timestamp,
                name: &name,
                value: datum.value,
            };
            serde_json::to_writer(&mut *writer, &line).map_err(SinkError::new)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}
