// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! [`TestSink`] records every batch it is handed so tests can inspect what a reporter delivered.
//!
//! This requires that the `test-util` feature be enabled.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use harvest_core::{Sink, SinkError, Stats};

use crate::sink::DEFAULT_SEND_INTERVAL;

/// A sink that keeps delivered batches in memory.
///
/// Clones share the same state, so keep one clone for inspection and hand the other to the
/// reporter.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use harvest::{MetricDef, MetricReporter, test_util::TestSink};
///
/// let sink = TestSink::default();
/// let reporter = MetricReporter::builder().sink(sink.clone()).build().unwrap();
/// reporter.define(MetricDef::sum("requests")).add(3);
/// reporter.flush().await;
///
/// let sent = sink.take();
/// assert_eq!(sent[0].metrics[0].value, 3);
/// # reporter.shutdown().await;
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TestSink {
    interval: Duration,
    delay: Option<Duration>,
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    sent: Vec<Stats>,
    calls: usize,
    in_flight: usize,
    max_in_flight: usize,
    fail_next: usize,
}

impl Default for TestSink {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_INTERVAL)
    }
}

impl TestSink {
    /// A sink that asks to be called every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            delay: None,
            state: Default::default(),
        }
    }

    /// Sleep for `delay` inside every send, before recording the batch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Remove and return every batch delivered so far
    pub fn take(&self) -> Vec<Stats> {
        std::mem::take(&mut self.state.lock().unwrap().sent)
    }

    /// How many times `send` was called, including failed calls
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    /// The most sends that were ever running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    /// Make the next `n` sends fail without recording their batch
    pub fn fail_next(&self, n: usize) {
        self.state.lock().unwrap().fail_next = n;
    }
}

impl Sink for TestSink {
    fn interval(&self) -> Duration {
        self.interval
    }

    async fn send(&self, stats: Stats) -> Result<(), SinkError> {
        {
            let mut state = self.state.lock().unwrap();
            state.calls += 1;
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.in_flight -= 1;
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(SinkError::new("injected failure"));
        }
        state.sent.push(stats);
        Ok(())
    }
}
