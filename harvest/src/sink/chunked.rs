// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use harvest_core::{Sink, SinkError, Stats};

use super::ConfigError;

/// Splits every batch into sends of at most `max_items` values, for backends that limit the
/// size of a single request.
///
/// Chunks are sent in order and share the original batch time. The first failing chunk aborts
/// the batch; chunks already sent stay delivered.
#[derive(Debug, Clone)]
pub struct Chunked<S> {
    inner: S,
    max_items: usize,
}

impl<S> Chunked<S> {
    /// Wrap `inner`, sending at most `max_items` values per call
    pub fn new(inner: S, max_items: usize) -> Result<Self, ConfigError> {
        if max_items == 0 {
            return Err(ConfigError::ZeroBatchLimit);
        }
        Ok(Self { inner, max_items })
    }
}

impl<S: Sink> Sink for Chunked<S> {
    fn interval(&self) -> Duration {
        self.inner.interval()
    }

    async fn send(&self, stats: Stats) -> Result<(), SinkError> {
        for chunk in stats.chunks(self.max_items) {
            self.inner.send(chunk).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::Duration, time::UNIX_EPOCH};

    use assert2::{check, let_assert};
    use harvest_core::{Datum, Sink, Stats};

    use super::Chunked;
    use crate::{sink::ConfigError, test_util::TestSink};

    fn batch(len: i64) -> Stats {
        let mut stats = Stats::new(UNIX_EPOCH);
        stats.metrics = (0..len).map(|i| Datum::new(format!("m{i}"), "", i)).collect();
        stats
    }

    #[tokio::test]
    async fn splits_into_limited_calls() {
        let inner = TestSink::new(Duration::from_secs(60));
        let sink = Chunked::new(inner.clone(), 30).unwrap();
        check!(sink.interval() == Duration::from_secs(60));

        sink.send(batch(40)).await.unwrap();

        let sent = inner.take();
        check!(sent.iter().map(Stats::len).collect::<Vec<_>>() == vec![30, 10]);
        let names: HashSet<_> = sent
            .iter()
            .flat_map(|s| s.metrics.iter().map(|d| d.name.clone()))
            .collect();
        check!(names.len() == 40);
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let inner = TestSink::new(Duration::from_secs(60));
        inner.fail_next(1);
        let sink = Chunked::new(inner.clone(), 10).unwrap();

        check!(sink.send(batch(25)).await.is_err());
        check!(inner.calls() == 1);
        check!(inner.take().is_empty());
    }

    #[test]
    fn rejects_zero_limit() {
        let_assert!(Err(err) = Chunked::new(TestSink::default(), 0));
        check!(err == ConfigError::ZeroBatchLimit);
    }
}
