// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use harvest_core::{Metric, MetricDef, Slot, Stats};
use harvest_timesource::TimeSource;

/// The set of all defined metrics.
///
/// Metrics are expected to be defined once at startup; the slot list is behind a mutex that
/// recording never touches. [`Registry::snapshot`] drains every slot in definition order.
#[derive(Debug, Default)]
pub struct Registry {
    slots: Mutex<Vec<Arc<Slot>>>,
    time_source: TimeSource,
}

impl Registry {
    /// Create an empty registry using the system clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry stamping generations and snapshots from `time_source`
    pub fn with_time_source(time_source: TimeSource) -> Self {
        Self {
            slots: Mutex::default(),
            time_source,
        }
    }

    /// Define a new metric and return the handle to record into it.
    ///
    /// Defining the same category twice creates two independent metrics.
    pub fn define(&self, def: MetricDef) -> Metric {
        let slot = Arc::new(Slot::new(def, self.time_source.system_time()));
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(slot.clone());
        Metric::new(slot)
    }

    /// Number of defined metrics
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no metric was defined yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain every metric into one batch stamped `now`.
    ///
    /// Metrics appear in definition order, each with its aggregate first and its tags after.
    /// Metrics without samples since the previous snapshot are left out.
    pub fn snapshot(&self, now: SystemTime) -> Stats {
        let mut stats = Stats::new(now);
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        for slot in slots.iter() {
            stats.extend(slot.drain(now));
        }
        stats
    }

    /// [`Registry::snapshot`] at the current time of the registry's clock
    pub fn snapshot_now(&self) -> Stats {
        self.snapshot(self.time_source.system_time())
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use assert2::check;
    use harvest_core::{Datum, MetricDef, Stats};
    use harvest_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource};

    use super::Registry;

    #[test]
    fn snapshot_matches_definitions() {
        let clock = ManuallyAdvancedTimeSource::at_time(UNIX_EPOCH);
        let registry = Registry::with_time_source(TimeSource::custom(clock.clone()));

        let proctime = registry.define(MetricDef::average("proctime"));
        let max_proctime = registry.define(MetricDef::maximum("max_proctime"));
        let qps = registry.define(MetricDef::sum("api_qps").per(Duration::from_secs(1)));
        let api_count = registry.define(MetricDef::sum("api_count"));
        check!(registry.len() == 4);

        const URI: &str = "/foo/bar";
        for d in 1..=100 {
            proctime.add_for_tag(URI, d);
            max_proctime.add(d);
            qps.add_for_tag(URI, d);
            api_count.add_for_tag(URI, d);
        }

        clock.advance(Duration::from_secs(13));
        let now = UNIX_EPOCH + Duration::from_secs(13);
        check!(
            registry.snapshot_now()
                == Stats {
                    time: now,
                    metrics: vec![
                        Datum::new("proctime", "", 50),
                        Datum::new("proctime", URI, 50),
                        Datum::new("max_proctime", "", 100),
                        Datum::new("api_qps", "", 388),
                        Datum::new("api_qps", URI, 388),
                        Datum::new("api_count", "", 5050),
                        Datum::new("api_count", URI, 5050),
                    ],
                }
        );

        // everything was reset
        check!(registry.snapshot(now + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn idle_metrics_are_silent() {
        let registry = Registry::new();
        let _idle = registry.define(MetricDef::sum("idle"));
        let busy = registry.define(MetricDef::sum("busy"));
        busy.add(1);

        let stats = registry.snapshot_now();
        check!(stats.metrics == vec![Datum::new("busy", "", 1)]);
    }
}
