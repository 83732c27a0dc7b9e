// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Per-metric aggregation slots and the generation swap that drains them.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::SystemTime,
};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::{CowStr, Counter, MetricDef};

/// One computed output row of a drain.
///
/// An empty `tag` is the untagged aggregate of the metric.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Category of the metric definition
    pub category: CowStr,
    /// Tag the value was recorded for, empty for the aggregate
    pub tag: String,
    /// Computed value for the period
    pub value: i64,
}

/// Everything recorded into a slot between two drains.
struct Generation {
    main: Counter,
    tags: DashMap<String, Counter>,
    created_at: SystemTime,
    dirty: AtomicBool,
}

impl Generation {
    fn new(created_at: SystemTime) -> Self {
        Self {
            main: Counter::default(),
            tags: DashMap::new(),
            created_at,
            dirty: AtomicBool::new(false),
        }
    }
}

/// Accumulates samples for one [`MetricDef`].
///
/// Writers load the current generation and update its counters in place; nothing on the
/// recording path takes a lock that a drain could hold. [`Slot::drain`] exchanges the whole
/// generation for a fresh one, so each sample lands in exactly one drained period.
pub struct Slot {
    def: MetricDef,
    current: ArcSwap<Generation>,
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").field("def", &self.def).finish()
    }
}

impl Slot {
    /// Create a slot whose first generation starts at `now`
    pub fn new(def: MetricDef, now: SystemTime) -> Self {
        Self {
            def,
            current: ArcSwap::from_pointee(Generation::new(now)),
        }
    }

    /// The definition this slot aggregates for
    pub fn def(&self) -> &MetricDef {
        &self.def
    }

    /// Record a sample into the untagged aggregate
    pub fn record(&self, value: i64) {
        let generation = self.current.load();
        self.record_main(&generation, value);
    }

    /// Record a sample for `tag`. The sample also counts towards the untagged aggregate.
    ///
    /// An empty tag only records the aggregate. Tag and aggregate are always updated in the same
    /// generation.
    pub fn record_for_tag(&self, tag: &str, value: i64) {
        let generation = self.current.load();
        if !tag.is_empty() {
            let method = self.def.method();
            // the read guard must be released before `entry` takes the shard's write lock
            let found = generation
                .tags
                .get(tag)
                .map(|counter| counter.add(method, value))
                .is_some();
            if !found {
                generation
                    .tags
                    .entry(tag.to_owned())
                    .or_default()
                    .add(method, value);
            }
        }
        self.record_main(&generation, value);
    }

    fn record_main(&self, generation: &Generation, value: i64) {
        generation.main.add(self.def.method(), value);
        generation.dirty.store(true, Ordering::Relaxed);
    }

    /// Retire the current generation and compute its entries.
    ///
    /// A new, empty generation stamped `now` becomes current in the same atomic exchange that
    /// captures the old one. Writers still holding the old generation finish their update before
    /// it is read. Returns the aggregate entry followed by one entry per tag (tag order is
    /// unspecified), or nothing if no sample was recorded.
    pub fn drain(&self, now: SystemTime) -> Vec<Entry> {
        let previous = self.current.swap(Arc::new(Generation::new(now)));
        let generation = wait_for_writers(previous);

        if !generation.dirty.load(Ordering::Relaxed) {
            return Vec::new();
        }

        let elapsed = now
            .duration_since(generation.created_at)
            .unwrap_or_default();
        let method = self.def.method();
        let window = self.def.window();
        let category = self.def.category_cow();

        let mut entries = Vec::with_capacity(1 + generation.tags.len());
        entries.push(Entry {
            category: category.clone(),
            tag: String::new(),
            value: generation.main.compute(method, window, elapsed),
        });
        entries.extend(generation.tags.into_iter().map(|(tag, counter)| Entry {
            category: category.clone(),
            value: counter.compute(method, window, elapsed),
            tag,
        }));
        entries
    }
}

/// Take sole ownership of a swapped-out generation.
///
/// `ArcSwap::swap` accounts for every outstanding `load` guard in the strong count, so once the
/// count drops to one no writer can touch the generation anymore.
fn wait_for_writers(mut generation: Arc<Generation>) -> Generation {
    loop {
        match Arc::try_unwrap(generation) {
            Ok(generation) => return generation,
            Err(shared) => {
                generation = shared;
                std::thread::yield_now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::Arc,
        time::{Duration, UNIX_EPOCH},
    };

    use assert2::check;

    use super::{Entry, Slot};
    use crate::MetricDef;

    fn entry(category: &'static str, tag: &str, value: i64) -> Entry {
        Entry {
            category: category.into(),
            tag: tag.to_owned(),
            value,
        }
    }

    fn as_set(entries: Vec<Entry>) -> HashSet<Entry> {
        entries.into_iter().collect()
    }

    #[test]
    fn idle_slot_drains_nothing() {
        let slot = Slot::new(MetricDef::sum("idle"), UNIX_EPOCH);
        check!(slot.drain(UNIX_EPOCH + Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn second_drain_is_empty() {
        let slot = Slot::new(MetricDef::sum("api_count"), UNIX_EPOCH);
        slot.record_for_tag("/foo", 5);
        let first = slot.drain(UNIX_EPOCH + Duration::from_secs(60));
        check!(first.len() == 2);
        check!(slot.drain(UNIX_EPOCH + Duration::from_secs(120)).is_empty());
    }

    #[test]
    fn tagged_samples_count_towards_aggregate() {
        let slot = Slot::new(MetricDef::sum("api_count"), UNIX_EPOCH);
        slot.record_for_tag("/foo", 3);
        slot.record_for_tag("/bar", 4);
        slot.record_for_tag("/foo", 5);
        slot.record(1);
        // empty tag only touches the aggregate
        slot.record_for_tag("", 2);

        let entries = slot.drain(UNIX_EPOCH + Duration::from_secs(60));
        check!(entries[0] == entry("api_count", "", 15));
        check!(
            as_set(entries)
                == as_set(vec![
                    entry("api_count", "", 15),
                    entry("api_count", "/foo", 8),
                    entry("api_count", "/bar", 4),
                ])
        );
    }

    #[test]
    fn average_and_rate_per_tag() {
        let avg = Slot::new(MetricDef::average("proctime"), UNIX_EPOCH);
        let qps = Slot::new(
            MetricDef::sum("api_qps").per(Duration::from_secs(1)),
            UNIX_EPOCH,
        );
        for v in 1..=100 {
            avg.record_for_tag("/foo/bar", v);
            qps.record_for_tag("/foo/bar", v);
        }

        let now = UNIX_EPOCH + Duration::from_secs(13);
        check!(
            avg.drain(now)
                == vec![entry("proctime", "", 50), entry("proctime", "/foo/bar", 50)]
        );
        check!(
            qps.drain(now) == vec![entry("api_qps", "", 388), entry("api_qps", "/foo/bar", 388)]
        );
    }

    #[test]
    fn elapsed_is_measured_from_previous_drain() {
        let slot = Slot::new(MetricDef::sum("qps").per(Duration::from_secs(1)), UNIX_EPOCH);
        slot.record(100);
        check!(slot.drain(UNIX_EPOCH + Duration::from_secs(10))[0].value == 10);

        slot.record(100);
        // second period lasted 50s
        check!(slot.drain(UNIX_EPOCH + Duration::from_secs(60))[0].value == 2);
    }

    #[test]
    fn concurrent_first_use_creates_one_counter_per_tag() {
        let slot = Slot::new(MetricDef::sum("race"), UNIX_EPOCH);
        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        slot.record_for_tag("shared", 1);
                    }
                });
            }
        });

        let entries = slot.drain(UNIX_EPOCH + Duration::from_secs(1));
        check!(entries == vec![entry("race", "", 16_000), entry("race", "shared", 16_000)]);
    }

    #[test]
    fn racing_drains_never_lose_or_duplicate_samples() {
        const WRITERS: usize = 8;
        const SAMPLES: i64 = 20_000;

        let slot = Arc::new(Slot::new(MetricDef::sum("race"), UNIX_EPOCH));
        let mut drained_total = 0;
        let mut drained_tagged = 0;

        std::thread::scope(|s| {
            let writers: Vec<_> = (0..WRITERS)
                .map(|_| {
                    let slot = slot.clone();
                    s.spawn(move || {
                        for _ in 0..SAMPLES {
                            slot.record_for_tag("t", 1);
                        }
                    })
                })
                .collect();

            let mut tick = 0;
            while writers.iter().any(|w| !w.is_finished()) {
                tick += 1;
                for e in slot.drain(UNIX_EPOCH + Duration::from_secs(tick)) {
                    if e.tag.is_empty() {
                        drained_total += e.value;
                    } else {
                        drained_tagged += e.value;
                    }
                }
            }
        });

        for e in slot.drain(UNIX_EPOCH + Duration::from_secs(u32::MAX as u64)) {
            if e.tag.is_empty() {
                drained_total += e.value;
            } else {
                drained_tagged += e.value;
            }
        }

        check!(drained_total == WRITERS as i64 * SAMPLES);
        check!(drained_tagged == WRITERS as i64 * SAMPLES);
    }
}
