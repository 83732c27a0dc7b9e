// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The atomic (value, count) pair every slot accumulates into.

use std::{
    sync::atomic::{AtomicI64, Ordering},
    time::Duration,
};

use crate::Method;

/// An atomically updated (value, sample count) pair.
///
/// `value` holds the running total for [`Method::Sum`] and [`Method::Average`] and the running
/// maximum for [`Method::Maximum`]. The count is bumped for every sample regardless of method,
/// so `value / count` is a valid mean no matter how writers interleave.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicI64,
    count: AtomicI64,
}

impl Counter {
    /// Record one sample
    pub fn add(&self, method: Method, delta: i64) {
        match method {
            Method::Maximum => {
                self.value.fetch_max(delta, Ordering::Relaxed);
            }
            Method::Sum | Method::Average => {
                self.value.fetch_add(delta, Ordering::Relaxed);
            }
        }
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Accumulated value
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Number of samples recorded
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Fold the counter into the value reported for a period that lasted `elapsed`.
    ///
    /// With a non-zero `window` (and a method other than [`Method::Maximum`]) the result is
    /// scaled by `window / elapsed` and rounded to the nearest integer. A zero `elapsed` leaves
    /// the result unscaled.
    pub fn compute(&self, method: Method, window: Option<Duration>, elapsed: Duration) -> i64 {
        let count = self.count();
        if count == 0 {
            return 0;
        }

        let result = match method {
            Method::Average => self.value() / count,
            Method::Sum | Method::Maximum => self.value(),
        };

        match window {
            Some(window)
                if method != Method::Maximum && !window.is_zero() && !elapsed.is_zero() =>
            {
                (result as f64 * window.as_secs_f64() / elapsed.as_secs_f64()).round() as i64
            }
            _ => result,
        }
    }
}
