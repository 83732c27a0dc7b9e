// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, SystemTime},
};

use crate::Time;

/// Time source that only moves when told to
///
/// Clones share the same clock, so a test can keep one clone and hand another to a registry.
///
/// # Examples
///
/// ```
/// use harvest_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource};
/// use std::time::{Duration, UNIX_EPOCH};
///
/// let clock = ManuallyAdvancedTimeSource::at_time(UNIX_EPOCH);
/// let ts = TimeSource::custom(clock.clone());
///
/// clock.advance(Duration::from_secs(100));
/// assert_eq!(ts.system_time(), UNIX_EPOCH + Duration::from_secs(100));
/// ```
#[derive(Debug, Clone)]
pub struct ManuallyAdvancedTimeSource(Arc<Mutex<SystemTime>>);

impl ManuallyAdvancedTimeSource {
    /// Create a new ManuallyAdvancedTimeSource starting at `time`
    pub fn at_time(time: impl Into<SystemTime>) -> Self {
        Self(Arc::new(Mutex::new(time.into())))
    }

    /// Set the current time
    pub fn update_time(&self, time: impl Into<SystemTime>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = time.into();
    }

    /// Move the current time forward by `elapsed`
    pub fn advance(&self, elapsed: Duration) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) += elapsed;
    }
}

impl Time for ManuallyAdvancedTimeSource {
    fn now(&self) -> SystemTime {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
