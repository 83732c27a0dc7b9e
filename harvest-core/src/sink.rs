// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Contains the [`Sink`] trait, the delivery target that periodic snapshots are handed to.

use std::{
    error::Error,
    fmt::{self, Debug},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use crate::Stats;

/// Delivers [`Stats`] batches to a monitoring backend.
///
/// The reporter drains all metrics every [`Sink::interval`] and calls [`Sink::send`] with the
/// result, one call at a time. Empty batches are never sent. A failed send is logged and its
/// batch is dropped; the next period is the only retry.
pub trait Sink: Send + Sync {
    /// How often batches should be delivered
    fn interval(&self) -> Duration;

    /// Deliver one batch
    fn send(&self, stats: Stats) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Returns a [`BoxSink`] that is a type-erased version of this sink
    fn boxed(self) -> BoxSink
    where
        Self: Sized + 'static,
    {
        BoxSink::new(self)
    }
}

impl<S: Sink> Sink for Arc<S> {
    fn interval(&self) -> Duration {
        (**self).interval()
    }

    fn send(&self, stats: Stats) -> impl Future<Output = Result<(), SinkError>> + Send {
        (**self).send(stats)
    }
}

/// Object-safe mirror of [`Sink`]
trait DynSink: Send + Sync {
    fn interval(&self) -> Duration;

    fn send_boxed(&self, stats: Stats) -> SendFuture<'_>;
}

impl<S: Sink> DynSink for S {
    fn interval(&self) -> Duration {
        Sink::interval(self)
    }

    fn send_boxed(&self, stats: Stats) -> SendFuture<'_> {
        SendFuture(Box::pin(self.send(stats)))
    }
}

/// A type-erased [`Sink`]
#[derive(Clone)]
pub struct BoxSink(Arc<dyn DynSink>);

impl Debug for BoxSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoxSink").finish()
    }
}

impl BoxSink {
    /// Create a new [BoxSink]
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self(Arc::new(sink))
    }
}

impl Sink for BoxSink {
    fn interval(&self) -> Duration {
        self.0.interval()
    }

    fn send(&self, stats: Stats) -> impl Future<Output = Result<(), SinkError>> + Send {
        self.0.send_boxed(stats)
    }

    fn boxed(self) -> BoxSink {
        self
    }
}

/// The future returned by a [`BoxSink`] send
#[must_use = "future does nothing unless polled"]
pub struct SendFuture<'a>(Pin<Box<dyn Future<Output = Result<(), SinkError>> + Send + 'a>>);

impl Future for SendFuture<'_> {
    type Output = Result<(), SinkError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0.as_mut().poll(cx)
    }
}

/// Why a [`Sink`] failed to deliver a batch.
///
/// Sinks wrap whatever their transport reports. Unlike the recording path, errors are free to
/// allocate.
pub struct SinkError(Box<dyn Error + Send + Sync + 'static>);

impl SinkError {
    /// Wrap an error or a message
    pub fn new(err: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(err.into())
    }
}

impl Debug for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.0)
    }
}

impl From<std::io::Error> for SinkError {
    fn from(value: std::io::Error) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        task::{Context, Poll, Waker},
        time::{Duration, UNIX_EPOCH},
    };

    use assert2::check;

    use super::{BoxSink, Sink, SinkError};
    use crate::{Datum, Stats};

    #[derive(Default)]
    struct Recording(Mutex<Vec<Stats>>);

    impl Sink for Recording {
        fn interval(&self) -> Duration {
            Duration::from_secs(10)
        }

        async fn send(&self, stats: Stats) -> Result<(), SinkError> {
            if stats.metrics.iter().any(|d| d.value < 0) {
                return Err(SinkError::new("negative value"));
            }
            self.0.lock().unwrap().push(stats);
            Ok(())
        }
    }

    fn poll_ready<F: Future>(fut: F) -> F::Output {
        let mut fut = std::pin::pin!(fut);
        match fut.as_mut().poll(&mut Context::from_waker(Waker::noop())) {
            Poll::Ready(out) => out,
            Poll::Pending => panic!("recording sink never waits"),
        }
    }

    #[test]
    fn boxed_sink_forwards() {
        let inner = Arc::new(Recording::default());
        let sink = inner.clone().boxed();
        check!(sink.interval() == Duration::from_secs(10));

        let mut stats = Stats::new(UNIX_EPOCH);
        stats.metrics.push(Datum::new("m", "", 1));
        poll_ready(sink.send(stats.clone())).unwrap();
        check!(*inner.0.lock().unwrap() == vec![stats]);
    }

    #[test]
    fn errors_pass_through() {
        let sink = BoxSink::new(Recording::default());
        let mut stats = Stats::new(UNIX_EPOCH);
        stats.metrics.push(Datum::new("m", "", -1));
        let err = poll_ready(sink.send(stats)).unwrap_err();
        check!(err.to_string() == "negative value");
    }
}
