// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::{pin::Pin, sync::Arc, time::Duration};

use harvest_core::{BoxSink, Metric, MetricDef, Sink};
use harvest_timesource::TimeSource;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, Sleep},
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{BuildError, Registry, SendError};

/// Owns the metric registry and the background task that delivers its snapshots.
///
/// Construct one at startup with [`MetricReporter::builder`], define metrics through it, and
/// call [`MetricReporter::shutdown`] on the way out so the last period is delivered. Dropping
/// the reporter does not flush.
///
/// Every delivery, timed or requested, runs on the background task, so the sink is never called
/// concurrently. Without a sink there is no background task: [`MetricReporter::flush`] writes
/// the current values to `tracing` at trace level instead.
///
/// This may be freely cloned.
#[derive(Debug, Clone)]
pub struct MetricReporter {
    registry: Arc<Registry>,
    requests: Option<mpsc::Sender<Ack>>,
    tasks: TaskTracker,
    cancellation_token: CancellationToken,
}

/// Answers one delivery request with its outcome
type Ack = oneshot::Sender<Result<(), SendError>>;

/// Builder for [`MetricReporter`]
///
/// A reporter with a sink must be built within the context of a Tokio runtime.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::time::Duration;
/// use harvest::{MetricDef, MetricReporter, sink::JsonLines};
///
/// let reporter = MetricReporter::builder()
///     .sink(JsonLines::new(std::io::stdout()).with_interval(Duration::from_secs(30)))
///     .send_timeout(Duration::from_secs(5))
///     .build()
///     .expect("valid metrics configuration");
///
/// let requests = reporter.define(MetricDef::sum("requests"));
/// requests.add_for_tag("/index", 1);
///
/// reporter.shutdown().await;
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MetricReporterBuilder {
    sink: Option<BoxSink>,
    send_timeout: Option<Duration>,
    time_source: TimeSource,
}

impl MetricReporterBuilder {
    /// Initialize the builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the destination for snapshots. The sink's interval drives the delivery timer.
    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Some(sink.boxed());
        self
    }

    /// Give up on a single delivery after `timeout`. Unbounded by default.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Clock used to stamp generations and snapshots. Defaults to the system clock.
    pub fn time_source(mut self, time_source: TimeSource) -> Self {
        self.time_source = time_source;
        self
    }

    /// Validate the configuration and start the background task if a sink is set.
    pub fn build(self) -> Result<MetricReporter, BuildError> {
        let registry = Arc::new(Registry::with_time_source(self.time_source));
        let tasks = TaskTracker::new();
        let cancellation_token = CancellationToken::new();

        let Some(sink) = self.sink else {
            tasks.close();
            return Ok(MetricReporter {
                registry,
                requests: None,
                tasks,
                cancellation_token,
            });
        };

        let interval = sink.interval();
        if interval.is_zero() {
            return Err(BuildError::ZeroInterval);
        }
        if self.send_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(BuildError::ZeroSendTimeout);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let delivery = Delivery {
            registry: registry.clone(),
            sink,
            send_timeout: self.send_timeout,
        };
        let (requests, receiver) = mpsc::channel(1);
        tasks.spawn_on(
            run(delivery, interval, receiver, cancellation_token.clone()),
            &runtime,
        );
        tasks.close();
        tracing::debug!(?interval, "metric reporter started");

        Ok(MetricReporter {
            registry,
            requests: Some(requests),
            tasks,
            cancellation_token,
        })
    }
}

impl MetricReporter {
    /// Creates a [builder](MetricReporterBuilder) for [`MetricReporter`]
    pub fn builder() -> MetricReporterBuilder {
        MetricReporterBuilder::new()
    }

    /// Define a metric, see [`Registry::define`]
    pub fn define(&self, def: MetricDef) -> Metric {
        self.registry.define(def)
    }

    /// The registry holding every defined metric
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Deliver everything recorded so far and wait until the delivery has run.
    ///
    /// The periodic timer restarts a full interval from now, so an explicit flush and a timer
    /// that came due at the same moment result in a single delivery. Failures are logged by the
    /// background task. Without a sink, the values are drained and written to `tracing` instead.
    pub async fn flush(&self) {
        let Some(requests) = &self.requests else {
            self.dump();
            return;
        };
        // the outcome was already logged
        let _ = request(requests).await;
    }

    /// Like [`MetricReporter::flush`], but return the outcome of the delivery.
    ///
    /// Succeeds without doing anything if no sink is configured or nothing was recorded, and
    /// fails with [`SendError::ShutDown`] once the reporter was shut down.
    pub async fn send(&self) -> Result<(), SendError> {
        match &self.requests {
            Some(requests) => request(requests).await,
            None => Ok(()),
        }
    }

    /// Stop the background task after one final delivery and wait for it to finish.
    pub async fn shutdown(&self) {
        if self.requests.is_none() {
            self.dump();
            return;
        }
        self.cancellation_token.cancel();
        self.tasks.wait().await;
    }

    fn dump(&self) {
        let stats = self.registry.snapshot_now();
        for datum in &stats.metrics {
            tracing::trace!(
                name = %datum.name,
                tag = %datum.tag,
                value = datum.value,
                "dump metrics"
            );
        }
    }
}

async fn request(requests: &mpsc::Sender<Ack>) -> Result<(), SendError> {
    let (ack, done) = oneshot::channel();
    if requests.send(ack).await.is_err() {
        tracing::warn!("metric reporter is shut down, ignoring delivery request");
        return Err(SendError::ShutDown);
    }
    // the ack is dropped unanswered if shutdown wins the race; the final delivery covers it
    done.await.unwrap_or(Ok(()))
}

/// Snapshot-and-send, owned by the background task
struct Delivery {
    registry: Arc<Registry>,
    sink: BoxSink,
    send_timeout: Option<Duration>,
}

impl Delivery {
    async fn send(&self) -> Result<(), SendError> {
        let stats = self.registry.snapshot_now();
        if stats.is_empty() {
            tracing::trace!("nothing recorded, skipping delivery");
            return Ok(());
        }

        let len = stats.len();
        let send = self.sink.send(stats);
        match self.send_timeout {
            Some(timeout) => tokio::time::timeout(timeout, send)
                .await
                .map_err(|_| SendError::Timeout(timeout))??,
            None => send.await?,
        }
        tracing::trace!(len, "delivered metrics");
        Ok(())
    }

    /// Send and log failures. A failed period is not retried.
    async fn report(&self) -> Result<(), SendError> {
        let result = self.send().await;
        if let Err(err) = &result {
            tracing::error!(?err, "failed to send metrics, dropping this period");
        }
        result
    }
}

/// The pending periodic delivery.
///
/// Every delivery, timed or explicit, pushes the deadline a full interval past the moment it
/// started, which also discards a deadline that elapsed but has not been observed yet.
struct Deadline {
    interval: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl Deadline {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            sleep: Box::pin(tokio::time::sleep(interval)),
        }
    }

    async fn elapsed(&mut self) {
        self.sleep.as_mut().await
    }

    fn reschedule(&mut self) {
        self.sleep.as_mut().reset(Instant::now() + self.interval);
    }
}

async fn run(
    delivery: Delivery,
    interval: Duration,
    mut requests: mpsc::Receiver<Ack>,
    shutdown_signal: CancellationToken,
) {
    let mut deadline = Deadline::new(interval);
    loop {
        let ack = tokio::select! {
            biased;
            _ = shutdown_signal.cancelled() => break,
            Some(ack) = requests.recv() => Some(ack),
            _ = deadline.elapsed() => None,
        };
        deadline.reschedule();
        tracing::trace!(explicit = ack.is_some(), "publishing metrics");
        let result = delivery.report().await;
        if let Some(ack) = ack {
            let _ = ack.send(result);
        }
    }

    // one more time on the way out
    let _ = delivery.report().await;
    tracing::debug!("metric reporter shut down");
}
