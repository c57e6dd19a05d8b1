//! Background producers that feed the dashboard loop: the passive telemetry
//! poller and the simulated channel.

use std::{future::Future, time::Duration};

use chrono::Utc;
use shared::domain::ConnectionState;
use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{interval, timeout, Interval, MissedTickBehavior},
};
use tracing::debug;

use crate::{
    error::ClientError,
    fallback::TelemetryFallback,
    http::DashboardApi,
    session::{ChannelEvent, DashboardEvent, TelemetryUpdate},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const MIN_SIMULATION_CADENCE: Duration = Duration::from_millis(1000);
pub const MAX_SIMULATION_CADENCE: Duration = Duration::from_millis(2000);
pub const DEFAULT_SIMULATION_CADENCE: Duration = Duration::from_millis(1500);

/// Wall-clock seconds, the time base of backend timestamps.
pub fn unix_now() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Polls `/vision`, `/voice` and `/fusion` on a fixed interval, independent of
/// the push channel and of each other. The first round runs immediately.
pub struct TelemetryPoller {
    task: Option<JoinHandle<()>>,
}

impl TelemetryPoller {
    pub fn spawn(
        api: DashboardApi,
        every: Duration,
        fusion_timeout: Duration,
        events: UnboundedSender<DashboardEvent>,
    ) -> Self {
        Self {
            task: Some(tokio::spawn(poll_loop(api, every, fusion_timeout, events))),
        }
    }

    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll_loop(
    api: DashboardApi,
    every: Duration,
    fusion_timeout: Duration,
    events: UnboundedSender<DashboardEvent>,
) {
    let every = every.max(Duration::from_millis(1));
    // each endpoint keeps its own schedule so one hung request stalls only itself
    tokio::join!(
        poll_fusion(&api, every, fusion_timeout, &events),
        poll_snapshot("vision", every, &events, || api.vision(), TelemetryUpdate::Vision),
        poll_snapshot("voice", every, &events, || api.voice(), TelemetryUpdate::Voice),
    );
}

fn poll_ticker(every: Duration) -> Interval {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

async fn poll_fusion(
    api: &DashboardApi,
    every: Duration,
    fusion_timeout: Duration,
    events: &UnboundedSender<DashboardEvent>,
) {
    let fallback = TelemetryFallback::new();
    let mut ticker = poll_ticker(every);
    loop {
        ticker.tick().await;
        let reading = api
            .fusion_or_simulated(fusion_timeout, &fallback, unix_now())
            .await;
        if events
            .send(DashboardEvent::Telemetry(TelemetryUpdate::Fusion(reading)))
            .is_err()
        {
            return;
        }
    }
}

/// Requests are bounded by the poll interval; a miss is retried on the next tick.
async fn poll_snapshot<T, F, Fut>(
    endpoint: &'static str,
    every: Duration,
    events: &UnboundedSender<DashboardEvent>,
    mut fetch: F,
    wrap: fn(T) -> TelemetryUpdate,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut ticker = poll_ticker(every);
    loop {
        ticker.tick().await;
        match timeout(every, fetch()).await {
            Ok(Ok(snapshot)) => {
                if events.send(DashboardEvent::Telemetry(wrap(snapshot))).is_err() {
                    return;
                }
            }
            Ok(Err(err)) => debug!(endpoint, error = %err, "poller: endpoint unavailable"),
            Err(_) => debug!(
                endpoint,
                timeout_ms = every.as_millis() as u64,
                "poller: endpoint timed out"
            ),
        }
    }
}

/// Stand-in channel that replays deterministic samples at a fixed cadence.
/// Events carry the epoch it was started with.
pub struct SimulatedStream {
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl SimulatedStream {
    pub fn start(epoch: u64, cadence: Duration, events: UnboundedSender<DashboardEvent>) -> Self {
        let cadence = clamp_cadence(cadence);
        debug!(epoch, cadence_ms = cadence.as_millis() as u64, "simulation: started");
        Self {
            epoch,
            task: Some(tokio::spawn(simulate(epoch, cadence, events))),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            debug!(epoch = self.epoch, "simulation: stopped");
        }
    }
}

impl Drop for SimulatedStream {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

pub fn clamp_cadence(cadence: Duration) -> Duration {
    cadence.clamp(MIN_SIMULATION_CADENCE, MAX_SIMULATION_CADENCE)
}

async fn simulate(epoch: u64, cadence: Duration, events: UnboundedSender<DashboardEvent>) {
    let emit = |event: ChannelEvent| events.send(DashboardEvent::Channel { epoch, event }).is_ok();

    if !emit(ChannelEvent::State {
        state: ConnectionState::Simulated,
        retry_in: None,
    }) {
        return;
    }

    let fallback = TelemetryFallback::new();
    let mut ticker = poll_ticker(cadence);
    loop {
        ticker.tick().await;
        let now = unix_now();
        if !emit(ChannelEvent::Decision(fallback.sample(now))) {
            return;
        }
        if !emit(ChannelEvent::Action(fallback.sample_action(now))) {
            return;
        }
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
