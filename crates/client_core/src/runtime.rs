//! Single-task event loop that owns the dashboard state and every background
//! producer feeding it.

use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{domain::ConnectionState, protocol::Action};
use tokio::{
    sync::{
        broadcast,
        mpsc::{self, UnboundedReceiver, UnboundedSender},
    },
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, warn};
use url::Url;
use view_core::{FocusTarget, KeyInput};

use crate::{
    error::ClientError,
    http::{DashboardApi, DEFAULT_FUSION_TIMEOUT},
    poller::{SimulatedStream, TelemetryPoller, DEFAULT_POLL_INTERVAL, DEFAULT_SIMULATION_CADENCE},
    session::{ChannelEvent, DashboardEvent, DashboardSnapshot, DashboardState, DashboardUpdate, Effect},
    supervisor::{ChannelSink, ConnectionSupervisor, RECONNECT_DELAY},
};

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Overrides the channel url derived from the server url.
    pub channel_url: Option<Url>,
    pub reconnect_delay: Duration,
    pub poll_interval: Duration,
    pub fusion_timeout: Duration,
    pub simulation: bool,
    pub simulation_cadence: Duration,
    /// Disable to run without the passive `/vision` `/voice` `/fusion` poller.
    pub polling: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel_url: None,
            reconnect_delay: RECONNECT_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fusion_timeout: DEFAULT_FUSION_TIMEOUT,
            simulation: false,
            simulation_cadence: DEFAULT_SIMULATION_CADENCE,
            polling: true,
        }
    }
}

/// Cloneable entry point for feeding user input into a running dashboard.
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    events: UnboundedSender<DashboardEvent>,
}

impl DashboardHandle {
    /// Returns `false` once the dashboard has shut down.
    pub fn send(&self, event: DashboardEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn key(&self, input: KeyInput) -> bool {
        self.send(DashboardEvent::Key(input))
    }

    pub fn focus(&self, target: FocusTarget) -> bool {
        self.send(DashboardEvent::Focus(target))
    }

    pub fn select(&self, name: impl Into<String>) -> bool {
        self.send(DashboardEvent::SelectImage(name.into()))
    }

    pub fn action(&self, action: Action) -> bool {
        self.send(DashboardEvent::LocalAction(action))
    }

    pub fn upload(&self, path: impl Into<PathBuf>) -> bool {
        self.send(DashboardEvent::UploadRequested(path.into()))
    }

    pub fn set_simulation(&self, enabled: bool) -> bool {
        self.send(DashboardEvent::SetSimulation(enabled))
    }

    pub fn shutdown(&self) -> bool {
        self.send(DashboardEvent::Shutdown)
    }
}

/// Forwards supervisor callbacks into the loop, tagged with the channel epoch.
struct EpochSink {
    epoch: u64,
    events: UnboundedSender<DashboardEvent>,
}

impl EpochSink {
    fn forward(&self, event: ChannelEvent) {
        let _ = self.events.send(DashboardEvent::Channel {
            epoch: self.epoch,
            event,
        });
    }
}

#[async_trait]
impl ChannelSink for EpochSink {
    async fn on_action(&self, action: Action) {
        self.forward(ChannelEvent::Action(action));
    }

    async fn on_message(&self, text: String) {
        self.forward(ChannelEvent::Message(text));
    }

    async fn on_state(&self, state: ConnectionState, retry_in: Option<Duration>) {
        self.forward(ChannelEvent::State { state, retry_in });
    }
}

pub struct DashboardRuntime {
    api: DashboardApi,
    config: RuntimeConfig,
    state: DashboardState,
    events_tx: UnboundedSender<DashboardEvent>,
    events_rx: UnboundedReceiver<DashboardEvent>,
    updates: broadcast::Sender<DashboardUpdate>,
    supervisor: ConnectionSupervisor,
    simulated: Option<SimulatedStream>,
    poller: Option<TelemetryPoller>,
    expiry: Option<JoinHandle<()>>,
    requests: Vec<JoinHandle<()>>,
}

impl DashboardRuntime {
    pub fn new(api: DashboardApi, config: RuntimeConfig) -> Result<Self, ClientError> {
        let channel_url = match config.channel_url.clone() {
            Some(url) => url,
            None => api.channel_url()?,
        };
        let supervisor =
            ConnectionSupervisor::new(channel_url).with_reconnect_delay(config.reconnect_delay);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (updates, _) = broadcast::channel(256);
        Ok(Self {
            state: DashboardState::new(config.simulation),
            api,
            config,
            events_tx,
            events_rx,
            updates,
            supervisor,
            simulated: None,
            poller: None,
            expiry: None,
            requests: Vec::new(),
        })
    }

    pub fn handle(&self) -> DashboardHandle {
        DashboardHandle {
            events: self.events_tx.clone(),
        }
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<DashboardUpdate> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.state.snapshot()
    }

    /// Runs until a shutdown event arrives and returns the final state.
    pub async fn run(mut self) -> DashboardSnapshot {
        info!(
            server = %self.api.base_url(),
            channel = %self.supervisor.url(),
            simulation = self.state.simulation(),
            "dashboard: starting"
        );
        if self.config.polling {
            self.poller = Some(TelemetryPoller::spawn(
                self.api.clone(),
                self.config.poll_interval,
                self.config.fusion_timeout,
                self.events_tx.clone(),
            ));
        }
        let effects = self.state.mount();
        let mut running = self.execute(effects).await;

        while running {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            let effects = self.state.handle(event, Instant::now().into_std());
            running = self.execute(effects).await;
        }

        self.teardown().await;
        info!("dashboard: stopped");
        self.state.snapshot()
    }

    /// Returns `false` when the loop should stop.
    async fn execute(&mut self, effects: Vec<Effect>) -> bool {
        let mut running = true;
        for effect in effects {
            match effect {
                Effect::ScheduleExpiry(ticket) => self.schedule_expiry(ticket),
                Effect::StartLive { epoch } => {
                    self.stop_simulation().await;
                    let sink = Arc::new(EpochSink {
                        epoch,
                        events: self.events_tx.clone(),
                    });
                    self.supervisor.start(sink).await;
                    debug!(epoch, "dashboard: live channel started");
                }
                Effect::StartSimulation { epoch } => {
                    self.supervisor.stop().await;
                    self.stop_simulation().await;
                    self.simulated = Some(SimulatedStream::start(
                        epoch,
                        self.config.simulation_cadence,
                        self.events_tx.clone(),
                    ));
                }
                Effect::LoadSamples => self.load_samples(),
                Effect::Upload(path) => self.upload(path),
                Effect::Publish(update) => {
                    let _ = self.updates.send(update);
                }
                Effect::Shutdown => running = false,
            }
        }
        self.requests.retain(|task| !task.is_finished());
        running
    }

    /// Replaces the pending expiry timer; the old one never fires.
    fn schedule_expiry(&mut self, ticket: view_core::ExpiryTicket) {
        if let Some(previous) = self.expiry.take() {
            previous.abort();
        }
        let events = self.events_tx.clone();
        let deadline = Instant::from_std(ticket.deadline);
        self.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = events.send(DashboardEvent::StatusExpired(ticket));
        }));
    }

    fn load_samples(&mut self) {
        let api = self.api.clone();
        let events = self.events_tx.clone();
        self.requests.push(tokio::spawn(async move {
            match api.list_samples().await {
                Ok(images) => {
                    debug!(count = images.len(), "dashboard: samples loaded");
                    let _ = events.send(DashboardEvent::SamplesLoaded(images));
                }
                Err(err) => warn!(error = %err, "dashboard: failed to load samples"),
            }
        }));
    }

    fn upload(&mut self, path: PathBuf) {
        let api = self.api.clone();
        let events = self.events_tx.clone();
        self.requests.push(tokio::spawn(async move {
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let result = api.upload_file(&path).await;
            let _ = events.send(DashboardEvent::UploadFinished { file, result });
        }));
    }

    async fn stop_simulation(&mut self) {
        if let Some(mut stream) = self.simulated.take() {
            stream.stop().await;
        }
    }

    async fn teardown(&mut self) {
        self.supervisor.stop().await;
        self.stop_simulation().await;
        if let Some(mut poller) = self.poller.take() {
            poller.stop().await;
        }
        if let Some(expiry) = self.expiry.take() {
            expiry.abort();
        }
        for task in self.requests.drain(..) {
            task.abort();
        }
    }
}
