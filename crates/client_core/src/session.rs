//! Dashboard state machine. Every input arrives as a [`DashboardEvent`] and is
//! applied on one task; side effects come back as [`Effect`]s for the runtime
//! to execute.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use shared::{
    domain::{ConnectionState, ImageRef, StatusKind},
    protocol::{Action, FusionDecision, VisionSnapshot, VoiceSnapshot},
};
use tracing::{debug, error, info};
use view_core::{
    router::{self, DashboardView},
    ExpiryTicket, FocusTarget, Highlight, KeyInput, KeyOutcome, KeyRouter, ModalCommand,
    ModalFocusManager, ModalState, StatusMessage, StatusMessageChannel, Transform,
};

use crate::{
    error::UploadError,
    http::{FusionReading, TelemetrySource},
};

/// What the active channel (live or simulated) reports.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Action(Action),
    Message(String),
    Decision(FusionDecision),
    State {
        state: ConnectionState,
        retry_in: Option<Duration>,
    },
}

/// Read-only readings from the polling path.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryUpdate {
    Vision(VisionSnapshot),
    Voice(VoiceSnapshot),
    Fusion(FusionReading),
}

#[derive(Debug)]
pub enum DashboardEvent {
    /// Tagged with the epoch of the channel that produced it.
    Channel {
        epoch: u64,
        event: ChannelEvent,
    },
    Telemetry(TelemetryUpdate),
    SamplesLoaded(Vec<ImageRef>),
    UploadRequested(PathBuf),
    UploadFinished {
        file: String,
        result: Result<ImageRef, UploadError>,
    },
    Key(KeyInput),
    Focus(FocusTarget),
    SelectImage(String),
    LocalAction(Action),
    StatusExpired(ExpiryTicket),
    SetSimulation(bool),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardUpdate {
    Snapshot(Box<DashboardSnapshot>),
    Highlight(Highlight),
    UploadRejected { file: String, message: String },
    Connection {
        state: ConnectionState,
        retry_in: Option<Duration>,
    },
}

#[derive(Debug, PartialEq)]
pub enum Effect {
    ScheduleExpiry(ExpiryTicket),
    StartLive { epoch: u64 },
    StartSimulation { epoch: u64 },
    LoadSamples,
    Upload(PathBuf),
    Publish(DashboardUpdate),
    Shutdown,
}

/// Everything a rendering layer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub transform: Transform,
    pub images: Vec<ImageRef>,
    pub selected: Option<String>,
    pub status: Option<StatusMessage>,
    pub connection: ConnectionState,
    pub retry_in: Option<Duration>,
    pub simulation: bool,
    pub modal: ModalState,
    pub focused: Option<String>,
    pub background_inert: bool,
    pub vision: Option<VisionSnapshot>,
    pub voice: Option<VoiceSnapshot>,
    pub fusion: Option<FusionReading>,
}

#[derive(Debug)]
pub struct DashboardState {
    view: DashboardView,
    status: StatusMessageChannel,
    modal: ModalFocusManager,
    keys: KeyRouter,
    connection: ConnectionState,
    retry_in: Option<Duration>,
    simulation: bool,
    epoch: u64,
    vision: Option<VisionSnapshot>,
    voice: Option<VoiceSnapshot>,
    fusion: Option<FusionReading>,
}

impl DashboardState {
    pub fn new(simulation: bool) -> Self {
        Self {
            view: DashboardView::default(),
            status: StatusMessageChannel::new(),
            modal: ModalFocusManager::image_viewer(),
            keys: KeyRouter::new(),
            connection: ConnectionState::Connecting,
            retry_in: None,
            simulation,
            epoch: 0,
            vision: None,
            voice: None,
            fusion: None,
        }
    }

    /// Attaches key handling and asks for the first channel and listing.
    pub fn mount(&mut self) -> Vec<Effect> {
        self.keys.attach();
        vec![self.next_channel(), Effect::LoadSamples]
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn simulation(&self) -> bool {
        self.simulation
    }

    pub fn status(&self) -> &StatusMessageChannel {
        &self.status
    }

    pub fn modal(&self) -> &ModalFocusManager {
        &self.modal
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            transform: self.view.view.transform(),
            images: self.view.gallery.list().to_vec(),
            selected: self.view.gallery.selected().map(|image| image.name.clone()),
            status: self.status.current().cloned(),
            connection: self.connection,
            retry_in: self.retry_in,
            simulation: self.simulation,
            modal: self.modal.state(),
            focused: self.modal.focused_id().map(str::to_string),
            background_inert: self.modal.background_inert(),
            vision: self.vision.clone(),
            voice: self.voice.clone(),
            fusion: self.fusion.clone(),
        }
    }

    pub fn handle(&mut self, event: DashboardEvent, now: Instant) -> Vec<Effect> {
        let mut effects = Vec::new();
        let changed = match event {
            DashboardEvent::Channel { epoch, event } => {
                if epoch != self.epoch {
                    debug!(epoch, current = self.epoch, "session: dropping event from stopped channel");
                    false
                } else {
                    self.on_channel(event, now, &mut effects)
                }
            }
            DashboardEvent::Telemetry(update) => {
                match update {
                    TelemetryUpdate::Vision(snapshot) => self.vision = Some(snapshot),
                    TelemetryUpdate::Voice(snapshot) => self.voice = Some(snapshot),
                    TelemetryUpdate::Fusion(reading) => self.fusion = Some(reading),
                }
                true
            }
            DashboardEvent::SamplesLoaded(images) => {
                let before = self.view.gallery.selected().map(|image| image.name.clone());
                self.view.gallery.replace(images);
                let after = self.view.gallery.selected().map(|image| image.name.clone());
                if before != after {
                    self.view.view.reset();
                }
                self.sync_modal();
                true
            }
            DashboardEvent::UploadRequested(path) => {
                effects.push(Effect::Upload(path));
                false
            }
            DashboardEvent::UploadFinished { file, result } => {
                self.on_upload_finished(file, result, now, &mut effects);
                true
            }
            DashboardEvent::Key(input) => {
                match self.keys.route(input, &mut self.modal, &self.view.gallery) {
                    KeyOutcome::Ignored => false,
                    KeyOutcome::FocusMoved(_) => true,
                    KeyOutcome::Command(command) => {
                        self.run_modal_command(command);
                        true
                    }
                }
            }
            DashboardEvent::Focus(target) => {
                let id = target.id.clone();
                let moved = self.modal.focus(target);
                if !moved {
                    debug!(target = %id, "session: focus kept inside open viewer");
                }
                moved
            }
            DashboardEvent::SelectImage(name) => self.select(&name),
            DashboardEvent::LocalAction(action) => {
                self.dispatch(&action, now, &mut effects);
                true
            }
            DashboardEvent::StatusExpired(ticket) => self.status.expire(ticket),
            DashboardEvent::SetSimulation(enabled) => {
                if enabled == self.simulation {
                    false
                } else {
                    self.simulation = enabled;
                    info!(simulation = enabled, "session: switching telemetry channel");
                    effects.push(self.next_channel());
                    let text = if enabled { "simulation on" } else { "simulation off" };
                    let ticket = self.status.show(text, StatusKind::Info, now);
                    effects.push(Effect::ScheduleExpiry(ticket));
                    true
                }
            }
            DashboardEvent::Shutdown => {
                self.keys.detach();
                effects.push(Effect::Shutdown);
                false
            }
        };

        if changed {
            effects.push(Effect::Publish(DashboardUpdate::Snapshot(Box::new(self.snapshot()))));
        }
        effects
    }

    /// Bumps the epoch so events still queued from the old channel are dropped.
    fn next_channel(&mut self) -> Effect {
        self.epoch += 1;
        self.retry_in = None;
        if self.simulation {
            self.connection = ConnectionState::Simulated;
            Effect::StartSimulation { epoch: self.epoch }
        } else {
            self.connection = ConnectionState::Connecting;
            Effect::StartLive { epoch: self.epoch }
        }
    }

    fn on_channel(&mut self, event: ChannelEvent, now: Instant, effects: &mut Vec<Effect>) -> bool {
        match event {
            ChannelEvent::Action(action) => {
                self.dispatch(&action, now, effects);
                true
            }
            ChannelEvent::Message(text) => {
                let ticket = self.status.show(&text, StatusKind::Chat, now);
                effects.push(Effect::ScheduleExpiry(ticket));
                true
            }
            ChannelEvent::Decision(decision) => {
                let source = if self.simulation {
                    TelemetrySource::Simulated
                } else {
                    TelemetrySource::Live
                };
                self.fusion = Some(FusionReading { decision, source });
                true
            }
            ChannelEvent::State { state, retry_in } => {
                if self.connection == state && self.retry_in == retry_in {
                    return false;
                }
                self.connection = state;
                self.retry_in = retry_in;
                effects.push(Effect::Publish(DashboardUpdate::Connection { state, retry_in }));
                true
            }
        }
    }

    fn dispatch(&mut self, action: &Action, now: Instant, effects: &mut Vec<Effect>) {
        let dispatch = router::apply(action, std::mem::take(&mut self.view));
        self.view = dispatch.state;
        if let Some(text) = dispatch.status {
            let ticket = self.status.show(&text, StatusKind::Action, now);
            effects.push(Effect::ScheduleExpiry(ticket));
        }
        if let Some(highlight) = dispatch.highlight {
            effects.push(Effect::Publish(DashboardUpdate::Highlight(highlight)));
        }
        self.sync_modal();
    }

    fn on_upload_finished(
        &mut self,
        file: String,
        result: Result<ImageRef, UploadError>,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        match result {
            Ok(image) => {
                let text = format!("uploaded {}", image.name);
                self.view.gallery.add_uploaded(image);
                self.view.view.reset();
                self.sync_modal();
                let ticket = self.status.show(&text, StatusKind::Info, now);
                effects.push(Effect::ScheduleExpiry(ticket));
            }
            Err(err) => {
                error!(file = %file, error = %err, "session: upload failed");
                let ticket = self.status.show(&format!("upload failed {file}"), StatusKind::Info, now);
                effects.push(Effect::ScheduleExpiry(ticket));
                let message = match err {
                    UploadError::Rejected { message, .. } => message,
                    other => other.to_string(),
                };
                effects.push(Effect::Publish(DashboardUpdate::UploadRejected { file, message }));
            }
        }
    }

    fn select(&mut self, name: &str) -> bool {
        let previous = self.view.gallery.selected_index();
        if !self.view.gallery.select(name) {
            debug!(name, "session: selected image is not in the gallery");
            return false;
        }
        if previous != self.view.gallery.selected_index() {
            self.view.view.reset();
        }
        self.sync_modal();
        true
    }

    fn run_modal_command(&mut self, command: ModalCommand) {
        match command {
            ModalCommand::Open { index } => {
                self.view.gallery.select_index(index);
                self.modal.open(index);
            }
            ModalCommand::Close => self.modal.close(),
            ModalCommand::ShowPrev => {
                if self.view.gallery.prev() {
                    self.view.view.reset();
                }
            }
            ModalCommand::ShowNext => {
                if self.view.gallery.next() {
                    self.view.view.reset();
                }
            }
        }
        self.sync_modal();
    }

    /// The open viewer always shows the gallery selection.
    fn sync_modal(&mut self) {
        if !self.modal.is_open() {
            return;
        }
        match self.view.gallery.selected_index() {
            Some(index) => self.modal.set_index(index),
            None => self.modal.close(),
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
