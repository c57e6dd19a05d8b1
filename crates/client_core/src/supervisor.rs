//! Owns the single push channel to the backend and keeps it alive.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::StreamExt;
use shared::{
    domain::ConnectionState,
    protocol::{decode_frame, Action, ChannelMessage},
};
use tokio::{task::JoinHandle, time::timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);
/// Upper bound on one connect attempt, handshake included.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Receiver of everything the channel produces. Callbacks run on the
/// supervisor task, one at a time and in arrival order.
#[async_trait]
pub trait ChannelSink: Send + Sync + 'static {
    async fn on_action(&self, action: Action);
    async fn on_message(&self, text: String);
    /// `retry_in` is set when a reconnect attempt has been scheduled.
    async fn on_state(&self, state: ConnectionState, retry_in: Option<Duration>);
}

pub struct ConnectionSupervisor {
    url: Url,
    reconnect_delay: Duration,
    connect_timeout: Duration,
    task: Option<JoinHandle<()>>,
}

impl ConnectionSupervisor {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            reconnect_delay: RECONNECT_DELAY,
            connect_timeout: CONNECT_TIMEOUT,
            task: None,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Starts the channel loop, replacing any channel this supervisor
    /// already owns. The previous one is fully stopped first.
    pub async fn start(&mut self, sink: Arc<dyn ChannelSink>) {
        self.stop().await;
        let url = self.url.clone();
        let delay = self.reconnect_delay;
        let connect_timeout = self.connect_timeout;
        self.task = Some(tokio::spawn(run_channel(url, delay, connect_timeout, sink)));
    }

    /// Tears the channel down. Once this returns the sink receives no
    /// further callbacks.
    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            debug!(url = %self.url, "channel: stopped");
        }
    }
}

impl Drop for ConnectionSupervisor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_channel(
    url: Url,
    delay: Duration,
    connect_timeout: Duration,
    sink: Arc<dyn ChannelSink>,
) {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        sink.on_state(ConnectionState::Connecting, None).await;
        match timeout(connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((mut stream, _))) => {
                info!(%url, attempt, "channel: connected");
                attempt = 0;
                sink.on_state(ConnectionState::Open, None).await;
                while let Some(frame) = stream.next().await {
                    match frame {
                        Ok(Message::Text(text)) => deliver(sink.as_ref(), &text).await,
                        Ok(Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(err) => {
                            warn!(%url, error = %err, "channel: receive failed");
                            break;
                        }
                    }
                }
                info!(%url, "channel: closed");
            }
            Ok(Err(err)) => {
                warn!(%url, attempt, error = %err, "channel: connect failed");
            }
            Err(_) => {
                warn!(
                    %url,
                    attempt,
                    timeout_ms = connect_timeout.as_millis() as u64,
                    "channel: connect timed out"
                );
            }
        }
        info!(%url, retry_in_ms = delay.as_millis() as u64, "channel: reconnect scheduled");
        sink.on_state(ConnectionState::Closed, Some(delay)).await;
        tokio::time::sleep(delay).await;
    }
}

async fn deliver(sink: &dyn ChannelSink, text: &str) {
    match decode_frame(text) {
        Ok(Some(ChannelMessage::Action(action))) => sink.on_action(action).await,
        Ok(Some(ChannelMessage::Message { text })) => sink.on_message(text).await,
        Ok(None) => debug!("channel: ignoring frame of unknown type"),
        Err(err) => warn!(error = %err, "channel: dropping malformed frame"),
    }
}
