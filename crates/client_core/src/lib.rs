pub mod error;
pub mod fallback;
pub mod http;
pub mod poller;
pub mod runtime;
pub mod session;
pub mod supervisor;

pub use error::{ClientError, UploadError};
pub use fallback::TelemetryFallback;
pub use http::{DashboardApi, FusionReading, TelemetrySource, DEFAULT_FUSION_TIMEOUT};
pub use poller::{SimulatedStream, TelemetryPoller};
pub use runtime::{DashboardHandle, DashboardRuntime, RuntimeConfig};
pub use session::{
    ChannelEvent, DashboardEvent, DashboardSnapshot, DashboardState, DashboardUpdate, Effect,
    TelemetryUpdate,
};
pub use supervisor::{ChannelSink, ConnectionSupervisor, CONNECT_TIMEOUT, RECONNECT_DELAY};
