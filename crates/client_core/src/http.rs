use std::{path::Path, time::Duration};

use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::ImageRef,
    error::BackendRejection,
    protocol::{FusionDecision, SampleEntry, UploadResponse, VisionSnapshot, VoiceSnapshot},
};
use tracing::{debug, info};
use url::Url;

use crate::{
    error::{ClientError, UploadError},
    fallback::TelemetryFallback,
};

pub const DEFAULT_FUSION_TIMEOUT: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetrySource {
    Live,
    Simulated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionReading {
    pub decision: FusionDecision,
    pub source: TelemetrySource,
}

/// Typed client for the backend's HTTP surface.
#[derive(Debug, Clone)]
pub struct DashboardApi {
    http: Client,
    base: Url,
}

impl DashboardApi {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(server_url.trim()).map_err(|source| ClientError::InvalidUrl {
            url: server_url.to_string(),
            source,
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::UnsupportedScheme(server_url.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Push channel endpoint: the server url with `ws`/`wss` scheme and `/ws` path.
    pub fn channel_url(&self) -> Result<Url, ClientError> {
        let scheme = match self.base.scheme() {
            "https" => "wss",
            _ => "ws",
        };
        let mut url = self.endpoint("ws");
        url.set_scheme(scheme)
            .map_err(|()| ClientError::UnsupportedScheme(self.base.to_string()))?;
        Ok(url)
    }

    /// Where the image bytes of `name` are served.
    pub fn sample_url(&self, name: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("samples").push(name);
        }
        url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(path);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        timeout: Option<Duration>,
    ) -> Result<T, ClientError> {
        let mut request = self.http.get(self.endpoint(endpoint));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|err| ClientError::transport(endpoint, err))?;
        let response = ensure_success(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::transport(endpoint, err))
    }

    pub async fn fusion(&self, timeout: Duration) -> Result<FusionDecision, ClientError> {
        self.get_json("fusion", Some(timeout)).await
    }

    /// Live decision if `/fusion` answers within `timeout`, otherwise the
    /// deterministic fallback for `now`.
    pub async fn fusion_or_simulated(
        &self,
        timeout: Duration,
        fallback: &TelemetryFallback,
        now: f64,
    ) -> FusionReading {
        match self.fusion(timeout).await {
            Ok(decision) => FusionReading {
                decision,
                source: TelemetrySource::Live,
            },
            Err(err) => {
                debug!(error = %err, "fusion: using simulated decision");
                FusionReading {
                    decision: fallback.sample(now),
                    source: TelemetrySource::Simulated,
                }
            }
        }
    }

    pub async fn vision(&self) -> Result<VisionSnapshot, ClientError> {
        self.get_json("vision", None).await
    }

    pub async fn voice(&self) -> Result<VoiceSnapshot, ClientError> {
        self.get_json("voice", None).await
    }

    pub async fn list_samples(&self) -> Result<Vec<ImageRef>, ClientError> {
        let entries: Vec<SampleEntry> = self.get_json("samples", None).await?;
        Ok(entries.into_iter().map(ImageRef::from).collect())
    }

    pub async fn upload_file(&self, path: &Path) -> Result<ImageRef, UploadError> {
        let display = path.display().to_string();
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| UploadError::MissingFileName(display.clone()))?
            .to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| UploadError::ReadFile {
                path: display,
                source,
            })?;
        self.upload_bytes(&filename, bytes).await
    }

    pub async fn upload_bytes(&self, filename: &str, bytes: Vec<u8>) -> Result<ImageRef, UploadError> {
        let size = bytes.len() as u64;
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime.essence_str())
            .map_err(UploadError::Transport)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(UploadError::Transport)?;
        let response = ensure_success(response).await?;
        let body: UploadResponse = response.json().await.map_err(UploadError::InvalidResponse)?;

        let mut image = ImageRef::from(body.saved);
        if image.size.is_none() {
            image.size = Some(size);
        }
        info!(name = %image.name, size, "upload: stored image");
        Ok(image)
    }
}

async fn ensure_success(response: Response) -> Result<Response, BackendRejection> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendRejection::from_body(status.as_u16(), &body))
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
