use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyDataStream, BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use serde::de::DeserializeOwned;

use super::models::ErrorMessage;
use super::transport::UnixConnector;
use super::{
    ContainerInspect, ContainerRuntime, ContainerSummary, Error, ImageInspect, LogReader, Result,
    StatsResponse,
};

/// Timeout for listing, inspection and stats calls.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for the restart action.
pub const RESTART_TIMEOUT: Duration = Duration::from_secs(10);

const POOL_MAX_IDLE_PER_HOST: usize = 2;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_TAIL: u32 = 100;

static SHARED: OnceLock<Arc<RuntimeClient>> = OnceLock::new();

/// Pooled HTTP/1 client speaking the Docker Engine API over a Unix socket.
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    client: Client<UnixConnector, Full<Bytes>>,
    socket_path: PathBuf,
    call_timeout: Duration,
    restart_timeout: Duration,
}

impl RuntimeClient {
    /// Creates a client for the socket at `socket_path`.
    ///
    /// No connection is made until the first request.
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        let connector = UnixConnector::new(&socket_path);
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .pool_timer(TokioTimer::new())
            .build(connector);

        Self {
            client,
            socket_path: socket_path.as_ref().to_path_buf(),
            call_timeout: CALL_TIMEOUT,
            restart_timeout: RESTART_TIMEOUT,
        }
    }

    /// Returns the process-wide client, constructing it on first use.
    ///
    /// Later calls return the same instance; a differing `socket_path` is
    /// ignored and reported as a warning.
    pub fn shared(socket_path: impl AsRef<Path>) -> Arc<Self> {
        let socket_path = socket_path.as_ref();
        let client = SHARED.get_or_init(|| {
            log::debug!("Creating runtime client for {}", socket_path.display());
            Arc::new(Self::new(socket_path))
        });
        if client.socket_path != socket_path {
            log::warn!(
                "Runtime client already bound to {}, ignoring {}",
                client.socket_path.display(),
                socket_path.display()
            );
        }
        Arc::clone(client)
    }

    pub fn with_timeouts(mut self, call_timeout: Duration, restart_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self.restart_timeout = restart_timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn send(&self, method: Method, path: &str) -> Result<Response<Incoming>> {
        log::debug!("{method} {path}");
        let request = Request::builder()
            .method(method)
            .uri(format!("http://localhost{path}"))
            .body(Full::new(Bytes::new()))
            .map_err(|source| Error::Request {
                path: path.to_owned(),
                source,
            })?;

        self.client
            .request(request)
            .await
            .map_err(|source| Error::Transport {
                path: path.to_owned(),
                source,
            })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = with_timeout(path, self.call_timeout, async {
            let response = self.send(Method::GET, path).await?;
            let status = response.status();
            let body = read_body(path, response).await?;
            if !status.is_success() {
                return Err(status_error(path, status, &body));
            }
            Ok(body)
        })
        .await?;

        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            path: path.to_owned(),
            source,
        })
    }
}

impl ContainerRuntime for RuntimeClient {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        self.get_json("/containers/json?all=1").await
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspect> {
        self.get_json(&format!("/containers/{id}/json")).await
    }

    async fn inspect_image(&self, image_id: &str) -> Result<ImageInspect> {
        self.get_json(&format!("/images/{image_id}/json")).await
    }

    async fn sample_stats(&self, id: &str) -> Result<StatsResponse> {
        self.get_json(&format!("/containers/{id}/stats?stream=false"))
            .await
    }

    async fn restart_container(&self, id: &str) -> Result<()> {
        let path = format!("/containers/{id}/restart");
        with_timeout(&path, self.restart_timeout, async {
            let response = self.send(Method::POST, &path).await?;
            let status = response.status();
            if status == StatusCode::NO_CONTENT {
                return Ok(());
            }
            let body = read_body(&path, response).await?;
            Err(status_error(&path, status, &body))
        })
        .await
    }

    async fn stream_logs(&self, id: &str) -> Result<LogReader> {
        let path = format!(
            "/containers/{id}/logs?follow=true&stdout=true&stderr=true&tail={LOG_TAIL}&timestamps=false"
        );
        let response = self.send(Method::GET, &path).await?;
        let status = response.status();
        if status != StatusCode::OK {
            let body = read_body(&path, response).await?;
            return Err(status_error(&path, status, &body));
        }

        let stream = BodyDataStream::new(response.into_body()).map_err(std::io::Error::other);
        Ok(Box::pin(tokio_util::io::StreamReader::new(stream)))
    }
}

async fn with_timeout<T>(
    path: &str,
    timeout: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| Error::Timeout {
            path: path.to_owned(),
            timeout,
        })?
}

async fn read_body(path: &str, response: Response<Incoming>) -> Result<Bytes> {
    Ok(response
        .into_body()
        .collect()
        .await
        .map_err(|source| Error::Body {
            path: path.to_owned(),
            source,
        })?
        .to_bytes())
}

fn status_error(path: &str, status: StatusCode, body: &[u8]) -> Error {
    let message = match serde_json::from_slice::<ErrorMessage>(body) {
        Ok(err) => err.message,
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_owned();
            if text.is_empty() {
                status.canonical_reason().unwrap_or_default().to_owned()
            } else {
                text
            }
        }
    };

    Error::Status {
        path: path.to_owned(),
        status,
        message,
    }
}
