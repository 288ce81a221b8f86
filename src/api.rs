use std::path::Path;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::broadcast::Scheduler;
use crate::config::FeatureFlags;
use crate::container::ContainerID;
use crate::discovery::Enricher;
use crate::hostinfo::{self, SystemMetricsProvider};
use crate::runtime::ContainerRuntime;
use crate::snapshot::SnapshotService;
use crate::stats::Sampler;

pub mod models;
mod ws;

use models::{error_json, to_json};

/// Shared handler state.
pub struct AppState<R> {
    pub runtime: Arc<R>,
    pub snapshots: SnapshotService<R>,
    pub sampler: Sampler,
    pub metrics: Arc<dyn SystemMetricsProvider>,
    pub flags: FeatureFlags,
    pub scheduler: Scheduler,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            snapshots: self.snapshots.clone(),
            sampler: self.sampler.clone(),
            metrics: Arc::clone(&self.metrics),
            flags: self.flags,
            scheduler: self.scheduler,
        }
    }
}

impl<R: ContainerRuntime> AppState<R> {
    pub fn new(
        runtime: Arc<R>,
        enricher: Enricher,
        sampler: Sampler,
        metrics: Arc<dyn SystemMetricsProvider>,
        flags: FeatureFlags,
    ) -> Self {
        Self {
            snapshots: SnapshotService::new(Arc::clone(&runtime), enricher, flags),
            runtime,
            sampler,
            metrics,
            flags,
            scheduler: Scheduler::default(),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    async fn snapshot_json(&self) -> Result<String, String> {
        match self.snapshots.build().await {
            Ok(snapshot) => Ok(to_json(&snapshot)),
            Err(err) => {
                log::error!("Failed to get containers: {err}");
                Err(format!("Failed to get containers: {err}"))
            }
        }
    }

    async fn stats_json(&self) -> Result<String, String> {
        match self.sampler.sample_all(&self.runtime).await {
            Ok(stats) => Ok(to_json(&stats)),
            Err(err) => {
                log::error!("Failed to get container stats: {err}");
                Err(format!("Failed to get container stats: {err}"))
            }
        }
    }

    async fn hostinfo_json(&self) -> Result<String, String> {
        match hostinfo::collect_blocking(Arc::clone(&self.metrics)).await {
            Ok(metrics) => Ok(to_json(&metrics)),
            Err(err) => {
                log::error!("Failed to get system metrics: {err}");
                Err("Failed to get system metrics".to_owned())
            }
        }
    }
}

fn json_response(body: String) -> Response {
    (
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

async fn get_containers<R: ContainerRuntime>(State(state): State<AppState<R>>) -> Response {
    match state.snapshot_json().await {
        Ok(body) => json_response(body),
        Err(message) => (StatusCode::BAD_GATEWAY, message).into_response(),
    }
}

async fn get_container_stats<R: ContainerRuntime>(State(state): State<AppState<R>>) -> Response {
    match state.stats_json().await {
        Ok(body) => json_response(body),
        Err(message) => (StatusCode::BAD_GATEWAY, message).into_response(),
    }
}

async fn get_hostinfo<R: ContainerRuntime>(State(state): State<AppState<R>>) -> Response {
    match state.hostinfo_json().await {
        Ok(body) => json_response(body),
        Err(message) => (StatusCode::INTERNAL_SERVER_ERROR, message).into_response(),
    }
}

async fn ws_containers<R: ContainerRuntime>(
    upgrade: WebSocketUpgrade,
    State(state): State<AppState<R>>,
) -> Response {
    let scheduler = state.scheduler;
    upgrade.on_upgrade(move |socket| {
        ws::broadcast(socket, scheduler, move || {
            let state = state.clone();
            async move { state.snapshot_json().await.unwrap_or_else(|e| error_json(&e)) }
        })
    })
}

async fn ws_container_stats<R: ContainerRuntime>(
    upgrade: WebSocketUpgrade,
    State(state): State<AppState<R>>,
) -> Response {
    let scheduler = state.scheduler;
    upgrade.on_upgrade(move |socket| {
        ws::broadcast(socket, scheduler, move || {
            let state = state.clone();
            async move { state.stats_json().await.unwrap_or_else(|e| error_json(&e)) }
        })
    })
}

async fn ws_hostinfo<R: ContainerRuntime>(
    upgrade: WebSocketUpgrade,
    State(state): State<AppState<R>>,
) -> Response {
    let scheduler = state.scheduler;
    upgrade.on_upgrade(move |socket| {
        ws::broadcast(socket, scheduler, move || {
            let state = state.clone();
            async move { state.hostinfo_json().await.unwrap_or_else(|e| error_json(&e)) }
        })
    })
}

/// Validates a path-supplied container reference.
fn container_id(raw: &str) -> Result<ContainerID, Response> {
    ContainerID::new(raw).map_err(|err| {
        log::debug!("{err}");
        (StatusCode::BAD_REQUEST, "invalid container id").into_response()
    })
}

async fn ws_container_logs<R: ContainerRuntime>(
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    UrlPath(id): UrlPath<String>,
    State(state): State<AppState<R>>,
) -> Response {
    let id = match container_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match upgrade {
        Ok(upgrade) => {
            upgrade.on_upgrade(move |socket| ws::stream_logs(socket, state.runtime, id))
        }
        Err(rejection) => rejection.into_response(),
    }
}

async fn ws_container_restart<R: ContainerRuntime>(
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    UrlPath(id): UrlPath<String>,
    State(state): State<AppState<R>>,
) -> Response {
    if !state.flags.restart_enabled() {
        return (StatusCode::FORBIDDEN, "Container restart is disabled").into_response();
    }
    let id = match container_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match upgrade {
        Ok(upgrade) => upgrade
            .on_upgrade(move |socket| ws::restart(socket, state.runtime, state.flags, id)),
        Err(rejection) => rejection.into_response(),
    }
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    /// Builds the dashboard router. Paths outside the API are served from
    /// `static_dir` when given.
    pub fn new<R: ContainerRuntime>(state: AppState<R>, static_dir: Option<&Path>) -> Self {
        let router = axum::Router::new()
            .route("/api/containers", get(get_containers::<R>))
            .route("/api/containers/stats", get(get_container_stats::<R>))
            .route("/api/hostinfo", get(get_hostinfo::<R>))
            .route("/ws/containers", get(ws_containers::<R>))
            .route("/ws/containers/stats", get(ws_container_stats::<R>))
            .route("/ws/hostinfo", get(ws_hostinfo::<R>))
            .route("/ws/containers/{id}/logs", get(ws_container_logs::<R>))
            .route("/ws/containers/{id}/restart", get(ws_container_restart::<R>))
            .with_state(state);

        let router = match static_dir {
            Some(dir) => router.fallback_service(tower_http::services::ServeDir::new(dir)),
            None => router,
        };
        Self { router }
    }

    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    pub async fn listen(self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router.into_make_service()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::LabelPolicy;
    use crate::fanout::FanOut;
    use crate::hostinfo::SystemMetrics;
    use crate::runtime::fake::FakeRuntime;
    use crate::runtime::models::{CpuStats, InspectState};
    use crate::runtime::{ContainerInspect, ContainerSummary, StatsResponse};
    use crate::logs::{FrameHeader, StreamKind};
    use axum::body::Body;
    use axum::http::Request;
    use futures_util::{Stream, StreamExt};
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::{self, Message};
    use tower::ServiceExt;

    struct FixedMetrics(Option<SystemMetrics>);

    impl SystemMetricsProvider for FixedMetrics {
        fn collect(&self) -> hostinfo::Result<SystemMetrics> {
            self.0.clone().ok_or(hostinfo::Error::Poisoned)
        }
    }

    fn runtime() -> FakeRuntime {
        let mut runtime = FakeRuntime::default();
        runtime.summaries.push(ContainerSummary {
            id: "0123456789abcdef".to_owned(),
            names: vec!["/web".to_owned()],
            state: "running".to_owned(),
            ..Default::default()
        });
        runtime.inspects.insert(
            "0123456789abcdef".to_owned(),
            ContainerInspect {
                state: InspectState {
                    status: "running".to_owned(),
                    running: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        runtime.stats.insert(
            "0123456789abcdef".to_owned(),
            StatsResponse {
                cpu_stats: CpuStats {
                    system_cpu_usage: Some(100),
                    online_cpus: Some(1),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        runtime
    }

    fn router(runtime: FakeRuntime, flags: FeatureFlags, metrics: Option<SystemMetrics>) -> axum::Router {
        let state = AppState::new(
            Arc::new(runtime),
            Enricher::new(LabelPolicy::All, "commit", FanOut::new(2)),
            Sampler::new(FanOut::new(2)),
            Arc::new(FixedMetrics(metrics)),
            flags,
        );
        APIServer::new(state, None).router()
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    const ALL_ON: FeatureFlags = FeatureFlags::Fixed {
        logs: true,
        restart: true,
    };
    const ALL_OFF: FeatureFlags = FeatureFlags::Fixed {
        logs: false,
        restart: false,
    };

    #[tokio::test]
    async fn test_get_containers() {
        let (status, body) = get(router(runtime(), ALL_ON, None), "/api/containers").await;
        assert_eq!(status, StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["containers"][0]["ID"], "0123456789ab");
        assert_eq!(value["containers"][0]["Name"], "web");
        assert_eq!(value["logs_show"], true);
        assert_eq!(value["container_restart"], true);
    }

    #[tokio::test]
    async fn test_get_containers_upstream_failure() {
        let mut runtime = runtime();
        runtime.list_fails = true;
        let (status, body) = get(router(runtime, ALL_ON, None), "/api/containers").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.starts_with("Failed to get containers: "), "{body}");
    }

    #[tokio::test]
    async fn test_get_container_stats() {
        let (status, body) = get(router(runtime(), ALL_ON, None), "/api/containers/stats").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value[0]["id"], "0123456789ab");
        assert_eq!(value[0]["cpu_usage_cores"], 0.0);
    }

    #[tokio::test]
    async fn test_get_hostinfo() {
        let metrics = SystemMetrics {
            cpu: vec![3.0],
            ..Default::default()
        };
        let (status, body) = get(router(runtime(), ALL_ON, Some(metrics)), "/api/hostinfo").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["cpu"][0], 3.0);

        let (status, body) = get(router(runtime(), ALL_ON, None), "/api/hostinfo").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to get system metrics");
    }

    #[tokio::test]
    async fn test_restart_disabled_is_forbidden_before_upgrade() {
        let runtime = runtime();
        let (status, _) = get(router(runtime, ALL_OFF, None), "/ws/containers/web/restart").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_logs_route_ignores_logs_flag() {
        let (status, _) = get(router(runtime(), ALL_OFF, None), "/ws/containers/web/logs").await;
        assert_ne!(status, StatusCode::FORBIDDEN);
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_invalid_container_id_is_rejected() {
        let (status, body) =
            get(router(runtime(), ALL_ON, None), "/ws/containers/web$1/restart").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "invalid container id");

        let (status, _) =
            get(router(runtime(), ALL_ON, None), "/ws/containers/%2E%2E%2Fimages/logs").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plain_request_to_websocket_route_is_rejected() {
        let (status, _) = get(router(runtime(), ALL_ON, None), "/ws/containers/web/restart").await;
        assert!(status.is_client_error());
        assert_ne!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_path_without_static_dir() {
        let (status, _) = get(router(runtime(), ALL_ON, None), "/index.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_files_are_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>dashboard</h1>").unwrap();
        let state = AppState::new(
            Arc::new(runtime()),
            Enricher::new(LabelPolicy::All, "commit", FanOut::new(2)),
            Sampler::default(),
            Arc::new(FixedMetrics(None)),
            ALL_ON,
        );
        let router = APIServer::new(state, Some(dir.path())).router();

        let (status, body) = get(router, "/index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>dashboard</h1>");
    }

    async fn serve(runtime: Arc<FakeRuntime>, flags: FeatureFlags) -> SocketAddr {
        let state = AppState::new(
            runtime,
            Enricher::new(LabelPolicy::All, "commit", FanOut::new(2)),
            Sampler::new(FanOut::new(2)),
            Arc::new(FixedMetrics(None)),
            flags,
        )
        .with_scheduler(Scheduler::new(Duration::from_millis(50)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = APIServer::new(state, None).router();
        tokio::spawn(async move {
            axum::serve(listener, router.into_make_service())
                .await
                .unwrap()
        });
        addr
    }

    /// Next text frame, or `None` once the server closes the connection.
    async fn next_text<S>(ws: &mut S) -> Option<serde_json::Value>
    where
        S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        loop {
            let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("timed out waiting for a frame");
            match frame {
                Some(Ok(Message::Text(text))) => {
                    return Some(serde_json::from_str(text.as_str()).unwrap());
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
                Some(Ok(_)) => continue,
            }
        }
    }

    fn frame(stream: StreamKind, payload: &[u8]) -> Vec<u8> {
        let header = FrameHeader {
            stream,
            len: payload.len() as u32,
        };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[tokio::test]
    async fn test_ws_containers_pushes_until_client_closes() {
        let runtime = Arc::new(runtime());
        let addr = serve(Arc::clone(&runtime), ALL_ON).await;

        let (mut ws, _) = connect_async(format!("ws://{addr}/ws/containers"))
            .await
            .unwrap();
        let snapshot = next_text(&mut ws).await.unwrap();
        assert_eq!(snapshot["total"], 1);
        assert_eq!(snapshot["containers"][0]["ID"], "0123456789ab");

        let second = next_text(&mut ws).await.unwrap();
        assert_eq!(second["total"], 1);

        ws.close(None).await.unwrap();
        drop(ws);
        tokio::time::sleep(Duration::from_millis(200)).await;
        let settled = runtime.count_calls("list");
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(runtime.count_calls("list"), settled);
    }

    #[tokio::test]
    async fn test_ws_logs_forwards_frames() {
        let mut fake = runtime();
        let mut bytes = frame(StreamKind::Stdout, b"listening on :80\n");
        bytes.extend(frame(StreamKind::Stderr, b"warning: no tls\n"));
        fake.logs.insert("web".to_owned(), bytes);
        let addr = serve(Arc::new(fake), ALL_OFF).await;

        let (mut ws, _) = connect_async(format!("ws://{addr}/ws/containers/web/logs"))
            .await
            .unwrap();
        assert_eq!(
            next_text(&mut ws).await.unwrap(),
            serde_json::json!({"log": "listening on :80\n"})
        );
        assert_eq!(
            next_text(&mut ws).await.unwrap(),
            serde_json::json!({"log": "warning: no tls\n"})
        );
        assert_eq!(next_text(&mut ws).await, None);
    }

    #[tokio::test]
    async fn test_ws_logs_reports_open_failure() {
        let addr = serve(Arc::new(runtime()), ALL_ON).await;

        let (mut ws, _) = connect_async(format!("ws://{addr}/ws/containers/ghost/logs"))
            .await
            .unwrap();
        let message = next_text(&mut ws).await.unwrap();
        assert_eq!(message["error"], "Failed to get logs: No such container: ghost");
        assert_eq!(next_text(&mut ws).await, None);
    }

    #[tokio::test]
    async fn test_ws_restart_replies_once_and_closes() {
        let runtime = Arc::new(runtime());
        let addr = serve(Arc::clone(&runtime), ALL_ON).await;

        let (mut ws, _) = connect_async(format!("ws://{addr}/ws/containers/web/restart"))
            .await
            .unwrap();
        assert_eq!(
            next_text(&mut ws).await.unwrap(),
            serde_json::json!({
                "status": "success",
                "message": crate::action::RESTART_SUCCESS,
            })
        );
        assert_eq!(next_text(&mut ws).await, None);
        assert_eq!(runtime.calls(), vec!["restart:web".to_owned()]);
    }
}
