//! In-memory [`ContainerRuntime`] for tests.
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use hyper::StatusCode;

use super::{
    ContainerInspect, ContainerRuntime, ContainerSummary, Error, ImageInspect, LogReader, Result,
    StatsResponse,
};

#[derive(Debug, Default)]
pub(crate) struct FakeRuntime {
    pub summaries: Vec<ContainerSummary>,
    pub inspects: HashMap<String, ContainerInspect>,
    pub images: HashMap<String, ImageInspect>,
    pub stats: HashMap<String, StatsResponse>,
    pub failing_stats: HashSet<String>,
    pub logs: HashMap<String, Vec<u8>>,
    pub delays: HashMap<String, Duration>,
    pub list_fails: bool,
    /// Status answered to restarts; `None` means `204 No Content`.
    pub restart_status: Option<(StatusCode, String)>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeRuntime {
    /// Calls made so far, as `<operation>:<argument>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    fn record(&self, operation: &str, arg: &str) {
        self.calls.lock().unwrap().push(format!("{operation}:{arg}"));
    }

    async fn delay(&self, id: &str) {
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
    }
}

fn status(path: String, status: StatusCode, message: &str) -> Error {
    Error::Status {
        path,
        status,
        message: message.to_owned(),
    }
}

impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        self.record("list", "");
        if self.list_fails {
            return Err(Error::Timeout {
                path: "/containers/json?all=1".to_owned(),
                timeout: Duration::from_secs(5),
            });
        }
        Ok(self.summaries.clone())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspect> {
        self.record("inspect", id);
        self.delay(id).await;
        self.inspects.get(id).cloned().ok_or_else(|| {
            status(
                format!("/containers/{id}/json"),
                StatusCode::NOT_FOUND,
                &format!("No such container: {id}"),
            )
        })
    }

    async fn inspect_image(&self, image_id: &str) -> Result<ImageInspect> {
        self.record("inspect_image", image_id);
        self.images.get(image_id).cloned().ok_or_else(|| {
            status(
                format!("/images/{image_id}/json"),
                StatusCode::NOT_FOUND,
                &format!("No such image: {image_id}"),
            )
        })
    }

    async fn sample_stats(&self, id: &str) -> Result<StatsResponse> {
        self.record("stats", id);
        self.delay(id).await;
        if self.failing_stats.contains(id) {
            return Err(status(
                format!("/containers/{id}/stats?stream=false"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "cgroup read failed",
            ));
        }
        self.stats.get(id).cloned().ok_or_else(|| {
            status(
                format!("/containers/{id}/stats?stream=false"),
                StatusCode::CONFLICT,
                &format!("container {id} is not running"),
            )
        })
    }

    async fn restart_container(&self, id: &str) -> Result<()> {
        self.record("restart", id);
        match &self.restart_status {
            None => Ok(()),
            Some((code, message)) => Err(status(
                format!("/containers/{id}/restart"),
                *code,
                message,
            )),
        }
    }

    async fn stream_logs(&self, id: &str) -> Result<LogReader> {
        self.record("logs", id);
        match self.logs.get(id) {
            Some(bytes) => Ok(Box::pin(std::io::Cursor::new(bytes.clone()))),
            None => Err(status(
                format!("/containers/{id}/logs"),
                StatusCode::NOT_FOUND,
                &format!("No such container: {id}"),
            )),
        }
    }
}
