use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::labels::{LabelPolicy, compose_project};
use super::resources::deploy_resources;
use super::{Error, Result};
use crate::container::{self, ContainerRecord, ContainerState, HealthStatus};
use crate::error::ResultOkLogExt;
use crate::fanout::{self, FanOut};
use crate::runtime::{ContainerInspect, ContainerRuntime, ContainerSummary, ImageInspect};

/// Turns the runtime's container summaries into dashboard records.
///
/// Each summary is enriched by one task on a bounded [`FanOut`]; the output
/// keeps enumeration order and silently loses containers whose enrichment
/// failed.
#[derive(Debug, Clone)]
pub struct Enricher {
    policy: Arc<LabelPolicy>,
    commit_label: Arc<str>,
    fanout: FanOut,
}

struct Context<R> {
    runtime: Arc<R>,
    policy: Arc<LabelPolicy>,
    commit_label: Arc<str>,
}

impl Enricher {
    pub fn new(policy: LabelPolicy, commit_label: impl Into<Arc<str>>, fanout: FanOut) -> Self {
        Self {
            policy: Arc::new(policy),
            commit_label: commit_label.into(),
            fanout,
        }
    }

    /// Lists every container and enriches the result.
    ///
    /// # Errors
    ///
    /// Only a failed listing is an error. Individual containers that cannot be
    /// enriched are logged and left out.
    pub async fn enumerate<R: ContainerRuntime>(
        &self,
        runtime: &Arc<R>,
    ) -> Result<Vec<ContainerRecord>> {
        let summaries = runtime.list_containers().await.map_err(Error::List)?;
        Ok(self.enrich(runtime, summaries).await)
    }

    pub async fn enrich<R: ContainerRuntime>(
        &self,
        runtime: &Arc<R>,
        summaries: Vec<ContainerSummary>,
    ) -> Vec<ContainerRecord> {
        let ctx = Arc::new(Context {
            runtime: Arc::clone(runtime),
            policy: Arc::clone(&self.policy),
            commit_label: Arc::clone(&self.commit_label),
        });

        let slots = self
            .fanout
            .run(summaries, move |summary| {
                let ctx = Arc::clone(&ctx);
                let summary = summary.clone();
                async move { ctx.enrich_one(&summary).await }
            })
            .await;

        fanout::compact(slots, "container")
    }
}

impl<R: ContainerRuntime> Context<R> {
    async fn enrich_one(&self, summary: &ContainerSummary) -> Result<ContainerRecord> {
        let inspect = self
            .runtime
            .inspect_container(&summary.id)
            .await
            .map_err(|source| Error::Inspect {
                id: summary.id.clone(),
                source,
            })?;

        let labelled = commit_label_value(summary, &self.commit_label).is_some();
        let image = if !labelled && !summary.image_id.is_empty() {
            self.runtime
                .inspect_image(&summary.image_id)
                .await
                .ok_log(format_args!(
                    "failed to inspect image `{}` of container `{}`",
                    summary.image_id,
                    summary.display_name()
                ))
        } else {
            None
        };

        build_record(
            summary,
            &inspect,
            image.as_ref(),
            &self.policy,
            &self.commit_label,
            Utc::now(),
        )
    }
}

fn commit_label_value<'a>(summary: &'a ContainerSummary, label: &str) -> Option<&'a str> {
    summary
        .labels
        .get(label)
        .map(String::as_str)
        .filter(|commit| !commit.is_empty())
}

/// Assembles one record from the runtime's answers.
///
/// `image` is only consulted when the commit label is absent.
pub(crate) fn build_record(
    summary: &ContainerSummary,
    inspect: &ContainerInspect,
    image: Option<&ImageInspect>,
    policy: &LabelPolicy,
    commit_label: &str,
    now: DateTime<Utc>,
) -> Result<ContainerRecord> {
    let state: ContainerState =
        inspect
            .state
            .status
            .parse()
            .map_err(|source: container::Error| Error::State {
                id: summary.id.clone(),
                source,
            })?;

    let (tag_commit, image_created_at) = match commit_label_value(summary, commit_label) {
        Some(commit) => (commit.to_owned(), String::new()),
        None => image
            .map(|image| {
                (
                    image.repo_tags.first().cloned().unwrap_or_default(),
                    image.created.clone(),
                )
            })
            .unwrap_or_default(),
    };

    let uptime = if state.is_running() {
        uptime_since(&inspect.state.started_at, now).unwrap_or_default()
    } else {
        String::new()
    };

    Ok(ContainerRecord {
        id: container::short_id(&summary.id).to_owned(),
        name: summary.display_name().to_owned(),
        image: summary.image.clone(),
        tag_commit,
        image_created_at,
        created_at: inspect.created.clone(),
        uptime,
        state,
        health: inspect
            .state
            .health
            .as_ref()
            .map(|health| HealthStatus::from_runtime(&health.status))
            .unwrap_or_default(),
        running: inspect.state.running,
        restarted: inspect.state.restart_count > 0,
        labels: policy.filter(&summary.labels),
        compose_project: compose_project(&summary.labels),
        deploy_resources: deploy_resources(&inspect.host_config),
    })
}

/// Uptime from an RFC 3339 start time. Start times in the future count as zero.
fn uptime_since(started_at: &str, now: DateTime<Utc>) -> Option<String> {
    if started_at.is_empty() {
        return None;
    }
    let started = match DateTime::parse_from_rfc3339(started_at) {
        Ok(started) => started.with_timezone(&Utc),
        Err(err) => {
            log::debug!("unparsable start time `{started_at}`: {err}");
            return None;
        }
    };
    let elapsed = (now - started).to_std().unwrap_or(Duration::ZERO);
    Some(container::format_uptime(elapsed))
}
