use std::collections::{BTreeMap, HashMap};

/// Label carrying the compose project a container belongs to.
pub const COMPOSE_PROJECT_LABEL: &str = "com.docker.compose.project";

/// Label carrying the commit an image was built from.
pub const DEFAULT_COMMIT_LABEL: &str = "org.quickex.frontend.commit";

/// Which container labels are shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Every label is kept.
    #[default]
    All,
    /// Only labels whose key starts with the prefix are kept.
    Include(String),
    /// Labels whose key starts with the prefix are dropped.
    Exclude(String),
}

impl LabelPolicy {
    /// Builds the policy from the optional include and exclude prefixes.
    ///
    /// The include prefix wins when both are set; empty prefixes count as unset.
    pub fn from_prefixes(include: Option<&str>, exclude: Option<&str>) -> Self {
        match (
            include.filter(|p| !p.is_empty()),
            exclude.filter(|p| !p.is_empty()),
        ) {
            (Some(include), _) => Self::Include(include.to_owned()),
            (None, Some(exclude)) => Self::Exclude(exclude.to_owned()),
            (None, None) => Self::All,
        }
    }

    pub fn filter(&self, labels: &HashMap<String, String>) -> BTreeMap<String, String> {
        labels
            .iter()
            .filter(|(key, _)| self.keeps(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    fn keeps(&self, key: &str) -> bool {
        match self {
            Self::All => true,
            Self::Include(prefix) => key.starts_with(prefix.as_str()),
            Self::Exclude(prefix) => !key.starts_with(prefix.as_str()),
        }
    }
}

/// Reads the compose project from unfiltered labels. Empty values count as
/// no project.
pub fn compose_project(labels: &HashMap<String, String>) -> Option<String> {
    labels
        .get(COMPOSE_PROJECT_LABEL)
        .filter(|project| !project.is_empty())
        .cloned()
}
