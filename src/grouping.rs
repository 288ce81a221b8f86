//! Compose-project grouping of container records.
use std::collections::BTreeMap;

use crate::container::{ContainerGroup, ContainerRecord};

/// Buckets records by compose project.
///
/// Groups are ordered by project name with the project-less group last;
/// containers within a group are ordered by name. The sort is stable, so
/// equal names keep their enumeration order. Every record lands in exactly one
/// group.
pub fn group_containers(records: &[ContainerRecord]) -> Vec<ContainerGroup> {
    let mut projects: BTreeMap<&str, Vec<ContainerRecord>> = BTreeMap::new();
    let mut ungrouped = Vec::new();

    for record in records {
        match record.compose_project.as_deref() {
            Some(project) if !project.is_empty() => {
                projects.entry(project).or_default().push(record.clone())
            }
            _ => ungrouped.push(record.clone()),
        }
    }

    let mut groups: Vec<ContainerGroup> = projects
        .into_iter()
        .map(|(project, containers)| group(project.to_owned(), containers))
        .collect();
    if !ungrouped.is_empty() {
        groups.push(group(String::new(), ungrouped));
    }
    groups
}

fn group(project_name: String, mut containers: Vec<ContainerRecord>) -> ContainerGroup {
    containers.sort_by(|a, b| a.name.cmp(&b.name));
    ContainerGroup {
        project_name,
        containers,
    }
}
