use crate::container::{DeployResources, format_cpu_cores, format_memory};
use crate::runtime::models::HostConfig;

const NANO_CPUS_PER_CORE: f64 = 1e9;
const CPU_SHARES_PER_CORE: f64 = 1024.0;

/// Derives the displayed limits and reservations from a container's host
/// configuration. Returns `None` when nothing is configured.
pub fn deploy_resources(host: &HostConfig) -> Option<DeployResources> {
    DeployResources {
        cpu_limit: cpu_limit(host).map(format_cpu_cores),
        memory_limit: positive(host.memory).map(format_memory),
        cpu_reservation: positive(host.cpu_shares)
            .map(|shares| format_cpu_cores(shares as f64 / CPU_SHARES_PER_CORE)),
        memory_reservation: positive(host.memory_reservation).map(format_memory),
    }
    .non_empty()
}

/// CPU limit in cores: `NanoCpus` when set, otherwise the CFS quota/period ratio.
fn cpu_limit(host: &HostConfig) -> Option<f64> {
    if host.nano_cpus > 0 {
        return Some(host.nano_cpus as f64 / NANO_CPUS_PER_CORE);
    }
    if host.cpu_quota > 0 && host.cpu_period > 0 {
        return Some(host.cpu_quota as f64 / host.cpu_period as f64);
    }
    None
}

fn positive(value: i64) -> Option<u64> {
    u64::try_from(value).ok().filter(|v| *v > 0)
}
