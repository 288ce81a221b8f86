use crate::runtime::models::{CpuStats, StatsResponse};

/// CPU usage in cores over the sampling window between `precpu_stats` and
/// `cpu_stats`, clamped to `[0, online_cpus]`.
///
/// Returns `0.0` when the system delta or the CPU count is not positive, which
/// is what the runtime reports for the first sample of a fresh container.
pub fn compute_cpu_cores(stats: &StatsResponse) -> f64 {
    let current = &stats.cpu_stats;
    let prior = &stats.precpu_stats;

    let online = online_cpus(current);
    let cpu_delta = current.cpu_usage.total_usage as f64 - prior.cpu_usage.total_usage as f64;
    let system_delta = current.system_cpu_usage.unwrap_or(0) as f64
        - prior.system_cpu_usage.unwrap_or(0) as f64;

    if system_delta <= 0.0 || online == 0 {
        return 0.0;
    }

    let percent = (cpu_delta / system_delta) * f64::from(online) * 100.0;
    (percent / 100.0).clamp(0.0, f64::from(online))
}

/// Online CPU count, falling back to the number of per-CPU counters.
fn online_cpus(stats: &CpuStats) -> u32 {
    match stats.online_cpus {
        Some(online) if online > 0 => online,
        _ => stats
            .cpu_usage
            .percpu_usage
            .as_ref()
            .map_or(0, |percpu| u32::try_from(percpu.len()).unwrap_or(u32::MAX)),
    }
}
