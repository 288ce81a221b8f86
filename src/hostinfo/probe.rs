use std::collections::BTreeMap;
use std::sync::Mutex;

use sysinfo::{Disks, Networks, System};

use super::models::{
    HostStat, LoadStat, MemoryStat, NetCounters, PartitionStat, SystemMetrics, UsageStat, percent,
};
use super::{Error, Result, SystemMetricsProvider};

/// [`SystemMetricsProvider`] backed by the `sysinfo` crate.
///
/// One [`System`] is kept across calls so the CPU figure is the usage since
/// the previous collection.
#[derive(Debug)]
pub struct SysinfoProvider {
    system: Mutex<System>,
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProvider {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl SystemMetricsProvider for SysinfoProvider {
    fn collect(&self) -> Result<SystemMetrics> {
        let (cpu, memory) = {
            let mut system = self.system.lock().map_err(|_| Error::Poisoned)?;
            system.refresh_cpu_usage();
            system.refresh_memory();
            (f64::from(system.global_cpu_usage()), memory_stat(&system))
        };

        let disks = Disks::new_with_refreshed_list();
        let mut partitions = Vec::with_capacity(disks.list().len());
        let mut disk_usage = BTreeMap::new();
        for disk in disks.list() {
            let mountpoint = disk.mount_point().to_string_lossy().into_owned();
            let fstype = disk.file_system().to_string_lossy().into_owned();
            let total = disk.total_space();
            let free = disk.available_space();
            let used = total.saturating_sub(free);

            partitions.push(PartitionStat {
                device: disk.name().to_string_lossy().into_owned(),
                mountpoint: mountpoint.clone(),
                fstype: fstype.clone(),
            });
            disk_usage.insert(
                mountpoint.clone(),
                UsageStat {
                    path: mountpoint,
                    fstype,
                    total,
                    free,
                    used,
                    used_percent: percent(used, total),
                },
            );
        }

        let load = System::load_average();

        Ok(SystemMetrics {
            cpu: vec![cpu],
            memory,
            disk: partitions,
            disk_usage,
            load: LoadStat {
                load1: load.one,
                load5: load.five,
                load15: load.fifteen,
            },
            host: host_stat(),
            net: vec![net_totals(&Networks::new_with_refreshed_list())],
        })
    }
}

fn memory_stat(system: &System) -> MemoryStat {
    let total = system.total_memory();
    let used = system.used_memory();
    MemoryStat {
        total,
        available: system.available_memory(),
        used,
        used_percent: percent(used, total),
        free: system.free_memory(),
        swap_total: system.total_swap(),
        swap_free: system.free_swap(),
    }
}

fn host_stat() -> HostStat {
    HostStat {
        hostname: System::host_name().unwrap_or_default(),
        uptime: System::uptime(),
        boot_time: System::boot_time(),
        os: std::env::consts::OS.to_owned(),
        platform: System::name().unwrap_or_default(),
        platform_version: System::os_version().unwrap_or_default(),
        kernel_version: System::kernel_version().unwrap_or_default(),
        kernel_arch: std::env::consts::ARCH.to_owned(),
    }
}

/// Sums every interface into one `all` entry.
fn net_totals(networks: &Networks) -> NetCounters {
    networks.list().values().fold(
        NetCounters {
            name: "all".to_owned(),
            ..Default::default()
        },
        |mut acc, data| {
            acc.bytes_sent += data.total_transmitted();
            acc.bytes_recv += data.total_received();
            acc.packets_sent += data.total_packets_transmitted();
            acc.packets_recv += data.total_packets_received();
            acc
        },
    )
}
