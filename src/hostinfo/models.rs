use std::collections::BTreeMap;

/// Host-level metrics, shaped like the gopsutil structures the dashboard
/// front-end reads.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SystemMetrics {
    pub cpu: Vec<f64>,
    pub memory: MemoryStat,
    #[serde(rename = "disk_partitions")]
    pub disk: Vec<PartitionStat>,
    pub disk_usage: BTreeMap<String, UsageStat>,
    pub load: LoadStat,
    pub host: HostStat,
    pub net: Vec<NetCounters>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStat {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub used_percent: f64,
    pub free: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PartitionStat {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStat {
    pub path: String,
    pub fstype: String,
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct LoadStat {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStat {
    pub hostname: String,
    pub uptime: u64,
    pub boot_time: u64,
    pub os: String,
    pub platform: String,
    pub platform_version: String,
    pub kernel_version: String,
    pub kernel_arch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetCounters {
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

/// `part` as a percentage of `total`; zero for an empty total.
pub(crate) fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let mut metrics = SystemMetrics {
            cpu: vec![12.5],
            ..Default::default()
        };
        metrics.disk_usage.insert(
            "/".to_owned(),
            UsageStat {
                path: "/".to_owned(),
                ..Default::default()
            },
        );
        let value = serde_json::to_value(&metrics).unwrap();

        assert_eq!(value["cpu"][0], 12.5);
        assert!(value["memory"].get("usedPercent").is_some());
        assert!(value["memory"].get("swapTotal").is_some());
        assert!(value["disk_partitions"].is_array());
        assert!(value["disk_usage"]["/"].get("usedPercent").is_some());
        assert!(value["load"].get("load15").is_some());
        assert!(value["host"].get("bootTime").is_some());
        assert!(value["host"].get("kernelArch").is_some());
        assert!(value["net"].is_array());
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(5, 0), 0.0);
    }
}
