use std::time::Duration;

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

/// Formats a duration truncated to whole seconds, e.g. `29h26m2s`, `1m0s`, `0s`.
///
/// Hours are not rolled over into days.
pub fn format_uptime(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Formats a CPU amount in cores with one decimal, e.g. `1.5`.
pub fn format_cpu_cores(cores: f64) -> String {
    format!("{cores:.1}")
}

/// Formats a byte count using the largest binary unit (`G`, `M`, `K`, `B`) in
/// which the value is at least one.
///
/// Whole values are printed without a fraction (`512M`), others with one
/// decimal (`1.5G`).
pub fn format_memory(bytes: u64) -> String {
    let (unit, suffix) = match bytes {
        b if b >= GIB => (GIB, "G"),
        b if b >= MIB => (MIB, "M"),
        b if b >= KIB => (KIB, "K"),
        _ => return format!("{bytes}B"),
    };

    if bytes % unit == 0 {
        format!("{}{suffix}", bytes / unit)
    } else {
        format!("{:.1}{suffix}", bytes as f64 / unit as f64)
    }
}
