//! Human-readable formatting for device status values.

const BYTE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format seconds as days, hours, minutes and seconds (e.g. "1天 1小时 1分 1秒").
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    format!("{days}天 {hours}小时 {minutes}分 {seconds}秒")
}

/// Format a byte count with 1024 scaling and two decimals ("0 B", "1.00 MB").
///
/// Values beyond the gigabyte range stay in GB.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".into();
    }

    let mut value = bytes as f64;
    let mut unit = BYTE_UNITS[0];
    for &next in &BYTE_UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }

    format!("{value:.2} {unit}")
}

/// Format a WiFi signal strength ("-61 dBm").
pub fn format_rssi(dbm: i64) -> String {
    format!("{dbm} dBm")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_breaks_down_all_units() {
        assert_eq!(format_uptime(90061), "1天 1小时 1分 1秒");
        assert_eq!(format_uptime(0), "0天 0小时 0分 0秒");
        assert_eq!(format_uptime(59), "0天 0小时 0分 59秒");
        assert_eq!(format_uptime(86400 * 12 + 7), "12天 0小时 0分 7秒");
    }

    #[test]
    fn bytes_zero_and_exact_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1), "1.00 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
        assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn bytes_fractional_values() {
        assert_eq!(format_bytes(1023), "1023.00 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(180_224), "176.00 KB");
    }

    #[test]
    fn bytes_cap_at_gigabytes() {
        assert_eq!(format_bytes(1024 * 1_073_741_824), "1024.00 GB");
    }

    #[test]
    fn bytes_monotonic_across_unit_boundaries() {
        fn magnitude(s: &str) -> f64 {
            let (value, unit) = s.split_once(' ').unwrap_or((s, "B"));
            let scale = match unit {
                "KB" => 1024.0_f64,
                "MB" => 1024.0_f64.powi(2),
                "GB" => 1024.0_f64.powi(3),
                _ => 1.0,
            };
            value.parse::<f64>().unwrap_or(0.0) * scale
        }

        let samples = [
            0_u64, 1, 1023, 1024, 1025, 1_048_575, 1_048_576, 1_048_577, 1_073_741_823,
            1_073_741_824, 5_000_000_000,
        ];
        for pair in samples.windows(2) {
            let (a, b) = (format_bytes(pair[0]), format_bytes(pair[1]));
            assert!(magnitude(&a) <= magnitude(&b), "{a} should not exceed {b}");
        }
    }

    #[test]
    fn rssi_suffix() {
        assert_eq!(format_rssi(-61), "-61 dBm");
    }
}
