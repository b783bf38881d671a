//! Point-in-time ratios derived from one cycle's readings.

/// Inbound errors over inbound packets.
///
/// With no inbound packets the raw error count is reported instead.
pub fn error_ratio(errors: i64, unicast: i64, non_unicast: i64) -> f64 {
    let packets = unicast + non_unicast;
    if packets == 0 {
        errors as f64
    } else {
        errors as f64 / packets as f64
    }
}

/// Fraction of link capacity used, from a byte rate and a speed in bits/s.
///
/// `None` when the link speed is unknown (zero).
pub fn link_utilization(throughput: f64, link_speed: i64) -> Option<f64> {
    if link_speed <= 0 {
        return None;
    }
    Some(throughput * 8.0 / link_speed as f64)
}

/// Percentage of received datagrams discarded for header, address or
/// protocol errors.
///
/// `None` when nothing has been received.
pub fn ip_error_ratio(
    header_errors: i64,
    address_errors: i64,
    unknown_protocols: i64,
    received: i64,
) -> Option<f64> {
    if received == 0 {
        return None;
    }
    Some((header_errors + address_errors + unknown_protocols) as f64 / received as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_ratio_over_packets() {
        assert_eq!(error_ratio(5, 900, 100), 0.005);
    }

    #[test]
    fn error_ratio_without_packets_is_raw_count() {
        assert_eq!(error_ratio(5, 0, 0), 5.0);
        assert_eq!(error_ratio(0, 0, 0), 0.0);
    }

    #[test]
    fn utilization_in_bits() {
        assert_eq!(link_utilization(1_250_000.0, 100_000_000), Some(0.1));
        assert_eq!(link_utilization(1_000.0, 0), None);
    }

    #[test]
    fn ip_error_ratio_is_percentage() {
        assert_eq!(ip_error_ratio(10, 20, 70, 10_000), Some(1.0));
        assert_eq!(ip_error_ratio(1, 0, 0, 0), None);
    }
}
