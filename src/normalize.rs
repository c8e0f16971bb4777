use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::{CheckType, NodeReport, RawResults};
use crate::nodes::NodeTable;

/// Per-node outcomes keyed by display label, sorted for stable output.
pub type NormalizedResults = BTreeMap<String, NodeReport>;

/// Fold a raw backend snapshot into the uniform per-node result model.
/// Node ids missing from the catalog are dropped; every shape problem is
/// absorbed into that node's record so one bad node never fails the run.
/// Pure and idempotent.
pub fn normalize(check: CheckType, raw: &RawResults, table: &NodeTable) -> NormalizedResults {
    let mut results = NormalizedResults::new();
    for (node_id, value) in raw {
        let Some(label) = table.label(node_id) else {
            continue;
        };
        results.insert(label, report_for(check, value));
    }
    results
}

/// Shared shape gate: a node's value must be a non-empty array whose first
/// element is itself an array wide enough for the check type. Everything
/// after the gate is per-check extraction.
fn report_for(check: CheckType, value: &Value) -> NodeReport {
    let records = match value.as_array() {
        Some(records) if !records.is_empty() => records,
        _ => return NodeReport::failure(format!("No {} data", check.label())),
    };

    let entry = match records[0].as_array() {
        Some(entry) if entry.len() >= check.min_fields() => entry,
        _ => return NodeReport::failure(format!("Invalid {} response", check.label())),
    };

    match check {
        CheckType::Ping => ping_report(entry),
        CheckType::Http => http_report(entry),
        CheckType::Tcp => tcp_report(entry),
        CheckType::Udp => udp_report(entry),
        CheckType::Dns => dns_report(entry),
    }
}

/// Each element of `attempts` is one echo attempt, `[status, rtt_secs, ip]`.
/// Latency aggregates cover only "OK" attempts; all-zero aggregates with
/// `success == false` mean no attempt landed, not a 0ms path.
fn ping_report(attempts: &[Value]) -> NodeReport {
    let mut successes = 0usize;
    let mut rtts: Vec<f64> = Vec::new();

    for attempt in attempts {
        let Some(fields) = attempt.as_array() else {
            continue;
        };
        if fields.first().and_then(Value::as_str) != Some("OK") {
            continue;
        }
        successes += 1;
        if let Some(secs) = fields.get(1).and_then(Value::as_f64) {
            rtts.push(secs * 1000.0);
        }
    }

    let total = attempts.len();
    let packet_loss = if total > 0 {
        (total - successes) as f64 / total as f64 * 100.0
    } else {
        100.0
    };

    let (avg, min, max) = if rtts.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let sum: f64 = rtts.iter().sum();
        let min = rtts.iter().copied().fold(f64::INFINITY, f64::min);
        let max = rtts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (sum / rtts.len() as f64, min, max)
    };

    // The probing node resolves once, so the first attempt's address stands
    // for the whole run.
    let ip = attempts[0]
        .as_array()
        .and_then(|fields| fields.get(2))
        .and_then(Value::as_str)
        .map(str::to_owned);

    NodeReport::Ping {
        success: successes > 0,
        avg_latency: avg,
        min_latency: min,
        max_latency: max,
        packet_loss,
        ip,
    }
}

/// `[flag, response_secs, status_msg, status_code, ip]`
fn http_report(fields: &[Value]) -> NodeReport {
    let success = fields[0].as_f64() == Some(1.0);
    let response_time = fields
        .get(1)
        .and_then(Value::as_f64)
        .map(|secs| secs * 1000.0)
        .unwrap_or(0.0);
    let status_msg = fields
        .get(2)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    // The backend is inconsistent about whether the code is a number or a
    // numeric string.
    let status_code = match &fields[3] {
        Value::Number(n) => n.as_u64().map(|code| code as u16),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    let ip = fields.get(4).and_then(Value::as_str).map(str::to_owned);

    NodeReport::Http {
        success,
        status_code,
        status_msg,
        response_time,
        ip,
    }
}

/// `[flag, connect_secs, ip]`
fn tcp_report(fields: &[Value]) -> NodeReport {
    NodeReport::Tcp {
        success: fields[0].as_f64() == Some(1.0),
        connect_time: fields
            .get(1)
            .and_then(Value::as_f64)
            .map(|secs| secs * 1000.0)
            .unwrap_or(0.0),
        ip: fields.get(2).and_then(Value::as_str).map(str::to_owned),
    }
}

/// `[flag, response_secs, ip]`
fn udp_report(fields: &[Value]) -> NodeReport {
    NodeReport::Udp {
        success: fields[0].as_f64() == Some(1.0),
        response_time: fields
            .get(1)
            .and_then(Value::as_f64)
            .map(|secs| secs * 1000.0)
            .unwrap_or(0.0),
        ip: fields.get(2).and_then(Value::as_str).map(str::to_owned),
    }
}

/// Each record is `[resolve_secs, address]`; a valid non-empty entry counts
/// as a successful resolution.
fn dns_report(records: &[Value]) -> NodeReport {
    let resolution_time = records
        .first()
        .and_then(Value::as_array)
        .and_then(|record| record.first())
        .and_then(Value::as_f64)
        .map(|secs| secs * 1000.0)
        .unwrap_or(0.0);

    let addresses = records
        .iter()
        .filter_map(Value::as_array)
        .filter(|record| record.len() > 1)
        .filter_map(|record| record.get(1).and_then(Value::as_str))
        .map(str::to_owned)
        .collect();

    NodeReport::Dns {
        success: true,
        resolution_time,
        addresses,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const US1: &str = "us1.node.check-host.net";
    const DE1: &str = "de1.node.check-host.net";

    fn raw(node: &str, value: Value) -> RawResults {
        let mut raw = RawResults::new();
        raw.insert(node.to_string(), value);
        raw
    }

    fn single(check: CheckType, value: Value) -> NodeReport {
        let table = NodeTable::builtin();
        let results = normalize(check, &raw(US1, value), &table);
        results.get("USA (Los Angeles)").cloned().expect("node present")
    }

    #[test]
    fn ping_aggregates_cover_only_successful_attempts() {
        let report = single(
            CheckType::Ping,
            json!([[["OK", 0.1, "1.2.3.4"], ["TIMEOUT"], ["OK", 0.3, "1.2.3.4"]]]),
        );

        match report {
            NodeReport::Ping {
                success,
                avg_latency,
                min_latency,
                max_latency,
                packet_loss,
                ip,
            } => {
                assert!(success);
                assert!((packet_loss - 100.0 / 3.0).abs() < 0.01);
                assert!((avg_latency - 200.0).abs() < 1e-9);
                assert!((min_latency - 100.0).abs() < 1e-9);
                assert!((max_latency - 300.0).abs() < 1e-9);
                assert_eq!(ip.as_deref(), Some("1.2.3.4"));
            }
            other => panic!("expected ping report, got {other:?}"),
        }
    }

    #[test]
    fn ping_with_no_ok_attempts_reports_zero_latency_and_full_loss() {
        let report = single(CheckType::Ping, json!([[["TIMEOUT"], ["TIMEOUT"]]]));

        match report {
            NodeReport::Ping {
                success,
                avg_latency,
                packet_loss,
                ip,
                ..
            } => {
                assert!(!success);
                assert_eq!(avg_latency, 0.0);
                assert_eq!(packet_loss, 100.0);
                assert_eq!(ip, None);
            }
            other => panic!("expected ping report, got {other:?}"),
        }
    }

    #[test]
    fn http_fields_land_in_the_expected_slots() {
        let report = single(CheckType::Http, json!([[1, 0.25, "OK", 200, "5.6.7.8"]]));

        assert_eq!(
            report,
            NodeReport::Http {
                success: true,
                status_code: Some(200),
                status_msg: "OK".into(),
                response_time: 250.0,
                ip: Some("5.6.7.8".into()),
            }
        );
    }

    #[test]
    fn http_status_codes_arrive_as_numbers_or_strings() {
        let report = single(CheckType::Http, json!([[1, 0.1, "Moved", "301"]]));
        match report {
            NodeReport::Http {
                status_code, ip, ..
            } => {
                assert_eq!(status_code, Some(301));
                assert_eq!(ip, None);
            }
            other => panic!("expected http report, got {other:?}"),
        }
    }

    #[test]
    fn tcp_and_udp_share_the_flag_time_ip_shape() {
        assert_eq!(
            single(CheckType::Tcp, json!([[1, 0.015, "9.9.9.9"]])),
            NodeReport::Tcp {
                success: true,
                connect_time: 15.0,
                ip: Some("9.9.9.9".into()),
            }
        );
        assert_eq!(
            single(CheckType::Udp, json!([[0, 0.02]])),
            NodeReport::Udp {
                success: false,
                response_time: 20.0,
                ip: None,
            }
        );
    }

    #[test]
    fn dns_collects_every_address_and_times_the_first_record() {
        let report = single(
            CheckType::Dns,
            json!([[[0.05, "9.9.9.9"], [null, "9.9.9.10"]]]),
        );

        assert_eq!(
            report,
            NodeReport::Dns {
                success: true,
                resolution_time: 50.0,
                addresses: vec!["9.9.9.9".into(), "9.9.9.10".into()],
            }
        );
    }

    #[test]
    fn missing_and_empty_entries_report_no_data() {
        for value in [Value::Null, json!([])] {
            let report = single(CheckType::Tcp, value);
            assert_eq!(report, NodeReport::failure("No TCP data"));
        }
    }

    #[test]
    fn undersized_entries_report_an_invalid_response() {
        let report = single(CheckType::Http, json!([[1, 0.2]]));
        assert_eq!(report, NodeReport::failure("Invalid HTTP response"));

        let report = single(CheckType::Ping, json!([["not-an-array-of-attempts"]]));
        assert_eq!(report, NodeReport::failure("Invalid ping response"));
    }

    #[test]
    fn unknown_nodes_are_dropped() {
        let table = NodeTable::builtin();
        let mut payload = raw("mystery.node.example", json!([[1, 0.1]]));
        payload.insert(DE1.to_string(), json!([[1, 0.1, "4.4.4.4"]]));

        let results = normalize(CheckType::Tcp, &payload, &table);
        assert_eq!(results.len(), 1);
        assert!(results.contains_key("Germany (Nuremberg)"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let table = NodeTable::builtin();
        let payload = raw(US1, json!([[["OK", 0.1, "1.2.3.4"], ["TIMEOUT"]]]));

        let first = normalize(CheckType::Ping, &payload, &table);
        let second = normalize(CheckType::Ping, &payload, &table);
        assert_eq!(first, second);
    }
}
