use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The five probe families the measurement backend can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    Ping,
    Http,
    Tcp,
    Udp,
    Dns,
}

impl CheckType {
    /// Submission endpoint path on the backend.
    pub fn endpoint(&self) -> &'static str {
        match self {
            CheckType::Ping => "check-ping",
            CheckType::Http => "check-http",
            CheckType::Tcp => "check-tcp",
            CheckType::Udp => "check-udp",
            CheckType::Dns => "check-dns",
        }
    }

    /// Name used in per-node error strings and table headings.
    pub fn label(&self) -> &'static str {
        match self {
            CheckType::Ping => "ping",
            CheckType::Http => "HTTP",
            CheckType::Tcp => "TCP",
            CheckType::Udp => "UDP",
            CheckType::Dns => "DNS",
        }
    }

    /// Minimum field count of a node's first raw record before the
    /// per-check extraction is allowed to run.
    pub(crate) fn min_fields(&self) -> usize {
        match self {
            CheckType::Ping => 2,
            CheckType::Http => 4,
            CheckType::Tcp | CheckType::Udp => 2,
            CheckType::Dns => 1,
        }
    }

    /// HTTP checks need a scheme; everything else is submitted verbatim.
    pub fn prepare_target(&self, target: String) -> String {
        match self {
            CheckType::Http
                if !target.starts_with("http://") && !target.starts_with("https://") =>
            {
                format!("http://{target}")
            }
            _ => target,
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Opaque polling key handed out by the backend on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(pub String);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of per-node raw payloads keyed by vantage-point id.
/// A node maps to `Value::Null` until it has reported.
pub type RawResults = HashMap<String, Value>;

/// Check-type-agnostic per-node outcome. Field names follow the backend's
/// vocabulary so persisted output carries the values unaltered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeReport {
    Failure {
        success: bool,
        error: String,
    },
    Ping {
        success: bool,
        avg_latency: f64,
        min_latency: f64,
        max_latency: f64,
        packet_loss: f64,
        ip: Option<String>,
    },
    Http {
        success: bool,
        status_code: Option<u16>,
        status_msg: String,
        response_time: f64,
        ip: Option<String>,
    },
    Tcp {
        success: bool,
        connect_time: f64,
        ip: Option<String>,
    },
    Udp {
        success: bool,
        response_time: f64,
        ip: Option<String>,
    },
    Dns {
        success: bool,
        resolution_time: f64,
        addresses: Vec<String>,
    },
}

impl NodeReport {
    pub fn failure(message: impl Into<String>) -> Self {
        NodeReport::Failure {
            success: false,
            error: message.into(),
        }
    }

    pub fn success(&self) -> bool {
        match self {
            NodeReport::Failure { success, .. }
            | NodeReport::Ping { success, .. }
            | NodeReport::Http { success, .. }
            | NodeReport::Tcp { success, .. }
            | NodeReport::Udp { success, .. }
            | NodeReport::Dns { success, .. } => *success,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            NodeReport::Failure { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_cover_every_check() {
        assert_eq!(CheckType::Ping.endpoint(), "check-ping");
        assert_eq!(CheckType::Dns.endpoint(), "check-dns");
    }

    #[test]
    fn http_targets_get_a_scheme() {
        assert_eq!(
            CheckType::Http.prepare_target("example.com".into()),
            "http://example.com"
        );
        assert_eq!(
            CheckType::Http.prepare_target("https://example.com".into()),
            "https://example.com"
        );
        assert_eq!(
            CheckType::Tcp.prepare_target("example.com".into()),
            "example.com"
        );
    }

    #[test]
    fn failure_reports_expose_their_message() {
        let report = NodeReport::failure("No ping data");
        assert!(!report.success());
        assert_eq!(report.error(), Some("No ping data"));
    }
}
