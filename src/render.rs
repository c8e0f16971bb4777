use crate::models::{CheckType, NodeReport};
use crate::normalize::NormalizedResults;
use crate::utils;

const GREEN: &str = "32";
const RED: &str = "31";
const CYAN: &str = "36";

/// Table renderer for normalized results. Per-node failures render as rows
/// next to the successful ones; rendering never fails a run.
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn stdout() -> Self {
        Self {
            color: utils::color_enabled(),
        }
    }

    #[cfg(test)]
    fn plain() -> Self {
        Self { color: false }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    /// Pad first, then colorize, so escape bytes don't skew column widths.
    fn status_cell(&self, text: &str, code: &str, width: usize) -> String {
        self.paint(&format!("{text:<width$}"), code)
    }

    fn up_down(&self, up: bool, up_word: &str, down_word: &str) -> String {
        if up {
            self.status_cell(up_word, GREEN, 10)
        } else {
            self.status_cell(down_word, RED, 10)
        }
    }

    fn heading(&self, check: CheckType) {
        println!();
        println!(
            "{}",
            self.paint(
                &format!("{} RESULTS:", check.label().to_uppercase()),
                CYAN
            )
        );
    }

    pub fn print(&self, check: CheckType, results: &NormalizedResults) {
        match check {
            CheckType::Ping => self.print_ping(results),
            CheckType::Http => self.print_http(results),
            CheckType::Tcp => self.print_tcp(results),
            CheckType::Udp => self.print_udp(results),
            CheckType::Dns => self.print_dns(results),
        }
    }

    fn print_ping(&self, results: &NormalizedResults) {
        self.heading(CheckType::Ping);
        println!(
            "{:<30} {:<10} {:<15} {:<25} {:<15}",
            "Location", "Status", "Packet Loss", "Latency (min/avg/max)", "IP"
        );
        println!("{}", "-".repeat(80));

        for (location, report) in results {
            match report {
                NodeReport::Ping {
                    success,
                    avg_latency,
                    min_latency,
                    max_latency,
                    packet_loss,
                    ip,
                } => {
                    let status = self.up_down(*success, "UP", "DOWN");
                    let loss = format!("{packet_loss:.1}%");
                    let (latency, ip) = if *success {
                        (
                            format!("{min_latency:.1}/{avg_latency:.1}/{max_latency:.1} ms"),
                            ip.as_deref().unwrap_or("N/A").to_string(),
                        )
                    } else {
                        ("N/A".to_string(), "N/A".to_string())
                    };
                    println!("{location:<30} {status} {loss:<15} {latency:<25} {ip:<15}");
                }
                other => self.error_row(location, other, &[15, 25, 15]),
            }
        }
    }

    fn print_http(&self, results: &NormalizedResults) {
        self.heading(CheckType::Http);
        println!(
            "{:<30} {:<10} {:<15} {:<15} {:<15}",
            "Location", "Status", "Response Code", "Response Time", "IP"
        );
        println!("{}", "-".repeat(80));

        for (location, report) in results {
            match report {
                NodeReport::Http {
                    success,
                    status_code,
                    status_msg,
                    response_time,
                    ip,
                } => {
                    let status = self.up_down(*success, "UP", "DOWN");
                    let (code, time, ip) = if *success {
                        (
                            format!(
                                "{} {}",
                                status_code.map_or("N/A".to_string(), |c| c.to_string()),
                                status_msg
                            ),
                            format!("{response_time:.1} ms"),
                            ip.as_deref().unwrap_or("N/A").to_string(),
                        )
                    } else {
                        ("N/A".to_string(), "N/A".to_string(), "N/A".to_string())
                    };
                    println!("{location:<30} {status} {code:<15} {time:<15} {ip:<15}");
                }
                other => self.error_row(location, other, &[15, 15, 15]),
            }
        }
    }

    fn print_tcp(&self, results: &NormalizedResults) {
        self.heading(CheckType::Tcp);
        println!(
            "{:<30} {:<10} {:<15} {:<15}",
            "Location", "Status", "Connect Time", "IP"
        );
        println!("{}", "-".repeat(80));

        for (location, report) in results {
            match report {
                NodeReport::Tcp {
                    success,
                    connect_time,
                    ip,
                } => {
                    let status = self.up_down(*success, "OPEN", "CLOSED");
                    let (time, ip) = if *success {
                        (
                            format!("{connect_time:.1} ms"),
                            ip.as_deref().unwrap_or("N/A").to_string(),
                        )
                    } else {
                        ("N/A".to_string(), "N/A".to_string())
                    };
                    println!("{location:<30} {status} {time:<15} {ip:<15}");
                }
                other => self.error_row(location, other, &[15, 15]),
            }
        }
    }

    fn print_udp(&self, results: &NormalizedResults) {
        self.heading(CheckType::Udp);
        println!(
            "{:<30} {:<10} {:<15} {:<15}",
            "Location", "Status", "Response Time", "IP"
        );
        println!("{}", "-".repeat(80));

        for (location, report) in results {
            match report {
                NodeReport::Udp {
                    success,
                    response_time,
                    ip,
                } => {
                    let status = self.up_down(*success, "UP", "DOWN");
                    let (time, ip) = if *success {
                        (
                            format!("{response_time:.1} ms"),
                            ip.as_deref().unwrap_or("N/A").to_string(),
                        )
                    } else {
                        ("N/A".to_string(), "N/A".to_string())
                    };
                    println!("{location:<30} {status} {time:<15} {ip:<15}");
                }
                other => self.error_row(location, other, &[15, 15]),
            }
        }
    }

    fn print_dns(&self, results: &NormalizedResults) {
        self.heading(CheckType::Dns);
        println!(
            "{:<30} {:<10} {:<20} {:<30}",
            "Location", "Status", "Resolution Time", "Addresses"
        );
        println!("{}", "-".repeat(80));

        for (location, report) in results {
            match report {
                NodeReport::Dns {
                    success,
                    resolution_time,
                    addresses,
                } => {
                    let status = self.up_down(*success, "OK", "FAIL");
                    let (time, addresses) = if *success {
                        let mut joined = addresses.join(", ");
                        joined.truncate(30);
                        (format!("{resolution_time:.1} ms"), joined)
                    } else {
                        ("N/A".to_string(), "N/A".to_string())
                    };
                    println!("{location:<30} {status} {time:<20} {addresses:<30}");
                }
                other => self.error_row(location, other, &[20, 30]),
            }
        }
    }

    /// Row for a node whose payload never parsed: ERROR status, the message
    /// in the first metric column, N/A everywhere else.
    fn error_row(&self, location: &str, report: &NodeReport, widths: &[usize]) {
        let status = self.status_cell("ERROR", RED, 10);
        let message = report.error().unwrap_or("unrecognized payload");
        let mut row = format!("{location:<30} {status} ");
        for (i, width) in widths.iter().copied().enumerate() {
            let cell = if i == 0 { message } else { "N/A" };
            row.push_str(&format!("{cell:<width$} "));
        }
        println!("{}", row.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_is_a_passthrough_without_color() {
        let renderer = Renderer::plain();
        assert_eq!(renderer.paint("UP", GREEN), "UP");
    }

    #[test]
    fn status_cells_pad_before_colorizing() {
        let renderer = Renderer { color: true };
        assert_eq!(renderer.status_cell("UP", GREEN, 10), "\x1b[32mUP        \x1b[0m");
    }
}
