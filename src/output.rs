use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::normalize::NormalizedResults;

/// On-disk representation for saved results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

/// Write the normalized results to `path` without altering any value.
pub fn save(results: &NormalizedResults, path: &Path, format: OutputFormat) -> Result<()> {
    let body = match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(results).context("Failed to serialize results")?
        }
        OutputFormat::Text => text_report(results),
    };
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}

/// Line-oriented form: one `Location:` header per node followed by indented
/// `key: value` lines, blank-line separated.
fn text_report(results: &NormalizedResults) -> String {
    let mut out = String::new();
    for (location, report) in results {
        out.push_str(&format!("Location: {location}\n"));
        if let Ok(Value::Object(fields)) = serde_json::to_value(report) {
            for (key, value) in &fields {
                out.push_str(&format!("  {key}: {}\n", plain(value)));
            }
        }
        out.push('\n');
    }
    out
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(plain)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::models::NodeReport;

    use super::*;

    fn sample() -> NormalizedResults {
        let mut results = NormalizedResults::new();
        results.insert(
            "Germany (Nuremberg)".to_string(),
            NodeReport::Tcp {
                success: true,
                connect_time: 15.0,
                ip: Some("9.9.9.9".into()),
            },
        );
        results.insert(
            "USA (Dallas)".to_string(),
            NodeReport::failure("No TCP data"),
        );
        results
    }

    #[test]
    fn json_round_trips_values_unaltered() {
        let json = serde_json::to_string_pretty(&sample()).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["Germany (Nuremberg)"]["connect_time"], 15.0);
        assert_eq!(parsed["USA (Dallas)"]["error"], "No TCP data");
    }

    #[test]
    fn text_report_lists_every_field_per_location() {
        let text = text_report(&sample());
        assert!(text.contains("Location: Germany (Nuremberg)\n"));
        assert!(text.contains("  connect_time: 15.0\n"));
        assert!(text.contains("  ip: 9.9.9.9\n"));
        assert!(text.contains("Location: USA (Dallas)\n"));
        assert!(text.contains("  error: No TCP data\n"));
    }

    #[test]
    fn save_writes_the_selected_format() {
        let dir = std::env::temp_dir().join("globeping-output-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("results.json");

        save(&sample(), &path, OutputFormat::Json).unwrap();
        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.get("USA (Dallas)").is_some());

        fs::remove_file(&path).ok();
    }
}
