//! Output formatting for devmeta (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => print_csv(data),
        }
    }

    /// Print a document as JSON
    pub fn print_json<D: Serialize>(&self, document: &D) {
        println!(
            "{}",
            serde_json::to_string_pretty(document).unwrap_or_else(|_| "{}".to_string())
        );
    }

    /// Print a full document; tables fall back to the given rows
    pub fn print_document<D: Serialize, T: Tabled + Serialize>(&self, document: &D, rows: &[T]) {
        match self.format {
            OutputFormat::Json => self.print_json(document),
            _ => self.print(rows),
        }
    }

    /// Print key-value pairs
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Print data as CSV
fn print_csv<T: Serialize>(data: &[T]) {
    let Some(first) = data.first() else {
        return;
    };
    let Ok(serde_json::Value::Object(map)) = serde_json::to_value(first) else {
        return;
    };
    let headers: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    println!("{}", headers.join(","));

    for item in data {
        if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
            let values: Vec<String> = headers
                .iter()
                .map(|h| {
                    row.get(*h)
                        .map(|v| match v {
                            serde_json::Value::String(s) => escape_csv(s),
                            other => escape_csv(&other.to_string()),
                        })
                        .unwrap_or_default()
                })
                .collect();
            println!("{}", values.join(","));
        }
    }
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `-` for empty optional values
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Aspect node display for aspect-nodes command
#[derive(Debug, Tabled, Serialize)]
pub struct AspectNodeRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Root")]
    pub root_id: String,
    #[tabled(rename = "Parent")]
    pub parent_id: String,
    #[tabled(rename = "Descendants")]
    pub descendants: usize,
}

/// One path option per row for selectables command
#[derive(Debug, Tabled, Serialize)]
pub struct PathOptionRow {
    #[tabled(rename = "Device Type")]
    pub device_type_id: String,
    #[tabled(rename = "Service")]
    pub service_id: String,
    #[tabled(rename = "Interaction")]
    pub interaction: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Function")]
    pub function_id: String,
    #[tabled(rename = "Aspect")]
    pub aspect_id: String,
    #[tabled(rename = "Configurables")]
    pub configurables: usize,
}

/// Service display for device-type command
#[derive(Debug, Tabled, Serialize)]
pub struct ServiceRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Interaction")]
    pub interaction: String,
    #[tabled(rename = "Group")]
    pub group: String,
    #[tabled(rename = "Functions")]
    pub functions: String,
}

/// Criteria display for group-criteria command
#[derive(Debug, Tabled, Serialize)]
pub struct CriteriaRow {
    #[tabled(rename = "Interaction")]
    pub interaction: String,
    #[tabled(rename = "Function")]
    pub function_id: String,
    #[tabled(rename = "Aspect")]
    pub aspect_id: String,
    #[tabled(rename = "Device Class")]
    pub device_class_id: String,
}

/// Modifier display for split-id command
#[derive(Debug, Tabled, Serialize)]
pub struct ModifierRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Values")]
    pub values: String,
}
