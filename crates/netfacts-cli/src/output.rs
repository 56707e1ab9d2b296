//! Output formatting for netfacts
//!
//! Facts go to stdout as JSON, YAML or colored text; warnings go to stderr.

use anyhow::{Context, Result};
use colored::*;
use netfacts_core::value::render;
use netfacts_rules::RunOutput;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Text,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "text" => Some(OutputFormat::Text),
            _ => None,
        }
    }
}

/// Prints the result of a run
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Render the facts in the selected format
    pub fn render(&self, output: &RunOutput) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&output.facts).context("Failed to serialize facts as JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&output.facts).context("Failed to serialize facts as YAML")
            }
            OutputFormat::Text => Ok(render_text(output)),
        }
    }

    /// Print warnings to stderr and facts to stdout
    pub fn report(&self, output: &RunOutput) -> Result<()> {
        for warning in &output.warnings {
            eprintln!("{}: {}", "Warning".yellow(), warning);
        }

        println!("{}", self.render(output)?.trim_end());

        if self.verbose {
            eprintln!(
                "{}: {} fact(s), {} warning(s)",
                "Summary".bold(),
                output.facts.len(),
                output.warnings.len()
            );
        }
        Ok(())
    }
}

fn render_text(output: &RunOutput) -> String {
    if output.facts.is_empty() {
        return "No facts exported".dimmed().to_string();
    }

    let mut text = String::new();
    for (name, value) in output.facts.iter() {
        let rendered = if value.is_object() || value.is_array() {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| render(value))
        } else {
            render(value)
        };
        text.push_str(&format!("{}: {}\n", name.green().bold(), rendered));
    }
    text
}
