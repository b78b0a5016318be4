use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// Pretty-printed JSON
	Json,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
		}
	}
}

/// Prints `value` as JSON, or the `text` rendering.
pub fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
		OutputFormat::Text => print!("{}", text()),
	}
	Ok(())
}

/// Wire name of a serializable enum value (`direct-secure`, `granted`, ...).
pub fn label<T: Serialize>(value: &T) -> String {
	match serde_json::to_value(value) {
		Ok(serde_json::Value::String(name)) => name,
		Ok(other) => other.to_string(),
		Err(_) => "?".to_string(),
	}
}

/// One aligned `key  value` line with a dimmed key.
pub fn field(key: &str, value: impl std::fmt::Display) -> String {
	format!("{}  {value}\n", format!("{key:<12}").dimmed())
}

pub fn heading(title: &str) -> String {
	format!("{}\n", title.bold())
}

#[cfg(test)]
mod tests {
	use super::*;
	use pushboot::IntegrationMode;

	#[test]
	fn label_uses_wire_names() {
		assert_eq!(label(&IntegrationMode::ProxiedSecure), "proxied-secure");
		assert_eq!(label(&3), "3");
	}
}
