use std::path::PathBuf;

use anyhow::Context;
use pushboot::environment::is_secure_location;
use pushboot::{Environment, SdkConfig, WindowContext, classify};
use serde::Serialize;
use tracing::info;

use crate::output::{OutputFormat, emit, field, label};

pub struct ClassifyArgs {
	pub origin: String,
	pub embedded: bool,
	pub proxy_origin: Option<String>,
	pub allow_localhost: bool,
	pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Classification {
	location: String,
	embedded: bool,
	secure_origin: bool,
	#[serde(flatten)]
	environment: Environment,
}

pub fn execute(args: ClassifyArgs, format: OutputFormat) -> anyhow::Result<()> {
	let mut config = match &args.config {
		Some(path) => SdkConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))?,
		None => SdkConfig::new("cli"),
	};
	if let Some(origin) = args.proxy_origin {
		config = config.proxied(origin);
		config.validate()?;
	}
	config.allow_localhost_as_secure_origin |= args.allow_localhost;

	let window = WindowContext {
		location: args.origin,
		embedded: args.embedded,
	};
	info!(target = "pushboot", location = %window.location, embedded = window.embedded, "classify");

	let environment = classify(&config, &window);
	let secure_origin = is_secure_location(&window.location, config.allow_localhost_as_secure_origin);
	let result = Classification {
		location: window.location,
		embedded: window.embedded,
		secure_origin,
		environment,
	};

	emit(format, &result, || {
		let mut out = String::new();
		out.push_str(&field("mode", label(&result.environment.mode)));
		out.push_str(&field("role", label(&result.environment.role)));
		out.push_str(&field("secure", result.secure_origin));
		out
	})
}
