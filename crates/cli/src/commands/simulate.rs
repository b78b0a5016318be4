//! `pushboot simulate`: one page load against scripted fakes.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use colored::Colorize;
use pushboot::protocol::FrameMessage;
use pushboot::{Baseline, BootstrapOutcome, BootstrapState, BrowserIdentity, Environment, SdkEvent};
use serde::Serialize;
use tracing::{info, warn};

use crate::output::{OutputFormat, emit, field, heading, label};
use crate::scenario::Scenario;

/// Slack on top of the RPC timeout before a stuck simulation is abandoned.
const SETTLE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationReport {
	environment: Environment,
	browser: BrowserIdentity,
	state: BootstrapState,
	initialized: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
	baseline: Option<Baseline>,
	skip_welcome_notification: bool,
	register_calls: Vec<BootstrapOutcome>,
	events: Vec<SdkEvent>,
	calls: Vec<String>,
	posted: Vec<FrameMessage>,
}

pub async fn execute(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
	let scenario = Scenario::load(path)?;
	let fake = scenario.host();
	let sdk = fake.sdk().context("failed to create SDK")?;
	let mut events = sdk.events();
	info!(target = "pushboot", scenario = %path.display(), mode = ?sdk.environment().mode, "simulating page load");

	if !scenario.page.visible {
		let page = Arc::clone(&fake.page);
		tokio::spawn(async move {
			page.wait_for_visibility_listener().await;
			page.fire_visibility_change(true);
		});
	}

	if !scenario.inbound.is_empty() {
		let port = Arc::clone(&fake.port);
		let postman = Arc::clone(&fake.postman);
		let inbound = scenario.inbound.clone();
		tokio::spawn(async move {
			port.next_sent().await;
			for message in inbound {
				if let Err(err) = postman.dispatch(message) {
					warn!(target = "pushboot", error = %err, "scripted inbound message rejected");
				}
			}
		});
	}

	let deadline = scenario.config.rpc_timeout() + SETTLE_GRACE;
	let error = match tokio::time::timeout(deadline, sdk.init()?).await {
		Ok(joined) => joined.context("initialization task panicked")?.err().map(|err| err.to_string()),
		Err(_) => bail!("initialization did not finish within {deadline:?}"),
	};

	let mut register_calls = Vec::new();
	for _ in 0..scenario.register_calls {
		register_calls.push(sdk.register_for_push().await);
	}

	let mut seen = Vec::new();
	while let Ok(event) = events.try_recv() {
		seen.push(event);
	}

	let report = SimulationReport {
		environment: sdk.environment(),
		browser: *sdk.browser(),
		state: sdk.state(),
		initialized: sdk.is_initialized(),
		error,
		baseline: sdk.context().baseline(),
		skip_welcome_notification: sdk.context().skip_welcome_notification(),
		register_calls,
		events: seen,
		calls: fake.journal.entries(),
		posted: fake.port.take_sent(),
	};

	emit(format, &report, || render_text(&report))
}

fn render_text(report: &SimulationReport) -> String {
	let mut out = String::new();
	out.push_str(&field(
		"environment",
		format!("{} / {}", label(&report.environment.mode), label(&report.environment.role)),
	));
	out.push_str(&field(
		"browser",
		format!("{} {} ({})", label(&report.browser.vendor), report.browser.version, label(&report.browser.form_factor)),
	));
	out.push_str(&field("state", label(&report.state)));
	let initialized = if report.initialized { "yes".green() } else { "no".red() };
	out.push_str(&field("initialized", initialized));
	if let Some(error) = &report.error {
		out.push_str(&field("error", error.red()));
	}

	if !report.register_calls.is_empty() {
		out.push_str(&heading("register calls"));
		for outcome in &report.register_calls {
			out.push_str(&format!("  {}\n", serde_json::to_string(outcome).unwrap_or_default()));
		}
	}
	out.push_str(&heading("events"));
	for event in &report.events {
		out.push_str(&format!("  {}\n", serde_json::to_string(event).unwrap_or_default()));
	}
	out.push_str(&heading("calls"));
	for call in &report.calls {
		out.push_str(&format!("  {call}\n"));
	}
	if !report.posted.is_empty() {
		out.push_str(&heading("posted"));
		for message in &report.posted {
			out.push_str(&format!("  #{} {}\n", message.id, message.command));
		}
	}
	out
}
