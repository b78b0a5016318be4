use colored::Colorize;
use pushboot::{BrowserIdentity, PromptInputs, PromptStrategy, select_strategy};
use serde::Serialize;
use tracing::info;

use crate::output::{OutputFormat, emit, field, label};

pub struct Flags {
	pub auto_register: bool,
	pub explicit: bool,
	pub modal: bool,
	pub prior_prompt: bool,
	pub opted_out: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Evaluation {
	browser: BrowserIdentity,
	denial_is_permanent: bool,
	strategy: PromptStrategy,
}

pub fn execute(user_agent: &str, flags: Flags, format: OutputFormat) -> anyhow::Result<()> {
	let browser = BrowserIdentity::from_user_agent(user_agent);
	info!(target = "pushboot", vendor = ?browser.vendor, version = %browser.version, "strategy");

	let strategy = select_strategy(&PromptInputs {
		browser,
		prior_prompt_shown: flags.prior_prompt,
		auto_register: flags.auto_register,
		explicit_register_call: flags.explicit,
		modal_requested: flags.modal,
		opted_out: flags.opted_out,
	});
	let result = Evaluation {
		browser,
		denial_is_permanent: browser.denial_is_permanent(),
		strategy,
	};

	emit(format, &result, || {
		let strategy = match result.strategy {
			PromptStrategy::Native => "native".green().to_string(),
			PromptStrategy::SlideDown => "slide-down".cyan().to_string(),
			PromptStrategy::Suppressed(reason) => format!("{} ({})", "suppressed".yellow(), label(&reason)),
		};
		let mut out = String::new();
		out.push_str(&field(
			"browser",
			format!("{} {} ({})", label(&result.browser.vendor), result.browser.version, label(&result.browser.form_factor)),
		));
		out.push_str(&field("permanent", result.denial_is_permanent));
		out.push_str(&field("strategy", strategy));
		out
	})
}
