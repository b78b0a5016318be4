mod classify;
mod simulate;
mod strategy;

use crate::cli::Commands;

pub async fn dispatch(command: Commands) -> anyhow::Result<()> {
	match command {
		Commands::Simulate { scenario, format } => simulate::execute(&scenario, format).await,
		Commands::Classify {
			origin,
			embedded,
			proxy_origin,
			allow_localhost,
			config,
			format,
		} => classify::execute(
			classify::ClassifyArgs {
				origin,
				embedded,
				proxy_origin,
				allow_localhost,
				config,
			},
			format,
		),
		Commands::Strategy {
			user_agent,
			auto_register,
			explicit,
			modal,
			prior_prompt,
			opted_out,
			format,
		} => strategy::execute(
			&user_agent,
			strategy::Flags {
				auto_register,
				explicit,
				modal,
				prior_prompt,
				opted_out,
			},
			format,
		),
	}
}
