use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "pushboot")]
#[command(about = "Simulate and inspect push subscription bootstraps")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run a full page-load bootstrap against scripted fake collaborators
	#[command(alias = "sim")]
	Simulate {
		/// Scenario file (JSON)
		scenario: PathBuf,
		#[arg(short, long, value_enum, default_value_t)]
		format: OutputFormat,
	},

	/// Classify the integration mode and frame role of a document
	Classify {
		/// Location of the document
		#[arg(long)]
		origin: String,
		/// The document is embedded in another window
		#[arg(long)]
		embedded: bool,
		/// Use the proxied integration served from this origin
		#[arg(long, value_name = "URL", conflicts_with = "config")]
		proxy_origin: Option<String>,
		/// Treat http://localhost as secure
		#[arg(long)]
		allow_localhost: bool,
		/// SDK config file (JSON)
		#[arg(long, value_name = "FILE")]
		config: Option<PathBuf>,
		#[arg(short, long, value_enum, default_value_t)]
		format: OutputFormat,
	},

	/// Evaluate the permission-prompt strategy table
	Strategy {
		#[arg(long)]
		user_agent: String,
		#[arg(long)]
		auto_register: bool,
		/// The request comes from an explicit register call
		#[arg(long)]
		explicit: bool,
		/// A modal prompt was requested
		#[arg(long)]
		modal: bool,
		/// A prompt was already shown this session
		#[arg(long)]
		prior_prompt: bool,
		#[arg(long)]
		opted_out: bool,
		#[arg(short, long, value_enum, default_value_t)]
		format: OutputFormat,
	},
}
