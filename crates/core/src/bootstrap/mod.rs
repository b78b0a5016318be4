//! The SDK instance and its bootstrap sequences.
//!
//! [`Sdk::init`] is the page-level entry point. It runs the session bootstrap
//! state machine once with `fromAutoInit`, waits for the session-ready signal,
//! and then runs the post-initialization sequence. [`Sdk::register_for_push`]
//! starts further session bootstraps on explicit visitor action; the
//! single-flight latch turns overlapping calls into silent no-ops.

mod initialized;
mod session;
mod state;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub use state::{BootstrapOptions, BootstrapOutcome, BootstrapState, SessionAction};

use crate::config::SdkConfig;
use crate::context::BootstrapContext;
use crate::environment::{Environment, classify};
use crate::error::Result;
use crate::events::SdkEvent;
use crate::host::Host;
use crate::prompt::BrowserIdentity;
use crate::renewal::SubscriptionRenewalCoordinator;
use crate::visibility::VisibilityGate;

/// Process-wide SDK instance for one page.
pub struct Sdk {
	config: SdkConfig,
	host: Host,
	browser: BrowserIdentity,
	context: Arc<BootstrapContext>,
	visibility: VisibilityGate,
	renewal: Arc<SubscriptionRenewalCoordinator>,
}

impl Sdk {
	/// Validates `config` and wires the collaborators together. Nothing runs until [`init`](Self::init).
	pub fn new(config: SdkConfig, host: Host) -> Result<Arc<Self>> {
		config.validate()?;
		let browser = BrowserIdentity::from_user_agent(&host.page.user_agent());
		debug!(target = "pushboot.init", vendor = ?browser.vendor, version = %browser.version, form_factor = ?browser.form_factor, "detected browser");

		Ok(Arc::new(Self {
			renewal: Arc::new(SubscriptionRenewalCoordinator::new(&host, &config)),
			visibility: VisibilityGate::new(Arc::clone(&host.visibility)),
			context: Arc::new(BootstrapContext::new()),
			browser,
			config,
			host,
		}))
	}

	/// Starts page-level initialization.
	///
	/// # Errors
	///
	/// Returns [`Error::DuplicateInitialization`](crate::Error::DuplicateInitialization)
	/// synchronously when called more than once on this instance. Failures of
	/// the spawned sequence are reported through the returned handle.
	pub fn init(self: &Arc<Self>) -> Result<JoinHandle<Result<()>>> {
		self.context.begin_initialization()?;
		info!(target = "pushboot.init", app_id = %self.config.app_id, integration = ?self.config.integration, "initializing");

		let sdk = Arc::clone(self);
		Ok(tokio::spawn(async move {
			let result = sdk.run_initialization().await;
			if let Err(err) = &result {
				error!(target = "pushboot.init", error = %err, "initialization aborted");
			}
			result
		}))
	}

	async fn run_initialization(&self) -> Result<()> {
		let mut runs = self.context.watch_session_runs();
		loop {
			runs.borrow_and_update();
			if self.session_init(BootstrapOptions::auto_init()).await != BootstrapOutcome::AlreadyRunning {
				break;
			}
			// an explicit register call got there first; retry once it finalizes
			debug!(target = "pushboot.init", "session bootstrap busy; waiting for it to finish");
			if runs.changed().await.is_err() {
				break;
			}
		}

		self.context.session_ready().wait().await;
		self.on_sdk_initialized().await
	}

	/// Starts a session bootstrap for an explicit register action.
	pub async fn register_for_push(&self) -> BootstrapOutcome {
		self.session_init(BootstrapOptions::register_call(self.config.prompt_options.modal)).await
	}

	/// Resolves once the post-initialization sequence has completed.
	///
	/// Never resolves if [`init`](Self::init) was not called or its sequence aborted.
	pub async fn wait_initialized(&self) {
		self.context.initialized().wait().await;
	}

	pub fn is_initialized(&self) -> bool {
		self.context.initialized().is_raised()
	}

	pub fn events(&self) -> broadcast::Receiver<SdkEvent> {
		self.context.subscribe_events()
	}

	pub fn state(&self) -> BootstrapState {
		self.context.state()
	}

	/// Classifies the current document. Not cached.
	pub fn environment(&self) -> Environment {
		classify(&self.config, &self.host.page.window_context())
	}

	pub fn config(&self) -> &SdkConfig {
		&self.config
	}

	pub fn browser(&self) -> &BrowserIdentity {
		&self.browser
	}

	pub fn context(&self) -> &BootstrapContext {
		&self.context
	}
}
