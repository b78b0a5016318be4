//! The session bootstrap state machine.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::Sdk;
use super::state::{BootstrapOptions, BootstrapOutcome, BootstrapState, SessionAction};
use crate::environment::{Environment, IntegrationMode, classify};
use crate::error::{Error, Result};
use crate::events::SdkEvent;
use crate::host::{NotificationPermission, SlidedownResponse, SubscribeStrategy};
use crate::prompt::{PromptInputs, PromptStrategy, Suppression, select_strategy};
use crate::storage::{self, keys, stores};

impl Sdk {
	/// Runs one session bootstrap.
	///
	/// Returns [`BootstrapOutcome::AlreadyRunning`] without side effects when
	/// another bootstrap holds the latch. Failures are logged and absorbed.
	/// Finalization runs on every path, including when this future is dropped.
	pub async fn session_init(&self, options: BootstrapOptions) -> BootstrapOutcome {
		let Some(_run) = self.context.begin_session(options.from_auto_init) else {
			return BootstrapOutcome::AlreadyRunning;
		};
		debug!(target = "pushboot.session", ?options, "session bootstrap started");

		self.run_session(options).await
	}

	async fn run_session(&self, options: BootstrapOptions) -> BootstrapOutcome {
		let environment = loop {
			self.context.set_state(BootstrapState::ClassifyingEnvironment);
			let environment = classify(&self.config, &self.host.page.window_context());
			if options.from_auto_init && !self.visibility.is_visible() {
				self.context.set_state(BootstrapState::AwaitingVisibility);
				info!(target = "pushboot.session", "document hidden; deferring session bootstrap");
				self.visibility.wait_until_visible().await;
				continue;
			}
			break environment;
		};

		self.context.set_state(BootstrapState::SelectingStrategy);
		let result = match self.select_action(environment, options).await {
			Ok(action) => {
				debug!(target = "pushboot.session", mode = ?environment.mode, role = ?environment.role, ?action, "selected session action");
				self.context.set_state(BootstrapState::ExecutingStrategy);
				self.execute(action).await.map(|()| action)
			}
			Err(err) => Err(err),
		};

		match result {
			Ok(action) => BootstrapOutcome::Completed { environment, action },
			Err(err) if err.is_benign() => {
				debug!(target = "pushboot.session", error = %err, "session bootstrap ended early");
				BootstrapOutcome::Absorbed {
					environment,
					benign: true,
					error: err.to_string(),
				}
			}
			Err(err) => {
				error!(target = "pushboot.session", mode = ?environment.mode, error = %err, "session bootstrap failed");
				BootstrapOutcome::Absorbed {
					environment,
					benign: false,
					error: err.to_string(),
				}
			}
		}
	}

	async fn select_action(&self, environment: Environment, options: BootstrapOptions) -> Result<SessionAction> {
		let explicit = options.from_explicit_register_call;
		if explicit && options.modal_prompt_requested {
			return Ok(SessionAction::Modal);
		}
		if environment.is_auxiliary() {
			return Ok(SessionAction::Suppressed(Suppression::AuxiliaryFrame));
		}

		let prior_prompt_shown = self.prior_prompt_shown().await;
		let auto_register = self.config.auto_register || explicit;

		if environment.mode == IntegrationMode::InsecureLegacy {
			return Ok(if !auto_register {
				SessionAction::Suppressed(Suppression::NotRequested)
			} else if prior_prompt_shown && !explicit {
				SessionAction::Suppressed(Suppression::AlreadyPrompted)
			} else {
				SessionAction::LegacyPrompt
			});
		}

		let permissions = &self.host.permissions;
		let permission = permissions.notification_permission(&self.config.app_id).await?;
		if permission == NotificationPermission::Denied {
			return Err(Error::PermissionAlreadyDenied {
				redundant: self.context.note_denial(),
			});
		}
		if permissions.is_push_enabled().await? {
			return Err(Error::AlreadySubscribed);
		}
		if permission == NotificationPermission::Granted && self.config.auto_resubscribe && !self.host.subscriptions.is_already_registered().await? {
			return Ok(SessionAction::Resubscribe);
		}

		let strategy = select_strategy(&PromptInputs {
			browser: self.browser,
			prior_prompt_shown,
			auto_register,
			explicit_register_call: explicit,
			modal_requested: options.modal_prompt_requested,
			opted_out: permissions.is_opted_out().await?,
		});

		Ok(match strategy {
			PromptStrategy::Native => SessionAction::NativePrompt,
			PromptStrategy::SlideDown if options.auto_accept => SessionAction::NativePrompt,
			PromptStrategy::SlideDown => SessionAction::SlideDown,
			PromptStrategy::Suppressed(Suppression::ModalPath) => SessionAction::Modal,
			PromptStrategy::Suppressed(reason) => SessionAction::Suppressed(reason),
		})
	}

	async fn execute(&self, action: SessionAction) -> Result<()> {
		let prompts = &self.host.prompts;
		match action {
			SessionAction::NativePrompt => self.request_native_permission().await,
			SessionAction::SlideDown => {
				self.mark_prompt_shown().await;
				match prompts.show_slidedown().await? {
					SlidedownResponse::Accepted => self.request_native_permission().await,
					SlidedownResponse::Dismissed => Err(Error::PermissionPromptDismissed),
				}
			}
			SessionAction::Modal => prompts.show_modal().await,
			SessionAction::LegacyPrompt => {
				self.mark_prompt_shown().await;
				prompts.show_legacy_prompt().await
			}
			SessionAction::Resubscribe => {
				info!(target = "pushboot.session", "permission granted but not registered; resubscribing");
				self.subscribe_and_register().await
			}
			SessionAction::Suppressed(Suppression::OptedOut) => {
				info!(target = "pushboot.session", "visitor opted out; re-enabling subscription without prompting");
				self.host.subscriptions.set_subscription_enabled(true).await
			}
			SessionAction::Suppressed(reason) => {
				debug!(target = "pushboot.session", ?reason, "no prompt");
				Ok(())
			}
		}
	}

	async fn request_native_permission(&self) -> Result<()> {
		self.mark_prompt_shown().await;
		let permission = self.host.prompts.show_native().await?;
		if permission != NotificationPermission::Granted {
			return Err(Error::PermissionNotGranted);
		}
		self.subscribe_and_register().await
	}

	async fn subscribe_and_register(&self) -> Result<()> {
		let record = self.host.subscriptions.subscribe(SubscribeStrategy::ResubscribeExisting).await?;
		self.host.subscriptions.register_subscription(&record).await?;
		info!(target = "pushboot.session", endpoint = %record.endpoint, "subscription registered");
		self.context.emit(SdkEvent::Subscribed { endpoint: record.endpoint });
		Ok(())
	}

	async fn prior_prompt_shown(&self) -> bool {
		if self.context.prompt_shown() {
			return true;
		}
		match storage::get_flag(self.host.storage.as_ref(), stores::SESSION, keys::PROMPT_SHOWN).await {
			Ok(shown) => shown,
			Err(err) => {
				warn!(target = "pushboot.session", error = %err, "failed to read prompt-shown flag");
				false
			}
		}
	}

	async fn mark_prompt_shown(&self) {
		self.context.mark_prompt_shown();
		if let Err(err) = self.host.storage.put(stores::SESSION, keys::PROMPT_SHOWN, Value::Bool(true)).await {
			warn!(target = "pushboot.session", error = %err, "failed to persist prompt-shown flag");
		}
	}
}
