// Session bootstrap state machine driven through the public API.
//
// Tests cover:
// - Single-flight behavior for overlapping bootstraps
// - Visibility deferral with the one-shot listener
// - Benign failures absorbed in every integration mode
// - Prompt strategy selection and execution

use pushboot::fake::FakeHost;
use pushboot::host::{NotificationPermission, SlidedownResponse};
use pushboot::storage::{keys, stores};
use pushboot::{BootstrapOptions, BootstrapOutcome, BootstrapState, IntegrationMode, SessionAction, Suppression};
use serde_json::json;

const CHROME_ANDROID_TABLET: &str = "Mozilla/5.0 (Linux; Android 9; SM-T820) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/65.0.3325.109 Safari/537.36";
const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.0.3 Safari/605.1.15";
const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:90.0) Gecko/20100101 Firefox/90.0";

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn auto_registering(fake: FakeHost) -> FakeHost {
	let mut fake = fake;
	fake.config.auto_register = true;
	fake
}

fn action(outcome: &BootstrapOutcome) -> Option<SessionAction> {
	match outcome {
		BootstrapOutcome::Completed { action, .. } => Some(*action),
		_ => None,
	}
}

#[tokio::test]
async fn test_overlapping_bootstrap_is_silent_no_op() -> anyhow::Result<()> {
	init_tracing();
	let fake = auto_registering(FakeHost::direct());
	fake.page.set_visible_silently(false);
	let sdk = fake.sdk()?;

	let first = tokio::spawn({
		let sdk = sdk.clone();
		async move { sdk.session_init(BootstrapOptions::auto_init()).await }
	});
	fake.page.wait_for_visibility_listener().await;
	assert_eq!(sdk.state(), BootstrapState::AwaitingVisibility);
	assert!(sdk.context().is_running());

	assert_eq!(sdk.register_for_push().await, BootstrapOutcome::AlreadyRunning);
	assert_eq!(fake.journal.count("prompts."), 0);

	fake.page.fire_visibility_change(true);
	let outcome = first.await?;
	assert_eq!(action(&outcome), Some(SessionAction::NativePrompt));
	assert_eq!(fake.journal.count("prompts.native"), 1);
	assert_eq!(fake.subscriptions.registered().len(), 1);
	assert!(!sdk.context().is_running());
	assert_eq!(sdk.state(), BootstrapState::Done);
	Ok(())
}

#[tokio::test]
async fn test_hidden_page_waits_for_visible_signal() -> anyhow::Result<()> {
	let fake = auto_registering(FakeHost::direct());
	fake.page.set_visible_silently(false);
	let sdk = fake.sdk()?;

	let bootstrap = tokio::spawn({
		let sdk = sdk.clone();
		async move { sdk.session_init(BootstrapOptions::auto_init()).await }
	});
	fake.page.wait_for_visibility_listener().await;

	fake.page.fire_visibility_change(false);
	tokio::task::yield_now().await;
	assert_eq!(sdk.state(), BootstrapState::AwaitingVisibility);
	assert_eq!(fake.journal.position("permissions."), None);
	assert!(!bootstrap.is_finished());

	fake.page.fire_visibility_change(true);
	bootstrap.await?;
	assert_eq!(fake.page.visibility_listeners_added(), 1);
	assert_eq!(fake.page.visibility_listener_count(), 0);
	assert!(fake.journal.appears_before("page.visibility_change(true)", "permissions."));
	Ok(())
}

#[tokio::test]
async fn test_explicit_call_ignores_hidden_page() -> anyhow::Result<()> {
	let fake = FakeHost::direct();
	fake.page.set_visible_silently(false);
	let sdk = fake.sdk()?;

	let outcome = sdk.register_for_push().await;
	assert_eq!(action(&outcome), Some(SessionAction::NativePrompt));
	assert_eq!(fake.page.visibility_listeners_added(), 0);
	Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Benign {
	Dismissed,
	AlreadySubscribed,
	Denied,
	NotGranted,
}

fn script(fake: &FakeHost, benign: Benign) {
	match benign {
		Benign::Dismissed => {
			fake.page.set_user_agent(SAFARI_MAC);
			fake.prompts.answer_slidedown(SlidedownResponse::Dismissed);
		}
		Benign::AlreadySubscribed => fake.permissions.set_push_enabled(true),
		Benign::Denied => fake.permissions.set_permission(NotificationPermission::Denied),
		Benign::NotGranted => fake.prompts.answer_native(NotificationPermission::Default),
	}
}

#[tokio::test]
async fn test_every_mode_absorbs_benign_errors() -> anyhow::Result<()> {
	init_tracing();
	let hosts: [fn() -> FakeHost; 4] = [FakeHost::direct, FakeHost::proxied_top_frame, FakeHost::auxiliary_frame, FakeHost::insecure];

	for make in hosts {
		for benign in [Benign::Dismissed, Benign::AlreadySubscribed, Benign::Denied, Benign::NotGranted] {
			let fake = auto_registering(make());
			script(&fake, benign);
			let sdk = fake.sdk()?;

			let outcome = sdk.session_init(BootstrapOptions::auto_init()).await;
			let environment = outcome.environment().expect("bootstrap should have run");
			assert_eq!(sdk.state(), BootstrapState::Done, "{benign:?} in {environment:?}");
			assert!(!sdk.context().is_running());
			assert!(sdk.context().session_ready().is_raised());

			match (environment.mode, environment.is_auxiliary()) {
				(_, true) => assert_eq!(action(&outcome), Some(SessionAction::Suppressed(Suppression::AuxiliaryFrame))),
				(IntegrationMode::InsecureLegacy, _) => assert_eq!(action(&outcome), Some(SessionAction::LegacyPrompt)),
				_ => assert!(
					matches!(outcome, BootstrapOutcome::Absorbed { benign: true, .. }),
					"{benign:?} in {environment:?} gave {outcome:?}"
				),
			}
		}
	}
	Ok(())
}

#[tokio::test]
async fn test_unexpected_failure_is_absorbed_and_latch_released() -> anyhow::Result<()> {
	let fake = auto_registering(FakeHost::direct());
	fake.subscriptions.fail_subscribe("push service unavailable");
	let sdk = fake.sdk()?;

	let outcome = sdk.session_init(BootstrapOptions::auto_init()).await;
	match outcome {
		BootstrapOutcome::Absorbed { benign, error, .. } => {
			assert!(!benign);
			assert!(error.contains("push service unavailable"));
		}
		other => panic!("expected absorbed failure, got {other:?}"),
	}
	assert!(!sdk.context().is_running());
	assert_ne!(sdk.register_for_push().await, BootstrapOutcome::AlreadyRunning);
	Ok(())
}

#[tokio::test]
async fn test_strategy_table_selects_prompt() -> anyhow::Result<()> {
	let cases = [
		(CHROME_ANDROID_TABLET, SessionAction::SlideDown),
		(SAFARI_MAC, SessionAction::SlideDown),
		(FIREFOX_LINUX, SessionAction::NativePrompt),
	];
	for (user_agent, expected) in cases {
		let fake = auto_registering(FakeHost::direct());
		fake.page.set_user_agent(user_agent);
		let sdk = fake.sdk()?;

		let outcome = sdk.session_init(BootstrapOptions::auto_init()).await;
		assert_eq!(action(&outcome), Some(expected), "{user_agent}");
		assert_eq!(fake.journal.count("prompts.native"), 1);
	}
	Ok(())
}

#[tokio::test]
async fn test_prior_prompt_in_session_suppresses() -> anyhow::Result<()> {
	let fake = auto_registering(FakeHost::direct());
	fake.storage.seed(stores::SESSION, keys::PROMPT_SHOWN, json!(true));
	let sdk = fake.sdk()?;

	let outcome = sdk.session_init(BootstrapOptions::auto_init()).await;
	assert_eq!(action(&outcome), Some(SessionAction::Suppressed(Suppression::AlreadyPrompted)));
	assert_eq!(fake.journal.count("prompts."), 0);
	Ok(())
}

#[tokio::test]
async fn test_native_prompt_marks_session() -> anyhow::Result<()> {
	let fake = auto_registering(FakeHost::direct());
	fake.prompts.answer_native(NotificationPermission::Default);
	let sdk = fake.sdk()?;

	sdk.session_init(BootstrapOptions::auto_init()).await;
	assert_eq!(fake.storage.snapshot(stores::SESSION, keys::PROMPT_SHOWN), Some(json!(true)));

	let again = sdk.session_init(BootstrapOptions::auto_init()).await;
	assert_eq!(action(&again), Some(SessionAction::Suppressed(Suppression::AlreadyPrompted)));
	assert_eq!(fake.journal.count("prompts.native"), 1);
	Ok(())
}

#[tokio::test]
async fn test_auto_accept_skips_slidedown() -> anyhow::Result<()> {
	let fake = auto_registering(FakeHost::direct());
	fake.page.set_user_agent(SAFARI_MAC);
	let sdk = fake.sdk()?;

	let outcome = sdk.session_init(BootstrapOptions::auto_init().with_auto_accept()).await;
	assert_eq!(action(&outcome), Some(SessionAction::NativePrompt));
	assert_eq!(fake.journal.count("prompts.slidedown"), 0);
	Ok(())
}

#[tokio::test]
async fn test_explicit_modal_register_call() -> anyhow::Result<()> {
	let mut fake = FakeHost::direct();
	fake.config.prompt_options.modal = true;
	let sdk = fake.sdk()?;

	let outcome = sdk.register_for_push().await;
	assert_eq!(action(&outcome), Some(SessionAction::Modal));
	assert_eq!(fake.journal.entries().iter().filter(|e| e.starts_with("prompts.")).collect::<Vec<_>>(), vec!["prompts.modal"]);
	assert!(!sdk.context().session_ready().is_raised());
	Ok(())
}

#[tokio::test]
async fn test_opted_out_visitor_is_reenabled_without_prompt() -> anyhow::Result<()> {
	let fake = auto_registering(FakeHost::direct());
	fake.permissions.set_opted_out(true);
	let sdk = fake.sdk()?;

	let outcome = sdk.session_init(BootstrapOptions::auto_init()).await;
	assert_eq!(action(&outcome), Some(SessionAction::Suppressed(Suppression::OptedOut)));
	assert_eq!(fake.subscriptions.enabled(), Some(true));
	assert_eq!(fake.journal.count("prompts."), 0);
	Ok(())
}

#[tokio::test]
async fn test_granted_but_unregistered_resubscribes() -> anyhow::Result<()> {
	let mut fake = FakeHost::direct();
	fake.config.auto_resubscribe = true;
	fake.permissions.set_permission(NotificationPermission::Granted);
	let sdk = fake.sdk()?;

	let outcome = sdk.session_init(BootstrapOptions::auto_init()).await;
	assert_eq!(action(&outcome), Some(SessionAction::Resubscribe));
	assert_eq!(fake.subscriptions.registered().len(), 1);
	assert_eq!(fake.journal.count("prompts."), 0);
	Ok(())
}

#[tokio::test]
async fn test_legacy_prompt_once_per_session() -> anyhow::Result<()> {
	let fake = auto_registering(FakeHost::insecure());
	let sdk = fake.sdk()?;

	let first = sdk.session_init(BootstrapOptions::auto_init()).await;
	assert_eq!(action(&first), Some(SessionAction::LegacyPrompt));

	let second = sdk.session_init(BootstrapOptions::auto_init()).await;
	assert_eq!(action(&second), Some(SessionAction::Suppressed(Suppression::AlreadyPrompted)));

	let explicit = sdk.register_for_push().await;
	assert_eq!(action(&explicit), Some(SessionAction::LegacyPrompt));
	assert_eq!(fake.journal.count("prompts.legacy"), 2);
	assert_eq!(fake.journal.count("permissions."), 0);
	Ok(())
}

#[tokio::test]
async fn test_legacy_without_request_does_nothing() -> anyhow::Result<()> {
	let fake = FakeHost::insecure();
	let sdk = fake.sdk()?;

	let outcome = sdk.session_init(BootstrapOptions::auto_init()).await;
	assert_eq!(action(&outcome), Some(SessionAction::Suppressed(Suppression::NotRequested)));
	Ok(())
}

#[tokio::test]
async fn test_slidedown_acceptance_subscribes() -> anyhow::Result<()> {
	let fake = auto_registering(FakeHost::direct());
	fake.page.set_user_agent(CHROME_ANDROID_TABLET);
	let sdk = fake.sdk()?;
	let mut events = sdk.events();

	sdk.session_init(BootstrapOptions::auto_init()).await;
	assert!(fake.journal.appears_before("prompts.slidedown", "prompts.native"));
	assert!(fake.journal.appears_before("prompts.native", "subscriptions.subscribe(resubscribe-existing)"));

	let endpoint = fake.subscriptions.registered()[0].endpoint.clone();
	assert_eq!(events.recv().await?, pushboot::SdkEvent::Subscribed { endpoint });
	assert_eq!(events.recv().await?, pushboot::SdkEvent::SessionReady);
	assert_eq!(sdk.context().baseline(), None);
	Ok(())
}
