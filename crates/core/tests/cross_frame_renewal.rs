// Renewal across the frame boundary, driven through the fake frame port.

use std::time::Duration;

use pushboot::fake::FakeHost;
use pushboot::protocol::{FrameCommand, FrameMessage, SubscriptionRecord};
use pushboot::{RenewalOutcome, SdkEvent};
use serde_json::json;

#[tokio::test]
async fn test_auxiliary_frame_resolves_only_on_subscription_created() -> anyhow::Result<()> {
	let fake = FakeHost::auxiliary_frame();
	fake.subscriptions.set_expiring(true);
	let sdk = fake.sdk()?;
	let mut events = sdk.events();

	let handle = sdk.init()?;
	let request = fake.port.next_sent().await;
	assert_eq!(request.command, FrameCommand::SubscribeNew);
	assert_eq!(request.payload["appId"], "app-1");
	assert_eq!(request.payload["proxyOrigin"], "https://shop.proxy.example");

	fake.postman.dispatch(json!({"id": 0, "command": "ping"}))?;
	fake.postman.dispatch(json!({"id": 1, "command": "subscribe-new", "payload": {}}))?;
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(!handle.is_finished());
	assert!(!sdk.is_initialized());

	let record = SubscriptionRecord::new("https://push.example/from-top").with_keys("pk", "auth");
	let created = FrameMessage::command(2, FrameCommand::SubscriptionCreated, serde_json::to_value(&record)?);
	fake.postman.dispatch(serde_json::to_value(created)?)?;

	handle.await??;
	let mut renewed = None;
	while let Ok(event) = events.try_recv() {
		if let SdkEvent::SubscriptionRenewed { outcome } = event {
			renewed = Some(outcome);
		}
	}
	assert_eq!(renewed, Some(RenewalOutcome::ReceivedFromTopFrame { record }));
	assert!(fake.subscriptions.registered().is_empty());
	Ok(())
}

#[tokio::test]
async fn test_shutdown_releases_auxiliary_wait() -> anyhow::Result<()> {
	let fake = FakeHost::auxiliary_frame();
	fake.subscriptions.set_expiring(true);
	let sdk = fake.sdk()?;

	let handle = sdk.init()?;
	fake.port.next_sent().await;
	fake.postman.shutdown();

	handle.await??;
	assert!(sdk.is_initialized());
	assert_eq!(fake.postman.listeners().armed(FrameCommand::SubscriptionCreated), 0);
	Ok(())
}

#[tokio::test]
async fn test_inbound_loop_feeds_postman() -> anyhow::Result<()> {
	let fake = FakeHost::auxiliary_frame();
	fake.subscriptions.set_expiring(true);
	let sdk = fake.sdk()?;

	let (inbound, rx) = tokio::sync::mpsc::unbounded_channel();
	let pump = tokio::spawn(fake.postman.clone().run(rx));

	let handle = sdk.init()?;
	fake.port.next_sent().await;
	inbound.send(json!({"id": 0, "command": "subscription-created", "payload": {"endpoint": "https://push.example/x"}}))?;
	handle.await??;

	drop(inbound);
	pump.await?;
	Ok(())
}
