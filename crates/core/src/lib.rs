//! Session and subscription bootstrap for embedded push-notification integrations.
//!
//! The crate decides, once per page load, how to bring a visitor's push
//! subscription in line with the desired state. Hosting environments differ in
//! whether privileged subscription calls can run directly, must be proxied
//! through an auxiliary frame, or are limited to a legacy insecure path; the
//! [`environment`] classifier picks the mode and the rest of the crate
//! branches on it.
//!
//! # Layout
//!
//! * [`bootstrap`]: the [`Sdk`] instance, the session state machine and the
//!   post-initialization sequence
//! * [`single_flight`], [`visibility`], [`permission_hook`]: small gates used
//!   by the orchestrator
//! * [`prompt`]: the permission-prompt strategy table
//! * [`renewal`]: expiring-subscription renewal across integration modes
//! * [`frame`]: the cross-frame postman with one-shot listeners
//! * [`host`]: traits for everything the page provides
//! * [`fake`]: in-memory hosts for tests and simulation

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod events;
pub mod fake;
pub mod frame;
pub mod host;
pub mod permission_hook;
pub mod prompt;
pub mod renewal;
pub mod single_flight;
pub mod storage;
pub mod visibility;

/// Default timeout in milliseconds for cross-frame round trips.
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 30_000;

/// Version reported with backend session updates when the config names none.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use bootstrap::{BootstrapOptions, BootstrapOutcome, BootstrapState, Sdk, SessionAction};
pub use config::{IntegrationKind, SdkConfig};
pub use context::{Baseline, BootstrapContext};
pub use environment::{Environment, FrameRole, IntegrationMode, WindowContext, classify};
pub use error::{Error, Result};
pub use events::{SdkEvent, Signal};
pub use frame::{FrameChannel, FramePort, FramePostman, OnceListener, RemoteCommandHandler};
pub use host::{Host, NotificationPermission};
pub use prompt::{BrowserIdentity, BrowserVendor, FormFactor, PromptInputs, PromptStrategy, Suppression, select_strategy};
pub use pushboot_protocol as protocol;
pub use renewal::{RenewalOutcome, SubscriptionRenewalCoordinator};
pub use single_flight::{SingleFlightGate, SingleFlightGuard};
pub use storage::{KeyValueStore, MemoryStore};
pub use visibility::VisibilityGate;
