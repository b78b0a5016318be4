//! Wire types for the pushboot cross-frame protocol.
//!
//! This crate contains the serde-serializable types exchanged between the
//! hosting page and the auxiliary frame, plus the records the bootstrap hands
//! to the backend session sync. These types represent the "protocol layer":
//! the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * Stable: Changes only when the wire format changes
//!
//! Orchestration built on top of these types lives in `pushboot`.

pub mod device;
pub mod frame;
pub mod subscription;

pub use device::*;
pub use frame::*;
pub use subscription::*;
