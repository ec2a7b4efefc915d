//! Usage Analytics
//!
//! Best-effort forwarding of usage events to an external collection
//! endpoint. Failures are logged and dropped; they never affect a
//! provisioning result.

pub mod event;
pub mod notifier;

pub use event::UsageEvent;
pub use notifier::{
    UsageNotifier, UsageNotifierConfig, UsageError,
    NoOpUsageNotifier, HttpUsageNotifier, notify_detached,
};
