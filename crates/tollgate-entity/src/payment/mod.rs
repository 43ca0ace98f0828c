//! Payment webhook domain entities.

pub mod webhook;

pub use webhook::{PaymentEvent, WebhookOutcome};
