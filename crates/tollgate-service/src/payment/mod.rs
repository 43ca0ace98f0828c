//! Payment webhook verification and crediting.

pub mod processor;
pub mod signature;

pub use processor::PaymentProcessor;
pub use signature::verify_signature;
