//! Payment gateway implementations
//!
//! Concrete implementations of the PaymentGateway trait.

pub mod govukpay;
pub mod mock;

pub use govukpay::{GovukPayConfig, GovukPayGateway};
pub use mock::MockGateway;
