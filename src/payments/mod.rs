//! Payment gateway integration module
//!
//! The gateway seam ([`traits::PaymentGateway`]), its GOV.UK Pay wire types, and the
//! flow that maps gateway outcomes onto host transactions.

pub mod flow;
pub mod providers;
pub mod traits;
pub mod types;
