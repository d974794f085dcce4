pub mod admin_auth;
pub mod health;
pub mod payment;
pub mod settings;
