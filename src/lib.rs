pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::CofundError;
pub use crate::core::services::CheckoutService;
pub use crate::infrastructure::payment::{PaymentChannelAdapter, PaymentChannels};

#[cfg(test)]
mod tests;
