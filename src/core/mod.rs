pub mod assignment;
pub mod coordinator;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod services;
pub mod session;
pub mod tracker;
