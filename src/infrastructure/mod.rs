pub mod logging;
pub mod orders;
pub mod payment;
pub mod storage;
