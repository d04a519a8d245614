pub mod address;
pub mod assignment;
pub mod audit;
pub mod cart;
pub mod contribution;
pub mod order;
pub mod room;
pub mod session;
