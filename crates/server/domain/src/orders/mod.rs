//! Order aggregate and repository abstractions.

pub mod model;
pub mod repository;

pub use model::{derive_dedup_key, CreateOrderRequest, Order};
pub use repository::OrderRepository;
