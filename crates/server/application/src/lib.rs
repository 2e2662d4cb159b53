// Pedidos Order Context - Application Layer
// Use cases coordinating the domain against its ports.

pub mod orders;

pub use orders::*;
