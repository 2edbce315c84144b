pub mod domain;
pub mod exist;
mod measurement_bridge;
pub mod mqtt;

pub use measurement_bridge::*;
