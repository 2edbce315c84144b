mod exist_client;

pub use exist_client::*;
