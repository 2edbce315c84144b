mod attribute_store;
mod clock;
mod measurement;
mod message_handler;
mod result;

pub use attribute_store::*;
pub use clock::*;
pub use measurement::*;
pub use message_handler::*;
pub use result::*;
