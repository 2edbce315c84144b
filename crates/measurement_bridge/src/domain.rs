mod date_resolver;
mod measurement_pipeline;
mod payload_normalizer;
mod unit_converter;
mod update_mapper;

pub use date_resolver::*;
pub use measurement_pipeline::*;
pub use payload_normalizer::*;
pub use unit_converter::*;
pub use update_mapper::*;
