pub mod args;
pub mod chunk;
pub mod error;
pub mod export;
pub mod generate;
pub mod normalize;
pub mod pipeline;
pub mod qa;
pub mod sample;
pub mod schema;
