#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod model;
pub mod time;

pub use error::Error;
pub use generator::{GeneratorConfig, GeneratorError, OperandRange, ProblemGenerator};
pub use time::Clock;
