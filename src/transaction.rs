//! Transaction module split into types, scripts and validation

pub mod script;
pub mod types;
pub mod validation;

pub use script::*;
pub use types::*;
pub use validation::MAX_MONEY;
