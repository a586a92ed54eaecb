//! Shared helpers for unit tests.


pub use builder::FunctionBuilder;
