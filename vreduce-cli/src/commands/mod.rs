pub mod common;
pub mod cost;
pub mod divergence;
pub mod reduce;
