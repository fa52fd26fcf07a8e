//! Common types used across the application.

pub mod decimal;
pub mod id;
pub mod scope;

pub use decimal::{ArithmeticError, DecimalOps};
pub use id::*;
pub use scope::Scope;
