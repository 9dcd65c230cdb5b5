pub mod error;
pub mod tax;
pub mod time_value;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "rural")]
pub mod rural;

#[cfg(feature = "rate_solver")]
pub mod rate_solver;

#[cfg(feature = "check_discount")]
pub mod check_discount;

pub use error::LoanSimError;
pub use types::*;

/// Standard result type for all loan-sim operations
pub type LoanSimResult<T> = Result<T, LoanSimError>;
