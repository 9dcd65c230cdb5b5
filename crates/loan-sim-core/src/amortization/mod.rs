pub mod extra_payments;
pub mod schedule;

#[cfg(feature = "comparison")]
pub mod comparison;
