pub mod checks;
pub mod compare;
pub mod loan;
pub mod rate;
pub mod rural;
pub mod tax;

use clap::ValueEnum;
use loan_sim_core::AmortizationMethod;

/// Amortization method as spelled on the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum MethodArg {
    /// Constant payment (Price table)
    #[default]
    Price,
    /// Constant principal (SAC)
    Sac,
}

impl From<MethodArg> for AmortizationMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Price => AmortizationMethod::ConstantPayment,
            MethodArg::Sac => AmortizationMethod::ConstantPrincipal,
        }
    }
}
