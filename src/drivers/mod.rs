//! Drivers running the `plodmft` pipelines.

use anyhow;

pub mod projection;

// =================
// Trait definitions
// =================

/// A trait for `plodmft` drivers.
pub trait PlodmftDriver {
    /// The type of the calculation result from the driver.
    type Outcome;

    /// Executes the driver.
    fn run(&mut self) -> Result<(), anyhow::Error>;

    /// Returns the result of the driver.
    fn result(&self) -> Result<&Self::Outcome, anyhow::Error>;
}
