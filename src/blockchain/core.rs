// core.rs splits ledger responsibilities into submodules: block sealing and
// the chain itself, the pending-entry buffer, and whole-chain validation.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;
