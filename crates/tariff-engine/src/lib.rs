pub mod duty;
pub mod error;
pub mod orchestrator;
pub mod qualification;
pub mod rounding;
pub mod selector;

pub mod test_support;

pub use duty::compute_duty;
pub use error::EngineError;
pub use orchestrator::Calculator;
pub use qualification::{compute_rvc, decide_basis, BasisDecision};
pub use selector::select_applicable;
