//! The decision steps a client order passes through.

pub mod adjudicator;
pub mod executor;
pub mod responder;
pub mod router;
pub mod safety;
pub mod verifier;

pub use safety::SafetyFilter;
