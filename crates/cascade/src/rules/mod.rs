//! Update rules applied inside a macro-step: deposition, elimination,
//! and transport. The driver composes them into the cascade.

pub mod deposit;
pub mod eliminate;
pub mod transport;
