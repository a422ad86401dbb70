//! The guarded request path and the responder layer it protects.

pub mod coordinator;
pub mod flow;
pub mod responder;

pub use coordinator::{CoordinatorResponder, Specialist};
pub use flow::{DelegationFlow, FlowOutcome};
pub use responder::{RespondFuture, Responder, ResponderOutput};
