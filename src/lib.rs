#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_literal_bound,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod delegation;
pub mod error;
pub mod guardian;
pub mod llm;
pub mod observability;
pub mod scan;
pub mod session;

pub use config::Config;
pub use delegation::{DelegationFlow, FlowOutcome};
pub use error::{GatewayError, Result};
pub use guardian::{Guardian, GuardianVerdict};
