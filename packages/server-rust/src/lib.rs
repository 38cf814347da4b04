//! Promptgate server: turns an asynchronous, payment-gated agent service into
//! a synchronous HTTP request/response API.

pub mod cli;
pub mod network;
pub mod service;
pub mod traits;

pub use traits::{AgentService, AllowanceChain};
