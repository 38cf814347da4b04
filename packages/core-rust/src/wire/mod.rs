//! JSON request and response bodies of the HTTP surface.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` so field names match
//! what callers send and receive.

pub mod allowance;
pub mod envelope;
pub mod prompt;

pub use allowance::{AllowanceResponse, ApproveRequest, ApproveResponse};
pub use envelope::{ErrorBody, ErrorEnvelope};
pub use prompt::{JobResponse, PromptRequest};
