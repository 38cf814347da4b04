//! Promptgate core — job model, poll bounds, error taxonomy, and wire types.

pub mod allowance;
pub mod error;
pub mod job;
pub mod poll;
pub mod validate;
pub mod wire;

pub use allowance::{parse_address, parse_amount, AllowanceState, MAX_APPROVAL};
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use job::{Job, JobStatus};
pub use poll::{PollConfig, PollOverrides};
pub use validate::{validate_job_id, validate_prompt_request, PromptSubmission};
