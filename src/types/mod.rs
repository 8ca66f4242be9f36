//! Wire-contract data model.
//!
//! Typed serde envelopes for every consumed endpoint. Parsing through these
//! types is the validation step: a body that does not match surfaces as a
//! `VALIDATION` error instead of an unchecked cast.

mod api_key;
mod project;
mod test_run;

pub use api_key::{
    ApiKey, ApiKeyMutationResponse, ApiKeyStatus, ApiKeysResponse, CreateApiKeyRequest, ProjectRef,
};
pub use project::{Project, ProjectResponse};
pub use test_run::{RunStatus, RunTotals, TestRun, TestRunsResponse};
