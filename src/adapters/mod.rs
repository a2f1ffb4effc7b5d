//! Deployment adapters for the validation service.
//!
//! - **CLI**: load a submission file and render the report for a terminal
//! - **HTTP**: a framework-agnostic handler for a `POST /api/validate` route
//!
//! Each adapter translates [`ValidationService`](crate::ValidationService)
//! results into the interface expected by its deployment target.

pub mod cli;
pub mod http;

pub use cli::{load_submission, render_report, run_validation, DEFAULT_SUBMISSION_PATH};
pub use http::{handle_validate, HttpResponse, ValidateRequest, ValidateResponse};
