// Library root
// -----------
// Client for the Excel generation service. The binary (`main.rs`) wires
// these modules into a one-shot interactive CLI.
//
// Module responsibilities:
// - `api`: sends the generation request and classifies the response.
// - `outcome`: the result type returned by a dispatch.
// - `config`: endpoint and wait limit, read from the environment.
// - `ui`: prompt, path normalization and console output.
pub mod api;
pub mod config;
pub mod outcome;
pub mod ui;

pub use api::{dispatch, ApiClient};
pub use config::ServiceConfig;
pub use outcome::{DispatchError, ErrorDetails, GeneratedFile, Outcome};
