// UI layer: one interactive pass. Ask for the project folder, normalize the
// path, send it to the service while a spinner runs, then print what the
// service said. All classification happens in `api`; this module only talks
// to the terminal.

use crate::api::{ApiClient, GenerateRequest};
use crate::outcome::{DispatchError, Outcome};
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Printable summary of an outcome. Kept free of terminal styling so it can
/// be checked in tests; `print_report` adds the colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub success: bool,
    pub heading: String,
    pub lines: Vec<String>,
}

/// Run the client once: prompt, dispatch, report.
pub fn run(api: &ApiClient) -> Result<()> {
    println!("Excel generation service client");
    println!("-------------------------------");

    // `allow_empty` lets the user just press Enter to quit.
    let raw: String = Input::new()
        .with_prompt("Full path of the project folder (e.g. /data/projects/240304)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read the project path")?;

    if raw.trim().is_empty() {
        println!("No path entered. Exiting.");
    } else {
        let normalized = normalize_path(&raw);
        let project_path = normalized.to_string_lossy().into_owned();
        print_request(api.endpoint(), &project_path)?;

        let outcome = with_spinner("Waiting for the service to generate the workbook...", || {
            api.dispatch(&project_path)
        })?;
        print_report(&render_outcome(&outcome, api.endpoint()));
    }

    println!("\n--- Client finished ---");
    Ok(())
}

/// Lexically normalize a user-typed path: repeated separators and `.`
/// components disappear and `..` cancels the component before it. The file
/// system is never consulted.
pub fn normalize_path(input: &str) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in Path::new(input.trim()).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                // `..` at the root stays at the root.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        PathBuf::from(".")
    } else {
        parts.iter().collect()
    }
}

/// Turn an outcome into the heading and detail lines shown to the user.
pub fn render_outcome(outcome: &Outcome, endpoint: &str) -> Report {
    match outcome {
        Ok(generated) => Report {
            success: true,
            heading: "Service response".into(),
            lines: vec![
                "Status: success".into(),
                format!("Message: {}", generated.message),
                format!("Excel file generated at: {}", generated.file_path),
            ],
        },
        Err(err) => {
            let lines = match err {
                DispatchError::InvalidInput => vec!["No project path was provided.".into()],
                DispatchError::Http { code, details } => vec![
                    format!("Status code: {}", code),
                    format!("Server error details: {}", details),
                ],
                DispatchError::Decode { raw } => vec![
                    "Could not decode the JSON response from the service.".into(),
                    format!("Response received (text): {}", raw),
                ],
                DispatchError::ServerReported { message } => vec![
                    "Status: error".into(),
                    format!("Message: {}", message),
                ],
                DispatchError::Connection(reason) => vec![
                    format!("Could not connect to the service at {}: {}", endpoint, reason),
                    "Make sure the Excel generation service is running.".into(),
                ],
                DispatchError::Timeout(reason) => {
                    vec![format!("The request to the service timed out: {}", reason)]
                }
                DispatchError::Transport(reason) => {
                    vec![format!("The request failed: {}", reason)]
                }
                DispatchError::Unexpected(reason) => {
                    vec![format!("An unexpected error occurred: {}", reason)]
                }
            };
            Report {
                success: false,
                heading: err.kind().to_string(),
                lines,
            }
        }
    }
}

/// Print the endpoint and the JSON payload before sending.
fn print_request(endpoint: &str, project_path: &str) -> Result<()> {
    let payload = serde_json::to_string_pretty(&GenerateRequest {
        project_path: project_path.to_string(),
    })?;
    println!("\nSending request to: {}", endpoint);
    println!("Payload: {}", payload);
    Ok(())
}

fn print_report(report: &Report) {
    let heading = format!("--- {} ---", report.heading);
    if report.success {
        println!("\n{}", heading.green().bold());
    } else {
        println!("\n{}", heading.red().bold());
    }
    for line in &report.lines {
        println!("{}", line);
    }
}

/// Show a spinner while `work` blocks. The request can take minutes, so the
/// spinner ticks on its own thread instead of being driven by us.
fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .context("Invalid spinner template")?,
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    let result = work();
    spinner.finish_and_clear();
    Ok(result)
}
