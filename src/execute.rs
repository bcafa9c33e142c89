//! Artifact execution: parse a rendered request file and dispatch it.
//!
//! The artifact grammar is small and parsed by hand:
//!
//! ```text
//! // optional comment line
//! <METHOD> <URL>          # within the first two lines
//! <Header>: <value>       # every remaining ": " line
//!                         # blank line
//! <body>                  # passed byte-for-byte
//! ```
//!
//! Dispatch shells out to `curl`. The transport is an external
//! collaborator; classification looks only at its exit status and the
//! status line in its output.

use std::fs;
use std::io::{self, Write as _};
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

use crate::model::ExecutionResult;

/// Method assumed when the request line carries none.
const DEFAULT_METHOD: &str = "POST";

/// Status-line tokens that classify a response as successful.
const SUCCESS_TOKENS: [&str; 3] = ["200 OK", "201 Created", "204"];

/// Ways a rendered artifact can fail to parse.
///
/// Scoped to the one artifact; parsing never aborts the batch.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("missing body: no blank line separates headers from body")]
    MissingBody,

    #[error("no request line with a URL found")]
    MissingRequestLine,
}

/// A parsed request, ready for dispatch.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Parse an artifact's text into method, URL, headers, and body.
pub fn parse_request(text: &str) -> Result<ParsedRequest, ParseError> {
    let Some((header_block, body)) = text.split_once("\n\n") else {
        return Err(ParseError::MissingBody);
    };

    let lines: Vec<&str> = header_block.split('\n').collect();

    // The request line sits on one of the first two lines, allowing
    // for one leading comment. First matching line wins.
    let mut method = DEFAULT_METHOD.to_string();
    let mut url = None;
    for line in lines.iter().take(2) {
        if is_comment(line) || !line.contains(' ') {
            continue;
        }
        if let Some((m, u)) = line.split_once(' ') {
            method = m.to_string();
            url = Some(u.to_string());
            break;
        }
    }
    let Some(url) = url else {
        return Err(ParseError::MissingRequestLine);
    };

    let headers = lines
        .iter()
        .filter(|line| !is_comment(line))
        .filter_map(|line| line.split_once(": "))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    Ok(ParsedRequest {
        method,
        url,
        headers,
        body: body.to_string(),
    })
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with('#')
}

/// Execute one artifact: read, parse, dispatch, classify.
///
/// Failures of any kind fold into the result rather than propagating;
/// one artifact cannot take the batch down.
pub fn execute(artifact: &Path) -> ExecutionResult {
    match try_execute(artifact) {
        Ok((success, output)) => ExecutionResult {
            artifact: artifact.to_path_buf(),
            success,
            output,
        },
        Err(e) => {
            tracing::error!("failed to execute {}: {e}", artifact.display());
            ExecutionResult {
                artifact: artifact.to_path_buf(),
                success: false,
                output: e.to_string(),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ExecuteError {
    #[error("failed to read artifact: {0}")]
    Read(io::Error),

    #[error("invalid request format: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to run curl: {0}")]
    Dispatch(io::Error),
}

fn try_execute(artifact: &Path) -> Result<(bool, String), ExecuteError> {
    let text = fs::read_to_string(artifact).map_err(ExecuteError::Read)?;
    let request = parse_request(&text)?;
    dispatch(&request).map_err(ExecuteError::Dispatch)
}

/// Dispatch a parsed request through curl.
///
/// The body travels through a named temp file; dropping the handle
/// removes it on every exit path.
fn dispatch(request: &ParsedRequest) -> io::Result<(bool, String)> {
    let mut body_file = NamedTempFile::new()?;
    body_file.write_all(request.body.as_bytes())?;
    body_file.flush()?;

    let mut command = Command::new("curl");
    command.args(["-s", "-S", "-i", "-X", &request.method]);
    for (name, value) in &request.headers {
        command.args(["-H", &format!("{name}: {value}")]);
    }
    command.arg("-d").arg(format!("@{}", body_file.path().display()));
    command.arg(&request.url);

    tracing::debug!("dispatching {} {}", request.method, request.url);
    let output = command.output()?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if output.status.success() && classify_success(&stdout) {
        Ok((true, stdout))
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostic = if stderr.is_empty() {
            stdout
        } else {
            stderr.into_owned()
        };
        Ok((false, diagnostic))
    }
}

/// A response counts as successful when its raw text carries a
/// 2xx status-line token.
fn classify_success(response: &str) -> bool {
    SUCCESS_TOKENS.iter().any(|token| response.contains(token))
}
