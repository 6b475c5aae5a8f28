use async_trait::async_trait;
use http::Method;
use log::debug;
use tokio::process::Command;

use crate::error::TwitchError;

/// Raw result of one HTTP exchange: status code plus body text. Decoding
/// and error classification happen a layer up.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// One authenticated HTTP request. Implemented by the curl-backed
/// production transport and by the scripted mock in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<RawResponse, TwitchError>;
}

/// Production transport: shells out to the configured curl binary and
/// parses its `--include` output back into status + body.
pub struct CurlTransport {
    curl_path: String,
}

impl CurlTransport {
    pub fn new(curl_path: impl Into<String>) -> Self {
        Self {
            curl_path: curl_path.into(),
        }
    }
}

#[async_trait]
impl Transport for CurlTransport {
    async fn fetch(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<RawResponse, TwitchError> {
        let args = build_curl_args(&method, url, headers);
        debug!("[Transport] {} {}", method, url);

        let output = Command::new(&self.curl_path)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                TwitchError::Transport(format!("Failed to run {}: {}", self.curl_path, e))
            })?;

        if !output.status.success() {
            return Err(TwitchError::Transport(format!(
                "curl failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        let response = parse_http_response(&raw)?;
        debug!("[Transport] {} {} -> {}", method, url, response.status);
        Ok(response)
    }
}

/// Assemble the curl argument list. Headers go in request order; the URL
/// is always the final argument.
fn build_curl_args(method: &Method, url: &str, headers: &[(String, String)]) -> Vec<String> {
    let mut args = vec![
        "--silent".to_string(),
        "--show-error".to_string(),
        "--include".to_string(),
        "--request".to_string(),
        method.to_string(),
    ];
    for (name, value) in headers {
        args.push("--header".to_string());
        args.push(format!("{}: {}", name, value));
    }
    args.push(url.to_string());
    args
}

/// Parse `curl --include` output. Interim header blocks (100 Continue and
/// friends) are skipped; the last status line wins.
fn parse_http_response(raw: &str) -> Result<RawResponse, TwitchError> {
    let mut rest = raw;
    let mut status = None;

    while rest.starts_with("HTTP/") {
        let (head, tail) = split_header_block(rest);
        status = Some(parse_status_line(head.lines().next().unwrap_or_default())?);
        rest = tail;
    }

    match status {
        Some(status) => Ok(RawResponse {
            status,
            body: rest.to_string(),
        }),
        None => Err(TwitchError::Transport(
            "curl output carried no HTTP status line".to_string(),
        )),
    }
}

fn split_header_block(raw: &str) -> (&str, &str) {
    if let Some(idx) = raw.find("\r\n\r\n") {
        (&raw[..idx], &raw[idx + 4..])
    } else if let Some(idx) = raw.find("\n\n") {
        (&raw[..idx], &raw[idx + 2..])
    } else {
        // Headers only, no body terminator (connection closed early)
        (raw, "")
    }
}

fn parse_status_line(line: &str) -> Result<u16, TwitchError> {
    line.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| TwitchError::Transport(format!("Unparsable status line: {}", line)))
}
