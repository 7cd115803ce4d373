//! Recovery of structured data from raw model output.
//!
//! Model responses frequently wrap the JSON object in prose, truncate it, or
//! repeat the final line. Extraction runs in stages: isolate the brace-scoped
//! region line by line, trim trailing noise, parse (strict JSON first, then a
//! lenient json5 pass), and finally escalate to a model-assisted repair with a
//! bounded attempt count.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::audit::AnalysisResult;
use crate::llm::{repair_request, GatewayError, ModelGateway};

/// Upper bound on model-assisted repair round-trips per response.
pub const MAX_REPAIR_ATTEMPTS: u32 = 2;

/// Terminal failures of the extraction pipeline.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in response text")]
    NoObject,
    #[error("JSON object region never closed (truncated response)")]
    Unbalanced,
    #[error("candidate text failed to parse: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("repair request failed: {0}")]
    Repair(#[source] GatewayError),
    #[error("no valid JSON recovered after {attempts} repair attempt(s)")]
    AttemptsExhausted { attempts: u32 },
}

/// Isolate the outermost brace-scoped region of `text`.
///
/// Lines are trimmed and scanned with a brace-depth counter: the first `{`
/// (leading same-line prose is dropped) opens the region, a line ending in `}`
/// closes one level, and depth zero ends the scan so trailing chatter is
/// discarded. If the region never closes, the buffer is cut back to the last
/// lone `}` line; a fragment with no such line is reported as unbalanced.
pub fn isolate_object(text: &str) -> Result<String, ExtractError> {
    let mut inside = false;
    let mut depth: i32 = 0;
    let mut closed = false;
    let mut lines: Vec<&str> = Vec::new();

    for raw in text.lines() {
        let mut line = raw.trim();
        if !inside {
            let Some(idx) = line.find('{') else { continue };
            line = &line[idx..];
            inside = true;
        }
        if line.starts_with('{') {
            depth += 1;
        }
        lines.push(line);
        if line.ends_with('}') {
            depth -= 1;
            if depth <= 0 {
                closed = true;
                break;
            }
        }
    }

    if lines.is_empty() {
        return Err(ExtractError::NoObject);
    }
    if !closed {
        // Truncated response: keep everything up to the last lone closing
        // brace, if one exists.
        match lines.iter().rposition(|line| *line == "}") {
            Some(pos) => lines.truncate(pos + 1),
            None => return Err(ExtractError::Unbalanced),
        }
    }
    Ok(lines.join(""))
}

/// Run stages 1–3 on a raw response: isolate the object, then parse it.
///
/// Strict JSON is tried first; on failure the same candidate gets one lenient
/// json5 pass, which absorbs the trailing commas and unquoted keys small
/// models produce. The reported error is always the strict one.
pub fn parse_response<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let candidate = isolate_object(text)?;
    match serde_json::from_str(&candidate) {
        Ok(value) => Ok(value),
        Err(strict) => json5::from_str(&candidate).map_err(|_| ExtractError::Parse(strict)),
    }
}

/// Full extraction pipeline including the model-assisted repair escalation.
///
/// Holds a borrowed gateway so one client serves both the primary analysis
/// calls and the repair passes.
pub struct ResponseExtractor<'a, G: ModelGateway + ?Sized> {
    gateway: &'a G,
    repair_model: String,
}

impl<'a, G: ModelGateway + ?Sized> ResponseExtractor<'a, G> {
    pub fn new(gateway: &'a G, repair_model: impl Into<String>) -> Self {
        Self {
            gateway,
            repair_model: repair_model.into(),
        }
    }

    /// Extract an [`AnalysisResult`] from `raw`, escalating unparseable text
    /// to the repair model at most [`MAX_REPAIR_ATTEMPTS`] times.
    pub async fn extract(&self, raw: &str) -> Result<AnalysisResult, ExtractError> {
        let mut text = raw.to_string();
        let mut attempts = 0;
        loop {
            let err = match parse_response::<AnalysisResult>(&text) {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };
            if attempts >= MAX_REPAIR_ATTEMPTS {
                warn!(attempts, "extraction attempts exhausted");
                return Err(ExtractError::AttemptsExhausted { attempts });
            }
            attempts += 1;
            debug!(%err, attempts, "escalating malformed response to repair model");
            let request = repair_request(&self.repair_model, &text);
            text = self
                .gateway
                .chat(&request)
                .await
                .map_err(ExtractError::Repair)?;
        }
    }
}
