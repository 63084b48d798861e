use serde::Deserialize;

use crate::architect::artifacts::GeneratedArtifactPair;
use crate::error::{ForgeError, Result};

const FENCE: &str = "```";

/// Wire shape the prompt asks for. Both fields optional here so a missing
/// one can be reported by name instead of as a generic serde error.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactResponse {
    #[serde(default)]
    page_object_code: Option<String>,
    #[serde(default)]
    test_spec_code: Option<String>,
}

/// The JSON payload of a model reply.
///
/// A reply that is already a bare object is used as-is. Otherwise the body
/// of the first Markdown code fence is taken, with any info string
/// (`json`, `JSON`, ...) on the opening line dropped.
pub fn extract_payload(response: &str) -> &str {
    let trimmed = response.trim();
    if trimmed.starts_with('{') {
        return trimmed;
    }

    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };
    let after_open = &trimmed[open + FENCE.len()..];

    // Skip the info string up to the end of the opening line
    let body = match after_open.find('\n') {
        Some(nl) if !after_open[..nl].contains('{') => &after_open[nl + 1..],
        _ => after_open.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    match body.rfind(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn required(field: Option<String>, name: &str) -> Result<String> {
    match field {
        Some(code) if !code.trim().is_empty() => Ok(code),
        Some(_) => Err(ForgeError::MalformedResponse(format!(
            "field '{}' is empty",
            name
        ))),
        None => Err(ForgeError::MalformedResponse(format!(
            "field '{}' is missing",
            name
        ))),
    }
}

/// Decode a model reply into an artifact pair.
///
/// Fails with `MalformedResponse` when the payload is not a JSON object or
/// when either field is missing or blank; no partial pair is produced.
pub fn decode_artifacts(response: &str) -> Result<GeneratedArtifactPair> {
    let payload = extract_payload(response);
    if payload.is_empty() {
        return Err(ForgeError::MalformedResponse("empty response".into()));
    }

    let parsed: ArtifactResponse = serde_json::from_str(payload)
        .map_err(|e| ForgeError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    Ok(GeneratedArtifactPair {
        page_object_source: required(parsed.page_object_code, "pageObjectCode")?,
        test_spec_source: required(parsed.test_spec_code, "testSpecCode")?,
    })
}
