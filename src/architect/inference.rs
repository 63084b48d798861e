use std::cell::{Cell, RefCell};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ForgeError, Result};

/// Image bytes sent inline with a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: "image/png".to_string(),
            bytes,
        }
    }

    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Prompt plus image in, text out.
pub trait VisionInference {
    fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String>;
}

/// Prompt in, text out.
pub trait TextInference {
    fn infer_text(&self, prompt: &str) -> Result<String>;
}

// ============================================================================
// Gemini Backend
// ============================================================================

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Sent as a header rather than a query parameter so it stays out of URLs.
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiBackend {
    pub base_url: String,
    pub model: String,
    api_key: String,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    Inline { inline_data: GeminiInlineData },
}

#[derive(Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModelInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl GeminiBackend {
    pub fn new(model: &str, api_key: &str) -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Read the API key from the first of `key_vars` that is set.
    pub fn from_env(model: &str, key_vars: &[&str]) -> Result<Self> {
        key_vars
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .map(|key| Self::new(model, key.trim()))
            .ok_or_else(|| ForgeError::MissingApiKey(key_vars.join(", ")))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn send(&self, parts: Vec<GeminiPart>) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GeminiRequest {
            contents: vec![GeminiContent { parts }],
        };

        debug!(model = %self.model, "sending generateContent request");
        let client = reqwest::blocking::Client::new();
        let body: Value = client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()?
            .json()?;
        extract_gemini_text(&body)
    }

    /// Names of models that support `generateContent`, without the
    /// `models/` prefix.
    pub fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let client = reqwest::blocking::Client::new();
        let body: Value = client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()?
            .json()?;

        if let Some(message) = body["error"]["message"].as_str() {
            return Err(ForgeError::Backend(message.to_string()));
        }

        let list: GeminiModelList =
            serde_json::from_value(body).map_err(|e| ForgeError::JsonParse {
                context: "Gemini model list".into(),
                source: e,
            })?;

        Ok(list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|g| g == "generateContent")
            })
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

/// Concatenate the text parts of the first candidate, or surface the
/// API's error message.
pub fn extract_gemini_text(body: &Value) -> Result<String> {
    if let Some(message) = body["error"]["message"].as_str() {
        return Err(ForgeError::Backend(message.to_string()));
    }

    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| ForgeError::Backend("Gemini response has no candidate content".into()))?;

    Ok(parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join(""))
}

impl VisionInference for GeminiBackend {
    fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String> {
        self.send(vec![
            GeminiPart::Text {
                text: prompt.to_string(),
            },
            GeminiPart::Inline {
                inline_data: GeminiInlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.base64(),
                },
            },
        ])
    }
}

impl TextInference for GeminiBackend {
    fn infer_text(&self, prompt: &str) -> Result<String> {
        self.send(vec![GeminiPart::Text {
            text: prompt.to_string(),
        }])
    }
}

// ============================================================================
// Ollama Backend
// ============================================================================

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_OLLAMA_MODEL: &str = "llava:7b";

pub struct OllamaBackend {
    pub endpoint: String,
    pub model: String,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OLLAMA_ENDPOINT.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaBackend {
    pub fn new(endpoint: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
        }
    }

    fn send(&self, request: OllamaRequest) -> Result<String> {
        debug!(model = %self.model, endpoint = %self.endpoint, "sending Ollama request");
        let client = reqwest::blocking::Client::new();
        let response: OllamaResponse = client
            .post(&self.endpoint)
            .json(&request)
            .send()?
            .json()?;

        match response.error {
            Some(error) => Err(ForgeError::Backend(error)),
            None => Ok(response.response),
        }
    }
}

impl VisionInference for OllamaBackend {
    fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String> {
        self.send(OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: Some("json"),
            images: vec![image.base64()],
        })
    }
}

impl TextInference for OllamaBackend {
    fn infer_text(&self, prompt: &str) -> Result<String> {
        self.send(OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: None,
            images: Vec::new(),
        })
    }
}

// ============================================================================
// Mock Backend (for testing without a model)
// ============================================================================

/// Returns a canned response and records how it was called.
pub struct MockInference {
    pub response: String,
    calls: Cell<usize>,
    last_prompt: RefCell<Option<String>>,
    last_image_len: Cell<Option<usize>>,
}

impl MockInference {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: Cell::new(0),
            last_prompt: RefCell::new(None),
            last_image_len: Cell::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.borrow().clone()
    }

    pub fn last_image_len(&self) -> Option<usize> {
        self.last_image_len.get()
    }

    fn record(&self, prompt: &str) {
        self.calls.set(self.calls.get() + 1);
        *self.last_prompt.borrow_mut() = Some(prompt.to_string());
    }
}

impl VisionInference for MockInference {
    fn generate(&self, prompt: &str, image: &InlineImage) -> Result<String> {
        self.record(prompt);
        self.last_image_len.set(Some(image.bytes.len()));
        Ok(self.response.clone())
    }
}

impl TextInference for MockInference {
    fn infer_text(&self, prompt: &str) -> Result<String> {
        self.record(prompt);
        Ok(self.response.clone())
    }
}
