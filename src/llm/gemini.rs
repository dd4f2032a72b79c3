use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::assets::{normalize_image_mime_type, GeneratedImage};
use crate::config::{ApiKey, Config};
use crate::error::{StudioError, TransportError};
use crate::prompt::{ImagePart, TechnicalHints};
use crate::selection::GenerationResult;
use crate::utils::http::build_http_client;
use crate::utils::timing::log_llm_timing;

pub const DEFAULT_CAPTION: &str = "Your image has been created successfully!";

pub const FALLBACK_WORLD_SUGGESTIONS: &[&str] = &[
    "Tháp Eiffel, Pháp",
    "Núi Phú Sĩ, Nhật Bản",
    "Tượng Nữ thần Tự do, Mỹ",
    "Đấu trường La Mã, Ý",
];

const IMAGE_EDIT_OPERATION: &str = "generate_travel_portrait";
const SUGGESTION_OPERATION: &str = "world_suggestions";

pub fn fallback_world_suggestions() -> Vec<String> {
    FALLBACK_WORLD_SUGGESTIONS
        .iter()
        .map(|place| place.to_string())
        .collect()
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiResponse {
    fn parts(&self) -> impl Iterator<Item = &GeminiPart> {
        self.candidates
            .iter()
            .flatten()
            .filter_map(|candidate| candidate.content.as_ref())
            .filter_map(|content| content.parts.as_ref())
            .flatten()
    }
}

/// Sends one `generateContent` request. Implementations never retry.
#[async_trait]
pub trait GeminiTransport: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        api_key: &ApiKey,
        payload: Value,
    ) -> Result<Value, TransportError>;
}

/// The production transport over HTTPS.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(HttpTransport {
            client: build_http_client(config)?,
            base_url: config.gemini_base_url.clone(),
        })
    }
}

#[async_trait]
impl GeminiTransport for HttpTransport {
    async fn generate_content(
        &self,
        model: &str,
        api_key: &ApiKey,
        payload: Value,
    ) -> Result<Value, TransportError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let response = match self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose())
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err_text = api_key.redact(&err.to_string());
                warn!(
                    "Gemini request failed to send: {} (timeout={}, connect={}, status={:?})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect(),
                    err.status()
                );
                return Err(TransportError::new(
                    err.status().map(|status| status.as_u16()),
                    format!("Gemini request failed: {err_text}"),
                ));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = api_key.redact(&body);
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Gemini API error: status={}, body={}", status, body_summary);
            return Err(TransportError::new(
                Some(status.as_u16()),
                message.unwrap_or(body_summary),
            ));
        }

        response.json::<Value>().await.map_err(|err| {
            TransportError::new(
                Some(status.as_u16()),
                format!(
                    "Gemini response could not be read: {}",
                    api_key.redact(&err.to_string())
                ),
            )
        })
    }
}

fn build_safety_settings(profile: &str) -> Vec<Value> {
    let threshold = match profile {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        "permissive" => "OFF",
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using permissive defaults.",
                profile
            );
            "OFF"
        }
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_CIVIC_INTEGRITY", "threshold": threshold }),
    ]
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_gemini_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let summarized_contents: Vec<Value> = contents
            .iter()
            .map(|content| {
                let role = content
                    .get("role")
                    .and_then(|value| value.as_str())
                    .unwrap_or("user");
                let parts = content
                    .get("parts")
                    .and_then(|value| value.as_array())
                    .map(|parts| summarize_gemini_parts(parts))
                    .unwrap_or_default();
                json!({ "role": role, "parts": parts })
            })
            .collect();
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    if let Some(safety) = payload
        .get("safetySettings")
        .and_then(|value| value.as_array())
    {
        summary.insert("safetySettingsCount".to_string(), json!(safety.len()));
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut other_parts = 0usize;
    let mut text_preview = None;

    for part in response.parts() {
        match part {
            GeminiPart::Text { text } => {
                text_parts += 1;
                if text_preview.is_none() && !text.trim().is_empty() {
                    text_preview = Some(truncate_for_log(text, 200));
                }
            }
            GeminiPart::InlineData { inline_data } => {
                if inline_data.mime_type.starts_with("image/") {
                    image_parts += 1;
                }
            }
            GeminiPart::Other(_) => other_parts += 1,
        }
    }

    json!({
        "candidates": response.candidates.as_ref().map(|candidates| candidates.len()).unwrap_or(0),
        "textParts": text_parts,
        "imageParts": image_parts,
        "otherParts": other_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        let invalid_key = value.to_string().contains("API_KEY_INVALID");
        let message = match message {
            Some(message) if invalid_key && !message.contains("API_KEY_INVALID") => {
                Some(format!("{message} (API_KEY_INVALID)"))
            }
            other => other,
        };
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

/// Maps a provider failure onto the user-facing taxonomy.
pub fn classify_transport_error(err: &TransportError) -> StudioError {
    let message = err.message.as_str();
    if message.contains("API_KEY_INVALID") || message.contains("API key not valid") {
        return StudioError::InvalidCredential;
    }
    StudioError::transport(message)
}

fn build_image_payload(
    instruction: &str,
    image_parts: &[ImagePart],
    hints: TechnicalHints,
    safety_profile: &str,
) -> Value {
    let mut parts = vec![json!({ "text": instruction })];
    parts.extend(image_parts.iter().map(|part| {
        json!({
            "inlineData": {
                "mimeType": part.mime_type,
                "data": part.data
            }
        })
    }));

    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
            "imageConfig": { "aspectRatio": hints.aspect_bucket.value() }
        },
        "safetySettings": build_safety_settings(safety_profile),
    })
}

fn build_suggestion_payload(count: usize, safety_profile: &str) -> Value {
    let instruction = format!(
        "List {count} famous tourist destinations around the world that make great backdrops for travel photos. \
Write each one in Vietnamese as \"Place, Country\". Return only a JSON array of strings."
    );
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": instruction }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "safetySettings": build_safety_settings(safety_profile),
    })
}

/// First decodable image becomes the result, first non-blank text the caption.
fn extract_generation_result(response: &GeminiResponse) -> Result<GenerationResult, StudioError> {
    let mut image = None;
    let mut caption = None;

    for part in response.parts() {
        match part {
            GeminiPart::Text { text } if caption.is_none() && !text.trim().is_empty() => {
                caption = Some(text.trim().to_string());
            }
            GeminiPart::InlineData { inline_data }
                if image.is_none() && inline_data.mime_type.starts_with("image/") =>
            {
                match general_purpose::STANDARD.decode(inline_data.data.as_bytes()) {
                    Ok(bytes) => {
                        image = Some(GeneratedImage {
                            mime_type: normalize_image_mime_type(&inline_data.mime_type),
                            bytes,
                        });
                    }
                    Err(err) => warn!("Skipping undecodable image part from Gemini: {}", err),
                }
            }
            _ => {}
        }
    }

    let image = image.ok_or(StudioError::NoImageInResponse)?;
    Ok(GenerationResult {
        image,
        caption: caption.unwrap_or_else(|| DEFAULT_CAPTION.to_string()),
    })
}

fn extract_text_from_response(response: &GeminiResponse) -> String {
    response
        .parts()
        .filter_map(|part| match part {
            GeminiPart::Text { text } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_json_array_from_text(raw: &str) -> Option<Vec<String>> {
    let trimmed = raw.trim();
    if let Ok(arr) = serde_json::from_str::<Vec<String>>(trimmed) {
        return Some(arr);
    }

    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if end <= start {
        return None;
    }
    let candidate = &trimmed[start..=end];
    serde_json::from_str::<Vec<String>>(candidate).ok()
}

/// Generation client bound to one resolved credential.
pub struct GeminiClient {
    image_model: String,
    suggestion_model: String,
    safety_profile: String,
    suggestion_count: usize,
    api_key: ApiKey,
    transport: Arc<dyn GeminiTransport>,
}

impl GeminiClient {
    pub fn new(config: &Config, api_key: ApiKey, transport: Arc<dyn GeminiTransport>) -> Self {
        GeminiClient {
            image_model: config.gemini_image_model.clone(),
            suggestion_model: config.gemini_suggestion_model.clone(),
            safety_profile: config.gemini_safety_settings.clone(),
            suggestion_count: config.world_suggestion_count,
            api_key,
            transport,
        }
    }

    async fn call_gemini_api(&self, model: &str, payload: Value) -> Result<GeminiResponse, StudioError> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload_summary = summarize_gemini_payload(&payload);
            debug!(target: "llm.gemini", model = model, payload = %payload_summary);
        }

        let value = self
            .transport
            .generate_content(model, &self.api_key, payload)
            .await
            .map_err(|err| classify_transport_error(&err))?;

        let response = serde_json::from_value::<GeminiResponse>(value).map_err(|err| {
            StudioError::transport(format!("Unexpected response from Gemini: {err}"))
        })?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let response_summary = summarize_gemini_response(&response);
            debug!(target: "llm.gemini", model = model, response = %response_summary);
        }
        Ok(response)
    }

    /// Single attempt. The aspect bucket is advisory.
    pub async fn submit(
        &self,
        instruction: &str,
        image_parts: &[ImagePart],
        hints: TechnicalHints,
    ) -> Result<GenerationResult, StudioError> {
        let payload = build_image_payload(instruction, image_parts, hints, &self.safety_profile);
        let model = self.image_model.as_str();
        let metadata = json!({
            "imageParts": image_parts.len(),
            "aspectRatio": hints.aspect_bucket.value(),
        });

        log_llm_timing("gemini", model, IMAGE_EDIT_OPERATION, Some(metadata), || async {
            let response = self.call_gemini_api(model, payload).await?;
            extract_generation_result(&response)
        })
        .await
    }

    /// Best effort: any failure yields the fixed fallback list.
    pub async fn fetch_world_suggestions(&self) -> Vec<String> {
        match self.try_fetch_world_suggestions().await {
            Ok(suggestions) => suggestions,
            Err(err) => {
                warn!(kind = err.kind(), "{}", err);
                fallback_world_suggestions()
            }
        }
    }

    async fn try_fetch_world_suggestions(&self) -> Result<Vec<String>, StudioError> {
        let payload = build_suggestion_payload(self.suggestion_count, &self.safety_profile);
        let model = self.suggestion_model.as_str();

        let response = log_llm_timing("gemini", model, SUGGESTION_OPERATION, None, || {
            self.call_gemini_api(model, payload)
        })
        .await
        .map_err(|err| StudioError::SuggestionFetchFailure(err.to_string()))?;

        let text = extract_text_from_response(&response);
        let suggestions: Vec<String> = parse_json_array_from_text(&text)
            .ok_or_else(|| {
                StudioError::SuggestionFetchFailure(format!(
                    "response is not a JSON array of strings: {}",
                    truncate_for_log(&text, 200)
                ))
            })?
            .into_iter()
            .map(|place| place.trim().to_string())
            .filter(|place| !place.is_empty())
            .take(self.suggestion_count)
            .collect();

        if suggestions.is_empty() {
            return Err(StudioError::SuggestionFetchFailure(
                "provider returned no destinations".to_string(),
            ));
        }
        Ok(suggestions)
    }
}
