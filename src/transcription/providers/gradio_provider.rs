//! Gradio Space provider
//!
//! Calls a hosted Hugging Face Space (default: wjbmattingly/caracal) through
//! the Gradio REST protocol: upload the image, start a call, then read the
//! event stream until the `complete` event carries the highlighted tokens.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::annotation::{EntityToken, Transcript};
use crate::perf_trace;
use crate::transcription::provider::{TranscriptionError, TranscriptionProvider, TranscriptionRequest};

/// Gradio call response
#[derive(Debug, Deserialize)]
struct GradioCallResponse {
    event_id: String,
}

/// Gradio provider configuration
#[derive(Debug, Clone)]
pub struct GradioConfig {
    pub base_url: String,
    pub api_name: String,
    pub hf_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GradioConfig {
    fn default() -> Self {
        Self {
            base_url: "https://wjbmattingly-caracal.hf.space".to_string(),
            api_name: "run_example".to_string(),
            hf_token: None,
            timeout_secs: 120,
        }
    }
}

/// Gradio Space transcription provider
pub struct GradioProvider {
    config: GradioConfig,
    client: Client,
}

impl GradioProvider {
    pub fn new(config: GradioConfig) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranscriptionError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.hf_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Upload the image and return the server-side file path
    async fn upload(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError> {
        let bytes = tokio::fs::read(&request.image_path).await?;
        let file_name = request
            .image_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("files", part);
        let url = format!("{}/gradio_api/upload", self.base_url());

        let response = self
            .authorized(self.client.post(&url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::Unavailable(format!("Cannot reach Space: {}", e)))?;

        if !response.status().is_success() {
            return Err(TranscriptionError::RequestFailed(format!(
                "Upload returned {}",
                response.status()
            )));
        }

        let paths: Vec<String> = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(format!("Upload response: {}", e)))?;

        paths
            .into_iter()
            .next()
            .ok_or_else(|| TranscriptionError::InvalidResponse("Upload returned no file path".to_string()))
    }

    /// Start the prediction and return its event id
    async fn start_call(&self, uploaded_path: &str, request: &TranscriptionRequest) -> Result<String, TranscriptionError> {
        let url = format!("{}/gradio_api/call/{}", self.base_url(), self.config.api_name);

        let response = self
            .authorized(self.client.post(&url))
            .json(&call_payload(uploaded_path, request))
            .send()
            .await
            .map_err(|e| TranscriptionError::Unavailable(format!("Cannot reach Space: {}", e)))?;

        if !response.status().is_success() {
            return Err(TranscriptionError::RequestFailed(format!(
                "Call returned {}",
                response.status()
            )));
        }

        let call: GradioCallResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(format!("Call response: {}", e)))?;

        Ok(call.event_id)
    }

    /// Read the event stream of a started call to completion
    async fn fetch_result(&self, event_id: &str) -> Result<Value, TranscriptionError> {
        let url = format!(
            "{}/gradio_api/call/{}/{}",
            self.base_url(),
            self.config.api_name,
            event_id
        );

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| TranscriptionError::Unavailable(format!("Cannot reach Space: {}", e)))?;

        if !response.status().is_success() {
            return Err(TranscriptionError::RequestFailed(format!(
                "Result stream returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(format!("Result stream: {}", e)))?;
        perf_trace!("Gradio event stream for {}: {} bytes", event_id, body.len());

        parse_event_stream(&body)
    }
}

#[async_trait]
impl TranscriptionProvider for GradioProvider {
    fn provider_name(&self) -> &'static str {
        "gradio"
    }

    async fn transcribe(&self, request: &TranscriptionRequest) -> Result<Transcript, TranscriptionError> {
        let uploaded_path = self.upload(request).await?;
        let event_id = self.start_call(&uploaded_path, request).await?;
        log::debug!("Gradio call started: event {}", event_id);

        let output = self.fetch_result(&event_id).await?;
        parse_highlighted_output(&output)
    }
}

/// Positional inputs of the Space endpoint: image, model, NER enabled, labels
fn call_payload(uploaded_path: &str, request: &TranscriptionRequest) -> Value {
    json!({
        "data": [
            { "path": uploaded_path, "meta": { "_type": "gradio.FileData" } },
            request.model,
            true,
            request.labels,
        ]
    })
}

/// Extract the `complete` event's data from a Gradio event stream body
fn parse_event_stream(body: &str) -> Result<Value, TranscriptionError> {
    let mut event = "";

    for line in body.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
        } else if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            match event {
                "complete" => {
                    return serde_json::from_str(data).map_err(|e| {
                        TranscriptionError::InvalidResponse(format!("Result data: {}", e))
                    });
                }
                "error" => {
                    let message = if data.is_empty() || data == "null" {
                        "Space reported an error".to_string()
                    } else {
                        data.to_string()
                    };
                    return Err(TranscriptionError::RequestFailed(message));
                }
                _ => {}
            }
        }
    }

    Err(TranscriptionError::InvalidResponse(
        "Event stream ended without a result".to_string(),
    ))
}

/// Turn Gradio highlighted-text output into a transcript.
///
/// Accepts the token list itself or a list of outputs containing it; entries
/// are `{token, class_or_confidence}` objects or `[token, class]` pairs.
fn parse_highlighted_output(output: &Value) -> Result<Transcript, TranscriptionError> {
    if let Some(transcript) = parse_entries(output) {
        return Ok(transcript);
    }

    if let Some(outputs) = output.as_array() {
        if let Some(transcript) = outputs.iter().find_map(parse_entries) {
            return Ok(transcript);
        }
    }

    Err(TranscriptionError::InvalidResponse(
        "Output is not a highlighted token list".to_string(),
    ))
}

fn parse_entries(value: &Value) -> Option<Transcript> {
    let entries = value.as_array()?;
    let mut transcript = Vec::with_capacity(entries.len());
    for entry in entries {
        let token = parse_entry(entry)?;
        if !token.text.is_empty() {
            transcript.push(token);
        }
    }
    Some(transcript)
}

fn parse_entry(entry: &Value) -> Option<EntityToken> {
    let (text, class) = match entry {
        Value::Object(map) => (map.get("token")?, map.get("class_or_confidence")),
        Value::Array(pair) if pair.len() == 2 => (&pair[0], pair.get(1)),
        _ => return None,
    };

    Some(EntityToken {
        text: text.as_str()?.to_string(),
        entity_class: class.and_then(class_label),
    })
}

fn class_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
