//! Request builders and response parsers per wire format.
//!
//! Builders are infallible `serde_json::Value` constructors. Parsers take the
//! decoded body and return either the normalized value or a detail string
//! describing which expected field was missing.

use serde::Deserialize;
use serde_json::{json, Value};

use super::kind::{ChatWire, EmbedWire};
use super::{ChatMessage, ChatRole, CompletionRequest};

// ────────────────────────────────────────────────────────────────────────────
// Chat
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn chat_path(wire: ChatWire, model: &str) -> String {
    match wire {
        ChatWire::OllamaGenerate => "/api/generate".to_string(),
        ChatWire::OpenAiChat => "/chat/completions".to_string(),
        ChatWire::GeminiGenerate => format!("/models/{model}:generateContent"),
    }
}

pub(crate) fn chat_body(wire: ChatWire, model: &str, request: &CompletionRequest) -> Value {
    let params = request.params();
    match wire {
        ChatWire::OllamaGenerate => json!({
            "model": model,
            "prompt": flatten_prompt(request.messages()),
            "stream": false,
            "options": {
                "temperature": params.temperature,
                "top_p": params.top_p,
                "num_predict": params.max_tokens,
            },
        }),
        ChatWire::OpenAiChat => json!({
            "model": model,
            "messages": request.messages(),
            "temperature": params.temperature,
            "top_p": params.top_p,
            "max_tokens": params.max_tokens,
        }),
        ChatWire::GeminiGenerate => json!({
            "contents": gemini_contents(request.messages()),
            "generationConfig": {
                "temperature": params.temperature,
                "topP": params.top_p,
                "maxOutputTokens": params.max_tokens,
            },
        }),
    }
}

/// Returns the assistant text of a chat response. A blank reply is an error.
pub(crate) fn parse_chat(wire: ChatWire, body: Value) -> Result<String, String> {
    let text = match wire {
        ChatWire::OllamaGenerate => {
            let parsed: OllamaGenerateResponse =
                serde_json::from_value(body).map_err(|e| e.to_string())?;
            parsed.response
        }
        ChatWire::OpenAiChat => {
            let parsed: OpenAiChatResponse = serde_json::from_value(body)
                .map_err(|_| "missing choices".to_string())?;
            let choice = parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| "missing choices".to_string())?;
            let message = choice.message.ok_or_else(|| "missing message".to_string())?;
            message
                .content
                .ok_or_else(|| "missing message content".to_string())?
        }
        ChatWire::GeminiGenerate => {
            let parsed: GeminiGenerateResponse = serde_json::from_value(body)
                .map_err(|_| "missing candidates".to_string())?;
            let candidate = parsed
                .candidates
                .into_iter()
                .next()
                .ok_or_else(|| "missing candidates".to_string())?;
            let content = candidate
                .content
                .ok_or_else(|| "missing candidate content".to_string())?;
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        }
    };

    if text.trim().is_empty() {
        return Err("empty content".to_string());
    }
    Ok(text)
}

/// Flattens a conversation into `"<role>: <content>"` lines for `/api/generate`.
fn flatten_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Gemini only knows `user` and `model` turns; system text is sent as a user turn.
fn gemini_contents(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::Assistant => "model",
                ChatRole::System | ChatRole::User => "user",
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiGenerateResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Embeddings
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn embed_path(wire: EmbedWire, model: &str) -> String {
    match wire {
        EmbedWire::OllamaEmbed => "/api/embed".to_string(),
        EmbedWire::OpenAiEmbeddings => "/embeddings".to_string(),
        EmbedWire::GeminiBatchEmbed => format!("/models/{model}:batchEmbedContents"),
    }
}

pub(crate) fn embed_body(wire: EmbedWire, model: &str, texts: &[String]) -> Value {
    match wire {
        EmbedWire::OllamaEmbed => json!({ "model": model, "input": texts }),
        EmbedWire::OpenAiEmbeddings => json!({ "model": model, "input": texts }),
        EmbedWire::GeminiBatchEmbed => json!({
            "requests": texts
                .iter()
                .map(|text| json!({
                    "model": format!("models/{model}"),
                    "content": { "parts": [{ "text": text }] },
                    "taskType": "RETRIEVAL_DOCUMENT",
                }))
                .collect::<Vec<_>>(),
        }),
    }
}

/// Returns one vector per input, in input order.
pub(crate) fn parse_embeddings(
    wire: EmbedWire,
    body: Value,
    expected: usize,
) -> Result<Vec<Vec<f32>>, String> {
    let vectors = match wire {
        EmbedWire::OllamaEmbed => {
            let parsed: OllamaEmbedResponse = serde_json::from_value(body)
                .map_err(|_| "missing embeddings".to_string())?;
            parsed.embeddings
        }
        EmbedWire::OpenAiEmbeddings => {
            let parsed: OpenAiEmbeddingResponse =
                serde_json::from_value(body).map_err(|_| "missing data".to_string())?;
            let mut data = parsed.data;
            // `index` is optional on some compatible servers; keep response order then.
            data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
            data.into_iter().map(|d| d.embedding).collect()
        }
        EmbedWire::GeminiBatchEmbed => {
            let parsed: GeminiBatchEmbedResponse = serde_json::from_value(body)
                .map_err(|_| "missing embeddings".to_string())?;
            parsed.embeddings.into_iter().map(|e| e.values).collect()
        }
    };

    if vectors.len() != expected {
        return Err(format!(
            "expected {expected} embeddings, got {}",
            vectors.len()
        ));
    }
    Ok(vectors)
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    index: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GeminiBatchEmbedResponse {
    embeddings: Vec<GeminiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}
