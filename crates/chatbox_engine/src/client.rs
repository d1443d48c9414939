use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;

use chatbox_logging::{chat_debug, chat_info, chat_trace};

use crate::sse::{SseDecoder, SseEvent};
use crate::wire::{messages_from_values, run_request_body, WireThread, WireThreadState};
use crate::{ApiError, ChatMessage, ClientConfig, FailureKind, OutgoingMessage, ThreadInfo};

const API_KEY_HEADER: &str = "x-api-key";

/// Receives each full message list a streaming run produces.
pub trait StreamSink: Send + Sync {
    fn emit(&self, messages: Vec<ChatMessage>);
}

/// Remote agent runtime: thread creation, history, and streamed runs.
#[async_trait::async_trait]
pub trait AgentApi: Send + Sync {
    async fn create_thread(&self) -> Result<ThreadInfo, ApiError>;

    /// Current message history of a thread. Unknown threads have none.
    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<ChatMessage>, ApiError>;

    /// Starts a run on `thread_id` and forwards every state snapshot to `sink`
    /// until the runtime ends the stream.
    async fn stream_run(
        &self,
        thread_id: &str,
        messages: &[OutgoingMessage],
        sink: &dyn StreamSink,
    ) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestAgentClient {
    config: ClientConfig,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl ReqwestAgentClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let headers = default_headers(&config)?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .default_headers(headers.clone())
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            config,
            client,
            stream_client,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl AgentApi for ReqwestAgentClient {
    async fn create_thread(&self) -> Result<ThreadInfo, ApiError> {
        let url = self.config.endpoint("threads");
        chat_debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response)?;
        let thread: WireThread = response.json().await.map_err(map_decode_error)?;
        let thread = ThreadInfo::from(thread);
        chat_info!(
            "Created thread {} (created_at={:?})",
            thread.thread_id,
            thread.created_at
        );
        Ok(thread)
    }

    async fn thread_messages(&self, thread_id: &str) -> Result<Vec<ChatMessage>, ApiError> {
        let url = self.config.endpoint(&format!("threads/{thread_id}/state"));
        chat_debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = ensure_success(response)?;
        let state: WireThreadState = response.json().await.map_err(map_decode_error)?;
        Ok(state.messages(&self.config.messages_key))
    }

    async fn stream_run(
        &self,
        thread_id: &str,
        messages: &[OutgoingMessage],
        sink: &dyn StreamSink,
    ) -> Result<(), ApiError> {
        let url = self
            .config
            .endpoint(&format!("threads/{thread_id}/runs/stream"));
        let body = run_request_body(
            &self.config.assistant_id,
            &self.config.messages_key,
            messages,
        );
        chat_debug!("POST {} messages={}", url, messages.len());

        let response = self
            .stream_client
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response)?;

        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            for event in decoder.feed(&chunk) {
                if self.handle_event(event, sink)? == StreamFlow::End {
                    return Ok(());
                }
            }
        }
        if let Some(event) = decoder.finish() {
            self.handle_event(event, sink)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamFlow {
    Continue,
    End,
}

impl ReqwestAgentClient {
    fn handle_event(&self, event: SseEvent, sink: &dyn StreamSink) -> Result<StreamFlow, ApiError> {
        chat_trace!("stream event {} ({} bytes)", event.event, event.data.len());
        match event.event.as_str() {
            "values" => {
                let values: Value = serde_json::from_str(&event.data)
                    .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
                sink.emit(messages_from_values(&values, &self.config.messages_key));
                Ok(StreamFlow::Continue)
            }
            "error" => Err(ApiError::new(FailureKind::Stream, error_message(&event.data))),
            "end" => Ok(StreamFlow::End),
            _ => Ok(StreamFlow::Continue),
        }
    }
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    if let Some(key) = config.api_key.as_deref() {
        let value = HeaderValue::from_str(key)
            .map_err(|err| ApiError::new(FailureKind::InvalidApiKey, err.to_string()))?;
        headers.insert(API_KEY_HEADER, value);
    }
    Ok(headers)
}

fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

fn error_message(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(map)) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| data.to_string()),
        _ => data.to_string(),
    }
}

fn map_decode_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    map_reqwest_error(err)
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
