//! Ollama Generation Source
//!
//! Generation source backed by a local Ollama server.
//!
//! # Ollama API
//!
//! - `/api/generate` - Generate completions (streaming NDJSON)
//! - `/api/tags` - List available models
//!
//! Ollama streams true deltas. This source accumulates them and forwards the
//! response-so-far as each snapshot, the same shape on-device model hosts
//! emit, so the assistant exercises one reconciliation path everywhere.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::traits::{
    estimate_tokens, Availability, GenerationChunk, GenerationRequest, GenerationSource,
    SourceCapabilities,
};

/// Default Ollama host
pub const DEFAULT_HOST: &str = "localhost";
/// Default Ollama port
pub const DEFAULT_PORT: u16 = 11434;

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Ollama generation source
#[derive(Clone)]
pub struct OllamaSource {
    /// Host address
    host: String,
    /// Port number
    port: u16,
    /// Model to generate with
    model: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaSource {
    /// Create a new Ollama source
    pub fn new(host: impl Into<String>, port: u16, model: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            model: model.into(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Create from environment variables (`OLLAMA_HOST`, `OLLAMA_PORT`)
    #[must_use]
    pub fn from_env(model: impl Into<String>) -> Self {
        let host = std::env::var("OLLAMA_HOST")
            .or_else(|_| std::env::var("STUDYSPACE_OLLAMA_HOST"))
            .unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port: u16 = std::env::var("OLLAMA_PORT")
            .or_else(|_| std::env::var("STUDYSPACE_OLLAMA_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self::new(host, port, model)
    }

    /// Model this source generates with
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url())
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }

    /// Whether an installed tag names our model (`llama3.2` matches `llama3.2:latest`)
    fn matches_model(&self, tag: &str) -> bool {
        tag == self.model
            || tag
                .strip_prefix(self.model.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
    }

    fn request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": true,
        });

        if let Some(ref system) = request.system {
            body["system"] = serde_json::json!(system);
        }

        let mut options = serde_json::Map::new();
        if let Some(temperature) = request.temperature {
            options.insert("temperature".to_string(), serde_json::json!(temperature));
        }
        if let Some(top_k) = request.top_k {
            options.insert("top_k".to_string(), serde_json::json!(top_k));
        }
        if request.max_tokens > 0 {
            options.insert("num_predict".to_string(), serde_json::json!(request.max_tokens));
        }
        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }

        body
    }
}

/// Byte buffer that yields complete lines
///
/// Network chunks may end inside a multibyte character, so bytes are only
/// decoded once their line is complete.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Next complete line without its newline, if one is buffered
    fn next_line(&mut self) -> Option<Result<String, std::str::Utf8Error>> {
        let pos = self.bytes.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=pos).collect();
        Some(std::str::from_utf8(&line[..pos]).map(str::to_owned))
    }
}

impl Default for OllamaSource {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, "llama3.2")
    }
}

#[async_trait]
impl GenerationSource for OllamaSource {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    async fn capabilities(&self) -> anyhow::Result<SourceCapabilities> {
        let response = self
            .http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama returned {}", response.status());
        }

        let tags: TagsResponse = response.json().await?;
        let available = if tags.models.iter().any(|m| self.matches_model(&m.name)) {
            Availability::Readily
        } else {
            // `ollama pull` would make it usable
            Availability::AfterDownload
        };

        Ok(SourceCapabilities {
            available,
            default_temperature: Some(0.8),
            default_top_k: Some(40),
        })
    }

    async fn count_prompt_tokens(&self, prompt: &str) -> anyhow::Result<usize> {
        Ok(estimate_tokens(prompt))
    }

    async fn prompt_streaming(
        &self,
        request: &GenerationRequest,
    ) -> anyhow::Result<mpsc::Receiver<GenerationChunk>> {
        let (tx, rx) = mpsc::channel(100);

        let response = self
            .http_client
            .post(self.generate_url())
            .json(&self.request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut lines = LineBuffer::default();
            let mut snapshot = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(GenerationChunk::Error(e.to_string())).await;
                        return;
                    }
                };
                lines.extend(&bytes);

                // Newline-delimited JSON
                while let Some(line) = lines.next_line() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!(error = %e, "Skipping non-UTF-8 Ollama line");
                            continue;
                        }
                    };
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    let parsed = match serde_json::from_str::<GenerateLine>(line) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            warn!(error = %e, "Skipping unparseable Ollama line");
                            continue;
                        }
                    };

                    if let Some(error) = parsed.error {
                        let _ = tx.send(GenerationChunk::Error(error)).await;
                        return;
                    }

                    if !parsed.response.is_empty() {
                        snapshot.push_str(&parsed.response);
                        if tx
                            .send(GenerationChunk::Snapshot(snapshot.clone()))
                            .await
                            .is_err()
                        {
                            debug!("Snapshot receiver dropped, stopping stream");
                            return;
                        }
                    }

                    if parsed.done {
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let source = OllamaSource::new("example", 1234, "phi3");
        assert_eq!(source.generate_url(), "http://example:1234/api/generate");
        assert_eq!(source.tags_url(), "http://example:1234/api/tags");
    }

    #[test]
    fn test_model_matching() {
        let source = OllamaSource::new("localhost", 11434, "llama3.2");
        assert!(source.matches_model("llama3.2"));
        assert!(source.matches_model("llama3.2:latest"));
        assert!(!source.matches_model("llama3.2-vision"));
        assert!(!source.matches_model("phi3:latest"));
    }

    #[test]
    fn test_request_body_options() {
        let source = OllamaSource::default();
        let request = GenerationRequest::new("hi")
            .with_system("sys")
            .with_temperature(0.5)
            .with_max_tokens(64);
        let body = source.request_body(&request);

        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["system"], "sys");
        assert_eq!(body["options"]["temperature"], 0.5);
        assert_eq!(body["options"]["num_predict"], 64);
        assert!(body["options"].get("top_k").is_none());
    }

    #[test]
    fn test_request_body_without_options() {
        let source = OllamaSource::default();
        let body = source.request_body(&GenerationRequest::new("hi"));
        assert!(body.get("options").is_none());
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_line_buffer_joins_split_multibyte_char() {
        let line = "{\"response\":\"café\",\"done\":true}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut lines = LineBuffer::default();
        lines.extend(&line[..split]);
        assert!(lines.next_line().is_none());

        lines.extend(&line[split..]);
        assert_eq!(
            lines.next_line().unwrap().unwrap(),
            "{\"response\":\"café\",\"done\":true}"
        );
        assert!(lines.next_line().is_none());
    }

    #[test]
    fn test_line_buffer_reports_invalid_line_and_continues() {
        let mut lines = LineBuffer::default();
        lines.extend(b"\xFF\xFE\nok\n");
        assert!(lines.next_line().unwrap().is_err());
        assert_eq!(lines.next_line().unwrap().unwrap(), "ok");
    }

    /// Serve one `/api/generate` request, writing `body` as separate HTTP
    /// chunks split at `split`
    async fn serve_split_body(body: &'static [u8], split: usize) -> u16 {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Read the request head and its body before answering
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\n\
                      Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                )
                .await
                .unwrap();
            for part in [&body[..split], &body[split..]] {
                socket
                    .write_all(format!("{:x}\r\n", part.len()).as_bytes())
                    .await
                    .unwrap();
                socket.write_all(part).await.unwrap();
                socket.write_all(b"\r\n").await.unwrap();
                socket.flush().await.unwrap();
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            socket.write_all(b"0\r\n\r\n").await.unwrap();
            socket.flush().await.unwrap();
        });

        port
    }

    #[tokio::test]
    async fn test_streaming_keeps_char_split_across_chunks() {
        let body: &'static [u8] = "{\"response\":\"caf\",\"done\":false}\n\
                                   {\"response\":\"é au lait\",\"done\":true}\n"
            .as_bytes();
        let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let port = serve_split_body(body, split).await;

        let source = OllamaSource {
            http_client: reqwest::Client::builder().no_proxy().build().unwrap(),
            ..OllamaSource::new("127.0.0.1", port, "llama3.2")
        };
        let mut rx = source
            .prompt_streaming(&GenerationRequest::new("hi"))
            .await
            .unwrap();

        let mut snapshots = Vec::new();
        while let Some(chunk) = rx.recv().await {
            match chunk {
                GenerationChunk::Snapshot(text) => snapshots.push(text),
                GenerationChunk::Error(e) => panic!("unexpected stream error: {e}"),
            }
        }
        assert_eq!(snapshots, vec!["caf", "café au lait"]);
    }

    #[tokio::test]
    async fn test_token_estimate() {
        let source = OllamaSource::default();
        assert_eq!(source.count_prompt_tokens("12345678").await.unwrap(), 2);
    }
}
