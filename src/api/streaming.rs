//! Streaming Chat Completions
//!
//! Decodes the Server-Sent Events body of a `stream: true` chat completion
//! into [`ChatCompletionChunk`] values. A background task owns the response
//! body and hands chunks to the caller through [`ChatCompletionStream`].

use crate::client::transport::HttpResponse;
use crate::error::{MinoaiError, Result};
use bytes::BytesMut;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Prefix of every SSE data line
const DATA_PREFIX: &str = "data: ";

/// Literal line terminating the stream
const DONE_SENTINEL: &str = "data: [DONE]";

/// Finish reason signalling the model is done generating
const FINISH_REASON_STOP: &str = "stop";

/// A streaming chunk from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Chunk ID
    pub id: String,

    /// Object type
    #[serde(default)]
    pub object: String,

    /// Creation timestamp
    pub created: u64,

    /// Model name
    pub model: String,

    /// Backend configuration fingerprint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,

    /// Choices with deltas
    pub choices: Vec<ChunkedChoice>,
}

/// A choice in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkedChoice {
    /// Choice index
    pub index: u32,

    /// The delta (partial message)
    pub delta: Delta,

    /// Finish reason (set in the final chunk for this choice)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Delta content in a streaming chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    /// Role (usually only in the first chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Content fragment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Whether the first choice finished with the stop reason.
    ///
    /// An empty choice list carries no stop signal.
    fn is_stop(&self) -> bool {
        self.choices
            .first()
            .is_some_and(|c| c.finish_reason.as_deref() == Some(FINISH_REASON_STOP))
    }
}

/// One decoded line of the SSE body
#[derive(Debug)]
pub enum SseLine {
    /// Blank keep-alive line, no event
    Blank,
    /// The `data: [DONE]` terminator
    Done,
    /// A data line carrying one chunk
    Chunk(ChatCompletionChunk),
}

/// Parse one line of the SSE body.
///
/// Any non-blank, non-sentinel line has the `data: ` prefix stripped and the
/// remainder parsed as a chunk. A malformed line is an error, not a skip.
pub fn parse_sse_line(line: &str) -> Result<SseLine> {
    if line.is_empty() {
        return Ok(SseLine::Blank);
    }

    if line == DONE_SENTINEL {
        return Ok(SseLine::Done);
    }

    let data = line.strip_prefix(DATA_PREFIX).unwrap_or(line);
    let chunk: ChatCompletionChunk = serde_json::from_str(data).map_err(|e| {
        MinoaiError::Decode(format!("failed to parse SSE chunk: {}. Data: {}", e, data))
    })?;

    Ok(SseLine::Chunk(chunk))
}

/// A live stream of completion chunks.
///
/// Each item is either one chunk or the single error that terminated the
/// stream. The stream closes after the `[DONE]` sentinel, after a chunk whose
/// first choice finished with `"stop"`, on transport EOF, or after one error;
/// no item follows an error. Dropping the stream cancels the decoder task,
/// which releases the underlying connection.
pub struct ChatCompletionStream {
    rx: mpsc::Receiver<Result<ChatCompletionChunk>>,
}

impl ChatCompletionStream {
    /// Receive the next chunk, or `None` once the stream has closed.
    pub async fn next(&mut self) -> Option<Result<ChatCompletionChunk>> {
        self.rx.recv().await
    }
}

impl Stream for ChatCompletionStream {
    type Item = Result<ChatCompletionChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Spawn the decoder task for an open streaming response.
///
/// The task owns the response body and drops it when it returns, so the
/// connection is released exactly once on every exit path.
pub(crate) fn spawn_decoder(response: HttpResponse) -> ChatCompletionStream {
    // Capacity 1: each chunk is handed over before the next line is decoded,
    // so the decoder never reads ahead of the consumer.
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(decode_sse_body(response, tx));
    ChatCompletionStream { rx }
}

async fn decode_sse_body(response: HttpResponse, tx: mpsc::Sender<Result<ChatCompletionChunk>>) {
    use futures::StreamExt;

    let mut body = response.body;
    let mut buf = BytesMut::new();

    while let Some(read) = body.next().await {
        let bytes = match read {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };
        buf.extend_from_slice(&bytes);

        while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            let line = buf.split_to(pos + 1);
            if !forward_line(&line[..line.len() - 1], &tx).await {
                return;
            }
        }
    }

    // A final event may arrive without a trailing newline.
    if !buf.is_empty() {
        forward_line(&buf, &tx).await;
    }
}

/// Handle one framed line. Returns false once decoding must stop.
async fn forward_line(raw: &[u8], tx: &mpsc::Sender<Result<ChatCompletionChunk>>) -> bool {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim_end_matches('\r'),
        Err(e) => {
            let _ = tx
                .send(Err(MinoaiError::Decode(format!(
                    "invalid UTF-8 in SSE line: {}",
                    e
                ))))
                .await;
            return false;
        }
    };

    match parse_sse_line(line) {
        Ok(SseLine::Blank) => true,
        Ok(SseLine::Done) => {
            tracing::debug!("received stream terminator");
            false
        }
        Ok(SseLine::Chunk(chunk)) => {
            let finished = chunk.is_stop();

            if tx.send(Ok(chunk)).await.is_err() {
                // Consumer dropped the stream; stop reading.
                return false;
            }

            if finished {
                tracing::debug!("first choice finished with stop; closing stream");
            }
            !finished
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::StatusCode;

    fn sse_response(parts: Vec<&'static [u8]>) -> HttpResponse {
        let body = futures::stream::iter(
            parts
                .into_iter()
                .map(|p| Ok::<_, MinoaiError>(Bytes::from_static(p))),
        );
        HttpResponse {
            status: StatusCode::OK,
            body: Box::pin(body),
        }
    }

    async fn collect(mut stream: ChatCompletionStream) -> Vec<Result<ChatCompletionChunk>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[test]
    fn test_parse_sse_line() {
        let line = r#"data: {"id":"chatcmpl-123","object":"chat.completion.chunk","created":1677652288,"model":"gpt-4o","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#;

        match parse_sse_line(line).unwrap() {
            SseLine::Chunk(chunk) => {
                assert_eq!(chunk.id, "chatcmpl-123");
                assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hello"));
            }
            other => panic!("expected chunk, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_sse_done() {
        assert!(matches!(parse_sse_line("data: [DONE]").unwrap(), SseLine::Done));
    }

    #[test]
    fn test_parse_sse_blank() {
        assert!(matches!(parse_sse_line("").unwrap(), SseLine::Blank));
    }

    #[test]
    fn test_parse_sse_malformed_is_error() {
        assert!(matches!(
            parse_sse_line("data: {not json"),
            Err(MinoaiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_single_chunk_then_done() {
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"gpt-4o\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"hi\"},\"finish_reason\":\"\"}]}\n\ndata: [DONE]\n",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 1);
        let chunk = items[0].as_ref().unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_blank_line_between_events() {
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n",
            b"\n",
            b"data: {\"id\":\"c2\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"b\"}}]}\n",
            b"data: [DONE]\n",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().id, "c1");
        assert_eq!(items[1].as_ref().unwrap().id, "c2");
    }

    #[tokio::test]
    async fn test_stop_finish_reason_halts_before_later_lines() {
        // The line after the stop chunk is malformed; it must never be parsed.
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"bye\"},\"finish_reason\":\"stop\"}]}\n",
            b"data: {garbage\n",
            b"data: [DONE]\n",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
    }

    #[tokio::test]
    async fn test_malformed_line_yields_single_error() {
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n",
            b"data: {broken\n",
            b"data: {\"id\":\"c2\",\"created\":1,\"model\":\"m\",\"choices\":[]}\n",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(MinoaiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_empty_choices_is_not_a_stop() {
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choices\":[]}\n",
            b"data: {\"id\":\"c2\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"x\"}}]}\n",
            b"data: [DONE]\n",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 2);
        assert!(items[0].as_ref().unwrap().choices.is_empty());
        assert_eq!(items[1].as_ref().unwrap().id, "c2");
    }

    #[tokio::test]
    async fn test_line_split_across_reads() {
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choi",
            b"ces\":[{\"index\":0,\"delta\":{\"content\":\"hi\"}}]}\ndata: [DONE]\n",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].as_ref().unwrap().choices[0].delta.content.as_deref(),
            Some("hi")
        );
    }

    #[tokio::test]
    async fn test_eof_without_sentinel_closes_cleanly() {
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
    }

    #[tokio::test]
    async fn test_final_line_without_trailing_newline() {
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().id, "c1");
    }

    #[tokio::test]
    async fn test_transport_error_mid_stream() {
        let parts = vec![
            Ok(Bytes::from_static(
                b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\n",
            )),
            Err(MinoaiError::Transport("connection reset".to_string())),
        ];
        let response = HttpResponse {
            status: StatusCode::OK,
            body: Box::pin(futures::stream::iter(parts)),
        };

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(MinoaiError::Transport(_))));
    }

    #[tokio::test]
    async fn test_crlf_lines() {
        let response = sse_response(vec![
            b"data: {\"id\":\"c1\",\"created\":1,\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"a\"}}]}\r\n\r\ndata: [DONE]\r\n",
        ]);

        let items = collect(spawn_decoder(response)).await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
    }
}
