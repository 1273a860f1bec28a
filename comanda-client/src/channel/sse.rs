//! SSE push transport
//!
//! The push endpoint serves one event stream per topic at
//! `GET {base}/eventos/{topic}?token={token}`. Frames follow the
//! `text/event-stream` wire format: `event:` / `data:` field lines
//! terminated by a blank line. Data lines carry JSON payloads; anything
//! that fails to decode is logged and dropped.

use super::transport::{ChannelError, PushConnector, PushTransport};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use shared::message::PushEvent;

// ============================================================================
// Connector
// ============================================================================

/// Dials SSE connections against the push endpoint
#[derive(Debug, Clone)]
pub struct SseConnector {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl SseConnector {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    fn endpoint(&self, topic: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        match &self.token {
            Some(token) => format!("{base}/eventos/{topic}?token={token}"),
            None => format!("{base}/eventos/{topic}"),
        }
    }
}

#[async_trait]
impl PushConnector for SseConnector {
    async fn dial(
        &self,
        topic: &str,
        _event_names: &[String],
    ) -> Result<Box<dyn PushTransport>, ChannelError> {
        let url = self.endpoint(topic);
        let response = self
            .http
            .get(&url)
            .header(http::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Connect(format!(
                "push endpoint returned {status}"
            )));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();

        Ok(Box::new(SseTransport {
            stream,
            buf: Vec::new(),
            decoder: SseDecoder::default(),
            eof: false,
        }))
    }
}

// ============================================================================
// Transport
// ============================================================================

struct SseTransport {
    stream: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    buf: Vec<u8>,
    decoder: SseDecoder,
    eof: bool,
}

#[async_trait]
impl PushTransport for SseTransport {
    async fn next_event(&mut self) -> Result<Option<PushEvent>, ChannelError> {
        loop {
            while let Some(line) = take_line(&mut self.buf) {
                if let Some(event) = self.decoder.feed_line(&line) {
                    return Ok(Some(event));
                }
            }
            if self.eof {
                return Ok(None);
            }
            match self.stream.next().await {
                Some(Ok(chunk)) => self.buf.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(ChannelError::ConnectionLost(e.to_string())),
                None => {
                    // Flush a final unterminated frame, then report EOF
                    self.eof = true;
                    if !self.buf.is_empty() {
                        self.buf.push(b'\n');
                    }
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        // Dropping the stream closes the HTTP connection
        Ok(())
    }
}

/// Pop one `\n`-terminated line off the front of the buffer
fn take_line(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buf.drain(..=pos).collect();
    line.pop(); // trailing \n
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(String::from_utf8_lossy(&line).into_owned())
}

// ============================================================================
// Decoder
// ============================================================================

/// Incremental `text/event-stream` frame decoder
#[derive(Default)]
struct SseDecoder {
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed one line. A blank line terminates the frame; the completed
    /// event is returned once its data parses as JSON.
    fn feed_line(&mut self, line: &str) -> Option<PushEvent> {
        if line.is_empty() {
            return self.finish();
        }
        if let Some(rest) = line.strip_prefix("event:") {
            self.event = Some(rest.trim_start().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            self.data.push(rest.trim_start().to_string());
        } else if line.starts_with(':') {
            // comment / keep-alive
        } else {
            tracing::debug!(line = %line, "Unknown SSE field ignored");
        }
        None
    }

    fn finish(&mut self) -> Option<PushEvent> {
        let event = self.event.take().unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data).join("\n");
        if data.is_empty() {
            return None; // heartbeat frame
        }
        match serde_json::from_str(&data) {
            Ok(value) => Some(PushEvent { event, data: value }),
            Err(e) => {
                tracing::warn!(event = %event, error = %e, "Malformed push payload dropped");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(decoder: &mut SseDecoder, raw: &str) -> Vec<PushEvent> {
        let mut out = Vec::new();
        for line in raw.split('\n') {
            if let Some(ev) = decoder.feed_line(line) {
                out.push(ev);
            }
        }
        out
    }

    #[test]
    fn decodes_named_event_frames() {
        let mut decoder = SseDecoder::default();
        let events = feed(
            &mut decoder,
            "event: nuevo-pedido\ndata: {\"id\":\"o-1\"}\n\n",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "nuevo-pedido");
        assert_eq!(events[0].data["id"], "o-1");
    }

    #[test]
    fn multiline_data_is_joined() {
        let mut decoder = SseDecoder::default();
        let events = feed(
            &mut decoder,
            "event: estado-cocina\ndata: {\"id\":\ndata: \"o-2\"}\n\n",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["id"], "o-2");
    }

    #[test]
    fn malformed_json_is_dropped_and_stream_continues() {
        let mut decoder = SseDecoder::default();
        let events = feed(
            &mut decoder,
            "event: estado-cocina\ndata: not json\n\nevent: stock-bajo\ndata: {\"ok\":1}\n\n",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "stock-bajo");
    }

    #[test]
    fn heartbeats_and_comments_produce_nothing() {
        let mut decoder = SseDecoder::default();
        let events = feed(&mut decoder, ": ping\n\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn take_line_handles_crlf() {
        let mut buf = b"data: {}\r\nrest".to_vec();
        assert_eq!(take_line(&mut buf).unwrap(), "data: {}");
        assert_eq!(buf, b"rest");
        assert!(take_line(&mut buf).is_none());
    }

    #[test]
    fn token_goes_in_the_query_string() {
        let connector = SseConnector::new("http://localhost:8080/", Some("t0k3n".to_string()));
        assert_eq!(
            connector.endpoint("cocina"),
            "http://localhost:8080/eventos/cocina?token=t0k3n"
        );
    }
}
