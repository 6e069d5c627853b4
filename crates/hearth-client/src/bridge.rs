//! Real-time event bridge: subscribes to one channel and yields typed events.

use std::collections::VecDeque;

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use hearth_core::RealtimeEvent;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::http::HttpTaskRemote;

/// Source of real-time events for one channel.
///
/// `next_event` must be cancel-safe: the board polls it inside `select!`.
#[async_trait]
pub trait EventBridge: Send {
    /// Next event, or `None` once the subscription has ended.
    async fn next_event(&mut self) -> Option<RealtimeEvent>;
}

/// In-process subscription to a server hub channel.
pub struct BroadcastBridge {
    receiver: broadcast::Receiver<RealtimeEvent>,
}

impl BroadcastBridge {
    pub fn new(receiver: broadcast::Receiver<RealtimeEvent>) -> Self {
        Self { receiver }
    }
}

#[async_trait]
impl EventBridge for BroadcastBridge {
    async fn next_event(&mut self) -> Option<RealtimeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Realtime subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` decoder. Chunks may split lines anywhere.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.dispatch() {
                    frames.push(frame);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }
        frames
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

/// Subscription to `GET /api/realtime/{channel}` on a hearth server.
pub struct SseBridge {
    stream: BoxStream<'static, std::result::Result<Vec<u8>, String>>,
    decoder: SseDecoder,
    pending: VecDeque<SseFrame>,
}

impl SseBridge {
    pub async fn connect(remote: &HttpTaskRemote, channel: &str) -> Result<Self> {
        let response = remote
            .get(&format!("/api/realtime/{}", channel))
            .send()
            .await
            .map_err(|e| ClientError::Stream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ClientError::Stream(format!(
                "subscription to {} failed with {}",
                channel,
                response.status()
            )));
        }
        info!(%channel, "Subscribed to realtime channel");

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(|e| e.to_string()))
            .boxed();
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already open byte stream.
    pub fn from_stream(stream: BoxStream<'static, std::result::Result<Vec<u8>, String>>) -> Self {
        Self {
            stream,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        }
    }
}

#[async_trait]
impl EventBridge for SseBridge {
    async fn next_event(&mut self) -> Option<RealtimeEvent> {
        loop {
            while let Some(frame) = self.pending.pop_front() {
                let Some(name) = frame.event.as_deref() else {
                    continue;
                };
                match RealtimeEvent::decode(name, &frame.data) {
                    Ok(Some(event)) => return Some(event),
                    Ok(None) => {}
                    Err(e) => warn!(event = name, "Dropping malformed realtime event: {}", e),
                }
            }

            match self.stream.next().await {
                Some(Ok(chunk)) => self.pending.extend(self.decoder.feed(&chunk)),
                Some(Err(e)) => {
                    warn!("Realtime stream failed: {}", e);
                    return None;
                }
                None => {
                    debug!("Realtime stream closed");
                    return None;
                }
            }
        }
    }
}
