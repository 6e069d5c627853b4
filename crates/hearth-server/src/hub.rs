//! Real-time hub: per-channel fan-out of typed events.
//!
//! Every channel is a `broadcast` channel. Subscribers that fall more than
//! `buffer` events behind skip the missed ones; clients correct themselves
//! on their next refetch.

use std::collections::HashMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use hearth_core::RealtimeEvent;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::auth::Caller;
use crate::server::SharedState;

pub struct RealtimeHub {
    channels: RwLock<HashMap<String, broadcast::Sender<RealtimeEvent>>>,
    buffer: usize,
}

impl RealtimeHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    pub async fn subscribe(&self, channel: &str) -> broadcast::Receiver<RealtimeEvent> {
        if let Some(sender) = self.channels.read().await.get(channel) {
            return sender.subscribe();
        }
        self.channels
            .write()
            .await
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer).0)
            .subscribe()
    }

    /// Send an event to every current subscriber. Returns how many received it.
    pub async fn publish(&self, channel: &str, event: RealtimeEvent) -> usize {
        let name = event.name();
        let delivered = match self.channels.read().await.get(channel) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };
        debug!(%channel, event = name, delivered, "Published realtime event");
        delivered
    }
}

/// GET /api/realtime/:channel - streams channel events as SSE
pub async fn sse_handler(
    State(app): State<SharedState>,
    _caller: Caller,
    Path(channel): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut receiver = app.hub.subscribe(&channel).await;

    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => match event.encode_data() {
                    Ok(data) => yield Ok(Event::default().event(event.name()).data(data)),
                    Err(e) => warn!("Failed to encode realtime event: {}", e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%channel, skipped, "SSE subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_core::{Task, TaskId, TaskType};

    fn task() -> Task {
        Task {
            id: TaskId::parse("a").unwrap(),
            title: "A".to_string(),
            description: None,
            completed: false,
            author_id: "alice".to_string(),
            task_type: TaskType::Task,
            position: 1024.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_channel_subscribers_only() {
        let hub = RealtimeHub::new(8);
        let mut household = hub.subscribe("user-household").await;
        let mut other = hub.subscribe("user-other").await;

        let delivered = hub
            .publish("user-household", RealtimeEvent::task_created(task()))
            .await;
        assert_eq!(delivered, 1);

        let event = household.recv().await.unwrap();
        assert_eq!(event.name(), "task-created");
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub = RealtimeHub::new(8);
        assert_eq!(
            hub.publish("user-nobody", RealtimeEvent::task_created(task()))
                .await,
            0
        );
    }
}
