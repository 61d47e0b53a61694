//! Queue change notifications pushed to listening clients over SSE.
//!
//! Delivery is lossy: the broadcast channel drops events for slow or
//! absent listeners, and clients re-fetch the queue endpoints for the
//! authoritative state.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// What changed in a reviewer's queue. Positions describe the submission
/// after the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEventData {
    Enqueued {
        submission_id: String,
        queue_position: i64,
    },
    Reordered {
        submission_id: String,
        queue_position: i64,
    },
    Completed {
        submission_id: String,
    },
    Removed {
        submission_id: String,
    },
    LineSkipped {
        submission_id: String,
        queue_position: i64,
    },
}

impl QueueEventData {
    pub fn kind(&self) -> &'static str {
        match self {
            QueueEventData::Enqueued { .. } => "enqueued",
            QueueEventData::Reordered { .. } => "reordered",
            QueueEventData::Completed { .. } => "completed",
            QueueEventData::Removed { .. } => "removed",
            QueueEventData::LineSkipped { .. } => "line_skipped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEvent {
    pub reviewer_id: String,
    pub data: QueueEventData,
}

/// Fan-out hub for queue events. One global channel; each SSE connection
/// filters down to the reviewer it watches.
#[derive(Clone)]
pub struct QueueEvents {
    tx: broadcast::Sender<QueueEvent>,
}

impl QueueEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Send to whoever is listening. A queue with no listeners is fine.
    pub fn publish(&self, event: QueueEvent) {
        let delivered = self.tx.send(event);
        if let Ok(count) = delivered {
            debug!("queue event delivered to {} listeners", count);
        }
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    /// SSE event stream carrying only one reviewer's queue changes.
    pub fn reviewer_stream(
        &self,
        reviewer_id: String,
    ) -> impl Stream<Item = Result<Event, Infallible>> {
        let rx = self.tx.subscribe();
        let stream = BroadcastStream::new(rx);

        stream.filter_map(move |result| {
            let reviewer_id = reviewer_id.clone();
            async move {
                match result {
                    Ok(queue_event) if queue_event.reviewer_id == reviewer_id => {
                        let event = Event::default()
                            .event(queue_event.data.kind())
                            .json_data(&queue_event)
                            .ok();
                        event.map(Ok)
                    }
                    Ok(_) => None,
                    Err(e) => {
                        // Lagged receiver; skip and keep streaming.
                        warn!("sse listener fell behind: {:?}", e);
                        None
                    }
                }
            }
        })
    }

    pub fn sse_response(
        &self,
        reviewer_id: String,
    ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        Sse::new(self.reviewer_stream(reviewer_id)).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(30))
                .text("keep-alive"),
        )
    }
}
