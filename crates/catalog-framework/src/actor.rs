//! # Transport Actor
//!
//! This module defines the `TransportActor`, the server half of the transport
//! channel. It owns a [`CatalogSource`] and answers requests sequentially, so the
//! source never needs its own locking.

use crate::client::ChannelTransport;
use crate::message::TransportRequest;
use crate::transport::CatalogSource;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// ## TransportActor
///
/// Owns the receiver end of the request channel and the backend that answers it.
///
/// # Usage Pattern
///
/// 1.  **Create**: Call `TransportActor::new()` to get the `actor` (server) and a
///     [`ChannelTransport`] (interface).
/// 2.  **Run**: Spawn `actor.run()` in a background task.
/// 3.  **Shutdown**: Drop every clone of the transport; the loop drains and exits.
///
/// ```rust,ignore
/// let (actor, transport) = TransportActor::new(32, FixtureCatalog::default());
/// let handle = tokio::spawn(actor.run());
/// let context = CatalogContext::new(transport, config);
/// ```
pub struct TransportActor<S: CatalogSource> {
    receiver: mpsc::Receiver<TransportRequest>,
    source: S,
    served: u64,
}

impl<S: CatalogSource> TransportActor<S> {
    /// Creates a new `TransportActor` and its associated `ChannelTransport`.
    ///
    /// `buffer_size` is the capacity of the mpsc channel. If the channel is full,
    /// fetches wait until there is space.
    pub fn new(buffer_size: usize, source: S) -> (Self, ChannelTransport) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            source,
            served: 0,
        };
        (actor, ChannelTransport::new(sender))
    }

    /// Runs the actor's event loop, processing requests until the channel closes.
    pub async fn run(mut self) {
        let source_type = std::any::type_name::<S>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(source_type, "Transport started");

        while let Some(msg) = self.receiver.recv().await {
            self.served += 1;
            match msg {
                TransportRequest::Listing { term, respond_to } => {
                    debug!(source_type, %term, "Listing");
                    let result = self.source.search(&term).await;
                    if let Err(e) = &result {
                        warn!(source_type, %term, error = %e, "Listing failed");
                    }
                    let _ = respond_to.send(result);
                }
                TransportRequest::Detail { id, respond_to } => {
                    debug!(source_type, %id, "Detail");
                    let result = self.source.detail(&id).await;
                    if let Err(e) = &result {
                        warn!(source_type, %id, error = %e, "Detail failed");
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(source_type, served = self.served, "Shutdown");
    }
}
