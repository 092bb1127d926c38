//! # Channel Transport
//!
//! The sending half of the transport actor.

use crate::error::CatalogError;
use crate::message::TransportRequest;
use crate::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// ## ChannelTransport
///
/// Forwards listing and detail fetches over a Tokio mpsc channel and awaits the
/// reply on a oneshot channel. It holds only a sender, so cloning is cheap and
/// every entity of a catalog can share one.
///
/// * A closed channel maps to [`CatalogError::TransportClosed`].
/// * A dropped responder maps to [`CatalogError::TransportDropped`].
#[derive(Clone, Debug)]
pub struct ChannelTransport {
    sender: mpsc::Sender<TransportRequest>,
}

impl ChannelTransport {
    pub fn new(sender: mpsc::Sender<TransportRequest>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    #[instrument(skip(self))]
    async fn fetch_listing(&self, term: &str) -> Result<Value, CatalogError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TransportRequest::Listing {
                term: term.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| CatalogError::TransportClosed)?;
        response.await.map_err(|_| CatalogError::TransportDropped)?
    }

    #[instrument(skip(self))]
    async fn fetch_detail(&self, id: &str) -> Result<Value, CatalogError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(TransportRequest::Detail {
                id: id.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| CatalogError::TransportClosed)?;
        response.await.map_err(|_| CatalogError::TransportDropped)?
    }
}
