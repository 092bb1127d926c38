//! # Transport Messages
//!
//! This module defines the message types exchanged between a
//! [`ChannelTransport`](crate::client::ChannelTransport) and a
//! [`TransportActor`](crate::actor::TransportActor).

use crate::error::CatalogError;
use serde_json::Value;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the transport actor.
pub type Response<T> = oneshot::Sender<Result<T, CatalogError>>;

/// Request sent to the transport actor.
///
/// The two variants map onto the two fetches the cache ever issues: a listing
/// that replaces a collection, and a detail fetch that is merged into one entity.
#[derive(Debug)]
pub enum TransportRequest {
    Listing {
        term: String,
        respond_to: Response<Value>,
    },
    Detail {
        id: String,
        respond_to: Response<Value>,
    },
}
