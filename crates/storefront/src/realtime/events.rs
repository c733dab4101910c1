//! Server-pushed events and their wire frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RealtimeError;
use crate::api::conversions::{convert_product, convert_product_patch, convert_rating_update};
use crate::api::types::{Product, ProductPatch, RatingUpdate};

pub const PRODUCT_CREATED: &str = "product_created";
pub const PRODUCT_UPDATED: &str = "product_updated";
pub const RATING_UPDATED: &str = "rating_updated";

/// One text frame on the socket: `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// A decoded server push.
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    /// A listing went public. Always a full product.
    ProductCreated(Product),
    /// A listing changed. Only the changed fields may be present.
    ProductUpdated(ProductPatch),
    RatingUpdated(RatingUpdate),
    /// Anything this client has no typed handling for.
    Other { event: String, data: Value },
}

impl RealtimeEvent {
    /// Event name as sent by the server.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::ProductCreated(_) => PRODUCT_CREATED,
            Self::ProductUpdated(_) => PRODUCT_UPDATED,
            Self::RatingUpdated(_) => RATING_UPDATED,
            Self::Other { event, .. } => event,
        }
    }

    /// Decode a frame's payload according to its event name.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Decode`] when a known event carries a
    /// payload that cannot be normalized.
    pub fn decode(frame: Frame) -> Result<Self, RealtimeError> {
        let decoded = match frame.event.as_str() {
            PRODUCT_CREATED => convert_product(&frame.data).map(Self::ProductCreated),
            PRODUCT_UPDATED => convert_product_patch(&frame.data).map(Self::ProductUpdated),
            RATING_UPDATED => convert_rating_update(&frame.data).map(Self::RatingUpdated),
            _ => {
                return Ok(Self::Other {
                    event: frame.event,
                    data: frame.data,
                });
            }
        };
        decoded.map_err(|e| RealtimeError::Decode(format!("{}: {e}", frame.event)))
    }

    /// Parse and decode a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Decode`] for non-JSON text, a missing event
    /// name, or an undecodable payload.
    pub fn from_text(text: &str) -> Result<Self, RealtimeError> {
        let frame: Frame =
            serde_json::from_str(text).map_err(|e| RealtimeError::Decode(e.to_string()))?;
        Self::decode(frame)
    }
}
