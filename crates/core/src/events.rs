use serde::{Deserialize, Serialize};

/// One inbound chat message as delivered by the transport.
///
/// `reply_to_id` carries the message id of the entry signal a reply refers
/// to; entry candidates arrive with it unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: i64,
    pub text: String,
    pub reply_to_id: Option<i64>,
}
