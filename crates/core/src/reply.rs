//! Tagged actions recognized in reply messages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Instruction carried by a reply to a tracked entry signal.
///
/// One case per recognized reply grammar; the dispatcher pattern-matches on
/// the active case instead of re-inspecting the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyAction {
    /// Take profit, optionally at a quoted price.
    BookProfit { price: Option<Decimal> },
    /// Exit at the original entry price.
    ExitCost,
    /// Hold off activation.
    Wait,
    /// Informational follow-along, no action.
    Follow,
    /// Stop loss hit, exit now.
    SlHit,
    /// Re-enter at a new price with a new stop.
    RevisedEntry { price: Decimal, new_sl: Decimal },
    UpdateSl { new_sl: Decimal },
    UpdateTarget { new_target: Decimal },
    UpdateSlTarget { new_sl: Decimal, new_target: Decimal },
}
