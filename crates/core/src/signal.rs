//! Domain types for tracked chat signals.
//!
//! A [`Signal`] is one tracked entry message: the instrument it names, the
//! prices it quotes, and where it sits in the lifecycle state machine
//! (`Pending → Active ⇄ Waiting → Closed`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of an entry signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// The opposite side, used when exiting a position.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Option right named in the signal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    Ce,
    Pe,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ce => write!(f, "CE"),
            Self::Pe => write!(f, "PE"),
        }
    }
}

/// Lifecycle state of a tracked signal. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStatus {
    /// Entry parsed and recorded, no broker order yet.
    Pending,
    /// Entry order placed successfully.
    Active,
    /// Source asked to hold off activation.
    Waiting,
    /// Position exited; trading fields are frozen.
    Closed,
}

/// Reason a signal was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    Profit,
    SlHit,
    Cost,
    Manual,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Profit => write!(f, "profit"),
            Self::SlHit => write!(f, "sl_hit"),
            Self::Cost => write!(f, "cost"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// One tracked entry signal, keyed by the chat message that announced it.
///
/// `stop_loss` holds half the value stated in the raw message (the stored
/// risk is deliberately halved relative to the source); `original_sl` keeps
/// the stated value for audit. Only the first stated target is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub message_id: i64,
    pub action: TradeAction,
    pub symbol: String,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub original_sl: Decimal,
    pub target: Option<Decimal>,
    /// Three-letter uppercase month code, e.g. `FEB`.
    pub expiry: String,
    pub status: SignalStatus,
    pub order_id: Option<String>,
    pub close_reason: Option<CloseReason>,
    pub exit_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Signal {
    /// Returns true once the signal has reached its terminal state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == SignalStatus::Closed
    }
}
