//! Boundary traits for the external collaborators.
//!
//! Broker order placement and instrument-master lookup live outside this
//! engine; the dispatcher reaches them only through these seams.

use crate::signal::{OptionType, TradeAction};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Order request handed to the broker gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub trading_symbol: String,
    pub action: TradeAction,
    pub order_type: OrderType,
    pub quantity: u32,
    /// Limit price; `None` for market orders.
    pub price: Option<Decimal>,
}

/// Broker response to an order placement attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub accepted: bool,
    pub order_id: Option<String>,
    pub message: Option<String>,
}

/// Resolved option contract: venue symbol plus the broker lot size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionContract {
    pub trading_symbol: String,
    pub lot_size: u32,
}

#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn place_order(&self, spec: &OrderSpec) -> Result<OrderReceipt>;
}

#[async_trait]
pub trait InstrumentResolver: Send + Sync {
    /// Looks up the tradable contract for an underlying/strike/right/expiry.
    /// Returns `Ok(None)` when no such contract exists.
    async fn resolve_option(
        &self,
        symbol: &str,
        strike: Decimal,
        option_type: OptionType,
        expiry: &str,
    ) -> Result<Option<OptionContract>>;
}
