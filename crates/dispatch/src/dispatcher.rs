//! Reply dispatcher — the lifecycle state machine.
//!
//! Given an inbound message event, the dispatcher runs it through the dedup
//! window, routes it to the entry or reply grammar, and applies the result
//! to the signal store, placing broker orders through the boundary traits
//! where the transition table calls for one. Order placement failures are
//! recoverable: the signal keeps its prior status and nothing is retried
//! automatically.

use anyhow::Result;
use rust_decimal::Decimal;
use signal_relay_core::{
    AppConfig, CloseReason, InstrumentResolver, MessageEvent, OrderGateway, OrderSpec, OrderType,
    ReplyAction, Signal, SignalStatus,
};
use signal_relay_parser::{EntryParser, ReplyParser};
use signal_relay_store::SignalStore;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::dedup::DedupWindow;

/// What handling one message amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// New entry recorded; `activated` is true once the broker accepted the
    /// entry order.
    EntryTracked { message_id: i64, activated: bool },
    StatusChanged { message_id: i64, status: SignalStatus },
    FieldsUpdated { message_id: i64 },
    /// Revised entry applied; `activated` mirrors the new order attempt.
    Revised { message_id: i64, activated: bool },
    Closed { message_id: i64, reason: CloseReason },
    /// Informational reply, nothing to do.
    Acknowledged,
    /// Message key already seen within the dedup window.
    Duplicate,
    /// Neither grammar recognized the text.
    Unrecognized,
    /// Reply referenced a message id with no tracked signal.
    UnknownSignal,
    /// Mutation attempted against a closed signal.
    Rejected,
}

/// Orchestrates parsing, state transitions, and order placement for one
/// serialized stream of message events.
pub struct Dispatcher {
    store: SignalStore,
    gateway: Arc<dyn OrderGateway>,
    resolver: Arc<dyn InstrumentResolver>,
    entry_parser: EntryParser,
    reply_parser: ReplyParser,
    seen: DedupWindow,
    retention_days: i64,
}

impl Dispatcher {
    /// Builds a dispatcher over an opened store and the broker boundaries.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar patterns fail to compile.
    pub fn new(
        store: SignalStore,
        gateway: Arc<dyn OrderGateway>,
        resolver: Arc<dyn InstrumentResolver>,
        dedup_capacity: usize,
        retention_days: i64,
    ) -> Result<Self> {
        Ok(Self {
            store,
            gateway,
            resolver,
            entry_parser: EntryParser::new()?,
            reply_parser: ReplyParser::new()?,
            seen: DedupWindow::new(dedup_capacity),
            retention_days,
        })
    }

    /// Builds a dispatcher wired from application configuration: the store
    /// opens at the configured snapshot path, the dedup window takes the
    /// configured capacity, and cleanup sweeps use the configured retention.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar patterns fail to compile.
    pub fn from_config(
        config: &AppConfig,
        gateway: Arc<dyn OrderGateway>,
        resolver: Arc<dyn InstrumentResolver>,
    ) -> Result<Self> {
        let store = SignalStore::open(config.store.snapshot_path.clone());
        Self::new(
            store,
            gateway,
            resolver,
            config.dedup.capacity,
            config.store.retention_days,
        )
    }

    #[must_use]
    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    /// Sweeps closed signals older than the retention window out of the store.
    pub fn cleanup(&mut self) -> usize {
        self.store.cleanup(self.retention_days)
    }

    /// Handles one inbound message: dedup, route, parse, apply.
    pub async fn handle_message(&mut self, event: &MessageEvent) -> Outcome {
        if !self.seen.insert(event.id) {
            debug!(message_id = event.id, "Duplicate delivery dropped");
            return Outcome::Duplicate;
        }

        match event.reply_to_id {
            Some(parent_id) => self.handle_reply(parent_id, &event.text).await,
            None => self.handle_entry(event).await,
        }
    }

    async fn handle_entry(&mut self, event: &MessageEvent) -> Outcome {
        if !self.entry_parser.is_entry_signal(&event.text) {
            debug!(message_id = event.id, "Message does not look like an entry signal");
            return Outcome::Unrecognized;
        }
        let Some(signal) = self.entry_parser.parse(&event.text, event.id) else {
            debug!(message_id = event.id, "Entry candidate failed full parse");
            return Outcome::Unrecognized;
        };

        info!(
            message_id = event.id,
            symbol = %signal.symbol,
            strike = %signal.strike,
            option_type = %signal.option_type,
            entry = %signal.entry_price,
            "Tracking new entry signal"
        );
        self.store.add(signal.clone());

        let activated = self.try_place_entry(&signal).await;
        Outcome::EntryTracked {
            message_id: event.id,
            activated,
        }
    }

    async fn handle_reply(&mut self, message_id: i64, text: &str) -> Outcome {
        let Some(action) = self.reply_parser.parse(text) else {
            debug!(message_id, "Unrecognized reply, no action taken");
            return Outcome::Unrecognized;
        };
        let Some(signal) = self.store.get(message_id).cloned() else {
            warn!(message_id, ?action, "Reply references an untracked signal");
            return Outcome::UnknownSignal;
        };

        self.apply(signal, action).await
    }

    /// The transition table: current signal × reply action → next state.
    async fn apply(&mut self, signal: Signal, action: ReplyAction) -> Outcome {
        let message_id = signal.message_id;

        if signal.is_closed() {
            return match action {
                // Re-closing is idempotent: no order, no field change.
                ReplyAction::BookProfit { .. } | ReplyAction::ExitCost | ReplyAction::SlHit => {
                    let reason = signal.close_reason.unwrap_or(CloseReason::Manual);
                    self.store.close(message_id, reason, signal.exit_price);
                    Outcome::Closed { message_id, reason }
                }
                _ => {
                    warn!(message_id, ?action, "Reply for a closed signal rejected");
                    Outcome::Rejected
                }
            };
        }

        match action {
            ReplyAction::Follow => {
                info!(message_id, "Follow-along reply, no action");
                Outcome::Acknowledged
            }
            ReplyAction::Wait => {
                self.store.set_status(message_id, SignalStatus::Waiting);
                info!(message_id, "Signal set to waiting");
                Outcome::StatusChanged {
                    message_id,
                    status: SignalStatus::Waiting,
                }
            }
            ReplyAction::BookProfit { price } => {
                self.place_exit(&signal, OrderType::Market, None).await;
                self.store.close(message_id, CloseReason::Profit, price);
                Outcome::Closed {
                    message_id,
                    reason: CloseReason::Profit,
                }
            }
            ReplyAction::ExitCost => {
                self.place_exit(&signal, OrderType::Limit, Some(signal.entry_price))
                    .await;
                self.store
                    .close(message_id, CloseReason::Cost, Some(signal.entry_price));
                Outcome::Closed {
                    message_id,
                    reason: CloseReason::Cost,
                }
            }
            ReplyAction::SlHit => {
                self.place_exit(&signal, OrderType::Market, None).await;
                self.store.close(message_id, CloseReason::SlHit, None);
                Outcome::Closed {
                    message_id,
                    reason: CloseReason::SlHit,
                }
            }
            ReplyAction::RevisedEntry { price, new_sl } => {
                self.store.update_entry(message_id, price, new_sl);
                let mut revised = signal;
                revised.entry_price = price;
                revised.stop_loss = new_sl;
                let activated = self.try_place_entry(&revised).await;
                Outcome::Revised {
                    message_id,
                    activated,
                }
            }
            ReplyAction::UpdateSl { new_sl } => {
                self.store.update_sl(message_id, new_sl);
                Outcome::FieldsUpdated { message_id }
            }
            ReplyAction::UpdateTarget { new_target } => {
                self.store.update_target(message_id, new_target);
                Outcome::FieldsUpdated { message_id }
            }
            ReplyAction::UpdateSlTarget { new_sl, new_target } => {
                self.store.update_sl_and_target(message_id, new_sl, new_target);
                Outcome::FieldsUpdated { message_id }
            }
        }
    }

    /// Attempts to place the entry order. On success the signal is
    /// activated; on any failure it keeps its prior status and the failure
    /// is logged — a later revised entry may try again.
    async fn try_place_entry(&mut self, signal: &Signal) -> bool {
        let contract = match self
            .resolver
            .resolve_option(
                &signal.symbol,
                signal.strike,
                signal.option_type,
                &signal.expiry,
            )
            .await
        {
            Ok(Some(contract)) => contract,
            Ok(None) => {
                warn!(
                    message_id = signal.message_id,
                    symbol = %signal.symbol,
                    strike = %signal.strike,
                    expiry = %signal.expiry,
                    "No tradable contract for signal"
                );
                return false;
            }
            Err(e) => {
                error!(message_id = signal.message_id, error = %e, "Instrument resolution failed");
                return false;
            }
        };

        let spec = OrderSpec {
            trading_symbol: contract.trading_symbol,
            action: signal.action,
            order_type: OrderType::Limit,
            quantity: contract.lot_size,
            price: Some(signal.entry_price),
        };

        match self.gateway.place_order(&spec).await {
            Ok(receipt) if receipt.accepted => match receipt.order_id {
                Some(order_id) => {
                    self.store.set_order_id(signal.message_id, &order_id);
                    info!(message_id = signal.message_id, order_id = %order_id, "Entry order placed");
                    true
                }
                None => {
                    warn!(
                        message_id = signal.message_id,
                        "Order accepted without an id, signal stays in its prior status"
                    );
                    false
                }
            },
            Ok(receipt) => {
                warn!(
                    message_id = signal.message_id,
                    reason = receipt.message.as_deref().unwrap_or("rejected"),
                    "Entry order rejected"
                );
                false
            }
            Err(e) => {
                error!(message_id = signal.message_id, error = %e, "Entry order placement failed");
                false
            }
        }
    }

    /// Places the exit order for a closing transition. The bookkeeping close
    /// follows the source's instruction regardless of the broker outcome, so
    /// failures here are logged and absorbed.
    async fn place_exit(&self, signal: &Signal, order_type: OrderType, price: Option<Decimal>) {
        let contract = match self
            .resolver
            .resolve_option(
                &signal.symbol,
                signal.strike,
                signal.option_type,
                &signal.expiry,
            )
            .await
        {
            Ok(Some(contract)) => contract,
            Ok(None) => {
                warn!(
                    message_id = signal.message_id,
                    symbol = %signal.symbol,
                    "No tradable contract for exit"
                );
                return;
            }
            Err(e) => {
                error!(message_id = signal.message_id, error = %e, "Instrument resolution failed for exit");
                return;
            }
        };

        let spec = OrderSpec {
            trading_symbol: contract.trading_symbol,
            action: signal.action.reversed(),
            order_type,
            quantity: contract.lot_size,
            price,
        };

        match self.gateway.place_order(&spec).await {
            Ok(receipt) if receipt.accepted => {
                info!(
                    message_id = signal.message_id,
                    order_id = receipt.order_id.as_deref().unwrap_or(""),
                    "Exit order placed"
                );
            }
            Ok(receipt) => {
                warn!(
                    message_id = signal.message_id,
                    reason = receipt.message.as_deref().unwrap_or("rejected"),
                    "Exit order rejected"
                );
            }
            Err(e) => {
                error!(message_id = signal.message_id, error = %e, "Exit order placement failed");
            }
        }
    }
}
