//! Crash-recoverable store of tracked signals.
//!
//! An in-memory map keyed by message id, mirrored to a JSON snapshot file
//! after every mutation. The snapshot is the durability story: load it at
//! startup, rewrite it wholesale on each change. Mutation volume is low and
//! durability after each state change takes priority over throughput.

pub mod persistence;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use signal_relay_core::{CloseReason, Signal, SignalStatus};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

pub use persistence::{SnapshotFile, SnapshotPersistence, StoreError};

/// In-memory signal map with snapshot-on-mutation durability.
///
/// All operations are keyed by `message_id`. A `Closed` signal is terminal:
/// trading-field mutations against it are rejected as logged no-ops, and
/// only an idempotent re-close is permitted.
pub struct SignalStore {
    signals: HashMap<i64, Signal>,
    persistence: SnapshotPersistence,
}

impl SignalStore {
    /// Opens the store, loading any existing snapshot at `path`.
    ///
    /// Missing or corrupt snapshots load as an empty store.
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        let persistence = SnapshotPersistence::new(path);
        let signals = persistence
            .load()
            .into_iter()
            .map(|s| (s.message_id, s))
            .collect();
        Self {
            signals,
            persistence,
        }
    }

    /// Inserts a signal, overwriting any previous record under the same id.
    /// Stamps `created_at`/`updated_at` and persists.
    pub fn add(&mut self, mut signal: Signal) {
        let now = Utc::now();
        signal.created_at = now;
        signal.updated_at = now;
        self.signals.insert(signal.message_id, signal);
        self.persist();
    }

    #[must_use]
    pub fn get(&self, message_id: i64) -> Option<&Signal> {
        self.signals.get(&message_id)
    }

    /// Sets a non-terminal status. Returns false for unknown or closed
    /// signals. Closing goes through [`SignalStore::close`].
    pub fn set_status(&mut self, message_id: i64, status: SignalStatus) -> bool {
        self.mutate(message_id, |signal| signal.status = status)
    }

    /// Records a successfully placed broker order and activates the signal.
    pub fn set_order_id(&mut self, message_id: i64, order_id: &str) -> bool {
        self.mutate(message_id, |signal| {
            signal.order_id = Some(order_id.to_string());
            signal.status = SignalStatus::Active;
        })
    }

    /// Applies a revised entry: new limit price and new stop loss.
    pub fn update_entry(&mut self, message_id: i64, new_price: Decimal, new_sl: Decimal) -> bool {
        self.mutate(message_id, |signal| {
            signal.entry_price = new_price;
            signal.stop_loss = new_sl;
        })
    }

    pub fn update_sl(&mut self, message_id: i64, new_sl: Decimal) -> bool {
        self.mutate(message_id, |signal| signal.stop_loss = new_sl)
    }

    pub fn update_target(&mut self, message_id: i64, new_target: Decimal) -> bool {
        self.mutate(message_id, |signal| signal.target = Some(new_target))
    }

    pub fn update_sl_and_target(
        &mut self,
        message_id: i64,
        new_sl: Decimal,
        new_target: Decimal,
    ) -> bool {
        self.mutate(message_id, |signal| {
            signal.stop_loss = new_sl;
            signal.target = Some(new_target);
        })
    }

    /// Closes a signal. Re-closing an already closed signal is an idempotent
    /// no-op: the record keeps its original reason, exit price, and
    /// `closed_at`; only `updated_at` moves.
    pub fn close(
        &mut self,
        message_id: i64,
        reason: CloseReason,
        exit_price: Option<Decimal>,
    ) -> bool {
        let Some(signal) = self.signals.get_mut(&message_id) else {
            warn!(message_id, "Close requested for unknown signal");
            return false;
        };

        let now = Utc::now();
        if signal.status == SignalStatus::Closed {
            signal.updated_at = now;
            self.persist();
            return true;
        }

        signal.status = SignalStatus::Closed;
        signal.close_reason = Some(reason);
        signal.exit_price = exit_price;
        signal.closed_at = Some(now);
        signal.updated_at = now;
        info!(message_id, reason = %reason, "Signal closed");
        self.persist();
        true
    }

    /// All signals not yet closed.
    #[must_use]
    pub fn list_active(&self) -> Vec<&Signal> {
        let mut active: Vec<&Signal> = self
            .signals
            .values()
            .filter(|s| s.status != SignalStatus::Closed)
            .collect();
        active.sort_by_key(|s| s.message_id);
        active
    }

    #[must_use]
    pub fn list_all(&self) -> Vec<&Signal> {
        let mut all: Vec<&Signal> = self.signals.values().collect();
        all.sort_by_key(|s| s.message_id);
        all
    }

    /// Removes closed signals whose `closed_at` (or `updated_at` when the
    /// close stamp is absent) is older than `max_age_days`. Persists only
    /// when something was actually removed.
    pub fn cleanup(&mut self, max_age_days: i64) -> usize {
        let cutoff = Utc::now() - Duration::days(max_age_days);
        let before = self.signals.len();
        self.signals.retain(|_, signal| {
            if signal.status != SignalStatus::Closed {
                return true;
            }
            signal.closed_at.unwrap_or(signal.updated_at) >= cutoff
        });

        let removed = before - self.signals.len();
        if removed > 0 {
            info!(removed, max_age_days, "Swept expired closed signals");
            self.persist();
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Guarded trading-field mutation: unknown ids and closed signals are
    /// logged no-ops. Stamps `updated_at` and persists on success.
    fn mutate<F>(&mut self, message_id: i64, apply: F) -> bool
    where
        F: FnOnce(&mut Signal),
    {
        let Some(signal) = self.signals.get_mut(&message_id) else {
            warn!(message_id, "Mutation requested for unknown signal");
            return false;
        };
        if signal.status == SignalStatus::Closed {
            warn!(message_id, "Mutation rejected: signal is closed");
            return false;
        }

        apply(signal);
        signal.updated_at = Utc::now();
        self.persist();
        true
    }

    /// Full-snapshot write. A failed write is logged and absorbed: the
    /// in-memory state stays authoritative and the next successful mutation
    /// rewrites the file.
    fn persist(&self) {
        let mut signals: Vec<Signal> = self.signals.values().cloned().collect();
        signals.sort_by_key(|s| s.message_id);
        if let Err(e) = self.persistence.save(&signals) {
            warn!(
                path = %self.persistence.path().display(),
                error = %e,
                "Snapshot write failed, in-memory state remains authoritative"
            );
        }
    }
}
