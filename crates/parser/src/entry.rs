//! Entry signal grammar.
//!
//! Recognizes the multi-line entry format:
//!
//! ```text
//! BUY HINDZINC
//! 750 CE ABOVE 33
//! SL 30.5 TARGET 36 40
//! FEBRUARY SERIES
//! ```
//!
//! The fourth line is optional; everything else is anchored and any
//! mismatched line fails the whole parse. No partial signals are produced.

use anyhow::Result;
use chrono::{Datelike, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use signal_relay_core::{OptionType, Signal, SignalStatus, TradeAction};
use std::str::FromStr;
use tracing::debug;

const MONTH_CODES: [(&str, &str); 12] = [
    ("JANUARY", "JAN"),
    ("FEBRUARY", "FEB"),
    ("MARCH", "MAR"),
    ("APRIL", "APR"),
    ("MAY", "MAY"),
    ("JUNE", "JUN"),
    ("JULY", "JUL"),
    ("AUGUST", "AUG"),
    ("SEPTEMBER", "SEP"),
    ("OCTOBER", "OCT"),
    ("NOVEMBER", "NOV"),
    ("DECEMBER", "DEC"),
];

/// Maps a month name to its three-letter code. Unrecognized names fall back
/// to their first three characters uppercased.
#[must_use]
pub fn month_code(name: &str) -> String {
    let upper = name.to_uppercase();
    for (full, code) in MONTH_CODES {
        if upper == full {
            return code.to_string();
        }
    }
    upper.chars().take(3).collect()
}

/// Three-letter code for the current calendar month.
#[must_use]
pub fn current_month_code() -> String {
    const CODES: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    CODES[Utc::now().month0() as usize].to_string()
}

/// Parses raw multi-line messages into structured entry signals.
pub struct EntryParser {
    /// `ACTION SYMBOL`
    header: Regex,
    /// `STRIKE CE|PE ABOVE ENTRY`
    contract: Regex,
    /// `SL VALUE TARGET T1 [T2 ...]`
    risk: Regex,
    /// `MONTHNAME SERIES` (optional line)
    series: Regex,
}

impl EntryParser {
    /// Compiles the line patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            header: Regex::new(r"(?i)^(BUY|SELL)\s+([A-Z0-9&_-]+)$")?,
            contract: Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s+(CE|PE)\s+ABOVE\s+(\d+(?:\.\d+)?)$")?,
            risk: Regex::new(
                r"(?i)^SL\s+(\d+(?:\.\d+)?)\s+TARGET\s+(\d+(?:\.\d+)?(?:\s+\d+(?:\.\d+)?)*)$",
            )?,
            series: Regex::new(r"(?i)^([A-Z]+)\s+SERIES$")?,
        })
    }

    /// Parses a raw message into a `Pending` signal keyed by `message_id`.
    ///
    /// Returns `None` when the text does not match the entry grammar —
    /// rejection is the normal outcome for chatter, never an error.
    #[must_use]
    pub fn parse(&self, raw_text: &str, message_id: i64) -> Option<Signal> {
        let lines: Vec<&str> = raw_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() < 3 {
            return None;
        }

        let header = self.header.captures(lines[0])?;
        let action = if header[1].eq_ignore_ascii_case("BUY") {
            TradeAction::Buy
        } else {
            TradeAction::Sell
        };
        let symbol = header[2].to_uppercase();

        let contract = self.contract.captures(lines[1])?;
        let strike = Decimal::from_str(&contract[1]).ok()?;
        let option_type = if contract[2].eq_ignore_ascii_case("CE") {
            OptionType::Ce
        } else {
            OptionType::Pe
        };
        let entry_price = Decimal::from_str(&contract[3]).ok()?;

        let risk = self.risk.captures(lines[2])?;
        let original_sl = Decimal::from_str(&risk[1]).ok()?;
        // The pattern validated the whole target list; only the first
        // (tightest, first-stated) target is kept.
        let target = Decimal::from_str(risk[2].split_whitespace().next()?).ok()?;

        let expiry = match lines.get(3).and_then(|l| self.series.captures(l)) {
            Some(series) => month_code(&series[1]),
            None => current_month_code(),
        };

        debug!(message_id, %symbol, %strike, "Parsed entry signal");

        let now = Utc::now();
        Some(Signal {
            message_id,
            action,
            symbol,
            strike,
            option_type,
            entry_price,
            stop_loss: original_sl / Decimal::TWO,
            original_sl,
            target: Some(target),
            expiry,
            status: SignalStatus::Pending,
            order_id: None,
            close_reason: None,
            exit_price: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        })
    }

    /// Cheap structural pre-filter: checks only the first two lines.
    ///
    /// Used to route a message toward the entry grammar before attempting a
    /// full parse; it deliberately does not validate the risk line.
    #[must_use]
    pub fn is_entry_signal(&self, raw_text: &str) -> bool {
        let mut lines = raw_text.lines().map(str::trim).filter(|l| !l.is_empty());
        let (Some(first), Some(second)) = (lines.next(), lines.next()) else {
            return false;
        };
        self.header.is_match(first) && self.contract.is_match(second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parser() -> EntryParser {
        EntryParser::new().unwrap()
    }

    const HINDZINC: &str = "BUY HINDZINC\n750 CE ABOVE 33\nSL 30.5 TARGET 36 40\nFEBRUARY SERIES";

    // =========================================================================
    // Full parse
    // =========================================================================

    #[test]
    fn parses_worked_example() {
        let signal = parser().parse(HINDZINC, 1).unwrap();

        assert_eq!(signal.message_id, 1);
        assert_eq!(signal.action, TradeAction::Buy);
        assert_eq!(signal.symbol, "HINDZINC");
        assert_eq!(signal.strike, dec!(750));
        assert_eq!(signal.option_type, OptionType::Ce);
        assert_eq!(signal.entry_price, dec!(33));
        assert_eq!(signal.stop_loss, dec!(15.25));
        assert_eq!(signal.original_sl, dec!(30.5));
        assert_eq!(signal.target, Some(dec!(36)));
        assert_eq!(signal.expiry, "FEB");
        assert_eq!(signal.status, SignalStatus::Pending);
        assert!(signal.order_id.is_none());
    }

    #[test]
    fn stop_loss_is_half_of_stated_value() {
        let signal = parser()
            .parse("SELL NIFTY\n22500 PE ABOVE 110\nSL 90 TARGET 140", 2)
            .unwrap();
        assert_eq!(signal.stop_loss, dec!(45));
        assert_eq!(signal.original_sl, dec!(90));
    }

    #[test]
    fn only_first_target_is_retained() {
        let signal = parser()
            .parse("BUY TATASTEEL\n140 CE ABOVE 4.5\nSL 3 TARGET 5.5 6 7.25", 3)
            .unwrap();
        assert_eq!(signal.target, Some(dec!(5.5)));
    }

    #[test]
    fn action_and_symbol_are_case_normalized() {
        let signal = parser()
            .parse("buy m&m-fin\n300 ce above 12\nSL 10 TARGET 15", 4)
            .unwrap();
        assert_eq!(signal.action, TradeAction::Buy);
        assert_eq!(signal.symbol, "M&M-FIN");
    }

    // =========================================================================
    // Expiry handling
    // =========================================================================

    #[test]
    fn missing_series_line_defaults_to_current_month() {
        let signal = parser()
            .parse("BUY HINDZINC\n750 CE ABOVE 33\nSL 30.5 TARGET 36", 5)
            .unwrap();
        assert_eq!(signal.expiry, current_month_code());
    }

    #[test]
    fn unmatched_fourth_line_defaults_to_current_month() {
        let signal = parser()
            .parse("BUY HINDZINC\n750 CE ABOVE 33\nSL 30.5 TARGET 36\nhold tight", 6)
            .unwrap();
        assert_eq!(signal.expiry, current_month_code());
    }

    #[test]
    fn unknown_month_name_truncates_to_three_chars() {
        assert_eq!(month_code("FEBRUAR"), "FEB");
        assert_eq!(month_code("sept"), "SEP");
    }

    #[test]
    fn month_table_maps_full_names() {
        assert_eq!(month_code("january"), "JAN");
        assert_eq!(month_code("DECEMBER"), "DEC");
        assert_eq!(month_code("May"), "MAY");
    }

    // =========================================================================
    // Rejections
    // =========================================================================

    #[test]
    fn fewer_than_three_lines_rejected() {
        assert!(parser().parse("BUY HINDZINC\n750 CE ABOVE 33", 7).is_none());
        assert!(parser().parse("BUY HINDZINC", 8).is_none());
        assert!(parser().parse("", 9).is_none());
    }

    #[test]
    fn blank_lines_do_not_count() {
        let text = "BUY HINDZINC\n\n   \n750 CE ABOVE 33\n";
        assert!(parser().parse(text, 10).is_none());
    }

    #[test]
    fn malformed_header_rejected() {
        let text = "HOLD HINDZINC\n750 CE ABOVE 33\nSL 30.5 TARGET 36";
        assert!(parser().parse(text, 11).is_none());
    }

    #[test]
    fn malformed_contract_line_rejected() {
        let text = "BUY HINDZINC\n750 XX ABOVE 33\nSL 30.5 TARGET 36";
        assert!(parser().parse(text, 12).is_none());
    }

    #[test]
    fn malformed_target_list_rejected() {
        // Non-numeric token invalidates the whole list even though the
        // first target alone would parse.
        let text = "BUY HINDZINC\n750 CE ABOVE 33\nSL 30.5 TARGET 36 soon";
        assert!(parser().parse(text, 13).is_none());
    }

    #[test]
    fn negative_prices_rejected() {
        let text = "BUY HINDZINC\n750 CE ABOVE -33\nSL 30.5 TARGET 36";
        assert!(parser().parse(text, 14).is_none());
    }

    #[test]
    fn header_must_be_full_line_match() {
        let text = "PLEASE BUY HINDZINC\n750 CE ABOVE 33\nSL 30.5 TARGET 36";
        assert!(parser().parse(text, 15).is_none());
    }

    // =========================================================================
    // Pre-filter
    // =========================================================================

    #[test]
    fn prefilter_accepts_entry_shape() {
        assert!(parser().is_entry_signal(HINDZINC));
        // Broken risk line is invisible to the pre-filter by design
        assert!(parser().is_entry_signal("BUY HINDZINC\n750 CE ABOVE 33\nSL oops"));
    }

    #[test]
    fn prefilter_rejects_non_entries() {
        let p = parser();
        assert!(!p.is_entry_signal("SL 35"));
        assert!(!p.is_entry_signal("BUY HINDZINC"));
        assert!(!p.is_entry_signal("BOOK OR TRAIL\nwhatever"));
    }
}
