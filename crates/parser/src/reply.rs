//! Reply grammar.
//!
//! Replies are matched against an ordered cascade of rules; the first rule
//! that fires wins. Order is load-bearing: later rules are written assuming
//! the earlier, more specific ones have already had their chance, and the
//! lone-SL / lone-target rules carry exclusion guards so combined
//! "SL … TARGET …" messages fall through to the combined rule.

use anyhow::Result;
use regex::Regex;
use rust_decimal::Decimal;
use signal_relay_core::ReplyAction;
use std::str::FromStr;

/// Longest text that rule 10 (bare leading price) will still consider a
/// terse profit confirmation like "36.4".
const BARE_PRICE_MAX_LEN: usize = 20;

/// Parses reply messages into tagged [`ReplyAction`]s.
pub struct ReplyParser {
    /// Optional leading price, then "BOOK OR TRAIL".
    book_profit: Regex,
    /// `BUY AT CMP <price>, SL <sl>` — comma optional.
    revised: Regex,
    /// Leading `[TRAIL|UPDATE|NEW] SL [TO] <value>`, trailing text allowed.
    lone_sl: Regex,
    /// Leading `[UPDATE|NEW] TARGET|TGT [TO] <value>`, trailing text allowed.
    lone_target: Regex,
    /// `SL <value> … TARGET|TGT <value>` anywhere, SL first.
    combined: Regex,
    /// Bare number at the start of a short text.
    leading_price: Regex,
}

impl ReplyParser {
    /// Compiles the cascade patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            book_profit: Regex::new(r"^(?:(\d+(?:\.\d+)?)\s+)?BOOK\s+OR\s+TRAIL")?,
            revised: Regex::new(r"BUY\s+AT\s+CMP\s+(\d+(?:\.\d+)?)\s*,?\s*SL\s+(\d+(?:\.\d+)?)")?,
            lone_sl: Regex::new(r"^(?:(?:TRAIL|UPDATE|NEW)\s+)?SL\s+(?:TO\s+)?(\d+(?:\.\d+)?)")?,
            lone_target: Regex::new(
                r"^(?:(?:UPDATE|NEW)\s+)?(?:TARGET|TGT)\s+(?:TO\s+)?(\d+(?:\.\d+)?)",
            )?,
            combined: Regex::new(r"SL\s+(\d+(?:\.\d+)?)\s.*?(?:TARGET|TGT)\s+(\d+(?:\.\d+)?)")?,
            leading_price: Regex::new(r"^(\d+(?:\.\d+)?)")?,
        })
    }

    /// Runs the cascade over the trimmed, uppercased text.
    ///
    /// Returns `None` when no rule matches; the caller logs and takes no
    /// action on unrecognized replies.
    #[must_use]
    pub fn parse(&self, raw_text: &str) -> Option<ReplyAction> {
        let text = raw_text.trim().to_uppercase();
        if text.is_empty() {
            return None;
        }

        self.book_or_trail(&text)
            .or_else(|| Self::exit_at_cost(&text))
            .or_else(|| Self::wait(&text))
            .or_else(|| Self::follow(&text))
            .or_else(|| Self::stop_hit(&text))
            .or_else(|| self.revised_entry(&text))
            .or_else(|| self.lone_sl_update(&text))
            .or_else(|| self.lone_target_update(&text))
            .or_else(|| self.combined_update(&text))
            .or_else(|| self.bare_price(&text))
    }

    // Rule 1
    fn book_or_trail(&self, text: &str) -> Option<ReplyAction> {
        let caps = self.book_profit.captures(text)?;
        let price = caps.get(1).and_then(|m| Decimal::from_str(m.as_str()).ok());
        Some(ReplyAction::BookProfit { price })
    }

    // Rule 2
    fn exit_at_cost(text: &str) -> Option<ReplyAction> {
        const PHRASES: [&str; 3] = ["CLOSE NEAR COST", "CLOSE AT COST", "EXIT NEAR COST"];
        PHRASES
            .iter()
            .any(|p| text.contains(p))
            .then_some(ReplyAction::ExitCost)
    }

    // Rule 3
    fn wait(text: &str) -> Option<ReplyAction> {
        (text.contains("WAIT TO ACTIVATE") || text == "WAIT").then_some(ReplyAction::Wait)
    }

    // Rule 4
    fn follow(text: &str) -> Option<ReplyAction> {
        (text.contains("FOLLOW IT") || text == "FOLLOW").then_some(ReplyAction::Follow)
    }

    // Rule 5
    fn stop_hit(text: &str) -> Option<ReplyAction> {
        matches!(text, "SL" | "SL HIT" | "STOP LOSS" | "STOPLOSS").then_some(ReplyAction::SlHit)
    }

    // Rule 6
    fn revised_entry(&self, text: &str) -> Option<ReplyAction> {
        let caps = self.revised.captures(text)?;
        let price = Decimal::from_str(&caps[1]).ok()?;
        let new_sl = Decimal::from_str(&caps[2]).ok()?;
        Some(ReplyAction::RevisedEntry { price, new_sl })
    }

    // Rule 7 — guarded so combined messages fall through to rule 9
    fn lone_sl_update(&self, text: &str) -> Option<ReplyAction> {
        if text.contains("TARGET") || text.contains("TGT") {
            return None;
        }
        let caps = self.lone_sl.captures(text)?;
        let new_sl = Decimal::from_str(&caps[1]).ok()?;
        Some(ReplyAction::UpdateSl { new_sl })
    }

    // Rule 8 — "TARGET HIT/DONE" style confirmations are not updates
    fn lone_target_update(&self, text: &str) -> Option<ReplyAction> {
        const EXCLUDED: [&str; 3] = ["HIT", "DONE", "BOOK"];
        if EXCLUDED.iter().any(|w| text.contains(w)) {
            return None;
        }
        let caps = self.lone_target.captures(text)?;
        let new_target = Decimal::from_str(&caps[1]).ok()?;
        Some(ReplyAction::UpdateTarget { new_target })
    }

    // Rule 9
    fn combined_update(&self, text: &str) -> Option<ReplyAction> {
        let caps = self.combined.captures(text)?;
        let new_sl = Decimal::from_str(&caps[1]).ok()?;
        let new_target = Decimal::from_str(&caps[2]).ok()?;
        Some(ReplyAction::UpdateSlTarget { new_sl, new_target })
    }

    // Rule 10
    fn bare_price(&self, text: &str) -> Option<ReplyAction> {
        if text.len() >= BARE_PRICE_MAX_LEN {
            return None;
        }
        let caps = self.leading_price.captures(text)?;
        let price = Decimal::from_str(&caps[1]).ok()?;
        Some(ReplyAction::BookProfit { price: Some(price) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn parser() -> ReplyParser {
        ReplyParser::new().unwrap()
    }

    // =========================================================================
    // Rule 1: book or trail
    // =========================================================================

    #[test]
    fn book_or_trail_without_price() {
        assert_eq!(
            parser().parse("Book or trail"),
            Some(ReplyAction::BookProfit { price: None })
        );
    }

    #[test]
    fn book_or_trail_with_leading_price() {
        assert_eq!(
            parser().parse("42.5 book or trail as you wish"),
            Some(ReplyAction::BookProfit {
                price: Some(dec!(42.5))
            })
        );
    }

    // =========================================================================
    // Rules 2-5: phrase containment and exact matches
    // =========================================================================

    #[test]
    fn exit_cost_phrases() {
        let p = parser();
        assert_eq!(p.parse("please close near cost"), Some(ReplyAction::ExitCost));
        assert_eq!(p.parse("CLOSE AT COST"), Some(ReplyAction::ExitCost));
        assert_eq!(p.parse("exit near cost today"), Some(ReplyAction::ExitCost));
    }

    #[test]
    fn wait_to_activate() {
        let p = parser();
        assert_eq!(p.parse("WAIT TO ACTIVATE"), Some(ReplyAction::Wait));
        assert_eq!(p.parse("wait"), Some(ReplyAction::Wait));
        // "wait" must be exact when the long phrase is absent
        assert_eq!(p.parse("wait here please"), None);
    }

    #[test]
    fn follow_it() {
        let p = parser();
        assert_eq!(p.parse("follow it"), Some(ReplyAction::Follow));
        assert_eq!(p.parse("FOLLOW"), Some(ReplyAction::Follow));
    }

    #[test]
    fn stop_loss_hit_exact_texts() {
        let p = parser();
        assert_eq!(p.parse("SL"), Some(ReplyAction::SlHit));
        assert_eq!(p.parse("sl hit"), Some(ReplyAction::SlHit));
        assert_eq!(p.parse("STOP LOSS"), Some(ReplyAction::SlHit));
        assert_eq!(p.parse("StopLoss"), Some(ReplyAction::SlHit));
    }

    // =========================================================================
    // Rule 6: revised entry
    // =========================================================================

    #[test]
    fn revised_entry_with_comma() {
        assert_eq!(
            parser().parse("buy at cmp 28.5, SL 24"),
            Some(ReplyAction::RevisedEntry {
                price: dec!(28.5),
                new_sl: dec!(24)
            })
        );
    }

    #[test]
    fn revised_entry_without_comma() {
        assert_eq!(
            parser().parse("BUY AT CMP 28.5 SL 24"),
            Some(ReplyAction::RevisedEntry {
                price: dec!(28.5),
                new_sl: dec!(24)
            })
        );
    }

    // =========================================================================
    // Rules 7-9: SL / target updates
    // =========================================================================

    #[test]
    fn lone_sl_update() {
        let p = parser();
        assert_eq!(
            p.parse("SL 35"),
            Some(ReplyAction::UpdateSl { new_sl: dec!(35) })
        );
        assert_eq!(
            p.parse("trail sl to 40.5"),
            Some(ReplyAction::UpdateSl {
                new_sl: dec!(40.5)
            })
        );
        assert_eq!(
            p.parse("update SL 38"),
            Some(ReplyAction::UpdateSl { new_sl: dec!(38) })
        );
    }

    #[test]
    fn sl_update_tolerates_trailing_chatter() {
        let p = parser();
        assert_eq!(
            p.parse("SL 40 now"),
            Some(ReplyAction::UpdateSl { new_sl: dec!(40) })
        );
        assert_eq!(
            p.parse("trail SL to 40 please"),
            Some(ReplyAction::UpdateSl { new_sl: dec!(40) })
        );
    }

    #[test]
    fn lone_target_update() {
        let p = parser();
        assert_eq!(
            p.parse("TARGET 45"),
            Some(ReplyAction::UpdateTarget {
                new_target: dec!(45)
            })
        );
        assert_eq!(
            p.parse("new tgt 50"),
            Some(ReplyAction::UpdateTarget {
                new_target: dec!(50)
            })
        );
    }

    #[test]
    fn target_hit_confirmation_is_not_an_update() {
        // HIT/DONE/BOOK exclusion on rule 8
        assert_eq!(parser().parse("TARGET 45 HIT"), None);
        assert_eq!(parser().parse("target done"), None);
    }

    #[test]
    fn combined_sl_and_target() {
        // The rule 7/8 guards step aside here so the combined rule fires
        assert_eq!(
            parser().parse("SL 35 TARGET 45"),
            Some(ReplyAction::UpdateSlTarget {
                new_sl: dec!(35),
                new_target: dec!(45)
            })
        );
        assert_eq!(
            parser().parse("sl 35 now tgt 45"),
            Some(ReplyAction::UpdateSlTarget {
                new_sl: dec!(35),
                new_target: dec!(45)
            })
        );
    }

    #[test]
    fn reversed_combined_order_updates_target_only() {
        // The combined rule matches SL-first only; target-first phrasing is
        // consumed by the lone-target rule and the trailing SL is dropped.
        assert_eq!(
            parser().parse("TARGET 45 SL 35"),
            Some(ReplyAction::UpdateTarget {
                new_target: dec!(45)
            })
        );
    }

    // =========================================================================
    // Rule 10: terse price confirmation
    // =========================================================================

    #[test]
    fn short_leading_number_books_profit() {
        assert_eq!(
            parser().parse("36.4"),
            Some(ReplyAction::BookProfit {
                price: Some(dec!(36.4))
            })
        );
        assert_eq!(
            parser().parse("36.4 done"),
            Some(ReplyAction::BookProfit {
                price: Some(dec!(36.4))
            })
        );
    }

    #[test]
    fn long_number_bearing_text_is_unrecognized() {
        let text = "36.4 was the high of the day on this one";
        assert!(text.len() >= 20);
        assert_eq!(parser().parse(text), None);
    }

    // =========================================================================
    // Cascade ordering
    // =========================================================================

    #[test]
    fn book_or_trail_wins_over_bare_price() {
        // Rule 1 must consume this before rule 10 sees the leading number
        assert_eq!(
            parser().parse("40 book or trail"),
            Some(ReplyAction::BookProfit {
                price: Some(dec!(40))
            })
        );
    }

    #[test]
    fn exact_sl_wins_over_sl_update_shapes() {
        // "SL" alone is a stop-hit notification, not an update
        assert_eq!(parser().parse("SL"), Some(ReplyAction::SlHit));
    }

    #[test]
    fn unrecognized_chatter_returns_none() {
        let p = parser();
        assert_eq!(p.parse(""), None);
        assert_eq!(p.parse("   "), None);
        assert_eq!(p.parse("great call sir, thank you so much!"), None);
    }
}
