//! # Stock Delta Math
//!
//! Pure diffing logic behind sale updates.
//!
//! ## The Problem
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Editing a Sale                                      │
//! │                                                                         │
//! │  Old sale:  Rice × 3,  Sugar × 2                                        │
//! │  New sale:  Rice × 5,  Tea × 1                                          │
//! │                                                                         │
//! │  Inventory must change by exactly:                                      │
//! │    Rice  : take 2 more from stock   (3 → 5)                             │
//! │    Sugar : restore 2 to stock       (removed)                           │
//! │    Tea   : take 1 from stock        (added)                             │
//! │                                                                         │
//! │  Anything else leaks or double-counts stock.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database layer applies these deltas inside a transaction; this module
//! only computes them, so the reconciliation rule is testable without a
//! database.

use std::collections::BTreeMap;

/// Net inventory change for one product when a sale is edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDelta {
    pub product_id: String,

    /// Additional units to take from stock.
    /// Positive: quantity grew (or the item is new) - decrement stock.
    /// Negative: quantity shrank (or the item was removed) - restore stock.
    pub take: i64,
}

/// Computes per-product stock deltas between the old and new line items of a
/// sale.
///
/// Input pairs are `(product_id, quantity)`. Quantities for repeated product
/// IDs are summed, so callers don't have to pre-merge duplicate lines.
/// Products whose net quantity is unchanged are omitted from the result.
///
/// ## Properties (tested below)
/// - Per product: `take = new_qty - old_qty`.
/// - When old == new, the result is empty.
/// - Sum of all takes == total new quantity - total old quantity.
pub fn stock_deltas(
    old_items: &[(String, i64)],
    new_items: &[(String, i64)],
) -> Vec<StockDelta> {
    // BTreeMap keeps the output deterministic, which keeps the guarded
    // UPDATE order stable across transactions.
    let mut net: BTreeMap<&str, i64> = BTreeMap::new();

    for (product_id, qty) in new_items {
        *net.entry(product_id.as_str()).or_insert(0) += qty;
    }
    for (product_id, qty) in old_items {
        *net.entry(product_id.as_str()).or_insert(0) -= qty;
    }

    net.into_iter()
        .filter(|(_, take)| *take != 0)
        .map(|(product_id, take)| StockDelta {
            product_id: product_id.to_string(),
            take,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn items(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
        pairs.iter().map(|(id, q)| (id.to_string(), *q)).collect()
    }

    #[test]
    fn test_unchanged_sale_produces_no_deltas() {
        let old = items(&[("rice", 3), ("sugar", 2)]);
        let deltas = stock_deltas(&old, &old);
        assert!(deltas.is_empty());
    }

    #[test]
    fn test_mixed_edit() {
        let old = items(&[("rice", 3), ("sugar", 2)]);
        let new = items(&[("rice", 5), ("tea", 1)]);

        let deltas = stock_deltas(&old, &new);
        assert_eq!(
            deltas,
            vec![
                StockDelta { product_id: "rice".to_string(), take: 2 },
                StockDelta { product_id: "sugar".to_string(), take: -2 },
                StockDelta { product_id: "tea".to_string(), take: 1 },
            ]
        );
    }

    #[test]
    fn test_duplicate_lines_are_merged() {
        let old = items(&[("rice", 1), ("rice", 2)]);
        let new = items(&[("rice", 3)]);
        assert!(stock_deltas(&old, &new).is_empty());
    }

    #[test]
    fn test_delta_sum_reconciles() {
        let old = items(&[("a", 4), ("b", 1), ("c", 7)]);
        let new = items(&[("a", 2), ("c", 7), ("d", 3)]);

        let deltas = stock_deltas(&old, &new);
        let take_sum: i64 = deltas.iter().map(|d| d.take).sum();
        let old_sum: i64 = old.iter().map(|(_, q)| q).sum();
        let new_sum: i64 = new.iter().map(|(_, q)| q).sum();

        assert_eq!(take_sum, new_sum - old_sum);
    }

    #[test]
    fn test_deleting_a_sale_restores_everything() {
        // delete == diff against an empty new item list
        let old = items(&[("rice", 3), ("sugar", 2)]);
        let deltas = stock_deltas(&old, &[]);

        assert_eq!(
            deltas,
            vec![
                StockDelta { product_id: "rice".to_string(), take: -3 },
                StockDelta { product_id: "sugar".to_string(), take: -2 },
            ]
        );
    }
}
