//! # Invoice Numbers
//!
//! Formatting for shop-scoped sequential invoice numbers.
//!
//! ## Format
//! `INV-NNNNNN` - zero-padded to 6 digits, e.g. `INV-000042`.
//!
//! The sequence itself is allocated by the database layer from an atomic
//! per-shop counter row, inside the same transaction that inserts the sale.
//! That makes invoice numbers unique and strictly increasing per shop even
//! under concurrent requests.

/// Prefix for all invoice numbers.
pub const INVOICE_PREFIX: &str = "INV-";

/// Formats a counter value as an invoice number.
///
/// ## Example
/// ```rust
/// use khata_core::invoice::format_invoice_number;
///
/// assert_eq!(format_invoice_number(42), "INV-000042");
/// ```
pub fn format_invoice_number(seq: i64) -> String {
    format!("{}{:06}", INVOICE_PREFIX, seq)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_six_digits() {
        assert_eq!(format_invoice_number(1), "INV-000001");
        assert_eq!(format_invoice_number(999999), "INV-999999");
        // Wider sequences are not truncated
        assert_eq!(format_invoice_number(1234567), "INV-1234567");
    }
}
