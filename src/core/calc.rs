//! Line and invoice amount arithmetic.
//!
//! Everything here is exact decimal arithmetic at full precision. Rounding
//! happens only when a value is formatted for output (see [`super::format`]),
//! so the PDF, the XML and the QR payload all round the same unrounded sums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::InvoiceLine;

/// Derived amounts of a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// quantity × unit price
    pub net: Decimal,
    /// net × VAT rate
    pub vat: Decimal,
    /// net + VAT
    pub gross: Decimal,
}

/// Invoice-level aggregates over a line set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceAmounts {
    /// Σ net
    pub subtotal: Decimal,
    /// Σ VAT
    pub total_vat: Decimal,
    /// subtotal + total VAT
    pub grand_total: Decimal,
}

impl InvoiceAmounts {
    /// Add one line's amounts, `None` on overflow.
    pub fn checked_add_line(&self, line: &LineAmounts) -> Option<Self> {
        let subtotal = self.subtotal.checked_add(line.net)?;
        let total_vat = self.total_vat.checked_add(line.vat)?;
        Some(Self {
            subtotal,
            total_vat,
            grand_total: subtotal.checked_add(total_vat)?,
        })
    }
}

/// # Panics
///
/// On decimal overflow. Lines held by an [`Invoice`](super::Invoice) are
/// validated against [`checked_line_amounts`] and never overflow.
pub fn line_amounts(line: &InvoiceLine) -> LineAmounts {
    let net = line.quantity * line.unit_price;
    let vat = net * line.vat_rate;
    LineAmounts {
        net,
        vat,
        gross: net + vat,
    }
}

/// [`line_amounts`], `None` when a product or sum overflows.
pub fn checked_line_amounts(line: &InvoiceLine) -> Option<LineAmounts> {
    let net = line.quantity.checked_mul(line.unit_price)?;
    let vat = net.checked_mul(line.vat_rate)?;
    Some(LineAmounts {
        net,
        vat,
        gross: net.checked_add(vat)?,
    })
}

/// [`invoice_amounts`], `None` on overflow.
pub fn checked_invoice_amounts(lines: &[InvoiceLine]) -> Option<InvoiceAmounts> {
    lines.iter().try_fold(InvoiceAmounts::default(), |acc, line| {
        acc.checked_add_line(&checked_line_amounts(line)?)
    })
}

/// Roll up a line set. An empty set yields all zeros.
///
/// Panics on overflow like [`line_amounts`].
pub fn invoice_amounts(lines: &[InvoiceLine]) -> InvoiceAmounts {
    let (subtotal, total_vat) = lines
        .iter()
        .map(line_amounts)
        .fold((Decimal::ZERO, Decimal::ZERO), |(net, vat), l| {
            (net + l.net, vat + l.vat)
        });
    InvoiceAmounts {
        subtotal,
        total_vat,
        grand_total: subtotal + total_vat,
    }
}

/// Per-line amounts paired with their 1-based position.
pub fn numbered_lines(lines: &[InvoiceLine]) -> impl Iterator<Item = (usize, &InvoiceLine, LineAmounts)> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line, line_amounts(line)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(qty: Decimal, price: Decimal, rate: Decimal) -> InvoiceLine {
        InvoiceLine::new("item", qty, price).vat_rate(rate)
    }

    #[test]
    fn single_line_amounts() {
        let a = line_amounts(&line(dec!(3), dec!(99.99), dec!(0.05)));
        assert_eq!(a.net, dec!(299.97));
        assert_eq!(a.vat, dec!(14.9985));
        assert_eq!(a.gross, dec!(314.9685));
    }

    #[test]
    fn aggregates_keep_full_precision() {
        let lines = vec![
            line(dec!(1), dec!(0.333), dec!(0.05)),
            line(dec!(1), dec!(0.333), dec!(0.05)),
        ];
        let totals = invoice_amounts(&lines);
        assert_eq!(totals.subtotal, dec!(0.666));
        assert_eq!(totals.total_vat, dec!(0.0333));
        assert_eq!(totals.grand_total, dec!(0.6993));
    }

    #[test]
    fn empty_lines_are_zero() {
        let totals = invoice_amounts(&[]);
        assert_eq!(totals, InvoiceAmounts::default());
        assert!(totals.grand_total.is_zero());
    }

    #[test]
    fn zero_rated_line() {
        let a = line_amounts(&line(dec!(2), dec!(50), dec!(0)));
        assert_eq!(a.vat, dec!(0));
        assert_eq!(a.gross, dec!(100));
    }

    #[test]
    fn checked_matches_unchecked() {
        let lines = vec![
            line(dec!(3), dec!(99.99), dec!(0.05)),
            line(dec!(1), dec!(0.333), dec!(0)),
        ];
        assert_eq!(checked_invoice_amounts(&lines), Some(invoice_amounts(&lines)));
        assert_eq!(checked_line_amounts(&lines[0]), Some(line_amounts(&lines[0])));
    }

    #[test]
    fn checked_reports_overflow() {
        assert_eq!(checked_line_amounts(&line(Decimal::MAX, dec!(2), dec!(0))), None);
        let half = line(dec!(1), Decimal::MAX / dec!(2) + dec!(1), dec!(0));
        assert!(checked_line_amounts(&half).is_some());
        assert_eq!(checked_invoice_amounts(&[half.clone(), half]), None);
    }

    #[test]
    fn numbering_starts_at_one() {
        let lines = vec![line(dec!(1), dec!(1), dec!(0)), line(dec!(2), dec!(1), dec!(0))];
        let numbers: Vec<usize> = numbered_lines(&lines).map(|(n, _, _)| n).collect();
        assert_eq!(numbers, [1, 2]);
    }
}
