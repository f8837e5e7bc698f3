/// Tolerance used when comparing currency amounts
pub const CENT_TOLERANCE: f64 = 0.01;

/// Round an amount to whole cents, halves away from zero
pub fn round_cents(amount: f64) -> f64 {
    let rounded = (amount * 100.0).round() / 100.0;
    // Avoid printing "-0.00"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Whether two amounts are equal within a cent
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= CENT_TOLERANCE + 1e-9
}

/// Format an amount with two decimals and a currency suffix
pub fn format_amount(amount: f64, decimal_separator: char, currency: &str) -> String {
    let formatted = format!("{:.2}", round_cents(amount));
    let formatted = if decimal_separator == '.' {
        formatted
    } else {
        formatted.replace('.', &decimal_separator.to_string())
    };

    if currency.is_empty() {
        formatted
    } else {
        format!("{} {}", formatted, currency)
    }
}

/// Check that a number can be used as an amount, rate or hour count
pub fn is_valid_quantity(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(10.006), 10.01);
        assert_eq!(round_cents(10.004), 10.0);
        assert_eq!(round_cents(-2.678), -2.68);
        assert_eq!(round_cents(-0.001), 0.0);
        assert!(round_cents(-0.001).is_sign_positive());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1234.5, '.', "EUR"), "1234.50 EUR");
        assert_eq!(format_amount(1234.5, ',', "€"), "1234,50 €");
        assert_eq!(format_amount(0.0, ',', ""), "0,00");
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(100.0, 100.01));
        assert!(approx_eq(0.1 + 0.2, 0.3));
        assert!(!approx_eq(100.0, 100.02));
    }
}
