//! Gas fee display values

use crate::types::{GasEstimation, TransactionInfo};

/// Decimals of the native asset on EVM chains.
pub const ETH_DECIMALS: u32 = 18;

/// Fee choices shown on the confirmation screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasFeeDisplay {
    /// Slow, average and fast max priority fee, `"0"` when unknown.
    pub suggested_max_priority_fee_choices: [String; 3],
    pub base_fee_per_gas: String,
}

impl GasFeeDisplay {
    pub fn new(estimates: Option<&GasEstimation>) -> Self {
        fn or_zero(value: Option<&String>) -> String {
            match value {
                Some(v) if !v.is_empty() => v.clone(),
                _ => "0".to_string(),
            }
        }

        let pick = |f: fn(&GasEstimation) -> Option<&String>| or_zero(estimates.and_then(f));
        Self {
            suggested_max_priority_fee_choices: [
                pick(|e| e.slow_max_priority_fee_per_gas.as_ref()),
                pick(|e| e.avg_max_priority_fee_per_gas.as_ref()),
                pick(|e| e.fast_max_priority_fee_per_gas.as_ref()),
            ],
            base_fee_per_gas: pick(|e| e.base_fee_per_gas.as_ref()),
        }
    }
}

/// Parse a hex (`0x`-prefixed) or decimal quantity.
pub fn parse_quantity(value: &str) -> Option<u128> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some("") => Some(0),
        Some(hex) => u128::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

/// Gas limit times gas price, in wei. `None` if either is unparseable or
/// the product overflows.
pub fn gas_fee_wei(gas_limit: &str, gas_price: &str) -> Option<u128> {
    parse_quantity(gas_limit)?.checked_mul(parse_quantity(gas_price)?)
}

/// Format a base-unit amount in whole units, trimming trailing zeros.
///
/// `format_units(420_000_000_000_000, 18) == "0.00042"`
pub fn format_units(amount: u128, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let digits = amount.to_string();
    let decimals = decimals as usize;
    let (whole, fraction) = if digits.len() > decimals {
        let (w, f) = digits.split_at(digits.len() - decimals);
        (w.to_string(), f.to_string())
    } else {
        ("0".to_string(), format!("{digits:0>decimals$}"))
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Network fee of a transaction in whole units, or an empty string while
/// the fee cannot be computed.
pub fn transaction_fee(tx: &TransactionInfo, decimals: u32) -> String {
    gas_fee_wei(&tx.gas_limit, &tx.gas_price)
        .map(|wei| format_units(wei, decimals))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_estimates_default_to_zero() {
        let display = GasFeeDisplay::new(None);
        assert_eq!(display.suggested_max_priority_fee_choices, ["0", "0", "0"]);
        assert_eq!(display.base_fee_per_gas, "0");

        let partial = GasEstimation {
            avg_max_priority_fee_per_gas: Some("0x3b9aca00".into()),
            fast_max_priority_fee_per_gas: Some(String::new()),
            ..Default::default()
        };
        let display = GasFeeDisplay::new(Some(&partial));
        assert_eq!(
            display.suggested_max_priority_fee_choices,
            ["0", "0x3b9aca00", "0"]
        );
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x5208"), Some(21_000));
        assert_eq!(parse_quantity("21000"), Some(21_000));
        assert_eq!(parse_quantity("0x"), Some(0));
        assert_eq!(parse_quantity("0xzz"), None);
        assert_eq!(parse_quantity(""), None);
    }

    #[test]
    fn test_fee_is_limit_times_price() {
        // 21000 gas at 20 gwei
        assert_eq!(gas_fee_wei("0x5208", "20000000000"), Some(420_000_000_000_000));
        assert_eq!(gas_fee_wei("bad", "1"), None);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(420_000_000_000_000, 18), "0.00042");
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(2_000_000, 6), "2");
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(7, 0), "7");
    }

    #[test]
    fn test_transaction_fee() {
        let tx = TransactionInfo {
            gas_limit: "0x5208".into(),
            gas_price: "0x4a817c800".into(),
            ..Default::default()
        };
        assert_eq!(transaction_fee(&tx, ETH_DECIMALS), "0.00042");
        assert_eq!(transaction_fee(&TransactionInfo::default(), ETH_DECIMALS), "");
    }
}
