use crate::error::{FixtureError, Result};

/// Monetary constants and precision arithmetic
///
/// Amounts travel in base units (integer multiples of an asset's smallest
/// unit). An asset with precision `p` has `10^p` base units per whole unit.
///
/// ## Limits
/// - **Max share supply**: 10^15 base units for any asset, core included
/// - **Max precision**: 12 fractional digits
/// - **Core asset**: `TEST`, precision 5
/// Largest supply any asset may declare, in base units
pub const MAX_SHARE_SUPPLY: u64 = 1_000_000_000_000_000;

/// Largest precision an asset may declare
pub const MAX_PRECISION: u8 = 12;

/// Symbol of the core asset on the local test network
pub const CORE_ASSET_SYMBOL: &str = "TEST";

/// Precision of the core asset
pub const CORE_ASSET_PRECISION: u8 = 5;

/// Base units in one whole unit at the given precision
///
/// Precisions above [`MAX_PRECISION`] are rejected rather than overflowing.
pub fn precision_factor(precision: u8) -> Result<u64> {
    if precision > MAX_PRECISION {
        return Err(FixtureError::InvalidTransaction(format!(
            "precision {precision} exceeds maximum of {MAX_PRECISION}"
        )));
    }
    10u64.checked_pow(u32::from(precision)).ok_or_else(|| {
        FixtureError::InvalidTransaction(format!("precision {precision} is out of range"))
    })
}

/// Maximum supply in whole units for a new asset with this precision.
///
/// The supply shrinks as precision grows so that the base-unit supply stays at
/// [`MAX_SHARE_SUPPLY`] whatever precision is chosen.
///
/// # Examples
/// ```
/// use testnet_fixtures::core::monetary::max_supply_for_precision;
/// assert_eq!(max_supply_for_precision(0).unwrap(), 1_000_000_000_000_000.0);
/// assert_eq!(max_supply_for_precision(3).unwrap(), 1_000_000_000_000.0);
/// assert!(max_supply_for_precision(20).is_err());
/// ```
pub fn max_supply_for_precision(precision: u8) -> Result<f64> {
    let factor = precision_factor(precision)?;
    if precision > 0 {
        Ok(MAX_SHARE_SUPPLY as f64 / factor as f64)
    } else {
        Ok(MAX_SHARE_SUPPLY as f64)
    }
}

/// Utility functions for converting between whole and base units
pub mod conversions {
    use super::*;

    /// Convert a whole-unit amount into base units, rounding to the nearest unit
    ///
    /// # Examples
    /// ```
    /// use testnet_fixtures::core::monetary::conversions::to_base_units;
    /// assert_eq!(to_base_units(1000.0, 3).unwrap(), 1_000_000);
    /// assert_eq!(to_base_units(0.5, 5).unwrap(), 50_000);
    /// ```
    pub fn to_base_units(amount: f64, precision: u8) -> Result<u64> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(FixtureError::InvalidAmount(format!(
                "{amount} is not a non-negative number"
            )));
        }
        let scaled = (amount * precision_factor(precision)? as f64).round();
        if scaled > MAX_SHARE_SUPPLY as f64 {
            return Err(FixtureError::InvalidAmount(format!(
                "{amount} exceeds the maximum share supply at precision {precision}"
            )));
        }
        Ok(scaled as u64)
    }

    /// Convert base units back into whole units
    pub fn from_base_units(amount: u64, precision: u8) -> Result<f64> {
        Ok(amount as f64 / precision_factor(precision)? as f64)
    }

    /// Format base units exactly, without going through floating point
    ///
    /// # Examples
    /// ```
    /// use testnet_fixtures::core::monetary::conversions::format_amount;
    /// assert_eq!(format_amount(1_000_000, 3, "USD").unwrap(), "1000.000 USD");
    /// assert_eq!(format_amount(42, 0, "GOLD").unwrap(), "42 GOLD");
    /// ```
    pub fn format_amount(amount: u64, precision: u8, symbol: &str) -> Result<String> {
        let factor = precision_factor(precision)?;
        if precision == 0 {
            return Ok(format!("{amount} {symbol}"));
        }
        let whole = amount / factor;
        let fraction = amount % factor;
        Ok(format!(
            "{whole}.{fraction:0width$} {symbol}",
            width = usize::from(precision)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::conversions::*;
    use super::*;

    #[test]
    fn test_max_supply_preserves_base_units() {
        for precision in 0..=MAX_PRECISION {
            let whole = max_supply_for_precision(precision).unwrap();
            let base = to_base_units(whole, precision).unwrap();
            assert_eq!(base, MAX_SHARE_SUPPLY, "precision {precision}");
        }
    }

    #[test]
    fn test_max_supply_values() {
        assert_eq!(max_supply_for_precision(0).unwrap(), 1e15);
        assert_eq!(max_supply_for_precision(3).unwrap(), 1e12);
        assert_eq!(max_supply_for_precision(5).unwrap(), 1e10);
    }

    #[test]
    fn test_out_of_range_precision_is_an_error() {
        for precision in [MAX_PRECISION + 1, 19, 20, u8::MAX] {
            assert!(matches!(
                precision_factor(precision),
                Err(FixtureError::InvalidTransaction(_))
            ));
            assert!(max_supply_for_precision(precision).is_err());
            assert!(to_base_units(1.0, precision).is_err());
            assert!(format_amount(1, precision, "BIG").is_err());
        }
        assert_eq!(precision_factor(MAX_PRECISION).unwrap(), 1_000_000_000_000);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(to_base_units(1.0, CORE_ASSET_PRECISION).unwrap(), 100_000);
        assert_eq!(to_base_units(2.5, 1).unwrap(), 25);
        assert_eq!(from_base_units(1_500, 3).unwrap(), 1.5);
        assert!(to_base_units(-1.0, 3).is_err());
        assert!(to_base_units(f64::NAN, 3).is_err());
        assert!(to_base_units(2e15, 0).is_err());
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_amount(100_000, 5, "TEST").unwrap(), "1.00000 TEST");
        assert_eq!(format_amount(5, 3, "USD").unwrap(), "0.005 USD");
        assert_eq!(format_amount(0, 0, "GOLD").unwrap(), "0 GOLD");
    }
}
