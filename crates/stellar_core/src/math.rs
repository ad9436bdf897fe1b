//! Fixed-point math utilities for deterministic accrual.
//!
//! Resource amounts, production rates and cost multipliers all use
//! fixed-point arithmetic so that two servers reading the same stored
//! state at the same instant compute bit-identical results.

use fixed::types::{I32F32, I48F16, I64F64};

/// Fixed-point number type for resource amounts and rates.
///
/// 48 integer bits leave room for late-game stockpiles, 16 fractional
/// bits keep per-second accrual from truncating to zero.
pub type Amount = I48F16;

/// Fixed-point number type for multipliers (growth factors, percentages).
pub type Ratio = I32F32;

/// Intermediate precision for products of amounts and ratios.
type Wide = I64F64;

/// Seconds in one hour; production rates are expressed per hour.
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Serde support for [`Amount`].
///
/// Serializes amounts as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod amount_serde {
    use super::Amount;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize an amount as its raw bit representation.
    pub fn serialize<S>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize an amount from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Amount::from_bits(bits))
    }
}

/// Serde support for [`Ratio`].
pub mod ratio_serde {
    use super::Ratio;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a ratio as its raw bit representation.
    pub fn serialize<S>(value: &Ratio, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a ratio from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Ratio, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Ratio::from_bits(bits))
    }
}

/// Multiply an amount by a ratio, saturating instead of overflowing.
#[must_use]
pub fn scale(amount: Amount, ratio: Ratio) -> Amount {
    let product = Wide::from_num(amount).saturating_mul(Wide::from_num(ratio));
    Amount::saturating_from_num(product)
}

/// Amount accrued at `per_hour` over `seconds`.
#[must_use]
pub fn per_hour_over(per_hour: Amount, seconds: u64) -> Amount {
    let total = Wide::from_num(per_hour).saturating_mul(Wide::from_num(seconds));
    Amount::saturating_from_num(total / Wide::from_num(SECONDS_PER_HOUR))
}

/// `amount * numerator / denominator`, computed at wide precision.
///
/// Exact whenever the true result is representable. Saturates on overflow;
/// a zero denominator yields zero.
#[must_use]
pub fn mul_div(amount: Amount, numerator: u64, denominator: u64) -> Amount {
    if denominator == 0 {
        return Amount::ZERO;
    }
    let product = Wide::from_num(amount).saturating_mul(Wide::from_num(numerator));
    Amount::saturating_from_num(product / Wide::from_num(denominator))
}

/// `amount * (percent / 100)^times`, one multiplication per step.
///
/// Stepping with an integer multiply followed by a division keeps every
/// whole-number result exact (`900 * 1.8^2` is 2916, not 2915.99...), which
/// matters because costs and rates are floored afterwards.
#[must_use]
pub fn compound(amount: Amount, percent: u32, times: u32) -> Amount {
    if percent == 100 {
        return amount;
    }
    let ceiling = Wide::from_num(Amount::MAX);
    let mut value = Wide::from_num(amount);
    for _ in 0..times {
        if value >= ceiling || value == Wide::ZERO {
            break;
        }
        value = value.saturating_mul(Wide::from_num(percent)) / 100;
    }
    Amount::saturating_from_num(value)
}

/// Raise a ratio to an integer power by repeated squaring.
///
/// Saturates at [`Ratio::MAX`] for very large results.
#[must_use]
pub fn pow(base: Ratio, mut exp: u32) -> Ratio {
    let mut result = Ratio::ONE;
    let mut factor = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.saturating_mul(factor);
        }
        exp >>= 1;
        if exp > 0 {
            factor = factor.saturating_mul(factor);
        }
    }
    result
}

/// Number of Taylor series terms used for the fractional part of [`exp`].
const EXP_TERMS: u32 = 16;

/// Natural exponential of a non-negative ratio.
///
/// Splits `x` into integer and fractional parts: `e^n` via [`pow`],
/// `e^frac` via a Taylor series that converges quickly on `[0, 1)`.
#[must_use]
pub fn exp(x: Ratio) -> Ratio {
    if x <= Ratio::ZERO {
        return Ratio::ONE;
    }
    let whole = x.floor();
    let frac = x - whole;

    let mut term = Ratio::ONE;
    let mut sum = Ratio::ONE;
    for n in 1..=EXP_TERMS {
        term = term * frac / Ratio::from_num(n);
        if term == Ratio::ZERO {
            break;
        }
        sum += term;
    }

    pow(Ratio::E, whole.to_num::<u32>()).saturating_mul(sum)
}

/// Format an amount the way the game client displays long numbers:
/// floored to whole units, thousands separated by `.`.
///
/// ```
/// use stellar_core::math::{format_long, Amount};
///
/// assert_eq!(format_long(Amount::from_num(1_234_567)), "1.234.567");
/// assert_eq!(format_long(Amount::from_num(440)), "440");
/// ```
#[must_use]
pub fn format_long(amount: Amount) -> String {
    let whole = amount.floor().to_num::<i64>();
    let digits = whole.unsigned_abs().to_string();

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pow_exact_for_binary_fractions() {
        let half_again = Ratio::from_num(1.5);
        assert_eq!(pow(half_again, 0), Ratio::ONE);
        assert_eq!(pow(half_again, 1), Ratio::from_num(1.5));
        assert_eq!(pow(half_again, 2), Ratio::from_num(2.25));
        assert_eq!(pow(Ratio::from_num(2), 10), Ratio::from_num(1024));
    }

    #[test]
    fn test_pow_saturates() {
        assert_eq!(pow(Ratio::from_num(2), 40), Ratio::MAX);
    }

    #[test]
    fn test_pow_one_point_one() {
        let value = pow(Ratio::from_num(11) / 10, 10).to_num::<f64>();
        assert!((value - 2.593_742).abs() < 1e-4, "1.1^10 was {value}");
    }

    #[test]
    fn test_exp_matches_reference_values() {
        assert_eq!(exp(Ratio::ZERO), Ratio::ONE);
        let e1 = exp(Ratio::ONE).to_num::<f64>();
        assert!((e1 - std::f64::consts::E).abs() < 1e-6);

        // Storage formula argument for level 5: 20 * 5 / 33
        let x = Ratio::from_num(100) / Ratio::from_num(33);
        let value = exp(x).to_num::<f64>();
        assert!((value - 20.7035).abs() < 1e-3, "e^(100/33) was {value}");
    }

    #[test]
    fn test_scale_and_accrual() {
        let amount = Amount::from_num(60);
        assert_eq!(scale(amount, Ratio::from_num(1.5)), Amount::from_num(90));

        // 3600 per hour over 10 seconds = 10
        assert_eq!(per_hour_over(Amount::from_num(3600), 10), Amount::from_num(10));
        assert_eq!(per_hour_over(Amount::from_num(30), 0), Amount::ZERO);
    }

    #[test]
    fn test_compound_keeps_whole_results_exact() {
        let base = Amount::from_num(900);
        assert_eq!(compound(base, 180, 1), Amount::from_num(1620));
        assert_eq!(compound(base, 180, 2), Amount::from_num(2916));
        assert_eq!(compound(Amount::from_num(30), 110, 1), Amount::from_num(33));
        assert_eq!(compound(Amount::from_num(60), 100, 50), Amount::from_num(60));
        assert_eq!(compound(Amount::from_num(1), 200, 200), Amount::MAX);
    }

    #[test]
    fn test_mul_div() {
        assert_eq!(mul_div(Amount::from_num(100), 144, 100), Amount::from_num(144));
        assert_eq!(mul_div(Amount::from_num(100), 1, 0), Amount::ZERO);
    }

    #[test]
    fn test_format_long() {
        assert_eq!(format_long(Amount::ZERO), "0");
        assert_eq!(format_long(Amount::from_num(999)), "999");
        assert_eq!(format_long(Amount::from_num(1000)), "1.000");
        assert_eq!(format_long(Amount::from_num(12_345.9)), "12.345");
        assert_eq!(format_long(Amount::from_num(-2500)), "-2.500");
        assert_eq!(format_long(Amount::from_num(1_000_000)), "1.000.000");
    }
}
