//! Decimal arithmetic under a configurable numeric context.
//!
//! All number math funnels through [`MathContext`]: every operation result is
//! rounded to the context's significant-digit precision with its rounding
//! strategy. Power with a fractional exponent is a hybrid: the integer part
//! of the exponent is computed exactly under the context, the fractional
//! remainder is approximated through floating point, and a negative exponent
//! inverts the result at the context precision with half-up rounding.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

use crate::error::EvaluationError;

/// Significant-digit precision plus rounding strategy for decimal math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathContext {
    precision: u32,
    rounding: RoundingStrategy,
}

impl MathContext {
    pub fn new(precision: u32, rounding: RoundingStrategy) -> Self {
        MathContext {
            precision,
            rounding,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn rounding(&self) -> RoundingStrategy {
        self.rounding
    }

    pub fn with_precision(self, precision: u32) -> Self {
        MathContext { precision, ..self }
    }

    pub fn with_rounding(self, rounding: RoundingStrategy) -> Self {
        MathContext { rounding, ..self }
    }

    /// Rounds a raw result to the context precision. Values already within
    /// the precision pass through unchanged; `round_sf` would pad them with
    /// trailing zeros otherwise.
    pub fn apply(&self, value: Decimal) -> Decimal {
        if significant_digits(value) <= self.precision {
            return value;
        }
        value
            .round_sf_with_strategy(self.precision, self.rounding)
            .unwrap_or(value)
    }

    pub fn add(
        &self,
        left: Decimal,
        right: Decimal,
        position: usize,
    ) -> Result<Decimal, EvaluationError> {
        left.checked_add(right)
            .map(|v| self.apply(v))
            .ok_or(EvaluationError::NumberOverflow { position })
    }

    pub fn subtract(
        &self,
        left: Decimal,
        right: Decimal,
        position: usize,
    ) -> Result<Decimal, EvaluationError> {
        left.checked_sub(right)
            .map(|v| self.apply(v))
            .ok_or(EvaluationError::NumberOverflow { position })
    }

    pub fn multiply(
        &self,
        left: Decimal,
        right: Decimal,
        position: usize,
    ) -> Result<Decimal, EvaluationError> {
        left.checked_mul(right)
            .map(|v| self.apply(v))
            .ok_or(EvaluationError::NumberOverflow { position })
    }

    pub fn divide(
        &self,
        left: Decimal,
        right: Decimal,
        position: usize,
    ) -> Result<Decimal, EvaluationError> {
        if right.is_zero() {
            return Err(EvaluationError::DivisionByZero { position });
        }
        left.checked_div(right)
            .map(|v| self.apply(v))
            .ok_or(EvaluationError::NumberOverflow { position })
    }

    pub fn remainder(
        &self,
        left: Decimal,
        right: Decimal,
        position: usize,
    ) -> Result<Decimal, EvaluationError> {
        if right.is_zero() {
            return Err(EvaluationError::DivisionByZero { position });
        }
        left.checked_rem(right)
            .map(|v| self.apply(v))
            .ok_or(EvaluationError::NumberOverflow { position })
    }

    pub fn sqrt(&self, value: Decimal, position: usize) -> Result<Decimal, EvaluationError> {
        value
            .sqrt()
            .map(|v| self.apply(v))
            .ok_or(EvaluationError::InvalidArgument {
                position,
                message: "square root of a negative number".to_string(),
            })
    }

    /// `base ^ exponent` with the hybrid exact/approximate split.
    ///
    /// The exponent is split into sign, integer part `i` and fractional
    /// remainder `r`; `base^i` is computed exactly under the context,
    /// `base^r` through `f64` exponentiation, the two are multiplied, and a
    /// negative exponent yields `1 / result` at the context precision with
    /// half-up rounding.
    pub fn power(
        &self,
        base: Decimal,
        exponent: Decimal,
        position: usize,
    ) -> Result<Decimal, EvaluationError> {
        let negative_exponent = exponent.is_sign_negative();
        let exponent = exponent.abs();
        let remainder = exponent.fract();
        let integer_part = rust_decimal::prelude::ToPrimitive::to_u64(&exponent.trunc())
            .ok_or(EvaluationError::NumberOverflow { position })?;

        let mut result = self.pow_integer(base, integer_part, position)?;

        if !remainder.is_zero() {
            let base_f = decimal_to_f64(base, position)?;
            let remainder_f = decimal_to_f64(remainder, position)?;
            let fractional = base_f.powf(remainder_f);
            if !fractional.is_finite() {
                return Err(EvaluationError::InvalidArgument {
                    position,
                    message: format!(
                        "cannot raise {} to the fractional power {}",
                        base, remainder
                    ),
                });
            }
            let fractional = Decimal::from_f64_retain(fractional)
                .ok_or(EvaluationError::NumberOverflow { position })?;
            result = self.multiply(result, fractional, position)?;
        }

        if negative_exponent {
            if result.is_zero() {
                return Err(EvaluationError::DivisionByZero { position });
            }
            let inverted = Decimal::ONE
                .checked_div(result)
                .ok_or(EvaluationError::NumberOverflow { position })?;
            if significant_digits(inverted) <= self.precision {
                return Ok(inverted);
            }
            Ok(inverted
                .round_sf_with_strategy(self.precision, RoundingStrategy::MidpointAwayFromZero)
                .unwrap_or(inverted))
        } else {
            Ok(result)
        }
    }

    /// Exponentiation by squaring, rounding per the context after every
    /// multiplication.
    fn pow_integer(
        &self,
        base: Decimal,
        mut exponent: u64,
        position: usize,
    ) -> Result<Decimal, EvaluationError> {
        let mut result = Decimal::ONE;
        let mut factor = base;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = self.multiply(result, factor, position)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                factor = self.multiply(factor, factor, position)?;
            }
        }
        Ok(result)
    }
}

impl Default for MathContext {
    /// Matches the widest precision the decimal representation can carry,
    /// rounding half-even.
    fn default() -> Self {
        MathContext::new(28, RoundingStrategy::MidpointNearestEven)
    }
}

fn significant_digits(value: Decimal) -> u32 {
    let mut mantissa = value.normalize().mantissa().unsigned_abs();
    let mut digits = 1;
    while mantissa >= 10 {
        mantissa /= 10;
        digits += 1;
    }
    digits
}

fn decimal_to_f64(value: Decimal, position: usize) -> Result<f64, EvaluationError> {
    rust_decimal::prelude::ToPrimitive::to_f64(&value)
        .ok_or(EvaluationError::NumberOverflow { position })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> MathContext {
        MathContext::default()
    }

    #[test]
    fn test_exact_addition() {
        let a: Decimal = "2.12345".parse().unwrap();
        let b: Decimal = "1.54321".parse().unwrap();
        assert_eq!(ctx().add(a, b, 1).unwrap().to_string(), "3.66666");
    }

    #[test]
    fn test_division_by_zero() {
        let err = ctx().divide(Decimal::ONE, Decimal::ZERO, 3).unwrap_err();
        assert_eq!(err, EvaluationError::DivisionByZero { position: 3 });
    }

    #[test]
    fn test_integer_power() {
        let two = Decimal::TWO;
        assert_eq!(ctx().power(two, Decimal::TEN, 1).unwrap().to_string(), "1024");
    }

    #[test]
    fn test_negative_integer_power() {
        let two = Decimal::TWO;
        let exp: Decimal = "-2".parse().unwrap();
        assert_eq!(ctx().power(two, exp, 1).unwrap().to_string(), "0.25");
    }

    #[test]
    fn test_fractional_power() {
        let nine: Decimal = "9".parse().unwrap();
        let half: Decimal = "0.5".parse().unwrap();
        let result = ctx().power(nine, half, 1).unwrap();
        // f64 approximation of 9^0.5, exact here
        assert_eq!(result.to_string(), "3");
    }

    #[test]
    fn test_precision_rounding() {
        let narrow = MathContext::new(4, RoundingStrategy::MidpointAwayFromZero);
        let a: Decimal = "1.23456".parse().unwrap();
        assert_eq!(narrow.apply(a).to_string(), "1.235");
    }

    #[test]
    fn test_values_within_precision_keep_their_scale() {
        let a: Decimal = "1024".parse().unwrap();
        assert_eq!(ctx().apply(a).to_string(), "1024");
        let b: Decimal = "0.25".parse().unwrap();
        assert_eq!(ctx().apply(b).to_string(), "0.25");
    }

    #[test]
    fn test_with_precision_and_rounding_rebuild_the_context() {
        let narrow = ctx()
            .with_precision(3)
            .with_rounding(RoundingStrategy::MidpointAwayFromZero);
        assert_eq!(narrow.precision(), 3);
        assert_eq!(narrow.rounding(), RoundingStrategy::MidpointAwayFromZero);
        let a: Decimal = "2.345".parse().unwrap();
        assert_eq!(narrow.apply(a).to_string(), "2.35");
    }

    #[test]
    fn test_negative_sqrt_fails() {
        let minus_one: Decimal = "-1".parse().unwrap();
        assert!(ctx().sqrt(minus_one, 1).is_err());
    }
}
