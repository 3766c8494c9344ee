//! Numeric, aggregate, and conditional functions.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::function::{Function, Parameter};
use crate::token::Token;
use crate::value::Value;

pub(crate) fn number_argument(token: &Token, value: &Value) -> Result<Decimal, EvaluationError> {
    value
        .as_number()
        .ok_or_else(|| EvaluationError::InvalidArgument {
            position: token.position(),
            message: format!("{} does not accept a null argument", token.text()),
        })
}

fn float_argument(token: &Token, value: &Value) -> Result<f64, EvaluationError> {
    number_argument(token, value)?
        .to_f64()
        .ok_or(EvaluationError::NumberOverflow {
            position: token.position(),
        })
}

pub(crate) fn float_result(token: &Token, value: f64) -> Result<Value, EvaluationError> {
    if !value.is_finite() {
        return Err(EvaluationError::InvalidArgument {
            position: token.position(),
            message: format!("{} produced a non-finite result", token.text()),
        });
    }
    Decimal::from_f64(value)
        .map(Value::Number)
        .ok_or(EvaluationError::NumberOverflow {
            position: token.position(),
        })
}

/// Walks arguments depth-first, flattening arrays, and feeds every number to
/// the accumulator.
fn for_each_number(
    token: &Token,
    values: &[Value],
    accept: &mut impl FnMut(Decimal) -> Result<(), EvaluationError>,
) -> Result<(), EvaluationError> {
    for value in values {
        match value {
            Value::Array(items) => for_each_number(token, items, accept)?,
            other => accept(number_argument(token, other)?)?,
        }
    }
    Ok(())
}

pub struct Abs;

impl Function for Abs {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Number(number_argument(token, &arguments[0])?.abs()))
    }
}

pub struct Ceiling;

impl Function for Ceiling {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Number(number_argument(token, &arguments[0])?.ceil()))
    }
}

pub struct Floor;

impl Function for Floor {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Number(number_argument(token, &arguments[0])?.floor()))
    }
}

/// `ROUND(value, scale)`: rounds to `scale` decimal places with the
/// configured rounding mode.
pub struct Round;

impl Function for Round {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value"), Parameter::new("scale")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let value = number_argument(token, &arguments[0])?;
        let scale = number_argument(token, &arguments[1])?
            .to_u32()
            .ok_or_else(|| EvaluationError::InvalidArgument {
                position: token.position(),
                message: "ROUND scale must be a non-negative integer".to_string(),
            })?;
        let rounding = context.configuration().math_context().rounding();
        Ok(Value::Number(value.round_dp_with_strategy(scale, rounding)))
    }
}

pub struct Sqrt;

impl Function for Sqrt {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").non_negative()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let value = number_argument(token, &arguments[0])?;
        let math = context.configuration().math_context();
        Ok(Value::Number(math.sqrt(value, token.position())?))
    }
}

pub struct Min;

impl Function for Min {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").var_arg()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let mut min: Option<Decimal> = None;
        for_each_number(token, arguments, &mut |n| {
            min = Some(match min {
                Some(current) if current <= n => current,
                _ => n,
            });
            Ok(())
        })?;
        Ok(Value::Number(min.unwrap_or_default()))
    }
}

pub struct Max;

impl Function for Max {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").var_arg()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let mut max: Option<Decimal> = None;
        for_each_number(token, arguments, &mut |n| {
            max = Some(match max {
                Some(current) if current >= n => current,
                _ => n,
            });
            Ok(())
        })?;
        Ok(Value::Number(max.unwrap_or_default()))
    }
}

/// `SUM(...)`: adds all numeric arguments, recursing into arrays.
pub struct Sum;

impl Function for Sum {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").var_arg()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let mut sum = Decimal::ZERO;
        for_each_number(token, arguments, &mut |n| {
            sum = math.add(sum, n, token.position())?;
            Ok(())
        })?;
        Ok(Value::Number(sum))
    }
}

pub struct Average;

impl Function for Average {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").var_arg()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let mut sum = Decimal::ZERO;
        let mut count = 0u64;
        for_each_number(token, arguments, &mut |n| {
            sum = math.add(sum, n, token.position())?;
            count += 1;
            Ok(())
        })?;
        if count == 0 {
            return Ok(Value::Number(Decimal::ZERO));
        }
        Ok(Value::Number(math.divide(
            sum,
            Decimal::from(count),
            token.position(),
        )?))
    }
}

/// `IF(condition, resultIfTrue, resultIfFalse)`: both result branches are
/// lazy, so the unreached branch is never evaluated.
pub struct If;

impl Function for If {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[
            Parameter::new("condition"),
            Parameter::new("resultIfTrue").lazy(),
            Parameter::new("resultIfFalse").lazy(),
        ];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let condition =
            arguments[0]
                .as_boolean()
                .ok_or_else(|| EvaluationError::InvalidArgument {
                    position: token.position(),
                    message: "IF condition must not be null".to_string(),
                })?;
        if condition {
            arguments[1].solved(context)
        } else {
            arguments[2].solved(context)
        }
    }
}

/// `SWITCH(expression, case1, result1, ..., [default])`: case values are
/// compared in order; only the matching result (or the trailing default) is
/// evaluated.
pub struct Switch;

impl Function for Switch {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[
            Parameter::new("expression"),
            Parameter::new("cases").var_arg().lazy(),
        ];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        _token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let subject = &arguments[0];
        let cases = &arguments[1..];
        let mut i = 0;
        while i + 1 < cases.len() {
            let case = cases[i].solved(context)?;
            if case == *subject {
                return cases[i + 1].solved(context);
            }
            i += 2;
        }
        // odd trailing argument is the default
        if i < cases.len() {
            return cases[i].solved(context);
        }
        Ok(Value::Null)
    }
}

/// `COALESCE(...)`: first non-null argument, all lazy.
pub struct Coalesce;

impl Function for Coalesce {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").var_arg().lazy()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        _token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        for argument in arguments {
            let solved = argument.solved(context)?;
            if !solved.is_null() {
                return Ok(solved);
            }
        }
        Ok(Value::Null)
    }
}

pub struct Not;

impl Function for Not {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let value = arguments[0]
            .as_boolean()
            .ok_or_else(|| EvaluationError::InvalidArgument {
                position: token.position(),
                message: "NOT does not accept a null argument".to_string(),
            })?;
        Ok(Value::Boolean(!value))
    }
}

/// `RANDOM()`: uniform in `[0, 1)`. Never folded.
pub struct Random;

impl Function for Random {
    fn parameters(&self) -> &[Parameter] {
        &[]
    }

    fn is_foldable(&self) -> bool {
        false
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        _arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let sample: f64 = rand::random();
        float_result(token, sample)
    }
}

pub struct Fact;

impl Function for Fact {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").non_negative()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let n = number_argument(token, &arguments[0])?
            .to_u64()
            .ok_or_else(|| EvaluationError::InvalidArgument {
                position: token.position(),
                message: "FACT requires a non-negative integer".to_string(),
            })?;
        let mut result = Decimal::ONE;
        for step in 2..=n {
            result = math.multiply(result, Decimal::from(step), token.position())?;
        }
        Ok(Value::Number(result))
    }
}

/// `LOG(value)`: natural logarithm.
pub struct Log;

impl Function for Log {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").non_zero().non_negative()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let value = float_argument(token, &arguments[0])?;
        float_result(token, value.ln())
    }
}

pub struct Log10;

impl Function for Log10 {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value").non_zero().non_negative()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let value = float_argument(token, &arguments[0])?;
        float_result(token, value.log10())
    }
}
