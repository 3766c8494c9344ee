//! Trigonometric functions. Angles are degrees-free: `SIN`/`COS`/`TAN` take
//! radians; `DEG`/`RAD` convert.

use rust_decimal::prelude::ToPrimitive;

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::function::{Function, Parameter};
use crate::functions::basic::{float_result, number_argument};
use crate::token::Token;
use crate::value::Value;

fn float_argument(token: &Token, value: &Value) -> Result<f64, EvaluationError> {
    number_argument(token, value)?
        .to_f64()
        .ok_or(EvaluationError::NumberOverflow {
            position: token.position(),
        })
}

macro_rules! unary_float_function {
    ($name:ident, $op:expr) => {
        pub struct $name;

        impl Function for $name {
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
                let value = float_argument(token, &arguments[0])?;
                let op: fn(f64) -> f64 = $op;
                float_result(token, op(value))
            }
        }
    };
}

unary_float_function!(Sin, f64::sin);
unary_float_function!(Cos, f64::cos);
unary_float_function!(Tan, f64::tan);
unary_float_function!(Asin, f64::asin);
unary_float_function!(Acos, f64::acos);
unary_float_function!(Atan, f64::atan);
unary_float_function!(Deg, f64::to_degrees);
unary_float_function!(Rad, f64::to_radians);

/// `ATAN2(y, x)`
pub struct Atan2;

impl Function for Atan2 {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("y"), Parameter::new("x")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let y = float_argument(token, &arguments[0])?;
        let x = float_argument(token, &arguments[1])?;
        float_result(token, y.atan2(x))
    }
}
