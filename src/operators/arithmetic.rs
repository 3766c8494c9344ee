//! Arithmetic operators.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::operator::{
    Operator, OperatorKind, PRECEDENCE_ADDITIVE, PRECEDENCE_MULTIPLICATIVE, PRECEDENCE_POWER,
    PRECEDENCE_POWER_HIGHER, PRECEDENCE_UNARY,
};
use crate::token::Token;
use crate::value::Value;

fn unsupported(token: &Token, left: &Value, right: &Value) -> EvaluationError {
    EvaluationError::UnsupportedDataType {
        position: token.position(),
        message: format!(
            "'{}' not defined for {} and {}",
            token.text(),
            left.type_name(),
            right.type_name()
        ),
    }
}

fn number_operand(token: &Token, value: &Value) -> Result<Decimal, EvaluationError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(EvaluationError::UnsupportedDataType {
            position: token.position(),
            message: format!(
                "'{}' requires a number, got {}",
                token.text(),
                other.type_name()
            ),
        }),
    }
}

/// `+`: numeric addition, date-time/duration shifting, string concatenation.
pub struct Plus;

impl Operator for Plus {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_ADDITIVE
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let position = token.position();
        match (&operands[0], &operands[1]) {
            (Value::Number(a), Value::Number(b)) => {
                Ok(Value::Number(math.add(*a, *b, position)?))
            }
            (Value::DateTime(a), Value::Duration(b)) => Ok(Value::DateTime(*a + *b)),
            (Value::DateTime(a), Value::Number(b)) => Ok(Value::DateTime(
                *a + chrono::Duration::milliseconds(b.to_i64().unwrap_or_default()),
            )),
            (Value::Duration(a), Value::Duration(b)) => Ok(Value::Duration(*a + *b)),
            (a @ Value::String(_), b) | (a, b @ Value::String(_)) => {
                let (Some(a), Some(b)) = (a.as_string(), b.as_string()) else {
                    return Err(unsupported(token, &operands[0], &operands[1]));
                };
                Ok(Value::String(format!("{}{}", a, b)))
            }
            (a, b) => Err(unsupported(token, a, b)),
        }
    }
}

/// `-`: numeric subtraction, date-time/duration arithmetic.
pub struct Minus;

impl Operator for Minus {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_ADDITIVE
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let position = token.position();
        match (&operands[0], &operands[1]) {
            (Value::Number(a), Value::Number(b)) => {
                Ok(Value::Number(math.subtract(*a, *b, position)?))
            }
            (Value::DateTime(a), Value::Duration(b)) => Ok(Value::DateTime(*a - *b)),
            (Value::DateTime(a), Value::DateTime(b)) => Ok(Value::Duration(*a - *b)),
            (Value::DateTime(a), Value::Number(b)) => Ok(Value::DateTime(
                *a - chrono::Duration::milliseconds(b.to_i64().unwrap_or_default()),
            )),
            (Value::Duration(a), Value::Duration(b)) => Ok(Value::Duration(*a - *b)),
            (a, b) => Err(unsupported(token, a, b)),
        }
    }
}

pub struct Multiply;

impl Operator for Multiply {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_MULTIPLICATIVE
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let a = number_operand(token, &operands[0])?;
        let b = number_operand(token, &operands[1])?;
        Ok(Value::Number(math.multiply(a, b, token.position())?))
    }
}

pub struct Divide;

impl Operator for Divide {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_MULTIPLICATIVE
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let a = number_operand(token, &operands[0])?;
        let b = number_operand(token, &operands[1])?;
        Ok(Value::Number(math.divide(a, b, token.position())?))
    }
}

pub struct Remainder;

impl Operator for Remainder {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_MULTIPLICATIVE
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let a = number_operand(token, &operands[0])?;
        let b = number_operand(token, &operands[1])?;
        Ok(Value::Number(math.remainder(a, b, token.position())?))
    }
}

/// `^`: right-associative power. Precedence is configuration-dependent: by
/// default unary minus binds tighter (`-2^2` is `(-2)^2`); the
/// higher-precedence variant flips that.
pub struct Power {
    precedence: u32,
}

impl Power {
    pub fn new(higher_precedence: bool) -> Self {
        Power {
            precedence: if higher_precedence {
                PRECEDENCE_POWER_HIGHER
            } else {
                PRECEDENCE_POWER
            },
        }
    }
}

impl Operator for Power {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        self.precedence
    }

    fn is_left_associative(&self) -> bool {
        false
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let a = number_operand(token, &operands[0])?;
        let b = number_operand(token, &operands[1])?;
        Ok(Value::Number(math.power(a, b, token.position())?))
    }
}

pub struct PrefixMinus;

impl Operator for PrefixMinus {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Prefix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_UNARY
    }

    // prefix operators stack up, so `--5` nests instead of reducing early
    fn is_left_associative(&self) -> bool {
        false
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let n = number_operand(token, &operands[0])?;
        Ok(Value::Number(math.apply(-n)))
    }
}

pub struct PrefixPlus;

impl Operator for PrefixPlus {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Prefix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_UNARY
    }

    fn is_left_associative(&self) -> bool {
        false
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Number(number_operand(token, &operands[0])?))
    }
}

/// Postfix `!`: factorial of a non-negative integer.
pub struct Factorial;

impl Operator for Factorial {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Postfix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_UNARY
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        let math = context.configuration().math_context();
        let n = number_operand(token, &operands[0])?;
        if n.is_sign_negative() || !n.fract().is_zero() {
            return Err(EvaluationError::InvalidArgument {
                position: token.position(),
                message: format!("factorial requires a non-negative integer, got {}", n),
            });
        }
        let steps = n.to_u64().ok_or(EvaluationError::NumberOverflow {
            position: token.position(),
        })?;
        let mut result = Decimal::ONE;
        for step in 2..=steps {
            result = math.multiply(result, Decimal::from(step), token.position())?;
        }
        Ok(Value::Number(result))
    }
}
