//! Boolean operators.
//!
//! `&&` and `||` declare their operands lazy: they receive unevaluated
//! thunks and solve only what they need, so `a != 0 && 1/a > 2` never
//! divides by zero.

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::operator::{Operator, OperatorKind, PRECEDENCE_AND, PRECEDENCE_OR, PRECEDENCE_UNARY};
use crate::token::Token;
use crate::value::Value;

fn boolean_operand(
    context: &EvaluationContext,
    token: &Token,
    operand: &Value,
) -> Result<bool, EvaluationError> {
    let solved = operand.solved(context)?;
    solved
        .as_boolean()
        .ok_or_else(|| EvaluationError::UnsupportedDataType {
            position: token.position(),
            message: format!("'{}' not defined for null", token.text()),
        })
}

pub struct And;

impl Operator for And {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_AND
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        if !boolean_operand(context, token, &operands[0])? {
            return Ok(Value::Boolean(false));
        }
        Ok(Value::Boolean(boolean_operand(
            context,
            token,
            &operands[1],
        )?))
    }
}

pub struct Or;

impl Operator for Or {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_OR
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        if boolean_operand(context, token, &operands[0])? {
            return Ok(Value::Boolean(true));
        }
        Ok(Value::Boolean(boolean_operand(
            context,
            token,
            &operands[1],
        )?))
    }
}

/// Prefix `!`: boolean negation.
pub struct Not;

impl Operator for Not {
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
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Boolean(!boolean_operand(
            context,
            token,
            &operands[0],
        )?))
    }
}
