//! Equality and ordering operators.
//!
//! Equality is structural and total: two nulls are equal, null never equals
//! anything else, and numbers compare by value regardless of scale. Ordering
//! goes through [`Value::compare`], which fails on null operands.

use std::cmp::Ordering;

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::operator::{Operator, OperatorKind, PRECEDENCE_COMPARISON, PRECEDENCE_EQUALITY};
use crate::token::Token;
use crate::value::Value;

fn values_equal(left: &Value, right: &Value, position: usize) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => a == b,
        // mixed kinds fall back to the coercing comparison
        (a, b) => matches!(a.compare(b, position), Ok(Ordering::Equal)),
    }
}

fn ordering(
    token: &Token,
    operands: &[Value],
) -> Result<Ordering, EvaluationError> {
    operands[0].compare(&operands[1], token.position())
}

pub struct Equals;

impl Operator for Equals {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_EQUALITY
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Boolean(values_equal(
            &operands[0],
            &operands[1],
            token.position(),
        )))
    }
}

pub struct NotEquals;

impl Operator for NotEquals {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_EQUALITY
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Boolean(!values_equal(
            &operands[0],
            &operands[1],
            token.position(),
        )))
    }
}

pub struct Less;

impl Operator for Less {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_COMPARISON
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Boolean(ordering(token, operands)? == Ordering::Less))
    }
}

pub struct Greater;

impl Operator for Greater {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_COMPARISON
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Boolean(
            ordering(token, operands)? == Ordering::Greater,
        ))
    }
}

pub struct LessOrEqual;

impl Operator for LessOrEqual {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_COMPARISON
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Boolean(ordering(token, operands)? != Ordering::Greater))
    }
}

pub struct GreaterOrEqual;

impl Operator for GreaterOrEqual {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Infix
    }

    fn precedence(&self) -> u32 {
        PRECEDENCE_COMPARISON
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::Boolean(ordering(token, operands)? != Ordering::Less))
    }
}
