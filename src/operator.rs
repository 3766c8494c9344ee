//! The operator plugin contract.
//!
//! Operators are trait objects registered in the configuration's operator
//! dictionary under their exact text. The lexer resolves text to definitions,
//! the parser reads precedence and associativity, and the compiler reads
//! laziness and foldability.

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::token::Token;
use crate::value::Value;

/// Where an operator sits relative to its operand(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Prefix,
    Postfix,
    Infix,
}

// The precedence ladder for the built-in operators. Custom operators may
// register anywhere on or between these rungs.

/// `||`
pub const PRECEDENCE_OR: u32 = 2;
/// `&&`
pub const PRECEDENCE_AND: u32 = 4;
/// `=`, `==`, `!=`
pub const PRECEDENCE_EQUALITY: u32 = 7;
/// `<`, `>`, `<=`, `>=`
pub const PRECEDENCE_COMPARISON: u32 = 10;
/// `+`, `-`
pub const PRECEDENCE_ADDITIVE: u32 = 20;
/// `*`, `/`, `%`
pub const PRECEDENCE_MULTIPLICATIVE: u32 = 30;
/// `^` by default: unary minus binds tighter, so `-2^2` is `(-2)^2`
pub const PRECEDENCE_POWER: u32 = 40;
/// unary `-`, `+`, `!`
pub const PRECEDENCE_UNARY: u32 = 60;
/// `^` when the configuration asks for power to bind tighter than unary
/// minus, so `-2^2` is `-(2^2)`
pub const PRECEDENCE_POWER_HIGHER: u32 = 80;

/// A prefix, postfix, or infix operator definition.
///
/// Implementations must be stateless with respect to evaluation: the same
/// definition is shared by every expression compiled under a configuration
/// and invoked concurrently from many threads.
pub trait Operator: Send + Sync {
    /// Prefix, postfix, or infix.
    fn kind(&self) -> OperatorKind;

    /// Binding strength; higher binds tighter.
    fn precedence(&self) -> u32;

    /// Left-associative operators of equal precedence reduce left-to-right.
    fn is_left_associative(&self) -> bool {
        true
    }

    /// Lazy operators receive their operands as unevaluated [`Value::Lazy`]
    /// thunks and decide themselves which to solve. Used for short-circuit
    /// `&&` and `||`.
    fn is_lazy(&self) -> bool {
        false
    }

    /// Whether a node using this operator may be constant-folded when all
    /// its operands are constants.
    fn is_foldable(&self) -> bool {
        true
    }

    /// Applies the operator. `operands` holds one value for prefix/postfix
    /// and two for infix, in source order.
    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        operands: &[Value],
    ) -> Result<Value, EvaluationError>;
}
