//! Error types for the two failure surfaces: lexing/parsing and evaluation.
//!
//! Parsing fails fast on the first malformed token or structural violation;
//! no partial syntax trees are ever returned. Evaluation propagates the first
//! error encountered in evaluation order, carrying the source position of the
//! offending token so hosts can point at the faulty part of the formula.

use std::fmt;

/// Errors raised while lexing or parsing an expression.
///
/// Every variant carries the 1-based character position in the source text
/// where the problem was detected.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// An operator was spelled but is not registered in any dictionary
    UndefinedOperator { position: usize, text: String },

    /// An identifier followed by `(` that is not a registered function
    UndefinedFunction { position: usize, name: String },

    /// A string literal with no closing quote
    UnterminatedString { position: usize },

    /// A numeric literal that cannot be a number (two decimal points,
    /// dangling exponent, ...)
    MalformedNumber { position: usize, text: String },

    /// Unbalanced `(`/`)`
    UnbalancedBrace { position: usize },

    /// Unbalanced `[`/`]`, or arrays used while disabled
    UnbalancedArray { position: usize },

    /// A token that is not legal at this position (misplaced `.`/`[`/`,`,
    /// adjacent operands without an operator, ...)
    MisplacedToken { position: usize, text: String },

    /// A prefix or postfix operator with no operand to apply to
    MissingOperand { position: usize, operator: String },

    /// An infix operator or structure separator with only one operand
    MissingSecondOperand { position: usize, operator: String },

    /// A function called with too few or too many arguments
    WrongNumberOfArguments {
        position: usize,
        name: String,
        expected: String,
        found: usize,
    },

    /// The input contained no expression at all
    EmptyExpression { position: usize },

    /// More than one node left on the operand stack after parsing
    TooManyOperands { position: usize },
}

impl ParseError {
    /// 1-based character position of the fault in the source text.
    pub fn position(&self) -> usize {
        match self {
            ParseError::UndefinedOperator { position, .. }
            | ParseError::UndefinedFunction { position, .. }
            | ParseError::UnterminatedString { position }
            | ParseError::MalformedNumber { position, .. }
            | ParseError::UnbalancedBrace { position }
            | ParseError::UnbalancedArray { position }
            | ParseError::MisplacedToken { position, .. }
            | ParseError::MissingOperand { position, .. }
            | ParseError::MissingSecondOperand { position, .. }
            | ParseError::WrongNumberOfArguments { position, .. }
            | ParseError::EmptyExpression { position }
            | ParseError::TooManyOperands { position } => *position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UndefinedOperator { position, text } => {
                write!(f, "Undefined operator '{}' at position {}", text, position)
            }
            ParseError::UndefinedFunction { position, name } => {
                write!(f, "Undefined function '{}' at position {}", name, position)
            }
            ParseError::UnterminatedString { position } => {
                write!(f, "Unterminated string starting at position {}", position)
            }
            ParseError::MalformedNumber { position, text } => {
                write!(f, "Malformed number '{}' at position {}", text, position)
            }
            ParseError::UnbalancedBrace { position } => {
                write!(f, "Unbalanced braces at position {}", position)
            }
            ParseError::UnbalancedArray { position } => {
                write!(f, "Unbalanced array brackets at position {}", position)
            }
            ParseError::MisplacedToken { position, text } => {
                write!(f, "Misplaced '{}' at position {}", text, position)
            }
            ParseError::MissingOperand { position, operator } => {
                write!(
                    f,
                    "Missing operand for operator '{}' at position {}",
                    operator, position
                )
            }
            ParseError::MissingSecondOperand { position, operator } => {
                write!(
                    f,
                    "Missing second operand for operator '{}' at position {}",
                    operator, position
                )
            }
            ParseError::WrongNumberOfArguments {
                position,
                name,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Function '{}' at position {} expects {} arguments, got {}",
                    name, position, expected, found
                )
            }
            ParseError::EmptyExpression { position } => {
                write!(f, "Empty expression at position {}", position)
            }
            ParseError::TooManyOperands { position } => {
                write!(f, "Too many operands at position {}", position)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors raised while evaluating a compiled expression.
///
/// Carries the source position of the token whose evaluation failed. All
/// evaluation failures are terminal for the current `evaluate()` call.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// A variable or constant was not found in parameters, configuration
    /// constants, or the external data accessor
    VariableNotFound { position: usize, name: String },

    /// An operation applied to a value kind it has no rule for
    UnsupportedDataType { position: usize, message: String },

    /// Array or string index outside `0..len`
    IndexOutOfBounds {
        position: usize,
        index: String,
        container: String,
    },

    /// Structure field access on a missing key
    FieldNotFound {
        position: usize,
        field: String,
        container: String,
    },

    /// Ordering comparison against a null value
    NullComparison { position: usize },

    /// Division or remainder by zero
    DivisionByZero { position: usize },

    /// A function argument rejected by pre-evaluation validation
    /// (zero/negative where disallowed) or by the function itself
    InvalidArgument { position: usize, message: String },

    /// Arithmetic left the representable decimal range
    NumberOverflow { position: usize },
}

impl EvaluationError {
    /// 1-based source position of the token whose evaluation failed.
    pub fn position(&self) -> usize {
        match self {
            EvaluationError::VariableNotFound { position, .. }
            | EvaluationError::UnsupportedDataType { position, .. }
            | EvaluationError::IndexOutOfBounds { position, .. }
            | EvaluationError::FieldNotFound { position, .. }
            | EvaluationError::NullComparison { position }
            | EvaluationError::DivisionByZero { position }
            | EvaluationError::InvalidArgument { position, .. }
            | EvaluationError::NumberOverflow { position } => *position,
        }
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationError::VariableNotFound { name, .. } => {
                write!(f, "Variable or constant value for '{}' not found", name)
            }
            EvaluationError::UnsupportedDataType { message, .. } => {
                write!(f, "Unsupported data type: {}", message)
            }
            EvaluationError::IndexOutOfBounds {
                index, container, ..
            } => {
                write!(f, "Index {} out of bounds for {}", index, container)
            }
            EvaluationError::FieldNotFound {
                field, container, ..
            } => {
                write!(f, "Field '{}' not found in {}", field, container)
            }
            EvaluationError::NullComparison { position } => {
                write!(f, "Cannot compare a null value at position {}", position)
            }
            EvaluationError::DivisionByZero { position } => {
                write!(f, "Division by zero at position {}", position)
            }
            EvaluationError::InvalidArgument { message, .. } => {
                write!(f, "Invalid argument: {}", message)
            }
            EvaluationError::NumberOverflow { position } => {
                write!(f, "Numeric overflow at position {}", position)
            }
        }
    }
}

impl std::error::Error for EvaluationError {}

/// Either failure surface, for APIs that lex, parse and evaluate in one call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    Parse(ParseError),
    Evaluation(EvaluationError),
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::Parse(e) => write!(f, "{}", e),
            ExpressionError::Evaluation(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ExpressionError {}

impl From<ParseError> for ExpressionError {
    fn from(e: ParseError) -> Self {
        ExpressionError::Parse(e)
    }
}

impl From<EvaluationError> for ExpressionError {
    fn from(e: EvaluationError) -> Self {
        ExpressionError::Evaluation(e)
    }
}
