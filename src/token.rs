//! Lexical tokens.
//!
//! A [`Token`] is an immutable unit produced by the lexer (or synthesized by
//! the parser, e.g. the array-index pseudo-function). Operator and function
//! tokens carry the dictionary definition they resolved to at lex time, so
//! later stages never need to look names up again.

use std::fmt;
use std::sync::Arc;

use crate::function::Function;
use crate::operator::Operator;

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Numeric literal (decimal or hexadecimal)
    Number,

    /// Quoted string literal, quotes and escapes already resolved
    StringLiteral,

    /// Identifier that is neither a function call nor an operator name
    VariableOrConstant,

    /// Prefix operator, e.g. unary `-`
    PrefixOperator,

    /// Postfix operator, e.g. factorial `!`
    PostfixOperator,

    /// Infix operator, e.g. `+`
    InfixOperator,

    /// Identifier directly followed by `(`
    Function,

    /// Argument separator inside a function call
    Comma,

    /// `(`
    BraceOpen,

    /// `)`
    BraceClose,

    /// `[`
    ArrayOpen,

    /// `]`
    ArrayClose,

    /// Synthetic two-parameter index operation created by the parser for
    /// `value[index]`
    ArrayIndex,

    /// `.` between a structure and a field name
    StructureSeparator,

    /// Synthetic marker pushed when a function's `(` is consumed, so that
    /// zero-argument calls are distinguishable from one-argument calls
    FunctionParamStart,
}

/// An immutable lexical unit: kind, source text, 1-based position, and the
/// resolved operator/function definition where applicable.
#[derive(Clone)]
pub struct Token {
    position: usize,
    text: String,
    kind: TokenKind,
    operator: Option<Arc<dyn Operator>>,
    function: Option<Arc<dyn Function>>,
}

impl Token {
    /// Creates a token with no attached definition.
    pub fn new(position: usize, text: impl Into<String>, kind: TokenKind) -> Self {
        Token {
            position,
            text: text.into(),
            kind,
            operator: None,
            function: None,
        }
    }

    /// Creates an operator token bound to its dictionary definition.
    pub fn operator(
        position: usize,
        text: impl Into<String>,
        kind: TokenKind,
        definition: Arc<dyn Operator>,
    ) -> Self {
        Token {
            position,
            text: text.into(),
            kind,
            operator: Some(definition),
            function: None,
        }
    }

    /// Creates a function token bound to its dictionary definition.
    pub fn function(position: usize, name: impl Into<String>, definition: Arc<dyn Function>) -> Self {
        Token {
            position,
            text: name.into(),
            kind: TokenKind::Function,
            operator: None,
            function: Some(definition),
        }
    }

    /// 1-based character position in the source text.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The source text this token was scanned from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The resolved operator definition, for operator tokens.
    pub fn operator_definition(&self) -> Option<&Arc<dyn Operator>> {
        self.operator.as_ref()
    }

    /// The resolved function definition, for function tokens.
    pub fn function_definition(&self) -> Option<&Arc<dyn Function>> {
        self.function.as_ref()
    }
}

// Definitions are identity-less behavior; tokens compare by what was lexed.
impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position && self.text == other.text && self.kind == other.kind
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("position", &self.position)
            .field("text", &self.text)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
