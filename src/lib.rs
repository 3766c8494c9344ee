pub mod ast;
pub mod compiler;
pub mod config;
pub mod context;
pub mod datetime;
pub mod error;
pub mod expression;
pub mod function;
pub mod functions;
pub mod lexer;
pub mod numeric;
pub mod operator;
pub mod operators;
pub mod parser;
pub mod token;
pub mod value;

pub use ast::AstNode;
pub use compiler::Solvable;
pub use config::{Configuration, ConfigurationBuilder};
pub use context::{DataAccessor, EvaluationContext};
pub use error::{EvaluationError, ExpressionError, ParseError};
pub use expression::Expression;
pub use function::{Function, Parameter};
pub use numeric::MathContext;
pub use operator::{Operator, OperatorKind};
pub use token::{Token, TokenKind};
pub use value::{IndexedAccessor, KeyedAccessor, Value};
