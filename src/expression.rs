//! The expression facade.
//!
//! An [`Expression`] ties a source string to a configuration. Compilation is
//! lazy and memoized behind a `OnceLock`, so a shared expression compiles at
//! most once and can be evaluated concurrently from many threads, each with
//! its own [`EvaluationContext`].

use std::sync::{Arc, OnceLock};

use crate::ast::AstNode;
use crate::compiler::{self, Solvable};
use crate::config::Configuration;
use crate::context::EvaluationContext;
use crate::error::{ExpressionError, ParseError};
use crate::lexer;
use crate::parser;
use crate::token::Token;
use crate::value::Value;

pub struct Expression {
    source: String,
    configuration: Arc<Configuration>,
    compiled: OnceLock<Result<Arc<Solvable>, ParseError>>,
}

impl Expression {
    /// An expression under the default configuration.
    pub fn new(source: impl Into<String>) -> Self {
        Expression::with_configuration(source, Arc::new(Configuration::default()))
    }

    pub fn with_configuration(source: impl Into<String>, configuration: Arc<Configuration>) -> Self {
        Expression {
            source: source.into(),
            configuration,
            compiled: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// A fresh evaluation context over this expression's configuration.
    pub fn context(&self) -> EvaluationContext {
        EvaluationContext::new(self.configuration.clone())
    }

    /// The token stream, lexed on every call.
    pub fn tokens(&self) -> Result<Vec<Token>, ParseError> {
        lexer::tokenize(&self.source, &self.configuration)
    }

    /// The parsed syntax tree, built on every call.
    pub fn ast(&self) -> Result<AstNode, ParseError> {
        parser::parse(&self.tokens()?)
    }

    /// The compiled solvable tree. Compiled once; later calls return the
    /// memoized result, including a memoized failure.
    pub fn compile(&self) -> Result<Arc<Solvable>, ParseError> {
        self.compiled
            .get_or_init(|| {
                let ast = self.ast()?;
                compiler::compile(&ast, &self.configuration)
            })
            .clone()
    }

    /// Checks syntax without evaluating.
    pub fn validate(&self) -> Result<(), ParseError> {
        self.compile().map(|_| ())
    }

    /// Distinct variable names the expression references, in source order.
    pub fn variable_names(&self) -> Result<Vec<String>, ParseError> {
        Ok(self.ast()?.variable_names())
    }

    /// Evaluates against the given context, applying final-result rounding
    /// and trailing-zero stripping to numeric results.
    pub fn evaluate(&self, context: &EvaluationContext) -> Result<Value, ExpressionError> {
        let solvable = self.compile()?;
        let value = solvable.solve(context)?;
        Ok(match value {
            Value::Number(n) => Value::Number(self.configuration.round_result(n)),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_with_bound_parameters() {
        let expression = Expression::new("(a+b)*2");
        let context = expression.context().with("a", 3).with("b", 4);
        assert_eq!(expression.evaluate(&context).unwrap(), Value::from(14));
    }

    #[test]
    fn parse_failures_are_memoized() {
        let expression = Expression::new("1+");
        assert!(expression.validate().is_err());
        assert!(expression.validate().is_err());
    }

    #[test]
    fn variable_names_come_from_the_ast() {
        let expression = Expression::new("x*y+x");
        assert_eq!(expression.variable_names().unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn final_rounding_applies_to_the_root_only() {
        let configuration = Arc::new(
            Configuration::builder()
                .decimal_places_result(2)
                .build(),
        );
        let expression = Expression::with_configuration("1/3", configuration);
        let context = expression.context();
        assert_eq!(
            expression.evaluate(&context).unwrap().to_string(),
            "0.33"
        );
    }
}
