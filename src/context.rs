//! Per-evaluation state.
//!
//! An [`EvaluationContext`] carries the shared [`Configuration`] plus the
//! parameter bindings for one evaluation. Parameters are case-sensitive;
//! constants from the configuration are case-insensitive and, by default,
//! shadowed by a parameter of the same name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Configuration;
use crate::token::Token;
use crate::value::Value;

/// Resolves variables the context itself does not know. Consulted after
/// parameters and constants.
pub trait DataAccessor: Send + Sync {
    fn lookup(&self, name: &str, token: &Token, context: &EvaluationContext) -> Option<Value>;
}

pub struct EvaluationContext {
    configuration: Arc<Configuration>,
    parameters: HashMap<String, Value>,
    accessor: Option<Arc<dyn DataAccessor>>,
}

impl EvaluationContext {
    pub fn new(configuration: Arc<Configuration>) -> Self {
        EvaluationContext {
            configuration,
            parameters: HashMap::new(),
            accessor: None,
        }
    }

    /// Binds a parameter, fluently.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    /// Binds every entry of the map as a parameter.
    pub fn with_values(mut self, values: HashMap<String, Value>) -> Self {
        self.parameters.extend(values);
        self
    }

    /// Installs a fallback resolver for unbound variables.
    pub fn with_accessor(mut self, accessor: Arc<dyn DataAccessor>) -> Self {
        self.accessor = Some(accessor);
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Full variable resolution order: parameters, then constants, then the
    /// data accessor.
    pub fn resolve(&self, name: &str, token: &Token) -> Option<Value> {
        if let Some(value) = self.parameters.get(name) {
            return Some(value.clone());
        }
        if let Some(value) = self.configuration.constant(name) {
            return Some(value.clone());
        }
        self.accessor
            .as_ref()
            .and_then(|accessor| accessor.lookup(name, token, self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_shadow_constants() {
        let config = Arc::new(Configuration::default());
        let token = Token::new(1, "PI", crate::token::TokenKind::VariableOrConstant);
        let context = EvaluationContext::new(config).with("PI", 3);
        assert_eq!(context.resolve("PI", &token), Some(Value::from(3)));
    }

    #[test]
    fn parameter_names_are_case_sensitive() {
        let config = Arc::new(Configuration::default());
        let token = Token::new(1, "a", crate::token::TokenKind::VariableOrConstant);
        let context = EvaluationContext::new(config).with("a", 1);
        assert_eq!(context.resolve("A", &token), None);
        assert_eq!(context.resolve("a", &token), Some(Value::from(1)));
    }

    struct Doubler;

    impl DataAccessor for Doubler {
        fn lookup(&self, name: &str, _token: &Token, _context: &EvaluationContext) -> Option<Value> {
            (name == "answer").then(|| Value::from(42))
        }
    }

    #[test]
    fn accessor_is_consulted_last() {
        let config = Arc::new(Configuration::default());
        let token = Token::new(1, "answer", crate::token::TokenKind::VariableOrConstant);
        let context = EvaluationContext::new(config).with_accessor(Arc::new(Doubler));
        assert_eq!(context.resolve("answer", &token), Some(Value::from(42)));
        assert_eq!(context.resolve("question", &token), None);
    }
}
