//! The function plugin contract.
//!
//! Functions are trait objects registered in the configuration's function
//! dictionary under an uppercase-normalized name. The parser validates call
//! arity against the declared parameter list; the compiler wraps lazy
//! parameters as unevaluated thunks and runs [`Function::validate`] before
//! each invocation.

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::token::Token;
use crate::value::Value;

/// A declared function parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: &'static str,
    var_arg: bool,
    lazy: bool,
    non_zero: bool,
    non_negative: bool,
}

impl Parameter {
    pub const fn new(name: &'static str) -> Self {
        Parameter {
            name,
            var_arg: false,
            lazy: false,
            non_zero: false,
            non_negative: false,
        }
    }

    /// Marks this parameter as absorbing all remaining arguments. Only
    /// meaningful on the last declared parameter.
    pub const fn var_arg(mut self) -> Self {
        self.var_arg = true;
        self
    }

    /// Marks this parameter as passed unevaluated (a [`Value::Lazy`] thunk).
    pub const fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Rejects a zero numeric argument before evaluation.
    pub const fn non_zero(mut self) -> Self {
        self.non_zero = true;
        self
    }

    /// Rejects a negative numeric argument before evaluation.
    pub const fn non_negative(mut self) -> Self {
        self.non_negative = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_var_arg(&self) -> bool {
        self.var_arg
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn is_non_zero(&self) -> bool {
        self.non_zero
    }

    pub fn is_non_negative(&self) -> bool {
        self.non_negative
    }
}

/// A callable function definition.
///
/// Like operators, definitions are shared across expressions and threads and
/// must hold no per-call state.
pub trait Function: Send + Sync {
    /// The declared parameter list, in call order.
    fn parameters(&self) -> &[Parameter];

    /// Whether a call may be constant-folded when every argument is a
    /// constant. Functions with real-world effects (current time, random)
    /// must return false.
    fn is_foldable(&self) -> bool {
        true
    }

    /// Forces folding of a zero-argument call even though it has no constant
    /// children to prove it constant. For calls whose result can never
    /// change under a given configuration.
    fn fold_without_arguments(&self) -> bool {
        false
    }

    /// Pre-evaluation argument checks. The default enforces the declared
    /// `non_zero`/`non_negative` flags against number-coercible arguments.
    fn validate(&self, token: &Token, arguments: &[Value]) -> Result<(), EvaluationError> {
        for (i, value) in arguments.iter().enumerate() {
            let parameter = self.parameter_for(i);
            let Some(parameter) = parameter else { continue };
            if !(parameter.is_non_zero() || parameter.is_non_negative()) {
                continue;
            }
            let Some(number) = value.as_number() else { continue };
            if parameter.is_non_zero() && number.is_zero() {
                return Err(EvaluationError::InvalidArgument {
                    position: token.position(),
                    message: format!(
                        "parameter '{}' of {} must not be zero",
                        parameter.name(),
                        token.text()
                    ),
                });
            }
            if parameter.is_non_negative() && number.is_sign_negative() && !number.is_zero() {
                return Err(EvaluationError::InvalidArgument {
                    position: token.position(),
                    message: format!(
                        "parameter '{}' of {} must not be negative",
                        parameter.name(),
                        token.text()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Invokes the function with already-prepared arguments (lazy parameters
    /// arrive as [`Value::Lazy`] thunks).
    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError>;

    /// The declared parameter governing argument `index`, with the var-arg
    /// tail absorbing any overflow.
    fn parameter_for(&self, index: usize) -> Option<&Parameter> {
        let parameters = self.parameters();
        match parameters.get(index) {
            Some(p) => Some(p),
            None => parameters.last().filter(|p| p.is_var_arg()),
        }
    }
}
