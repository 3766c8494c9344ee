//! String functions.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::function::{Function, Parameter};
use crate::token::Token;
use crate::value::Value;

fn string_argument(token: &Token, value: &Value) -> Result<String, EvaluationError> {
    value
        .as_string()
        .ok_or_else(|| EvaluationError::InvalidArgument {
            position: token.position(),
            message: format!("{} does not accept a null argument", token.text()),
        })
}

pub struct Contains;

impl Function for Contains {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("string"), Parameter::new("substring")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let haystack = string_argument(token, &arguments[0])?.to_lowercase();
        let needle = string_argument(token, &arguments[1])?.to_lowercase();
        Ok(Value::Boolean(haystack.contains(&needle)))
    }
}

pub struct StartsWith;

impl Function for StartsWith {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("string"), Parameter::new("prefix")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let string = string_argument(token, &arguments[0])?;
        let prefix = string_argument(token, &arguments[1])?;
        Ok(Value::Boolean(string.starts_with(&prefix)))
    }
}

pub struct EndsWith;

impl Function for EndsWith {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("string"), Parameter::new("suffix")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let string = string_argument(token, &arguments[0])?;
        let suffix = string_argument(token, &arguments[1])?;
        Ok(Value::Boolean(string.ends_with(&suffix)))
    }
}

pub struct Lower;

impl Function for Lower {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("string")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::String(
            string_argument(token, &arguments[0])?.to_lowercase(),
        ))
    }
}

pub struct Upper;

impl Function for Upper {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("string")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::String(
            string_argument(token, &arguments[0])?.to_uppercase(),
        ))
    }
}

pub struct Trim;

impl Function for Trim {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("string")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::String(
            string_argument(token, &arguments[0])?.trim().to_string(),
        ))
    }
}

/// `STR_LENGTH(string)`: length in characters, not bytes.
pub struct Length;

impl Function for Length {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("string")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let string = string_argument(token, &arguments[0])?;
        Ok(Value::Number(Decimal::from(string.chars().count())))
    }
}

/// `STR_MATCHES(string, pattern)`: whether the string matches the regular
/// expression.
pub struct Matches;

impl Function for Matches {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("string"), Parameter::new("pattern")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let string = string_argument(token, &arguments[0])?;
        let pattern = string_argument(token, &arguments[1])?;
        let re = regex::Regex::new(&pattern).map_err(|e| EvaluationError::InvalidArgument {
            position: token.position(),
            message: format!("invalid regex: {}", e),
        })?;
        Ok(Value::Boolean(re.is_match(&string)))
    }
}

/// `STR_SUBSTRING(string, start[, end])`: character-indexed, end exclusive,
/// clamped to the string length.
pub struct Substring;

impl Function for Substring {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[
            Parameter::new("string"),
            Parameter::new("start").non_negative(),
            Parameter::new("end").var_arg(),
        ];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let string = string_argument(token, &arguments[0])?;
        let start = index_argument(token, &arguments[1])?;
        let end = match arguments.get(2) {
            Some(value) => index_argument(token, value)?,
            None => string.chars().count(),
        };
        if end < start {
            return Err(EvaluationError::InvalidArgument {
                position: token.position(),
                message: format!("substring end {} is before start {}", end, start),
            });
        }
        Ok(Value::String(
            string.chars().skip(start).take(end - start).collect(),
        ))
    }
}

fn index_argument(token: &Token, value: &Value) -> Result<usize, EvaluationError> {
    value
        .as_number()
        .and_then(|n| n.to_usize())
        .ok_or_else(|| EvaluationError::InvalidArgument {
            position: token.position(),
            message: "substring indices must be non-negative integers".to_string(),
        })
}
