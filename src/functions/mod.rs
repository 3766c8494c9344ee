//! The built-in function catalogue.
//!
//! Each function is a small stateless struct implementing the
//! [`crate::function::Function`] contract. Conditional functions (`IF`,
//! `SWITCH`, `COALESCE`) declare lazy parameters so unreached branches are
//! never evaluated; `RANDOM` and `DT_NOW` are non-foldable.

pub mod basic;
pub mod datetime;
pub mod string;
pub mod trig;

use std::sync::Arc;

use crate::function::Function;

/// All built-in functions with their registration names.
pub fn default_functions() -> Vec<(&'static str, Arc<dyn Function>)> {
    vec![
        ("ABS", Arc::new(basic::Abs) as Arc<dyn Function>),
        ("CEILING", Arc::new(basic::Ceiling)),
        ("FLOOR", Arc::new(basic::Floor)),
        ("ROUND", Arc::new(basic::Round)),
        ("SQRT", Arc::new(basic::Sqrt)),
        ("MIN", Arc::new(basic::Min)),
        ("MAX", Arc::new(basic::Max)),
        ("SUM", Arc::new(basic::Sum)),
        ("AVERAGE", Arc::new(basic::Average)),
        ("IF", Arc::new(basic::If)),
        ("SWITCH", Arc::new(basic::Switch)),
        ("COALESCE", Arc::new(basic::Coalesce)),
        ("NOT", Arc::new(basic::Not)),
        ("RANDOM", Arc::new(basic::Random)),
        ("FACT", Arc::new(basic::Fact)),
        ("LOG", Arc::new(basic::Log)),
        ("LOG10", Arc::new(basic::Log10)),
        ("STR_CONTAINS", Arc::new(string::Contains)),
        ("STR_STARTS_WITH", Arc::new(string::StartsWith)),
        ("STR_ENDS_WITH", Arc::new(string::EndsWith)),
        ("STR_LOWER", Arc::new(string::Lower)),
        ("STR_UPPER", Arc::new(string::Upper)),
        ("STR_TRIM", Arc::new(string::Trim)),
        ("STR_LENGTH", Arc::new(string::Length)),
        ("STR_MATCHES", Arc::new(string::Matches)),
        ("STR_SUBSTRING", Arc::new(string::Substring)),
        ("SIN", Arc::new(trig::Sin)),
        ("COS", Arc::new(trig::Cos)),
        ("TAN", Arc::new(trig::Tan)),
        ("ASIN", Arc::new(trig::Asin)),
        ("ACOS", Arc::new(trig::Acos)),
        ("ATAN", Arc::new(trig::Atan)),
        ("ATAN2", Arc::new(trig::Atan2)),
        ("DEG", Arc::new(trig::Deg)),
        ("RAD", Arc::new(trig::Rad)),
        ("DT_NOW", Arc::new(datetime::Now)),
        ("DT_DATE_NEW", Arc::new(datetime::DateNew)),
        ("DT_PARSE", Arc::new(datetime::Parse)),
        ("DT_FORMAT", Arc::new(datetime::Format)),
        ("DT_EPOCH", Arc::new(datetime::Epoch)),
        ("DT_DURATION_NEW", Arc::new(datetime::DurationNew)),
        ("DT_DURATION_PARSE", Arc::new(datetime::DurationParse)),
        ("DT_DURATION_MILLIS", Arc::new(datetime::DurationMillis)),
    ]
}
