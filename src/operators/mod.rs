//! The built-in operator set.
//!
//! Arithmetic (`+ - * / % ^`, unary `+ -`, postfix `!`), comparison
//! (`= == != < > <= >=`), and boolean (`&& || !`) operators. `&&` and `||`
//! declare their operands lazy and short-circuit.

pub mod arithmetic;
pub mod boolean;
pub mod comparison;

use std::sync::Arc;

use crate::operator::Operator;

/// All built-in operators with their registration names. `power_higher`
/// selects whether `^` binds tighter than unary minus.
pub fn default_operators(power_higher: bool) -> Vec<(&'static str, Arc<dyn Operator>)> {
    vec![
        ("+", Arc::new(arithmetic::Plus) as Arc<dyn Operator>),
        ("-", Arc::new(arithmetic::Minus)),
        ("*", Arc::new(arithmetic::Multiply)),
        ("/", Arc::new(arithmetic::Divide)),
        ("%", Arc::new(arithmetic::Remainder)),
        ("^", Arc::new(arithmetic::Power::new(power_higher))),
        ("+", Arc::new(arithmetic::PrefixPlus)),
        ("-", Arc::new(arithmetic::PrefixMinus)),
        ("!", Arc::new(arithmetic::Factorial)),
        ("=", Arc::new(comparison::Equals)),
        ("==", Arc::new(comparison::Equals)),
        ("!=", Arc::new(comparison::NotEquals)),
        ("<", Arc::new(comparison::Less)),
        (">", Arc::new(comparison::Greater)),
        ("<=", Arc::new(comparison::LessOrEqual)),
        (">=", Arc::new(comparison::GreaterOrEqual)),
        ("&&", Arc::new(boolean::And)),
        ("||", Arc::new(boolean::Or)),
        ("!", Arc::new(boolean::Not)),
    ]
}
