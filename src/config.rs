//! Expression configuration.
//!
//! A [`Configuration`] is an immutable value object holding the operator and
//! function dictionaries, the default constants, the numeric context, and the
//! feature flags. It is built once through the fluent
//! [`ConfigurationBuilder`], wrapped in an `Arc` and shared by any number of
//! expressions and evaluation contexts.
//!
//! Function and constant names are case-insensitive; the dictionaries store
//! uppercase-normalized keys. Operator texts are matched exactly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::datetime;
use crate::function::Function;
use crate::functions::default_functions;
use crate::numeric::MathContext;
use crate::operator::{Operator, OperatorKind};
use crate::operators::default_operators;
use crate::value::Value;

/// Chrono pattern for ISO-8601 date-times, also the default output format.
pub const FORMAT_ISO_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

/// Immutable evaluation configuration. Create one with
/// [`Configuration::builder`] or take [`Configuration::default`].
pub struct Configuration {
    prefix_operators: HashMap<String, Arc<dyn Operator>>,
    postfix_operators: HashMap<String, Arc<dyn Operator>>,
    infix_operators: HashMap<String, Arc<dyn Operator>>,
    functions: HashMap<String, Arc<dyn Function>>,
    constants: HashMap<String, Value>,
    math_context: MathContext,
    decimal_places_result: Option<u32>,
    decimal_places_rounding: Option<u32>,
    strip_trailing_zeros: bool,
    arrays_allowed: bool,
    structures_allowed: bool,
    implicit_multiplication_allowed: bool,
    single_quote_strings_allowed: bool,
    power_higher_precedence: bool,
    allow_overwrite_constants: bool,
    additional_identifier_chars: Vec<char>,
    zone: FixedOffset,
    datetime_formats: Vec<String>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    /// Looks up an operator by its text and kind.
    pub fn operator(&self, kind: OperatorKind, text: &str) -> Option<Arc<dyn Operator>> {
        let map = match kind {
            OperatorKind::Prefix => &self.prefix_operators,
            OperatorKind::Postfix => &self.postfix_operators,
            OperatorKind::Infix => &self.infix_operators,
        };
        map.get(text).cloned()
    }

    /// Whether any registered operator of the given kind starts with `text`.
    /// Drives the tokenizer's greedy operator matching.
    pub fn operator_starts_with(&self, kind: OperatorKind, text: &str) -> bool {
        let map = match kind {
            OperatorKind::Prefix => &self.prefix_operators,
            OperatorKind::Postfix => &self.postfix_operators,
            OperatorKind::Infix => &self.infix_operators,
        };
        map.keys().any(|name| name.starts_with(text))
    }

    /// Whether any character of any registered operator equals `c`.
    pub fn is_operator_character(&self, c: char) -> bool {
        self.prefix_operators
            .keys()
            .chain(self.postfix_operators.keys())
            .chain(self.infix_operators.keys())
            .any(|name| name.contains(c))
    }

    /// Case-insensitive function lookup.
    pub fn function(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(&name.to_uppercase()).cloned()
    }

    /// Case-insensitive constant lookup.
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(&name.to_uppercase())
    }

    pub fn math_context(&self) -> &MathContext {
        &self.math_context
    }

    pub fn decimal_places_result(&self) -> Option<u32> {
        self.decimal_places_result
    }

    pub fn decimal_places_rounding(&self) -> Option<u32> {
        self.decimal_places_rounding
    }

    pub fn strip_trailing_zeros(&self) -> bool {
        self.strip_trailing_zeros
    }

    pub fn arrays_allowed(&self) -> bool {
        self.arrays_allowed
    }

    pub fn structures_allowed(&self) -> bool {
        self.structures_allowed
    }

    pub fn implicit_multiplication_allowed(&self) -> bool {
        self.implicit_multiplication_allowed
    }

    pub fn single_quote_strings_allowed(&self) -> bool {
        self.single_quote_strings_allowed
    }

    pub fn power_higher_precedence(&self) -> bool {
        self.power_higher_precedence
    }

    pub fn allow_overwrite_constants(&self) -> bool {
        self.allow_overwrite_constants
    }

    /// Extra characters accepted inside identifiers, in addition to
    /// alphanumerics and `_`.
    pub fn additional_identifier_chars(&self) -> &[char] {
        &self.additional_identifier_chars
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    pub fn datetime_formats(&self) -> &[String] {
        &self.datetime_formats
    }

    /// Rounds an intermediate numeric result if intermediate rounding is
    /// configured.
    pub fn round_intermediate(&self, value: Decimal) -> Decimal {
        match self.decimal_places_rounding {
            Some(places) => value.round_dp_with_strategy(places, self.math_context.rounding()),
            None => value,
        }
    }

    /// Applies final-result rounding and trailing-zero stripping. The result
    /// is padded out to the configured scale unless stripping is on.
    pub fn round_result(&self, value: Decimal) -> Decimal {
        let rounded = match self.decimal_places_result {
            Some(places) => {
                let mut rounded =
                    value.round_dp_with_strategy(places, self.math_context.rounding());
                rounded.rescale(places);
                rounded
            }
            None => value,
        };
        if self.strip_trailing_zeros {
            rounded.normalize()
        } else {
            rounded
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        ConfigurationBuilder::new().build()
    }
}

/// Fluent builder for [`Configuration`]. Every setter consumes and returns
/// the builder.
pub struct ConfigurationBuilder {
    math_context: MathContext,
    decimal_places_result: Option<u32>,
    decimal_places_rounding: Option<u32>,
    strip_trailing_zeros: bool,
    arrays_allowed: bool,
    structures_allowed: bool,
    implicit_multiplication_allowed: bool,
    single_quote_strings_allowed: bool,
    power_higher_precedence: bool,
    allow_overwrite_constants: bool,
    additional_identifier_chars: Vec<char>,
    zone: FixedOffset,
    datetime_formats: Vec<String>,
    extra_constants: Vec<(String, Value)>,
    extra_operators: Vec<(String, Arc<dyn Operator>)>,
    extra_functions: Vec<(String, Arc<dyn Function>)>,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        ConfigurationBuilder {
            math_context: MathContext::default(),
            decimal_places_result: None,
            decimal_places_rounding: None,
            strip_trailing_zeros: true,
            arrays_allowed: true,
            structures_allowed: true,
            implicit_multiplication_allowed: true,
            single_quote_strings_allowed: false,
            power_higher_precedence: false,
            allow_overwrite_constants: true,
            additional_identifier_chars: Vec::new(),
            zone: Utc.fix(),
            datetime_formats: datetime::default_formats(),
            extra_constants: Vec::new(),
            extra_operators: Vec::new(),
            extra_functions: Vec::new(),
        }
    }

    /// Numeric precision in significant digits.
    pub fn precision(mut self, precision: u32) -> Self {
        self.math_context = self.math_context.with_precision(precision);
        self
    }

    pub fn rounding(mut self, rounding: RoundingStrategy) -> Self {
        self.math_context = self.math_context.with_rounding(rounding);
        self
    }

    /// Fixed number of decimal places for the final result. Unset means
    /// unlimited.
    pub fn decimal_places_result(mut self, places: u32) -> Self {
        self.decimal_places_result = Some(places);
        self
    }

    /// Rounds every intermediate numeric result to this many decimal places.
    /// Unset means unlimited.
    pub fn decimal_places_rounding(mut self, places: u32) -> Self {
        self.decimal_places_rounding = Some(places);
        self
    }

    pub fn strip_trailing_zeros(mut self, strip: bool) -> Self {
        self.strip_trailing_zeros = strip;
        self
    }

    pub fn arrays_allowed(mut self, allowed: bool) -> Self {
        self.arrays_allowed = allowed;
        self
    }

    pub fn structures_allowed(mut self, allowed: bool) -> Self {
        self.structures_allowed = allowed;
        self
    }

    pub fn implicit_multiplication_allowed(mut self, allowed: bool) -> Self {
        self.implicit_multiplication_allowed = allowed;
        self
    }

    pub fn single_quote_strings_allowed(mut self, allowed: bool) -> Self {
        self.single_quote_strings_allowed = allowed;
        self
    }

    /// When set, `^` binds tighter than the unary minus, so `-2^2` is
    /// `-(2^2)`.
    pub fn power_higher_precedence(mut self, higher: bool) -> Self {
        self.power_higher_precedence = higher;
        self
    }

    /// When disabled, constants cannot be shadowed by parameters and are
    /// bound at compile time, which makes expressions over constants fully
    /// foldable.
    pub fn allow_overwrite_constants(mut self, allow: bool) -> Self {
        self.allow_overwrite_constants = allow;
        self
    }

    pub fn additional_identifier_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.additional_identifier_chars.extend(chars);
        self
    }

    pub fn zone(mut self, zone: FixedOffset) -> Self {
        self.zone = zone;
        self
    }

    /// Replaces the date-time parse/format pattern list. The first matching
    /// pattern wins for parsing; the first entry is the default output
    /// format.
    pub fn datetime_formats(mut self, formats: impl IntoIterator<Item = String>) -> Self {
        self.datetime_formats = formats.into_iter().collect();
        self
    }

    /// Adds or replaces a constant.
    pub fn constant(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.extra_constants.push((name.to_uppercase(), value.into()));
        self
    }

    /// Adds or replaces an operator, dispatched to the prefix, postfix or
    /// infix dictionary by its declared kind.
    pub fn operator(mut self, text: &str, definition: Arc<dyn Operator>) -> Self {
        self.extra_operators.push((text.to_string(), definition));
        self
    }

    /// Adds or replaces a function. The name is case-insensitive.
    pub fn function(mut self, name: &str, definition: Arc<dyn Function>) -> Self {
        self.extra_functions.push((name.to_uppercase(), definition));
        self
    }

    pub fn build(self) -> Configuration {
        let mut prefix_operators = HashMap::new();
        let mut postfix_operators = HashMap::new();
        let mut infix_operators = HashMap::new();
        let defaults = default_operators(self.power_higher_precedence)
            .into_iter()
            .map(|(text, definition)| (text.to_string(), definition));
        for (text, definition) in defaults.chain(self.extra_operators) {
            let map = match definition.kind() {
                OperatorKind::Prefix => &mut prefix_operators,
                OperatorKind::Postfix => &mut postfix_operators,
                OperatorKind::Infix => &mut infix_operators,
            };
            map.insert(text, definition);
        }

        let mut functions: HashMap<String, Arc<dyn Function>> = default_functions()
            .into_iter()
            .map(|(name, definition)| (name.to_string(), definition))
            .collect();
        functions.extend(self.extra_functions);

        let mut constants = HashMap::from([
            ("TRUE".to_string(), Value::Boolean(true)),
            ("FALSE".to_string(), Value::Boolean(false)),
            ("NULL".to_string(), Value::Null),
            ("PI".to_string(), Value::Number(Decimal::PI)),
            ("E".to_string(), Value::Number(Decimal::E)),
            (
                "DT_FORMAT_ISO_DATE_TIME".to_string(),
                Value::String(FORMAT_ISO_DATE_TIME.to_string()),
            ),
        ]);
        constants.extend(self.extra_constants);

        Configuration {
            prefix_operators,
            postfix_operators,
            infix_operators,
            functions,
            constants,
            math_context: self.math_context,
            decimal_places_result: self.decimal_places_result,
            decimal_places_rounding: self.decimal_places_rounding,
            strip_trailing_zeros: self.strip_trailing_zeros,
            arrays_allowed: self.arrays_allowed,
            structures_allowed: self.structures_allowed,
            implicit_multiplication_allowed: self.implicit_multiplication_allowed,
            single_quote_strings_allowed: self.single_quote_strings_allowed,
            power_higher_precedence: self.power_higher_precedence,
            allow_overwrite_constants: self.allow_overwrite_constants,
            additional_identifier_chars: self.additional_identifier_chars,
            zone: self.zone,
            datetime_formats: self.datetime_formats,
        }
    }
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        ConfigurationBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dictionaries_are_populated() {
        let config = Configuration::default();
        assert!(config.operator(OperatorKind::Infix, "+").is_some());
        assert!(config.operator(OperatorKind::Prefix, "-").is_some());
        assert!(config.operator(OperatorKind::Postfix, "!").is_some());
        assert!(config.function("sqrt").is_some());
        assert!(config.constant("pi").is_some());
    }

    #[test]
    fn operator_prefix_probe_matches_partial_text() {
        let config = Configuration::default();
        assert!(config.operator_starts_with(OperatorKind::Infix, "&"));
        assert!(!config.operator_starts_with(OperatorKind::Infix, "&|"));
    }

    #[test]
    fn result_rounding_strips_trailing_zeros() {
        let config = Configuration::builder().decimal_places_result(3).build();
        let rounded = config.round_result("2.1000".parse().unwrap());
        assert_eq!(rounded.to_string(), "2.1");
    }

    #[test]
    fn intermediate_rounding_uses_configured_places() {
        let config = Configuration::builder().decimal_places_rounding(2).build();
        let rounded = config.round_intermediate("2.145".parse().unwrap());
        assert_eq!(rounded.to_string(), "2.14");
    }

    #[test]
    fn builder_sets_precision_and_rounding_on_the_math_context() {
        let config = Configuration::builder()
            .precision(4)
            .rounding(RoundingStrategy::MidpointAwayFromZero)
            .build();
        assert_eq!(config.math_context().precision(), 4);
        assert_eq!(
            config.math_context().rounding(),
            RoundingStrategy::MidpointAwayFromZero
        );
    }
}
