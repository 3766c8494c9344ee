//! Date-time and duration functions.
//!
//! Zone-less inputs are interpreted in the configured time zone offset;
//! formats come from the configuration's pattern list unless given
//! explicitly. Unlike the silent value coercions, these functions fail on
//! unparseable input.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::context::EvaluationContext;
use crate::datetime;
use crate::error::EvaluationError;
use crate::function::{Function, Parameter};
use crate::functions::basic::number_argument;
use crate::token::Token;
use crate::value::Value;

fn integer_argument(token: &Token, value: &Value) -> Result<i64, EvaluationError> {
    number_argument(token, value)?
        .to_i64()
        .ok_or_else(|| EvaluationError::InvalidArgument {
            position: token.position(),
            message: format!("{} requires integer arguments", token.text()),
        })
}

fn string_argument(token: &Token, value: &Value) -> Result<String, EvaluationError> {
    value
        .as_string()
        .ok_or_else(|| EvaluationError::InvalidArgument {
            position: token.position(),
            message: format!("{} does not accept a null argument", token.text()),
        })
}

/// `DT_NOW()`: the current instant. Never folded.
pub struct Now;

impl Function for Now {
    fn parameters(&self) -> &[Parameter] {
        &[]
    }

    fn is_foldable(&self) -> bool {
        false
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        _token: &Token,
        _arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        Ok(Value::DateTime(Utc::now()))
    }
}

/// `DT_DATE_NEW(year, month, day[, hour, minute, second, millisecond])` in
/// the configured zone.
pub struct DateNew;

impl Function for DateNew {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[
            Parameter::new("year"),
            Parameter::new("month"),
            Parameter::new("day"),
            Parameter::new("timeParts").var_arg(),
        ];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let year = integer_argument(token, &arguments[0])?;
        let month = integer_argument(token, &arguments[1])?;
        let day = integer_argument(token, &arguments[2])?;
        let mut time_parts = [0i64; 4];
        for (slot, argument) in time_parts.iter_mut().zip(&arguments[3..]) {
            *slot = integer_argument(token, argument)?;
        }

        let invalid = || EvaluationError::InvalidArgument {
            position: token.position(),
            message: format!(
                "no valid date for year {}, month {}, day {}",
                year, month, day
            ),
        };
        let date = NaiveDate::from_ymd_opt(
            i32::try_from(year).map_err(|_| invalid())?,
            u32::try_from(month).map_err(|_| invalid())?,
            u32::try_from(day).map_err(|_| invalid())?,
        )
        .ok_or_else(invalid)?;
        let naive = date
            .and_hms_milli_opt(
                u32::try_from(time_parts[0]).map_err(|_| invalid())?,
                u32::try_from(time_parts[1]).map_err(|_| invalid())?,
                u32::try_from(time_parts[2]).map_err(|_| invalid())?,
                u32::try_from(time_parts[3]).map_err(|_| invalid())?,
            )
            .ok_or_else(invalid)?;
        let zone = context.configuration().zone();
        let instant = naive
            .and_local_timezone(zone)
            .earliest()
            .ok_or_else(invalid)?;
        Ok(Value::DateTime(instant.with_timezone(&Utc)))
    }
}

/// `DT_PARSE(string[, format])`: parses with the given pattern, or the
/// configured pattern list (first match wins). Fails on unparseable input.
pub struct Parse;

impl Function for Parse {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value"), Parameter::new("format").var_arg()];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let text = string_argument(token, &arguments[0])?;
        let configuration = context.configuration();
        let formats = match arguments.get(1) {
            Some(format) => vec![string_argument(token, format)?],
            None => configuration.datetime_formats().to_vec(),
        };
        datetime::parse_instant(&text, &formats, configuration.zone())
            .map(Value::DateTime)
            .ok_or_else(|| EvaluationError::InvalidArgument {
                position: token.position(),
                message: format!("'{}' is not a parseable date-time", text),
            })
    }
}

/// `DT_FORMAT(dateTime[, format])`: renders in the configured zone with the
/// given pattern, defaulting to the first configured pattern.
pub struct Format;

impl Function for Format {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[
            Parameter::new("dateTime"),
            Parameter::new("format").var_arg(),
        ];
        PARAMETERS
    }

    fn evaluate(
        &self,
        context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let instant =
            arguments[0]
                .as_datetime()
                .ok_or_else(|| EvaluationError::InvalidArgument {
                    position: token.position(),
                    message: "DT_FORMAT does not accept a null argument".to_string(),
                })?;
        let configuration = context.configuration();
        let format = match arguments.get(1) {
            Some(format) => string_argument(token, format)?,
            None => configuration
                .datetime_formats()
                .first()
                .cloned()
                .unwrap_or_else(|| "%Y-%m-%dT%H:%M:%S%.f%:z".to_string()),
        };
        Ok(Value::String(datetime::format_instant(
            instant,
            &format,
            configuration.zone(),
        )))
    }
}

/// `DT_EPOCH(dateTime)`: milliseconds since the epoch.
pub struct Epoch;

impl Function for Epoch {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("dateTime")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let instant =
            arguments[0]
                .as_datetime()
                .ok_or_else(|| EvaluationError::InvalidArgument {
                    position: token.position(),
                    message: "DT_EPOCH does not accept a null argument".to_string(),
                })?;
        Ok(Value::Number(Decimal::from(instant.timestamp_millis())))
    }
}

/// `DT_DURATION_NEW(days[, hours, minutes, seconds, millis])`
pub struct DurationNew;

impl Function for DurationNew {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[
            Parameter::new("days"),
            Parameter::new("timeParts").var_arg(),
        ];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let mut parts = [0i64; 5];
        for (slot, argument) in parts.iter_mut().zip(arguments) {
            *slot = integer_argument(token, argument)?;
        }
        let [days, hours, minutes, seconds, millis] = parts;
        let duration = Duration::days(days)
            + Duration::hours(hours)
            + Duration::minutes(minutes)
            + Duration::seconds(seconds)
            + Duration::milliseconds(millis);
        Ok(Value::Duration(duration))
    }
}

/// `DT_DURATION_PARSE(string)`: ISO-8601 duration. Fails on unparseable
/// input.
pub struct DurationParse;

impl Function for DurationParse {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("value")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let text = string_argument(token, &arguments[0])?;
        datetime::parse_duration(&text)
            .map(Value::Duration)
            .ok_or_else(|| EvaluationError::InvalidArgument {
                position: token.position(),
                message: format!("'{}' is not a parseable duration", text),
            })
    }
}

/// `DT_DURATION_MILLIS(duration)`
pub struct DurationMillis;

impl Function for DurationMillis {
    fn parameters(&self) -> &[Parameter] {
        const PARAMETERS: &[Parameter] = &[Parameter::new("duration")];
        PARAMETERS
    }

    fn evaluate(
        &self,
        _context: &EvaluationContext,
        token: &Token,
        arguments: &[Value],
    ) -> Result<Value, EvaluationError> {
        let duration =
            arguments[0]
                .as_duration()
                .ok_or_else(|| EvaluationError::InvalidArgument {
                    position: token.position(),
                    message: "DT_DURATION_MILLIS does not accept a null argument".to_string(),
                })?;
        Ok(Value::Number(Decimal::from(duration.num_milliseconds())))
    }
}
