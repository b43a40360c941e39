//! Parameter contracts and pure argument validation.
//!
//! Each tool declares an ordered list of [`ParamSpec`]s. [`validate`] turns the
//! caller's untyped JSON arguments into a [`ValidatedRequest`] holding typed
//! values, or fails with an `InvalidArgument` [`ToolError`] naming the
//! offending parameter. Validation never performs I/O.

use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::registry::{ToolDefinition, ToolId};
use crate::{CalendarDate, Period, PriceInterval, Ticker, ToolError, ValidationError};

/// Semantic type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Ticker,
    Period,
    Date,
    Interval,
    PositiveInt,
}

impl ParamType {
    /// Coerce a raw JSON value into a typed parameter value.
    pub fn coerce(self, value: &Value) -> Result<ParamValue, ValidationError> {
        match self {
            Self::Ticker => Ticker::parse(expect_str(value)?).map(ParamValue::Ticker),
            Self::Period => Period::from_str(expect_str(value)?).map(ParamValue::Period),
            Self::Date => CalendarDate::parse(expect_str(value)?).map(ParamValue::Date),
            Self::Interval => {
                PriceInterval::from_str(expect_str(value)?).map(ParamValue::Interval)
            }
            Self::PositiveInt => coerce_positive_int(value).map(ParamValue::Integer),
        }
    }

    fn json_schema(self) -> Value {
        match self {
            // Surrounding whitespace is trimmed before the ticker is checked.
            Self::Ticker => json!({
                "type": "string",
                "pattern": "^\\s*[A-Za-z][A-Za-z0-9.-]{0,14}\\s*$",
            }),
            Self::Period => json!({
                "type": "string",
                "enum": Period::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
            }),
            Self::Date => json!({ "type": "string", "format": "date" }),
            Self::Interval => json!({
                "type": "string",
                "enum": PriceInterval::ALL.iter().map(|i| i.as_str()).collect::<Vec<_>>(),
            }),
            Self::PositiveInt => json!({ "type": "integer", "minimum": 1 }),
        }
    }
}

/// Default applied to an optional parameter before type checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Text(&'static str),
    Integer(i64),
}

impl DefaultValue {
    fn to_value(self) -> Value {
        match self {
            Self::Text(text) => Value::from(text),
            Self::Integer(number) => Value::from(number),
        }
    }
}

/// Declaration of one accepted tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(
        name: &'static str,
        param_type: ParamType,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type,
            required: true,
            default: None,
            description,
        }
    }

    pub const fn optional(
        name: &'static str,
        param_type: ParamType,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            param_type,
            required: false,
            default: None,
            description,
        }
    }

    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// JSON Schema fragment published in the tool listing.
    pub fn json_schema(&self) -> Value {
        let mut schema = self.param_type.json_schema();
        schema["description"] = Value::from(self.description);
        if let Some(default) = self.default {
            schema["default"] = default.to_value();
        }
        schema
    }
}

/// Typed, normalized argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Ticker(Ticker),
    Period(Period),
    Date(CalendarDate),
    Interval(PriceInterval),
    Integer(u32),
}

impl ParamValue {
    /// Wire representation used as a query parameter value.
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Ticker(ticker) => ticker.to_string(),
            Self::Period(period) => period.to_string(),
            Self::Date(date) => date.to_string(),
            Self::Interval(interval) => interval.to_string(),
            Self::Integer(number) => number.to_string(),
        }
    }
}

/// Arguments that passed validation, in the tool's declared parameter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    tool: ToolId,
    values: Vec<(&'static str, ParamValue)>,
}

impl ValidatedRequest {
    pub const fn tool(&self) -> ToolId {
        self.tool
    }

    pub fn values(&self) -> &[(&'static str, ParamValue)] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| value)
    }

    pub fn ticker(&self) -> Option<&Ticker> {
        match self.get("ticker") {
            Some(ParamValue::Ticker(ticker)) => Some(ticker),
            _ => None,
        }
    }

    fn date(&self, name: &str) -> Option<CalendarDate> {
        match self.get(name) {
            Some(ParamValue::Date(date)) => Some(*date),
            _ => None,
        }
    }
}

/// Validate raw caller arguments against a tool definition.
pub fn validate(
    definition: &ToolDefinition,
    raw_args: &Map<String, Value>,
) -> Result<ValidatedRequest, ToolError> {
    if let Some(unknown) = raw_args
        .keys()
        .find(|name| definition.param(name.as_str()).is_none())
    {
        return Err(ToolError::unknown_argument(unknown));
    }

    let mut values = Vec::with_capacity(definition.params.len());
    for spec in definition.params {
        let supplied = raw_args.get(spec.name).filter(|value| !value.is_null());
        let raw = match (supplied, spec.default) {
            (Some(value), _) => value.clone(),
            (None, Some(default)) => default.to_value(),
            (None, None) if spec.required => return Err(ToolError::missing_argument(spec.name)),
            (None, None) => continue,
        };

        let value = spec
            .param_type
            .coerce(&raw)
            .map_err(|error| ToolError::invalid_argument(spec.name, &error))?;
        values.push((spec.name, value));
    }

    let request = ValidatedRequest {
        tool: definition.id,
        values,
    };
    check_date_range(&request)?;
    Ok(request)
}

fn check_date_range(request: &ValidatedRequest) -> Result<(), ToolError> {
    if let (Some(start), Some(end)) = (request.date("start_date"), request.date("end_date")) {
        if start > end {
            return Err(ToolError::invalid_argument(
                "start_date",
                &ValidationError::InvertedDateRange {
                    start: start.to_string(),
                    end: end.to_string(),
                },
            ));
        }
    }
    Ok(())
}

fn expect_str(value: &Value) -> Result<&str, ValidationError> {
    value.as_str().ok_or(ValidationError::WrongType {
        expected: "string",
        actual: value_type_name(value),
    })
}

fn coerce_positive_int(value: &Value) -> Result<u32, ValidationError> {
    let number = match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                int
            } else if let Some(float) = number.as_f64().filter(|f| f.fract() == 0.0) {
                // Assistants sometimes send `5.0` for integers.
                float as i64
            } else {
                return Err(ValidationError::NotAnInteger {
                    value: number.to_string(),
                });
            }
        }
        Value::String(text) => {
            text.trim()
                .parse::<i64>()
                .map_err(|_| ValidationError::NotAnInteger {
                    value: text.clone(),
                })?
        }
        other => {
            return Err(ValidationError::WrongType {
                expected: "integer",
                actual: value_type_name(other),
            })
        }
    };

    if number <= 0 {
        return Err(ValidationError::NotPositive { value: number });
    }
    u32::try_from(number).map_err(|_| ValidationError::NotAnInteger {
        value: number.to_string(),
    })
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
