use super::ValidationError;
use serde_json::{Map, Value};

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Typed access to a model-supplied argument object.
///
/// Every error names the top-level field it came from, also when the
/// offending value is nested inside it.
pub(crate) struct Args<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    pub(crate) fn new(raw: &'a Value) -> Result<Self, ValidationError> {
        match raw {
            Value::Object(map) => Ok(Self { map }),
            Value::String(_) => Err(ValidationError::new(
                "arguments",
                "arguments are not valid JSON",
            )),
            _ => Err(ValidationError::new(
                "arguments",
                "arguments must be a JSON object",
            )),
        }
    }

    /// Absent and `null` are treated the same.
    pub(crate) fn optional(&self, field: &'static str) -> Option<&'a Value> {
        self.map.get(field).filter(|value| !value.is_null())
    }

    pub(crate) fn required(&self, field: &'static str) -> Result<&'a Value, ValidationError> {
        self.optional(field)
            .ok_or_else(|| ValidationError::new(field, "is required"))
    }

    pub(crate) fn u64(&self, field: &'static str) -> Result<u64, ValidationError> {
        as_u64(field, self.required(field)?)
    }

    pub(crate) fn u32(&self, field: &'static str) -> Result<u32, ValidationError> {
        let value = self.u64(field)?;
        u32::try_from(value).map_err(|_| ValidationError::new(field, "is too large"))
    }

    pub(crate) fn opt_u32(&self, field: &'static str) -> Result<Option<u32>, ValidationError> {
        self.optional(field)
            .map(|value| {
                let value = as_u64(field, value)?;
                u32::try_from(value).map_err(|_| ValidationError::new(field, "is too large"))
            })
            .transpose()
    }

    pub(crate) fn opt_f64(&self, field: &'static str) -> Result<Option<f64>, ValidationError> {
        self.optional(field).map(|value| as_f64(field, value)).transpose()
    }

    pub(crate) fn opt_bool(&self, field: &'static str) -> Result<Option<bool>, ValidationError> {
        self.optional(field).map(|value| as_bool(field, value)).transpose()
    }

    pub(crate) fn opt_str(&self, field: &'static str) -> Result<Option<&'a str>, ValidationError> {
        self.optional(field)
            .map(|value| {
                value
                    .as_str()
                    .ok_or_else(|| ValidationError::new(field, "must be a string"))
            })
            .transpose()
    }

    pub(crate) fn array(&self, field: &'static str) -> Result<&'a Vec<Value>, ValidationError> {
        as_array(field, self.required(field)?)
    }

    pub(crate) fn u64_array(&self, field: &'static str) -> Result<Vec<u64>, ValidationError> {
        self.array(field)?
            .iter()
            .map(|value| as_u64(field, value))
            .collect()
    }

    pub(crate) fn i64_array(&self, field: &'static str) -> Result<Vec<i64>, ValidationError> {
        self.array(field)?
            .iter()
            .map(|value| as_i64(field, value))
            .collect()
    }

    pub(crate) fn f64_array(&self, field: &'static str) -> Result<Vec<f64>, ValidationError> {
        self.array(field)?
            .iter()
            .map(|value| as_f64(field, value))
            .collect()
    }
}

pub(crate) fn as_array<'v>(
    field: &'static str,
    value: &'v Value,
) -> Result<&'v Vec<Value>, ValidationError> {
    value
        .as_array()
        .ok_or_else(|| ValidationError::new(field, "must be an array"))
}

/// Integer from a JSON integer, a float with zero fraction, or a numeric string.
pub(crate) fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

/// Finite number from a JSON number or a numeric string.
pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn integral(number: f64) -> Option<i64> {
    (number.is_finite() && number.fract() == 0.0 && number.abs() <= MAX_SAFE_INTEGER)
        .then_some(number as i64)
}

pub(crate) fn as_i64(field: &'static str, value: &Value) -> Result<i64, ValidationError> {
    coerce_i64(value).ok_or_else(|| {
        ValidationError::new(field, format!("expected an integer, got {}", preview(value)))
    })
}

pub(crate) fn as_u64(field: &'static str, value: &Value) -> Result<u64, ValidationError> {
    let number = as_i64(field, value)?;
    u64::try_from(number)
        .map_err(|_| ValidationError::new(field, format!("must be non-negative, got {number}")))
}

pub(crate) fn as_f64(field: &'static str, value: &Value) -> Result<f64, ValidationError> {
    coerce_f64(value).ok_or_else(|| {
        ValidationError::new(
            field,
            format!("expected a finite number, got {}", preview(value)),
        )
    })
}

pub(crate) fn as_bool(field: &'static str, value: &Value) -> Result<bool, ValidationError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ValidationError::new(field, "must be true or false")),
        },
        _ => Err(ValidationError::new(field, "must be true or false")),
    }
}

/// Short rendering of a value for error messages.
pub(crate) fn preview(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > 40 {
        let cut = (0..=40).rev().find(|&i| text.is_char_boundary(i)).unwrap_or(0);
        text.truncate(cut);
        text.push('…');
    }
    text
}
