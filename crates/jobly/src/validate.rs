//! Changeset-style validation of request bodies.
//!
//! Request bodies arrive as JSON objects. [`Body`] reads typed fields out of
//! one, collecting every problem into [`ValidationErrors`] instead of stopping
//! at the first.

use crate::error::{JoblyError, JoblyResult};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, OnceLock};

/// A machine-friendly validation code.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationCode {
    Required,
    Type,
    Len,
    Range,
    Regex,
    Url,
    Unknown,
    Custom(String),
}

impl ValidationCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "required",
            Self::Type => "type",
            Self::Len => "len",
            Self::Range => "range",
            Self::Regex => "regex",
            Self::Url => "url",
            Self::Unknown => "unknown",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl Serialize for ValidationCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A single field validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub code: ValidationCode,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A collection of validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub items: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, err: ValidationError) {
        self.items.push(err);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.items.iter()
    }

    /// Returns `true` if any error was recorded against `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.items.iter().any(|e| e.field == field)
    }

    /// All messages joined with `"; "`.
    pub fn summary(&self) -> String {
        self.items
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Best-effort URL validation.
pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// Returns `true` if `value` matches the provided regex `pattern`.
///
/// # Panics
/// Panics if `pattern` is not a valid regex. This is considered a developer
/// configuration error.
pub fn regex_is_match(pattern: &'static str, value: &str) -> bool {
    static CACHE: OnceLock<Mutex<HashMap<&'static str, regex::Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    let regex = {
        let mut cache = cache.lock().expect("regex cache poisoned");
        if let Some(re) = cache.get(pattern) {
            re.clone()
        } else {
            let re = regex::Regex::new(pattern)
                .unwrap_or_else(|e| panic!("invalid regex pattern: {pattern:?}: {e}"));
            cache.insert(pattern, re.clone());
            re
        }
    };

    regex.is_match(value)
}

/// Typed field reader over a JSON request body.
///
/// Every accessor records its own failure and returns `None`, so a caller can
/// read all fields and then call [`Body::finish`] once.
pub struct Body<'a> {
    map: &'a Map<String, Value>,
    errors: ValidationErrors,
}

impl<'a> Body<'a> {
    /// Open `value` as a body whose keys must all appear in `allowed`.
    ///
    /// A non-object body is a `BadRequest`; unknown keys are recorded as
    /// validation errors.
    pub fn open(value: &'a Value, allowed: &[&str]) -> JoblyResult<Self> {
        let Value::Object(map) = value else {
            return Err(JoblyError::bad_request("request body must be a JSON object"));
        };

        let allowed: BTreeSet<&str> = allowed.iter().copied().collect();
        let mut errors = ValidationErrors::default();
        for key in map.keys() {
            if !allowed.contains(key.as_str()) {
                errors.push(ValidationError::new(
                    key.as_str(),
                    ValidationCode::Unknown,
                    format!("{key} is not allowed"),
                ));
            }
        }

        Ok(Self { map, errors })
    }

    /// Returns `true` if the body has no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Record a custom error.
    pub fn reject(&mut self, err: ValidationError) {
        self.errors.push(err);
    }

    fn missing(&mut self, field: &str) {
        self.errors.push(ValidationError::new(
            field,
            ValidationCode::Required,
            format!("{field} is required"),
        ));
    }

    fn wrong_type(&mut self, field: &str, expected: &str) {
        self.errors.push(
            ValidationError::new(
                field,
                ValidationCode::Type,
                format!("{field} must be {expected}"),
            )
            .with_metadata("expected", expected),
        );
    }

    /// A string field; `None` when absent or invalid.
    pub fn string(&mut self, field: &str, required: bool) -> Option<String> {
        match self.map.get(field) {
            None => {
                if required {
                    self.missing(field);
                }
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.wrong_type(field, "a string");
                None
            }
        }
    }

    /// A string field with a character-length range.
    pub fn string_len(
        &mut self,
        field: &str,
        required: bool,
        min: usize,
        max: Option<usize>,
    ) -> Option<String> {
        let s = self.string(field, required)?;
        let len = s.chars().count();
        if len < min || max.is_some_and(|max| len > max) {
            let mut err = ValidationError::new(
                field,
                ValidationCode::Len,
                match max {
                    Some(max) => format!("{field} must be {min} to {max} characters"),
                    None => format!("{field} must be at least {min} characters"),
                },
            )
            .with_metadata("min", min);
            if let Some(max) = max {
                err = err.with_metadata("max", max);
            }
            self.errors.push(err);
            return None;
        }
        Some(s)
    }

    /// A string field that must be a URL.
    pub fn url(&mut self, field: &str, required: bool) -> Option<String> {
        let s = self.string(field, required)?;
        if !is_url(&s) {
            self.errors.push(ValidationError::new(
                field,
                ValidationCode::Url,
                format!("{field} must be a URL"),
            ));
            return None;
        }
        Some(s)
    }

    /// An integer field with a lower bound.
    pub fn int(&mut self, field: &str, required: bool, min: i64) -> Option<i32> {
        let value = match self.map.get(field) {
            None => {
                if required {
                    self.missing(field);
                }
                return None;
            }
            Some(v) => v,
        };

        let Some(n) = value.as_i64() else {
            self.wrong_type(field, "an integer");
            return None;
        };
        match i32::try_from(n) {
            Ok(n) if i64::from(n) >= min => Some(n),
            _ => {
                self.errors.push(
                    ValidationError::new(
                        field,
                        ValidationCode::Range,
                        format!("{field} must be an integer >= {min}"),
                    )
                    .with_metadata("min", min),
                );
                None
            }
        }
    }

    /// A decimal field given as a JSON number or a numeric string, within
    /// `min..=max`.
    pub fn decimal(
        &mut self,
        field: &str,
        required: bool,
        min: Decimal,
        max: Decimal,
    ) -> Option<Decimal> {
        let parsed = match self.map.get(field) {
            None => {
                if required {
                    self.missing(field);
                }
                return None;
            }
            Some(Value::String(s)) => s.trim().parse::<Decimal>().ok(),
            Some(Value::Number(n)) => n.to_string().parse::<Decimal>().ok(),
            Some(_) => None,
        };

        let Some(d) = parsed else {
            self.wrong_type(field, "a number");
            return None;
        };
        if d < min || d > max {
            self.errors.push(ValidationError::new(
                field,
                ValidationCode::Range,
                format!("{field} must be between {min} and {max}"),
            ));
            return None;
        }
        Some(d)
    }

    /// Finish reading, returning every collected error.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}
