//! Declarative, side-effect-free validation of untyped JSON input.
//!
//! A [`Schema`] is a list of [`Field`] rules. Parsing walks the rules in
//! declaration order, coerces what may be coerced (numeric strings), fills in
//! defaults, strips unknown keys and collects every failure into a single
//! [`ValidationError`] instead of stopping at the first one.
//!
//! Resource schemas live in the submodules and are built once behind
//! `once_cell::sync::Lazy`.

pub mod auth;
pub mod client;
pub mod communication_log;
pub mod company;
pub mod employee;
pub mod member;
pub mod milestone;
pub mod pagination;
pub mod payment;
pub mod project;

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

/// Validated, defaulted record keyed by wire (camelCase) field names.
pub type Record = Map<String, Value>;

pub const TITLES: &[&str] = &["mr", "mrs", "ms", "dr", "prof", "sr"];
pub const GENDERS: &[&str] = &["male", "female", "other"];
pub const PERSON_STATUSES: &[&str] = &["active", "inactive", "pending"];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email regex is valid")
});

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        let path = if field.is_empty() { vec![] } else { vec![field.to_string()] };
        Self { path, message: message.into() }
    }
}

/// Aggregate of every issue found while parsing one input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Validation failed: {}", summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        Self { issues: vec![Issue::new(field, message)] }
    }

    /// Whether any issue points at `field`.
    pub fn has_issue_for(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.path.first().map(String::as_str) == Some(field))
    }
}

fn summarize(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| {
            if i.path.is_empty() {
                i.message.clone()
            } else {
                format!("{}: {}", i.path.join("."), i.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of [`Schema::safe_parse`]. Never panics, never returns `Err`.
#[derive(Debug, Clone)]
pub enum SafeParse {
    Success(Record),
    Failure(ValidationError),
}

impl SafeParse {
    pub fn success(&self) -> bool {
        matches!(self, SafeParse::Success(_))
    }

    pub fn data(&self) -> Option<&Record> {
        match self {
            SafeParse::Success(data) => Some(data),
            SafeParse::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            SafeParse::Success(_) => None,
            SafeParse::Failure(err) => Some(err),
        }
    }
}

/// What a partial (update) schema does with fields that carry a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialDefaults {
    /// Omitted defaulted fields are filled in, exactly as on create.
    Apply,
    /// Omitted fields stay omitted; the result is a pure patch.
    Skip,
}

#[derive(Debug, Clone)]
pub enum Kind {
    Text { min: Option<usize>, max: Option<usize> },
    Email,
    Uuid,
    Enum(&'static [&'static str]),
    Number { min: Option<f64>, max: Option<f64>, integer: bool },
    Boolean,
    /// `YYYY-MM-DD` or a full RFC 3339 datetime.
    Date,
    /// RFC 3339 datetime with offset.
    DateTime,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub optional: bool,
    pub nullable: bool,
    pub allow_empty: bool,
    pub default: Option<Value>,
    pub message: Option<&'static str>,
}

impl Field {
    fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            optional: false,
            nullable: false,
            allow_empty: false,
            default: None,
            message: None,
        }
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, Kind::Text { min: None, max: None })
    }

    pub fn email(name: &'static str) -> Self {
        Self::new(name, Kind::Email)
    }

    pub fn uuid(name: &'static str) -> Self {
        Self::new(name, Kind::Uuid)
    }

    pub fn one_of(name: &'static str, values: &'static [&'static str]) -> Self {
        Self::new(name, Kind::Enum(values))
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, Kind::Number { min: None, max: None, integer: false })
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, Kind::Number { min: None, max: None, integer: true })
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, Kind::Boolean)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, Kind::Date)
    }

    pub fn datetime(name: &'static str) -> Self {
        Self::new(name, Kind::DateTime)
    }

    /// Minimum length for text fields, minimum value for numbers.
    pub fn min(mut self, bound: f64) -> Self {
        match &mut self.kind {
            Kind::Text { min, .. } => *min = Some(bound as usize),
            Kind::Number { min, .. } => *min = Some(bound),
            _ => {}
        }
        self
    }

    pub fn max(mut self, bound: f64) -> Self {
        match &mut self.kind {
            Kind::Text { max, .. } => *max = Some(bound as usize),
            Kind::Number { max, .. } => *max = Some(bound),
            _ => {}
        }
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Accept `""` as a valid "no value" for email fields.
    pub fn or_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Message used for the field's constraint failures.
    pub fn message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    fn check(&self, value: &Value) -> Result<Value, String> {
        match &self.kind {
            Kind::Text { min, max } => {
                let s = expect_str(value)?;
                let len = s.chars().count();
                if let Some(min) = min {
                    if len < *min {
                        return Err(self.msg(format!("String must contain at least {} character(s)", min)));
                    }
                }
                if let Some(max) = max {
                    if len > *max {
                        return Err(self.msg(format!("String must contain at most {} character(s)", max)));
                    }
                }
                Ok(Value::String(s.to_string()))
            }
            Kind::Email => {
                let s = expect_str(value)?;
                if (s.is_empty() && self.allow_empty) || EMAIL_RE.is_match(s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(self.msg("Invalid email".to_string()))
                }
            }
            Kind::Uuid => {
                let s = expect_str(value)?;
                // Canonical lowercase so stored references compare equal to path ids.
                match Uuid::parse_str(s) {
                    Ok(id) if s.len() == 36 => Ok(Value::String(id.to_string())),
                    _ => Err(self.msg("Invalid uuid".to_string())),
                }
            }
            Kind::Enum(domain) => {
                let s = expect_str(value)?;
                if domain.contains(&s) {
                    Ok(Value::String(s.to_string()))
                } else {
                    let expected = domain.iter().map(|d| format!("'{}'", d)).collect::<Vec<_>>().join(" | ");
                    Err(self.msg(format!("Invalid enum value. Expected {}, received '{}'", expected, s)))
                }
            }
            Kind::Number { min, max, integer } => {
                let n = coerce_number(value)?;
                if *integer && n.fract() != 0.0 {
                    return Err("Expected integer, received float".to_string());
                }
                if let Some(min) = min {
                    if n < *min {
                        return Err(self.msg(format!("Number must be greater than or equal to {}", min)));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(self.msg(format!("Number must be less than or equal to {}", max)));
                    }
                }
                Ok(number_value(n))
            }
            Kind::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                other => Err(format!("Expected boolean, received {}", type_name(other))),
            },
            Kind::Date => {
                let s = expect_str(value)?;
                if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok() {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(self.msg("Invalid date".to_string()))
                }
            }
            Kind::DateTime => {
                let s = expect_str(value)?;
                if DateTime::parse_from_rfc3339(s).is_ok() {
                    Ok(Value::String(s.to_string()))
                } else {
                    Err(self.msg("Invalid datetime".to_string()))
                }
            }
        }
    }

    fn msg(&self, fallback: String) -> String {
        self.message.map(str::to_string).unwrap_or(fallback)
    }
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("Expected string, received {}", type_name(value)))
}

/// Number or numeric string. Blank strings coerce to 0.
fn coerce_number(value: &Value) -> Result<f64, String> {
    let n = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| "Expected number".to_string())?,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| "Expected number, received nan".to_string())?,
        other => return Err(format!("Expected number, received {}", type_name(other))),
    };
    if n.is_finite() {
        Ok(n)
    } else {
        Err("Expected number, received nan".to_string())
    }
}

/// Integral values are emitted as JSON integers so `0` stays `0`, not `0.0`.
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: &'static str, fields: Vec<Field>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Same rules with every field optional.
    pub fn partial(&self, defaults: PartialDefaults) -> Schema {
        let fields = self
            .fields
            .iter()
            .cloned()
            .map(|mut f| {
                f.optional = true;
                if defaults == PartialDefaults::Skip {
                    f.default = None;
                }
                f
            })
            .collect();
        Schema { name: self.name, fields }
    }

    pub fn parse(&self, input: &Value) -> Result<Record, ValidationError> {
        let obj = match input {
            Value::Object(obj) => obj,
            other => {
                return Err(ValidationError::single(
                    "",
                    format!("Expected object, received {}", type_name(other)),
                ))
            }
        };

        let mut out = Record::new();
        let mut issues = Vec::new();

        for field in &self.fields {
            match obj.get(field.name) {
                None => {
                    if let Some(default) = &field.default {
                        out.insert(field.name.to_string(), default.clone());
                    } else if !field.optional {
                        issues.push(Issue::new(field.name, "Required"));
                    }
                }
                Some(Value::Null) if field.nullable => {
                    out.insert(field.name.to_string(), Value::Null);
                }
                Some(value) => match field.check(value) {
                    Ok(v) => {
                        out.insert(field.name.to_string(), v);
                    }
                    Err(message) => issues.push(Issue::new(field.name, message)),
                },
            }
        }

        if issues.is_empty() {
            Ok(out)
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn safe_parse(&self, input: &Value) -> SafeParse {
        match self.parse(input) {
            Ok(data) => SafeParse::Success(data),
            Err(err) => SafeParse::Failure(err),
        }
    }
}
