//! Field-level request validation
//!
//! Issues are collected per request and reported together, in the shape the
//! API returns for 422 responses:
//! `{"type": "...", "loc": ["body", "name"], "msg": "...", "input": ...}`.

use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

static EMAIL: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern compiles")
    })
}

/// One failed constraint on one input field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl FieldIssue {
    pub fn new(kind: &'static str, location: &str, field: &str, msg: impl Into<String>) -> Self {
        Self {
            kind,
            loc: vec![location.to_string(), field.to_string()],
            msg: msg.into(),
            input: None,
        }
    }

    pub fn with_input(mut self, input: impl Into<Value>) -> Self {
        self.input = Some(input.into());
        self
    }
}

/// Collects issues for one request location (`body`, `query`, `form`).
#[derive(Debug)]
pub struct Checker {
    location: &'static str,
    issues: Vec<FieldIssue>,
}

impl Checker {
    pub fn body() -> Self {
        Self::at("body")
    }

    pub fn form() -> Self {
        Self::at("form")
    }

    pub fn query() -> Self {
        Self::at("query")
    }

    fn at(location: &'static str) -> Self {
        Self {
            location,
            issues: Vec::new(),
        }
    }

    /// Character length within `min..=max`.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        if len < min {
            self.push(
                FieldIssue::new(
                    "string_too_short",
                    self.location,
                    field,
                    format!("String should have at least {min} character{}", plural(min)),
                )
                .with_input(value),
            );
        } else if len > max {
            self.push(
                FieldIssue::new(
                    "string_too_long",
                    self.location,
                    field,
                    format!("String should have at most {max} character{}", plural(max)),
                )
                .with_input(value),
            );
        }
        self
    }

    pub fn min_length(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        self.length(field, value, min, usize::MAX)
    }

    pub fn max_length(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            self.length(field, value, 0, max);
        }
        self
    }

    pub fn at_least(&mut self, field: &str, value: Option<i64>, min: i64) -> &mut Self {
        if let Some(value) = value.filter(|v| *v < min) {
            self.push(
                FieldIssue::new(
                    "greater_than_equal",
                    self.location,
                    field,
                    format!("Input should be greater than or equal to {min}"),
                )
                .with_input(value),
            );
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !email_pattern().is_match(value) {
            self.push(
                FieldIssue::new(
                    "value_error",
                    self.location,
                    field,
                    "value is not a valid email address",
                )
                .with_input(value),
            );
        }
        self
    }

    pub fn json_object(&mut self, field: &str, value: &Value) -> &mut Self {
        if !value.is_object() {
            self.push(
                FieldIssue::new(
                    "dict_type",
                    self.location,
                    field,
                    "Input should be a valid dictionary",
                )
                .with_input(value.clone()),
            );
        }
        self
    }

    pub fn push(&mut self, issue: FieldIssue) {
        self.issues.push(issue);
    }

    pub fn finish(self) -> Result<()> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.issues))
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Parse a UUID-valued parameter, reporting a `uuid_parsing` issue on failure.
pub fn parse_uuid(location: &str, field: &str, raw: &str) -> Result<uuid::Uuid> {
    uuid::Uuid::parse_str(raw).map_err(|_| {
        Error::Validation(vec![
            FieldIssue::new("uuid_parsing", location, field, "Input should be a valid UUID.")
                .with_input(raw),
        ])
    })
}

/// Parse an optional `YYYY-MM-DD` form value; blank means absent.
pub fn parse_form_date(field: &str, raw: &str) -> Result<Option<chrono::NaiveDate>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| {
            Error::Validation(vec![
                FieldIssue::new("date_from_datetime_parsing", "form", field, "Input should be a valid date in YYYY-MM-DD format")
                    .with_input(raw),
            ])
        })
}
