//! Request validation gate.
//!
//! A payload type implements [`Shape`]: a loosely typed draft that serde can
//! always build (required fields are `Option`s, numeric fields accept numeric
//! strings) plus the `validator` rules that every draft must satisfy. The
//! [`Valid`] and [`ValidQuery`] extractors run the gate in front of a handler
//! and hand it the normalized value, or reject with every field error at once.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::Form;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::errors::{AppError, FieldError};

/// Where the gate reads its raw payload from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Body,
    Query,
}

pub trait Shape: Sized {
    type Draft: DeserializeOwned + Validate;

    /// Builds the normalized value. Only called once `draft.validate()` passed.
    fn from_draft(draft: Self::Draft) -> Self;
}

/// Runs a raw payload through the gate.
pub fn check<T: Shape>(raw: Map<String, Value>, source: Source) -> Result<T, AppError> {
    if raw.is_empty() {
        return Err(match source {
            Source::Body => AppError::EmptyBody,
            Source::Query => AppError::EmptyRequest,
        });
    }

    let draft: T::Draft = match serde_json::from_value(Value::Object(raw.clone())) {
        Ok(draft) => draft,
        Err(e) => return Err(AppError::Validation(type_errors::<T::Draft>(raw, e))),
    };

    draft
        .validate()
        .map_err(|errors| AppError::Validation(flatten(&errors)))?;

    Ok(T::from_draft(draft))
}

/// Flattens nested `validator` errors into dotted field paths, sorted so the
/// response is stable.
pub fn flatten(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = vec![];
    collect(None, errors, &mut out);
    sort(&mut out);
    out
}

fn sort(errors: &mut [FieldError]) {
    errors.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.error.cmp(&b.error)));
}

fn join(prefix: Option<&str>, field: &str) -> String {
    match prefix {
        Some(p) => format!("{p}.{field}"),
        None => field.to_string(),
    }
}

fn collect(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let path = match (prefix, field.as_str()) {
            (None, "__all__") => "body".to_string(),
            (Some(p), "__all__") => p.to_string(),
            (p, f) => join(p, f),
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    // Schema rules may name the field they judge.
                    let path = match e.params.get("field").and_then(Value::as_str) {
                        Some(target) if field == "__all__" => join(prefix, target),
                        _ => path.clone(),
                    };
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{path} is invalid ({})", e.code));
                    out.push(FieldError::new(path, message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(Some(&path), inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(Some(&format!("{path}.{index}")), inner, out);
                }
            }
        }
    }
}

// ── Type mismatches ──

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

struct Mismatch {
    path: Vec<Segment>,
    message: String,
}

fn dotted(path: &[Segment]) -> String {
    if path.is_empty() {
        return "body".to_string();
    }
    path.iter()
        .map(|segment| match segment {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Rebuilds a payload that holds only `leaf` at `path`. Array positions keep
/// a single element; the index only matters for reporting.
fn isolate(path: &[Segment], leaf: Value) -> Value {
    path.iter().rev().fold(leaf, |inner, segment| match segment {
        Segment::Key(key) => {
            let mut map = Map::new();
            map.insert(key.clone(), inner);
            Value::Object(map)
        }
        Segment::Index(_) => Value::Array(vec![inner]),
    })
}

fn accepts<D: DeserializeOwned>(path: &[Segment], leaf: Value) -> Result<(), serde_json::Error> {
    serde_json::from_value::<D>(isolate(path, leaf)).map(|_| ())
}

/// Finds the deepest values that do not deserialize into `D`. Drafts keep
/// their fields optional, so a payload holding a single field only fails when
/// that field has the wrong type.
fn locate<D: DeserializeOwned>(path: &mut Vec<Segment>, value: &Value, out: &mut Vec<Mismatch>) {
    let Err(e) = accepts::<D>(path, value.clone()) else {
        return;
    };

    let children: Vec<(Segment, &Value)> = match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, v)| (Segment::Key(key.clone()), v))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, v)| (Segment::Index(index), v))
            .collect(),
        _ => vec![],
    };
    let empty = match value {
        Value::Object(_) => Some(Value::Object(Map::new())),
        Value::Array(_) => Some(Value::Array(vec![])),
        _ => None,
    };

    // A container of the wrong kind is reported whole.
    let before = out.len();
    if empty.is_some_and(|empty| accepts::<D>(path, empty).is_ok()) {
        for (segment, child) in children {
            path.push(segment);
            locate::<D>(path, child, out);
            path.pop();
        }
    }
    if out.len() == before {
        out.push(Mismatch {
            path: path.clone(),
            message: e.to_string(),
        });
    }
}

/// Drops the value at `path`. Array elements become empty objects so later
/// indices keep their positions.
fn remove_at(root: &mut Value, path: &[Segment]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        let next = match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map.get_mut(key),
            (Segment::Index(index), Value::Array(items)) => items.get_mut(*index),
            _ => None,
        };
        match next {
            Some(next) => node = next,
            None => return,
        }
    }
    match (last, node) {
        (Segment::Key(key), Value::Object(map)) => {
            map.remove(key);
        }
        (Segment::Index(index), Value::Array(items)) => {
            if let Some(item) = items.get_mut(*index) {
                *item = Value::Object(Map::new());
            }
        }
        _ => {}
    }
}

/// Reports every mistyped field under its own path, together with the rule
/// violations of the rest of the payload.
fn type_errors<D: DeserializeOwned + Validate>(
    raw: Map<String, Value>,
    cause: serde_json::Error,
) -> Vec<FieldError> {
    let mut root = Value::Object(raw);
    let mut mismatches = vec![];
    locate::<D>(&mut vec![], &root, &mut mismatches);
    if mismatches.is_empty() || mismatches.iter().any(|m| m.path.is_empty()) {
        return vec![FieldError::new("body", cause.to_string())];
    }

    let mistyped: Vec<String> = mismatches.iter().map(|m| dotted(&m.path)).collect();
    let covered = |field: &str| {
        mistyped.iter().any(|path| {
            field == path.as_str()
                || field
                    .strip_prefix(path.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    };

    for mismatch in &mismatches {
        remove_at(&mut root, &mismatch.path);
    }

    let mut errors: Vec<FieldError> = mismatches
        .into_iter()
        .map(|m| {
            let field = dotted(&m.path);
            let message = format!("{field} has an invalid value: {}", m.message);
            FieldError::new(field, message)
        })
        .collect();

    if let Ok(draft) = serde_json::from_value::<D>(root) {
        if let Err(rest) = draft.validate() {
            errors.extend(flatten(&rest).into_iter().filter(|e| !covered(&e.field)));
        }
    }

    sort(&mut errors);
    errors
}

// ── Extractors ──

/// Validated request body, JSON or url-encoded form.
pub struct Valid<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: Shape + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        let raw = if is_form {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| body_error(e.body_text()))?;
            fields
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect()
        } else {
            let bytes = axum::body::Bytes::from_request(req, state)
                .await
                .map_err(|e| body_error(e.body_text()))?;
            parse_json_object(&bytes)?
        };

        check(raw, Source::Body).map(Valid)
    }
}

/// Validated query string.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: Shape + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| body_error(e.body_text()))?;

        let raw = params
            .into_iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        check(raw, Source::Query).map(ValidQuery)
    }
}

fn parse_json_object(bytes: &[u8]) -> Result<Map<String, Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(body_error("request body must be a JSON object")),
        Err(e) => Err(body_error(format!("malformed JSON: {e}"))),
    }
}

fn body_error(message: impl Into<String>) -> AppError {
    AppError::Validation(vec![FieldError::new("body", message)])
}

// ── Shared field rules ──

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("time regex is valid"));

static UZ_PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^998\d{9}$").expect("phone regex is valid"));

pub fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::from(message))
}

/// A schema-level rule reported under `field` instead of the whole payload.
pub fn field_rule(
    field: &'static str,
    code: &'static str,
    message: &'static str,
) -> ValidationError {
    let mut error = rule(code, message);
    error.add_param(Cow::from("field"), &field);
    error
}

pub fn only_digits(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(rule("digits", "must contain only digits"))
    }
}

pub fn clock_time(value: &str) -> Result<(), ValidationError> {
    if TIME_RE.is_match(value) {
        Ok(())
    } else {
        Err(rule("time", "must be in HH:MM 24-hour format"))
    }
}

pub fn uz_phone_number(value: &str) -> Result<(), ValidationError> {
    if UZ_PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(rule("phone", "phone_number must be in format 998XXXXXXXXX"))
    }
}
