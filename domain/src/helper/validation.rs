//! Validation engine: pure payload checks against a [`DomainSchema`]
//!
//! Rules run in a fixed order and stop at the first failure:
//!
//! 1. `name` present and non-empty (create), or non-empty if present (update)
//! 2. Domain-specific required fields present (create only)
//! 3. Per-field type/shape checks, which also normalize values
//! 4. Cross-field invariants, each evaluated only when all referenced fields are present
//!
//! Validation never mutates its input. It returns either a fully normalized
//! payload or a [`ValidationError`] naming the offending field(s).

use super::id::is_valid_object_id;
use super::kind::HelperDomain;
use super::schema::{
    CrossFieldRule, DomainSchema, FieldRule, FieldType, MAX_DURATION_SECS,
    RequiredField,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A validated, type-coerced field set ready for transmission.
pub type NormalizedPayload = Map<String, Value>;

/// Structured validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{rule}")]
pub struct ValidationError {
    /// Offending field names (may be empty for payload-level failures)
    pub fields: Vec<String>,
    /// Human-readable description of the violated rule
    pub rule: String,
}

impl ValidationError {
    pub fn new(fields: &[&str], rule: impl Into<String>) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            rule: rule.into(),
        }
    }

    fn field(field: &str, rule: impl Into<String>) -> Self {
        Self::new(&[field], rule)
    }
}

/// Which kind of payload is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Full payload; required fields enforced
    Create,
    /// Partial payload; every field optional but fully checked when present
    Update,
}

/// Stateless validator for helper payloads.
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn validate_create(
        domain: HelperDomain,
        payload: &Map<String, Value>,
    ) -> Result<NormalizedPayload, ValidationError> {
        Self::validate(DomainSchema::of(domain), payload, ValidationMode::Create)
    }

    pub fn validate_update(
        domain: HelperDomain,
        payload: &Map<String, Value>,
    ) -> Result<NormalizedPayload, ValidationError> {
        Self::validate(DomainSchema::of(domain), payload, ValidationMode::Update)
    }

    /// Validate `payload` against an explicit schema.
    pub fn validate(
        schema: &DomainSchema,
        payload: &Map<String, Value>,
        mode: ValidationMode,
    ) -> Result<NormalizedPayload, ValidationError> {
        if mode == ValidationMode::Update && payload.is_empty() {
            return Err(ValidationError::new(&[], "No update fields provided"));
        }

        // 1. name
        match (payload.get("name"), mode) {
            (None, ValidationMode::Create) => {
                return Err(ValidationError::field("name", "`name` is required"));
            }
            (Some(Value::String(s)), _) if s.trim().is_empty() => {
                return Err(ValidationError::field("name", "`name` must not be empty"));
            }
            (Some(v), _) if !v.is_string() => {
                return Err(ValidationError::field("name", "`name` must be a string"));
            }
            _ => {}
        }

        // 2. domain-specific required fields
        if mode == ValidationMode::Create {
            check_required(schema, payload)?;
        }

        // 3. shape, producing the normalized payload
        let mut normalized = Map::new();
        for (key, value) in payload {
            let normalized_value = if key == "id" {
                normalize_id(schema, value, mode)?
            } else {
                let rule = schema.rule(key).ok_or_else(|| {
                    ValidationError::field(
                        key,
                        format!("Unknown field `{key}` for {}", schema.domain),
                    )
                })?;
                normalize_field(rule, value)?
            };
            normalized.insert(key.clone(), normalized_value);
        }

        // 4. cross-field invariants
        for rule in schema.cross_field_rules {
            check_cross_field(rule, &normalized, mode)?;
        }

        Ok(normalized)
    }
}

fn check_required(
    schema: &DomainSchema,
    payload: &Map<String, Value>,
) -> Result<(), ValidationError> {
    for required in schema.required_create_fields {
        match required {
            RequiredField::Field(name) => {
                if !payload.contains_key(*name) {
                    return Err(ValidationError::field(
                        name,
                        format!("Missing required field `{name}` for {}", schema.domain),
                    ));
                }
            }
            RequiredField::AnyOf(names) => {
                if !names.iter().any(|n| payload.contains_key(*n)) {
                    let list = names
                        .iter()
                        .map(|n| format!("`{n}`"))
                        .collect::<Vec<_>>()
                        .join(" or ");
                    return Err(ValidationError::new(
                        names,
                        format!("{} requires at least one of {list}", schema.domain),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn normalize_id(
    schema: &DomainSchema,
    value: &Value,
    mode: ValidationMode,
) -> Result<Value, ValidationError> {
    if mode == ValidationMode::Update {
        return Err(ValidationError::field(
            "id",
            format!("`id` cannot be changed for {}", schema.domain),
        ));
    }
    normalize_field(&ID_RULE, value)
}

const ID_RULE: FieldRule = FieldRule::new("id", FieldType::Slug);

fn normalize_field(rule: &FieldRule, value: &Value) -> Result<Value, ValidationError> {
    let name = rule.name;
    if value.is_null() {
        return if rule.nullable {
            Ok(Value::Null)
        } else {
            Err(ValidationError::field(name, format!("`{name}` cannot be null")))
        };
    }

    match rule.kind {
        FieldType::Text => match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(value.clone()),
            Some(_) => Err(ValidationError::field(name, format!("`{name}` must not be empty"))),
            None => Err(ValidationError::field(name, format!("`{name}` must be a string"))),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => Err(ValidationError::field(name, format!("`{name}` must be a boolean"))),
        },
        FieldType::Number => match value.as_f64() {
            Some(n) if n.is_finite() => Ok(value.clone()),
            _ => Err(ValidationError::field(name, format!("`{name}` must be a number"))),
        },
        FieldType::Integer { min, max } => {
            let n = as_integer(value).ok_or_else(|| {
                ValidationError::field(name, format!("`{name}` must be an integer"))
            })?;
            if let Some(lo) = min
                && n < lo
            {
                return Err(ValidationError::field(
                    name,
                    format!("`{name}` must be at least {lo}"),
                ));
            }
            if let Some(hi) = max
                && n > hi
            {
                return Err(ValidationError::field(
                    name,
                    format!("`{name}` must be at most {hi}"),
                ));
            }
            Ok(Value::from(n))
        }
        FieldType::Choice(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(value.clone()),
            _ => Err(ValidationError::field(
                name,
                format!("`{name}` must be one of: {}", allowed.join(", ")),
            )),
        },
        FieldType::Options => normalize_options(name, value),
        FieldType::Pattern => match value.as_str() {
            Some(s) => regex::Regex::new(s).map(|_| value.clone()).map_err(|e| {
                ValidationError::field(name, format!("`{name}` is not a valid pattern: {e}"))
            }),
            None => Err(ValidationError::field(name, format!("`{name}` must be a string"))),
        },
        FieldType::Duration => value
            .as_str()
            .and_then(parse_duration)
            .map(|secs| Value::String(format_duration(secs)))
            .ok_or_else(|| {
                ValidationError::field(
                    name,
                    format!("`{name}` must be formatted as HH:MM:SS with minutes and seconds below 60"),
                )
            }),
        FieldType::Slug => match value.as_str() {
            Some(s) if is_valid_object_id(s) => Ok(value.clone()),
            _ => Err(ValidationError::field(
                name,
                format!("`{name}` must contain only lowercase letters, digits and underscores"),
            )),
        },
    }
}

fn normalize_options(name: &str, value: &Value) -> Result<Value, ValidationError> {
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::field(name, format!("`{name}` must be a list of strings")))?;
    if items.is_empty() {
        return Err(ValidationError::field(name, format!("`{name}` must not be empty")));
    }

    let mut seen: Vec<&str> = Vec::with_capacity(items.len());
    for item in items {
        let s = item.as_str().ok_or_else(|| {
            ValidationError::field(name, format!("`{name}` must be a list of strings"))
        })?;
        if s.trim().is_empty() {
            return Err(ValidationError::field(
                name,
                format!("`{name}` must not contain empty entries"),
            ));
        }
        if seen.contains(&s) {
            return Err(ValidationError::field(
                name,
                format!("`{name}` contains duplicate entry '{s}'"),
            ));
        }
        seen.push(s);
    }
    Ok(value.clone())
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Parse `HH:MM:SS` or `HH:MM` into seconds. Hours may have one to three digits.
fn parse_duration(s: &str) -> Option<u64> {
    let parts: Vec<&str> = s.split(':').collect();
    let (h, m, sec) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [h, m] => (*h, *m, "00"),
        _ => return None,
    };
    let hours = parse_component(h, 3)?;
    let minutes = parse_component(m, 2)?;
    let seconds = parse_component(sec, 2)?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Some(hours * 3600 + minutes * 60 + seconds)
}

fn parse_component(s: &str, max_digits: usize) -> Option<u64> {
    if s.is_empty() || s.len() > max_digits || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// A field value that participates in a cross-field rule; `null` counts as absent.
fn present<'a>(payload: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    payload.get(field).filter(|v| !v.is_null())
}

fn check_cross_field(
    rule: &CrossFieldRule,
    payload: &Map<String, Value>,
    mode: ValidationMode,
) -> Result<(), ValidationError> {
    match *rule {
        CrossFieldRule::Ordered { lower, upper } => {
            if let (Some(lo), Some(hi)) = (num(payload, lower), num(payload, upper))
                && lo > hi
            {
                return Err(ValidationError::new(
                    &[lower, upper],
                    format!("`{lower}` ({lo}) must be less than or equal to `{upper}` ({hi})"),
                ));
            }
        }
        CrossFieldRule::Positive(field) => {
            if let Some(v) = num(payload, field)
                && v <= 0.0
            {
                return Err(ValidationError::field(
                    field,
                    format!("`{field}` must be greater than 0"),
                ));
            }
        }
        CrossFieldRule::WithinBounds {
            value,
            lower,
            upper,
        } => {
            if let (Some(v), Some(lo), Some(hi)) =
                (num(payload, value), num(payload, lower), num(payload, upper))
                && (v < lo || v > hi)
            {
                return Err(ValidationError::new(
                    &[value, lower, upper],
                    format!("`{value}` ({v}) must be within [`{lower}`, `{upper}`] ({lo}..={hi})"),
                ));
            }
        }
        CrossFieldRule::MemberOf { value, list } => {
            if let (Some(Value::String(v)), Some(Value::Array(items))) =
                (present(payload, value), present(payload, list))
                && !items.iter().any(|i| i.as_str() == Some(v.as_str()))
            {
                return Err(ValidationError::new(
                    &[value, list],
                    format!("`{value}` '{v}' is not one of the `{list}`"),
                ));
            }
        }
        CrossFieldRule::AnyTrue(fields) => {
            let flags: Vec<Option<bool>> = fields
                .iter()
                .map(|f| present(payload, f).and_then(Value::as_bool))
                .collect();
            let evaluate = match mode {
                ValidationMode::Create => true,
                ValidationMode::Update => flags.iter().all(Option::is_some),
            };
            if evaluate && !flags.iter().any(|f| *f == Some(true)) {
                return Err(ValidationError::new(
                    fields,
                    format!(
                        "At least one of {} must be true",
                        fields
                            .iter()
                            .map(|f| format!("`{f}`"))
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                ));
            }
        }
        CrossFieldRule::DurationInRange(field) => {
            if let Some(secs) = present(payload, field)
                .and_then(Value::as_str)
                .and_then(parse_duration)
                && (secs == 0 || secs >= MAX_DURATION_SECS)
            {
                return Err(ValidationError::field(
                    field,
                    format!("`{field}` must be greater than 00:00:00 and below 100:00:00"),
                ));
            }
        }
    }
    Ok(())
}

fn num(payload: &Map<String, Value>, field: &str) -> Option<f64> {
    present(payload, field).and_then(Value::as_f64)
}
