//! # Field Validation
//!
//! This module provides the field-validation model for the scoring API. A
//! field is a named, typed slot with a required/nullable policy and a
//! format check. Field *definitions* are immutable descriptors shared
//! read-only across concurrent requests; actual values live in per-request
//! storage owned by the request schemas, never in the descriptor itself.
//!
//! Validation runs as a two-stage pipeline composed once per field kind:
//!
//! 1. **Presence check** — decides whether an empty value (JSON null or the
//!    kind's empty sentinel) is acceptable given the required/nullable
//!    flags. Empty values that pass skip the format check entirely.
//! 2. **Format check** — a JSON type check followed by a kind-specific
//!    format rule (email shape, phone shape, calendar date, gender code,
//!    integer list).
//!
//! Every failure is reported as a single [`ValidationError`] naming the
//! field and the violated constraint.
//!
//! ## Usage Examples
//!
//! ```rust
//! use scoring::{FieldDef, FieldKind};
//! use serde_json::json;
//!
//! let phone = FieldDef::new("phone", FieldKind::Phone, false, true);
//! assert!(phone.validate(&json!("79175002040")).is_ok());
//! assert!(phone.validate(&json!(79175002040u64)).is_ok());
//! assert!(phone.validate(&json!("89175002040")).is_err());
//! assert!(phone.validate(&json!("")).is_ok()); // nullable: empty accepted
//! ```

use std::sync::LazyLock;

use chrono::{Duration, Local, NaiveDate};
use regex::Regex;
use serde_json::Value;

/// Gender code for "unknown".
pub const UNKNOWN: i64 = 0;
/// Gender code for "male".
pub const MALE: i64 = 1;
/// Gender code for "female".
pub const FEMALE: i64 = 2;

/// The date format accepted by [`FieldKind::Date`] and [`FieldKind::BirthDay`].
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// The maximum accepted age, in years, for [`FieldKind::BirthDay`].
pub const MAX_AGE_YEARS: i64 = 70;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+@\w+\.\w+$").expect("email pattern compiles"));
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^7\d{10}$").expect("phone pattern compiles"));

////////////////////////////////////////////// FieldKind //////////////////////////////////////////

/// The value type and format rule a field enforces on non-empty values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any string.
    Char,
    /// A string matching `local@domain.tld`.
    Email,
    /// A string or integer matching `7` followed by ten digits.
    Phone,
    /// A JSON object holding method-specific arguments.
    Arguments,
    /// A string parsing as a `DD.MM.YYYY` calendar date.
    Date,
    /// A date no later than today and no more than seventy years back.
    BirthDay,
    /// An integer gender code: 0 unknown, 1 male, 2 female.
    Gender,
    /// A list in which every element is an integer.
    ClientIds,
}

impl FieldKind {
    /// The JSON type name used in type-mismatch messages.
    fn expected_type(&self) -> &'static str {
        match self {
            Self::Char | Self::Email | Self::Date | Self::BirthDay => "a string",
            Self::Phone => "a string or an integer",
            Self::Arguments => "an object",
            Self::Gender => "an integer",
            Self::ClientIds => "a list",
        }
    }

    /// The empty sentinel bound when a field is absent from the input.
    ///
    /// String-typed kinds (and Gender, which shares the envelope's string
    /// sentinel) bind an empty string; Arguments binds an empty object and
    /// ClientIds an empty list.
    pub fn empty_sentinel(&self) -> Value {
        match self {
            Self::Arguments => Value::Object(serde_json::Map::new()),
            Self::ClientIds => Value::Array(Vec::new()),
            _ => Value::String(String::new()),
        }
    }

    /// Whether `value` is the empty sentinel for this kind (or JSON null).
    pub fn is_empty(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) if s.is_empty() => !matches!(self, Self::Arguments | Self::ClientIds),
            Value::Object(m) if m.is_empty() => matches!(self, Self::Arguments),
            Value::Array(a) if a.is_empty() => matches!(self, Self::ClientIds),
            _ => false,
        }
    }
}

////////////////////////////////////////////// FieldDef ///////////////////////////////////////////

/// An immutable field descriptor: name, policy flags, and value kind.
///
/// Descriptors are declared as `static` slices per request schema and are
/// shared read-only across all in-flight requests. They carry no value
/// state, so validating one request can never leak values into another.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// The field's name as it appears in request arguments and errors.
    pub name: &'static str,
    /// The value kind this field enforces.
    pub kind: FieldKind,
    /// Whether the key must be present in the input.
    pub required: bool,
    /// Whether an empty value is acceptable.
    pub nullable: bool,
}

impl FieldDef {
    /// Creates a new field descriptor.
    pub const fn new(name: &'static str, kind: FieldKind, required: bool, nullable: bool) -> Self {
        Self {
            name,
            kind,
            required,
            nullable,
        }
    }

    /// Validates a raw JSON value against this descriptor.
    ///
    /// Runs the presence check first; non-empty values then get the kind's
    /// type and format checks. Returns the first violation encountered.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        if self.kind.is_empty(value) {
            if self.nullable {
                return Ok(());
            }
            if self.required {
                return Err(ValidationError::Required { field: self.name });
            }
            return Err(ValidationError::NotNullable { field: self.name });
        }
        self.check_format(value)
    }

    fn check_format(&self, value: &Value) -> Result<(), ValidationError> {
        match self.kind {
            FieldKind::Char => self.require_str(value).map(|_| ()),
            FieldKind::Email => {
                let s = self.require_str(value)?;
                if EMAIL_PATTERN.is_match(s) {
                    Ok(())
                } else {
                    self.bad_format(format!("'{}' is not a valid email address", s))
                }
            }
            FieldKind::Phone => {
                let normalized = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) if n.is_i64() || n.is_u64() => n.to_string(),
                    _ => return self.type_mismatch(),
                };
                if PHONE_PATTERN.is_match(&normalized) {
                    Ok(())
                } else {
                    self.bad_format(format!("'{}' is not a valid phone number", normalized))
                }
            }
            FieldKind::Arguments => {
                if value.is_object() {
                    Ok(())
                } else {
                    self.type_mismatch()
                }
            }
            FieldKind::Date => {
                let s = self.require_str(value)?;
                self.parse_date(s).map(|_| ())
            }
            FieldKind::BirthDay => {
                let s = self.require_str(value)?;
                let date = self.parse_date(s)?;
                // One wall-clock read per validation so a request straddling
                // midnight cannot flap between outcomes.
                let today = Local::now().date_naive();
                if date > today {
                    return self.bad_format(format!(
                        "value must not be later than {}",
                        today.format(DATE_FORMAT)
                    ));
                }
                if date + Duration::days(365 * MAX_AGE_YEARS) < today {
                    return self.bad_format(format!("age is over {} years", MAX_AGE_YEARS));
                }
                Ok(())
            }
            FieldKind::Gender => match value.as_i64() {
                Some(g) if g == UNKNOWN || g == MALE || g == FEMALE => Ok(()),
                Some(g) => self.bad_format(format!("value must be 0, 1 or 2, not {}", g)),
                None => self.type_mismatch(),
            },
            FieldKind::ClientIds => {
                let items = match value {
                    Value::Array(items) => items,
                    _ => return self.type_mismatch(),
                };
                if items.iter().all(|v| v.is_i64() || v.is_u64()) {
                    Ok(())
                } else {
                    self.bad_format("every element must be an integer".to_string())
                }
            }
        }
    }

    fn require_str<'a>(&self, value: &'a Value) -> Result<&'a str, ValidationError> {
        value.as_str().ok_or(ValidationError::TypeMismatch {
            field: self.name,
            expected: self.kind.expected_type(),
        })
    }

    fn parse_date(&self, s: &str) -> Result<NaiveDate, ValidationError> {
        NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| ValidationError::BadFormat {
            field: self.name,
            reason: format!("'{}' does not parse as {}", s, "DD.MM.YYYY"),
        })
    }

    fn type_mismatch(&self) -> Result<(), ValidationError> {
        Err(ValidationError::TypeMismatch {
            field: self.name,
            expected: self.kind.expected_type(),
        })
    }

    fn bad_format(&self, reason: String) -> Result<(), ValidationError> {
        Err(ValidationError::BadFormat {
            field: self.name,
            reason,
        })
    }
}

////////////////////////////////////////// ValidationError ////////////////////////////////////////

/// A single field presence, type, or format violation, or a failed
/// cross-field business rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required, non-nullable field was empty or absent.
    Required {
        /// The name of the offending field.
        field: &'static str,
    },
    /// An optional but non-nullable field carried an empty value.
    NotNullable {
        /// The name of the offending field.
        field: &'static str,
    },
    /// The value's JSON type doesn't match the field kind.
    TypeMismatch {
        /// The name of the offending field.
        field: &'static str,
        /// Human-readable description of the accepted type.
        expected: &'static str,
    },
    /// The value has the right type but the wrong format.
    BadFormat {
        /// The name of the offending field.
        field: &'static str,
        /// Human-readable description of the violation.
        reason: String,
    },
    /// No qualifying field pair was present on an online-score request.
    NoRequiredPair,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Required { field } => write!(f, "field '{}' is required", field),
            Self::NotNullable { field } => write!(f, "field '{}' must not be empty", field),
            Self::TypeMismatch { field, expected } => {
                write!(f, "field '{}' must be {}", field, expected)
            }
            Self::BadFormat { field, reason } => write!(f, "field '{}': {}", field, reason),
            Self::NoRequiredPair => write!(
                f,
                "at least one pair of (phone, email), (first_name, last_name), \
                 (gender, birthday) must be present with non-empty values"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}
