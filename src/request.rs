//! # Request Schemas
//!
//! This module composes field descriptors into the named request schemas of
//! the scoring API: the top-level [`MethodRequest`] envelope and the two
//! method-argument schemas, [`OnlineScoreRequest`] and
//! [`ClientsInterestsRequest`].
//!
//! Each schema declares a static, ordered list of [`FieldDef`]s. Construction
//! binds every declared field in declaration order, substituting the kind's
//! empty sentinel for absent or null keys; it never fails. `validate_fields`
//! walks the declared order, stops at the first violation, and then runs the
//! schema's cross-field rule if it has one.
//!
//! After a successful validation a schema exposes a `context`: a small
//! mapping derived deterministically from the validated values and used for
//! logging, never for the client-visible response body.
//!
//! ## Usage Examples
//!
//! ```rust
//! use scoring::OnlineScoreRequest;
//! use serde_json::json;
//!
//! let args = json!({"phone": "79175002040", "email": "stupnikov@otus.ru"});
//! let request = OnlineScoreRequest::from_args(args.as_object().unwrap());
//! request.validate_fields().unwrap();
//! assert_eq!(request.context()["has"], json!(["email", "phone"]));
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::field::{DATE_FORMAT, FieldDef, FieldKind, ValidationError};

/// The login that selects the administrative identity.
pub const ADMIN_LOGIN: &str = "admin";

/// A derived observability mapping, merged into the request log context.
pub type Context = Map<String, Value>;

///////////////////////////////////////////// FieldValues /////////////////////////////////////////

/// Per-instance value storage shared by all schema types.
///
/// Values are keyed by field name and owned by the schema instance, so two
/// concurrent requests can never observe each other's state through the
/// shared descriptors.
#[derive(Debug, Clone)]
struct FieldValues {
    fields: &'static [FieldDef],
    values: HashMap<&'static str, Value>,
}

impl FieldValues {
    /// Binds each declared field from `args` in declaration order. Absent or
    /// null keys bind the field kind's empty sentinel.
    fn bind(fields: &'static [FieldDef], args: &Map<String, Value>) -> Self {
        let mut values = HashMap::with_capacity(fields.len());
        for def in fields {
            let value = match args.get(def.name) {
                Some(Value::Null) | None => def.kind.empty_sentinel(),
                Some(v) => v.clone(),
            };
            values.insert(def.name, value);
        }
        Self { fields, values }
    }

    /// Validates every declared field in declaration order, failing fast.
    fn validate(&self) -> Result<(), ValidationError> {
        for def in self.fields {
            def.validate(&self.values[def.name])?;
        }
        Ok(())
    }

    fn get(&self, name: &str) -> &Value {
        &self.values[name]
    }

    fn def(&self, name: &str) -> &FieldDef {
        self.fields
            .iter()
            .find(|d| d.name == name)
            .expect("accessors name declared fields only")
    }

    /// Whether the named field carries a non-empty value.
    fn is_present(&self, name: &str) -> bool {
        !self.def(name).kind.is_empty(self.get(name))
    }

    /// The names of all non-empty fields, in declaration order.
    fn present_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|d| !d.kind.is_empty(&self.values[d.name]))
            .map(|d| d.name)
            .collect()
    }

    fn str_value(&self, name: &str) -> Option<String> {
        match self.get(name) {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

//////////////////////////////////////////// MethodRequest ////////////////////////////////////////

/// The top-level request envelope wrapping method-specific arguments.
#[derive(Debug, Clone)]
pub struct MethodRequest {
    values: FieldValues,
}

impl MethodRequest {
    /// The envelope's declared fields, in declaration order.
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("account", FieldKind::Char, false, true),
        FieldDef::new("login", FieldKind::Char, true, true),
        FieldDef::new("token", FieldKind::Char, true, true),
        FieldDef::new("arguments", FieldKind::Arguments, true, true),
        FieldDef::new("method", FieldKind::Char, true, false),
    ];

    /// Binds an envelope from a parsed JSON object. Never fails; malformed
    /// values surface from [`MethodRequest::validate_fields`].
    pub fn from_args(args: &Map<String, Value>) -> Self {
        Self {
            values: FieldValues::bind(Self::FIELDS, args),
        }
    }

    /// Validates every envelope field in declaration order.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        self.values.validate()
    }

    /// The caller's account name, empty when absent.
    pub fn account(&self) -> &str {
        self.values.get("account").as_str().unwrap_or("")
    }

    /// The caller's login, empty when absent.
    pub fn login(&self) -> &str {
        self.values.get("login").as_str().unwrap_or("")
    }

    /// The supplied authentication token, empty when absent.
    pub fn token(&self) -> &str {
        self.values.get("token").as_str().unwrap_or("")
    }

    /// The method name to dispatch on.
    pub fn method(&self) -> &str {
        self.values.get("method").as_str().unwrap_or("")
    }

    /// The method-specific arguments, unvalidated by the envelope.
    pub fn arguments(&self) -> Map<String, Value> {
        match self.values.get("arguments") {
            Value::Object(m) => m.clone(),
            _ => Map::new(),
        }
    }

    /// Whether the caller is the administrative identity.
    pub fn is_admin(&self) -> bool {
        self.login() == ADMIN_LOGIN
    }
}

////////////////////////////////////////// OnlineScoreRequest /////////////////////////////////////

/// Arguments for the `online_score` method.
///
/// All fields are individually optional and nullable; the cross-field rule
/// requires at least one fully-present pair out of (phone, email),
/// (first_name, last_name), (gender, birthday). Gender 0 (unknown) counts as
/// present.
#[derive(Debug, Clone)]
pub struct OnlineScoreRequest {
    values: FieldValues,
}

impl OnlineScoreRequest {
    /// The schema's declared fields, in declaration order.
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("first_name", FieldKind::Char, false, true),
        FieldDef::new("last_name", FieldKind::Char, false, true),
        FieldDef::new("email", FieldKind::Email, false, true),
        FieldDef::new("phone", FieldKind::Phone, false, true),
        FieldDef::new("birthday", FieldKind::BirthDay, false, true),
        FieldDef::new("gender", FieldKind::Gender, false, true),
    ];

    /// Binds the schema from a method-arguments object.
    pub fn from_args(args: &Map<String, Value>) -> Self {
        Self {
            values: FieldValues::bind(Self::FIELDS, args),
        }
    }

    /// Validates every field, then the at-least-one-pair business rule.
    ///
    /// The pair rule runs only after all individual fields pass, so its
    /// failure always means "well-formed but insufficient", never "malformed".
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        self.values.validate()?;
        let pairs = [
            ("phone", "email"),
            ("first_name", "last_name"),
            ("gender", "birthday"),
        ];
        let satisfied = pairs
            .iter()
            .any(|(a, b)| self.values.is_present(a) && self.values.is_present(b));
        if satisfied {
            Ok(())
        } else {
            Err(ValidationError::NoRequiredPair)
        }
    }

    /// Context: the declared-order names of all non-empty fields.
    pub fn context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.insert("has".to_string(), Value::from(self.values.present_names()));
        ctx
    }

    /// The first name, when present.
    pub fn first_name(&self) -> Option<String> {
        self.values.str_value("first_name")
    }

    /// The last name, when present.
    pub fn last_name(&self) -> Option<String> {
        self.values.str_value("last_name")
    }

    /// The email address, when present.
    pub fn email(&self) -> Option<String> {
        self.values.str_value("email")
    }

    /// The phone number normalized to a string, when present.
    pub fn phone(&self) -> Option<String> {
        match self.values.get("phone") {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The parsed birthday, when present and well-formed.
    pub fn birthday(&self) -> Option<NaiveDate> {
        let s = self.values.str_value("birthday")?;
        NaiveDate::parse_from_str(&s, DATE_FORMAT).ok()
    }

    /// The gender code, when present.
    pub fn gender(&self) -> Option<i64> {
        self.values.get("gender").as_i64()
    }
}

///////////////////////////////////////// ClientsInterestsRequest /////////////////////////////////

/// Arguments for the `clients_interests` method.
#[derive(Debug, Clone)]
pub struct ClientsInterestsRequest {
    values: FieldValues,
}

impl ClientsInterestsRequest {
    /// The schema's declared fields, in declaration order.
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef::new("client_ids", FieldKind::ClientIds, true, false),
        FieldDef::new("date", FieldKind::Date, false, true),
    ];

    /// Binds the schema from a method-arguments object.
    pub fn from_args(args: &Map<String, Value>) -> Self {
        Self {
            values: FieldValues::bind(Self::FIELDS, args),
        }
    }

    /// Validates every field in declaration order. No cross-field rule.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        self.values.validate()
    }

    /// Context: the number of client ids in the request.
    pub fn context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.insert(
            "nclients".to_string(),
            Value::from(self.client_ids().len()),
        );
        ctx
    }

    /// The requested client ids.
    pub fn client_ids(&self) -> Vec<i64> {
        match self.values.get("client_ids") {
            Value::Array(items) => items.iter().filter_map(Value::as_i64).collect(),
            _ => Vec::new(),
        }
    }
}
