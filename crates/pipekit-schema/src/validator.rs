use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::Validator;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::fields::{Extra, FieldSet, Rule};
use crate::formats;

/// The condition a field-level failure falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The value has the wrong JSON type.
    TypeInvalid,
    /// A required field is missing.
    RequiredFieldInvalid,
    /// The document carries keys its schema does not name.
    ExtraKeysNotAllowed,
    /// The action is not one the schema accepts.
    ActionInvalid,
    CommercialModelTypeInvalid,
    UseTypeInvalid,
    DatetimeInvalid,
    /// Any other rule (literal mismatch, unknown format, ...).
    ValueInvalid,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::TypeInvalid => "type.invalid",
            ErrorKind::RequiredFieldInvalid => "required.missing",
            ErrorKind::ExtraKeysNotAllowed => "extra_keys.not_allowed",
            ErrorKind::ActionInvalid => "action.invalid",
            ErrorKind::CommercialModelTypeInvalid => "commercial_model_type.invalid",
            ErrorKind::UseTypeInvalid => "use_type.invalid",
            ErrorKind::DatetimeInvalid => "datetime.invalid",
            ErrorKind::ValueInvalid => "value.invalid",
        }
    }

    fn from_kind(kind: &ValidationErrorKind) -> Self {
        match kind {
            ValidationErrorKind::Type { .. } => ErrorKind::TypeInvalid,
            ValidationErrorKind::Required { .. } => ErrorKind::RequiredFieldInvalid,
            ValidationErrorKind::AdditionalProperties { .. } => ErrorKind::ExtraKeysNotAllowed,
            ValidationErrorKind::Format { format, .. } => match &**format {
                formats::ACTION => ErrorKind::ActionInvalid,
                formats::COMMERCIAL_MODEL_TYPE => ErrorKind::CommercialModelTypeInvalid,
                formats::USE_TYPE => ErrorKind::UseTypeInvalid,
                formats::OFFSET_DATETIME => ErrorKind::DatetimeInvalid,
                _ => ErrorKind::ValueInvalid,
            },
            _ => ErrorKind::ValueInvalid,
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One raw failure reported by the structural validator.
///
/// `path` is a JSON pointer into the validated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ErrorKind,
    pub path: String,
    pub message: String,
}

/// A field-level failure, resolved against the document that failed.
///
/// `value` is only populated for type mismatches, where the offending
/// field was present in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub error: ErrorKind,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Resolve raw violations into [`ValidationError`]s.
///
/// For type mismatches the offending value is found by walking the
/// violation's path into `original`, and its JSON type is appended to the
/// message. Every other violation keeps the validator's message and has
/// no value.
pub fn iter_errors<'a>(
    violations: &'a [Violation],
    original: &'a Value,
) -> impl Iterator<Item = ValidationError> + 'a {
    violations.iter().map(move |violation| {
        let value = match violation.kind {
            ErrorKind::TypeInvalid => original.pointer(&violation.path).cloned(),
            _ => None,
        };
        let message = match &value {
            Some(found) => format!("{}, got {}", violation.message, json_type_name(found)),
            None => violation.message.clone(),
        };

        ValidationError {
            error: violation.kind,
            path: violation.path.clone(),
            message,
            value,
        }
    })
}

/// Name of a value's JSON type.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A document that failed validation (`schema.invalid`).
///
/// Carries the original document and every violation found, never just
/// the first.
#[derive(Debug, Clone, thiserror::Error)]
#[error("schema.invalid: document does not match {schema} ({} errors)", .violations.len())]
pub struct SchemaInvalid {
    pub schema: String,
    pub document: Value,
    pub violations: Vec<Violation>,
}

impl SchemaInvalid {
    pub const CODE: &'static str = "schema.invalid";

    pub fn code(&self) -> &'static str {
        Self::CODE
    }

    /// Field-level errors resolved against the carried document.
    pub fn errors(&self) -> impl Iterator<Item = ValidationError> + '_ {
        iter_errors(&self.violations, &self.document)
    }
}

enum SchemaKind {
    Single { source: Value, validator: Validator },
    AnyOf(Vec<Schema>),
}

/// A compiled document schema.
pub struct Schema {
    name: String,
    kind: SchemaKind,
}

impl Schema {
    /// Compile a JSON Schema document.
    pub fn compile(name: impl Into<String>, source: &Value) -> Result<Self> {
        let name = name.into();
        let validator = formats::compile(source).map_err(|message| SchemaError::CompileFailed {
            name: name.clone(),
            message,
        })?;
        Ok(Self {
            name,
            kind: SchemaKind::Single {
                source: source.clone(),
                validator,
            },
        })
    }

    /// Compile a field set.
    pub fn from_fields(name: impl Into<String>, fields: &FieldSet, extra: Extra) -> Result<Self> {
        Self::compile(name, &fields.to_schema(extra))
    }

    /// Compile a single rule, for documents that are not objects.
    pub fn from_rule(name: impl Into<String>, rule: &Rule) -> Result<Self> {
        Self::compile(name, &rule.to_schema())
    }

    /// A schema that accepts a document matching any one alternative.
    ///
    /// Alternatives are tried in order and the first match wins. When none
    /// match, the last alternative's violations are reported.
    pub fn any_of(name: impl Into<String>, alternatives: Vec<Schema>) -> Result<Self> {
        let name = name.into();
        if alternatives.is_empty() {
            return Err(SchemaError::CompileFailed {
                name,
                message: "any-of schema needs at least one alternative".to_string(),
            });
        }
        Ok(Self {
            name,
            kind: SchemaKind::AnyOf(alternatives),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The JSON Schema this was compiled from (`None` for any-of schemas).
    pub fn source(&self) -> Option<&Value> {
        match &self.kind {
            SchemaKind::Single { source, .. } => Some(source),
            SchemaKind::AnyOf(_) => None,
        }
    }

    /// Alternatives of an any-of schema (empty otherwise).
    pub fn alternatives(&self) -> &[Schema] {
        match &self.kind {
            SchemaKind::Single { .. } => &[],
            SchemaKind::AnyOf(alternatives) => alternatives,
        }
    }

    /// Every violation of this schema in `document`; empty when valid.
    pub fn violations(&self, document: &Value) -> Vec<Violation> {
        match &self.kind {
            SchemaKind::Single { validator, .. } => validator
                .iter_errors(document)
                .map(|err| Violation {
                    kind: ErrorKind::from_kind(err.kind()),
                    path: err.instance_path().to_string(),
                    message: err.to_string(),
                })
                .collect(),
            SchemaKind::AnyOf(alternatives) => {
                let mut last = Vec::new();
                for alternative in alternatives {
                    let violations = alternative.violations(document);
                    if violations.is_empty() {
                        tracing::trace!(
                            schema = %self.name,
                            alternative = %alternative.name,
                            "any-of alternative matched"
                        );
                        return violations;
                    }
                    tracing::debug!(
                        schema = %self.name,
                        alternative = %alternative.name,
                        errors = violations.len(),
                        "any-of alternative did not match"
                    );
                    last = violations;
                }
                last
            }
        }
    }

    pub fn is_valid(&self, document: &Value) -> bool {
        match &self.kind {
            SchemaKind::Single { validator, .. } => validator.is_valid(document),
            SchemaKind::AnyOf(alternatives) => alternatives.iter().any(|alt| alt.is_valid(document)),
        }
    }

    /// Validate a document, returning it unchanged on success.
    pub fn validate(&self, document: Value) -> std::result::Result<Value, SchemaInvalid> {
        let violations = self.violations(&document);
        if violations.is_empty() {
            return Ok(document);
        }
        Err(SchemaInvalid {
            schema: self.name.clone(),
            document,
            violations,
        })
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaKind::Single { .. } => f.debug_struct("Schema").field("name", &self.name).finish(),
            SchemaKind::AnyOf(alternatives) => f
                .debug_struct("Schema")
                .field("name", &self.name)
                .field("any_of", alternatives)
                .finish(),
        }
    }
}

/// Validate `document`, logging every field error before failing with
/// [`SchemaInvalid`].
pub fn validate_schema(schema: &Schema, document: Value) -> std::result::Result<Value, SchemaInvalid> {
    schema.validate(document).inspect_err(log_invalid)
}

pub(crate) fn log_invalid(invalid: &SchemaInvalid) {
    for error in invalid.errors() {
        tracing::warn!(
            schema = %invalid.schema,
            error = error.error.code(),
            path = %error.path,
            message = %error.message,
            "schema validation error"
        );
    }
}
