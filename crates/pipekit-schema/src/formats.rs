//! Custom field validators.
//!
//! Each validator checks one value against a closed enumeration or a
//! format rule and fails with its own [`FieldError`] variant. The same
//! checks are registered with `jsonschema` as named formats so field
//! rules can refer to them with [`crate::fields::Rule::Format`].

use chrono::{DateTime, FixedOffset};
use jsonschema::Validator;
use serde_json::Value;

use crate::error::FieldError;

/// Format name for [`commercial_model_type`].
pub const COMMERCIAL_MODEL_TYPE: &str = "commercial-model-type";
/// Format name for a single [`use_type`] item.
pub const USE_TYPE: &str = "use-type";
/// Format name for [`offset_datetime`].
pub const OFFSET_DATETIME: &str = "offset-date-time";
/// Format name for [`action`].
pub const ACTION: &str = "catalog-action";

pub const COMMERCIAL_MODEL_TYPES: [&str; 5] = [
    "AdvertisementSupportedModel",
    "DeviceFeeModel",
    "PayAsYouGoModel",
    "RightsClaimModel",
    "SubscriptionModel",
];

pub const USE_TYPES: [&str; 4] = [
    "ConditionalDownload",
    "NonInteractiveStream",
    "OnDemandStream",
    "PermanentDownload",
];

/// Actions accepted on product-family documents (case-insensitive).
pub const VALID_ACTIONS: [&str; 2] = ["upsert", "takedown"];

/// Return `value` unchanged if it names a known commercial model.
pub fn commercial_model_type(value: &str) -> Result<&str, FieldError> {
    if COMMERCIAL_MODEL_TYPES.contains(&value) {
        Ok(value)
    } else {
        Err(FieldError::CommercialModelTypeInvalid(value.to_string()))
    }
}

/// Return `values` unchanged if every item names a known use type.
pub fn use_type<S: AsRef<str>>(values: &[S]) -> Result<&[S], FieldError> {
    match values
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|value| !USE_TYPES.contains(value))
    {
        Some(bad) => Err(FieldError::UseTypeInvalid(bad.to_string())),
        None => Ok(values),
    }
}

/// Parse an RFC 3339 date-time that carries an explicit UTC offset.
pub fn offset_datetime(value: &str) -> Result<DateTime<FixedOffset>, FieldError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| FieldError::DatetimeInvalid(value.to_string()))
}

/// Return `value` unchanged if it is an accepted action, ignoring case.
pub fn action(value: &str) -> Result<&str, FieldError> {
    let lower = value.to_ascii_lowercase();
    if VALID_ACTIONS.contains(&lower.as_str()) {
        Ok(value)
    } else {
        Err(FieldError::ActionInvalid(value.to_string()))
    }
}

fn is_commercial_model_type(value: &str) -> bool {
    commercial_model_type(value).is_ok()
}

fn is_use_type(value: &str) -> bool {
    use_type(&[value]).is_ok()
}

fn is_offset_datetime(value: &str) -> bool {
    offset_datetime(value).is_ok()
}

fn is_action(value: &str) -> bool {
    action(value).is_ok()
}

/// Compile a JSON Schema with the custom formats registered and format
/// assertions switched on.
pub(crate) fn compile(schema: &Value) -> Result<Validator, String> {
    jsonschema::options()
        .should_validate_formats(true)
        .with_format(COMMERCIAL_MODEL_TYPE, is_commercial_model_type)
        .with_format(USE_TYPE, is_use_type)
        .with_format(OFFSET_DATETIME, is_offset_datetime)
        .with_format(ACTION, is_action)
        .build(schema)
        .map_err(|err| err.to_string())
}
