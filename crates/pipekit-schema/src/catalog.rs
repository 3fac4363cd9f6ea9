//! Catalog document schemas.
//!
//! Every function here builds a fresh value; nothing is cached except the
//! registry behind [`builtin`].

use once_cell::sync::OnceCell;

use crate::error::Result;
use crate::fields::{compose, Extra, FieldSet, Rule};
use crate::formats::{ACTION, COMMERCIAL_MODEL_TYPE, OFFSET_DATETIME, USE_TYPE};
use crate::registry::SchemaRegistry;
use crate::validator::Schema;

pub const PRODUCT: &str = "product";
pub const TRACK: &str = "track";
pub const TRACK_BUNDLE: &str = "track_bundle";
pub const TAKEDOWN: &str = "takedown";
pub const PURGE: &str = "purge";
pub const DELIVERY: &str = "delivery";

/// Document kinds with a built-in schema.
pub const KINDS: [&str; 6] = [PRODUCT, TRACK, TRACK_BUNDLE, TAKEDOWN, PURGE, DELIVERY];

/// Alternatives a delivery may match, in the order they are tried.
pub const DELIVERY_ALTERNATIVES: [&str; 3] = [TRACK_BUNDLE, TAKEDOWN, PURGE];

pub fn artist() -> FieldSet {
    FieldSet::new()
        .required("name", Rule::String)
        .optional("url", Rule::String)
}

/// A contributor and their role on a track.
pub fn participant() -> FieldSet {
    FieldSet::new()
        .required("name", Rule::String)
        .required("role", Rule::String)
}

pub fn copyright() -> FieldSet {
    FieldSet::new()
        .required("text", Rule::String)
        .optional("year", Rule::Integer)
}

/// A media file. `count` and `number` mostly appear on images.
pub fn media() -> FieldSet {
    FieldSet::new()
        .optional("count", Rule::Integer)
        .optional("number", Rule::Integer)
        .required("source", Rule::String)
}

pub fn physical_product() -> FieldSet {
    FieldSet::new()
        .required("artist", Rule::String)
        .required("name", Rule::String)
        .required("upc", Rule::String)
}

pub fn release() -> FieldSet {
    FieldSet::new()
        .required("date", Rule::String)
        .required("year", Rule::Integer)
}

pub fn sub_label() -> FieldSet {
    FieldSet::new()
        .required("name", Rule::String)
        .required("countries", Rule::list_of(Rule::String))
}

pub fn label() -> FieldSet {
    FieldSet::new()
        .required("name", Rule::String)
        .required("sub_labels", Rule::list_of(Rule::object(sub_label())))
}

pub fn provider() -> FieldSet {
    FieldSet::new()
        .required("name", Rule::String)
        .required("labels", Rule::list_of(Rule::object(label())))
}

/// Availability of a product in one territory.
pub fn sales_territory() -> FieldSet {
    FieldSet::new()
        .required("country_code", Rule::String)
        .optional("price_code", Rule::String)
        .required("sales_start_date", Rule::String)
        .optional("sales_end_date", Rule::String)
        .optional("commercial_model_type", Rule::Format(COMMERCIAL_MODEL_TYPE))
        .optional("use_types", Rule::list_of(Rule::Format(USE_TYPE)))
        .optional("valid_from", Rule::Format(OFFSET_DATETIME))
}

pub fn usage_rules() -> FieldSet {
    [
        "allow_bundle",
        "allow_burn_play_on_pc",
        "allow_burn_to_cd",
        "allow_mobile",
        "allow_permanent",
        "allow_promotional",
        "allow_streaming",
        "allow_subscription",
        "allow_transfer_to_nsdmi",
        "allow_transfer_to_sdmi",
        "allow_unbundle",
        "delete_on_clock_rollback",
        "disable_on_clock_rollback",
        "drm_free",
        "limited",
    ]
    .into_iter()
    .fold(FieldSet::new(), |fields, name| {
        fields.required(name, Rule::Boolean)
    })
}

/// Fields shared by every product-family document.
pub fn product() -> FieldSet {
    FieldSet::new()
        .required("action", Rule::Format(ACTION))
        .required("amw_key", Rule::String)
        .required("artist", Rule::object(artist()))
        .required("copyright", Rule::object(copyright()))
        .optional("duration", Rule::Integer)
        .required("explicit_lyrics", Rule::Boolean)
        .required("genre", Rule::String)
        .required("media", Rule::object(media()))
        .required("provider", Rule::object(provider()))
        .optional("publisher", Rule::String)
        .required(
            "sales_territories",
            Rule::list_of(Rule::object(sales_territory())),
        )
        .required("title", Rule::String)
        .required("usage_rules", Rule::object(usage_rules()))
        .optional("version", Rule::String)
}

/// [`product`] plus track fields.
pub fn track() -> FieldSet {
    compose(
        &product(),
        &FieldSet::new()
            .required("genre", Rule::String)
            .required("index", Rule::Integer)
            .optional("internal_id", Rule::String)
            .required("isrc", Rule::String)
            .required("number", Rule::Integer)
            .optional("participants", Rule::list_of(Rule::object(participant())))
            .optional("title_extended", Rule::String)
            .required("volume", Rule::Integer)
            .optional("windows_drm_id", Rule::String),
    )
}

/// [`product`] plus bundle fields; `tracks` holds [`track`] documents.
pub fn track_bundle() -> FieldSet {
    compose(
        &product(),
        &FieldSet::new()
            .optional("catalog_number", Rule::String)
            .optional("ean", Rule::String)
            .optional("grid", Rule::String)
            .optional("icpn", Rule::String)
            .required("internal_id", Rule::String)
            .optional("physical", Rule::object(physical_product()))
            .optional("product_code", Rule::String)
            .required("release", Rule::object(release()))
            .required("track_count", Rule::Integer)
            .required("tracks", Rule::list_of(Rule::object(track())))
            .required("type", Rule::String)
            .required("upc", Rule::String)
            .required("volume_count", Rule::Integer),
    )
}

pub fn takedown() -> FieldSet {
    FieldSet::new()
        .required("action", Rule::literal("takedown"))
        .required("amw_key", Rule::String)
}

pub fn purge() -> FieldSet {
    FieldSet::new()
        .required("action", Rule::literal("purge"))
        .required("amw_key", Rule::String)
}

/// Build a fresh compiled schema for one of [`KINDS`].
///
/// Returns `Ok(None)` for an unknown kind.
pub fn schema(kind: &str) -> Result<Option<Schema>> {
    let schema = match kind {
        PRODUCT => Schema::from_fields(PRODUCT, &product(), Extra::Prevent)?,
        TRACK => Schema::from_fields(TRACK, &track(), Extra::Prevent)?,
        TRACK_BUNDLE => Schema::from_fields(TRACK_BUNDLE, &track_bundle(), Extra::Prevent)?,
        TAKEDOWN => Schema::from_fields(TAKEDOWN, &takedown(), Extra::Allow)?,
        PURGE => Schema::from_fields(PURGE, &purge(), Extra::Allow)?,
        DELIVERY => {
            let mut alternatives = Vec::with_capacity(DELIVERY_ALTERNATIVES.len());
            for alternative in DELIVERY_ALTERNATIVES {
                if let Some(schema) = schema(alternative)? {
                    alternatives.push(schema);
                }
            }
            Schema::any_of(DELIVERY, alternatives)?
        }
        _ => return Ok(None),
    };
    Ok(Some(schema))
}

static BUILTIN: OnceCell<SchemaRegistry> = OnceCell::new();

/// Process-wide registry of the built-in catalog schemas.
///
/// Built on first use and never mutated afterwards. Tests that need an
/// isolated set should use [`SchemaRegistry::with_builtin`] instead.
pub fn builtin() -> Result<&'static SchemaRegistry> {
    BUILTIN.get_or_try_init(SchemaRegistry::with_builtin)
}
