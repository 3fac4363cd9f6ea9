use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};

use crate::catalog;
use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::validator::{log_invalid, Schema};

const SCHEMA_SUFFIX: &str = ".schema.json";

/// Registry of compiled schemas keyed by document kind.
///
/// Immutable once built; share it by reference across threads.
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            schemas: HashMap::new(),
            config,
        }
    }

    /// A fresh registry holding every catalog schema.
    pub fn with_builtin() -> Result<Self> {
        Self::with_builtin_config(RegistryConfig::catalog())
    }

    /// A fresh catalog registry with explicit config.
    pub fn with_builtin_config(config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for kind in catalog::KINDS {
            if let Some(schema) = catalog::schema(kind)? {
                registry.register_schema(schema);
            }
        }
        tracing::debug!(schemas = registry.schemas.len(), "built catalog schemas");
        Ok(registry)
    }

    /// The process-wide catalog registry; see [`catalog::builtin`].
    pub fn builtin() -> Result<&'static Self> {
        catalog::builtin()
    }

    /// Register a schema for a kind from a JSON string.
    pub fn register(&mut self, kind: &str, schema_json: &str) -> Result<()> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(kind, &schema)
    }

    /// Register a schema for a kind from a JSON value.
    pub fn register_value(&mut self, kind: &str, schema: &Value) -> Result<()> {
        let mut schema_to_compile = schema.clone();
        if self.config.strict_mode {
            apply_strict_mode(&mut schema_to_compile);
        }

        let compiled = Schema::compile(kind, &schema_to_compile)?;
        self.register_schema(compiled);
        Ok(())
    }

    /// Register an already compiled schema under its own name.
    ///
    /// Replaces any schema registered under the same name.
    pub fn register_schema(&mut self, schema: Schema) {
        self.schemas.insert(schema.name().to_string(), schema);
    }

    /// Load schemas from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load `<kind>.schema.json` files from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded_schema_count = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if !file_name.ends_with(SCHEMA_SUFFIX) {
                continue;
            }

            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();

            if file_type.is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }

            let kind = kind_from_file_name(&file_name).ok_or_else(|| {
                SchemaError::LoadFailed(format!("unrecognized schema filename: {file_name}"))
            })?;

            loaded_schema_count = loaded_schema_count.saturating_add(1);
            if loaded_schema_count > registry.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {}",
                    registry.config.max_schemas_from_directory, loaded_schema_count
                )));
            }

            let file = std::fs::File::open(&entry_path).map_err(|err| {
                SchemaError::LoadFailed(format!(
                    "failed opening schema {}: {err}",
                    entry_path.display()
                ))
            })?;
            let opened_metadata = file
                .metadata()
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

            #[cfg(unix)]
            {
                if !same_file_identity(&path_metadata, &opened_metadata) {
                    return Err(SchemaError::LoadFailed(format!(
                        "schema file changed during load: {file_name}"
                    )));
                }
            }

            let max_bytes = registry.config.max_schema_file_size;
            if opened_metadata.len() > max_bytes as u64 {
                return Err(SchemaError::LoadFailed(format!(
                    "schema file too large ({} bytes): {file_name}",
                    opened_metadata.len()
                )));
            }

            let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
            let mut content = String::new();
            file.take(read_limit)
                .read_to_string(&mut content)
                .map_err(|err| {
                    SchemaError::LoadFailed(format!(
                        "failed reading schema {}: {err}",
                        entry_path.display()
                    ))
                })?;
            if content.len() > max_bytes {
                return Err(SchemaError::LoadFailed(format!(
                    "schema file too large while reading: {file_name}"
                )));
            }

            registry.register(kind, &content)?;
            tracing::debug!(kind, path = %entry_path.display(), "loaded schema");
        }

        Ok(registry)
    }

    /// Load from embedded `(kind, schema)` strings.
    pub fn from_embedded(schemas: &[(&str, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (kind, schema) in schemas {
            registry.register(kind, schema)?;
        }
        Ok(registry)
    }

    /// Parse a JSON payload and validate it against the schema for `kind`.
    pub fn validate(&self, kind: &str, payload: &[u8]) -> Result<Value> {
        let document: Value = serde_json::from_slice(payload)?;
        self.validate_value(kind, document)
    }

    /// Validate a parsed document, returning it unchanged on success.
    pub fn validate_value(&self, kind: &str, document: Value) -> Result<Value> {
        let Some(schema) = self.schemas.get(kind) else {
            if self.config.fail_on_missing_schema {
                return Err(SchemaError::NoSchema(kind.to_string()));
            }
            return Ok(document);
        };

        schema.validate(document).map_err(|invalid| {
            if self.config.log_errors {
                log_invalid(&invalid);
            }
            SchemaError::Invalid(invalid)
        })
    }

    pub fn get(&self, kind: &str) -> Option<&Schema> {
        self.schemas.get(kind)
    }

    /// Check if a kind has a registered schema.
    pub fn has_schema(&self, kind: &str) -> bool {
        self.schemas.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("kinds", &self.kinds())
            .field("config", &self.config)
            .finish()
    }
}

fn kind_from_file_name(file_name: &str) -> Option<&str> {
    let kind = file_name.strip_suffix(SCHEMA_SUFFIX)?;
    let valid = !kind.is_empty()
        && kind
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    valid.then_some(kind)
}

fn apply_strict_mode(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if is_object_schema(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }

            for key in ["properties", "patternProperties", "$defs", "definitions"] {
                if let Some(Value::Object(children)) = map.get_mut(key) {
                    children.values_mut().for_each(apply_strict_mode);
                }
            }
            for key in ["items", "additionalProperties", "not", "if", "then", "else"] {
                if let Some(child) = map.get_mut(key) {
                    apply_strict_mode(child);
                }
            }
            for key in ["prefixItems", "allOf", "anyOf", "oneOf"] {
                if let Some(Value::Array(children)) = map.get_mut(key) {
                    children.iter_mut().for_each(apply_strict_mode);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(apply_strict_mode),
        _ => {}
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Value::String(kind) if kind == "object")),
        _ => map.contains_key("properties") || map.contains_key("required"),
    }
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::validator::ErrorKind;

    const ARTIST_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "url": { "type": "string" }
        },
        "required": ["name"]
    }"#;

    #[test]
    fn register_and_validate() {
        let mut registry = SchemaRegistry::new();
        registry.register("artist", ARTIST_SCHEMA).unwrap();

        let document = registry.validate("artist", br#"{"name":"Elvis"}"#).unwrap();
        assert_eq!(document, json!({ "name": "Elvis" }));
        assert!(matches!(
            registry.validate("artist", br#"{"name":1}"#),
            Err(SchemaError::Invalid(_))
        ));
    }

    #[test]
    fn invalid_carries_original_document() {
        let mut registry = SchemaRegistry::new();
        registry.register("artist", ARTIST_SCHEMA).unwrap();

        let Err(SchemaError::Invalid(invalid)) =
            registry.validate_value("artist", json!({ "url": "x" }))
        else {
            panic!("expected schema.invalid");
        };
        assert_eq!(invalid.schema, "artist");
        assert_eq!(invalid.document, json!({ "url": "x" }));
        assert_eq!(invalid.violations[0].kind, ErrorKind::RequiredFieldInvalid);
    }

    #[test]
    fn missing_schema_permissive_passes() {
        let registry = SchemaRegistry::new();
        assert!(registry.validate("unknown", br#"{"any":"thing"}"#).is_ok());
    }

    #[test]
    fn missing_schema_strict_fails() {
        let registry = SchemaRegistry::with_config(RegistryConfig {
            fail_on_missing_schema: true,
            ..RegistryConfig::default()
        });

        assert!(matches!(
            registry.validate("unknown", br#"{}"#),
            Err(SchemaError::NoSchema(kind)) if kind == "unknown"
        ));
    }

    #[test]
    fn strict_mode_rejects_additional_properties() {
        let mut permissive = SchemaRegistry::new();
        permissive.register("artist", ARTIST_SCHEMA).unwrap();

        let mut strict = SchemaRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        strict.register("artist", ARTIST_SCHEMA).unwrap();

        let payload = br#"{"name":"ok","extra":true}"#;
        assert!(permissive.validate("artist", payload).is_ok());
        assert!(matches!(
            strict.validate("artist", payload),
            Err(SchemaError::Invalid(_))
        ));
    }

    #[test]
    fn strict_mode_applies_nested_objects() {
        let schema = r#"{
            "type": "object",
            "properties": {
                "copyright": {
                    "type": "object",
                    "properties": { "year": { "type": "integer" } }
                }
            }
        }"#;

        let mut strict = SchemaRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        strict.register("product", schema).unwrap();

        assert!(strict
            .validate("product", br#"{"copyright":{"year":2015}}"#)
            .is_ok());
        assert!(strict
            .validate("product", br#"{"copyright":{"year":2015,"extra":1}}"#)
            .is_err());
    }

    #[test]
    fn invalid_json_payload_fails() {
        let mut registry = SchemaRegistry::new();
        registry.register("artist", ARTIST_SCHEMA).unwrap();

        assert!(matches!(
            registry.validate("artist", b"not-json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn invalid_schema_fails_compile() {
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            registry.register("bad", r#"{"type":"definitely-not-a-type"}"#),
            Err(SchemaError::CompileFailed { name, .. }) if name == "bad"
        ));
    }

    #[test]
    fn from_embedded_loads_schemas() {
        let registry = SchemaRegistry::from_embedded(&[
            ("artist", ARTIST_SCHEMA),
            ("flags", r#"{"type":"array","items":{"type":"boolean"}}"#),
        ])
        .unwrap();

        assert!(registry.has_schema("artist"));
        assert_eq!(registry.kinds(), vec!["artist", "flags"]);
    }

    #[test]
    fn builtin_registry_rejects_unknown_kinds() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        assert_eq!(registry.kinds().len(), catalog::KINDS.len());
        assert!(matches!(
            registry.validate_value("album", json!({})),
            Err(SchemaError::NoSchema(_))
        ));
    }

    #[test]
    fn builtin_takedown_allows_extra_keys() {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let takedown = json!({ "action": "takedown", "amw_key": "a", "reason": "expired" });
        assert!(registry.validate_value(catalog::TAKEDOWN, takedown).is_ok());

        let upsert = json!({ "action": "upsert", "amw_key": "a" });
        assert!(registry.validate_value(catalog::TAKEDOWN, upsert).is_err());
    }

    #[test]
    fn from_directory_loads_and_validates() {
        let dir = make_temp_schema_dir("from-directory");
        write_schema(&dir, "artist.schema.json", ARTIST_SCHEMA);
        write_schema(
            &dir,
            "track_count.schema.json",
            r#"{"type":"integer"}"#,
        );
        write_schema(&dir, "ignored.json", ARTIST_SCHEMA);

        let registry = SchemaRegistry::from_directory(&dir).unwrap();
        assert_eq!(registry.kinds(), vec!["artist", "track_count"]);
        assert!(registry.validate("artist", br#"{"name":"ok"}"#).is_ok());
        assert!(registry.validate("track_count", b"12").is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_unknown_schema_name_errors() {
        let dir = make_temp_schema_dir("unknown-name");
        write_schema(&dir, "Track Bundle.schema.json", ARTIST_SCHEMA);

        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_schema_is_rejected() {
        let dir = make_temp_schema_dir("symlink-schema");
        let target = dir.join("target.json");
        std::fs::write(&target, ARTIST_SCHEMA.as_bytes()).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("artist.schema.json")).unwrap();

        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_count_limit_is_enforced() {
        let dir = make_temp_schema_dir("schema-count-limit");
        write_schema(&dir, "artist.schema.json", ARTIST_SCHEMA);
        write_schema(&dir, "label.schema.json", ARTIST_SCHEMA);

        let config = RegistryConfig {
            max_schemas_from_directory: 1,
            ..RegistryConfig::default()
        };
        let result = SchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn schema_file_size_limit_is_enforced() {
        let dir = make_temp_schema_dir("schema-size-limit");
        write_schema(&dir, "artist.schema.json", ARTIST_SCHEMA);

        let config = RegistryConfig {
            max_schema_file_size: 8,
            ..RegistryConfig::default()
        };
        let result = SchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn kind_names_from_files() {
        assert_eq!(kind_from_file_name("track_bundle.schema.json"), Some("track_bundle"));
        assert_eq!(kind_from_file_name("v2-track.schema.json"), Some("v2-track"));
        assert_eq!(kind_from_file_name(".schema.json"), None);
        assert_eq!(kind_from_file_name("Track.schema.json"), None);
        assert_eq!(kind_from_file_name("track.json"), None);
    }

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pipekit-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_schema(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
    }
}
