//! Declarative field sets.
//!
//! Document schemas are kept as data: a [`FieldSet`] maps field names to
//! [`Field`]s, each holding a [`Rule`] and a required flag. Field sets are
//! composed by copying a base set and layering another set on top with
//! [`compose`]; on a name collision the later field wins. A field set
//! renders to a JSON Schema object that `jsonschema` compiles.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

/// What a field value must look like.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Any JSON string.
    String,
    /// A JSON integer.
    Integer,
    /// A JSON boolean.
    Boolean,
    /// A string checked by a named format (see [`crate::formats`]).
    Format(&'static str),
    /// Exactly this JSON value.
    Literal(Value),
    /// A list whose items all satisfy the inner rule.
    ListOf(Box<Rule>),
    /// A nested document.
    Object(FieldSet, Extra),
    /// Anything.
    Any,
}

/// Whether keys not named by a field set are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extra {
    #[default]
    Prevent,
    Allow,
}

/// A named entry in a [`FieldSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub rule: Rule,
    pub required: bool,
}

impl Field {
    pub fn required(rule: Rule) -> Self {
        Self {
            rule,
            required: true,
        }
    }

    pub fn optional(rule: Rule) -> Self {
        Self {
            rule,
            required: false,
        }
    }
}

/// An ordered mapping of field name to [`Field`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: BTreeMap<String, Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a required field.
    pub fn required(self, name: &str, rule: Rule) -> Self {
        self.field(name, Field::required(rule))
    }

    /// Add (or replace) an optional field.
    pub fn optional(self, name: &str, rule: Rule) -> Self {
        self.field(name, Field::optional(rule))
    }

    /// Add (or replace) a field.
    pub fn field(mut self, name: &str, field: Field) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Names of required fields, sorted.
    pub fn required_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, field)| field.required)
            .map(|(name, _)| name)
            .collect()
    }

    /// Render as a JSON Schema object.
    pub fn to_schema(&self, extra: Extra) -> Value {
        let mut properties = Map::new();
        for (name, field) in self.iter() {
            properties.insert(name.to_string(), field.rule.to_schema());
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_names(),
            "additionalProperties": extra == Extra::Allow,
        })
    }
}

/// Copy `base` and layer `extension` on top of it.
///
/// Fields present in both take the definition from `extension`.
pub fn compose(base: &FieldSet, extension: &FieldSet) -> FieldSet {
    let mut merged = base.clone();
    for (name, field) in extension.iter() {
        merged.fields.insert(name.to_string(), field.clone());
    }
    merged
}

impl Rule {
    pub fn list_of(rule: Rule) -> Self {
        Rule::ListOf(Box::new(rule))
    }

    pub fn object(fields: FieldSet) -> Self {
        Rule::Object(fields, Extra::Prevent)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Rule::Literal(value.into())
    }

    /// Render as a JSON Schema fragment.
    pub fn to_schema(&self) -> Value {
        match self {
            Rule::String => json!({ "type": "string" }),
            Rule::Integer => json!({ "type": "integer" }),
            Rule::Boolean => json!({ "type": "boolean" }),
            Rule::Format(format) => json!({ "type": "string", "format": format }),
            Rule::Literal(value) => json!({ "const": value }),
            Rule::ListOf(item) => json!({ "type": "array", "items": item.to_schema() }),
            Rule::Object(fields, extra) => fields.to_schema(*extra),
            Rule::Any => json!({}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_layers_extension_over_base() {
        let base = FieldSet::new()
            .required("title", Rule::String)
            .optional("genre", Rule::String);
        let extension = FieldSet::new()
            .required("genre", Rule::String)
            .required("isrc", Rule::String);

        let merged = compose(&base, &extension);

        assert_eq!(merged.len(), 3);
        assert!(merged.get("genre").unwrap().required);
        assert!(merged.contains("title"));
        assert!(!base.get("genre").unwrap().required);
    }

    #[test]
    fn schema_lists_required_fields_only() {
        let fields = FieldSet::new()
            .required("name", Rule::String)
            .optional("url", Rule::String);

        let schema = fields.to_schema(Extra::Prevent);
        assert_eq!(schema["required"], json!(["name"]));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["url"], json!({ "type": "string" }));
    }

    #[test]
    fn nested_rules_render() {
        let rule = Rule::list_of(Rule::object(FieldSet::new().required("n", Rule::Integer)));
        let schema = rule.to_schema();
        assert_eq!(schema["type"], "array");
        assert_eq!(schema["items"]["properties"]["n"]["type"], "integer");
    }

    #[test]
    fn allow_extra_renders_open_object() {
        let schema = FieldSet::new()
            .required("action", Rule::literal("takedown"))
            .to_schema(Extra::Allow);
        assert_eq!(schema["additionalProperties"], json!(true));
        assert_eq!(schema["properties"]["action"], json!({ "const": "takedown" }));
    }
}
