/// Controls schema registration and validation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, object schemas registered from JSON reject properties
    /// they do not name unless they say otherwise.
    pub strict_mode: bool,
    /// When true, kinds without a schema return `SchemaError::NoSchema`
    /// instead of passing the document through.
    pub fail_on_missing_schema: bool,
    /// When true, every field error of a rejected document is logged.
    pub log_errors: bool,
    /// Maximum number of schemas loaded from a directory.
    pub max_schemas_from_directory: usize,
    /// Maximum bytes allowed per schema file loaded from a directory.
    pub max_schema_file_size: usize,
}

impl RegistryConfig {
    /// Config used for the built-in catalog: unknown kinds are an error.
    pub fn catalog() -> Self {
        Self {
            fail_on_missing_schema: true,
            ..Self::default()
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            fail_on_missing_schema: false,
            log_errors: true,
            max_schemas_from_directory: 256,
            max_schema_file_size: 256 * 1024,
        }
    }
}
