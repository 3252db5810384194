/// Controls how requests are matched against the schema document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// When true, object schemas without `additionalProperties` reject unknown fields.
    pub deny_unknown_properties: bool,
    /// When true, path, query and header parameters are checked.
    pub validate_parameters: bool,
    /// Maximum bytes read when loading a schema document from disk.
    pub max_document_size: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            deny_unknown_properties: false,
            validate_parameters: true,
            max_document_size: 8 * 1024 * 1024,
        }
    }
}
