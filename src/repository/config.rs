use serde::Deserialize;

/// Registry settings.
///
/// ```ignore
/// let config = RegistryConfig::from_json(r#"{ "worker_threads": 4 }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Emit the schema's index directives when a repository is first built.
    pub create_indexes: bool,
    /// Size of the worker pool for async calls. `None` spawns a thread per
    /// call.
    pub worker_threads: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            create_indexes: true,
            worker_threads: None,
        }
    }
}

impl RegistryConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
