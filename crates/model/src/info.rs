use serde::{Deserialize, Serialize};

/// Describes a model offered by a provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelInfo {
    /// The identifier of the model, exactly as reported by the provider.
    pub name: String,
    /// A human-readable name, if the provider has one.
    pub display_name: Option<String>,
    /// Whether the model can serve text-generation requests.
    pub can_generate: bool,
}

impl ModelInfo {
    /// Creates a `ModelInfo` without a display name.
    #[inline]
    pub fn new<S: Into<String>>(name: S, can_generate: bool) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            can_generate,
        }
    }
}
