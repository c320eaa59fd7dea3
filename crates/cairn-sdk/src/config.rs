use std::path::Path;

use cairn_hierarchy::{CachePolicy, SiblingMode};
use serde::{Deserialize, Serialize};

use crate::error::{CairnError, CairnResult};

/// Settings for a [`Cairn`](crate::Cairn) instance.
///
/// Every field has a default, so a TOML file only needs the keys it
/// changes:
///
/// ```toml
/// revisions = false
/// default_lang = "fr"
/// content_types = ["page", "news"]
///
/// [cache]
/// policy = "bounded"
/// capacity = 500
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CairnConfig {
    /// Snapshot content before every update.
    pub revisions: bool,
    /// Route `delete` through the soft path for content.
    pub soft_delete: bool,
    /// Object cache used by the hierarchy engine.
    pub cache: CachePolicy,
    /// Locale used for route lookups when none is given.
    pub default_lang: String,
    pub siblings: SiblingMode,
    /// Content type tags registered with the model factory at startup.
    pub content_types: Vec<String>,
}

impl Default for CairnConfig {
    fn default() -> Self {
        Self {
            revisions: true,
            soft_delete: true,
            cache: CachePolicy::Unbounded,
            default_lang: "en".into(),
            siblings: SiblingMode::ParentChildren,
            content_types: vec![crate::content::CONTENT_TYPE.into()],
        }
    }
}

impl CairnConfig {
    pub fn from_toml_str(text: &str) -> CairnResult<Self> {
        toml::from_str(text).map_err(|e| CairnError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> CairnResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> CairnResult<String> {
        toml::to_string(self).map_err(|e| CairnError::Config(e.to_string()))
    }
}
