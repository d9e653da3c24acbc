use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use valya_format::{Layout, Version};

use crate::error::{SdkError, SdkResult};

/// Settings for a Valya store, loadable from TOML.
///
/// ```toml
/// version = "1.1"
/// max_block_size = 65536
/// store_root = ".valya/blocks"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValyaConfig {
    /// Wire version used for new index nodes.
    pub version: Version,
    /// Block size ceiling; the version's default when absent.
    pub max_block_size: Option<usize>,
    /// Root directory of the on-disk block store.
    pub store_root: PathBuf,
}

impl Default for ValyaConfig {
    fn default() -> Self {
        Self {
            version: Version::default(),
            max_block_size: None,
            store_root: PathBuf::from(".valya/blocks"),
        }
    }
}

impl ValyaConfig {
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// The validated layout these settings describe.
    pub fn layout(&self) -> SdkResult<Layout> {
        let mut layout = self.version.layout();
        if let Some(max) = self.max_block_size {
            layout = layout.with_max_block_size(max);
        }
        layout.validate()?;
        Ok(layout)
    }
}
