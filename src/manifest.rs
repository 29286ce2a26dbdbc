use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_VERSION: &str = "0.0.0";

/// The handful of `manifest.json` fields used for naming the archive.
///
/// The manifest is otherwise opaque: it is copied byte-for-byte and never
/// validated, so anything unreadable here simply yields `None` fields.
#[derive(Debug, Default, Deserialize)]
pub struct ExtensionManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl ExtensionManifest {
    /// Read name/version from the manifest, falling back to empty on any error
    pub fn peek(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| Self::from_json(&content).ok())
            .unwrap_or_default()
    }

    pub fn from_json(content: &str) -> crate::result::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// File-name friendly version of the extension name, if there is one
    pub fn slug(&self) -> Option<String> {
        self.name.as_deref().map(slugify).filter(|s| !s.is_empty())
    }

    pub fn version_or_default(&self) -> &str {
        self.version
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_VERSION)
    }
}

/// Lowercase ASCII alphanumerics, every other run of characters becomes one `-`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
