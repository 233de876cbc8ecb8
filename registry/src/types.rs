use serde::{Deserialize, Serialize};

fn default_version_slug() -> String {
    "latest".to_string()
}

fn default_storage_template() -> String {
    "html/{slug}/{version}".to_string()
}

/// A documentation site, identified by a unique slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub slug: String,
    /// Default documentation language code (e.g. "en").
    pub language: String,
    /// Single-version projects expose no language/version URL segments and
    /// always serve their default version.
    #[serde(default)]
    pub single_version: bool,
    /// Version slug served when the URL does not pick one.
    #[serde(default = "default_version_slug")]
    pub default_version: String,
    /// Storage root template; `{slug}` and `{version}` are substituted.
    #[serde(default = "default_storage_template")]
    pub storage_template: String,
}

impl Project {
    /// Logical storage root for one version of this project's built docs.
    pub fn storage_root(&self, version_slug: &str) -> String {
        self.storage_template
            .replace("{slug}", &self.slug)
            .replace("{version}", version_slug)
    }
}

/// One servable snapshot of a project's documentation.
///
/// Versions are created by the build subsystem; this crate only reads them.
/// The `private`/`viewers` fields back the static view policy; a remote
/// policy service is free to ignore them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Slug of the owning project.
    pub project: String,
    pub slug: String,
    #[serde(default)]
    pub private: bool,
    /// Identities allowed to view a private version.
    #[serde(default)]
    pub viewers: Vec<String>,
}

/// Subproject linkage: `child` is mounted under `parent`'s namespace,
/// optionally under an `alias` distinct from the child's own slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub parent: String,
    pub child: String,
    #[serde(default)]
    pub alias: Option<String>,
}
