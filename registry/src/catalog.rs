//! In-memory project catalog.
//!
//! Built once from a YAML projects file (or programmatically in tests) and
//! immutable afterwards; all lookups are read-only borrows. The file format
//! nests versions and translation slugs under each project:
//!
//! ```yaml
//! projects:
//!   - slug: acme
//!     language: en
//!     versions:
//!       - slug: latest
//!       - slug: "1.0"
//!         private: true
//!         viewers: [eng-team]
//!     translations: [acme-fr]
//!   - slug: acme-fr
//!     language: fr
//! relationships:
//!   - parent: acme
//!     child: acme-extras
//!     alias: extras
//! ```

use crate::types::{Project, Relationship, Version};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("could not read projects file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse projects file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("duplicate project slug: {0}")]
    DuplicateProject(String),

    #[error("duplicate version {version} for project {project}")]
    DuplicateVersion { project: String, version: String },

    #[error("unknown project {0} referenced by a relationship")]
    UnknownRelationshipProject(String),

    #[error("unknown project {0} referenced as a translation")]
    UnknownTranslationProject(String),
}

/// One version entry as written in the projects file; the owning project
/// slug is implied by nesting.
#[derive(Clone, Debug, Deserialize)]
pub struct VersionRecord {
    pub slug: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub viewers: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProjectRecord {
    #[serde(flatten)]
    pub project: Project,
    #[serde(default)]
    pub versions: Vec<VersionRecord>,
    /// Slugs of projects serving this project's content in other languages.
    #[serde(default)]
    pub translations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    projects: Vec<ProjectRecord>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Debug)]
pub struct Catalog {
    projects: HashMap<String, Project>,
    versions: HashMap<(String, String), Version>,
    relationships: Vec<Relationship>,
    translations: HashMap<String, Vec<String>>,
}

impl Catalog {
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(data)?;
        Self::build(file.projects, file.relationships)
    }

    pub fn build(
        records: Vec<ProjectRecord>,
        relationships: Vec<Relationship>,
    ) -> Result<Self, CatalogError> {
        let mut projects = HashMap::new();
        let mut versions = HashMap::new();
        let mut translations = HashMap::new();

        for record in records {
            let slug = record.project.slug.clone();
            if projects.contains_key(&slug) {
                return Err(CatalogError::DuplicateProject(slug));
            }

            for version in record.versions {
                let key = (slug.clone(), version.slug.clone());
                if versions.contains_key(&key) {
                    return Err(CatalogError::DuplicateVersion {
                        project: slug.clone(),
                        version: version.slug,
                    });
                }
                versions.insert(
                    key,
                    Version {
                        project: slug.clone(),
                        slug: version.slug,
                        private: version.private,
                        viewers: version.viewers,
                    },
                );
            }

            if !record.translations.is_empty() {
                translations.insert(slug.clone(), record.translations);
            }
            projects.insert(slug, record.project);
        }

        for rel in &relationships {
            for slug in [&rel.parent, &rel.child] {
                if !projects.contains_key(slug) {
                    return Err(CatalogError::UnknownRelationshipProject(slug.clone()));
                }
            }
        }
        for slugs in translations.values() {
            for slug in slugs {
                if !projects.contains_key(slug) {
                    return Err(CatalogError::UnknownTranslationProject(slug.clone()));
                }
            }
        }

        Ok(Self {
            projects,
            versions,
            relationships,
            translations,
        })
    }

    pub fn project(&self, slug: &str) -> Option<&Project> {
        self.projects.get(slug)
    }

    /// Subproject relationships with the given parent, in declaration order.
    pub fn relationships(&self, parent: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|rel| rel.parent == parent)
            .collect()
    }

    /// The translation of `of` using `language`, if one exists.
    pub fn translation(&self, of: &str, language: &str) -> Option<&Project> {
        self.translations
            .get(of)?
            .iter()
            .filter_map(|slug| self.projects.get(slug))
            .find(|project| project.language == language)
    }

    pub fn version(&self, project: &str, slug: &str) -> Option<&Version> {
        self.versions
            .get(&(project.to_string(), slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
projects:
  - slug: acme
    language: en
    versions:
      - slug: latest
      - slug: "1.0"
        private: true
        viewers: [eng-team]
    translations: [acme-fr]
  - slug: acme-fr
    language: fr
    versions:
      - slug: latest
  - slug: acme-extras
    language: en
    single_version: true
relationships:
  - parent: acme
    child: acme-extras
    alias: extras
"#;

    #[test]
    fn test_load_sample_catalog() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();

        let acme = catalog.project("acme").unwrap();
        assert_eq!(acme.language, "en");
        assert!(!acme.single_version);

        let extras = catalog.project("acme-extras").unwrap();
        assert!(extras.single_version);

        assert!(catalog.project("missing").is_none());
    }

    #[test]
    fn test_version_lookup() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();

        let latest = catalog.version("acme", "latest").unwrap();
        assert!(!latest.private);

        let pinned = catalog.version("acme", "1.0").unwrap();
        assert!(pinned.private);
        assert_eq!(pinned.viewers, vec!["eng-team".to_string()]);

        assert!(catalog.version("acme", "2.0").is_none());
        assert!(catalog.version("missing", "latest").is_none());
    }

    #[test]
    fn test_relationship_and_translation_lookup() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();

        let rels = catalog.relationships("acme");
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].child, "acme-extras");
        assert_eq!(rels[0].alias.as_deref(), Some("extras"));
        assert!(catalog.relationships("acme-fr").is_empty());

        let fr = catalog.translation("acme", "fr").unwrap();
        assert_eq!(fr.slug, "acme-fr");
        assert!(catalog.translation("acme", "de").is_none());
        assert!(catalog.translation("acme-fr", "en").is_none());
    }

    #[test]
    fn test_duplicate_project_rejected() {
        let yaml = r#"
projects:
  - slug: acme
    language: en
  - slug: acme
    language: fr
"#;
        assert!(matches!(
            Catalog::from_yaml(yaml).unwrap_err(),
            CatalogError::DuplicateProject(_)
        ));
    }

    #[test]
    fn test_dangling_references_rejected() {
        let yaml = r#"
projects:
  - slug: acme
    language: en
relationships:
  - parent: acme
    child: ghost
"#;
        assert!(matches!(
            Catalog::from_yaml(yaml).unwrap_err(),
            CatalogError::UnknownRelationshipProject(_)
        ));

        let yaml = r#"
projects:
  - slug: acme
    language: en
    translations: [ghost]
"#;
        assert!(matches!(
            Catalog::from_yaml(yaml).unwrap_err(),
            CatalogError::UnknownTranslationProject(_)
        ));
    }
}
