//! Path normalization: canonical (language, version, filename) for a
//! resolved project, or a redirect to the canonical root.
//!
//! Pure function, no I/O. After this stage the version slug is always
//! non-empty, so the version locator needs no fallback logic.

use crate::errors::{NotFoundReason, ServeError};
use registry::Project;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Normalized {
    /// Same-host redirect to the project's canonical default root.
    Redirect { location: String },
    Canonical {
        lang_slug: String,
        version_slug: String,
        filename: String,
    },
}

pub fn normalize(
    project: &Project,
    subproject_slug: Option<&str>,
    page_filename: Option<&str>,
    lang_slug: Option<&str>,
    version_slug: Option<&str>,
    filename: &str,
    query: Option<&str>,
) -> Result<Normalized, ServeError> {
    // `page/<filename>` is a version-less shortcut: redirect into the
    // project's default version, query string intact.
    if let Some(page) = page_filename {
        return Ok(Normalized::Redirect {
            location: canonical_page(project, subproject_slug, page, query),
        });
    }

    if !project.single_version {
        // Root request: send the browser to the canonical
        // default-language/default-version URL, query string intact.
        if lang_slug.is_none() && version_slug.is_none() && filename.is_empty() {
            return Ok(Normalized::Redirect {
                location: canonical_root(project, subproject_slug, query),
            });
        }

        let (Some(lang), Some(version)) = (lang_slug, version_slug) else {
            return Err(ServeError::NotFound(NotFoundReason::IncompleteVersionPath));
        };

        return Ok(Normalized::Canonical {
            lang_slug: lang.to_string(),
            version_slug: version.to_string(),
            filename: filename.to_string(),
        });
    }

    // Single-version project. A versioned-looking URL folds its segments
    // into the filename so the same resource has only one canonical URL;
    // the served version is always the configured default.
    let filename = match (lang_slug, version_slug) {
        (Some(lang), Some(version)) => format!("{lang}/{version}/{filename}"),
        _ => filename.to_string(),
    };

    Ok(Normalized::Canonical {
        lang_slug: project.language.clone(),
        version_slug: project.default_version.clone(),
        filename,
    })
}

fn canonical_root(project: &Project, subproject_slug: Option<&str>, query: Option<&str>) -> String {
    canonical_page(project, subproject_slug, "", query)
}

fn canonical_page(
    project: &Project,
    subproject_slug: Option<&str>,
    filename: &str,
    query: Option<&str>,
) -> String {
    let mut location = String::new();
    if let Some(slug) = subproject_slug {
        location.push_str("/projects/");
        location.push_str(slug);
    }
    location.push('/');
    // Single-version URLs carry no language/version segments
    if !project.single_version {
        location.push_str(&project.language);
        location.push('/');
        location.push_str(&project.default_version);
        location.push('/');
    }
    location.push_str(filename);
    if let Some(query) = query {
        location.push('?');
        location.push_str(query);
    }
    location
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(single_version: bool) -> Project {
        Project {
            slug: "acme".to_string(),
            language: "en".to_string(),
            single_version,
            default_version: "latest".to_string(),
            storage_template: "html/{slug}/{version}".to_string(),
        }
    }

    #[test]
    fn test_root_redirects_to_default_version() {
        let normalized = normalize(&project(false), None, None, None, None, "", None).unwrap();
        assert_eq!(
            normalized,
            Normalized::Redirect {
                location: "/en/latest/".to_string()
            }
        );

        // Query string is preserved verbatim
        let normalized =
            normalize(&project(false), None, None, None, None, "", Some("q=install&x=1")).unwrap();
        assert_eq!(
            normalized,
            Normalized::Redirect {
                location: "/en/latest/?q=install&x=1".to_string()
            }
        );

        // Subprojects stay under their parent's namespace
        let normalized = normalize(&project(false), Some("extras"), None, None, None, "", None).unwrap();
        assert_eq!(
            normalized,
            Normalized::Redirect {
                location: "/projects/extras/en/latest/".to_string()
            }
        );
    }

    #[test]
    fn test_page_path_redirects_into_default_version() {
        let normalized = normalize(
            &project(false),
            None,
            Some("install.html"),
            None,
            None,
            "",
            Some("highlight=x"),
        )
        .unwrap();
        assert_eq!(
            normalized,
            Normalized::Redirect {
                location: "/en/latest/install.html?highlight=x".to_string()
            }
        );

        // Single-version projects have no language/version segments to
        // restore; the shortcut lands on the plain path
        let normalized = normalize(
            &project(true),
            Some("extras"),
            Some("guide.html"),
            None,
            None,
            "",
            None,
        )
        .unwrap();
        assert_eq!(
            normalized,
            Normalized::Redirect {
                location: "/projects/extras/guide.html".to_string()
            }
        );
    }

    #[test]
    fn test_incomplete_version_path_rejected() {
        let err = normalize(&project(false), None, None, None, None, "install.html", None).unwrap_err();
        assert!(matches!(
            err,
            ServeError::NotFound(NotFoundReason::IncompleteVersionPath)
        ));

        let err = normalize(&project(false), None, None, None, None, "en/", None).unwrap_err();
        assert!(matches!(
            err,
            ServeError::NotFound(NotFoundReason::IncompleteVersionPath)
        ));
    }

    #[test]
    fn test_complete_path_passes_through() {
        let normalized = normalize(
            &project(false),
            None,
            None,
            Some("fr"),
            Some("1.0"),
            "install/index.html",
            None,
        )
        .unwrap();
        assert_eq!(
            normalized,
            Normalized::Canonical {
                lang_slug: "fr".to_string(),
                version_slug: "1.0".to_string(),
                filename: "install/index.html".to_string(),
            }
        );
    }

    #[test]
    fn test_single_version_folds_versioned_urls() {
        let normalized = normalize(
            &project(true),
            None,
            None,
            Some("en"),
            Some("1.0"),
            "install.html",
            None,
        )
        .unwrap();
        assert_eq!(
            normalized,
            Normalized::Canonical {
                lang_slug: "en".to_string(),
                version_slug: "latest".to_string(),
                filename: "en/1.0/install.html".to_string(),
            }
        );

        // Empty filename keeps the trailing slash for index completion
        let normalized =
            normalize(&project(true), None, None, Some("en"), Some("latest"), "", None).unwrap();
        assert_eq!(
            normalized,
            Normalized::Canonical {
                lang_slug: "en".to_string(),
                version_slug: "latest".to_string(),
                filename: "en/latest/".to_string(),
            }
        );
    }

    #[test]
    fn test_single_version_forces_default_version() {
        // Plain paths serve as-is under the default version
        let normalized = normalize(&project(true), None, None, None, None, "guide/", None).unwrap();
        assert_eq!(
            normalized,
            Normalized::Canonical {
                lang_slug: "en".to_string(),
                version_slug: "latest".to_string(),
                filename: "guide/".to_string(),
            }
        );

        // Root of a single-version project serves directly, no redirect
        let normalized = normalize(&project(true), None, None, None, None, "", None).unwrap();
        assert_eq!(
            normalized,
            Normalized::Canonical {
                lang_slug: "en".to_string(),
                version_slug: "latest".to_string(),
                filename: String::new(),
            }
        );
    }
}
