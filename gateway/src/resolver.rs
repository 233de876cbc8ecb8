//! Slug resolution: (host slug, optional subproject slug, optional language
//! slug) to one concrete project.
//!
//! Read-only lookups, no side effects; the result is final within a request.
//! At most one subproject hop and one translation hop, in that order.

use crate::errors::{NotFoundReason, ServeError};
use registry::{Project, Registry};

pub async fn resolve(
    registry: &Registry,
    host_slug: &str,
    subproject_slug: Option<&str>,
    lang_slug: Option<&str>,
) -> Result<Project, ServeError> {
    let base = registry
        .project(host_slug)
        .await?
        .ok_or(ServeError::NotFound(NotFoundReason::UnknownProject))?;

    let current = match subproject_slug {
        None => base,
        Some(slug) => resolve_subproject(registry, &base, slug).await?,
    };

    // Serve a translation when the URL names a language other than the
    // project's own. Single-version projects never take the hop: any
    // language-looking segment in their URL gets folded into the filename
    // by the normalizer instead.
    match lang_slug {
        Some(lang) if lang != current.language && !current.single_version => registry
            .translation(&current.slug, lang)
            .await?
            .ok_or(ServeError::NotFound(NotFoundReason::UnknownTranslation)),
        _ => Ok(current),
    }
}

async fn resolve_subproject(
    registry: &Registry,
    parent: &Project,
    slug: &str,
) -> Result<Project, ServeError> {
    let relationships = registry.relationships(&parent.slug).await?;

    // Try the relationship alias first, otherwise we might end up on an
    // unrelated project that happens to share the slug.
    let child_slug = relationships
        .iter()
        .find(|rel| rel.alias.as_deref() == Some(slug))
        .or_else(|| relationships.iter().find(|rel| rel.child == slug))
        .map(|rel| rel.child.clone());

    let Some(child_slug) = child_slug else {
        tracing::warn!(
            subproject_slug = slug,
            project_slug = %parent.slug,
            "slug is not a subproject of project"
        );
        return Err(ServeError::NotFound(NotFoundReason::InvalidSubproject));
    };

    registry
        .project(&child_slug)
        .await?
        .ok_or(ServeError::NotFound(NotFoundReason::InvalidSubproject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{NotFoundReason, ServeError};
    use registry::Catalog;

    fn registry() -> Registry {
        // `docs` is both an alias for acme-manual and the literal slug of an
        // unrelated child project, to pin down alias-first resolution.
        let catalog = Catalog::from_yaml(
            r#"
projects:
  - slug: acme
    language: en
    translations: [acme-fr]
  - slug: acme-fr
    language: fr
  - slug: acme-manual
    language: en
  - slug: docs
    language: en
  - slug: solo
    language: en
    single_version: true
relationships:
  - parent: acme
    child: acme-manual
    alias: docs
  - parent: acme
    child: docs
"#,
        )
        .unwrap();
        Registry::in_process(catalog)
    }

    fn reason(err: ServeError) -> NotFoundReason {
        match err {
            ServeError::NotFound(reason) => reason,
            other => panic!("expected not-found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolves_base_project() {
        let registry = registry();
        let project = resolve(&registry, "acme", None, None).await.unwrap();
        assert_eq!(project.slug, "acme");

        let err = resolve(&registry, "ghost", None, None).await.unwrap_err();
        assert_eq!(reason(err), NotFoundReason::UnknownProject);
    }

    #[tokio::test]
    async fn test_subproject_alias_wins_over_child_slug() {
        let registry = registry();

        // "docs" matches both the alias of acme-manual and the plain child
        // project slugged "docs"; the alias must win.
        let project = resolve(&registry, "acme", Some("docs"), None).await.unwrap();
        assert_eq!(project.slug, "acme-manual");

        // Plain child-slug match still works when no alias collides
        let project = resolve(&registry, "acme", Some("acme-manual"), None)
            .await
            .unwrap();
        assert_eq!(project.slug, "acme-manual");

        let err = resolve(&registry, "acme", Some("nope"), None)
            .await
            .unwrap_err();
        assert_eq!(reason(err), NotFoundReason::InvalidSubproject);
    }

    #[tokio::test]
    async fn test_translation_hop() {
        let registry = registry();

        let project = resolve(&registry, "acme", None, Some("fr")).await.unwrap();
        assert_eq!(project.slug, "acme-fr");

        // Same language as the project: no hop
        let project = resolve(&registry, "acme", None, Some("en")).await.unwrap();
        assert_eq!(project.slug, "acme");

        let err = resolve(&registry, "acme", None, Some("de"))
            .await
            .unwrap_err();
        assert_eq!(reason(err), NotFoundReason::UnknownTranslation);
    }

    #[tokio::test]
    async fn test_single_version_projects_skip_translation() {
        let registry = registry();

        // A versioned-looking URL on a single-version project is tolerated;
        // the language segment is filename material, not a translation.
        let project = resolve(&registry, "solo", None, Some("fr")).await.unwrap();
        assert_eq!(project.slug, "solo");
    }
}
