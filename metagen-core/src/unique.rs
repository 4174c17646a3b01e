//! Collision detection for generated identifiers.
//!
//! Case transformations collapse word boundaries, so identifiers that
//! are distinct in the model can collide once rendered for the target
//! language: `HTTP_Response` and `HTTPResponse` both become
//! `http_response` in snake case. A [`NameScope`] detects these
//! collisions within one naming scope (the types of a version, the
//! attributes of a struct) so they can be reported as errors instead
//! of silently shadowing each other.

use rustc_hash::FxHashMap;
use unicase::UniCase;

use crate::words::WordSegments;

/// A scope in which every rendered identifier must be unique across
/// case conventions.
#[derive(Debug, Default)]
pub struct NameScope {
    space: FxHashMap<Vec<UniCase<String>>, String>,
}

impl NameScope {
    /// Creates a new, empty scope.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope with the given identifiers pre-claimed.
    ///
    /// Useful for reserving the implicit members of a generated type,
    /// like the `id` and `href` accessors of a class struct.
    pub fn with_reserved<S: AsRef<str>>(reserved: impl IntoIterator<Item = S>) -> Self {
        let mut scope = Self::new();
        for name in reserved {
            // Duplicate reserved names are fine; only the first owner
            // is remembered.
            let _ = scope.claim(name.as_ref());
        }
        scope
    }

    /// Claims a rendered identifier within this scope.
    ///
    /// Returns an error if an identifier with the same case-folded
    /// word segments was already claimed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use metagen_core::unique::NameScope;
    /// let mut scope = NameScope::new();
    /// assert!(scope.claim("HTTPResponse").is_ok());
    /// assert!(scope.claim("HttpRequest").is_ok());
    /// let err = scope.claim("http_response").unwrap_err();
    /// assert_eq!(err.existing, "HTTPResponse");
    /// ```
    pub fn claim(&mut self, name: &str) -> Result<(), NameCollision> {
        let key: Vec<UniCase<String>> = WordSegments::new(name)
            .map(|segment| UniCase::new(segment.to_owned()))
            .collect();
        match self.space.get(&key) {
            Some(existing) => Err(NameCollision {
                name: name.to_owned(),
                existing: existing.clone(),
            }),
            None => {
                self.space.insert(key, name.to_owned());
                Ok(())
            }
        }
    }
}

/// Two identifiers in the same scope collapse to the same name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("`{name}` collides with `{existing}`")]
pub struct NameCollision {
    pub name: String,
    pub existing: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_names_claim() {
        let mut scope = NameScope::new();
        assert!(scope.claim("Cluster").is_ok());
        assert!(scope.claim("ClusterList").is_ok());
        assert!(scope.claim("IdentityProvider").is_ok());
    }

    #[test]
    fn test_case_fold_collision() {
        let mut scope = NameScope::new();
        scope.claim("XMLHttpRequest").unwrap();
        let err = scope.claim("xml_http_request").unwrap_err();
        assert_eq!(err.name, "xml_http_request");
        assert_eq!(err.existing, "XMLHttpRequest");
    }

    #[test]
    fn test_exact_collision() {
        let mut scope = NameScope::new();
        scope.claim("Name").unwrap();
        assert!(scope.claim("Name").is_err());
    }

    #[test]
    fn test_reserved_names() {
        let mut scope = NameScope::with_reserved(["Kind", "ID", "HREF", "Link", "Empty"]);
        assert!(scope.claim("Name").is_ok());
        let err = scope.claim("Id").unwrap_err();
        assert_eq!(err.existing, "ID");
    }

    #[test]
    fn test_single_word_runs_are_not_collisions() {
        let mut scope = NameScope::new();
        scope.claim("HTTPResponse").unwrap();
        // One word: no internal boundary, so no collision with the
        // two-word forms.
        assert!(scope.claim("Httpresponse").is_ok());
        assert!(scope.claim("ALLCAPS").is_ok());
    }
}
