//! Assigns each version and utility scope to a Go package.

use std::path::PathBuf;

use metagen_core::model::{Service, Version};
use metagen_core::words::Name;

use crate::naming::NamesCalculator;

/// A Go package: an import specifier, a package identifier, and a
/// directory below the output root.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GoPackage {
    import_path: String,
    name: String,
    dir: PathBuf,
}

impl GoPackage {
    /// The full import path, usable directly in an `import` clause.
    #[inline]
    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    /// The package identifier in the `package` clause.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory holding the package's files, relative to the
    /// output root.
    #[inline]
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

/// Computes stable package assignments.
///
/// The base import path and the helper/error suffixes are fixed at
/// construction, so every emitter sees the same assignment.
#[derive(Clone, Debug)]
pub struct PackagesCalculator {
    base: String,
    names: NamesCalculator,
    helpers_suffix: Name,
    errors_suffix: Name,
}

impl PackagesCalculator {
    /// Creates a calculator rooted at the given base import path,
    /// e.g. `github.com/acme/sdk`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_owned(),
            names: NamesCalculator::new(),
            helpers_suffix: Name::word("helpers"),
            errors_suffix: Name::word("errors"),
        }
    }

    /// Overrides the suffixes used for the helpers and errors
    /// packages.
    pub fn with_suffixes(mut self, helpers: Name, errors: Name) -> Self {
        self.helpers_suffix = helpers;
        self.errors_suffix = errors;
        self
    }

    /// The package holding everything generated for one version:
    /// `<base>/<service>/<version>`.
    pub fn version_package(&self, service: &Service, version: &Version) -> GoPackage {
        let service_tag = self.names.tag(service.name());
        let version_tag = self.names.tag(version.name());
        GoPackage {
            import_path: format!("{}/{service_tag}/{version_tag}", self.base),
            name: version_tag.clone(),
            dir: PathBuf::from(service_tag).join(version_tag),
        }
    }

    /// The cross-version package of shared helper functions.
    pub fn helpers_package(&self) -> GoPackage {
        self.utility_package(&self.helpers_suffix)
    }

    /// The cross-version package of the wire error type.
    pub fn errors_package(&self) -> GoPackage {
        self.utility_package(&self.errors_suffix)
    }

    fn utility_package(&self, suffix: &Name) -> GoPackage {
        let tag = self.names.tag(suffix);
        GoPackage {
            import_path: format!("{}/{tag}", self.base),
            name: tag.clone(),
            dir: PathBuf::from(tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    use pretty_assertions::assert_eq;

    fn fixture() -> (Service, PackagesCalculator) {
        let mut service = Service::new(Name::from_words(["clusters", "mgmt"]));
        service.add_version(Version::new(Name::word("v1"), Name::word("root")));
        let packages = PackagesCalculator::new("github.com/acme/sdk");
        (service, packages)
    }

    #[test]
    fn test_version_package() {
        let (service, packages) = fixture();
        let package = packages.version_package(&service, &service.versions()[0]);
        assert_eq!(
            package.import_path(),
            "github.com/acme/sdk/clusters_mgmt/v1"
        );
        assert_eq!(package.name(), "v1");
        assert_eq!(package.dir(), Path::new("clusters_mgmt/v1"));
    }

    #[test]
    fn test_utility_packages() {
        let (_, packages) = fixture();
        assert_eq!(
            packages.helpers_package().import_path(),
            "github.com/acme/sdk/helpers"
        );
        assert_eq!(
            packages.errors_package().import_path(),
            "github.com/acme/sdk/errors"
        );
        assert_eq!(packages.errors_package().name(), "errors");
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let packages = PackagesCalculator::new("github.com/acme/sdk/");
        assert_eq!(
            packages.helpers_package().import_path(),
            "github.com/acme/sdk/helpers"
        );
    }

    #[test]
    fn test_custom_suffixes() {
        let packages = PackagesCalculator::new("github.com/acme/sdk")
            .with_suffixes(Name::word("internal"), Name::from_words(["api", "errors"]));
        assert_eq!(
            packages.helpers_package().import_path(),
            "github.com/acme/sdk/internal"
        );
        assert_eq!(
            packages.errors_package().dir(),
            Path::new("api_errors")
        );
    }
}
