//! Calculates Go names for model entities.

use heck::AsPascalCase;
use metagen_core::words::Name;

/// Go keywords that can't be used as identifiers. Private names that
/// land on one get an underscore suffix; public names can't collide,
/// since keywords are all lowercase.
const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Maps nomenclature to Go-legal names.
///
/// All methods are pure functions of the input name: the same name
/// always renders the same way, in any emitter.
#[derive(Clone, Copy, Debug, Default)]
pub struct NamesCalculator {
    reserved: ReservedWords,
}

/// The reserved-word table consulted by [`NamesCalculator::private`].
#[derive(Clone, Copy, Debug, Default)]
struct ReservedWords;

impl ReservedWords {
    fn contains(self, identifier: &str) -> bool {
        GO_KEYWORDS.contains(&identifier)
    }
}

impl NamesCalculator {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The exported form: each word capitalized and concatenated.
    ///
    /// ```
    /// # use metagen_codegen_go::NamesCalculator;
    /// # use metagen_core::words::Name;
    /// let names = NamesCalculator::new();
    /// let name = Name::parse("identity_provider").unwrap();
    /// assert_eq!(names.public(&name), "IdentityProvider");
    /// ```
    pub fn public(&self, name: &Name) -> String {
        name.words()
            .iter()
            .map(|word| AsPascalCase(word).to_string())
            .collect()
    }

    /// The unexported form: first word as-is, the rest capitalized.
    /// Reserved words get an underscore suffix.
    ///
    /// ```
    /// # use metagen_codegen_go::NamesCalculator;
    /// # use metagen_core::words::Name;
    /// let names = NamesCalculator::new();
    /// assert_eq!(names.private(&Name::parse("identityProvider").unwrap()), "identityProvider");
    /// assert_eq!(names.private(&Name::parse("type").unwrap()), "type_");
    /// ```
    pub fn private(&self, name: &Name) -> String {
        let mut words = name.words().iter();
        let mut result = words.next().cloned().unwrap_or_default();
        for word in words {
            result.push_str(&AsPascalCase(word).to_string());
        }
        if self.reserved.contains(&result) {
            result.push('_');
        }
        result
    }

    /// The output file name: lowercase words joined by underscores,
    /// plus the Go extension.
    pub fn file(&self, name: &Name) -> String {
        format!("{name}.go")
    }

    /// The wire form used in JSON field names: underscored lowercase.
    /// Round-trips through [`Name::parse`].
    pub fn tag(&self, name: &Name) -> String {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_public() {
        let names = NamesCalculator::new();
        assert_eq!(names.public(&Name::parse("cluster").unwrap()), "Cluster");
        assert_eq!(
            names.public(&Name::parse("identity_provider").unwrap()),
            "IdentityProvider"
        );
    }

    #[test]
    fn test_private() {
        let names = NamesCalculator::new();
        assert_eq!(names.private(&Name::parse("cluster").unwrap()), "cluster");
        assert_eq!(
            names.private(&Name::parse("server_version").unwrap()),
            "serverVersion"
        );
    }

    #[test]
    fn test_private_reserved_word_fixup() {
        let names = NamesCalculator::new();
        for keyword in ["type", "range", "func", "interface", "map"] {
            let name = Name::parse(keyword).unwrap();
            assert_eq!(names.private(&name), format!("{keyword}_"));
        }
        // Reserved words hidden inside longer names are fine.
        assert_eq!(
            names.private(&Name::parse("type_name").unwrap()),
            "typeName"
        );
    }

    #[test]
    fn test_file() {
        let names = NamesCalculator::new();
        let name = Name::parse("identityProvider").unwrap();
        assert_eq!(
            names.file(&name.cat(&Name::word("type"))),
            "identity_provider_type.go"
        );
    }

    #[test]
    fn test_tag_round_trips() {
        let names = NamesCalculator::new();
        for input in ["cluster", "identity_provider", "serverVersion", "AWSFlavour"] {
            let name = Name::parse(input).unwrap();
            assert_eq!(Name::parse(&names.tag(&name)).unwrap(), name);
        }
    }

    #[test]
    fn test_renderings_are_pure() {
        let names = NamesCalculator::new();
        let name = Name::parse("identity_provider").unwrap();
        assert_eq!(names.public(&name), names.public(&name));
        assert_eq!(names.private(&name), names.private(&name));
        assert_eq!(names.file(&name), names.file(&name));
        assert_eq!(names.tag(&name), names.tag(&name));
    }
}
