//! The per-file emission context.
//!
//! A [`Buffer`] accumulates the source of exactly one output file. It
//! owns the file's helper bindings and import set: emitters record
//! imports up front, and the buffer elides the unused ones at write
//! time, so the emitted import block is deterministic without the
//! emitters tracking usage themselves.
//!
//! The buffer life cycle is open → has content → written, encoded in
//! the types: a buffer can't exist without its package and file
//! identity ([`BufferBuilder::build`] checks them), and [`Buffer::write`]
//! consumes the buffer, so a second write doesn't compile.

use std::collections::BTreeMap;

use metagen_core::reporter::Reporter;
use metagen_core::template::{self, Helpers, TemplateError, Value};
use rustc_hash::FxHashMap;

use crate::packages::GoPackage;
use crate::{ConfigError, FileSet};

const COMPONENT: &str = "buffer";

/// Configures and creates a [`Buffer`]. The reporter, package, and
/// file are mandatory.
#[derive(Default)]
pub struct BufferBuilder<'a> {
    reporter: Option<&'a Reporter>,
    package: Option<GoPackage>,
    file: Option<String>,
    helpers: Helpers<'a>,
}

impl<'a> BufferBuilder<'a> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reporter(mut self, reporter: &'a Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn package(mut self, package: GoPackage) -> Self {
        self.package = Some(package);
        self
    }

    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Binds a helper callable from templates emitted through this
    /// buffer. Bindings are scoped to the buffer.
    pub fn function<F>(mut self, name: &str, helper: F) -> Self
    where
        F: Fn(&[Value<'a>]) -> Result<Value<'a>, TemplateError> + 'a,
    {
        self.helpers.bind(name, helper);
        self
    }

    pub fn build(self) -> Result<Buffer<'a>, ConfigError> {
        let reporter = self.reporter.ok_or(ConfigError::missing("reporter"))?;
        let package = self.package.ok_or(ConfigError::missing("package"))?;
        let file = self.file.ok_or(ConfigError::missing("file"))?;
        Ok(Buffer {
            reporter,
            package,
            file,
            helpers: self.helpers,
            imports: BTreeMap::new(),
            code: String::new(),
        })
    }
}

/// Accumulates the source of one output file.
#[derive(Debug)]
pub struct Buffer<'a> {
    reporter: &'a Reporter,
    package: GoPackage,
    file: String,
    helpers: Helpers<'a>,
    /// Import path → alias. Ordered so the emitted block is
    /// deterministic.
    imports: BTreeMap<String, Option<String>>,
    code: String,
}

impl<'a> Buffer<'a> {
    /// Records a dependency on an external package. Duplicates are
    /// collapsed; imports that end up unused in the emitted code are
    /// elided at write time. An empty alias means no alias.
    pub fn import(&mut self, path: &str, alias: &str) {
        let alias = (!alias.is_empty()).then(|| alias.to_owned());
        self.imports.entry(path.to_owned()).or_insert(alias);
    }

    /// Records the imports needed by a calculated type reference.
    pub fn import_ref(&mut self, reference: &crate::refs::GoTypeRef) {
        for import in reference.imports() {
            self.import(&import.path, import.alias.as_deref().unwrap_or(""));
        }
    }

    /// Expands a template with the given bindings and the buffer's
    /// helpers, appending the result.
    ///
    /// Expansion failures are reported through the reporter and leave
    /// the buffer unchanged; the run fails at the end.
    pub fn emit(&mut self, template: &str, bindings: &[(&str, Value<'a>)]) {
        let root = Value::Object(
            bindings
                .iter()
                .map(|(name, value)| ((*name).to_owned(), value.clone()))
                .collect::<FxHashMap<_, _>>(),
        );
        match template::expand(template, &root, &self.helpers) {
            Ok(expanded) => self.code.push_str(&expanded),
            Err(err) => self.reporter.error(
                COMPONENT,
                format!("can't expand template for file '{}': {err}", self.file),
            ),
        }
    }

    /// Flushes the accumulated source through the formatter to disk.
    ///
    /// Consumes the buffer: each buffer is written exactly once.
    pub fn write(self, files: &mut FileSet) -> miette::Result<()> {
        let mut source = String::new();
        source.push_str("// Code generated by metagen, DO NOT EDIT.\n\n");
        source.push_str(&format!("package {}\n\n", self.package.name()));

        let used: Vec<_> = self
            .imports
            .iter()
            .filter(|(path, alias)| {
                let qualifier = alias
                    .as_deref()
                    .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(path));
                self.code.contains(&format!("{qualifier}."))
            })
            .collect();
        if !used.is_empty() {
            source.push_str("import (\n");
            for (path, alias) in used {
                match alias {
                    Some(alias) => source.push_str(&format!("{alias} \"{path}\"\n")),
                    None => source.push_str(&format!("\"{path}\"\n")),
                }
            }
            source.push_str(")\n\n");
        }
        source.push_str(&self.code);

        let path = self.package.dir().join(&self.file);
        files.write(&path, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;
    use metagen_core::words::Name;
    use pretty_assertions::assert_eq;

    use crate::packages::PackagesCalculator;

    fn package() -> GoPackage {
        let mut service =
            metagen_core::model::Service::new(Name::from_words(["clusters", "mgmt"]));
        service.add_version(metagen_core::model::Version::new(
            Name::word("v1"),
            Name::word("root"),
        ));
        PackagesCalculator::new("github.com/acme/sdk")
            .version_package(&service, &service.versions()[0])
    }

    fn write_to_string(buffer: Buffer<'_>) -> String {
        let dir = tempfile::tempdir().unwrap();
        let mut files = FileSet::new(dir.path());
        buffer.write(&mut files).unwrap();
        std::fs::read_to_string(dir.path().join("clusters_mgmt/v1/cluster_type.go")).unwrap()
    }

    #[test]
    fn test_builder_requires_mandatory_fields() {
        let reporter = Reporter::new();
        let err = BufferBuilder::new().build().unwrap_err();
        assert_eq!(err.to_string(), "reporter is mandatory");
        let err = BufferBuilder::new()
            .reporter(&reporter)
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "package is mandatory");
        let err = BufferBuilder::new()
            .reporter(&reporter)
            .package(package())
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "file is mandatory");
    }

    #[test]
    fn test_emit_and_write() {
        let reporter = Reporter::new();
        let mut buffer = BufferBuilder::new()
            .reporter(&reporter)
            .package(package())
            .file("cluster_type.go")
            .build()
            .unwrap();
        buffer.emit(
            "const {{ .Kind }}Kind = \"{{ .Kind }}\"\n",
            &[("Kind", Value::str("Cluster"))],
        );
        let source = write_to_string(buffer);
        assert_eq!(
            source,
            indoc! {r#"
                // Code generated by metagen, DO NOT EDIT.

                package v1

                const ClusterKind = "Cluster"
            "#}
        );
        assert_eq!(reporter.errors(), 0);
    }

    #[test]
    fn test_unused_imports_are_elided() {
        let reporter = Reporter::new();
        let mut buffer = BufferBuilder::new()
            .reporter(&reporter)
            .package(package())
            .file("cluster_type.go")
            .build()
            .unwrap();
        buffer.import("time", "");
        buffer.import("net/http", "");
        buffer.emit("var verb = http.MethodGet\n", &[]);
        let source = write_to_string(buffer);
        assert!(source.contains("\"net/http\""));
        assert!(!source.contains("\"time\""));
    }

    #[test]
    fn test_imports_are_deduplicated_and_ordered() {
        let reporter = Reporter::new();
        let mut buffer = BufferBuilder::new()
            .reporter(&reporter)
            .package(package())
            .file("cluster_type.go")
            .build()
            .unwrap();
        buffer.import("time", "");
        buffer.import("net/http", "");
        buffer.import("time", "");
        buffer.emit("var a = time.Now\nvar b = http.MethodGet\n", &[]);
        let source = write_to_string(buffer);
        let block = indoc! {r#"
            import (
            	"net/http"
            	"time"
            )
        "#};
        assert!(source.contains(block), "imports block in:\n{source}");
    }

    #[test]
    fn test_aliased_import() {
        let reporter = Reporter::new();
        let mut buffer = BufferBuilder::new()
            .reporter(&reporter)
            .package(package())
            .file("cluster_type.go")
            .build()
            .unwrap();
        buffer.import("github.com/acme/sdk/errors", "apierrors");
        buffer.emit("var send = apierrors.SendNotFound\n", &[]);
        let source = write_to_string(buffer);
        assert!(source.contains("apierrors \"github.com/acme/sdk/errors\""));
    }

    #[test]
    fn test_helper_binding() {
        let reporter = Reporter::new();
        let mut buffer = BufferBuilder::new()
            .reporter(&reporter)
            .package(package())
            .file("cluster_type.go")
            .build()
            .unwrap();
        buffer.emit("{{ shout .Name }}\n", &[("Name", Value::str("cluster"))]);
        assert_eq!(reporter.errors(), 1, "unknown helper is an error");

        let mut buffer = BufferBuilder::new()
            .reporter(&reporter)
            .package(package())
            .file("cluster_type.go")
            .function("shout", |args| {
                use metagen_core::template::Args;
                Ok(Value::Str(args.str_(0)?.to_uppercase()))
            })
            .build()
            .unwrap();
        buffer.emit("{{ shout .Name }}\n", &[("Name", Value::str("cluster"))]);
        let source = write_to_string(buffer);
        assert!(source.contains("CLUSTER"));
    }

    #[test]
    fn test_failed_expansion_leaves_buffer_unchanged() {
        let reporter = Reporter::new();
        let mut buffer = BufferBuilder::new()
            .reporter(&reporter)
            .package(package())
            .file("cluster_type.go")
            .build()
            .unwrap();
        buffer.emit("good\n", &[]);
        buffer.emit("{{ .Missing }}\n", &[]);
        assert_eq!(reporter.errors(), 1);
        let source = write_to_string(buffer);
        assert!(source.contains("good"));
        assert!(!source.contains("Missing"));
    }
}
