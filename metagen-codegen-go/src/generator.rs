//! The orchestrator: configures the calculators and drives every
//! emitter over the model, accumulating errors through the reporter
//! and failing the run at the end if any were reported.

use std::path::PathBuf;

use metagen_core::model::{self, Model, Type, Version};
use metagen_core::reporter::Reporter;
use metagen_core::unique::NameScope;

use crate::builders::BuildersEmitter;
use crate::clients::ClientsEmitter;
use crate::errors::ErrorsEmitter;
use crate::helpers::HelpersEmitter;
use crate::naming::NamesCalculator;
use crate::packages::PackagesCalculator;
use crate::readers::ReadersEmitter;
use crate::refs::TypesCalculator;
use crate::servers::ServersEmitter;
use crate::types::TypesEmitter;
use crate::writers::WritersEmitter;
use crate::{ConfigError, FileSet, Formatter};

const COMPONENT: &str = "names";

/// Configures and creates a [`Generator`]. The reporter, model,
/// output, and the three calculators are mandatory; a missing piece
/// is a fatal configuration error.
#[derive(Default)]
pub struct GeneratorBuilder<'a> {
    reporter: Option<&'a Reporter>,
    model: Option<&'a Model>,
    output: Option<PathBuf>,
    names: Option<NamesCalculator>,
    packages: Option<PackagesCalculator>,
    types: Option<TypesCalculator>,
    formatter: Option<Box<dyn Formatter>>,
}

impl<'a> GeneratorBuilder<'a> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the object used to report information about the
    /// generation process, including errors.
    pub fn reporter(mut self, reporter: &'a Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Sets the model to generate code for.
    pub fn model(mut self, model: &'a Model) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets the output directory.
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Sets the calculator used to compute Go names.
    pub fn names(mut self, names: NamesCalculator) -> Self {
        self.names = Some(names);
        self
    }

    /// Sets the calculator used to compute package assignments.
    pub fn packages(mut self, packages: PackagesCalculator) -> Self {
        self.packages = Some(packages);
        self
    }

    /// Sets the calculator used to compute type reference forms.
    pub fn types(mut self, types: TypesCalculator) -> Self {
        self.types = Some(types);
        self
    }

    /// Overrides the formatter that output files pass through.
    pub fn formatter(mut self, formatter: Box<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn build(self) -> Result<Generator<'a>, ConfigError> {
        let reporter = self.reporter.ok_or(ConfigError::missing("reporter"))?;
        let model = self.model.ok_or(ConfigError::missing("model"))?;
        let output = self.output.ok_or(ConfigError::missing("output"))?;
        let names = self.names.ok_or(ConfigError::missing("names calculator"))?;
        let packages = self
            .packages
            .ok_or(ConfigError::missing("packages calculator"))?;
        let types = self.types.ok_or(ConfigError::missing("types calculator"))?;
        let files = match self.formatter {
            Some(formatter) => FileSet::with_formatter(output, formatter),
            None => FileSet::new(output),
        };
        Ok(Generator {
            reporter,
            model,
            files,
            names,
            packages,
            types,
        })
    }
}

/// Drives the full emitter family over the model.
pub struct Generator<'a> {
    reporter: &'a Reporter,
    model: &'a Model,
    files: FileSet,
    names: NamesCalculator,
    packages: PackagesCalculator,
    types: TypesCalculator,
}

impl<'a> Generator<'a> {
    /// Runs every emitter over the model.
    ///
    /// Model-structural, name-collision, and emission errors are
    /// reported and accumulated; the run fails at the end if any were
    /// reported. I/O errors and output path collisions fail
    /// immediately.
    pub fn run(&mut self) -> miette::Result<()> {
        tracing::debug!(output = %self.files.root().display(), "checking the model");
        model::check(self.reporter, self.model);
        self.check_names();

        tracing::debug!("running the emitters");
        HelpersEmitter {
            reporter: self.reporter,
            packages: &self.packages,
            files: &mut self.files,
        }
        .run()?;
        ErrorsEmitter {
            reporter: self.reporter,
            packages: &self.packages,
            files: &mut self.files,
        }
        .run()?;
        TypesEmitter {
            reporter: self.reporter,
            model: self.model,
            names: &self.names,
            packages: &self.packages,
            types: &self.types,
            files: &mut self.files,
        }
        .run()?;
        BuildersEmitter {
            reporter: self.reporter,
            model: self.model,
            names: &self.names,
            packages: &self.packages,
            types: &self.types,
            files: &mut self.files,
        }
        .run()?;
        ReadersEmitter {
            reporter: self.reporter,
            model: self.model,
            names: &self.names,
            packages: &self.packages,
            types: &self.types,
            files: &mut self.files,
        }
        .run()?;
        WritersEmitter {
            reporter: self.reporter,
            model: self.model,
            names: &self.names,
            packages: &self.packages,
            types: &self.types,
            files: &mut self.files,
        }
        .run()?;
        ClientsEmitter {
            reporter: self.reporter,
            model: self.model,
            names: &self.names,
            packages: &self.packages,
            types: &self.types,
            files: &mut self.files,
        }
        .run()?;
        ServersEmitter {
            reporter: self.reporter,
            model: self.model,
            names: &self.names,
            packages: &self.packages,
            types: &self.types,
            files: &mut self.files,
        }
        .run()?;

        match self.reporter.errors() {
            0 => Ok(()),
            1 => Err(miette::miette!("there was 1 error")),
            count => Err(miette::miette!("there were {count} errors")),
        }
    }

    /// Checks that sibling entities produce distinct Go identifiers
    /// after reserved-word fixup, including the derived type names
    /// (`<Name>List`, `<Name>Builder`, adapters, clients).
    fn check_names(&self) {
        for service in self.model.services() {
            for version in service.versions() {
                self.check_version_names(version);
            }
        }
    }

    fn check_version_names(&self, version: &Version) {
        let mut scope = NameScope::new();
        let mut claim = |rendered: String, owner: &dyn std::fmt::Display| {
            if let Err(collision) = scope.claim(&rendered) {
                self.reporter.error(
                    COMPONENT,
                    format!(
                        "in version '{}', '{owner}' produces identifier {collision}",
                        version.name()
                    ),
                );
            }
        };
        for ty in version.types() {
            claim(self.names.public(ty.name()), &ty.name());
            if ty.is_struct() {
                for derived in ["list", "builder", "list_builder"] {
                    let name = ty
                        .name()
                        .cat(&metagen_core::words::Name::from_words([derived]));
                    claim(self.names.public(&name), &ty.name());
                }
            }
        }
        for resource in version.resources() {
            for derived in ["server", "client", "adapter"] {
                let name = resource
                    .name()
                    .cat(&metagen_core::words::Name::from_words([derived]));
                claim(self.names.public(&name), &resource.name());
            }
        }

        for ty in version.types() {
            if ty.is_struct() {
                self.check_member_names(version, ty);
            }
        }
    }

    fn check_member_names(&self, version: &Version, ty: &Type) {
        // The accessors a class struct gains implicitly, plus the
        // members every generated struct has.
        let reserved: &[&str] = if ty.is_class() {
            &["Kind", "ID", "HREF", "Link", "Empty"]
        } else {
            &["Empty"]
        };
        let mut getters = NameScope::with_reserved(reserved);
        let field_reserved: &[&str] = if ty.is_class() {
            &["id", "href", "link"]
        } else {
            &[]
        };
        let mut fields = NameScope::with_reserved(field_reserved);
        for attribute in ty.attributes() {
            if let Err(collision) = getters.claim(&self.names.public(attribute.name())) {
                self.reporter.error(
                    COMPONENT,
                    format!(
                        "in version '{}', attribute '{}' of '{}' produces accessor {collision}",
                        version.name(),
                        attribute.name(),
                        ty.name()
                    ),
                );
            }
            if let Err(collision) = fields.claim(&self.names.private(attribute.name())) {
                self.reporter.error(
                    COMPONENT,
                    format!(
                        "in version '{}', attribute '{}' of '{}' produces field {collision}",
                        version.name(),
                        attribute.name(),
                        ty.name()
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use metagen_core::model::{Attribute, Resource, ScalarKind, Service, TypeKind, TypeRef};
    use metagen_core::words::Name;
    use pretty_assertions::assert_eq;

    fn minimal_model() -> Model {
        let mut version = Version::new(Name::word("v1"), Name::word("root"));
        version.add_resource(Resource::new(Name::word("root")));
        let mut service = Service::new(Name::from_words(["clusters", "mgmt"]));
        service.add_version(version);
        let mut model = Model::new();
        model.add_service(service);
        model
    }

    fn builder_with<'a>(
        reporter: &'a Reporter,
        model: &'a Model,
        output: &std::path::Path,
    ) -> GeneratorBuilder<'a> {
        GeneratorBuilder::new()
            .reporter(reporter)
            .model(model)
            .output(output)
            .names(NamesCalculator::new())
            .packages(PackagesCalculator::new("github.com/acme/sdk"))
            .types(TypesCalculator::new(NamesCalculator::new()))
    }

    #[test]
    fn test_builder_requires_mandatory_configuration() {
        let err = GeneratorBuilder::new().build().err().unwrap();
        assert_eq!(err.to_string(), "reporter is mandatory");

        let reporter = Reporter::new();
        let err = GeneratorBuilder::new()
            .reporter(&reporter)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "model is mandatory");

        let model = minimal_model();
        let err = GeneratorBuilder::new()
            .reporter(&reporter)
            .model(&model)
            .build()
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "output is mandatory");

        let err = GeneratorBuilder::new()
            .reporter(&reporter)
            .model(&model)
            .output("out")
            .build()
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "names calculator is mandatory");
    }

    #[test]
    fn test_run_succeeds_on_well_formed_model() {
        let reporter = Reporter::new();
        let model = minimal_model();
        let dir = tempfile::tempdir().unwrap();
        let mut generator = builder_with(&reporter, &model, dir.path()).build().unwrap();
        generator.run().unwrap();
        assert_eq!(reporter.errors(), 0);
    }

    #[test]
    fn test_run_fails_with_singular_message() {
        let reporter = Reporter::new();
        let mut model = minimal_model();
        // One dangling reference.
        let mut version = Version::new(Name::word("v2"), Name::word("root"));
        version.add_resource(Resource::new(Name::word("root")));
        version.add_type(metagen_core::model::Type::new(
            Name::word("cluster"),
            TypeKind::Struct {
                class: false,
                attributes: vec![Attribute::new(
                    Name::word("flavour"),
                    TypeRef::new(Name::word("flavour")),
                )],
            },
        ));
        let mut service = Service::new(Name::word("other"));
        service.add_version(version);
        model.add_service(service);

        let dir = tempfile::tempdir().unwrap();
        let mut generator = builder_with(&reporter, &model, dir.path()).build().unwrap();
        let err = generator.run().unwrap_err();
        assert_eq!(err.to_string(), "there was 1 error");
    }

    #[test]
    fn test_run_fails_with_plural_message() {
        let reporter = Reporter::new();
        let mut model = Model::new();
        let mut version = Version::new(Name::word("v1"), Name::word("root"));
        version.add_resource(Resource::new(Name::word("root")));
        // Two attributes with dangling references.
        version.add_type(metagen_core::model::Type::new(
            Name::word("cluster"),
            TypeKind::Struct {
                class: false,
                attributes: vec![
                    Attribute::new(Name::word("flavour"), TypeRef::new(Name::word("flavour"))),
                    Attribute::new(Name::word("region"), TypeRef::new(Name::word("region"))),
                ],
            },
        ));
        let mut service = Service::new(Name::word("other"));
        service.add_version(version);
        model.add_service(service);

        let dir = tempfile::tempdir().unwrap();
        let mut generator = builder_with(&reporter, &model, dir.path()).build().unwrap();
        let err = generator.run().unwrap_err();
        assert!(err.to_string().starts_with("there were "));
        assert!(err.to_string().ends_with("errors"));
    }

    #[test]
    fn test_name_collision_is_reported() {
        let reporter = Reporter::new();
        let mut model = Model::new();
        let mut version = Version::new(Name::word("v1"), Name::word("root"));
        version.add_resource(Resource::new(Name::word("root")));
        // A struct named `cluster` also derives `ClusterList`, which
        // collides with this declared type.
        version.add_type(metagen_core::model::Type::new(
            Name::word("cluster"),
            TypeKind::Struct {
                class: false,
                attributes: vec![],
            },
        ));
        version.add_type(metagen_core::model::Type::new(
            Name::from_words(["cluster", "list"]),
            TypeKind::Struct {
                class: false,
                attributes: vec![],
            },
        ));
        let mut service = Service::new(Name::word("svc"));
        service.add_version(version);
        model.add_service(service);

        let dir = tempfile::tempdir().unwrap();
        let mut generator = builder_with(&reporter, &model, dir.path()).build().unwrap();
        assert!(generator.run().is_err());
        assert!(
            reporter
                .records()
                .iter()
                .any(|record| record.component == "names")
        );
    }

    #[test]
    fn test_class_attribute_collides_with_implicit_accessor() {
        let reporter = Reporter::new();
        let mut model = Model::new();
        let mut version = Version::new(Name::word("v1"), Name::word("root"));
        version.add_resource(Resource::new(Name::word("root")));
        version.add_type(metagen_core::model::Type::new(
            Name::word("cluster"),
            TypeKind::Struct {
                class: true,
                attributes: vec![Attribute::new(
                    Name::word("kind"),
                    TypeRef::scalar(ScalarKind::String),
                )],
            },
        ));
        let mut service = Service::new(Name::word("svc"));
        service.add_version(version);
        model.add_service(service);

        let dir = tempfile::tempdir().unwrap();
        let mut generator = builder_with(&reporter, &model, dir.path()).build().unwrap();
        assert!(generator.run().is_err());
    }
}
