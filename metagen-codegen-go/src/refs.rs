//! Calculates Go reference forms for model types.
//!
//! For every model type there are up to three reference forms:
//!
//! * the *value* form, used where a value is always present;
//! * the *nullable* form, which distinguishes "absent" from "zero";
//! * the *list container* form, used for `link`ed list attributes
//!   that carry href and kind metadata alongside their items.
//!
//! The [`TypesCalculator::field_form`] / [`TypesCalculator::getter_form`]
//! pair is the authoritative contract every emitter honors: fields
//! store the nullable form (or the container for linked lists), and
//! getters return the value form for scalars and enums, falling back
//! to the zero value when the field is absent.

use std::fmt::{self, Display};

use metagen_core::model::{Attribute, ScalarKind, Type, TypeKind, TypeRef, Version};
use metagen_core::words::Name;

use crate::naming::NamesCalculator;

/// A rendered Go type reference, with the imports its text needs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GoTypeRef {
    text: String,
    imports: Vec<GoImport>,
}

impl GoTypeRef {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            imports: Vec::new(),
        }
    }

    fn with_import(text: impl Into<String>, import: GoImport) -> Self {
        Self {
            text: text.into(),
            imports: vec![import],
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn imports(&self) -> &[GoImport] {
        &self.imports
    }
}

impl Display for GoTypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// An import required by a type reference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GoImport {
    pub path: String,
    pub alias: Option<String>,
}

impl GoImport {
    fn time() -> Self {
        Self {
            path: "time".to_owned(),
            alias: None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ReferenceError {
    #[error("type '{name}' doesn't resolve")]
    Unresolved { name: Name },
    #[error("type '{name}' isn't a list of structs")]
    NotListOfStructs { name: Name },
}

impl From<ReferenceError> for metagen_core::template::TemplateError {
    fn from(err: ReferenceError) -> Self {
        Self::Helper(err.to_string())
    }
}

/// Computes Go reference forms for model types.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypesCalculator {
    names: NamesCalculator,
}

impl TypesCalculator {
    #[inline]
    pub fn new(names: NamesCalculator) -> Self {
        Self { names }
    }

    /// The direct, by-value form.
    pub fn value_reference(
        &self,
        version: &Version,
        ty: &Type,
    ) -> Result<GoTypeRef, ReferenceError> {
        Ok(match ty.kind() {
            TypeKind::Scalar(kind) => scalar_value(*kind),
            TypeKind::Enum { .. } => GoTypeRef::plain(self.enum_name(ty)),
            TypeKind::Struct { .. } => GoTypeRef::plain(format!("*{}", self.object_name(ty))),
            TypeKind::List { element } => {
                let element = self.element_reference(version, element)?;
                GoTypeRef {
                    text: format!("[]{}", element.text),
                    imports: element.imports,
                }
            }
            TypeKind::Map { key, element } => {
                let key = self.element_reference(version, key)?;
                let element = self.element_reference(version, element)?;
                let mut imports = key.imports;
                imports.extend(element.imports);
                GoTypeRef {
                    text: format!("map[{}]{}", key.text, element.text),
                    imports,
                }
            }
        })
    }

    /// The form that can carry "absent" distinctly from "zero".
    pub fn nullable_reference(
        &self,
        version: &Version,
        ty: &Type,
    ) -> Result<GoTypeRef, ReferenceError> {
        Ok(match ty.kind() {
            TypeKind::Scalar(ScalarKind::Interface) => GoTypeRef::plain("interface{}"),
            TypeKind::Scalar(kind) => {
                let value = scalar_value(*kind);
                GoTypeRef {
                    text: format!("*{}", value.text),
                    imports: value.imports,
                }
            }
            TypeKind::Enum { .. } => GoTypeRef::plain(format!("*{}", self.enum_name(ty))),
            // Structs, slices, and maps are by-reference forms already.
            TypeKind::Struct { .. } | TypeKind::List { .. } | TypeKind::Map { .. } => {
                self.value_reference(version, ty)?
            }
        })
    }

    /// The specialized container form for `link`ed list attributes:
    /// `*<Element>List`.
    pub fn list_reference(&self, version: &Version, ty: &Type) -> Result<GoTypeRef, ReferenceError> {
        let element = match ty.kind() {
            TypeKind::List { element } => self.resolve(version, element)?,
            _ => {
                return Err(ReferenceError::NotListOfStructs {
                    name: ty.name().clone(),
                });
            }
        };
        if !element.is_struct() {
            return Err(ReferenceError::NotListOfStructs {
                name: ty.name().clone(),
            });
        }
        Ok(GoTypeRef::plain(format!(
            "*{}List",
            self.object_name(element)
        )))
    }

    /// The zero literal of a type's value form.
    pub fn zero_value(&self, ty: &Type) -> String {
        match ty.kind() {
            TypeKind::Scalar(ScalarKind::Boolean) => "false".to_owned(),
            TypeKind::Scalar(ScalarKind::Integer) | TypeKind::Scalar(ScalarKind::Long) => {
                "0".to_owned()
            }
            TypeKind::Scalar(ScalarKind::Float) => "0.0".to_owned(),
            TypeKind::Scalar(ScalarKind::String) | TypeKind::Enum { .. } => "\"\"".to_owned(),
            TypeKind::Scalar(ScalarKind::Date) => "time.Time{}".to_owned(),
            TypeKind::Scalar(ScalarKind::Interface) => "nil".to_owned(),
            TypeKind::Struct { .. } | TypeKind::List { .. } | TypeKind::Map { .. } => {
                "nil".to_owned()
            }
        }
    }

    /// The identifier of an enum type alias.
    pub fn enum_name(&self, ty: &Type) -> String {
        self.names.public(ty.name())
    }

    /// The form stored in a generated struct field, per the selection
    /// table: nullable everywhere, except linked lists, which store
    /// the list container.
    pub fn field_form(
        &self,
        version: &Version,
        attribute: &Attribute,
    ) -> Result<GoTypeRef, ReferenceError> {
        let ty = self.resolve(version, attribute.type_ref())?;
        match ty.kind() {
            TypeKind::List { .. } if attribute.link() => self.list_reference(version, ty),
            _ => self.nullable_reference(version, ty),
        }
    }

    /// The form returned by a generated getter: the value form for
    /// scalars and enums (zero when absent), the nullable form for
    /// structs, plain lists, and maps, and the container for linked
    /// lists.
    pub fn getter_form(
        &self,
        version: &Version,
        attribute: &Attribute,
    ) -> Result<GoTypeRef, ReferenceError> {
        let ty = self.resolve(version, attribute.type_ref())?;
        match ty.kind() {
            TypeKind::Scalar(_) | TypeKind::Enum { .. } => self.value_reference(version, ty),
            TypeKind::List { .. } if attribute.link() => self.list_reference(version, ty),
            _ => self.nullable_reference(version, ty),
        }
    }

    /// The form stored in the shadow data structs used by the JSON
    /// readers and writers: pointers for scalars and enums, nested
    /// data structs for structs, and the list data envelope for
    /// linked lists.
    pub fn data_form(
        &self,
        version: &Version,
        attribute: &Attribute,
    ) -> Result<GoTypeRef, ReferenceError> {
        let ty = self.resolve(version, attribute.type_ref())?;
        Ok(match ty.kind() {
            TypeKind::Scalar(ScalarKind::Interface) => GoTypeRef::plain("interface{}"),
            TypeKind::Scalar(_) | TypeKind::Enum { .. } => self.nullable_reference(version, ty)?,
            TypeKind::Struct { .. } => GoTypeRef::plain(format!("*{}", self.data_name(ty))),
            TypeKind::List { element } => {
                let element = self.resolve(version, element)?;
                if attribute.link() {
                    GoTypeRef::plain(format!("*{}", self.list_data_name(element)))
                } else if element.is_struct() {
                    GoTypeRef::plain(format!("[]*{}", self.data_name(element)))
                } else {
                    self.value_reference(version, ty)?
                }
            }
            TypeKind::Map { key, element } => {
                let key = self.element_reference(version, key)?;
                let element_ty = self.resolve(version, element)?;
                let element_text = if element_ty.is_struct() {
                    format!("*{}", self.data_name(element_ty))
                } else {
                    self.element_reference(version, element)?.text().to_owned()
                };
                GoTypeRef::plain(format!("map[{}]{element_text}", key.text()))
            }
        })
    }

    /// The identifier of a struct type's shadow data struct, e.g.
    /// `clusterData` for `Cluster`.
    pub fn data_name(&self, ty: &Type) -> String {
        self.names.private(&ty.name().cat(&Name::word("data")))
    }

    /// The identifier of a struct type's list data envelope, e.g.
    /// `clusterListData` for `Cluster`.
    pub fn list_data_name(&self, ty: &Type) -> String {
        self.names
            .private(&ty.name().cat(&Name::word("list")).cat(&Name::word("data")))
    }

    fn object_name(&self, ty: &Type) -> String {
        self.names.public(ty.name())
    }

    /// The form of a list element or map key/value.
    fn element_reference(
        &self,
        version: &Version,
        reference: &TypeRef,
    ) -> Result<GoTypeRef, ReferenceError> {
        let ty = self.resolve(version, reference)?;
        match ty.kind() {
            TypeKind::Scalar(_) | TypeKind::Enum { .. } | TypeKind::Struct { .. } => {
                self.value_reference(version, ty)
            }
            TypeKind::List { .. } | TypeKind::Map { .. } => self.nullable_reference(version, ty),
        }
    }

    fn resolve<'a>(
        &self,
        version: &'a Version,
        reference: &TypeRef,
    ) -> Result<&'a Type, ReferenceError> {
        version
            .resolve(reference)
            .ok_or_else(|| ReferenceError::Unresolved {
                name: reference.name().clone(),
            })
    }
}

fn scalar_value(kind: ScalarKind) -> GoTypeRef {
    match kind {
        ScalarKind::Boolean => GoTypeRef::plain("bool"),
        ScalarKind::Integer => GoTypeRef::plain("int"),
        ScalarKind::Long => GoTypeRef::plain("int64"),
        ScalarKind::Float => GoTypeRef::plain("float64"),
        ScalarKind::String => GoTypeRef::plain("string"),
        ScalarKind::Date => GoTypeRef::with_import("time.Time", GoImport::time()),
        ScalarKind::Interface => GoTypeRef::plain("interface{}"),
    }
}
