//! Values flowing through template expansion.
//!
//! A [`Value`] either borrows a model entity or holds a plain scalar
//! or list. Field access is a total match per entity kind: unknown
//! fields and dangling references are fatal emission errors, never
//! silently empty output.

use rustc_hash::FxHashMap;

use crate::model::{
    Attribute, EnumValue, Literal, Locator, Method, MethodKind, Parameter, Resource, ScalarKind,
    Type, TypeKind, TypeRef, Version,
};
use crate::words::Name;

use super::TemplateError;

/// A value bound into a template expansion.
#[derive(Clone, Debug)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// A nomenclatural name; renders in its wire (tag) form.
    Name(Name),
    List(Vec<Value<'a>>),
    /// A string-keyed record; the root bindings of an expansion.
    Object(FxHashMap<String, Value<'a>>),
    Version(&'a Version),
    Type(&'a Version, &'a Type),
    Attribute(&'a Version, &'a Attribute),
    EnumValue(&'a Version, &'a Type, &'a EnumValue),
    Resource(&'a Version, &'a Resource),
    Locator(&'a Version, &'a Locator),
    Method(&'a Version, &'a Method),
    Parameter(&'a Version, &'a Parameter),
}

impl<'a> Value<'a> {
    pub fn str(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }

    pub fn opt_str(value: Option<&str>) -> Self {
        match value {
            Some(value) => Value::Str(value.to_owned()),
            None => Value::Null,
        }
    }

    /// A short description of this value's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Name(_) => "name",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Version(_) => "version",
            Value::Type(..) => "type",
            Value::Attribute(..) => "attribute",
            Value::EnumValue(..) => "enum value",
            Value::Resource(..) => "resource",
            Value::Locator(..) => "locator",
            Value::Method(..) => "method",
            Value::Parameter(..) => "parameter",
        }
    }

    /// Whether this value counts as true in a conditional.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(value) => *value,
            Value::Int(value) => *value != 0,
            Value::Str(value) => !value.is_empty(),
            Value::List(values) => !values.is_empty(),
            _ => true,
        }
    }

    /// Renders this value as substitution output.
    pub fn render(&self) -> Result<String, TemplateError> {
        match self {
            Value::Bool(value) => Ok(value.to_string()),
            Value::Int(value) => Ok(value.to_string()),
            Value::Str(value) => Ok(value.clone()),
            Value::Name(name) => Ok(name.to_string()),
            _ => Err(TemplateError::NotRenderable { kind: self.kind() }),
        }
    }

    /// Iterates this value in a `range` action.
    pub fn iterate(&self) -> Result<&[Value<'a>], TemplateError> {
        match self {
            Value::List(values) => Ok(values),
            _ => Err(TemplateError::NotIterable { kind: self.kind() }),
        }
    }

    /// Accesses a named field of this value.
    pub fn field(&self, field: &str) -> Result<Value<'a>, TemplateError> {
        let unknown = || TemplateError::UnknownField {
            field: field.to_owned(),
            on: self.kind(),
        };
        match *self {
            Value::Object(ref fields) => fields.get(field).cloned().ok_or_else(unknown),
            Value::Version(version) => match field {
                "Name" => Ok(Value::Name(version.name().clone())),
                "Types" => Ok(Value::List(
                    version.types().map(|ty| Value::Type(version, ty)).collect(),
                )),
                "Resources" => Ok(Value::List(
                    version
                        .resources()
                        .map(|resource| Value::Resource(version, resource))
                        .collect(),
                )),
                _ => Err(unknown()),
            },
            Value::Type(version, ty) => match field {
                "Name" => Ok(Value::Name(ty.name().clone())),
                "Doc" => Ok(Value::opt_str(ty.doc())),
                "IsScalar" => Ok(Value::Bool(ty.is_scalar())),
                "IsEnum" => Ok(Value::Bool(ty.is_enum())),
                "IsStruct" => Ok(Value::Bool(ty.is_struct())),
                "IsList" => Ok(Value::Bool(ty.is_list())),
                "IsMap" => Ok(Value::Bool(ty.is_map())),
                "IsClass" => Ok(Value::Bool(ty.is_class())),
                "IsInterface" => Ok(Value::Bool(matches!(
                    ty.kind(),
                    TypeKind::Scalar(ScalarKind::Interface)
                ))),
                "Attributes" => Ok(Value::List(
                    ty.attributes()
                        .iter()
                        .map(|attribute| Value::Attribute(version, attribute))
                        .collect(),
                )),
                "Values" => Ok(Value::List(
                    ty.values()
                        .iter()
                        .map(|value| Value::EnumValue(version, ty, value))
                        .collect(),
                )),
                "Element" => {
                    let element = ty.element().ok_or_else(unknown)?;
                    resolve(version, element.name())
                }
                _ => Err(unknown()),
            },
            Value::Attribute(version, attribute) => match field {
                "Name" => Ok(Value::Name(attribute.name().clone())),
                "Doc" => Ok(Value::opt_str(attribute.doc())),
                "Link" => Ok(Value::Bool(attribute.link())),
                "Type" => resolve(version, attribute.type_ref().name()),
                _ => Err(unknown()),
            },
            Value::EnumValue(version, ty, value) => match field {
                "Name" => Ok(Value::Name(value.name().clone())),
                "Doc" => Ok(Value::opt_str(value.doc())),
                "Type" => Ok(Value::Type(version, ty)),
                _ => Err(unknown()),
            },
            Value::Resource(version, resource) => match field {
                "Name" => Ok(Value::Name(resource.name().clone())),
                "Doc" => Ok(Value::opt_str(resource.doc())),
                "Methods" => Ok(Value::List(
                    resource
                        .methods()
                        .iter()
                        .map(|method| Value::Method(version, method))
                        .collect(),
                )),
                "Locators" => Ok(Value::List(
                    resource
                        .locators()
                        .iter()
                        .map(|locator| Value::Locator(version, locator))
                        .collect(),
                )),
                _ => Err(unknown()),
            },
            Value::Locator(version, locator) => match field {
                "Name" => Ok(Value::Name(locator.name().clone())),
                "Identified" => Ok(Value::Bool(locator.is_identified())),
                "Target" => match version.resource(locator.target()) {
                    Some(resource) => Ok(Value::Resource(version, resource)),
                    None => Err(TemplateError::UnresolvedReference {
                        name: locator.target().to_string(),
                    }),
                },
                _ => Err(unknown()),
            },
            Value::Method(version, method) => match field {
                "Name" => Ok(Value::Name(method.name().clone())),
                "Doc" => Ok(Value::opt_str(method.doc())),
                "IsList" => Ok(Value::Bool(method.kind() == MethodKind::List)),
                "IsAdd" => Ok(Value::Bool(method.kind() == MethodKind::Add)),
                "IsGet" => Ok(Value::Bool(method.kind() == MethodKind::Get)),
                "IsUpdate" => Ok(Value::Bool(method.kind() == MethodKind::Update)),
                "IsDelete" => Ok(Value::Bool(method.kind() == MethodKind::Delete)),
                "IsAction" => Ok(Value::Bool(method.kind() == MethodKind::Action)),
                "Parameters" => Ok(Value::List(
                    method
                        .parameters()
                        .iter()
                        .map(|parameter| Value::Parameter(version, parameter))
                        .collect(),
                )),
                "InParameters" => Ok(Value::List(
                    method
                        .in_parameters()
                        .map(|parameter| Value::Parameter(version, parameter))
                        .collect(),
                )),
                "OutParameters" => Ok(Value::List(
                    method
                        .out_parameters()
                        .map(|parameter| Value::Parameter(version, parameter))
                        .collect(),
                )),
                _ => Err(unknown()),
            },
            Value::Parameter(version, parameter) => match field {
                "Name" => Ok(Value::Name(parameter.name().clone())),
                "Type" => resolve(version, parameter.type_ref().name()),
                "Default" => Ok(match parameter.default() {
                    Some(Literal::Boolean(value)) => Value::Bool(*value),
                    Some(Literal::Integer(value)) => Value::Int(*value),
                    Some(Literal::String(value)) => Value::Str(value.clone()),
                    None => Value::Null,
                }),
                _ => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }
}

fn resolve<'a>(version: &'a Version, name: &Name) -> Result<Value<'a>, TemplateError> {
    match version.resolve(&TypeRef::new(name.clone())) {
        Some(ty) => Ok(Value::Type(version, ty)),
        None => Err(TemplateError::UnresolvedReference {
            name: name.to_string(),
        }),
    }
}

/// Typed access to helper arguments.
///
/// Helper functions receive a slice of values; this trait pulls out
/// the expected kinds with uniform error reporting.
pub trait Args<'a> {
    fn arg(&self, index: usize) -> Result<&Value<'a>, TemplateError>;

    fn str_<'s>(&'s self, index: usize) -> Result<&'s str, TemplateError>
    where
        'a: 's,
    {
        match self.arg(index)? {
            Value::Str(value) => Ok(value),
            other => Err(wrong(index, "string", other)),
        }
    }

    fn name<'s>(&'s self, index: usize) -> Result<&'s Name, TemplateError>
    where
        'a: 's,
    {
        match self.arg(index)? {
            Value::Name(name) => Ok(name),
            other => Err(wrong(index, "name", other)),
        }
    }

    /// A string or null; null becomes `None`. Used by helpers that
    /// format optional documentation.
    fn opt_str<'s>(&'s self, index: usize) -> Result<Option<&'s str>, TemplateError>
    where
        'a: 's,
    {
        match self.arg(index)? {
            Value::Str(value) => Ok(Some(value)),
            Value::Null => Ok(None),
            other => Err(wrong(index, "string or null", other)),
        }
    }

    fn type_(&self, index: usize) -> Result<(&'a Version, &'a Type), TemplateError> {
        match self.arg(index)? {
            Value::Type(version, ty) => Ok((*version, *ty)),
            other => Err(wrong(index, "type", other)),
        }
    }

    fn attribute(&self, index: usize) -> Result<(&'a Version, &'a Attribute), TemplateError> {
        match self.arg(index)? {
            Value::Attribute(version, attribute) => Ok((*version, *attribute)),
            other => Err(wrong(index, "attribute", other)),
        }
    }

    fn enum_value(
        &self,
        index: usize,
    ) -> Result<(&'a Version, &'a Type, &'a EnumValue), TemplateError> {
        match self.arg(index)? {
            Value::EnumValue(version, ty, value) => Ok((*version, *ty, *value)),
            other => Err(wrong(index, "enum value", other)),
        }
    }

    fn resource(&self, index: usize) -> Result<(&'a Version, &'a Resource), TemplateError> {
        match self.arg(index)? {
            Value::Resource(version, resource) => Ok((*version, *resource)),
            other => Err(wrong(index, "resource", other)),
        }
    }

    fn locator(&self, index: usize) -> Result<(&'a Version, &'a Locator), TemplateError> {
        match self.arg(index)? {
            Value::Locator(version, locator) => Ok((*version, *locator)),
            other => Err(wrong(index, "locator", other)),
        }
    }

    fn method(&self, index: usize) -> Result<(&'a Version, &'a Method), TemplateError> {
        match self.arg(index)? {
            Value::Method(version, method) => Ok((*version, *method)),
            other => Err(wrong(index, "method", other)),
        }
    }

    fn parameter(&self, index: usize) -> Result<(&'a Version, &'a Parameter), TemplateError> {
        match self.arg(index)? {
            Value::Parameter(version, parameter) => Ok((*version, *parameter)),
            other => Err(wrong(index, "parameter", other)),
        }
    }
}

fn wrong(index: usize, expected: &'static str, found: &Value<'_>) -> TemplateError {
    TemplateError::WrongArgument {
        index,
        expected,
        found: found.kind(),
    }
}

impl<'a> Args<'a> for [Value<'a>] {
    fn arg(&self, index: usize) -> Result<&Value<'a>, TemplateError> {
        self.get(index)
            .ok_or(TemplateError::MissingArgument { index })
    }
}
