//! The standard helper vocabulary shared by all emitters.
//!
//! Every emitter binds this set onto its buffers, so a name computed
//! in one emitter is guaranteed to match the same name computed in
//! another: the types emitter's `objectName` is the builders
//! emitter's `objectName`. Emitters add their own specialized helpers
//! on top.

use metagen_core::model::{Attribute, Type, Version};
use metagen_core::template::{Args, TemplateError, Value};
use metagen_core::words::Name;

use crate::buffer::BufferBuilder;
use crate::line_comment;
use crate::naming::NamesCalculator;
use crate::refs::TypesCalculator;

/// Binds the standard helpers onto a buffer builder.
pub(crate) fn standard<'a>(
    builder: BufferBuilder<'a>,
    names: &NamesCalculator,
    types: &TypesCalculator,
) -> BufferBuilder<'a> {
    let names = *names;
    let types = *types;
    builder
        .function("objectName", move |args| {
            let (_, ty) = args.type_(0)?;
            Ok(Value::str(names.public(ty.name())))
        })
        .function("listName", move |args| {
            let (_, ty) = args.type_(0)?;
            Ok(Value::str(names.public(&ty.name().cat(&Name::word("list")))))
        })
        .function("enumName", move |args| {
            let (_, ty) = args.type_(0)?;
            Ok(Value::str(types.enum_name(ty)))
        })
        .function("zeroValue", move |args| {
            let (_, ty) = args.type_(0)?;
            Ok(Value::str(types.zero_value(ty)))
        })
        .function("valueName", move |args| {
            let (_, ty, value) = args.enum_value(0)?;
            Ok(Value::str(names.public(&ty.name().cat(value.name()))))
        })
        .function("valueTag", move |args| {
            let (_, _, value) = args.enum_value(0)?;
            Ok(Value::str(names.tag(value.name())))
        })
        .function("fieldName", move |args| {
            let (_, attribute) = args.attribute(0)?;
            Ok(Value::str(names.private(attribute.name())))
        })
        .function("fieldType", move |args| {
            let (version, attribute) = args.attribute(0)?;
            Ok(Value::str(types.field_form(version, attribute)?.text()))
        })
        .function("getterName", move |args| {
            let (_, attribute) = args.attribute(0)?;
            Ok(Value::str(names.public(attribute.name())))
        })
        .function("getterType", move |args| {
            let (version, attribute) = args.attribute(0)?;
            Ok(Value::str(types.getter_form(version, attribute)?.text()))
        })
        .function("setterName", move |args| {
            let (_, attribute) = args.attribute(0)?;
            Ok(Value::str(names.public(attribute.name())))
        })
        .function("fieldTag", move |args| {
            let (_, attribute) = args.attribute(0)?;
            Ok(Value::str(names.tag(attribute.name())))
        })
        // The shadow data struct vocabulary of the JSON codecs.
        .function("dataName", move |args| {
            let (_, ty) = args.type_(0)?;
            Ok(Value::str(types.data_name(ty)))
        })
        .function("listDataName", move |args| {
            let (_, ty) = args.type_(0)?;
            Ok(Value::str(types.list_data_name(ty)))
        })
        .function("dataFieldName", move |args| {
            let (_, attribute) = args.attribute(0)?;
            Ok(Value::str(names.public(attribute.name())))
        })
        .function("dataFieldType", move |args| {
            let (version, attribute) = args.attribute(0)?;
            Ok(Value::str(types.data_form(version, attribute)?.text()))
        })
        // The resolved type behind an attribute, and behind a list or
        // map attribute's element.
        .function("attrObjectName", move |args| {
            let (version, attribute) = args.attribute(0)?;
            let ty = attribute_type(version, attribute)?;
            Ok(Value::str(names.public(ty.name())))
        })
        .function("elementObjectName", move |args| {
            let (version, attribute) = args.attribute(0)?;
            let element = element_type(version, attribute)?;
            Ok(Value::str(names.public(element.name())))
        })
        .function("elementDataName", move |args| {
            let (version, attribute) = args.attribute(0)?;
            let element = element_type(version, attribute)?;
            Ok(Value::str(types.data_name(element)))
        })
        .function("elementType", move |args| {
            let (version, attribute) = args.attribute(0)?;
            let element = element_type(version, attribute)?;
            Ok(Value::str(types.value_reference(version, element)?.text()))
        })
        .function("valueType", move |args| {
            let (version, attribute) = args.attribute(0)?;
            let ty = attribute_type(version, attribute)?;
            Ok(Value::str(types.value_reference(version, ty)?.text()))
        })
        .function("lineComment", |args| {
            Ok(Value::str(line_comment(args.opt_str(0)?)))
        })
}

/// Resolves an attribute's type, turning a dangling reference into a
/// fatal emission error.
pub(crate) fn attribute_type<'m>(
    version: &'m Version,
    attribute: &Attribute,
) -> Result<&'m Type, TemplateError> {
    version
        .resolve(attribute.type_ref())
        .ok_or_else(|| TemplateError::UnresolvedReference {
            name: attribute.type_ref().name().to_string(),
        })
}

/// Resolves the element type of a list or map attribute.
pub(crate) fn element_type<'m>(
    version: &'m Version,
    attribute: &Attribute,
) -> Result<&'m Type, TemplateError> {
    let ty = attribute_type(version, attribute)?;
    let element = ty.element().ok_or_else(|| {
        TemplateError::Helper(format!("type '{}' doesn't have an element type", ty.name()))
    })?;
    version
        .resolve(element)
        .ok_or_else(|| TemplateError::UnresolvedReference {
            name: element.name().to_string(),
        })
}
