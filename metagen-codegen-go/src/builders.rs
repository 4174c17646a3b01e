//! Emits the builders for struct types: chainable setters, `Copy`
//! prefill, and a `Build` that materializes a fully-owned value.

use metagen_core::model::{Model, Service, Type, TypeKind, Version};
use metagen_core::reporter::Reporter;
use metagen_core::template::{Args, TemplateError, Value};
use metagen_core::words::Name;

use crate::FileSet;
use crate::bindings::{self, attribute_type, element_type};
use crate::buffer::BufferBuilder;
use crate::naming::NamesCalculator;
use crate::packages::PackagesCalculator;
use crate::refs::TypesCalculator;

pub(crate) struct BuildersEmitter<'a> {
    pub reporter: &'a Reporter,
    pub model: &'a Model,
    pub names: &'a NamesCalculator,
    pub packages: &'a PackagesCalculator,
    pub types: &'a TypesCalculator,
    pub files: &'a mut FileSet,
}

impl<'a> BuildersEmitter<'a> {
    pub fn run(&mut self) -> miette::Result<()> {
        for service in self.model.services() {
            for version in service.versions() {
                for ty in version.types() {
                    if ty.is_struct() {
                        self.generate_builder_file(service, version, ty)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn generate_builder_file(
        &mut self,
        service: &'a Service,
        version: &'a Version,
        ty: &'a Type,
    ) -> miette::Result<()> {
        let names = *self.names;
        let types = *self.types;
        let builder = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.version_package(service, version))
            .file(self.names.file(&ty.name().cat(&Name::word("builder"))))
            // The type stored inside the builder for an attribute:
            // sub-builders for structs and lists of structs, the field
            // form for everything else.
            .function("builderFieldType", move |args| {
                let (version, attribute) = args.attribute(0)?;
                Ok(Value::str(builder_field_type(
                    &names, &types, version, attribute,
                )?))
            });
        let mut buffer = bindings::standard(builder, self.names, self.types).build()?;

        buffer.import("time", "");
        buffer.emit(BUILDER_TEMPLATE, &[("Type", Value::Type(version, ty))]);
        buffer.emit(LIST_BUILDER_TEMPLATE, &[("Type", Value::Type(version, ty))]);
        buffer.write(self.files)
    }
}

fn builder_field_type(
    names: &NamesCalculator,
    types: &TypesCalculator,
    version: &Version,
    attribute: &metagen_core::model::Attribute,
) -> Result<String, TemplateError> {
    let ty = attribute_type(version, attribute)?;
    Ok(match ty.kind() {
        TypeKind::Scalar(metagen_core::model::ScalarKind::Interface) => "interface{}".to_owned(),
        TypeKind::Scalar(_) | TypeKind::Enum { .. } | TypeKind::Map { .. } => {
            types.field_form(version, attribute)?.text().to_owned()
        }
        TypeKind::Struct { .. } => format!("*{}Builder", names.public(ty.name())),
        TypeKind::List { .. } => {
            let element = element_type(version, attribute)?;
            if attribute.link() {
                format!("*{}ListBuilder", names.public(element.name()))
            } else if element.is_struct() {
                format!("[]*{}Builder", names.public(element.name()))
            } else {
                types.field_form(version, attribute)?.text().to_owned()
            }
        }
    })
}

const BUILDER_TEMPLATE: &str = r#"
{{ $objectName := objectName .Type }}

// {{ $objectName }}Builder contains the data and logic needed to build
// '{{ .Type.Name }}' objects.
//
{{ lineComment .Type.Doc }}
type {{ $objectName }}Builder struct {
{{ if .Type.IsClass }}
id *string
href *string
link bool
{{ end }}
{{ range .Type.Attributes }}
{{ fieldName . }} {{ builderFieldType . }}
{{ end }}
}

// New{{ $objectName }} creates a new builder of '{{ .Type.Name }}' objects.
func New{{ $objectName }}() *{{ $objectName }}Builder {
return new({{ $objectName }}Builder)
}

{{ if .Type.IsClass }}
// ID sets the identifier of the object.
func (b *{{ $objectName }}Builder) ID(value string) *{{ $objectName }}Builder {
b.id = &value
return b
}

// HREF sets the link to the object.
func (b *{{ $objectName }}Builder) HREF(value string) *{{ $objectName }}Builder {
b.href = &value
return b
}

// Link sets the flag that indicates if this is a link.
func (b *{{ $objectName }}Builder) Link(value bool) *{{ $objectName }}Builder {
b.link = value
return b
}
{{ end }}

{{ range .Type.Attributes }}
{{ $fieldName := fieldName . }}
{{ $setterName := setterName . }}

// {{ $setterName }} sets the value of the '{{ .Name }}' attribute.
//
{{ lineComment .Doc }}
{{ if .Type.IsStruct }}
func (b *{{ $objectName }}Builder) {{ $setterName }}(value *{{ attrObjectName . }}Builder) *{{ $objectName }}Builder {
b.{{ $fieldName }} = value
return b
}
{{ end }}
{{ if .Type.IsList }}
{{ if .Link }}
func (b *{{ $objectName }}Builder) {{ $setterName }}(value *{{ elementObjectName . }}ListBuilder) *{{ $objectName }}Builder {
b.{{ $fieldName }} = value
return b
}
{{ else }}
{{ if .Type.Element.IsStruct }}
func (b *{{ $objectName }}Builder) {{ $setterName }}(values ...*{{ elementObjectName . }}Builder) *{{ $objectName }}Builder {
b.{{ $fieldName }} = values
return b
}
{{ else }}
func (b *{{ $objectName }}Builder) {{ $setterName }}(values ...{{ elementType . }}) *{{ $objectName }}Builder {
b.{{ $fieldName }} = values
return b
}
{{ end }}
{{ end }}
{{ end }}
{{ if .Type.IsMap }}
func (b *{{ $objectName }}Builder) {{ $setterName }}(value {{ fieldType . }}) *{{ $objectName }}Builder {
b.{{ $fieldName }} = value
return b
}
{{ end }}
{{ if or .Type.IsScalar .Type.IsEnum }}
{{ if .Type.IsInterface }}
func (b *{{ $objectName }}Builder) {{ $setterName }}(value interface{}) *{{ $objectName }}Builder {
b.{{ $fieldName }} = value
return b
}
{{ else }}
func (b *{{ $objectName }}Builder) {{ $setterName }}(value {{ valueType . }}) *{{ $objectName }}Builder {
b.{{ $fieldName }} = &value
return b
}
{{ end }}
{{ end }}
{{ end }}

// Copy copies the attributes of the given object into this builder,
// discarding any previous values.
func (b *{{ $objectName }}Builder) Copy(object *{{ $objectName }}) *{{ $objectName }}Builder {
if object == nil {
return b
}
{{ if .Type.IsClass }}
b.id = object.id
b.href = object.href
b.link = object.link
{{ end }}
{{ range .Type.Attributes }}
{{ $fieldName := fieldName . }}
{{ if .Type.IsStruct }}
if object.{{ $fieldName }} != nil {
b.{{ $fieldName }} = New{{ attrObjectName . }}().Copy(object.{{ $fieldName }})
} else {
b.{{ $fieldName }} = nil
}
{{ end }}
{{ if .Type.IsList }}
{{ if .Link }}
if object.{{ $fieldName }} != nil {
b.{{ $fieldName }} = New{{ elementObjectName . }}List().Copy(object.{{ $fieldName }})
} else {
b.{{ $fieldName }} = nil
}
{{ else }}
{{ if .Type.Element.IsStruct }}
if object.{{ $fieldName }} != nil {
b.{{ $fieldName }} = make([]*{{ elementObjectName . }}Builder, len(object.{{ $fieldName }}))
for i, value := range object.{{ $fieldName }} {
b.{{ $fieldName }}[i] = New{{ elementObjectName . }}().Copy(value)
}
} else {
b.{{ $fieldName }} = nil
}
{{ else }}
if object.{{ $fieldName }} != nil {
b.{{ $fieldName }} = make([]{{ elementType . }}, len(object.{{ $fieldName }}))
copy(b.{{ $fieldName }}, object.{{ $fieldName }})
} else {
b.{{ $fieldName }} = nil
}
{{ end }}
{{ end }}
{{ end }}
{{ if .Type.IsMap }}
if object.{{ $fieldName }} != nil {
b.{{ $fieldName }} = make({{ fieldType . }}, len(object.{{ $fieldName }}))
for key, value := range object.{{ $fieldName }} {
b.{{ $fieldName }}[key] = value
}
} else {
b.{{ $fieldName }} = nil
}
{{ end }}
{{ if or .Type.IsScalar .Type.IsEnum }}
b.{{ $fieldName }} = object.{{ $fieldName }}
{{ end }}
{{ end }}
return b
}

// Build creates a '{{ .Type.Name }}' object using the configuration
// stored in the builder.
func (b *{{ $objectName }}Builder) Build() (object *{{ $objectName }}, err error) {
object = new({{ $objectName }})
{{ if .Type.IsClass }}
object.id = b.id
object.href = b.href
object.link = b.link
{{ end }}
{{ range .Type.Attributes }}
{{ $fieldName := fieldName . }}
{{ if .Type.IsStruct }}
if b.{{ $fieldName }} != nil {
object.{{ $fieldName }}, err = b.{{ $fieldName }}.Build()
if err != nil {
return
}
}
{{ end }}
{{ if .Type.IsList }}
{{ if .Link }}
if b.{{ $fieldName }} != nil {
object.{{ $fieldName }}, err = b.{{ $fieldName }}.Build()
if err != nil {
return
}
}
{{ else }}
{{ if .Type.Element.IsStruct }}
if b.{{ $fieldName }} != nil {
object.{{ $fieldName }} = make([]*{{ elementObjectName . }}, len(b.{{ $fieldName }}))
for i, builder := range b.{{ $fieldName }} {
object.{{ $fieldName }}[i], err = builder.Build()
if err != nil {
return
}
}
}
{{ else }}
if b.{{ $fieldName }} != nil {
object.{{ $fieldName }} = make([]{{ elementType . }}, len(b.{{ $fieldName }}))
copy(object.{{ $fieldName }}, b.{{ $fieldName }})
}
{{ end }}
{{ end }}
{{ end }}
{{ if or .Type.IsMap .Type.IsScalar .Type.IsEnum }}
object.{{ $fieldName }} = b.{{ $fieldName }}
{{ end }}
{{ end }}
return
}
"#;

const LIST_BUILDER_TEMPLATE: &str = r#"
{{ $objectName := objectName .Type }}

// {{ $objectName }}ListBuilder contains the data and logic needed to build
// '{{ .Type.Name }}' object lists.
type {{ $objectName }}ListBuilder struct {
items []*{{ $objectName }}Builder
}

// New{{ $objectName }}List creates a new builder of '{{ .Type.Name }}' object
// lists.
func New{{ $objectName }}List() *{{ $objectName }}ListBuilder {
return new({{ $objectName }}ListBuilder)
}

// Items sets the items of the list, discarding any previous items.
func (b *{{ $objectName }}ListBuilder) Items(values ...*{{ $objectName }}Builder) *{{ $objectName }}ListBuilder {
b.items = values
return b
}

// Copy copies the items of the given list into this builder, discarding any
// previous items.
func (b *{{ $objectName }}ListBuilder) Copy(list *{{ $objectName }}List) *{{ $objectName }}ListBuilder {
if list == nil {
b.items = nil
return b
}
b.items = make([]*{{ $objectName }}Builder, len(list.items))
for i, item := range list.items {
b.items[i] = New{{ $objectName }}().Copy(item)
}
return b
}

// Build creates a list of '{{ .Type.Name }}' objects using the
// configuration stored in the builder.
func (b *{{ $objectName }}ListBuilder) Build() (list *{{ $objectName }}List, err error) {
items := make([]*{{ $objectName }}, len(b.items))
for i, item := range b.items {
items[i], err = item.Build()
if err != nil {
return
}
}
list = new({{ $objectName }}List)
list.items = items
return
}
"#;
