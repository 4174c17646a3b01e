//! Emits the JSON writers for struct types: the functions that
//! translate model objects into their wire representation.
//!
//! Writers omit fields whose value is the absent value of their form.
//! Class structs carry a `kind` discriminator plus `id` and `href`;
//! list containers serialize with `kind`, `href`, and `items`, and a
//! link with no items serializes with only `kind` and `href`.

use metagen_core::model::{Model, Service, Type, Version};
use metagen_core::reporter::Reporter;
use metagen_core::template::Value;
use metagen_core::words::Name;

use crate::FileSet;
use crate::bindings;
use crate::buffer::BufferBuilder;
use crate::naming::NamesCalculator;
use crate::packages::PackagesCalculator;
use crate::refs::TypesCalculator;

pub(crate) struct WritersEmitter<'a> {
    pub reporter: &'a Reporter,
    pub model: &'a Model,
    pub names: &'a NamesCalculator,
    pub packages: &'a PackagesCalculator,
    pub types: &'a TypesCalculator,
    pub files: &'a mut FileSet,
}

impl<'a> WritersEmitter<'a> {
    pub fn run(&mut self) -> miette::Result<()> {
        for service in self.model.services() {
            for version in service.versions() {
                for ty in version.types() {
                    if ty.is_struct() {
                        self.generate_writer_file(service, version, ty)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn generate_writer_file(
        &mut self,
        service: &'a Service,
        version: &'a Version,
        ty: &'a Type,
    ) -> miette::Result<()> {
        let builder = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.version_package(service, version))
            .file(self.names.file(&ty.name().cat(&Name::word("writer"))));
        let mut buffer = bindings::standard(builder, self.names, self.types).build()?;
        buffer.import("encoding/json", "");
        buffer.import("io", "");
        buffer.emit(WRITER_TEMPLATE, &[("Type", Value::Type(version, ty))]);
        buffer.write(self.files)
    }
}

const WRITER_TEMPLATE: &str = r#"
{{ $objectName := objectName .Type }}
{{ $listName := listName .Type }}
{{ $dataName := dataName .Type }}
{{ $listDataName := listDataName .Type }}

// Marshal{{ $objectName }} writes a value of the '{{ .Type.Name }}' type to
// the given writer.
func Marshal{{ $objectName }}(object *{{ $objectName }}, writer io.Writer) error {
encoder := json.NewEncoder(writer)
return encoder.Encode(write{{ $objectName }}(object))
}

// write{{ $objectName }} translates a '{{ .Type.Name }}' object into its
// JSON representation.
func write{{ $objectName }}(object *{{ $objectName }}) *{{ $dataName }} {
if object == nil {
return nil
}
data := new({{ $dataName }})
{{ if .Type.IsClass }}
kind := {{ $objectName }}Kind
if object.link {
kind = {{ $objectName }}LinkKind
}
data.Kind = &kind
data.ID = object.id
data.HREF = object.href
{{ end }}
{{ range .Type.Attributes }}
{{ $fieldName := fieldName . }}
{{ $dataFieldName := dataFieldName . }}
{{ if .Type.IsStruct }}
if object.{{ $fieldName }} != nil {
data.{{ $dataFieldName }} = write{{ attrObjectName . }}(object.{{ $fieldName }})
}
{{ end }}
{{ if .Type.IsList }}
{{ if .Link }}
if object.{{ $fieldName }} != nil {
data.{{ $dataFieldName }} = write{{ elementObjectName . }}List(object.{{ $fieldName }})
}
{{ else }}
{{ if .Type.Element.IsStruct }}
if object.{{ $fieldName }} != nil {
data.{{ $dataFieldName }} = make([]*{{ elementDataName . }}, len(object.{{ $fieldName }}))
for i, item := range object.{{ $fieldName }} {
data.{{ $dataFieldName }}[i] = write{{ elementObjectName . }}(item)
}
}
{{ else }}
data.{{ $dataFieldName }} = object.{{ $fieldName }}
{{ end }}
{{ end }}
{{ end }}
{{ if .Type.IsMap }}
{{ if .Type.Element.IsStruct }}
if object.{{ $fieldName }} != nil {
data.{{ $dataFieldName }} = make(map[string]*{{ elementDataName . }}, len(object.{{ $fieldName }}))
for key, item := range object.{{ $fieldName }} {
data.{{ $dataFieldName }}[key] = write{{ elementObjectName . }}(item)
}
}
{{ else }}
data.{{ $dataFieldName }} = object.{{ $fieldName }}
{{ end }}
{{ end }}
{{ if or .Type.IsScalar .Type.IsEnum }}
data.{{ $dataFieldName }} = object.{{ $fieldName }}
{{ end }}
{{ end }}
return data
}

// Marshal{{ $objectName }}List writes a list of values of the
// '{{ .Type.Name }}' type to the given writer.
func Marshal{{ $objectName }}List(list *{{ $listName }}, writer io.Writer) error {
encoder := json.NewEncoder(writer)
return encoder.Encode(write{{ $objectName }}List(list))
}

// write{{ $objectName }}List translates a list of '{{ .Type.Name }}' objects
// into its JSON representation.
func write{{ $objectName }}List(list *{{ $listName }}) *{{ $listDataName }} {
if list == nil {
return nil
}
data := new({{ $listDataName }})
{{ if .Type.IsClass }}
kind := {{ $listName }}Kind
if list.link {
kind = {{ $listName }}LinkKind
}
data.Kind = &kind
{{ end }}
data.HREF = list.href
if !list.link || len(list.items) > 0 {
data.Items = make([]*{{ $dataName }}, len(list.items))
for i, item := range list.items {
data.Items[i] = write{{ $objectName }}(item)
}
}
return data
}
"#;
