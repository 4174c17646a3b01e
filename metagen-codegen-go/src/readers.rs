//! Emits the JSON readers for struct types: the shadow data structs
//! and the functions that translate wire objects into model objects.
//!
//! Readers accept objects with any subset of fields; omitted fields
//! stay absent in the resulting object.

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

pub(crate) struct ReadersEmitter<'a> {
    pub reporter: &'a Reporter,
    pub model: &'a Model,
    pub names: &'a NamesCalculator,
    pub packages: &'a PackagesCalculator,
    pub types: &'a TypesCalculator,
    pub files: &'a mut FileSet,
}

impl<'a> ReadersEmitter<'a> {
    pub fn run(&mut self) -> miette::Result<()> {
        for service in self.model.services() {
            for version in service.versions() {
                for ty in version.types() {
                    if ty.is_struct() {
                        self.generate_reader_file(service, version, ty)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn generate_reader_file(
        &mut self,
        service: &'a Service,
        version: &'a Version,
        ty: &'a Type,
    ) -> miette::Result<()> {
        let builder = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.version_package(service, version))
            .file(self.names.file(&ty.name().cat(&Name::word("reader"))));
        let mut buffer = bindings::standard(builder, self.names, self.types).build()?;
        buffer.import("encoding/json", "");
        buffer.import("fmt", "");
        buffer.import("io", "");
        buffer.import("time", "");
        buffer.emit(READER_TEMPLATE, &[("Type", Value::Type(version, ty))]);
        buffer.write(self.files)
    }
}

const READER_TEMPLATE: &str = r#"
{{ $objectName := objectName .Type }}
{{ $listName := listName .Type }}
{{ $dataName := dataName .Type }}
{{ $listDataName := listDataName .Type }}

// {{ $dataName }} is the JSON representation of '{{ .Type.Name }}' objects.
type {{ $dataName }} struct {
{{ if .Type.IsClass }}
Kind *string `json:"kind,omitempty"`
ID *string `json:"id,omitempty"`
HREF *string `json:"href,omitempty"`
{{ end }}
{{ range .Type.Attributes }}
{{ dataFieldName . }} {{ dataFieldType . }} `json:"{{ fieldTag . }},omitempty"`
{{ end }}
}

// {{ $listDataName }} is the JSON representation of lists of
// '{{ .Type.Name }}' objects.
type {{ $listDataName }} struct {
Kind *string `json:"kind,omitempty"`
HREF *string `json:"href,omitempty"`
Items []*{{ $dataName }} `json:"items,omitempty"`
}

// Unmarshal{{ $objectName }} reads a value of the '{{ .Type.Name }}' type
// from the given source, which can be a slice of bytes or a reader.
func Unmarshal{{ $objectName }}(source interface{}) (object *{{ $objectName }}, err error) {
data := new({{ $dataName }})
switch typed := source.(type) {
case []byte:
err = json.Unmarshal(typed, data)
case io.Reader:
err = json.NewDecoder(typed).Decode(data)
default:
err = fmt.Errorf("expected a slice of bytes or a reader, but got %T", source)
}
if err != nil {
return
}
object = read{{ $objectName }}(data)
return
}

// read{{ $objectName }} translates the JSON representation of a
// '{{ .Type.Name }}' object into the object itself.
func read{{ $objectName }}(data *{{ $dataName }}) *{{ $objectName }} {
if data == nil {
return nil
}
object := new({{ $objectName }})
{{ if .Type.IsClass }}
if data.Kind != nil {
object.link = *data.Kind == {{ $objectName }}LinkKind
}
object.id = data.ID
object.href = data.HREF
{{ end }}
{{ range .Type.Attributes }}
{{ $fieldName := fieldName . }}
{{ $dataFieldName := dataFieldName . }}
{{ if .Type.IsStruct }}
object.{{ $fieldName }} = read{{ attrObjectName . }}(data.{{ $dataFieldName }})
{{ end }}
{{ if .Type.IsList }}
{{ if .Link }}
object.{{ $fieldName }} = read{{ elementObjectName . }}List(data.{{ $dataFieldName }})
{{ else }}
{{ if .Type.Element.IsStruct }}
if data.{{ $dataFieldName }} != nil {
object.{{ $fieldName }} = make([]*{{ elementObjectName . }}, len(data.{{ $dataFieldName }}))
for i, item := range data.{{ $dataFieldName }} {
object.{{ $fieldName }}[i] = read{{ elementObjectName . }}(item)
}
}
{{ else }}
object.{{ $fieldName }} = data.{{ $dataFieldName }}
{{ end }}
{{ end }}
{{ end }}
{{ if .Type.IsMap }}
{{ if .Type.Element.IsStruct }}
if data.{{ $dataFieldName }} != nil {
object.{{ $fieldName }} = make({{ fieldType . }}, len(data.{{ $dataFieldName }}))
for key, item := range data.{{ $dataFieldName }} {
object.{{ $fieldName }}[key] = read{{ elementObjectName . }}(item)
}
}
{{ else }}
object.{{ $fieldName }} = data.{{ $dataFieldName }}
{{ end }}
{{ end }}
{{ if or .Type.IsScalar .Type.IsEnum }}
object.{{ $fieldName }} = data.{{ $dataFieldName }}
{{ end }}
{{ end }}
return object
}

// read{{ $objectName }}List translates the JSON representation of a list of
// '{{ .Type.Name }}' objects into the list itself.
func read{{ $objectName }}List(data *{{ $listDataName }}) *{{ $listName }} {
if data == nil {
return nil
}
list := new({{ $listName }})
{{ if .Type.IsClass }}
if data.Kind != nil {
list.link = *data.Kind == {{ $listName }}LinkKind
}
{{ end }}
list.href = data.HREF
if data.Items != nil {
list.items = make([]*{{ $objectName }}, len(data.Items))
for i, item := range data.Items {
list.items[i] = read{{ $objectName }}(item)
}
}
return list
}
"#;
