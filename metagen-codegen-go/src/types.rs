//! Emits the Go types for the model types: enums, structs with
//! accessors, list containers, and the per-version metadata type.

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

pub(crate) struct TypesEmitter<'a> {
    pub reporter: &'a Reporter,
    pub model: &'a Model,
    pub names: &'a NamesCalculator,
    pub packages: &'a PackagesCalculator,
    pub types: &'a TypesCalculator,
    pub files: &'a mut FileSet,
}

impl<'a> TypesEmitter<'a> {
    pub fn run(&mut self) -> miette::Result<()> {
        for service in self.model.services() {
            for version in service.versions() {
                self.generate_version_metadata_file(service, version)?;
                for ty in version.types() {
                    if ty.is_enum() || ty.is_struct() {
                        self.generate_type_file(service, version, ty)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn generate_version_metadata_file(
        &mut self,
        service: &'a Service,
        version: &'a Version,
    ) -> miette::Result<()> {
        let mut buffer = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.version_package(service, version))
            .file(self.names.file(&Name::from_words(["metadata", "type"])))
            .build()?;
        buffer.emit(
            r#"
// Metadata contains the version metadata.
type Metadata struct {
serverVersion *string
}

// ServerVersion returns the version of the server.
func (m *Metadata) ServerVersion() string {
if m != nil && m.serverVersion != nil {
return *m.serverVersion
}
return ""
}

// GetServerVersion returns the value of the server version and a flag indicating
// if the attribute has a value.
func (m *Metadata) GetServerVersion() (value string, ok bool) {
ok = m != nil && m.serverVersion != nil
if ok {
value = *m.serverVersion
}
return
}
"#,
            &[],
        );
        buffer.write(self.files)
    }

    fn generate_type_file(
        &mut self,
        service: &'a Service,
        version: &'a Version,
        ty: &'a Type,
    ) -> miette::Result<()> {
        let builder = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.version_package(service, version))
            .file(self.names.file(&ty.name().cat(&Name::word("type"))));
        let mut buffer = bindings::standard(builder, self.names, self.types).build()?;

        if ty.is_enum() {
            buffer.emit(
                r#"
{{ $enumName := enumName .Type }}

// {{ $enumName }} represents the values of the '{{ .Type.Name }}' enumerated type.
type {{ $enumName }} string

const (
{{ range .Type.Values }}
{{ lineComment .Doc }}
{{ valueName . }} {{ $enumName }} = "{{ valueTag . }}"
{{ end }}
)
"#,
                &[("Type", Value::Type(version, ty))],
            );
        } else {
            buffer.import("time", "");
            buffer.emit(STRUCT_TEMPLATE, &[("Type", Value::Type(version, ty))]);
        }

        buffer.write(self.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use metagen_core::model::{EnumValue, TypeKind};

    fn emit_version(version: Version) -> tempfile::TempDir {
        let mut service = Service::new(Name::from_words(["clusters", "mgmt"]));
        service.add_version(version);
        let mut model = Model::new();
        model.add_service(service);

        let reporter = Reporter::new();
        let names = NamesCalculator::new();
        let types = TypesCalculator::new(names);
        let packages = PackagesCalculator::new("github.com/acme/sdk");
        let dir = tempfile::tempdir().unwrap();
        let mut files = FileSet::new(dir.path());
        let mut emitter = TypesEmitter {
            reporter: &reporter,
            model: &model,
            names: &names,
            packages: &packages,
            types: &types,
            files: &mut files,
        };
        emitter.run().unwrap();
        assert_eq!(reporter.errors(), 0, "records: {:?}", reporter.records());
        dir
    }

    #[test]
    fn test_enum_type_source() {
        let mut version = Version::new(Name::word("v1"), Name::word("root"));
        version.add_type(Type::new(
            Name::from_words(["cluster", "state"]),
            TypeKind::Enum {
                values: vec![
                    EnumValue::new(Name::word("pending")),
                    EnumValue::with_doc(Name::word("ready"), "The cluster is ready to use."),
                ],
            },
        ));
        let dir = emit_version(version);
        let source =
            std::fs::read_to_string(dir.path().join("clusters_mgmt/v1/cluster_state_type.go"))
                .unwrap();
        assert!(source.contains("type ClusterState string"));
        assert!(source.contains("ClusterStatePending ClusterState = \"pending\""));
        assert!(source.contains("ClusterStateReady ClusterState = \"ready\""));
        assert!(source.contains("// The cluster is ready to use."));
    }

    #[test]
    fn test_date_attribute_imports_time() {
        use metagen_core::model::{Attribute, ScalarKind, TypeRef};
        let mut version = Version::new(Name::word("v1"), Name::word("root"));
        version.add_type(Type::new(
            Name::word("cluster"),
            TypeKind::Struct {
                class: false,
                attributes: vec![Attribute::new(
                    Name::from_words(["creation", "timestamp"]),
                    TypeRef::scalar(ScalarKind::Date),
                )],
            },
        ));
        let dir = emit_version(version);
        let source =
            std::fs::read_to_string(dir.path().join("clusters_mgmt/v1/cluster_type.go")).unwrap();
        assert!(source.contains("\"time\""));
        assert!(source.contains("creationTimestamp *time.Time"));
        assert!(source.contains("func (o *Cluster) CreationTimestamp() time.Time"));
        assert!(source.contains("return time.Time{}"));
    }
}

const STRUCT_TEMPLATE: &str = r#"
{{ $objectName := objectName .Type }}
{{ $listName := listName .Type }}

{{ if .Type.IsClass }}
// {{ $objectName }}Kind is the name of the type used to represent objects
// of type '{{ .Type.Name }}'.
const {{ $objectName }}Kind = "{{ $objectName }}"

// {{ $objectName }}LinkKind is the name of the type used to represent links
// to objects of type '{{ .Type.Name }}'.
const {{ $objectName }}LinkKind = "{{ $objectName }}Link"

// {{ $objectName }}NilKind is the name of the type used to nil references
// to objects of type '{{ .Type.Name }}'.
const {{ $objectName }}NilKind = "{{ $objectName }}Nil"
{{ end }}

// {{ $objectName }} represents the values of the '{{ .Type.Name }}' type.
//
{{ lineComment .Type.Doc }}
type {{ $objectName }} struct {
{{ if .Type.IsClass }}
id *string
href *string
link bool
{{ end }}
{{ range .Type.Attributes }}
{{ fieldName . }} {{ fieldType . }}
{{ end }}
}

{{ if .Type.IsClass }}
// Kind returns the name of the type of the object.
func (o *{{ $objectName }}) Kind() string {
if o == nil {
return {{ $objectName }}NilKind
}
if o.link {
return {{ $objectName }}LinkKind
}
return {{ $objectName }}Kind
}

// ID returns the identifier of the object.
func (o *{{ $objectName }}) ID() string {
if o != nil && o.id != nil {
return *o.id
}
return ""
}

// GetID returns the identifier of the object and a flag indicating if the
// identifier has a value.
func (o *{{ $objectName }}) GetID() (value string, ok bool) {
ok = o != nil && o.id != nil
if ok {
value = *o.id
}
return
}

// Link returns true iif this is a link.
func (o *{{ $objectName }}) Link() bool {
return o != nil && o.link
}

// HREF returns the link to the object.
func (o *{{ $objectName }}) HREF() string {
if o != nil && o.href != nil {
return *o.href
}
return ""
}

// GetHREF returns the link of the object and a flag indicating if the
// link has a value.
func (o *{{ $objectName }}) GetHREF() (value string, ok bool) {
ok = o != nil && o.href != nil
if ok {
value = *o.href
}
return
}
{{ end }}

// Empty returns true if the object is empty, i.e. no attribute has a value.
func (o *{{ $objectName }}) Empty() bool {
return o == nil || (
{{ if .Type.IsClass }}
o.id == nil &&
{{ end }}
{{ range .Type.Attributes }}
{{ $fieldName := fieldName . }}
{{ if or .Type.IsScalar .Type.IsEnum }}
o.{{ $fieldName }} == nil &&
{{ end }}
{{ if .Type.IsList }}
{{ if .Link }}
o.{{ $fieldName }}.Len() == 0 &&
{{ else }}
len(o.{{ $fieldName }}) == 0 &&
{{ end }}
{{ end }}
{{ if .Type.IsMap }}
len(o.{{ $fieldName }}) == 0 &&
{{ end }}
{{ end }}
true)
}

{{ range .Type.Attributes }}
{{ $fieldName := fieldName . }}
{{ $getterName := getterName . }}
{{ $getterType := getterType . }}

// {{ $getterName }} returns the value of the '{{ .Name }}' attribute, or
// the zero value of the type if the attribute doesn't have a value.
//
{{ lineComment .Doc }}
func (o *{{ $objectName }}) {{ $getterName }}() {{ $getterType }} {
{{ if or .Type.IsStruct .Type.IsList .Type.IsMap }}
if o == nil {
return nil
}
return o.{{ $fieldName }}
{{ else }}
if o != nil && o.{{ $fieldName }} != nil {
return *o.{{ $fieldName }}
}
return {{ zeroValue .Type }}
{{ end }}
}

// Get{{ $getterName }} returns the value of the '{{ .Name }}' attribute and
// a flag indicating if the attribute has a value.
//
{{ lineComment .Doc }}
func (o *{{ $objectName }}) Get{{ $getterName }}() (value {{ $getterType }}, ok bool) {
ok = o != nil && o.{{ $fieldName }} != nil
if ok {
{{ if or .Type.IsStruct .Type.IsList .Type.IsMap }}
value = o.{{ $fieldName }}
{{ else }}
value = *o.{{ $fieldName }}
{{ end }}
}
return
}
{{ end }}

// {{ $listName }}Kind is the name of the type used to represent list of
// objects of type '{{ .Type.Name }}'.
const {{ $listName }}Kind = "{{ $listName }}"

// {{ $listName }}LinkKind is the name of the type used to represent links
// to list of objects of type '{{ .Type.Name }}'.
const {{ $listName }}LinkKind = "{{ $listName }}Link"

// {{ $listName }}NilKind is the name of the type used to nil lists of
// objects of type '{{ .Type.Name }}'.
const {{ $listName }}NilKind = "{{ $listName }}Nil"

// {{ $listName }} is a list of values of the '{{ .Type.Name }}' type.
type {{ $listName }} struct {
href *string
link bool
items []*{{ $objectName }}
}

{{ if .Type.IsClass }}
// Kind returns the name of the type of the list.
func (l *{{ $listName }}) Kind() string {
if l == nil {
return {{ $listName }}NilKind
}
if l.link {
return {{ $listName }}LinkKind
}
return {{ $listName }}Kind
}

// Link returns true iif this is a link.
func (l *{{ $listName }}) Link() bool {
return l != nil && l.link
}

// HREF returns the link to the list.
func (l *{{ $listName }}) HREF() string {
if l != nil && l.href != nil {
return *l.href
}
return ""
}

// GetHREF returns the link of the list and a flag indicating if the
// link has a value.
func (l *{{ $listName }}) GetHREF() (value string, ok bool) {
ok = l != nil && l.href != nil
if ok {
value = *l.href
}
return
}
{{ end }}

// Len returns the length of the list.
func (l *{{ $listName }}) Len() int {
if l == nil {
return 0
}
return len(l.items)
}

// Empty returns true if the list is empty.
func (l *{{ $listName }}) Empty() bool {
return l == nil || len(l.items) == 0
}

// Get returns the item of the list with the given index. If there is no item
// with that index it returns nil.
func (l *{{ $listName }}) Get(i int) *{{ $objectName }} {
if l == nil || i < 0 || i >= len(l.items) {
return nil
}
return l.items[i]
}

// Slice returns a slice containing the items of the list. The returned slice
// is a copy of the one used internally, so it can be modified without
// affecting the internal representation.
//
// If you don't need to modify the returned slice consider using the Each or
// Range functions, as they don't need to allocate a new slice.
func (l *{{ $listName }}) Slice() []*{{ $objectName }} {
var slice []*{{ $objectName }}
if l == nil {
slice = make([]*{{ $objectName }}, 0)
} else {
slice = make([]*{{ $objectName }}, len(l.items))
copy(slice, l.items)
}
return slice
}

// Each runs the given function for each item of the list, in order. If the
// function returns false the iteration stops, otherwise it continues till all
// the elements of the list have been processed.
func (l *{{ $listName }}) Each(f func(item *{{ $objectName }}) bool) {
if l == nil {
return
}
for _, item := range l.items {
if !f(item) {
break
}
}
}

// Range runs the given function for each index and item of the list, in order.
// If the function returns false the iteration stops, otherwise it continues
// till all the elements of the list have been processed.
func (l *{{ $listName }}) Range(f func(index int, item *{{ $objectName }}) bool) {
if l == nil {
return
}
for index, item := range l.items {
if !f(index, item) {
break
}
}
}
"#;
