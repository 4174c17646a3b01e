//! Emits the server adapters: a server interface per resource, typed
//! request/response objects per method, and an HTTP adapter that
//! dispatches requests to a user implementation.
//!
//! Routing follows the resource tree. Each adapter owns a router for
//! its own slice of the path: methods bind to the resource root,
//! actions to a named sub-path, and locators delegate to the target
//! resource's adapter with the matched prefix stripped. Unknown
//! segments and trailing slashes fall through to a bare 404.

use metagen_core::model::{
    Attribute, MethodKind, Model, Parameter, Resource, ScalarKind, Service, TypeKind, Version,
};
use metagen_core::reporter::Reporter;
use metagen_core::template::{Args, TemplateError, Value};
use metagen_core::words::Name;

use crate::FileSet;
use crate::bindings;
use crate::buffer::BufferBuilder;
use crate::naming::NamesCalculator;
use crate::packages::PackagesCalculator;
use crate::refs::TypesCalculator;

pub(crate) struct ServersEmitter<'a> {
    pub reporter: &'a Reporter,
    pub model: &'a Model,
    pub names: &'a NamesCalculator,
    pub packages: &'a PackagesCalculator,
    pub types: &'a TypesCalculator,
    pub files: &'a mut FileSet,
}

impl<'a> ServersEmitter<'a> {
    pub fn run(&mut self) -> miette::Result<()> {
        for service in self.model.services() {
            for version in service.versions() {
                for resource in version.resources() {
                    self.generate_server_file(service, version, resource)?;
                }
            }
        }
        Ok(())
    }

    fn generate_server_file(
        &mut self,
        service: &'a Service,
        version: &'a Version,
        resource: &'a Resource,
    ) -> miette::Result<()> {
        let names = *self.names;
        let types = *self.types;
        // The root resource is mounted at `/` and sees unstripped
        // paths; every other adapter sees the remainder after its
        // locator prefix.
        let is_root = version.root_name() == resource.name();

        let builder = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.version_package(service, version))
            .file(self.names.file(&resource.name().cat(&Name::word("server"))))
            .function("resourceName", move |args| {
                let (_, resource) = args.resource(0)?;
                Ok(Value::str(names.public(resource.name())))
            })
            .function("methodName", move |args| {
                let (_, method) = args.method(0)?;
                Ok(Value::str(names.public(method.name())))
            })
            .function("methodVar", move |args| {
                let (_, method) = args.method(0)?;
                Ok(Value::str(names.private(method.name())))
            })
            .function("methodVerb", move |args| {
                let (_, method) = args.method(0)?;
                Ok(Value::str(method_verb(method.kind())))
            })
            .function("methodPath", move |args| {
                let (_, method) = args.method(0)?;
                Ok(Value::str(match method.kind() {
                    MethodKind::Action => format!("/{}", names.tag(method.name())),
                    _ if is_root => "/".to_owned(),
                    _ => String::new(),
                }))
            })
            .function("locatorName", move |args| {
                let (_, locator) = args.locator(0)?;
                Ok(Value::str(names.public(locator.name())))
            })
            .function("locatorVar", move |args| {
                let (_, locator) = args.locator(0)?;
                Ok(Value::str(names.private(locator.name())))
            })
            .function("locatorPrefix", move |args| {
                let (_, locator) = args.locator(0)?;
                Ok(Value::str(if locator.is_identified() {
                    "/{id}".to_owned()
                } else {
                    format!("/{}", names.tag(locator.name()))
                }))
            })
            .function("responseDataName", move |args| {
                let (_, resource) = args.resource(0)?;
                let (_, method) = args.method(1)?;
                Ok(Value::str(names.private(
                    &resource
                        .name()
                        .cat(method.name())
                        .cat(&Name::from_words(["server", "response", "data"])),
                )))
            })
            .function("hasScalarIn", move |args| {
                let (version, method) = args.method(0)?;
                let result = method.in_parameters().any(|parameter| {
                    version
                        .resolve(parameter.type_ref())
                        .is_some_and(|ty| ty.is_scalar() || ty.is_enum())
                });
                Ok(Value::Bool(result))
            })
            .function("parseCall", move |args| {
                let (version, parameter) = args.parameter(0)?;
                parse_call(&names, version, parameter)
            });
        let builder = bind_param_helpers(builder, names, types);
        let mut buffer = bindings::standard(builder, self.names, self.types).build()?;

        buffer.import("context", "");
        buffer.import("encoding/json", "");
        buffer.import("net/http", "");
        buffer.import("time", "");
        buffer.import("github.com/gorilla/mux", "");
        buffer.import(self.packages.errors_package().import_path(), "errors");
        buffer.import(self.packages.helpers_package().import_path(), "helpers");

        buffer.emit(SERVER_TEMPLATE, &[("Resource", Value::Resource(version, resource))]);
        for method in resource.methods() {
            let bindings = [
                ("Resource", Value::Resource(version, resource)),
                ("Method", Value::Method(version, method)),
            ];
            buffer.emit(SERVER_REQUEST_TEMPLATE, &bindings);
            buffer.emit(SERVER_RESPONSE_TEMPLATE, &bindings);
            buffer.emit(SERVER_READ_TEMPLATE, &bindings);
            match method.kind() {
                MethodKind::List | MethodKind::Action => {
                    buffer.emit(SERVER_WRITE_ENVELOPE_TEMPLATE, &bindings);
                }
                MethodKind::Get | MethodKind::Add | MethodKind::Update => {
                    buffer.emit(SERVER_WRITE_BODY_TEMPLATE, &bindings);
                }
                MethodKind::Delete => {}
            }
            buffer.emit(SERVER_HANDLER_TEMPLATE, &bindings);
        }
        buffer.write(self.files)
    }
}

fn method_verb(kind: MethodKind) -> &'static str {
    match kind {
        MethodKind::List | MethodKind::Get => "http.MethodGet",
        MethodKind::Add | MethodKind::Action => "http.MethodPost",
        MethodKind::Update => "http.MethodPatch",
        MethodKind::Delete => "http.MethodDelete",
    }
}

/// The expression that parses one scalar query parameter.
fn parse_call(
    names: &NamesCalculator,
    version: &Version,
    parameter: &Parameter,
) -> Result<Value<'static>, TemplateError> {
    let ty = version
        .resolve(parameter.type_ref())
        .ok_or_else(|| TemplateError::UnresolvedReference {
            name: parameter.type_ref().name().to_string(),
        })?;
    let function = match ty.kind() {
        TypeKind::Scalar(ScalarKind::Boolean) => "ParseBoolean",
        TypeKind::Scalar(ScalarKind::Integer) => "ParseInteger",
        TypeKind::Scalar(ScalarKind::Long) => "ParseLong",
        TypeKind::Scalar(ScalarKind::Float) => "ParseFloat",
        TypeKind::Scalar(ScalarKind::String) => "ParseString",
        TypeKind::Scalar(ScalarKind::Date) => "ParseDate",
        _ => {
            return Err(TemplateError::Helper(format!(
                "don't know how to parse parameter '{}' from the query",
                parameter.name()
            )));
        }
    };
    Ok(Value::str(format!(
        "helpers.{function}(query, \"{}\")",
        names.tag(parameter.name())
    )))
}

/// Binds the helpers that render method parameters, shared by the
/// server and client emitters.
pub(crate) fn bind_param_helpers<'a>(
    builder: BufferBuilder<'a>,
    names: NamesCalculator,
    types: TypesCalculator,
) -> BufferBuilder<'a> {
    builder
        .function("paramField", move |args| {
            let (_, parameter) = args.parameter(0)?;
            Ok(Value::str(names.private(parameter.name())))
        })
        .function("paramGetter", move |args| {
            let (_, parameter) = args.parameter(0)?;
            Ok(Value::str(names.public(parameter.name())))
        })
        .function("paramSetter", move |args| {
            let (_, parameter) = args.parameter(0)?;
            Ok(Value::str(names.public(parameter.name())))
        })
        .function("paramTag", move |args| {
            let (_, parameter) = args.parameter(0)?;
            Ok(Value::str(names.tag(parameter.name())))
        })
        .function("paramFieldType", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let ty = resolve_param(version, parameter)?;
            Ok(Value::str(types.nullable_reference(version, ty)?.text()))
        })
        .function("paramValueType", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let ty = resolve_param(version, parameter)?;
            Ok(Value::str(types.value_reference(version, ty)?.text()))
        })
        .function("paramZero", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let ty = resolve_param(version, parameter)?;
            Ok(Value::str(types.zero_value(ty)))
        })
        // The form stored in a server response: plain values for
        // scalars (so the envelope echoes whatever the handler set,
        // including zero) and containers for lists.
        .function("paramResponseType", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let ty = resolve_param(version, parameter)?;
            Ok(Value::str(match ty.kind() {
                TypeKind::Scalar(_) | TypeKind::Enum { .. } => {
                    types.value_reference(version, ty)?.text().to_owned()
                }
                TypeKind::List { .. } => types.list_reference(version, ty)?.text().to_owned(),
                _ => types.nullable_reference(version, ty)?.text().to_owned(),
            }))
        })
        .function("paramObjectName", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let ty = resolve_param(version, parameter)?;
            Ok(Value::str(names.public(ty.name())))
        })
        .function("paramDataName", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let ty = resolve_param(version, parameter)?;
            Ok(Value::str(types.data_name(ty)))
        })
        .function("paramElementObjectName", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let element = resolve_param_element(version, parameter)?;
            Ok(Value::str(names.public(element.name())))
        })
        .function("paramElementDataName", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let element = resolve_param_element(version, parameter)?;
            Ok(Value::str(types.data_name(element)))
        })
        // The form of a parameter in a JSON envelope: plain values
        // for scalars, data structs elsewhere.
        .function("paramEnvelopeType", move |args| {
            let (version, parameter) = args.parameter(0)?;
            let ty = resolve_param(version, parameter)?;
            Ok(Value::str(match ty.kind() {
                TypeKind::Scalar(_) | TypeKind::Enum { .. } => {
                    types.value_reference(version, ty)?.text().to_owned()
                }
                TypeKind::Struct { .. } => format!("*{}", types.data_name(ty)),
                TypeKind::List { .. } => {
                    let element = resolve_param_element(version, parameter)?;
                    format!("[]*{}", types.data_name(element))
                }
                TypeKind::Map { .. } => {
                    let attribute =
                        Attribute::new(parameter.name().clone(), parameter.type_ref().clone());
                    types.data_form(version, &attribute)?.text().to_owned()
                }
            }))
        })
}

fn resolve_param<'m>(
    version: &'m Version,
    parameter: &Parameter,
) -> Result<&'m metagen_core::model::Type, TemplateError> {
    version
        .resolve(parameter.type_ref())
        .ok_or_else(|| TemplateError::UnresolvedReference {
            name: parameter.type_ref().name().to_string(),
        })
}

fn resolve_param_element<'m>(
    version: &'m Version,
    parameter: &Parameter,
) -> Result<&'m metagen_core::model::Type, TemplateError> {
    let ty = resolve_param(version, parameter)?;
    let element = ty.element().ok_or_else(|| {
        TemplateError::Helper(format!("type '{}' doesn't have an element type", ty.name()))
    })?;
    version
        .resolve(element)
        .ok_or_else(|| TemplateError::UnresolvedReference {
            name: element.name().to_string(),
        })
}

const SERVER_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}

// {{ $resourceName }}Server represents the interface that manages the
// '{{ .Resource.Name }}' resource.
//
{{ lineComment .Resource.Doc }}
type {{ $resourceName }}Server interface {
{{ range .Resource.Methods }}
// {{ methodName . }} handles a request for the '{{ .Name }}' method.
//
{{ lineComment .Doc }}
{{ methodName . }}(ctx context.Context, request *{{ $resourceName }}{{ methodName . }}ServerRequest, response *{{ $resourceName }}{{ methodName . }}ServerResponse) error
{{ end }}
{{ range .Resource.Locators }}
{{ if .Identified }}
// {{ locatorName . }} returns the server for the '{{ .Name }}' sub-resource,
// identified by the given identifier.
{{ locatorName . }}(id string) {{ resourceName .Target }}Server
{{ else }}
// {{ locatorName . }} returns the server for the '{{ .Name }}' sub-resource.
{{ locatorName . }}() {{ resourceName .Target }}Server
{{ end }}
{{ end }}
}

// {{ $resourceName }}Adapter is an HTTP handler that routes requests of the
// '{{ .Resource.Name }}' resource to an implementation of
// {{ $resourceName }}Server.
type {{ $resourceName }}Adapter struct {
server {{ $resourceName }}Server
router *mux.Router
}

// New{{ $resourceName }}Adapter creates a new adapter that routes requests of
// the '{{ .Resource.Name }}' resource to the given server implementation.
func New{{ $resourceName }}Adapter(server {{ $resourceName }}Server, router *mux.Router) *{{ $resourceName }}Adapter {
adapter := new({{ $resourceName }}Adapter)
adapter.server = server
adapter.router = router
adapter.router.NotFoundHandler = http.HandlerFunc(errors.SendNotFound)
adapter.router.MethodNotAllowedHandler = http.HandlerFunc(errors.SendMethodNotAllowed)
{{ range .Resource.Locators }}
{{ if not .Identified }}
adapter.router.PathPrefix("{{ locatorPrefix . }}").HandlerFunc(adapter.{{ locatorVar . }}Handler)
{{ end }}
{{ end }}
{{ range .Resource.Locators }}
{{ if .Identified }}
adapter.router.PathPrefix("{{ locatorPrefix . }}").HandlerFunc(adapter.{{ locatorVar . }}Handler)
{{ end }}
{{ end }}
{{ range .Resource.Methods }}
adapter.router.HandleFunc("{{ methodPath . }}", adapter.{{ methodVar . }}Handler).Methods({{ methodVerb . }})
{{ end }}
return adapter
}

// ServeHTTP dispatches the request to the adapter's router.
func (a *{{ $resourceName }}Adapter) ServeHTTP(w http.ResponseWriter, r *http.Request) {
a.router.ServeHTTP(w, r)
}

{{ range .Resource.Locators }}
{{ if .Identified }}
// {{ locatorVar . }}Handler forwards the request to the '{{ .Name }}'
// sub-resource, passing the matched path segment as the identifier.
func (a *{{ $resourceName }}Adapter) {{ locatorVar . }}Handler(w http.ResponseWriter, r *http.Request) {
id := mux.Vars(r)["id"]
target := a.server.{{ locatorName . }}(id)
if target == nil {
errors.SendNotFound(w, r)
return
}
adapter := New{{ resourceName .Target }}Adapter(target, mux.NewRouter())
http.StripPrefix("/"+id, adapter).ServeHTTP(w, r)
}
{{ else }}
// {{ locatorVar . }}Handler forwards the request to the '{{ .Name }}'
// sub-resource.
func (a *{{ $resourceName }}Adapter) {{ locatorVar . }}Handler(w http.ResponseWriter, r *http.Request) {
target := a.server.{{ locatorName . }}()
if target == nil {
errors.SendNotFound(w, r)
return
}
adapter := New{{ resourceName .Target }}Adapter(target, mux.NewRouter())
http.StripPrefix("{{ locatorPrefix . }}", adapter).ServeHTTP(w, r)
}
{{ end }}
{{ end }}
"#;

const SERVER_REQUEST_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}
{{ $requestName := cat $resourceName $methodName "ServerRequest" }}

// {{ $requestName }} is the request for the '{{ .Method.Name }}' method.
type {{ $requestName }} struct {
{{ range .Method.InParameters }}
{{ paramField . }} {{ paramFieldType . }}
{{ end }}
}

{{ range .Method.InParameters }}
{{ if or .Type.IsScalar .Type.IsEnum }}
// {{ paramGetter . }} returns the value of the '{{ .Name }}' parameter, or
// the zero value of the type if the parameter isn't present.
func (r *{{ $requestName }}) {{ paramGetter . }}() {{ paramValueType . }} {
if r != nil && r.{{ paramField . }} != nil {
return *r.{{ paramField . }}
}
return {{ paramZero . }}
}

// Get{{ paramGetter . }} returns the value of the '{{ .Name }}' parameter and
// a flag indicating if the parameter has a value.
func (r *{{ $requestName }}) Get{{ paramGetter . }}() (value {{ paramValueType . }}, ok bool) {
ok = r != nil && r.{{ paramField . }} != nil
if ok {
value = *r.{{ paramField . }}
}
return
}
{{ else }}
// {{ paramGetter . }} returns the value of the '{{ .Name }}' parameter.
func (r *{{ $requestName }}) {{ paramGetter . }}() {{ paramFieldType . }} {
if r == nil {
return nil
}
return r.{{ paramField . }}
}
{{ end }}
{{ end }}
"#;

const SERVER_RESPONSE_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}
{{ $responseName := cat $resourceName $methodName "ServerResponse" }}

// {{ $responseName }} is the response for the '{{ .Method.Name }}' method.
type {{ $responseName }} struct {
{{ range .Method.OutParameters }}
{{ paramField . }} {{ paramResponseType . }}
{{ end }}
}

{{ range .Method.OutParameters }}
// {{ paramSetter . }} sets the value of the '{{ .Name }}' parameter.
func (r *{{ $responseName }}) {{ paramSetter . }}(value {{ paramResponseType . }}) {
r.{{ paramField . }} = value
}
{{ end }}
"#;

const SERVER_READ_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}
{{ $requestName := cat $resourceName $methodName "ServerRequest" }}

// read{{ $resourceName }}{{ $methodName }}Request reads the parameters of a
// '{{ .Method.Name }}' request.
func read{{ $resourceName }}{{ $methodName }}Request(r *http.Request) (*{{ $requestName }}, error) {
request := new({{ $requestName }})
{{ if hasScalarIn .Method }}
query := r.URL.Query()
var err error
{{ range .Method.InParameters }}
{{ if or .Type.IsScalar .Type.IsEnum }}
request.{{ paramField . }}, err = {{ parseCall . }}
if err != nil {
return nil, err
}
{{ end }}
{{ end }}
{{ end }}
{{ range .Method.InParameters }}
{{ if .Type.IsStruct }}
{{ paramField . }}Value, err := Unmarshal{{ paramObjectName . }}(r.Body)
if err != nil {
return nil, err
}
request.{{ paramField . }} = {{ paramField . }}Value
{{ end }}
{{ end }}
return request, nil
}
"#;

const SERVER_WRITE_ENVELOPE_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}
{{ $responseName := cat $resourceName $methodName "ServerResponse" }}
{{ $dataName := responseDataName .Resource .Method }}

// {{ $dataName }} is the JSON envelope of the '{{ .Method.Name }}' method
// response.
type {{ $dataName }} struct {
{{ range .Method.OutParameters }}
{{ paramGetter . }} {{ paramEnvelopeType . }} `json:"{{ paramTag . }}"`
{{ end }}
}

// write{{ $resourceName }}{{ $methodName }}Response writes the response of a
// '{{ .Method.Name }}' request.
func write{{ $resourceName }}{{ $methodName }}Response(w http.ResponseWriter, response *{{ $responseName }}) error {
w.Header().Set("Content-Type", "application/json")
w.WriteHeader(http.StatusOK)
data := new({{ $dataName }})
{{ range .Method.OutParameters }}
{{ if .Type.IsList }}
if response.{{ paramField . }} != nil {
data.{{ paramGetter . }} = make([]*{{ paramElementDataName . }}, len(response.{{ paramField . }}.items))
for i, item := range response.{{ paramField . }}.items {
data.{{ paramGetter . }}[i] = write{{ paramElementObjectName . }}(item)
}
} else {
data.{{ paramGetter . }} = make([]*{{ paramElementDataName . }}, 0)
}
{{ end }}
{{ if .Type.IsStruct }}
data.{{ paramGetter . }} = write{{ paramObjectName . }}(response.{{ paramField . }})
{{ end }}
{{ if or .Type.IsScalar .Type.IsEnum }}
data.{{ paramGetter . }} = response.{{ paramField . }}
{{ end }}
{{ end }}
encoder := json.NewEncoder(w)
return encoder.Encode(data)
}
"#;

const SERVER_WRITE_BODY_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}
{{ $responseName := cat $resourceName $methodName "ServerResponse" }}

// write{{ $resourceName }}{{ $methodName }}Response writes the response of a
// '{{ .Method.Name }}' request.
func write{{ $resourceName }}{{ $methodName }}Response(w http.ResponseWriter, response *{{ $responseName }}) error {
w.Header().Set("Content-Type", "application/json")
w.WriteHeader(http.StatusOK)
encoder := json.NewEncoder(w)
{{ range .Method.OutParameters }}
{{ if .Type.IsStruct }}
return encoder.Encode(write{{ paramObjectName . }}(response.{{ paramField . }}))
{{ end }}
{{ end }}
return nil
}
"#;

const SERVER_HANDLER_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}

// {{ methodVar .Method }}Handler handles a '{{ .Method.Name }}' request: it
// reads the request, invokes the server implementation, and writes the
// response.
func (a *{{ $resourceName }}Adapter) {{ methodVar .Method }}Handler(w http.ResponseWriter, r *http.Request) {
request, err := read{{ $resourceName }}{{ $methodName }}Request(r)
if err != nil {
errors.SendBadRequest(w, r, err)
return
}
response := new({{ $resourceName }}{{ $methodName }}ServerResponse)
err = a.server.{{ methodName .Method }}(r.Context(), request, response)
if err != nil {
errors.SendInternalServerError(w, r, err)
return
}
{{ if .Method.IsDelete }}
w.WriteHeader(http.StatusNoContent)
{{ else }}
_ = write{{ $resourceName }}{{ $methodName }}Response(w, response)
{{ end }}
}
"#;
