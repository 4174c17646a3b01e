//! Emits the HTTP clients: one client per resource, with a typed
//! request builder and response per method.
//!
//! URL composition, query encoding, and response parsing mirror the
//! server adapter's contract: locator segments append to the resource
//! path, scalar `in` parameters travel as query parameters, struct
//! `in` parameters as JSON bodies, and responses parse through the
//! same envelopes the adapters write.

use metagen_core::model::{
    MethodKind, Model, Parameter, Resource, ScalarKind, Service, TypeKind, Version,
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
use crate::servers::bind_param_helpers;

pub(crate) struct ClientsEmitter<'a> {
    pub reporter: &'a Reporter,
    pub model: &'a Model,
    pub names: &'a NamesCalculator,
    pub packages: &'a PackagesCalculator,
    pub types: &'a TypesCalculator,
    pub files: &'a mut FileSet,
}

impl<'a> ClientsEmitter<'a> {
    pub fn run(&mut self) -> miette::Result<()> {
        for service in self.model.services() {
            for version in service.versions() {
                for resource in version.resources() {
                    self.generate_client_file(service, version, resource)?;
                }
            }
        }
        Ok(())
    }

    fn generate_client_file(
        &mut self,
        service: &'a Service,
        version: &'a Version,
        resource: &'a Resource,
    ) -> miette::Result<()> {
        let names = *self.names;
        let builder = BufferBuilder::new()
            .reporter(self.reporter)
            .package(self.packages.version_package(service, version))
            .file(self.names.file(&resource.name().cat(&Name::word("client"))))
            .function("resourceName", move |args| {
                let (_, resource) = args.resource(0)?;
                Ok(Value::str(names.public(resource.name())))
            })
            .function("methodName", move |args| {
                let (_, method) = args.method(0)?;
                Ok(Value::str(names.public(method.name())))
            })
            .function("methodVerb", move |args| {
                let (_, method) = args.method(0)?;
                Ok(Value::str(match method.kind() {
                    MethodKind::List | MethodKind::Get => "http.MethodGet",
                    MethodKind::Add | MethodKind::Action => "http.MethodPost",
                    MethodKind::Update => "http.MethodPatch",
                    MethodKind::Delete => "http.MethodDelete",
                }))
            })
            .function("methodSuffix", move |args| {
                let (_, method) = args.method(0)?;
                Ok(Value::str(match method.kind() {
                    MethodKind::Action => format!("/{}", names.tag(method.name())),
                    _ => String::new(),
                }))
            })
            .function("locatorName", move |args| {
                let (_, locator) = args.locator(0)?;
                Ok(Value::str(names.public(locator.name())))
            })
            .function("locatorSegment", move |args| {
                let (_, locator) = args.locator(0)?;
                Ok(Value::str(names.tag(locator.name())))
            })
            .function("responseDataName", move |args| {
                let (_, resource) = args.resource(0)?;
                let (_, method) = args.method(1)?;
                Ok(Value::str(names.private(
                    &resource
                        .name()
                        .cat(method.name())
                        .cat(&Name::from_words(["response", "data"])),
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
            .function("hasBodyIn", move |args| {
                let (version, method) = args.method(0)?;
                Ok(Value::Bool(body_parameter(version, method).is_some()))
            })
            .function("bodyField", move |args| {
                let (version, method) = args.method(0)?;
                let parameter = body_parameter(version, method)
                    .ok_or_else(|| TemplateError::Helper("method has no body".into()))?;
                Ok(Value::str(names.private(parameter.name())))
            })
            .function("bodyObjectName", move |args| {
                let (version, method) = args.method(0)?;
                let parameter = body_parameter(version, method)
                    .ok_or_else(|| TemplateError::Helper("method has no body".into()))?;
                let ty = version.resolve(parameter.type_ref()).ok_or_else(|| {
                    TemplateError::UnresolvedReference {
                        name: parameter.type_ref().name().to_string(),
                    }
                })?;
                Ok(Value::str(names.public(ty.name())))
            })
            .function("queryLiteral", move |args| {
                let (version, parameter) = args.parameter(0)?;
                query_literal(&names, version, parameter)
            });
        let builder = bind_param_helpers(builder, names, *self.types);
        let mut buffer = bindings::standard(builder, self.names, self.types).build()?;

        buffer.import("bytes", "");
        buffer.import("context", "");
        buffer.import("encoding/json", "");
        buffer.import("net/http", "");
        buffer.import("net/url", "");
        buffer.import("path", "");
        buffer.import("strconv", "");
        buffer.import("time", "");
        buffer.import(self.packages.errors_package().import_path(), "errors");

        buffer.emit(
            CLIENT_TEMPLATE,
            &[("Resource", Value::Resource(version, resource))],
        );
        for method in resource.methods() {
            let bindings = [
                ("Resource", Value::Resource(version, resource)),
                ("Method", Value::Method(version, method)),
            ];
            buffer.emit(CLIENT_REQUEST_TEMPLATE, &bindings);
            buffer.emit(CLIENT_RESPONSE_TEMPLATE, &bindings);
            if matches!(method.kind(), MethodKind::List | MethodKind::Action) {
                buffer.emit(CLIENT_ENVELOPE_TEMPLATE, &bindings);
            }
            buffer.emit(CLIENT_SEND_PROLOGUE, &bindings);
            match method.kind() {
                MethodKind::List | MethodKind::Action => {
                    buffer.emit(CLIENT_SEND_ENVELOPE_EPILOGUE, &bindings);
                }
                MethodKind::Get | MethodKind::Add | MethodKind::Update => {
                    buffer.emit(CLIENT_SEND_BODY_EPILOGUE, &bindings);
                }
                MethodKind::Delete => {
                    buffer.emit(CLIENT_SEND_EMPTY_EPILOGUE, &bindings);
                }
            }
        }
        buffer.write(self.files)
    }
}

/// The first struct-typed `in` parameter of a method, if any: the
/// request body.
fn body_parameter<'m>(version: &'m Version, method: &'m metagen_core::model::Method) -> Option<&'m Parameter> {
    method.in_parameters().find(|parameter| {
        version
            .resolve(parameter.type_ref())
            .is_some_and(|ty| ty.is_struct())
    })
}

/// The expression that renders one scalar query parameter as text.
fn query_literal(
    names: &NamesCalculator,
    version: &Version,
    parameter: &Parameter,
) -> Result<Value<'static>, TemplateError> {
    let ty = version
        .resolve(parameter.type_ref())
        .ok_or_else(|| TemplateError::UnresolvedReference {
            name: parameter.type_ref().name().to_string(),
        })?;
    let field = names.private(parameter.name());
    Ok(Value::str(match ty.kind() {
        TypeKind::Scalar(ScalarKind::Boolean) => format!("strconv.FormatBool(*r.{field})"),
        TypeKind::Scalar(ScalarKind::Integer) => format!("strconv.Itoa(*r.{field})"),
        TypeKind::Scalar(ScalarKind::Long) => format!("strconv.FormatInt(*r.{field}, 10)"),
        TypeKind::Scalar(ScalarKind::Float) => {
            format!("strconv.FormatFloat(*r.{field}, 'f', -1, 64)")
        }
        TypeKind::Scalar(ScalarKind::String) => format!("*r.{field}"),
        TypeKind::Scalar(ScalarKind::Date) => format!("(*r.{field}).Format(time.RFC3339)"),
        TypeKind::Enum { .. } => format!("string(*r.{field})"),
        _ => {
            return Err(TemplateError::Helper(format!(
                "don't know how to encode parameter '{}' in the query",
                parameter.name()
            )));
        }
    }))
}

const CLIENT_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}

// {{ $resourceName }}Client is the client of the '{{ .Resource.Name }}'
// resource.
//
{{ lineComment .Resource.Doc }}
type {{ $resourceName }}Client struct {
client *http.Client
base *url.URL
path string
}

// New{{ $resourceName }}Client creates a new client for the
// '{{ .Resource.Name }}' resource.
func New{{ $resourceName }}Client(client *http.Client, base *url.URL, path string) *{{ $resourceName }}Client {
return &{{ $resourceName }}Client{
client: client,
base: base,
path: path,
}
}

{{ range .Resource.Locators }}
{{ if .Identified }}
// {{ locatorName . }} returns the client for the '{{ .Name }}' sub-resource,
// identified by the given identifier.
func (c *{{ $resourceName }}Client) {{ locatorName . }}(id string) *{{ resourceName .Target }}Client {
return New{{ resourceName .Target }}Client(c.client, c.base, c.path+"/"+id)
}
{{ else }}
// {{ locatorName . }} returns the client for the '{{ .Name }}' sub-resource.
func (c *{{ $resourceName }}Client) {{ locatorName . }}() *{{ resourceName .Target }}Client {
return New{{ resourceName .Target }}Client(c.client, c.base, c.path+"/{{ locatorSegment . }}")
}
{{ end }}
{{ end }}

{{ range .Resource.Methods }}
// {{ methodName . }} creates a request for the '{{ .Name }}' method.
//
{{ lineComment .Doc }}
func (c *{{ $resourceName }}Client) {{ methodName . }}() *{{ $resourceName }}{{ methodName . }}Request {
return &{{ $resourceName }}{{ methodName . }}Request{
client: c.client,
base: c.base,
path: c.path,
}
}
{{ end }}
"#;

const CLIENT_REQUEST_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}
{{ $requestName := cat $resourceName $methodName "Request" }}

// {{ $requestName }} is the request for the '{{ .Method.Name }}' method.
type {{ $requestName }} struct {
client *http.Client
base *url.URL
path string
{{ range .Method.InParameters }}
{{ if or .Type.IsScalar .Type.IsEnum }}
{{ paramField . }} {{ paramFieldType . }}
{{ end }}
{{ if .Type.IsStruct }}
{{ paramField . }} {{ paramValueType . }}
{{ end }}
{{ end }}
}

{{ range .Method.InParameters }}
// {{ paramSetter . }} sets the value of the '{{ .Name }}' parameter.
{{ if or .Type.IsScalar .Type.IsEnum }}
func (r *{{ $requestName }}) {{ paramSetter . }}(value {{ paramValueType . }}) *{{ $requestName }} {
r.{{ paramField . }} = &value
return r
}
{{ end }}
{{ if .Type.IsStruct }}
func (r *{{ $requestName }}) {{ paramSetter . }}(value {{ paramValueType . }}) *{{ $requestName }} {
r.{{ paramField . }} = value
return r
}
{{ end }}
{{ end }}
"#;

const CLIENT_RESPONSE_TEMPLATE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}
{{ $responseName := cat $resourceName $methodName "Response" }}

// {{ $responseName }} is the response for the '{{ .Method.Name }}' method.
type {{ $responseName }} struct {
{{ range .Method.OutParameters }}
{{ paramField . }} {{ paramResponseType . }}
{{ end }}
}

{{ range .Method.OutParameters }}
// {{ paramGetter . }} returns the value of the '{{ .Name }}' parameter.
func (r *{{ $responseName }}) {{ paramGetter . }}() {{ paramResponseType . }} {
if r == nil {
return {{ paramZero . }}
}
return r.{{ paramField . }}
}
{{ end }}
"#;

const CLIENT_ENVELOPE_TEMPLATE: &str = r#"
{{ $dataName := responseDataName .Resource .Method }}

// {{ $dataName }} is the JSON envelope of the '{{ .Method.Name }}' method
// response.
type {{ $dataName }} struct {
{{ range .Method.OutParameters }}
{{ paramGetter . }} {{ paramEnvelopeType . }} `json:"{{ paramTag . }}"`
{{ end }}
}
"#;

const CLIENT_SEND_PROLOGUE: &str = r#"
{{ $resourceName := resourceName .Resource }}
{{ $methodName := methodName .Method }}
{{ $requestName := cat $resourceName $methodName "Request" }}
{{ $responseName := cat $resourceName $methodName "Response" }}

// Send sends the request and waits for the response.
func (r *{{ $requestName }}) Send(ctx context.Context) (result *{{ $responseName }}, err error) {
address := *r.base
address.Path = path.Join(address.Path, r.path{{ if methodSuffix .Method }}+"{{ methodSuffix .Method }}"{{ end }})
{{ if hasScalarIn .Method }}
query := url.Values{}
{{ range .Method.InParameters }}
{{ if or .Type.IsScalar .Type.IsEnum }}
if r.{{ paramField . }} != nil {
query.Set("{{ paramTag . }}", {{ queryLiteral . }})
}
{{ end }}
{{ end }}
address.RawQuery = query.Encode()
{{ end }}
{{ if hasBodyIn .Method }}
body := new(bytes.Buffer)
err = Marshal{{ bodyObjectName .Method }}(r.{{ bodyField .Method }}, body)
if err != nil {
return
}
request, err := http.NewRequestWithContext(ctx, {{ methodVerb .Method }}, address.String(), body)
{{ else }}
request, err := http.NewRequestWithContext(ctx, {{ methodVerb .Method }}, address.String(), nil)
{{ end }}
if err != nil {
return
}
request.Header.Set("Accept", "application/json")
{{ if hasBodyIn .Method }}
request.Header.Set("Content-Type", "application/json")
{{ end }}
response, err := r.client.Do(request)
if err != nil {
return
}
defer response.Body.Close()
if response.StatusCode >= 400 {
err = errors.UnmarshalError(response.Body)
return
}
result = new({{ $responseName }})
"#;

const CLIENT_SEND_ENVELOPE_EPILOGUE: &str = r#"
data := new({{ responseDataName .Resource .Method }})
err = json.NewDecoder(response.Body).Decode(data)
if err != nil {
return
}
{{ range .Method.OutParameters }}
{{ if .Type.IsList }}
if data.{{ paramGetter . }} != nil {
items := make([]*{{ paramElementObjectName . }}, len(data.{{ paramGetter . }}))
for i, item := range data.{{ paramGetter . }} {
items[i] = read{{ paramElementObjectName . }}(item)
}
list := new({{ paramElementObjectName . }}List)
list.items = items
result.{{ paramField . }} = list
}
{{ end }}
{{ if .Type.IsStruct }}
result.{{ paramField . }} = read{{ paramObjectName . }}(data.{{ paramGetter . }})
{{ end }}
{{ if or .Type.IsScalar .Type.IsEnum }}
result.{{ paramField . }} = data.{{ paramGetter . }}
{{ end }}
{{ end }}
return
}
"#;

const CLIENT_SEND_BODY_EPILOGUE: &str = r#"
{{ range .Method.OutParameters }}
{{ if .Type.IsStruct }}
data := new({{ paramDataName . }})
err = json.NewDecoder(response.Body).Decode(data)
if err != nil {
return
}
result.{{ paramField . }} = read{{ paramObjectName . }}(data)
{{ end }}
{{ end }}
return
}
"#;

const CLIENT_SEND_EMPTY_EPILOGUE: &str = r#"
return
}
"#;
