//! End-to-end generation over a clusters-management model: two
//! levels of resources (clusters → cluster → identity providers),
//! class structs, list containers, and the full emitter family.
//!
//! The generated code is Go, so these tests assert over the emitted
//! source: the routing registrations, envelopes, and accessors that
//! the HTTP scenarios depend on, plus byte-for-byte determinism
//! across runs.

use std::path::Path;

use metagen_codegen_go::{
    GeneratorBuilder, NamesCalculator, PackagesCalculator, TypesCalculator,
};
use metagen_core::model::{
    Attribute, Direction, Locator, Method, MethodKind, Model, Parameter, Resource, ScalarKind,
    Service, Type, TypeKind, TypeRef, Version,
};
use metagen_core::reporter::Reporter;
use metagen_core::words::Name;

fn name(text: &str) -> Name {
    Name::parse(text).unwrap()
}

fn class_struct(type_name: &str) -> Type {
    Type::new(
        name(type_name),
        TypeKind::Struct {
            class: true,
            attributes: vec![Attribute::new(
                name("name"),
                TypeRef::scalar(ScalarKind::String),
            )],
        },
    )
}

fn list_of(list_name: &str, element: &str) -> Type {
    Type::new(
        name(list_name),
        TypeKind::List {
            element: TypeRef::new(name(element)),
        },
    )
}

fn list_method(items_type: &str) -> Method {
    let mut method = Method::new(name("list"), MethodKind::List);
    method.add_parameter(Parameter::new(
        name("page"),
        Direction::InOut,
        TypeRef::scalar(ScalarKind::Integer),
    ));
    method.add_parameter(Parameter::new(
        name("size"),
        Direction::InOut,
        TypeRef::scalar(ScalarKind::Integer),
    ));
    method.add_parameter(Parameter::new(
        name("total"),
        Direction::Out,
        TypeRef::scalar(ScalarKind::Integer),
    ));
    method.add_parameter(Parameter::new(
        name("items"),
        Direction::Out,
        TypeRef::new(name(items_type)),
    ));
    method
}

fn body_method(method_name: &str, kind: MethodKind, body_type: &str) -> Method {
    let direction = match kind {
        MethodKind::Get => Direction::Out,
        _ => Direction::InOut,
    };
    let mut method = Method::new(name(method_name), kind);
    method.add_parameter(Parameter::new(
        name("body"),
        direction,
        TypeRef::new(name(body_type)),
    ));
    method
}

/// The model behind the HTTP scenarios: a root resource with a
/// `clusters` collection, identified clusters, and identity providers
/// below each cluster.
fn clusters_model() -> Model {
    let mut version = Version::new(name("v1"), name("root"));

    version.add_type(class_struct("cluster"));
    version.add_type(list_of("clusters", "cluster"));
    version.add_type(class_struct("identity_provider"));
    version.add_type(list_of("identity_providers", "identity_provider"));
    version.add_type(class_struct("group"));
    version.add_type(list_of("groups", "group"));

    let mut root = Resource::new(name("root"));
    root.add_locator(Locator::new(name("clusters"), name("clusters")));
    version.add_resource(root);

    let mut clusters = Resource::new(name("clusters"));
    clusters.add_method(list_method("clusters"));
    clusters.add_method(body_method("add", MethodKind::Add, "cluster"));
    clusters.add_locator(Locator::identified(name("cluster"), name("cluster")));
    version.add_resource(clusters);

    let mut cluster = Resource::new(name("cluster"));
    cluster.add_method(body_method("get", MethodKind::Get, "cluster"));
    cluster.add_method(body_method("update", MethodKind::Update, "cluster"));
    cluster.add_method(Method::new(name("delete"), MethodKind::Delete));
    cluster.add_locator(Locator::new(name("groups"), name("groups")));
    cluster.add_locator(Locator::new(
        name("identity_providers"),
        name("identity_providers"),
    ));
    version.add_resource(cluster);

    let mut groups = Resource::new(name("groups"));
    groups.add_method(list_method("groups"));
    version.add_resource(groups);

    let mut identity_providers = Resource::new(name("identity_providers"));
    identity_providers.add_method(list_method("identity_providers"));
    identity_providers.add_method(body_method("add", MethodKind::Add, "identity_provider"));
    identity_providers.add_locator(Locator::identified(
        name("identity_provider"),
        name("identity_provider"),
    ));
    version.add_resource(identity_providers);

    let mut identity_provider = Resource::new(name("identity_provider"));
    identity_provider.add_method(body_method("get", MethodKind::Get, "identity_provider"));
    version.add_resource(identity_provider);

    let mut service = Service::new(name("clusters_mgmt"));
    service.add_version(version);
    let mut model = Model::new();
    model.add_service(service);
    model
}

fn generate_into(dir: &Path) -> Reporter {
    let reporter = Reporter::new();
    let model = clusters_model();
    let names = NamesCalculator::new();
    let mut generator = GeneratorBuilder::new()
        .reporter(&reporter)
        .model(&model)
        .output(dir)
        .names(names)
        .packages(PackagesCalculator::new("github.com/acme/sdk"))
        .types(TypesCalculator::new(names))
        .build()
        .unwrap();
    generator.run().unwrap();
    reporter
}

fn read(dir: &Path, relative: &str) -> String {
    let path = dir.join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("can't read `{}`: {err}", path.display()))
}

fn assert_contains(source: &str, needle: &str) {
    assert!(
        source.contains(needle),
        "expected to find `{needle}` in:\n{source}"
    );
}

#[test]
fn test_generates_the_expected_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    for file in [
        "helpers/helpers.go",
        "errors/errors.go",
        "clusters_mgmt/v1/metadata_type.go",
        "clusters_mgmt/v1/cluster_type.go",
        "clusters_mgmt/v1/cluster_builder.go",
        "clusters_mgmt/v1/cluster_reader.go",
        "clusters_mgmt/v1/cluster_writer.go",
        "clusters_mgmt/v1/cluster_client.go",
        "clusters_mgmt/v1/cluster_server.go",
        "clusters_mgmt/v1/clusters_client.go",
        "clusters_mgmt/v1/clusters_server.go",
        "clusters_mgmt/v1/root_client.go",
        "clusters_mgmt/v1/root_server.go",
        "clusters_mgmt/v1/identity_provider_type.go",
        "clusters_mgmt/v1/identity_providers_server.go",
    ] {
        assert!(dir.path().join(file).is_file(), "missing `{file}`");
    }
}

#[test]
fn test_generation_reports_no_errors() {
    let dir = tempfile::tempdir().unwrap();
    let reporter = generate_into(dir.path());
    assert_eq!(reporter.errors(), 0, "records: {:?}", reporter.records());
}

#[test]
fn test_class_struct_type() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let source = read(dir.path(), "clusters_mgmt/v1/cluster_type.go");
    assert_contains(&source, "// Code generated by metagen, DO NOT EDIT.");
    assert_contains(&source, "package v1");
    assert_contains(&source, "const ClusterKind = \"Cluster\"");
    assert_contains(&source, "const ClusterLinkKind = \"ClusterLink\"");
    assert_contains(&source, "const ClusterNilKind = \"ClusterNil\"");
    assert_contains(&source, "func (o *Cluster) Kind() string");
    assert_contains(&source, "func (o *Cluster) ID() string");
    assert_contains(&source, "func (o *Cluster) GetID() (value string, ok bool)");
    assert_contains(&source, "func (o *Cluster) HREF() string");
    assert_contains(&source, "func (o *Cluster) Empty() bool");
    assert_contains(&source, "func (o *Cluster) Name() string");
    assert_contains(&source, "func (o *Cluster) GetName() (value string, ok bool)");
}

#[test]
fn test_list_container_type() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let source = read(dir.path(), "clusters_mgmt/v1/cluster_type.go");
    assert_contains(&source, "const ClusterListKind = \"ClusterList\"");
    assert_contains(&source, "type ClusterList struct");
    assert_contains(&source, "func (l *ClusterList) Len() int");
    assert_contains(&source, "func (l *ClusterList) Empty() bool");
    assert_contains(&source, "func (l *ClusterList) Get(i int) *Cluster");
    assert_contains(&source, "func (l *ClusterList) Slice() []*Cluster");
    assert_contains(&source, "func (l *ClusterList) Each(f func(item *Cluster) bool)");
    assert_contains(
        &source,
        "func (l *ClusterList) Range(f func(index int, item *Cluster) bool)",
    );
}

#[test]
fn test_version_metadata_type() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let source = read(dir.path(), "clusters_mgmt/v1/metadata_type.go");
    assert_contains(&source, "type Metadata struct");
    assert_contains(&source, "func (m *Metadata) ServerVersion() string");
    assert_contains(
        &source,
        "func (m *Metadata) GetServerVersion() (value string, ok bool)",
    );
}

#[test]
fn test_builders() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let source = read(dir.path(), "clusters_mgmt/v1/cluster_builder.go");
    assert_contains(&source, "func NewCluster() *ClusterBuilder");
    assert_contains(
        &source,
        "func (b *ClusterBuilder) Name(value string) *ClusterBuilder",
    );
    assert_contains(
        &source,
        "func (b *ClusterBuilder) ID(value string) *ClusterBuilder",
    );
    assert_contains(
        &source,
        "func (b *ClusterBuilder) Build() (object *Cluster, err error)",
    );
    assert_contains(&source, "func NewClusterList() *ClusterListBuilder");
    assert_contains(
        &source,
        "func (b *ClusterListBuilder) Items(values ...*ClusterBuilder) *ClusterListBuilder",
    );
    assert_contains(
        &source,
        "func (b *ClusterListBuilder) Build() (list *ClusterList, err error)",
    );
}

#[test]
fn test_json_reader_and_writer() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let reader = read(dir.path(), "clusters_mgmt/v1/cluster_reader.go");
    assert_contains(&reader, "type clusterData struct");
    assert_contains(&reader, "Kind *string `json:\"kind,omitempty\"`");
    assert_contains(&reader, "Name *string `json:\"name,omitempty\"`");
    assert_contains(
        &reader,
        "func UnmarshalCluster(source interface{}) (object *Cluster, err error)",
    );
    assert_contains(&reader, "object.link = *data.Kind == ClusterLinkKind");

    let writer = read(dir.path(), "clusters_mgmt/v1/cluster_writer.go");
    assert_contains(
        &writer,
        "func MarshalCluster(object *Cluster, writer io.Writer) error",
    );
    assert_contains(&writer, "kind := ClusterKind");
    assert_contains(&writer, "kind = ClusterLinkKind");
    assert_contains(&writer, "data.Kind = &kind");
    // A link with no items serializes with only kind and href.
    assert_contains(&writer, "if !list.link || len(list.items) > 0 {");
}

#[test]
fn test_server_interface_and_routing() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());

    let root = read(dir.path(), "clusters_mgmt/v1/root_server.go");
    assert_contains(&root, "type RootServer interface");
    assert_contains(&root, "Clusters() ClustersServer");
    assert_contains(
        &root,
        "func NewRootAdapter(server RootServer, router *mux.Router) *RootAdapter",
    );
    assert_contains(
        &root,
        "adapter.router.PathPrefix(\"/clusters\").HandlerFunc(adapter.clustersHandler)",
    );
    assert_contains(&root, "http.StripPrefix(\"/clusters\", adapter).ServeHTTP(w, r)");
    // Unknown paths and trailing slashes fall through to a bare 404.
    assert_contains(
        &root,
        "adapter.router.NotFoundHandler = http.HandlerFunc(errors.SendNotFound)",
    );

    let clusters = read(dir.path(), "clusters_mgmt/v1/clusters_server.go");
    assert_contains(&clusters, "type ClustersServer interface");
    assert_contains(
        &clusters,
        "List(ctx context.Context, request *ClustersListServerRequest, response *ClustersListServerResponse) error",
    );
    assert_contains(&clusters, "Cluster(id string) ClusterServer");
    assert_contains(
        &clusters,
        "adapter.router.HandleFunc(\"\", adapter.listHandler).Methods(http.MethodGet)",
    );
    assert_contains(
        &clusters,
        "adapter.router.HandleFunc(\"\", adapter.addHandler).Methods(http.MethodPost)",
    );
    assert_contains(
        &clusters,
        "adapter.router.PathPrefix(\"/{id}\").HandlerFunc(adapter.clusterHandler)",
    );
    assert_contains(&clusters, "id := mux.Vars(r)[\"id\"]");
    assert_contains(&clusters, "target := a.server.Cluster(id)");
    assert_contains(&clusters, "http.StripPrefix(\"/\"+id, adapter).ServeHTTP(w, r)");

    let cluster = read(dir.path(), "clusters_mgmt/v1/cluster_server.go");
    assert_contains(
        &cluster,
        "adapter.router.PathPrefix(\"/identity_providers\").HandlerFunc(adapter.identityProvidersHandler)",
    );
    assert_contains(
        &cluster,
        "adapter.router.HandleFunc(\"\", adapter.updateHandler).Methods(http.MethodPatch)",
    );
    assert_contains(
        &cluster,
        "adapter.router.HandleFunc(\"\", adapter.deleteHandler).Methods(http.MethodDelete)",
    );
}

#[test]
fn test_list_envelope_echoes_response_values() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let source = read(dir.path(), "clusters_mgmt/v1/clusters_server.go");
    // The envelope fields serialize unconditionally, echoing whatever
    // the handler set, including zero.
    assert_contains(&source, "Page int `json:\"page\"`");
    assert_contains(&source, "Size int `json:\"size\"`");
    assert_contains(&source, "Total int `json:\"total\"`");
    assert_contains(&source, "Items []*clusterData `json:\"items\"`");
    assert_contains(&source, "data.Page = response.page");
    // Query parameters parse into the request object with zero
    // defaults.
    assert_contains(&source, "helpers.ParseInteger(query, \"page\")");
    assert_contains(&source, "helpers.ParseInteger(query, \"size\")");
    // The response setters store plain values.
    assert_contains(
        &source,
        "func (r *ClustersListServerResponse) Page(value int)",
    );
    assert_contains(
        &source,
        "func (r *ClustersListServerResponse) Items(value *ClusterList)",
    );
}

#[test]
fn test_client_mirrors_server_contract() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let source = read(dir.path(), "clusters_mgmt/v1/clusters_client.go");
    assert_contains(&source, "type ClustersClient struct");
    assert_contains(
        &source,
        "func (c *ClustersClient) Cluster(id string) *ClusterClient",
    );
    assert_contains(&source, "c.path+\"/\"+id");
    assert_contains(
        &source,
        "func (c *ClustersClient) List() *ClustersListRequest",
    );
    assert_contains(
        &source,
        "func (r *ClustersListRequest) Page(value int) *ClustersListRequest",
    );
    assert_contains(&source, "query.Set(\"page\", strconv.Itoa(*r.page))");
    assert_contains(&source, "err = errors.UnmarshalError(response.Body)");
    assert_contains(&source, "func (r *ClustersListResponse) Items() *ClusterList");

    let root = read(dir.path(), "clusters_mgmt/v1/root_client.go");
    assert_contains(&root, "func (c *RootClient) Clusters() *ClustersClient");
    assert_contains(&root, "c.path+\"/clusters\"");
}

#[test]
fn test_helpers_and_errors_packages() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let helpers = read(dir.path(), "helpers/helpers.go");
    assert_contains(&helpers, "package helpers");
    assert_contains(
        &helpers,
        "func ParseInteger(query url.Values, name string) (*int, error)",
    );

    let errors = read(dir.path(), "errors/errors.go");
    assert_contains(&errors, "package errors");
    assert_contains(&errors, "const ErrorKind = \"Error\"");
    assert_contains(&errors, "func (e *Error) Error() string");
    assert_contains(
        &errors,
        "func SendNotFound(w http.ResponseWriter, r *http.Request)",
    );
    assert_contains(&errors, "w.WriteHeader(http.StatusInternalServerError)");
}

#[test]
fn test_imports_are_grouped_and_used() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path());
    let source = read(dir.path(), "clusters_mgmt/v1/clusters_server.go");
    assert_contains(&source, "\"net/http\"");
    assert_contains(&source, "\"github.com/gorilla/mux\"");
    assert_contains(&source, "errors \"github.com/acme/sdk/errors\"");
    assert_contains(&source, "helpers \"github.com/acme/sdk/helpers\"");
    // `time` is recorded up front but unused here, so it's elided.
    assert!(!source.contains("\"time\""), "unused import survived");
}

fn snapshot(dir: &Path) -> Vec<(String, String)> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let relative = path.strip_prefix(dir).unwrap().display().to_string();
                files.push((relative, std::fs::read_to_string(&path).unwrap()));
            }
        }
    }
    files.sort();
    files
}

#[test]
fn test_two_runs_are_byte_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    generate_into(first.path());
    generate_into(second.path());
    assert_eq!(snapshot(first.path()), snapshot(second.path()));
}
