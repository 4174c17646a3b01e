//! The analyzed model: services, versions, types, resources, and
//! methods.
//!
//! The model is constructed once, by the external parser or from its
//! JSON interchange form, and is immutable afterwards. Types form a
//! closed sum ([`TypeKind`]); references between types are by name
//! ([`TypeRef`]) and resolve lazily through [`Version::resolve`], so
//! mutually recursive structs need no special representation.

mod check;

pub use check::check;

use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::words::Name;

/// The root of the model: an ordered set of services.
#[derive(Debug, Default, Deserialize)]
pub struct Model {
    #[serde(default)]
    services: Vec<Service>,
}

impl Model {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_service(&mut self, service: Service) {
        self.services.push(service);
    }

    #[inline]
    pub fn services(&self) -> &[Service] {
        &self.services
    }
}

/// A named service owning an ordered set of versions.
#[derive(Debug, Deserialize)]
pub struct Service {
    name: Name,
    #[serde(default)]
    versions: Vec<Version>,
}

impl Service {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            versions: Vec::new(),
        }
    }

    pub fn add_version(&mut self, version: Version) {
        self.versions.push(version);
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }
}

/// An API version: the unit of package assignment. Owns ordered types
/// and resources, and names its root resource.
#[derive(Debug, Deserialize)]
#[serde(from = "VersionData")]
pub struct Version {
    name: Name,
    root: Name,
    types: IndexMap<Name, Type>,
    resources: IndexMap<Name, Resource>,
}

/// The interchange form of a [`Version`]: types and resources as
/// ordered lists, indexed on construction.
#[derive(Debug, Deserialize)]
struct VersionData {
    name: Name,
    root: Name,
    #[serde(default)]
    types: Vec<Type>,
    #[serde(default)]
    resources: Vec<Resource>,
}

impl From<VersionData> for Version {
    fn from(data: VersionData) -> Self {
        let mut version = Version::new(data.name, data.root);
        for ty in data.types {
            version.add_type(ty);
        }
        for resource in data.resources {
            version.add_resource(resource);
        }
        version
    }
}

impl Version {
    pub fn new(name: Name, root: Name) -> Self {
        Self {
            name,
            root,
            types: IndexMap::new(),
            resources: IndexMap::new(),
        }
    }

    /// Adds a type. A second type with the same name replaces the
    /// first; the model checker reports the duplicate.
    pub fn add_type(&mut self, ty: Type) {
        self.types.insert(ty.name().clone(), ty);
    }

    pub fn add_resource(&mut self, resource: Resource) {
        self.resources.insert(resource.name().clone(), resource);
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Iterates the version's own types, in declaration order.
    /// Built-in scalars are not included.
    #[inline]
    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.types.values()
    }

    #[inline]
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Looks up a type declared in this version.
    #[inline]
    pub fn type_(&self, name: &Name) -> Option<&Type> {
        self.types.get(name)
    }

    #[inline]
    pub fn resource(&self, name: &Name) -> Option<&Resource> {
        self.resources.get(name)
    }

    /// The name of the root resource.
    #[inline]
    pub fn root_name(&self) -> &Name {
        &self.root
    }

    /// The root resource, if it exists. The model checker reports a
    /// missing root.
    #[inline]
    pub fn root(&self) -> Option<&Resource> {
        self.resources.get(&self.root)
    }

    /// Resolves a type reference to a type declared in this version,
    /// or to a built-in scalar.
    pub fn resolve(&self, reference: &TypeRef) -> Option<&Type> {
        self.types
            .get(reference.name())
            .or_else(|| builtin(reference.name()))
    }
}

/// Looks up a built-in scalar type by name.
pub fn builtin(name: &Name) -> Option<&'static Type> {
    static BUILTINS: LazyLock<Vec<Type>> = LazyLock::new(|| {
        ScalarKind::ALL
            .iter()
            .map(|&kind| Type::scalar(kind))
            .collect()
    });
    BUILTINS.iter().find(|ty| ty.name() == name)
}

/// The fixed set of scalar kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Boolean,
    Integer,
    Long,
    Float,
    String,
    Date,
    Interface,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 7] = [
        ScalarKind::Boolean,
        ScalarKind::Integer,
        ScalarKind::Long,
        ScalarKind::Float,
        ScalarKind::String,
        ScalarKind::Date,
        ScalarKind::Interface,
    ];

    /// The nomenclatural name of this scalar.
    pub fn name(self) -> Name {
        Name::word(match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Integer => "integer",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Date => "date",
            ScalarKind::Interface => "interface",
        })
    }
}

/// A model type: a closed sum over the five kinds, so calculators can
/// match exhaustively.
#[derive(Debug, Deserialize)]
pub struct Type {
    name: Name,
    #[serde(default)]
    doc: Option<String>,
    kind: TypeKind,
}

impl Type {
    pub fn new(name: Name, kind: TypeKind) -> Self {
        Self {
            name,
            doc: None,
            kind,
        }
    }

    pub fn with_doc(name: Name, doc: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name,
            doc: Some(doc.into()),
            kind,
        }
    }

    /// Builds a built-in scalar type.
    fn scalar(kind: ScalarKind) -> Self {
        Self::new(kind.name(), TypeKind::Scalar(kind))
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, TypeKind::Scalar(_))
    }

    #[inline]
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }

    #[inline]
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct { .. })
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self.kind, TypeKind::List { .. })
    }

    #[inline]
    pub fn is_map(&self) -> bool {
        matches!(self.kind, TypeKind::Map { .. })
    }

    /// Whether this is a `class`-marked struct: an entity with
    /// identity, link, and href.
    #[inline]
    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Struct { class: true, .. })
    }

    /// The attributes of a struct type; empty for other kinds.
    pub fn attributes(&self) -> &[Attribute] {
        match &self.kind {
            TypeKind::Struct { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// The values of an enum type; empty for other kinds.
    pub fn values(&self) -> &[EnumValue] {
        match &self.kind {
            TypeKind::Enum { values } => values,
            _ => &[],
        }
    }

    /// The element type reference of a list or map.
    pub fn element(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::List { element } | TypeKind::Map { element, .. } => Some(element),
            _ => None,
        }
    }

    /// The key type reference of a map.
    pub fn key(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Map { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// The kind of a model type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Scalar(ScalarKind),
    Enum {
        values: Vec<EnumValue>,
    },
    Struct {
        #[serde(default)]
        class: bool,
        #[serde(default)]
        attributes: Vec<Attribute>,
    },
    List {
        element: TypeRef,
    },
    Map {
        key: TypeRef,
        element: TypeRef,
    },
}

/// A value of an enumerated type.
#[derive(Debug, Deserialize)]
pub struct EnumValue {
    name: Name,
    #[serde(default)]
    doc: Option<String>,
}

impl EnumValue {
    pub fn new(name: Name) -> Self {
        Self { name, doc: None }
    }

    pub fn with_doc(name: Name, doc: impl Into<String>) -> Self {
        Self {
            name,
            doc: Some(doc.into()),
        }
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

/// A named field of a struct type.
#[derive(Debug, Deserialize)]
pub struct Attribute {
    name: Name,
    #[serde(rename = "type")]
    type_ref: TypeRef,
    /// Marks the attribute as a reference to data served by another
    /// endpoint rather than embedded content.
    #[serde(default)]
    link: bool,
    #[serde(default)]
    doc: Option<String>,
}

impl Attribute {
    pub fn new(name: Name, type_ref: TypeRef) -> Self {
        Self {
            name,
            type_ref,
            link: false,
            doc: None,
        }
    }

    pub fn linked(name: Name, type_ref: TypeRef) -> Self {
        Self {
            name,
            type_ref,
            link: true,
            doc: None,
        }
    }

    pub fn set_doc(&mut self, doc: impl Into<String>) {
        self.doc = Some(doc.into());
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    #[inline]
    pub fn link(&self) -> bool {
        self.link
    }

    #[inline]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

/// A by-name reference to a type in the same version, or to a
/// built-in scalar.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct TypeRef {
    name: Name,
}

impl TypeRef {
    pub fn new(name: Name) -> Self {
        Self { name }
    }

    /// A reference to a built-in scalar.
    pub fn scalar(kind: ScalarKind) -> Self {
        Self { name: kind.name() }
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }
}

/// An addressable collection or entity exposing methods and locators.
#[derive(Debug, Deserialize)]
pub struct Resource {
    name: Name,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    methods: Vec<Method>,
    #[serde(default)]
    locators: Vec<Locator>,
}

impl Resource {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            doc: None,
            methods: Vec::new(),
            locators: Vec::new(),
        }
    }

    pub fn add_method(&mut self, method: Method) {
        self.methods.push(method);
    }

    pub fn add_locator(&mut self, locator: Locator) {
        self.locators.push(locator);
    }

    pub fn set_doc(&mut self, doc: impl Into<String>) {
        self.doc = Some(doc.into());
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    #[inline]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    #[inline]
    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }
}

/// A named transition from a resource to a sub-resource, optionally
/// parameterized by an identifier segment.
#[derive(Debug, Deserialize)]
pub struct Locator {
    name: Name,
    target: Name,
    #[serde(default)]
    identified: bool,
}

impl Locator {
    pub fn new(name: Name, target: Name) -> Self {
        Self {
            name,
            target,
            identified: false,
        }
    }

    pub fn identified(name: Name, target: Name) -> Self {
        Self {
            name,
            target,
            identified: true,
        }
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The name of the target resource, in the same version.
    #[inline]
    pub fn target(&self) -> &Name {
        &self.target
    }

    /// Whether the transition binds an identifier path segment.
    #[inline]
    pub fn is_identified(&self) -> bool {
        self.identified
    }
}

/// A method of a resource.
#[derive(Debug, Deserialize)]
pub struct Method {
    name: Name,
    kind: MethodKind,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
}

impl Method {
    pub fn new(name: Name, kind: MethodKind) -> Self {
        Self {
            name,
            kind,
            doc: None,
            parameters: Vec::new(),
        }
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    pub fn set_doc(&mut self, doc: impl Into<String>) {
        self.doc = Some(doc.into());
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    #[inline]
    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Parameters readable by the server: direction `in` or `in-out`.
    pub fn in_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| matches!(p.direction(), Direction::In | Direction::InOut))
    }

    /// Parameters written by the server: direction `out` or `in-out`.
    pub fn out_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| matches!(p.direction(), Direction::Out | Direction::InOut))
    }
}

/// The kind of a method, fixing its verb and sub-path.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    List,
    Add,
    Get,
    Update,
    Delete,
    Action,
}

/// A parameter of a method.
#[derive(Debug, Deserialize)]
pub struct Parameter {
    name: Name,
    direction: Direction,
    #[serde(rename = "type")]
    type_ref: TypeRef,
    #[serde(default)]
    default: Option<Literal>,
}

impl Parameter {
    pub fn new(name: Name, direction: Direction, type_ref: TypeRef) -> Self {
        Self {
            name,
            direction,
            type_ref,
            default: None,
        }
    }

    pub fn set_default(&mut self, default: Literal) {
        self.default = Some(default);
    }

    #[inline]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    #[inline]
    pub fn default(&self) -> Option<&Literal> {
        self.default.as_ref()
    }
}

/// The direction of a parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
    InOut,
}

/// A default value literal.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    String(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn version_with_cluster() -> Version {
        let mut version = Version::new(Name::word("v1"), Name::word("root"));
        version.add_type(Type::new(
            Name::word("cluster"),
            TypeKind::Struct {
                class: true,
                attributes: vec![Attribute::new(
                    Name::word("name"),
                    TypeRef::scalar(ScalarKind::String),
                )],
            },
        ));
        version
    }

    #[test]
    fn test_resolve_declared_type() {
        let version = version_with_cluster();
        let reference = TypeRef::new(Name::word("cluster"));
        let ty = version.resolve(&reference).unwrap();
        assert!(ty.is_class());
    }

    #[test]
    fn test_resolve_builtin_scalar() {
        let version = version_with_cluster();
        let reference = TypeRef::scalar(ScalarKind::Integer);
        let ty = version.resolve(&reference).unwrap();
        assert!(matches!(ty.kind(), TypeKind::Scalar(ScalarKind::Integer)));
    }

    #[test]
    fn test_resolve_dangling_reference() {
        let version = version_with_cluster();
        let reference = TypeRef::new(Name::word("flavour"));
        assert!(version.resolve(&reference).is_none());
    }

    #[test]
    fn test_types_iterate_in_declaration_order() {
        let mut version = Version::new(Name::word("v1"), Name::word("root"));
        for name in ["gamma", "alpha", "beta"] {
            version.add_type(Type::new(
                Name::word(name),
                TypeKind::Struct {
                    class: false,
                    attributes: vec![],
                },
            ));
        }
        let names: Vec<String> = version.types().map(|t| t.name().to_string()).collect();
        assert_eq!(names, ["gamma", "alpha", "beta"]);
    }

    #[test]
    fn test_deserialize_version() {
        let version: Version = serde_json::from_str(
            r#"{
                "name": "v1",
                "root": "root",
                "types": [
                    {
                        "name": "cluster_state",
                        "kind": {"enum": {"values": [{"name": "pending"}, {"name": "ready"}]}}
                    },
                    {
                        "name": "cluster",
                        "kind": {"struct": {
                            "class": true,
                            "attributes": [
                                {"name": "name", "type": "string"},
                                {"name": "state", "type": "cluster_state"}
                            ]
                        }}
                    }
                ],
                "resources": [
                    {
                        "name": "root",
                        "locators": [{"name": "clusters", "target": "clusters"}]
                    },
                    {
                        "name": "clusters",
                        "methods": [
                            {"name": "list", "kind": "list", "parameters": [
                                {"name": "page", "direction": "in_out", "type": "integer"},
                                {"name": "size", "direction": "in_out", "type": "integer"}
                            ]}
                        ],
                        "locators": [{"name": "cluster", "target": "cluster", "identified": true}]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(version.types().count(), 2);
        let cluster = version.type_(&Name::word("cluster")).unwrap();
        assert!(cluster.is_class());
        let state = &cluster.attributes()[1];
        assert!(version.resolve(state.type_ref()).unwrap().is_enum());
        let root = version.root().unwrap();
        assert_eq!(root.locators()[0].target(), &Name::word("clusters"));
    }
}
