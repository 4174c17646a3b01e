//! Structural well-formedness checks over an analyzed model.
//!
//! Each violation is reported through the [`Reporter`] as an error of
//! the `model` component; the orchestrator fails the run at the end if
//! any were reported. Semantic validation of the API itself is out of
//! scope.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::reporter::Reporter;
use crate::words::Name;

use super::{Model, Resource, Type, TypeRef, Version};

const COMPONENT: &str = "model";

/// Checks the structural invariants of the model, reporting each
/// violation. Returns the number of errors found.
pub fn check(reporter: &Reporter, model: &Model) -> usize {
    let before = reporter.errors();
    let mut seen_services = FxHashSet::default();
    for service in model.services() {
        if !seen_services.insert(service.name()) {
            reporter.error(
                COMPONENT,
                format!("service '{}' is declared twice", service.name()),
            );
        }
        let mut seen_versions = FxHashSet::default();
        for version in service.versions() {
            if !seen_versions.insert(version.name()) {
                reporter.error(
                    COMPONENT,
                    format!(
                        "version '{}' of service '{}' is declared twice",
                        version.name(),
                        service.name()
                    ),
                );
            }
            check_version(reporter, version);
        }
    }
    reporter.errors() - before
}

fn check_version(reporter: &Reporter, version: &Version) {
    for ty in version.types() {
        check_type(reporter, version, ty);
    }
    for resource in version.resources() {
        check_resource(reporter, version, resource);
    }
    check_reachability(reporter, version);
}

fn check_type(reporter: &Reporter, version: &Version, ty: &Type) {
    let mut seen = FxHashSet::default();
    for attribute in ty.attributes() {
        if !seen.insert(attribute.name()) {
            reporter.error(
                COMPONENT,
                format!(
                    "attribute '{}' of type '{}' is declared twice",
                    attribute.name(),
                    ty.name()
                ),
            );
        }
        let Some(attribute_type) = resolve(reporter, version, ty.name(), attribute.type_ref())
        else {
            continue;
        };
        // `link` marks references to server-side collections or
        // entities, so it only makes sense on lists and structs.
        if attribute.link() && !attribute_type.is_list() && !attribute_type.is_struct() {
            reporter.error(
                COMPONENT,
                format!(
                    "attribute '{}' of type '{}' is marked as a link, \
                     but its type isn't a list or a struct",
                    attribute.name(),
                    ty.name()
                ),
            );
        }
    }

    let mut seen = FxHashSet::default();
    for value in ty.values() {
        if !seen.insert(value.name()) {
            reporter.error(
                COMPONENT,
                format!(
                    "value '{}' of enum '{}' is declared twice",
                    value.name(),
                    ty.name()
                ),
            );
        }
    }

    if let Some(element) = ty.element() {
        resolve(reporter, version, ty.name(), element);
    }
    if let Some(key) = ty.key() {
        resolve(reporter, version, ty.name(), key);
    }
}

fn resolve<'a>(
    reporter: &Reporter,
    version: &'a Version,
    owner: &Name,
    reference: &TypeRef,
) -> Option<&'a Type> {
    let resolved = version.resolve(reference);
    if resolved.is_none() {
        reporter.error(
            COMPONENT,
            format!(
                "type '{}' referenced from '{}' doesn't exist in version '{}'",
                reference.name(),
                owner,
                version.name()
            ),
        );
    }
    resolved
}

fn check_resource(reporter: &Reporter, version: &Version, resource: &Resource) {
    let mut seen = FxHashSet::default();
    for method in resource.methods() {
        if !seen.insert(method.name()) {
            reporter.error(
                COMPONENT,
                format!(
                    "method '{}' of resource '{}' is declared twice",
                    method.name(),
                    resource.name()
                ),
            );
        }
        for parameter in method.parameters() {
            resolve(reporter, version, resource.name(), parameter.type_ref());
        }
    }
    let mut seen = FxHashSet::default();
    for locator in resource.locators() {
        if !seen.insert(locator.name()) {
            reporter.error(
                COMPONENT,
                format!(
                    "locator '{}' of resource '{}' is declared twice",
                    locator.name(),
                    resource.name()
                ),
            );
        }
        if version.resource(locator.target()).is_none() {
            reporter.error(
                COMPONENT,
                format!(
                    "locator '{}' of resource '{}' targets unknown resource '{}'",
                    locator.name(),
                    resource.name(),
                    locator.target()
                ),
            );
        }
    }
}

/// Checks that the version has a root resource and that every other
/// resource is reachable from it through locators. Unreachable
/// resources are warnings: they generate fine, but no server path
/// leads to them.
fn check_reachability(reporter: &Reporter, version: &Version) {
    let Some(root) = version.root() else {
        reporter.error(
            COMPONENT,
            format!(
                "version '{}' doesn't have a root resource named '{}'",
                version.name(),
                version.root_name()
            ),
        );
        return;
    };

    let mut graph: DiGraph<&Name, ()> = DiGraph::new();
    let mut indices: FxHashMap<&Name, NodeIndex> = FxHashMap::default();
    for resource in version.resources() {
        let index = graph.add_node(resource.name());
        indices.insert(resource.name(), index);
    }
    for resource in version.resources() {
        for locator in resource.locators() {
            if let Some(&target) = indices.get(locator.target()) {
                graph.add_edge(indices[resource.name()], target, ());
            }
        }
    }

    let mut reached = FxHashSet::default();
    let mut dfs = Dfs::new(&graph, indices[root.name()]);
    while let Some(index) = dfs.next(&graph) {
        reached.insert(graph[index]);
    }
    for resource in version.resources() {
        if !reached.contains(resource.name()) {
            reporter.warn(
                COMPONENT,
                format!(
                    "resource '{}' of version '{}' isn't reachable from the root",
                    resource.name(),
                    version.name()
                ),
            );
        }
    }
}
