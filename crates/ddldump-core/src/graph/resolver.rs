//! Dependency resolution.
//!
//! Turns each record's textual `depends_upon` list into edges between the
//! records of one run. References that match nothing in the backup set are
//! treated as external or built-in objects and dropped.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::catalog::{CatalogObjectRecord, ObjectKind, Oid, TypeOrigin};
use crate::error::{Error, Result};

/// Directed graph of catalog objects; edges point from an object to the
/// objects it depends upon.
///
/// Node ids are dense indices ordered by ascending (schema, name, oid), so
/// iterating ids walks objects in tie-break order regardless of input order.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    nodes: Vec<&'a CatalogObjectRecord>,
    dependencies: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
    excluded: Vec<&'a CatalogObjectRecord>,
    dropped_references: usize,
}

impl<'a> DependencyGraph<'a> {
    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The record behind a node.
    pub fn record(&self, node: usize) -> &'a CatalogObjectRecord {
        self.nodes[node]
    }

    /// All node records in id order.
    pub fn records(&self) -> &[&'a CatalogObjectRecord] {
        &self.nodes
    }

    /// Nodes that `node` depends upon, ascending and deduplicated.
    pub fn dependencies(&self, node: usize) -> &[usize] {
        &self.dependencies[node]
    }

    /// Nodes that depend upon `node`, ascending.
    pub fn dependents(&self, node: usize) -> &[usize] {
        &self.dependents[node]
    }

    /// The full forward adjacency list.
    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.dependencies
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(Vec::len).sum()
    }

    /// Implicit types left out of the node set.
    pub fn excluded(&self) -> &[&'a CatalogObjectRecord] {
        &self.excluded
    }

    /// How many references resolved to nothing and were dropped.
    pub fn dropped_references(&self) -> usize {
        self.dropped_references
    }

    /// Find the node for a (schema, name, kind) key.
    pub fn find(&self, schema: &str, name: &str, kind: ObjectKind) -> Option<usize> {
        self.nodes
            .binary_search_by(|record| {
                (record.schema.as_str(), record.name.as_str())
                    .cmp(&(schema, name))
            })
            .ok()
            .and_then(|hit| {
                // Several kinds can share a (schema, name); scan the run of equals.
                let mut first = hit;
                while first > 0
                    && self.nodes[first - 1].schema == schema
                    && self.nodes[first - 1].name == name
                {
                    first -= 1;
                }
                (first..self.nodes.len())
                    .take_while(|&i| self.nodes[i].schema == schema && self.nodes[i].name == name)
                    .find(|&i| self.nodes[i].kind() == kind)
            })
    }
}

/// Builds a [`DependencyGraph`] from the record set of one run.
pub struct DependencyResolver;

impl DependencyResolver {
    /// Resolve every record's dependency list into graph edges.
    ///
    /// Implicit array counterparts and table row types are excluded from the
    /// node set. A reference to an excluded array counterpart resolves to its
    /// element type when that type is in the set; any other reference that
    /// matches no node is dropped.
    ///
    /// Fails with [`Error::AmbiguousDependency`] when a reference matches more
    /// than one node, and with [`Error::DuplicateObject`] when two records
    /// share a (schema, name, kind) key.
    pub fn resolve(records: &[CatalogObjectRecord]) -> Result<DependencyGraph<'_>> {
        let (mut nodes, excluded): (Vec<&CatalogObjectRecord>, Vec<&CatalogObjectRecord>) =
            records.iter().partition(|record| !record.origin().is_implicit());

        nodes.sort_by(|a, b| {
            (a.schema.as_str(), a.name.as_str(), a.oid, a.kind())
                .cmp(&(b.schema.as_str(), b.name.as_str(), b.oid, b.kind()))
        });

        Self::check_duplicates(&nodes)?;

        let mut lookup: HashMap<String, Vec<usize>> = HashMap::with_capacity(nodes.len());
        for (id, record) in nodes.iter().enumerate() {
            lookup.entry(record.qualified_name()).or_default().push(id);
        }

        let aliases: HashMap<String, &str> = excluded
            .iter()
            .filter_map(|record| match record.origin() {
                TypeOrigin::ArrayOf { element } => {
                    Some((record.qualified_name(), element.as_str()))
                }
                _ => None,
            })
            .collect();

        let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut dropped_references = 0usize;

        for (id, record) in nodes.iter().enumerate() {
            for name in &record.depends_upon {
                let hits = lookup.get(name.as_str()).or_else(|| {
                    aliases
                        .get(name.as_str())
                        .and_then(|element| lookup.get(*element))
                });

                match hits.map(Vec::as_slice) {
                    None | Some([]) => {
                        trace!(object = %record.label(), reference = %name, "dropping external reference");
                        dropped_references += 1;
                    }
                    Some([target]) => dependencies[id].push(*target),
                    Some(targets) => {
                        let mut oids: Vec<Oid> = targets.iter().map(|&t| nodes[t].oid).collect();
                        oids.sort_unstable();
                        return Err(Error::AmbiguousDependency {
                            name: name.clone(),
                            oids,
                        });
                    }
                }
            }
            dependencies[id].sort_unstable();
            dependencies[id].dedup();
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (id, deps) in dependencies.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(id);
            }
        }

        let graph = DependencyGraph {
            nodes,
            dependencies,
            dependents,
            excluded,
            dropped_references,
        };

        debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            excluded = graph.excluded.len(),
            dropped = graph.dropped_references,
            "dependency graph resolved"
        );

        Ok(graph)
    }

    fn check_duplicates(nodes: &[&CatalogObjectRecord]) -> Result<()> {
        let mut seen: HashMap<(&str, &str, ObjectKind), Vec<Oid>> = HashMap::new();
        for record in nodes {
            seen.entry((record.schema.as_str(), record.name.as_str(), record.kind()))
                .or_default()
                .push(record.oid);
        }

        // Report the first collision in tie-break order so the error is stable.
        for record in nodes {
            let key = (record.schema.as_str(), record.name.as_str(), record.kind());
            if let Some(oids) = seen.get(&key) {
                if oids.len() > 1 {
                    return Err(Error::DuplicateObject {
                        schema: record.schema.clone(),
                        name: record.name.clone(),
                        kind: record.kind(),
                        oids: oids.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BaseTypeDefinition, ObjectDetails};

    fn base_type(oid: u32, name: &str) -> CatalogObjectRecord {
        CatalogObjectRecord::new(oid, "public", name, ObjectDetails::base_type())
    }

    fn function(oid: u32, name: &str, args: &str) -> CatalogObjectRecord {
        CatalogObjectRecord::new(oid, "public", name, ObjectDetails::function(args))
    }

    #[test]
    fn test_resolves_edges_by_qualified_name() {
        let records = vec![
            base_type(10, "type_a").with_dependencies(["public.func_x()"]),
            function(11, "func_x", ""),
            base_type(12, "type_b").with_dependencies(["public.type_a"]),
        ];
        let graph = DependencyResolver::resolve(&records).unwrap();

        let a = graph.find("public", "type_a", ObjectKind::BaseType).unwrap();
        let b = graph.find("public", "type_b", ObjectKind::BaseType).unwrap();
        let x = graph.find("public", "func_x", ObjectKind::Function).unwrap();

        assert_eq!(graph.dependencies(a), &[x]);
        assert_eq!(graph.dependencies(b), &[a]);
        assert!(graph.dependencies(x).is_empty());
        assert_eq!(graph.dependents(a), &[b]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_unresolved_reference_is_dropped() {
        let records =
            vec![base_type(10, "type_a").with_dependencies(["public.func_x()", "pg_catalog.int4"])];
        let graph = DependencyResolver::resolve(&records).unwrap();

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.dropped_references(), 2);
    }

    #[test]
    fn test_node_order_ignores_input_order() {
        let forward = vec![base_type(3, "c"), base_type(1, "a"), base_type(2, "b")];
        let mut backward = forward.clone();
        backward.reverse();

        let g1 = DependencyResolver::resolve(&forward).unwrap();
        let g2 = DependencyResolver::resolve(&backward).unwrap();
        let names = |g: &DependencyGraph<'_>| {
            g.records().iter().map(|r| r.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&g1), vec!["a", "b", "c"]);
        assert_eq!(names(&g1), names(&g2));
    }

    #[test]
    fn test_ambiguous_dependency_reports_all_oids() {
        // A role and a tablespace may share a bare name.
        let records = vec![
            CatalogObjectRecord::new(7, "", "shared", ObjectDetails::Role(Default::default())),
            CatalogObjectRecord::new(
                5,
                "",
                "shared",
                ObjectDetails::Tablespace {
                    filespace: "fs".to_string(),
                },
            ),
            base_type(9, "t").with_dependencies(["shared"]),
        ];

        match DependencyResolver::resolve(&records) {
            Err(Error::AmbiguousDependency { name, oids }) => {
                assert_eq!(name, "shared");
                assert_eq!(oids, vec![Oid(5), Oid(7)]);
            }
            other => panic!("expected AmbiguousDependency, got {other:?}"),
        }
    }

    #[test]
    fn test_unreferenced_name_collision_is_not_an_error() {
        let records = vec![
            CatalogObjectRecord::new(7, "", "shared", ObjectDetails::Role(Default::default())),
            CatalogObjectRecord::new(
                5,
                "",
                "shared",
                ObjectDetails::Tablespace {
                    filespace: "fs".to_string(),
                },
            ),
        ];
        let graph = DependencyResolver::resolve(&records).unwrap();
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_duplicate_node_key_is_rejected() {
        let records = vec![base_type(1, "dup"), base_type(2, "dup")];
        match DependencyResolver::resolve(&records) {
            Err(Error::DuplicateObject { name, oids, .. }) => {
                assert_eq!(name, "dup");
                assert_eq!(oids, vec![Oid(1), Oid(2)]);
            }
            other => panic!("expected DuplicateObject, got {other:?}"),
        }
    }

    #[test]
    fn test_implicit_types_are_excluded() {
        let array = CatalogObjectRecord::new(
            21,
            "public",
            "_money2",
            ObjectDetails::BaseType(BaseTypeDefinition {
                origin: TypeOrigin::ArrayOf {
                    element: "public.money2".to_string(),
                },
                ..Default::default()
            }),
        );
        let row = CatalogObjectRecord::new(
            22,
            "public",
            "orders",
            ObjectDetails::CompositeType(crate::catalog::CompositeTypeDefinition {
                attributes: vec!["\tid int4".to_string()],
                origin: TypeOrigin::TableRow {
                    table: "public.orders".to_string(),
                },
            }),
        );
        let records = vec![
            array,
            row,
            base_type(20, "money2"),
            CatalogObjectRecord::new(23, "public", "wallet", ObjectDetails::composite_type(["\tamount public._money2"]))
                .with_dependencies(["public._money2", "public.orders"]),
        ];

        let graph = DependencyResolver::resolve(&records).unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.excluded().len(), 2);
        assert!(graph.find("public", "_money2", ObjectKind::BaseType).is_none());

        // The array reference lands on its element; the row type reference is dropped.
        let wallet = graph.find("public", "wallet", ObjectKind::CompositeType).unwrap();
        let money = graph.find("public", "money2", ObjectKind::BaseType).unwrap();
        assert_eq!(graph.dependencies(wallet), &[money]);
        assert_eq!(graph.dropped_references(), 1);
    }

    #[test]
    fn test_duplicate_references_collapse_to_one_edge() {
        let records = vec![
            function(1, "f", "integer"),
            base_type(2, "t").with_dependencies(["public.f(integer)", "public.f(integer)"]),
        ];
        let graph = DependencyResolver::resolve(&records).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }
}
