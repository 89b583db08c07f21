//! Topological sequencing with shell promotion.
//!
//! Produces the order in which object definitions are emitted. Objects are
//! released once all their dependencies have been emitted; among ready objects
//! the one with the lowest (priority class, schema, name, oid) goes first, so
//! the same input always yields the same sequence.
//!
//! ## Cycles
//!
//! Type definitions can reference each other in a loop (a base type whose I/O
//! functions take the type itself, a composite type whose member's converter
//! references the composite). Such a strongly-connected component is broken by
//! emitting a forward-declared shell for its type members first:
//!
//! ```text
//! A -> B -> A          shell(B), full(A), full(B)
//! T -> f(T) -> T       shell(T), f, full(T)
//! ```
//!
//! One type member of a component, the anchor, keeps only its full
//! definition as long as the remaining references still break every loop.
//! Other type members get a shell. References inside the component to a
//! shelled member are satisfied by the shell; references from outside still
//! wait for the full definition. When no anchor works, as for a type and its
//! own I/O function, every type member is shelled and only non-type members
//! may use the anchor's shell. A self-referencing type uses its own shell.
//! Cycles that survive this cannot be broken.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, warn};

use super::priority::PriorityClass;
use super::resolver::DependencyGraph;
use super::scc::{is_cyclic, strongly_connected_components};
use crate::catalog::{CatalogObjectRecord, Oid};
use crate::error::{Error, Result};
use crate::output::Section;

/// Which form of an object's definition a step emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DefinitionForm {
    /// Minimal forward declaration.
    Shell,
    /// Complete definition.
    Full,
}

/// One entry of the emission sequence.
#[derive(Debug, Clone, Copy)]
pub struct EmissionStep<'a> {
    /// The object.
    pub record: &'a CatalogObjectRecord,
    /// Shell or full definition.
    pub form: DefinitionForm,
}

/// Ordered emission plan for one run.
#[derive(Debug, Clone)]
pub struct EmissionSequence<'a> {
    steps: Vec<EmissionStep<'a>>,
}

impl<'a> EmissionSequence<'a> {
    /// All steps in emission order.
    pub fn steps(&self) -> &[EmissionStep<'a>] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if there is nothing to emit.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of shell steps.
    pub fn shell_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.form == DefinitionForm::Shell)
            .count()
    }

    /// The steps belonging to one section, in sequence order.
    pub fn for_section(&self, section: Section) -> Vec<EmissionStep<'a>> {
        self.steps
            .iter()
            .filter(|step| step.record.kind().belongs_to(section))
            .copied()
            .collect()
    }

    /// Position of an object's step of the given form.
    pub fn position(&self, oid: Oid, form: DefinitionForm) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.record.oid == oid && s.form == form)
    }
}

type SortKey<'a> = (PriorityClass, &'a str, &'a str, Oid, DefinitionForm);

/// Orders a [`DependencyGraph`] into an [`EmissionSequence`].
pub struct TopologicalSequencer;

impl TopologicalSequencer {
    /// Sequence the graph, promoting type members of cycles to shells.
    ///
    /// Fails with [`Error::UnbreakableCycle`] when a cycle has no type member
    /// to forward-declare, or still cycles through non-type members once all
    /// its types are shelled.
    pub fn sequence<'a>(graph: &DependencyGraph<'a>) -> Result<EmissionSequence<'a>> {
        let n = graph.len();
        let adjacency = graph.adjacency();

        let mut component_of = vec![0usize; n];
        let mut anchors: Vec<Option<usize>> = Vec::new();
        let mut shelled = vec![false; n];

        for (cid, component) in strongly_connected_components(adjacency)
            .into_iter()
            .enumerate()
        {
            for &member in &component {
                component_of[member] = cid;
            }
            if !is_cyclic(&component, adjacency) {
                anchors.push(None);
                continue;
            }
            let promotion = Promotion::choose(graph, &component)?;
            for &member in &promotion.shelled {
                debug!(
                    object = %graph.record(member).label(),
                    cycle_size = component.len(),
                    "promoting cycle member to shell"
                );
                shelled[member] = true;
            }
            anchors.push(promotion.anchor);
        }

        // Expanded graph: ids 0..n are full definitions, shells follow.
        let mut shell_id = vec![usize::MAX; n];
        let mut owner: Vec<(usize, DefinitionForm)> =
            (0..n).map(|v| (v, DefinitionForm::Full)).collect();
        for v in 0..n {
            if shelled[v] {
                shell_id[v] = owner.len();
                owner.push((v, DefinitionForm::Shell));
            }
        }

        let total = owner.len();
        let mut expanded: Vec<Vec<usize>> = vec![Vec::new(); total];
        for u in 0..n {
            for &v in graph.dependencies(u) {
                let redirect = shelled[v]
                    && component_of[u] == component_of[v]
                    && !(anchors[component_of[v]] == Some(v) && graph.record(u).kind().is_type());
                let target = if redirect {
                    shell_id[v]
                } else {
                    v
                };
                expanded[u].push(target);
            }
            if shelled[u] {
                expanded[u].push(shell_id[u]);
            }
            expanded[u].sort_unstable();
            expanded[u].dedup();
        }

        let key = |id: usize| -> SortKey<'a> {
            let (node, form) = owner[id];
            let record = graph.record(node);
            (
                PriorityClass::of(record.kind()),
                record.schema.as_str(),
                record.name.as_str(),
                record.oid,
                form,
            )
        };

        let mut pending: Vec<usize> = expanded.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); total];
        for (id, deps) in expanded.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(id);
            }
        }

        let mut ready: BinaryHeap<Reverse<(SortKey<'a>, usize)>> = (0..total)
            .filter(|&id| pending[id] == 0)
            .map(|id| Reverse((key(id), id)))
            .collect();

        let mut steps = Vec::with_capacity(total);
        while let Some(Reverse((_, id))) = ready.pop() {
            let (node, form) = owner[id];
            steps.push(EmissionStep {
                record: graph.record(node),
                form,
            });
            for &dependent in &dependents[id] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.push(Reverse((key(dependent), dependent)));
                }
            }
        }

        if steps.len() < total {
            return Err(Self::residual_cycle(graph, &owner, &expanded, &pending));
        }

        debug!(
            steps = steps.len(),
            shells = total - n,
            "emission sequence built"
        );

        Ok(EmissionSequence { steps })
    }

    fn residual_cycle(
        graph: &DependencyGraph<'_>,
        owner: &[(usize, DefinitionForm)],
        expanded: &[Vec<usize>],
        pending: &[usize],
    ) -> Error {
        // Restrict to the steps that never became ready.
        let stuck: Vec<Vec<usize>> = expanded
            .iter()
            .enumerate()
            .map(|(id, deps)| {
                if pending[id] == 0 {
                    Vec::new()
                } else {
                    deps.iter().copied().filter(|&d| pending[d] > 0).collect()
                }
            })
            .collect();

        let members = strongly_connected_components(&stuck)
            .into_iter()
            .filter(|component| is_cyclic(component, &stuck))
            .min()
            .unwrap_or_default();

        let err = Self::cycle_error(members.iter().map(|&id| graph.record(owner[id].0)));
        warn!(error = %err, "dependency cycle survives shell promotion");
        err
    }

    fn cycle_error<'r>(members: impl Iterator<Item = &'r CatalogObjectRecord>) -> Error {
        Error::UnbreakableCycle {
            members: members.map(CatalogObjectRecord::label).collect(),
        }
    }
}

/// Shell assignment for one cyclic component.
struct Promotion {
    shelled: Vec<usize>,
    anchor: Option<usize>,
}

impl Promotion {
    /// Pick the members of a cyclic component that get a shell.
    fn choose(graph: &DependencyGraph<'_>, component: &[usize]) -> Result<Self> {
        let types: Vec<usize> = component
            .iter()
            .copied()
            .filter(|&m| graph.record(m).kind().is_type())
            .collect();

        if types.is_empty() {
            let err =
                TopologicalSequencer::cycle_error(component.iter().map(|&m| graph.record(m)));
            warn!(error = %err, "dependency cycle without type members");
            return Err(err);
        }

        // Node ids follow tie-break order, so candidates are tried in that order.
        let candidates: Vec<usize> = types
            .iter()
            .copied()
            .filter(|&m| !graph.dependencies(m).contains(&m))
            .collect();

        let unshelled_anchor = candidates.iter().map(|&anchor| Self {
            shelled: types.iter().copied().filter(|&m| m != anchor).collect(),
            anchor: Some(anchor),
        });
        let shelled_anchor = candidates.iter().map(|&anchor| Self {
            shelled: types.clone(),
            anchor: Some(anchor),
        });
        // Every reference to a type inside the component may use its shell.
        let fallback = Self {
            shelled: types.clone(),
            anchor: None,
        };

        Ok(unshelled_anchor
            .chain(shelled_anchor)
            .find(|promotion| promotion.breaks_cycles(graph, component))
            .unwrap_or(fallback))
    }

    /// Whether an edge inside the component is satisfied by a shell.
    fn redirects(
        &self,
        graph: &DependencyGraph<'_>,
        shelled: &HashSet<usize>,
        from: usize,
        to: usize,
    ) -> bool {
        shelled.contains(&to)
            && !(self.anchor == Some(to) && graph.record(from).kind().is_type())
    }

    /// Check that the full definitions of the component no longer cycle.
    fn breaks_cycles(&self, graph: &DependencyGraph<'_>, component: &[usize]) -> bool {
        let shelled: HashSet<usize> = self.shelled.iter().copied().collect();
        let local: HashMap<usize, usize> = component
            .iter()
            .enumerate()
            .map(|(index, &node)| (node, index))
            .collect();
        let residual: Vec<Vec<usize>> = component
            .iter()
            .map(|&u| {
                graph
                    .dependencies(u)
                    .iter()
                    .filter(|&&v| !self.redirects(graph, &shelled, u, v))
                    .filter_map(|v| local.get(v).copied())
                    .collect()
            })
            .collect();
        strongly_connected_components(&residual)
            .iter()
            .all(|c| !is_cyclic(c, &residual))
    }
}
