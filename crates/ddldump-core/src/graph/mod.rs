//! Dependency graph construction and emission ordering.

pub mod priority;
pub mod resolver;
pub mod scc;
pub mod sequencer;

pub use priority::PriorityClass;
pub use resolver::{DependencyGraph, DependencyResolver};
pub use sequencer::{DefinitionForm, EmissionSequence, EmissionStep, TopologicalSequencer};
