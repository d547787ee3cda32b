//! Expansion of models, queries and solvers into runnable instances.
use crate::config::ModelDescription;
use crate::model::Model;
use crate::query::{Query, QueryKind};
use crate::solver::Solver;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// One (model, query, solver) combination.
#[derive(Debug, Clone)]
pub struct Instance {
    pub model: Arc<Model>,
    pub query: Arc<Query>,
    pub solver: Arc<dyn Solver>,
    pub tags: BTreeSet<String>,
    /// Position in build order; the last sort tie-breaker.
    pub ordinal: usize,
}

/// Report order: query kind, model name, query name, solver name. Model
/// constants and build order break the remaining ties.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey<'a> {
    kind: QueryKind,
    model: String,
    query: String,
    solver: &'a str,
    constants: Option<&'a str>,
    ordinal: usize,
}

impl Instance {
    pub fn sort_key(&self) -> SortKey<'_> {
        SortKey {
            kind: self.query.kind(),
            model: self.model.name(),
            query: self.query.name(),
            solver: self.solver.name(),
            constants: self.model.constants(),
            ordinal: self.ordinal,
        }
    }

    pub fn cmp_for_report(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / {}",
            self.solver.name(),
            self.model,
            self.query.name()
        )
    }
}

/// Instance filters; an instance runs only if every active filter accepts it.
#[derive(Debug, Clone, Default)]
pub struct InstanceFilter {
    pub query_kinds: Vec<QueryKind>,
    pub exclude_tags: Vec<String>,
    pub include_tags: Vec<String>,
    pub model_names: Vec<String>,
}

impl InstanceFilter {
    pub fn accepts(&self, instance: &Instance) -> bool {
        if !self.query_kinds.is_empty() && !self.query_kinds.contains(&instance.query.kind()) {
            return false;
        }
        if self
            .exclude_tags
            .iter()
            .any(|tag| instance.tags.contains(tag))
        {
            return false;
        }
        if !self.include_tags.is_empty()
            && !self
                .include_tags
                .iter()
                .any(|tag| instance.tags.contains(tag))
        {
            return false;
        }
        if !self.model_names.is_empty() {
            let name = instance.model.name();
            if !self.model_names.iter().any(|needle| name.contains(needle)) {
                return false;
            }
        }
        true
    }
}

/// Cross every model's queries with every solver and keep the instances the
/// filter accepts and the solver supports, in build order.
pub fn build_instances(
    models: &[ModelDescription],
    solvers: &[Arc<dyn Solver>],
    filter: &InstanceFilter,
) -> Vec<Instance> {
    let mut instances = Vec::new();
    for description in models {
        if description.queries.is_empty() {
            tracing::warn!(
                "Model {} has no valid queries",
                description.source_path.display()
            );
            continue;
        }
        let model = Arc::new(description.model.clone());
        for query_description in &description.queries {
            let query = Arc::new(query_description.query.clone());
            let tags: BTreeSet<String> = description
                .tags
                .iter()
                .chain(query_description.tags.iter())
                .cloned()
                .collect();
            for solver in solvers {
                if !solver.is_supported(&model, &query) {
                    tracing::debug!(
                        solver = solver.name(),
                        model = %model,
                        query = %query,
                        "skipping unsupported combination"
                    );
                    continue;
                }
                let instance = Instance {
                    model: Arc::clone(&model),
                    query: Arc::clone(&query),
                    solver: Arc::clone(solver),
                    tags: tags.clone(),
                    ordinal: instances.len(),
                };
                if filter.accepts(&instance) {
                    instances.push(instance);
                }
            }
        }
    }
    instances
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
