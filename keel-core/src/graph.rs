//! Step dependency graph
//!
//! Arena of step nodes indexed by name. Edges point from a step to each of
//! its dependencies. Traversals keep their visitation tags in a vector
//! parallel to the arena, so no node is ever mutated through a reference.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::domain::pipeline::Step;

/// A node in the step graph
#[derive(Debug, Clone)]
pub struct StepNode<'a> {
    pub step: &'a Step,
    /// Arena indices of resolved dependencies, deduplicated
    pub dependencies: Vec<usize>,
}

/// Dependency that names no step in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    pub step: String,
    pub dependency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Borrowed view over a pipeline's steps
#[derive(Debug, Clone)]
pub struct StepGraph<'a> {
    nodes: Vec<StepNode<'a>>,
    indices: HashMap<&'a str, usize>,
    unresolved: Vec<UnresolvedDependency>,
}

impl<'a> StepGraph<'a> {
    /// Build the graph from a name-keyed step map
    ///
    /// Nodes are indexed by map key. Dependencies that do not resolve are
    /// collected rather than rejected; see [`StepGraph::unresolved_dependencies`].
    pub fn from_steps(steps: &'a BTreeMap<String, Step>) -> Self {
        let indices: HashMap<&str, usize> = steps
            .keys()
            .enumerate()
            .map(|(i, key)| (key.as_str(), i))
            .collect();

        let mut nodes = Vec::with_capacity(steps.len());
        let mut unresolved = Vec::new();

        for (key, step) in steps {
            let mut dependencies = Vec::with_capacity(step.depends_on.len());
            for dep in &step.depends_on {
                match indices.get(dep.as_str()) {
                    Some(&idx) if !dependencies.contains(&idx) => dependencies.push(idx),
                    Some(_) => {}
                    None => unresolved.push(UnresolvedDependency {
                        step: key.clone(),
                        dependency: dep.clone(),
                    }),
                }
            }
            nodes.push(StepNode { step, dependencies });
        }

        Self {
            nodes,
            indices,
            unresolved,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn get(&self, index: usize) -> Option<&StepNode<'a>> {
        self.nodes.get(index)
    }

    /// Names of steps with no declared dependencies
    pub fn roots(&self) -> Vec<&'a str> {
        self.nodes
            .iter()
            .filter(|n| n.step.depends_on.is_empty())
            .map(|n| n.step.name.as_str())
            .collect()
    }

    pub fn unresolved_dependencies(&self) -> &[UnresolvedDependency] {
        &self.unresolved
    }

    /// Find a dependency cycle using a three-color depth-first search
    ///
    /// Returns the cycle as a closed path of step names (`A -> B -> A`), or
    /// `None` if the graph is acyclic. Unresolved edges are skipped.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visit = vec![Visit::Unvisited; self.nodes.len()];
        let mut path = Vec::new();

        for start in 0..self.nodes.len() {
            if visit[start] == Visit::Unvisited {
                if let Some(cycle) = self.dfs_cycle(start, &mut visit, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: usize,
        visit: &mut [Visit],
        path: &mut Vec<usize>,
    ) -> Option<Vec<String>> {
        visit[node] = Visit::InProgress;
        path.push(node);

        for &dep in &self.nodes[node].dependencies {
            match visit[dep] {
                Visit::InProgress => {
                    // Back edge: the cycle is the path suffix starting at `dep`
                    let start = path.iter().position(|&n| n == dep).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..]
                        .iter()
                        .map(|&n| self.nodes[n].step.name.clone())
                        .collect();
                    cycle.push(self.nodes[dep].step.name.clone());
                    return Some(cycle);
                }
                Visit::Unvisited => {
                    if let Some(cycle) = self.dfs_cycle(dep, visit, path) {
                        return Some(cycle);
                    }
                }
                Visit::Done => {}
            }
        }

        path.pop();
        visit[node] = Visit::Done;
        None
    }

    /// Steps ordered so every step follows all of its dependencies
    ///
    /// Kahn's algorithm seeded in name order, so the result is stable for a
    /// given step map. Returns `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<&'a Step>> {
        let mut in_degree: Vec<usize> =
            self.nodes.iter().map(|n| n.dependencies.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            for &dep in &node.dependencies {
                dependents[dep].push(i);
            }
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());

        while let Some(idx) = queue.pop_front() {
            result.push(self.nodes[idx].step);
            for &next in &dependents[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        (result.len() == self.nodes.len()).then_some(result)
    }
}
