// Copyright 2017 The Australian National University
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use compiler::backend::reg_alloc::graph_coloring::closure::*;
use error::RegAllocError;
use utils::{LinkedHashMap, LinkedHashSet};

use petgraph::dot::{Config, Dot};
use petgraph::graph::NodeIndex;
use petgraph::graphmap::UnGraphMap;
use petgraph::unionfind::UnionFind;
use petgraph::{Graph, Undirected};

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

const TRACE_COLORING: bool = true;

/// Graph coloring with coalescing.
///
/// * `graph`: vertices joined by an edge must get different colors.
///   Every vertex mentioned in `graph` is part of the problem.
/// * `coalesce`: vertices that should preferably share a color
///   (treated as an equivalence: closed transitively and symmetrically)
/// * `fixed_colors`: vertices whose color is decided in advance
/// * `allowed_colors`: the colors to use, in preference order
///
/// The result is a partial coloring; vertices of `graph` that are missing
/// from it could not be colored.
pub trait GraphColoring<V, C> {
    fn color(
        &self,
        graph: &Relation<V>,
        coalesce: &Relation<V>,
        fixed_colors: &LinkedHashMap<V, C>,
        allowed_colors: &[C]
    ) -> Result<LinkedHashMap<V, C>, RegAllocError>;
}

/// Iterated optimistic coloring with conservative (George) coalescing,
/// picking the first allowed color that is still free.
///
/// All choices follow the vertex order of `graph`, so the result is
/// reproducible for the same input.
#[derive(Copy, Clone, Debug, Default)]
pub struct FirstFitGraphColoring;

impl FirstFitGraphColoring {
    pub fn new() -> FirstFitGraphColoring {
        FirstFitGraphColoring
    }
}

impl<V, C> GraphColoring<V, C> for FirstFitGraphColoring
where
    V: Clone + Eq + Hash + Debug,
    C: Clone + Eq + Hash + Debug
{
    fn color(
        &self,
        graph: &Relation<V>,
        coalesce: &Relation<V>,
        fixed_colors: &LinkedHashMap<V, C>,
        allowed_colors: &[C]
    ) -> Result<LinkedHashMap<V, C>, RegAllocError> {
        let mut problem = ColoringProblem::new(graph, coalesce, fixed_colors, allowed_colors)?;
        problem.simplify_and_coalesce();
        Ok(problem.assign_colors())
    }
}

/// a vertex, as its index in `ColoringProblem::vertices`
type Node = usize;

struct ColoringProblem<'a, V, C: 'a> {
    vertices: Vec<V>,
    /// the input graph (symmetric, plus edges between different fixed colors)
    original: Graph<V, (), Undirected>,
    /// the graph of groups still to be removed; a group is represented by its head vertex
    current: UnGraphMap<Node, ()>,
    /// heads of the groups in `current`, in vertex order
    alive: LinkedHashSet<Node>,

    /// coalesced groups; `group_head` maps a union-find root to the group's head
    groups: UnionFind<Node>,
    group_head: Vec<Node>,
    /// fixed color of a group (indexed by head)
    group_color: Vec<Option<C>>,

    /// copy related vertices: `copy_classes[copy_class_of[v]]` lists the class of `v`
    copy_class_of: Vec<Node>,
    copy_classes: Vec<Vec<Node>>,

    select_stack: Vec<Node>,
    allowed: &'a [C]
}

impl<'a, V, C> ColoringProblem<'a, V, C>
where
    V: Clone + Eq + Hash + Debug,
    C: Clone + Eq + Hash + Debug
{
    fn new(
        graph: &Relation<V>,
        coalesce: &Relation<V>,
        fixed_colors: &LinkedHashMap<V, C>,
        allowed: &'a [C]
    ) -> Result<ColoringProblem<'a, V, C>, RegAllocError> {
        if let Some(v) = find_self_loop(graph) {
            return Err(RegAllocError::invalid_input(format!(
                "graph coloring: vertex {:?} is adjacent to itself",
                v
            )));
        }

        let graph = symmetric_closure(graph);
        let vertices: Vec<V> = graph.keys().cloned().collect();
        let n = vertices.len();
        let index: HashMap<V, Node> = vertices
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, v)| (v, i))
            .collect();

        let mut original = Graph::new_undirected();
        let mut current = UnGraphMap::with_capacity(n, 0);
        for (i, v) in vertices.iter().enumerate() {
            original.add_node(v.clone());
            current.add_node(i);
        }
        for (v, neighbors) in graph.iter() {
            let a = index[v];
            for u in neighbors.iter() {
                let b = index[u];
                if a < b {
                    original.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
                    current.add_edge(a, b, ());
                }
            }
        }

        // vertices with different fixed colors may never be merged
        let group_color: Vec<Option<C>> = vertices
            .iter()
            .map(|v| fixed_colors.get(v).cloned())
            .collect();
        for a in 0..n {
            for b in (a + 1)..n {
                match (&group_color[a], &group_color[b]) {
                    (&Some(ref ca), &Some(ref cb)) if ca != cb && !current.contains_edge(a, b) => {
                        original.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
                        current.add_edge(a, b, ());
                    }
                    _ => {}
                }
            }
        }

        // transitive and symmetric closure of the coalescing relation
        let mut copy_uf = UnionFind::new(n);
        for (v, copies) in coalesce.iter() {
            if let Some(&a) = index.get(v) {
                for u in copies.iter() {
                    if let Some(&b) = index.get(u) {
                        if a != b {
                            copy_uf.union(a, b);
                        }
                    }
                }
            }
        }
        let mut copy_class_of = Vec::with_capacity(n);
        let mut copy_classes = vec![vec![]; n];
        for i in 0..n {
            let root = copy_uf.find_mut(i);
            copy_class_of.push(root);
            copy_classes[root].push(i);
        }

        debug!(
            "graph coloring: {} vertices, {} edges, {} colors",
            n,
            original.edge_count(),
            allowed.len()
        );
        debug!("{:?}", Dot::with_config(&original, &[Config::EdgeNoLabel]));

        Ok(ColoringProblem {
            vertices: vertices,
            original: original,
            current: current,
            alive: (0..n).collect(),

            groups: UnionFind::new(n),
            group_head: (0..n).collect(),
            group_color: group_color,

            copy_class_of: copy_class_of,
            copy_classes: copy_classes,

            select_stack: Vec::with_capacity(n),
            allowed: allowed
        })
    }

    fn n_colors(&self) -> usize {
        self.allowed.len()
    }

    fn degree(&self, node: Node) -> usize {
        self.current.neighbors(node).count()
    }

    /// copy related groups that are still in the graph
    fn copies(&self, node: Node) -> Vec<Node> {
        self.copy_classes[self.copy_class_of[node]]
            .iter()
            .filter(|&&m| m != node && self.alive.contains(&m))
            .cloned()
            .collect()
    }

    /// George: merging `u` into `v` is safe if every neighbor of `v` is
    /// a neighbor of `u` already or has insignificant degree
    fn is_coalesce_safe(&self, v: Node, u: Node) -> bool {
        self.current
            .neighbors(v)
            .all(|t| self.current.contains_edge(t, u) || self.degree(t) < self.n_colors())
    }

    fn coalesce_candidate(&self, v: Node) -> Option<Node> {
        self.copies(v)
            .into_iter()
            .find(|&u| !self.current.contains_edge(v, u) && self.is_coalesce_safe(v, u))
    }

    fn find_coalescing(&self) -> Option<(Node, Node)> {
        for &v in self.alive.iter() {
            if let Some(u) = self.coalesce_candidate(v) {
                return Some((v, u));
            }
        }
        None
    }

    // only called when no group has a coalescing candidate
    fn find_simplifiable(&self) -> Option<Node> {
        self.alive
            .iter()
            .cloned()
            .find(|&v| self.degree(v) < self.n_colors())
    }

    /// the group with the fewest neighbors, preferring groups without a fixed color
    /// (ties go to the earliest vertex)
    fn select_spill(&self) -> Option<Node> {
        let free = self.alive
            .iter()
            .cloned()
            .filter(|&v| self.group_color[v].is_none())
            .min_by_key(|&v| self.degree(v));

        free.or_else(|| self.alive.iter().cloned().min_by_key(|&v| self.degree(v)))
    }

    fn merge(&mut self, v: Node, u: Node) {
        trace_if!(
            TRACE_COLORING,
            "coalescing {:?} into {:?}",
            self.vertices[u],
            self.vertices[v]
        );

        let neighbors: Vec<Node> = self.current.neighbors(u).collect();
        for t in neighbors {
            if t != v {
                self.current.add_edge(v, t, ());
            }
        }
        self.current.remove_node(u);
        self.alive.remove(&u);

        self.groups.union(v, u);
        let root = self.groups.find_mut(v);
        self.group_head[root] = v;
        if self.group_color[v].is_none() {
            self.group_color[v] = self.group_color[u].take();
        }
    }

    fn push(&mut self, v: Node) {
        self.current.remove_node(v);
        self.alive.remove(&v);
        self.select_stack.push(v);
    }

    fn simplify_and_coalesce(&mut self) {
        while !self.alive.is_empty() {
            if let Some((v, u)) = self.find_coalescing() {
                self.merge(v, u);
            } else if let Some(v) = self.find_simplifiable() {
                trace_if!(TRACE_COLORING, "simplify {:?}", self.vertices[v]);
                self.push(v);
            } else if let Some(v) = self.select_spill() {
                trace_if!(
                    TRACE_COLORING,
                    "{:?} has degree {}, push as potential spill",
                    self.vertices[v],
                    self.degree(v)
                );
                self.push(v);
            }
        }
    }

    fn assign_colors(mut self) -> LinkedHashMap<V, C> {
        let n = self.vertices.len();

        let mut members: Vec<Vec<Node>> = vec![vec![]; n];
        for x in 0..n {
            let root = self.groups.find_mut(x);
            members[self.group_head[root]].push(x);
        }

        let mut colors: Vec<Option<C>> = vec![None; n];

        // groups with a fixed color take it regardless of the removal order
        for &head in self.select_stack.iter() {
            if let Some(ref color) = self.group_color[head] {
                for &m in members[head].iter() {
                    colors[m] = Some(color.clone());
                }
            }
        }

        for &head in self.select_stack.iter().rev() {
            if self.group_color[head].is_some() {
                continue;
            }

            let chosen = {
                let forbidden: HashSet<&C> = members[head]
                    .iter()
                    .flat_map(|&m| self.original.neighbors(NodeIndex::new(m)))
                    .filter_map(|neighbor| colors[neighbor.index()].as_ref())
                    .collect();
                self.allowed
                    .iter()
                    .find(|color| !forbidden.contains(color))
                    .cloned()
            };

            match chosen {
                Some(color) => {
                    trace_if!(
                        TRACE_COLORING,
                        "color {:?} (group of {}) as {:?}",
                        self.vertices[head],
                        members[head].len(),
                        color
                    );
                    for &m in members[head].iter() {
                        colors[m] = Some(color.clone());
                    }
                }
                None => {
                    trace_if!(
                        TRACE_COLORING,
                        "no color left for {:?} (group of {})",
                        self.vertices[head],
                        members[head].len()
                    );
                }
            }
        }

        let mut ret = LinkedHashMap::new();
        for (v, color) in self.vertices.into_iter().zip(colors.into_iter()) {
            if let Some(color) = color {
                ret.insert(v, color);
            }
        }
        ret
    }
}
