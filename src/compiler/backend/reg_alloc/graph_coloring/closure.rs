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

//! Helpers on relations stored as adjacency maps.

use utils::{LinkedHashMap, LinkedHashSet};

use std::hash::Hash;

/// a relation over `V`, as a map from a vertex to its related vertices
pub type Relation<V> = LinkedHashMap<V, LinkedHashSet<V>>;

/// returns the symmetric closure of `graph`: every vertex mentioned
/// (as key or as value) becomes a key, and every edge exists in both directions
pub fn symmetric_closure<V: Clone + Eq + Hash>(graph: &Relation<V>) -> Relation<V> {
    let mut ret: Relation<V> = LinkedHashMap::new();
    for (v, neighbors) in graph.iter() {
        ret.entry(v.clone()).or_insert_with(LinkedHashSet::new);
        for n in neighbors.iter() {
            add_edge(&mut ret, v, n);
        }
    }
    ret
}

/// returns `graph` limited to the vertices in `keep`
pub fn restrict<V: Clone + Eq + Hash>(graph: &Relation<V>, keep: &LinkedHashSet<V>) -> Relation<V> {
    let mut ret: Relation<V> = LinkedHashMap::new();
    for v in keep.iter() {
        let neighbors = match graph.get(v) {
            Some(neighbors) => neighbors
                .iter()
                .filter(|n| keep.contains(*n))
                .cloned()
                .collect(),
            None => LinkedHashSet::new()
        };
        ret.insert(v.clone(), neighbors);
    }
    ret
}

/// adds `a - b` in both directions
pub fn add_edge<V: Clone + Eq + Hash>(graph: &mut Relation<V>, a: &V, b: &V) {
    graph
        .entry(a.clone())
        .or_insert_with(LinkedHashSet::new)
        .insert(b.clone());
    graph
        .entry(b.clone())
        .or_insert_with(LinkedHashSet::new)
        .insert(a.clone());
}

/// returns the first vertex related to itself, if any
pub fn find_self_loop<V: Eq + Hash>(graph: &Relation<V>) -> Option<&V> {
    graph
        .iter()
        .find(|&(v, neighbors)| neighbors.contains(v))
        .map(|(v, _)| v)
}

/// returns true if `a` and `b` are related in either direction
pub fn related_either_way<V: Eq + Hash>(graph: &Relation<V>, a: &V, b: &V) -> bool {
    graph.get(a).map_or(false, |set| set.contains(b)) ||
        graph.get(b).map_or(false, |set| set.contains(a))
}
