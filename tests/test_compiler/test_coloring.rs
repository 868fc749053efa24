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

use mu::compiler::backend::reg_alloc::graph_coloring::{FirstFitGraphColoring, GraphColoring, Relation};
use mu::error::RegAllocError;
use mu::options;
use utils::{LinkedHashMap, LinkedHashSet};

fn relation(adjacency: &[(usize, &[usize])]) -> Relation<usize> {
    adjacency
        .iter()
        .map(|&(v, ns)| (v, ns.iter().cloned().collect::<LinkedHashSet<usize>>()))
        .collect()
}

fn vertices(range: ::std::ops::Range<usize>) -> Relation<usize> {
    range.map(|v| (v, LinkedHashSet::new())).collect()
}

fn color(
    graph: &Relation<usize>,
    coalesce: &Relation<usize>,
    fixed_colors: &LinkedHashMap<usize, usize>,
    allowed_colors: &[usize]
) -> LinkedHashMap<usize, usize> {
    options::start_logging_trace();

    let coloring = FirstFitGraphColoring::new()
        .color(graph, coalesce, fixed_colors, allowed_colors)
        .unwrap();
    validate_coloring(graph, fixed_colors, allowed_colors, &coloring);
    coloring
}

fn validate_coloring(
    graph: &Relation<usize>,
    fixed_colors: &LinkedHashMap<usize, usize>,
    allowed_colors: &[usize],
    coloring: &LinkedHashMap<usize, usize>
) {
    for (v, c) in fixed_colors.iter() {
        if graph.contains_key(v) {
            assert_eq!(coloring.get(v), Some(c), "fixed color of {} not respected", v);
        }
    }
    for (v, c) in coloring.iter() {
        if !fixed_colors.contains_key(v) {
            assert!(allowed_colors.contains(c), "{} colored with {}", v, c);
        }
    }
    for (v, neighbors) in graph.iter() {
        for u in neighbors.iter() {
            if let (Some(cv), Some(cu)) = (coloring.get(v), coloring.get(u)) {
                assert!(cv != cu, "{} and {} are adjacent but share {}", v, u, cv);
            }
        }
    }
}

fn uncolored(n: usize, coloring: &LinkedHashMap<usize, usize>) -> usize {
    (0..n).filter(|v| !coloring.contains_key(v)).count()
}

#[test]
fn test_self_loop_rejected() {
    let graph = relation(&[(0, &[0])]);
    let res = FirstFitGraphColoring::new().color(&graph, &Relation::new(), &LinkedHashMap::<usize, usize>::new(), &[]);
    match res {
        Err(RegAllocError::InvalidInput(_)) => {}
        other => panic!("expected invalid input, got {:?}", other)
    }
}

#[test]
fn test_empty_graph_no_colors() {
    let coloring = color(&Relation::new(), &Relation::new(), &LinkedHashMap::new(), &[]);
    assert!(coloring.is_empty());
}

#[test]
fn test_no_interference_one_color() {
    let graph = vertices(1..51);
    let coloring = color(&graph, &Relation::new(), &LinkedHashMap::new(), &[0]);

    assert_eq!(coloring.len(), 50);
    assert!(coloring.values().all(|&c| c == 0));
}

#[test]
fn test_copy_pair_one_color() {
    let graph = vertices(0..2);
    let coalesce = relation(&[(0, &[1])]);
    let coloring = color(&graph, &coalesce, &LinkedHashMap::new(), &[0]);

    assert_eq!(coloring, linked_hashmap!{0 => 0, 1 => 0});
}

#[test]
fn test_copy_pair_same_color() {
    let graph = vertices(0..2);
    let coalesce = relation(&[(0, &[1])]);
    let coloring = color(&graph, &coalesce, &LinkedHashMap::new(), &[0, 1]);

    assert_eq!(coloring.len(), 2);
    assert_eq!(coloring[&0], coloring[&1]);
}

#[test]
fn test_fixed_colors_outside_allowed() {
    let graph = vertices(0..2);
    let fixed = linked_hashmap!{0 => 2, 1 => 3};
    let coloring = color(&graph, &Relation::new(), &fixed, &[]);

    assert_eq!(coloring, linked_hashmap!{0 => 2, 1 => 3});
}

#[test]
fn test_clique16_with_16_colors() {
    let graph: Relation<usize> = (0..16)
        .map(|v| (v, (0..16).filter(|&u| u != v).collect()))
        .collect();
    let allowed: Vec<usize> = (0..16).collect();
    let coloring = color(&graph, &Relation::new(), &LinkedHashMap::new(), &allowed);

    assert_eq!(coloring.len(), 16);
}

#[test]
fn test_interference_beats_copying() {
    let graph = relation(&[(0, &[1]), (1, &[0])]);
    let coalesce = relation(&[(0, &[1])]);
    let coloring = color(&graph, &coalesce, &LinkedHashMap::new(), &[2]);

    assert_eq!(coloring.len(), 1);
}

fn multipartite(n: usize, parts: usize) -> Relation<usize> {
    (0..n)
        .map(|v| (v, (0..n).filter(|&u| u % parts != v % parts).collect()))
        .collect()
}

#[test]
fn test_4_partite_with_3_colors() {
    for &n in [5, 7, 21].iter() {
        let coloring = color(&multipartite(n, 4), &Relation::new(), &LinkedHashMap::new(), &[1, 2, 3]);
        assert_eq!(uncolored(n, &coloring), n / 4, "n = {}", n);
    }
}

#[test]
fn test_clique_with_3_colors() {
    for &n in [4, 8, 20].iter() {
        // a clique is n-partite
        let coloring = color(&multipartite(n, n), &Relation::new(), &LinkedHashMap::new(), &[1, 2, 3]);
        assert_eq!(uncolored(n, &coloring), n - 3, "n = {}", n);
    }
}

#[test]
fn test_copy_chain_with_one_edge() {
    let graph = relation(&[(0, &[]), (1, &[3]), (2, &[]), (3, &[1]), (4, &[])]);
    let coalesce: Relation<usize> = (1..5).map(|v| (v, linked_hashset!{v - 1})).collect();
    let coloring = color(&graph, &coalesce, &LinkedHashMap::new(), &[1, 2]);

    assert_eq!(coloring.len(), 5);
    assert!(coloring[&1] != coloring[&3]);
    assert_eq!(coloring[&0], coloring[&2]);
    assert_eq!(coloring[&2], coloring[&4]);
}

#[test]
fn test_copy_chain_with_fixed_colors() {
    let graph = vertices(0..5);
    let coalesce: Relation<usize> = (1..5).map(|v| (v, linked_hashset!{v - 1})).collect();
    let fixed = linked_hashmap!{1 => 9, 3 => 10};
    let coloring = color(&graph, &coalesce, &fixed, &[9, 10]);

    assert_eq!(coloring.len(), 5);
    assert_eq!(coloring[&1], 9);
    assert_eq!(coloring[&3], 10);
    // coalescing runs in vertex order: 0, 2 and 4 join the group of 1
    assert_eq!(coloring[&0], 9);
    assert_eq!(coloring[&2], 9);
    assert_eq!(coloring[&4], 9);
}

#[test]
fn test_tree_of_copies() {
    let graph = relation(&[(1, &[2]), (2, &[1]), (3, &[4]), (4, &[3]), (5, &[6]), (6, &[5])]);
    let coalesce = relation(&[(1, &[0]), (2, &[0]), (3, &[1]), (4, &[1]), (5, &[2]), (6, &[2])]);
    let coloring = color(&graph, &coalesce, &LinkedHashMap::new(), &[0, 1]);

    // 0 is only mentioned as a copy, so it is not part of the problem
    let mut keys: Vec<usize> = coloring.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec![1, 2, 3, 4, 5, 6]);
}

fn bipartite_with_copies() -> (Relation<usize>, Relation<usize>) {
    // {0, 1, 2} x {3, 4, 5}, plus 6, 7 and 8 copied from one side each
    let graph = (0..9)
        .map(|v| {
            let neighbors: LinkedHashSet<usize> = match v {
                0..=2 => (3..6).collect(),
                3..=5 => (0..3).collect(),
                _ => LinkedHashSet::new()
            };
            (v, neighbors)
        })
        .collect();
    let coalesce = relation(&[(6, &[0]), (7, &[5]), (8, &[1])]);
    (graph, coalesce)
}

#[test]
fn test_bipartite_with_copies() {
    let (graph, coalesce) = bipartite_with_copies();
    let coloring = color(&graph, &coalesce, &LinkedHashMap::new(), &[0, 1]);

    assert_eq!(coloring.len(), 9);
    assert_eq!(coloring[&6], coloring[&0]);
    assert_eq!(coloring[&7], coloring[&5]);
    assert_eq!(coloring[&8], coloring[&1]);
}

#[test]
fn test_bipartite_with_copies_and_fixed_color() {
    let (graph, coalesce) = bipartite_with_copies();
    let coloring = color(&graph, &coalesce, &linked_hashmap!{0 => 0}, &[0, 1, 2]);

    assert_eq!(coloring.len(), 9);
    assert_eq!(coloring[&0], 0);
    assert_eq!(coloring[&6], coloring[&0]);
    assert_eq!(coloring[&7], coloring[&5]);
    assert_eq!(coloring[&8], coloring[&1]);
}

#[test]
fn test_copies_with_fixed_colors() {
    let graph = vertices(0..4);
    let coalesce = relation(&[(0, &[1]), (3, &[2])]);
    let coloring = color(&graph, &coalesce, &linked_hashmap!{0 => 2, 2 => 4}, &[2, 4]);

    assert_eq!(coloring, linked_hashmap!{0 => 2, 1 => 2, 2 => 4, 3 => 4});
}

#[test]
fn test_two_copies_with_interference() {
    let graph = relation(&[(1, &[]), (2, &[3]), (3, &[2])]);
    let coalesce = relation(&[(1, &[2]), (3, &[1])]);
    let coloring = color(&graph, &coalesce, &LinkedHashMap::new(), &[0, 1, 2]);

    assert_eq!(coloring.len(), 3);
    assert!(coloring[&1] == coloring[&2] || coloring[&1] == coloring[&3]);
}

#[test]
fn test_different_fixed_colors_never_merged() {
    // 0 and 1 are copy related but pinned to different colors
    let graph = vertices(0..2);
    let coalesce = relation(&[(0, &[1])]);
    let coloring = color(&graph, &coalesce, &linked_hashmap!{0 => 5, 1 => 6}, &[5, 6]);

    assert_eq!(coloring, linked_hashmap!{0 => 5, 1 => 6});
}

#[test]
fn test_deterministic() {
    let (graph, coalesce) = bipartite_with_copies();
    let first = color(&graph, &coalesce, &LinkedHashMap::new(), &[0, 1, 2]);
    for _ in 0..5 {
        let again = color(&graph, &coalesce, &LinkedHashMap::new(), &[0, 1, 2]);
        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            again.iter().collect::<Vec<_>>()
        );
    }
}
