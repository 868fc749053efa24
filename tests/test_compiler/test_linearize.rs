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

use mu::ast::cfg::*;
use mu::ast::inst::*;
use mu::compiler::backend::linearize::linearize;
use mu::compiler::machine_code::*;
use mu::error::RegAllocError;
use mu::options;
use mu::testutil::*;
use utils::LinkedHashSet;

fn text(block: &BasicBlock) -> Vec<String> {
    block.instructions.iter().map(|inst| inst.to_string()).collect()
}

fn leaf(name: &str) -> MockTree {
    op(name, &[], &[])
}

fn blocks_set(ids: &[BlockId]) -> LinkedHashSet<BlockId> {
    ids.iter().cloned().collect()
}

#[test]
fn test_linear_cfg() {
    options::start_logging_trace();

    // v0 -> v1 -> v2 -> v3
    let cfg = cfg_of(
        "linear",
        vec![
            (0, CFGVertex::Jump(leaf("i0"), CFGLabel(1))),
            (1, CFGVertex::Jump(leaf("i1"), CFGLabel(2))),
            (2, CFGVertex::Jump(leaf("i2"), CFGLabel(3))),
            (3, CFGVertex::Final(leaf("i3"))),
        ],
        0
    );

    let code = linearize(&cfg, &MockCovering).unwrap();

    assert_eq!(code.name, "linear");
    assert_eq!(code.n_blocks(), 4);
    for i in 0..4 {
        let block = &code.blocks[i];
        assert_eq!(block.label.name(), format!("linear.bb{}", i));
        assert_eq!(
            text(block),
            vec![format!("linear.bb{}:", i), format!("i{} [] <- []", i)]
        );
    }

    assert_eq!(code.blocks[0].successors, blocks_set(&[1]));
    assert_eq!(code.blocks[0].predecessors, blocks_set(&[]));
    assert_eq!(code.blocks[1].successors, blocks_set(&[2]));
    assert_eq!(code.blocks[1].predecessors, blocks_set(&[0]));
    assert_eq!(code.blocks[2].successors, blocks_set(&[3]));
    assert_eq!(code.blocks[2].predecessors, blocks_set(&[1]));
    assert_eq!(code.blocks[3].successors, blocks_set(&[]));
    assert_eq!(code.blocks[3].predecessors, blocks_set(&[2]));

    assert_eq!(count_jumps(&code), 0);
}

#[test]
fn test_cycle_cfg() {
    // v0 -> v1 -> v2 -> v0
    let cfg = cfg_of(
        "cycle",
        vec![
            (0, CFGVertex::Jump(leaf("i0"), CFGLabel(1))),
            (1, CFGVertex::Jump(leaf("i1"), CFGLabel(2))),
            (2, CFGVertex::Jump(leaf("i2"), CFGLabel(0))),
        ],
        0
    );

    let code = linearize(&cfg, &MockCovering).unwrap();

    assert_eq!(code.n_blocks(), 3);
    assert_eq!(text(&code.blocks[0]), vec!["cycle.bb0:", "i0 [] <- []"]);
    assert_eq!(text(&code.blocks[1]), vec!["cycle.bb1:", "i1 [] <- []"]);
    assert_eq!(
        text(&code.blocks[2]),
        vec!["cycle.bb2:", "i2 [] <- []", "jmp cycle.bb0"]
    );

    assert_eq!(code.blocks[0].successors, blocks_set(&[1]));
    assert_eq!(code.blocks[0].predecessors, blocks_set(&[2]));
    assert_eq!(code.blocks[2].successors, blocks_set(&[0]));
    assert_eq!(count_jumps(&code), 1);
}

#[test]
fn test_deep_chain_cfg() {
    const N: usize = 100_000;

    // v0 -> v1 -> ... -> v(N-1) -> v0
    let vertices = (0..N)
        .map(|i| (i, CFGVertex::Jump(leaf("i"), CFGLabel((i + 1) % N))))
        .collect();
    let cfg = cfg_of("deep", vertices, 0);

    let code = linearize(&cfg, &MockCovering).unwrap();

    assert_eq!(code.n_blocks(), N);
    for i in 0..N - 1 {
        assert_eq!(code.blocks[i].successors, blocks_set(&[i + 1]));
    }
    assert_eq!(code.blocks[N - 1].successors, blocks_set(&[0]));
    assert_eq!(code.blocks[0].predecessors, blocks_set(&[N - 1]));

    // only the edge closing the loop needs a jump
    assert_eq!(count_jumps(&code), 1);
    assert_eq!(
        text(&code.blocks[N - 1]),
        vec![
            format!("deep.bb{}:", N - 1),
            "i [] <- []".to_string(),
            "jmp deep.bb0".to_string(),
        ]
    );
}

#[test]
fn test_deep_conditional_ladder() {
    const N: usize = 100_000;

    // every vi leaves to the exit vN when true and goes on to v(i+1) when false
    let mut vertices: Vec<(usize, CFGVertex<MockTree>)> = (0..N)
        .map(|i| {
            (
                i,
                CFGVertex::Conditional {
                    tree: leaf("c"),
                    on_true: CFGLabel(N),
                    on_false: CFGLabel(i + 1)
                }
            )
        })
        .collect();
    vertices.push((N, CFGVertex::Final(leaf("exit"))));
    let cfg = cfg_of("ladder", vertices, 0);

    let code = linearize(&cfg, &MockCovering).unwrap();

    assert_eq!(code.n_blocks(), N + 1);
    let exit = format!("jnz ladder.bb{}", N);
    for i in 0..N {
        assert_eq!(
            text(&code.blocks[i]),
            vec![format!("ladder.bb{}:", i), "c [] <- []".to_string(), exit.clone()]
        );
        assert_eq!(code.blocks[i].successors, blocks_set(&[N, i + 1]));
    }
    assert_eq!(
        text(&code.blocks[N]),
        vec![format!("ladder.bb{}:", N), "exit [] <- []".to_string()]
    );
    assert_eq!(code.blocks[N].predecessors.len(), N);
    assert_eq!(count_jumps(&code), 0);
}

#[test]
fn test_all_conditionals() {
    // v0: false -> v1, true -> v2 (both new)
    // v1: false -> v0, true -> v2 (true new, false laid out)
    // v2: false -> v3, true -> v2 (true laid out, false new)
    // v3: false -> v0, true -> v1 (both laid out)
    let cond = |name: &str, on_true: usize, on_false: usize| CFGVertex::Conditional {
        tree: leaf(name),
        on_true: CFGLabel(on_true),
        on_false: CFGLabel(on_false)
    };
    let cfg = cfg_of(
        "cond",
        vec![
            (0, cond("i0", 2, 1)),
            (1, cond("i1", 2, 0)),
            (2, cond("i2", 2, 3)),
            (3, cond("i3", 1, 0)),
        ],
        0
    );

    let code = linearize(&cfg, &MockCovering).unwrap();

    assert_eq!(code.n_blocks(), 4);

    assert_eq!(
        text(&code.blocks[0]),
        vec!["cond.bb0:", "i0 [] <- []", "jnz cond.bb2"]
    );
    assert_eq!(code.blocks[0].successors, blocks_set(&[1, 2]));
    assert_eq!(code.blocks[0].predecessors, blocks_set(&[1, 3]));

    assert_eq!(
        text(&code.blocks[1]),
        vec!["cond.bb1:", "i1 [] <- []", "jz cond.bb0"]
    );
    assert_eq!(code.blocks[1].successors, blocks_set(&[0, 2]));
    assert_eq!(code.blocks[1].predecessors, blocks_set(&[0, 3]));

    assert_eq!(
        text(&code.blocks[2]),
        vec!["cond.bb2:", "i2 [] <- []", "jnz cond.bb2"]
    );
    assert_eq!(code.blocks[2].successors, blocks_set(&[2, 3]));
    assert_eq!(code.blocks[2].predecessors, blocks_set(&[0, 1, 2]));

    assert_eq!(
        text(&code.blocks[3]),
        vec!["cond.bb3:", "i3 [] <- []", "jnz cond.bb1", "jmp cond.bb0"]
    );
    assert_eq!(code.blocks[3].successors, blocks_set(&[0, 1]));
    assert_eq!(code.blocks[3].predecessors, blocks_set(&[2]));

    let jump = as_cond_jump(&*code.blocks[1].instructions[2]).unwrap();
    assert!(!jump.jump_if);
    assert_eq!(jump.label.name(), "cond.bb0");
}

#[test]
fn test_unreachable_vertices_dropped() {
    let cfg = cfg_of(
        "dead",
        vec![
            (0, CFGVertex::Final(leaf("i0"))),
            (1, CFGVertex::Jump(leaf("i1"), CFGLabel(0))),
        ],
        0
    );

    let code = linearize(&cfg, &MockCovering).unwrap();

    assert_eq!(code.n_blocks(), 1);
    assert!(code.blocks[0].successors.is_empty());
}

#[test]
fn test_every_block_starts_with_its_label() {
    let cfg = cfg_of(
        "labels",
        vec![
            (
                0,
                CFGVertex::Conditional {
                    tree: leaf("i0"),
                    on_true: CFGLabel(1),
                    on_false: CFGLabel(2)
                }
            ),
            (1, CFGVertex::Jump(leaf("i1"), CFGLabel(2))),
            (2, CFGVertex::Final(leaf("i2"))),
        ],
        0
    );

    let code = linearize(&cfg, &MockCovering).unwrap();

    for (i, block) in code.blocks.iter().enumerate() {
        assert!(is_label(&*block.instructions[0]));
        assert_eq!(code.find_block(&block.label), Some(i));
        // labels only ever appear first
        assert!(block.instructions[1..].iter().all(|inst| !is_label(&**inst)));
    }
}

#[test]
fn test_dangling_label() {
    let cfg = cfg_of("dangling", vec![(0, CFGVertex::Jump(leaf("i0"), CFGLabel(7)))], 0);

    match linearize(&cfg, &MockCovering) {
        Err(RegAllocError::InvalidInput(_)) => {}
        other => panic!("expected invalid input, got {:?}", other.map(|code| code.to_string()))
    }
}
