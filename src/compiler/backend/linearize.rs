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

use ast::cfg::*;
use ast::inst::{Jmp, LocalLabel};
use ast::ir::*;
use compiler::backend::inst_sel::InstructionCovering;
use compiler::machine_code::*;
use error::RegAllocError;

use std::collections::HashMap;

/// Lays out the vertices of `cfg` as basic blocks in depth first order.
///
/// A block is followed by the blocks of its destination where possible, so
/// that control falls through instead of jumping. Explicit jumps are only
/// emitted to blocks that were laid out already.
///
/// The walk keeps its own stack of pending vertices, so the depth of the
/// graph does not bound the size of functions that can be linearized.
pub fn linearize<C: InstructionCovering>(
    cfg: &CFGFragment<C::Tree>,
    covering: &C
) -> Result<LoweredCFGFragment, RegAllocError> {
    info!("{}: linearizing {} vertices", cfg.name, cfg.vertices.len());

    let mut linearizer = Linearizer {
        cfg: cfg,
        covering: covering,
        fragment: LoweredCFGFragment::new(&cfg.name, Vec::with_capacity(cfg.vertices.len())),
        visited: HashMap::new()
    };
    linearizer.dfs()?;

    let ret = linearizer.fragment;
    debug!("{}", ret);
    Ok(ret)
}

/// destinations of a vertex in the order they are laid out
fn destinations<T>(vertex: &CFGVertex<T>) -> Vec<CFGLabel> {
    match *vertex {
        CFGVertex::Final(_) => vec![],
        CFGVertex::Jump(_, dest) => vec![dest],
        // the false branch is laid out first so that it can fall through
        CFGVertex::Conditional { on_true, on_false, .. } => vec![on_false, on_true]
    }
}

/// a vertex whose block exists but whose destinations are still being laid out
struct Pending<'a, T: 'a> {
    cur: CFGLabel,
    block: BlockId,
    vertex: &'a CFGVertex<T>,
    destinations: Vec<CFGLabel>,
    /// blocks of the destinations handled so far, and whether each existed before
    resolved: Vec<(BlockId, bool)>
}

impl<'a, T: 'a> Pending<'a, T> {
    fn next_destination(&self) -> Option<CFGLabel> {
        self.destinations.get(self.resolved.len()).cloned()
    }
}

struct Linearizer<'a, C: 'a + InstructionCovering>
where
    C::Tree: 'a
{
    cfg: &'a CFGFragment<C::Tree>,
    covering: &'a C,
    fragment: LoweredCFGFragment,
    /// vertices that already have a block (marked before their successors are visited)
    visited: HashMap<CFGLabel, BlockId>
}

impl<'a, C: 'a + InstructionCovering> Linearizer<'a, C>
where
    C::Tree: 'a
{
    fn label_of(&self, block: BlockId) -> BlockLabel {
        self.fragment.blocks[block].label.clone()
    }

    fn dfs(&mut self) -> Result<(), RegAllocError> {
        let initial = self.cfg.initial_label;
        let mut stack = vec![self.enter(initial)?];

        loop {
            let next = match stack.last() {
                Some(pending) => pending.next_destination(),
                None => break
            };

            match next {
                Some(dest) => match self.visited.get(&dest).cloned() {
                    Some(block) => {
                        if let Some(pending) = stack.last_mut() {
                            pending.resolved.push((block, true));
                        }
                    }
                    None => {
                        let pending = self.enter(dest)?;
                        stack.push(pending);
                    }
                },
                None => {
                    if let Some(pending) = stack.pop() {
                        let block = self.finish(pending);
                        if let Some(parent) = stack.last_mut() {
                            parent.resolved.push((block, false));
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// creates the block of `cur` and marks it visited
    fn enter(&mut self, cur: CFGLabel) -> Result<Pending<'a, C::Tree>, RegAllocError> {
        let cfg = self.cfg;
        let covering = self.covering;

        let vertex = match cfg.get_vertex(cur) {
            Some(vertex) => vertex,
            None => {
                return Err(RegAllocError::invalid_input(format!(
                    "{}: no vertex labelled {}",
                    cfg.name,
                    cur
                )))
            }
        };

        let id = self.fragment.n_blocks();
        let label = BlockLabel(format!("{}.bb{}", cfg.name, id));
        trace!("dfs visiting {} as block {}", cur, label);

        let mut block = BasicBlock::new(label.clone());
        block.instructions.push(Box::new(LocalLabel(label)));
        match *vertex {
            CFGVertex::Final(ref tree) | CFGVertex::Jump(ref tree, _) => {
                block.instructions.extend(covering.cover_with_instructions(tree));
            }
            // covered once both destinations have blocks
            CFGVertex::Conditional { .. } => {}
        }
        self.fragment.blocks.push(block);
        self.visited.insert(cur, id);

        Ok(Pending {
            cur: cur,
            block: id,
            vertex: vertex,
            destinations: destinations(vertex),
            resolved: vec![]
        })
    }

    /// emits the jumps and edges of a vertex whose destinations all have blocks
    fn finish(&mut self, pending: Pending<'a, C::Tree>) -> BlockId {
        let covering = self.covering;
        let id = pending.block;
        let cur = pending.cur;

        match *pending.vertex {
            CFGVertex::Final(_) => {}
            CFGVertex::Jump(_, dest) => {
                let (dest_id, existed) = pending.resolved[0];
                if existed {
                    trace!("{} -> {}: explicit jump", cur, dest);
                    let dest_label = self.label_of(dest_id);
                    self.fragment.blocks[id].instructions.push(Box::new(Jmp(dest_label)));
                } else {
                    trace!("{} -> {}: fall through", cur, dest);
                }
                self.fragment.add_edge(id, dest_id);
            }
            CFGVertex::Conditional {
                ref tree,
                on_true,
                on_false
            } => {
                let (false_id, false_existed) = pending.resolved[0];
                let (true_id, true_existed) = pending.resolved[1];
                let true_label = self.label_of(true_id);
                let false_label = self.label_of(false_id);

                let insts = if false_existed && true_existed {
                    trace!("{}: both destinations laid out, two jumps", cur);
                    let mut insts = covering.cover_with_instructions_and_jump(tree, &true_label, true);
                    insts.push(Box::new(Jmp(false_label)));
                    insts
                } else if false_existed {
                    trace!("{}: jump to {} if false", cur, on_false);
                    covering.cover_with_instructions_and_jump(tree, &false_label, false)
                } else {
                    trace!("{}: jump to {} if true", cur, on_true);
                    covering.cover_with_instructions_and_jump(tree, &true_label, true)
                };
                self.fragment.blocks[id].instructions.extend(insts);

                self.fragment.add_edge(id, true_id);
                self.fragment.add_edge(id, false_id);
            }
        }

        id
    }
}
