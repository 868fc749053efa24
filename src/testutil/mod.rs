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

//! Test doubles for the collaborators of the pipeline: a tree type and an
//! instruction selection that maps every tree to one mock instruction, plus
//! builders for CFGs and linearized fragments.

use ast::cfg::*;
use ast::inst::*;
use ast::ir::*;
use compiler::backend::inst_sel::{InstructionCovering, SpillTransfer};
use compiler::backend::reg_alloc::graph_coloring::{GraphColoring, Relation};
use compiler::machine_code::*;
use error::RegAllocError;
use utils::{vec_utils, LinkedHashMap};

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;

/// a computation tree as seen by the mock instruction selection
#[derive(Clone, Debug, PartialEq)]
pub enum MockTree {
    Op {
        name: String,
        read: Vec<Register>,
        written: Vec<Register>
    },
    Copy {
        into: Register,
        from: Register
    },
    Spill(SpillTransfer)
}

impl From<SpillTransfer> for MockTree {
    fn from(transfer: SpillTransfer) -> MockTree {
        MockTree::Spill(transfer)
    }
}

pub fn op(name: &str, read: &[Register], written: &[Register]) -> MockTree {
    MockTree::Op {
        name: name.to_string(),
        read: read.to_vec(),
        written: written.to_vec()
    }
}

pub fn copy(into: Register, from: Register) -> MockTree {
    MockTree::Copy {
        into: into,
        from: from
    }
}

fn substitute_all(regs: &[Register], map: &LinkedHashMap<Register, Register>) -> Vec<Register> {
    regs.iter().map(|reg| substitute(*reg, map)).collect()
}

/// an instruction with arbitrary register operands
#[derive(Clone, Debug, PartialEq)]
pub struct MockInstruction {
    pub name: String,
    pub read: Vec<Register>,
    pub written: Vec<Register>
}

impl Instruction for MockInstruction {
    fn registers_read(&self) -> Vec<Register> {
        self.read.clone()
    }

    fn registers_written(&self) -> Vec<Register> {
        self.written.clone()
    }

    fn substitute_registers(&self, map: &LinkedHashMap<Register, Register>) -> Box<Instruction> {
        Box::new(MockInstruction {
            name: self.name.clone(),
            read: substitute_all(&self.read, map),
            written: substitute_all(&self.written, map)
        })
    }

    fn as_any(&self) -> &Any {
        self
    }
}

impl fmt::Display for MockInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} [{}] <- [{}]",
            self.name,
            vec_utils::as_str(&self.written),
            vec_utils::as_str(&self.read)
        )
    }
}

/// `into <- from`
#[derive(Clone, Debug, PartialEq)]
pub struct MockCopy {
    pub into: Register,
    pub from: Register
}

impl Instruction for MockCopy {
    fn registers_read(&self) -> Vec<Register> {
        vec![self.from]
    }

    fn registers_written(&self) -> Vec<Register> {
        vec![self.into]
    }

    fn as_copy(&self) -> Option<&CopyInstruction> {
        Some(self)
    }

    fn substitute_registers(&self, map: &LinkedHashMap<Register, Register>) -> Box<Instruction> {
        Box::new(MockCopy {
            into: substitute(self.into, map),
            from: substitute(self.from, map)
        })
    }

    fn as_any(&self) -> &Any {
        self
    }
}

impl CopyInstruction for MockCopy {
    fn copy_into(&self) -> Register {
        self.into
    }

    fn copy_from(&self) -> Register {
        self.from
    }
}

impl fmt::Display for MockCopy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "mov {} <- {}", self.into, self.from)
    }
}

/// jumps to `label` if the last computed condition equals `jump_if`
#[derive(Clone, Debug, PartialEq)]
pub struct MockCondJump {
    pub label: BlockLabel,
    pub jump_if: bool
}

impl Instruction for MockCondJump {
    fn registers_read(&self) -> Vec<Register> {
        vec![]
    }

    fn registers_written(&self) -> Vec<Register> {
        vec![]
    }

    fn substitute_registers(&self, _: &LinkedHashMap<Register, Register>) -> Box<Instruction> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &Any {
        self
    }
}

impl fmt::Display for MockCondJump {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.jump_if {
            write!(f, "jnz {}", self.label)
        } else {
            write!(f, "jz {}", self.label)
        }
    }
}

/// a spill load or store
#[derive(Clone, Debug, PartialEq)]
pub struct MockSpillInstruction(pub SpillTransfer);

impl Instruction for MockSpillInstruction {
    fn registers_read(&self) -> Vec<Register> {
        match self.0 {
            SpillTransfer::Load { .. } => vec![],
            SpillTransfer::Store { register, .. } => vec![register]
        }
    }

    fn registers_written(&self) -> Vec<Register> {
        match self.0 {
            SpillTransfer::Load { register, .. } => vec![register],
            SpillTransfer::Store { .. } => vec![]
        }
    }

    fn substitute_registers(&self, map: &LinkedHashMap<Register, Register>) -> Box<Instruction> {
        let transfer = match self.0 {
            SpillTransfer::Load { register, ref slot } => SpillTransfer::Load {
                register: substitute(register, map),
                slot: slot.clone()
            },
            SpillTransfer::Store { ref slot, register } => SpillTransfer::Store {
                slot: slot.clone(),
                register: substitute(register, map)
            }
        };
        Box::new(MockSpillInstruction(transfer))
    }

    fn as_any(&self) -> &Any {
        self
    }
}

impl fmt::Display for MockSpillInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "spill {}", self.0)
    }
}

/// instruction selection producing exactly one mock instruction per tree
/// (plus a `MockCondJump` when asked to jump)
#[derive(Copy, Clone, Debug, Default)]
pub struct MockCovering;

impl MockCovering {
    fn cover(&self, tree: &MockTree) -> Box<Instruction> {
        match *tree {
            MockTree::Op {
                ref name,
                ref read,
                ref written
            } => Box::new(MockInstruction {
                name: name.clone(),
                read: read.clone(),
                written: written.clone()
            }),
            MockTree::Copy { into, from } => Box::new(MockCopy {
                into: into,
                from: from
            }),
            MockTree::Spill(ref transfer) => Box::new(MockSpillInstruction(transfer.clone()))
        }
    }
}

impl InstructionCovering for MockCovering {
    type Tree = MockTree;

    fn cover_with_instructions(&self, tree: &MockTree) -> Vec<Box<Instruction>> {
        vec![self.cover(tree)]
    }

    fn cover_with_instructions_and_jump(
        &self,
        tree: &MockTree,
        label: &BlockLabel,
        jump_if: bool
    ) -> Vec<Box<Instruction>> {
        vec![
            self.cover(tree),
            Box::new(MockCondJump {
                label: label.clone(),
                jump_if: jump_if
            }),
        ]
    }

    fn cover_with_instructions_without_temporary_registers(
        &self,
        tree: &MockTree
    ) -> Vec<Box<Instruction>> {
        vec![self.cover(tree)]
    }
}

/// a mock instruction reading `read` and writing `written`
pub fn inst(read: &[Register], written: &[Register]) -> Box<Instruction> {
    Box::new(MockInstruction {
        name: "op".to_string(),
        read: read.to_vec(),
        written: written.to_vec()
    })
}

/// a mock copy `into <- from`
pub fn copy_inst(into: Register, from: Register) -> Box<Instruction> {
    Box::new(MockCopy {
        into: into,
        from: from
    })
}

pub fn as_mock(inst: &Instruction) -> Option<&MockInstruction> {
    inst.as_any().downcast_ref::<MockInstruction>()
}

pub fn as_spill(inst: &Instruction) -> Option<&SpillTransfer> {
    inst.as_any()
        .downcast_ref::<MockSpillInstruction>()
        .map(|spill| &spill.0)
}

pub fn as_cond_jump(inst: &Instruction) -> Option<&MockCondJump> {
    inst.as_any().downcast_ref::<MockCondJump>()
}

/// number of unconditional jumps in the fragment
pub fn count_jumps(fragment: &LoweredCFGFragment) -> usize {
    fragment.instructions().filter(|inst| as_jump(*inst).is_some()).count()
}

/// builds a fragment from instruction lists, with block `i` labelled `bb<i>`,
/// and the given control flow edges
pub fn fragment_of(blocks: Vec<Vec<Box<Instruction>>>, edges: &[(BlockId, BlockId)]) -> LoweredCFGFragment {
    let blocks = blocks
        .into_iter()
        .enumerate()
        .map(|(i, insts)| {
            let mut block = BasicBlock::new(BlockLabel(format!("bb{}", i)));
            block.instructions = insts;
            block
        })
        .collect();
    let mut ret = LoweredCFGFragment::new("test", blocks);
    for &(from, to) in edges.iter() {
        ret.add_edge(from, to);
    }
    ret
}

/// builds a CFG from `(label, vertex)` pairs
pub fn cfg_of(name: &str, vertices: Vec<(usize, CFGVertex<MockTree>)>, initial: usize) -> CFGFragment<MockTree> {
    let vertices = vertices
        .into_iter()
        .map(|(label, vertex)| (CFGLabel(label), vertex))
        .collect();
    CFGFragment::new(name, vertices, CFGLabel(initial))
}

/// one call made to a `RecordingColoring`
#[derive(Clone, Debug)]
pub struct ColoringCall<V: Hash + Eq, C> {
    pub graph: Relation<V>,
    pub coalesce: Relation<V>,
    pub fixed_colors: LinkedHashMap<V, C>,
    pub allowed_colors: Vec<C>
}

/// a graph coloring that records its input and answers with `answer`
pub struct RecordingColoring<V: Hash + Eq, C> {
    pub calls: RefCell<Vec<ColoringCall<V, C>>>,
    pub answer: LinkedHashMap<V, C>
}

impl<V: Hash + Eq, C> RecordingColoring<V, C> {
    pub fn new(answer: LinkedHashMap<V, C>) -> RecordingColoring<V, C> {
        RecordingColoring {
            calls: RefCell::new(vec![]),
            answer: answer
        }
    }
}

impl<V, C> GraphColoring<V, C> for RecordingColoring<V, C>
where
    V: Clone + Eq + Hash,
    C: Clone
{
    fn color(
        &self,
        graph: &Relation<V>,
        coalesce: &Relation<V>,
        fixed_colors: &LinkedHashMap<V, C>,
        allowed_colors: &[C]
    ) -> Result<LinkedHashMap<V, C>, RegAllocError> {
        self.calls.borrow_mut().push(ColoringCall {
            graph: graph.clone(),
            coalesce: coalesce.clone(),
            fixed_colors: fixed_colors.clone(),
            allowed_colors: allowed_colors.to_vec()
        });
        Ok(self.answer.clone())
    }
}
