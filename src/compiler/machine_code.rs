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

use ast::inst::{is_label, Instruction};
use ast::ir::*;
use utils::LinkedHashSet;

use std::fmt;

/// index of a basic block in its `LoweredCFGFragment`
pub type BlockId = usize;

/// BasicBlock is a labelled, straight line sequence of machine instructions.
/// Control flow edges are stored as `BlockId`s into the owning fragment.
pub struct BasicBlock {
    /// block label (the first instruction of a linearized block is its `LocalLabel`)
    pub label: BlockLabel,
    /// instructions in program order
    pub instructions: Vec<Box<Instruction>>,
    /// blocks control may flow to after this block
    pub successors: LinkedHashSet<BlockId>,
    /// blocks control may flow from into this block
    pub predecessors: LinkedHashSet<BlockId>
}

impl BasicBlock {
    pub fn new(label: BlockLabel) -> BasicBlock {
        BasicBlock {
            label: label,
            instructions: vec![],
            successors: LinkedHashSet::new(),
            predecessors: LinkedHashSet::new()
        }
    }

    pub fn n_insts(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Debug for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "BasicBlock({}, {} insts, succs: {:?}, preds: {:?})",
            self.label,
            self.instructions.len(),
            self.successors,
            self.predecessors
        )
    }
}

/// The linearized machine code of one function: blocks in layout order.
/// Block 0 is the entry block.
pub struct LoweredCFGFragment {
    pub name: MuName,
    pub blocks: Vec<BasicBlock>
}

impl LoweredCFGFragment {
    pub fn new(name: &str, blocks: Vec<BasicBlock>) -> LoweredCFGFragment {
        LoweredCFGFragment {
            name: name.to_string(),
            blocks: blocks
        }
    }

    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// iterates all instructions in layout order
    pub fn instructions<'a>(&'a self) -> Box<Iterator<Item = &'a Instruction> + 'a> {
        Box::new(
            self.blocks
                .iter()
                .flat_map(|block| block.instructions.iter().map(|inst| &**inst))
        )
    }

    /// finds the block with the given label
    pub fn find_block(&self, label: &BlockLabel) -> Option<BlockId> {
        self.blocks.iter().position(|block| &block.label == label)
    }

    /// adds a control flow edge, keeping successors and predecessors in sync
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from].successors.insert(to);
        self.blocks[to].predecessors.insert(from);
    }
}

impl fmt::Display for LoweredCFGFragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} {{", self.name)?;
        for block in self.blocks.iter() {
            for inst in block.instructions.iter() {
                if is_label(&**inst) {
                    writeln!(f, "  {}", inst)?;
                } else {
                    writeln!(f, "    {}", inst)?;
                }
            }
        }
        write!(f, "}}")
    }
}
