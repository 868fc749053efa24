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

//! The boundary to instruction selection.
//!
//! Instruction selection ("covering") turns computation trees into machine
//! instructions. The pipeline never looks inside a tree; it only asks the
//! covering to produce instructions for it.

use ast::inst::Instruction;
use ast::ir::*;
use compiler::frame::FrameSlot;

use std::fmt;

/// A move between a register and a spill slot, built by spill handling and
/// handed to instruction selection as a tree.
#[derive(Clone, Debug, PartialEq)]
pub enum SpillTransfer {
    /// `register <- [slot]`
    Load { register: Register, slot: FrameSlot },
    /// `[slot] <- register`
    Store { slot: FrameSlot, register: Register }
}

impl SpillTransfer {
    pub fn register(&self) -> Register {
        match *self {
            SpillTransfer::Load { register, .. } | SpillTransfer::Store { register, .. } => register
        }
    }

    pub fn slot(&self) -> &FrameSlot {
        match *self {
            SpillTransfer::Load { ref slot, .. } | SpillTransfer::Store { ref slot, .. } => slot
        }
    }
}

impl fmt::Display for SpillTransfer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SpillTransfer::Load { register, ref slot } => write!(f, "{} <- [{}]", register, slot),
            SpillTransfer::Store { ref slot, register } => write!(f, "[{}] <- {}", slot, register)
        }
    }
}

/// Instruction selection as used by linearization and spill handling.
pub trait InstructionCovering {
    /// computation tree type; spill loads and stores must be expressible as trees
    type Tree: From<SpillTransfer>;

    /// covers a tree whose value (if any) is not used for control flow
    fn cover_with_instructions(&self, tree: &Self::Tree) -> Vec<Box<Instruction>>;

    /// covers a boolean tree and jumps to `label` when its value equals `jump_if`
    fn cover_with_instructions_and_jump(
        &self,
        tree: &Self::Tree,
        label: &BlockLabel,
        jump_if: bool
    ) -> Vec<Box<Instruction>>;

    /// covers a tree without introducing temporary registers
    /// (used for spill loads and stores, which may not need further spilling)
    fn cover_with_instructions_without_temporary_registers(
        &self,
        tree: &Self::Tree
    ) -> Vec<Box<Instruction>>;
}
