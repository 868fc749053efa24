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

use ast::ir::*;
use utils::LinkedHashMap;

use std::any::Any;
use std::fmt;

/// An instruction produced by instruction selection.
///
/// The allocator only looks at the registers an instruction reads and writes.
/// Instructions are identified by position (block and index), never by
/// structural equality: two identical looking instructions at different
/// program points are different instructions.
pub trait Instruction: fmt::Display {
    /// registers read by this instruction (duplicates are ignored)
    fn registers_read(&self) -> Vec<Register>;

    /// registers written by this instruction (duplicates are ignored)
    fn registers_written(&self) -> Vec<Register>;

    /// returns the copy view if this instruction is a register to register copy
    fn as_copy(&self) -> Option<&CopyInstruction> {
        None
    }

    /// returns a new instruction with every register found in `map` replaced.
    /// Registers not in the map stay as they are
    fn substitute_registers(&self, map: &LinkedHashMap<Register, Register>) -> Box<Instruction>;

    fn as_any(&self) -> &Any;
}

/// A register to register move. Copies are coalescing candidates.
pub trait CopyInstruction: Instruction {
    fn copy_into(&self) -> Register;
    fn copy_from(&self) -> Register;
}

/// substitutes a single register (used by `substitute_registers` implementations)
pub fn substitute(reg: Register, map: &LinkedHashMap<Register, Register>) -> Register {
    match map.get(&reg) {
        Some(new_reg) => *new_reg,
        None => reg
    }
}

/// Pseudo instruction marking the start of a basic block.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalLabel(pub BlockLabel);

impl Instruction for LocalLabel {
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

impl fmt::Display for LocalLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.0)
    }
}

/// Unconditional jump to a block label.
#[derive(Clone, Debug, PartialEq)]
pub struct Jmp(pub BlockLabel);

impl Instruction for Jmp {
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

impl fmt::Display for Jmp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "jmp {}", self.0)
    }
}

/// returns true if the instruction is a `LocalLabel`
pub fn is_label(inst: &Instruction) -> bool {
    inst.as_any().downcast_ref::<LocalLabel>().is_some()
}

/// returns the target if the instruction is an unconditional `Jmp`
pub fn as_jump(inst: &Instruction) -> Option<&BlockLabel> {
    inst.as_any().downcast_ref::<Jmp>().map(|jmp| &jmp.0)
}
