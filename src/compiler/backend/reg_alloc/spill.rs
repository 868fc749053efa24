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

use ast::inst::Instruction;
use ast::ir::*;
use compiler::backend::inst_sel::{InstructionCovering, SpillTransfer};
use compiler::backend::reg_alloc::allocator::RegisterAllocation;
use compiler::backend::reg_alloc::graph_coloring::closure::*;
use compiler::backend::reg_alloc::graph_coloring::{GraphColoring, RegistersInteraction};
use compiler::frame::{FrameAllocator, FrameSlot};
use compiler::machine_code::*;
use error::RegAllocError;
use utils::{vec_utils, LinkedHashMap, LinkedHashSet};

const TRACE_SPILL: bool = true;

/// The code after spill rewriting, with the slot chosen for each spilled register.
pub struct SpillRewrite {
    pub fragment: LoweredCFGFragment,
    pub slots: LinkedHashMap<Register, FrameSlot>
}

/// Moves the spilled registers of `allocation` to stack slots.
///
/// Spilled registers that never interfere share a slot (chosen with `coloring`).
/// Every instruction touching a spilled register gets a load from its slot
/// before it for each spilled register it reads and a store after it for each
/// one it writes; the instruction itself uses one of `backups` instead.
pub fn handle_spills<C: InstructionCovering>(
    covering: &C,
    frame: &mut FrameAllocator,
    fragment: LoweredCFGFragment,
    interaction: &RegistersInteraction,
    allocation: &RegisterAllocation,
    backups: &[HardwareRegister],
    coloring: &GraphColoring<VirtualRegister, usize>
) -> Result<SpillRewrite, RegAllocError> {
    for (reg, hw) in allocation.successful.iter() {
        if !reg.is_fixed() && backups.contains(hw) {
            return Err(RegAllocError::spill_handling(format!(
                "backup register {} is assigned to {}",
                hw,
                reg
            )));
        }
    }

    let mut spilled: LinkedHashSet<VirtualRegister> = LinkedHashSet::new();
    for reg in allocation.spills.iter() {
        match *reg {
            Register::Fixed(hw) => {
                return Err(RegAllocError::spill_handling(format!(
                    "fixed register {} cannot be spilled",
                    hw
                )))
            }
            Register::Virtual(vreg) => {
                spilled.insert(vreg);
            }
        }
    }

    if spilled.is_empty() {
        return Ok(SpillRewrite {
            fragment: fragment,
            slots: LinkedHashMap::new()
        });
    }

    warn!(
        "{}: spilling {} registers",
        fragment.name,
        spilled.len()
    );

    let slots = assign_slots(frame, interaction, &spilled, coloring)?;
    let rewriter = SpillRewriter {
        covering: covering,
        slots: &slots,
        backups: backups
    };
    let fragment = rewriter.rewrite_fragment(fragment)?;

    Ok(SpillRewrite {
        fragment: fragment,
        slots: slots
    })
}

/// restricts `relation` to spilled virtual registers
fn restrict_to_spills(
    relation: &Relation<Register>,
    spilled: &LinkedHashSet<VirtualRegister>
) -> Relation<VirtualRegister> {
    let mut ret: Relation<VirtualRegister> = spilled
        .iter()
        .map(|reg| (*reg, LinkedHashSet::new()))
        .collect();
    for (reg, related) in relation.iter() {
        let reg = match reg.as_virtual() {
            Some(vreg) if spilled.contains(&vreg) => vreg,
            _ => continue
        };
        for other in related.iter() {
            if let Some(other) = other.as_virtual() {
                if spilled.contains(&other) {
                    ret.entry(reg).or_insert_with(LinkedHashSet::new).insert(other);
                }
            }
        }
    }
    ret
}

/// packs spilled registers into as few frame slots as the heuristic finds
fn assign_slots(
    frame: &mut FrameAllocator,
    interaction: &RegistersInteraction,
    spilled: &LinkedHashSet<VirtualRegister>,
    coloring: &GraphColoring<VirtualRegister, usize>
) -> Result<LinkedHashMap<Register, FrameSlot>, RegAllocError> {
    let mut interference = restrict_to_spills(&interaction.interference, spilled);
    let copying = restrict_to_spills(&interaction.copying, spilled);

    // references and other values live in differently scanned slots
    let spilled_vec: Vec<VirtualRegister> = spilled.iter().cloned().collect();
    for (i, a) in spilled_vec.iter().enumerate() {
        for b in spilled_vec[i + 1..].iter() {
            if a.holds_reference() != b.holds_reference() {
                add_edge(&mut interference, a, b);
            }
        }
    }

    // one color per spill is always enough
    let colors: Vec<usize> = (0..spilled.len()).collect();
    let slot_colors = coloring.color(&interference, &copying, &LinkedHashMap::new(), &colors)?;

    let mut color_kinds: LinkedHashMap<usize, bool> = LinkedHashMap::new();
    for reg in spilled.iter() {
        let color = match slot_colors.get(reg) {
            Some(color) => *color,
            None => {
                return Err(RegAllocError::spill_handling(format!(
                    "no stack slot chosen for spilled register {}",
                    reg
                )))
            }
        };
        match color_kinds.get(&color).cloned() {
            Some(kind) if kind != reg.holds_reference() => {
                return Err(RegAllocError::spill_handling(format!(
                    "stack slot {} would hold references and non-references",
                    color
                )))
            }
            Some(_) => {}
            None => {
                color_kinds.insert(color, reg.holds_reference());
            }
        }
    }

    let mut color_slots: LinkedHashMap<usize, FrameSlot> = LinkedHashMap::new();
    for (color, holds_reference) in color_kinds.iter() {
        color_slots.insert(*color, frame.allocate_frame_variable(*holds_reference));
    }

    let mut ret = LinkedHashMap::new();
    for reg in spilled.iter() {
        let slot = color_slots[&slot_colors[reg]].clone();
        trace_if!(TRACE_SPILL, "{} is spilled to {}", reg, slot);
        ret.insert(Register::Virtual(*reg), slot);
    }

    debug!(
        "{} spilled registers share {} stack slots",
        spilled.len(),
        color_slots.len()
    );

    Ok(ret)
}

struct SpillRewriter<'a, C: 'a> {
    covering: &'a C,
    slots: &'a LinkedHashMap<Register, FrameSlot>,
    backups: &'a [HardwareRegister]
}

impl<'a, C: InstructionCovering> SpillRewriter<'a, C> {
    fn is_spilled(&self, reg: &Register) -> bool {
        self.slots.contains_key(reg)
    }

    fn touches_spill(&self, inst: &Instruction) -> bool {
        inst.registers_read()
            .iter()
            .chain(inst.registers_written().iter())
            .any(|reg| self.is_spilled(reg))
    }

    fn rewrite_fragment(&self, fragment: LoweredCFGFragment) -> Result<LoweredCFGFragment, RegAllocError> {
        let LoweredCFGFragment { name, blocks } = fragment;

        let mut new_blocks = Vec::with_capacity(blocks.len());
        for block in blocks {
            if !block.instructions.iter().any(|inst| self.touches_spill(&**inst)) {
                new_blocks.push(block);
                continue;
            }

            trace_if!(TRACE_SPILL, "rewriting block {}", block.label);

            let BasicBlock {
                label,
                instructions,
                successors,
                predecessors
            } = block;

            let mut new_insts = Vec::with_capacity(instructions.len());
            for inst in instructions {
                self.rewrite_instruction(inst, &mut new_insts)?;
            }

            new_blocks.push(BasicBlock {
                label: label,
                instructions: new_insts,
                successors: successors,
                predecessors: predecessors
            });
        }

        Ok(LoweredCFGFragment {
            name: name,
            blocks: new_blocks
        })
    }

    fn rewrite_instruction(
        &self,
        inst: Box<Instruction>,
        out: &mut Vec<Box<Instruction>>
    ) -> Result<(), RegAllocError> {
        let read = inst.registers_read();
        let written = inst.registers_written();

        let spilled_reads: Vec<Register> = vec_utils::dedup_stable(&read)
            .into_iter()
            .filter(|reg| self.is_spilled(reg))
            .collect();
        let spilled_writes: Vec<Register> = vec_utils::dedup_stable(&written)
            .into_iter()
            .filter(|reg| self.is_spilled(reg))
            .collect();

        if spilled_reads.is_empty() && spilled_writes.is_empty() {
            out.push(inst);
            return Ok(());
        }

        // a copy between registers sharing a slot does nothing
        if let Some((into, from)) = inst.as_copy().map(|copy| (copy.copy_into(), copy.copy_from())) {
            if self.is_spilled(&into) && self.is_spilled(&from) && self.slots[&into] == self.slots[&from] {
                trace_if!(TRACE_SPILL, "removing redundant copy {}", inst);
                return Ok(());
            }
        }

        let mut used = spilled_reads.clone();
        for reg in spilled_writes.iter() {
            vec_utils::add_unique(&mut used, *reg);
        }

        // backups the instruction does not already use itself
        let available: Vec<HardwareRegister> = self.backups
            .iter()
            .filter(|hw| {
                let reg = Register::Fixed(**hw);
                !read.contains(&reg) && !written.contains(&reg)
            })
            .cloned()
            .collect();

        if used.len() > available.len() {
            return Err(RegAllocError::spill_handling(format!(
                "'{}' uses {} spilled registers but only {} backup registers are free",
                inst,
                used.len(),
                available.len()
            )));
        }

        let substitution: LinkedHashMap<Register, Register> = used
            .iter()
            .zip(available.iter())
            .map(|(reg, hw)| (*reg, Register::Fixed(*hw)))
            .collect();

        for reg in spilled_reads.iter() {
            let load = SpillTransfer::Load {
                register: substitution[reg],
                slot: self.slots[reg].clone()
            };
            trace_if!(TRACE_SPILL, "before '{}': {}", inst, load);
            let tree: C::Tree = load.into();
            out.extend(self.covering.cover_with_instructions_without_temporary_registers(&tree));
        }

        let new_inst = inst.substitute_registers(&substitution);
        trace_if!(TRACE_SPILL, "'{}' rewritten as '{}'", inst, new_inst);
        out.push(new_inst);

        for reg in spilled_writes.iter() {
            let store = SpillTransfer::Store {
                slot: self.slots[reg].clone(),
                register: substitution[reg]
            };
            trace_if!(TRACE_SPILL, "after '{}': {}", inst, store);
            let tree: C::Tree = store.into();
            out.extend(self.covering.cover_with_instructions_without_temporary_registers(&tree));
        }

        Ok(())
    }
}
