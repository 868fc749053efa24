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
use compiler::backend::reg_alloc::graph_coloring::closure::*;
use compiler::machine_code::*;
use error::RegAllocError;
use utils::{vec_utils, LinkedHashMap, LinkedHashSet};

use std::fmt;

const TRACE_LIVENESS: bool = false;

/// What register allocation needs to know about the registers of one function.
#[derive(Clone, Debug)]
pub struct RegistersInteraction {
    /// every register read or written, plus the preserved and always live registers
    pub all_registers: LinkedHashSet<Register>,
    /// symmetric; registers that may not share a hardware register
    pub interference: Relation<Register>,
    /// `copying[b]` contains `a` if `a` is a copy of `b` (a coalescing candidate)
    pub copying: Relation<Register>
}

impl RegistersInteraction {
    /// returns true if `a` and `b` interfere
    pub fn interferes(&self, a: &Register, b: &Register) -> bool {
        self.interference.get(a).map_or(false, |set| set.contains(b))
    }

    /// returns the same interaction without copy relations
    pub fn without_copying(&self) -> RegistersInteraction {
        let mut ret = self.clone();
        for copies in ret.copying.iter_mut().map(|(_, copies)| copies) {
            copies.clear();
        }
        ret
    }
}

impl fmt::Display for RegistersInteraction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "registers: {}", self.all_registers.len())?;
        for (reg, set) in self.interference.iter() {
            if !set.is_empty() {
                writeln!(f, "  {} interferes with {:?}", reg, set)?;
            }
        }
        for (reg, set) in self.copying.iter() {
            if !set.is_empty() {
                writeln!(f, "  {} is copied into {:?}", reg, set)?;
            }
        }
        Ok(())
    }
}

/// Live registers per instruction. Instructions are numbered in layout order
/// across all blocks (see `FlatCode`).
pub struct LiveSets {
    pub live_in: Vec<LinkedHashSet<Register>>,
    pub live_out: Vec<LinkedHashSet<Register>>
}

/// The instructions of a fragment flattened into one arena. An instruction is
/// identified by its index here, never by its content.
pub struct FlatCode {
    /// (block, index in block) for every instruction
    pub positions: Vec<(BlockId, usize)>,
    /// registers read, without duplicates
    pub reads: Vec<Vec<Register>>,
    /// registers written, without duplicates
    pub writes: Vec<Vec<Register>>,
    /// instructions that may execute next
    pub succs: Vec<Vec<usize>>,
    /// (destination, source) of copy instructions
    pub copies: Vec<Option<(Register, Register)>>
}

impl FlatCode {
    pub fn new(fragment: &LoweredCFGFragment) -> Result<FlatCode, RegAllocError> {
        // first instruction of every block
        let mut block_start = Vec::with_capacity(fragment.n_blocks());
        let mut n_insts = 0;
        for block in fragment.blocks.iter() {
            if block.is_empty() {
                return Err(RegAllocError::invalid_input(format!(
                    "{}: block {} has no instructions",
                    fragment.name,
                    block.label
                )));
            }
            block_start.push(n_insts);
            n_insts += block.n_insts();
        }

        let mut ret = FlatCode {
            positions: Vec::with_capacity(n_insts),
            reads: Vec::with_capacity(n_insts),
            writes: Vec::with_capacity(n_insts),
            succs: Vec::with_capacity(n_insts),
            copies: Vec::with_capacity(n_insts)
        };

        for (block_id, block) in fragment.blocks.iter().enumerate() {
            let last = block.n_insts() - 1;
            for (i, inst) in block.instructions.iter().enumerate() {
                ret.positions.push((block_id, i));
                ret.reads.push(vec_utils::dedup_stable(&inst.registers_read()));
                ret.writes.push(vec_utils::dedup_stable(&inst.registers_written()));
                ret.copies.push(
                    inst.as_copy()
                        .map(|copy| (copy.copy_into(), copy.copy_from()))
                );

                let succs = if i == last {
                    block.successors.iter().map(|succ| block_start[*succ]).collect()
                } else {
                    vec![block_start[block_id] + i + 1]
                };
                ret.succs.push(succs);
            }
        }

        Ok(ret)
    }

    pub fn n_insts(&self) -> usize {
        self.positions.len()
    }
}

/// computes live-in and live-out for every instruction with a backward fixed point
pub fn build_live_set(code: &FlatCode) -> LiveSets {
    let n_insts = code.n_insts();

    // out[n] starts with def[n] (a value written is live right after the write,
    // so two registers written by one instruction interfere); in[n] with use[n]
    let mut live_out: Vec<LinkedHashSet<Register>> = code.writes
        .iter()
        .map(|defs| defs.iter().cloned().collect())
        .collect();
    let mut live_in: Vec<LinkedHashSet<Register>> = code.reads
        .iter()
        .map(|uses| uses.iter().cloned().collect())
        .collect();

    let mut is_changed = true;
    let mut n_iterations = 0;
    while is_changed {
        is_changed = false;
        n_iterations += 1;

        for n in (0..n_insts).rev() {
            // out[n] += in[s] for every successor s
            for &s in code.succs[n].iter() {
                for reg in live_in[s].iter() {
                    if live_out[n].insert(*reg) {
                        is_changed = true;
                    }
                }
            }

            // in[n] += out[n] - def[n]
            for reg in live_out[n].iter() {
                if !code.writes[n].contains(reg) && live_in[n].insert(*reg) {
                    is_changed = true;
                }
            }
        }
    }

    debug!("liveness: converged after {} iterations", n_iterations);

    if TRACE_LIVENESS {
        for n in 0..n_insts {
            trace!("inst {}: in {:?}, out {:?}", n, live_in[n], live_out[n]);
        }
    }

    LiveSets {
        live_in: live_in,
        live_out: live_out
    }
}

/// Computes the register universe, the interference relation and the copying
/// relation of a linearized function.
///
/// Every virtual register holding a reference is made to interfere with every
/// register in `preserved`. Registers in `always_live` (the stack and frame
/// pointers) are live at every instruction, so they interfere with every other
/// register that is not a copy of them.
pub fn analyze_registers_interaction(
    fragment: &LoweredCFGFragment,
    preserved: &[HardwareRegister],
    always_live: &[HardwareRegister]
) -> Result<RegistersInteraction, RegAllocError> {
    info!("{}: analyzing registers interaction", fragment.name);

    let code = FlatCode::new(fragment)?;
    let live = build_live_set(&code);
    let n_insts = code.n_insts();

    let mut all_registers = LinkedHashSet::new();
    for n in 0..n_insts {
        all_registers.extend(code.reads[n].iter().cloned());
        all_registers.extend(code.writes[n].iter().cloned());
    }
    all_registers.extend(preserved.iter().map(|reg| Register::Fixed(*reg)));
    all_registers.extend(always_live.iter().map(|reg| Register::Fixed(*reg)));

    // instructions defining each register
    let mut definitions: LinkedHashMap<Register, Vec<usize>> = LinkedHashMap::new();
    for n in 0..n_insts {
        for reg in code.writes[n].iter() {
            definitions.entry(*reg).or_insert_with(Vec::new).push(n);
        }
    }

    let mut copying: Relation<Register> = all_registers
        .iter()
        .map(|reg| (*reg, LinkedHashSet::new()))
        .collect();
    for n in 0..n_insts {
        let (into, from) = match code.copies[n] {
            Some(pair) => pair,
            None => continue
        };
        if into == from {
            continue;
        }

        // `into` is only ever defined by this copy
        let single_definition = definitions.get(&into).map_or(false, |defs| defs == &vec![n]);
        // and `from` is not redefined while `into` still holds its old value
        let source_kept = definitions.get(&from).map_or(true, |defs| {
            defs.iter().all(|&def| def == n || !live.live_out[def].contains(&into))
        });

        if single_definition && source_kept {
            trace_if!(TRACE_LIVENESS, "{} is a copy of {}", into, from);
            copying.entry(from).or_insert_with(LinkedHashSet::new).insert(into);
        }
    }

    let mut interference: Relation<Register> = all_registers
        .iter()
        .map(|reg| (*reg, LinkedHashSet::new()))
        .collect();
    for n in 0..n_insts {
        for a in live.live_out[n].iter() {
            for b in code.writes[n].iter() {
                if a != b && !related_either_way(&copying, a, b) {
                    add_edge(&mut interference, a, b);
                }
            }
        }
    }

    // references may not be kept in preserved registers
    for reg in all_registers.iter() {
        if reg.holds_reference() {
            for preserved_reg in preserved.iter() {
                add_edge(&mut interference, reg, &Register::Fixed(*preserved_reg));
            }
        }
    }

    for live_reg in always_live.iter().map(|reg| Register::Fixed(*reg)) {
        for reg in all_registers.iter() {
            if *reg != live_reg && !related_either_way(&copying, reg, &live_reg) {
                add_edge(&mut interference, reg, &live_reg);
            }
        }
    }

    let ret = RegistersInteraction {
        all_registers: all_registers,
        interference: interference,
        copying: copying
    };
    debug!("{}: {}", fragment.name, ret);

    Ok(ret)
}
