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
use compiler::backend::reg_alloc::graph_coloring::{GraphColoring, RegistersInteraction};
use compiler::backend::reg_alloc::validate::validate_allocation;
use error::RegAllocError;
use utils::{vec_utils, LinkedHashMap, LinkedHashSet};

use std::fmt;

/// The outcome of one register allocation attempt.
///
/// `successful` and `spills` partition the register universe; Fixed registers
/// are always successful and mapped to themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisterAllocation {
    pub successful: LinkedHashMap<Register, HardwareRegister>,
    pub spills: LinkedHashSet<Register>
}

impl RegisterAllocation {
    pub fn is_spill_free(&self) -> bool {
        self.spills.is_empty()
    }

    pub fn get(&self, reg: &Register) -> Option<HardwareRegister> {
        self.successful.get(reg).cloned()
    }
}

impl fmt::Display for RegisterAllocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "assigned:")?;
        for (reg, hw) in self.successful.iter() {
            writeln!(f, "  {} -> {}", reg, hw)?;
        }
        let spills: Vec<Register> = self.spills.iter().cloned().collect();
        write!(f, "spilled: [{}]", vec_utils::as_str(&spills))
    }
}

fn check_known(
    interaction: &RegistersInteraction,
    relation: &Relation<Register>,
    name: &str
) -> Result<(), RegAllocError> {
    for (reg, related) in relation.iter() {
        if let Some(unknown) = Some(reg).into_iter().chain(related.iter())
            .find(|r| !interaction.all_registers.contains(*r))
        {
            return Err(RegAllocError::invalid_input(format!(
                "register {} appears in the {} relation but not among all registers",
                unknown,
                name
            )));
        }
    }
    Ok(())
}

/// Assigns hardware registers from `allowed` to the registers of `interaction`
/// with `coloring`. Registers that do not fit are reported as spills.
pub fn allocate_registers(
    interaction: &RegistersInteraction,
    allowed: &[HardwareRegister],
    coloring: &GraphColoring<Register, HardwareRegister>
) -> Result<RegisterAllocation, RegAllocError> {
    check_known(interaction, &interaction.interference, "interference")?;
    check_known(interaction, &interaction.copying, "copying")?;
    if let Some(reg) = find_self_loop(&interaction.interference) {
        return Err(RegAllocError::invalid_input(format!(
            "register {} interferes with itself",
            reg
        )));
    }
    for reg in interaction.all_registers.iter() {
        if let Some(hw) = reg.as_fixed() {
            if !allowed.contains(&hw) {
                return Err(RegAllocError::invalid_input(format!(
                    "fixed register {} is not an allowed register",
                    hw
                )));
            }
        }
    }

    // every register is a vertex, plus one vertex per allowed hardware register;
    // the hardware registers are mutually exclusive
    let mut graph: Relation<Register> = interaction
        .all_registers
        .iter()
        .map(|reg| (*reg, LinkedHashSet::new()))
        .collect();
    for (reg, related) in symmetric_closure(&interaction.interference).iter() {
        for other in related.iter() {
            add_edge(&mut graph, reg, other);
        }
    }
    for (i, a) in allowed.iter().enumerate() {
        let a = Register::Fixed(*a);
        graph.entry(a).or_insert_with(LinkedHashSet::new);
        for b in allowed[i + 1..].iter() {
            add_edge(&mut graph, &a, &Register::Fixed(*b));
        }
    }

    let fixed_colors: LinkedHashMap<Register, HardwareRegister> = graph
        .keys()
        .filter_map(|reg| reg.as_fixed().map(|hw| (*reg, hw)))
        .collect();

    let coloring = coloring.color(&graph, &interaction.copying, &fixed_colors, allowed)?;

    let mut ret = RegisterAllocation {
        successful: LinkedHashMap::new(),
        spills: LinkedHashSet::new()
    };
    for reg in interaction.all_registers.iter() {
        match coloring.get(reg) {
            Some(hw) => {
                ret.successful.insert(*reg, *hw);
            }
            None => {
                ret.spills.insert(*reg);
            }
        }
    }

    debug!(
        "allocated {} registers with {} colors, {} spilled",
        interaction.all_registers.len(),
        allowed.len(),
        ret.spills.len()
    );
    trace!("{}", ret);

    validate_allocation(interaction, &ret, allowed)?;

    Ok(ret)
}
