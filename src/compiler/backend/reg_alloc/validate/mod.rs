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
use compiler::backend::reg_alloc::allocator::RegisterAllocation;
use compiler::backend::reg_alloc::graph_coloring::RegistersInteraction;
use error::RegAllocError;

/// Checks an allocation against the registers it was computed for:
///
/// * successful and spilled registers partition the universe
/// * every assigned hardware register is allowed
/// * interfering registers never share a hardware register
/// * every Fixed register is assigned to itself
pub fn validate_allocation(
    interaction: &RegistersInteraction,
    allocation: &RegisterAllocation,
    allowed: &[HardwareRegister]
) -> Result<(), RegAllocError> {
    debug!("---Validating register allocation results---");

    for reg in allocation.successful.keys() {
        if !interaction.all_registers.contains(reg) {
            return Err(RegAllocError::invariant(format!(
                "{} is assigned but is not a register of the function",
                reg
            )));
        }
    }
    for reg in allocation.spills.iter() {
        if !interaction.all_registers.contains(reg) {
            return Err(RegAllocError::invariant(format!(
                "{} is spilled but is not a register of the function",
                reg
            )));
        }
        if allocation.successful.contains_key(reg) {
            return Err(RegAllocError::invariant(format!(
                "{} is both assigned and spilled",
                reg
            )));
        }
    }
    for reg in interaction.all_registers.iter() {
        if !allocation.successful.contains_key(reg) && !allocation.spills.contains(reg) {
            return Err(RegAllocError::invariant(format!(
                "{} is neither assigned nor spilled",
                reg
            )));
        }
    }

    for (reg, hw) in allocation.successful.iter() {
        if !allowed.contains(hw) {
            return Err(RegAllocError::invariant(format!(
                "{} is assigned to {}, which is not allowed",
                reg,
                hw
            )));
        }
        if let Some(fixed) = reg.as_fixed() {
            if fixed != *hw {
                return Err(RegAllocError::invariant(format!(
                    "fixed register {} is assigned to {}",
                    reg,
                    hw
                )));
            }
        }
        trace!("{} -> {}", reg, hw);
    }
    for reg in interaction.all_registers.iter() {
        if reg.is_fixed() && allocation.spills.contains(reg) {
            return Err(RegAllocError::invariant(format!(
                "fixed register {} is spilled",
                reg
            )));
        }
    }

    for (a, related) in interaction.interference.iter() {
        let color_a = match allocation.successful.get(a) {
            Some(hw) => hw,
            None => continue
        };
        for b in related.iter() {
            if allocation.successful.get(b) == Some(color_a) {
                return Err(RegAllocError::invariant(format!(
                    "{} and {} interfere but are both assigned to {}",
                    a,
                    b,
                    color_a
                )));
            }
        }
    }

    debug!("register allocation is valid");
    Ok(())
}
