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

/// Graph coloring, with the liveness analysis that builds its input.
pub mod graph_coloring;
/// Builds and solves the register coloring problem.
pub mod allocator;
/// Structural checks of allocation results.
pub mod validate;
/// Stack slots and load/store rewriting for registers that did not fit.
pub mod spill;

pub use compiler::backend::reg_alloc::allocator::{allocate_registers, RegisterAllocation};
pub use compiler::backend::reg_alloc::graph_coloring::{
    analyze_registers_interaction, FirstFitGraphColoring, GraphColoring, RegistersInteraction
};
pub use compiler::backend::reg_alloc::spill::{handle_spills, SpillRewrite};
pub use compiler::backend::reg_alloc::validate::validate_allocation;

use ast::ir::*;
use compiler::backend::CallConvention;
use error::RegAllocError;

/// Allocates with every allowed register first. If that spills, allocates
/// again with the backup registers withheld, and reports the backups as
/// assigned to themselves so that spill rewriting can use them.
pub fn allocate_with_retry(
    interaction: &RegistersInteraction,
    conv: &CallConvention,
    coloring: &GraphColoring<Register, HardwareRegister>
) -> Result<RegisterAllocation, RegAllocError> {
    let first = allocate_registers(interaction, &conv.allowed, coloring)?;
    if first.is_spill_free() {
        return Ok(first);
    }

    info!(
        "{} registers spilled, allocating again with {:?} reserved",
        first.spills.len(),
        conv.backups
    );

    let mut retry = allocate_registers(interaction, &conv.allowed_without_backups(), coloring)?;
    for backup in conv.backups.iter() {
        retry.successful.insert(Register::Fixed(*backup), *backup);
    }
    Ok(retry)
}
