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

/// Machine code representation: basic blocks of a linearized function.
pub mod machine_code;
/// Stack frame and spill slot allocation.
pub mod frame;
/// Linearization, instruction selection contract and register allocation.
pub mod backend;

use ast::cfg::CFGFragment;
use ast::ir::*;
use compiler::backend::inst_sel::InstructionCovering;
use compiler::backend::linearize::linearize;
use compiler::backend::reg_alloc::*;
use compiler::backend::{x86_64, CallConvention};
use compiler::frame::{FrameAllocator, FrameSlot};
use compiler::machine_code::LoweredCFGFragment;
use error::RegAllocError;
use options::{start_logging, CompilerOptions};
use utils::{LinkedHashMap, LinkedHashSet};

/// CompiledFunction stores the result of register allocation for a function
pub struct CompiledFunction {
    pub name: MuName,
    /// the linearized code, rewritten if registers were spilled
    pub code: LoweredCFGFragment,
    /// a hardware register for every register in `code`
    pub allocation: RegisterAllocation,
    /// the stack slot of every spilled register (empty if nothing was spilled)
    pub spill_slots: LinkedHashMap<Register, FrameSlot>
}

/// Compiler runs linearization and register allocation for one function at a time.
///
/// A Compiler keeps no state between functions, so functions may be compiled
/// concurrently with the same Compiler.
pub struct Compiler {
    options: CompilerOptions,
    conv: CallConvention
}

impl Compiler {
    /// creates a compiler for the System V x86-64 calling convention
    pub fn new(options: CompilerOptions) -> Result<Compiler, RegAllocError> {
        start_logging(options.flag_log_level);
        let conv = x86_64::system_v_call_convention(&options)?;
        Ok(Compiler::with_call_convention(options, conv))
    }

    pub fn with_call_convention(options: CompilerOptions, conv: CallConvention) -> Compiler {
        Compiler {
            options: options,
            conv: conv
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn call_convention(&self) -> &CallConvention {
        &self.conv
    }

    fn analyze(&self, code: &LoweredCFGFragment) -> Result<RegistersInteraction, RegAllocError> {
        let interaction = analyze_registers_interaction(code, &self.conv.preserved, &self.conv.always_live)?;
        if self.options.flag_disable_coalescing {
            Ok(interaction.without_copying())
        } else {
            Ok(interaction)
        }
    }

    /// Linearizes `cfg` and assigns hardware registers to all its registers,
    /// spilling to slots from `frame` when registers do not fit.
    pub fn compile_function<C: InstructionCovering>(
        &self,
        cfg: &CFGFragment<C::Tree>,
        covering: &C,
        frame: &mut FrameAllocator
    ) -> Result<CompiledFunction, RegAllocError> {
        info!("---compiling {}---", cfg.name);

        let coloring = FirstFitGraphColoring::new();

        let code = linearize(cfg, covering)?;
        let interaction = self.analyze(&code)?;
        let allocation = allocate_with_retry(&interaction, &self.conv, &coloring)?;

        if allocation.is_spill_free() {
            debug!("{}: no spilling needed", cfg.name);
            return Ok(CompiledFunction {
                name: cfg.name.clone(),
                code: code,
                allocation: allocation,
                spill_slots: LinkedHashMap::new()
            });
        }

        let rewrite = handle_spills(
            covering,
            frame,
            code,
            &interaction,
            &allocation,
            &self.conv.backups,
            &coloring
        )?;
        let code = rewrite.fragment;
        let allocation = self.allocation_after_spilling(&code, &allocation)?;

        if !self.options.flag_disable_regalloc_validate {
            let interaction = self.analyze(&code)?;
            validate_allocation(&interaction, &allocation, &self.conv.allowed)?;
        }

        debug!("{}", code);
        Ok(CompiledFunction {
            name: cfg.name.clone(),
            code: code,
            allocation: allocation,
            spill_slots: rewrite.slots
        })
    }

    /// After spill rewriting, spilled registers are gone from the code and every
    /// remaining register keeps its hardware register (backups map to themselves).
    fn allocation_after_spilling(
        &self,
        code: &LoweredCFGFragment,
        allocation: &RegisterAllocation
    ) -> Result<RegisterAllocation, RegAllocError> {
        let mut registers: LinkedHashSet<Register> = LinkedHashSet::new();
        for inst in code.instructions() {
            registers.extend(inst.registers_read());
            registers.extend(inst.registers_written());
        }
        registers.extend(self.conv.preserved.iter().map(|reg| Register::Fixed(*reg)));
        registers.extend(self.conv.always_live.iter().map(|reg| Register::Fixed(*reg)));

        let mut successful = LinkedHashMap::new();
        for reg in registers.iter() {
            let hw = match (allocation.get(reg), *reg) {
                (Some(hw), _) => hw,
                (None, Register::Fixed(hw)) => hw,
                (None, Register::Virtual(_)) => {
                    return Err(RegAllocError::invariant(format!(
                        "{} has no hardware register after spill rewriting",
                        reg
                    )))
                }
            };
            successful.insert(*reg, hw);
        }

        Ok(RegisterAllocation {
            successful: successful,
            spills: LinkedHashSet::new()
        })
    }
}
