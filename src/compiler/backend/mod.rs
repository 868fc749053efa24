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

/// The contract with instruction selection (tree covering).
pub mod inst_sel;
/// Control flow linearization: abstract CFG to a sequence of basic blocks.
pub mod linearize;
/// A register allocation pass. Graph coloring.
pub mod reg_alloc;

/// --- X86_64 backend ---
#[path = "arch/x86_64/mod.rs"]
pub mod x86_64;

use ast::ir::HardwareRegister;
use error::RegAllocError;
use utils::vec_utils;

/// The register sets a calling convention hands to register allocation.
#[derive(Clone, Debug)]
pub struct CallConvention {
    /// registers that may be assigned, in preference order
    pub allowed: Vec<HardwareRegister>,
    /// registers that must never hold a live reference
    pub preserved: Vec<HardwareRegister>,
    /// scratch registers reserved for spill rewriting
    pub backups: Vec<HardwareRegister>,
    /// allowed registers that are live through the whole function (stack and
    /// frame pointers); only their Fixed registers may be assigned to them
    pub always_live: Vec<HardwareRegister>
}

impl CallConvention {
    pub fn new(
        allowed: Vec<HardwareRegister>,
        preserved: Vec<HardwareRegister>,
        backups: Vec<HardwareRegister>,
        always_live: Vec<HardwareRegister>
    ) -> Result<CallConvention, RegAllocError> {
        if let Some(reg) = preserved.iter().find(|reg| !allowed.contains(reg)) {
            return Err(RegAllocError::InvalidOptions(format!(
                "preserved register {} is not allocatable",
                reg
            )));
        }
        if let Some(reg) = backups.iter().find(|reg| !allowed.contains(reg)) {
            return Err(RegAllocError::InvalidOptions(format!(
                "backup register {} is not allocatable",
                reg
            )));
        }
        if let Some(reg) = backups.iter().find(|reg| preserved.contains(reg)) {
            return Err(RegAllocError::InvalidOptions(format!(
                "backup register {} is also preserved",
                reg
            )));
        }
        if let Some(reg) = always_live.iter().find(|reg| !allowed.contains(reg)) {
            return Err(RegAllocError::InvalidOptions(format!(
                "always live register {} is not allocatable",
                reg
            )));
        }
        if let Some(reg) = backups.iter().find(|reg| always_live.contains(reg)) {
            return Err(RegAllocError::InvalidOptions(format!(
                "backup register {} is always live",
                reg
            )));
        }

        Ok(CallConvention {
            allowed: vec_utils::dedup_stable(&allowed),
            preserved: vec_utils::dedup_stable(&preserved),
            backups: vec_utils::dedup_stable(&backups),
            always_live: vec_utils::dedup_stable(&always_live)
        })
    }

    /// allowed registers minus the backups
    pub fn allowed_without_backups(&self) -> Vec<HardwareRegister> {
        self.allowed
            .iter()
            .filter(|reg| !self.backups.contains(reg))
            .cloned()
            .collect()
    }
}
