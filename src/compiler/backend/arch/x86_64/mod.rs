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

#![allow(non_upper_case_globals)]

use ast::ir::HardwareRegister;
use ast::ir::HardwareRegister::*;
use compiler::backend::CallConvention;
use error::RegAllocError;
use options::CompilerOptions;

lazy_static!{
    /// all general purpose registers
    pub static ref ALL_GPRs : [HardwareRegister; 16] = [
        RAX, RCX, RDX, RBX, RSP, RBP, RSI, RDI,
        R8, R9, R10, R11, R12, R13, R14, R15
    ];

    pub static ref CALLEE_SAVED_GPRs : [HardwareRegister; 6] = [
        RBX,
        RBP,
        R12,
        R13,
        R14,
        R15
    ];

    pub static ref CALLER_SAVED_GPRs : [HardwareRegister; 9] = [
        RAX,
        RCX,
        RDX,
        RSI,
        RDI,
        R8,
        R9,
        R10,
        R11
    ];

    /// registers the runtime relies on across calls; a live reference may not sit in them
    pub static ref PRESERVED_GPRs : Vec<HardwareRegister> = CALLEE_SAVED_GPRs
        .iter()
        .filter(|reg| **reg != RSP && **reg != RBP)
        .cloned()
        .collect();

    // put caller saved regs first (they imposes no overhead if there is no call instruction)
    pub static ref ALL_USABLE_GPRs : Vec<HardwareRegister> = {
        let mut ret = vec![];
        ret.extend(CALLER_SAVED_GPRs.iter().cloned());
        ret.extend(PRESERVED_GPRs.iter().cloned());
        ret
    };

    /// stack and frame pointer, live through every function
    pub static ref FRAME_GPRs : [HardwareRegister; 2] = [
        RSP,
        RBP
    ];

    /// registers handed to the allocator: the usable ones first, then the frame
    /// registers (which only their Fixed registers can take)
    pub static ref ALLOWED_GPRs : Vec<HardwareRegister> = {
        let mut ret = ALL_USABLE_GPRs.clone();
        ret.extend(FRAME_GPRs.iter().cloned());
        ret
    };

    /// default scratch registers reserved for spill rewriting
    pub static ref DEFAULT_BACKUP_GPRs : [HardwareRegister; 2] = [
        R10,
        R11
    ];
}

/// returns the System V calling convention with the backup registers chosen in `options`
pub fn system_v_call_convention(options: &CompilerOptions) -> Result<CallConvention, RegAllocError> {
    let backups = options.backup_registers()?;
    CallConvention::new(
        ALLOWED_GPRs.clone(),
        PRESERVED_GPRs.clone(),
        backups,
        FRAME_GPRs.to_vec()
    )
}
