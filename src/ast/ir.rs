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

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

pub type MuID = usize;
pub type MuName = String;

/// x86-64 general purpose registers, in encoding order
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HardwareRegister {
    RAX,
    RCX,
    RDX,
    RBX,
    RSP,
    RBP,
    RSI,
    RDI,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15
}

impl HardwareRegister {
    pub fn name(&self) -> &'static str {
        use self::HardwareRegister::*;
        match *self {
            RAX => "rax",
            RCX => "rcx",
            RDX => "rdx",
            RBX => "rbx",
            RSP => "rsp",
            RBP => "rbp",
            RSI => "rsi",
            RDI => "rdi",
            R8 => "r8",
            R9 => "r9",
            R10 => "r10",
            R11 => "r11",
            R12 => "r12",
            R13 => "r13",
            R14 => "r14",
            R15 => "r15"
        }
    }

    /// parses a lowercase register name such as "r10"
    pub fn from_name(name: &str) -> Option<HardwareRegister> {
        use self::HardwareRegister::*;
        let ret = match name.trim().to_lowercase().as_str() {
            "rax" => RAX,
            "rcx" => RCX,
            "rdx" => RDX,
            "rbx" => RBX,
            "rsp" => RSP,
            "rbp" => RBP,
            "rsi" => RSI,
            "rdi" => RDI,
            "r8" => R8,
            "r9" => R9,
            "r10" => R10,
            "r11" => R11,
            "r12" => R12,
            "r13" => R13,
            "r14" => R14,
            "r15" => R15,
            _ => return None
        };
        Some(ret)
    }
}

impl fmt::Display for HardwareRegister {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ids below this are never handed out, so a dump can tell a virtual register
// from a hardware register number at a glance
const VIRTUAL_REGISTER_ID_START: MuID = 100;

static NEXT_VIRTUAL_REGISTER_ID: AtomicUsize = AtomicUsize::new(VIRTUAL_REGISTER_ID_START);

/// A register without a hardware location yet.
///
/// Every call to `new()` creates a register with a fresh identity. Ids grow
/// monotonically, so ordering virtual registers by id orders them by creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualRegister {
    id: MuID,
    /// whether the register carries a pointer managed by the garbage collector
    holds_reference: bool
}

impl VirtualRegister {
    pub fn new(holds_reference: bool) -> VirtualRegister {
        VirtualRegister {
            id: NEXT_VIRTUAL_REGISTER_ID.fetch_add(1, Ordering::SeqCst),
            holds_reference: holds_reference
        }
    }

    pub fn id(&self) -> MuID {
        self.id
    }

    pub fn holds_reference(&self) -> bool {
        self.holds_reference
    }
}

impl fmt::Display for VirtualRegister {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.holds_reference {
            write!(f, "%ref{}", self.id)
        } else {
            write!(f, "%v{}", self.id)
        }
    }
}

/// A register operand of an instruction.
///
/// Fixed registers are compared by the hardware register they name,
/// virtual registers by identity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    Fixed(HardwareRegister),
    Virtual(VirtualRegister)
}

impl Register {
    /// a fresh virtual register that does not hold a reference
    pub fn new_virtual() -> Register {
        Register::Virtual(VirtualRegister::new(false))
    }

    /// a fresh virtual register holding a reference
    pub fn new_reference() -> Register {
        Register::Virtual(VirtualRegister::new(true))
    }

    pub fn is_fixed(&self) -> bool {
        match *self {
            Register::Fixed(_) => true,
            Register::Virtual(_) => false
        }
    }

    pub fn as_fixed(&self) -> Option<HardwareRegister> {
        match *self {
            Register::Fixed(reg) => Some(reg),
            Register::Virtual(_) => None
        }
    }

    pub fn as_virtual(&self) -> Option<VirtualRegister> {
        match *self {
            Register::Fixed(_) => None,
            Register::Virtual(reg) => Some(reg)
        }
    }

    pub fn holds_reference(&self) -> bool {
        match *self {
            Register::Fixed(_) => false,
            Register::Virtual(reg) => reg.holds_reference()
        }
    }
}

impl From<HardwareRegister> for Register {
    fn from(reg: HardwareRegister) -> Register {
        Register::Fixed(reg)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Register::Fixed(reg) => write!(f, "%{}", reg),
            Register::Virtual(reg) => write!(f, "{}", reg)
        }
    }
}

/// label of a linearized basic block
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockLabel(pub MuName);

impl BlockLabel {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
