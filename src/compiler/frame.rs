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

use utils::vec_utils;

use std::fmt;

/// size of one spill slot in bytes
pub const SLOT_SIZE: usize = 8;

/// Frame manages the stack slots known statically for a function
/// (at the moment, slots for spilled registers).
///
/// on x64
/// | previous frame ...
/// |---------------
/// | return address
/// | old RBP        <- RBP
/// | spilled
/// |---------------
#[derive(Clone, Debug)]
pub struct Frame {
    /// current offset to frame base pointer
    cur_offset: isize,
    /// allocated slots, in allocation order
    pub allocated: Vec<FrameSlot>
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Frame {{")?;
        writeln!(f, "  allocated slots: {}", vec_utils::as_str(&self.allocated))?;
        writeln!(f, "  cur offset: {}", self.cur_offset)?;
        write!(f, "}}")
    }
}

impl Frame {
    /// creates a new Frame
    pub fn new() -> Frame {
        Frame {
            cur_offset: 0,
            allocated: vec![]
        }
    }

    /// returns current size,
    /// which is always a multiple of 16 bytes for x64 (alignment requirement)
    pub fn cur_size(&self) -> usize {
        let size = self.cur_offset.abs() as usize;

        // align size to a multiple of 16 bytes
        let size = (size + 16 - 1) & !(16 - 1);

        debug_assert!(size % 16 == 0);

        size
    }

    fn alloc_slot(&mut self, holds_reference: bool) -> FrameSlot {
        self.cur_offset -= SLOT_SIZE as isize;

        let ret = FrameSlot {
            offset: self.cur_offset,
            holds_reference: holds_reference
        };
        trace!("frame: allocated {}", ret);

        self.allocated.push(ret.clone());
        ret
    }
}

impl Default for Frame {
    fn default() -> Frame {
        Frame::new()
    }
}

/// The stack frame of the function being compiled, as seen by spill handling.
pub trait FrameAllocator {
    /// allocates a fresh pointer-sized slot. `holds_reference` marks slots the
    /// garbage collector has to scan
    fn allocate_frame_variable(&mut self, holds_reference: bool) -> FrameSlot;
}

impl FrameAllocator for Frame {
    fn allocate_frame_variable(&mut self, holds_reference: bool) -> FrameSlot {
        self.alloc_slot(holds_reference)
    }
}

/// FrameSlot presents a value stored in a certain frame location
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameSlot {
    /// location offset from current base pointer
    pub offset: isize,
    /// whether the slot keeps a reference alive
    pub holds_reference: bool
}

impl fmt::Display for FrameSlot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(RBP)", self.offset)?;
        if self.holds_reference {
            write!(f, " [ref]")?;
        }
        Ok(())
    }
}
