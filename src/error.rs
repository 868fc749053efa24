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

use thiserror::Error;

/// Errors of the register allocation pipeline.
///
/// None of them is caused by the program being compiled: they indicate a bug
/// in an earlier phase or a misconfigured calling convention.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegAllocError {
    /// malformed input to an allocation component
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// spill rewriting cannot proceed with the given allocation or backups
    #[error("spill handling failed: {0}")]
    SpillHandling(String),

    /// an allocation result breaks one of its invariants
    #[error("register allocation produced an invalid result: {0}")]
    InvariantViolation(String),

    /// compiler options could not be parsed
    #[error("invalid compiler options: {0}")]
    InvalidOptions(String)
}

impl RegAllocError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> RegAllocError {
        RegAllocError::InvalidInput(msg.into())
    }

    pub fn spill_handling<S: Into<String>>(msg: S) -> RegAllocError {
        RegAllocError::SpillHandling(msg.into())
    }

    pub fn invariant<S: Into<String>>(msg: S) -> RegAllocError {
        RegAllocError::InvariantViolation(msg.into())
    }
}
