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

//! # Register allocation and control flow linearization
//!
//! The pipeline, per function:
//!
//! * `compiler::backend::linearize`: abstract CFG to a list of basic blocks,
//!   falling through wherever possible
//! * `compiler::backend::reg_alloc::graph_coloring::liveness`: liveness,
//!   interference and copy relations
//! * `compiler::backend::reg_alloc::allocator`: coloring onto hardware registers
//!   (`compiler::backend::reg_alloc::graph_coloring::coloring`)
//! * `compiler::backend::reg_alloc::spill`: stack slots and load/store rewriting
//!   when registers do not fit
//!
//! `compiler::Compiler` runs all of them.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
extern crate docopt;
extern crate petgraph;
extern crate serde;
extern crate stderrlog;
extern crate thiserror;

#[macro_use]
extern crate mu_utils as utils;

pub mod ast;
pub mod compiler;
pub mod error;
pub mod options;

/// mock instructions and instruction selection for tests
pub mod testutil;
