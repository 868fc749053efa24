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

use ast::ir::MuName;
use utils::LinkedHashMap;

use std::fmt;

/// label of a vertex in the abstract control flow graph
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CFGLabel(pub usize);

impl fmt::Display for CFGLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// A vertex of the abstract control flow graph. `T` is the computation tree
/// type understood by instruction selection.
#[derive(Clone, Debug)]
pub enum CFGVertex<T> {
    /// computation with no successor (function exit)
    Final(T),
    /// computation followed by an unconditional transfer
    Jump(T, CFGLabel),
    /// boolean computation followed by a transfer to `on_true` or `on_false`
    Conditional {
        tree: T,
        on_true: CFGLabel,
        on_false: CFGLabel
    }
}

impl<T> CFGVertex<T> {
    pub fn tree(&self) -> &T {
        match *self {
            CFGVertex::Final(ref tree) | CFGVertex::Jump(ref tree, _) => tree,
            CFGVertex::Conditional { ref tree, .. } => tree
        }
    }
}

/// The control flow graph of one function.
#[derive(Clone, Debug)]
pub struct CFGFragment<T> {
    pub name: MuName,
    pub vertices: LinkedHashMap<CFGLabel, CFGVertex<T>>,
    pub initial_label: CFGLabel
}

impl<T> CFGFragment<T> {
    pub fn new(
        name: &str,
        vertices: LinkedHashMap<CFGLabel, CFGVertex<T>>,
        initial_label: CFGLabel
    ) -> CFGFragment<T> {
        CFGFragment {
            name: name.to_string(),
            vertices: vertices,
            initial_label: initial_label
        }
    }

    pub fn get_vertex(&self, label: CFGLabel) -> Option<&CFGVertex<T>> {
        self.vertices.get(&label)
    }
}
