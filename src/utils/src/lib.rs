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

//! # Utility crate shared by the register allocator
//!
//! It includes:
//!
//! * data structures
//!   * linked hashmap/set (insertion ordered, so iteration is reproducible)
//! * extra functions for vectors
//! * logging helper macros

extern crate linked_hash_map;

/// linked hashset implementation based on LinkedHashMap
mod linked_hashset;

// re-export these data structures

pub use linked_hash_map::LinkedHashMap;
pub use linked_hashset::LinkedHashSet;

// These modules provide operations on Vector.
// They are not found in the standard library.
/// vector utilities
pub mod vec_utils;

/// the macro to create LinkedHashMap
#[macro_export]
macro_rules! linked_hashmap {
    (@single $($x:tt)*) => (());
    (@count $($rest:expr),*) => (<[()]>::len(&[$(linked_hashmap!(@single $rest)),*]));

    ($($key:expr => $value:expr,)+) => { linked_hashmap!($($key => $value),+) };
    ($($key:expr => $value:expr),*) => {
        {
            let _cap = linked_hashmap!(@count $($key),*);
            let mut _map = $crate::LinkedHashMap::with_capacity(_cap);
            $(
                _map.insert($key, $value);
            )*
            _map
        }
    };
}

/// the macro to create LinkedHashSet
#[macro_export]
macro_rules! linked_hashset {
    (@single $($x:tt)*) => (());
    (@count $($rest:expr),*) => (<[()]>::len(&[$(linked_hashset!(@single $rest)),*]));

    ($($value:expr,)+) => { linked_hashset!($($value),+) };
    ($($value:expr),*) => {
        {
            let _cap = linked_hashset!(@count $($value),*);
            let mut _set = $crate::LinkedHashSet::with_capacity(_cap);
            $(
                _set.insert($value);
            )*
            _set
        }
    };
}

/// print trace!() log if condition is true (the condition should be a constant boolean)
#[macro_export]
macro_rules! trace_if {
    ($cond: expr, $($arg:tt)*) => {
        if $cond {
            trace!($($arg)*)
        }
    }
}
