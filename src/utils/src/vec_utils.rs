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

/// returns a formatted String for a slice of T (T needs Display trait)
pub fn as_str<T: fmt::Display>(vec: &[T]) -> String {
    let mut ret = String::new();
    for i in 0..vec.len() {
        ret.push_str(format!("{}", vec[i]).as_str());
        if i != vec.len() - 1 {
            ret.push_str(", ");
        }
    }
    ret
}

/// adds a value to the vector if the vector does not contains a same value
pub fn add_unique<T: PartialEq>(vec: &mut Vec<T>, val: T) {
    if !vec.contains(&val) {
        vec.push(val);
    }
}

/// returns a copy of the vector with later duplicates removed (the first appearance wins)
pub fn dedup_stable<T: PartialEq + Clone>(vec: &[T]) -> Vec<T> {
    let mut ret = Vec::with_capacity(vec.len());
    for val in vec {
        add_unique(&mut ret, val.clone());
    }
    ret
}
