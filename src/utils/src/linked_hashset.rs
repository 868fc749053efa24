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

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FromIterator;

use linked_hash_map::{Keys, LinkedHashMap};

/// A hash set that iterates in insertion order.
pub struct LinkedHashSet<K, S = RandomState>(LinkedHashMap<K, (), S>);

impl<K: Hash + Eq> LinkedHashSet<K> {
    pub fn new() -> Self {
        LinkedHashSet(LinkedHashMap::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        LinkedHashSet(LinkedHashMap::with_capacity(capacity))
    }

    pub fn from_vec(from: Vec<K>) -> Self {
        let mut ret = LinkedHashSet::with_capacity(from.len());
        for ele in from {
            ret.insert(ele);
        }
        ret
    }

    pub fn to_vec(mut self) -> Vec<K> {
        let mut ret = Vec::with_capacity(self.len());
        while let Some(ele) = self.pop_front() {
            ret.push(ele);
        }
        ret
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<K: Hash + Eq, S: BuildHasher> LinkedHashSet<K, S> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pop_front(&mut self) -> Option<K> {
        self.0.pop_front().map(|(k, _)| k)
    }

    pub fn pop_back(&mut self) -> Option<K> {
        self.0.pop_back().map(|(k, _)| k)
    }

    /// inserts an element at the back (an existing element keeps its position),
    /// returns true if the element was not present before
    pub fn insert(&mut self, k: K) -> bool {
        if self.0.contains_key(&k) {
            false
        } else {
            self.0.insert(k, ());
            true
        }
    }

    pub fn contains<Q: ?Sized>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash
    {
        self.0.contains_key(k)
    }

    /// returns true if the element was present
    pub fn remove<Q: ?Sized>(&mut self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash
    {
        self.0.remove(k).is_some()
    }

    pub fn iter(&self) -> Keys<K, ()> {
        self.0.keys()
    }

    /// compares as sets, ignoring the insertion order
    pub fn equals(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|ele| other.contains(ele))
    }
}

impl<K: Hash + Eq> Default for LinkedHashSet<K> {
    fn default() -> Self {
        LinkedHashSet::new()
    }
}

impl<K: Hash + Eq + Clone> Clone for LinkedHashSet<K> {
    fn clone(&self) -> Self {
        LinkedHashSet(self.0.clone())
    }
}

impl<K: Hash + Eq, S: BuildHasher> PartialEq for LinkedHashSet<K, S> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl<K: Hash + Eq, S: BuildHasher> Eq for LinkedHashSet<K, S> {}

impl<K: Hash + Eq> FromIterator<K> for LinkedHashSet<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut ret = LinkedHashSet::new();
        ret.extend(iter);
        ret
    }
}

impl<K: Hash + Eq, S: BuildHasher> Extend<K> for LinkedHashSet<K, S> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for ele in iter {
            self.insert(ele);
        }
    }
}

impl<'a, K: Hash + Eq, S: BuildHasher> IntoIterator for &'a LinkedHashSet<K, S> {
    type Item = &'a K;
    type IntoIter = Keys<'a, K, ()>;

    fn into_iter(self) -> Keys<'a, K, ()> {
        self.iter()
    }
}

impl<A: fmt::Debug + Hash + Eq, S: BuildHasher> fmt::Debug for LinkedHashSet<A, S> {
    /// lists the elements in insertion order
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
