//! Singly linked chains
//!
//! Word lists, redirect chains and case clauses are all forward-only linked
//! sequences. Parsers build them by prepending (the cheapest insertion point)
//! and normalise to source order with a single in-place reversal at the end.

use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

struct Link<T> {
    value: T,
    next: Option<Box<Link<T>>>,
}

/// Ordered, forward-only sequence owning its elements.
pub struct Chain<T> {
    head: Option<Box<Link<T>>>,
}

impl<T> Chain<T> {
    pub const fn new() -> Self {
        Self { head: None }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of elements. Walks the whole chain.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn first(&self) -> Option<&T> {
        self.head.as_deref().map(|link| &link.value)
    }

    /// Push `value` as the new head. O(1).
    pub fn push_front(&mut self, value: T) {
        let next = self.head.take();
        self.head = Some(Box::new(Link { value, next }));
    }

    /// Consuming form of [`Chain::push_front`].
    pub fn prepend(mut self, value: T) -> Self {
        self.push_front(value);
        self
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.head.take().map(|link| {
            let link = *link;
            self.head = link.next;
            link.value
        })
    }

    /// Attach `value` after the current tail. O(n); chains are short.
    pub fn append(&mut self, value: T) {
        let mut cursor = &mut self.head;
        while let Some(link) = cursor {
            cursor = &mut link.next;
        }
        *cursor = Some(Box::new(Link { value, next: None }));
    }

    /// Reverse in place by flipping each link. The old head becomes the tail.
    pub fn reverse(&mut self) {
        let mut prev: Option<Box<Link<T>>> = None;
        let mut current = self.head.take();
        while let Some(mut link) = current {
            current = link.next.take();
            link.next = prev;
            prev = Some(link);
        }
        self.head = prev;
    }

    /// Consuming form of [`Chain::reverse`].
    pub fn reversed(mut self) -> Self {
        self.reverse();
        self
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.as_deref(),
        }
    }
}

impl<T> Default for Chain<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Iterative teardown; the derived recursive drop overflows on long chains.
impl<T> Drop for Chain<T> {
    fn drop(&mut self) {
        let mut current = self.head.take();
        while let Some(mut link) = current {
            current = link.next.take();
        }
    }
}

impl<T> FromIterator<T> for Chain<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut chain = Chain::new();
        for value in iter {
            chain.push_front(value);
        }
        chain.reverse();
        chain
    }
}

impl<T> From<Vec<T>> for Chain<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T: Clone> Clone for Chain<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: PartialEq> PartialEq for Chain<T> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for Chain<T> {}

impl<T: fmt::Debug> fmt::Debug for Chain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct Iter<'a, T> {
    next: Option<&'a Link<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|link| {
            self.next = link.next.as_deref();
            &link.value
        })
    }
}

impl<'a, T> IntoIterator for &'a Chain<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct IntoIter<T>(Chain<T>);

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.0.pop_front()
    }
}

impl<T> IntoIterator for Chain<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self)
    }
}

impl<T: Serialize> Serialize for Chain<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Chain<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Chain::from)
    }
}
