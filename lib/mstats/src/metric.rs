/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::slice;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag {
    name: String,
    value: String,
}

impl Tag {
    pub fn new<K: Into<String>, V: Into<String>>(name: K, value: V) -> Self {
        Tag {
            name: name.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A set of key/value tags attached to a metric.
///
/// Insertion order is kept for encoding, but two tag sets holding the same
/// tags in a different order compare equal.
#[derive(Clone, Debug, Default)]
pub struct Tags {
    inner: SmallVec<[Tag; 4]>,
}

impl Tags {
    pub fn add<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        self.inner.push(Tag::new(name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }

    pub fn iter(&self) -> slice::Iter<'_, Tag> {
        self.inner.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn sorted(&self) -> SmallVec<[&Tag; 4]> {
        let mut v: SmallVec<[&Tag; 4]> = self.inner.iter().collect();
        v.sort_unstable();
        v
    }
}

impl PartialEq for Tags {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.sorted() == other.sorted()
    }
}

impl Eq for Tags {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tags = Tags::default();
        for (k, v) in iter {
            tags.add(k, v);
        }
        tags
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for tag in self {
            map.serialize_entry(tag.name(), tag.value())?;
        }
        map.end()
    }
}

#[derive(Clone, Debug)]
struct MetricInner {
    name: String,
    help: String,
    tags: Tags,
}

/// Metric descriptor.
///
/// Cloning is cheap, the descriptor is shared and never changes once it has
/// been handed to a backend.
#[derive(Clone, Debug)]
pub struct Metric {
    inner: Arc<MetricInner>,
}

impl Metric {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Metric {
            inner: Arc::new(MetricInner {
                name: name.into(),
                help: String::new(),
                tags: Tags::default(),
            }),
        }
    }

    pub fn with_help<T: Into<String>>(mut self, help: T) -> Self {
        Arc::make_mut(&mut self.inner).help = help.into();
        self
    }

    pub fn with_tag<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        Arc::make_mut(&mut self.inner).tags.add(name, value);
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        Arc::make_mut(&mut self.inner).tags = tags;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn help(&self) -> &str {
        &self.inner.help
    }

    #[inline]
    pub fn tags(&self) -> &Tags {
        &self.inner.tags
    }
}

impl PartialEq for Metric {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.name == other.inner.name && self.inner.tags == other.inner.tags)
    }
}
