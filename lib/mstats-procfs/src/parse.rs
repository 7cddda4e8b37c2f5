/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// Trimmed, non-empty lines of `text`.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(str::trim).filter(|line| !line.is_empty())
}

/// Same as [`lines`] with the header line skipped.
pub fn lines_except_first(text: &str) -> impl Iterator<Item = &str> {
    lines(text).skip(1)
}

/// Columns of a table line, separated by at least two spaces.
pub fn columns(line: &str) -> Columns<'_> {
    Columns { rest: line }
}

/// `key: value` pairs, one per line.
pub fn properties(text: &str) -> impl Iterator<Item = (&str, &str)> {
    lines(text).map(split_property)
}

/// Split at the first colon and trim both parts. A line without a colon
/// has an empty key.
pub fn split_property(text: &str) -> (&str, &str) {
    match text.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => ("", text.trim()),
    }
}

pub struct Columns<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Columns<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.trim_start();
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        match rest.find("  ") {
            Some(i) => {
                self.rest = &rest[i + 2..];
                Some(&rest[..i])
            }
            None => {
                self.rest = "";
                Some(rest)
            }
        }
    }
}
