/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};

use crate::parse;

pub const OPEN_FILES: &str = "Max open files";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcLimit {
    pub name: String,
    /// `None` means unlimited.
    pub soft: Option<u64>,
    pub hard: Option<u64>,
    pub units: String,
}

/// Table of `/proc/<pid>/limits`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcLimits {
    limits: Vec<ProcLimit>,
}

impl ProcLimits {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut limits = Vec::new();

        for line in parse::lines_except_first(text) {
            let mut cols = parse::columns(line);
            let name = cols.next().unwrap_or_default();
            let soft = cols
                .next()
                .ok_or_else(|| anyhow!("no soft value for limit {name}"))?;
            let hard = cols
                .next()
                .ok_or_else(|| anyhow!("no hard value for limit {name}"))?;
            let units = cols.next().unwrap_or_default();

            limits.push(ProcLimit {
                name: name.to_string(),
                soft: parse_limit(soft).context(format!("invalid soft value for limit {name}"))?,
                hard: parse_limit(hard).context(format!("invalid hard value for limit {name}"))?,
                units: units.to_string(),
            });
        }

        Ok(ProcLimits { limits })
    }

    pub fn get(&self, name: &str) -> Option<&ProcLimit> {
        self.limits.iter().find(|l| l.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcLimit> {
        self.limits.iter()
    }

    pub fn open_files(&self) -> Option<&ProcLimit> {
        self.get(OPEN_FILES)
    }
}

fn parse_limit(value: &str) -> anyhow::Result<Option<u64>> {
    if value == "unlimited" {
        return Ok(None);
    }
    let v = value.parse::<u64>()?;
    Ok(Some(v))
}
