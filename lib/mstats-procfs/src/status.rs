/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};

use crate::parse;

/// Fields of `/proc/<pid>/status`. Missing fields are left as zero, which is
/// what the kernel shows for kernel threads that have no memory map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcStatus {
    pub threads: u64,
    /// Resident set size in bytes.
    pub vm_rss: u64,
    /// Virtual memory size in bytes.
    pub vm_size: u64,
    pub voluntary_ctxt_switches: u64,
    pub nonvoluntary_ctxt_switches: u64,
}

impl ProcStatus {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut status = ProcStatus::default();

        for (key, value) in parse::properties(text) {
            match key {
                "Threads" => status.threads = parse_count(key, value)?,
                "VmRSS" => status.vm_rss = parse_size(key, value)?,
                "VmSize" => status.vm_size = parse_size(key, value)?,
                "voluntary_ctxt_switches" => {
                    status.voluntary_ctxt_switches = parse_count(key, value)?
                }
                "nonvoluntary_ctxt_switches" => {
                    status.nonvoluntary_ctxt_switches = parse_count(key, value)?
                }
                _ => {}
            }
        }

        Ok(status)
    }
}

fn parse_count(key: &str, value: &str) -> anyhow::Result<u64> {
    value
        .parse::<u64>()
        .context(format!("invalid value for status field {key}"))
}

fn parse_size(key: &str, value: &str) -> anyhow::Result<u64> {
    let mut parts = value.split_ascii_whitespace();
    let n = parts
        .next()
        .ok_or_else(|| anyhow!("empty value for status field {key}"))?;
    let n = parse_count(key, n)?;

    match parts.next() {
        None => Ok(n),
        Some("kB") => Ok(n.saturating_mul(1024)),
        Some(unit) => Err(anyhow!("unsupported unit {unit} for status field {key}")),
    }
}
