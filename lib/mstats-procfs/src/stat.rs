/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};

// field positions counted from the state field, see proc(5)
const STATE: usize = 0;
const MINOR_FAULTS: usize = 7;
const MAJOR_FAULTS: usize = 9;
const UTIME: usize = 11;
const STIME: usize = 12;
const NUM_THREADS: usize = 17;

/// Fields of `/proc/<pid>/stat`. CPU times are in clock ticks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub minor_faults: u64,
    pub major_faults: u64,
    pub utime: u64,
    pub stime: u64,
    pub num_threads: u64,
}

impl ProcStat {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let text = text.trim();

        // the command name is free text inside the outermost parentheses
        let open = text
            .find('(')
            .ok_or_else(|| anyhow!("no command name found in stat"))?;
        let close = text
            .rfind(')')
            .filter(|close| *close > open)
            .ok_or_else(|| anyhow!("no command name end found in stat"))?;

        let pid = text[..open]
            .trim()
            .parse::<u32>()
            .context("invalid pid in stat")?;
        let comm = text[open + 1..close].to_string();
        let fields: Vec<&str> = text[close + 1..].split_ascii_whitespace().collect();

        let field = |i: usize, name: &str| -> anyhow::Result<u64> {
            let v = fields
                .get(i)
                .ok_or_else(|| anyhow!("no {name} field in stat"))?;
            v.parse::<u64>()
                .context(format!("invalid {name} field in stat"))
        };

        let state = fields
            .get(STATE)
            .and_then(|s| s.chars().next())
            .ok_or_else(|| anyhow!("no state field in stat"))?;

        Ok(ProcStat {
            pid,
            comm,
            state,
            minor_faults: field(MINOR_FAULTS, "minflt")?,
            major_faults: field(MAJOR_FAULTS, "majflt")?,
            utime: field(UTIME, "utime")?,
            stime: field(STIME, "stime")?,
            num_threads: field(NUM_THREADS, "num_threads")?,
        })
    }
}
