/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

pub mod parse;

mod status;
pub use status::ProcStatus;

mod limits;
pub use limits::{OPEN_FILES, ProcLimit, ProcLimits};

mod stat;
pub use stat::ProcStat;

mod collector;
pub use collector::{DEFAULT_CLOCK_TICKS, DEFAULT_PROC_ROOT, ProcCollector};
