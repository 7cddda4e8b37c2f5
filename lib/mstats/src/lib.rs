/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod metric;
pub use metric::{Metric, Tag, Tags};

mod error;
pub use error::StatsError;

mod backend;
pub use backend::{ArcBackend, Backend};

mod json;
pub use json::JsonBackend;

mod multi;
pub use multi::MultiBackend;
