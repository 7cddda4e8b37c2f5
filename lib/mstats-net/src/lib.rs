/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod protocol;
pub use protocol::{DogStatsd, Protocol};

mod conn;
pub use conn::{BoxConnection, Connection, dial};

mod fail;
pub use fail::{DiagnosticSink, FailFn, stderr_fail};

mod config;
pub use config::{DialFn, NetBackendConfig};

mod stats;
pub use stats::{NetConnSnapshot, NetDropSnapshot, NetIoSnapshot, NetSnapshot, NetStats};

mod job;
mod buffer;
mod worker;

mod backend;
pub use backend::NetBackend;

#[cfg(test)]
mod testing;
