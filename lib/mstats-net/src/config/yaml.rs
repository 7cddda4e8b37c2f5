/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use yaml_rust::{Yaml, yaml};

use super::NetBackendConfig;
use crate::DogStatsd;

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

fn foreach_kv<F>(table: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in table.iter() {
        let Yaml::String(key) = k else {
            return Err(anyhow!("key in hash should be string"));
        };
        f(key, v).context(format!("failed to parse value of key {key}"))?;
    }
    Ok(())
}

fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.to_string()),
        Yaml::Integer(i) => Ok(i.to_string()),
        _ => Err(anyhow!("yaml value type should be 'string'")),
    }
}

fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::String(s) => Ok(usize::from_str(s)?),
        Yaml::Integer(i) => Ok(usize::try_from(*i)?),
        _ => Err(anyhow!(
            "yaml value type for 'usize' should be 'string' or 'integer'"
        )),
    }
}

// bare numbers are seconds
fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => match humanize_rs::duration::parse(value) {
            Ok(d) => Ok(d),
            Err(ParseError::MissingUnit) => {
                let secs = u64::from_str(value).map_err(|_| anyhow!("invalid duration string"))?;
                Ok(Duration::from_secs(secs))
            }
            Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
        },
        Yaml::Integer(i) => {
            let secs = u64::try_from(*i).map_err(|_| anyhow!("negative duration"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(anyhow!(
            "yaml value type for duration should be 'string' or 'integer'"
        )),
    }
}

impl NetBackendConfig {
    /// Load the config from a yaml map, or from a bare `host:port` string
    /// for a tcp target.
    ///
    /// The DogStatsD protocol is used, with the optional `prefix` key.
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::Hash(map) => {
                let mut prefix = String::new();
                let mut network = "tcp".to_string();
                let mut address: Option<String> = None;
                let mut config = NetBackendConfig::new(DogStatsd::new(), "", "");

                foreach_kv(map, |k, v| {
                    match normalize_key(k).as_str() {
                        "network" => network = as_string(v)?,
                        "address" | "addr" => address = Some(as_string(v)?),
                        "prefix" => prefix = as_string(v)?,
                        "buffer_size" => config.set_buffer_size(as_usize(v)?),
                        "queue_size" => config.set_queue_size(as_usize(v)?),
                        "retry_after_min" => config.retry_after_min = as_duration(v)?,
                        "retry_after_max" => config.retry_after_max = as_duration(v)?,
                        "flush_interval" => config.set_flush_interval(as_duration(v)?),
                        "write_timeout" => config.set_write_timeout(as_duration(v)?),
                        "thread_name" => config.set_thread_name(as_string(v)?),
                        _ => return Err(anyhow!("invalid key {k}")),
                    }
                    Ok(())
                })?;

                let address = address.ok_or_else(|| anyhow!("no target address has been set"))?;
                match network.as_str() {
                    "tcp" | "tcp4" | "tcp6" | "unix" => {}
                    _ => return Err(anyhow!("unsupported network {network}")),
                }
                config.set_network(network);
                config.set_address(address);
                if !prefix.is_empty() {
                    config.set_protocol(Arc::new(DogStatsd::with_prefix(prefix)));
                }
                Ok(config)
            }
            Yaml::String(s) => Ok(NetBackendConfig::new(DogStatsd::new(), "tcp", s.as_str())),
            _ => Err(anyhow!(
                "yaml value type for 'metrics backend config' should be 'map' or 'string'"
            )),
        }
    }
}
