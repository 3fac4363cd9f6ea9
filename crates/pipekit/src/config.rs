//! Pipeline service settings read from the environment.
//!
//! The library never reads these itself; services load them once at
//! startup and pass the pieces they need to a [`ProviderFilter`] or a
//! destination.
//!
//! [`ProviderFilter`]: crate::ProviderFilter

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ConfigError;

pub const KAFKA_ASYNC: &str = "KAFKA_ASYNC";
pub const KAFKA_BATCH_SEND: &str = "KAFKA_BATCH_SEND";
pub const KAFKA_BATCH_SEND_COUNT: &str = "KAFKA_BATCH_SEND_COUNT";
pub const KAFKA_BATCH_SEND_TIME: &str = "KAFKA_BATCH_SEND_TIME";
pub const KAFKA_BROKER_HOST: &str = "KAFKA_BROKER_HOST";
pub const KAFKA_BROKER_PORT: &str = "KAFKA_BROKER_PORT";
pub const KAFKA_GROUP_NAME: &str = "KAFKA_GROUP_NAME";
pub const KAFKA_TOPIC_INBOUND: &str = "KAFKA_TOPIC_INBOUND";
pub const KAFKA_TOPIC_OUTBOUND: &str = "KAFKA_TOPIC_OUTBOUND";
pub const LOGSTASH_HOST: &str = "LOGSTASH_HOST";
pub const LOGSTASH_PORT: &str = "LOGSTASH_PORT";
pub const LOGSTASH_VERSION: &str = "LOGSTASH_VERSION";
pub const INCLUDED_PROVIDERS: &str = "INCLUDED_PROVIDERS";
pub const EXCLUDED_PROVIDERS: &str = "EXCLUDED_PROVIDERS";

/// Broker connection and batching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSettings {
    pub async_send: bool,
    pub batch_send: bool,
    /// Messages per batch (default 20).
    pub batch_send_count: u32,
    /// Seconds between batch flushes (default 60).
    pub batch_send_time: u32,
    pub broker_host: String,
    pub broker_port: u16,
    pub group_name: String,
    pub topic_inbound: String,
    pub topic_outbound: String,
}

impl KafkaSettings {
    /// `host:port` of the broker.
    pub fn broker_address(&self) -> String {
        format!("{}:{}", self.broker_host, self.broker_port)
    }
}

/// Log shipping endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogstashSettings {
    pub host: String,
    pub port: u16,
    pub version: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub kafka: KafkaSettings,
    pub logstash: LogstashSettings,
    pub included_providers: Vec<String>,
    pub excluded_providers: Vec<String>,
}

/// One field per variable. The environment source lowercases keys.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    kafka_async: bool,
    #[serde(default)]
    kafka_batch_send: bool,
    #[serde(default = "default_batch_send_count")]
    kafka_batch_send_count: u32,
    #[serde(default = "default_batch_send_time")]
    kafka_batch_send_time: u32,
    kafka_broker_host: String,
    #[serde(default = "default_broker_port")]
    kafka_broker_port: u16,
    kafka_group_name: String,
    #[serde(default)]
    kafka_topic_inbound: String,
    kafka_topic_outbound: String,
    logstash_host: String,
    logstash_port: u16,
    #[serde(default = "default_logstash_version")]
    logstash_version: u8,
    #[serde(default)]
    included_providers: Vec<String>,
    #[serde(default)]
    excluded_providers: Vec<String>,
}

fn default_batch_send_count() -> u32 {
    20
}

fn default_batch_send_time() -> u32 {
    60
}

fn default_broker_port() -> u16 {
    9092
}

fn default_logstash_version() -> u8 {
    1
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(environment())
    }

    /// Read settings from `vars` instead of the process environment.
    pub fn from_map<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::load(environment().source(Some(vars)))
    }

    fn load(source: ::config::Environment) -> Result<Self, ConfigError> {
        let raw: RawSettings = ::config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?;
        Ok(raw.into())
    }
}

/// Empty variables count as unset; only the provider lists are split.
fn environment() -> ::config::Environment {
    ::config::Environment::default()
        .ignore_empty(true)
        .list_separator(",")
        .with_list_parse_key("included_providers")
        .with_list_parse_key("excluded_providers")
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        Self {
            kafka: KafkaSettings {
                async_send: raw.kafka_async,
                batch_send: raw.kafka_batch_send,
                batch_send_count: raw.kafka_batch_send_count,
                batch_send_time: raw.kafka_batch_send_time,
                broker_host: raw.kafka_broker_host,
                broker_port: raw.kafka_broker_port,
                group_name: raw.kafka_group_name,
                topic_inbound: raw.kafka_topic_inbound,
                topic_outbound: raw.kafka_topic_outbound,
            },
            logstash: LogstashSettings {
                host: raw.logstash_host,
                port: raw.logstash_port,
                version: raw.logstash_version,
            },
            included_providers: clean_list(raw.included_providers),
            excluded_providers: clean_list(raw.excluded_providers),
        }
    }
}

/// Trimmed, with blank entries dropped.
fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
