// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HPORT Global Configuration - Single Source of Truth
//!
//! This module centralizes ALL registry capacities and the runtime
//! configuration of the port manager.
//! **NEVER hardcode capacities elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time capacities. Every registry pool is sized
//!   once from these constants and never grows.
//! - **Level 2 (Dynamic)**: [`RouDiConfig`], validated once when the
//!   [`PortManager`](crate::roudi::PortManager) is constructed.
//!
//! # Example
//!
//! ```
//! use hport::config::{ConnectionPolicy, RouDiConfig};
//!
//! let config = RouDiConfig::builder()
//!     .connection_policy(ConnectionPolicy::MultiPublisher)
//!     .max_chunks_held_per_subscriber(64)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.connection_policy(), ConnectionPolicy::MultiPublisher);
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =======================================================================
// Registry capacities
// =======================================================================

/// Maximum number of publisher ports in the registry.
pub const MAX_PUBLISHERS: usize = 512;

/// Maximum number of subscriber ports in the registry.
pub const MAX_SUBSCRIBERS: usize = 1024;

/// Maximum number of interface (gateway) ports.
pub const MAX_INTERFACE_NUMBER: usize = 4;

/// Maximum number of application ports, one per registered process.
pub const MAX_PROCESS_NUMBER: usize = 300;

/// Maximum number of node records.
pub const MAX_NODE_NUMBER: usize = 1000;

/// Maximum number of condition variables (one per wait-set).
pub const MAX_NUMBER_OF_CONDITION_VARIABLES: usize = 1024;

/// Maximum number of event variables (one per listener).
pub const MAX_NUMBER_OF_EVENT_VARIABLES: usize = 128;

// =======================================================================
// Per-port bounds
// =======================================================================

/// Connection list capacity of a single publisher.
pub const MAX_SUBSCRIBERS_PER_PUBLISHER: usize = 256;

/// Connection list capacity of a single subscriber under the multi-publisher
/// policy. The single-publisher policy caps it at one.
pub const MAX_PUBLISHERS_PER_SUBSCRIBER: usize = 16;

/// Maximum number of samples a publisher retains for late joiners.
pub const MAX_PUBLISHER_HISTORY: usize = 16;

/// Maximum delivery queue capacity of a subscriber.
pub const MAX_SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

/// Upper bound on chunks a subscriber may hold (taken, not yet released).
pub const MAX_CHUNKS_HELD_PER_SUBSCRIBER_SIMULTANEOUSLY: u32 = 256;

/// Maximum number of attachments of a single wait-set.
pub const MAX_NUMBER_OF_ATTACHMENTS_PER_WAITSET: usize = 128;

/// Capacity of the CaPro message queue of an interface port.
pub const MAX_INTERFACE_CAPRO_FIFO_SIZE: usize = 128;

/// Number of notification slots of an event variable.
pub const MAX_NUMBER_OF_EVENTS_PER_LISTENER: usize = 128;

/// Maximum number of distinct offered services tracked by the service registry.
pub const MAX_SERVICE_REGISTRY_ENTRIES: usize = MAX_PUBLISHERS;

/// Maximum length of a process name (bytes, truncated on construction).
pub const MAX_PROCESS_NAME_LENGTH: usize = 100;

/// Maximum length of a node name (bytes, truncated on construction).
pub const MAX_NODE_NAME_LENGTH: usize = 100;

/// Environment variable selecting the connection policy in [`RouDiConfig::from_env`].
pub const CONNECTION_POLICY_ENV: &str = "HPORT_CONNECTION_POLICY";

/// How many publishers a single subscriber may be connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionPolicy {
    /// A subscriber connects to at most one publisher per description.
    #[default]
    SinglePublisher,
    /// A subscriber connects to every offered publisher matching its description.
    MultiPublisher,
}

impl ConnectionPolicy {
    /// Capacity of the subscriber-side connection list under this policy.
    #[must_use]
    pub const fn max_publishers_per_subscriber(self) -> usize {
        match self {
            Self::SinglePublisher => 1,
            Self::MultiPublisher => MAX_PUBLISHERS_PER_SUBSCRIBER,
        }
    }
}

impl fmt::Display for ConnectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SinglePublisher => write!(f, "single"),
            Self::MultiPublisher => write!(f, "multi"),
        }
    }
}

impl FromStr for ConnectionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "one-to-many" => Ok(Self::SinglePublisher),
            "multi" | "many-to-many" => Ok(Self::MultiPublisher),
            other => Err(ConfigError::UnknownConnectionPolicy(other.to_string())),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown connection policy: {0} (expected 'single' or 'multi')")]
    UnknownConnectionPolicy(String),

    #[error("max chunks held per subscriber must be in 1..={max}, got {value}")]
    InvalidChunksHeldLimit { value: u32, max: u32 },
}

/// Runtime configuration of the port manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouDiConfig {
    connection_policy: ConnectionPolicy,
    max_chunks_held_per_subscriber: u32,
}

impl RouDiConfig {
    /// Start building a configuration from the defaults.
    #[must_use]
    pub fn builder() -> RouDiConfigBuilder {
        RouDiConfigBuilder::default()
    }

    /// Default configuration overridden by `HPORT_CONNECTION_POLICY` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Ok(value) = std::env::var(CONNECTION_POLICY_ENV) {
            builder = builder.connection_policy(value.parse()?);
        }
        builder.build()
    }

    #[must_use]
    pub fn connection_policy(&self) -> ConnectionPolicy {
        self.connection_policy
    }

    #[must_use]
    pub fn max_chunks_held_per_subscriber(&self) -> u32 {
        self.max_chunks_held_per_subscriber
    }

    /// Check every runtime value against its compile-time bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let held = self.max_chunks_held_per_subscriber;
        if held == 0 || held > MAX_CHUNKS_HELD_PER_SUBSCRIBER_SIMULTANEOUSLY {
            return Err(ConfigError::InvalidChunksHeldLimit {
                value: held,
                max: MAX_CHUNKS_HELD_PER_SUBSCRIBER_SIMULTANEOUSLY,
            });
        }
        Ok(())
    }
}

impl Default for RouDiConfig {
    fn default() -> Self {
        Self {
            connection_policy: ConnectionPolicy::default(),
            max_chunks_held_per_subscriber: MAX_CHUNKS_HELD_PER_SUBSCRIBER_SIMULTANEOUSLY,
        }
    }
}

/// Builder for [`RouDiConfig`].
#[derive(Debug, Clone, Default)]
pub struct RouDiConfigBuilder {
    config: RouDiConfig,
}

impl RouDiConfigBuilder {
    #[must_use]
    pub fn connection_policy(mut self, policy: ConnectionPolicy) -> Self {
        self.config.connection_policy = policy;
        self
    }

    #[must_use]
    pub fn max_chunks_held_per_subscriber(mut self, limit: u32) -> Self {
        self.config.max_chunks_held_per_subscriber = limit;
        self
    }

    pub fn build(self) -> Result<RouDiConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Per-port memory placement info handed over by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortConfigInfo {
    pub port_type: u32,
    pub device_id: u32,
    pub memory_type: u32,
}

impl PortConfigInfo {
    #[must_use]
    pub const fn new(port_type: u32, device_id: u32, memory_type: u32) -> Self {
        Self {
            port_type,
            device_id,
            memory_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RouDiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.connection_policy(), ConnectionPolicy::SinglePublisher);
    }

    #[test]
    fn test_connection_policy_parse() {
        assert_eq!(
            "single".parse::<ConnectionPolicy>(),
            Ok(ConnectionPolicy::SinglePublisher)
        );
        assert_eq!(
            " Multi ".parse::<ConnectionPolicy>(),
            Ok(ConnectionPolicy::MultiPublisher)
        );
        assert!(matches!(
            "broadcast".parse::<ConnectionPolicy>(),
            Err(ConfigError::UnknownConnectionPolicy(_))
        ));
    }

    #[test]
    fn test_builder_rejects_zero_held_limit() {
        let result = RouDiConfig::builder()
            .max_chunks_held_per_subscriber(0)
            .build();
        assert_eq!(
            result,
            Err(ConfigError::InvalidChunksHeldLimit {
                value: 0,
                max: MAX_CHUNKS_HELD_PER_SUBSCRIBER_SIMULTANEOUSLY
            })
        );
    }

    #[test]
    fn test_builder_rejects_limit_above_compile_time_bound() {
        let result = RouDiConfig::builder()
            .max_chunks_held_per_subscriber(MAX_CHUNKS_HELD_PER_SUBSCRIBER_SIMULTANEOUSLY + 1)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_connection_capacity() {
        assert_eq!(
            ConnectionPolicy::SinglePublisher.max_publishers_per_subscriber(),
            1
        );
        assert_eq!(
            ConnectionPolicy::MultiPublisher.max_publishers_per_subscriber(),
            MAX_PUBLISHERS_PER_SUBSCRIBER
        );
    }
}
