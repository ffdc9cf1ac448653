// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local `host:port` the Delve session is forwarded to

use crate::validation::ValidationError;
use std::fmt;
use std::net::TcpListener;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 2345;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddr {
    pub host: String,
    pub port: u16,
}

impl Default for ListenAddr {
    fn default() -> Self {
        Self { host: DEFAULT_HOST.to_string(), port: DEFAULT_PORT }
    }
}

impl ListenAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }

    /// Parse `host:port`; an empty host means loopback.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let (host, port) = s.rsplit_once(':').ok_or_else(|| ValidationError::Listen(s.to_string()))?;
        let port = port.parse::<u16>().map_err(|_| ValidationError::Listen(s.to_string()))?;
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        Ok(Self::new(host, port))
    }

    /// Replace port `0` with a port that is currently free on `host`.
    pub fn resolve_free_port(self) -> Result<Self, ValidationError> {
        if self.port != 0 {
            return Ok(self);
        }
        let listener = TcpListener::bind((self.host.as_str(), 0))
            .map_err(|e| ValidationError::Listen(format!("{self}: {e}")))?;
        let port = listener
            .local_addr()
            .map_err(|e| ValidationError::Listen(format!("{self}: {e}")))?
            .port();
        Ok(Self { port, ..self })
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[path = "listen_tests.rs"]
mod tests;
