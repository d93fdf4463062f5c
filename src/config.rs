// src/config.rs

//! Server configuration, assembled from command-line flags.

use crate::core::CitrineError;
use serde::Deserialize;

/// The address of the master a replica follows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplicaOf {
    pub host: String,
    pub port: u16,
}

/// The server's runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The TCP port to listen on.
    pub port: u16,
    /// When set, this server runs as a replica of the given master.
    pub replicaof: Option<ReplicaOf>,
    /// The directory holding the snapshot file.
    pub dir: Option<String>,
    /// The snapshot file name inside `dir`.
    pub dbfilename: Option<String>,
    /// The default log filter, overridable with `RUST_LOG`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 6379,
            replicaof: None,
            dir: None,
            dbfilename: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parses `--port`, `--replicaof "<host> <port>"`, `--dir`, and
    /// `--dbfilename` from the given arguments (program name excluded).
    pub fn from_args<I>(args: I) -> Result<Self, CitrineError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--port" => {
                    let value = next_value(&mut iter, "--port")?;
                    config.port = value
                        .parse()
                        .map_err(|_| CitrineError::InvalidState(format!("invalid port: {value}")))?;
                }
                "--replicaof" => {
                    let value = next_value(&mut iter, "--replicaof")?;
                    let parts: Vec<&str> = value.split_whitespace().collect();
                    let [host, port] = parts.as_slice() else {
                        return Err(CitrineError::InvalidState(format!(
                            "--replicaof expects \"<host> <port>\", got \"{value}\""
                        )));
                    };
                    config.replicaof = Some(ReplicaOf {
                        host: (*host).to_string(),
                        port: port.parse().map_err(|_| {
                            CitrineError::InvalidState(format!("invalid master port: {port}"))
                        })?,
                    });
                }
                "--dir" => config.dir = Some(next_value(&mut iter, "--dir")?),
                "--dbfilename" => config.dbfilename = Some(next_value(&mut iter, "--dbfilename")?),
                other => {
                    return Err(CitrineError::InvalidState(format!(
                        "unknown argument '{other}'"
                    )));
                }
            }
        }
        Ok(config)
    }

    pub fn is_master(&self) -> bool {
        self.replicaof.is_none()
    }
}

fn next_value<I>(iter: &mut I, flag: &str) -> Result<String, CitrineError>
where
    I: Iterator<Item = String>,
{
    iter.next()
        .ok_or_else(|| CitrineError::InvalidState(format!("{flag} requires a value")))
}
