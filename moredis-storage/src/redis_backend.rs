//! Redis-backed [`HashStore`]

use crate::traits::{Command, HashStore};
use moredis_core::{StoreError, StoreResult};
use redis::{Connection, Pipeline, RedisError};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const IO_TIMEOUT: Duration = Duration::from_secs(10);
const SENTINEL_SCHEME: &str = "sentinel://";

/// A single Redis connection with a client-side pipeline.
pub struct RedisStore {
    connection: Connection,
    pipeline: Pipeline,
    address: String,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to `address`.
    ///
    /// Accepts `host:port`, any `redis://` or `rediss://` URL, or
    /// `sentinel://host1:port,host2:port/<master>`, in which case each
    /// sentinel is asked for the current master until one answers.
    pub fn connect(address: &str) -> StoreResult<Self> {
        let url = match address.strip_prefix(SENTINEL_SCHEME) {
            Some(rest) => resolve_sentinel_master(address, rest)?,
            None => normalize_redis_url(address),
        };

        let connection = open_connection(&url).map_err(|e| connection_error(address, e))?;
        info!(address = %address, "Connected to Redis");

        Ok(Self {
            connection,
            pipeline: redis::pipe(),
            address: address.to_string(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl HashStore for RedisStore {
    fn send(&mut self, command: Command) -> StoreResult<()> {
        self.pipeline.cmd(&command.name).arg(&command.args);
        Ok(())
    }

    fn flush(&mut self) -> StoreResult<()> {
        let result = self.pipeline.query::<()>(&mut self.connection);
        self.pipeline.clear();
        result.map_err(|e| write_error("pipeline", e))
    }

    fn ping(&mut self) -> StoreResult<()> {
        redis::cmd("PING")
            .query::<String>(&mut self.connection)
            .map(|_| ())
            .map_err(|e| write_error("PING", e))
    }

    fn incr(&mut self, key: &str) -> StoreResult<i64> {
        redis::cmd("INCR")
            .arg(key)
            .query(&mut self.connection)
            .map_err(|e| write_error(&format!("INCR {}", key), e))
    }

    fn get_set(&mut self, key: &str, value: &str) -> StoreResult<Option<String>> {
        redis::cmd("GETSET")
            .arg(key)
            .arg(value)
            .query(&mut self.connection)
            .map_err(|e| write_error(&format!("GETSET {} {}", key, value), e))
    }

    fn del(&mut self, key: &str) -> StoreResult<()> {
        redis::cmd("DEL")
            .arg(key)
            .query::<i64>(&mut self.connection)
            .map(|_| ())
            .map_err(|e| write_error(&format!("DEL {}", key), e))
    }
}

/// `host:port` becomes `redis://host:port`; URLs with a scheme pass through.
pub fn normalize_redis_url(address: &str) -> String {
    if address.contains("://") {
        address.to_string()
    } else {
        format!("redis://{}", address)
    }
}

/// Split `host1:port,host2:port/<master>` into sentinel addresses and the
/// master name.
pub fn parse_sentinel_address(rest: &str) -> Option<(Vec<String>, String)> {
    let (hosts, master) = rest.split_once('/')?;
    let master = master.trim_end_matches('/');
    let hosts: Vec<String> = hosts
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect();
    if hosts.is_empty() || master.is_empty() {
        return None;
    }
    Some((hosts, master.to_string()))
}

fn resolve_sentinel_master(address: &str, rest: &str) -> StoreResult<String> {
    let (sentinels, master) = parse_sentinel_address(rest).ok_or_else(|| StoreError::Connection {
        address: address.to_string(),
        reason: "expected sentinel://host:port[,host:port...]/<master>".to_string(),
    })?;

    for sentinel in &sentinels {
        let lookup = open_connection(&normalize_redis_url(sentinel)).and_then(|mut con| {
            redis::cmd("SENTINEL")
                .arg("get-master-addr-by-name")
                .arg(&master)
                .query::<Option<(String, u16)>>(&mut con)
        });

        match lookup {
            Ok(Some((host, port))) => {
                debug!(sentinel = %sentinel, master = %master, host = %host, port, "Resolved Redis master");
                return Ok(format!("redis://{}:{}", host, port));
            }
            Ok(None) => warn!(sentinel = %sentinel, master = %master, "Sentinel does not know master"),
            Err(e) => warn!(sentinel = %sentinel, error = %e, "Sentinel lookup failed"),
        }
    }

    Err(StoreError::Connection {
        address: address.to_string(),
        reason: format!("no sentinel returned a master for {}", master),
    })
}

fn open_connection(url: &str) -> Result<Connection, RedisError> {
    let client = redis::Client::open(url)?;
    let connection = client.get_connection_with_timeout(CONNECT_TIMEOUT)?;
    connection.set_read_timeout(Some(IO_TIMEOUT))?;
    connection.set_write_timeout(Some(IO_TIMEOUT))?;
    Ok(connection)
}

fn connection_error(address: &str, e: RedisError) -> StoreError {
    StoreError::Connection {
        address: address.to_string(),
        reason: e.to_string(),
    }
}

fn write_error(command: &str, e: RedisError) -> StoreError {
    StoreError::Write {
        command: command.to_string(),
        reason: e.to_string(),
    }
}
