//! Environment-driven application configuration.
//!
//! Settings are read through [`mockable::Env`] so parsing is testable
//! without touching the process environment. Every setting has a default;
//! only present-but-invalid values are errors.

use std::net::SocketAddr;
use std::time::Duration;

use mockable::Env;

use crate::domain::MissingRulePolicy;

const BIND_ADDR_ENV: &str = "BIND_ADDR";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const REDIS_URL_ENV: &str = "REDIS_URL";
const LOCAL_CACHE_TTL_ENV: &str = "LOCAL_CACHE_TTL_SECS";
const LOCAL_CACHE_CAPACITY_ENV: &str = "LOCAL_CACHE_CAPACITY";
const ZONE_SET_TTL_ENV: &str = "ZONE_SET_TTL_SECS";
const SHARED_CACHE_TTL_ENV: &str = "SHARED_CACHE_TTL_SECS";
const SHARED_CACHE_JITTER_ENV: &str = "SHARED_CACHE_TTL_JITTER_SECS";
const SHARED_CACHE_TIMEOUT_ENV: &str = "SHARED_CACHE_OP_TIMEOUT_MS";
const MISSING_RULE_POLICY_ENV: &str = "MISSING_RULE_POLICY";

/// Errors raised while validating application configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Application settings derived from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL; the in-memory fixture store is used when absent.
    pub database_url: Option<String>,
    /// Redis URL; the no-op shared cache is used when absent.
    pub redis_url: Option<String>,
    /// Process-local fare cache entry lifetime.
    pub local_cache_ttl: Duration,
    /// Process-local fare cache capacity (entries).
    pub local_cache_capacity: usize,
    /// Zone-set snapshot lifetime.
    pub zone_set_ttl: Duration,
    /// Shared cache entry lifetime.
    pub shared_cache_ttl: Duration,
    /// Maximum random extension added to shared cache TTLs.
    pub shared_cache_ttl_jitter: Duration,
    /// Deadline for each shared cache network operation.
    pub shared_cache_op_timeout: Duration,
    /// Behaviour when no rule exists for a requested pair.
    pub missing_rule_policy: MissingRulePolicy,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a variable is set to a value
    /// that does not parse.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: parsed_or(
                env,
                BIND_ADDR_ENV,
                SocketAddr::from(([0, 0, 0, 0], 8080)),
                "host:port",
            )?,
            database_url: env.string(DATABASE_URL_ENV),
            redis_url: env.string(REDIS_URL_ENV),
            local_cache_ttl: seconds_or(env, LOCAL_CACHE_TTL_ENV, 3600)?,
            local_cache_capacity: parsed_or(env, LOCAL_CACHE_CAPACITY_ENV, 1024, "a count")?,
            zone_set_ttl: seconds_or(env, ZONE_SET_TTL_ENV, 300)?,
            shared_cache_ttl: seconds_or(env, SHARED_CACHE_TTL_ENV, 3600)?,
            shared_cache_ttl_jitter: seconds_or(env, SHARED_CACHE_JITTER_ENV, 60)?,
            shared_cache_op_timeout: millis_or(env, SHARED_CACHE_TIMEOUT_ENV, 250)?,
            missing_rule_policy: policy_from_env(env)?,
        })
    }
}

fn parsed_or<E: Env, T: std::str::FromStr>(
    env: &E,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match env.string(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidEnv {
            name,
            value,
            expected,
        }),
        None => Ok(default),
    }
}

fn seconds_or<E: Env>(env: &E, name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_secs(parsed_or(
        env, name, default, "seconds",
    )?))
}

fn millis_or<E: Env>(env: &E, name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    Ok(Duration::from_millis(parsed_or(
        env,
        name,
        default,
        "milliseconds",
    )?))
}

fn policy_from_env<E: Env>(env: &E) -> Result<MissingRulePolicy, ConfigError> {
    match env.string(MISSING_RULE_POLICY_ENV) {
        None => Ok(MissingRulePolicy::default()),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "zero-fare" | "zero_fare" => Ok(MissingRulePolicy::ZeroFare),
            "reject" => Ok(MissingRulePolicy::Reject),
            _ => Err(ConfigError::InvalidEnv {
                name: MISSING_RULE_POLICY_ENV,
                value,
                expected: "zero-fare|reject",
            }),
        },
    }
}
