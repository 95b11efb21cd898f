//! Configuration of UrlDoc
//!
//! Everything is read from the environment, empty values are treated as not set

use std::net::SocketAddr;

use anyhow::Result;

use crate::link_service::AliasStrategy;
use crate::link_service::DEFAULT_ALIAS_LENGTH;
use crate::password::generate;
use crate::registry::RegistryConfig;
use crate::utils::env_var;
use crate::utils::env_var_or_else;

const DEFAULT_ADDRESS: &str = "0.0.0.0:6000";
const DEFAULT_BASE_URL: &str = "https://urldoc/";

/// Application configuration
pub struct Config {
    /// Address to listen on
    pub address: SocketAddr,

    /// Base of every short URL, the alias is appended to it
    pub base_url: String,

    /// What to do when no alias is requested
    pub alias_strategy: AliasStrategy,

    /// Secret used to sign access tokens
    pub jwt_secret: String,

    /// Where the links and users live
    pub registry: RegistryConfig,
}

impl Config {
    /// Detect the configuration from the environment
    ///
    /// # Errors
    ///
    /// Will return `Err` when `ADDRESS`, `PORT` or `ALIAS_LENGTH` can not be parsed
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            address: address_from_env()?,
            base_url: env_var_or_else("BASE_URL", || String::from(DEFAULT_BASE_URL)),
            alias_strategy: alias_strategy_from_env()?,
            jwt_secret: env_var_or_else("JWT_SECRET", || {
                let jwt_secret = generate();
                tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
                jwt_secret
            }),
            registry: env_var("DATABASE_URL")
                .map_or(RegistryConfig::Memory, |url| RegistryConfig::Postgres { url }),
        })
    }
}

fn address_from_env() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Some(port) = env_var("PORT") {
        address.set_port(port.parse::<u16>()?);
    }

    Ok(address)
}

fn alias_strategy_from_env() -> Result<AliasStrategy> {
    alias_strategy(env_var("DEFAULT_ALIAS"), env_var("ALIAS_LENGTH"))
}

fn alias_strategy(
    default_alias: Option<String>,
    alias_length: Option<String>,
) -> Result<AliasStrategy> {
    if let Some(alias) = default_alias {
        tracing::warn!(
            r#"`DEFAULT_ALIAS` is set, every request without alias will overwrite "{alias}""#
        );

        return Ok(AliasStrategy::Fixed(alias));
    }

    let length = alias_length
        .map(|length| length.parse::<usize>())
        .transpose()?
        .unwrap_or(DEFAULT_ALIAS_LENGTH);

    if length == 0 {
        anyhow::bail!("`ALIAS_LENGTH` should be at least 1");
    }

    Ok(AliasStrategy::Random { length })
}
