//! Per-store configuration.
//!
//! Reads optional overrides from the environment:
//! - `EDGELINK_TABLE`: edge table name (default: "edge")
//! - `EDGELINK_DEFAULT_TYPE`: default edge type (default: none)
//! - `EDGELINK_PAGE_SIZE`: rows fetched per cursor page (default: 500)

use serde::Deserialize;

use crate::error::{EdgeError, Result};
use crate::schema::DEFAULT_TABLE;
use crate::types::EdgeType;

pub const ENV_TABLE: &str = "EDGELINK_TABLE";
pub const ENV_DEFAULT_TYPE: &str = "EDGELINK_DEFAULT_TYPE";
pub const ENV_PAGE_SIZE: &str = "EDGELINK_PAGE_SIZE";

pub const DEFAULT_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub table_name: String,
    pub default_type: Option<EdgeType>,
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            table_name: DEFAULT_TABLE.to_string(),
            default_type: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StoreConfig {
    pub fn new(table_name: impl Into<String>, default_type: Option<EdgeType>) -> Self {
        StoreConfig {
            table_name: table_name.into(),
            default_type,
            ..StoreConfig::default()
        }
    }

    /// Defaults overlaid with whatever `EDGELINK_*` variables are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`StoreConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = StoreConfig::default();

        if let Some(table) = lookup(ENV_TABLE) {
            config.table_name = table;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_TYPE) {
            let ty = raw.trim().parse::<i64>().map_err(|e| EdgeError::InvalidConfig {
                reason: format!("{ENV_DEFAULT_TYPE}={raw:?}: {e}"),
            })?;
            config.default_type = Some(EdgeType(ty));
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            config.page_size = raw.trim().parse::<usize>().map_err(|e| EdgeError::InvalidConfig {
                reason: format!("{ENV_PAGE_SIZE}={raw:?}: {e}"),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the table name is a plain SQL identifier (it is interpolated
    /// into statements) and that the page size is non-zero.
    pub fn validate(&self) -> Result<()> {
        let mut chars = self.table_name.chars();
        let valid_name = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_name {
            return Err(EdgeError::InvalidConfig {
                reason: format!("table name {:?} is not a valid identifier", self.table_name),
            });
        }
        if self.page_size == 0 {
            return Err(EdgeError::InvalidConfig {
                reason: "page size must be at least 1".into(),
            });
        }
        Ok(())
    }
}
