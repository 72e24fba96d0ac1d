//! Threshold Registry (§4.6): override-else-default lookup, memoised for
//! the lifetime of one evaluator invocation and discarded afterwards — it
//! is deliberately not a process-wide cache, so an operator setting an
//! override takes effect on the very next evaluation.
//!
//! A registry instance is constructed per evaluation and passed in as an
//! explicit dependency rather than reached for ambiently, per the
//! context-passed-services principle this engine follows throughout.

use std::cell::RefCell;
use std::collections::HashMap;

use model::{ThresholdKey, ThresholdValue};
use sqlx::PgPool;

use crate::config::ThresholdDefaults;
use db::error::DatabaseResult;

pub struct ThresholdRegistry<'a> {
    pool: &'a PgPool,
    maintenance_id: String,
    defaults: &'a ThresholdDefaults,
    cache: RefCell<HashMap<String, Option<ThresholdValue>>>,
}

impl<'a> ThresholdRegistry<'a> {
    pub fn new(pool: &'a PgPool, maintenance_id: impl Into<String>, defaults: &'a ThresholdDefaults) -> Self {
        Self {
            pool,
            maintenance_id: maintenance_id.into(),
            defaults,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the override for `key` if one exists, else the process
    /// default, else `None` if neither is configured.
    pub async fn get(&self, key: &str) -> DatabaseResult<Option<ThresholdValue>> {
        if let Some(cached) = self.cache.borrow().get(key) {
            return Ok(cached.clone());
        }
        let threshold_key = ThresholdKey::new(key);
        let resolved = match db::threshold::get_override(self.pool, &self.maintenance_id, &threshold_key).await? {
            Some(value) => Some(value),
            None => self.defaults.get(key).cloned(),
        };
        self.cache.borrow_mut().insert(key.to_string(), resolved.clone());
        Ok(resolved)
    }

    pub async fn get_f64(&self, key: &str) -> DatabaseResult<Option<f64>> {
        Ok(self.get(key).await?.and_then(|v| v.as_f64()))
    }

    pub async fn get_string_set(&self, key: &str) -> DatabaseResult<Vec<String>> {
        Ok(self
            .get(key)
            .await?
            .and_then(|v| v.as_str_set().map(|s| s.to_vec()))
            .unwrap_or_default())
    }
}
