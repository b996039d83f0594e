//! Configuration access port trait.
//!
//! Typed getters return the default when the key is absent and
//! `ConfigInvalid` when it is present but does not parse.

use crate::domain::error::TrendscopeError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TrendscopeError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, TrendscopeError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TrendscopeError>;
    /// Comma-separated list, trimmed, empty entries dropped.
    fn get_list(&self, section: &str, key: &str) -> Vec<String>;
}
