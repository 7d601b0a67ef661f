//! Cookie sets compared during matching.
//!
//! Only names and values take part; domain, path and expiry are ignored.

use std::collections::BTreeMap;

use crate::archive::model::Cookie;

/// Order-independent name → value mapping. A repeated name keeps its last
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSet(BTreeMap<String, String>);

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cookies recorded on an archived request.
    pub fn from_recorded(cookies: &[Cookie]) -> Self {
        cookies
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    /// Parse one or more `Cookie` request header values (`a=1; b=2`).
    /// Pairs without `=` are skipped.
    pub fn from_header_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        values
            .into_iter()
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty())
            .collect()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CookieSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
