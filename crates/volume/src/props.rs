// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dataset property sets passed to `zfs create`/`clone`/`set`.
//!
//! Mirrors the reference implementation's `props` dict subclass: an
//! ordered key/value map that composes with `+`, plus the handful of
//! constant property sets it defines.

use indexmap::IndexMap;
use std::ops::Add;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Props(IndexMap<String, String>);

impl Props {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `-o key=value` arguments for `zfs create`/`clone`, in insertion order.
    pub fn as_create_args(&self) -> Vec<String> {
        self.iter().flat_map(|(k, v)| ["-o".to_string(), format!("{k}={v}")]).collect()
    }
}

impl Add for Props {
    type Output = Props;

    fn add(mut self, rhs: Props) -> Props {
        for (k, v) in rhs.0 {
            self.0.insert(k, v);
        }
        self
    }
}

pub fn compression() -> Props {
    Props::new().set("compression", "zstd")
}

pub fn no_compression() -> Props {
    Props::new().set("compression", "off")
}

pub fn no_atime() -> Props {
    Props::new().set("atime", "off")
}

#[cfg(test)]
#[path = "props_tests.rs"]
mod tests;
