// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handle types returned by the volume façade. Both are plain names — the
//! façade is stateless and re-resolves them against `zfs` on every call, so
//! there's nothing to keep alive beyond the string.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dataset {
    pub name: String,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn pool(&self) -> &str {
        self.name.split('/').next().unwrap_or(&self.name)
    }

    pub fn child(&self, leaf: &str) -> Dataset {
        Dataset::new(format!("{}/{leaf}", self.name))
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot {
    pub dataset: String,
    pub name: String,
}

impl Snapshot {
    pub fn full_name(&self) -> String {
        format!("{}@{}", self.dataset, self.name)
    }

    /// Parse `dataset@snapshot`, as returned by `zfs list -t snapshot`.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (dataset, name) = full_name.split_once('@')?;
        Some(Self { dataset: dataset.to_string(), name: name.to_string() })
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

#[cfg(test)]
#[path = "dataset_tests.rs"]
mod tests;
