// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version and branch string parsing.
//!
//! `FreeBSDVersion` parses release strings like `13.2-RELEASE-p4` into the short
//! jail-dataset name `132p4`; `PortsBranchVersion` parses quarterly branch strings
//! like `2023Q4` (optionally `@<snapshot-timestamp>`).

use crate::error::PdmError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(
            r"(?x)
            ^
            (?P<release>[1-9]\d*\.[0-9])
            -
            (?:
                (?:(?P<pre>BETA|RC)(?P<level>[1-9]\d*))
                |
                (?P<rel>RELEASE)(?:-p(?P<patch>[1-9]\d*))?
            )
            $
            ",
        )
        .unwrap()
    })
}

/// A parsed FreeBSD release version, e.g. `13.2-RELEASE-p4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBSDVersion {
    release: String,
    kind: VersionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum VersionKind {
    Beta(u32),
    Rc(u32),
    Release(u32),
}

impl FreeBSDVersion {
    /// Parse a version string, e.g. `13.2-RELEASE-p4` or `14.0-BETA2`.
    pub fn parse(input: &str) -> Result<Self, PdmError> {
        let caps = version_re()
            .captures(input)
            .ok_or_else(|| PdmError::InvalidVersion(input.to_string()))?;
        let release = caps["release"].to_string();
        let kind = if let Some(pre) = caps.name("pre") {
            let level: u32 = caps["level"].parse().unwrap_or(0);
            match pre.as_str() {
                "BETA" => VersionKind::Beta(level),
                _ => VersionKind::Rc(level),
            }
        } else {
            let patch = caps
                .name("patch")
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0);
            VersionKind::Release(patch)
        };
        Ok(Self { release, kind })
    }

    /// The short jail-dataset name, e.g. `132p4`.
    pub fn shortname(&self) -> String {
        format!("{}{}", self.release.replace('.', ""), self.branch_tag())
    }

    /// The release digits alone, e.g. `13.2` — the upstream `releng/<release>`
    /// git branch suffix.
    pub fn release(&self) -> &str {
        &self.release
    }

    /// The branch-transition tag this version's source-tree snapshot is
    /// named with, e.g. `p4` or `b2`.
    pub fn branch_tag(&self) -> String {
        match self.kind {
            VersionKind::Beta(level) => format!("b{level}"),
            VersionKind::Rc(level) => format!("c{level}"),
            VersionKind::Release(patch) => format!("p{patch}"),
        }
    }

    /// The canonical full version string `poudriere jget ... version` would
    /// report, e.g. `13.2-RELEASE-p4` or `14.0-BETA2`.
    pub fn longname(&self) -> String {
        match self.kind {
            VersionKind::Beta(level) => format!("{}-BETA{level}", self.release),
            VersionKind::Rc(level) => format!("{}-RC{level}", self.release),
            VersionKind::Release(0) => format!("{}-RELEASE", self.release),
            VersionKind::Release(patch) => format!("{}-RELEASE-p{patch}", self.release),
        }
    }
}

fn branch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^(?P<year>2\d{3})Q(?P<quarter>[1-4])(?:@(?P<snap>\d+))?$").unwrap()
    })
}

/// A parsed ports-tree quarterly branch, e.g. `2023Q4` or `2023Q4@1699999999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortsBranchVersion {
    year: u32,
    quarter: u32,
    snap: Option<u64>,
}

impl PortsBranchVersion {
    /// Parse a branch string, e.g. `2023Q4`.
    pub fn parse(input: &str) -> Result<Self, PdmError> {
        let caps = branch_re()
            .captures(input)
            .ok_or_else(|| PdmError::InvalidVersion(input.to_string()))?;
        let year: u32 = caps["year"].parse().unwrap_or(0);
        let quarter: u32 = caps["quarter"].parse().unwrap_or(0);
        let snap = caps.name("snap").and_then(|m| m.as_str().parse().ok());
        Ok(Self { year, quarter, snap })
    }

    /// The branch's short dataset name, e.g. `2023Q4`.
    pub fn name(&self) -> String {
        format!("{}Q{}", self.year, self.quarter)
    }

    /// The snapshot suffix, if this version pinned a specific snapshot.
    pub fn snapshot(&self) -> Option<u64> {
        self.snap
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
