// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GetDepends`: resolve a single origin's build dependencies without
//! actually building it, via `poudriere bulk -n`.
//!
//! Shares the jail/ports-tree resolution and activation steps with
//! `RunBuild` (see [`crate::build::prepare_build`]); the only difference is
//! the `-n` (dry run) flag and reading back `.poudriere.pkg_deps%` instead
//! of correlating per-port logs.

use crate::build::{parse_deps, parse_pairs, PreparedBuild};
use crate::environment::WorkerEnv;
use crate::error::WorkerError;
use pdm_core::TaskId;
use std::collections::HashMap;

pub async fn get_depends(
    env: &WorkerEnv,
    task_id: &TaskId,
    jail_version: &str,
    ports_branch: &str,
    portja_targets: &[String],
    origin: &str,
) -> Result<serde_json::Value, WorkerError> {
    let (prepared, _generated_origins) =
        crate::build::prepare_build(env, task_id, jail_version, ports_branch, portja_targets).await?;
    let PreparedBuild { jail, ports, active, poudriere, .. } = prepared;

    let package_name = format!("{}-{}", jail.name, ports.name);
    let task_dir = env.logs_path.join("depends").join(&package_name).join(origin.replace('/', "_"));
    tokio::fs::create_dir_all(&task_dir).await?;

    let all_pkgs_path = task_dir.join(".poudriere.all_pkgs%");
    let pkg_deps_path = task_dir.join(".poudriere.pkg_deps%");

    // `-N` is not passed: accept every exit code so the combined
    // stdout/stderr is captured either way, and let the `Error:` lines in
    // the output (rather than the exit status) drive success/failure.
    let output = match poudriere
        .cmd(["bulk", "-j", jail.name.as_str(), "-p", ports.name.as_str(), "-n", origin])
        .exit_ok(0..=255)
        .run()
        .await
    {
        Ok(bytes) => bytes,
        Err(err) => {
            active.close().await?;
            return Err(err.into());
        }
    };
    let text = String::from_utf8_lossy(&output);
    let errors: Vec<&str> = text.lines().filter(|line| line.starts_with("Error:")).collect();
    if !errors.is_empty() {
        active.close().await?;
        return Err(WorkerError::BuildError(errors.join("\n")));
    }

    let all_pkgs = parse_pairs(&all_pkgs_path).await;
    let pkg_deps = parse_deps(&pkg_deps_path).await;

    active.close().await?;

    let result: HashMap<String, Vec<String>> = pkg_deps
        .into_iter()
        .map(|(pkg, dep_pkgs)| {
            let dep_origins = dep_pkgs
                .into_iter()
                .map(|dep_pkg| all_pkgs.get(&dep_pkg).cloned().unwrap_or(dep_pkg))
                .collect::<Vec<_>>();
            (all_pkgs.get(&pkg).cloned().unwrap_or(pkg), dep_origins)
        })
        .collect();

    Ok(serde_json::to_value(result)?)
}
