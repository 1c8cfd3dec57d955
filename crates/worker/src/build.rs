// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RunBuild`: the central orchestration workflow. Clones a scratch ports
//! tree, optionally runs `portja` to materialize generated ports, drives
//! `poudriere bulk` while correlating its per-port log files (via the
//! directory follower) against poudriere's own pkg/dependency bookkeeping
//! files, and publishes the resulting package set to the jail.
//!
//! The step sequence mirrors the richer build workflow this crate's task
//! model was distilled from; `original_source/poudomatic/worker/build.py`
//! only shows an older, simpler `Collection`/`Port`-based branch with no
//! `portja` or dotfile-correlation step, so only its subprocess-piping
//! texture is reused here — the dotfile formats below
//! (`.poudriere.all_pkgs%`, `.poudriere.pkg_deps%`, `.poudriere.ports.built`)
//! are this crate's own reasonable rendering of "one record per line,
//! whitespace-separated fields", documented as a judgment call in
//! `DESIGN.md`.

use crate::environment::{Poudriere, WorkerEnv};
use crate::error::WorkerError;
use crate::jail::Jail;
use crate::log_sink::StoreLogSink;
use crate::portstree::{ActivePortsTree, PortsTree};
use futures_util::StreamExt;
use pdm_core::TaskId;
use pdm_follow::DirectoryFollower;
use pdm_process::{Command, LogSink};
use pdm_store::TaskStore;
use pdm_volume::{Props, TempSnapshot};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

fn build_time_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    RE.get_or_init(|| regex::Regex::new(r"build time: .{8}").unwrap())
}

pub(crate) async fn parse_pairs(path: &Path) -> HashMap<String, String> {
    let Ok(contents) = tokio::fs::read_to_string(path).await else {
        return HashMap::new();
    };
    contents
        .lines()
        .filter_map(|line| line.split_once(' '))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

pub(crate) async fn parse_deps(path: &Path) -> HashMap<String, Vec<String>> {
    let Ok(contents) = tokio::fs::read_to_string(path).await else {
        return HashMap::new();
    };
    contents
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let origin = fields.next()?.to_string();
            Some((origin, fields.map(str::to_string).collect()))
        })
        .collect()
}

async fn parse_built(path: &Path) -> HashSet<String> {
    let Ok(contents) = tokio::fs::read_to_string(path).await else {
        return HashSet::new();
    };
    contents.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect()
}

/// Jail and ports tree resolved and activated for one build, with any
/// per-(jail, branch) `make.conf` override already copied in. Shared setup
/// for both `run_build` and `get_depends` (steps 1-4 of the build
/// workflow).
pub(crate) struct PreparedBuild {
    pub jail: Jail,
    pub ports: PortsTree,
    pub active: ActivePortsTree,
    pub make_conf_dst: PathBuf,
    pub poudriere: Poudriere,
}

pub(crate) async fn prepare_build(
    env: &WorkerEnv,
    task_id: &TaskId,
    jail_version: &str,
    ports_branch: &str,
    portja_targets: &[String],
) -> Result<(PreparedBuild, Vec<String>), WorkerError> {
    let jail = Jail::get(env, jail_version)
        .await?
        .ok_or_else(|| WorkerError::Environment(format!("no jail for version '{jail_version}'")))?;
    let ports = PortsTree::get(env, ports_branch)
        .await?
        .ok_or_else(|| WorkerError::Environment(format!("no ports tree for branch '{ports_branch}'")))?;

    let poudriere = env.poudriere(task_id).await?;
    let active = ports.activate(env, &poudriere).await?;

    // 2. Copy any existing per-(jail, branch) make.conf override into the
    // scratch tree's etc/.
    let make_conf_src = env.etc_path.join(format!("{}-{}-make.conf", jail.name, ports.name));
    let make_conf_dst = active.path().join("etc").join("make.conf");
    if let Ok(contents) = tokio::fs::read(&make_conf_src).await {
        if let Some(parent) = make_conf_dst.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&make_conf_dst, contents).await?;
    }

    // 3. Register jail and ports tree with this task's scratch poudriere;
    // `ports.activate()` above already `pset` the tree's mountpoint.
    let jail_mountpoint = env
        .zfs
        .get_property(&jail.dataset.name, "mountpoint")
        .await?
        .ok_or_else(|| WorkerError::Environment(format!("jail dataset '{}' is not mounted", jail.dataset.name)))?;
    poudriere.register_jail(&jail.name, Path::new(&jail_mountpoint), &jail.version.longname()).await?;

    // 4. Optional portja code-generation pass.
    let mut generated_origins = Vec::new();
    if !portja_targets.is_empty() {
        let mut args = vec![active.path().display().to_string(), make_conf_dst.display().to_string()];
        args.extend(portja_targets.iter().cloned());
        Command::new("portja").args(args).run().await?;

        let generated_path = active.path().join("portja.generated");
        let generated = tokio::fs::read_to_string(&generated_path).await?;
        generated_origins =
            generated.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();
    }

    Ok((PreparedBuild { jail, ports, active, make_conf_dst, poudriere }, generated_origins))
}

#[allow(clippy::too_many_arguments)]
pub async fn run_build(
    env: &WorkerEnv,
    store: &Arc<TaskStore>,
    task_id: &TaskId,
    jail_version: &str,
    ports_branch: &str,
    portja_targets: &[String],
    requested_origins: &[String],
) -> Result<serde_json::Value, WorkerError> {
    let (prepared, generated_origins) = prepare_build(env, task_id, jail_version, ports_branch, portja_targets).await?;
    let PreparedBuild { jail, ports, active, poudriere, .. } = prepared;

    let sink: Arc<dyn LogSink> = Arc::new(StoreLogSink::new(store.clone(), task_id.clone()));

    let mut origins: Vec<String> = requested_origins.to_vec();
    if origins.is_empty() {
        origins = generated_origins;
    }

    // 5. Package-set transaction: snapshot the package dataset so a
    // dry/empty build rolls back cleanly.
    let package_name = format!("{}-{}", jail.name, ports.name);
    let package_dataset = env.packages_dataset.child(&package_name);
    if env.zfs.get_dataset(&package_dataset.name).await?.is_none() {
        env.zfs.create_dataset(&package_dataset.name, Props::new(), true).await?;
    }
    let txn = TempSnapshot::create(&env.zfs, &package_dataset.name, "txn").await?;

    // 6. Nothing to build.
    if origins.is_empty() {
        sink.write_line(b"No ports to build.").await;
        env.zfs.rollback_snapshot(txn.snapshot()).await?;
        txn.close().await?;
        active.close().await?;
        return Ok(serde_json::json!({}));
    }

    // 7-8. Run the bulk build while correlating its per-port logs against
    // poudriere's own pkg/dependency bookkeeping.
    let task_dir = env.logs_path.join("bulk").join(&package_name).join(task_id.as_str());
    let logs_dir = task_dir.join("logs");
    tokio::fs::create_dir_all(&logs_dir).await?;
    let mut follower = DirectoryFollower::new(&logs_dir).await?;

    let all_pkgs_path = task_dir.join(".poudriere.all_pkgs%");
    let pkg_deps_path = task_dir.join(".poudriere.pkg_deps%");
    let built_path = task_dir.join(".poudriere.ports.built");

    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let bulk_future = poudriere
        .cmd(["bulk", "-j", jail.name.as_str(), "-p", ports.name.as_str(), "-N"])
        .args(origins.iter().cloned())
        .exit_ok(0..=255)
        .pipe_to(sink.clone(), cancel_rx);
    tokio::pin!(bulk_future);

    let mut all_pkgs: Option<HashMap<String, String>> = None;
    let mut pkg_deps: Option<HashMap<String, Vec<String>>> = None;
    let mut bulk_done = false;
    let mut bulk_result = Ok(());

    loop {
        tokio::select! {
            res = &mut bulk_future, if !bulk_done => {
                bulk_done = true;
                bulk_result = res;
                follower.close();
            }
            item = follower.next() => {
                match item {
                    Some((filename, line)) => {
                        if all_pkgs.is_none() {
                            let loaded = parse_pairs(&all_pkgs_path).await;
                            if !loaded.is_empty() {
                                all_pkgs = Some(loaded);
                            }
                        }
                        if pkg_deps.is_none() {
                            let loaded = parse_deps(&pkg_deps_path).await;
                            if !loaded.is_empty() {
                                pkg_deps = Some(loaded);
                            }
                        }

                        let pkg_name = Path::new(&filename)
                            .file_stem()
                            .map(|s| s.to_string_lossy().into_owned())
                            .unwrap_or_else(|| filename.clone());
                        let origin = all_pkgs.as_ref().and_then(|m| m.get(&pkg_name)).cloned().unwrap_or_else(|| pkg_name.clone());

                        store.enqueue_log(
                            task_id,
                            serde_json::json!({"type": "log", "origin": origin, "msg": line}).to_string().into_bytes(),
                        ).await?;

                        if build_time_re().is_match(&line) {
                            follower.remove(filename.as_str());
                        }
                    }
                    None => break,
                }
            }
        }
    }

    match bulk_result {
        Ok(()) => {}
        Err(err) if matches!(err, pdm_process::ProcessError::Interrupted(_)) => {
            env.zfs.rollback_snapshot(txn.snapshot()).await?;
            txn.close().await?;
            active.close().await?;
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    }

    // 9. Did anything actually build?
    let built = parse_built(&built_path).await;
    if built.is_empty() {
        env.zfs.rollback_snapshot(txn.snapshot()).await?;
        txn.close().await?;
        active.close().await?;
        return Ok(serde_json::json!({}));
    }

    // Commit: drop the transaction snapshot without rolling back.
    txn.close().await?;

    // 10. Publish the package set into the live jail and refresh its repo.
    publish_package_set(env, &jail, &package_dataset).await?;

    let all_pkgs = all_pkgs.unwrap_or_default();
    let result: BTreeMap<String, String> =
        built.into_iter().map(|pkg| { let origin = all_pkgs.get(&pkg).cloned().unwrap_or_else(|| pkg.clone()); (pkg, origin) }).collect();

    active.close().await?;

    Ok(serde_json::to_value(result)?)
}

async fn publish_package_set(
    env: &WorkerEnv,
    jail: &Jail,
    package_dataset: &pdm_volume::Dataset,
) -> Result<(), WorkerError> {
    let pkg_mountpoint = env
        .zfs
        .get_property(&package_dataset.name, "mountpoint")
        .await?
        .ok_or_else(|| WorkerError::Environment(format!("package dataset '{}' is not mounted", package_dataset.name)))?;
    let jail_mountpoint = env
        .zfs
        .get_property(&jail.dataset.name, "mountpoint")
        .await?
        .ok_or_else(|| WorkerError::Environment(format!("jail dataset '{}' is not mounted", jail.dataset.name)))?;
    let target = Path::new(&jail_mountpoint).join("packages");
    tokio::fs::create_dir_all(&target).await?;

    Command::new("mount").args(["-t", "nullfs", pkg_mountpoint.as_str(), target.display().to_string().as_str()]).run().await?;

    Command::new("jexec").args([jail.name.as_str(), "sh", "-s"]).stdin("pkg repo /packages\n").run().await?;

    if let Some(post_change_script) = &env.config.post_change_script {
        let script = tokio::fs::read(post_change_script).await?;
        Command::new("jexec").args([jail.name.as_str(), "sh", "-s"]).stdin(script).run().await?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
