// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent startup and task wiring.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use signage_core::{Clock, SystemClock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::adapters::{
    ControlPlane, DisplayEnv, HostSystem, HttpControlPlane, PlayerAdapter, SystemAdapter,
    VlcPlayer,
};
use crate::cache::{MediaCache, MediaResolver};
use crate::executor::CommandExecutor;
use crate::poller::{self, Heartbeat, SweepSchedule};
use crate::remote_log::{self, RemoteLog, REMOTE_LOG_CAPACITY};
use crate::resolver::ContentResolver;
use crate::shutdown::{ExitReason, Shutdown};
use crate::supervisor::{Supervisor, SupervisorConfig, SupervisorHandle};

use super::{Config, LifecycleError};

/// The external collaborators one agent runs against
pub struct Adapters<C, P, S, R, K> {
    pub plane: C,
    pub player: P,
    pub system: S,
    pub resolver: R,
    pub clock: K,
}

/// Handles to the spawned agent tasks
pub struct RunningAgent {
    supervisor: SupervisorHandle,
    shutdown: Shutdown,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl RunningAgent {
    pub fn supervisor(&self) -> &SupervisorHandle {
        &self.supervisor
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Wait for a shutdown request, then for every task to finish. The
    /// supervisor stops the player before its task ends.
    pub async fn wait(self) -> ExitReason {
        self.shutdown.requested().await;
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                error!(task = name, error = %e, "agent task panicked");
            }
        }
        self.shutdown.reason().unwrap_or(ExitReason::Signal)
    }
}

/// A started agent holding the single-instance lock
pub struct Agent {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub running: RunningAgent,
}

impl Agent {
    /// Run until shutdown, then release the PID file.
    pub async fn run(self) -> ExitReason {
        let reason = self.running.wait().await;
        let lock_path = self.config.lock_path();
        if let Err(e) = std::fs::remove_file(&lock_path) {
            warn!(path = %lock_path.display(), error = %e, "failed to remove PID file");
        }
        info!(%reason, "agent stopped");
        reason
    }
}

/// Take the exclusive lock at `path` and record our PID in it.
pub fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    // Open without truncating so a running agent's PID survives a failed attempt.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Start the agent against the real host
pub async fn startup(config: Config, shutdown: Shutdown) -> Result<Agent, LifecycleError> {
    // 1. Directories
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.media_dir)?;

    // 2. Lock before touching anything shared with another instance
    let lock_file = acquire_lock(&config.lock_path())?;

    // 3. Adapters
    let plane = HttpControlPlane::new(&config.server_url, &config.device_id, &config.update_url)?;
    let resolver = MediaCache::new(plane.client().clone(), &config.media_dir, &config.server_url);
    let display_env = DisplayEnv::detect();
    info!(display = ?display_env, screen = config.screen_index, "display environment");
    let player = VlcPlayer::new(&config.player, config.screen_index, display_env);
    match player.version().await {
        Ok(version) => info!(%version, "player available"),
        // Launches are retried, so a missing player is not fatal.
        Err(e) => error!(error = %e, "player not available"),
    }
    let exe_path = std::env::current_exe()?;
    let system = HostSystem::new(config.reboot_command.clone(), exe_path);

    info!(
        server = %config.server_url,
        device = %config.device_id,
        media_dir = %config.media_dir.display(),
        version = crate::env::CLIENT_VERSION,
        "starting signage agent"
    );

    // 4. Tasks
    let adapters = Adapters { plane, player, system, resolver, clock: SystemClock };
    let running = launch(adapters, &config, shutdown).await;
    Ok(Agent { config, lock_file, running })
}

/// Wire the components together and spawn every task.
///
/// One full content fetch runs before the periodic tasks start; if it
/// fails the rapid poll retries on its first tick.
pub async fn launch<C, P, S, R, K>(
    adapters: Adapters<C, P, S, R, K>,
    config: &Config,
    shutdown: Shutdown,
) -> RunningAgent
where
    C: ControlPlane,
    P: PlayerAdapter,
    S: SystemAdapter,
    R: MediaResolver,
    K: Clock,
{
    let Adapters { plane, player, system, resolver, clock } = adapters;
    let token = shutdown.token().clone();
    let mut tasks = Vec::new();

    let (remote_log, log_rx) = RemoteLog::channel(REMOTE_LOG_CAPACITY);
    tasks.push((
        "remote_log",
        tokio::spawn(remote_log::forward(plane.clone(), log_rx, token.clone())),
    ));

    let supervisor_config = SupervisorConfig {
        manifest_path: config.manifest_path(),
        stop_timeout: config.stop_timeout,
        watchdog_interval: config.watchdog_interval,
        retry_delay: config.retry_delay,
    };
    let (supervisor, handle) =
        Supervisor::new(player, resolver, supervisor_config, remote_log.clone());
    tasks.push(("supervisor", tokio::spawn(supervisor.run(token.clone()))));

    let mut content = ContentResolver::new(plane.clone(), handle.clone(), remote_log.clone());
    if let Err(e) = content.sync_initial().await {
        warn!(error = %e, "initial content sync failed, will retry");
    }
    remote_log.info(format!("Agent {} started", crate::env::CLIENT_VERSION));

    let executor = CommandExecutor::new(
        plane.clone(),
        system.clone(),
        handle.clone(),
        shutdown.clone(),
        remote_log,
    );
    tasks.push((
        "rapid_poll",
        tokio::spawn(poller::rapid_poll(
            plane.clone(),
            content,
            executor.clone(),
            config.rapid_interval,
            token.clone(),
        )),
    ));

    let heartbeat = Heartbeat::new(plane, system, clock.clone(), handle.clone(), executor);
    tasks.push(("heartbeat", tokio::spawn(heartbeat.run(config.heartbeat_interval, token.clone()))));

    let schedule = SweepSchedule {
        dir: config.media_dir.clone(),
        period: config.sweep_interval,
        retention: config.cache_retention,
    };
    tasks.push((
        "cache_sweep",
        tokio::spawn(poller::sweep_cache(schedule, handle.clone(), clock, token)),
    ));

    RunningAgent { supervisor: handle, shutdown, tasks }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
