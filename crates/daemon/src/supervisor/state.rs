// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playback state and its transitions.
//!
//! The live player handle sits in a single `Option`, so a second handle can
//! only be installed after the first was taken out for stopping.

use crate::adapters::PlayerProcess;
use signage_core::{Assignment, AssignmentKey};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

/// Supervisor phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Preparing,
    Playing,
    Stopping,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Playing => "playing",
            Self::Stopping => "stopping",
        })
    }
}

/// Snapshot published after every transition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlaybackStatus {
    pub phase: Phase,
    pub assignment: Option<AssignmentKey>,
    /// Display name of what is on screen; `None` unless playing.
    pub current_media: Option<String>,
    pub pid: Option<u32>,
    pub halted: bool,
    /// Cache files the current assignment needs; the sweep keeps these.
    pub referenced_files: BTreeSet<String>,
}

/// Everything the supervisor owns
pub struct ClientState<P> {
    assignment: Arc<Assignment>,
    phase: Phase,
    player: Option<P>,
    /// Held by a command (reboot) until resumed.
    halted: bool,
    /// Stopped ahead of a content swap; cleared by the next assignment.
    suspended: bool,
    retry_at: Option<Instant>,
    /// Bumped whenever an in-flight prepare becomes stale.
    generation: u64,
    /// Items already reported as failed for this assignment.
    reported_failures: HashSet<i64>,
    reported_empty: bool,
}

impl<P> Default for ClientState<P> {
    fn default() -> Self {
        Self {
            assignment: Arc::new(Assignment::None),
            phase: Phase::Idle,
            player: None,
            halted: false,
            suspended: false,
            retry_at: None,
            generation: 0,
            reported_failures: HashSet::new(),
            reported_empty: false,
        }
    }
}

impl<P: PlayerProcess> ClientState<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignment(&self) -> &Arc<Assignment> {
        &self.assignment
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn player_mut(&mut self) -> Option<&mut P> {
        self.player.as_mut()
    }

    fn can_prepare(&self) -> bool {
        !self.halted && !self.suspended && !self.assignment.is_none() && self.player.is_none()
    }

    fn settle(&mut self) {
        self.phase = if self.can_prepare() { Phase::Preparing } else { Phase::Idle };
    }

    /// Whether `assignment` is what is already playing or being prepared.
    pub fn is_active(&self, assignment: &Assignment) -> bool {
        !self.suspended
            && matches!(self.phase, Phase::Preparing | Phase::Playing)
            && self.assignment.key() == assignment.key()
    }

    /// Replace the assignment wholesale. The player must already be stopped.
    pub fn assign(&mut self, assignment: Assignment) {
        self.assignment = Arc::new(assignment);
        self.generation += 1;
        self.suspended = false;
        self.retry_at = None;
        self.reported_failures.clear();
        self.reported_empty = false;
        self.settle();
    }

    /// Whether a failure of item `id` is new for this assignment. Retries
    /// and watchdog restarts see the same failures again.
    pub fn first_failure(&mut self, id: i64) -> bool {
        self.reported_failures.insert(id)
    }

    /// Like [`Self::first_failure`], for a round with nothing playable.
    pub fn first_empty_report(&mut self) -> bool {
        !std::mem::replace(&mut self.reported_empty, true)
    }

    /// Take the live player out for stopping.
    pub fn begin_stopping(&mut self) -> Option<P> {
        let player = self.player.take();
        if player.is_some() {
            self.phase = Phase::Stopping;
        }
        player
    }

    /// Stop has fully completed; nothing is on screen.
    pub fn finish_stopping(&mut self) {
        self.phase = Phase::Idle;
        self.retry_at = None;
        self.generation += 1;
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
        self.settle();
    }

    pub fn halt(&mut self) {
        self.halted = true;
        self.settle();
    }

    pub fn resume(&mut self) {
        self.halted = false;
        if self.phase == Phase::Idle {
            self.settle();
        }
    }

    /// Start a prepare round if one is due. Returns what to prepare.
    pub fn begin_preparing(&mut self) -> Option<(u64, Arc<Assignment>)> {
        if self.phase != Phase::Preparing || self.retry_at.is_some() || !self.can_prepare() {
            return None;
        }
        Some((self.generation, Arc::clone(&self.assignment)))
    }

    /// Install a freshly launched player. Hands it back if the prepare round
    /// that produced it is stale.
    pub fn begin_playing(&mut self, generation: u64, player: P) -> Result<(), P> {
        if generation != self.generation || self.phase != Phase::Preparing || !self.can_prepare() {
            return Err(player);
        }
        self.player = Some(player);
        self.phase = Phase::Playing;
        Ok(())
    }

    pub fn schedule_retry(&mut self, at: Instant) {
        if self.phase == Phase::Preparing {
            self.retry_at = Some(at);
        }
    }

    pub fn retry_due(&mut self) {
        self.retry_at = None;
    }

    /// The player exited on its own. A finished run idles; anything else
    /// goes back to preparing.
    pub fn player_exited(&mut self, finished: bool) {
        self.player = None;
        if finished {
            self.phase = Phase::Idle;
        } else {
            self.generation += 1;
            self.settle();
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        let playing = self.phase == Phase::Playing;
        PlaybackStatus {
            phase: self.phase,
            assignment: self.assignment.key(),
            current_media: if playing {
                self.assignment.display_name().map(str::to_string)
            } else {
                None
            },
            pid: self.player.as_ref().and_then(|p| p.id()),
            halted: self.halted,
            referenced_files: self.assignment.referenced_files(),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
