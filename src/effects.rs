use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{TRAIL_CAPACITY, TRAIL_MAX_AGE};
use crate::grid::Pos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    SpeedBoost,
    Slowdown,
    TrapImmunity,
    Invisibility,
}

impl StatusKind {
    pub fn label(self) -> &'static str {
        match self {
            StatusKind::SpeedBoost => "Speed",
            StatusKind::Slowdown => "Slowdown",
            StatusKind::TrapImmunity => "Immunity",
            StatusKind::Invisibility => "Invisible",
        }
    }
}

/// Timed player statuses. Each field is the timestamp the status ends at,
/// 0 when it was never started; a status simply lapses once `now` passes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statuses {
    pub speed_boost_until: u64,
    pub slowdown_until: u64,
    pub trap_immunity_until: u64,
    pub invisible_until: u64,
}

impl Statuses {
    pub fn until(&self, kind: StatusKind) -> u64 {
        match kind {
            StatusKind::SpeedBoost => self.speed_boost_until,
            StatusKind::Slowdown => self.slowdown_until,
            StatusKind::TrapImmunity => self.trap_immunity_until,
            StatusKind::Invisibility => self.invisible_until,
        }
    }

    pub fn start(&mut self, kind: StatusKind, now: u64, duration: u64) {
        let until = now + duration;
        match kind {
            StatusKind::SpeedBoost => self.speed_boost_until = until,
            StatusKind::Slowdown => self.slowdown_until = until,
            StatusKind::TrapImmunity => self.trap_immunity_until = until,
            StatusKind::Invisibility => self.invisible_until = until,
        }
    }

    pub fn is_active(&self, kind: StatusKind, now: u64) -> bool {
        now < self.until(kind)
    }

    /// Active statuses with whole seconds left, rounded up.
    pub fn active(&self, now: u64) -> Vec<(StatusKind, u64)> {
        [
            StatusKind::SpeedBoost,
            StatusKind::Slowdown,
            StatusKind::TrapImmunity,
            StatusKind::Invisibility,
        ]
        .into_iter()
        .filter(|kind| self.is_active(*kind, now))
        .map(|kind| (kind, (self.until(kind) - now).div_ceil(1000)))
        .collect()
    }
}

/// A line in the effect list shown to the player. `expiry == 0` marks an
/// informational entry that never times out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEffect {
    pub name: String,
    pub expiry: u64,
}

impl ActiveEffect {
    pub fn new(name: impl Into<String>, now: u64, duration: u64) -> Self {
        ActiveEffect {
            name: name.into(),
            expiry: if duration > 0 { now + duration } else { 0 },
        }
    }

    pub fn is_live(&self, now: u64) -> bool {
        self.expiry == 0 || now < self.expiry
    }

    pub fn remaining_secs(&self, now: u64) -> Option<u64> {
        if self.expiry == 0 {
            None
        } else {
            Some(self.expiry.saturating_sub(now).div_ceil(1000))
        }
    }
}

pub fn prune_effects(effects: &mut Vec<ActiveEffect>, now: u64) {
    effects.retain(|effect| effect.is_live(now));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailPoint {
    pub pos: Pos,
    pub timestamp: u64,
    pub speed_active: bool,
    pub slowdown_active: bool,
}

/// Recently vacated cells, newest last.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
}

impl Trail {
    pub fn push(&mut self, pos: Pos, now: u64, statuses: &Statuses) {
        self.points.push_back(TrailPoint {
            pos,
            timestamp: now,
            speed_active: statuses.is_active(StatusKind::SpeedBoost, now),
            slowdown_active: statuses.is_active(StatusKind::Slowdown, now),
        });
        while self.points.len() > TRAIL_CAPACITY {
            self.points.pop_front();
        }
    }

    pub fn prune(&mut self, now: u64) {
        self.points
            .retain(|point| now.saturating_sub(point.timestamp) < TRAIL_MAX_AGE);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TrailPoint> {
        self.points.iter()
    }
}

/// What a trigger tile can do. One is drawn uniformly per trigger and
/// repeats are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEffect {
    ExtendTime,
    ScoreBonus,
    Haste,
    TeleportToKey,
    TrapImmunity,
    KeyBonus,
    Invisibility,
}

impl TriggerEffect {
    pub const ALL: [TriggerEffect; 7] = [
        TriggerEffect::ExtendTime,
        TriggerEffect::ScoreBonus,
        TriggerEffect::Haste,
        TriggerEffect::TeleportToKey,
        TriggerEffect::TrapImmunity,
        TriggerEffect::KeyBonus,
        TriggerEffect::Invisibility,
    ];

    pub fn random(rng: &mut impl Rng) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&TriggerEffect::ScoreBonus)
    }
}
