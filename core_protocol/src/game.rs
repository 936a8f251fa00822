// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Ruleset and play style. Relax and autopilot are tracked separately from vanilla.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum GameMode {
    #[default]
    VanillaOsu = 0,
    VanillaTaiko = 1,
    VanillaCatch = 2,
    VanillaMania = 3,
    RelaxOsu = 4,
    RelaxTaiko = 5,
    RelaxCatch = 6,
    AutopilotOsu = 7,
}

impl GameMode {
    pub const ALL: [Self; 8] = [
        Self::VanillaOsu,
        Self::VanillaTaiko,
        Self::VanillaCatch,
        Self::VanillaMania,
        Self::RelaxOsu,
        Self::RelaxTaiko,
        Self::RelaxCatch,
        Self::AutopilotOsu,
    ];

    /// The underlying ruleset, 0 through 3.
    pub fn ruleset(self) -> u8 {
        match self {
            Self::VanillaOsu | Self::RelaxOsu | Self::AutopilotOsu => 0,
            Self::VanillaTaiko | Self::RelaxTaiko => 1,
            Self::VanillaCatch | Self::RelaxCatch => 2,
            Self::VanillaMania => 3,
        }
    }
}

bitflags! {
    /// Gameplay modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Mods: u32 {
        const NO_FAIL = 1 << 0;
        const EASY = 1 << 1;
        const TOUCH_DEVICE = 1 << 2;
        const HIDDEN = 1 << 3;
        const HARD_ROCK = 1 << 4;
        const SUDDEN_DEATH = 1 << 5;
        const DOUBLE_TIME = 1 << 6;
        const RELAX = 1 << 7;
        const HALF_TIME = 1 << 8;
        const NIGHTCORE = 1 << 9;
        const FLASHLIGHT = 1 << 10;
        const AUTOPLAY = 1 << 11;
        const SPUN_OUT = 1 << 12;
        const AUTOPILOT = 1 << 13;
        const PERFECT = 1 << 14;

        const SPEED_CHANGING = Self::DOUBLE_TIME.bits() | Self::NIGHTCORE.bits() | Self::HALF_TIME.bits();
    }
}

/// What a client is currently doing.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    #[default]
    Idle = 0,
    Afk = 1,
    Playing = 2,
    Editing = 3,
    Modding = 4,
    Multiplayer = 5,
    Watching = 6,
    Unknown = 7,
    Testing = 8,
    Submitting = 9,
    Paused = 10,
    Lobby = 11,
    Multiplaying = 12,
    Direct = 13,
}

/// Which other sessions' presence a client asks to be sent.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum PresenceFilter {
    #[default]
    Nil = 0,
    All = 1,
    Friends = 2,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum SlotStatus {
    #[default]
    Open = 1,
    Locked = 2,
    NotReady = 4,
    Ready = 8,
    NoMap = 16,
    Playing = 32,
    Complete = 64,
    Quit = 128,
}

impl SlotStatus {
    /// Every status except open and locked requires an occupant.
    pub fn has_player(self) -> bool {
        !matches!(self, Self::Open | Self::Locked)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MatchTeam {
    #[default]
    Neutral = 0,
    Blue = 1,
    Red = 2,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MatchTeamType {
    #[default]
    HeadToHead = 0,
    TagCoop = 1,
    TeamVs = 2,
    TagTeamVs = 3,
}

impl MatchTeamType {
    pub fn is_team_play(self) -> bool {
        matches!(self, Self::TeamVs | Self::TagTeamVs)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MatchWinCondition {
    #[default]
    Score = 0,
    Accuracy = 1,
    Combo = 2,
    ScoreV2 = 3,
}
