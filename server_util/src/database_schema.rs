// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use core_protocol::game::GameMode;
use core_protocol::id::{AchievementId, SessionId};
use core_protocol::UnixTime;
use serde::{Deserialize, Serialize};

/// Kind of a directed relationship between two accounts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    #[serde(rename = "friend")]
    Friend,
    #[serde(rename = "block")]
    Block,
}

/// One row of the relationships table, keyed by (user1, user2).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RelationshipItem {
    pub user1: SessionId,
    pub user2: SessionId,
    pub kind: RelationshipKind,
}

/// An achievement unlocked by an account, joined with the ruleset it belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AchievementItem {
    pub achievement_id: AchievementId,
    /// Ruleset, 0 through 3.
    pub ruleset: u8,
}

/// Per-mode statistics row (the global rank is computed separately).
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsItem {
    pub total_score: u64,
    pub ranked_score: u64,
    pub pp: u32,
    pub accuracy: f32,
    pub plays: u32,
    pub playtime: u32,
    pub max_combo: u32,
}

/// Audit trail row for moderation actions.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LogItem {
    pub from: SessionId,
    pub to: SessionId,
    pub message: String,
    pub time: UnixTime,
}

/// Key for per-mode tables.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionModeKey {
    pub session_id: SessionId,
    pub mode: GameMode,
}
