// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::game::*;
use crate::id::*;
use serde::{Deserialize, Serialize};

/// The Slot Data Transfer Object (DTO) is one seat of a match.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SlotDto {
    pub status: SlotStatus,
    pub team: MatchTeam,
    pub session_id: Option<SessionId>,
    pub mods: Mods,
}

/// The Match Data Transfer Object (DTO) is the full state of a match, as shown to clients.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchDto {
    pub match_id: MatchId,
    pub name: String,
    /// [`None`] when the match is open, or when hidden from the recipient.
    pub password: Option<String>,
    pub has_password: bool,
    pub in_progress: bool,
    pub map_name: String,
    pub map_md5: String,
    pub map_id: u32,
    pub mode: GameMode,
    pub mods: Mods,
    pub freemods: bool,
    pub win_condition: MatchWinCondition,
    pub team_type: MatchTeamType,
    pub host_id: Option<SessionId>,
    pub seed: u32,
    pub slots: Vec<SlotDto>,
}

/// The Channel Info Data Transfer Object (DTO) advertises a channel and its occupancy.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChannelInfoDto {
    /// Display name, i.e. instanced channels show a generic name.
    pub name: String,
    pub topic: String,
    pub members: u32,
}

/// The Message Data Transfer Object (DTO) is used for chats.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MessageDto {
    pub sender: String,
    pub sender_id: SessionId,
    pub text: String,
    /// A channel display name, or the recipient's name for direct messages.
    pub recipient: String,
}
