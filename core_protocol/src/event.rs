// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::dto::*;
use crate::id::*;
use serde::{Deserialize, Serialize};

/// Semantic server-to-client notifications. The encoder turns each into wire bytes, which
/// are only ever concatenated into outbound queues.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Event {
    /// The recipient is now a member of the channel (display name).
    ChannelJoined(String),
    /// The recipient was removed from the channel (display name).
    ChannelKicked(String),
    ChannelInfo(ChannelInfoDto),
    /// A chat message.
    Message(MessageDto),
    MatchJoinSucceeded(MatchDto),
    MatchJoinFailed,
    MatchUpdated(MatchDto),
    MatchDisposed(MatchId),
    /// The recipient became host of their match.
    MatchHostTransferred,
    /// Sent to a host.
    SpectatorJoined(SessionId),
    /// Sent to a host.
    SpectatorLeft(SessionId),
    /// Sent to a spectator about another spectator of the same host.
    FellowSpectatorJoined(SessionId),
    /// Sent to a spectator about another spectator of the same host.
    FellowSpectatorLeft(SessionId),
    /// Seconds until the recipient may chat again; zero lifts the silence.
    SilenceEnded(u32),
    /// Clients should wipe this session's chat messages.
    UserSilenced(SessionId),
    UserLoggedOut(SessionId),
}
