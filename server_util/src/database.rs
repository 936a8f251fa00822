// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::database_schema::{AchievementItem, RelationshipItem, RelationshipKind, StatsItem};
use async_trait::async_trait;
use core_protocol::game::GameMode;
use core_protocol::id::{AchievementId, SessionId};
use core_protocol::privileges::Privileges;
use core_protocol::UnixTime;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// The store could not be reached.
    Unavailable,
    /// The store rejected a statement.
    Query(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("database unavailable"),
            Self::Query(e) => write!(f, "database query failed: {}", e),
        }
    }
}

impl std::error::Error for Error {}

/// Durable account store. Writes are issued after the in-memory state has already changed,
/// and are never retried by callers.
#[async_trait]
pub trait Database: Send + Sync {
    /// Returns [`None`] if there is no such account.
    async fn read_privileges(&self, session_id: SessionId) -> Result<Option<Privileges>, Error>;

    async fn update_privileges(
        &self,
        session_id: SessionId,
        privileges: Privileges,
    ) -> Result<(), Error>;

    async fn update_silence_end(
        &self,
        session_id: SessionId,
        silence_end: UnixTime,
    ) -> Result<(), Error>;

    async fn update_latest_activity(
        &self,
        session_id: SessionId,
        now: UnixTime,
    ) -> Result<(), Error>;

    /// Appends to the moderation audit trail.
    async fn insert_log(&self, from: SessionId, to: SessionId, message: &str)
        -> Result<(), Error>;

    /// Inserts or overwrites the relationship from `user1` to `user2`.
    async fn replace_relationship(
        &self,
        user1: SessionId,
        user2: SessionId,
        kind: RelationshipKind,
    ) -> Result<(), Error>;

    async fn delete_relationship(&self, user1: SessionId, user2: SessionId) -> Result<(), Error>;

    /// Every relationship where `session_id` is `user1`.
    async fn read_relationships(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<RelationshipItem>, Error>;

    async fn insert_achievement(
        &self,
        session_id: SessionId,
        achievement_id: AchievementId,
    ) -> Result<(), Error>;

    async fn read_achievements(&self, session_id: SessionId)
        -> Result<Vec<AchievementItem>, Error>;

    /// Returns [`None`] if the account has no stats row.
    async fn read_stats(
        &self,
        session_id: SessionId,
        mode: GameMode,
    ) -> Result<Option<StatsItem>, Error>;

    /// Counts unrestricted accounts, other than `session_id`, with more pp than `pp` in `mode`.
    async fn count_higher_pp(
        &self,
        session_id: SessionId,
        mode: GameMode,
        pp: u32,
    ) -> Result<u32, Error>;
}
