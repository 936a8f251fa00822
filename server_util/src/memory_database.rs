// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::database::{Database, Error};
use crate::database_schema::{
    AchievementItem, LogItem, RelationshipItem, RelationshipKind, SessionModeKey, StatsItem,
};
use async_trait::async_trait;
use core_protocol::game::GameMode;
use core_protocol::get_unix_time_now;
use core_protocol::id::{AchievementId, SessionId};
use core_protocol::privileges::Privileges;
use core_protocol::UnixTime;
use log::debug;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A process-local [`Database`], for development servers and tests.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: Mutex<Tables>,
    /// Whether to abort and return [`Ok`] right before writing anything.
    read_only: bool,
    /// Simulates an outage; every call fails with [`Error::Unavailable`].
    unavailable: AtomicBool,
}

#[derive(Default)]
pub struct Tables {
    pub privileges: HashMap<SessionId, Privileges>,
    pub silence_end: HashMap<SessionId, UnixTime>,
    pub latest_activity: HashMap<SessionId, UnixTime>,
    pub logs: Vec<LogItem>,
    pub relationships: HashMap<(SessionId, SessionId), RelationshipKind>,
    /// Unlocked achievements of each account.
    pub achievements: HashMap<SessionId, Vec<AchievementId>>,
    /// Ruleset of every known achievement.
    pub achievement_rulesets: HashMap<AchievementId, u8>,
    pub stats: HashMap<SessionModeKey, StatsItem>,
}

impl MemoryDatabase {
    pub fn new(read_only: bool) -> Self {
        Self {
            read_only,
            ..Self::default()
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Direct access, for seeding and inspection.
    pub fn tables(&self) -> Result<MutexGuard<'_, Tables>, Error> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(Error::Unavailable);
        }
        self.tables.lock().map_err(|_| Error::Unavailable)
    }

    /// Like [`Self::tables`], but [`None`] means the write should be skipped.
    fn tables_for_write(&self) -> Result<Option<MutexGuard<'_, Tables>>, Error> {
        let tables = self.tables()?;
        if self.read_only {
            debug!("read only, skipping write");
            return Ok(None);
        }
        Ok(Some(tables))
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn read_privileges(&self, session_id: SessionId) -> Result<Option<Privileges>, Error> {
        Ok(self.tables()?.privileges.get(&session_id).copied())
    }

    async fn update_privileges(
        &self,
        session_id: SessionId,
        privileges: Privileges,
    ) -> Result<(), Error> {
        if let Some(mut tables) = self.tables_for_write()? {
            tables.privileges.insert(session_id, privileges);
        }
        Ok(())
    }

    async fn update_silence_end(
        &self,
        session_id: SessionId,
        silence_end: UnixTime,
    ) -> Result<(), Error> {
        if let Some(mut tables) = self.tables_for_write()? {
            tables.silence_end.insert(session_id, silence_end);
        }
        Ok(())
    }

    async fn update_latest_activity(
        &self,
        session_id: SessionId,
        now: UnixTime,
    ) -> Result<(), Error> {
        if let Some(mut tables) = self.tables_for_write()? {
            tables.latest_activity.insert(session_id, now);
        }
        Ok(())
    }

    async fn insert_log(
        &self,
        from: SessionId,
        to: SessionId,
        message: &str,
    ) -> Result<(), Error> {
        if let Some(mut tables) = self.tables_for_write()? {
            tables.logs.push(LogItem {
                from,
                to,
                message: message.to_owned(),
                time: get_unix_time_now(),
            });
        }
        Ok(())
    }

    async fn replace_relationship(
        &self,
        user1: SessionId,
        user2: SessionId,
        kind: RelationshipKind,
    ) -> Result<(), Error> {
        if let Some(mut tables) = self.tables_for_write()? {
            tables.relationships.insert((user1, user2), kind);
        }
        Ok(())
    }

    async fn delete_relationship(&self, user1: SessionId, user2: SessionId) -> Result<(), Error> {
        if let Some(mut tables) = self.tables_for_write()? {
            tables.relationships.remove(&(user1, user2));
        }
        Ok(())
    }

    async fn read_relationships(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<RelationshipItem>, Error> {
        let tables = self.tables()?;
        Ok(tables
            .relationships
            .iter()
            .filter(|((user1, _), _)| *user1 == session_id)
            .map(|(&(user1, user2), &kind)| RelationshipItem { user1, user2, kind })
            .collect())
    }

    async fn insert_achievement(
        &self,
        session_id: SessionId,
        achievement_id: AchievementId,
    ) -> Result<(), Error> {
        if let Some(mut tables) = self.tables_for_write()? {
            let unlocked = tables.achievements.entry(session_id).or_default();
            if unlocked.contains(&achievement_id) {
                return Err(Error::Query(String::from("duplicate achievement")));
            }
            unlocked.push(achievement_id);
        }
        Ok(())
    }

    async fn read_achievements(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<AchievementItem>, Error> {
        let tables = self.tables()?;
        Ok(tables
            .achievements
            .get(&session_id)
            .into_iter()
            .flatten()
            .filter_map(|&achievement_id| {
                tables
                    .achievement_rulesets
                    .get(&achievement_id)
                    .map(|&ruleset| AchievementItem {
                        achievement_id,
                        ruleset,
                    })
            })
            .collect())
    }

    async fn read_stats(
        &self,
        session_id: SessionId,
        mode: GameMode,
    ) -> Result<Option<StatsItem>, Error> {
        let tables = self.tables()?;
        Ok(tables
            .stats
            .get(&SessionModeKey { session_id, mode })
            .copied())
    }

    async fn count_higher_pp(
        &self,
        session_id: SessionId,
        mode: GameMode,
        pp: u32,
    ) -> Result<u32, Error> {
        let tables = self.tables()?;
        let count = tables
            .stats
            .iter()
            .filter(|(key, stats)| {
                key.mode == mode
                    && key.session_id != session_id
                    && stats.pp > pp
                    && tables
                        .privileges
                        .get(&key.session_id)
                        .map(|p| p.contains(Privileges::NORMAL))
                        .unwrap_or(false)
            })
            .count();
        Ok(count as u32)
    }
}
