// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::{Context, Pending};
use crate::error::Error;
use crate::service::ServerService;
use crate::session::{ModeStats, SessionData};
use core_protocol::game::GameMode;
use core_protocol::get_unix_time_now;
use core_protocol::id::{AchievementId, SessionId};
use log::warn;
use server_util::database::Database;
use server_util::database_schema::AchievementItem;

impl<S: ServerService> Context<S> {
    /// Records an achievement unlocked in `mode`, then persists it.
    pub fn unlock_achievement(
        &mut self,
        session_id: SessionId,
        achievement_id: AchievementId,
        mode: GameMode,
    ) -> Result<Pending, Error> {
        let ruleset = mode.ruleset() as usize;
        let inserted = self
            .sessions
            .borrow_session_mut(session_id)
            .ok_or(Error::NotFound("session"))?
            .achievements[ruleset]
            .insert(achievement_id);
        if !inserted {
            return Err(Error::InvalidState("already unlocked"));
        }

        let database = self.database();
        Ok(Box::pin(async move {
            database
                .insert_achievement(session_id, achievement_id)
                .await
                .map_err(Error::from)
        }))
    }

    pub fn update_latest_activity(&self, session_id: SessionId) -> Pending {
        let database = self.database();
        let now = get_unix_time_now();
        Box::pin(async move {
            database
                .update_latest_activity(session_id, now)
                .await
                .map_err(Error::from)
        })
    }
}

impl SessionData {
    pub fn load_achievements(&mut self, rows: Vec<AchievementItem>) {
        for row in rows {
            if let Some(unlocked) = self.achievements.get_mut(row.ruleset as usize) {
                unlocked.insert(row.achievement_id);
            } else {
                warn!("achievement {:?} has bad ruleset {}", row.achievement_id, row.ruleset);
            }
        }
    }

    pub fn load_stats(&mut self, stats: Vec<(GameMode, ModeStats)>) {
        self.stats.extend(stats);
    }
}

/// Reads stats of every mode that has any, along with the global rank in each.
pub(crate) async fn read_mode_stats(
    database: &dyn Database,
    session_id: SessionId,
) -> Result<Vec<(GameMode, ModeStats)>, Error> {
    let mut ret = Vec::new();
    for mode in GameMode::ALL {
        let item = match database.read_stats(session_id, mode).await? {
            Some(item) => item,
            None => continue,
        };
        let higher = database.count_higher_pp(session_id, mode, item.pp).await?;
        ret.push((
            mode,
            ModeStats {
                total_score: item.total_score,
                ranked_score: item.ranked_score,
                pp: item.pp,
                accuracy: item.accuracy,
                plays: item.plays,
                playtime: item.playtime,
                max_combo: item.max_combo,
                rank: higher + 1,
            },
        ));
    }
    Ok(ret)
}

#[cfg(test)]
mod test {
    use crate::context::StoredState;
    use crate::error::Error;
    use crate::service::mock::{mock_context, mock_session};
    use core_protocol::game::GameMode;
    use core_protocol::id::{AchievementId, SessionId};
    use core_protocol::privileges::Privileges;
    use server_util::database_schema::{SessionModeKey, StatsItem};

    #[tokio::test]
    async fn achievements() {
        let (mut context, database) = mock_context();
        let a = mock_session(&mut context, 10);
        let achievement = AchievementId(5);
        database
            .tables()
            .unwrap()
            .achievement_rulesets
            .insert(achievement, 1);

        context
            .unlock_achievement(a, achievement, GameMode::RelaxTaiko)
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            context
                .unlock_achievement(a, achievement, GameMode::VanillaTaiko)
                .err(),
            Some(Error::InvalidState("already unlocked"))
        );

        let stored = StoredState::fetch(context.database(), a).await.unwrap();
        let mut session = context.sessions.borrow_session_mut(a).unwrap();
        session.achievements[1].clear();
        session.load_achievements(stored.achievements);
        assert!(session.achievements[1].contains(&achievement));
    }

    #[tokio::test]
    async fn stats_and_rank() {
        let (mut context, database) = mock_context();
        let a = mock_session(&mut context, 10);
        {
            let mut tables = database.tables().unwrap();
            for (id, pp) in [(10, 500), (11, 900), (12, 700), (13, 100)] {
                let session_id = SessionId(id);
                tables.privileges.insert(session_id, Privileges::NORMAL);
                tables.stats.insert(
                    SessionModeKey {
                        session_id,
                        mode: GameMode::VanillaMania,
                    },
                    StatsItem {
                        pp,
                        plays: 3,
                        ..StatsItem::default()
                    },
                );
            }
        }

        let stored = StoredState::fetch(context.database(), a).await.unwrap();
        let mut session = context.sessions.borrow_session_mut(a).unwrap();
        session.load_stats(stored.stats);
        let stats = session.stats[&GameMode::VanillaMania];
        assert_eq!(stats.pp, 500);
        assert_eq!(stats.plays, 3);
        assert_eq!(stats.rank, 3);
        assert!(!session.stats.contains_key(&GameMode::VanillaOsu));
        drop(session);

        context.update_latest_activity(a).await.unwrap();
        assert!(database.tables().unwrap().latest_activity.contains_key(&a));
    }
}
