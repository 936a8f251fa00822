// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::channel::ChannelRepo;
use crate::error::Error;
use crate::multiplayer::{MatchRepo, MatchSettings};
use crate::options::Options;
use crate::service::ServerService;
use crate::session::{ModeStats, SessionData, SessionRepo};
use crate::stats::read_mode_stats;
use core_protocol::event::Event;
use core_protocol::game::GameMode;
use core_protocol::id::{MatchId, SessionId};
use core_protocol::name::ChannelName;
use log::{debug, info, warn};
use server_util::database::Database;
use server_util::database_schema::{AchievementItem, RelationshipItem};
use server_util::memory_database::MemoryDatabase;
use server_util::webhook::AuditWebhook;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Database and webhook work left over once an operation has changed memory. It owns
/// everything it touches, so other operations may run on the context while it is pending.
pub type Pending = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'static>>;

/// Everything that goes along with one running server. Handlers are expected to call into it
/// from a single task, so each synchronous operation is atomic with respect to the others.
pub struct Context<S: ServerService> {
    pub sessions: SessionRepo<S>,
    pub channels: ChannelRepo<S>,
    pub matches: MatchRepo<S>,
    database: Arc<dyn Database>,
    pub(crate) audit_webhook: Option<AuditWebhook>,
}

/// Persistent state of an account, read before it logs in.
#[derive(Debug, Default)]
pub struct StoredState {
    pub relationships: Vec<RelationshipItem>,
    pub achievements: Vec<AchievementItem>,
    pub stats: Vec<(GameMode, ModeStats)>,
}

impl StoredState {
    pub async fn fetch(
        database: Arc<dyn Database>,
        session_id: SessionId,
    ) -> Result<Self, Error> {
        Ok(Self {
            relationships: database.read_relationships(session_id).await?,
            achievements: database.read_achievements(session_id).await?,
            stats: read_mode_stats(&*database, session_id).await?,
        })
    }
}

impl<S: ServerService> Context<S> {
    /// A context without any channels.
    pub fn new(database: Arc<dyn Database>, audit_webhook: Option<AuditWebhook>) -> Self {
        Self {
            sessions: SessionRepo::new(),
            channels: ChannelRepo::new(),
            matches: MatchRepo::new(),
            database,
            audit_webhook,
        }
    }

    /// A context backed by a process-local database, with the configured startup channels
    /// and webhook.
    pub fn from_options(options: &Options) -> Result<Self, String> {
        let database = Arc::new(MemoryDatabase::new(options.database_read_only));
        let audit_webhook = options
            .audit_webhook
            .clone()
            .map(AuditWebhook::new)
            .transpose()?;
        let mut context = Self::new(database, audit_webhook);
        for channel in options.channels()? {
            context.channels.insert(channel);
        }
        Ok(context)
    }

    /// A handle that can outlive the current borrow of the context.
    pub fn database(&self) -> Arc<dyn Database> {
        Arc::clone(&self.database)
    }

    /// Appends raw bytes to a session's queue. Returns false if the session doesn't exist.
    pub fn enqueue(&self, session_id: SessionId, bytes: &[u8]) -> bool {
        if let Some(mut session) = self.sessions.borrow_session_mut(session_id) {
            session.enqueue(bytes);
            true
        } else {
            false
        }
    }

    /// Takes everything queued for a session.
    pub fn dequeue(&self, session_id: SessionId) -> Option<Vec<u8>> {
        self.sessions.borrow_session_mut(session_id)?.dequeue()
    }

    pub fn join_channel(&mut self, session_id: SessionId, name: ChannelName) -> Result<(), Error> {
        self.channels
            .join(session_id, name, &self.sessions)
            .map_err(|e| {
                if e.is_advisory() {
                    debug!("{} can't join {}: {}", session_id, name, e);
                } else {
                    warn!("{} can't join {}: {}", session_id, name, e);
                }
                e
            })
    }

    pub fn leave_channel(
        &mut self,
        session_id: SessionId,
        name: ChannelName,
        notify: bool,
    ) -> Result<(), Error> {
        self.channels.leave(session_id, name, notify, &self.sessions)
    }

    pub fn create_match(
        &mut self,
        creator: SessionId,
        settings: MatchSettings,
    ) -> Result<MatchId, Error> {
        self.matches
            .create(creator, settings, &self.sessions, &mut self.channels)
    }

    pub fn join_match(
        &mut self,
        session_id: SessionId,
        match_id: MatchId,
        password: &str,
    ) -> Result<(), Error> {
        self.matches.join(
            session_id,
            match_id,
            password,
            &self.sessions,
            &mut self.channels,
        )
    }

    pub fn leave_match(&mut self, session_id: SessionId) -> Result<(), Error> {
        self.matches
            .leave(session_id, &self.sessions, &mut self.channels)
    }

    /// Registers a freshly authenticated session along with its [`StoredState`], and joins it
    /// to every automatic channel it may read.
    pub fn login(
        &mut self,
        mut session: SessionData,
        stored: StoredState,
    ) -> Result<SessionId, Error> {
        let session_id = session.session_id;
        if self.sessions.contains(session_id) {
            return Err(Error::InvalidState("already logged in"));
        }
        session.load_relationships(stored.relationships);
        session.load_achievements(stored.achievements);
        session.load_stats(stored.stats);
        let privileges = session.privileges();
        self.sessions.insert(session)?;

        let mut auto_join: Vec<ChannelName> = self
            .channels
            .iter()
            .filter(|c| c.auto_join && !c.instance && c.can_read(privileges))
            .map(|c| c.name)
            .collect();
        auto_join.sort();
        for name in auto_join {
            let _ = self.join_channel(session_id, name);
        }

        info!("{} logged in", session_id);
        Ok(session_id)
    }

    /// Unregisters a session after detaching it from everything it is part of.
    pub fn logout(&mut self, session_id: SessionId) -> Result<SessionData, Error> {
        let (spectators, spectating, in_match) = {
            let session = self
                .sessions
                .borrow_session(session_id)
                .ok_or(Error::NotFound("session"))?;
            (
                session.spectators.to_vec(),
                session.spectating,
                session.match_id.is_some(),
            )
        };

        for spectator in spectators {
            let _ = self.remove_spectator(session_id, spectator);
        }
        if in_match {
            let _ = self.leave_match(session_id);
        }
        if let Some(host) = spectating {
            let _ = self.remove_spectator(host, session_id);
        }

        let channels = self
            .sessions
            .borrow_session(session_id)
            .map(|s| s.channels.to_vec())
            .unwrap_or_default();
        for name in channels {
            let _ = self.leave_channel(session_id, name, false);
        }

        let session = self
            .sessions
            .remove(session_id)
            .ok_or(Error::NotFound("session"))?;
        if !session.is_restricted() {
            self.sessions.broadcast(&Event::UserLoggedOut(session_id));
        }
        info!("{} logged out", session);
        Ok(session)
    }

    /// Display name of an online session, or of the bot.
    pub(crate) fn name_of(&self, session_id: SessionId) -> String {
        if session_id.is_bot() {
            S::BOT_NAME.to_owned()
        } else if let Some(session) = self.sessions.borrow_session(session_id) {
            session.name.as_str().to_owned()
        } else {
            session_id.to_string()
        }
    }

    /// Panics if any cross reference is one-sided.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        for session in self.sessions.iter_borrow() {
            let id = session.session_id;
            if let Some(match_id) = session.match_id {
                let data = self.matches.get(match_id).expect("match of session");
                assert!(data.slot_of(id).is_some(), "{} not seated", id);
            }
            if let Some(host) = session.spectating {
                let host = self.sessions.borrow_session(host).expect("host");
                assert!(host.spectators.contains(id));
            }
            for spectator in session.spectators.iter() {
                let spectator = self.sessions.borrow_session(spectator).expect("spectator");
                assert_eq!(spectator.spectating, Some(id));
            }
            for name in session.channels.iter() {
                assert!(self.channels.get(name).expect("channel").is_member(id));
            }
        }
        for channel in self.channels.iter() {
            assert!(
                !(channel.instance && channel.members().is_empty()),
                "empty instance {}",
                channel.name
            );
            for &member in channel.members() {
                let session = self.sessions.borrow_session(member).expect("member");
                assert!(session.channels.contains(channel.name));
            }
        }
        for data in self.matches.iter() {
            assert!(!data.is_empty(), "empty match {}", data.match_id);
            let host = data.host().expect("host");
            assert!(data.slot_of(host).is_some(), "host not seated");
            for (index, slot) in data.slots.iter().enumerate() {
                assert_eq!(slot.status.has_player(), slot.occupant().is_some());
                if let Some(occupant) = slot.occupant() {
                    let session = self.sessions.borrow_session(occupant).expect("occupant");
                    assert_eq!(session.match_id, Some(data.match_id));
                    assert_eq!(data.slot_of(occupant), Some(index));
                    assert!(self.channels.get(data.chat).expect("chat").is_member(occupant));
                }
            }
        }
    }
}
