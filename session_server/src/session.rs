// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::error::Error;
use crate::ordered_set::OrderedSet;
use crate::service::ServerService;
use atomic_refcell::{AtomicRef, AtomicRefCell, AtomicRefMut};
use core_protocol::dto::MessageDto;
use core_protocol::event::Event;
use core_protocol::game::{Action, GameMode, Mods, PresenceFilter};
use core_protocol::id::{AchievementId, MatchId, SessionId};
use core_protocol::name::{ChannelName, SafeName, Username};
use core_protocol::privileges::{ClientPrivileges, Privileges};
use core_protocol::{get_unix_time_now, UnixTime};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Display, Formatter};
use std::marker::PhantomData;

/// What a session is currently doing, as reported by its client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Status {
    pub action: Action,
    pub info_text: String,
    pub map_md5: String,
    pub mods: Mods,
    pub mode: GameMode,
    pub map_id: u32,
}

/// Statistics of one session in one mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModeStats {
    pub total_score: u64,
    pub ranked_score: u64,
    pub pp: u32,
    pub accuracy: f32,
    pub plays: u32,
    pub playtime: u32,
    pub max_combo: u32,
    /// Global rank, starting at 1.
    pub rank: u32,
}

/// A connected participant.
///
/// Membership fields (`channels`, `match_id`, `spectating`, `spectators`) are back-references
/// by key. They are only mutated by the owning repos, together with the other side.
pub struct SessionData {
    pub session_id: SessionId,
    pub name: Username,
    pub safe_name: SafeName,
    privileges: Privileges,
    pub status: Status,
    pub presence_filter: PresenceFilter,
    pub stats: HashMap<GameMode, ModeStats>,
    pub friends: HashSet<SessionId>,
    pub blocks: HashSet<SessionId>,
    /// Unlocked achievements, indexed by ruleset.
    pub achievements: [HashSet<AchievementId>; 4],
    pub(crate) channels: OrderedSet<ChannelName>,
    pub(crate) match_id: Option<MatchId>,
    pub(crate) spectating: Option<SessionId>,
    pub(crate) spectators: OrderedSet<SessionId>,
    /// Hidden from hosts and fellow spectators while spectating.
    pub stealth: bool,
    /// Whether the client has the multiplayer lobby open.
    pub in_lobby: bool,
    /// A tournament spectator client.
    pub tourney_client: bool,
    /// Only direct messages from friends are accepted.
    pub pm_private: bool,
    pub away_message: Option<String>,
    pub utc_offset: i8,
    /// Unix seconds.
    pub silence_end: UnixTime,
    pub login_time: UnixTime,
    pub last_recv_time: UnixTime,
    /// Bytes waiting for the client's next poll.
    queue: Vec<u8>,
    /// Accounts (bots) that must never be sent anything. Fixed at construction.
    non_delivering: bool,
}

impl SessionData {
    pub fn new(session_id: SessionId, name: Username, privileges: Privileges) -> Self {
        let now = get_unix_time_now();
        Self {
            session_id,
            safe_name: name.to_safe(),
            name,
            privileges,
            status: Status::default(),
            presence_filter: PresenceFilter::default(),
            stats: HashMap::new(),
            friends: HashSet::new(),
            blocks: HashSet::new(),
            achievements: Default::default(),
            channels: OrderedSet::new(),
            match_id: None,
            spectating: None,
            spectators: OrderedSet::new(),
            stealth: false,
            in_lobby: false,
            tourney_client: false,
            pm_private: false,
            away_message: None,
            utc_offset: 0,
            silence_end: 0,
            login_time: now,
            last_recv_time: now,
            queue: Vec::new(),
            non_delivering: false,
        }
    }

    /// Makes [`Self::enqueue`] a permanent no-op.
    pub fn with_non_delivering(mut self) -> Self {
        self.non_delivering = true;
        self
    }

    pub fn is_non_delivering(&self) -> bool {
        self.non_delivering
    }

    /// Appends bytes for the client's next poll.
    pub fn enqueue(&mut self, bytes: &[u8]) {
        if self.non_delivering {
            return;
        }
        self.queue.extend_from_slice(bytes);
    }

    /// Encodes and enqueues a single event.
    pub fn send<S: ServerService>(&mut self, event: &Event) {
        if !self.non_delivering {
            self.enqueue(&S::encode(event));
        }
    }

    /// Takes everything enqueued so far, or [`None`] if nothing is pending.
    pub fn dequeue(&mut self) -> Option<Vec<u8>> {
        if self.queue.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.queue))
        }
    }

    pub fn privileges(&self) -> Privileges {
        self.privileges
    }

    pub(crate) fn set_privileges(&mut self, privileges: Privileges) {
        self.privileges = privileges;
    }

    /// Derived from [`Self::privileges`] on every call, so it can never go stale.
    pub fn client_privileges(&self) -> ClientPrivileges {
        self.privileges.to_client()
    }

    pub fn is_restricted(&self) -> bool {
        !self.privileges.contains(Privileges::NORMAL)
    }

    pub fn is_staff(&self) -> bool {
        self.privileges.is_staff()
    }

    /// Seconds until the silence ends, zero if not silenced.
    pub fn remaining_silence(&self) -> u64 {
        self.silence_end.saturating_sub(get_unix_time_now())
    }

    pub fn is_silenced(&self) -> bool {
        self.remaining_silence() != 0
    }

    /// Stats in the currently selected mode.
    pub fn mode_stats(&self) -> Option<&ModeStats> {
        self.stats.get(&self.status.mode)
    }

    pub fn channels(&self) -> &[ChannelName] {
        &self.channels
    }

    pub fn is_member_of(&self, channel: ChannelName) -> bool {
        self.channels.contains(channel)
    }

    pub fn match_id(&self) -> Option<MatchId> {
        self.match_id
    }

    pub fn spectating(&self) -> Option<SessionId> {
        self.spectating
    }

    pub fn spectators(&self) -> &[SessionId] {
        &self.spectators
    }

    /// Enqueues a chat message from `sender`, either in `channel` or as a direct message.
    pub fn receive_message<S: ServerService>(
        &mut self,
        sender: (SessionId, &str),
        text: &str,
        channel: Option<ChannelName>,
    ) {
        let recipient = match channel {
            Some(channel) => channel.display_name().to_owned(),
            None => self.name.as_str().to_owned(),
        };
        self.send::<S>(&Event::Message(MessageDto {
            sender: sender.1.to_owned(),
            sender_id: sender.0,
            text: text.to_owned(),
            recipient,
        }));
    }

    /// Enqueues a direct message from the server bot.
    pub fn receive_bot_message<S: ServerService>(&mut self, text: &str) {
        self.receive_message::<S>((SessionId::BOT, S::BOT_NAME), text, None);
    }
}

impl Display for SessionData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{} ({})>", self.name, self.session_id)
    }
}

impl Debug for SessionData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("session_id", &self.session_id)
            .field("name", &self.name)
            .field("privileges", &self.privileges)
            .field("match_id", &self.match_id)
            .field("spectating", &self.spectating)
            .field("spectators", &self.spectators)
            .field("channels", &self.channels)
            .field("queued", &self.queue.len())
            .finish()
    }
}

/// Every live session. Sole owner of session lifetimes; everything else refers to sessions by id.
pub struct SessionRepo<S: ServerService> {
    /// Care must be exercised to avoid mutably borrowing the same session twice, which will
    /// induce a runtime error. Mutations are serialized by the owner of the repo.
    sessions: HashMap<SessionId, AtomicRefCell<SessionData>>,
    by_safe_name: HashMap<SafeName, SessionId>,
    _spooky: PhantomData<S>,
}

impl<S: ServerService> SessionRepo<S> {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            by_safe_name: HashMap::new(),
            _spooky: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Registers a session. Fails if the id or name is taken.
    pub fn insert(&mut self, session: SessionData) -> Result<(), Error> {
        if self.sessions.contains_key(&session.session_id) {
            return Err(Error::InvalidState("session id already online"));
        }
        if self.by_safe_name.contains_key(&session.safe_name) {
            return Err(Error::InvalidState("session name already online"));
        }
        self.by_safe_name
            .insert(session.safe_name, session.session_id);
        self.sessions
            .insert(session.session_id, AtomicRefCell::new(session));
        Ok(())
    }

    /// Unregisters a session. Does not perform any cleanup; see [`crate::context::Context::logout`].
    pub(crate) fn remove(&mut self, session_id: SessionId) -> Option<SessionData> {
        let session = self.sessions.remove(&session_id)?.into_inner();
        self.by_safe_name.remove(&session.safe_name);
        Some(session)
    }

    /// Looks up a session by display or normalized name.
    pub fn find_by_name(&self, name: &str) -> Option<SessionId> {
        self.by_safe_name.get(&SafeName::new(name)).copied()
    }

    /// Cannot coincide with mutable references to the same session.
    pub fn borrow_session(&self, session_id: SessionId) -> Option<AtomicRef<SessionData>> {
        self.sessions.get(&session_id).map(|s| s.borrow())
    }

    /// Cannot coincide with other references to the same session.
    pub fn borrow_session_mut(&self, session_id: SessionId) -> Option<AtomicRefMut<SessionData>> {
        self.sessions.get(&session_id).map(|s| s.borrow_mut())
    }

    /// Cannot coincide with mutable references to sessions.
    pub fn iter_borrow(&self) -> impl Iterator<Item = AtomicRef<SessionData>> {
        self.sessions.values().map(|s| s.borrow())
    }

    /// Cannot coincide with other references to sessions.
    pub fn iter_borrow_mut(&self) -> impl Iterator<Item = AtomicRefMut<SessionData>> {
        self.sessions.values().map(|s| s.borrow_mut())
    }

    /// Sends to one session. Returns false if it doesn't exist.
    pub fn send(&self, session_id: SessionId, event: &Event) -> bool {
        if let Some(mut session) = self.borrow_session_mut(session_id) {
            session.send::<S>(event);
            true
        } else {
            false
        }
    }

    /// Sends to each of `recipients` that exists, encoding only once.
    pub fn send_each(&self, recipients: impl IntoIterator<Item = SessionId>, event: &Event) {
        let bytes = S::encode(event);
        for session_id in recipients {
            if let Some(mut session) = self.borrow_session_mut(session_id) {
                session.enqueue(&bytes);
            } else {
                debug_assert!(false, "recipient {:?} doesn't exist", session_id);
            }
        }
    }

    /// Sends to every session.
    pub fn broadcast(&self, event: &Event) {
        let bytes = S::encode(event);
        for mut session in self.iter_borrow_mut() {
            session.enqueue(&bytes);
        }
    }
}

impl<S: ServerService> Default for SessionRepo<S> {
    fn default() -> Self {
        Self::new()
    }
}
