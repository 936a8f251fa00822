// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::channel::{ChannelData, ChannelRepo};
use crate::error::Error;
use crate::ordered_set::OrderedSet;
use crate::service::ServerService;
use crate::session::SessionRepo;
use crate::unwrap_or_return;
use core_protocol::dto::{MatchDto, SlotDto};
use core_protocol::event::Event;
use core_protocol::game::{
    GameMode, MatchTeam, MatchTeamType, MatchWinCondition, Mods, SlotStatus,
};
use core_protocol::id::{MatchId, SessionId};
use core_protocol::name::ChannelName;
use idalloc::Slab;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use tokio::task::JoinHandle;

/// Seats per match.
pub const SLOT_COUNT: usize = 16;
/// Concurrent matches per server.
pub const MATCHES_MAX: usize = 64;

/// One seat of a match.
#[derive(Clone, Copy, Debug, Default)]
pub struct Slot {
    pub status: SlotStatus,
    /// Set iff the status requires a player.
    pub(crate) occupant: Option<SessionId>,
    pub team: MatchTeam,
    pub mods: Mods,
    pub loaded: bool,
    pub skipped: bool,
}

impl Slot {
    pub fn occupant(&self) -> Option<SessionId> {
        self.occupant
    }

    pub fn is_open(&self) -> bool {
        self.status == SlotStatus::Open
    }

    /// Back to [`SlotStatus::Open`], with nothing left over from the previous occupant.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn dto(&self) -> SlotDto {
        SlotDto {
            status: self.status,
            team: self.team,
            session_id: self.occupant,
            mods: self.mods,
        }
    }
}

/// Handles of a pending countdown, aborted together.
#[derive(Debug)]
pub struct PendingStart {
    pub start: JoinHandle<()>,
    pub alerts: Vec<JoinHandle<()>>,
}

/// Host-editable settings.
#[derive(Clone, Debug, Default)]
pub struct MatchSettings {
    pub name: String,
    /// Empty means open.
    pub password: String,
    pub map_name: String,
    pub map_md5: String,
    pub map_id: u32,
    pub mode: GameMode,
    pub mods: Mods,
    /// Each slot picks its own mods.
    pub freemods: bool,
    pub win_condition: MatchWinCondition,
    pub team_type: MatchTeamType,
    pub seed: u32,
}

/// Data stored per match.
#[derive(Debug)]
pub struct MatchData {
    pub match_id: MatchId,
    pub settings: MatchSettings,
    pub slots: [Slot; SLOT_COUNT],
    /// Always the occupant of some slot, except transiently during creation.
    pub(crate) host: Option<SessionId>,
    /// Owned instanced channel, disposed with the match.
    pub chat: ChannelName,
    pub(crate) referees: OrderedSet<SessionId>,
    /// Tournament clients watching the match. They may never take a slot.
    pub(crate) tourney_clients: HashSet<SessionId>,
    pub in_progress: bool,
    starting: Option<PendingStart>,
}

impl MatchData {
    pub fn new(match_id: MatchId, settings: MatchSettings) -> Self {
        Self {
            match_id,
            settings,
            slots: [Slot::default(); SLOT_COUNT],
            host: None,
            chat: ChannelName::multiplayer(match_id),
            referees: OrderedSet::new(),
            tourney_clients: HashSet::new(),
            in_progress: false,
            starting: None,
        }
    }

    pub fn host(&self) -> Option<SessionId> {
        self.host
    }

    pub fn slot_of(&self, session_id: SessionId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.occupant == Some(session_id))
    }

    /// Lowest open slot.
    pub fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_open)
    }

    /// No slot has an occupant. Locked slots don't count.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.occupant.is_none())
    }

    pub fn occupants(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.slots.iter().filter_map(|s| s.occupant)
    }

    pub fn is_referee(&self, session_id: SessionId) -> bool {
        self.referees.contains(session_id)
    }

    pub fn add_referee(&mut self, session_id: SessionId) -> bool {
        self.referees.insert_back(session_id)
    }

    pub fn remove_referee(&mut self, session_id: SessionId) -> bool {
        self.referees.remove(session_id)
    }

    pub fn add_tourney_client(&mut self, session_id: SessionId) -> bool {
        self.tourney_clients.insert(session_id)
    }

    pub fn remove_tourney_client(&mut self, session_id: SessionId) -> bool {
        self.tourney_clients.remove(&session_id)
    }

    /// The password is only shown to those inside the match.
    pub fn dto(&self, show_password: bool) -> MatchDto {
        let has_password = !self.settings.password.is_empty();
        MatchDto {
            match_id: self.match_id,
            name: self.settings.name.clone(),
            password: (show_password && has_password).then(|| self.settings.password.clone()),
            has_password,
            in_progress: self.in_progress,
            map_name: self.settings.map_name.clone(),
            map_md5: self.settings.map_md5.clone(),
            map_id: self.settings.map_id,
            mode: self.settings.mode,
            mods: self.settings.mods,
            freemods: self.settings.freemods,
            win_condition: self.settings.win_condition,
            team_type: self.settings.team_type,
            host_id: self.host,
            seed: self.settings.seed,
            slots: self.slots.iter().map(Slot::dto).collect(),
        }
    }

    pub fn is_starting(&self) -> bool {
        self.starting.is_some()
    }

    /// Replaces (and cancels) any previously scheduled countdown.
    pub fn schedule_start(&mut self, start: JoinHandle<()>, alerts: Vec<JoinHandle<()>>) {
        self.cancel_start();
        self.starting = Some(PendingStart { start, alerts });
    }

    /// Aborts the countdown and its alerts. Returns false if none was pending.
    pub fn cancel_start(&mut self) -> bool {
        if let Some(pending) = self.starting.take() {
            pending.start.abort();
            for alert in pending.alerts {
                alert.abort();
            }
            true
        } else {
            false
        }
    }

    /// Sends the full state to everyone in the chat, and a copy without password to the lobby.
    pub fn enqueue_state<S: ServerService>(
        &self,
        sessions: &SessionRepo<S>,
        channels: &ChannelRepo<S>,
    ) {
        if let Some(chat) = channels.get(self.chat) {
            sessions.send_each(chat.members().iter().copied(), &Event::MatchUpdated(self.dto(true)));
        }
        if let Some(lobby) = channels.lobby() {
            sessions.send_each(
                lobby.members().iter().copied(),
                &Event::MatchUpdated(self.dto(false)),
            );
        }
    }
}

/// Every active match, and the id allocator behind them.
pub struct MatchRepo<S: ServerService> {
    matches: HashMap<MatchId, MatchData>,
    ids: Slab<u32>,
    _spooky: PhantomData<S>,
}

impl<S: ServerService> MatchRepo<S> {
    pub fn new() -> Self {
        Self {
            matches: HashMap::new(),
            ids: Slab::new(),
            _spooky: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, match_id: MatchId) -> Option<&MatchData> {
        self.matches.get(&match_id)
    }

    pub fn get_mut(&mut self, match_id: MatchId) -> Option<&mut MatchData> {
        self.matches.get_mut(&match_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchData> {
        self.matches.values()
    }

    /// Registers a match with its chat, and seats the creator as host in slot 0.
    pub fn create(
        &mut self,
        creator: SessionId,
        settings: MatchSettings,
        sessions: &SessionRepo<S>,
        channels: &mut ChannelRepo<S>,
    ) -> Result<MatchId, Error> {
        if self.matches.len() >= MATCHES_MAX {
            sessions.send(creator, &Event::MatchJoinFailed);
            return Err(Error::AdmissionDenied("too many matches"));
        }

        let match_id = MatchId(self.ids.next() as u16);
        let mut data = MatchData::new(match_id, settings);
        data.host = Some(creator);
        channels.insert(ChannelData::new_instance(
            data.chat,
            format!("MID {}'s multiplayer channel.", match_id),
        ));
        self.matches.insert(match_id, data);

        if let Err(e) = self.join(creator, match_id, "", sessions, channels) {
            self.dispose(match_id, false, sessions, channels);
            return Err(e);
        }

        info!("{} created match {}", creator, match_id);
        Ok(match_id)
    }

    /// Seats a session in a match. Nothing is mutated unless every check passes.
    pub fn join(
        &mut self,
        session_id: SessionId,
        match_id: MatchId,
        password: &str,
        sessions: &SessionRepo<S>,
        channels: &mut ChannelRepo<S>,
    ) -> Result<(), Error> {
        let failed = |e: Error| {
            warn!("{} can't join match {}: {}", session_id, match_id, e);
            sessions.send(session_id, &Event::MatchJoinFailed);
            e
        };

        let data = self
            .matches
            .get_mut(&match_id)
            .ok_or_else(|| failed(Error::NotFound("match")))?;
        // The session is only borrowed while checking, since failures notify it.
        let index = {
            let session = sessions
                .borrow_session(session_id)
                .ok_or(Error::NotFound("session"))?;
            if session.match_id.is_some() {
                Err(Error::InvalidState("already in a match"))
            } else if data.tourney_clients.contains(&session_id) {
                Err(Error::InvalidState("tourney client"))
            } else if data.host == Some(session_id) {
                debug_assert!(data.is_empty(), "only the creator joins as host");
                Ok(0)
            } else if password != data.settings.password && !session.is_staff() {
                Err(Error::AdmissionDenied("wrong password"))
            } else {
                data.free_slot()
                    .ok_or(Error::AdmissionDenied("match full"))
            }
        }
        .map_err(failed)?;

        if let Err(e) = channels.join(session_id, data.chat, sessions) {
            warn!("{} can't join chat of match {}: {}", session_id, match_id, e);
            return Err(e);
        }

        let lobby = ChannelName::new(S::LOBBY_CHANNEL);
        if channels.get(lobby).map_or(false, |c| c.is_member(session_id)) {
            if let Err(e) = channels.leave(session_id, lobby, true, sessions) {
                debug!("{} can't leave {}: {}", session_id, lobby, e);
            }
        }

        let slot = &mut data.slots[index];
        if data.settings.team_type.is_team_play() && slot.team == MatchTeam::Neutral {
            slot.team = MatchTeam::Red;
        }
        slot.status = SlotStatus::NotReady;
        slot.occupant = Some(session_id);

        if let Some(mut session) = sessions.borrow_session_mut(session_id) {
            session.match_id = Some(match_id);
            session.send::<S>(&Event::MatchJoinSucceeded(data.dto(true)));
        }
        debug!("{} joined match {} in slot {}", session_id, match_id, index);

        data.enqueue_state(sessions, channels);
        Ok(())
    }

    /// Vacates a session's slot, handing off host or disposing the match as needed.
    pub fn leave(
        &mut self,
        session_id: SessionId,
        sessions: &SessionRepo<S>,
        channels: &mut ChannelRepo<S>,
    ) -> Result<(), Error> {
        let (match_id, name) = {
            let session = sessions
                .borrow_session(session_id)
                .ok_or(Error::NotFound("session"))?;
            let match_id = session
                .match_id
                .ok_or(Error::InvalidState("not in a match"))?;
            (match_id, session.name)
        };

        let (chat, empty) = if let Some(data) = self.matches.get_mut(&match_id) {
            if let Some(index) = data.slot_of(session_id) {
                data.slots[index].reset();
            } else {
                debug_assert!(false, "{} not seated in its match", session_id);
            }
            (data.chat, data.is_empty())
        } else {
            debug_assert!(false, "match {} missing", match_id);
            if let Some(mut session) = sessions.borrow_session_mut(session_id) {
                session.match_id = None;
            }
            return Err(Error::NotFound("match"));
        };

        if let Err(e) = channels.leave(session_id, chat, true, sessions) {
            debug!("{} can't leave {}: {}", session_id, chat, e);
        }

        if empty {
            self.dispose(match_id, true, sessions, channels);
        } else if let Some(data) = self.matches.get_mut(&match_id) {
            if data.host == Some(session_id) {
                let next_host = data.occupants().next();
                data.host = next_host;
                if let Some(host) = next_host {
                    sessions.send(host, &Event::MatchHostTransferred);
                    debug!("match {} host is now {}", match_id, host);
                }
            }
            if data.referees.remove(session_id) {
                let notice = format!("{} removed from match referees.", name);
                if let Err(e) = channels.send_bot(chat, &notice, sessions) {
                    debug!("can't notify {}: {}", chat, e);
                }
            }
            data.enqueue_state(sessions, channels);
        }

        if let Some(mut session) = sessions.borrow_session_mut(session_id) {
            session.match_id = None;
        }
        Ok(())
    }

    /// Hands the host role to another occupant.
    pub fn transfer_host(
        &mut self,
        match_id: MatchId,
        new_host: SessionId,
        sessions: &SessionRepo<S>,
        channels: &ChannelRepo<S>,
    ) -> Result<(), Error> {
        let data = self
            .matches
            .get_mut(&match_id)
            .ok_or(Error::NotFound("match"))?;
        if data.slot_of(new_host).is_none() {
            return Err(Error::InvalidState("not an occupant"));
        }
        if data.host == Some(new_host) {
            return Err(Error::InvalidState("already host"));
        }
        data.host = Some(new_host);
        sessions.send(new_host, &Event::MatchHostTransferred);
        data.enqueue_state(sessions, channels);
        Ok(())
    }

    /// Removes a match, cancelling its countdown and disposing its chat.
    fn dispose(
        &mut self,
        match_id: MatchId,
        announce: bool,
        sessions: &SessionRepo<S>,
        channels: &mut ChannelRepo<S>,
    ) {
        let mut data = unwrap_or_return!(self.matches.remove(&match_id));
        if data.cancel_start() {
            debug!("cancelled countdown of match {}", match_id);
        }
        self.ids.free(match_id.0 as u32);
        channels.dispose(data.chat, sessions);

        if announce {
            if let Some(lobby) = channels.lobby() {
                sessions.send_each(lobby.members().iter().copied(), &Event::MatchDisposed(match_id));
            }
        }
        info!("disposed match {}", match_id);
    }
}

impl<S: ServerService> Default for MatchRepo<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use crate::error::Error;
    use crate::multiplayer::{MatchSettings, SLOT_COUNT};
    use crate::service::mock::{drain, mock_context, mock_session, mock_session_with, MockService};
    use crate::context::Context;
    use core_protocol::event::Event;
    use core_protocol::game::{MatchTeam, MatchTeamType, SlotStatus};
    use core_protocol::id::{MatchId, SessionId};
    use core_protocol::name::ChannelName;
    use core_protocol::privileges::Privileges;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn settings(password: &str) -> MatchSettings {
        MatchSettings {
            name: String::from("test match"),
            password: password.to_owned(),
            ..MatchSettings::default()
        }
    }

    fn occupied(context: &Context<MockService>, match_id: MatchId) -> usize {
        context.matches.get(match_id).unwrap().occupants().count()
    }

    #[test]
    fn scenarios() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let p2 = mock_session(&mut context, 11);

        // A.
        let match_id = context.create_match(p1, settings("secret")).unwrap();
        let chat = context.matches.get(match_id).unwrap().chat;
        assert_eq!(
            context.matches.get(match_id).unwrap().slots[0].occupant(),
            Some(p1)
        );
        assert!(context.join_match(p2, match_id, "secret").is_ok());
        assert_eq!(occupied(&context, match_id), 2);
        assert!(context.channels.get(chat).unwrap().is_member(p2));
        assert_eq!(
            context.sessions.borrow_session(p2).unwrap().match_id(),
            Some(match_id)
        );
        assert!(drain(&context, p2)
            .iter()
            .any(|e| matches!(e, Event::MatchJoinSucceeded(dto) if dto.password.as_deref() == Some("secret"))));

        // B.
        context.leave_match(p1).unwrap();
        let data = context.matches.get(match_id).unwrap();
        assert!(data.slots[0].is_open());
        assert_eq!(data.host(), Some(p2));
        assert_eq!(context.sessions.borrow_session(p1).unwrap().match_id(), None);
        assert!(drain(&context, p2).contains(&Event::MatchHostTransferred));

        // C.
        context.leave_match(p2).unwrap();
        assert!(context.matches.get(match_id).is_none());
        assert!(!context.channels.contains(chat));
        assert!(context.matches.is_empty());
    }

    #[test]
    fn wrong_password() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let p2 = mock_session(&mut context, 11);
        let match_id = context.create_match(p1, settings("secret")).unwrap();
        drain(&context, p2);

        assert_eq!(
            context.join_match(p2, match_id, "guess"),
            Err(Error::AdmissionDenied("wrong password"))
        );
        assert_eq!(drain(&context, p2), vec![Event::MatchJoinFailed]);
        assert_eq!(occupied(&context, match_id), 1);
        assert_eq!(context.sessions.borrow_session(p2).unwrap().match_id(), None);

        assert_eq!(
            context.join_match(p1, match_id, "secret"),
            Err(Error::InvalidState("already in a match"))
        );
    }

    #[test]
    fn staff_ignore_password() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let moderator = mock_session_with(
            &mut context,
            11,
            Privileges::NORMAL | Privileges::MODERATOR,
        );
        let match_id = context.create_match(p1, settings("secret")).unwrap();

        context.join_match(moderator, match_id, "guess").unwrap();
        assert_eq!(occupied(&context, match_id), 2);
        assert_eq!(
            context.sessions.borrow_session(moderator).unwrap().match_id(),
            Some(match_id)
        );
    }

    #[test]
    fn chat_refusal_aborts_join() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let restricted = mock_session_with(&mut context, 11, Privileges::VERIFIED);
        let match_id = context.create_match(p1, settings("")).unwrap();
        let chat = context.matches.get(match_id).unwrap().chat;

        assert_eq!(
            context.join_match(restricted, match_id, ""),
            Err(Error::AdmissionDenied("insufficient privileges"))
        );
        assert_eq!(occupied(&context, match_id), 1);
        assert_eq!(
            context.sessions.borrow_session(restricted).unwrap().match_id(),
            None
        );
        assert!(!context.channels.get(chat).unwrap().is_member(restricted));
        context.assert_invariants();
    }

    #[test]
    fn full() {
        let (mut context, _) = mock_context();
        let host = mock_session(&mut context, 100);
        let match_id = context.create_match(host, settings("")).unwrap();
        for i in 1..SLOT_COUNT as u32 {
            let id = mock_session(&mut context, 100 + i);
            context.join_match(id, match_id, "").unwrap();
        }
        assert_eq!(occupied(&context, match_id), SLOT_COUNT);

        let late = mock_session(&mut context, 200);
        assert_eq!(
            context.join_match(late, match_id, ""),
            Err(Error::AdmissionDenied("match full"))
        );
        assert_eq!(occupied(&context, match_id), SLOT_COUNT);
        assert_eq!(context.sessions.borrow_session(late).unwrap().match_id(), None);
        assert!(!context
            .channels
            .get(ChannelName::multiplayer(match_id))
            .unwrap()
            .is_member(late));
    }

    #[test]
    fn lowest_slot_becomes_host() {
        let (mut context, _) = mock_context();
        let ids: Vec<SessionId> = (10..15).map(|i| mock_session(&mut context, i)).collect();
        let match_id = context.create_match(ids[0], settings("")).unwrap();
        for &id in &ids[1..] {
            context.join_match(id, match_id, "").unwrap();
        }
        context.leave_match(ids[1]).unwrap();
        context.leave_match(ids[2]).unwrap();
        // Slot 1 is reused.
        let newcomer = mock_session(&mut context, 20);
        context.join_match(newcomer, match_id, "").unwrap();
        assert_eq!(
            context.matches.get(match_id).unwrap().slots[1].occupant(),
            Some(newcomer)
        );

        context.leave_match(ids[0]).unwrap();
        assert_eq!(context.matches.get(match_id).unwrap().host(), Some(newcomer));
    }

    #[test]
    fn transfer_host() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let p2 = mock_session(&mut context, 11);
        let outsider = mock_session(&mut context, 12);
        let match_id = context.create_match(p1, settings("")).unwrap();
        context.join_match(p2, match_id, "").unwrap();
        drain(&context, p2);

        assert_eq!(
            context
                .matches
                .transfer_host(match_id, outsider, &context.sessions, &context.channels),
            Err(Error::InvalidState("not an occupant"))
        );
        context
            .matches
            .transfer_host(match_id, p2, &context.sessions, &context.channels)
            .unwrap();
        assert_eq!(context.matches.get(match_id).unwrap().host(), Some(p2));
        assert!(drain(&context, p2).contains(&Event::MatchHostTransferred));
        context.assert_invariants();
    }

    #[test]
    fn team_play_and_lobby() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let watcher = mock_session(&mut context, 11);
        let lobby = ChannelName::new("#lobby");
        for id in [p1, watcher] {
            context.sessions.borrow_session_mut(id).unwrap().in_lobby = true;
            context.join_channel(id, lobby).unwrap();
        }

        let match_id = context
            .create_match(
                p1,
                MatchSettings {
                    team_type: MatchTeamType::TeamVs,
                    password: String::from("secret"),
                    ..MatchSettings::default()
                },
            )
            .unwrap();
        let slot = context.matches.get(match_id).unwrap().slots[0];
        assert_eq!(slot.team, MatchTeam::Red);
        assert_eq!(slot.status, SlotStatus::NotReady);
        // Joining a match leaves the lobby.
        assert!(!context.channels.get(lobby).unwrap().is_member(p1));
        assert!(drain(&context, p1).contains(&Event::ChannelKicked(String::from("#lobby"))));

        // The lobby sees the match without its password.
        assert!(drain(&context, watcher).iter().any(|e| matches!(
            e,
            Event::MatchUpdated(dto) if dto.match_id == match_id && dto.has_password && dto.password.is_none()
        )));

        context.leave_match(p1).unwrap();
        assert!(drain(&context, watcher).contains(&Event::MatchDisposed(match_id)));
    }

    #[test]
    fn referees() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let p2 = mock_session(&mut context, 11);
        let match_id = context.create_match(p1, settings("")).unwrap();
        context.join_match(p2, match_id, "").unwrap();
        assert!(context.matches.get_mut(match_id).unwrap().add_referee(p2));
        drain(&context, p1);

        context.leave_match(p2).unwrap();
        assert!(!context.matches.get(match_id).unwrap().is_referee(p2));
        assert!(drain(&context, p1).iter().any(|e| matches!(
            e,
            Event::Message(m) if m.sender_id == SessionId::BOT && m.text == "Player 11 removed from match referees."
        )));
    }

    #[test]
    fn tourney_client() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let p2 = mock_session(&mut context, 11);
        let match_id = context.create_match(p1, settings("")).unwrap();
        context
            .matches
            .get_mut(match_id)
            .unwrap()
            .add_tourney_client(p2);
        assert_eq!(
            context.join_match(p2, match_id, ""),
            Err(Error::InvalidState("tourney client"))
        );
    }

    #[test]
    fn ids_are_recycled() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let first = context.create_match(p1, settings("")).unwrap();
        context.leave_match(p1).unwrap();
        let second = context.create_match(p1, settings("")).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn teardown_cancels_countdown() {
        let (mut context, _) = mock_context();
        let p1 = mock_session(&mut context, 10);
        let match_id = context.create_match(p1, settings("")).unwrap();

        let fired = Arc::new(AtomicBool::new(false));
        let spawn = |delay: u64| {
            let fired = Arc::clone(&fired);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                fired.store(true, Ordering::SeqCst);
            })
        };
        let start = spawn(50);
        let alerts = vec![spawn(20), spawn(40)];
        context
            .matches
            .get_mut(match_id)
            .unwrap()
            .schedule_start(start, alerts);
        assert!(context.matches.get(match_id).unwrap().is_starting());

        context.leave_match(p1).unwrap();
        assert!(context.matches.get(match_id).is_none());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
