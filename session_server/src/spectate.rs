// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::channel::ChannelData;
use crate::context::Context;
use crate::error::Error;
use crate::service::ServerService;
use core_protocol::event::Event;
use core_protocol::id::SessionId;
use core_protocol::name::ChannelName;
use log::{debug, warn};

impl<S: ServerService> Context<S> {
    /// Makes `observer` watch `host`, switching away from any other host first.
    ///
    /// A stealthy observer sees the other spectators, but nobody is told about it.
    pub fn add_spectator(&mut self, host: SessionId, observer: SessionId) -> Result<(), Error> {
        if host == observer {
            return Err(Error::InvalidState("can't spectate self"));
        }
        let host_name = self
            .sessions
            .borrow_session(host)
            .ok_or(Error::NotFound("host"))?
            .name;
        let (previous, stealth) = {
            let session = self
                .sessions
                .borrow_session(observer)
                .ok_or(Error::NotFound("session"))?;
            (session.spectating, session.stealth)
        };

        if previous == Some(host) {
            return Err(Error::InvalidState("already spectating"));
        }

        // Refusals must come before switching, so the previous host keeps its spectator.
        let chat = ChannelName::spectator(host);
        if !self.channels.contains(chat) {
            self.channels.check_join(host, chat, &self.sessions)?;
        }
        self.channels.check_join(observer, chat, &self.sessions)?;

        if let Some(previous) = previous {
            self.remove_spectator(previous, observer)?;
        }

        if !self.channels.contains(chat) {
            self.channels.insert(ChannelData::new_instance(
                chat,
                format!("{}'s spectator channel.", host_name),
            ));
            if let Err(e) = self.channels.join(host, chat, &self.sessions) {
                warn!("{} can't join own spectator channel: {}", host, e);
                self.channels.dispose(chat, &self.sessions);
                return Err(e);
            }
        }

        if let Err(e) = self.channels.join(observer, chat, &self.sessions) {
            warn!("{} can't join spectator channel of {}: {}", observer, host, e);
            let abandoned = self
                .sessions
                .borrow_session(host)
                .map_or(false, |h| h.spectators.is_empty());
            if abandoned {
                let _ = self.channels.leave(host, chat, false, &self.sessions);
            }
            return Err(e);
        }

        let fellows = self
            .sessions
            .borrow_session(host)
            .map(|h| h.spectators.to_vec())
            .unwrap_or_default();

        if !stealth {
            self.sessions
                .send_each(fellows.iter().copied(), &Event::FellowSpectatorJoined(observer));
            self.sessions.send(host, &Event::SpectatorJoined(observer));
        }
        if let Some(mut session) = self.sessions.borrow_session_mut(observer) {
            for &fellow in &fellows {
                session.send::<S>(&Event::FellowSpectatorJoined(fellow));
            }
            session.spectating = Some(host);
        }
        if let Some(mut session) = self.sessions.borrow_session_mut(host) {
            session.spectators.insert_back(observer);
        }

        debug!("{} started spectating {} (stealth: {})", observer, host, stealth);
        Ok(())
    }

    /// Makes `observer` stop watching `host`, closing the spectator channel if it was the last.
    pub fn remove_spectator(&mut self, host: SessionId, observer: SessionId) -> Result<(), Error> {
        let remaining = {
            let mut session = self
                .sessions
                .borrow_session_mut(host)
                .ok_or(Error::NotFound("host"))?;
            if !session.spectators.remove(observer) {
                return Err(Error::InvalidState("not spectating"));
            }
            session.spectators.to_vec()
        };
        if let Some(mut session) = self.sessions.borrow_session_mut(observer) {
            debug_assert_eq!(session.spectating, Some(host));
            session.spectating = None;
        }

        let chat = ChannelName::spectator(host);
        let _ = self.channels.leave(observer, chat, true, &self.sessions);

        if remaining.is_empty() {
            let _ = self.channels.leave(host, chat, true, &self.sessions);
        } else if let Some(channel) = self.channels.get(chat) {
            let info = Event::ChannelInfo(channel.info());
            self.sessions.send(host, &info);
            for &fellow in &remaining {
                if let Some(mut session) = self.sessions.borrow_session_mut(fellow) {
                    session.send::<S>(&Event::FellowSpectatorLeft(observer));
                    session.send::<S>(&info);
                }
            }
        }

        self.sessions.send(host, &Event::SpectatorLeft(observer));
        debug!("{} stopped spectating {}", observer, host);
        Ok(())
    }
}
