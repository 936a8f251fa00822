// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::error::Error;
use crate::ordered_set::OrderedSet;
use crate::service::ServerService;
use crate::session::{SessionData, SessionRepo};
use core_protocol::dto::{ChannelInfoDto, MessageDto};
use core_protocol::event::Event;
use core_protocol::id::SessionId;
use core_protocol::name::ChannelName;
use core_protocol::privileges::Privileges;
use log::{debug, warn};
use std::collections::HashMap;
use std::marker::PhantomData;

/// Data stored per channel.
#[derive(Debug)]
pub struct ChannelData {
    pub name: ChannelName,
    pub topic: String,
    /// Every one of these bits is required to join.
    pub read_privileges: Privileges,
    /// Every one of these bits is required to speak.
    pub write_privileges: Privileges,
    /// Joined automatically at login.
    pub auto_join: bool,
    /// Created on demand, removed upon becoming empty, and only advertised to members.
    pub instance: bool,
    /// In order of join.
    pub(crate) members: OrderedSet<SessionId>,
}

impl ChannelData {
    /// A public, process-lifetime channel.
    pub fn new(name: ChannelName, topic: impl Into<String>) -> Self {
        Self {
            name,
            topic: topic.into(),
            read_privileges: Privileges::NORMAL,
            write_privileges: Privileges::NORMAL,
            auto_join: false,
            instance: false,
            members: OrderedSet::new(),
        }
    }

    /// An ephemeral channel that is never auto-joined.
    pub fn new_instance(name: ChannelName, topic: impl Into<String>) -> Self {
        Self {
            instance: true,
            ..Self::new(name, topic)
        }
    }

    pub fn members(&self) -> &[SessionId] {
        &self.members
    }

    pub fn is_member(&self, session_id: SessionId) -> bool {
        self.members.contains(session_id)
    }

    pub fn can_read(&self, privileges: Privileges) -> bool {
        privileges.contains(self.read_privileges)
    }

    pub fn can_write(&self, privileges: Privileges) -> bool {
        privileges.contains(self.write_privileges)
    }

    pub fn info(&self) -> ChannelInfoDto {
        ChannelInfoDto {
            name: self.name.display_name().to_owned(),
            topic: self.topic.clone(),
            members: self.members.len() as u32,
        }
    }
}

/// Every channel, static or instanced.
pub struct ChannelRepo<S: ServerService> {
    channels: HashMap<ChannelName, ChannelData>,
    _spooky: PhantomData<S>,
}

impl<S: ServerService> ChannelRepo<S> {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
            _spooky: PhantomData,
        }
    }

    /// Registers a channel, replacing and returning any (memberless) channel of the same name.
    pub fn insert(&mut self, channel: ChannelData) -> Option<ChannelData> {
        debug_assert!(channel.members.is_empty(), "channels start out empty");
        self.channels.insert(channel.name, channel)
    }

    pub fn get(&self, name: ChannelName) -> Option<&ChannelData> {
        self.channels.get(&name)
    }

    pub fn get_mut(&mut self, name: ChannelName) -> Option<&mut ChannelData> {
        self.channels.get_mut(&name)
    }

    pub fn contains(&self, name: ChannelName) -> bool {
        self.channels.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelData> {
        self.channels.values()
    }

    pub fn lobby(&self) -> Option<&ChannelData> {
        self.get(ChannelName::new(S::LOBBY_CHANNEL))
    }

    /// Sends the occupancy of a channel to its members if instanced, otherwise to everyone.
    fn broadcast_info(channel: &ChannelData, sessions: &SessionRepo<S>) {
        let event = Event::ChannelInfo(channel.info());
        if channel.instance {
            sessions.send_each(channel.members.iter(), &event);
        } else {
            sessions.broadcast(&event);
        }
    }

    fn admission(channel: &ChannelData, session: &SessionData) -> Result<(), Error> {
        if channel.is_member(session.session_id) {
            Err(Error::InvalidState("already a member"))
        } else if !channel.can_read(session.privileges()) {
            Err(Error::AdmissionDenied("insufficient privileges"))
        } else if channel.name.as_str() == S::LOBBY_CHANNEL && !session.in_lobby {
            Err(Error::AdmissionDenied("not in the lobby"))
        } else {
            Ok(())
        }
    }

    /// Whether [`Self::join`] would admit a session, without joining. A channel that doesn't
    /// exist yet is judged as a fresh instance.
    pub fn check_join(
        &self,
        session_id: SessionId,
        name: ChannelName,
        sessions: &SessionRepo<S>,
    ) -> Result<(), Error> {
        let session = sessions
            .borrow_session(session_id)
            .ok_or(Error::NotFound("session"))?;
        match self.channels.get(&name) {
            Some(channel) => Self::admission(channel, &session),
            None => Self::admission(&ChannelData::new_instance(name, ""), &session),
        }
    }

    /// Admits a session to a channel.
    pub fn join(
        &mut self,
        session_id: SessionId,
        name: ChannelName,
        sessions: &SessionRepo<S>,
    ) -> Result<(), Error> {
        let channel = self
            .channels
            .get_mut(&name)
            .ok_or(Error::NotFound("channel"))?;
        let mut session = sessions
            .borrow_session_mut(session_id)
            .ok_or(Error::NotFound("session"))?;
        Self::admission(channel, &session)?;

        channel.members.insert_back(session_id);
        session.channels.insert_back(name);
        session.send::<S>(&Event::ChannelJoined(name.display_name().to_owned()));
        drop(session);

        debug!("{} joined {}", session_id, name);
        Self::broadcast_info(channel, sessions);
        Ok(())
    }

    /// Removes a session from a channel, removing the channel if it is instanced and became empty.
    pub fn leave(
        &mut self,
        session_id: SessionId,
        name: ChannelName,
        notify: bool,
        sessions: &SessionRepo<S>,
    ) -> Result<(), Error> {
        let channel = self
            .channels
            .get_mut(&name)
            .ok_or(Error::NotFound("channel"))?;
        if !channel.members.remove(session_id) {
            return Err(Error::InvalidState("not a member"));
        }

        if let Some(mut session) = sessions.borrow_session_mut(session_id) {
            session.channels.remove(name);
            if notify {
                session.send::<S>(&Event::ChannelKicked(name.display_name().to_owned()));
            }
        }

        debug!("{} left {}", session_id, name);
        if channel.instance && channel.members.is_empty() {
            self.channels.remove(&name);
            debug!("removed empty instance {}", name);
        } else {
            Self::broadcast_info(channel, sessions);
        }
        Ok(())
    }

    /// Removes a channel, kicking everyone still inside.
    pub fn dispose(&mut self, name: ChannelName, sessions: &SessionRepo<S>) -> Option<ChannelData> {
        let channel = self.channels.remove(&name)?;
        let kicked = Event::ChannelKicked(name.display_name().to_owned());
        for session_id in channel.members.iter() {
            if let Some(mut session) = sessions.borrow_session_mut(session_id) {
                session.channels.remove(name);
                session.send::<S>(&kicked);
            }
        }
        Some(channel)
    }

    /// Delivers a message from a member to every other member.
    pub fn send_message(
        &self,
        sender_id: SessionId,
        name: ChannelName,
        text: &str,
        sessions: &SessionRepo<S>,
    ) -> Result<(), Error> {
        let channel = self.channels.get(&name).ok_or(Error::NotFound("channel"))?;
        let sender = sessions
            .borrow_session(sender_id)
            .ok_or(Error::NotFound("session"))?;

        if !channel.is_member(sender_id) {
            return Err(Error::InvalidState("not a member"));
        }
        if !channel.can_write(sender.privileges()) {
            return Err(Error::AdmissionDenied("insufficient privileges"));
        }
        if sender.is_silenced() {
            warn!("{} tried to speak in {} while silenced", *sender, name);
            return Err(Error::AdmissionDenied("silenced"));
        }

        let event = Event::Message(MessageDto {
            sender: sender.name.as_str().to_owned(),
            sender_id,
            text: text.to_owned(),
            recipient: name.display_name().to_owned(),
        });
        drop(sender);

        sessions.send_each(channel.members.iter().filter(|&id| id != sender_id), &event);
        Ok(())
    }

    /// Delivers a system message to every member.
    pub fn send_bot(
        &self,
        name: ChannelName,
        text: &str,
        sessions: &SessionRepo<S>,
    ) -> Result<(), Error> {
        let channel = self.channels.get(&name).ok_or(Error::NotFound("channel"))?;
        let event = Event::Message(MessageDto {
            sender: S::BOT_NAME.to_owned(),
            sender_id: SessionId::BOT,
            text: text.to_owned(),
            recipient: name.display_name().to_owned(),
        });
        sessions.send_each(channel.members.iter(), &event);
        Ok(())
    }
}

impl<S: ServerService> Default for ChannelRepo<S> {
    fn default() -> Self {
        Self::new()
    }
}
