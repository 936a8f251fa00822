// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::{Context, Pending};
use crate::error::Error;
use crate::service::ServerService;
use crate::session::SessionData;
use core_protocol::id::SessionId;
use log::debug;
use server_util::database_schema::{RelationshipItem, RelationshipKind};

impl<S: ServerService> Context<S> {
    /// Befriends `target`, unblocking it if needed.
    pub fn add_friend(
        &mut self,
        session_id: SessionId,
        target: SessionId,
    ) -> Result<Pending, Error> {
        {
            let mut session = self
                .sessions
                .borrow_session_mut(session_id)
                .ok_or(Error::NotFound("session"))?;
            if !session.friends.insert(target) {
                debug!("{} already friends with {}", session_id, target);
                return Err(Error::InvalidState("already friends"));
            }
            session.blocks.remove(&target);
        }
        Ok(self.replace_relationship(session_id, target, RelationshipKind::Friend))
    }

    pub fn remove_friend(
        &mut self,
        session_id: SessionId,
        target: SessionId,
    ) -> Result<Pending, Error> {
        if !self
            .sessions
            .borrow_session_mut(session_id)
            .ok_or(Error::NotFound("session"))?
            .friends
            .remove(&target)
        {
            debug!("{} not friends with {}", session_id, target);
            return Err(Error::InvalidState("not friends"));
        }
        Ok(self.delete_relationship(session_id, target))
    }

    /// Blocks `target`, unfriending it if needed.
    pub fn add_block(
        &mut self,
        session_id: SessionId,
        target: SessionId,
    ) -> Result<Pending, Error> {
        {
            let mut session = self
                .sessions
                .borrow_session_mut(session_id)
                .ok_or(Error::NotFound("session"))?;
            if !session.blocks.insert(target) {
                debug!("{} already blocked {}", session_id, target);
                return Err(Error::InvalidState("already blocked"));
            }
            session.friends.remove(&target);
        }
        Ok(self.replace_relationship(session_id, target, RelationshipKind::Block))
    }

    pub fn remove_block(
        &mut self,
        session_id: SessionId,
        target: SessionId,
    ) -> Result<Pending, Error> {
        if !self
            .sessions
            .borrow_session_mut(session_id)
            .ok_or(Error::NotFound("session"))?
            .blocks
            .remove(&target)
        {
            debug!("{} hasn't blocked {}", session_id, target);
            return Err(Error::InvalidState("not blocked"));
        }
        Ok(self.delete_relationship(session_id, target))
    }

    fn replace_relationship(
        &self,
        user1: SessionId,
        user2: SessionId,
        kind: RelationshipKind,
    ) -> Pending {
        let database = self.database();
        Box::pin(async move {
            database
                .replace_relationship(user1, user2, kind)
                .await
                .map_err(Error::from)
        })
    }

    fn delete_relationship(&self, user1: SessionId, user2: SessionId) -> Pending {
        let database = self.database();
        Box::pin(async move {
            database
                .delete_relationship(user1, user2)
                .await
                .map_err(Error::from)
        })
    }

    /// Delivers a direct message, unless the recipient blocked the sender or only accepts
    /// friends. Replies with the recipient's away message, if any.
    pub fn send_direct_message(
        &self,
        sender_id: SessionId,
        target: SessionId,
        text: &str,
    ) -> Result<(), Error> {
        if sender_id == target {
            return Err(Error::InvalidState("can't message self"));
        }
        let sender_name = {
            let sender = self
                .sessions
                .borrow_session(sender_id)
                .ok_or(Error::NotFound("session"))?;
            if sender.is_silenced() {
                return Err(Error::AdmissionDenied("silenced"));
            }
            sender.name
        };

        let away = {
            let mut recipient = self
                .sessions
                .borrow_session_mut(target)
                .ok_or(Error::NotFound("recipient"))?;
            if recipient.blocks.contains(&sender_id) {
                debug!("{} blocked messages from {}", target, sender_id);
                return Err(Error::AdmissionDenied("blocked"));
            }
            if recipient.pm_private && !recipient.friends.contains(&sender_id) {
                return Err(Error::AdmissionDenied("friends only"));
            }
            recipient.receive_message::<S>((sender_id, sender_name.as_str()), text, None);
            recipient
                .away_message
                .clone()
                .map(|away| (recipient.name, away))
        };

        if let Some((name, away)) = away {
            if let Some(mut sender) = self.sessions.borrow_session_mut(sender_id) {
                sender.receive_message::<S>((target, name.as_str()), &away, None);
            }
        }
        Ok(())
    }

    /// Delivers a direct message from the server bot. Returns false if the session is offline.
    pub fn send_bot_message(&self, target: SessionId, text: &str) -> bool {
        if let Some(mut session) = self.sessions.borrow_session_mut(target) {
            session.receive_bot_message::<S>(text);
            true
        } else {
            false
        }
    }
}

impl SessionData {
    /// Replaces friends and blocks with stored rows. The bot is everyone's friend.
    pub fn load_relationships(&mut self, rows: Vec<RelationshipItem>) {
        self.friends.clear();
        self.blocks.clear();
        for row in rows {
            match row.kind {
                RelationshipKind::Friend => self.friends.insert(row.user2),
                RelationshipKind::Block => self.blocks.insert(row.user2),
            };
        }
        self.friends.insert(SessionId::BOT);
    }
}
