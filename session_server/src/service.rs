// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use core_protocol::event::Event;

/// Plugs a concrete client protocol into the session server.
pub trait ServerService: 'static + Sized {
    /// Only sessions currently inside the multiplayer lobby screen may join this channel.
    const LOBBY_CHANNEL: &'static str = "#lobby";
    /// Sender name of system messages.
    const BOT_NAME: &'static str;

    /// Serializes a notification. The result is treated as opaque.
    fn encode(event: &Event) -> Vec<u8>;
}

#[cfg(test)]
pub mod mock {
    use crate::context::Context;
    use crate::service::ServerService;
    use crate::session::SessionData;
    use core_protocol::event::Event;
    use core_protocol::id::SessionId;
    use core_protocol::name::{ChannelName, Username};
    use core_protocol::privileges::Privileges;
    use server_util::database::Database;
    use server_util::memory_database::MemoryDatabase;
    use std::sync::Arc;

    pub struct MockService;

    impl ServerService for MockService {
        const BOT_NAME: &'static str = "Bot";

        fn encode(event: &Event) -> Vec<u8> {
            bincode::serialize(event).unwrap()
        }
    }

    /// Splits concatenated encodings back into events.
    pub fn decode(mut bytes: &[u8]) -> Vec<Event> {
        let mut events = Vec::new();
        while !bytes.is_empty() {
            events.push(bincode::deserialize_from(&mut bytes).unwrap());
        }
        events
    }

    /// Dequeues and decodes everything pending for a session.
    pub fn drain(context: &Context<MockService>, session_id: SessionId) -> Vec<Event> {
        context
            .dequeue(session_id)
            .map(|bytes| decode(&bytes))
            .unwrap_or_default()
    }

    /// A context with a public channel, a staff channel, and the lobby.
    pub fn mock_context() -> (Context<MockService>, Arc<MemoryDatabase>) {
        let database = Arc::new(MemoryDatabase::new(false));
        let shared: Arc<dyn Database> = database.clone();
        let mut context = Context::new(shared, None);
        for channel in crate::options::default_channels() {
            context.channels.insert(channel);
        }
        (context, database)
    }

    /// Registers an ordinary session, without going through login.
    pub fn mock_session(context: &mut Context<MockService>, id: u32) -> SessionId {
        mock_session_with(context, id, Privileges::NORMAL | Privileges::VERIFIED)
    }

    pub fn mock_session_with(
        context: &mut Context<MockService>,
        id: u32,
        privileges: Privileges,
    ) -> SessionId {
        let session_id = SessionId(id);
        let session = SessionData::new(
            session_id,
            Username::new(&format!("Player {}", id)),
            privileges,
        );
        context.sessions.insert(session).unwrap();
        session_id
    }

    pub fn osu() -> ChannelName {
        ChannelName::new("#osu")
    }
}
