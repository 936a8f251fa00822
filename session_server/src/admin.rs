// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::context::{Context, Pending};
use crate::error::Error;
use crate::service::ServerService;
use core_protocol::event::Event;
use core_protocol::get_unix_time_now;
use core_protocol::id::SessionId;
use core_protocol::privileges::Privileges;
use log::{debug, error, info};
use server_util::database::Database;
use server_util::webhook::AuditWebhook;
use std::sync::Arc;

// Every operation changes memory (and notifies) right away, and returns the writes as
// [`Pending`]. A failed write leaves the in-memory change in place.
impl<S: ServerService> Context<S> {
    pub fn update_privileges(
        &mut self,
        session_id: SessionId,
        privileges: Privileges,
    ) -> Result<Pending, Error> {
        self.sessions
            .borrow_session_mut(session_id)
            .ok_or(Error::NotFound("session"))?
            .set_privileges(privileges);
        let database = self.database();
        Ok(Box::pin(async move {
            database
                .update_privileges(session_id, privileges)
                .await
                .map_err(Error::from)
        }))
    }

    pub fn add_privileges(
        &mut self,
        session_id: SessionId,
        bits: Privileges,
    ) -> Result<Pending, Error> {
        let privileges = self.privileges_of(session_id)? | bits;
        self.update_privileges(session_id, privileges)
    }

    pub fn remove_privileges(
        &mut self,
        session_id: SessionId,
        bits: Privileges,
    ) -> Result<Pending, Error> {
        let privileges = self.privileges_of(session_id)? - bits;
        self.update_privileges(session_id, privileges)
    }

    fn privileges_of(&self, session_id: SessionId) -> Result<Privileges, Error> {
        Ok(self
            .sessions
            .borrow_session(session_id)
            .ok_or(Error::NotFound("session"))?
            .privileges())
    }

    fn audit(&self, admin: SessionId, target: SessionId, message: String) -> Pending {
        Box::pin(audit(
            self.database(),
            self.audit_webhook.clone(),
            admin,
            target,
            message,
        ))
    }

    /// Takes away [`Privileges::NORMAL`]. An online target is logged out, so it comes back
    /// restricted.
    pub fn restrict(
        &mut self,
        admin: SessionId,
        target: SessionId,
        reason: &str,
    ) -> Result<Pending, Error> {
        let message = format!(
            "{} restricted {} for \"{}\".",
            self.name_of(admin),
            self.name_of(target),
            reason
        );
        self.set_normal(admin, target, false, message)
    }

    pub fn unrestrict(
        &mut self,
        admin: SessionId,
        target: SessionId,
        reason: &str,
    ) -> Result<Pending, Error> {
        let message = format!(
            "{} unrestricted {} for \"{}\".",
            self.name_of(admin),
            self.name_of(target),
            reason
        );
        self.set_normal(admin, target, true, message)
    }

    /// Grants or revokes [`Privileges::NORMAL`], going straight to the database for offline
    /// targets.
    fn set_normal(
        &mut self,
        admin: SessionId,
        target: SessionId,
        normal: bool,
        message: String,
    ) -> Result<Pending, Error> {
        let unchanged = if normal {
            Error::InvalidState("not restricted")
        } else {
            Error::InvalidState("already restricted")
        };
        let audit = self.audit(admin, target, message);

        if self.sessions.contains(target) {
            let mut privileges = self.privileges_of(target)?;
            if privileges.contains(Privileges::NORMAL) == normal {
                return Err(unchanged);
            }
            privileges.set(Privileges::NORMAL, normal);
            let write = self.update_privileges(target, privileges)?;
            self.logout(target)?;
            Ok(Box::pin(async move {
                write.await?;
                audit.await
            }))
        } else {
            debug!("{} is offline", target);
            let database = self.database();
            Ok(Box::pin(async move {
                let mut privileges = database
                    .read_privileges(target)
                    .await?
                    .ok_or(Error::NotFound("account"))?;
                if privileges.contains(Privileges::NORMAL) == normal {
                    return Err(unchanged);
                }
                privileges.set(Privileges::NORMAL, normal);
                database.update_privileges(target, privileges).await?;
                audit.await
            }))
        }
    }

    /// Prevents the target from chatting for `duration` seconds, and removes it from its match.
    /// Offline targets only have the silence stored.
    pub fn silence(
        &mut self,
        admin: SessionId,
        target: SessionId,
        duration: u32,
        reason: &str,
    ) -> Result<Pending, Error> {
        let silence_end = get_unix_time_now() + duration as u64;
        let message = format!(
            "{} silenced {} for {}s for \"{}\".",
            self.name_of(admin),
            self.name_of(target),
            duration,
            reason
        );

        let in_match = self.sessions.borrow_session_mut(target).map(|mut session| {
            session.silence_end = silence_end;
            session.match_id.is_some()
        });
        if let Some(in_match) = in_match {
            self.sessions.send(target, &Event::SilenceEnded(duration));
            self.sessions.broadcast(&Event::UserSilenced(target));
            if in_match {
                self.leave_match(target)?;
            }
        }

        let database = self.database();
        let audit = self.audit(admin, target, message);
        Ok(Box::pin(async move {
            database.update_silence_end(target, silence_end).await?;
            audit.await
        }))
    }

    pub fn unsilence(&mut self, admin: SessionId, target: SessionId) -> Result<Pending, Error> {
        let now = get_unix_time_now();
        let online = if let Some(mut session) = self.sessions.borrow_session_mut(target) {
            if session.silence_end <= now {
                return Err(Error::InvalidState("not silenced"));
            }
            session.silence_end = now;
            true
        } else {
            false
        };
        if online {
            self.sessions.send(target, &Event::SilenceEnded(0));
        }

        let message = format!(
            "{} unsilenced {}.",
            self.name_of(admin),
            self.name_of(target)
        );
        let database = self.database();
        let audit = self.audit(admin, target, message);
        Ok(Box::pin(async move {
            database.update_silence_end(target, now).await?;
            audit.await
        }))
    }
}

/// Records a moderation action in the audit trail and the webhook. The webhook is best effort.
async fn audit(
    database: Arc<dyn Database>,
    audit_webhook: Option<AuditWebhook>,
    admin: SessionId,
    target: SessionId,
    message: String,
) -> Result<(), Error> {
    database.insert_log(admin, target, &message).await?;
    info!("{}", message);
    if let Some(webhook) = audit_webhook {
        if let Err(e) = webhook.post(&message).await {
            error!("audit webhook {} failed: {}", webhook.url(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::error::Error;
    use crate::multiplayer::MatchSettings;
    use crate::service::mock::{drain, mock_context, mock_session, mock_session_with};
    use core_protocol::event::Event;
    use core_protocol::id::SessionId;
    use core_protocol::name::ChannelName;
    use core_protocol::privileges::{ClientPrivileges, Privileges};
    use server_util::database::Error as DatabaseError;

    fn admin_privileges() -> Privileges {
        Privileges::NORMAL | Privileges::ADMINISTRATOR
    }

    #[tokio::test]
    async fn privileges() {
        let (mut context, database) = mock_context();
        let target = mock_session(&mut context, 10);

        context
            .add_privileges(target, Privileges::SUPPORTER)
            .unwrap()
            .await
            .unwrap();
        assert!(context
            .sessions
            .borrow_session(target)
            .unwrap()
            .client_privileges()
            .contains(ClientPrivileges::SUPPORTER));
        assert_eq!(
            database.tables().unwrap().privileges.get(&target),
            Some(&(Privileges::NORMAL | Privileges::VERIFIED | Privileges::SUPPORTER))
        );

        context
            .remove_privileges(target, Privileges::SUPPORTER)
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            context.sessions.borrow_session(target).unwrap().client_privileges(),
            ClientPrivileges::PLAYER
        );
    }

    #[tokio::test]
    async fn restrict() {
        let (mut context, database) = mock_context();
        let admin = mock_session_with(&mut context, 10, admin_privileges());
        let target = mock_session(&mut context, 11);

        context
            .restrict(admin, target, "cheating")
            .unwrap()
            .await
            .unwrap();
        assert!(!context.sessions.contains(target));
        assert!(!database.tables().unwrap().privileges[&target].contains(Privileges::NORMAL));
        assert_eq!(
            database.tables().unwrap().logs[0].message,
            "Player 10 restricted Player 11 for \"cheating\"."
        );
        // Restricted sessions vanish quietly.
        assert!(!drain(&context, admin).contains(&Event::UserLoggedOut(target)));

        let target = mock_session_with(&mut context, 11, Privileges::VERIFIED);
        assert_eq!(
            context.restrict(admin, target, "again").err(),
            Some(Error::InvalidState("already restricted"))
        );
        context
            .unrestrict(admin, target, "appeal")
            .unwrap()
            .await
            .unwrap();
        assert!(database.tables().unwrap().privileges[&target].contains(Privileges::NORMAL));
        assert_eq!(database.tables().unwrap().logs.len(), 2);
    }

    #[tokio::test]
    async fn offline_targets() {
        let (mut context, database) = mock_context();
        let admin = mock_session_with(&mut context, 10, admin_privileges());
        let offline = SessionId(20);
        database
            .tables()
            .unwrap()
            .privileges
            .insert(offline, Privileges::NORMAL | Privileges::VERIFIED);

        context
            .restrict(admin, offline, "cheating")
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            database.tables().unwrap().privileges[&offline],
            Privileges::VERIFIED
        );
        assert_eq!(
            context.restrict(admin, offline, "again").unwrap().await,
            Err(Error::InvalidState("already restricted"))
        );
        context
            .unrestrict(admin, offline, "appeal")
            .unwrap()
            .await
            .unwrap();
        assert!(database.tables().unwrap().privileges[&offline].contains(Privileges::NORMAL));
        assert_eq!(
            context.restrict(admin, SessionId(21), "nobody").unwrap().await,
            Err(Error::NotFound("account"))
        );

        context
            .silence(admin, offline, 60, "spam")
            .unwrap()
            .await
            .unwrap();
        assert!(database.tables().unwrap().silence_end.contains_key(&offline));
        context.unsilence(admin, offline).unwrap().await.unwrap();
        assert_eq!(database.tables().unwrap().logs.len(), 4);
        // Nobody online hears about offline moderation.
        assert!(drain(&context, admin).is_empty());
    }

    #[tokio::test]
    async fn silence() {
        let (mut context, database) = mock_context();
        let admin = mock_session_with(&mut context, 10, admin_privileges());
        let target = mock_session(&mut context, 11);
        let other = mock_session(&mut context, 12);
        let match_id = context
            .create_match(target, MatchSettings::default())
            .unwrap();
        drain(&context, target);

        context
            .silence(admin, target, 60, "spam")
            .unwrap()
            .await
            .unwrap();
        assert!(context.sessions.borrow_session(target).unwrap().is_silenced());
        assert!(database.tables().unwrap().silence_end.contains_key(&target));
        assert!(context.matches.get(match_id).is_none());
        let events = drain(&context, target);
        assert_eq!(events[0], Event::SilenceEnded(60));
        assert!(drain(&context, other).contains(&Event::UserSilenced(target)));

        context.unsilence(admin, target).unwrap().await.unwrap();
        assert!(!context.sessions.borrow_session(target).unwrap().is_silenced());
        assert!(drain(&context, target).contains(&Event::SilenceEnded(0)));
        assert_eq!(
            context.unsilence(admin, target).err(),
            Some(Error::InvalidState("not silenced"))
        );
    }

    #[tokio::test]
    async fn others_proceed_while_writing() {
        let (mut context, database) = mock_context();
        let admin = mock_session_with(&mut context, 10, admin_privileges());
        let target = mock_session(&mut context, 11);
        let other = mock_session(&mut context, 12);

        let pending = context.silence(admin, target, 60, "spam").unwrap();
        // The write hasn't happened, but the context is free and the silence is visible.
        assert!(database.tables().unwrap().silence_end.is_empty());
        context.join_channel(other, ChannelName::new("#osu")).unwrap();
        assert_eq!(
            context.send_direct_message(target, other, "hi"),
            Err(Error::AdmissionDenied("silenced"))
        );
        assert!(drain(&context, other).contains(&Event::UserSilenced(target)));

        pending.await.unwrap();
        assert!(database.tables().unwrap().silence_end.contains_key(&target));
    }

    #[tokio::test]
    async fn database_failure_keeps_memory() {
        let (mut context, database) = mock_context();
        let admin = mock_session_with(&mut context, 10, admin_privileges());
        let target = mock_session(&mut context, 11);

        database.set_unavailable(true);
        assert_eq!(
            context.silence(admin, target, 60, "spam").unwrap().await,
            Err(Error::External(DatabaseError::Unavailable))
        );
        // Optimistic: memory already changed, and the target was told.
        assert!(context.sessions.borrow_session(target).unwrap().is_silenced());
        assert!(drain(&context, target).contains(&Event::SilenceEnded(60)));

        assert!(context
            .update_privileges(target, Privileges::NORMAL | Privileges::SUPPORTER)
            .unwrap()
            .await
            .is_err());
        assert!(context
            .sessions
            .borrow_session(target)
            .unwrap()
            .privileges()
            .contains(Privileges::SUPPORTER));
    }
}
