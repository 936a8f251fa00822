// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Stable account id of a session, assigned by the account store.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u32);

impl SessionId {
    /// The server's own chat bot.
    pub const BOT: Self = Self(1);

    pub fn is_bot(self) -> bool {
        self == Self::BOT
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Id of a multiplayer match. Ids are recycled once a match is disposed.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct MatchId(pub u16);

impl Display for MatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Id of an achievement, as stored in the achievement table.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AchievementId(pub u32);

#[cfg(test)]
mod tests {
    use crate::id::SessionId;

    #[test]
    fn bot() {
        assert!(SessionId::BOT.is_bot());
        assert!(!SessionId(3).is_bot());
    }
}
