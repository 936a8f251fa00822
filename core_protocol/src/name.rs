// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::id::{MatchId, SessionId};
use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// A session's display name, e.g. "Cookiezi Fan".
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Username(ArrayString<32>);

/// Normalized form of a [`Username`], used as a secondary lookup key.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SafeName(ArrayString<32>);

/// Registry key of a channel, e.g. "#osu" or "#spec_1000".
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChannelName(ArrayString<32>);

impl Username {
    pub fn new(str: &str) -> Self {
        Self(slice_up_to_array_string(str))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercase, with spaces replaced by underscores.
    pub fn to_safe(&self) -> SafeName {
        SafeName::new(self.as_str())
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl SafeName {
    pub fn new(str: &str) -> Self {
        let safe = str.trim().to_lowercase().replace(' ', "_");
        Self(slice_up_to_array_string(&safe))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SafeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ChannelName {
    const SPECTATOR_PREFIX: &'static str = "#spec_";
    const MULTIPLAYER_PREFIX: &'static str = "#multi_";

    pub fn new(str: &str) -> Self {
        Self(slice_up_to_array_string(str))
    }

    /// The instanced channel of everyone watching `host`.
    pub fn spectator(host: SessionId) -> Self {
        Self::new(&format!("{}{}", Self::SPECTATOR_PREFIX, host))
    }

    /// The instanced chat channel of a match.
    pub fn multiplayer(match_id: MatchId) -> Self {
        Self::new(&format!("{}{}", Self::MULTIPLAYER_PREFIX, match_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name clients see; instanced channels all share a generic name.
    pub fn display_name(&self) -> &str {
        if self.0.starts_with(Self::SPECTATOR_PREFIX) {
            "#spectator"
        } else if self.0.starts_with(Self::MULTIPLAYER_PREFIX) {
            "#multiplayer"
        } else {
            self.as_str()
        }
    }
}

impl Display for ChannelName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Trims whitespace and cuts `s` to at most `bytes` bytes, on a character boundary.
pub fn slice_up_to(s: &str, bytes: usize) -> &str {
    let s = s.trim();
    let mut idx = bytes.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    &s[..idx]
}

pub fn slice_up_to_array_string<const CAPACITY: usize>(s: &str) -> ArrayString<CAPACITY> {
    let mut ret = ArrayString::new();
    ret.push_str(slice_up_to(s, CAPACITY));
    ret
}

#[cfg(test)]
mod test {
    use crate::id::{MatchId, SessionId};
    use crate::name::{ChannelName, SafeName, Username};

    #[test]
    fn safe_name() {
        assert_eq!(SafeName::new("Some Player").as_str(), "some_player");
        assert_eq!(Username::new(" Mixed Case ").to_safe().as_str(), "mixed_case");
        assert_eq!(SafeName::new("already_safe").as_str(), "already_safe");
    }

    #[test]
    fn truncation() {
        let long = "x".repeat(100);
        assert_eq!(Username::new(&long).as_str().len(), 32);
        // Multi-byte characters are never split.
        let wide = "❮✰❯".repeat(20);
        assert!(Username::new(&wide).as_str().len() <= 32);
    }

    #[test]
    fn display_name() {
        assert_eq!(ChannelName::new("#osu").display_name(), "#osu");
        assert_eq!(
            ChannelName::spectator(SessionId(1000)).as_str(),
            "#spec_1000"
        );
        assert_eq!(
            ChannelName::spectator(SessionId(1000)).display_name(),
            "#spectator"
        );
        assert_eq!(
            ChannelName::multiplayer(MatchId(3)).display_name(),
            "#multiplayer"
        );
    }
}
