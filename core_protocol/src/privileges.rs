// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Server side capabilities of an account.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Privileges: u32 {
        /// Unrestricted; absent while an account is restricted.
        const NORMAL = 1 << 0;
        /// Has logged in at least once.
        const VERIFIED = 1 << 1;
        /// Bypasses automatic anticheat.
        const WHITELISTED = 1 << 2;
        const SUPPORTER = 1 << 4;
        const PREMIUM = 1 << 5;
        const ALUMNI = 1 << 7;
        const TOURNAMENT = 1 << 10;
        const NOMINATOR = 1 << 11;
        const MODERATOR = 1 << 12;
        const ADMINISTRATOR = 1 << 13;
        /// May perform irreversible administrative actions.
        const DANGEROUS = 1 << 14;

        const DONATOR = Self::SUPPORTER.bits() | Self::PREMIUM.bits();
        const STAFF = Self::MODERATOR.bits() | Self::ADMINISTRATOR.bits() | Self::DANGEROUS.bits();
    }
}

bitflags! {
    /// The coarser capabilities the game client understands.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ClientPrivileges: u32 {
        const PLAYER = 1 << 0;
        const MODERATOR = 1 << 1;
        const SUPPORTER = 1 << 2;
        const OWNER = 1 << 3;
        const DEVELOPER = 1 << 4;
        const TOURNAMENT = 1 << 5;
    }
}

impl Privileges {
    /// Maps server privileges to what the client is told. Cheap, so never cached.
    pub fn to_client(self) -> ClientPrivileges {
        let mut ret = ClientPrivileges::empty();
        if self.contains(Self::NORMAL) {
            ret |= ClientPrivileges::PLAYER;
        }
        if self.intersects(Self::DONATOR) {
            ret |= ClientPrivileges::SUPPORTER;
        }
        if self.contains(Self::MODERATOR) {
            ret |= ClientPrivileges::MODERATOR;
        }
        if self.contains(Self::ADMINISTRATOR) {
            ret |= ClientPrivileges::DEVELOPER;
        }
        if self.contains(Self::DANGEROUS) {
            ret |= ClientPrivileges::OWNER;
        }
        ret
    }

    pub fn is_staff(self) -> bool {
        self.intersects(Self::STAFF)
    }
}
