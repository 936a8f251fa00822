// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod admin;
pub mod channel;
pub mod context;
pub mod error;
pub mod multiplayer;
pub mod ordered_set;
pub mod relationship;
pub mod service;
pub mod session;
pub mod spectate;
pub mod stats;
#[macro_use]
pub mod util;
pub mod log;
pub mod options;
