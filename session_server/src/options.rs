// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::channel::ChannelData;
use core_protocol::name::ChannelName;
use core_protocol::privileges::Privileges;
use log::{info, LevelFilter};
use serde::Deserialize;
use structopt::StructOpt;

/// Server options, to be specified as arguments.
#[derive(Debug, StructOpt)]
pub struct Options {
    /// Log core diagnostics
    #[cfg_attr(debug_assertions, structopt(long, default_value = "info"))]
    #[cfg_attr(not(debug_assertions), structopt(long, default_value = "error"))]
    pub debug_core: LevelFilter,
    /// Log session, channel, and match diagnostics
    #[cfg_attr(debug_assertions, structopt(long, default_value = "info"))]
    #[cfg_attr(not(debug_assertions), structopt(long, default_value = "warn"))]
    pub debug_sessions: LevelFilter,
    /// Log database diagnostics
    #[cfg_attr(debug_assertions, structopt(long, default_value = "warn"))]
    #[cfg_attr(not(debug_assertions), structopt(long, default_value = "error"))]
    pub debug_database: LevelFilter,
    /// Startup channels, as TOML. Defaults to a built-in set.
    #[structopt(long)]
    pub channels_file: Option<String>,
    /// Post moderation actions to this webhook.
    #[structopt(long)]
    pub audit_webhook: Option<String>,
    /// Don't write to the database.
    #[structopt(long)]
    pub database_read_only: bool,
}

/// On-disk form of a startup channel.
#[derive(Debug, Deserialize)]
struct ChannelConfig {
    name: String,
    #[serde(default)]
    topic: String,
    #[serde(default = "normal")]
    read_privileges: Privileges,
    #[serde(default = "normal")]
    write_privileges: Privileges,
    #[serde(default)]
    auto_join: bool,
}

#[derive(Debug, Deserialize)]
struct ChannelsConfig {
    channels: Vec<ChannelConfig>,
}

fn normal() -> Privileges {
    Privileges::NORMAL
}

impl From<ChannelConfig> for ChannelData {
    fn from(config: ChannelConfig) -> Self {
        Self {
            read_privileges: config.read_privileges,
            write_privileges: config.write_privileges,
            auto_join: config.auto_join,
            ..Self::new(ChannelName::new(&config.name), config.topic)
        }
    }
}

impl Options {
    /// Reads the startup channels from [`Self::channels_file`], or uses the defaults.
    pub fn channels(&self) -> Result<Vec<ChannelData>, String> {
        if let Some(path) = &self.channels_file {
            let toml = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
            let channels = parse_channels(&toml)?;
            info!("loaded {} channels from {}", channels.len(), path);
            Ok(channels)
        } else {
            Ok(default_channels())
        }
    }
}

pub fn parse_channels(toml: &str) -> Result<Vec<ChannelData>, String> {
    let config: ChannelsConfig = toml::from_str(toml).map_err(|e| e.to_string())?;
    Ok(config.channels.into_iter().map(ChannelData::from).collect())
}

/// Channels every server has unless configured otherwise.
pub fn default_channels() -> Vec<ChannelData> {
    let staff = Privileges::MODERATOR;
    vec![
        ChannelData {
            auto_join: true,
            ..ChannelData::new(ChannelName::new("#osu"), "General discussion.")
        },
        ChannelData {
            auto_join: true,
            ..ChannelData::new(
                ChannelName::new("#announce"),
                "Exemplary performance and public announcements.",
            )
        },
        ChannelData::new(
            ChannelName::new("#lobby"),
            "Multiplayer lobby discussion room.",
        ),
        ChannelData {
            read_privileges: staff,
            write_privileges: staff,
            auto_join: true,
            ..ChannelData::new(ChannelName::new("#staff"), "Staff discussion.")
        },
    ]
}
