// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::options::Options;

/// Call once, before creating a [`crate::context::Context`].
pub fn init_logger(options: &Options) {
    let mut logger = env_logger::builder();
    logger.format_timestamp(None);
    logger.filter_module("core_protocol", options.debug_core);
    logger.filter_module("session_server", options.debug_sessions);
    logger.filter_module("server_util", options.debug_database);
    logger.filter_module("server_util::webhook", options.debug_sessions);
    logger.init();
}
