// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod database;
pub mod database_schema;
pub mod memory_database;
pub mod webhook;
