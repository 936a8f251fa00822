// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

/// Yields an option's contents if [`Some`], otherwise returns from the function.
#[macro_export]
macro_rules! unwrap_or_return {
    ($opt: expr) => {{
        match $opt {
            Some(some) => some,
            None => return,
        }
    }};
}
