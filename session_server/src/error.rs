// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use server_util::database;
use std::fmt::{self, Display, Formatter};

/// Failure of a session operation.
///
/// [`Error::AdmissionDenied`] and [`Error::InvalidState`] are expected outcomes of client
/// requests; they leave state untouched and never concern the transport.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// Bad password, full match, insufficient privileges, etc.
    AdmissionDenied(&'static str),
    /// E.g. leaving something one is not in, or joining twice.
    InvalidState(&'static str),
    /// No such session, channel, or match.
    NotFound(&'static str),
    /// A collaborator failed. In-memory changes made before the failure remain applied.
    External(database::Error),
}

impl Error {
    /// Whether the error is a routine rejection of a request.
    pub fn is_advisory(&self) -> bool {
        matches!(self, Self::AdmissionDenied(_) | Self::InvalidState(_))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdmissionDenied(reason) => write!(f, "admission denied: {}", reason),
            Self::InvalidState(reason) => write!(f, "invalid state: {}", reason),
            Self::NotFound(what) => write!(f, "not found: {}", what),
            Self::External(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::External(e) => Some(e),
            _ => None,
        }
    }
}

impl From<database::Error> for Error {
    fn from(e: database::Error) -> Self {
        Self::External(e)
    }
}
