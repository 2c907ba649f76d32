// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors at the device context shell level.

use std::fmt;
use std::sync::Arc;

use crate::backend::error as backend;

/// Shell errors.
#[derive(Debug, Clone)]
pub enum Error {
    /// A null display handle was passed where a live connection is required.
    InvalidDisplayHandle,
    /// A zero window handle was passed where a live window is required.
    InvalidWindowHandle,
    /// The handle does not belong to a window system this crate binds to.
    UnsupportedWindowSystem,
    /// Platform specific error.
    Platform(backend::Error),
    /// Other miscellaneous error.
    Other(Arc<anyhow::Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Error::InvalidDisplayHandle => {
                write!(f, "The display handle is null.")
            }
            Error::InvalidWindowHandle => {
                write!(f, "The window handle is zero.")
            }
            Error::UnsupportedWindowSystem => {
                write!(f, "The window does not belong to a supported window system.")
            }
            Error::Platform(err) => fmt::Display::fmt(err, f),
            Error::Other(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(src: anyhow::Error) -> Error {
        Error::Other(Arc::new(src))
    }
}

impl From<backend::Error> for Error {
    fn from(src: backend::Error) -> Error {
        Error::Platform(src)
    }
}
