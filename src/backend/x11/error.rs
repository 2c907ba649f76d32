// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Errors at the X11/GLX backend level.

use std::fmt;
use std::os::raw::c_int;
use std::sync::Arc;

/// A decoded error report from the X server.
#[derive(Debug, Clone)]
pub struct XError {
    pub serial: u64,
    pub error_code: u8,
    pub request_code: u8,
    pub minor_code: u8,
    /// The server's human-readable description, from `XGetErrorText`.
    pub description: String,
}

impl fmt::Display for XError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "{} (code {}, request {}.{}, serial {})",
            self.description, self.error_code, self.request_code, self.minor_code, self.serial
        )
    }
}

#[derive(Debug, Clone)]
pub enum Error {
    /// libX11 or libGL could not be loaded.
    LibraryLoad(Arc<x11_dl::error::OpenError>),
    /// Could not connect to the X server.
    ConnectionFailed,
    /// The server's GLX is older than 1.3.
    UnsupportedGlxVersion { major: u32, minor: u32 },
    /// `XInitThreads` reported that threading is unavailable.
    MultithreadingUnavailable,
    /// No framebuffer configuration matched the request.
    NoMatchingConfig,
    /// Reading an attribute back from a framebuffer configuration failed.
    ConfigQueryFailed(c_int),
    /// The operation needs a pixel format and none has been set.
    NoPixelFormatSet,
    /// A required GLX extension is not available on this display.
    ExtensionMissing(&'static str),
    /// An attribute list was empty or not zero-terminated.
    InvalidAttribList,
    /// The native window for a headless device could not be created.
    WindowCreationFailed,
    /// Context creation failed without the server raising an error.
    ContextCreationFailed,
    /// `glXMakeCurrent` reported failure.
    MakeCurrentFailed,
    /// A null context handle was passed where a live one is required.
    InvalidHandle,
    /// The swap control path in use cannot express the requested interval.
    UnsupportedSwapInterval,
    /// A trapped X server error.
    X(Arc<XError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Error::LibraryLoad(e) => write!(f, "failed to load native library: {e}"),
            Error::ConnectionFailed => write!(f, "unable to connect to the X server"),
            Error::UnsupportedGlxVersion { major, minor } => {
                write!(f, "GLX {major}.{minor} is too old; 1.3 or newer is required")
            }
            Error::MultithreadingUnavailable => {
                write!(f, "the X library does not support multithreading")
            }
            Error::NoMatchingConfig => {
                write!(f, "no framebuffer configuration matches the request")
            }
            Error::ConfigQueryFailed(attrib) => {
                write!(
                    f,
                    "unable to read attribute {attrib:#x} from the framebuffer configuration"
                )
            }
            Error::NoPixelFormatSet => {
                write!(f, "no pixel format has been set on this device context")
            }
            Error::ExtensionMissing(name) => write!(f, "GLX extension {name} is not available"),
            Error::InvalidAttribList => {
                write!(f, "attribute lists must be non-empty and zero-terminated")
            }
            Error::WindowCreationFailed => write!(f, "unable to create the native window"),
            Error::ContextCreationFailed => {
                write!(f, "context creation failed without generating an error")
            }
            Error::MakeCurrentFailed => write!(f, "unable to make the context current"),
            Error::InvalidHandle => write!(f, "the context handle is null"),
            Error::UnsupportedSwapInterval => {
                write!(f, "the available swap control cannot express this interval")
            }
            Error::X(e) => write!(f, "X error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<XError> for Error {
    fn from(src: XError) -> Error {
        Error::X(Arc::new(src))
    }
}
