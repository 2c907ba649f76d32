// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Platform abstraction for OpenGL device contexts.
//!
//! A [`DeviceContext`] pairs a native display connection with a window and
//! exposes the operations a renderer needs from the platform: enumerating
//! and selecting a framebuffer configuration, creating and destroying GL
//! contexts, making a context current on the calling thread, and swapping
//! buffers. All of the hard work happens inside the native graphics and
//! windowing libraries; this crate is the uniform, handle-based doorway to
//! them.
//!
//! Only the X11/GLX binding is implemented in this repository. The facade
//! types are platform neutral so that the equivalent Windows (WGL) and
//! macOS (CGL) bindings can sit behind the same interface.

#![allow(clippy::new_without_default)]
#![deny(rustdoc::broken_intra_doc_links)]

mod backend;

pub mod context;
pub mod device;
pub mod error;
pub mod pixel_format;
pub mod version;

pub use context::{ContextAttributes, GlContext, GlProfile};
pub use device::{DeviceContext, SwapInterval};
pub use error::Error;
pub use pixel_format::{PixelFormat, PixelFormatRequirements};
pub use version::ApiVersion;
