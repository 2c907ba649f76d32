// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! GL context handles and creation attributes.

use std::ffi::c_void;

use crate::backend::device as backend;

/// An opaque handle to a native GL context.
///
/// The handle does not own the context: it is created and destroyed
/// explicitly through [`DeviceContext::create_context`] and
/// [`DeviceContext::delete_context`], matching the other platform bindings
/// behind this interface. Dropping a `GlContext` leaks nothing and frees
/// nothing.
///
/// [`DeviceContext::create_context`]: crate::DeviceContext::create_context
/// [`DeviceContext::delete_context`]: crate::DeviceContext::delete_context
#[derive(Debug)]
pub struct GlContext(pub(crate) backend::GlContext);

impl GlContext {
    /// The raw native context handle (a `GLXContext` on X11).
    pub fn raw_handle(&self) -> *mut c_void {
        self.0.raw() as *mut c_void
    }
}

/// Describes the requested GL context profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlProfile {
    /// Include all the immediate mode functions and definitions.
    Compatibility,
    /// Include all the future-compatible functions and definitions.
    Core,
}

/// Attributes for attribute-based context creation.
///
/// These map onto the `*_create_context` family of platform extensions
/// (`GLX_ARB_create_context` on X11); creating a context from them fails
/// when the extension is absent.
#[derive(Debug, Clone)]
pub struct ContextAttributes {
    /// The GL version to request, or `None` to let the driver pick.
    pub version: Option<(u8, u8)>,
    /// The context profile to request. Only meaningful for GL 3.2 and up.
    pub profile: Option<GlProfile>,
    /// Whether to request a debug context.
    ///
    /// The default is `true` in debug mode and `false` in release mode.
    pub debug: bool,
    /// Whether to request a forward-compatible context.
    pub forward_compatible: bool,
}

impl Default for ContextAttributes {
    fn default() -> ContextAttributes {
        ContextAttributes {
            version: None,
            profile: None,
            debug: cfg!(debug_assertions),
            forward_compatible: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use static_assertions as sa;

    sa::assert_not_impl_any!(GlContext: Send, Sync);
}
