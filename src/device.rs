// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! The device context: a display/window pair that can mint GL contexts.

use std::ffi::c_void;

use crate::backend::device as backend;
use crate::context::{ContextAttributes, GlContext};
use crate::error::Error;
use crate::pixel_format::{PixelFormat, PixelFormatRequirements};
use crate::version::ApiVersion;

#[cfg(feature = "raw-win-handle")]
use raw_window_handle::{
    HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle,
};

/// How often the buffer swap may wait for the vertical blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapInterval {
    /// Swap immediately; never wait for the vertical blank.
    DontWait,
    /// Wait for at least `n` vertical blanks between swaps.
    Wait(u32),
    /// Wait for `n` vertical blanks, but swap immediately when the deadline
    /// was already missed. Requires `GLX_EXT_swap_control_tear` on X11.
    AdaptiveWait(u32),
}

/// A device context: a native display connection paired with a window,
/// able to create and activate rendering contexts against it.
///
/// All operations forward almost 1:1 to the native context API while
/// holding a display-wide lock; failures reported asynchronously by the
/// display server are translated into [`Error`] values, either by the
/// operation that caused them or through [`take_platform_error`].
///
/// A `DeviceContext` is neither `Send` nor `Sync`: it wraps a raw display
/// connection. GL contexts created from it can be made current on any
/// thread (one thread at a time) once [`init_multithreading`] has run.
///
/// [`take_platform_error`]: DeviceContext::take_platform_error
/// [`init_multithreading`]: DeviceContext::init_multithreading
#[derive(Debug)]
pub struct DeviceContext(backend::DeviceContext);

impl DeviceContext {
    /// Bind to an existing display connection and window.
    ///
    /// `display` is the native display handle (an Xlib `Display*` on X11)
    /// and `window` the native window created against it. Fails when the
    /// display is null, the window is zero, or the server's context API is
    /// too old (GLX older than 1.3).
    ///
    /// # Safety
    ///
    /// `display` must be a live connection belonging to the calling
    /// process, and it must outlive the returned device context.
    pub unsafe fn from_raw_parts(display: *mut c_void, window: u64) -> Result<DeviceContext, Error> {
        if display.is_null() {
            return Err(Error::InvalidDisplayHandle);
        }
        if window == 0 {
            return Err(Error::InvalidWindowHandle);
        }
        Ok(DeviceContext(backend::DeviceContext::from_raw_parts(
            display, window,
        )?))
    }

    /// Create a device context against a private, never-mapped window.
    ///
    /// This opens its own display connection and creates a small hidden
    /// window with a baseline RGBA configuration. It is the way to get a
    /// current GL context without owning any window, for instance to load
    /// function pointers or query renderer capabilities.
    pub fn headless() -> Result<DeviceContext, Error> {
        Ok(DeviceContext(backend::DeviceContext::headless()?))
    }

    /// Initialize the native display's thread support.
    ///
    /// Must be called before the first display connection is opened if
    /// contexts will be made current from more than one thread. Forwards
    /// to `XInitThreads` on X11.
    pub fn init_multithreading() -> Result<(), Error> {
        backend::DeviceContext::init_multithreading().map_err(Into::into)
    }

    /// Whether [`init_multithreading`](DeviceContext::init_multithreading)
    /// has run successfully in this process.
    pub fn is_multithreading_initialized() -> bool {
        backend::DeviceContext::is_multithreading_initialized()
    }

    /// The version of the native context API, as reported by the display.
    pub fn api_version(&self) -> ApiVersion {
        self.0.api_version()
    }

    /// Whether the display advertises the named platform extension.
    pub fn supports_extension(&self, name: &str) -> bool {
        self.0.supports_extension(name)
    }

    /// Enumerate the framebuffer configurations usable on this device.
    ///
    /// Indexed (non-RGBA) configurations and configurations the driver
    /// marks as slow are not reported.
    pub fn pixel_formats(&self) -> Result<Vec<PixelFormat>, Error> {
        self.0.pixel_formats().map_err(Into::into)
    }

    /// Ask the native API for the configuration best matching `reqs`.
    pub fn choose_pixel_format(
        &self,
        reqs: &PixelFormatRequirements,
    ) -> Result<PixelFormat, Error> {
        self.0.choose_pixel_format(reqs).map_err(Into::into)
    }

    /// Record `format` as the configuration used by subsequent context
    /// creation on this device.
    pub fn set_pixel_format(&mut self, format: &PixelFormat) -> Result<(), Error> {
        self.0.set_pixel_format(format).map_err(Into::into)
    }

    /// Create a GL context, optionally sharing object namespaces with
    /// `share`.
    ///
    /// Uses the legacy, visual-based creation path. The visual comes from
    /// the pixel format set on this device or, failing that, from the
    /// configuration the window itself was created with.
    pub fn create_context(&self, share: Option<&GlContext>) -> Result<GlContext, Error> {
        self.0
            .create_context(share.map(|c| &c.0))
            .map(GlContext)
            .map_err(Into::into)
    }

    /// Create a GL context with explicit attributes (version, profile,
    /// debug and forward-compatibility flags).
    ///
    /// Requires [`set_pixel_format`](DeviceContext::set_pixel_format) to
    /// have run, and the platform's `create_context` extension.
    pub fn create_context_attribs(
        &self,
        share: Option<&GlContext>,
        attributes: &ContextAttributes,
    ) -> Result<GlContext, Error> {
        self.0
            .create_context_attribs(share.map(|c| &c.0), attributes)
            .map(GlContext)
            .map_err(Into::into)
    }

    /// Make `context` current on the calling thread, bound to this
    /// device's window; `None` releases the thread's current context.
    pub fn make_current(&self, context: Option<&GlContext>) -> Result<(), Error> {
        self.0.make_current(context.map(|c| &c.0)).map_err(Into::into)
    }

    /// Destroy a context created on this device.
    ///
    /// The context must not be current on any thread.
    pub fn delete_context(&self, context: GlContext) -> Result<(), Error> {
        self.0.delete_context(&context.0).map_err(Into::into)
    }

    /// Swap the front and back buffers of this device's window.
    pub fn swap_buffers(&self) -> Result<(), Error> {
        self.0.swap_buffers().map_err(Into::into)
    }

    /// Control how buffer swaps synchronize to the vertical blank.
    pub fn set_swap_interval(&self, interval: SwapInterval) -> Result<(), Error> {
        self.0.set_swap_interval(interval).map_err(Into::into)
    }

    /// Look up a GL or platform entry point by name.
    ///
    /// Returns a null pointer when the entry point does not exist.
    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        self.0.get_proc_address(name)
    }

    /// Drain the error the display server reported since the last checked
    /// operation, if any.
    ///
    /// Most operations translate server errors into their own return
    /// value; this catches the rest (notably errors raised by buffer
    /// swaps, which are not synchronized for latency reasons).
    pub fn take_platform_error(&self) -> Option<Error> {
        self.0.take_platform_error().map(Into::into)
    }
}

#[cfg(feature = "raw-win-handle")]
impl DeviceContext {
    /// Bind to a window exposed through `raw-window-handle`.
    pub fn from_window<W>(window: &W) -> Result<DeviceContext, Error>
    where
        W: HasRawWindowHandle + HasRawDisplayHandle,
    {
        match (window.raw_display_handle(), window.raw_window_handle()) {
            (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(window)) => unsafe {
                Self::from_raw_parts(display.display, window.window as u64)
            },
            _ => Err(Error::UnsupportedWindowSystem),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use static_assertions as sa;

    sa::assert_not_impl_any!(DeviceContext: Send, Sync);
    sa::assert_impl_all!(SwapInterval: Send, Sync);
}
