// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Access to the dynamically loaded Xlib and GLX libraries.
//!
//! GLX entry points past the core 1.4 set are not exported by `libGL`
//! directly; they have to be resolved through `glXGetProcAddress`. We load
//! both libraries and resolve the extension entry points once, process
//! wide, the first time anything touches GLX.

use std::ffi::CString;
use std::mem;
use std::os::raw::{c_int, c_uchar};
use std::sync::Arc;

use once_cell::sync::Lazy;
use x11_dl::glx::{self, Glx};
use x11_dl::xlib::{self, Xlib};

use super::error::Error;

// GLX_ARB_create_context
pub(crate) const GLX_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
pub(crate) const GLX_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
pub(crate) const GLX_CONTEXT_FLAGS_ARB: c_int = 0x2094;
pub(crate) const GLX_CONTEXT_DEBUG_BIT_ARB: c_int = 0x0001;
pub(crate) const GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: c_int = 0x0002;

// GLX_ARB_create_context_profile
pub(crate) const GLX_CONTEXT_PROFILE_MASK_ARB: c_int = 0x9126;
pub(crate) const GLX_CONTEXT_CORE_PROFILE_BIT_ARB: c_int = 0x0001;
pub(crate) const GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: c_int = 0x0002;

// GLX_ARB_framebuffer_sRGB (the EXT variant shares the value)
pub(crate) const GLX_FRAMEBUFFER_SRGB_CAPABLE_ARB: c_int = 0x20B2;

// GLX_ARB_fbconfig_float
pub(crate) const GLX_RGBA_FLOAT_BIT_ARB: c_int = 0x0004;

// GLX 1.3: matches any value in a choose-config attribute list.
pub(crate) const GLX_DONT_CARE: c_int = -1;

pub(crate) type CreateContextAttribsArbFn = unsafe extern "C" fn(
    dpy: *mut xlib::Display,
    config: glx::GLXFBConfig,
    share_context: glx::GLXContext,
    direct: xlib::Bool,
    attrib_list: *const c_int,
) -> glx::GLXContext;

pub(crate) type SwapIntervalExtFn =
    unsafe extern "C" fn(dpy: *mut xlib::Display, drawable: glx::GLXDrawable, interval: c_int);

pub(crate) type SwapIntervalSgiFn = unsafe extern "C" fn(interval: c_int) -> c_int;

/// Extension entry points resolved through `glXGetProcAddress`.
///
/// A resolved pointer only means the client library knows the name; whether
/// the extension actually works on a display is decided by the extension
/// string, which the device context checks before calling any of these.
pub(crate) struct GlxExt {
    pub create_context_attribs_arb: Option<CreateContextAttribsArbFn>,
    pub swap_interval_ext: Option<SwapIntervalExtFn>,
    pub swap_interval_sgi: Option<SwapIntervalSgiFn>,
}

impl GlxExt {
    fn load(glx: &Glx) -> GlxExt {
        unsafe {
            GlxExt {
                create_context_attribs_arb: proc_address(glx, "glXCreateContextAttribsARB")
                    .map(|f| mem::transmute::<unsafe extern "C" fn(), CreateContextAttribsArbFn>(f)),
                swap_interval_ext: proc_address(glx, "glXSwapIntervalEXT")
                    .map(|f| mem::transmute::<unsafe extern "C" fn(), SwapIntervalExtFn>(f)),
                swap_interval_sgi: proc_address(glx, "glXSwapIntervalSGI")
                    .map(|f| mem::transmute::<unsafe extern "C" fn(), SwapIntervalSgiFn>(f)),
            }
        }
    }
}

/// The loaded libraries plus the resolved extension entry points.
pub(crate) struct GlxLib {
    pub xlib: Xlib,
    pub glx: Glx,
    pub ext: GlxExt,
}

static LIB: Lazy<Result<GlxLib, Error>> = Lazy::new(|| {
    let xlib = Xlib::open().map_err(|e| Error::LibraryLoad(Arc::new(e)))?;
    let glx = Glx::open().map_err(|e| Error::LibraryLoad(Arc::new(e)))?;
    let ext = GlxExt::load(&glx);
    Ok(GlxLib { xlib, glx, ext })
});

pub(crate) fn lib() -> Result<&'static GlxLib, Error> {
    LIB.as_ref().map_err(Clone::clone)
}

unsafe fn proc_address(glx: &Glx, name: &str) -> Option<unsafe extern "C" fn()> {
    // `name` never contains an interior NUL; these are fixed entry points.
    let name = CString::new(name).ok()?;
    (glx.glXGetProcAddress)(name.as_ptr() as *const c_uchar)
}
