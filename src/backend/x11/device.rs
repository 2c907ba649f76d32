// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! GLX device contexts: the near 1:1 forwarding layer.
//!
//! Every operation here is the same sandwich: take the display-wide lock,
//! forward to GLX, synchronize and translate whatever the server trapped.

use std::cell::Cell;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::{c_int, c_uchar, c_uint, c_ulong};
use std::ptr;
use std::slice;

use tracing::{debug, warn};
use x11_dl::glx;
use x11_dl::xlib;

use crate::context::ContextAttributes;
use crate::device::SwapInterval;
use crate::pixel_format::{PixelFormat, PixelFormatRequirements};
use crate::version::ApiVersion;

use super::display::{self, Display, HiddenWindow};
use super::error::Error;
use super::glx::{lib, GlxLib, GLX_FRAMEBUFFER_SRGB_CAPABLE_ARB, GLX_RGBA_FLOAT_BIT_ARB};
use super::util;

/// A native GLX context handle.
#[derive(Debug)]
pub(crate) struct GlContext {
    raw: glx::GLXContext,
}

impl GlContext {
    pub fn raw(&self) -> glx::GLXContext {
        self.raw
    }
}

/// Where the display/drawable pair of a device context comes from.
#[derive(Debug)]
enum Binding {
    /// Display and window supplied by the embedding application.
    Foreign { display: Display, window: c_ulong },
    /// Private connection and unmapped window from the hidden factory.
    Hidden(HiddenWindow),
}

impl Binding {
    fn display(&self) -> &Display {
        match self {
            Binding::Foreign { display, .. } => display,
            Binding::Hidden(hidden) => hidden.display(),
        }
    }

    fn drawable(&self) -> c_ulong {
        match self {
            Binding::Foreign { window, .. } => *window,
            Binding::Hidden(hidden) => hidden.drawable(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct DeviceContext {
    binding: Binding,
    version: ApiVersion,
    extensions: Vec<String>,
    /// The framebuffer configuration recorded by `set_pixel_format`, used
    /// by context creation. Hidden bindings start out with the config
    /// their window was created from.
    config: Cell<Option<glx::GLXFBConfig>>,
}

impl DeviceContext {
    pub unsafe fn from_raw_parts(display: *mut c_void, window: u64) -> Result<DeviceContext, Error> {
        let display = Display::from_raw(display as *mut xlib::Display)?;
        Self::build(Binding::Foreign {
            display,
            window: window as c_ulong,
        })
    }

    pub fn headless() -> Result<DeviceContext, Error> {
        Self::build(Binding::Hidden(HiddenWindow::new()?))
    }

    pub fn init_multithreading() -> Result<(), Error> {
        display::init_multithreading()
    }

    pub fn is_multithreading_initialized() -> bool {
        display::is_multithreading_initialized()
    }

    fn build(binding: Binding) -> Result<DeviceContext, Error> {
        let lib = lib()?;
        let display = binding.display();
        let (version, extensions) = {
            let _guard = display.lock();
            let (mut major, mut minor) = (0, 0);
            unsafe {
                (lib.glx.glXQueryVersion)(display.raw(), &mut major, &mut minor);
            }
            (
                ApiVersion::new(major as u32, minor as u32),
                query_extensions(lib, display),
            )
        };
        if version < ApiVersion::new(1, 3) {
            return Err(Error::UnsupportedGlxVersion {
                major: version.major,
                minor: version.minor,
            });
        }
        debug!("GLX version {version}, {} extensions", extensions.len());

        let config = match &binding {
            Binding::Hidden(hidden) => Some(hidden.config()),
            Binding::Foreign { .. } => None,
        };
        Ok(DeviceContext {
            binding,
            version,
            extensions,
            config: Cell::new(config),
        })
    }

    pub fn api_version(&self) -> ApiVersion {
        self.version
    }

    pub fn supports_extension(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| ext == name)
    }

    fn supports_srgb(&self) -> bool {
        self.supports_extension("GLX_ARB_framebuffer_sRGB")
            || self.supports_extension("GLX_EXT_framebuffer_sRGB")
    }

    pub fn pixel_formats(&self) -> Result<Vec<PixelFormat>, Error> {
        let lib = lib()?;
        let display = self.binding.display();
        let _guard = display.lock();

        let mut count = 0;
        let configs_ptr = unsafe {
            (lib.glx.glXGetFBConfigs)(display.raw(), display.screen(), &mut count)
        };
        if configs_ptr.is_null() || count == 0 {
            if !configs_ptr.is_null() {
                unsafe { (lib.xlib.XFree)(configs_ptr as *mut _) };
            }
            return Ok(Vec::new());
        }
        let configs: Vec<glx::GLXFBConfig> = unsafe {
            let configs = slice::from_raw_parts(configs_ptr, count as usize).to_vec();
            (lib.xlib.XFree)(configs_ptr as *mut _);
            configs
        };

        let mut formats = Vec::new();
        for config in configs {
            if let Some(format) = self.decode_config(lib, display, config)? {
                // Indexed visuals are skipped by decode_config; slow
                // software fallbacks are skipped here, matching what the
                // sibling platform bindings report.
                if format.hardware_accelerated {
                    formats.push(format);
                }
            }
        }
        Ok(formats)
    }

    pub fn choose_pixel_format(
        &self,
        reqs: &PixelFormatRequirements,
    ) -> Result<PixelFormat, Error> {
        if reqs.float_color_buffer && !self.supports_extension("GLX_ARB_fbconfig_float") {
            return Err(Error::ExtensionMissing("GLX_ARB_fbconfig_float"));
        }
        if reqs.srgb == Some(true) && !self.supports_srgb() {
            return Err(Error::ExtensionMissing("GLX_ARB_framebuffer_sRGB"));
        }
        if reqs.multisampling.is_some()
            && self.version < ApiVersion::new(1, 4)
            && !self.supports_extension("GLX_ARB_multisample")
        {
            return Err(Error::ExtensionMissing("GLX_ARB_multisample"));
        }

        let descriptor = util::config_attrib_list(reqs);

        let lib = lib()?;
        let display = self.binding.display();
        let _guard = display.lock();

        let mut count = 0;
        let configs = unsafe {
            (lib.glx.glXChooseFBConfig)(
                display.raw(),
                display.screen(),
                descriptor.as_ptr(),
                &mut count,
            )
        };
        if configs.is_null() || count == 0 {
            if !configs.is_null() {
                unsafe { (lib.xlib.XFree)(configs as *mut _) };
            }
            display.sync_and_check()?;
            return Err(Error::NoMatchingConfig);
        }
        // glXChooseFBConfig sorts by its own preference rules; the first
        // entry is the match.
        let config = unsafe { *configs };
        unsafe { (lib.xlib.XFree)(configs as *mut _) };
        display.sync_and_check()?;
        debug!("chosen fbconfig: {config:?}");

        self.decode_config(lib, display, config)?
            .ok_or(Error::NoMatchingConfig)
    }

    pub fn set_pixel_format(&self, format: &PixelFormat) -> Result<(), Error> {
        let lib = lib()?;
        let display = self.binding.display();
        let _guard = display.lock();
        let config = self.find_config_by_id(lib, display, format.native_id())?;
        debug!("pixel format set to fbconfig id {:#x}", format.native_id());
        self.config.set(Some(config));
        Ok(())
    }

    pub fn create_context(&self, share: Option<&GlContext>) -> Result<GlContext, Error> {
        let lib = lib()?;
        let display = self.binding.display();
        let _guard = display.lock();

        let config = match self.config.get() {
            Some(config) => config,
            None => self.config_from_drawable(lib, display)?,
        };
        let visual = unsafe { (lib.glx.glXGetVisualFromFBConfig)(display.raw(), config) };
        if visual.is_null() {
            return Err(Error::NoMatchingConfig);
        }
        let share_ptr = share.map(|c| c.raw).unwrap_or(ptr::null_mut());
        let raw = unsafe {
            let raw = (lib.glx.glXCreateContext)(display.raw(), visual, share_ptr, xlib::True);
            (lib.xlib.XFree)(visual as *mut _);
            raw
        };
        display.sync_and_check()?;
        if raw.is_null() {
            return Err(Error::ContextCreationFailed);
        }
        debug!("created context {raw:?}");
        Ok(GlContext { raw })
    }

    pub fn create_context_attribs(
        &self,
        share: Option<&GlContext>,
        attributes: &ContextAttributes,
    ) -> Result<GlContext, Error> {
        if attributes.profile.is_some()
            && !self.supports_extension("GLX_ARB_create_context_profile")
        {
            return Err(Error::ExtensionMissing("GLX_ARB_create_context_profile"));
        }
        let list = util::context_attrib_list(attributes);
        self.create_context_attribs_raw(share, &list)
    }

    /// Attribute-based creation from a raw, zero-terminated list.
    pub fn create_context_attribs_raw(
        &self,
        share: Option<&GlContext>,
        attribs: &[c_int],
    ) -> Result<GlContext, Error> {
        util::validate_attrib_list(attribs)?;
        if !self.supports_extension("GLX_ARB_create_context") {
            return Err(Error::ExtensionMissing("GLX_ARB_create_context"));
        }
        let lib = lib()?;
        let create = lib
            .ext
            .create_context_attribs_arb
            .ok_or(Error::ExtensionMissing("GLX_ARB_create_context"))?;
        let config = self.config.get().ok_or(Error::NoPixelFormatSet)?;

        let display = self.binding.display();
        let _guard = display.lock();
        let share_ptr = share.map(|c| c.raw).unwrap_or(ptr::null_mut());
        let raw = unsafe { create(display.raw(), config, share_ptr, xlib::True, attribs.as_ptr()) };
        display.sync_and_check()?;
        if raw.is_null() {
            return Err(Error::ContextCreationFailed);
        }
        debug!("created context {raw:?} (attribs)");
        Ok(GlContext { raw })
    }

    pub fn make_current(&self, context: Option<&GlContext>) -> Result<(), Error> {
        let lib = lib()?;
        let display = self.binding.display();
        let _guard = display.lock();

        let (drawable, raw) = match context {
            Some(context) => (self.binding.drawable(), context.raw),
            None => (0, ptr::null_mut()),
        };
        let ok = unsafe { (lib.glx.glXMakeCurrent)(display.raw(), drawable, raw) };
        display.sync_and_check()?;
        if ok == xlib::False {
            return Err(Error::MakeCurrentFailed);
        }
        Ok(())
    }

    pub fn delete_context(&self, context: &GlContext) -> Result<(), Error> {
        if context.raw.is_null() {
            return Err(Error::InvalidHandle);
        }
        let lib = lib()?;
        let display = self.binding.display();
        let _guard = display.lock();
        unsafe {
            (lib.glx.glXDestroyContext)(display.raw(), context.raw);
        }
        display.sync_and_check()
    }

    pub fn swap_buffers(&self) -> Result<(), Error> {
        let lib = lib()?;
        let display = self.binding.display();
        let _guard = display.lock();
        unsafe {
            (lib.glx.glXSwapBuffers)(display.raw(), self.binding.drawable());
        }
        // No sync here; swaps are the hot path. Anything the server
        // reports lands in the trap and comes back through
        // take_platform_error or the next checked operation.
        Ok(())
    }

    pub fn set_swap_interval(&self, interval: SwapInterval) -> Result<(), Error> {
        let lib = lib()?;
        let value: c_int = match interval {
            SwapInterval::DontWait => 0,
            SwapInterval::Wait(n) => n as c_int,
            SwapInterval::AdaptiveWait(n) => {
                if !self.supports_extension("GLX_EXT_swap_control_tear") {
                    return Err(Error::ExtensionMissing("GLX_EXT_swap_control_tear"));
                }
                // The tear extension reads a negative interval as "swap
                // late rather than wait a full frame".
                -(n as c_int)
            }
        };

        let display = self.binding.display();
        let _guard = display.lock();

        if self.supports_extension("GLX_EXT_swap_control") {
            if let Some(swap_interval_ext) = lib.ext.swap_interval_ext {
                unsafe {
                    swap_interval_ext(display.raw(), self.binding.drawable(), value);
                }
                return display.sync_and_check();
            }
        }
        if self.supports_extension("GLX_SGI_swap_control") {
            if let Some(swap_interval_sgi) = lib.ext.swap_interval_sgi {
                // The SGI path is per-thread and cannot express interval 0.
                if value <= 0 {
                    return Err(Error::UnsupportedSwapInterval);
                }
                let rc = unsafe { swap_interval_sgi(value) };
                if rc != 0 {
                    warn!("glXSwapIntervalSGI({value}) failed with {rc}");
                    return Err(Error::UnsupportedSwapInterval);
                }
                return Ok(());
            }
        }
        Err(Error::ExtensionMissing("GLX_EXT_swap_control"))
    }

    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        let lib = match lib() {
            Ok(lib) => lib,
            Err(_) => return ptr::null(),
        };
        let name = match CString::new(name) {
            Ok(name) => name,
            Err(_) => return ptr::null(),
        };
        match unsafe { (lib.glx.glXGetProcAddress)(name.as_ptr() as *const c_uchar) } {
            Some(f) => f as *const c_void,
            None => ptr::null(),
        }
    }

    pub fn take_platform_error(&self) -> Option<Error> {
        self.binding.display().take_error().map(Error::from)
    }

    /// Resolve the config a drawable was created with, for devices bound
    /// to a foreign window without an explicit pixel format step.
    fn config_from_drawable(
        &self,
        lib: &GlxLib,
        display: &Display,
    ) -> Result<glx::GLXFBConfig, Error> {
        let mut config_id: c_uint = 0;
        unsafe {
            (lib.glx.glXQueryDrawable)(
                display.raw(),
                self.binding.drawable(),
                glx::GLX_FBCONFIG_ID as c_int,
                &mut config_id,
            );
        }
        if config_id == 0 {
            debug!("drawable reports no bound fbconfig id");
            return Err(Error::NoPixelFormatSet);
        }
        self.find_config_by_id(lib, display, config_id as u32)
    }

    fn find_config_by_id(
        &self,
        lib: &GlxLib,
        display: &Display,
        id: u32,
    ) -> Result<glx::GLXFBConfig, Error> {
        let attributes = [glx::GLX_FBCONFIG_ID as c_int, id as c_int, 0];
        let mut count = 0;
        let configs = unsafe {
            (lib.glx.glXChooseFBConfig)(
                display.raw(),
                display.screen(),
                attributes.as_ptr(),
                &mut count,
            )
        };
        if configs.is_null() || count == 0 {
            if !configs.is_null() {
                unsafe { (lib.xlib.XFree)(configs as *mut _) };
            }
            return Err(Error::NoMatchingConfig);
        }
        let config = unsafe { *configs };
        unsafe { (lib.xlib.XFree)(configs as *mut _) };
        Ok(config)
    }

    /// Decode one native config into a `PixelFormat`. Returns `Ok(None)`
    /// for configs the uniform interface does not report (indexed
    /// visuals). The caller holds the display lock.
    fn decode_config(
        &self,
        lib: &GlxLib,
        display: &Display,
        config: glx::GLXFBConfig,
    ) -> Result<Option<PixelFormat>, Error> {
        let attrib = |attrib: c_int| -> Result<c_int, Error> {
            let mut value = 0;
            let rc = unsafe {
                (lib.glx.glXGetFBConfigAttrib)(display.raw(), config, attrib, &mut value)
            };
            if rc != 0 {
                return Err(Error::ConfigQueryFailed(attrib));
            }
            Ok(value)
        };

        let render_type = attrib(glx::GLX_RENDER_TYPE as c_int)? as u32;
        let rgba = (render_type & glx::GLX_RGBA_BIT as u32) != 0;
        let float = (render_type & GLX_RGBA_FLOAT_BIT_ARB as u32) != 0;
        if !rgba && !float {
            // Indexed visual.
            return Ok(None);
        }

        let caveat = attrib(glx::GLX_CONFIG_CAVEAT as c_int)?;
        let drawable_type = attrib(glx::GLX_DRAWABLE_TYPE as c_int)? as u32;

        let multisampling = if self.supports_extension("GLX_ARB_multisample")
            || self.version >= ApiVersion::new(1, 4)
        {
            if attrib(glx::GLX_SAMPLE_BUFFERS as c_int)? != 0 {
                Some(attrib(glx::GLX_SAMPLES as c_int)? as u16)
            } else {
                None
            }
        } else {
            None
        };

        let srgb = if self.supports_srgb() {
            attrib(GLX_FRAMEBUFFER_SRGB_CAPABLE_ARB)? != 0
        } else {
            false
        };

        Ok(Some(PixelFormat {
            native_id: attrib(glx::GLX_FBCONFIG_ID as c_int)? as u32,
            hardware_accelerated: caveat != glx::GLX_SLOW_CONFIG as c_int,
            color_bits: attrib(glx::GLX_RED_SIZE as c_int)? as u8
                + attrib(glx::GLX_GREEN_SIZE as c_int)? as u8
                + attrib(glx::GLX_BLUE_SIZE as c_int)? as u8,
            alpha_bits: attrib(glx::GLX_ALPHA_SIZE as c_int)? as u8,
            depth_bits: attrib(glx::GLX_DEPTH_SIZE as c_int)? as u8,
            stencil_bits: attrib(glx::GLX_STENCIL_SIZE as c_int)? as u8,
            stereoscopy: attrib(glx::GLX_STEREO as c_int)? != 0,
            double_buffer: attrib(glx::GLX_DOUBLEBUFFER as c_int)? != 0,
            multisampling,
            srgb,
            float_color_buffer: float,
            render_to_window: (drawable_type & glx::GLX_WINDOW_BIT as u32) != 0,
            render_to_pbuffer: (drawable_type & glx::GLX_PBUFFER_BIT as u32) != 0,
        }))
    }
}

fn query_extensions(lib: &GlxLib, display: &Display) -> Vec<String> {
    let raw = unsafe { (lib.glx.glXQueryExtensionsString)(display.raw(), display.screen()) };
    if raw.is_null() {
        warn!("glXQueryExtensionsString returned no extensions");
        return Vec::new();
    }
    let joined = unsafe { CStr::from_ptr(raw) }.to_string_lossy();
    util::parse_extensions(&joined)
}
