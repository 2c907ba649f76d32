// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Display connections, the display-wide lock, and the X error trap.

use std::collections::HashMap;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_uint, c_ulong};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

use once_cell::sync::Lazy;
use tracing::{debug, warn};
use x11_dl::glx;
use x11_dl::xlib;

use super::error::{Error, XError};
use super::glx::{lib, GlxLib};

/// Pending X errors, keyed by display connection.
///
/// Xlib delivers protocol errors through a process-global handler, so the
/// table is global too. Each display gets one slot; a newer error for the
/// same display overwrites the older one, which matches the "error of the
/// last operation" semantics callers see.
static DISPLAY_ERRORS: Lazy<Mutex<HashMap<usize, XError>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

static ERROR_HANDLER: Once = Once::new();

static MULTITHREADING_INITIALIZED: AtomicBool = AtomicBool::new(false);

unsafe extern "C" fn x_error_handler(
    display: *mut xlib::Display,
    event: *mut xlib::XErrorEvent,
) -> c_int {
    if event.is_null() {
        return 0;
    }
    let (serial, error_code, request_code, minor_code) = (
        (*event).serial,
        (*event).error_code,
        (*event).request_code,
        (*event).minor_code,
    );
    let err = XError {
        serial: serial as u64,
        error_code,
        request_code,
        minor_code,
        description: error_text(display, error_code),
    };
    let display_ptr = display;
    warn!("X error on display {display_ptr:?}: {err}");
    if let Ok(mut errors) = DISPLAY_ERRORS.lock() {
        errors.insert(display as usize, err);
    }
    0
}

// XGetErrorText is one of the few Xlib calls that is legal inside the
// error handler.
fn error_text(display: *mut xlib::Display, code: u8) -> String {
    let lib = match lib() {
        Ok(lib) => lib,
        Err(_) => return format!("X error code {code}"),
    };
    let mut buf = [0 as c_char; 256];
    unsafe {
        (lib.xlib.XGetErrorText)(display, code as c_int, buf.as_mut_ptr(), buf.len() as c_int);
        CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
    }
}

fn install_error_handler(lib: &GlxLib) {
    ERROR_HANDLER.call_once(|| unsafe {
        (lib.xlib.XSetErrorHandler)(Some(x_error_handler));
    });
}

pub(crate) fn init_multithreading() -> Result<(), Error> {
    let lib = lib()?;
    let initialized = unsafe { (lib.xlib.XInitThreads)() };
    debug!("XInitThreads() = {}", initialized);
    if initialized == 0 {
        return Err(Error::MultithreadingUnavailable);
    }
    MULTITHREADING_INITIALIZED.store(true, Ordering::Release);
    Ok(())
}

pub(crate) fn is_multithreading_initialized() -> bool {
    MULTITHREADING_INITIALIZED.load(Ordering::Acquire)
}

/// A connection to the X server, either owned by us or borrowed from the
/// embedding application.
#[derive(Debug)]
pub(crate) struct Display {
    raw: *mut xlib::Display,
    screen: c_int,
    owned: bool,
}

impl Display {
    /// Open a fresh connection to the default display.
    pub fn open() -> Result<Display, Error> {
        let lib = lib()?;
        install_error_handler(lib);
        let raw = unsafe { (lib.xlib.XOpenDisplay)(ptr::null()) };
        if raw.is_null() {
            return Err(Error::ConnectionFailed);
        }
        let screen = unsafe { (lib.xlib.XDefaultScreen)(raw) };
        debug!("opened display connection {raw:?}, screen {screen}");
        Ok(Display {
            raw,
            screen,
            owned: true,
        })
    }

    /// Wrap a connection owned by the caller.
    ///
    /// # Safety
    ///
    /// `raw` must be a live connection that outlives the returned value.
    pub unsafe fn from_raw(raw: *mut xlib::Display) -> Result<Display, Error> {
        let lib = lib()?;
        install_error_handler(lib);
        let screen = (lib.xlib.XDefaultScreen)(raw);
        Ok(Display {
            raw,
            screen,
            owned: false,
        })
    }

    pub fn raw(&self) -> *mut xlib::Display {
        self.raw
    }

    pub fn screen(&self) -> c_int {
        self.screen
    }

    /// Hold the display-wide Xlib lock for the lifetime of the guard.
    ///
    /// The lock only has teeth once `init_multithreading` has run; Xlib
    /// makes `XLockDisplay` a no-op otherwise, which is correct for
    /// single-threaded use.
    pub fn lock(&self) -> DisplayLock<'_> {
        DisplayLock::new(self)
    }

    /// Remove and return the pending trapped error for this display.
    pub fn take_error(&self) -> Option<XError> {
        DISPLAY_ERRORS.lock().ok()?.remove(&(self.raw as usize))
    }

    /// Flush the request queue and translate any trapped error.
    pub fn sync_and_check(&self) -> Result<(), Error> {
        let lib = lib()?;
        unsafe {
            (lib.xlib.XSync)(self.raw, xlib::False);
        }
        match self.take_error() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        if let Ok(lib) = lib() {
            unsafe {
                (lib.xlib.XCloseDisplay)(self.raw);
            }
        }
        if let Ok(mut errors) = DISPLAY_ERRORS.lock() {
            errors.remove(&(self.raw as usize));
        }
    }
}

/// RAII guard for the display-wide lock.
pub(crate) struct DisplayLock<'a> {
    display: &'a Display,
}

impl<'a> DisplayLock<'a> {
    fn new(display: &'a Display) -> DisplayLock<'a> {
        if let Ok(lib) = lib() {
            unsafe {
                (lib.xlib.XLockDisplay)(display.raw);
            }
        }
        DisplayLock { display }
    }
}

impl Drop for DisplayLock<'_> {
    fn drop(&mut self) {
        if let Ok(lib) = lib() {
            unsafe {
                (lib.xlib.XUnlockDisplay)(self.display.raw);
            }
        }
    }
}

/// A private, never-mapped native window backing headless device contexts.
///
/// Owns its display connection, a 64x64 InputOutput window created from a
/// baseline RGBA framebuffer configuration, and the GLX window binding
/// that configuration to it. The remembered configuration is what lets
/// contexts be created without an explicit pixel format.
#[derive(Debug)]
pub(crate) struct HiddenWindow {
    display: Display,
    window: c_ulong,
    glx_window: glx::GLXWindow,
    colormap: c_ulong,
    config: glx::GLXFBConfig,
}

impl HiddenWindow {
    pub fn new() -> Result<HiddenWindow, Error> {
        let lib = lib()?;
        let display = Display::open()?;
        let _guard = display.lock();

        let attributes = [
            glx::GLX_X_RENDERABLE as c_int,
            1,
            glx::GLX_DRAWABLE_TYPE as c_int,
            glx::GLX_WINDOW_BIT as c_int,
            glx::GLX_RENDER_TYPE as c_int,
            glx::GLX_RGBA_BIT as c_int,
            glx::GLX_DOUBLEBUFFER as c_int,
            super::glx::GLX_DONT_CARE,
            glx::GLX_RED_SIZE as c_int,
            1,
            glx::GLX_GREEN_SIZE as c_int,
            1,
            glx::GLX_BLUE_SIZE as c_int,
            1,
            0,
        ];

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
        debug!("baseline fbconfig for hidden window: {config:?}");

        let visual_info = unsafe { (lib.glx.glXGetVisualFromFBConfig)(display.raw(), config) };
        if visual_info.is_null() {
            return Err(Error::NoMatchingConfig);
        }
        let (visual, depth) = unsafe { ((*visual_info).visual, (*visual_info).depth) };
        unsafe { (lib.xlib.XFree)(visual_info as *mut _) };

        let root = unsafe { (lib.xlib.XRootWindow)(display.raw(), display.screen()) };
        let colormap = unsafe {
            (lib.xlib.XCreateColormap)(display.raw(), root, visual, xlib::AllocNone)
        };

        let mut swa: xlib::XSetWindowAttributes = unsafe { std::mem::zeroed() };
        swa.colormap = colormap;
        swa.border_pixel = 0;
        swa.event_mask = xlib::StructureNotifyMask;
        let window = unsafe {
            (lib.xlib.XCreateWindow)(
                display.raw(),
                root,
                0,
                0,
                64,
                64,
                0,
                depth,
                xlib::InputOutput as c_uint,
                visual,
                xlib::CWBorderPixel | xlib::CWColormap | xlib::CWEventMask,
                &mut swa,
            )
        };
        if window == 0 {
            unsafe { (lib.xlib.XFreeColormap)(display.raw(), colormap) };
            return Err(Error::WindowCreationFailed);
        }

        // Binding the config to the window is what lets contexts be
        // created against this device without a pixel format step.
        let glx_window =
            unsafe { (lib.glx.glXCreateWindow)(display.raw(), config, window, ptr::null()) };
        if let Err(err) = display.sync_and_check() {
            unsafe {
                if glx_window != 0 {
                    (lib.glx.glXDestroyWindow)(display.raw(), glx_window);
                }
                (lib.xlib.XDestroyWindow)(display.raw(), window);
                (lib.xlib.XFreeColormap)(display.raw(), colormap);
            }
            return Err(err);
        }

        drop(_guard);
        Ok(HiddenWindow {
            display,
            window,
            glx_window,
            colormap,
            config,
        })
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// The drawable contexts should be made current against.
    pub fn drawable(&self) -> c_ulong {
        self.glx_window
    }

    pub fn config(&self) -> glx::GLXFBConfig {
        self.config
    }
}

impl Drop for HiddenWindow {
    fn drop(&mut self) {
        if let Ok(lib) = lib() {
            let _guard = self.display.lock();
            unsafe {
                (lib.glx.glXDestroyWindow)(self.display.raw(), self.glx_window);
                (lib.xlib.XDestroyWindow)(self.display.raw(), self.window);
                (lib.xlib.XFreeColormap)(self.display.raw(), self.colormap);
            }
        }
        // The owned display connection closes when `self.display` drops.
    }
}
