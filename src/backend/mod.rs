// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Platform specific implementations.

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "freebsd", target_os = "openbsd"))] {
        pub(crate) mod x11;
        pub(crate) use x11::{device, error};
    } else {
        compile_error!(
            "gl-shell: no backend for this platform; only the X11/GLX backend is implemented in this crate"
        );
    }
}
