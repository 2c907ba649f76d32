// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! X11/GLX implementation of `gl-shell`.

// # Notes on error handling with Xlib
//
// Xlib reports protocol errors asynchronously, through a process-global
// handler installed with XSetErrorHandler, possibly long after the request
// that caused them was issued. We install a handler that decodes each
// report and stashes it in a side table keyed by display connection.
//
// Operations that change server state (context creation, make-current,
// deletion, config selection) call XSync afterwards and translate the
// pending entry for their display into a returned error. Buffer swaps do
// not sync; whatever the server reports during a swap stays in the table
// until the next checked operation or an explicit take_platform_error.

pub(crate) mod device;
pub(crate) mod display;
pub(crate) mod error;
pub(crate) mod glx;
mod util;
