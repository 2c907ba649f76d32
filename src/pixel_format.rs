// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Framebuffer configurations and how to request one.

/// A framebuffer configuration supported by a device, decoded from the
/// native descriptor.
#[derive(Debug, Clone)]
pub struct PixelFormat {
    pub(crate) native_id: u32,
    /// Whether the format is backed by a conformant, accelerated driver
    /// path rather than a fallback software renderer.
    pub hardware_accelerated: bool,
    /// The number of color bits. Does not include alpha bits.
    pub color_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    pub stereoscopy: bool,
    pub double_buffer: bool,
    /// `None` if multisampling is disabled, otherwise `Some(n)` where `n`
    /// is the number of samples per pixel.
    pub multisampling: Option<u16>,
    pub srgb: bool,
    /// Whether color components are floating point rather than unsigned
    /// normalized values.
    pub float_color_buffer: bool,
    pub render_to_window: bool,
    pub render_to_pbuffer: bool,
}

impl PixelFormat {
    /// The platform's identifier for the underlying configuration.
    ///
    /// On X11 this is the `GLX_FBCONFIG_ID` of the config; it stays valid
    /// for the lifetime of the display connection.
    pub fn native_id(&self) -> u32 {
        self.native_id
    }
}

/// Describes how a framebuffer configuration should be selected.
///
/// Every numeric field is a minimum; `None` means "don't care".
#[derive(Debug, Clone)]
pub struct PixelFormatRequirements {
    /// If true, only hardware-accelerated formats will be considered. If
    /// false, only software renderers. `None` means "don't care". Default
    /// is `Some(true)`.
    pub hardware_accelerated: Option<bool>,

    /// Minimum number of bits for the color buffer, excluding alpha. The
    /// default is `Some(24)`.
    pub color_bits: Option<u8>,

    /// If true, the color buffer must be in a floating point format.
    /// Default is `false`.
    pub float_color_buffer: bool,

    /// Minimum number of bits for the alpha in the color buffer. The
    /// default is `Some(8)`.
    pub alpha_bits: Option<u8>,

    /// Minimum number of bits for the depth buffer. The default is
    /// `Some(24)`.
    pub depth_bits: Option<u8>,

    /// Minimum number of stencil bits. The default is `Some(8)`.
    pub stencil_bits: Option<u8>,

    /// If true, only double-buffered formats will be considered. If false,
    /// only single-buffer formats. `None` means "don't care". The default
    /// is `None`.
    pub double_buffer: Option<bool>,

    /// Minimum number of samples per pixel in the color, depth and stencil
    /// buffers. `None` means "don't care". `Some(0)` requires that
    /// multisampling is off. Default is `None`.
    pub multisampling: Option<u16>,

    /// If true, only stereoscopic formats will be considered. The default
    /// is `false`.
    pub stereoscopy: bool,

    /// Whether the format must be sRGB-capable. `None` means "don't care".
    /// The default is `None`.
    pub srgb: Option<bool>,
}

impl Default for PixelFormatRequirements {
    fn default() -> PixelFormatRequirements {
        PixelFormatRequirements {
            hardware_accelerated: Some(true),
            color_bits: Some(24),
            float_color_buffer: false,
            alpha_bits: Some(8),
            depth_bits: Some(24),
            stencil_bits: Some(8),
            double_buffer: None,
            multisampling: None,
            stereoscopy: false,
            srgb: None,
        }
    }
}
