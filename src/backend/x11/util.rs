// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Pure helpers for working with GLX attribute lists.

use std::os::raw::c_int;

use x11_dl::glx;

use crate::context::{ContextAttributes, GlProfile};
use crate::pixel_format::PixelFormatRequirements;

use super::error::Error;
use super::glx::{
    GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB, GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
    GLX_CONTEXT_DEBUG_BIT_ARB, GLX_CONTEXT_FLAGS_ARB, GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB,
    GLX_CONTEXT_MAJOR_VERSION_ARB, GLX_CONTEXT_MINOR_VERSION_ARB, GLX_CONTEXT_PROFILE_MASK_ARB,
    GLX_DONT_CARE, GLX_FRAMEBUFFER_SRGB_CAPABLE_ARB, GLX_RGBA_FLOAT_BIT_ARB,
};

/// Build the `glXChooseFBConfig` descriptor for a set of requirements.
///
/// Extension prerequisites (float buffers, sRGB, multisampling) are the
/// caller's to check; this only assembles the list.
pub(crate) fn config_attrib_list(reqs: &PixelFormatRequirements) -> Vec<c_int> {
    let mut out: Vec<c_int> = Vec::with_capacity(32);

    out.push(glx::GLX_X_RENDERABLE as c_int);
    out.push(1);

    out.push(glx::GLX_X_VISUAL_TYPE as c_int);
    out.push(glx::GLX_TRUE_COLOR as c_int);

    out.push(glx::GLX_DRAWABLE_TYPE as c_int);
    out.push(glx::GLX_WINDOW_BIT as c_int);

    if let Some(color) = reqs.color_bits {
        let color = color as c_int;
        out.push(glx::GLX_RED_SIZE as c_int);
        out.push(color / 3);
        out.push(glx::GLX_GREEN_SIZE as c_int);
        out.push(color / 3 + if color % 3 != 0 { 1 } else { 0 });
        out.push(glx::GLX_BLUE_SIZE as c_int);
        out.push(color / 3 + if color % 3 == 2 { 1 } else { 0 });
    }

    if let Some(alpha) = reqs.alpha_bits {
        out.push(glx::GLX_ALPHA_SIZE as c_int);
        out.push(alpha as c_int);
    }

    if let Some(depth) = reqs.depth_bits {
        out.push(glx::GLX_DEPTH_SIZE as c_int);
        out.push(depth as c_int);
    }

    if let Some(stencil) = reqs.stencil_bits {
        out.push(glx::GLX_STENCIL_SIZE as c_int);
        out.push(stencil as c_int);
    }

    out.push(glx::GLX_RENDER_TYPE as c_int);
    out.push(if reqs.float_color_buffer {
        GLX_RGBA_FLOAT_BIT_ARB
    } else {
        glx::GLX_RGBA_BIT as c_int
    });

    // ChooseFBConfig's own default for DOUBLEBUFFER is an exact False
    // match, so "don't care" has to be spelled out.
    out.push(glx::GLX_DOUBLEBUFFER as c_int);
    out.push(match reqs.double_buffer {
        Some(true) => 1,
        Some(false) => 0,
        None => GLX_DONT_CARE,
    });

    if let Some(samples) = reqs.multisampling {
        out.push(glx::GLX_SAMPLE_BUFFERS as c_int);
        out.push(if samples == 0 { 0 } else { 1 });
        out.push(glx::GLX_SAMPLES as c_int);
        out.push(samples as c_int);
    }

    out.push(glx::GLX_STEREO as c_int);
    out.push(if reqs.stereoscopy { 1 } else { 0 });

    // Omitting the sRGB attribute means "don't care" per the amended ARB
    // extension, so it only appears when the caller has an opinion.
    if let Some(srgb) = reqs.srgb {
        out.push(GLX_FRAMEBUFFER_SRGB_CAPABLE_ARB);
        out.push(if srgb { 1 } else { 0 });
    }

    out.push(glx::GLX_CONFIG_CAVEAT as c_int);
    out.push(match reqs.hardware_accelerated {
        Some(true) => glx::GLX_NONE as c_int,
        Some(false) => glx::GLX_SLOW_CONFIG as c_int,
        None => GLX_DONT_CARE,
    });

    out.push(0);
    out
}

/// Build the `glXCreateContextAttribsARB` attribute list.
pub(crate) fn context_attrib_list(attributes: &ContextAttributes) -> Vec<c_int> {
    let mut out: Vec<c_int> = Vec::with_capacity(9);

    if let Some((major, minor)) = attributes.version {
        out.push(GLX_CONTEXT_MAJOR_VERSION_ARB);
        out.push(major as c_int);
        out.push(GLX_CONTEXT_MINOR_VERSION_ARB);
        out.push(minor as c_int);
    }

    if let Some(profile) = attributes.profile {
        out.push(GLX_CONTEXT_PROFILE_MASK_ARB);
        out.push(match profile {
            GlProfile::Core => GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
            GlProfile::Compatibility => GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
        });
    }

    let mut flags = 0;
    if attributes.debug {
        flags |= GLX_CONTEXT_DEBUG_BIT_ARB;
    }
    if attributes.forward_compatible {
        flags |= GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB;
    }
    if flags != 0 {
        out.push(GLX_CONTEXT_FLAGS_ARB);
        out.push(flags);
    }

    out.push(0);
    out
}

/// Check the shape the native API requires of a raw attribute list.
pub(crate) fn validate_attrib_list(list: &[c_int]) -> Result<(), Error> {
    match list.last() {
        Some(0) => Ok(()),
        _ => Err(Error::InvalidAttribList),
    }
}

/// Split a server extension string into its names.
pub(crate) fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(' ')
        .filter(|ext| !ext.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrib_value(list: &[c_int], attrib: c_int) -> Option<c_int> {
        list.chunks_exact(2)
            .find(|pair| pair[0] == attrib)
            .map(|pair| pair[1])
    }

    #[test_log::test]
    fn default_requirements_descriptor() {
        let list = config_attrib_list(&PixelFormatRequirements::default());
        assert_eq!(list.last(), Some(&0));
        assert_eq!(attrib_value(&list, glx::GLX_RED_SIZE as c_int), Some(8));
        assert_eq!(attrib_value(&list, glx::GLX_GREEN_SIZE as c_int), Some(8));
        assert_eq!(attrib_value(&list, glx::GLX_BLUE_SIZE as c_int), Some(8));
        assert_eq!(attrib_value(&list, glx::GLX_ALPHA_SIZE as c_int), Some(8));
        assert_eq!(attrib_value(&list, glx::GLX_DEPTH_SIZE as c_int), Some(24));
        assert_eq!(attrib_value(&list, glx::GLX_STENCIL_SIZE as c_int), Some(8));
        assert_eq!(
            attrib_value(&list, glx::GLX_RENDER_TYPE as c_int),
            Some(glx::GLX_RGBA_BIT as c_int)
        );
        assert_eq!(
            attrib_value(&list, glx::GLX_DOUBLEBUFFER as c_int),
            Some(GLX_DONT_CARE)
        );
        assert_eq!(
            attrib_value(&list, glx::GLX_CONFIG_CAVEAT as c_int),
            Some(glx::GLX_NONE as c_int)
        );
        // sRGB defaults to don't-care and must not constrain the search.
        assert_eq!(attrib_value(&list, GLX_FRAMEBUFFER_SRGB_CAPABLE_ARB), None);
    }

    #[test_log::test]
    fn uneven_color_bits_split() {
        let reqs = PixelFormatRequirements {
            color_bits: Some(16),
            ..Default::default()
        };
        let list = config_attrib_list(&reqs);
        assert_eq!(attrib_value(&list, glx::GLX_RED_SIZE as c_int), Some(5));
        assert_eq!(attrib_value(&list, glx::GLX_GREEN_SIZE as c_int), Some(6));
        assert_eq!(attrib_value(&list, glx::GLX_BLUE_SIZE as c_int), Some(5));
    }

    #[test_log::test]
    fn multisampling_zero_means_off() {
        let reqs = PixelFormatRequirements {
            multisampling: Some(0),
            ..Default::default()
        };
        let list = config_attrib_list(&reqs);
        assert_eq!(attrib_value(&list, glx::GLX_SAMPLE_BUFFERS as c_int), Some(0));
        assert_eq!(attrib_value(&list, glx::GLX_SAMPLES as c_int), Some(0));
    }

    #[test_log::test]
    fn float_buffer_render_type() {
        let reqs = PixelFormatRequirements {
            float_color_buffer: true,
            ..Default::default()
        };
        let list = config_attrib_list(&reqs);
        assert_eq!(
            attrib_value(&list, glx::GLX_RENDER_TYPE as c_int),
            Some(GLX_RGBA_FLOAT_BIT_ARB)
        );
    }

    #[test_log::test]
    fn context_attribs_full() {
        let attributes = ContextAttributes {
            version: Some((3, 2)),
            profile: Some(GlProfile::Core),
            debug: true,
            forward_compatible: true,
        };
        let list = context_attrib_list(&attributes);
        assert_eq!(attrib_value(&list, GLX_CONTEXT_MAJOR_VERSION_ARB), Some(3));
        assert_eq!(attrib_value(&list, GLX_CONTEXT_MINOR_VERSION_ARB), Some(2));
        assert_eq!(
            attrib_value(&list, GLX_CONTEXT_PROFILE_MASK_ARB),
            Some(GLX_CONTEXT_CORE_PROFILE_BIT_ARB)
        );
        assert_eq!(
            attrib_value(&list, GLX_CONTEXT_FLAGS_ARB),
            Some(GLX_CONTEXT_DEBUG_BIT_ARB | GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB)
        );
        assert_eq!(list.last(), Some(&0));
    }

    #[test_log::test]
    fn context_attribs_empty() {
        let attributes = ContextAttributes {
            version: None,
            profile: None,
            debug: false,
            forward_compatible: false,
        };
        assert_eq!(context_attrib_list(&attributes), vec![0]);
    }

    #[test_log::test]
    fn attrib_list_validation() {
        assert!(validate_attrib_list(&[]).is_err());
        assert!(validate_attrib_list(&[GLX_CONTEXT_MAJOR_VERSION_ARB, 3]).is_err());
        assert!(validate_attrib_list(&[GLX_CONTEXT_MAJOR_VERSION_ARB, 3, 0]).is_ok());
        assert!(validate_attrib_list(&[0]).is_ok());
    }

    #[test_log::test]
    fn extension_parsing() {
        let exts = parse_extensions("GLX_ARB_create_context  GLX_EXT_swap_control ");
        assert_eq!(exts, vec!["GLX_ARB_create_context", "GLX_EXT_swap_control"]);
        assert!(parse_extensions("").is_empty());
    }
}
