// Copyright 2023 the GlShell Authors
// SPDX-License-Identifier: Apache-2.0

//! Native API versions.

use std::fmt;

/// A `major.minor` version pair as reported by the native context API.
///
/// On X11 this is the GLX version of the connected server; device context
/// creation fails below GLX 1.3, the first version with framebuffer
/// configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u32,
    pub minor: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32) -> ApiVersion {
        ApiVersion { major, minor }
    }
}

impl From<(u32, u32)> for ApiVersion {
    fn from((major, minor): (u32, u32)) -> ApiVersion {
        ApiVersion { major, minor }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(ApiVersion::new(1, 2) < ApiVersion::new(1, 3));
        assert!(ApiVersion::new(1, 4) < ApiVersion::new(2, 0));
        assert_eq!(ApiVersion::new(1, 3), ApiVersion::from((1, 3)));
    }

    #[test]
    fn display() {
        assert_eq!(ApiVersion::new(1, 4).to_string(), "1.4");
    }
}
