//! Strategy for hosts without any supported sensor source.

use super::{Platform, PlatformKind};

/// Reports every metric as unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePlatform;

impl Platform for UnavailablePlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Unavailable
    }
}
