use std::fmt;

/// Where a [`SyncSession`](crate::SyncSession) is in its lifecycle.
///
/// ```text
/// Unauthenticated -> Validating -> Valid -> Importing -> Idle
///                              \-> Invalid
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    /// Probing the target's version marker.
    Validating,
    Valid,
    /// The target is not a compatible spreadsheet. Stays here until new
    /// credentials or a new target arrive.
    Invalid,
    Importing,
    /// Imported; writes are accepted and the re-pull timer runs.
    Idle,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Validating => "validating",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Importing => "importing",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
