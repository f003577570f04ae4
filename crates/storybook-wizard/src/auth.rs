//! Session context for the wizard.

use storybook_core::StorefrontConfig;

/// Snapshot of the caller's session, taken once per wizard session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub is_authenticated: bool,
}

impl AuthContext {
    pub fn authenticated() -> Self {
        Self {
            is_authenticated: true,
        }
    }

    pub fn guest() -> Self {
        Self {
            is_authenticated: false,
        }
    }
}

/// Source of the session flag.
///
/// The flag is a client-side heuristic (a token is present), not a guarantee the
/// server will accept the session.
pub trait AuthProvider: Send + Sync {
    fn snapshot(&self) -> AuthContext;
}

/// Fixed session flag, typically derived from configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticAuth(pub AuthContext);

impl StaticAuth {
    pub fn from_config(config: &StorefrontConfig) -> Self {
        if config.has_access_token() {
            Self(AuthContext::authenticated())
        } else {
            Self(AuthContext::guest())
        }
    }
}

impl AuthProvider for StaticAuth {
    fn snapshot(&self) -> AuthContext {
        self.0
    }
}
