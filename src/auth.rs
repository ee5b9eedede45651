//! Request user identity
//!
//! Every plan carries the user it runs as. Without an `AuthUser` header the
//! sentinel no-auth user applies, which passes every authorization check;
//! the actual per-object policy lives with the row scanner, not here.

/// The identity a query is evaluated under
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthUser {
    /// Sentinel identity that is authorized for every row
    NoAuth,
    /// A named contact resolved from an `AuthUser` header
    Named { name: String },
}

impl AuthUser {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    pub fn is_no_auth(&self) -> bool {
        matches!(self, Self::NoAuth)
    }

    /// The resolved user name; the no-auth sentinel has none.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::NoAuth => None,
            Self::Named { name } => Some(name),
        }
    }
}

impl Default for AuthUser {
    fn default() -> Self {
        Self::NoAuth
    }
}

impl std::fmt::Display for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoAuth => f.write_str("(no auth)"),
            Self::Named { name } => f.write_str(name),
        }
    }
}
