//! Caller roles.

use crate::error::{JoblyError, JoblyResult};

/// Who is making a request. Token handling happens upstream; this is the
/// already-authenticated result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Caller {
    #[default]
    Anonymous,
    User {
        username: String,
    },
    Admin {
        username: String,
    },
}

impl Caller {
    pub fn user(username: impl Into<String>) -> Self {
        Self::User {
            username: username.into(),
        }
    }

    pub fn admin(username: impl Into<String>) -> Self {
        Self::Admin {
            username: username.into(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User { username } | Self::Admin { username } => Some(username),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin { .. })
    }

    /// Fail with `Unauthorized` unless the caller is an admin.
    pub fn ensure_admin(&self) -> JoblyResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(JoblyError::unauthorized("Unauthorized"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admins_pass() {
        assert!(Caller::admin("a").ensure_admin().is_ok());

        for caller in [Caller::Anonymous, Caller::user("u1")] {
            let err = caller.ensure_admin().unwrap_err();
            assert_eq!(err.status_code(), 401);
        }
    }

    #[test]
    fn usernames() {
        assert_eq!(Caller::default().username(), None);
        assert_eq!(Caller::user("u1").username(), Some("u1"));
        assert_eq!(Caller::admin("a1").username(), Some("a1"));
    }
}
