//! Redacting wrapper for passwords, client secrets and refresh tokens

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value - redacted in Debug/Display/logs, zeroized on drop
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Read a secret from an environment variable.
    ///
    /// Surrounding whitespace is trimmed. Unset and empty variables both
    /// yield `None` so a blank `SF_SECURITY_TOKEN=` behaves like an absent one.
    pub fn from_env(key: &str) -> Option<Self> {
        let value = std::env::var(key).ok()?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_are_redacted() {
        let secret = Secret::from("hunter2");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(secret.to_string(), "[REDACTED]");
    }

    #[test]
    fn expose_returns_inner_value() {
        let secret = Secret::new(String::from("client-secret"));
        assert_eq!(secret.expose(), "client-secret");
    }

    #[test]
    fn redaction_survives_inside_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Login {
            username: String,
            password: Secret<String>,
        }
        let login = Login {
            username: "ops@example.com".into(),
            password: Secret::from("pw-123"),
        };
        let debug = format!("{login:?}");
        assert!(debug.contains("ops@example.com"));
        assert!(!debug.contains("pw-123"));
    }

    #[test]
    fn from_env_trims_and_rejects_blank() {
        // Unique names: tests run in parallel and share the process environment.
        unsafe { std::env::set_var("COMMON_SECRET_TEST_SET", "  tok-1 \n") };
        unsafe { std::env::set_var("COMMON_SECRET_TEST_BLANK", "   ") };

        let set = Secret::from_env("COMMON_SECRET_TEST_SET").unwrap();
        assert_eq!(set.expose(), "tok-1");
        assert!(Secret::from_env("COMMON_SECRET_TEST_BLANK").is_none());
        assert!(Secret::from_env("COMMON_SECRET_TEST_UNSET").is_none());

        unsafe { std::env::remove_var("COMMON_SECRET_TEST_SET") };
        unsafe { std::env::remove_var("COMMON_SECRET_TEST_BLANK") };
    }
}
