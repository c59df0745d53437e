//! Environment access behind a trait, so config loaders can run against a
//! seeded map in tests instead of mutating process-global state.

use std::env::VarError;

/// Source of environment variables.
///
/// Config `from_env` constructors take `&impl ReadEnv`; production code
/// passes [`SystemEnv`], tests pass a seeded [`InMemoryEnv`].
pub trait ReadEnv {
    /// Look up `key`, with the same contract as `std::env::var`.
    fn var(&self, key: &str) -> Result<String, VarError>;
}

/// The real process environment.
pub struct SystemEnv;

impl ReadEnv for SystemEnv {
    #[inline]
    fn var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }
}

/// A seeded variable map for tests.
///
/// Interior mutability keeps seeding calls `&self`, so a test can hold the
/// env by shared reference while it tweaks variables between assertions.
/// Not `Send`/`Sync`; it is meant to live inside a single test.
#[cfg(any(test, feature = "test-support"))]
pub struct InMemoryEnv {
    vars: std::cell::RefCell<std::collections::HashMap<String, String>>,
}

#[cfg(any(test, feature = "test-support"))]
impl InMemoryEnv {
    pub fn new() -> Self {
        Self {
            vars: std::cell::RefCell::new(std::collections::HashMap::new()),
        }
    }

    /// Seed or overwrite a variable.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.borrow_mut().insert(key.into(), value.into());
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for InMemoryEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ReadEnv for InMemoryEnv {
    fn var(&self, key: &str) -> Result<String, VarError> {
        self.vars
            .borrow()
            .get(key)
            .cloned()
            .ok_or(VarError::NotPresent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_value_round_trips() {
        let env = InMemoryEnv::new();
        env.set("RELAY_TEST_KEY", "value");
        assert_eq!(env.var("RELAY_TEST_KEY").unwrap(), "value");
    }

    #[test]
    fn missing_key_reports_not_present() {
        let env = InMemoryEnv::new();
        assert!(matches!(env.var("RELAY_UNSET"), Err(VarError::NotPresent)));
    }

    #[test]
    fn set_overwrites_previous_value() {
        let env = InMemoryEnv::new();
        env.set("KEY", "first");
        env.set("KEY", "second");
        assert_eq!(env.var("KEY").unwrap(), "second");
    }

    #[test]
    fn system_env_reads_the_process_environment() {
        // PATH is present in any environment the tests run under.
        assert_eq!(SystemEnv.var("PATH").is_ok(), std::env::var("PATH").is_ok());
    }

    #[test]
    fn config_style_fallback_chain_works_on_both_impls() {
        fn port<E: ReadEnv>(env: &E) -> u16 {
            env.var("RELAY_TEST_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080)
        }

        let env = InMemoryEnv::new();
        assert_eq!(port(&env), 8080);
        env.set("RELAY_TEST_PORT", "9000");
        assert_eq!(port(&env), 9000);
        env.set("RELAY_TEST_PORT", "not-a-port");
        assert_eq!(port(&env), 8080);
    }
}
