//! Small std-facing seams shared by the chatrelay crates.
//!
//! Currently just [`env`]: the `ReadEnv` trait that lets every crate's
//! `Config::from_env` be exercised in tests without touching the process
//! environment. `InMemoryEnv` ships behind the `test-support` feature so
//! downstream dev-dependencies can use it while release builds stay
//! dependency-free.

pub mod env;

pub use env::{ReadEnv, SystemEnv};
