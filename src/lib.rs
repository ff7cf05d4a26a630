//! Ephemeral Dgraph instances in Docker for tests.
//!
//! [`Launcher`] starts a container on a free port and waits for it to serve
//! HTTP; [`AdminClient`] installs schemas and wipes data through the admin
//! endpoints; [`Fixture`] bundles both for a single test.

pub mod admin;
pub mod config;
pub mod fixture;
pub mod retry;
pub mod sandbox;

pub use admin::{AdminClient, AdminError, SchemaLoad};
pub use config::SandboxConfig;
pub use fixture::{Fixture, FixtureError};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use sandbox::{InstanceHandle, Launcher, Readiness, SandboxError, StartedInstance};
