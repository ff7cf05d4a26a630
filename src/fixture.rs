//! One Dgraph instance for the lifetime of one test.
//!
//! ```ignore
//! let fixture = Fixture::start(&SandboxConfig::from_env(), None).await?;
//! fixture.require_ready()?;
//! fixture.load_schema(SCHEMA).await?;
//! // mutate / query against fixture.handle().base_url()
//! fixture.teardown().await?;
//! ```

use std::sync::Arc;

use crate::admin::{AdminClient, AdminError, SchemaLoad};
use crate::config::SandboxConfig;
use crate::retry::Sleeper;
use crate::sandbox::{InstanceHandle, Launcher, Readiness, SandboxError};

#[derive(thiserror::Error, Debug)]
pub enum FixtureError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("instance {container_id} not ready after {attempts} attempts")]
    NotReady { container_id: String, attempts: u32 },

    #[error("schema load still not accepted after {attempts} attempts")]
    SchemaExhausted { attempts: u32 },
}

pub struct Fixture {
    launcher: Launcher,
    handle: InstanceHandle,
    readiness: Readiness,
    admin: AdminClient,
}

impl Fixture {
    /// Connect to Docker and start an instance (`None` uses the configured image).
    pub async fn start(config: &SandboxConfig, image: Option<&str>) -> Result<Self, FixtureError> {
        let launcher = Launcher::connect(config).await?;
        Self::start_with(launcher, image, None).await
    }

    /// Start through an existing launcher. The admin client takes its schema
    /// retry and settle settings from the launcher's config. `sleeper`
    /// replaces the admin client's real delays when given.
    pub async fn start_with(
        launcher: Launcher,
        image: Option<&str>,
        sleeper: Option<Arc<dyn Sleeper>>,
    ) -> Result<Self, FixtureError> {
        let started = launcher.start(image).await?;
        if !started.readiness.is_ready() {
            tracing::warn!(
                container_id = %started.handle.container_id,
                attempts = started.readiness.attempts(),
                "instance did not report ready; continuing"
            );
        }

        let mut admin = AdminClient::from_config(&started.handle, launcher.config());
        if let Some(sleeper) = sleeper {
            admin = admin.with_sleeper(sleeper);
        }

        Ok(Self {
            launcher,
            handle: started.handle,
            readiness: started.readiness,
            admin,
        })
    }

    pub fn handle(&self) -> &InstanceHandle {
        &self.handle
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn admin(&self) -> &AdminClient {
        &self.admin
    }

    /// Fail unless the readiness poll saw a 200.
    pub fn require_ready(&self) -> Result<(), FixtureError> {
        match self.readiness {
            Readiness::Ready { .. } => Ok(()),
            Readiness::NotReady { attempts } => Err(FixtureError::NotReady {
                container_id: self.handle.container_id.clone(),
                attempts,
            }),
        }
    }

    /// Load a schema, treating an exhausted retry budget as an error.
    pub async fn load_schema(&self, schema: &str) -> Result<(), FixtureError> {
        match self.admin.load_schema(schema).await? {
            SchemaLoad::Succeeded { .. } => Ok(()),
            SchemaLoad::Exhausted { attempts } => Err(FixtureError::SchemaExhausted { attempts }),
        }
    }

    pub async fn drop_data(&self) -> Result<(), FixtureError> {
        Ok(self.admin.drop_data().await?)
    }

    pub async fn drop_all(&self) -> Result<(), FixtureError> {
        Ok(self.admin.drop_all().await?)
    }

    /// Stop and remove the container. The handle is gone afterwards.
    pub async fn teardown(self) -> Result<(), FixtureError> {
        self.launcher.teardown(&self.handle).await?;
        Ok(())
    }
}
