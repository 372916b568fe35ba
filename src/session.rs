//! Sign-in state around a single credentialing workflow.
//!
//! The portal has two screens: the provider-number prompt and the workflow.
//! Signing in or out always resets the workflow, cancelling pending work.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthError, ProviderNumber};
use crate::workflows::{StepperError, StepperSnapshot, WorkflowDriver};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("sign in with a provider number first")]
    NotAuthenticated,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Workflow(#[from] StepperError),
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub provider_number: ProviderNumber,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Portal {
    driver: WorkflowDriver,
    session: Option<Session>,
}

impl Portal {
    pub fn new(driver: WorkflowDriver) -> Self {
        Self {
            driver,
            session: None,
        }
    }

    pub fn driver(&self) -> &WorkflowDriver {
        &self.driver
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Validates the provider number and opens a fresh workflow session.
    pub async fn login(&mut self, input: &str) -> Result<&Session, SessionError> {
        let provider_number = ProviderNumber::parse(input)?;

        if self.session.is_some() {
            self.logout().await;
        }
        self.driver.reset().await;

        let session = Session {
            id: Uuid::new_v4(),
            provider_number,
            started_at: Utc::now(),
        };
        info!(
            session_id = %session.id,
            npi = %session.provider_number,
            "Provider signed in"
        );
        Ok(&*self.session.insert(session))
    }

    /// Closes the session and cancels any pending workflow operation.
    pub async fn logout(&mut self) -> Option<Session> {
        self.driver.reset().await;
        let session = self.session.take();
        if let Some(session) = &session {
            info!(session_id = %session.id, "Provider signed out");
        }
        session
    }

    pub async fn retrieve(&self) -> Result<(), SessionError> {
        let session = self.require_session()?;
        self.driver.start_retrieval(&session.provider_number).await?;
        Ok(())
    }

    pub async fn validate(&self) -> Result<(), SessionError> {
        self.require_session()?;
        self.driver.start_validation().await?;
        Ok(())
    }

    pub async fn create_workflow(&self) -> Result<(), SessionError> {
        self.require_session()?;
        self.driver.create_workflow().await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> StepperSnapshot {
        self.driver.snapshot().await
    }

    fn require_session(&self) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or(SessionError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::{Step, WorkflowSettings};

    fn portal() -> Portal {
        Portal::new(WorkflowDriver::with_defaults(WorkflowSettings::default()))
    }

    #[tokio::test]
    async fn test_operations_require_login() {
        let portal = portal();
        assert!(matches!(
            portal.retrieve().await,
            Err(SessionError::NotAuthenticated)
        ));
        assert!(matches!(
            portal.create_workflow().await,
            Err(SessionError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_login_opens_session() {
        let mut portal = portal();
        let session = tokio_test::block_on(portal.login("1234567890")).unwrap();
        assert_eq!(session.provider_number.as_str(), "1234567890");
        assert!(portal.is_authenticated());
        assert_eq!(tokio_test::block_on(portal.snapshot()).step, Step::Idle);
    }

    #[tokio::test]
    async fn test_login_rejects_invalid_provider_number() {
        let mut portal = portal();
        let result = portal.login("12345").await;
        assert!(matches!(
            result,
            Err(SessionError::Auth(AuthError::WrongLength { len: 5 }))
        ));
        assert!(!portal.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_resets_workflow() {
        let mut portal = portal();
        portal.login("1234567890").await.unwrap();
        portal.retrieve().await.unwrap();

        let session = portal.logout().await.unwrap();
        assert_eq!(session.provider_number.as_str(), "1234567890");
        assert!(!portal.is_authenticated());

        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert_eq!(portal.snapshot().await.step, Step::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relogin_starts_fresh() {
        let mut portal = portal();
        portal.login("1234567890").await.unwrap();
        portal.retrieve().await.unwrap();
        portal.driver().wait_until_settled().await;

        let session = portal.login("0987654321").await.unwrap();
        assert_eq!(session.provider_number.as_str(), "0987654321");
        let snapshot = portal.snapshot().await;
        assert_eq!(snapshot.step, Step::Idle);
        assert!(snapshot.record.is_none());
    }
}
