use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::storage::StoreHandle;

pub const IDENTITY_KEY: &str = "todomate-user";

/// The locally recorded signed-in user. Nothing about it is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub name: String,
}

impl Identity {
    pub fn from_email(email: &str) -> Self {
        Self {
            email: email.to_string(),
            name: local_part(email).to_string(),
        }
    }
}

/// Everything before the first `@`, or the whole address when there is none.
pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[derive(Debug)]
pub struct SessionManager {
    store: StoreHandle,
    current: Option<Identity>,
}

impl SessionManager {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn restore(&mut self) -> anyhow::Result<Option<&Identity>> {
        self.current = self.store.get_as::<Identity>(IDENTITY_KEY)?;
        if let Some(identity) = &self.current {
            tracing::info!(email = %identity.email, "restored session");
        }
        Ok(self.current.as_ref())
    }

    /// Demo login: the password is accepted as-is and the display name comes
    /// from the email's local part.
    pub fn login(&mut self, email: &str, _password: &str) -> Result<&Identity, SessionError> {
        self.establish(Identity::from_email(email))
    }

    pub fn signup(
        &mut self,
        email: &str,
        _password: &str,
        name: &str,
    ) -> Result<&Identity, SessionError> {
        self.establish(Identity {
            email: email.to_string(),
            name: name.to_string(),
        })
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store
            .remove(IDENTITY_KEY)
            .map_err(SessionError::Persist)?;
        if let Some(identity) = self.current.take() {
            tracing::info!(email = %identity.email, "signed out");
        }
        Ok(())
    }

    fn establish(&mut self, identity: Identity) -> Result<&Identity, SessionError> {
        self.store
            .set_as(IDENTITY_KEY, &identity)
            .map_err(SessionError::Persist)?;
        tracing::info!(email = %identity.email, name = %identity.name, "signed in");
        Ok(self.current.insert(identity))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn manager() -> (Arc<MemoryStore>, SessionManager) {
        let memory = Arc::new(MemoryStore::new());
        let session = SessionManager::new(StoreHandle::from_arc(memory.clone()));
        (memory, session)
    }

    #[test]
    fn local_part_stops_at_first_at_sign() {
        assert_eq!(local_part("jane.doe@example.com"), "jane.doe");
        assert_eq!(local_part("a@b@c"), "a");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
        assert_eq!(local_part("@host"), "");
    }

    #[test]
    fn login_derives_name_and_persists() -> anyhow::Result<()> {
        let (memory, mut session) = manager();
        let identity = session.login("kim@example.com", "whatever")?.clone();
        assert_eq!(identity.name, "kim");
        assert_eq!(
            memory.get(IDENTITY_KEY)?,
            Some(json!({"email": "kim@example.com", "name": "kim"}))
        );
        Ok(())
    }

    #[test]
    fn signup_replaces_previous_identity() -> anyhow::Result<()> {
        let (_memory, mut session) = manager();
        session.login("first@example.com", "pw")?;
        session.signup("second@example.com", "pw", "Second User")?;
        assert_eq!(
            session.current(),
            Some(&Identity {
                email: "second@example.com".into(),
                name: "Second User".into(),
            })
        );
        Ok(())
    }

    #[test]
    fn logout_clears_memory_and_store() -> anyhow::Result<()> {
        let (memory, mut session) = manager();
        session.login("kim@example.com", "secret1")?;
        session.logout()?;
        assert!(!session.is_signed_in());
        assert_eq!(memory.get(IDENTITY_KEY)?, None);
        // logging out twice is harmless
        session.logout()?;
        Ok(())
    }

    #[test]
    fn restore_reads_persisted_identity() -> anyhow::Result<()> {
        let (memory, mut session) = manager();
        session.signup("lee@example.com", "secret1", "Lee")?;

        let mut fresh = SessionManager::new(StoreHandle::from_arc(memory.clone()));
        let restored = fresh.restore()?.cloned();
        assert_eq!(restored.map(|identity| identity.name), Some("Lee".into()));
        Ok(())
    }

    #[test]
    fn restore_ignores_malformed_identity() -> anyhow::Result<()> {
        let (memory, mut session) = manager();
        memory.put_raw(IDENTITY_KEY, "{\"email\": 42}");
        assert!(session.restore()?.is_none());

        memory.put_raw(IDENTITY_KEY, "<html>");
        assert!(session.restore()?.is_none());
        Ok(())
    }
}
