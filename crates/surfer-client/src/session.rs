//! Scoped connection guard.

use std::ops::Deref;
use std::sync::Arc;

use surfer_types::SurferError;

use crate::relay::Surfer;

/// Connects on [`open`](Self::open) and disconnects when dropped, so every
/// exit path of the enclosing scope releases the bridge.
pub struct SurferSession {
    surfer: Arc<Surfer>,
}

impl SurferSession {
    pub async fn open(surfer: Arc<Surfer>) -> Result<Self, SurferError> {
        surfer.connect().await?;
        Ok(Self { surfer })
    }

    /// Shared handle to the relay, e.g. for a signal handler.
    pub fn surfer(&self) -> &Arc<Surfer> {
        &self.surfer
    }
}

impl Deref for SurferSession {
    type Target = Surfer;

    fn deref(&self) -> &Surfer {
        &self.surfer
    }
}

impl Drop for SurferSession {
    fn drop(&mut self) {
        self.surfer.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurferConfig;
    use crate::mock::MockConnector;
    use std::sync::atomic::Ordering;

    fn relay(connector: &Arc<MockConnector>) -> Arc<Surfer> {
        Arc::new(Surfer::with_connector(
            SurferConfig::default(),
            connector.clone(),
        ))
    }

    #[tokio::test]
    async fn session_disconnects_on_drop() {
        let connector = Arc::new(MockConnector::default());
        let surfer = relay(&connector);
        {
            let session = SurferSession::open(Arc::clone(&surfer)).await.unwrap();
            assert!(session.is_connected());
            session.stop();
        }
        assert!(!surfer.is_connected());
        assert_eq!(connector.bus.terminations.load(Ordering::SeqCst), 1);
        assert_eq!(connector.bus.published().len(), 1);
    }

    #[tokio::test]
    async fn failed_open_yields_no_session() {
        let connector = Arc::new(MockConnector::default());
        connector.refuse.store(true, Ordering::SeqCst);
        let surfer = relay(&connector);
        assert!(SurferSession::open(Arc::clone(&surfer)).await.is_err());
        assert!(!surfer.is_connected());
    }
}
