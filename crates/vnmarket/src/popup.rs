//! Premium upsell popup: shown at most once per session, snoozable

use crate::error::StorageError;
use crate::storage::{KeyValueStore, StorageKey};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct PremiumPopup {
    local: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    snooze: Duration,
}

impl PremiumPopup {
    /// `local` outlives the session (snooze deadline), `session` does not
    /// (shown flag).
    pub fn new(
        local: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        snooze: Duration,
    ) -> Self {
        Self {
            local,
            session,
            snooze,
        }
    }

    pub fn should_show(&self, now: DateTime<Utc>) -> bool {
        if self.shown_this_session() {
            return false;
        }
        match self.snoozed_until() {
            Some(until) => now >= until,
            None => true,
        }
    }

    pub fn shown_this_session(&self) -> bool {
        self.session
            .get(StorageKey::PremiumPopupShownThisSession)
            .is_some_and(|v| v == "true")
    }

    /// Snooze deadline; an unparsable value counts as no snooze
    pub fn snoozed_until(&self) -> Option<DateTime<Utc>> {
        let raw = self.local.get(StorageKey::PremiumPopupSnoozeUntil)?;
        let millis = raw
            .trim()
            .parse::<i64>()
            .inspect_err(|e| tracing::debug!("ignoring snooze value {raw:?}: {e}"))
            .ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    pub fn mark_shown(&self) -> Result<(), StorageError> {
        self.session.set(StorageKey::PremiumPopupShownThisSession, "true")
    }

    /// "Remind me later": hide until `now + snooze` and for the rest of
    /// this session
    pub fn snooze(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, StorageError> {
        let delta = TimeDelta::from_std(self.snooze).unwrap_or(TimeDelta::MAX);
        let until = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.local.set(
            StorageKey::PremiumPopupSnoozeUntil,
            &until.timestamp_millis().to_string(),
        )?;
        self.mark_shown()?;
        Ok(until)
    }

    pub fn reset(&self) -> Result<(), StorageError> {
        self.local.clear(StorageKey::PremiumPopupSnoozeUntil)?;
        self.session.clear(StorageKey::PremiumPopupShownThisSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn popup() -> (PremiumPopup, Arc<MemoryStore>, Arc<MemoryStore>) {
        let local = Arc::new(MemoryStore::new());
        let session = Arc::new(MemoryStore::new());
        let popup = PremiumPopup::new(
            local.clone(),
            session.clone(),
            Duration::from_secs(24 * 3600),
        );
        (popup, local, session)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_shows_once_per_session() {
        let (popup, _, _) = popup();
        assert!(popup.should_show(at(0)));
        popup.mark_shown().unwrap();
        assert!(!popup.should_show(at(0)));
    }

    #[test]
    fn test_snooze_survives_new_session_until_expiry() {
        let (popup, local, _) = popup();
        popup.snooze(at(0)).unwrap();

        // new session, same local store
        let next_session = PremiumPopup::new(
            local,
            Arc::new(MemoryStore::new()),
            Duration::from_secs(24 * 3600),
        );
        assert!(!next_session.should_show(at(3600)));
        assert!(next_session.should_show(at(24 * 3600)));
    }

    #[test]
    fn test_corrupt_snooze_value_is_ignored() {
        let (popup, local, _) = popup();
        local.set(StorageKey::PremiumPopupSnoozeUntil, "tomorrow").unwrap();
        assert_eq!(popup.snoozed_until(), None);
        assert!(popup.should_show(at(0)));
    }

    #[test]
    fn test_reset_clears_both_scopes() {
        let (popup, local, session) = popup();
        popup.snooze(at(0)).unwrap();
        popup.reset().unwrap();
        assert!(local.is_empty());
        assert!(session.is_empty());
        assert!(popup.should_show(at(1)));
    }
}
