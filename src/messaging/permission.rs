use std::sync::Arc;

use crate::messaging::logger::LOGGER;
use crate::messaging::platform::{PermissionService, SettingsLink};
use crate::messaging::types::{PermissionKind, PermissionState};

/// Result of a user-initiated permission repair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairOutcome {
    /// Permission was already granted; nothing to do.
    AlreadyGranted,
    /// The OS prompt was shown again and the user accepted.
    Granted,
    /// The OS settings screen was opened. The result is only known after the app
    /// returns to the foreground.
    SettingsOpened,
    /// Neither the prompt nor the settings screen could be used.
    Unresolved,
}

/// Queries, requests and repairs notification permission.
///
/// Every platform failure degrades to [`PermissionState::Undetermined`] and is logged.
#[derive(Clone)]
pub struct PermissionGateway {
    service: Arc<dyn PermissionService>,
    settings_link: SettingsLink,
    kinds: Vec<PermissionKind>,
}

impl PermissionGateway {
    pub fn new(
        service: Arc<dyn PermissionService>,
        settings_link: SettingsLink,
        kinds: Vec<PermissionKind>,
    ) -> Self {
        Self {
            service,
            settings_link,
            kinds,
        }
    }

    /// Permission kinds requested by [`PermissionGateway::repair`].
    pub fn kinds(&self) -> &[PermissionKind] {
        &self.kinds
    }

    /// Reads the current OS permission state without side effects.
    pub async fn check_status(&self) -> PermissionState {
        match self.service.check_notifications().await {
            Ok(status) => status.into(),
            Err(err) => {
                LOGGER.warn(format!("Failed to query notification permission: {err}"));
                PermissionState::Undetermined
            }
        }
    }

    /// Shows the OS prompt unless permission is already granted or blocked.
    pub async fn request_permission(&self, kinds: &[PermissionKind]) -> PermissionState {
        let current = self.check_status().await;
        self.request_from(current, kinds).await
    }

    /// Like [`PermissionGateway::request_permission`] when `current` is already known.
    pub(crate) async fn request_from(
        &self,
        current: PermissionState,
        kinds: &[PermissionKind],
    ) -> PermissionState {
        match current {
            PermissionState::Granted => return PermissionState::Granted,
            PermissionState::Blocked => {
                LOGGER.info("Notifications are blocked; the OS will not prompt again.");
                return PermissionState::Blocked;
            }
            PermissionState::Denied | PermissionState::Undetermined => {}
        }

        match self.service.request_notifications(kinds).await {
            Ok(status) => {
                let state = PermissionState::from(status);
                if state != PermissionState::Granted {
                    LOGGER.info("User denied notification permissions.");
                }
                state
            }
            Err(err) => {
                LOGGER.warn(format!("Failed to request notification permission: {err}"));
                PermissionState::Undetermined
            }
        }
    }

    /// Opens the app's page in the OS settings. Returns `false` if that failed.
    pub async fn open_settings(&self) -> bool {
        match self.service.open_settings(&self.settings_link).await {
            Ok(()) => true,
            Err(err) => {
                LOGGER.error(format!("Failed to open notification settings: {err}"));
                false
            }
        }
    }

    /// Tries to get from a denied or blocked state back to granted.
    ///
    /// Blocked goes straight to the settings screen. Otherwise the prompt is shown
    /// again and settings are the fallback when it is declined. Callers must re-check
    /// the status on the next foreground transition rather than assume success.
    pub async fn repair(&self) -> RepairOutcome {
        let current = self.check_status().await;
        let outcome = match current {
            PermissionState::Granted => RepairOutcome::AlreadyGranted,
            PermissionState::Blocked => self.settings_outcome().await,
            PermissionState::Denied | PermissionState::Undetermined => {
                match self.request_from(current, &self.kinds).await {
                    PermissionState::Granted => RepairOutcome::Granted,
                    _ => self.settings_outcome().await,
                }
            }
        };
        LOGGER.debug(format!("Permission repair finished: {outcome:?}"));
        outcome
    }

    async fn settings_outcome(&self) -> RepairOutcome {
        if self.open_settings().await {
            RepairOutcome::SettingsOpened
        } else {
            RepairOutcome::Unresolved
        }
    }
}
