//! Screen-level UI state.
//!
//! Everything the shell needs to decide what is on screen lives in one [`UiState`]
//! value, and [`UiState::apply`] is the only way to change it. At most one modal and
//! one confirmation dialog are open at a time.

use crate::core::subscription::SubscriptionId;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Which experience the user is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Landing screen before choosing a plan type
    #[default]
    Welcome,
    /// Personal subscriptions
    Individual,
    /// Team workspace
    Enterprise,
    /// Creating a team workspace
    EnterpriseSetup,
}

/// Main navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Overview with spending summary
    #[default]
    Dashboard,
    /// Subscription list
    Subscriptions,
    /// Spending charts
    Analytics,
    /// Connected accounts
    Integrations,
    /// Preferences
    Settings,
    /// Team management, enterprise only
    Teams,
    /// Savings suggestions
    Insights,
}

/// Modal dialogs; opening one replaces whatever was open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modal {
    /// First-run walkthrough
    Onboarding,
    /// New subscription form
    AddSubscription,
    /// Edit form for one subscription
    EditSubscription(SubscriptionId),
    /// Pause, cancel or delete one subscription
    ManageSubscription(SubscriptionId),
    /// Plan upgrade prompt
    UpgradePlan,
    /// Savings insights
    Insights,
    /// Notification center
    Notifications,
}

/// Destructive action waiting for confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConfirmAction {
    /// Delete one subscription
    DeleteOne(SubscriptionId),
    /// Delete every selected subscription
    BulkDelete(Vec<SubscriptionId>),
}

/// Confirmation prompt shown over everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmDialog {
    /// Heading
    pub title: String,
    /// Body text
    pub message: String,
    /// What runs on confirm
    pub action: ConfirmAction,
}

/// Every state transition the shell can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// User authenticated
    SignIn,
    /// User signed out; resets everything
    SignOut,
    /// Onboarding finished or skipped
    CompleteOnboarding,
    /// Switch experience
    ChooseMode(Mode),
    /// Navigate to a view
    Navigate(View),
    /// Open a modal, replacing any open one
    OpenModal(Modal),
    /// Close the open modal
    CloseModal,
    /// Toggle the mobile navigation drawer
    ToggleMobileMenu,
    /// Add or remove one id from the selection
    ToggleSelection(SubscriptionId),
    /// Replace the selection
    SelectAll(Vec<SubscriptionId>),
    /// Empty the selection
    ClearSelection,
    /// Drop selected ids that no longer exist
    RetainSelection(Vec<SubscriptionId>),
    /// Ask before deleting one subscription
    RequestDelete {
        /// Target
        id: SubscriptionId,
        /// Display name for the prompt
        name: String,
    },
    /// Ask before deleting the selection
    RequestBulkDelete,
    /// Accept the open confirmation
    Confirm,
    /// Dismiss the open confirmation
    CancelConfirm,
}

/// Screen-level state of the dashboard shell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UiState {
    /// Current experience
    pub mode: Mode,
    /// Current navigation target
    pub view: View,
    /// Open modal, if any
    pub modal: Option<Modal>,
    /// Open confirmation, if any
    pub confirm: Option<ConfirmDialog>,
    /// Ids selected for bulk actions
    pub selection: BTreeSet<SubscriptionId>,
    /// Mobile navigation drawer
    pub mobile_menu_open: bool,
    /// Whether a user is signed in
    pub signed_in: bool,
    /// Whether onboarding was completed
    pub onboarding_completed: bool,
}

impl UiState {
    /// Applies `action`. Returns the confirmed action when `action` is
    /// [`UiAction::Confirm`] and a dialog was open.
    pub fn apply(&mut self, action: UiAction) -> Option<ConfirmAction> {
        debug!(?action, "ui action");
        match action {
            UiAction::SignIn => {
                self.signed_in = true;
                if !self.onboarding_completed {
                    self.modal = Some(Modal::Onboarding);
                }
            }
            UiAction::SignOut => *self = Self::default(),
            UiAction::CompleteOnboarding => {
                self.onboarding_completed = true;
                if self.modal == Some(Modal::Onboarding) {
                    self.modal = None;
                }
            }
            UiAction::ChooseMode(mode) => {
                self.mode = mode;
                self.view = View::Dashboard;
                self.selection.clear();
            }
            UiAction::Navigate(view) => {
                if view == View::Teams && self.mode != Mode::Enterprise {
                    return None;
                }
                self.view = view;
                self.mobile_menu_open = false;
            }
            UiAction::OpenModal(modal) => {
                self.modal = Some(modal);
                self.mobile_menu_open = false;
            }
            UiAction::CloseModal => self.modal = None,
            UiAction::ToggleMobileMenu => self.mobile_menu_open = !self.mobile_menu_open,
            UiAction::ToggleSelection(id) => {
                if !self.selection.remove(&id) {
                    self.selection.insert(id);
                }
            }
            UiAction::SelectAll(ids) => self.selection = ids.into_iter().collect(),
            UiAction::ClearSelection => self.selection.clear(),
            UiAction::RetainSelection(existing) => {
                let existing: BTreeSet<SubscriptionId> = existing.into_iter().collect();
                self.selection.retain(|id| existing.contains(id));
            }
            UiAction::RequestDelete { id, name } => {
                self.confirm = Some(ConfirmDialog {
                    title: "Delete Subscription".to_string(),
                    message: format!(
                        "Are you sure you want to delete {name}? This action cannot be undone."
                    ),
                    action: ConfirmAction::DeleteOne(id),
                });
            }
            UiAction::RequestBulkDelete => {
                if self.selection.is_empty() {
                    return None;
                }
                let count = self.selection.len();
                self.confirm = Some(ConfirmDialog {
                    title: "Delete Subscriptions".to_string(),
                    message: format!(
                        "Are you sure you want to delete {count} subscriptions? This action cannot be undone."
                    ),
                    action: ConfirmAction::BulkDelete(self.selection.iter().cloned().collect()),
                });
            }
            UiAction::Confirm => {
                let dialog = self.confirm.take()?;
                if matches!(dialog.action, ConfirmAction::BulkDelete(_)) {
                    self.selection.clear();
                }
                return Some(dialog.action);
            }
            UiAction::CancelConfirm => self.confirm = None,
        }
        None
    }

    /// Shorthand for applying [`UiAction::Confirm`].
    pub fn confirm(&mut self) -> Option<ConfirmAction> {
        self.apply(UiAction::Confirm)
    }

    /// True when the onboarding modal is open.
    #[must_use]
    pub fn is_onboarding(&self) -> bool {
        self.modal == Some(Modal::Onboarding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<SubscriptionId> {
        raw.iter().map(|id| SubscriptionId::new(*id)).collect()
    }

    #[test]
    fn test_sign_in_opens_onboarding_until_completed() {
        let mut ui = UiState::default();
        ui.apply(UiAction::SignIn);
        assert!(ui.is_onboarding());

        ui.apply(UiAction::CompleteOnboarding);
        assert!(ui.modal.is_none());

        ui.apply(UiAction::SignOut);
        ui.apply(UiAction::SignIn);
        // Sign-out resets the onboarding flag too
        assert!(ui.is_onboarding());
    }

    #[test]
    fn test_opening_modal_replaces_previous() {
        let mut ui = UiState::default();
        ui.apply(UiAction::OpenModal(Modal::AddSubscription));
        ui.apply(UiAction::OpenModal(Modal::EditSubscription("1".into())));
        assert_eq!(ui.modal, Some(Modal::EditSubscription("1".into())));

        ui.apply(UiAction::CloseModal);
        assert!(ui.modal.is_none());
    }

    #[test]
    fn test_teams_view_requires_enterprise() {
        let mut ui = UiState::default();
        ui.apply(UiAction::ChooseMode(Mode::Individual));
        ui.apply(UiAction::Navigate(View::Teams));
        assert_eq!(ui.view, View::Dashboard);

        ui.apply(UiAction::ChooseMode(Mode::Enterprise));
        ui.apply(UiAction::Navigate(View::Teams));
        assert_eq!(ui.view, View::Teams);
    }

    #[test]
    fn test_navigation_closes_mobile_menu() {
        let mut ui = UiState::default();
        ui.apply(UiAction::ToggleMobileMenu);
        assert!(ui.mobile_menu_open);
        ui.apply(UiAction::Navigate(View::Analytics));
        assert!(!ui.mobile_menu_open);
    }

    #[test]
    fn test_bulk_delete_confirmation_hands_back_selection() {
        let mut ui = UiState::default();
        ui.apply(UiAction::ToggleSelection("1".into()));
        ui.apply(UiAction::ToggleSelection("3".into()));
        ui.apply(UiAction::ToggleSelection("2".into()));
        ui.apply(UiAction::ToggleSelection("2".into()));

        ui.apply(UiAction::RequestBulkDelete);
        let dialog = ui.confirm.clone();
        assert!(dialog.is_some_and(|d| d.message.contains("2 subscriptions")));

        let action = ui.confirm();
        assert_eq!(action, Some(ConfirmAction::BulkDelete(ids(&["1", "3"]))));
        assert!(ui.selection.is_empty());
        assert!(ui.confirm.is_none());
    }

    #[test]
    fn test_bulk_delete_needs_a_selection() {
        let mut ui = UiState::default();
        ui.apply(UiAction::RequestBulkDelete);
        assert!(ui.confirm.is_none());
        assert_eq!(ui.confirm(), None);
    }

    #[test]
    fn test_cancel_keeps_selection() {
        let mut ui = UiState::default();
        ui.apply(UiAction::SelectAll(ids(&["1", "2"])));
        ui.apply(UiAction::RequestDelete {
            id: "1".into(),
            name: "Netflix".to_string(),
        });
        ui.apply(UiAction::CancelConfirm);

        assert!(ui.confirm.is_none());
        assert_eq!(ui.selection.len(), 2);
    }

    #[test]
    fn test_retain_selection_drops_missing_ids() {
        let mut ui = UiState::default();
        ui.apply(UiAction::SelectAll(ids(&["1", "2", "3"])));
        ui.apply(UiAction::RetainSelection(ids(&["2"])));
        assert_eq!(ui.selection.into_iter().collect::<Vec<_>>(), ids(&["2"]));
    }
}
