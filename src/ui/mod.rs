//! Presentation-side state: the toast queue and the screen state reducer.

mod state;
mod toast;

pub use state::{ConfirmAction, ConfirmDialog, Modal, Mode, UiAction, UiState, View};
pub use toast::{DEFAULT_TOAST_CAPACITY, Toast, ToastQueue};
