mod atomic_io;
mod cart;
mod catalog;
mod dialog;
mod settings;
mod state;
mod store;

pub(crate) use catalog::ProductDraft;
pub(crate) use dialog::{Dialog, DialogKind};
pub(crate) use settings::{Currency, SetupForm};
pub(crate) use state::{AppState, ConfirmOutcome};
pub(crate) use store::Store;
