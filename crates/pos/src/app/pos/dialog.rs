/// What a confirm dialog runs when the user accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingAction {
    Payment { table: u32 },
    FactoryReset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DialogKind {
    Alert,
    Confirm(PendingAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dialog {
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) kind: DialogKind,
}

impl Dialog {
    pub(crate) fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: DialogKind::Alert,
        }
    }

    pub(crate) fn confirm(
        title: impl Into<String>,
        message: impl Into<String>,
        action: PendingAction,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: DialogKind::Confirm(action),
        }
    }
}

/// At most one dialog is open; showing a new one replaces it.
#[derive(Debug, Clone, Default)]
pub(crate) struct DialogState {
    current: Option<Dialog>,
}

impl DialogState {
    pub(crate) fn show(&mut self, dialog: Dialog) {
        self.current = Some(dialog);
    }

    pub(crate) fn current(&self) -> Option<&Dialog> {
        self.current.as_ref()
    }

    pub(crate) fn dismiss(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Closes the dialog and hands back its action if it was a confirm.
    pub(crate) fn accept(&mut self) -> Option<PendingAction> {
        match self.current.take()?.kind {
            DialogKind::Confirm(action) => Some(action),
            DialogKind::Alert => None,
        }
    }
}
