use nexus_engine::{CategoryFilter, PosHost, Product, ProductId};
use tracing::{debug, info, warn};

use super::cart::{Cart, CartTotals};
use super::catalog::{default_products, Catalog, ProductDraft};
use super::dialog::{Dialog, DialogState, PendingAction};
use super::settings::{SetupForm, Settings};
use super::store::Store;

/// What a confirmed dialog ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfirmOutcome {
    Nothing,
    PaymentSent { table: u32, total_cents: u64 },
    FactoryReset,
}

/// The whole point-of-sale screen: catalog, cart, table picker, settings and
/// the modal dialog. Every mutation here is also what the demo engine calls.
#[derive(Debug)]
pub(crate) struct AppState {
    catalog: Catalog,
    cart: Cart,
    settings: Settings,
    active_category: CategoryFilter,
    selected_table: Option<u32>,
    dialog: DialogState,
    store: Store,
    idle_timeout_override_ms: Option<u64>,
}

impl AppState {
    /// Loads persisted data. Missing files give defaults; unreadable ones are
    /// logged and replaced by defaults.
    pub(crate) fn load(store: Store, idle_timeout_override_ms: Option<u64>) -> Self {
        let products = match store.load_products() {
            Ok(Some(products)) => products,
            Ok(None) => default_products(),
            Err(error) => {
                warn!(error = %error, "products_load_failed_using_defaults");
                default_products()
            }
        };
        let settings = match store.load_settings() {
            Ok(Some(settings)) => settings,
            Ok(None) => Settings::default(),
            Err(error) => {
                warn!(error = %error, "settings_load_failed_using_defaults");
                Settings::default()
            }
        };
        info!(
            products = products.len(),
            store_name = %settings.store_name,
            setup_done = settings.setup_done,
            currency = %settings.currency,
            "pos_state_loaded"
        );

        Self {
            catalog: Catalog::new(products),
            cart: Cart::default(),
            settings,
            active_category: CategoryFilter::All,
            selected_table: None,
            dialog: DialogState::default(),
            store,
            idle_timeout_override_ms,
        }
    }

    pub(crate) fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(crate) fn cart(&self) -> &Cart {
        &self.cart
    }

    pub(crate) fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn selected_table(&self) -> Option<u32> {
        self.selected_table
    }

    pub(crate) fn dialog(&self) -> Option<&Dialog> {
        self.dialog.current()
    }

    pub(crate) fn format_money(&self, cents: u64) -> String {
        self.settings.format_money(cents)
    }

    pub(crate) fn adjust_quantity(&mut self, id: ProductId, delta: i32) -> bool {
        self.cart.adjust(id, delta)
    }

    /// `0` clears the selection, like the "Select Table..." entry.
    pub(crate) fn select_table(&mut self, table: u32) {
        if table == 0 {
            self.selected_table = None;
        } else if table > self.settings.table_count {
            self.dialog.show(Dialog::alert(
                "Table Required",
                format!("Select a table between 1 and {}", self.settings.table_count),
            ));
        } else {
            self.selected_table = Some(table);
        }
    }

    pub(crate) fn request_payment(&mut self) {
        if self.cart.is_empty() {
            self.dialog.show(Dialog::alert("Empty", "Cart is empty!"));
            return;
        }
        let Some(table) = self.selected_table else {
            self.dialog
                .show(Dialog::alert("Table Required", "Select a Table"));
            return;
        };
        let total = self.format_money(self.cart.totals().total_cents);
        self.dialog.show(Dialog::confirm(
            "Confirm Payment",
            format!("Process {total} for Table {table}?"),
            PendingAction::Payment { table },
        ));
    }

    pub(crate) fn request_factory_reset(&mut self) {
        self.dialog.show(Dialog::confirm(
            "Factory Reset",
            "Wipe all data?",
            PendingAction::FactoryReset,
        ));
    }

    pub(crate) fn confirm_dialog(&mut self) -> ConfirmOutcome {
        match self.dialog.accept() {
            None => ConfirmOutcome::Nothing,
            Some(PendingAction::Payment { table }) => {
                let total_cents = self.cart.totals().total_cents;
                self.cart.clear();
                self.selected_table = None;
                self.dialog.show(Dialog::alert(
                    "Success",
                    format!("Sent to Kitchen (Table {table})."),
                ));
                info!(table, total_cents, "payment_processed");
                ConfirmOutcome::PaymentSent { table, total_cents }
            }
            Some(PendingAction::FactoryReset) => {
                self.factory_reset();
                ConfirmOutcome::FactoryReset
            }
        }
    }

    pub(crate) fn cancel_dialog(&mut self) -> bool {
        self.dialog.dismiss()
    }

    pub(crate) fn complete_setup(&mut self, form: SetupForm) -> bool {
        if let Err(error) = self.settings.apply_setup(form) {
            debug!(error = %error, "setup_rejected");
            self.dialog
                .show(Dialog::alert("Error", "Please complete all fields."));
            return false;
        }
        info!(
            store_name = %self.settings.store_name,
            table_count = self.settings.table_count,
            currency = %self.settings.currency,
            "setup_completed"
        );
        self.persist();
        true
    }

    pub(crate) fn add_product(&mut self, draft: &ProductDraft) -> Option<ProductId> {
        match self.catalog.add_product(draft) {
            Ok(id) => {
                info!(product_id = id.0, name = %draft.name.trim(), "product_added");
                self.persist();
                Some(id)
            }
            Err(error) => {
                debug!(error = %error, "product_rejected");
                self.dialog
                    .show(Dialog::alert("Missing Info", "Enter valid name and price."));
                None
            }
        }
    }

    fn factory_reset(&mut self) {
        match self.store.wipe() {
            Ok(removed) => info!(removed_files = removed, "factory_reset"),
            Err(error) => warn!(error = %error, "factory_reset_wipe_failed"),
        }
        self.catalog = Catalog::default();
        self.settings = Settings::default();
        self.cart.clear();
        self.active_category = CategoryFilter::All;
        self.selected_table = None;
        self.dialog.dismiss();
    }

    fn persist(&self) {
        if let Err(error) = self.store.save_products(self.catalog.products()) {
            warn!(error = %error, "products_save_failed");
        }
        if let Err(error) = self.store.save_settings(&self.settings) {
            warn!(error = %error, "settings_save_failed");
        }
    }
}

impl PosHost for AppState {
    fn list_products(&self, filter: &CategoryFilter) -> Vec<Product> {
        self.catalog.filtered(filter)
    }

    fn category_tabs(&self) -> Vec<CategoryFilter> {
        self.catalog.tabs()
    }

    fn active_category(&self) -> CategoryFilter {
        self.active_category.clone()
    }

    fn cart_quantities(&self) -> Vec<(ProductId, u32)> {
        self.cart.quantities()
    }

    fn add_to_cart(&mut self, id: ProductId) {
        match self.catalog.get(id) {
            Some(product) => self.cart.add(product),
            None => debug!(product_id = id.0, "add_to_cart_unknown_product"),
        }
    }

    fn set_category_filter(&mut self, filter: CategoryFilter) {
        self.active_category = filter;
    }

    fn clear_cart(&mut self) {
        self.cart.clear();
    }

    fn dismiss_dialog(&mut self) {
        self.dialog.dismiss();
    }

    fn is_setup_complete(&self) -> bool {
        self.settings.setup_done
    }

    fn idle_timeout_ms(&self) -> u64 {
        self.idle_timeout_override_ms
            .unwrap_or(self.settings.idle_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use nexus_engine::app_paths_in;

    use super::*;
    use crate::app::pos::dialog::DialogKind;
    use crate::app::pos::settings::Currency;

    fn state_in(dir: &Path) -> AppState {
        AppState::load(Store::new(&app_paths_in(dir).expect("paths")), None)
    }

    fn setup_form() -> SetupForm {
        SetupForm {
            store_name: "Night Market".to_string(),
            table_count: 6,
            language: "en".to_string(),
            currency: Currency::Eur,
        }
    }

    #[test]
    fn fresh_state_uses_defaults_and_needs_setup() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = state_in(temp.path());

        assert_eq!(state.catalog().products().len(), 5);
        assert!(!state.is_setup_complete());
        assert_eq!(state.idle_timeout_ms(), 40_000);
        assert_eq!(state.active_category(), CategoryFilter::All);
    }

    #[test]
    fn payment_needs_items_then_a_table_then_confirmation() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut state = state_in(temp.path());

        state.request_payment();
        assert_eq!(state.dialog().map(|dialog| dialog.title.as_str()), Some("Empty"));
        state.cancel_dialog();

        state.add_to_cart(ProductId(1));
        state.add_to_cart(ProductId(2));
        state.request_payment();
        assert_eq!(
            state.dialog().map(|dialog| dialog.message.as_str()),
            Some("Select a Table")
        );

        state.select_table(3);
        state.request_payment();
        let dialog = state.dialog().expect("confirm dialog");
        assert_eq!(dialog.message, "Process $18.38 for Table 3?");
        assert_eq!(
            dialog.kind,
            DialogKind::Confirm(PendingAction::Payment { table: 3 })
        );

        assert_eq!(
            state.confirm_dialog(),
            ConfirmOutcome::PaymentSent {
                table: 3,
                total_cents: 1_838,
            }
        );
        assert!(state.cart().is_empty());
        assert_eq!(state.selected_table(), None);
        assert_eq!(
            state.dialog().map(|dialog| dialog.message.as_str()),
            Some("Sent to Kitchen (Table 3).")
        );
    }

    #[test]
    fn out_of_range_table_raises_an_alert() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut state = state_in(temp.path());
        state.select_table(11);
        assert_eq!(state.selected_table(), None);
        assert!(state.dialog().is_some());
    }

    #[test]
    fn setup_and_new_products_persist_but_the_cart_does_not() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut state = state_in(temp.path());
        assert!(state.complete_setup(setup_form()));
        let id = state
            .add_product(&ProductDraft {
                name: "Ion Tea".to_string(),
                price: "2.25".to_string(),
                category: "Drinks".to_string(),
            })
            .expect("valid product");
        state.add_to_cart(id);

        let reloaded = state_in(temp.path());
        assert!(reloaded.is_setup_complete());
        assert_eq!(reloaded.settings().store_name, "Night Market");
        assert_eq!(reloaded.settings().currency, Currency::Eur);
        assert_eq!(reloaded.catalog().get(id).map(|product| product.price_cents), Some(225));
        assert!(reloaded.cart().is_empty());
    }

    #[test]
    fn incomplete_setup_and_bad_products_raise_alerts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut state = state_in(temp.path());

        assert!(!state.complete_setup(SetupForm {
            store_name: String::new(),
            ..setup_form()
        }));
        assert_eq!(
            state.dialog().map(|dialog| dialog.message.as_str()),
            Some("Please complete all fields.")
        );

        let rejected = state.add_product(&ProductDraft {
            name: "Ghost".to_string(),
            price: "free".to_string(),
            category: "Food".to_string(),
        });
        assert_eq!(rejected, None);
        assert_eq!(
            state.dialog().map(|dialog| dialog.title.as_str()),
            Some("Missing Info")
        );
    }

    #[test]
    fn factory_reset_wipes_files_and_restores_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut state = state_in(temp.path());
        assert!(state.complete_setup(setup_form()));
        state.add_to_cart(ProductId(4));

        state.request_factory_reset();
        assert_eq!(state.confirm_dialog(), ConfirmOutcome::FactoryReset);

        assert!(!state.is_setup_complete());
        assert!(state.cart().is_empty());
        assert!(state.dialog().is_none());
        assert!(!state_in(temp.path()).is_setup_complete());
    }

    #[test]
    fn corrupt_settings_fall_back_to_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("settings.json"), "{not json").expect("write");
        let state = state_in(temp.path());
        assert_eq!(state.settings(), &Settings::default());
    }

    #[test]
    fn idle_timeout_override_wins_over_settings() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = Store::new(&app_paths_in(temp.path()).expect("paths"));
        let state = AppState::load(store, Some(5_000));
        assert_eq!(state.idle_timeout_ms(), 5_000);
    }

    #[test]
    fn unknown_products_are_ignored_by_add_to_cart() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut state = state_in(temp.path());
        state.add_to_cart(ProductId(99));
        assert!(state.cart().is_empty());
    }
}
