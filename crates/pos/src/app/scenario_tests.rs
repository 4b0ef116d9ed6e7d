use std::fs;
use std::path::Path;

use nexus_engine::{
    app_paths_in, CategoryFilter, DemoConfig, DemoEngine, DirectorPhase, PosHost, Product,
    ProductId, RandomSource, StopReason, UserSignal,
};

use super::pos::{AppState, Currency, SetupForm, Store};

const IDLE_MS: u64 = 1_000;

/// Every weighted tick buys the first visible product.
struct Forced;

impl RandomSource for Forced {
    fn next_unit(&mut self) -> f64 {
        0.0
    }
}

fn store_in(dir: &Path) -> Store {
    Store::new(&app_paths_in(dir).expect("paths"))
}

fn setup_form() -> SetupForm {
    SetupForm {
        store_name: "Night Market".to_string(),
        table_count: 4,
        language: "en".to_string(),
        currency: Currency::Usd,
    }
}

fn ready_engine(dir: &Path) -> DemoEngine<AppState, Forced> {
    let mut state = AppState::load(store_in(dir), Some(IDLE_MS));
    assert!(state.complete_setup(setup_form()));
    let mut engine = DemoEngine::new(state, Forced, DemoConfig::default()).expect("engine");
    engine.start(0);
    engine
}

#[test]
fn demo_purchases_go_through_the_real_cart_and_vanish_on_input() {
    let temp = tempfile::tempdir().expect("tempdir");
    store_in(temp.path())
        .save_products(&[
            Product {
                id: ProductId(1),
                name: "Neon Burger".to_string(),
                price_cents: 1_250,
                category: "Food".to_string(),
            },
            Product {
                id: ProductId(2),
                name: "Cyber Fries".to_string(),
                price_cents: 500,
                category: "Food".to_string(),
            },
        ])
        .expect("seed products");
    let mut engine = ready_engine(temp.path());

    engine.advance_to(IDLE_MS + 3 * 1_200);
    assert_eq!(engine.host().cart_quantities(), vec![(ProductId(1), 3)]);
    assert_eq!(engine.host().totals().subtotal_cents, 3_750);
    let info = engine.session_info().expect("running");
    assert_eq!(info.phrase_advances, (3 * 1_200) / 4_000);

    let report = engine
        .on_user_signal(UserSignal::KeyPress, IDLE_MS + 3_700)
        .expect("demo was running");
    assert_eq!(report.reason, StopReason::UserSignal);

    engine.host_mut().request_payment();
    assert_eq!(
        engine.host().dialog().map(|dialog| dialog.message.as_str()),
        Some("Cart is empty!")
    );
}

#[test]
fn demo_waits_for_setup_to_finish() {
    let temp = tempfile::tempdir().expect("tempdir");
    let state = AppState::load(store_in(temp.path()), Some(IDLE_MS));
    let mut engine = DemoEngine::new(state, Forced, DemoConfig::default()).expect("engine");
    engine.start(0);

    engine.advance_to(10 * IDLE_MS);
    assert_eq!(engine.phase(), DirectorPhase::Idle);
    assert_eq!(engine.sessions_started(), 0);
    assert!(engine.is_idle_armed());

    assert!(engine.host_mut().complete_setup(setup_form()));
    engine.on_user_signal(UserSignal::KeyPress, 10 * IDLE_MS);
    engine.advance_to(11 * IDLE_MS);
    assert_eq!(engine.phase(), DirectorPhase::Running { scene_index: 0 });
}

#[test]
fn demo_start_closes_an_abandoned_dialog_and_resets_the_tab() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut engine = ready_engine(temp.path());
    engine.host_mut().set_category_filter(CategoryFilter::only("Drinks"));
    engine.host_mut().request_factory_reset();
    assert!(engine.host().dialog().is_some());

    engine.advance_to(IDLE_MS);
    assert!(engine.is_demo_active());
    assert!(engine.host().dialog().is_none());

    engine.on_user_signal(UserSignal::Click, IDLE_MS + 100);
    assert_eq!(engine.host().active_category(), CategoryFilter::All);
    assert!(engine.host().is_setup_complete());
}

#[test]
fn demo_activity_never_reaches_disk() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut engine = ready_engine(temp.path());
    let products_before = fs::read_to_string(temp.path().join("products.json")).expect("products");

    engine.advance_to(IDLE_MS + 20_000);
    assert!(engine.sessions_started() >= 1);
    engine.on_user_signal(UserSignal::KeyPress, IDLE_MS + 20_000);

    let products_after = fs::read_to_string(temp.path().join("products.json")).expect("products");
    assert_eq!(products_before, products_after);
    let mut names: Vec<String> = fs::read_dir(temp.path())
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["products.json", "settings.json"]);
}

#[test]
fn factory_reset_sends_the_demo_back_to_waiting_for_setup() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut engine = ready_engine(temp.path());
    engine.host_mut().request_factory_reset();
    engine.host_mut().confirm_dialog();
    engine.on_user_signal(UserSignal::KeyPress, 0);

    engine.advance_to(5 * IDLE_MS);
    assert_eq!(engine.sessions_started(), 0);
    assert!(!engine.host().is_setup_complete());
    assert_eq!(engine.host().catalog().products().len(), 5);
}
