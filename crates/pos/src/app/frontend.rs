use std::fmt::Display;
use std::io::Write;

use nexus_engine::{
    BeatTarget, DemoEngine, DemoView, DirectorPhase, Frontend, LoopControl, MetricsHandle,
    PosHost, RandomSource, Stage,
};
use tracing::{debug, warn};

use super::commands::{CommandRegistry, PosCommand};
use super::pos::{AppState, ConfirmOutcome, Dialog, DialogKind};

/// Line-oriented point-of-sale screen on a text stream.
///
/// Typed lines are commands; everything the demo does to the shared view is
/// printed as it changes.
pub(crate) struct TerminalFrontend<W> {
    out: W,
    registry: CommandRegistry,
    metrics: MetricsHandle,
    last_view: DemoView,
    last_dialog: Option<Dialog>,
    write_failed: bool,
}

impl<W: Write> TerminalFrontend<W> {
    pub(crate) fn new(out: W, metrics: MetricsHandle) -> Self {
        Self {
            out,
            registry: CommandRegistry::with_builtins(),
            metrics,
            last_view: DemoView::default(),
            last_dialog: None,
            write_failed: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }

    /// Store banner, or the setup prompt while setup is pending.
    pub(crate) fn splash(&mut self, state: &AppState) {
        if state.is_setup_complete() {
            let settings = state.settings();
            self.emit(format!("=== {} ===", settings.store_name));
            self.emit(format!(
                "{} tables | {} | type 'help' for commands",
                settings.table_count, settings.currency
            ));
        } else {
            self.emit("=== NEXUS POS setup ===");
            self.emit("setup <store_name> <tables> <language> <currency:usd|php|eur|jpy>");
        }
    }

    fn emit(&mut self, line: impl Display) {
        if let Err(error) = writeln!(self.out, "{line}") {
            if !self.write_failed {
                warn!(error = %error, "frontend_write_failed");
                self.write_failed = true;
            }
        }
    }

    fn run_command<R: RandomSource>(
        &mut self,
        engine: &mut DemoEngine<AppState, R>,
        command: PosCommand,
    ) -> LoopControl {
        match command {
            PosCommand::Help => {
                for line in self.registry.help_lines() {
                    self.emit(line);
                }
            }
            PosCommand::Products => self.print_products(engine.host()),
            PosCommand::Tab { filter } => {
                let filter = engine
                    .host()
                    .category_tabs()
                    .into_iter()
                    .find(|tab| tab.label().eq_ignore_ascii_case(filter.label()))
                    .unwrap_or(filter);
                engine.host_mut().set_category_filter(filter);
                self.print_products(engine.host());
            }
            PosCommand::Add { product_id } => {
                let state = engine.host_mut();
                if state.catalog().get(product_id).is_none() {
                    self.emit(format!("error: no product #{product_id}"));
                } else {
                    state.add_to_cart(product_id);
                    self.print_cart(engine.host());
                }
            }
            PosCommand::Qty { product_id, delta } => {
                if engine.host_mut().adjust_quantity(product_id, delta) {
                    self.print_cart(engine.host());
                } else {
                    self.emit(format!("error: product #{product_id} is not in the cart"));
                }
            }
            PosCommand::Cart => self.print_cart(engine.host()),
            PosCommand::Table { table } => {
                let state = engine.host_mut();
                state.select_table(table);
                match state.selected_table() {
                    Some(table) => self.emit(format!("table: {table}")),
                    None if table == 0 => self.emit("table: none"),
                    None => {}
                }
            }
            PosCommand::Pay => engine.host_mut().request_payment(),
            PosCommand::Confirm => match engine.host_mut().confirm_dialog() {
                ConfirmOutcome::Nothing => {}
                ConfirmOutcome::PaymentSent { table, total_cents } => {
                    let total = engine.host().format_money(total_cents);
                    self.emit(format!("ticket: table {table} paid {total}"));
                }
                ConfirmOutcome::FactoryReset => {
                    self.emit("factory reset complete");
                    self.splash(engine.host());
                }
            },
            PosCommand::Cancel => {
                if !engine.host_mut().cancel_dialog() {
                    self.emit("no dialog open");
                }
            }
            PosCommand::Setup { form } => {
                if engine.host_mut().complete_setup(form) {
                    self.splash(engine.host());
                }
            }
            PosCommand::NewProduct { draft } => {
                if let Some(id) = engine.host_mut().add_product(&draft) {
                    if let Some(product) = engine.host().catalog().get(id) {
                        let price = engine.host().format_money(product.price_cents);
                        self.emit(format!(
                            "added #{} {} {} [{}]",
                            product.id, product.name, price, product.category
                        ));
                    }
                }
            }
            PosCommand::Reset => engine.host_mut().request_factory_reset(),
            PosCommand::Status => self.print_status(engine),
            PosCommand::Quit => return LoopControl::Exit,
        }
        self.report_dialog(engine.host());
        LoopControl::Continue
    }

    fn print_products(&mut self, state: &AppState) {
        let active = state.active_category();
        let tabs = state
            .category_tabs()
            .iter()
            .map(|tab| {
                if *tab == active {
                    format!("[{tab}]")
                } else {
                    tab.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        self.emit(format!("tabs: {tabs}"));
        for product in state.list_products(&active) {
            let price = state.format_money(product.price_cents);
            self.emit(format!(
                "  #{} {} {} [{}]",
                product.id, product.name, price, product.category
            ));
        }
    }

    fn print_cart(&mut self, state: &AppState) {
        if state.cart().is_empty() {
            self.emit("cart: empty");
            return;
        }
        let lines = state
            .cart()
            .lines()
            .iter()
            .map(|line| {
                format!(
                    "  {} x{} {}",
                    line.name,
                    line.qty,
                    state.format_money(line.line_total_cents())
                )
            })
            .collect::<Vec<_>>();
        self.emit("cart:");
        for line in lines {
            self.emit(line);
        }
        let totals = state.totals();
        self.emit(format!(
            "subtotal {} | tax {} | total {}",
            state.format_money(totals.subtotal_cents),
            state.format_money(totals.tax_cents),
            state.format_money(totals.total_cents)
        ));
        match state.selected_table() {
            Some(table) => self.emit(format!("table: {table}")),
            None => self.emit("table: none"),
        }
    }

    fn print_status<R: RandomSource>(&mut self, engine: &DemoEngine<AppState, R>) {
        match engine.phase() {
            DirectorPhase::Idle => {
                let remaining = engine
                    .idle_deadline_ms()
                    .map(|deadline| deadline.saturating_sub(engine.now_ms()));
                match remaining {
                    Some(remaining_ms) => self.emit(format!(
                        "demo: idle, starts in {remaining_ms} ms of inactivity"
                    )),
                    None => self.emit("demo: idle, not armed"),
                }
            }
            DirectorPhase::Running { scene_index } => {
                self.emit(format!("demo: running scene {scene_index}"));
            }
        }
        self.emit(format!(
            "sessions: {} | pending timers: {} | idle timeout: {} ms",
            engine.sessions_started(),
            engine.pending_timers(),
            engine.idle_timeout_ms()
        ));
        let loop_metrics = self.metrics.snapshot();
        self.emit(format!(
            "loop: {:.1} fps | {:.1} timers/s | {:.2} ms busy/frame | demo {:.0}%",
            loop_metrics.frames_per_sec,
            loop_metrics.timer_fires_per_sec,
            loop_metrics.busy_ms_per_frame,
            loop_metrics.demo_share * 100.0
        ));
    }

    fn report_dialog(&mut self, state: &AppState) {
        let current = state.dialog().cloned();
        if current == self.last_dialog {
            return;
        }
        if let Some(dialog) = &current {
            let hint = match dialog.kind {
                DialogKind::Alert => "cancel to dismiss",
                DialogKind::Confirm(_) => "confirm | cancel",
            };
            self.emit(format!("[{}] {} ({hint})", dialog.title, dialog.message));
        }
        self.last_dialog = current;
    }

    fn report_view_changes(&mut self, state: &AppState, view: &DemoView) {
        if *view == self.last_view {
            return;
        }
        let previous = std::mem::replace(&mut self.last_view, view.clone());

        if view.overlay_visible && !previous.overlay_visible {
            self.emit("== demo mode: touch any key to take over ==");
        }
        if view.overlay_visible && view.stage != previous.stage {
            self.emit(format!("-- {} --", stage_label(view.stage)));
        }
        let headline_revealed = view.headline_visible
            && (view.reveal_generation != previous.reveal_generation
                || !previous.headline_visible);
        if view.overlay_visible && headline_revealed {
            self.emit(format!("  >> {} / {}", view.headline, view.subline));
        }
        if let Some(product_id) = view.pressed_product {
            if previous.pressed_product != Some(product_id) {
                let name = state
                    .catalog()
                    .get(product_id)
                    .map_or("?", |product| product.name.as_str());
                self.emit(format!(
                    "  * tap {name} (cart {} items)",
                    state.cart_item_count()
                ));
            }
        }
        if view.pulsed == Some(BeatTarget::PayButton) && previous.pulsed != view.pulsed {
            self.emit("  * PAY");
        }
        if !view.overlay_visible && previous.overlay_visible {
            self.emit("== demo ended ==");
        }
        debug!(
            overlay = view.overlay_visible,
            stage = ?view.stage,
            reveal_generation = view.reveal_generation,
            "frontend_view_changed"
        );
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Hidden => "hidden",
        Stage::Simulation => "live simulation",
        Stage::IconStage => "rhythm",
        Stage::TextOnly => "showcase",
    }
}

impl<W: Write, R: RandomSource> Frontend<AppState, R> for TerminalFrontend<W> {
    type Command = String;

    fn handle_command(
        &mut self,
        engine: &mut DemoEngine<AppState, R>,
        command: String,
        _now_ms: u64,
    ) -> LoopControl {
        // The loop has already interrupted any demo; report that first.
        self.report_view_changes(engine.host(), engine.view());

        match self.registry.parse_line(&command) {
            Ok(Some(command)) => self.run_command(engine, command),
            Ok(None) => LoopControl::Continue,
            Err(message) => {
                self.emit(message);
                LoopControl::Continue
            }
        }
    }

    fn present(&mut self, engine: &DemoEngine<AppState, R>, _now_ms: u64) {
        self.report_view_changes(engine.host(), engine.view());
        self.report_dialog(engine.host());
    }
}

#[cfg(test)]
mod tests {
    use nexus_engine::{app_paths_in, DemoConfig, StdRandom, UserSignal};

    use super::*;
    use crate::app::pos::Store;

    type TestEngine = DemoEngine<AppState, StdRandom>;

    fn engine_in(dir: &std::path::Path) -> TestEngine {
        let store = Store::new(&app_paths_in(dir).expect("paths"));
        let state = AppState::load(store, Some(1_000));
        DemoEngine::new(state, StdRandom::seeded(7), DemoConfig::default()).expect("engine")
    }

    fn output(frontend: TerminalFrontend<Vec<u8>>) -> String {
        String::from_utf8(frontend.into_inner()).expect("utf8")
    }

    fn send(frontend: &mut TerminalFrontend<Vec<u8>>, engine: &mut TestEngine, line: &str) -> LoopControl {
        let now_ms = engine.now_ms();
        engine.on_user_signal(UserSignal::KeyPress, now_ms);
        frontend.handle_command(engine, line.to_string(), now_ms)
    }

    #[test]
    fn splash_prompts_for_setup_until_it_is_done() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut engine = engine_in(temp.path());
        let mut frontend = TerminalFrontend::new(Vec::new(), MetricsHandle::default());

        frontend.splash(engine.host());
        send(&mut frontend, &mut engine, "setup \"Night Market\" 4 en usd");

        let text = output(frontend);
        assert!(text.contains("=== NEXUS POS setup ==="));
        assert!(text.contains("=== Night Market ==="));
        assert!(text.contains("4 tables | USD"));
    }

    #[test]
    fn ordering_flow_prints_cart_dialogs_and_success() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut engine = engine_in(temp.path());
        let mut frontend = TerminalFrontend::new(Vec::new(), MetricsHandle::default());

        for line in ["add 1", "add 2", "pay", "cancel", "table 2", "pay", "confirm"] {
            assert_eq!(send(&mut frontend, &mut engine, line), LoopControl::Continue);
        }

        let text = output(frontend);
        assert!(text.contains("subtotal $17.50 | tax $0.88 | total $18.38"));
        assert!(text.contains("[Table Required] Select a Table (cancel to dismiss)"));
        assert!(text.contains("[Confirm Payment] Process $18.38 for Table 2? (confirm | cancel)"));
        assert!(text.contains("[Success] Sent to Kitchen (Table 2)."));
        assert!(engine.host().cart().is_empty());
    }

    #[test]
    fn parse_errors_and_unknown_products_are_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut engine = engine_in(temp.path());
        let mut frontend = TerminalFrontend::new(Vec::new(), MetricsHandle::default());

        send(&mut frontend, &mut engine, "add");
        send(&mut frontend, &mut engine, "add 99");
        send(&mut frontend, &mut engine, "qty 3 1");

        let text = output(frontend);
        assert!(text.contains("error: expected exactly one argument <product_id>. usage: add <product_id>"));
        assert!(text.contains("error: no product #99"));
        assert!(text.contains("error: product #3 is not in the cart"));
    }

    #[test]
    fn tab_switch_lists_only_that_category() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut engine = engine_in(temp.path());
        let mut frontend = TerminalFrontend::new(Vec::new(), MetricsHandle::default());

        send(&mut frontend, &mut engine, "tab drinks");

        assert_eq!(
            engine.host().active_category(),
            nexus_engine::CategoryFilter::only("Drinks")
        );
        let text = output(frontend);
        assert!(text.contains("tabs: All Food [Drinks] Dessert"));
        assert!(text.contains("#4 Void Coffee $4.00 [Drinks]"));
        assert!(!text.contains("Neon Burger"));
    }

    #[test]
    fn quit_asks_the_loop_to_exit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut engine = engine_in(temp.path());
        let mut frontend = TerminalFrontend::new(Vec::new(), MetricsHandle::default());
        assert_eq!(send(&mut frontend, &mut engine, "quit"), LoopControl::Exit);
    }

    #[test]
    fn demo_start_and_interruption_are_printed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut engine = engine_in(temp.path());
        let mut frontend = TerminalFrontend::new(Vec::new(), MetricsHandle::default());
        send(&mut frontend, &mut engine, "setup Cafe 4 en usd");

        engine.start(0);
        engine.advance_to(1_000);
        frontend.present(&engine, 1_000);
        assert!(engine.is_demo_active());

        engine.advance_to(5_000);
        frontend.present(&engine, 5_000);
        send(&mut frontend, &mut engine, "status");
        assert!(!engine.is_demo_active());

        let text = output(frontend);
        let started = text.find("== demo mode").expect("demo start printed");
        let ended = text.find("== demo ended ==").expect("demo end printed");
        assert!(started < ended);
        assert!(text.contains("-- live simulation --"));
        assert!(text.contains(">> ULTRA FAST / Instant Touch Response"));
        assert!(text.contains("demo: idle, starts in 1000 ms of inactivity"));
    }
}
