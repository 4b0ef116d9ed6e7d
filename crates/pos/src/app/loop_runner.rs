use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};
use std::thread;

use nexus_engine::{run_loop, LoopInput, MetricsHandle};
use tracing::{debug, error, info, warn};

use super::bootstrap::AppWiring;
use super::frontend::TerminalFrontend;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { config, mut engine } = app;
    let (sender, receiver) = mpsc::channel();
    if let Err(err) = spawn_stdin_reader(sender) {
        error!(error = %err, "stdin_reader_spawn_failed");
        return ExitCode::FAILURE;
    }

    let metrics = MetricsHandle::default();
    let stdout = io::stdout();
    let mut frontend = TerminalFrontend::new(stdout.lock(), metrics.clone());
    frontend.splash(engine.host());

    let exit = run_loop(&config, &mut engine, &mut frontend, &receiver, &metrics);
    info!(exit = ?exit, "app_exit");
    ExitCode::SUCCESS
}

/// Each stdin line becomes a command; EOF hangs up the channel.
fn spawn_stdin_reader(sender: Sender<LoopInput<String>>) -> io::Result<()> {
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!(error = %err, "stdin_read_failed");
                        break;
                    }
                };
                if sender.send(LoopInput::Command(line)).is_err() {
                    debug!("stdin_reader_loop_gone");
                    return;
                }
            }
            debug!("stdin_closed");
        })
        .map(|_| ())
}
