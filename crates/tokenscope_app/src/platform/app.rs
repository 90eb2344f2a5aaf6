use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use tokenscope_client::{DispatchSettings, Dispatcher, ReqwestDispatcher};
use tokenscope_core::{
    describe_tokenizer, update, AppState, AppViewModel, Msg, Phase, TokenizerChoice,
};
use tokenscope_logging::{scope_info, scope_warn};

use super::cli::{Cli, Command};
use super::effects::{map_failure, EffectRunner};
use super::input::{parse_line, InputCommand, HELP};
use super::{logging, ui};

pub enum AppEvent {
    /// Message for the core state machine.
    Core(Msg),
    /// Parsed line from stdin.
    Input(InputCommand),
    /// Stdin reached end of file.
    InputClosed,
}

pub fn run_app() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.log_level).context("initializing logger")?;
    let settings = cli.dispatch_settings();
    scope_info!(
        "tokenscope starting base_url={} deadline_ms={}",
        settings.base_url,
        settings.deadline.as_millis()
    );

    match cli.command() {
        Command::Tokenize { text, tokenizer } => run_once(settings, text, tokenizer),
        Command::Interactive { tokenizer } => run_interactive(settings, tokenizer),
        Command::Health => run_health(settings),
        Command::Tokenizers => run_tokenizers(settings),
    }
}

/// Owns the UI state and applies messages to it, the way a UI event handler
/// would: update, run effects, re-render when dirty.
struct Controller {
    state: AppState,
    runner: EffectRunner,
}

impl Controller {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.enqueue(effects);
        let was_dirty = state.consume_dirty();
        let view = state.view();
        self.state = state;
        if was_dirty {
            print_view(&view);
        }
    }

    fn is_idle(&self) -> bool {
        self.state.phase() == Phase::Idle
    }
}

fn print_view(view: &AppViewModel) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in ui::render::render(view) {
        let _ = writeln!(out, "{line}");
    }
    let _ = out.flush();
}

fn run_once(
    settings: DispatchSettings,
    text: String,
    tokenizer: TokenizerChoice,
) -> anyhow::Result<ExitCode> {
    let (event_tx, event_rx) = mpsc::channel();
    let runner = EffectRunner::new(settings, event_tx).context("starting tokenizer client")?;
    let state = submit_once(runner, &event_rx, AppState::with_tokenizer(tokenizer), text);
    if state.view().error.is_some() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Runs one submit cycle and returns the settled state.
fn submit_once(
    runner: EffectRunner,
    event_rx: &mpsc::Receiver<AppEvent>,
    state: AppState,
    text: String,
) -> AppState {
    let mut controller = Controller { state, runner };

    controller.dispatch(Msg::TextChanged(text));
    controller.dispatch(Msg::Submitted);
    while !controller.is_idle() {
        match event_rx.recv() {
            Ok(AppEvent::Core(msg)) => controller.dispatch(msg),
            Ok(_) => {}
            Err(_) => break,
        }
    }
    controller.state
}

fn run_interactive(
    settings: DispatchSettings,
    tokenizer: TokenizerChoice,
) -> anyhow::Result<ExitCode> {
    let (event_tx, event_rx) = mpsc::channel();
    let runner =
        EffectRunner::new(settings, event_tx.clone()).context("starting tokenizer client")?;
    let mut controller = Controller {
        state: AppState::with_tokenizer(tokenizer),
        runner,
    };

    println!("{HELP}");
    print_view(&controller.state.view());
    spawn_stdin_reader(event_tx);

    let mut input_closed = false;
    while let Ok(event) = event_rx.recv() {
        match event {
            AppEvent::Core(msg) => controller.dispatch(msg),
            AppEvent::Input(InputCommand::Submit(text)) => {
                controller.dispatch(Msg::TextChanged(text));
                controller.dispatch(Msg::Submitted);
            }
            AppEvent::Input(InputCommand::SelectTokenizer(choice)) => {
                controller.dispatch(Msg::TokenizerChanged(choice));
            }
            AppEvent::Input(InputCommand::Help) => println!("{HELP}"),
            AppEvent::Input(InputCommand::Quit) => break,
            AppEvent::InputClosed => input_closed = true,
        }
        // Piped input: finish the last request before exiting.
        if input_closed && controller.is_idle() {
            break;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn spawn_stdin_reader(event_tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    scope_warn!("stdin read failed: {}", err);
                    break;
                }
            };
            match parse_line(&line) {
                Ok(command) => {
                    if event_tx.send(AppEvent::Input(command)).is_err() {
                        return;
                    }
                }
                Err(err) => eprintln!("{err}"),
            }
        }
        let _ = event_tx.send(AppEvent::InputClosed);
    });
}

fn block_on_dispatcher<T, F, Fut>(settings: DispatchSettings, call: F) -> anyhow::Result<T>
where
    F: FnOnce(ReqwestDispatcher) -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let dispatcher = ReqwestDispatcher::new(settings).context("invalid client settings")?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    Ok(runtime.block_on(call(dispatcher)))
}

fn run_health(settings: DispatchSettings) -> anyhow::Result<ExitCode> {
    let base_url = settings.base_url.clone();
    let result =
        block_on_dispatcher(settings, |dispatcher| async move { dispatcher.health().await })?;
    match result {
        Ok(health) => {
            println!("{base_url}: {} ({})", health.status, health.message);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("error: {}", map_failure(err).message());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_tokenizers(settings: DispatchSettings) -> anyhow::Result<ExitCode> {
    let result = block_on_dispatcher(settings, |dispatcher| async move {
        dispatcher.list_tokenizers().await
    })?;
    match result {
        Ok(listing) => {
            for id in &listing.tokenizers {
                println!("{id:<20} {}", describe_tokenizer(id));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("error: {}", map_failure(err).message());
            Ok(ExitCode::FAILURE)
        }
    }
}
