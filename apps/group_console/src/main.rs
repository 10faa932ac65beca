use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
    thread,
};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::HttpGroupApi;
use crossbeam_channel::{bounded, select, Receiver};
use tracing_subscriber::EnvFilter;

mod backend_bridge;
mod config;
mod controller;
mod ui;

use backend_bridge::commands::BackendCommand;
use config::{load_settings, Settings};
use controller::{
    events::{Notice, UiEvent},
    session::{GroupSession, SessionOptions},
};
use ui::{
    console::{self, Flow},
    view::render_session,
};

#[derive(Parser, Debug)]
#[command(about = "Manage device groups against a remote device platform")]
struct Args {
    /// TOML settings file (defaults to ./group_console.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long)]
    page_size: Option<u32>,
}

impl Args {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.base_url {
            settings.base_url = v;
        }
        if let Some(v) = self.token {
            settings.access_token = Some(v);
        }
        if let Some(v) = self.page_size.filter(|v| *v > 0) {
            settings.page_size = v;
        }
    }
}

enum Input {
    Event(UiEvent),
    Line(String),
    Closed,
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    let mut settings = load_settings(args.config.take().as_deref())?;
    args.apply(&mut settings);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let api = HttpGroupApi::new(&settings.base_url)
        .with_context(|| format!("invalid base url '{}'", settings.base_url))?
        .with_access_token(settings.access_token.clone());
    tracing::info!(base_url = %api.base_url(), "starting group console");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (worker, ui_rx) = backend_bridge::runtime::launch(Arc::new(api), cmd_rx);

    let mut session = GroupSession::mount(cmd_tx, SessionOptions::from(&settings));
    let line_rx = spawn_stdin_reader();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", console::HELP)?;

    loop {
        let input = select! {
            recv(ui_rx) -> event => event.map(Input::Event).unwrap_or(Input::Closed),
            recv(line_rx) -> line => line.map(Input::Line).unwrap_or(Input::Closed),
        };
        match input {
            Input::Closed => break,
            Input::Event(event) => {
                session.apply(event);
                print_notices(&mut out, &mut session)?;
                if !session.busy() {
                    write!(out, "{}", render_session(&session))?;
                }
            }
            Input::Line(line) if line.trim().is_empty() => {}
            Input::Line(line) => {
                let flow = match console::parse(&line) {
                    Ok(command) => console::run(&mut session, command),
                    Err(err) => Flow::Print(err.to_string()),
                };
                match flow {
                    Flow::Quit => break,
                    Flow::Print(text) => writeln!(out, "{text}")?,
                    Flow::Continue => {}
                }
                print_notices(&mut out, &mut session)?;
                write!(out, "{}", render_session(&session))?;
            }
        }
        out.flush()?;
    }

    // Dropping the session closes the command queue so the worker can exit.
    drop(session);
    if worker.join().is_err() {
        tracing::warn!("backend worker panicked during shutdown");
    }
    Ok(())
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = bounded::<String>(64);
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_notices(out: &mut impl Write, session: &mut GroupSession) -> io::Result<()> {
    for notice in session.take_notices() {
        match notice {
            Notice::Success(text) => writeln!(out, "ok: {text}")?,
            Notice::Error(text) => writeln!(out, "error: {text}")?,
        }
    }
    Ok(())
}
