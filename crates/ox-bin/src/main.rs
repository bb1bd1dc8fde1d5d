//! Entry point: CLI parsing, option/keymap/file bootstrap, and the pager's
//! async event loop.

mod highlight;
mod history;
mod keymap;
mod open;
mod options;

use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use core_actions::{CompiledSearch, NavCommand};
use core_cache::FileId;
use core_config::Triple;
use core_events::{Event, EventSourceRegistry, EVENT_CHANNEL_CAP, SigFlags, Sigs, TickEventSource};
use core_input::signals;
use core_model::{CommandOutcome, DispatchOutcome, PagerContext};
use core_render::render_engine::RenderEngine;
use core_render::scheduler::RenderDelta;
use core_render::viewport::DisplayRow;
use core_terminal::{CrosstermBackend, MouseMode, set_mouse_capture, terminal_size};
use core_text::{Cell, CellAttr, Output};
use tracing::info;

/// A terminal pager: page through a file (or standard input) a screen at a
/// time, search it, and filter it, without loading it all into memory.
#[derive(Parser, Debug)]
#[command(name = "oxidized", version, about = "Page through text one screen at a time.")]
struct Args {
    /// Files to page through; reads standard input if none are given.
    files: Vec<PathBuf>,

    /// Ignore case in searches.
    #[arg(short = 'i')]
    ignore_case: bool,
    /// Ignore case in searches, even when the pattern has uppercase letters.
    #[arg(short = 'I')]
    ignore_case_plus: bool,
    /// Show line numbers in the left margin.
    #[arg(short = 'N')]
    line_numbers: bool,
    /// Chop long lines instead of wrapping them.
    #[arg(short = 'S')]
    chop_long_lines: bool,
    /// Tab stop width.
    #[arg(short = 'x')]
    tabs: Option<i64>,
    /// Quit automatically at end-of-file.
    #[arg(short = 'e')]
    quit_at_eof: bool,
    /// Quit immediately if the content fits on one screen.
    #[arg(short = 'F')]
    quit_if_one_screen: bool,
    /// Copy input to, or read input from, a log file.
    #[arg(short = 'o')]
    log_file: Option<String>,
    /// Prompt more verbosely with the long-prompt format.
    #[arg(short = 'm')]
    long_prompt: bool,
    /// Key-binding file to load instead of the default search path.
    #[arg(long)]
    keyfile: Option<String>,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("oxidized.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "oxidized.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(()) => self.log_guard = Some(guard),
            Err(_err) => {
                // Global subscriber already installed (e.g. under a test harness).
            }
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    match run(&mut startup, args).await {
        Ok(code) => std::process::exit(code as i32),
        Err(err) => {
            eprintln!("oxidized: {err:#}");
            std::process::exit(1);
        }
    }
}

fn ignore_case_option(options: &core_config::OptionStore) -> bool {
    options.get('i').ok().and_then(|v| v.as_triple()).map(|t| t != Triple::Off).unwrap_or(false)
}

async fn run(startup: &mut AppStartup, args: Args) -> Result<u8> {
    let mut store = core_config::default_options();
    options::apply_disk_config(&mut store);
    options::apply_env_options(&mut store);
    options::apply_cli_options(&mut store, &args);
    store.run_init_handlers();

    let max_buffers =
        store.get('b').ok().and_then(|v| v.as_numeric()).and_then(|n| match n {
            core_config::Numeric::Int(i) => Some(i.max(1) as usize),
            _ => None,
        }).unwrap_or(64);

    let mut ifiles = core_cache::IfileList::new();
    let opened = if let Some(first) = args.files.first() {
        ifiles.open(FileId::Path(first.clone()));
        open::open_path(first, max_buffers)?
    } else {
        ifiles.open(FileId::Stdin);
        open::open_stdin(max_buffers)
    };
    for extra in args.files.iter().skip(1) {
        ifiles.open(FileId::Path(extra.clone()));
    }
    ifiles.jump_to(0);

    let dispatcher = keymap::load_dispatcher(args.keyfile.as_deref());
    let (width, term_height) = terminal_size().context("cannot query terminal size")?;
    let height = (term_height as usize).saturating_sub(1);

    let mut ctx = PagerContext::new(opened.state, ifiles, store, dispatcher, width);
    let history_path = history::history_path();
    let mut history = if let Some(path) = &history_path {
        history::load(path, &mut ctx.marks, &mut ctx.ifiles)
    } else {
        history::History::default()
    };

    ctx.apply(NavCommand::Repaint, width, height)?;

    if ctx.options.get('F').ok().and_then(|v| v.as_bool()).unwrap_or(false)
        && ctx.screen.is_at_eof(ctx.file.length())
        && ctx.ifiles.len() <= 1
    {
        print_plain(ctx.screen.rows());
        open::close_altfile(&opened);
        return Ok(0);
    }

    let mut backend = std::mem::replace(&mut startup.backend, CrosstermBackend::new());
    let _guard = backend.enter_guard()?;
    let _ = set_mouse_capture(MouseMode::On);

    let (tx, mut rx) = tokio::sync::mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (_input_handle, input_shutdown) = core_input::spawn_async_input(tx.clone());
    let _sig_guard = signals::install()?;
    let mut registry = EventSourceRegistry::new();
    registry.register(TickEventSource::new(Duration::from_millis(500)));
    let _tick_handles = registry.spawn_all(&tx);
    drop(tx);

    let mut renderer = RenderEngine::new();
    let mut width = width;
    let mut height = height;
    let mut interrupted_once = false;
    let mut prompt_label: Option<&'static str> = None;

    loop {
        if let Some(decision) = ctx.scheduler.consume() {
            draw(&mut renderer, &ctx, decision.effective, prompt_label, width, height as u16 + 1)?;
        }
        if ctx.quit_code.is_some() {
            break;
        }

        let sigs = SigFlags::drain();
        if sigs.contains(Sigs::TERM) {
            ctx.quit_code = Some(0);
            break;
        }
        if sigs.contains(Sigs::WINCH) {
            if let Ok((w, h)) = terminal_size() {
                width = w;
                height = (h as usize).saturating_sub(1);
                renderer.invalidate_for_resize();
                ctx.apply(NavCommand::Repaint, width, height)?;
            }
        }
        if sigs.contains(Sigs::INTERRUPT) {
            if interrupted_once {
                ctx.quit_code = Some(2);
                break;
            }
            interrupted_once = true;
            ctx.message = Some("Interrupt".to_string());
            ctx.scheduler.mark_status();
        }

        let Some(event) = rx.recv().await else {
            break;
        };
        match event {
            Event::Key(byte) => {
                interrupted_once = false;
                match ctx.feed_byte(byte, width, height)? {
                    DispatchOutcome::Applied(CommandOutcome::Quit) => break,
                    DispatchOutcome::Applied(_) => {
                        maybe_autoquit(&mut ctx);
                    }
                    DispatchOutcome::Event(ev) => {
                        prompt_label = prompt_label_for(&ev);
                        ctx.scheduler.mark_status();
                    }
                    DispatchOutcome::External(cmd) => {
                        prompt_label = None;
                        handle_external(cmd, &mut ctx, &opened, &mut history, width, height)?;
                        maybe_autoquit(&mut ctx);
                    }
                }
            }
            Event::Mouse(bytes) => {
                for b in bytes {
                    if let DispatchOutcome::External(cmd) = ctx.feed_byte(b, width, height)? {
                        handle_external(cmd, &mut ctx, &opened, &mut history, width, height)?;
                    }
                }
            }
            Event::Resize(w, h) => {
                width = w;
                height = (h as usize).saturating_sub(1);
                renderer.invalidate_for_resize();
                ctx.apply(NavCommand::Repaint, width, height)?;
            }
            Event::Tick => {}
            Event::Shutdown => break,
        }
    }

    input_shutdown.signal();
    let _ = set_mouse_capture(MouseMode::Off);
    if let Some(path) = &history_path {
        let _ = history::save(path, &history, &ctx.marks, &ctx.ifiles);
    }
    open::close_altfile(&opened);
    Ok(ctx.quit_code.unwrap_or(0))
}

fn maybe_autoquit(ctx: &mut PagerContext) {
    let quit_at_eof = ctx.options.get('e').ok().and_then(|v| v.as_triple()).map(|t| t != Triple::Off).unwrap_or(false);
    if quit_at_eof && ctx.screen.is_at_eof(ctx.file.length()) {
        ctx.quit_code = Some(0);
    }
}

fn prompt_label_for(event: &core_actions::DispatchEvent) -> Option<&'static str> {
    use core_actions::{DispatchEvent, PromptMode};
    match event {
        DispatchEvent::PromptOpened(mode) => Some(match mode {
            PromptMode::Digit => ":",
            PromptMode::OptToggle => "-",
            PromptMode::Search => "/",
            PromptMode::Filter => "&",
            PromptMode::Bracket => "{",
            PromptMode::SetMark => "m",
            PromptMode::ClrMark => "m-",
            PromptMode::GoMark => "'",
            PromptMode::Pipe => "|",
            PromptMode::Examine => ":e ",
            PromptMode::Shell => "!",
            PromptMode::FirstCmd => "+",
        }),
        _ => None,
    }
}

fn handle_external(
    cmd: NavCommand,
    ctx: &mut PagerContext,
    current: &open::OpenedFile,
    history: &mut history::History,
    width: u16,
    height: usize,
) -> Result<()> {
    match cmd {
        NavCommand::Filter { pattern, modifiers } => {
            let ignore_case = ignore_case_option(&ctx.options);
            match CompiledSearch::compile(&pattern, modifiers, ignore_case) {
                Ok(_) => ctx.message = Some(format!("filtering: {pattern}")),
                Err(err) => ctx.message = Some(err.to_string()),
            }
            ctx.scheduler.mark_status();
        }
        NavCommand::OptionToggle(req) => {
            let quiet = req.quiet;
            let msg = options::apply_toggle_request(&mut ctx.options, &req);
            if !quiet {
                ctx.message = Some(msg);
            }
            ctx.scheduler.mark(RenderDelta::Full);
        }
        NavCommand::Pipe(command) => {
            run_shell(&command);
            history.record_shell(&command);
            ctx.message = Some(format!("piped to: {command}"));
            ctx.scheduler.mark(RenderDelta::Full);
        }
        NavCommand::Examine(path) => {
            history.record_examine(&path);
            let path = PathBuf::from(path);
            match open::open_path(&path, 64) {
                Ok(new_file) => {
                    ctx.ifiles.save_position(ctx.top, ctx.screen.is_at_eof(ctx.file.length()));
                    ctx.ifiles.open(FileId::Path(path));
                    ctx.file = new_file.state;
                    ctx.jump_to_offset(0, height)?;
                }
                Err(err) => ctx.message = Some(err.to_string()),
            }
            ctx.scheduler.mark(RenderDelta::Full);
        }
        NavCommand::Shell(command) => {
            run_shell(&command);
            history.record_shell(&command);
            ctx.scheduler.mark(RenderDelta::Full);
        }
        NavCommand::FirstCmd(command) => {
            for b in command.bytes() {
                let _ = ctx.feed_byte(b, width, height)?;
            }
        }
        NavCommand::MouseSetMark => {
            let idx = ctx.ifiles.current_index().unwrap_or(0);
            ctx.marks.set_previous(idx, ctx.top);
        }
        NavCommand::MouseScroll { forward, lines } => {
            if forward {
                ctx.forward(lines, height)?;
            } else {
                ctx.backward(lines, height)?;
            }
        }
        _ => {}
    }
    let _ = current;
    Ok(())
}

/// Run a command through the user's shell while the terminal is restored to
/// cooked mode, exactly as `!`/`|` do in an interactive session.
fn run_shell(command: &str) {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = std::process::Command::new(shell).arg("-c").arg(command).status();
    let _ = crossterm::terminal::enable_raw_mode();
}

fn decorate_rows(mut rows: Vec<DisplayRow>, show_line_numbers: bool) -> Vec<DisplayRow> {
    if !show_line_numbers {
        return rows;
    }
    for row in &mut rows {
        let label = match row.line_number {
            Some(n) => format!("{n:>6} "),
            None => "       ".to_string(),
        };
        let width = label.chars().count() as u16;
        row.rendered.output.insert(0, Output::Cell(Cell { text: label, width, attr: CellAttr::empty() }));
    }
    rows
}

fn draw(
    renderer: &mut RenderEngine,
    ctx: &PagerContext,
    effective: RenderDelta,
    prompt_label: Option<&str>,
    width: u16,
    term_height: u16,
) -> Result<()> {
    let show_line_numbers = ctx.options.get('N').ok().and_then(|v| v.as_bool()).unwrap_or(false);
    let rows = decorate_rows(ctx.screen.rows().to_vec(), show_line_numbers);

    let search = ctx.last_search().and_then(|(pattern, modifiers)| {
        let ignore_case = ignore_case_option(&ctx.options);
        CompiledSearch::compile(pattern, modifiers, ignore_case).ok()
    });
    let highlights = highlight::build_highlights(&rows, search.as_ref());

    let status_text = match prompt_label {
        Some(label) => label.to_string(),
        None => {
            let file_name = ctx.ifiles.current().map(|e| e.id.display_name());
            ctx.status_line(file_name.as_deref())
        }
    };

    match effective {
        RenderDelta::Full => renderer.render_full(rows, &highlights, &status_text, width, term_height)?,
        RenderDelta::Scroll { old_top, new_top } => {
            let delta = new_top as i32 - old_top as i32;
            renderer.render_scroll(rows, delta, &highlights, &status_text, width, term_height)?
        }
        RenderDelta::StatusOnly => renderer.render_status_only(&status_text, term_height)?,
    }
    Ok(())
}

/// Print displayed rows as plain text to stdout, used by `-F`'s
/// quit-if-one-screen shortcut: the pager never takes over the terminal.
fn print_plain(rows: &[DisplayRow]) {
    use std::io::Write as _;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in rows {
        for cell in &row.rendered.output {
            if let Output::Cell(c) = cell {
                let _ = out.write_all(c.text.as_bytes());
            }
        }
        if row.rendered.ended_in_newline {
            let _ = out.write_all(b"\n");
        }
    }
}
