//! mdview - Markdown document viewer
//!
//! Renders Markdown files into standalone HTML, resolves links the way the
//! viewer does, and drives an interactive navigation session.

#![deny(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use mdview::assets::BundledAssets;
use mdview::controller::ViewerEvent;
use mdview::engine::MarkdownEngine;
use mdview::headless::HeadlessSurface;
use mdview::link_policy::{self, LinkTarget};
use mdview::location::{normalize_path, DocumentLocation};
use mdview::sandbox::{self, AmbientAccess, ConfinedAccess, ReadAccess};
use mdview::session::SystemOpener;
use mdview::{NavigationOrigin, RenderOrchestrator, ViewerConfig, ViewerSession};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main entry point for the mdview CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    let config = ViewerConfig::discover(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Render {
            file,
            output,
            sandbox: confine,
        } => {
            handle_render_command(config, file, output, confine)?;
        }

        Commands::Resolve { link, from } => {
            handle_resolve_command(&link, &from);
        }

        Commands::Browse { file } => {
            handle_browse_command(config, file)?;
        }
    }

    Ok(())
}

/// Handle the render command
fn handle_render_command(config: ViewerConfig, file: PathBuf, output: Option<PathBuf>, confine: bool) -> Result<()> {
    let document = normalize_path(&file);

    if confine {
        let base_directory = document.parent().unwrap_or(&document);
        let mut read_paths = vec![sandbox::find_sandbox_root(base_directory, &config.repository_markers)];
        if let Some(assets_dir) = &config.assets_dir {
            read_paths.push(normalize_path(assets_dir));
        }
        let write_paths: Vec<PathBuf> = output
            .as_deref()
            .map(normalize_path)
            .and_then(|path| path.parent().map(Path::to_path_buf))
            .into_iter()
            .collect();

        let status = sandbox::enter_sandbox(&read_paths, &write_paths).context("Failed to enter sandbox")?;
        log::info!("Sandbox status: {}", status);
    }

    let orchestrator = RenderOrchestrator::from_config(config);
    let payload = orchestrator
        .render(&document)
        .with_context(|| format!("Failed to render {}", document.display()))?;

    for diagnostic in &payload.diagnostics {
        match &diagnostic.resource {
            Some(resource) => eprintln!("warning[{}]: {} ({})", diagnostic.code, diagnostic.message, resource),
            None => eprintln!("warning[{}]: {}", diagnostic.code, diagnostic.message),
        }
    }

    match output {
        Some(path) => {
            std::fs::write(&path, &payload.html)
                .with_context(|| format!("Failed to write HTML to {}", path.display()))?;
            println!("✓ Successfully wrote: {}", path.display());
        }
        None => {
            io::stdout()
                .write_all(payload.html.as_bytes())
                .context("Failed to write HTML to stdout")?;
        }
    }

    Ok(())
}

/// Handle the resolve command
fn handle_resolve_command(link: &str, from: &Path) {
    let current = normalize_path(from);
    match link_policy::classify(link, Some(&current)) {
        LinkTarget::InPageAnchor(anchor) => println!("in-page anchor: #{}", anchor),
        LinkTarget::MarkdownTarget(location) => println!("markdown: {}", location),
        LinkTarget::External(url) => println!("external: {}", url),
        LinkTarget::Blocked => println!("blocked"),
    }
}

/// Handle the browse command
fn handle_browse_command(config: ViewerConfig, file: PathBuf) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let _guard = runtime.enter();

    let confined = if config.allowed_roots.is_empty() {
        None
    } else {
        Some(Arc::new(ConfinedAccess::new(config.allowed_roots.clone())))
    };
    let access: Arc<dyn ReadAccess> = match &confined {
        Some(confined) => Arc::clone(confined) as Arc<dyn ReadAccess>,
        None => Arc::new(AmbientAccess),
    };
    let assets = match &config.assets_dir {
        Some(dir) => BundledAssets::with_directory(dir),
        None => BundledAssets::new(),
    };
    let orchestrator = Arc::new(RenderOrchestrator::new(
        Arc::new(MarkdownEngine::new()),
        Arc::new(assets),
        access,
        config,
    ));

    let mut session = ViewerSession::new(orchestrator, HeadlessSurface::new(), Box::new(SystemOpener));
    session
        .controller_mut()
        .open_from_external_source(DocumentLocation::new(&file));
    settle(&runtime, &mut session);

    println!("Type 'help' for commands");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read command")?;
        let (command, argument) = match line.trim().split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (line.trim(), ""),
        };

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => print_browse_help(),
            "open" => {
                let decision = session.navigation_attempt(argument, NavigationOrigin::LinkActivated);
                log::debug!("Link {} -> {:?}", argument, decision);
            }
            "file" => match DocumentLocation::parse(argument) {
                Ok(location) => session.controller_mut().open_from_external_source(location),
                Err(e) => println!("Cannot open {}: {}", argument, e),
            },
            "back" => session.controller_mut().go_back(),
            "forward" => session.controller_mut().go_forward(),
            "refresh" => session.controller_mut().refresh(),
            "anchor" => session.controller_mut().navigate_to_anchor(argument.trim_start_matches('#')),
            "grant" => match &confined {
                Some(confined) => {
                    confined.grant(&normalize_path(Path::new(argument)));
                    session.controller_mut().folder_access_granted();
                }
                None => println!("Reads are not restricted"),
            },
            "toc" => print_table_of_contents(&session),
            "diagnostics" => print_diagnostics(&session),
            "status" => print_status(&session),
            other => println!("Unknown command '{}'; type 'help'", other),
        }

        settle(&runtime, &mut session);
    }

    Ok(())
}

/// Wait for renders, let the surface finish loading and report what happened
fn settle(runtime: &tokio::runtime::Runtime, session: &mut ViewerSession<HeadlessSurface>) {
    let mut events = runtime.block_on(session.settle());
    events.extend(session.load_completed());
    for event in &events {
        print_event(event);
    }
}

fn print_event(event: &ViewerEvent) {
    match event {
        ViewerEvent::Loading { document } => println!("Loading {}", document.display()),
        ViewerEvent::Displayed { payload, anchor } => {
            println!(
                "✓ Showing {} ({} headings, {} diagnostics)",
                payload.document.display(),
                payload.table_of_contents.len(),
                payload.diagnostics.len()
            );
            if let Some(anchor) = anchor {
                println!("  at #{}", anchor);
            }
        }
        ViewerEvent::Failed {
            document,
            message,
            raw_text,
        } => {
            println!("✗ {}: {}", document.display(), message);
            if let Some(text) = raw_text {
                println!("{}", text);
            }
        }
        ViewerEvent::AnchorRequested(anchor) => println!("Scrolling to #{}", anchor),
        ViewerEvent::HistoryChanged { .. } => {}
        ViewerEvent::FolderAccessNeeded(true) => {
            println!("Local images may be missing; use 'grant <dir>' to allow access")
        }
        ViewerEvent::FolderAccessNeeded(false) => {}
    }
}

fn print_table_of_contents(session: &ViewerSession<HeadlessSurface>) {
    let Some(payload) = session.controller().payload() else {
        println!("No document displayed");
        return;
    };
    for entry in &payload.table_of_contents {
        let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
        println!("{}{} (#{})", indent, entry.title, entry.anchor);
    }
}

fn print_diagnostics(session: &ViewerSession<HeadlessSurface>) {
    let Some(payload) = session.controller().payload() else {
        println!("No document displayed");
        return;
    };
    if payload.diagnostics.is_empty() {
        println!("No diagnostics");
    }
    for diagnostic in &payload.diagnostics {
        println!("{}: {}", diagnostic.code, diagnostic.message);
    }
}

fn print_status(session: &ViewerSession<HeadlessSurface>) {
    let controller = session.controller();
    match controller.current_document() {
        Some(document) => println!("Document: {}", document.display()),
        None => println!("Document: none"),
    }
    println!(
        "History: {} back, {} forward",
        controller.history().back().len(),
        controller.history().forward().len()
    );
    if let Some(anchor) = controller.pending_anchor() {
        println!("Pending anchor: #{}", anchor);
    }
    if controller.needs_folder_access() {
        println!("Folder access needed");
    }
}

fn print_browse_help() {
    println!("Commands:");
    println!("  open <link>     follow a link from the current document");
    println!("  file <path>     open a file, starting a new history");
    println!("  back | forward  move through history");
    println!("  refresh         re-render the current document");
    println!("  anchor <id>     scroll to a heading");
    println!("  grant <dir>     allow reads beneath a directory");
    println!("  toc | diagnostics | status");
    println!("  quit");
}
