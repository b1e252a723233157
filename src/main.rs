mod cleaner;
mod config;
mod constants;
mod entry;
mod error;
mod events;
mod files;
mod installed;
mod logging;
mod model;
mod paths;
mod preferences;
mod scanner;
mod ui;

use anyhow::Result;
use clap::Parser;
use config::Config;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use events::ScanEvent;
use files::XcodeFiles;
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use model::{Location, ScanScope};
use paths::XcodePaths;
use preferences::Preferences;
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use ui::app::App;

#[derive(Parser)]
#[command(version, about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Print the scanned trees and totals instead of starting the UI
    #[arg(long)]
    list: bool,

    /// Only scan one location (device-support, derived-data, archives, simulators)
    #[arg(short, long)]
    location: Option<Location>,

    /// Use this directory instead of ~/Library/Developer
    #[arg(long)]
    developer_dir: Option<PathBuf>,

    /// Where to look for installed Xcode bundles
    #[arg(long)]
    applications_dir: Option<PathBuf>,

    /// Move deleted entries to the Trash
    #[arg(long)]
    trash: bool,

    /// Read settings from this file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write debug logs
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn scope(&self) -> ScanScope {
        self.location.map_or(ScanScope::All, ScanScope::Single)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.developer_dir {
            config.developer_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.applications_dir {
            config.applications_dir = Some(dir.clone());
        }
        if self.trash {
            config.move_to_trash = true;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init_logger(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let paths = match XcodePaths::resolve(&config) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let files = XcodeFiles::new(paths, config);

    if cli.list {
        return run_list(files, cli.scope());
    }

    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(files, Preferences::load(), cli.scope());
    app.start_installed_check();
    app.start_scan();

    let res = ui::run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_list(mut files: XcodeFiles, scope: ScanScope) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {wide_msg}")?
            .tick_strings(&[".  ", ".. ", "...", " ..", "  .", "   "]),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    pb.println(format!(
        "Developer directory: {}",
        files.paths().developer().display()
    ));
    let task = files.scan_files(scope);
    for event in task.events.iter() {
        match &event {
            ScanEvent::WillBegin { location, .. } => {
                pb.set_message(format!("Scanning {location}..."));
            }
            ScanEvent::DidFinish { location, root } => {
                pb.println(format!(
                    "{location}: {}",
                    format_size(root.total_size(), BINARY)
                ));
            }
            ScanEvent::BatchWillBegin | ScanEvent::BatchDidFinish => {}
        }
        files.absorb(event);
    }
    let complete = task.finish();
    pb.finish_and_clear();
    if !complete {
        eprintln!("The scan stopped early; some locations are missing.");
    }

    let installed = installed::detect_installed_xcodes(&files.config().applications_dir());
    files.set_installed(installed);
    if files.installed().is_empty() {
        println!("No installed Xcode found");
    }
    for version in files.installed() {
        println!("{version} at {}", version.app_path.display());
    }
    println!();

    for (_, tree) in files.trees() {
        println!("{}", tree.debug_representation());
        if tree.skipped() > 0 {
            println!("  ({} unreadable path(s) skipped)", tree.skipped());
        }
    }

    println!(
        "Total: {} | Selected by default: {} | Unreadable paths skipped: {}",
        format_size(files.total_size(), BINARY),
        format_size(files.selected_size(), BINARY),
        files.skipped()
    );
    Ok(())
}
