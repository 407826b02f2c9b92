use std::io::Write as _;

use anyhow::Context as _;
use clap::Parser as _;
use directories::ProjectDirs;
use storyshelf_application::BrowseSession;
use storyshelf_core::Settings;
use storyshelf_storage::{DataSource, SettingsFile, load_catalog_or_empty};
use storyshelf_ui::{Ui, UiExit};

mod cli;
mod commands;
mod logging;

use cli::{Cli, Command, Overrides};
use logging::LogTarget;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Browse);

    let project_dirs =
        ProjectDirs::from("dev", "storyshelf", "storyshelf").context("resolve project dirs")?;

    let log_target = match command {
        Command::Browse => LogTarget::File(project_dirs.data_local_dir().join("storyshelf.log")),
        _ => LogTarget::Stderr,
    };
    // A log file we cannot open must not keep the catalog from loading.
    if let Err(err) = logging::init(&log_target) {
        eprintln!("storyshelf: logging disabled: {err:#}");
    }
    tracing::debug!(?command, "parsed cli");

    let settings_path = cli
        .overrides
        .settings
        .clone()
        .unwrap_or_else(|| project_dirs.config_dir().join("settings.json"));
    let settings = apply_overrides(SettingsFile::new(settings_path).load(), &cli.overrides);

    let source = DataSource::parse(&settings.data_source);
    let catalog = load_catalog_or_empty(&source);
    let session = BrowseSession::new(settings).with_catalog(catalog);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Browse => {
            drop(out);
            browse(session)?;
        }
        Command::List(args) => {
            commands::list(session, &args.query, &args.category, args.page, &mut out)?;
        }
        Command::Updates(args) => commands::updates(&session, args.limit, &mut out)?,
        Command::Categories => commands::categories(&session, &mut out)?,
        Command::Show { id } => commands::show(&session, &id, &mut out)?,
        Command::Link { id, chapter } => commands::link(&session, &id, &chapter, &mut out)?,
    }

    Ok(())
}

fn apply_overrides(mut settings: Settings, overrides: &Overrides) -> Settings {
    if let Some(data) = &overrides.data {
        settings.data_source = data.clone();
    }
    if let Some(page_size) = overrides.page_size {
        settings.page_size = page_size;
    }
    if let Some(reader_base) = &overrides.reader_base {
        settings.reader_base = reader_base.clone();
    }
    if let Some(open_command) = &overrides.open_command {
        settings.open_command = Some(open_command.clone());
    }
    if let Some(theme) = overrides.theme {
        settings.theme = theme;
    }
    settings.normalize();
    settings
}

/// Runs the terminal UI. A chosen chapter without an open command is printed
/// so the URL can be piped to an opener.
fn browse(session: BrowseSession) -> anyhow::Result<()> {
    let mut ui = Ui::new(session);
    let outcome = ui.run()?;

    match outcome.exit {
        UiExit::Quit => {}
        UiExit::Read(link) => {
            let url = link.to_url(&outcome.ctx.settings.reader_base);
            tracing::info!(url = %url, "reader hand-off");
            let mut out = std::io::stdout().lock();
            writeln!(out, "{url}").context("write reader url")?;
        }
    }

    Ok(())
}
