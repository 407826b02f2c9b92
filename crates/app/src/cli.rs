use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use storyshelf_core::Theme;

#[derive(Debug, Parser)]
#[command(name = "storyshelf", author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags layered on top of `settings.json`.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Catalog document: a file path or an http(s) URL.
    #[arg(long, global = true)]
    pub data: Option<String>,

    /// Stories per hot grid page.
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Reader page the chapter link points at.
    #[arg(long, global = true)]
    pub reader_base: Option<String>,

    /// Program that opens reader links, e.g. `xdg-open`.
    #[arg(long, global = true)]
    pub open_command: Option<String>,

    /// Accent theme: `light` or `dark`.
    #[arg(long, global = true)]
    pub theme: Option<Theme>,

    /// Settings file to read instead of the one in the config dir.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse the catalog in the terminal (default).
    Browse,
    /// Print one page of the filtered hot list.
    List(ListArgs),
    /// Print stories by most recent update.
    Updates(UpdatesArgs),
    /// Print the distinct categories.
    Categories,
    /// Print the details of one story.
    Show { id: String },
    /// Print the reader URL for one chapter.
    Link { id: String, chapter: String },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Search text matched against titles.
    #[arg(long, short, default_value = "")]
    pub query: String,

    /// Category name, or `__all__`.
    #[arg(long, short, default_value = storyshelf_core::ALL_CATEGORIES)]
    pub category: String,

    #[arg(long, short, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Args)]
pub struct UpdatesArgs {
    /// Print at most this many entries.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_browse() {
        let cli = Cli::try_parse_from(["storyshelf"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "storyshelf",
            "list",
            "--query",
            "kiem",
            "--page-size",
            "5",
            "--data",
            "https://example.com/stories.json",
        ])
        .unwrap();
        assert_eq!(cli.overrides.page_size, Some(5));
        assert_eq!(
            cli.overrides.data.as_deref(),
            Some("https://example.com/stories.json")
        );
        match cli.command {
            Some(Command::List(args)) => {
                assert_eq!(args.query, "kiem");
                assert_eq!(args.category, "__all__");
                assert_eq!(args.page, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn theme_flag_parses_and_rejects_unknown() {
        let cli = Cli::try_parse_from(["storyshelf", "--theme", "Light"]).unwrap();
        assert_eq!(cli.overrides.theme, Some(Theme::Light));
        assert!(Cli::try_parse_from(["storyshelf", "--theme", "sepia"]).is_err());
    }

    #[test]
    fn link_takes_id_and_chapter() {
        let cli = Cli::try_parse_from(["storyshelf", "link", "s1", "Chương 1"]).unwrap();
        match cli.command {
            Some(Command::Link { id, chapter }) => {
                assert_eq!(id, "s1");
                assert_eq!(chapter, "Chương 1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
