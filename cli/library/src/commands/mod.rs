mod authors;
mod books;
mod genres;

use std::fmt;

use anyhow::{Result, bail};
use bpaf::Bpaf;
use indoc::indoc;
use library_catalog::Client;
use tracing::debug;

use crate::config::Config;
use crate::utils::dialog::{Confirm, Dialog};
use crate::utils::init::init_catalog_client;

const LIBRARY_DESCRIPTION: &str = indoc! {"
    Manage the books, authors and genres of a library catalog.

    Talks to the catalog service at `catalog_url`,
    configured in `library.toml` or through `LIBRARY_CATALOG_URL`."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, version, descr(LIBRARY_DESCRIPTION))]
pub struct LibraryCli(#[bpaf(external(library_args))] pub LibraryArgs);

/// Main library args parser
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct LibraryArgs {
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl LibraryArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        let client = init_catalog_client(&config)?;
        self.command.handle(&client, &config).await
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Manage books
    #[bpaf(command)]
    Books(#[bpaf(external(books::books_commands))] books::BooksCommands),

    /// Manage authors
    #[bpaf(command)]
    Authors(#[bpaf(external(authors::authors_commands))] authors::AuthorsCommands),

    /// Manage genres
    #[bpaf(command)]
    Genres(#[bpaf(external(genres::genres_commands))] genres::GenresCommands),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl Commands {
    async fn handle(self, client: &Client, config: &Config) -> Result<()> {
        match self {
            Commands::Books(args) => args.handle(client, config).await,
            Commands::Authors(args) => args.handle(client).await,
            Commands::Genres(args) => args.handle(client).await,
        }
    }
}

/// Ask before deleting `description`, unless `yes` was passed.
///
/// Without a terminal to ask on, `--yes` is required.
async fn confirm_delete(description: &str, yes: bool) -> Result<()> {
    if yes {
        debug!("deletion confirmed by flag");
        return Ok(());
    }

    if !Dialog::<Confirm>::can_prompt() {
        bail!("Refusing to delete {description} without confirmation, pass '--yes' to delete");
    }

    let message = format!("Delete {description}?");
    let confirm = Dialog {
        message: &message,
        help_message: Some("Use `--yes` to delete without confirmation"),
        typed: Confirm {
            default: Some(false),
        },
    };

    if !confirm.prompt().await? {
        bail!("Deletion of {description} cancelled");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bpaf::Args;

    use super::*;

    fn parse(args: &[&str]) -> Result<LibraryArgs, bpaf::ParseFailure> {
        library_cli().run_inner(Args::from(args)).map(|LibraryCli(args)| args)
    }

    #[test]
    fn verbosity_counts_flags() {
        let args = parse(&["-vv", "authors", "list"]).unwrap();
        assert_eq!(args.verbosity, Verbosity::Verbose(2));

        let args = parse(&["--quiet", "genres", "list"]).unwrap();
        assert_eq!(args.verbosity, Verbosity::Quiet);

        let args = parse(&["books", "list"]).unwrap();
        assert_eq!(args.verbosity, Verbosity::Verbose(0));
    }

    #[test]
    fn command_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[tokio::test]
    async fn yes_skips_confirmation() {
        confirm_delete("book 7", true).await.unwrap();
    }

    #[tokio::test]
    async fn delete_without_terminal_needs_yes() {
        let err = temp_env::async_with_vars(
            [(crate::utils::dialog::LIBRARY_NO_PROMPT_VAR, Some("1"))],
            confirm_delete("book 7", false),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("--yes"));
    }
}
