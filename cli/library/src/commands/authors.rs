use anyhow::{Context, Result};
use bpaf::Bpaf;
use library_catalog::{AuthorId, AuthorInput, ClientTrait, ListParams};
use tracing::instrument;

use super::confirm_delete;
use crate::utils::{display, message};

/// Author Commands.
#[derive(Debug, Clone, Bpaf)]
pub enum AuthorsCommands {
    /// List authors
    #[bpaf(command)]
    List {
        /// Print the authors as JSON
        #[bpaf(long)]
        json: bool,
    },

    /// Add an author
    #[bpaf(command)]
    Add {
        /// Name of the author
        #[bpaf(positional("name"))]
        name: String,
    },

    /// Rename an author
    #[bpaf(command)]
    Edit {
        /// Id of the author
        #[bpaf(positional("id"))]
        id: AuthorId,
        /// New name of the author
        #[bpaf(positional("name"))]
        name: String,
    },

    /// Delete an author
    #[bpaf(command)]
    Delete {
        /// Delete the author without confirmation
        #[bpaf(short, long)]
        yes: bool,
        /// Id of the author
        #[bpaf(positional("id"))]
        id: AuthorId,
    },
}

impl AuthorsCommands {
    #[instrument(name = "authors", skip_all)]
    pub async fn handle(self, client: &impl ClientTrait) -> Result<()> {
        match self {
            AuthorsCommands::List { json } => {
                let authors = client
                    .list_authors(&ListParams::default())
                    .await
                    .context("Failed to load authors")?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&authors)?);
                } else if authors.is_empty() {
                    message::plain("No authors found");
                } else {
                    println!("{}", display::author_table(&authors));
                }
            },
            AuthorsCommands::Add { name } => {
                let author = client
                    .create_author(&AuthorInput { name })
                    .await
                    .context("Failed to add author")?;
                message::created(format!("Author '{}' added with id {}", author.name, author.id));
            },
            AuthorsCommands::Edit { id, name } => {
                let author = client
                    .update_author(id, &AuthorInput { name })
                    .await
                    .with_context(|| format!("Failed to update author {id}"))?;
                message::updated(format!("Author {} renamed to '{}'", author.id, author.name));
            },
            AuthorsCommands::Delete { yes, id } => {
                let author = client
                    .get_author(id)
                    .await
                    .with_context(|| format!("Failed to load author {id}"))?;
                let description = format!("author '{}' ({})", author.name, author.id);
                confirm_delete(&description, yes).await?;
                client
                    .delete_author(id)
                    .await
                    .with_context(|| format!("Failed to delete {description}"))?;
                message::deleted(format!("Deleted {description}"));
            },
        }
        Ok(())
    }
}
