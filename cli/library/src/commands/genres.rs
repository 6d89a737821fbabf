use anyhow::{Context, Result};
use bpaf::Bpaf;
use library_catalog::{ClientTrait, GenreId, GenreInput, ListParams};
use tracing::instrument;

use super::confirm_delete;
use crate::utils::{display, message};

/// Genre Commands.
#[derive(Debug, Clone, Bpaf)]
pub enum GenresCommands {
    /// List genres
    #[bpaf(command)]
    List {
        /// Print the genres as JSON
        #[bpaf(long)]
        json: bool,
    },

    /// Add a genre
    #[bpaf(command)]
    Add {
        /// Name of the genre
        #[bpaf(positional("name"))]
        name: String,
    },

    /// Rename a genre
    #[bpaf(command)]
    Edit {
        /// Id of the genre
        #[bpaf(positional("id"))]
        id: GenreId,
        /// New name of the genre
        #[bpaf(positional("name"))]
        name: String,
    },

    /// Delete a genre
    #[bpaf(command)]
    Delete {
        /// Delete the genre without confirmation
        #[bpaf(short, long)]
        yes: bool,
        /// Id of the genre
        #[bpaf(positional("id"))]
        id: GenreId,
    },
}

impl GenresCommands {
    #[instrument(name = "genres", skip_all)]
    pub async fn handle(self, client: &impl ClientTrait) -> Result<()> {
        match self {
            GenresCommands::List { json } => {
                let genres = client
                    .list_genres(&ListParams::default())
                    .await
                    .context("Failed to load genres")?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&genres)?);
                } else if genres.is_empty() {
                    message::plain("No genres found");
                } else {
                    println!("{}", display::genre_table(&genres));
                }
            },
            GenresCommands::Add { name } => {
                let genre = client
                    .create_genre(&GenreInput { name })
                    .await
                    .context("Failed to add genre")?;
                message::created(format!("Genre '{}' added with id {}", genre.name, genre.id));
            },
            GenresCommands::Edit { id, name } => {
                let genre = client
                    .update_genre(id, &GenreInput { name })
                    .await
                    .with_context(|| format!("Failed to update genre {id}"))?;
                message::updated(format!("Genre {} renamed to '{}'", genre.id, genre.name));
            },
            GenresCommands::Delete { yes, id } => {
                let genre = client
                    .get_genre(id)
                    .await
                    .with_context(|| format!("Failed to load genre {id}"))?;
                let description = format!("genre '{}' ({})", genre.name, genre.id);
                confirm_delete(&description, yes).await?;
                client
                    .delete_genre(id)
                    .await
                    .with_context(|| format!("Failed to delete {description}"))?;
                message::deleted(format!("Deleted {description}"));
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use library_catalog::{MockClient, RecordedCall, Response};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::controllers::tests::genre;
    use crate::utils::message::history::History;

    #[tokio::test]
    async fn list_sends_no_pagination() {
        let client = MockClient::new();
        client.push_response(Response::Genres(vec![genre(1, "Poetry"), genre(2, "Drama")]));

        GenresCommands::List { json: false }.handle(&client).await.unwrap();

        assert_eq!(client.calls(), vec![RecordedCall::ListGenres(ListParams::default())]);
    }

    #[tokio::test]
    async fn delete_with_yes_names_the_genre() {
        let client = MockClient::new();
        client.push_response(Response::Genre(genre(2, "Drama")));
        client.push_response(Response::Deleted);

        History::global().clear();
        GenresCommands::Delete {
            yes: true,
            id: GenreId::from(2),
        }
        .handle(&client)
        .await
        .unwrap();

        assert_eq!(client.calls().last(), Some(&RecordedCall::DeleteGenre(GenreId::from(2))));
        assert_eq!(History::global().messages(), ["🗑️  Deleted genre 'Drama' (2)"]);
    }

    #[tokio::test]
    async fn failed_delete_keeps_context() {
        let client = MockClient::new();
        client.push_response(Response::Genre(genre(2, "Drama")));
        client.push_error_response(409, Some("Genre still has books"));

        let err = GenresCommands::Delete {
            yes: true,
            id: GenreId::from(2),
        }
        .handle(&client)
        .await
        .unwrap_err();

        assert_eq!(
            format!("{err:#}"),
            "Failed to delete genre 'Drama' (2): 409 Conflict: Genre still has books"
        );
    }
}
