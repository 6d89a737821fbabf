use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use library_catalog::{AuthorId, BookId, BookPage, ClientTrait, GenreId};
use tracing::instrument;

use super::confirm_delete;
use crate::config::Config;
use crate::controllers::detail::{DeleteOutcome, DetailController};
use crate::controllers::form::{DraftField, FormController};
use crate::controllers::list::{FIRST_PAGE, FilterCriteria, ListController};
use crate::utils::{display, message};

/// Book Commands.
#[derive(Debug, Clone, Bpaf)]
pub enum BooksCommands {
    /// List books, optionally filtered
    #[bpaf(command)]
    List(#[bpaf(external(list))] List),

    /// Show a single book
    #[bpaf(command)]
    Show(#[bpaf(external(show))] Show),

    /// Add a book to the catalog
    #[bpaf(command)]
    Add(#[bpaf(external(book_fields))] BookFields),

    /// Change fields of a book
    #[bpaf(command)]
    Edit(#[bpaf(external(edit))] Edit),

    /// Delete a book
    #[bpaf(command)]
    Delete(#[bpaf(external(delete))] Delete),
}

impl BooksCommands {
    #[instrument(name = "books", skip_all)]
    pub async fn handle(self, client: &impl ClientTrait, config: &Config) -> Result<()> {
        match self {
            BooksCommands::List(args) => args.handle(client, config).await,
            BooksCommands::Show(args) => args.handle(client).await,
            BooksCommands::Add(fields) => add(fields, client).await,
            BooksCommands::Edit(args) => args.handle(client).await,
            BooksCommands::Delete(args) => args.handle(client).await,
        }
    }
}

#[derive(Debug, Clone, Bpaf)]
pub struct List {
    /// Only books with <title> in their title
    #[bpaf(long, argument("title"))]
    title: Option<String>,

    /// Only books by the author with id <id>
    #[bpaf(long("author"), argument("id"))]
    author: Option<AuthorId>,

    /// Only books in the genre with id <id>
    #[bpaf(long("genre"), argument("id"))]
    genre: Option<GenreId>,

    /// Only books published in <year>
    #[bpaf(long("year"), argument("year"))]
    year: Option<i32>,

    /// Page to show, starting at 1
    #[bpaf(long, argument("page"), fallback(FIRST_PAGE))]
    page: u32,

    /// Delete the book with <id>, then show the reloaded page
    #[bpaf(long, argument("id"))]
    delete: Option<BookId>,

    /// Delete without confirmation
    #[bpaf(short, long)]
    yes: bool,

    /// Print the page as JSON
    #[bpaf(long)]
    json: bool,
}

impl List {
    #[instrument(name = "list", skip_all)]
    async fn handle(self, client: &impl ClientTrait, config: &Config) -> Result<()> {
        let mut controller = ListController::new(client, config.library.page_size);

        controller
            .apply_filter(FilterCriteria {
                title: self.title,
                author_id: self.author,
                genre_id: self.genre,
                publication_year: self.year,
            })
            .await;
        if let Some(error) = &controller.state().error {
            bail!("{error}");
        }

        if self.page != FIRST_PAGE && !controller.change_page(self.page).await {
            message::warning(format!(
                "Page {} does not exist, showing page {} of {}",
                self.page,
                controller.state().window.page,
                controller.state().window.pages
            ));
        }

        if let Some(id) = self.delete {
            let description = format!("book {id}");
            confirm_delete(&description, self.yes).await?;
            controller
                .delete_record(id)
                .await
                .with_context(|| format!("Could not delete {description}"))?;
            message::deleted(format!("Deleted {description}"));
        }

        let state = controller.state();
        if let Some(error) = &state.error {
            bail!("{error}");
        }

        if self.json {
            let page = BookPage {
                items: state.books.clone(),
                page: state.window.page,
                limit: state.window.limit,
                total: state.window.total,
                pages: state.window.pages,
            };
            println!("{}", serde_json::to_string_pretty(&page)?);
            return Ok(());
        }

        if state.books.is_empty() {
            message::plain("No books found");
            return Ok(());
        }

        println!("{}", display::book_table(&state.books));
        message::plain(display::page_summary(&state.window));
        if state.window.has_next() {
            message::plain(format!("Use '--page {}' for the next page", state.window.page + 1));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Bpaf)]
pub struct Show {
    /// Print the book as JSON
    #[bpaf(long)]
    json: bool,

    /// Id of the book
    #[bpaf(positional("id"))]
    id: BookId,
}

impl Show {
    #[instrument(name = "show", skip_all, fields(id = %self.id))]
    async fn handle(self, client: &impl ClientTrait) -> Result<()> {
        let mut controller = DetailController::new(client, self.id);
        controller.load().await;

        let state = controller.into_state();
        if state.not_found {
            bail!("Book {} not found", self.id);
        }
        if let Some(error) = state.error {
            bail!("{error}");
        }
        let Some(book) = state.book else {
            bail!("Book {} not found", self.id);
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&book)?);
        } else {
            println!("{}", display::book_detail(&book));
        }
        Ok(())
    }
}

/// Fields of a book as given on the command line.
///
/// An empty string clears an optional text field.
#[derive(Debug, Clone, Default, Bpaf)]
pub struct BookFields {
    /// Title of the book
    #[bpaf(long, argument("title"))]
    title: Option<String>,

    /// Id of the author
    #[bpaf(long("author"), argument("id"))]
    author: Option<AuthorId>,

    /// Id of the genre
    #[bpaf(long("genre"), argument("id"))]
    genre: Option<GenreId>,

    /// ISBN of the book
    #[bpaf(long, argument("isbn"))]
    isbn: Option<String>,

    /// Year of publication, between 1000 and 2100
    #[bpaf(long("year"), argument("year"))]
    year: Option<i32>,

    /// Number of pages
    #[bpaf(long("pages"), argument("count"))]
    pages: Option<u32>,

    /// Short description
    #[bpaf(long, argument("text"))]
    description: Option<String>,
}

impl BookFields {
    /// The draft edits for the fields that were given.
    fn into_draft_fields(self) -> Vec<DraftField> {
        [
            self.title.map(DraftField::Title),
            self.author.map(|id| DraftField::Author(Some(id))),
            self.genre.map(|id| DraftField::Genre(Some(id))),
            self.isbn.map(|isbn| DraftField::Isbn(Some(isbn))),
            self.year.map(|year| DraftField::PublicationYear(Some(year))),
            self.pages.map(|pages| DraftField::PageCount(Some(pages))),
            self.description
                .map(|description| DraftField::Description(Some(description))),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[instrument(name = "add", skip_all)]
async fn add(fields: BookFields, client: &impl ClientTrait) -> Result<()> {
    let mut form = FormController::new(client, None);
    form.initialize().await;
    if let Some(error) = &form.state().error {
        bail!("{error}");
    }

    for field in fields.into_draft_fields() {
        form.update_field(field);
    }
    warn_unknown_references(&form);

    let saved = form
        .submit(|book| message::created(format!("Book '{}' added with id {}", book.title, book.id)))
        .await;
    if !saved {
        bail!("{}", form_error(&form));
    }
    Ok(())
}

#[derive(Debug, Clone, Bpaf)]
pub struct Edit {
    #[bpaf(external(book_fields))]
    fields: BookFields,

    /// Id of the book
    #[bpaf(positional("id"))]
    id: BookId,
}

impl Edit {
    #[instrument(name = "edit", skip_all, fields(id = %self.id))]
    async fn handle(self, client: &impl ClientTrait) -> Result<()> {
        let draft_fields = self.fields.into_draft_fields();
        if draft_fields.is_empty() {
            bail!("Nothing to change, pass at least one field to update");
        }

        let mut form = FormController::new(client, Some(self.id));
        form.initialize().await;
        if let Some(error) = &form.state().error {
            bail!("{error}");
        }

        for field in draft_fields {
            form.update_field(field);
        }
        warn_unknown_references(&form);

        let saved = form
            .submit(|book| message::updated(format!("Book '{}' updated", book.title)))
            .await;
        if !saved {
            bail!("{}", form_error(&form));
        }
        Ok(())
    }
}

/// The service decides whether a reference is valid,
/// but a typo'd id is worth pointing out.
fn warn_unknown_references<C: ClientTrait>(form: &FormController<'_, C>) {
    let state = form.state();
    if let Some(id) = state.draft.author_id {
        if state.author_name().is_none() {
            message::warning(format!("No author with id {id} is known"));
        }
    }
    if let Some(id) = state.draft.genre_id {
        if state.genre_name().is_none() {
            message::warning(format!("No genre with id {id} is known"));
        }
    }
}

fn form_error<C: ClientTrait>(form: &FormController<'_, C>) -> String {
    form.state()
        .error
        .clone()
        .unwrap_or_else(|| "Book was not saved".to_string())
}

#[derive(Debug, Clone, Bpaf)]
pub struct Delete {
    /// Delete the book without confirmation
    #[bpaf(short, long)]
    yes: bool,

    /// Id of the book
    #[bpaf(positional("id"))]
    id: BookId,
}

impl Delete {
    #[instrument(name = "delete", skip_all, fields(id = %self.id))]
    async fn handle(self, client: &impl ClientTrait) -> Result<()> {
        let mut controller = DetailController::new(client, self.id);
        controller.load().await;

        let description = match (&controller.state().book, controller.state().not_found) {
            (Some(book), _) => format!("book '{}' ({})", book.title, book.id),
            (None, true) => bail!("Book {} not found", self.id),
            (None, false) => format!("book {}", self.id),
        };

        confirm_delete(&description, self.yes).await?;

        match controller.delete(|_| true).await {
            DeleteOutcome::Deleted => {
                message::deleted(format!("Deleted {description}"));
                Ok(())
            },
            DeleteOutcome::Cancelled => bail!("Deletion of {description} cancelled"),
            DeleteOutcome::Failed => {
                let error = controller.state().error.clone().unwrap_or_default();
                Err(anyhow::anyhow!(error)).context(format!("Could not delete {description}"))
            },
        }
    }
}
