//! Plain text rendering of catalog records.

use std::fmt::Display;

use indoc::formatdoc;
use itertools::Itertools;
use library_catalog::{Author, Book, Genre};

use crate::controllers::list::PageWindow;

const MISSING: &str = "-";

/// Render rows as left aligned columns separated by two spaces.
fn table<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) -> String {
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |cells: [&str; N]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:width$}"))
            .join("  ")
            .trim_end()
            .to_string()
    };

    std::iter::once(render_row(header))
        .chain(rows.iter().map(|row| render_row(row.each_ref().map(String::as_str))))
        .join("\n")
}

fn or_missing(value: Option<impl Display>) -> String {
    value.map_or_else(|| MISSING.to_string(), |value| value.to_string())
}

fn author_name(book: &Book) -> String {
    book.author
        .as_ref()
        .map_or_else(|| format!("#{}", book.author_id), |author| author.name.clone())
}

fn genre_name(book: &Book) -> String {
    book.genre
        .as_ref()
        .map_or_else(|| format!("#{}", book.genre_id), |genre| genre.name.clone())
}

pub fn book_table(books: &[Book]) -> String {
    let rows = books
        .iter()
        .map(|book| {
            [
                book.id.to_string(),
                book.title.clone(),
                author_name(book),
                genre_name(book),
                or_missing(book.publication_year),
                or_missing(book.isbn.as_deref()),
            ]
        })
        .collect();
    table(["ID", "TITLE", "AUTHOR", "GENRE", "YEAR", "ISBN"], rows)
}

/// "Page 1 of 3 (23 books)"
pub fn page_summary(window: &PageWindow) -> String {
    let noun = if window.total == 1 { "book" } else { "books" };
    format!(
        "Page {} of {} ({} {noun})",
        window.page,
        window.pages.max(1),
        window.total
    )
}

pub fn book_detail(book: &Book) -> String {
    let mut detail = formatdoc! {"
        {title}
        ID:          {id}
        Author:      {author}
        Genre:       {genre}
        Year:        {year}
        Pages:       {pages}
        ISBN:        {isbn}
        Added:       {created_at}",
        title = book.title,
        id = book.id,
        author = author_name(book),
        genre = genre_name(book),
        year = or_missing(book.publication_year),
        pages = or_missing(book.page_count),
        isbn = or_missing(book.isbn.as_deref()),
        created_at = or_missing(book.created_at.as_deref()),
    };

    if let Some(description) = book.description.as_deref().filter(|d| !d.trim().is_empty()) {
        detail.push_str("\n\n");
        detail.push_str(description);
    }
    detail
}

pub fn author_table(authors: &[Author]) -> String {
    let rows = authors
        .iter()
        .map(|author| [author.id.to_string(), author.name.clone()])
        .collect();
    table(["ID", "NAME"], rows)
}

pub fn genre_table(genres: &[Genre]) -> String {
    let rows = genres
        .iter()
        .map(|genre| [genre.id.to_string(), genre.name.clone()])
        .collect();
    table(["ID", "NAME"], rows)
}
