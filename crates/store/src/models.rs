use gutensync_extract::models::Record;

/// A `books` row as stored. Columns written by other tools may be `NULL`.
#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    id: String,
    author: Option<String>,
    title: Option<String>,
    language: Option<String>,
}

impl From<BookRow> for Record {
    fn from(row: BookRow) -> Self {
        Record::new(
            row.id,
            row.title.unwrap_or_default(),
            row.author.unwrap_or_default(),
            row.language.unwrap_or_default(),
        )
    }
}
