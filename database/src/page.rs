//! Keyset pagination over ULID primary keys.

use crate::Result;
use relay::{Page, PaginationArgs};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

/// Runs `select` (a `SELECT ... FROM table` without a `WHERE`) for one page.
///
/// One row beyond the limit is fetched to tell whether another page exists
/// in the direction of travel. Backward pages are returned in ascending
/// order like forward ones.
pub(crate) async fn fetch_page<T>(
    pool: &SqlitePool,
    select: &str,
    filter: Option<(&str, &str)>,
    args: &PaginationArgs<String>,
) -> Result<Page<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let limit = args.limit() as usize;

    let mut query = QueryBuilder::<Sqlite>::new(select);
    query.push(" WHERE 1 = 1");
    if let Some((column, value)) = filter {
        query
            .push(" AND ")
            .push(column)
            .push(" = ")
            .push_bind(value.to_string());
    }

    match args {
        PaginationArgs::Forward { after, .. } => {
            if let Some(after) = after {
                query.push(" AND id > ").push_bind(after.clone());
            }
            query.push(" ORDER BY id ASC");
        }
        PaginationArgs::Backward { before, .. } => {
            if let Some(before) = before {
                query.push(" AND id < ").push_bind(before.clone());
            }
            query.push(" ORDER BY id DESC");
        }
    }
    query.push(" LIMIT ").push_bind(limit as i64 + 1);

    debug!("Executing SQL: {}", query.sql());

    let mut items: Vec<T> = query.build_query_as::<T>().fetch_all(pool).await?;
    let has_more = items.len() > limit;
    items.truncate(limit);

    let page = match args {
        PaginationArgs::Forward { after, .. } => Page {
            items,
            has_next_page: has_more,
            has_previous_page: after.is_some(),
        },
        PaginationArgs::Backward { before, .. } => {
            items.reverse();
            Page {
                items,
                has_next_page: before.is_some(),
                has_previous_page: has_more,
            }
        }
    };
    Ok(page)
}
