use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, types::Value, Connection, OptionalExtension};
use thiserror::Error;
use tracing::debug;

use crate::domain::entities::dataset::Row;
use crate::domain::entities::filters::FilterFragment;
use crate::domain::entities::query::{FetchResult, RemoteQuery, SortOrder};
use crate::infra::sqlite::schema::{init_db, open_connection};
use crate::usecase::services::priority_sort::{sort_by_priority_then, SortValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),
    #[error("page_size must be greater than zero")]
    EmptyPage,
}

/// Derived sort key ranked in process by a status priority list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritySortKey {
    pub status_column: String,
    pub order: Vec<String>,
    pub secondary_column: String,
}

/// How a dataset interprets materialized filters and sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    /// Filter key matched as a substring against every cell of a row.
    pub search_key: String,
    pub priority_keys: HashMap<String, PrioritySortKey>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            search_key: "search".to_string(),
            priority_keys: HashMap::new(),
        }
    }
}

pub fn insert_header_names(
    tx: &rusqlite::Transaction<'_>,
    dataset_id: i64,
    headers: &[String],
) -> Result<()> {
    let mut insert_header = tx
        .prepare("INSERT INTO column_name(dataset_id, col_idx, name) VALUES (?1, ?2, ?3)")
        .context("failed to prepare header insert")?;

    for (col_idx, name) in headers.iter().enumerate() {
        insert_header
            .execute(params![dataset_id, col_idx as i64, name])
            .context("failed to insert header")?;
    }

    Ok(())
}

pub fn create_dataset_from_rows(
    db_path: &Path,
    name: &str,
    source_path: &str,
    columns: &[String],
    rows: &[Vec<String>],
) -> Result<i64> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start dataset create transaction")?;

    tx.execute(
        "INSERT INTO dataset(name, source_path, row_count) VALUES (?1, ?2, 0)",
        params![name, source_path],
    )
    .context("failed to insert dataset")?;
    let dataset_id = tx.last_insert_rowid();

    insert_header_names(&tx, dataset_id, columns)?;

    let mut insert_cell = tx
        .prepare("INSERT INTO cell(dataset_id, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)")
        .context("failed to prepare cell insert")?;
    for (row_idx, row) in rows.iter().enumerate() {
        for col_idx in 0..columns.len() {
            let value = row.get(col_idx).map(String::as_str).unwrap_or("");
            insert_cell
                .execute(params![dataset_id, row_idx as i64, col_idx as i64, value])
                .context("failed to insert dataset cell")?;
        }
    }
    drop(insert_cell);

    tx.execute(
        "UPDATE dataset SET row_count = ?1 WHERE id = ?2",
        params![rows.len() as i64, dataset_id],
    )
    .context("failed to update dataset row_count")?;

    tx.commit().context("failed to commit dataset create")?;
    Ok(dataset_id)
}

/// Most recently imported dataset called `name`.
pub fn find_dataset_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM dataset WHERE name = ?1 ORDER BY id DESC LIMIT 1",
        [name],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to look up dataset {name}"))
}

pub fn load_columns(conn: &Connection, dataset_id: i64) -> Result<Vec<String>> {
    let mut columns_stmt = conn
        .prepare(
            "SELECT name
             FROM column_name
             WHERE dataset_id = ?1
             ORDER BY col_idx ASC",
        )
        .context("failed to prepare columns query")?;
    let columns = columns_stmt
        .query_map([dataset_id], |row| row.get::<_, String>(0))
        .context("failed to query columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect columns")?;
    Ok(columns)
}

fn column_index(columns: &[String], key: &str) -> Option<i64> {
    columns
        .iter()
        .position(|name| name == key)
        .or_else(|| columns.iter().position(|name| name.eq_ignore_ascii_case(key)))
        .map(|idx| idx as i64)
}

/// Builds the row filter; empty values and unknown keys add no constraint.
fn build_filter(
    dataset_id: i64,
    columns: &[String],
    filters: &FilterFragment,
    options: &SourceOptions,
) -> (String, Vec<Value>) {
    let mut filter_clauses = vec!["base.dataset_id = ?".to_string()];
    let mut filter_params = vec![Value::Integer(dataset_id)];

    for (key, value) in filters {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if *key == options.search_key {
            filter_clauses.push(
                "EXISTS (
                    SELECT 1 FROM cell gs
                    WHERE gs.dataset_id = ?
                      AND gs.row_idx = base.row_idx
                      AND gs.value LIKE ? ESCAPE '\\'
                )"
                .to_string(),
            );
            filter_params.push(Value::Integer(dataset_id));
            filter_params.push(Value::Text(format!("%{}%", escape_like(value))));
            continue;
        }

        let Some(col_idx) = column_index(columns, key) else {
            debug!(key = %key, "ignoring filter on unknown column");
            continue;
        };
        filter_clauses.push(
            "EXISTS (
                SELECT 1 FROM cell cs
                WHERE cs.dataset_id = ?
                  AND cs.row_idx = base.row_idx
                  AND cs.col_idx = ?
                  AND cs.value = ? COLLATE NOCASE
            )"
            .to_string(),
        );
        filter_params.push(Value::Integer(dataset_id));
        filter_params.push(Value::Integer(col_idx));
        filter_params.push(Value::Text(value.to_string()));
    }

    (filter_clauses.join(" AND "), filter_params)
}

/// Escapes LIKE wildcards so search text matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn select_row_indices(
    conn: &Connection,
    where_sql: &str,
    filter_params: &[Value],
    sort: Option<(i64, SortOrder)>,
    window: Option<(u64, u64)>,
) -> Result<Vec<i64>> {
    let mut row_params = Vec::<Value>::new();
    let mut row_sql = String::from("SELECT base.row_idx FROM cell base ");
    if let Some((sort_col, _)) = sort {
        row_sql.push_str(
            "LEFT JOIN cell sort_cell
             ON sort_cell.dataset_id = base.dataset_id
            AND sort_cell.row_idx = base.row_idx
            AND sort_cell.col_idx = ? ",
        );
        row_params.push(Value::Integer(sort_col));
    }

    row_sql.push_str(&format!(
        "WHERE {where_sql} GROUP BY base.row_idx ORDER BY "
    ));
    if let Some((_, order)) = sort {
        let direction = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        row_sql.push_str(&format!("COALESCE(sort_cell.value, '') COLLATE NOCASE {direction}, "));
    }
    row_sql.push_str("base.row_idx ASC");
    row_params.extend(filter_params.iter().cloned());

    if let Some((limit, offset)) = window {
        row_sql.push_str(" LIMIT ? OFFSET ?");
        row_params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        row_params.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));
    }

    let mut row_stmt = conn
        .prepare(&row_sql)
        .context("failed to prepare page row_idx query")?;
    let row_indices = row_stmt
        .query_map(rusqlite::params_from_iter(row_params), |row| {
            row.get::<_, i64>(0)
        })
        .context("failed to query page row_idx")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect page row_idx")?;
    Ok(row_indices)
}

fn hydrate_rows(
    conn: &Connection,
    dataset_id: i64,
    columns: &[String],
    row_indices: &[i64],
) -> Result<Vec<Row>> {
    if row_indices.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = std::iter::repeat_n("?", row_indices.len())
        .collect::<Vec<_>>()
        .join(",");
    let hydrate_sql = format!(
        "SELECT row_idx, col_idx, value
         FROM cell
         WHERE dataset_id = ? AND row_idx IN ({placeholders})
         ORDER BY row_idx ASC, col_idx ASC"
    );
    let mut hydrate_params = vec![Value::Integer(dataset_id)];
    hydrate_params.extend(row_indices.iter().copied().map(Value::Integer));

    let mut values = vec![vec![String::new(); columns.len()]; row_indices.len()];
    let row_pos: HashMap<i64, usize> = row_indices
        .iter()
        .copied()
        .enumerate()
        .map(|(idx, row_idx)| (row_idx, idx))
        .collect();

    let mut hydrate_stmt = conn
        .prepare(&hydrate_sql)
        .context("failed to prepare row hydration query")?;

    let mut hydrate_rows = hydrate_stmt
        .query(rusqlite::params_from_iter(hydrate_params))
        .context("failed to run row hydration query")?;

    while let Some(row) = hydrate_rows.next().context("failed to read hydrated row")? {
        let row_idx: i64 = row.get(0).context("failed to read row_idx")?;
        let col_idx: i64 = row.get(1).context("failed to read col_idx")?;
        let value: String = row.get(2).context("failed to read value")?;

        if let Some(&dest_row_idx) = row_pos.get(&row_idx) {
            if let Some(dest_cell) = values
                .get_mut(dest_row_idx)
                .and_then(|dest_row| dest_row.get_mut(col_idx as usize))
            {
                *dest_cell = value;
            }
        }
    }

    Ok(values
        .into_iter()
        .map(|row| Row::from_columns(columns, row))
        .collect())
}

/// Ranks rows by status priority; descending order flips the priority list
/// but keeps the secondary key ascending.
fn rank_rows(rows: &[Row], key: &PrioritySortKey, order: SortOrder) -> Vec<Row> {
    let mut priority = key.order.clone();
    if order == SortOrder::Desc {
        priority.reverse();
    }
    sort_by_priority_then(
        rows,
        |row| row.get(&key.status_column),
        &priority,
        |row| SortValue::from(row.get(&key.secondary_column)),
    )
}

/// Reads one page of `dataset_name` for `query`.
pub fn query_page(
    db_path: &Path,
    dataset_name: &str,
    query: &RemoteQuery,
    options: &SourceOptions,
) -> Result<FetchResult<Row>> {
    if query.page_size == 0 {
        return Err(SourceError::EmptyPage.into());
    }

    let conn = open_connection(db_path)?;
    let Some(dataset_id) = find_dataset_id(&conn, dataset_name)? else {
        return Err(SourceError::DatasetNotFound(dataset_name.to_string()).into());
    };

    let columns = load_columns(&conn, dataset_id)?;
    if columns.is_empty() {
        return Ok(FetchResult::empty());
    }

    let (where_sql, filter_params) = build_filter(dataset_id, &columns, &query.filters, options);

    let count_sql = format!(
        "SELECT COUNT(*)
         FROM (
             SELECT base.row_idx
             FROM cell base
             WHERE {where_sql}
             GROUP BY base.row_idx
         ) filtered"
    );
    let total_rows: i64 = conn
        .query_row(
            &count_sql,
            rusqlite::params_from_iter(filter_params.iter().cloned()),
            |row| row.get(0),
        )
        .context("failed to query filtered row count")?;
    let total_count = u64::try_from(total_rows).unwrap_or_default();

    let page_size = u64::from(query.page_size);
    let offset = query.offset();
    let sort_order = query.sort_order.unwrap_or_default();

    let priority_key = query
        .sort_by
        .as_deref()
        .and_then(|key| options.priority_keys.get(key));
    if let Some(priority_key) = priority_key {
        let row_indices = select_row_indices(&conn, &where_sql, &filter_params, None, None)?;
        let rows = hydrate_rows(&conn, dataset_id, &columns, &row_indices)?;
        let items = rank_rows(&rows, priority_key, sort_order)
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page_size).unwrap_or(usize::MAX))
            .collect();
        return Ok(FetchResult::new(items, total_count));
    }

    let sort = match query.sort_by.as_deref() {
        Some(key) => match column_index(&columns, key) {
            Some(col_idx) => Some((col_idx, sort_order)),
            None => {
                debug!(sort_by = %key, "ignoring sort on unknown column");
                None
            }
        },
        None => None,
    };

    let row_indices = select_row_indices(
        &conn,
        &where_sql,
        &filter_params,
        sort,
        Some((page_size, offset)),
    )?;
    let items = hydrate_rows(&conn, dataset_id, &columns, &row_indices)?;

    Ok(FetchResult::new(items, total_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
        assert_eq!(escape_like("plain"), "plain");
    }
}
