#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use itertools::Itertools;
use sqlx::query_builder::Separated;
use sqlx::{QueryBuilder, Sqlite, Transaction};

/// SQLite's default host-parameter ceiling; multi-row statements are chunked
/// so a batch never exceeds it.
const SQLITE_BIND_LIMIT: usize = 32766;

/// Row shape for the shared multi-row INSERT builder. Implementors declare
/// their target table and column order once; `bind` must push values in the
/// same order as `COLUMNS`.
pub trait BulkRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn bind(&self, row: &mut Separated<'_, '_, Sqlite, &'static str>);
}

/// Execute one parameter-bound multi-row INSERT per chunk on the caller's
/// transaction. Returns the number of rows inserted.
#[inline]
pub async fn bulk_insert<T: BulkRow>(
    tx: &mut Transaction<'_, Sqlite>,
    rows: &[T],
) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let rows_per_statement = (SQLITE_BIND_LIMIT / T::COLUMNS.len()).max(1);
    let prefix = format!(
        "INSERT INTO {} ({}) ",
        T::TABLE,
        T::COLUMNS.iter().join(", ")
    );

    let mut inserted = 0;
    for chunk in rows.chunks(rows_per_statement) {
        let mut query_builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(prefix.as_str());
        query_builder.push_values(chunk, |mut b, row| row.bind(&mut b));

        inserted += query_builder
            .build()
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to bulk insert into {}", T::TABLE))?
            .rows_affected();
    }

    Ok(inserted)
}
