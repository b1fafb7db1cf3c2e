use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rusqlite::{
    OptionalExtension, params, params_from_iter,
    types::{Type, Value},
};

use crate::error::{Result, SnipError};
use crate::models::{Origin, SnippetChanges, SnippetDraft, SnippetRecord};

use super::SqliteStore;

// Qualified so the association join stays unambiguous.
const SNIPPET_COLUMNS: &str = r"
    snippets.id, snippets.name, snippets.code, snippets.description,
    snippets.language, snippets.usage_count, snippets.last_used,
    snippets.origin, snippets.is_favorite, snippets.created_at,
    snippets.updated_at
";

impl SqliteStore {
    /// Inserts the snippet row and its association rows in one
    /// transaction. Duplicate tag ids in the draft collapse to a single
    /// association; an unknown tag id aborts the whole insert.
    pub fn create_snippet(&self, draft: &SnippetDraft) -> Result<i64> {
        if draft.name.trim().is_empty() {
            return Err(SnipError::Validation("snippet name is empty".to_string()));
        }
        if draft.code.trim().is_empty() {
            return Err(SnipError::Validation("snippet code is empty".to_string()));
        }

        let mut tag_ids = draft.tag_ids.clone();
        let mut seen = HashSet::new();
        tag_ids.retain(|id| seen.insert(*id));

        self.with_tx(|tx| {
            let now = Utc::now().to_rfc3339();
            tx.execute(
                r"
                INSERT INTO snippets(name, code, description, language, origin, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                ",
                params![
                    draft.name,
                    draft.code,
                    draft.description,
                    draft.language,
                    Origin::Primary.as_str(),
                    now,
                ],
            )?;
            let snippet_id = tx.last_insert_rowid();

            for tag_id in &tag_ids {
                let tag_exists = tx
                    .query_row("SELECT 1 FROM tags WHERE id = ?1", params![tag_id], |_| {
                        Ok(())
                    })
                    .optional()?;
                if tag_exists.is_none() {
                    return Err(SnipError::Consistency(format!(
                        "association references missing tag {tag_id}"
                    )));
                }
                tx.execute(
                    "INSERT INTO tag_snippets(tag_id, snippet_id, created_at) VALUES (?1, ?2, ?3)",
                    params![tag_id, snippet_id, now],
                )?;
            }

            Ok(snippet_id)
        })
    }

    pub fn get_snippet(&self, id: i64) -> Result<SnippetRecord> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {SNIPPET_COLUMNS} FROM snippets WHERE id = ?1"),
                params![id],
                map_snippet_row,
            )
            .optional()?
            .ok_or_else(|| SnipError::NotFound(format!("snippet {id}")))
        })
    }

    /// Applies the provided fields only. Fails on an unknown id, a
    /// secondary-origin row, or a blank name/code.
    pub fn update_snippet(&self, id: i64, changes: &SnippetChanges) -> Result<()> {
        if let Some(name) = &changes.name
            && name.trim().is_empty()
        {
            return Err(SnipError::Validation("snippet name is empty".to_string()));
        }
        if let Some(code) = &changes.code
            && code.trim().is_empty()
        {
            return Err(SnipError::Validation("snippet code is empty".to_string()));
        }

        self.with_tx(|tx| {
            require_mutable(tx, id)?;

            let mut assignments = Vec::new();
            let mut values: Vec<Value> = Vec::new();
            for (column, value) in [
                ("name", changes.name.as_ref()),
                ("code", changes.code.as_ref()),
                ("description", changes.description.as_ref()),
                ("language", changes.language.as_ref()),
            ] {
                if let Some(value) = value {
                    values.push(Value::from(value.clone()));
                    assignments.push(format!("{column} = ?{}", values.len()));
                }
            }
            values.push(Value::from(Utc::now().to_rfc3339()));
            assignments.push(format!("updated_at = ?{}", values.len()));
            values.push(Value::from(id));

            tx.execute(
                &format!(
                    "UPDATE snippets SET {} WHERE id = ?{}",
                    assignments.join(", "),
                    values.len()
                ),
                params_from_iter(values),
            )?;
            Ok(())
        })
    }

    /// Deletes the snippet and cascades its associations in the same
    /// transaction. Same immutability rule as updates.
    pub fn delete_snippet(&self, id: i64) -> Result<()> {
        self.with_tx(|tx| {
            require_mutable(tx, id)?;
            tx.execute("DELETE FROM tag_snippets WHERE snippet_id = ?1", params![id])?;
            tx.execute("DELETE FROM snippets WHERE id = ?1", params![id])?;
            Ok(())
        })
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&self, id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            require_mutable(tx, id)?;
            let favorite: i64 = tx.query_row(
                "SELECT is_favorite FROM snippets WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )?;
            let toggled = favorite == 0;
            tx.execute(
                "UPDATE snippets SET is_favorite = ?2, updated_at = ?3 WHERE id = ?1",
                params![id, i64::from(toggled), Utc::now().to_rfc3339()],
            )?;
            Ok(toggled)
        })
    }

    /// Bumps usage_count and stamps last_used.
    pub fn record_usage(&self, id: i64) -> Result<()> {
        self.with_tx(|tx| {
            require_mutable(tx, id)?;
            tx.execute(
                r"
                UPDATE snippets
                SET usage_count = usage_count + 1, last_used = ?2, updated_at = ?2
                WHERE id = ?1
                ",
                params![id, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    /// All snippet rows ordered by name.
    pub fn list_snippets(&self) -> Result<Vec<SnippetRecord>> {
        self.query_snippets(
            &format!("SELECT {SNIPPET_COLUMNS} FROM snippets ORDER BY name ASC"),
            &[],
        )
    }

    /// Snippets associated with `tag_id`, ordered by name.
    pub fn snippets_by_tag(&self, tag_id: i64) -> Result<Vec<SnippetRecord>> {
        self.query_snippets(
            &format!(
                r"
                SELECT {SNIPPET_COLUMNS}
                FROM snippets
                JOIN tag_snippets ON tag_snippets.snippet_id = snippets.id
                WHERE tag_snippets.tag_id = ?1
                ORDER BY snippets.name ASC
                "
            ),
            &[Value::from(tag_id)],
        )
    }

    /// Coarse case-insensitive substring filter over name and description,
    /// with an optional exact language filter, ordered by usage. This is
    /// the cheap pre-filter; relevance ranking happens above the store.
    pub fn filter_snippets(
        &self,
        query: &str,
        language: Option<&str>,
    ) -> Result<Vec<SnippetRecord>> {
        let pattern = format!("%{}%", escape_like(query));
        let mut sql = format!(
            r"
            SELECT {SNIPPET_COLUMNS} FROM snippets
            WHERE (name LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\')
            "
        );
        let mut values = vec![Value::from(pattern)];
        if let Some(language) = language {
            values.push(Value::from(language.to_string()));
            sql.push_str(&format!(" AND language = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY usage_count DESC, name ASC");
        self.query_snippets(&sql, &values)
    }

    /// Favorite snippets, most used first.
    pub fn favorite_snippets(&self) -> Result<Vec<SnippetRecord>> {
        self.query_snippets(
            &format!(
                r"
                SELECT {SNIPPET_COLUMNS} FROM snippets
                WHERE is_favorite = 1
                ORDER BY usage_count DESC, name ASC
                "
            ),
            &[],
        )
    }

    /// Association tag ids for one snippet, in association insertion order.
    pub fn tag_ids_for(&self, snippet_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT tag_id FROM tag_snippets WHERE snippet_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![snippet_id], |row| row.get::<_, i64>(0))?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    pub fn snippet_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM snippets", [], |row| row.get(0))?;
            Ok(super::tags::i64_to_usize_saturating(count))
        })
    }

    fn query_snippets(&self, sql: &str, values: &[Value]) -> Result<Vec<SnippetRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter().cloned()), map_snippet_row)?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }
}

fn require_mutable(tx: &rusqlite::Transaction<'_>, id: i64) -> Result<()> {
    let origin_raw = tx
        .query_row(
            "SELECT origin FROM snippets WHERE id = ?1",
            params![id],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .ok_or_else(|| SnipError::NotFound(format!("snippet {id}")))?;
    match Origin::parse(&origin_raw) {
        Some(Origin::Primary) => Ok(()),
        Some(Origin::Secondary) => Err(SnipError::ImmutableOrigin(format!(
            "snippet {id} belongs to the secondary store"
        ))),
        None => Err(SnipError::Consistency(format!(
            "snippet {id} has unknown origin '{origin_raw}'"
        ))),
    }
}

fn map_snippet_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SnippetRecord> {
    let origin_raw = row.get::<_, String>(7)?;
    let origin = Origin::parse(&origin_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            Type::Text,
            format!("unknown origin '{origin_raw}'").into(),
        )
    })?;
    let last_used = row
        .get::<_, Option<String>>(6)?
        .map(|raw| parse_required_rfc3339(6, &raw))
        .transpose()?;
    Ok(SnippetRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        language: row.get(4)?,
        usage_count: row.get(5)?,
        last_used,
        origin,
        is_favorite: row.get::<_, i64>(8)? != 0,
        created_at: parse_required_rfc3339(9, &row.get::<_, String>(9)?)?,
        updated_at: parse_required_rfc3339(10, &row.get::<_, String>(10)?)?,
    })
}

pub(super) fn parse_required_rfc3339(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|x| x.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
