use chrono::Utc;
use rusqlite::{OptionalExtension, params, types::Type};

use crate::error::{Result, SnipError};
use crate::models::{TagRow, TagType};

use super::SqliteStore;

impl SqliteStore {
    /// Returns the id of the tag with exactly this (name, parent) pair,
    /// creating it when absent. Repeated calls with identical arguments
    /// return the same id and leave exactly one row behind.
    pub fn get_or_create_tag(
        &self,
        name: &str,
        parent_id: Option<i64>,
        tag_type: TagType,
    ) -> Result<i64> {
        if name.trim().is_empty() {
            return Err(SnipError::Validation("tag name is empty".to_string()));
        }

        self.with_tx(|tx| {
            // IS, not =, so a NULL parent compares equal to NULL.
            let existing = tx
                .query_row(
                    "SELECT id FROM tags WHERE name = ?1 AND parent_id IS ?2",
                    params![name, parent_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            if let Some(id) = existing {
                return Ok(id);
            }

            if let Some(parent_id) = parent_id {
                let parent_exists = tx
                    .query_row(
                        "SELECT 1 FROM tags WHERE id = ?1",
                        params![parent_id],
                        |_| Ok(()),
                    )
                    .optional()?;
                if parent_exists.is_none() {
                    return Err(SnipError::Consistency(format!(
                        "tag parent {parent_id} does not exist"
                    )));
                }
            }

            let now = Utc::now().to_rfc3339();
            tx.execute(
                r"
                INSERT INTO tags(name, parent_id, type, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?4)
                ",
                params![name, parent_id, tag_type.as_str(), now],
            )?;
            Ok(tx.last_insert_rowid())
        })
    }

    /// Updates display metadata on an existing tag.
    pub fn set_tag_display(&self, id: i64, icon: &str, color: &str) -> Result<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE tags SET icon = ?2, color = ?3, updated_at = ?4 WHERE id = ?1",
                params![id, icon, color, Utc::now().to_rfc3339()],
            )?;
            if affected == 0 {
                return Err(SnipError::NotFound(format!("tag {id}")));
            }
            Ok(())
        })
    }

    /// All tag rows ordered by explicit position, then name.
    pub fn list_tags(&self) -> Result<Vec<TagRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r"
                SELECT id, name, parent_id, type, icon, color, description,
                       position, created_at, updated_at
                FROM tags
                ORDER BY position ASC, name ASC
                ",
            )?;
            let rows = stmt.query_map([], map_tag_row)?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    pub fn tag_count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
            Ok(i64_to_usize_saturating(count))
        })
    }
}

fn map_tag_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TagRow> {
    let type_raw = row.get::<_, String>(3)?;
    let tag_type = TagType::parse(&type_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown tag type '{type_raw}'").into(),
        )
    })?;
    Ok(TagRow {
        id: row.get(0)?,
        name: row.get(1)?,
        parent_id: row.get(2)?,
        tag_type,
        icon: row.get(4)?,
        color: row.get(5)?,
        description: row.get(6)?,
        position: row.get(7)?,
        created_at: super::snippets::parse_required_rfc3339(8, &row.get::<_, String>(8)?)?,
        updated_at: super::snippets::parse_required_rfc3339(9, &row.get::<_, String>(9)?)?,
    })
}

pub(super) fn i64_to_usize_saturating(value: i64) -> usize {
    if value <= 0 {
        0
    } else {
        usize::try_from(value).unwrap_or(usize::MAX)
    }
}
