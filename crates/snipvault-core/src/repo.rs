//! The dual-source repository: one read/write surface over a mandatory
//! writable primary store and an optional read-only secondary store.
//!
//! Reads merge the two sources in memory, each source inside its own
//! transaction; there is no cross-store atomicity. Writes always go to the
//! primary store. A secondary store that cannot be opened at construction
//! time degrades the session to primary-only — no retries, no repair.

use crate::config::RepositoryConfig;
use crate::error::Result;
use crate::hierarchy;
use crate::models::{
    Origin, SnippetChanges, SnippetDraft, SnippetRecord, StoreMode, TagRecord, TagRow, TagType,
};
use crate::store::SqliteStore;

pub struct SnippetRepository {
    primary: SqliteStore,
    secondary: Option<SqliteStore>,
    mode: StoreMode,
}

impl std::fmt::Debug for SnippetRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnippetRepository")
            .field("mode", &self.mode.as_str())
            .field("secondary_attached", &self.secondary.is_some())
            .finish()
    }
}

impl SnippetRepository {
    /// Opens the primary store (creating it if needed) and, when the mode
    /// asks for it, attaches the secondary store read-only. A configured
    /// but unreachable secondary logs a warning and leaves the session
    /// primary-only for its lifetime.
    pub fn open(config: &RepositoryConfig) -> Result<Self> {
        let primary = SqliteStore::open(&config.primary_path)?;

        let mut mode = config.mode;
        let secondary = if mode.includes_secondary() {
            match &config.secondary_path {
                Some(path) => match SqliteStore::open_read_only(path) {
                    Ok(store) => Some(store),
                    Err(err) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %err,
                            "secondary store unavailable, continuing primary-only",
                        );
                        None
                    }
                },
                None => {
                    tracing::warn!(
                        mode = mode.as_str(),
                        "mode requires a secondary store but none is configured",
                    );
                    None
                }
            }
        } else {
            None
        };
        if secondary.is_none() {
            mode = StoreMode::PrimaryOnly;
        }

        Ok(Self {
            primary,
            secondary,
            mode,
        })
    }

    /// The effective mode after any construction-time degradation.
    #[must_use]
    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Primary tags first (explicit position, then name), secondary tags
    /// appended when the mode includes them. Every record carries its full
    /// hierarchy path, resolved per source.
    pub fn get_all_tags(&self) -> Result<Vec<TagRecord>> {
        let mut out = annotate_tags(self.primary.list_tags()?, Origin::Primary)?;
        if let Some(secondary) = self.attached_secondary() {
            out.extend(annotate_tags(secondary.list_tags()?, Origin::Secondary)?);
        }
        Ok(out)
    }

    /// Snippets under one tag, name order within each source.
    pub fn get_snippets_by_tag(&self, tag_id: i64) -> Result<Vec<SnippetRecord>> {
        let mut out = self.primary.snippets_by_tag(tag_id)?;
        if let Some(secondary) = self.attached_secondary() {
            out.extend(tag_secondary(secondary.snippets_by_tag(tag_id)?));
        }
        Ok(out)
    }

    pub fn get_all_snippets(&self) -> Result<Vec<SnippetRecord>> {
        let mut out = self.primary.list_snippets()?;
        if let Some(secondary) = self.attached_secondary() {
            out.extend(tag_secondary(secondary.list_snippets()?));
        }
        Ok(out)
    }

    /// Coarse store-level pre-filter over name and description with an
    /// optional exact language filter, merged across sources. Feed the
    /// result to the ranking engine for relevance ordering.
    pub fn search(&self, query: &str, language: Option<&str>) -> Result<Vec<SnippetRecord>> {
        let mut out = self.primary.filter_snippets(query, language)?;
        if let Some(secondary) = self.attached_secondary() {
            out.extend(tag_secondary(secondary.filter_snippets(query, language)?));
        }
        Ok(out)
    }

    pub fn get_snippet(&self, id: i64) -> Result<SnippetRecord> {
        self.primary.get_snippet(id)
    }

    pub fn add_snippet(&self, draft: &SnippetDraft) -> Result<SnippetRecord> {
        let id = self.primary.create_snippet(draft)?;
        self.primary.get_snippet(id)
    }

    pub fn update_snippet(&self, id: i64, changes: &SnippetChanges) -> Result<()> {
        self.primary.update_snippet(id, changes)
    }

    pub fn delete_snippet(&self, id: i64) -> Result<()> {
        self.primary.delete_snippet(id)
    }

    pub fn toggle_favorite(&self, id: i64) -> Result<bool> {
        self.primary.toggle_favorite(id)
    }

    pub fn record_usage(&self, id: i64) -> Result<()> {
        self.primary.record_usage(id)
    }

    pub fn favorite_snippets(&self) -> Result<Vec<SnippetRecord>> {
        self.primary.favorite_snippets()
    }

    pub fn get_or_create_tag(
        &self,
        name: &str,
        parent_id: Option<i64>,
        tag_type: TagType,
    ) -> Result<i64> {
        self.primary.get_or_create_tag(name, parent_id, tag_type)
    }

    pub fn set_tag_display(&self, id: i64, icon: &str, color: &str) -> Result<()> {
        self.primary.set_tag_display(id, icon, color)
    }

    /// Association tag ids for one primary snippet.
    pub fn snippet_tag_ids(&self, snippet_id: i64) -> Result<Vec<i64>> {
        self.primary.tag_ids_for(snippet_id)
    }

    /// Explicit teardown. Dropping the repository releases both store
    /// handles; this just names the step.
    pub fn close(self) {
        drop(self);
    }

    fn attached_secondary(&self) -> Option<&SqliteStore> {
        if self.mode.includes_secondary() {
            self.secondary.as_ref()
        } else {
            None
        }
    }
}

fn annotate_tags(rows: Vec<TagRow>, origin: Origin) -> Result<Vec<TagRecord>> {
    let paths = hierarchy::full_paths(&rows)?;
    Ok(rows
        .into_iter()
        .zip(paths)
        .map(|(row, full_path)| TagRecord::from_row(row, full_path, origin))
        .collect())
}

// Rows read out of the secondary store are tagged by provenance, whatever
// their stored origin column says.
fn tag_secondary(mut rows: Vec<SnippetRecord>) -> Vec<SnippetRecord> {
    for row in &mut rows {
        row.origin = Origin::Secondary;
    }
    rows
}
