//! Full-graph snapshot and replay for the export/import collaborator.
//!
//! The snapshot carries tags (with hierarchy edges), snippets, and
//! per-snippet association ids from the primary store. Replay goes through
//! the same creation API the presentation layer uses, remapping old ids to
//! the importing store's ids so referential integrity survives the move.
//! Serializing the snapshot to a particular file format is the
//! collaborator's business, not this module's.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SnipError};
use crate::models::{Origin, SnippetDraft, TagType};
use crate::repo::SnippetRepository;

pub const GRAPH_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetGraph {
    pub version: u32,
    pub tags: Vec<GraphTag>,
    pub snippets: Vec<GraphSnippet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphTag {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    #[serde(rename = "type")]
    pub tag_type: TagType,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnippet {
    pub name: String,
    pub code: String,
    pub language: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportSummary {
    pub tags: usize,
    pub snippets: usize,
    pub skipped_associations: usize,
}

/// Snapshot of the primary store's graph. Secondary rows are supplementary
/// read-only data and never travel with an export.
pub fn export_graph(repo: &SnippetRepository) -> Result<SnippetGraph> {
    let tags = repo
        .get_all_tags()?
        .into_iter()
        .filter(|tag| tag.origin == Origin::Primary)
        .map(|tag| GraphTag {
            id: tag.id,
            name: tag.name,
            parent_id: tag.parent_id,
            tag_type: tag.tag_type,
            icon: tag.icon,
            color: tag.color,
        })
        .collect();

    let mut snippets = Vec::new();
    for snippet in repo.get_all_snippets()? {
        if snippet.origin != Origin::Primary {
            continue;
        }
        let tag_ids = repo.snippet_tag_ids(snippet.id)?;
        snippets.push(GraphSnippet {
            name: snippet.name,
            code: snippet.code,
            language: snippet.language,
            description: snippet.description,
            tag_ids,
        });
    }

    Ok(SnippetGraph {
        version: GRAPH_FORMAT_VERSION,
        tags,
        snippets,
    })
}

/// Replays a snapshot into the repository's primary store.
///
/// Tags import parent-first so every tag is created with its final parent
/// in one pass; `get_or_create_tag` keeps re-imports from duplicating
/// them. Snippets import with remapped association ids; association ids
/// the snapshot never defined are counted and skipped rather than
/// aborting the replay.
pub fn import_graph(repo: &SnippetRepository, graph: &SnippetGraph) -> Result<ImportSummary> {
    if graph.version != GRAPH_FORMAT_VERSION {
        return Err(SnipError::Validation(format!(
            "unsupported graph version {}, expected {GRAPH_FORMAT_VERSION}",
            graph.version
        )));
    }

    let mut summary = ImportSummary::default();
    let mut id_map: HashMap<i64, i64> = HashMap::new();

    for tag in topological_tags(&graph.tags)? {
        let parent = match tag.parent_id {
            // Topological order guarantees the parent is already mapped.
            Some(old_parent) => Some(id_map[&old_parent]),
            None => None,
        };
        let new_id = repo.get_or_create_tag(&tag.name, parent, tag.tag_type)?;
        repo.set_tag_display(new_id, &tag.icon, &tag.color)?;
        id_map.insert(tag.id, new_id);
        summary.tags += 1;
    }

    for snippet in &graph.snippets {
        let mut tag_ids = Vec::with_capacity(snippet.tag_ids.len());
        for old_id in &snippet.tag_ids {
            match id_map.get(old_id) {
                Some(new_id) => tag_ids.push(*new_id),
                None => summary.skipped_associations += 1,
            }
        }
        repo.add_snippet(&SnippetDraft {
            name: snippet.name.clone(),
            code: snippet.code.clone(),
            language: snippet.language.clone(),
            description: snippet.description.clone(),
            tag_ids,
        })?;
        summary.snippets += 1;
    }

    Ok(summary)
}

/// Orders tags so every parent precedes its children. A parent edge into a
/// tag the snapshot does not define, or a parent cycle, cannot be replayed
/// faithfully and aborts the import.
fn topological_tags(tags: &[GraphTag]) -> Result<Vec<&GraphTag>> {
    let known: HashMap<i64, &GraphTag> = tags.iter().map(|tag| (tag.id, tag)).collect();
    let mut ordered = Vec::with_capacity(tags.len());
    let mut placed: HashSet<i64> = HashSet::with_capacity(tags.len());

    for tag in tags {
        if let Some(parent_id) = tag.parent_id
            && !known.contains_key(&parent_id)
        {
            return Err(SnipError::Consistency(format!(
                "graph tag {} references missing parent {parent_id}",
                tag.id
            )));
        }
    }

    let mut pending: Vec<&GraphTag> = tags.iter().collect();
    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|tag| {
            let ready = match tag.parent_id {
                Some(parent_id) => placed.contains(&parent_id),
                None => true,
            };
            if ready {
                placed.insert(tag.id);
                ordered.push(*tag);
            }
            !ready
        });
        if pending.len() == before {
            return Err(SnipError::Consistency(
                "graph tag hierarchy contains a cycle".to_string(),
            ));
        }
    }

    Ok(ordered)
}
