//! Document records and the editable draft.
//!
//! # Responsibility
//! - Define the stored document shape exchanged with the document store.
//! - Define the in-memory draft the editor mutates.
//! - Split stored blocks into body / widgets / pseudo-blocks on load and
//!   merge them back on save.
//!
//! # Invariants
//! - Pseudo-blocks (`tech-stack`, `bibliography`) never live in the body;
//!   they are rebuilt from draft metadata on every save.
//! - Widget blocks keep their relative order across a load/save cycle.

use crate::model::block::{
    Block, BlockData, BlockType, TechStackData, BIBLIOGRAPHY_BLOCK_ID, TECH_STACK_BLOCK_ID,
};
use crate::model::block_list::BlockList;
use crate::model::cover::CoverImage;
use serde::{Deserialize, Serialize};

/// Stable identifier assigned by the document store.
pub type DocumentId = String;

/// Deploy status shown on works until the author changes it.
pub const DEFAULT_DEPLOY_STATUS: &str = "LIVE_PRODUCTION";

/// Section of the site a document belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    #[default]
    Work,
    Log,
    Guide,
}

impl DocumentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Log => "log",
            Self::Guide => "guide",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "work" => Some(Self::Work),
            "log" => Some(Self::Log),
            "guide" => Some(Self::Guide),
            _ => None,
        }
    }
}

/// Publication lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Stored document, as read from the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub slug: String,
    pub title: String,
    /// Cover URL, optionally with a `#x=..&y=..&s=..` framing fragment.
    pub cover_photo: String,
    pub category: DocumentCategory,
    pub tags: Vec<String>,
    pub index_log: String,
    /// Full block array: body, widgets and pseudo-blocks.
    pub blocks: Vec<Block>,
    pub status: DocumentStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Write payload for the document store.
///
/// `id = None` creates a new record; `Some` overwrites in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub id: Option<DocumentId>,
    /// Empty means "derive from title".
    pub slug: String,
    pub title: String,
    pub cover_photo: String,
    pub category: DocumentCategory,
    pub tags: Vec<String>,
    pub index_log: String,
    pub blocks: Vec<Block>,
    pub status: DocumentStatus,
}

/// Editable in-memory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub id: Option<DocumentId>,
    pub title: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub category: DocumentCategory,
    pub status: DocumentStatus,
    pub cover: CoverImage,
    pub index_log: String,
    /// Body blocks.
    pub blocks: BlockList,
    /// Freely positioned overlay blocks.
    pub widgets: Vec<Block>,
    pub bibliography: String,
    pub deploy_status: String,
}

impl DocumentDraft {
    /// Empty draft in `category`.
    pub fn new(category: DocumentCategory) -> Self {
        Self {
            id: None,
            title: String::new(),
            slug: String::new(),
            tags: Vec::new(),
            category,
            status: DocumentStatus::Draft,
            cover: CoverImage::default(),
            index_log: String::new(),
            blocks: BlockList::new(),
            widgets: Vec::new(),
            bibliography: String::new(),
            deploy_status: DEFAULT_DEPLOY_STATUS.to_string(),
        }
    }

    /// Hydrates a draft from a stored record.
    ///
    /// Body and widget blocks are split by type; the tech-stack block feeds
    /// `deploy_status` and the bibliography block feeds `bibliography`.
    pub fn from_record(record: DocumentRecord) -> Self {
        let mut draft = Self::new(record.category);
        draft.id = Some(record.id);
        draft.title = record.title;
        draft.slug = record.slug;
        draft.tags = record.tags;
        draft.status = record.status;
        draft.cover = CoverImage::parse(&record.cover_photo);
        draft.index_log = record.index_log;

        let mut body = Vec::new();
        for block in record.blocks {
            match block.kind {
                BlockType::Widget => draft.widgets.push(block),
                BlockType::TechStack => {
                    if let Some(BlockData::TechStack(data)) = &block.data {
                        if !data.status.is_empty() {
                            draft.deploy_status = data.status.clone();
                        }
                    }
                }
                BlockType::Bibliography => draft.bibliography = block.content,
                _ => body.push(block),
            }
        }
        draft.blocks = BlockList::from_blocks(body);
        draft
    }

    /// Whether there is anything worth protecting locally.
    pub fn has_content(&self) -> bool {
        !self.title.is_empty() || !self.blocks.is_empty()
    }

    /// Full stored block array: tech-stack (works only), body, widgets and
    /// bibliography (when non-blank), in that order.
    pub fn merged_blocks(&self) -> Vec<Block> {
        let mut all = Vec::with_capacity(self.blocks.len() + self.widgets.len() + 2);
        if self.category == DocumentCategory::Work {
            all.push(Block {
                id: TECH_STACK_BLOCK_ID.to_string(),
                kind: BlockType::TechStack,
                content: self.tags.join(", "),
                data: Some(BlockData::TechStack(TechStackData {
                    status: self.deploy_status.clone(),
                })),
            });
        }
        all.extend(self.blocks.iter().cloned());
        all.extend(self.widgets.iter().cloned());
        if !self.bibliography.trim().is_empty() {
            all.push(Block {
                id: BIBLIOGRAPHY_BLOCK_ID.to_string(),
                kind: BlockType::Bibliography,
                content: self.bibliography.clone(),
                data: None,
            });
        }
        all
    }

    /// Write payload for the document store.
    pub fn to_input(&self) -> DocumentInput {
        DocumentInput {
            id: self.id.clone(),
            slug: self.slug.clone(),
            title: self.title.clone(),
            cover_photo: self.cover.encode(),
            category: self.category,
            tags: self.tags.clone(),
            index_log: self.index_log.clone(),
            blocks: self.merged_blocks(),
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentCategory, DocumentDraft, DocumentRecord, DocumentStatus};
    use crate::model::block::{Block, BlockType};

    fn record_with(blocks: Vec<Block>) -> DocumentRecord {
        DocumentRecord {
            id: "doc-1".to_string(),
            slug: "doc".to_string(),
            title: "Doc".to_string(),
            cover_photo: "https://cdn.example/c.png#x=10&y=20&s=120".to_string(),
            category: DocumentCategory::Work,
            tags: vec!["rust".to_string(), "ui".to_string()],
            index_log: String::new(),
            blocks,
            status: DocumentStatus::Published,
            created_at: 1,
            updated_at: 2,
        }
    }

    #[test]
    fn load_then_merge_preserves_block_roles() {
        let draft = DocumentDraft::from_record(record_with(vec![
            serde_json::from_value(serde_json::json!({
                "id": "tech-stack-static",
                "type": "tech-stack",
                "content": "rust, ui",
                "data": { "status": "BETA" }
            }))
            .unwrap(),
            Block::with_content(BlockType::Heading1, "Intro"),
            Block::new(BlockType::Widget),
            Block::with_content(BlockType::Paragraph, "Body"),
            Block::with_content(BlockType::Bibliography, "Knuth 1968"),
        ]));

        assert_eq!(draft.blocks.len(), 2);
        assert_eq!(draft.widgets.len(), 1);
        assert_eq!(draft.deploy_status, "BETA");
        assert_eq!(draft.bibliography, "Knuth 1968");
        assert_eq!(draft.cover.pos_x, 10);
        assert_eq!(draft.cover.scale, 120);

        let kinds = draft
            .merged_blocks()
            .iter()
            .map(|b| b.kind)
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                BlockType::TechStack,
                BlockType::Heading1,
                BlockType::Paragraph,
                BlockType::Widget,
                BlockType::Bibliography,
            ]
        );
        let input = draft.to_input();
        assert_eq!(input.cover_photo, "https://cdn.example/c.png#x=10&y=20&s=120");
        assert_eq!(input.blocks[0].content, "rust, ui");
    }

    #[test]
    fn logs_never_get_tech_stack_and_blank_bibliography_is_dropped() {
        let mut draft = DocumentDraft::new(DocumentCategory::Log);
        draft.bibliography = "   ".to_string();
        draft.blocks.push(BlockType::Paragraph);
        let kinds = draft
            .merged_blocks()
            .iter()
            .map(|b| b.kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![BlockType::Paragraph]);
    }

    #[test]
    fn has_content_checks_title_or_blocks() {
        let mut draft = DocumentDraft::new(DocumentCategory::Guide);
        assert!(!draft.has_content());
        draft.title = "T".to_string();
        assert!(draft.has_content());
    }
}
