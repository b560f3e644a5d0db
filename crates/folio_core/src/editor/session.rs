//! Editing session over one document draft.
//!
//! # Responsibility
//! - Apply block, diagram, comparison, gallery and metadata commands to the
//!   draft.
//! - Record undo history (immediately for structural edits, debounced for
//!   typing).
//! - Autosave to the local store on a fixed interval and offer recovery of a
//!   pending local draft on entry.
//! - Save to the document store, uploading a staged cover first.
//!
//! # Invariants
//! - `index_log` always reflects the current headings after any command.
//! - Local store failures are logged and never abort an edit.
//! - The local draft is cleared only after the document store confirms a
//!   save.
//! - A closed session rejects every command with `EditorError::Closed` and
//!   its timers never fire again.

use crate::config::EditorConfig;
use crate::editor::autosave::{
    clear_pending_draft, draft_key, load_pending_draft, preview_record, write_pending_draft,
    write_preview, AutosaveError, PendingDraft,
};
use crate::editor::history::HistoryStack;
use crate::editor::timer::{DebounceTimer, IntervalTimer};
use crate::logging::log_value;
use crate::model::block::{
    Block, BlockData, BlockType, ComparisonColumn, ComparisonData, DiagramConnection,
    DiagramData, DiagramNode, GalleryData, ImageLayout, NodeTemplate, ObjectiveHeader,
    ObjectiveItem, VideoData, VideoSource,
};
use crate::model::cover::{
    is_inline_encoded, is_persistable, session_local_reference, CoverImage,
};
use crate::model::document::{
    DocumentCategory, DocumentDraft, DocumentId, DocumentRecord, DocumentStatus,
};
use crate::repo::document_repo::{AssetBucket, AssetUpload, DocumentRepository, RepoError};
use crate::repo::local_store::LocalStore;
use crate::text::{generate_slug, parse_tags_input, reading_time_minutes, word_count};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EditorResult<T> = Result<T, EditorError>;

/// Editor command error.
#[derive(Debug)]
pub enum EditorError {
    /// Session was closed; no further commands are accepted.
    Closed,
    /// Block index outside the body.
    BlockNotFound(usize),
    /// Command targets a block of another type.
    WrongBlockType {
        index: usize,
        expected: BlockType,
        found: BlockType,
    },
    /// Diagram node, comparison row or gallery image missing.
    ItemNotFound(String),
    /// History snapshot could not be encoded or restored.
    Snapshot(serde_json::Error),
    /// Staged cover could not be uploaded; nothing was saved.
    CoverUpload(RepoError),
    /// Document store rejected the save; the local draft is kept.
    Save(RepoError),
    Repo(RepoError),
    Local(AutosaveError),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "editor session is closed"),
            Self::BlockNotFound(index) => write!(f, "no block at index {index}"),
            Self::WrongBlockType {
                index,
                expected,
                found,
            } => write!(
                f,
                "block {index} is `{}`, expected `{}`",
                found.as_str(),
                expected.as_str()
            ),
            Self::ItemNotFound(what) => write!(f, "not found: {what}"),
            Self::Snapshot(err) => write!(f, "history snapshot failed: {err}"),
            Self::CoverUpload(err) => write!(f, "cover upload failed: {err}"),
            Self::Save(err) => write!(f, "save failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Local(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Snapshot(err) => Some(err),
            Self::CoverUpload(err) | Self::Save(err) | Self::Repo(err) => Some(err),
            Self::Local(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AutosaveError> for EditorError {
    fn from(value: AutosaveError) -> Self {
        Self::Local(value)
    }
}

/// Result of a text edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInput {
    /// Content stored; history snapshot debounced.
    Typed,
    /// A markdown shortcut re-typed the paragraph.
    Shortcut(BlockType),
}

/// What a `tick` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub snapshot_taken: bool,
    pub autosaved: bool,
}

/// Confirmed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub slug: String,
    pub status: DocumentStatus,
    pub id: Option<DocumentId>,
}

/// Live editing session. Owns its local store.
pub struct EditorSession<S: LocalStore> {
    draft: DocumentDraft,
    history: HistoryStack,
    typing: DebounceTimer,
    autosave: IntervalTimer,
    store: S,
    pending_draft: Option<PendingDraft>,
    pending_cover: Option<AssetUpload>,
    cover_repaired: bool,
    last_autosave_at: Option<i64>,
    closed: bool,
}

impl<S: LocalStore> EditorSession<S> {
    /// Starts a session on an empty document.
    pub fn new_document(
        category: DocumentCategory,
        store: S,
        config: EditorConfig,
        now: i64,
    ) -> EditorResult<Self> {
        let session = Self::start(DocumentDraft::new(category), store, config, now)?;
        info!(
            "event=editor_open module=editor status=ok mode=new category={}",
            category.as_str()
        );
        Ok(session)
    }

    /// Starts a session on a stored document.
    ///
    /// Returns `Ok(None)` when `slug` does not exist. An inline-encoded cover
    /// is cleared in the store and reported by `cover_repaired()`.
    pub fn open<R: DocumentRepository + ?Sized>(
        repo: &R,
        slug: &str,
        store: S,
        config: EditorConfig,
        now: i64,
    ) -> EditorResult<Option<Self>> {
        let Some(mut record) = repo.get_document(slug).map_err(EditorError::Repo)? else {
            warn!(
                "event=editor_open module=editor status=not_found slug={}",
                log_value(slug)
            );
            return Ok(None);
        };

        let cover_repaired = is_inline_encoded(&record.cover_photo);
        if cover_repaired {
            record.cover_photo.clear();
            match repo.clear_cover_photo(&record.id) {
                Ok(()) => info!(
                    "event=cover_repair module=editor status=ok document_id={}",
                    record.id
                ),
                Err(err) => warn!(
                    "event=cover_repair module=editor status=error document_id={} error={}",
                    record.id, err
                ),
            }
        }

        let mut session = Self::start(DocumentDraft::from_record(record), store, config, now)?;
        session.cover_repaired = cover_repaired;
        info!(
            "event=editor_open module=editor status=ok mode=existing slug={} blocks={}",
            log_value(slug),
            session.draft.blocks.len()
        );
        Ok(Some(session))
    }

    fn start(draft: DocumentDraft, store: S, config: EditorConfig, now: i64) -> EditorResult<Self> {
        let mut session = Self {
            draft,
            history: HistoryStack::with_limit(config.history_limit),
            typing: DebounceTimer::new(config.typing_debounce_ms),
            autosave: IntervalTimer::new(config.autosave_interval_ms),
            store,
            pending_draft: None,
            pending_cover: None,
            cover_repaired: false,
            last_autosave_at: None,
            closed: false,
        };
        session.snapshot()?;
        session.autosave.start(now);
        session.check_pending_draft();
        Ok(session)
    }

    fn check_pending_draft(&mut self) {
        let key = self.autosave_key();
        match load_pending_draft(&mut self.store, &key) {
            Ok(Some(pending)) => {
                info!(
                    "event=draft_recover module=editor status=pending key={} timestamp={}",
                    key, pending.timestamp
                );
                self.pending_draft = Some(pending);
            }
            Ok(None) => {}
            Err(err) => warn!(
                "event=draft_recover module=editor status=error key={} error={}",
                key, err
            ),
        }
    }

    // ---- accessors ----

    pub fn draft(&self) -> &DocumentDraft {
        &self.draft
    }

    pub fn blocks(&self) -> &[Block] {
        self.draft.blocks.as_slice()
    }

    pub fn index_log(&self) -> &str {
        &self.draft.index_log
    }

    /// Local draft waiting for accept/discard.
    pub fn pending_draft(&self) -> Option<&PendingDraft> {
        self.pending_draft.as_ref()
    }

    /// Whether an inline-encoded cover was removed on load.
    pub fn cover_repaired(&self) -> bool {
        self.cover_repaired
    }

    pub fn has_staged_cover(&self) -> bool {
        self.pending_cover.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_autosave_at(&self) -> Option<i64> {
        self.last_autosave_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Local store key the draft autosaves under right now.
    pub fn autosave_key(&self) -> String {
        draft_key(&self.draft.slug)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn word_count(&self) -> usize {
        word_count(self.draft.blocks.iter().map(|block| block.content.as_str()))
    }

    pub fn reading_time_minutes(&self) -> usize {
        reading_time_minutes(self.word_count())
    }

    // ---- block list ----

    /// Inserts a new block of `kind` at `at` (clamped) and returns its index.
    pub fn insert_block(&mut self, kind: BlockType, at: usize) -> EditorResult<usize> {
        self.ensure_open()?;
        let edit = self.draft.blocks.insert(kind, at);
        if edit.touches_headings {
            self.refresh_index_log();
        }
        self.snapshot()?;
        Ok(edit.index)
    }

    /// Appends a new block of `kind` and returns its index.
    pub fn push_block(&mut self, kind: BlockType) -> EditorResult<usize> {
        let at = self.draft.blocks.len();
        self.insert_block(kind, at)
    }

    /// Removes the block at `index`; out of range is a no-op.
    pub fn remove_block(&mut self, index: usize) -> EditorResult<Option<Block>> {
        self.ensure_open()?;
        let Some((block, edit)) = self.draft.blocks.remove(index) else {
            return Ok(None);
        };
        if edit.touches_headings {
            self.refresh_index_log();
        }
        self.snapshot()?;
        Ok(Some(block))
    }

    /// Moves a block; both indices are clamped.
    pub fn move_block(&mut self, from: usize, to: usize) -> EditorResult<bool> {
        self.ensure_open()?;
        let Some(edit) = self.draft.blocks.move_block(from, to) else {
            return Ok(false);
        };
        if edit.touches_headings {
            self.refresh_index_log();
        }
        self.snapshot()?;
        Ok(true)
    }

    /// Stores typed text, applying markdown shortcuts on paragraphs.
    pub fn update_block_content(
        &mut self,
        index: usize,
        text: &str,
        now: i64,
    ) -> EditorResult<TextInput> {
        self.ensure_open()?;
        let block = self
            .draft
            .blocks
            .get_mut(index)
            .ok_or(EditorError::BlockNotFound(index))?;

        if block.kind == BlockType::Paragraph {
            if let Some(kind) = markdown_shortcut(text) {
                block.convert(kind);
                if kind == BlockType::Divider {
                    self.draft
                        .blocks
                        .insert(BlockType::Paragraph, index + 1);
                }
                if kind.is_heading() {
                    self.refresh_index_log();
                }
                self.snapshot()?;
                return Ok(TextInput::Shortcut(kind));
            }
        }

        block.content = text.to_string();
        if block.kind.is_heading() {
            self.refresh_index_log();
        }
        self.typing.arm(now);
        Ok(TextInput::Typed)
    }

    /// Enter: inserts an empty paragraph after `index` and returns its index.
    pub fn split_after(&mut self, index: usize) -> EditorResult<usize> {
        self.ensure_open()?;
        self.block_at(index)?;
        let edit = self.draft.blocks.insert(BlockType::Paragraph, index + 1);
        self.snapshot()?;
        Ok(edit.index)
    }

    /// Backspace: removes the block when it is empty and not the first.
    pub fn remove_if_empty(&mut self, index: usize) -> EditorResult<bool> {
        self.ensure_open()?;
        if index == 0 || !self.block_at(index)?.content.is_empty() {
            return Ok(false);
        }
        if let Some((_, edit)) = self.draft.blocks.remove(index) {
            if edit.touches_headings {
                self.refresh_index_log();
            }
        }
        self.snapshot()?;
        Ok(true)
    }

    /// Slash command: re-types the block with empty content and default
    /// payload.
    pub fn convert_block(&mut self, index: usize, kind: BlockType) -> EditorResult<()> {
        self.ensure_open()?;
        let block = self
            .draft
            .blocks
            .get_mut(index)
            .ok_or(EditorError::BlockNotFound(index))?;
        let touched_heading = block.kind.is_heading() || kind.is_heading();
        block.convert(kind);
        if touched_heading {
            self.refresh_index_log();
        }
        self.snapshot()?;
        Ok(())
    }

    // ---- history ----

    /// Restores the previous snapshot. Pending typing is recorded first so
    /// it can be redone.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.ensure_open()?;
        self.flush_typing()?;
        let Some(snapshot) = self.history.undo() else {
            return Ok(false);
        };
        let blocks = serde_json::from_str::<Vec<Block>>(snapshot).map_err(EditorError::Snapshot)?;
        self.restore(blocks);
        Ok(true)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        self.ensure_open()?;
        self.flush_typing()?;
        let Some(snapshot) = self.history.redo() else {
            return Ok(false);
        };
        let blocks = serde_json::from_str::<Vec<Block>>(snapshot).map_err(EditorError::Snapshot)?;
        self.restore(blocks);
        Ok(true)
    }

    // ---- diagram ----

    /// Adds a node, styled from `template` when given, and returns its id.
    pub fn add_diagram_node(
        &mut self,
        index: usize,
        template: Option<&NodeTemplate>,
    ) -> EditorResult<String> {
        self.ensure_open()?;
        let mut node = DiagramNode::styled_default();
        if let Some(template) = template {
            node.apply_template(template);
        }
        let node_id = node.id.clone();
        self.diagram_at(index)?.nodes.push(node);
        self.snapshot()?;
        Ok(node_id)
    }

    /// Removes a node and the connections touching it.
    pub fn remove_diagram_node(&mut self, index: usize, node_id: &str) -> EditorResult<()> {
        self.ensure_open()?;
        if !self.diagram_at(index)?.remove_node(node_id) {
            return Err(EditorError::ItemNotFound(format!("diagram node `{node_id}`")));
        }
        self.snapshot()?;
        Ok(())
    }

    pub fn connect_diagram_nodes(&mut self, index: usize, from: &str, to: &str) -> EditorResult<()> {
        self.ensure_open()?;
        let diagram = self.diagram_at(index)?;
        for node_id in [from, to] {
            if !diagram.nodes.iter().any(|node| node.id == node_id) {
                return Err(EditorError::ItemNotFound(format!("diagram node `{node_id}`")));
            }
        }
        diagram.connections.push(DiagramConnection {
            from: from.to_string(),
            to: to.to_string(),
        });
        self.snapshot()?;
        Ok(())
    }

    pub fn apply_node_template(
        &mut self,
        index: usize,
        node_id: &str,
        template: &NodeTemplate,
    ) -> EditorResult<()> {
        self.ensure_open()?;
        self.diagram_node_at(index, node_id)?.apply_template(template);
        self.snapshot()?;
        Ok(())
    }

    /// Types into a node label. History snapshot is debounced.
    pub fn set_diagram_node_text(
        &mut self,
        index: usize,
        node_id: &str,
        text: &str,
        now: i64,
    ) -> EditorResult<()> {
        self.ensure_open()?;
        self.diagram_node_at(index, node_id)?.text = text.to_string();
        self.typing.arm(now);
        Ok(())
    }

    /// Live drag position. Not recorded in history.
    pub fn move_diagram_node(&mut self, index: usize, node_id: &str, x: f64, y: f64) -> EditorResult<()> {
        self.ensure_open()?;
        let node = self.diagram_node_at(index, node_id)?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Final drag position; recorded in history.
    pub fn finish_node_drag(&mut self, index: usize, node_id: &str, x: f64, y: f64) -> EditorResult<()> {
        self.move_diagram_node(index, node_id, x, y)?;
        self.snapshot()?;
        Ok(())
    }

    // ---- comparison ----

    /// Appends a comparison block with two empty rows.
    pub fn add_comparison_block(&mut self) -> EditorResult<usize> {
        self.push_block(BlockType::Comparison)
    }

    pub fn add_comparison_row(&mut self, index: usize) -> EditorResult<usize> {
        self.ensure_open()?;
        let comparison = self.comparison_at(index)?;
        comparison.rows.push(Default::default());
        let rows = comparison.rows.len();
        self.snapshot()?;
        Ok(rows)
    }

    pub fn remove_comparison_row(&mut self, index: usize, row: usize) -> EditorResult<()> {
        self.ensure_open()?;
        let comparison = self.comparison_at(index)?;
        if row >= comparison.rows.len() {
            return Err(EditorError::ItemNotFound(format!("comparison row {row}")));
        }
        comparison.rows.remove(row);
        self.snapshot()?;
        Ok(())
    }

    /// Types into one cell. History snapshot is debounced.
    pub fn set_comparison_cell(
        &mut self,
        index: usize,
        row: usize,
        column: ComparisonColumn,
        text: &str,
        now: i64,
    ) -> EditorResult<()> {
        self.ensure_open()?;
        let cell = self
            .comparison_at(index)?
            .rows
            .get_mut(row)
            .ok_or_else(|| EditorError::ItemNotFound(format!("comparison row {row}")))?
            .cell_mut(column);
        *cell = text.to_string();
        self.typing.arm(now);
        Ok(())
    }

    pub fn set_comparison_title(
        &mut self,
        index: usize,
        column: ComparisonColumn,
        text: &str,
        now: i64,
    ) -> EditorResult<()> {
        self.ensure_open()?;
        *self.comparison_at(index)?.title_mut(column) = text.to_string();
        self.typing.arm(now);
        Ok(())
    }

    // ---- objectives ----

    pub fn set_objective_header(
        &mut self,
        index: usize,
        title: &str,
        subtitle: &str,
        now: i64,
    ) -> EditorResult<()> {
        self.ensure_open()?;
        let header = self.objective_header_at(index)?;
        header.title = title.to_string();
        header.subtitle = subtitle.to_string();
        self.typing.arm(now);
        Ok(())
    }

    /// Replaces one card. Progress is capped at 100; snapshot is debounced.
    pub fn update_objective(
        &mut self,
        index: usize,
        item: usize,
        objective: ObjectiveItem,
        now: i64,
    ) -> EditorResult<()> {
        self.ensure_open()?;
        let slot = self
            .objectives_at(index)?
            .get_mut(item)
            .ok_or_else(|| EditorError::ItemNotFound(format!("objective {item}")))?;
        *slot = ObjectiveItem {
            progress: objective.progress.min(100),
            ..objective
        };
        self.typing.arm(now);
        Ok(())
    }

    /// Appends a placeholder card and returns the new card count.
    pub fn add_objective(&mut self, index: usize) -> EditorResult<usize> {
        self.ensure_open()?;
        let items = self.objectives_at(index)?;
        items.push(ObjectiveItem::placeholder());
        let count = items.len();
        self.snapshot()?;
        Ok(count)
    }

    pub fn remove_objective(&mut self, index: usize, item: usize) -> EditorResult<ObjectiveItem> {
        self.ensure_open()?;
        let items = self.objectives_at(index)?;
        if item >= items.len() {
            return Err(EditorError::ItemNotFound(format!("objective {item}")));
        }
        let removed = items.remove(item);
        self.snapshot()?;
        Ok(removed)
    }

    // ---- media ----

    /// Sets image size and alignment. Recorded in history immediately.
    pub fn set_image_layout(&mut self, index: usize, size: &str, align: &str) -> EditorResult<()> {
        self.ensure_open()?;
        self.expect_kind(index, BlockType::Image)?;
        let layout = self
            .draft
            .blocks
            .get_mut(index)
            .and_then(Block::image_layout_mut)
            .ok_or(EditorError::BlockNotFound(index))?;
        *layout = ImageLayout {
            size: size.trim().to_string(),
            align: align.trim().to_string(),
        };
        self.snapshot()?;
        Ok(())
    }

    /// Uploads gallery images in order and returns how many were added.
    ///
    /// Failed uploads are logged and skipped.
    pub fn upload_gallery_images<R: DocumentRepository + ?Sized>(
        &mut self,
        repo: &R,
        index: usize,
        uploads: &[AssetUpload],
    ) -> EditorResult<usize> {
        self.ensure_open()?;
        self.expect_kind(index, BlockType::Gallery)?;

        let mut urls = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match repo.upload_asset(AssetBucket::Gallery, upload) {
                Ok(url) => urls.push(url),
                Err(err) => warn!(
                    "event=gallery_upload module=editor status=skipped file_name={} error={}",
                    log_value(&upload.file_name), err
                ),
            }
        }

        let added = urls.len();
        if added > 0 {
            self.gallery_at(index)?.images.extend(urls);
            self.snapshot()?;
        }
        Ok(added)
    }

    pub fn remove_gallery_image(&mut self, index: usize, image: usize) -> EditorResult<String> {
        self.ensure_open()?;
        let gallery = self.gallery_at(index)?;
        if image >= gallery.images.len() {
            return Err(EditorError::ItemNotFound(format!("gallery image {image}")));
        }
        let removed = gallery.images.remove(image);
        self.snapshot()?;
        Ok(removed)
    }

    /// Uploads a video file into a video block and returns its URL.
    pub fn upload_video<R: DocumentRepository + ?Sized>(
        &mut self,
        repo: &R,
        index: usize,
        upload: &AssetUpload,
    ) -> EditorResult<String> {
        self.ensure_open()?;
        self.expect_kind(index, BlockType::Video)?;
        let url = repo
            .upload_asset(AssetBucket::Videos, upload)
            .map_err(|err| {
                error!(
                    "event=video_upload module=editor status=error file_name={} error={}",
                    log_value(&upload.file_name), err
                );
                EditorError::Repo(err)
            })?;

        let block = self
            .draft
            .blocks
            .get_mut(index)
            .ok_or(EditorError::BlockNotFound(index))?;
        block.content = url.clone();
        block.data = Some(BlockData::Video(VideoData {
            source: VideoSource::Upload,
        }));
        self.snapshot()?;
        Ok(url)
    }

    // ---- metadata ----

    pub fn set_title(&mut self, title: &str) -> EditorResult<()> {
        self.ensure_open()?;
        self.draft.title = title.to_string();
        Ok(())
    }

    pub fn set_slug(&mut self, slug: &str) -> EditorResult<()> {
        self.ensure_open()?;
        self.draft.slug = slug.trim().to_string();
        Ok(())
    }

    pub fn set_category(&mut self, category: DocumentCategory) -> EditorResult<()> {
        self.ensure_open()?;
        self.draft.category = category;
        Ok(())
    }

    pub fn set_status(&mut self, status: DocumentStatus) -> EditorResult<()> {
        self.ensure_open()?;
        self.draft.status = status;
        Ok(())
    }

    /// Replaces tags from comma-separated input.
    pub fn set_tags_input(&mut self, input: &str) -> EditorResult<()> {
        self.ensure_open()?;
        self.draft.tags = parse_tags_input(input);
        Ok(())
    }

    /// Appends a system tag unless already present.
    pub fn append_system_tag(&mut self, tag: &str) -> EditorResult<bool> {
        self.ensure_open()?;
        let tag = tag.trim();
        if tag.is_empty() || self.draft.tags.iter().any(|t| t == tag) {
            return Ok(false);
        }
        self.draft.tags.push(tag.to_string());
        Ok(true)
    }

    pub fn set_bibliography(&mut self, text: &str) -> EditorResult<()> {
        self.ensure_open()?;
        self.draft.bibliography = text.to_string();
        Ok(())
    }

    pub fn set_deploy_status(&mut self, status: &str) -> EditorResult<()> {
        self.ensure_open()?;
        self.draft.deploy_status = status.to_string();
        Ok(())
    }

    /// Points the cover at an already hosted image. Framing is kept.
    pub fn set_cover_url(&mut self, url: &str) -> EditorResult<()> {
        self.ensure_open()?;
        self.pending_cover = None;
        self.draft.cover.url = url.trim().to_string();
        Ok(())
    }

    pub fn clear_cover(&mut self) -> EditorResult<()> {
        self.ensure_open()?;
        self.pending_cover = None;
        self.draft.cover = CoverImage::default();
        Ok(())
    }

    /// Sets cover focus (clamped to 0..=100) and zoom.
    pub fn set_cover_framing(&mut self, pos_x: i32, pos_y: i32, scale: u16) -> EditorResult<()> {
        self.ensure_open()?;
        self.draft.cover.set_framing(pos_x, pos_y, scale);
        Ok(())
    }

    /// Holds a cover file until save/preview uploads it and shows it through
    /// a session-local reference meanwhile.
    pub fn stage_cover_upload(&mut self, upload: AssetUpload, now: i64) -> EditorResult<String> {
        self.ensure_open()?;
        let reference = session_local_reference(&upload.file_name);
        self.draft.cover = CoverImage::from_url(reference.clone());
        debug!(
            "event=cover_stage module=editor status=ok file_name={} bytes={}",
            log_value(&upload.file_name),
            upload.bytes.len()
        );
        self.pending_cover = Some(upload);
        self.autosave_now(now);
        self.snapshot()?;
        Ok(reference)
    }

    // ---- recovery ----

    /// Applies the pending local draft. Returns `false` when there is none.
    pub fn accept_draft(&mut self) -> EditorResult<bool> {
        self.ensure_open()?;
        let Some(pending) = self.pending_draft.take() else {
            return Ok(false);
        };

        self.draft.title = pending.title;
        self.draft.blocks.replace(pending.blocks);
        if is_persistable(&pending.cover_photo) {
            self.draft.cover = CoverImage::parse(&pending.cover_photo);
        }
        self.draft.status = pending.status;
        self.refresh_index_log();
        self.snapshot()?;
        info!(
            "event=draft_recover module=editor status=accepted key={}",
            self.autosave_key()
        );
        Ok(true)
    }

    /// Drops the pending local draft and deletes it from the store.
    pub fn discard_draft(&mut self) -> EditorResult<()> {
        self.ensure_open()?;
        self.pending_draft = None;
        let key = self.autosave_key();
        match clear_pending_draft(&mut self.store, &key) {
            Ok(()) => info!("event=draft_recover module=editor status=discarded key={key}"),
            Err(err) => warn!(
                "event=draft_recover module=editor status=error key={} error={}",
                key, err
            ),
        }
        Ok(())
    }

    // ---- timers ----

    /// Drives the typing debounce and the autosave interval.
    pub fn tick(&mut self, now: i64) -> EditorResult<TickReport> {
        let mut report = TickReport::default();
        if self.closed {
            return Ok(report);
        }
        if self.typing.fire_if_due(now) {
            report.snapshot_taken = self.snapshot()?;
        }
        if self.autosave.poll(now) {
            report.autosaved = self.autosave_now(now);
        }
        Ok(report)
    }

    /// Writes the local draft now. Returns whether a record was written.
    ///
    /// Empty drafts are skipped and store failures are only logged.
    pub fn autosave_now(&mut self, now: i64) -> bool {
        if self.closed || !self.draft.has_content() {
            return false;
        }
        let key = self.autosave_key();
        match write_pending_draft(&mut self.store, &key, &self.draft, now) {
            Ok(()) => {
                self.last_autosave_at = Some(now);
                debug!("event=autosave module=editor status=ok key={key}");
                true
            }
            Err(err) => {
                warn!(
                    "event=autosave module=editor status=error key={} error={}",
                    key, err
                );
                false
            }
        }
    }

    // ---- save / preview ----

    /// Saves the draft to the document store.
    ///
    /// A staged cover is uploaded first; failure aborts before anything is
    /// persisted. On success the local draft is removed.
    pub fn save<R: DocumentRepository + ?Sized>(
        &mut self,
        repo: &R,
        now: i64,
    ) -> EditorResult<SaveOutcome> {
        self.ensure_open()?;
        self.upload_staged_cover(repo)?;

        let previous_key = self.autosave_key();
        self.draft.index_log = self.draft.blocks.format_headings();

        let mut input = self.draft.to_input();
        if input.slug.is_empty() {
            input.slug = generate_slug(&input.title);
        }
        let slug = repo.save_document(&input).map_err(|err| {
            error!(
                "event=document_save module=editor status=error slug={} error={}",
                log_value(&input.slug),
                err
            );
            EditorError::Save(err)
        })?;
        self.draft.slug = slug.clone();

        if self.draft.id.is_none() {
            match repo.get_document(&slug) {
                Ok(Some(record)) => self.draft.id = Some(record.id),
                Ok(None) => {}
                Err(err) => warn!(
                    "event=document_save module=editor status=degraded slug={} error={}",
                    slug, err
                ),
            }
        }

        let final_key = self.autosave_key();
        for key in [previous_key, final_key] {
            if let Err(err) = clear_pending_draft(&mut self.store, &key) {
                warn!(
                    "event=draft_clear module=editor status=error key={} error={}",
                    key, err
                );
            }
        }
        self.pending_draft = None;
        self.snapshot()?;

        info!(
            "event=document_save module=editor status=ok slug={} state={} blocks={} at={}",
            slug,
            self.draft.status.as_str(),
            input.blocks.len(),
            now
        );
        Ok(SaveOutcome {
            slug,
            status: self.draft.status,
            id: self.draft.id.clone(),
        })
    }

    /// Writes the preview record and returns it.
    pub fn preview<R: DocumentRepository + ?Sized>(
        &mut self,
        repo: &R,
        now: i64,
    ) -> EditorResult<DocumentRecord> {
        self.ensure_open()?;
        self.upload_staged_cover(repo)?;
        self.draft.index_log = self.draft.blocks.format_headings();
        self.snapshot()?;

        let record = preview_record(&self.draft, now);
        write_preview(&mut self.store, &record)?;
        info!(
            "event=preview_write module=editor status=ok blocks={}",
            record.blocks.len()
        );
        Ok(record)
    }

    /// Stops both timers. Further commands fail with `Closed`.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.typing.cancel();
        self.autosave.stop();
        info!(
            "event=editor_close module=editor status=ok slug={}",
            log_value(&self.draft.slug)
        );
    }

    // ---- internals ----

    fn ensure_open(&self) -> EditorResult<()> {
        if self.closed {
            return Err(EditorError::Closed);
        }
        Ok(())
    }

    fn snapshot(&mut self) -> EditorResult<bool> {
        let encoded = serde_json::to_string(&self.draft.blocks).map_err(EditorError::Snapshot)?;
        Ok(self.history.record(encoded))
    }

    fn flush_typing(&mut self) -> EditorResult<()> {
        if self.typing.is_armed() {
            self.typing.cancel();
            self.snapshot()?;
        }
        Ok(())
    }

    fn restore(&mut self, blocks: Vec<Block>) {
        self.draft.blocks.replace(blocks);
        self.refresh_index_log();
    }

    fn refresh_index_log(&mut self) {
        self.draft.index_log = self.draft.blocks.index_log();
    }

    fn upload_staged_cover<R: DocumentRepository + ?Sized>(&mut self, repo: &R) -> EditorResult<()> {
        let Some(upload) = self.pending_cover.as_ref() else {
            return Ok(());
        };
        let url = repo
            .upload_asset(AssetBucket::Covers, upload)
            .map_err(|err| {
                error!(
                    "event=cover_upload module=editor status=error file_name={} error={}",
                    log_value(&upload.file_name), err
                );
                EditorError::CoverUpload(err)
            })?;
        self.pending_cover = None;
        self.draft.cover.url = url;
        Ok(())
    }

    fn block_at(&self, index: usize) -> EditorResult<&Block> {
        self.draft
            .blocks
            .get(index)
            .ok_or(EditorError::BlockNotFound(index))
    }

    fn expect_kind(&self, index: usize, expected: BlockType) -> EditorResult<()> {
        let found = self.block_at(index)?.kind;
        if found != expected {
            return Err(EditorError::WrongBlockType {
                index,
                expected,
                found,
            });
        }
        Ok(())
    }

    fn diagram_at(&mut self, index: usize) -> EditorResult<&mut DiagramData> {
        self.expect_kind(index, BlockType::Diagram)?;
        self.draft
            .blocks
            .get_mut(index)
            .and_then(Block::diagram_mut)
            .ok_or(EditorError::BlockNotFound(index))
    }

    fn diagram_node_at(&mut self, index: usize, node_id: &str) -> EditorResult<&mut DiagramNode> {
        self.diagram_at(index)?
            .node_mut(node_id)
            .ok_or_else(|| EditorError::ItemNotFound(format!("diagram node `{node_id}`")))
    }

    fn comparison_at(&mut self, index: usize) -> EditorResult<&mut ComparisonData> {
        self.expect_kind(index, BlockType::Comparison)?;
        self.draft
            .blocks
            .get_mut(index)
            .and_then(Block::comparison_mut)
            .ok_or(EditorError::BlockNotFound(index))
    }

    fn objectives_at(&mut self, index: usize) -> EditorResult<&mut Vec<ObjectiveItem>> {
        self.expect_kind(index, BlockType::Objectives)?;
        self.draft
            .blocks
            .get_mut(index)
            .and_then(Block::objectives_mut)
            .ok_or(EditorError::BlockNotFound(index))
    }

    fn objective_header_at(&mut self, index: usize) -> EditorResult<&mut ObjectiveHeader> {
        self.expect_kind(index, BlockType::ObjectiveHeader)?;
        self.draft
            .blocks
            .get_mut(index)
            .and_then(Block::objective_header_mut)
            .ok_or(EditorError::BlockNotFound(index))
    }

    fn gallery_at(&mut self, index: usize) -> EditorResult<&mut GalleryData> {
        self.expect_kind(index, BlockType::Gallery)?;
        self.draft
            .blocks
            .get_mut(index)
            .and_then(Block::gallery_mut)
            .ok_or(EditorError::BlockNotFound(index))
    }
}

/// Block type a paragraph turns into when its whole text is a shortcut.
fn markdown_shortcut(text: &str) -> Option<BlockType> {
    match text {
        "# " => Some(BlockType::Heading1),
        "## " => Some(BlockType::Heading2),
        "---" => Some(BlockType::Divider),
        "```" => Some(BlockType::Code),
        "> " => Some(BlockType::Blockquote),
        _ => None,
    }
}
