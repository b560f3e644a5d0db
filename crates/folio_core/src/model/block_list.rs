//! Ordered block sequence forming a document body.
//!
//! # Responsibility
//! - Own the body blocks and expose explicit structural commands.
//! - Derive the index-log outline from heading blocks.
//!
//! # Invariants
//! - Sequence order is rendering order and drives heading numbering.
//! - Commands never fail on out-of-range indices: inserts clamp, removals
//!   report `None`, moves clamp both ends.
//! - `index_log` is a pure projection of the current headings.

use crate::model::block::{Block, BlockType};
use crate::text::{heading_label, heading_number};
use serde::{Deserialize, Serialize};

/// What a structural command changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEdit {
    /// Position the edited block ends up at (or was removed from).
    pub index: usize,
    /// Whether the heading outline may have changed.
    pub touches_headings: bool,
}

/// Ordered body blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockList {
    blocks: Vec<Block>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Creates a block of `kind` with default payload and inserts it at
    /// `at` (clamped to `0..=len`).
    pub fn insert(&mut self, kind: BlockType, at: usize) -> BlockEdit {
        self.insert_block(Block::new(kind), at)
    }

    /// Inserts an already-built block at `at` (clamped to `0..=len`).
    pub fn insert_block(&mut self, block: Block, at: usize) -> BlockEdit {
        let index = at.min(self.blocks.len());
        let touches_headings = block.kind.is_heading();
        self.blocks.insert(index, block);
        BlockEdit {
            index,
            touches_headings,
        }
    }

    /// Appends a new block of `kind`.
    pub fn push(&mut self, kind: BlockType) -> BlockEdit {
        self.insert(kind, self.blocks.len())
    }

    /// Removes the block at `index`.
    pub fn remove(&mut self, index: usize) -> Option<(Block, BlockEdit)> {
        if index >= self.blocks.len() {
            return None;
        }
        let block = self.blocks.remove(index);
        let edit = BlockEdit {
            index,
            touches_headings: block.kind.is_heading(),
        };
        Some((block, edit))
    }

    /// Moves one block, shifting the ones in between.
    ///
    /// Both indices are clamped to the last valid position. Returns `None`
    /// for an empty list.
    pub fn move_block(&mut self, from: usize, to: usize) -> Option<BlockEdit> {
        let last = self.blocks.len().checked_sub(1)?;
        let from = from.min(last);
        let to = to.min(last);
        let block = self.blocks.remove(from);
        let touches_headings = block.kind.is_heading();
        self.blocks.insert(to, block);
        Some(BlockEdit {
            index: to,
            touches_headings: touches_headings && from != to,
        })
    }

    /// Replaces the whole sequence (history restore, draft recovery).
    pub fn replace(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }

    /// Outline of non-blank headings: `NN_LABEL` lines joined with `\n`.
    pub fn index_log(&self) -> String {
        self.numbered_headings()
            .map(|(number, label)| format!("{number}_{}", label.to_uppercase()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rewrites heading content to `NN_Label` (case preserved) and returns
    /// the regenerated index-log.
    ///
    /// Applying it twice yields the same content and outline.
    pub fn format_headings(&mut self) -> String {
        let mut position = 0;
        for block in self.blocks.iter_mut().filter(|b| b.kind.is_heading()) {
            if let Some(label) = heading_label(&block.content) {
                position += 1;
                block.content = format!("{}_{label}", heading_number(position));
            }
        }
        self.index_log()
    }

    fn numbered_headings(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.blocks
            .iter()
            .filter(|block| block.kind.is_heading())
            .filter_map(|block| heading_label(&block.content))
            .enumerate()
            .map(|(idx, label)| (heading_number(idx + 1), label))
    }
}

#[cfg(test)]
mod tests {
    use super::BlockList;
    use crate::model::block::{Block, BlockType};

    fn heading(text: &str) -> Block {
        Block::with_content(BlockType::Heading1, text)
    }

    #[test]
    fn index_log_numbers_non_blank_headings_in_order() {
        let list = BlockList::from_blocks(vec![
            heading("Intro"),
            Block::with_content(BlockType::Paragraph, "body"),
            Block::with_content(BlockType::Heading2, "   "),
            Block::with_content(BlockType::Heading2, "Next  steps"),
        ]);
        assert_eq!(list.index_log(), "01_INTRO\n02_NEXT_STEPS");
    }

    #[test]
    fn format_headings_is_idempotent() {
        let mut list = BlockList::from_blocks(vec![heading("Alpha one"), heading("07_Beta")]);
        let first = list.format_headings();
        let content_after_first = list.clone();
        let second = list.format_headings();
        assert_eq!(first, "01_ALPHA_ONE\n02_BETA");
        assert_eq!(first, second);
        assert_eq!(list, content_after_first);
        assert_eq!(list.get(0).unwrap().content, "01_Alpha_one");
    }

    #[test]
    fn move_reorders_and_reports_heading_change() {
        let mut list = BlockList::from_blocks(vec![heading("Alpha"), heading("Beta")]);
        let edit = list.move_block(1, 0).unwrap();
        assert!(edit.touches_headings);
        assert_eq!(list.index_log(), "01_BETA\n02_ALPHA");
    }

    #[test]
    fn insert_clamps_and_remove_ignores_out_of_range() {
        let mut list = BlockList::new();
        let edit = list.insert(BlockType::Paragraph, 99);
        assert_eq!(edit.index, 0);
        assert!(!edit.touches_headings);
        assert!(list.remove(5).is_none());
        assert!(list.move_block(0, 9).is_some());
        assert!(BlockList::new().move_block(0, 1).is_none());
    }

    #[test]
    fn inserted_blocks_get_unique_ids() {
        let mut list = BlockList::new();
        for _ in 0..20 {
            list.push(BlockType::Paragraph);
        }
        let mut ids = list.iter().map(|b| b.id.clone()).collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }
}
