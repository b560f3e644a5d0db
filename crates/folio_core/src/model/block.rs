//! Block domain model.
//!
//! # Responsibility
//! - Define the closed set of block types and their wire names.
//! - Carry type-specific payloads as a tagged union keyed by block type.
//! - Keep the persisted JSON shape `{ id, type, content, data? }`.
//!
//! # Invariants
//! - `id` is unique within one document's block list.
//! - `data`, when present, always matches `kind` (enforced on decode).
//! - Types without a structured payload never carry `data`.

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use uuid::Uuid;

/// Opaque block identifier, stable across reorderings.
pub type BlockId = String;

/// Fixed id of the tech-stack pseudo-block merged in on save.
pub const TECH_STACK_BLOCK_ID: &str = "tech-stack-static";
/// Fixed id of the bibliography pseudo-block merged in on save.
pub const BIBLIOGRAPHY_BLOCK_ID: &str = "bibliography-static";

/// Closed set of block kinds.
///
/// Serialized with the short names used by stored documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    #[serde(rename = "h1")]
    Heading1,
    #[serde(rename = "h2")]
    Heading2,
    #[serde(rename = "p")]
    Paragraph,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "gallery")]
    Gallery,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "blockquote")]
    Blockquote,
    #[serde(rename = "divider")]
    Divider,
    #[serde(rename = "objective-header")]
    ObjectiveHeader,
    #[serde(rename = "objectives")]
    Objectives,
    #[serde(rename = "diagram")]
    Diagram,
    #[serde(rename = "comparison")]
    Comparison,
    #[serde(rename = "tech-stack")]
    TechStack,
    #[serde(rename = "bibliography")]
    Bibliography,
    #[serde(rename = "widget")]
    Widget,
}

impl BlockType {
    pub const ALL: [BlockType; 16] = [
        Self::Heading1,
        Self::Heading2,
        Self::Paragraph,
        Self::Image,
        Self::Gallery,
        Self::Video,
        Self::Code,
        Self::Blockquote,
        Self::Divider,
        Self::ObjectiveHeader,
        Self::Objectives,
        Self::Diagram,
        Self::Comparison,
        Self::TechStack,
        Self::Bibliography,
        Self::Widget,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heading1 => "h1",
            Self::Heading2 => "h2",
            Self::Paragraph => "p",
            Self::Image => "image",
            Self::Gallery => "gallery",
            Self::Video => "video",
            Self::Code => "code",
            Self::Blockquote => "blockquote",
            Self::Divider => "divider",
            Self::ObjectiveHeader => "objective-header",
            Self::Objectives => "objectives",
            Self::Diagram => "diagram",
            Self::Comparison => "comparison",
            Self::TechStack => "tech-stack",
            Self::Bibliography => "bibliography",
            Self::Widget => "widget",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL.into_iter().find(|kind| kind.as_str() == trimmed)
    }

    /// Headings feed the index-log outline.
    pub fn is_heading(self) -> bool {
        matches!(self, Self::Heading1 | Self::Heading2)
    }
}

/// Objective header payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveHeader {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
}

/// One card in an objectives grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveItem {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    /// Completion percentage, 0..=100.
    #[serde(default)]
    pub progress: u8,
}

impl ObjectiveItem {
    /// Card added by the slash command or the "add objective" action.
    pub fn placeholder() -> Self {
        Self {
            label: "OBJ".to_string(),
            title: "Nuevo Objetivo".to_string(),
            desc: "...".to_string(),
            progress: 50,
        }
    }
}

/// One diagram node. Style fields mirror design-studio template classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(
        rename = "templateId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub template_id: Option<String>,
}

impl DiagramNode {
    /// Bare node with text and position, no style.
    pub fn plain(id: impl Into<String>, text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            x,
            y,
            shape: None,
            icon: None,
            bg_color: None,
            text_color: None,
            border_style: None,
            shadow_style: None,
            font: None,
            template_id: None,
        }
    }
}

/// Directed edge between two diagram nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramConnection {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramData {
    #[serde(default)]
    pub nodes: Vec<DiagramNode>,
    #[serde(default)]
    pub connections: Vec<DiagramConnection>,
}

impl DiagramData {
    /// Two unconnected nodes, `START` and `END`.
    pub fn start_end() -> Self {
        Self {
            nodes: vec![
                DiagramNode::plain("node_start", "START", 50.0, 150.0),
                DiagramNode::plain("node_end", "END", 350.0, 150.0),
            ],
            connections: Vec::new(),
        }
    }

    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut DiagramNode> {
        self.nodes.iter_mut().find(|node| node.id == node_id)
    }

    /// Removes a node and every connection touching it.
    pub fn remove_node(&mut self, node_id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id != node_id);
        self.connections
            .retain(|conn| conn.from != node_id && conn.to != node_id);
        self.nodes.len() != before
    }
}

/// Text given to freshly added diagram nodes.
pub const NEW_NODE_TEXT: &str = "NEW_NODE";

/// Node style designed in the design studio and applied to diagram nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub shape: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub bg_color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub border_style: Option<String>,
    #[serde(default)]
    pub shadow_style: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
}

impl DiagramNode {
    /// Freshly added node with the house box style.
    pub fn styled_default() -> Self {
        let mut id = String::from("node_");
        id.extend(fresh_block_id().chars().take(6));
        Self {
            shape: Some("box".to_string()),
            bg_color: Some("bg-white".to_string()),
            text_color: Some("text-charcoal".to_string()),
            border_style: Some("border-2 border-charcoal".to_string()),
            shadow_style: Some("shadow-[4px_4px_0_#1a1a1a]".to_string()),
            ..Self::plain(id, NEW_NODE_TEXT, 200.0, 160.0)
        }
    }

    /// Copies the template style onto this node. Untouched node text takes
    /// the template name.
    pub fn apply_template(&mut self, template: &NodeTemplate) {
        self.template_id = Some(template.id.clone());
        self.shape = template.shape.clone();
        self.icon = template.icon.clone();
        self.bg_color = template.bg_color.clone();
        self.text_color = template.text_color.clone();
        self.border_style = template.border_style.clone();
        self.shadow_style = template.shadow_style.clone();
        self.font = template.font.clone();
        if self.text == NEW_NODE_TEXT {
            self.text = template.name.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    #[serde(default)]
    pub col1: String,
    #[serde(default)]
    pub col2: String,
}

impl ComparisonRow {
    pub fn cell_mut(&mut self, column: ComparisonColumn) -> &mut String {
        match column {
            ComparisonColumn::First => &mut self.col1,
            ComparisonColumn::Second => &mut self.col2,
        }
    }
}

/// One of the two columns of a comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonColumn {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonData {
    #[serde(rename = "col1Title", default)]
    pub col1_title: String,
    #[serde(rename = "col2Title", default)]
    pub col2_title: String,
    #[serde(default)]
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonData {
    pub fn title_mut(&mut self, column: ComparisonColumn) -> &mut String {
        match column {
            ComparisonColumn::First => &mut self.col1_title,
            ComparisonColumn::Second => &mut self.col2_title,
        }
    }
}

impl Default for ComparisonData {
    fn default() -> Self {
        Self {
            col1_title: "OPCIÓN A".to_string(),
            col2_title: "OPCIÓN B".to_string(),
            rows: vec![ComparisonRow::default(), ComparisonRow::default()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageLayout {
    pub size: String,
    pub align: String,
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            size: "full".to_string(),
            align: "center".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryData {
    pub images: Vec<String>,
    pub layout: String,
}

impl Default for GalleryData {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            layout: "grid".to_string(),
        }
    }
}

/// Where a video block's `content` URL comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    #[default]
    Youtube,
    Upload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoData {
    #[serde(default)]
    pub source: VideoSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStackData {
    #[serde(default)]
    pub status: String,
}

/// Type-specific payload of a block.
///
/// Serialized untagged: the block's `type` field is the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockData {
    ObjectiveHeader(ObjectiveHeader),
    Objectives(Vec<ObjectiveItem>),
    Diagram(DiagramData),
    Comparison(ComparisonData),
    Image(ImageLayout),
    Gallery(GalleryData),
    Video(VideoData),
    TechStack(TechStackData),
    /// Widget payloads are designed elsewhere and kept opaque.
    Widget(Value),
}

impl BlockData {
    /// Payload a freshly created block of `kind` starts with.
    pub fn default_for(kind: BlockType) -> Option<Self> {
        match kind {
            BlockType::ObjectiveHeader => Some(Self::ObjectiveHeader(ObjectiveHeader {
                title: "02_MISSION_OBJECTIVES".to_string(),
                subtitle: "/TARGETS".to_string(),
            })),
            BlockType::Objectives => Some(Self::Objectives(default_objectives())),
            BlockType::Diagram => Some(Self::Diagram(DiagramData::start_end())),
            BlockType::Comparison => Some(Self::Comparison(ComparisonData::default())),
            BlockType::Image => Some(Self::Image(ImageLayout::default())),
            BlockType::Gallery => Some(Self::Gallery(GalleryData::default())),
            BlockType::Video => Some(Self::Video(VideoData::default())),
            _ => None,
        }
    }

    /// Payload a block re-typed by the slash command starts with.
    ///
    /// Same as `default_for` except objectives, which start with a single
    /// placeholder card.
    pub fn slash_default(kind: BlockType) -> Option<Self> {
        match kind {
            BlockType::Objectives => Some(Self::Objectives(vec![ObjectiveItem::placeholder()])),
            _ => Self::default_for(kind),
        }
    }

    /// Decodes a raw JSON payload for `kind`.
    ///
    /// `null` and payloads on kinds without a structured variant decode to
    /// `None`.
    fn decode(kind: BlockType, value: Value) -> Result<Option<Self>, serde_json::Error> {
        if value.is_null() {
            return Ok(None);
        }
        let data = match kind {
            BlockType::ObjectiveHeader => Self::ObjectiveHeader(serde_json::from_value(value)?),
            BlockType::Objectives => Self::Objectives(serde_json::from_value(value)?),
            BlockType::Diagram => Self::Diagram(serde_json::from_value(value)?),
            BlockType::Comparison => Self::Comparison(serde_json::from_value(value)?),
            BlockType::Image => Self::Image(serde_json::from_value(value)?),
            BlockType::Gallery => Self::Gallery(serde_json::from_value(value)?),
            BlockType::Video => Self::Video(serde_json::from_value(value)?),
            BlockType::TechStack => Self::TechStack(serde_json::from_value(value)?),
            BlockType::Widget => Self::Widget(value),
            BlockType::Heading1
            | BlockType::Heading2
            | BlockType::Paragraph
            | BlockType::Code
            | BlockType::Blockquote
            | BlockType::Divider
            | BlockType::Bibliography => return Ok(None),
        };
        Ok(Some(data))
    }
}

impl Serialize for BlockData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::ObjectiveHeader(value) => value.serialize(serializer),
            Self::Objectives(value) => value.serialize(serializer),
            Self::Diagram(value) => value.serialize(serializer),
            Self::Comparison(value) => value.serialize(serializer),
            Self::Image(value) => value.serialize(serializer),
            Self::Gallery(value) => value.serialize(serializer),
            Self::Video(value) => value.serialize(serializer),
            Self::TechStack(value) => value.serialize(serializer),
            Self::Widget(value) => value.serialize(serializer),
        }
    }
}

fn default_objectives() -> Vec<ObjectiveItem> {
    [
        ("OBJ_ALPHA", "Latency Reduction", "Reduce data-to-screen latency.", 80),
        ("OBJ_BETA", "Modular Design", "Create a drag-and-drop grid system.", 40),
        ("OBJ_GAMMA", "Accessibility", "Ensure WCAG 2.1 AA compliance.", 95),
    ]
    .into_iter()
    .map(|(label, title, desc, progress)| ObjectiveItem {
        label: label.to_string(),
        title: title.to_string(),
        desc: desc.to_string(),
        progress,
    })
    .collect()
}

/// One content unit in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    /// Serialized as `type`.
    pub kind: BlockType,
    /// Primary text payload; empty for structural kinds.
    pub content: String,
    pub data: Option<BlockData>,
}

impl Block {
    /// Creates an empty block of `kind` with a fresh id and default payload.
    pub fn new(kind: BlockType) -> Self {
        Self {
            id: fresh_block_id(),
            kind,
            content: String::new(),
            data: BlockData::default_for(kind),
        }
    }

    /// Creates a block of `kind` with text content and default payload.
    pub fn with_content(kind: BlockType, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(kind)
        }
    }

    /// Re-types this block in place: content cleared, slash-command payload
    /// set. The id is kept.
    pub fn convert(&mut self, kind: BlockType) {
        self.kind = kind;
        self.content.clear();
        self.data = BlockData::slash_default(kind);
    }

    /// Mutable diagram payload, created empty when missing.
    ///
    /// Returns `None` when this block is not a diagram.
    pub fn diagram_mut(&mut self) -> Option<&mut DiagramData> {
        if self.kind != BlockType::Diagram {
            return None;
        }
        if !matches!(self.data, Some(BlockData::Diagram(_))) {
            self.data = Some(BlockData::Diagram(DiagramData::default()));
        }
        match &mut self.data {
            Some(BlockData::Diagram(data)) => Some(data),
            _ => None,
        }
    }

    /// Mutable comparison payload, created with defaults when missing.
    pub fn comparison_mut(&mut self) -> Option<&mut ComparisonData> {
        if self.kind != BlockType::Comparison {
            return None;
        }
        if !matches!(self.data, Some(BlockData::Comparison(_))) {
            self.data = Some(BlockData::Comparison(ComparisonData::default()));
        }
        match &mut self.data {
            Some(BlockData::Comparison(data)) => Some(data),
            _ => None,
        }
    }

    /// Mutable objectives list, created empty when missing.
    pub fn objectives_mut(&mut self) -> Option<&mut Vec<ObjectiveItem>> {
        if self.kind != BlockType::Objectives {
            return None;
        }
        if !matches!(self.data, Some(BlockData::Objectives(_))) {
            self.data = Some(BlockData::Objectives(Vec::new()));
        }
        match &mut self.data {
            Some(BlockData::Objectives(items)) => Some(items),
            _ => None,
        }
    }

    pub fn objective_header_mut(&mut self) -> Option<&mut ObjectiveHeader> {
        if self.kind != BlockType::ObjectiveHeader {
            return None;
        }
        if !matches!(self.data, Some(BlockData::ObjectiveHeader(_))) {
            self.data = Some(BlockData::ObjectiveHeader(ObjectiveHeader {
                title: String::new(),
                subtitle: String::new(),
            }));
        }
        match &mut self.data {
            Some(BlockData::ObjectiveHeader(header)) => Some(header),
            _ => None,
        }
    }

    /// Mutable image layout, created with defaults when missing.
    pub fn image_layout_mut(&mut self) -> Option<&mut ImageLayout> {
        if self.kind != BlockType::Image {
            return None;
        }
        if !matches!(self.data, Some(BlockData::Image(_))) {
            self.data = Some(BlockData::Image(ImageLayout::default()));
        }
        match &mut self.data {
            Some(BlockData::Image(layout)) => Some(layout),
            _ => None,
        }
    }

    /// Mutable gallery payload, created with defaults when missing.
    pub fn gallery_mut(&mut self) -> Option<&mut GalleryData> {
        if self.kind != BlockType::Gallery {
            return None;
        }
        if !matches!(self.data, Some(BlockData::Gallery(_))) {
            self.data = Some(BlockData::Gallery(GalleryData::default()));
        }
        match &mut self.data {
            Some(BlockData::Gallery(data)) => Some(data),
            _ => None,
        }
    }
}

/// Generates a fresh opaque block id.
pub fn fresh_block_id() -> BlockId {
    Uuid::new_v4().simple().to_string()
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let field_count = if self.data.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("Block", field_count)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.kind)?;
        state.serialize_field("content", &self.content)?;
        if let Some(data) = &self.data {
            state.serialize_field("data", data)?;
        }
        state.end()
    }
}

#[derive(Deserialize)]
struct WireBlock {
    id: BlockId,
    #[serde(rename = "type")]
    kind: BlockType,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    data: Value,
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireBlock::deserialize(deserializer)?;
        let data = BlockData::decode(wire.kind, wire.data).map_err(|err| {
            D::Error::custom(format!(
                "invalid `{}` payload for block `{}`: {err}",
                wire.kind.as_str(),
                wire.id
            ))
        })?;
        Ok(Self {
            id: wire.id,
            kind: wire.kind,
            content: wire.content.unwrap_or_default(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Block, BlockData, BlockType, DiagramConnection, DiagramData, DiagramNode, NodeTemplate,
        VideoSource,
    };
    use serde_json::json;

    #[test]
    fn template_styles_node_and_renames_untouched_text() {
        let template = NodeTemplate {
            id: "tpl-db".to_string(),
            name: "Database".to_string(),
            shape: Some("cylinder".to_string()),
            icon: Some("storage".to_string()),
            bg_color: None,
            text_color: None,
            border_style: None,
            shadow_style: None,
            font: Some("mono".to_string()),
        };
        let mut node = DiagramNode::styled_default();
        assert!(node.id.starts_with("node_"));
        assert_eq!(node.id.len(), 11);
        node.apply_template(&template);
        assert_eq!(node.text, "Database");
        assert_eq!(node.template_id.as_deref(), Some("tpl-db"));
        assert_eq!(node.bg_color, None);

        let mut renamed = DiagramNode::plain("n", "Cache", 0.0, 0.0);
        renamed.apply_template(&template);
        assert_eq!(renamed.text, "Cache");
    }

    #[test]
    fn slash_conversion_seeds_a_single_objective() {
        let mut block = Block::with_content(BlockType::Paragraph, "text");
        block.convert(BlockType::Objectives);
        assert!(block.content.is_empty());
        let Some(BlockData::Objectives(items)) = &block.data else {
            panic!("expected objectives payload");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "OBJ");
        assert_eq!(items[0].title, "Nuevo Objetivo");
        assert_eq!(items[0].progress, 50);

        let inserted = Block::new(BlockType::Objectives);
        assert!(matches!(&inserted.data, Some(BlockData::Objectives(items)) if items.len() == 3));
    }

    #[test]
    fn payload_accessors_only_match_their_block_type() {
        let mut image = Block::new(BlockType::Image);
        assert!(image.objectives_mut().is_none());
        image.image_layout_mut().unwrap().align = "left".to_string();
        assert_eq!(
            image.data,
            Some(BlockData::Image(super::ImageLayout {
                size: "full".to_string(),
                align: "left".to_string(),
            }))
        );

        let mut header = Block::new(BlockType::ObjectiveHeader);
        header.data = None;
        assert_eq!(header.objective_header_mut().unwrap().title, "");
    }

    #[test]
    fn removing_a_node_drops_its_connections() {
        let mut data = DiagramData::start_end();
        data.connections.push(DiagramConnection {
            from: "node_start".to_string(),
            to: "node_end".to_string(),
        });
        assert!(data.remove_node("node_end"));
        assert!(data.connections.is_empty());
        assert!(!data.remove_node("node_end"));
    }

    #[test]
    fn wire_names_parse_back() {
        for kind in BlockType::ALL {
            assert_eq!(BlockType::parse(kind.as_str()), Some(kind));
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                json!(kind.as_str()),
                "serde name must match as_str for {kind:?}"
            );
        }
        assert_eq!(BlockType::parse("h3"), None);
    }

    #[test]
    fn diagram_defaults_to_start_and_end_nodes() {
        let block = Block::new(BlockType::Diagram);
        let Some(BlockData::Diagram(data)) = &block.data else {
            panic!("diagram block must carry diagram data");
        };
        let texts = data.nodes.iter().map(|n| n.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["START", "END"]);
        assert!(data.connections.is_empty());
        assert!(block.content.is_empty());
    }

    #[test]
    fn structural_payloads_use_stored_field_names() {
        let mut block = Block::new(BlockType::Comparison);
        block.id = "cmp".to_string();
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "comparison");
        assert_eq!(value["data"]["col1Title"], "OPCIÓN A");
        assert_eq!(value["data"]["rows"].as_array().unwrap().len(), 2);

        let paragraph = Block::with_content(BlockType::Paragraph, "hi");
        let value = serde_json::to_value(&paragraph).unwrap();
        assert!(value.get("data").is_none());
    }

    #[test]
    fn decode_keeps_uploaded_video_marker_and_tolerates_missing_content() {
        let block: Block = serde_json::from_value(json!({
            "id": "v1",
            "type": "video",
            "data": { "source": "upload" }
        }))
        .unwrap();
        assert_eq!(block.content, "");
        assert_eq!(
            block.data,
            Some(BlockData::Video(super::VideoData {
                source: VideoSource::Upload
            }))
        );
    }

    #[test]
    fn decode_rejects_payload_that_does_not_match_type() {
        let result = serde_json::from_value::<Block>(json!({
            "id": "d1",
            "type": "diagram",
            "content": "",
            "data": { "nodes": "not-a-list" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn convert_keeps_id_and_resets_payload() {
        let mut block = Block::with_content(BlockType::Paragraph, "/");
        let id = block.id.clone();
        block.convert(BlockType::Gallery);
        assert_eq!(block.id, id);
        assert!(block.content.is_empty());
        assert!(matches!(block.data, Some(BlockData::Gallery(_))));
    }
}
