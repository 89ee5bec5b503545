//! Document model: canvas elements, their typed payloads, and the persisted unit.
//!
//! This module defines what is on a canvas (`CanvasElement`, `ElementKind`,
//! `ElementContent`), a sparse-update type for dialog edits (`ElementPatch`),
//! and the persisted document (`CanvasData`) together with the load-time
//! normalization pass that repairs legacy documents.
//!
//! On the wire an element is `{ id, type, position, size, content, metadata? }`.
//! In memory the kind is carried by the `ElementContent` variant, so a kind and
//! its payload can never disagree.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::consts::{
    BMC_SIZE, CONNECTOR_SIZE, GROUP_SIZE, HEX_BASE_HEIGHT, HEX_BASE_WIDTH, IMAGE_SIZE, SHAPE_SIZE, STICKY_SIZE,
    STORY_SIZE, TEXT_SIZE,
};

/// Identifier of an element, unique within one canvas.
pub type ElementId = String;

/// Free-form metadata bag attached to elements and documents.
pub type Metadata = Map<String, Value>;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DocError {
    #[error("document parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {kind} content: {source}")]
    Content {
        kind: ElementKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("content kind mismatch: element is {expected}, payload is {found}")]
    KindMismatch { expected: ElementKind, found: ElementKind },
}

// =============================================================================
// KIND + GEOMETRY
// =============================================================================

/// The kind of a canvas element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// Free text label.
    Text,
    /// Sticky note.
    Sticky,
    /// Basic shape (rectangle, ellipse, diamond, hexagon).
    Shape,
    /// Line between two elements.
    Connector,
    /// Embedded image.
    Image,
    /// Visual container for other elements.
    Group,
    /// Business Model Canvas board.
    Bmc,
    /// User-story card.
    Story,
    /// Knowledge-item hexagon.
    KnowledgeItem,
    /// Free-form hexagon.
    CustomHexi,
    /// Planning-focus hexagon.
    PlanningFocus,
    /// Hexagon that links to an artifact, file or URL.
    ArtifactLink,
}

impl ElementKind {
    pub const ALL: [ElementKind; 12] = [
        Self::Text,
        Self::Sticky,
        Self::Shape,
        Self::Connector,
        Self::Image,
        Self::Group,
        Self::Bmc,
        Self::Story,
        Self::KnowledgeItem,
        Self::CustomHexi,
        Self::PlanningFocus,
        Self::ArtifactLink,
    ];

    /// Wire name, as used in the `type` field.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Sticky => "sticky",
            Self::Shape => "shape",
            Self::Connector => "connector",
            Self::Image => "image",
            Self::Group => "group",
            Self::Bmc => "bmc",
            Self::Story => "story",
            Self::KnowledgeItem => "knowledgeItem",
            Self::CustomHexi => "customHexi",
            Self::PlanningFocus => "planningFocus",
            Self::ArtifactLink => "artifactLink",
        }
    }

    /// Whether this kind is drawn as a standard-size hexagon.
    #[must_use]
    pub fn is_hexagon(self) -> bool {
        matches!(self, Self::KnowledgeItem | Self::CustomHexi | Self::PlanningFocus | Self::ArtifactLink)
    }

    /// Size given to freshly created elements of this kind.
    #[must_use]
    pub fn default_size(self) -> Size {
        let (width, height) = match self {
            Self::Text => TEXT_SIZE,
            Self::Sticky => STICKY_SIZE,
            Self::Shape => SHAPE_SIZE,
            Self::Connector => CONNECTOR_SIZE,
            Self::Image => IMAGE_SIZE,
            Self::Group => GROUP_SIZE,
            Self::Bmc => BMC_SIZE,
            Self::Story => STORY_SIZE,
            Self::KnowledgeItem | Self::CustomHexi | Self::PlanningFocus | Self::ArtifactLink => {
                (HEX_BASE_WIDTH, HEX_BASE_HEIGHT)
            }
        };
        Size { width, height }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-left corner of an element in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This position with both coordinates clamped to be non-negative.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self { x: self.x.max(0.0), y: self.y.max(0.0) }
    }

    /// This position shifted by `(dx, dy)` and clamped to be non-negative.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }.clamped()
    }
}

/// Width and height of an element in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

/// Generate a fresh element id of the form `"{kind}-{uuid}"`.
#[must_use]
pub fn generate_id(kind: ElementKind) -> ElementId {
    format!("{}-{}", kind.as_str(), Uuid::new_v4())
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Icons available to hexagon elements.
///
/// Stored by name on the wire; names outside this registry are dropped on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IconName {
    Lightbulb,
    Target,
    Users,
    Chart,
    Gear,
    Document,
    Flag,
    Star,
    Rocket,
    Shield,
}

impl IconName {
    pub const ALL: [IconName; 10] = [
        Self::Lightbulb,
        Self::Target,
        Self::Users,
        Self::Chart,
        Self::Gear,
        Self::Document,
        Self::Flag,
        Self::Star,
        Self::Rocket,
        Self::Shield,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lightbulb => "lightbulb",
            Self::Target => "target",
            Self::Users => "users",
            Self::Chart => "chart",
            Self::Gear => "gear",
            Self::Document => "document",
            Self::Flag => "flag",
            Self::Star => "star",
            Self::Rocket => "rocket",
            Self::Shield => "shield",
        }
    }

    /// Look up an icon by wire name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|icon| icon.as_str().eq_ignore_ascii_case(name))
    }
}

fn lenient_icon<'de, D>(deserializer: D) -> Result<Option<IconName>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(IconName::from_name))
}

fn default_sticky_color() -> String {
    "#FEF08A".to_owned()
}

fn default_hex_color() -> String {
    "#DBEAFE".to_owned()
}

fn default_ink() -> String {
    "#1F2937".to_owned()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    pub font_size: f64,
    pub color: String,
}

impl Default for TextContent {
    fn default() -> Self {
        Self { text: "Text".to_owned(), font_size: 16.0, color: default_ink() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StickyContent {
    pub text: String,
    pub color: String,
}

impl Default for StickyContent {
    fn default() -> Self {
        Self { text: String::new(), color: default_sticky_color() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
    Hexagon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeContent {
    pub shape: ShapeKind,
    pub fill: String,
    pub stroke: String,
    pub label: String,
}

impl Default for ShapeContent {
    fn default() -> Self {
        Self { shape: ShapeKind::Rectangle, fill: "#E5E7EB".to_owned(), stroke: default_ink(), label: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectorContent {
    pub from: Option<ElementId>,
    pub to: Option<ElementId>,
    pub label: String,
    pub stroke: String,
}

impl Default for ConnectorContent {
    fn default() -> Self {
        Self { from: None, to: None, label: String::new(), stroke: default_ink() }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageContent {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupContent {
    pub children: Vec<ElementId>,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryContent {
    pub title: String,
    pub as_a: String,
    pub i_want: String,
    pub so_that: String,
    pub acceptance_criteria: Vec<String>,
    pub priority: Priority,
    pub story_points: Option<u32>,
    pub color: String,
}

impl Default for StoryContent {
    fn default() -> Self {
        Self {
            title: "New story".to_owned(),
            as_a: String::new(),
            i_want: String::new(),
            so_that: String::new(),
            acceptance_criteria: Vec::new(),
            priority: Priority::Medium,
            story_points: None,
            color: "#FFFFFF".to_owned(),
        }
    }
}

impl StoryContent {
    /// The "As a ..., I want ..., so that ..." sentence, skipping empty parts.
    #[must_use]
    pub fn narrative(&self) -> String {
        let mut parts = Vec::new();
        if !self.as_a.trim().is_empty() {
            parts.push(format!("As a {}", self.as_a.trim()));
        }
        if !self.i_want.trim().is_empty() {
            parts.push(format!("I want {}", self.i_want.trim()));
        }
        if !self.so_that.trim().is_empty() {
            parts.push(format!("so that {}", self.so_that.trim()));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KnowledgeItemContent {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(deserialize_with = "lenient_icon")]
    pub icon: Option<IconName>,
    pub color: String,
}

impl Default for KnowledgeItemContent {
    fn default() -> Self {
        Self {
            title: "Knowledge".to_owned(),
            description: String::new(),
            category: String::new(),
            icon: Some(IconName::Lightbulb),
            color: default_hex_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomHexiContent {
    pub label: String,
    pub color: String,
    #[serde(deserialize_with = "lenient_icon")]
    pub icon: Option<IconName>,
}

impl Default for CustomHexiContent {
    fn default() -> Self {
        Self { label: String::new(), color: default_hex_color(), icon: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanningFocusContent {
    pub title: String,
    pub focus_area: String,
    pub notes: String,
    pub color: String,
}

impl Default for PlanningFocusContent {
    fn default() -> Self {
        Self {
            title: "Focus".to_owned(),
            focus_area: String::new(),
            notes: String::new(),
            color: "#FDE68A".to_owned(),
        }
    }
}

// =============================================================================
// BUSINESS MODEL CANVAS
// =============================================================================

/// One of the nine Business Model Canvas blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BmcBlock {
    KeyPartners,
    KeyActivities,
    KeyResources,
    ValuePropositions,
    CustomerRelationships,
    Channels,
    CustomerSegments,
    CostStructure,
    RevenueStreams,
}

impl BmcBlock {
    pub const ALL: [BmcBlock; 9] = [
        Self::KeyPartners,
        Self::KeyActivities,
        Self::KeyResources,
        Self::ValuePropositions,
        Self::CustomerRelationships,
        Self::Channels,
        Self::CustomerSegments,
        Self::CostStructure,
        Self::RevenueStreams,
    ];

    /// Wire key of this block.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::KeyPartners => "keyPartners",
            Self::KeyActivities => "keyActivities",
            Self::KeyResources => "keyResources",
            Self::ValuePropositions => "valuePropositions",
            Self::CustomerRelationships => "customerRelationships",
            Self::Channels => "channels",
            Self::CustomerSegments => "customerSegments",
            Self::CostStructure => "costStructure",
            Self::RevenueStreams => "revenueStreams",
        }
    }

    /// Heading shown on the board.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::KeyPartners => "Key Partners",
            Self::KeyActivities => "Key Activities",
            Self::KeyResources => "Key Resources",
            Self::ValuePropositions => "Value Propositions",
            Self::CustomerRelationships => "Customer Relationships",
            Self::Channels => "Channels",
            Self::CustomerSegments => "Customer Segments",
            Self::CostStructure => "Cost Structure",
            Self::RevenueStreams => "Revenue Streams",
        }
    }
}

/// A BMC block value: either free text or a list of bullet items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BmcField {
    Text(String),
    Items(Vec<String>),
}

impl Default for BmcField {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl BmcField {
    /// Display form: text as-is (trimmed), items as `"• item"` lines.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_owned(),
            Self::Items(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(|item| format!("• {item}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BmcData {
    pub key_partners: BmcField,
    pub key_activities: BmcField,
    pub key_resources: BmcField,
    pub value_propositions: BmcField,
    pub customer_relationships: BmcField,
    pub channels: BmcField,
    pub customer_segments: BmcField,
    pub cost_structure: BmcField,
    pub revenue_streams: BmcField,
}

impl BmcData {
    #[must_use]
    pub fn get(&self, block: BmcBlock) -> &BmcField {
        match block {
            BmcBlock::KeyPartners => &self.key_partners,
            BmcBlock::KeyActivities => &self.key_activities,
            BmcBlock::KeyResources => &self.key_resources,
            BmcBlock::ValuePropositions => &self.value_propositions,
            BmcBlock::CustomerRelationships => &self.customer_relationships,
            BmcBlock::Channels => &self.channels,
            BmcBlock::CustomerSegments => &self.customer_segments,
            BmcBlock::CostStructure => &self.cost_structure,
            BmcBlock::RevenueStreams => &self.revenue_streams,
        }
    }

    pub fn set(&mut self, block: BmcBlock, value: BmcField) {
        let slot = match block {
            BmcBlock::KeyPartners => &mut self.key_partners,
            BmcBlock::KeyActivities => &mut self.key_activities,
            BmcBlock::KeyResources => &mut self.key_resources,
            BmcBlock::ValuePropositions => &mut self.value_propositions,
            BmcBlock::CustomerRelationships => &mut self.customer_relationships,
            BmcBlock::Channels => &mut self.channels,
            BmcBlock::CustomerSegments => &mut self.customer_segments,
            BmcBlock::CostStructure => &mut self.cost_structure,
            BmcBlock::RevenueStreams => &mut self.revenue_streams,
        };
        *slot = value;
    }

    /// Bullet-joined display text for one block.
    #[must_use]
    pub fn display(&self, block: BmcBlock) -> String {
        self.get(block).display()
    }

    /// Number of blocks with non-empty content.
    #[must_use]
    pub fn filled_blocks(&self) -> usize {
        BmcBlock::ALL
            .iter()
            .filter(|block| !self.get(**block).is_empty())
            .count()
    }
}

// =============================================================================
// ARTIFACT LINKS
// =============================================================================

/// What an artifact-link hexagon points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "linkType", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LinkTarget {
    /// Not linked yet.
    Placeholder,
    /// Another artifact in the same project.
    Artifact {
        artifact_id: String,
        #[serde(default)]
        artifact_type: String,
    },
    /// An uploaded file.
    File {
        file_name: String,
        #[serde(default)]
        file_url: String,
    },
    /// An external URL.
    External { url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLinkData {
    #[serde(flatten)]
    pub target: LinkTarget,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_hex_color")]
    pub color: String,
}

impl Default for ArtifactLinkData {
    fn default() -> Self {
        Self { target: LinkTarget::Placeholder, label: "Link".to_owned(), color: default_hex_color() }
    }
}

// =============================================================================
// CONTENT UNION
// =============================================================================

/// Kind-specific payload of a canvas element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElementContent {
    Text(TextContent),
    Sticky(StickyContent),
    Shape(ShapeContent),
    Connector(ConnectorContent),
    Image(ImageContent),
    Group(GroupContent),
    Bmc(BmcData),
    Story(StoryContent),
    KnowledgeItem(KnowledgeItemContent),
    CustomHexi(CustomHexiContent),
    PlanningFocus(PlanningFocusContent),
    ArtifactLink(ArtifactLinkData),
}

impl ElementContent {
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Text(_) => ElementKind::Text,
            Self::Sticky(_) => ElementKind::Sticky,
            Self::Shape(_) => ElementKind::Shape,
            Self::Connector(_) => ElementKind::Connector,
            Self::Image(_) => ElementKind::Image,
            Self::Group(_) => ElementKind::Group,
            Self::Bmc(_) => ElementKind::Bmc,
            Self::Story(_) => ElementKind::Story,
            Self::KnowledgeItem(_) => ElementKind::KnowledgeItem,
            Self::CustomHexi(_) => ElementKind::CustomHexi,
            Self::PlanningFocus(_) => ElementKind::PlanningFocus,
            Self::ArtifactLink(_) => ElementKind::ArtifactLink,
        }
    }

    /// Default payload for a freshly created element.
    #[must_use]
    pub fn default_for(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Text => Self::Text(TextContent::default()),
            ElementKind::Sticky => Self::Sticky(StickyContent::default()),
            ElementKind::Shape => Self::Shape(ShapeContent::default()),
            ElementKind::Connector => Self::Connector(ConnectorContent::default()),
            ElementKind::Image => Self::Image(ImageContent::default()),
            ElementKind::Group => Self::Group(GroupContent::default()),
            ElementKind::Bmc => Self::Bmc(BmcData::default()),
            ElementKind::Story => Self::Story(StoryContent::default()),
            ElementKind::KnowledgeItem => Self::KnowledgeItem(KnowledgeItemContent::default()),
            ElementKind::CustomHexi => Self::CustomHexi(CustomHexiContent::default()),
            ElementKind::PlanningFocus => Self::PlanningFocus(PlanningFocusContent::default()),
            ElementKind::ArtifactLink => Self::ArtifactLink(ArtifactLinkData::default()),
        }
    }

    /// Parse a wire payload for `kind`. `null` yields the kind's default payload.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Content`] when the payload does not match the kind's shape.
    pub fn from_value(kind: ElementKind, value: Value) -> Result<Self, DocError> {
        if value.is_null() {
            return Ok(Self::default_for(kind));
        }
        let wrap = |source| DocError::Content { kind, source };
        let content = match kind {
            ElementKind::Text => Self::Text(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::Sticky => Self::Sticky(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::Shape => Self::Shape(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::Connector => Self::Connector(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::Image => Self::Image(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::Group => Self::Group(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::Bmc => Self::Bmc(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::Story => Self::Story(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::KnowledgeItem => Self::KnowledgeItem(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::CustomHexi => Self::CustomHexi(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::PlanningFocus => Self::PlanningFocus(serde_json::from_value(value).map_err(wrap)?),
            ElementKind::ArtifactLink => {
                let mut value = value;
                // EDGE: legacy link payloads predate `linkType`.
                if let Some(obj) = value.as_object_mut() {
                    obj.entry("linkType")
                        .or_insert_with(|| Value::String("placeholder".to_owned()));
                }
                Self::ArtifactLink(serde_json::from_value(value).map_err(wrap)?)
            }
        };
        Ok(content)
    }

    /// Short human-readable label, used for renderer captions and logs.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Text(c) => c.text.clone(),
            Self::Sticky(c) => c.text.clone(),
            Self::Shape(c) => c.label.clone(),
            Self::Connector(c) => c.label.clone(),
            Self::Image(c) => c.alt.clone(),
            Self::Group(c) => c.label.clone(),
            Self::Bmc(_) => "Business Model Canvas".to_owned(),
            Self::Story(c) => c.title.clone(),
            Self::KnowledgeItem(c) => c.title.clone(),
            Self::CustomHexi(c) => c.label.clone(),
            Self::PlanningFocus(c) => c.title.clone(),
            Self::ArtifactLink(c) => c.label.clone(),
        }
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// One item on a canvas.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ElementWire")]
pub struct CanvasElement {
    pub id: ElementId,
    pub position: Position,
    pub size: Size,
    pub content: ElementContent,
    pub metadata: Option<Metadata>,
}

impl CanvasElement {
    /// Create an element of `kind` at `position` with a generated id and default payload/size.
    #[must_use]
    pub fn new(kind: ElementKind, position: Position) -> Self {
        Self {
            id: generate_id(kind),
            position: position.clamped(),
            size: kind.default_size(),
            content: ElementContent::default_for(kind),
            metadata: None,
        }
    }

    /// Create an element with explicit content; the kind follows the content.
    #[must_use]
    pub fn with_content(content: ElementContent, position: Position) -> Self {
        let kind = content.kind();
        Self { content, ..Self::new(kind, position) }
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.content.kind()
    }

    /// Apply a sparse edit. Positions are clamped; content must keep the element's kind.
    ///
    /// Metadata keys are merged; `null` values remove keys.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::KindMismatch`] if `patch.content` is a different kind.
    /// Nothing is applied in that case.
    pub fn apply_patch(&mut self, patch: &ElementPatch) -> Result<(), DocError> {
        if let Some(content) = &patch.content {
            if content.kind() != self.kind() {
                return Err(DocError::KindMismatch { expected: self.kind(), found: content.kind() });
            }
        }
        if let Some(position) = patch.position {
            self.position = position.clamped();
        }
        if let Some(size) = patch.size {
            if size.is_valid() {
                self.size = size;
            }
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(incoming) = &patch.metadata {
            let existing = self.metadata.get_or_insert_with(Map::new);
            for (k, v) in incoming {
                if v.is_null() {
                    existing.remove(k);
                } else {
                    existing.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(())
    }
}

/// Sparse update for an element. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub content: Option<ElementContent>,
    pub metadata: Option<Metadata>,
}

/// Owned wire form used for deserialization.
#[derive(Deserialize)]
struct ElementWire {
    #[serde(default)]
    id: ElementId,
    #[serde(rename = "type")]
    kind: ElementKind,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    size: Size,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    metadata: Option<Metadata>,
}

impl TryFrom<ElementWire> for CanvasElement {
    type Error = DocError;

    fn try_from(wire: ElementWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            position: wire.position,
            size: wire.size,
            content: ElementContent::from_value(wire.kind, wire.content)?,
            metadata: wire.metadata,
        })
    }
}

/// Borrowed wire form used for serialization.
#[derive(Serialize)]
struct ElementWireRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: ElementKind,
    position: Position,
    size: Size,
    content: &'a ElementContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Metadata>,
}

impl Serialize for CanvasElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ElementWireRef {
            id: &self.id,
            kind: self.kind(),
            position: self.position,
            size: self.size,
            content: &self.content,
            metadata: self.metadata.as_ref(),
        }
        .serialize(serializer)
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// The persisted unit: an ordered element list (later elements draw on top).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasData {
    #[serde(default)]
    pub elements: Vec<CanvasElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Counts of repairs made by [`CanvasData::normalize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub generated_ids: usize,
    pub rekeyed_duplicates: usize,
    pub clamped_positions: usize,
    pub resized_hexagons: usize,
    pub fixed_sizes: usize,
}

impl NormalizeReport {
    /// True when the document needed no repair.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl CanvasData {
    #[must_use]
    pub fn new(elements: Vec<CanvasElement>) -> Self {
        Self { elements, metadata: None }
    }

    /// Parse a persisted document and normalize it.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the JSON is malformed or an element payload
    /// does not match its kind.
    pub fn from_json(json: &str) -> Result<(Self, NormalizeReport), DocError> {
        let mut data: Self = serde_json::from_str(json)?;
        let report = data.normalize();
        Ok((data, report))
    }

    /// Parse a document from an already-decoded JSON value and normalize it.
    ///
    /// # Errors
    ///
    /// Same as [`CanvasData::from_json`].
    pub fn from_value(value: Value) -> Result<(Self, NormalizeReport), DocError> {
        let mut data: Self = serde_json::from_value(value)?;
        let report = data.normalize();
        Ok((data, report))
    }

    /// Repair legacy or inconsistent documents in place.
    ///
    /// Backfills missing ids, re-keys duplicate ids, clamps negative positions,
    /// resizes legacy hexagons to the standard 140x121, and replaces
    /// non-positive sizes with the kind default.
    pub fn normalize(&mut self) -> NormalizeReport {
        let mut report = NormalizeReport::default();
        let mut seen = std::collections::HashSet::new();

        for el in &mut self.elements {
            let kind = el.kind();
            if el.id.trim().is_empty() {
                el.id = generate_id(kind);
                report.generated_ids += 1;
            } else if seen.contains(&el.id) {
                warn!(id = %el.id, %kind, "normalize: duplicate element id re-keyed");
                el.id = generate_id(kind);
                report.rekeyed_duplicates += 1;
            }
            seen.insert(el.id.clone());

            let clamped = el.position.clamped();
            if clamped != el.position {
                el.position = clamped;
                report.clamped_positions += 1;
            }

            if kind.is_hexagon() {
                let standard = kind.default_size();
                if el.size != standard {
                    el.size = standard;
                    report.resized_hexagons += 1;
                }
            } else if !el.size.is_valid() {
                el.size = kind.default_size();
                report.fixed_sizes += 1;
            }
        }

        if !report.is_clean() {
            debug!(?report, elements = self.elements.len(), "normalize: document repaired");
        }
        report
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CanvasElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CanvasElement> {
        self.elements.iter_mut().find(|el| el.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Append an element on top of the stack.
    pub fn push(&mut self, element: CanvasElement) {
        self.elements.push(element);
    }

    /// Remove an element by id, returning it if it was present.
    pub fn remove(&mut self, id: &str) -> Option<CanvasElement> {
        let idx = self.elements.iter().position(|el| el.id == id)?;
        Some(self.elements.remove(idx))
    }

    /// Number of elements in the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the document contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
