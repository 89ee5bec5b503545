//! Rendering: turns a list of canvas elements into a standalone SVG document.
//!
//! This module is the only place that knows what each element kind looks like.
//! Renderers are looked up by kind through [`renderer_for`], a closed match
//! over [`ElementKind`], so adding a kind without a renderer fails to compile.
//! Output is plain SVG text; rasterizing it is the export layer's job.
//!
//! Nothing here mutates application state.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use crate::doc::{BmcBlock, CanvasElement, ElementContent, ElementId, ElementKind, IconName, LinkTarget, Priority, ShapeKind};
use crate::geometry::{hex_points, wrap_lines};
use crate::hit::{self, Rect};

/// Padding around the exported bounds, in canvas units.
pub const DEFAULT_PADDING: f64 = 16.0;

const FONT_FAMILY: &str = "sans-serif";
const INK: &str = "#1F2937";
const MUTED: &str = "#6B7280";
const BORDER: &str = "#D1D5DB";

/// Approximate glyph width as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.6;
/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.3;

const HEX_LABEL_CHARS: usize = 14;
const HEX_LABEL_LINES: usize = 3;

/// What to render and how.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    /// Restrict output to these ids. Empty renders every element.
    pub only: Vec<ElementId>,
    /// Padding added on every side of the content bounds.
    pub padding: f64,
    /// Optional solid background painted behind everything.
    pub background: Option<String>,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self { only: Vec::new(), padding: DEFAULT_PADDING, background: None }
    }
}

/// A rendered SVG document and its size in canvas units.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub svg: String,
    pub width: f64,
    pub height: f64,
    /// Number of elements drawn.
    pub elements: usize,
}

/// Read-only view of the document handed to each renderer, for elements that
/// refer to others (connectors).
pub struct SceneContext<'a> {
    elements: &'a [CanvasElement],
}

impl<'a> SceneContext<'a> {
    #[must_use]
    pub fn new(elements: &'a [CanvasElement]) -> Self {
        Self { elements }
    }

    fn find(&self, id: &str) -> Option<&'a CanvasElement> {
        self.elements.iter().find(|el| el.id == id)
    }
}

/// Draws one element into the SVG buffer.
pub type Renderer = fn(&CanvasElement, &SceneContext<'_>, &mut String);

/// Renderer registry keyed by element kind.
#[must_use]
pub fn renderer_for(kind: ElementKind) -> Renderer {
    match kind {
        ElementKind::Text => draw_text,
        ElementKind::Sticky => draw_sticky,
        ElementKind::Shape => draw_shape,
        ElementKind::Connector => draw_connector,
        ElementKind::Image => draw_image,
        ElementKind::Group => draw_group,
        ElementKind::Bmc => draw_bmc,
        ElementKind::Story => draw_story,
        ElementKind::KnowledgeItem | ElementKind::CustomHexi | ElementKind::PlanningFocus | ElementKind::ArtifactLink => {
            draw_hexagon
        }
    }
}

/// Glyph drawn inside a hexagon for each registered icon.
#[must_use]
pub fn icon_glyph(icon: IconName) -> &'static str {
    match icon {
        IconName::Lightbulb => "\u{2600}",
        IconName::Target => "\u{25CE}",
        IconName::Users => "\u{263A}",
        IconName::Chart => "\u{25A4}",
        IconName::Gear => "\u{2699}",
        IconName::Document => "\u{25A1}",
        IconName::Flag => "\u{2691}",
        IconName::Star => "\u{2605}",
        IconName::Rocket => "\u{2197}",
        IconName::Shield => "\u{25C8}",
    }
}

/// Render `elements` (or the subset named in `options.only`) to SVG.
///
/// Returns `None` when there is nothing to draw.
#[must_use]
pub fn render_scene(elements: &[CanvasElement], options: &SceneOptions) -> Option<Scene> {
    let picked: Vec<&CanvasElement> = elements
        .iter()
        .filter(|el| options.only.is_empty() || options.only.contains(&el.id))
        .collect();
    let bounds = hit::bounds_of(picked.iter().copied())?;

    let pad = options.padding.max(0.0);
    let width = bounds.width() + pad * 2.0;
    let height = bounds.height() + pad * 2.0;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    let ctx = SceneContext::new(elements);
    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    ));
    svg.push_str(&format!(
        "<defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"8\" markerHeight=\"8\" orient=\"auto\"><path d=\"M0,0 L10,5 L0,10 z\" fill=\"{INK}\"/></marker></defs>\n"
    ));
    if let Some(bg) = &options.background {
        svg.push_str(&format!("<rect width=\"{width}\" height=\"{height}\" fill=\"{}\"/>\n", escape_xml(bg)));
    }
    svg.push_str(&format!("<g transform=\"translate({},{})\">\n", pad - bounds.left, pad - bounds.top));
    for el in &picked {
        renderer_for(el.kind())(el, &ctx, &mut svg);
    }
    svg.push_str("</g>\n</svg>\n");

    Some(Scene { svg, width, height, elements: picked.len() })
}

/// Escape text for use in SVG content and attribute values.
#[must_use]
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

// =============================================================
// Text helpers
// =============================================================

/// How many glyphs of `font_size` fit across `width`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn chars_for(width: f64, font_size: f64) -> usize {
    let n = (width / (font_size * GLYPH_WIDTH_RATIO)).floor();
    if n.is_finite() && n >= 1.0 { n as usize } else { 1 }
}

/// How many lines of `font_size` fit in `height`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lines_for(height: f64, font_size: f64) -> usize {
    let n = (height / (font_size * LINE_HEIGHT)).floor();
    if n.is_finite() && n >= 0.0 { n as usize } else { 0 }
}

/// Wrap every paragraph of `text` to `max_chars`, stopping after `max_lines` total.
fn wrap_paragraphs(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let remaining = max_lines.saturating_sub(lines.len());
        if remaining == 0 {
            break;
        }
        lines.extend(wrap_lines(paragraph, max_chars, remaining));
    }
    lines
}

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Middle,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
        }
    }
}

struct TextStyle<'a> {
    size: f64,
    fill: &'a str,
    bold: bool,
    anchor: Anchor,
}

/// Emit `lines` as one `<text>` with a `<tspan>` per line, first baseline at `y`.
fn text_lines(out: &mut String, x: f64, y: f64, lines: &[String], style: &TextStyle<'_>) {
    if lines.is_empty() {
        return;
    }
    let weight = if style.bold { " font-weight=\"bold\"" } else { "" };
    out.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" font-family=\"{FONT_FAMILY}\" font-size=\"{}\" fill=\"{}\" text-anchor=\"{}\"{weight}>",
        style.size,
        escape_xml(style.fill),
        style.anchor.as_str()
    ));
    for (i, line) in lines.iter().enumerate() {
        let dy = if i == 0 { 0.0 } else { style.size * LINE_HEIGHT };
        out.push_str(&format!("<tspan x=\"{x}\" dy=\"{dy}\">{}</tspan>", escape_xml(line)));
    }
    out.push_str("</text>\n");
}

fn rect(out: &mut String, r: &Rect, fill: &str, stroke: &str, radius: f64) {
    out.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{radius}\" fill=\"{}\" stroke=\"{}\"/>\n",
        r.left,
        r.top,
        r.width(),
        r.height(),
        escape_xml(fill),
        escape_xml(stroke)
    ));
}

// =============================================================
// Renderers
// =============================================================

fn draw_text(el: &CanvasElement, _ctx: &SceneContext<'_>, out: &mut String) {
    let ElementContent::Text(c) = &el.content else {
        return;
    };
    let size = if c.font_size > 0.0 { c.font_size } else { 16.0 };
    let lines = wrap_paragraphs(&c.text, chars_for(el.size.width, size), lines_for(el.size.height, size).max(1));
    let style = TextStyle { size, fill: &c.color, bold: false, anchor: Anchor::Start };
    text_lines(out, el.position.x, el.position.y + size, &lines, &style);
}

fn draw_sticky(el: &CanvasElement, _ctx: &SceneContext<'_>, out: &mut String) {
    let ElementContent::Sticky(c) = &el.content else {
        return;
    };
    let r = Rect::of_element(el);
    rect(out, &r, &c.color, BORDER, 4.0);
    let size = 14.0;
    let inner = el.size.width - 24.0;
    let lines = wrap_paragraphs(&c.text, chars_for(inner, size), lines_for(el.size.height - 24.0, size));
    let style = TextStyle { size, fill: INK, bold: false, anchor: Anchor::Start };
    text_lines(out, r.left + 12.0, r.top + 12.0 + size, &lines, &style);
}

fn draw_shape(el: &CanvasElement, _ctx: &SceneContext<'_>, out: &mut String) {
    let ElementContent::Shape(c) = &el.content else {
        return;
    };
    let (x, y, w, h) = (el.position.x, el.position.y, el.size.width, el.size.height);
    let fill = escape_xml(&c.fill);
    let stroke = escape_xml(&c.stroke);
    match c.shape {
        ShapeKind::Rectangle => rect(out, &Rect::of_element(el), &c.fill, &c.stroke, 0.0),
        ShapeKind::Ellipse => out.push_str(&format!(
            "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\"/>\n",
            x + w / 2.0,
            y + h / 2.0,
            w / 2.0,
            h / 2.0
        )),
        ShapeKind::Diamond => out.push_str(&format!(
            "<polygon points=\"{},{y} {},{} {},{} {x},{}\" fill=\"{fill}\" stroke=\"{stroke}\"/>\n",
            x + w / 2.0,
            x + w,
            y + h / 2.0,
            x + w / 2.0,
            y + h,
            y + h / 2.0
        )),
        ShapeKind::Hexagon => out.push_str(&format!(
            "<polygon points=\"{}\" transform=\"translate({x},{y})\" fill=\"{fill}\" stroke=\"{stroke}\"/>\n",
            hex_points(w, h)
        )),
    }
    let size = 14.0;
    let lines = wrap_lines(&c.label, chars_for(w * 0.8, size), lines_for(h, size).max(1));
    let style = TextStyle { size, fill: &c.stroke, bold: false, anchor: Anchor::Middle };
    text_lines(out, x + w / 2.0, y + h / 2.0 + size / 3.0, &lines, &style);
}

fn draw_connector(el: &CanvasElement, ctx: &SceneContext<'_>, out: &mut String) {
    let ElementContent::Connector(c) = &el.content else {
        return;
    };
    let center = |id: &Option<ElementId>| {
        let target = ctx.find(id.as_deref()?)?;
        Some((target.position.x + target.size.width / 2.0, target.position.y + target.size.height / 2.0))
    };
    let mid_y = el.position.y + el.size.height / 2.0;
    let (x1, y1) = center(&c.from).unwrap_or((el.position.x, mid_y));
    let (x2, y2) = center(&c.to).unwrap_or((el.position.x + el.size.width, mid_y));
    out.push_str(&format!(
        "<line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" stroke=\"{}\" stroke-width=\"2\" marker-end=\"url(#arrow)\"/>\n",
        escape_xml(&c.stroke)
    ));
    if !c.label.is_empty() {
        let style = TextStyle { size: 12.0, fill: &c.stroke, bold: false, anchor: Anchor::Middle };
        text_lines(out, (x1 + x2) / 2.0, (y1 + y2) / 2.0 - 6.0, &[c.label.clone()], &style);
    }
}

fn draw_image(el: &CanvasElement, _ctx: &SceneContext<'_>, out: &mut String) {
    let ElementContent::Image(c) = &el.content else {
        return;
    };
    let r = Rect::of_element(el);
    rect(out, &r, "#F3F4F6", BORDER, 0.0);
    if !c.src.is_empty() {
        out.push_str(&format!(
            "<image href=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid meet\"/>\n",
            escape_xml(&c.src),
            r.left,
            r.top,
            r.width(),
            r.height()
        ));
    } else if !c.alt.is_empty() {
        let style = TextStyle { size: 12.0, fill: MUTED, bold: false, anchor: Anchor::Middle };
        text_lines(out, r.left + r.width() / 2.0, r.top + r.height() / 2.0, &[c.alt.clone()], &style);
    }
}

fn draw_group(el: &CanvasElement, _ctx: &SceneContext<'_>, out: &mut String) {
    let ElementContent::Group(c) = &el.content else {
        return;
    };
    let r = Rect::of_element(el);
    out.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"8\" fill=\"none\" stroke=\"{MUTED}\" stroke-dasharray=\"6 4\"/>\n",
        r.left,
        r.top,
        r.width(),
        r.height()
    ));
    let style = TextStyle { size: 12.0, fill: MUTED, bold: true, anchor: Anchor::Start };
    text_lines(out, r.left + 8.0, r.top + 18.0, &[c.label.clone()], &style);
}

/// Cell layout of the nine BMC blocks inside `r`, in the classic arrangement:
/// five columns over a two-cell bottom row.
fn bmc_cells(r: &Rect) -> [(BmcBlock, Rect); 9] {
    let header = 36.0;
    let top = r.top + header;
    let body_h = r.height() - header;
    let upper_h = body_h * 0.65;
    let col = r.width() / 5.0;
    let half = upper_h / 2.0;
    let bottom = top + upper_h;
    let cell = |cx: f64, cy: f64, w: f64, h: f64| Rect { left: cx, top: cy, right: cx + w, bottom: cy + h };
    [
        (BmcBlock::KeyPartners, cell(r.left, top, col, upper_h)),
        (BmcBlock::KeyActivities, cell(r.left + col, top, col, half)),
        (BmcBlock::KeyResources, cell(r.left + col, top + half, col, half)),
        (BmcBlock::ValuePropositions, cell(r.left + col * 2.0, top, col, upper_h)),
        (BmcBlock::CustomerRelationships, cell(r.left + col * 3.0, top, col, half)),
        (BmcBlock::Channels, cell(r.left + col * 3.0, top + half, col, half)),
        (BmcBlock::CustomerSegments, cell(r.left + col * 4.0, top, col, upper_h)),
        (BmcBlock::CostStructure, cell(r.left, bottom, r.width() / 2.0, r.bottom - bottom)),
        (BmcBlock::RevenueStreams, cell(r.left + r.width() / 2.0, bottom, r.width() / 2.0, r.bottom - bottom)),
    ]
}

fn draw_bmc(el: &CanvasElement, _ctx: &SceneContext<'_>, out: &mut String) {
    let ElementContent::Bmc(data) = &el.content else {
        return;
    };
    let r = Rect::of_element(el);
    rect(out, &r, "#FFFFFF", INK, 6.0);
    let heading = TextStyle { size: 18.0, fill: INK, bold: true, anchor: Anchor::Start };
    text_lines(out, r.left + 12.0, r.top + 24.0, &["Business Model Canvas".to_owned()], &heading);

    let title = TextStyle { size: 13.0, fill: INK, bold: true, anchor: Anchor::Start };
    let body = TextStyle { size: 12.0, fill: INK, bold: false, anchor: Anchor::Start };
    for (block, cell) in bmc_cells(&r) {
        rect(out, &cell, "#FFFFFF", BORDER, 0.0);
        text_lines(out, cell.left + 8.0, cell.top + 18.0, &[block.title().to_owned()], &title);
        let lines = wrap_paragraphs(
            &data.display(block),
            chars_for(cell.width() - 16.0, body.size),
            lines_for(cell.height() - 32.0, body.size),
        );
        text_lines(out, cell.left + 8.0, cell.top + 38.0, &lines, &body);
    }
}

#[allow(clippy::cast_precision_loss)]
fn draw_story(el: &CanvasElement, _ctx: &SceneContext<'_>, out: &mut String) {
    let ElementContent::Story(c) = &el.content else {
        return;
    };
    let r = Rect::of_element(el);
    rect(out, &r, &c.color, BORDER, 6.0);
    let priority_color = match c.priority {
        Priority::High => "#DC2626",
        Priority::Medium => "#D97706",
        Priority::Low => "#059669",
    };
    out.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"4\" height=\"{}\" fill=\"{priority_color}\"/>\n",
        r.left,
        r.top,
        r.height()
    ));

    let inner = r.width() - 24.0;
    let title = TextStyle { size: 14.0, fill: INK, bold: true, anchor: Anchor::Start };
    let title_lines = wrap_lines(&c.title, chars_for(inner, title.size), 2);
    text_lines(out, r.left + 12.0, r.top + 22.0, &title_lines, &title);

    let body = TextStyle { size: 12.0, fill: INK, bold: false, anchor: Anchor::Start };
    let used = 22.0 + title_lines.len().saturating_sub(1) as f64 * title.size * LINE_HEIGHT;
    let narrative = wrap_lines(&c.narrative(), chars_for(inner, body.size), lines_for(r.height() - used - 40.0, body.size));
    text_lines(out, r.left + 12.0, r.top + used + 20.0, &narrative, &body);

    let mut footer = format!("{:?}", c.priority).to_uppercase();
    if let Some(points) = c.story_points {
        footer.push_str(&format!(" \u{00B7} {points} pts"));
    }
    if !c.acceptance_criteria.is_empty() {
        footer.push_str(&format!(" \u{00B7} {} AC", c.acceptance_criteria.len()));
    }
    let meta = TextStyle { size: 11.0, fill: MUTED, bold: false, anchor: Anchor::Start };
    text_lines(out, r.left + 12.0, r.bottom - 12.0, &[footer], &meta);
}

fn draw_hexagon(el: &CanvasElement, _ctx: &SceneContext<'_>, out: &mut String) {
    let (label, color, icon, caption) = match &el.content {
        ElementContent::KnowledgeItem(c) => (c.title.as_str(), c.color.as_str(), c.icon, c.category.clone()),
        ElementContent::CustomHexi(c) => (c.label.as_str(), c.color.as_str(), c.icon, String::new()),
        ElementContent::PlanningFocus(c) => (c.title.as_str(), c.color.as_str(), None, c.focus_area.clone()),
        ElementContent::ArtifactLink(c) => (c.label.as_str(), c.color.as_str(), None, link_caption(&c.target)),
        _ => return,
    };
    let (x, y, w, h) = (el.position.x, el.position.y, el.size.width, el.size.height);
    out.push_str(&format!(
        "<polygon points=\"{}\" transform=\"translate({x},{y})\" fill=\"{}\" stroke=\"{INK}\" stroke-width=\"1.5\"/>\n",
        hex_points(w, h),
        escape_xml(color)
    ));

    let cx = x + w / 2.0;
    let mut baseline = y + h * 0.4;
    if let Some(icon) = icon {
        let style = TextStyle { size: 18.0, fill: INK, bold: false, anchor: Anchor::Middle };
        text_lines(out, cx, y + h * 0.3, &[icon_glyph(icon).to_owned()], &style);
        baseline = y + h * 0.52;
    }
    let style = TextStyle { size: 12.0, fill: INK, bold: true, anchor: Anchor::Middle };
    let lines = wrap_lines(label, HEX_LABEL_CHARS, HEX_LABEL_LINES);
    text_lines(out, cx, baseline, &lines, &style);

    if !caption.is_empty() {
        let style = TextStyle { size: 10.0, fill: MUTED, bold: false, anchor: Anchor::Middle };
        text_lines(out, cx, y + h * 0.85, &wrap_lines(&caption, HEX_LABEL_CHARS + 4, 1), &style);
    }
}

fn link_caption(target: &LinkTarget) -> String {
    match target {
        LinkTarget::Placeholder => "Not linked".to_owned(),
        LinkTarget::Artifact { artifact_type, .. } => artifact_type.clone(),
        LinkTarget::File { file_name, .. } => file_name.clone(),
        LinkTarget::External { url } => url.clone(),
    }
}
