#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{
    ArtifactLinkData, BmcData, BmcField, ConnectorContent, CustomHexiContent, Position, Size, StickyContent,
};

fn element(id: &str, content: ElementContent, x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
    CanvasElement { id: id.to_owned(), position: Position::new(x, y), size: Size::new(w, h), content, metadata: None }
}

fn sticky(id: &str, x: f64, y: f64, text: &str) -> CanvasElement {
    let content = ElementContent::Sticky(StickyContent { text: text.to_owned(), ..Default::default() });
    element(id, content, x, y, 200.0, 200.0)
}

// =============================================================
// Scene bounds
// =============================================================

#[test]
fn empty_scene_renders_nothing() {
    assert!(render_scene(&[], &SceneOptions::default()).is_none());
}

#[test]
fn scene_size_is_content_bounds_plus_padding() {
    let els = vec![sticky("a", 100.0, 50.0, "x"), sticky("b", 400.0, 300.0, "y")];
    let scene = render_scene(&els, &SceneOptions::default()).unwrap();
    assert_eq!(scene.width, 500.0 + 2.0 * DEFAULT_PADDING);
    assert_eq!(scene.height, 450.0 + 2.0 * DEFAULT_PADDING);
    assert_eq!(scene.elements, 2);
    assert!(scene.svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(scene.svg.contains("translate(-84,-34)"));
}

#[test]
fn only_filter_limits_output() {
    let els = vec![sticky("a", 0.0, 0.0, "first"), sticky("b", 400.0, 0.0, "second")];
    let options = SceneOptions { only: vec!["b".to_owned()], padding: 0.0, background: None };
    let scene = render_scene(&els, &options).unwrap();
    assert_eq!(scene.elements, 1);
    assert_eq!(scene.width, 200.0);
    assert!(scene.svg.contains("second"));
    assert!(!scene.svg.contains("first"));
}

#[test]
fn only_filter_with_unknown_ids_is_empty() {
    let els = vec![sticky("a", 0.0, 0.0, "x")];
    let options = SceneOptions { only: vec!["zzz".to_owned()], ..Default::default() };
    assert!(render_scene(&els, &options).is_none());
}

#[test]
fn background_is_painted_first() {
    let els = vec![sticky("a", 0.0, 0.0, "x")];
    let options = SceneOptions { background: Some("#ffffff".to_owned()), ..Default::default() };
    let svg = render_scene(&els, &options).unwrap().svg;
    let bg = svg.find("fill=\"#ffffff\"").unwrap();
    let note = svg.find("#FEF08A").unwrap();
    assert!(bg < note);
}

// =============================================================
// Registry / renderers
// =============================================================

#[test]
fn every_kind_renders_its_default() {
    for kind in ElementKind::ALL {
        let el = CanvasElement::new(kind, Position::new(10.0, 10.0));
        let mut out = String::new();
        renderer_for(kind)(&el, &SceneContext::new(std::slice::from_ref(&el)), &mut out);
        assert!(!out.is_empty(), "{kind} rendered nothing");
    }
}

#[test]
fn hexagon_uses_scaled_points() {
    let el = CanvasElement::new(ElementKind::CustomHexi, Position::new(0.0, 0.0));
    let scene = render_scene(std::slice::from_ref(&el), &SceneOptions::default()).unwrap();
    assert!(scene.svg.contains(&format!("points=\"{}\"", hex_points(140.0, 121.0))));
}

#[test]
fn hexagon_icon_comes_from_registry() {
    let content = ElementContent::CustomHexi(CustomHexiContent {
        label: "Growth".to_owned(),
        icon: Some(IconName::Rocket),
        ..Default::default()
    });
    let el = element("h", content, 0.0, 0.0, 140.0, 121.0);
    let svg = render_scene(&[el], &SceneOptions::default()).unwrap().svg;
    assert!(svg.contains(icon_glyph(IconName::Rocket)));
    assert!(svg.contains(">Growth<"));
}

#[test]
fn icon_glyphs_are_distinct() {
    let mut glyphs: Vec<&str> = IconName::ALL.iter().map(|i| icon_glyph(*i)).collect();
    glyphs.sort_unstable();
    glyphs.dedup();
    assert_eq!(glyphs.len(), IconName::ALL.len());
}

#[test]
fn hexagon_label_wraps_to_three_lines() {
    let content = ElementContent::CustomHexi(CustomHexiContent {
        label: "one two three four five six seven eight nine ten".to_owned(),
        ..Default::default()
    });
    let el = element("h", content, 0.0, 0.0, 140.0, 121.0);
    let svg = render_scene(&[el], &SceneOptions::default()).unwrap().svg;
    assert_eq!(svg.matches("<tspan").count(), 3);
    assert!(!svg.contains("nine"));
}

#[test]
fn artifact_link_shows_target() {
    let data = ArtifactLinkData {
        target: LinkTarget::External { url: "https://example.com".to_owned() },
        ..Default::default()
    };
    let el = element("l", ElementContent::ArtifactLink(data), 0.0, 0.0, 140.0, 121.0);
    let svg = render_scene(&[el], &SceneOptions::default()).unwrap().svg;
    assert!(svg.contains("https://example.com"));
}

#[test]
fn bmc_renders_all_block_titles_and_items() {
    let mut data = BmcData::default();
    data.set(BmcBlock::CustomerSegments, BmcField::Items(vec!["Students".to_owned(), "Teachers".to_owned()]));
    let el = element("bmc", ElementContent::Bmc(data), 0.0, 0.0, 1200.0, 800.0);
    let svg = render_scene(&[el], &SceneOptions::default()).unwrap().svg;
    for block in BmcBlock::ALL {
        assert!(svg.contains(block.title()), "missing {}", block.title());
    }
    assert!(svg.contains("• Students"));
    assert!(svg.contains("• Teachers"));
}

#[test]
fn bmc_cells_tile_the_board() {
    let r = Rect { left: 0.0, top: 0.0, right: 1000.0, bottom: 836.0 };
    let cells = bmc_cells(&r);
    let area: f64 = cells.iter().map(|(_, c)| c.width() * c.height()).sum();
    assert!((area - 1000.0 * 800.0).abs() < 1e-6);
}

#[test]
fn connector_joins_element_centres() {
    let a = sticky("a", 0.0, 0.0, "");
    let b = sticky("b", 400.0, 0.0, "");
    let link = element(
        "c",
        ElementContent::Connector(ConnectorContent {
            from: Some("a".to_owned()),
            to: Some("b".to_owned()),
            ..Default::default()
        }),
        0.0,
        0.0,
        10.0,
        2.0,
    );
    let svg = render_scene(&[a, b, link], &SceneOptions::default()).unwrap().svg;
    assert!(svg.contains("x1=\"100\" y1=\"100\" x2=\"500\" y2=\"100\""));
}

#[test]
fn text_is_escaped() {
    let svg = render_scene(&[sticky("a", 0.0, 0.0, "R&D <fast>")], &SceneOptions::default()).unwrap().svg;
    assert!(svg.contains("R&amp;D &lt;fast&gt;"));
}

#[test]
fn escape_xml_handles_quotes() {
    assert_eq!(escape_xml(r#"a "b" 'c'"#), "a &quot;b&quot; &apos;c&apos;");
}
