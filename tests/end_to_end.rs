use std::sync::Arc;

use serde_json::json;
use veneer::{Engine, EngineConfig};

fn engine() -> Engine {
    Engine::new(EngineConfig::default())
}

fn px(img: &veneer::RasterImage, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * img.width + x) as usize) * 4;
    img.rgba8_premul[i..i + 4].try_into().unwrap()
}

#[test]
fn concurrent_checkouts_share_one_template() {
    let engine = Arc::new(engine());
    let desc = json!({
        "type": "rectangle",
        "origin": {"x": 0, "y": 0},
        "size": {"width": 32, "height": 32},
        "corner-radius": 4,
        "color": "#336699",
        "inner-stroke": {"width": 1, "color": "#000"}
    });

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        let desc = desc.clone();
        handles.push(std::thread::spawn(move || {
            engine.template_for(&desc).unwrap()
        }));
    }
    let templates: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Every thread resolved the same cached compilation.
    for t in &templates[1..] {
        assert!(Arc::ptr_eq(&templates[0], t));
    }
    assert_eq!(templates[0].unit.ops.len(), 2);
}

#[test]
fn checkout_mutation_does_not_leak_between_callers() {
    let engine = engine();
    let desc = json!({
        "type": "rectangle",
        "is-container": true,
        "origin": {"x": 0, "y": 0},
        "size": {"width": 64, "height": 64},
        "subviews": [
            {"type": "rectangle", "origin": {"x": 8, "y": 8},
             "size": {"width": 48, "height": 48}, "color": "#FFF",
             "bind-to": "card"}
        ]
    });

    let mut first = engine.checkout(&desc).unwrap();
    let path = first.bindings["card"].clone();
    let card = first.unit.at_path_mut(&path).unwrap();
    card.alpha = Some(0.1);
    card.ops.clear();

    let second = engine.checkout(&desc).unwrap();
    let card = second.unit.at_path(&second.bindings["card"]).unwrap();
    assert_eq!(card.alpha, None);
    assert_eq!(card.ops.len(), 1);
}

#[test]
fn oversized_radius_gradient_rectangle_rasterizes_clamped() {
    // 100x50 frame with radius 60: every corner clamps to 25, which makes
    // the left and right edges fully semicircular.
    let engine = engine();
    let desc = json!({
        "type": "rectangle",
        "origin": {"x": 0, "y": 0},
        "size": {"width": 100, "height": 50},
        "corner-radius": 60,
        "gradient-fill": {
            "gradient-colors": ["#FFFFFF", "#000000"],
            "gradient-positions": [0.0, 1.0]
        }
    });

    let img = engine.render_image(&desc, 100, 50).unwrap();

    // Corners are carved away, center is solid.
    assert_eq!(px(&img, 1, 1)[3], 0);
    assert_eq!(px(&img, 98, 48)[3], 0);
    assert_eq!(px(&img, 50, 25)[3], 255);

    // The gradient runs light to dark top to bottom.
    let top = px(&img, 50, 2);
    let bottom = px(&img, 50, 47);
    assert!(top[0] > 180, "top should be near white, got {top:?}");
    assert!(bottom[0] < 80, "bottom should be near black, got {bottom:?}");
}

#[test]
fn container_compiles_to_structure_only() {
    let engine = engine();
    let desc = json!({
        "type": "rectangle",
        "is-container": true,
        "origin": {"x": 0, "y": 0},
        "size": {"width": 40, "height": 20},
        "subviews": [
            {"type": "rectangle", "origin": {"x": 0, "y": 0},
             "size": {"width": 20, "height": 20}, "color": "#FF0000"},
            {"type": "ellipse", "origin": {"x": 20, "y": 0},
             "size": {"width": 20, "height": 20}, "color": "#00FF00"}
        ]
    });

    let template = engine.template_for(&desc).unwrap();
    assert_eq!(template.unit.ops.len(), 0);
    assert_eq!(template.unit.children.len(), 2);
    assert!(template.diagnostics.is_empty());

    let img = engine.render_image(&desc, 40, 20).unwrap();
    assert!(px(&img, 5, 10)[0] > 200);
    assert!(px(&img, 30, 10)[1] > 200);
}

#[test]
fn unknown_node_type_drops_subtree_but_siblings_survive() {
    let engine = engine();
    let desc = json!({
        "type": "rectangle",
        "is-container": true,
        "origin": {"x": 0, "y": 0},
        "size": {"width": 30, "height": 10},
        "subviews": [
            {"type": "rectangle", "origin": {"x": 0, "y": 0},
             "size": {"width": 10, "height": 10}, "color": "#FF0000"},
            {"type": "triangle", "origin": {"x": 10, "y": 0},
             "size": {"width": 10, "height": 10}, "color": "#FFFF00"},
            {"type": "rectangle", "origin": {"x": 20, "y": 0},
             "size": {"width": 10, "height": 10}, "color": "#0000FF"}
        ]
    });

    let checkout = engine.checkout(&desc).unwrap();
    assert_eq!(checkout.unit.children.len(), 2);
    assert_eq!(checkout.diagnostics.len(), 1);
    assert!(checkout.diagnostics[0].message.contains("triangle"));
    assert_eq!(checkout.diagnostics[0].path, "root/subviews[1]");

    // The dropped subtree leaves a hole, not a failure.
    let img = engine.render_image(&desc, 30, 10).unwrap();
    assert!(px(&img, 5, 5)[0] > 200);
    assert_eq!(px(&img, 15, 5)[3], 0);
    assert!(px(&img, 25, 5)[2] > 200);
}

#[test]
fn rendered_images_encode_as_png() {
    let engine = engine();
    let desc = json!({
        "type": "ellipse",
        "origin": {"x": 0, "y": 0},
        "size": {"width": 16, "height": 16},
        "color": "#123456",
        "drop-shadow": {"offset": {"x": 1, "y": 1}, "blur": 2, "alpha": 0.5}
    });

    let img = engine.render_image(&desc, 16, 16).unwrap();
    let png = img.encode_png().unwrap();
    assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
}

#[test]
fn flush_drops_every_tier_and_recovers() {
    let engine = engine();
    let desc = json!({
        "type": "rectangle",
        "origin": {"x": 0, "y": 0},
        "size": {"width": 8, "height": 8},
        "color": "#ABC"
    });
    engine.insert_document("chip", desc.clone());

    let before = engine.render_image_for_source("chip", 8, 8).unwrap();
    engine.flush();

    // The document tier is gone; direct rendering still works.
    assert!(engine.render_image_for_source("chip", 8, 8).is_err());
    let after = engine.render_image(&desc, 8, 8).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.rgba8_premul, after.rgba8_premul);
}
