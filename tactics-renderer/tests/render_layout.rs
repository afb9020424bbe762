//! Integration tests for layout rendering (tactics-renderer).
//!
//! Tests the compositor against stored layouts: determinism, scaling to a
//! different output size, skipped references, custom icon artwork and
//! export of a layout read back from the store.

use tactics_core::{
    Board, InMemoryDirectory, LayoutRecord, LayoutStore, Placement, Prop, Rotation, Team,
};
use tactics_renderer::{
    Compositor, ExportConfig, ExportFormat, IconKind, IconSet, LayoutExporter, Pixmap,
    RenderConfig,
};

/// Compositor that does not depend on the fonts installed on the machine.
fn compositor(icons: IconSet) -> Compositor {
    Compositor::new(
        RenderConfig {
            load_system_fonts: false,
            ..RenderConfig::default()
        },
        icons,
    )
}

fn squad() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_player(1, Some(1), "Keeper")
        .with_player(7, Some(7), "Winger")
}

/// Records for one player at the centre of an 800x600 surface, plus extras.
fn centre_player(extra: &[Placement]) -> Vec<LayoutRecord> {
    let dir = squad();
    let mut board = Board::new(800.0, 600.0);
    board
        .place(
            Placement::Player {
                player_id: 7,
                team: Team::Own,
            },
            400.0,
            300.0,
            &dir,
        )
        .expect("place");
    for (i, placement) in (0_u32..).zip(extra) {
        board
            .place(placement.clone(), 200.0 + f64::from(i) * 40.0, 200.0, &dir)
            .expect("place");
    }
    board.to_records()
}

fn rgb(pixmap: &Pixmap, x: u32, y: u32) -> (u8, u8, u8) {
    let p = pixmap.pixel(x, y).expect("in bounds").demultiply();
    (p.red(), p.green(), p.blue())
}

fn close_to(actual: (u8, u8, u8), expected: (u8, u8, u8)) -> bool {
    actual.0.abs_diff(expected.0) <= 2
        && actual.1.abs_diff(expected.1) <= 2
        && actual.2.abs_diff(expected.2) <= 2
}

const OWN_BODY: (u8, u8, u8) = (0xC0, 0x39, 0x2B);

// ==========================================================================
// Determinism and scaling
// ==========================================================================

#[test]
fn test_same_layout_renders_identical_pixels() {
    let records = centre_player(&[Placement::Prop(Prop::Ball), Placement::Prop(Prop::Cone)]);
    let c = compositor(IconSet::builtin());

    let first = c.render_layout(&records, &squad(), 800, 600).expect("render");
    let second = c.render_layout(&records, &squad(), 800, 600).expect("render");
    assert_eq!(first.data(), second.data());
}

#[test]
fn test_player_lands_at_scaled_location() {
    let records = centre_player(&[]);
    let c = compositor(IconSet::builtin());

    // Figure body sits left of the anchor, below the head.
    let small = c.render_layout(&records, &squad(), 800, 600).expect("render");
    assert_eq!((small.width(), small.height()), (800, 600));
    assert!(close_to(rgb(&small, 387, 305), OWN_BODY));

    let large = c.render_layout(&records, &squad(), 1600, 1200).expect("render");
    assert_eq!((large.width(), large.height()), (1600, 1200));
    assert!(close_to(rgb(&large, 787, 605), OWN_BODY));
    // Where the small render had the figure is plain grass now.
    assert!(close_to(rgb(&large, 387, 305), (0x2E, 0xCC, 0x71)));
}

// ==========================================================================
// Skipped elements
// ==========================================================================

#[test]
fn test_unresolvable_player_is_omitted() {
    let records = centre_player(&[]);
    let mut with_stranger = records.clone();
    let mut stranger = records[0].clone();
    stranger.player_id = Some(99);
    stranger.rel_x = Some(0.2);
    with_stranger.push(stranger);

    let c = compositor(IconSet::builtin());
    let frame = c
        .layout_svg(&with_stranger, &squad(), 800, 600)
        .expect("render");
    assert_eq!(frame.drawn, 1);
    assert_eq!(frame.skipped, 1);

    let expected = c.render_layout(&records, &squad(), 800, 600).expect("render");
    let actual = c
        .render_layout(&with_stranger, &squad(), 800, 600)
        .expect("render");
    assert_eq!(expected.data(), actual.data());
}

#[test]
fn test_broken_icon_file_skips_only_that_prop() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join(IconKind::Ball.file_name()), b"corrupt").expect("write");
    let icons = IconSet::from_dir(dir.path());

    let records = centre_player(&[Placement::Prop(Prop::Ball), Placement::Prop(Prop::Cone)]);
    let frame = compositor(icons)
        .layout_svg(&records, &squad(), 800, 600)
        .expect("render");
    assert_eq!(frame.drawn, 2);
    assert_eq!(frame.skipped, 1);
    assert!(frame.svg.contains("orange"));
}

#[test]
fn test_control_characters_in_text_and_colours_still_render() {
    let decoded = tactics_core::decode_layout(
        r#"[
            {"type": "ball", "relX": 0.3, "relY": 0.3},
            {"type": "text", "relX": 0.5, "relY": 0.5, "text": "Press\u0001"},
            {"type": "arrow", "relCoords": [0.1, 0.1, 0.4, 0.4],
             "options": {"fill": "red\u0002", "width": 3, "dash": false}}
        ]"#,
    );
    assert_eq!(decoded.skipped, 0);

    let c = compositor(IconSet::builtin());
    let frame = c
        .layout_svg(&decoded.records, &squad(), 800, 600)
        .expect("svg");
    assert_eq!(frame.drawn, 3);
    assert!(frame.svg.contains(">Press</text>"));
    assert!(frame.svg.contains("stroke=\"red\""));

    let pixmap = c
        .render_layout(&decoded.records, &squad(), 800, 600)
        .expect("render");
    assert_eq!((pixmap.width(), pixmap.height()), (800, 600));
}

// ==========================================================================
// Icons
// ==========================================================================

#[test]
fn test_player_icon_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (w, h) = IconKind::OwnPlayer.size();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let art = image::RgbaImage::from_pixel(w as u32, h as u32, image::Rgba([0, 0, 255, 255]));
    art.save(dir.path().join(IconKind::OwnPlayer.file_name()))
        .expect("write icon");

    let c = compositor(IconSet::from_dir(dir.path()));
    let pixmap = c
        .render_layout(&centre_player(&[]), &squad(), 800, 600)
        .expect("render");
    assert!(close_to(rgb(&pixmap, 387, 300), (0, 0, 255)));
}

#[test]
fn test_rotation_changes_the_picture() {
    let mut records = centre_player(&[Placement::Prop(Prop::Goal)]);
    let c = compositor(IconSet::builtin());
    let upright = c.render_layout(&records, &squad(), 800, 600).expect("render");

    records[1].rotation = Rotation::from_degrees(90);
    let turned = c.render_layout(&records, &squad(), 800, 600).expect("render");
    assert_ne!(upright.data(), turned.data());
}

// ==========================================================================
// Export from the store
// ==========================================================================

#[test]
fn test_export_stored_layout() {
    let store = LayoutStore::new();
    store
        .save("Pressing", &centre_player(&[Placement::Prop(Prop::Ball)]))
        .expect("save");
    let records = store.load("Pressing").expect("load");

    let exporter = LayoutExporter::new(compositor(IconSet::builtin()), ExportConfig::default());
    let png = exporter
        .export_layout_sized(&records, &squad(), ExportFormat::Png, 1600, 1200)
        .expect("png");
    assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    let decoded = image::load_from_memory(&png).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (1600, 1200));

    let jpeg = exporter
        .export_layout(&records, &squad(), ExportFormat::Jpeg)
        .expect("jpeg");
    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
}
