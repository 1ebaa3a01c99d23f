use std::fs;
use std::path::Path;

use handplay_core::PanelId;
use handplay_core::test_utils::Harness;
use handplay_platform::headless::DrawCall;
use handplay_types::{HandplayConfig, KeyCode};
use tempfile::TempDir;

use super::*;
use crate::testing::{broken, scripted};

/// `alpha/` (holding `inner/` and `song.mkv`), `beta/`, `a.mp4` and `b.mp4`.
fn small_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("alpha/inner")).unwrap();
    fs::write(root.join("alpha/song.mkv"), b"mkv").unwrap();
    fs::create_dir(root.join("beta")).unwrap();
    fs::write(root.join("a.mp4"), vec![0u8; 3000]).unwrap();
    fs::write(root.join("b.mp4"), b"0123456789").unwrap();
    dir
}

fn many_files(n: usize) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..n {
        fs::write(dir.path().join(format!("f{i:02}")), b"x").unwrap();
    }
    dir
}

fn open(h: &mut Harness, engine: EngineFactory) {
    h.ctx
        .push_initial::<FilesPanel>(FilesInit {
            start_dir: None,
            engine,
        })
        .unwrap();
}

fn files(h: &mut Harness) -> &mut FilesPanel {
    h.ctx.panel_mut::<FilesPanel>().expect("files panel is current")
}

fn names(h: &mut Harness) -> Vec<String> {
    files(h)
        .items()
        .iter()
        .map(|i| i.name.to_string_lossy().into_owned())
        .collect()
}

fn browser(root: &Path) -> Harness {
    let mut h = Harness::new(root);
    open(&mut h, broken());
    h
}

#[test]
fn lists_platform_directory_dirs_first() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    assert_eq!(files(&mut h).work_dir(), tree.path());
    assert_eq!(names(&mut h), ["alpha", "beta", "a.mp4", "b.mp4"]);
    assert_eq!(files(&mut h).cursor(), Cursor::default());
    assert_eq!(files(&mut h).selected().unwrap().name, "alpha");
}

#[test]
fn configured_directory_wins_over_platform() {
    let tree = small_tree();
    let other = many_files(2);
    let config = HandplayConfig {
        files_dir: Some(other.path().to_path_buf()),
        ..HandplayConfig::default()
    };
    let mut h = Harness::with_config(tree.path(), config);
    open(&mut h, broken());
    assert_eq!(names(&mut h), ["f00", "f01"]);
}

#[test]
fn start_directory_wins_over_config() {
    let tree = small_tree();
    let mut h = Harness::new(tree.path());
    h.ctx
        .push_initial::<FilesPanel>(FilesInit {
            start_dir: Some(tree.path().join("alpha")),
            engine: broken(),
        })
        .unwrap();
    assert_eq!(names(&mut h), ["inner", "song.mkv"]);
}

#[test]
fn missing_directory_lists_nothing() {
    let tree = small_tree();
    let mut h = Harness::new(tree.path().join("gone"));
    open(&mut h, broken());
    assert!(files(&mut h).items().is_empty());
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::VirtualOk);
    assert_eq!(files(&mut h).cursor(), Cursor::default());
}

#[test]
fn dpad_tap_moves_one_row() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::DpadDown);
    assert_eq!(files(&mut h).cursor().current, 2);

    // The move is drawn on the frame that sees the release.
    let frames = h.render.frames();
    h.press(KeyCode::DpadUp);
    assert_eq!(h.render.frames(), frames);
    h.release(KeyCode::DpadUp);
    assert_eq!(files(&mut h).cursor().current, 1);
    assert_eq!(h.render.frames(), frames + 1);
    assert!(!h.ctx.ui().redraw_pending());
}

#[test]
fn cursor_stops_at_last_entry() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    for _ in 0..6 {
        h.tap(KeyCode::DpadDown);
    }
    assert_eq!(files(&mut h).cursor().current, 3);
}

#[test]
fn held_dpad_repeats_after_trigger_delay() {
    let dir = many_files(30);
    let mut h = browser(dir.path());
    h.press(KeyCode::DpadDown);
    // Nothing before the 600 ms trigger delay.
    h.steps(30);
    assert_eq!(files(&mut h).cursor().current, 0);
    // Polls up to 983 ms after the press: (983 - 600) / 40 repeats.
    h.steps(30);
    assert_eq!(files(&mut h).cursor().current, 9);
    h.release(KeyCode::DpadDown);
    // Releasing a repeated key adds no click of its own.
    assert!(files(&mut h).cursor().current <= 10);
}

#[test]
fn page_flip_keeps_row_in_view() {
    let dir = many_files(30);
    let mut h = browser(dir.path());
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::DpadRight);
    assert_eq!(files(&mut h).cursor(), Cursor { top: 14, current: 15 });
    h.tap(KeyCode::DpadRight);
    assert_eq!(files(&mut h).cursor(), Cursor { top: 16, current: 17 });
    h.tap(KeyCode::DpadLeft);
    assert_eq!(files(&mut h).cursor(), Cursor { top: 2, current: 3 });
}

#[test]
fn ok_enters_directory_in_place() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::VirtualOk);
    assert_eq!(h.ctx.depth(), 1);
    assert_eq!(files(&mut h).work_dir(), tree.path().join("alpha"));
    assert_eq!(names(&mut h), ["inner", "song.mkv"]);
    assert_eq!(files(&mut h).cursor(), Cursor::default());
}

#[test]
fn cancel_restores_cursor_on_left_directory() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::VirtualOk);
    assert_eq!(files(&mut h).work_dir(), tree.path().join("beta"));
    assert!(files(&mut h).items().is_empty());

    h.tap(KeyCode::VirtualCancel);
    assert_eq!(files(&mut h).work_dir(), tree.path());
    assert_eq!(files(&mut h).cursor().current, 1);
    assert_eq!(files(&mut h).selected().unwrap().name, "beta");
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_directory_can_be_entered_and_left() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let root = tempfile::tempdir().unwrap();
    let raw = OsStr::from_bytes(b"caf\xe9");
    fs::create_dir(root.path().join(raw)).unwrap();
    fs::write(root.path().join(raw).join("track.mp3"), b"ID3").unwrap();
    fs::write(root.path().join("zz.mp4"), b"x").unwrap();

    let mut h = browser(root.path());
    assert_eq!(files(&mut h).selected().unwrap().name.as_os_str(), raw);
    h.tap(KeyCode::VirtualOk);
    assert_eq!(files(&mut h).work_dir(), root.path().join(raw));
    assert_eq!(names(&mut h), ["track.mp3"]);

    h.tap(KeyCode::VirtualCancel);
    assert_eq!(files(&mut h).work_dir(), root.path());
    assert_eq!(files(&mut h).selected().unwrap().name.as_os_str(), raw);
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_file_opens_with_raw_path() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let root = tempfile::tempdir().unwrap();
    let raw = OsStr::from_bytes(b"m\xfasica.mp3");
    fs::write(root.path().join(raw), b"ID3").unwrap();

    let (engine, script) = scripted();
    let mut h = Harness::new(root.path());
    open(&mut h, engine);
    h.tap(KeyCode::VirtualOk);
    assert_eq!(h.ctx.current(), Some(PanelId::of::<PlayerPanel>()));
    assert_eq!(script.loaded(), [root.path().join(raw)]);
}

#[test]
fn cancel_relocates_when_parent_changed() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::VirtualOk);
    fs::create_dir(tree.path().join("aaa")).unwrap();

    h.tap(KeyCode::VirtualCancel);
    assert_eq!(names(&mut h), ["aaa", "alpha", "beta", "a.mp4", "b.mp4"]);
    assert_eq!(files(&mut h).selected().unwrap().name, "beta");
}

#[test]
fn nested_cursors_unwind_in_order() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::VirtualOk);
    h.tap(KeyCode::VirtualOk);
    assert_eq!(files(&mut h).work_dir(), tree.path().join("alpha/inner"));

    h.tap(KeyCode::VirtualCancel);
    assert_eq!(files(&mut h).selected().unwrap().name, "inner");
    h.tap(KeyCode::VirtualCancel);
    assert_eq!(files(&mut h).selected().unwrap().name, "alpha");
}

#[test]
fn cancel_at_start_directory_pops_panel() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::VirtualCancel);
    assert_eq!(h.ctx.current(), None);
}

#[test]
fn triangle_flips_order_and_keeps_selection() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::Triangle);
    assert!(files(&mut h).order().descending);
    assert_eq!(names(&mut h), ["beta", "alpha", "b.mp4", "a.mp4"]);
    assert_eq!(files(&mut h).selected().unwrap().name, "alpha");
    assert_eq!(files(&mut h).cursor().current, 1);
}

#[test]
fn triggers_step_through_fields_and_clamp() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::TriggerL);
    assert_eq!(files(&mut h).order().field, SortField::Name);

    h.tap(KeyCode::TriggerR);
    assert_eq!(files(&mut h).order().field, SortField::Size);
    assert_eq!(names(&mut h)[2..], ["b.mp4", "a.mp4"]);

    h.tap(KeyCode::TriggerR);
    h.tap(KeyCode::TriggerR);
    assert_eq!(files(&mut h).order().field, SortField::Date);
}

#[test]
fn resort_follows_selected_file() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::DpadDown);
    assert_eq!(files(&mut h).selected().unwrap().name, "a.mp4");
    h.tap(KeyCode::TriggerR);
    assert_eq!(files(&mut h).selected().unwrap().name, "a.mp4");
    assert_eq!(files(&mut h).cursor().current, 3);
}

#[test]
fn failed_player_leaves_browser_current() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::VirtualOk);
    assert_eq!(h.ctx.current(), Some(PanelId::of::<FilesPanel>()));
    assert_eq!(h.ctx.depth(), 1);
    // Listing was restored by the second on_show.
    assert_eq!(files(&mut h).selected().unwrap().name, "a.mp4");
}

#[test]
fn ok_on_file_opens_player() {
    let tree = small_tree();
    let (engine, script) = scripted();
    let mut h = Harness::new(tree.path());
    open(&mut h, engine);
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::VirtualOk);

    assert_eq!(h.ctx.current(), Some(PanelId::of::<PlayerPanel>()));
    assert_eq!(script.loaded(), [tree.path().join("a.mp4")]);
    let player = h.ctx.panel_mut::<PlayerPanel>().unwrap();
    assert!(player.perf().is_none());
}

#[test]
fn both_triggers_held_enable_perf_overlay() {
    let tree = small_tree();
    let (engine, _script) = scripted();
    let mut h = Harness::new(tree.path());
    open(&mut h, engine);
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::DpadDown);
    h.press(KeyCode::TriggerL);
    h.press(KeyCode::TriggerR);
    h.tap(KeyCode::VirtualOk);

    let player = h.ctx.panel_mut::<PlayerPanel>().unwrap();
    assert!(player.perf().is_some());
}

#[test]
fn listing_is_reread_when_shown_again() {
    let tree = small_tree();
    let (engine, _script) = scripted();
    let mut h = Harness::new(tree.path());
    open(&mut h, engine);
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::DpadDown);
    h.tap(KeyCode::VirtualOk);
    fs::write(tree.path().join("c.mp4"), b"c").unwrap();

    h.ctx.ui_mut().pop();
    h.idle();
    assert_eq!(names(&mut h), ["alpha", "beta", "a.mp4", "b.mp4", "c.mp4"]);
    assert_eq!(files(&mut h).selected().unwrap().name, "a.mp4");
}

#[test]
fn draw_shows_titles_and_columns() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.step();
    assert!(h.render.has_text("Name\u{25b2}"));
    assert!(h.render.has_text("Size"));
    assert!(h.render.has_text("Date"));
    assert!(h.render.has_text("alpha"));
    assert!(h.render.has_text("--"));
    assert!(h.render.has_text("2KB"));
    assert!(h.render.has_text("10B"));

    let calls = h.render.calls();
    assert_eq!(calls.first(), Some(&DrawCall::Clear(Color::BLACK)));
    let push = calls.iter().position(|c| matches!(c, DrawCall::ClipPush(_)));
    let pop = calls.iter().position(|c| matches!(c, DrawCall::ClipPop));
    assert!(push.unwrap() < pop.unwrap());
}

#[test]
fn descending_marker_follows_order() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.tap(KeyCode::TriggerR);
    h.tap(KeyCode::Triangle);
    h.step();
    assert!(h.render.has_text("Size\u{25bc}"));
    assert!(!h.render.has_text("Name\u{25b2}"));
}

#[test]
fn control_whitespace_is_not_drawn() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tab\tname"), b"x").unwrap();
    let mut h = browser(dir.path());
    h.step();
    assert!(h.render.has_text("tab name"));
    assert_eq!(names(&mut h), ["tab\tname"]);
}

#[test]
fn only_one_page_of_rows_is_drawn() {
    let dir = many_files(30);
    let mut h = browser(dir.path());
    h.step();
    assert!(h.render.has_text("f13"));
    assert!(!h.render.has_text("f14"));
}

#[test]
fn scroll_bar_only_for_long_listings() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    assert_eq!(files(&mut h).shapes().len(), 2);

    let dir = many_files(30);
    let mut h = browser(dir.path());
    let shapes = files(&mut h).shapes();
    assert_eq!(shapes.len(), 4);
}

#[test]
fn hiding_drops_listing_and_held_keys() {
    let tree = small_tree();
    let mut h = browser(tree.path());
    h.press(KeyCode::DpadDown);
    let state = h.ctx.with_panel::<FilesPanel, _>(|panel, ui| {
        assert!(panel.keys.is_holding());
        panel.on_hide(ui);
        (panel.items().len(), panel.keys.is_holding())
    });
    assert_eq!(state, Some((0, false)));
}
