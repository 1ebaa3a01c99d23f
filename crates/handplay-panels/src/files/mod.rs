//! File browser panel.
//!
//! Lists one directory at a time, directories first. OK enters a directory
//! in place or opens a file in the player; CANCEL goes back up, restoring
//! the cursor that was left behind. The listing is only held while the
//! panel is visible.

pub mod cursor;
pub mod listing;

#[cfg(test)]
mod tests;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use handplay_core::{KeyBinding, KeyFire, KeyRepeat, Panel, Ui};
use handplay_platform::{FontId, RenderDriver, SCREEN_HEIGHT, SCREEN_WIDTH, ShapeItem};
use handplay_types::{Color, Key, KeyBits, KeyCode, Rect, Result};

use self::cursor::{Cursor, PAGE_ROWS};
use self::listing::{ItemKind, PathItem, SortField, SortOrder};
use crate::player::engine::EngineFactory;
use crate::player::{PlayerInit, PlayerPanel};

const COLOR_TEXT: Color = Color::from_abgr(0xffff_ffff);
const COLOR_MOVABLE: Color = Color::from_abgr(0xff72_2b72);
const COLOR_BLOCK: Color = Color::from_abgr(0xff34_3434);

const SCREEN_W: f32 = SCREEN_WIDTH as f32;
const SCREEN_H: f32 = SCREEN_HEIGHT as f32;

const FONT_SIZE: u16 = 26;
/// Text baseline offset inside a row.
const TEXT_P: f32 = 26.0;
const ROW_H: f32 = 32.0;

const MAIN_PADDING: f32 = 28.0;
const ITEMS_PADDING_X: f32 = 20.0;
const ITEMS_H: f32 = PAGE_ROWS as f32 * ROW_H;
const ITEMS_L: f32 = MAIN_PADDING;
const ITEMS_R: f32 = SCREEN_W - MAIN_PADDING;
const ITEMS_B: f32 = SCREEN_H - MAIN_PADDING;
const ITEMS_T: f32 = ITEMS_B - ITEMS_H;
const TITLE_T: f32 = MAIN_PADDING;

const SCROLL_BAR_W: f32 = 8.0;
const SCROLL_BAR_MARGIN: f32 = 6.0;
const SCROLL_BAR_L: f32 = ITEMS_R - SCROLL_BAR_W;

const SIZE_W: f32 = 130.0;
const DATE_W: f32 = 260.0;
const NAME_W: f32 = SCREEN_W - MAIN_PADDING * 2.0 - ITEMS_PADDING_X * 2.0 - SIZE_W - DATE_W;
const NAME_L: f32 = MAIN_PADDING + ITEMS_PADDING_X;
const SIZE_L: f32 = NAME_L + NAME_W;
const DATE_L: f32 = SIZE_L + SIZE_W;
const NAME_CLIP_R: f32 = NAME_L + NAME_W - 20.0;

const SORT_ASC: &str = "\u{25b2}";
const SORT_DESC: &str = "\u{25bc}";

/// Both triggers held while opening a file turn on the stats overlay.
const PERF_COMBO: KeyBits = KeyBits::of(&[KeyCode::TriggerL, KeyCode::TriggerR]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilesAction {
    Move(i64),
    Page(i64),
    Open,
    Back,
    FlipOrder,
    Field(i32),
}

const FILES_KEYS: [KeyBinding<FilesAction>; 9] = [
    KeyBinding::repeat(KeyCode::DpadUp, FilesAction::Move(-1)),
    KeyBinding::repeat(KeyCode::DpadDown, FilesAction::Move(1)),
    KeyBinding::repeat(KeyCode::DpadLeft, FilesAction::Page(-1)),
    KeyBinding::repeat(KeyCode::DpadRight, FilesAction::Page(1)),
    KeyBinding::click(KeyCode::VirtualOk, FilesAction::Open),
    KeyBinding::click(KeyCode::VirtualCancel, FilesAction::Back),
    KeyBinding::click(KeyCode::Triangle, FilesAction::FlipOrder),
    KeyBinding::click(KeyCode::TriggerL, FilesAction::Field(-1)),
    KeyBinding::click(KeyCode::TriggerR, FilesAction::Field(1)),
];

pub struct FilesInit {
    /// Directory to list first. Defaults to the configured files
    /// directory, then the platform's.
    pub start_dir: Option<PathBuf>,
    /// Engine used for files opened from this browser.
    pub engine: EngineFactory,
}

pub struct FilesPanel {
    work_dir: PathBuf,
    items: Vec<PathItem>,
    cursor: Cursor,
    /// Cursors of the parent directories, innermost last.
    cursor_stack: Vec<Cursor>,
    order: SortOrder,
    keys: KeyRepeat<FilesAction>,
    engine: EngineFactory,
}

impl FilesPanel {
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn items(&self) -> &[PathItem] {
        &self.items
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn selected(&self) -> Option<&PathItem> {
        self.items.get(self.cursor.current)
    }

    /// Re-read the work directory. The cursor is put on `match_name` when
    /// given, reset to the top with `reset`, or clamped otherwise.
    fn refill(&mut self, match_name: Option<&OsStr>, reset: bool) {
        self.items = match listing::read_items(&self.work_dir) {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Cannot list {}: {e}", self.work_dir.display());
                Vec::new()
            }
        };
        self.order.sort(&mut self.items);
        log::debug!("Listed {} entries in {}", self.items.len(), self.work_dir.display());

        if let Some(name) = match_name {
            self.relocate(name);
        } else if reset {
            self.cursor = Cursor::default();
        } else {
            self.cursor.clamp_to(self.items.len());
        }
    }

    /// Keep the cursor if it is already on `name`, otherwise move it there,
    /// or to the top when `name` is gone.
    fn relocate(&mut self, name: &OsStr) {
        if self.selected().is_some_and(|item| item.name.as_os_str() == name) {
            return;
        }
        self.cursor = self
            .items
            .iter()
            .position(|item| item.name.as_os_str() == name)
            .map(Cursor::at)
            .unwrap_or_default();
    }

    fn open_selected(&mut self, ui: &mut Ui) {
        let Some(item) = self.selected() else {
            return;
        };
        let (name, kind) = (item.name.clone(), item.kind);
        match kind {
            ItemKind::Dir => {
                self.cursor_stack.push(self.cursor);
                self.work_dir.push(&name);
                self.refill(None, true);
                ui.invalidate();
            }
            ItemKind::File => {
                let enable_perf = ui.check_pressed_keys(PERF_COMBO);
                ui.push::<PlayerPanel>(PlayerInit {
                    path: self.work_dir.join(&name),
                    enable_perf,
                    engine: Arc::clone(&self.engine),
                });
            }
            ItemKind::Other => {
                log::warn!("Cannot open {}: not a file or directory", name.to_string_lossy());
            }
        }
    }

    fn go_back(&mut self, ui: &mut Ui) {
        let Some(saved) = self.cursor_stack.last().copied() else {
            ui.pop();
            return;
        };
        let Some(left) = self.work_dir.file_name().map(OsStr::to_os_string) else {
            return;
        };
        if !self.work_dir.pop() {
            return;
        }
        self.cursor_stack.pop();
        self.cursor = saved;
        self.refill(Some(left.as_os_str()), false);
        ui.invalidate();
    }

    fn resort(&mut self, ui: &mut Ui, field_offset: i32, flip: bool) {
        let order = SortOrder {
            field: self.order.field.offset(field_offset),
            descending: self.order.descending ^ flip,
        };
        if order == self.order {
            return;
        }
        let current = self.selected().map(|item| item.name.clone());
        self.order = order;
        self.order.sort(&mut self.items);
        if let Some(name) = current {
            self.relocate(&name);
        }
        ui.invalidate();
    }

    fn perform(&mut self, ui: &mut Ui, fire: KeyFire<FilesAction>) {
        let count = i64::from(fire.repeat.max(1));
        let changed = match fire.action {
            FilesAction::Move(delta) => self.cursor.move_by(delta * count, self.items.len()),
            FilesAction::Page(pages) => self.cursor.page_by(pages * count, self.items.len()),
            FilesAction::Open => {
                self.open_selected(ui);
                false
            }
            FilesAction::Back => {
                self.go_back(ui);
                false
            }
            FilesAction::FlipOrder => {
                self.resort(ui, 0, true);
                false
            }
            FilesAction::Field(offset) => {
                self.resort(ui, offset, false);
                false
            }
        };
        if changed {
            ui.invalidate();
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn has_scroll_bar(&self) -> bool {
        self.items.len() > PAGE_ROWS
    }

    fn visible_rows(&self) -> impl Iterator<Item = (f32, usize, &PathItem)> {
        self.items
            .iter()
            .enumerate()
            .skip(self.cursor.top)
            .take(PAGE_ROWS)
            .zip(0..)
            .map(|((idx, item), row)| (ITEMS_T + row as f32 * ROW_H, idx, item))
    }

    fn shapes(&self) -> Vec<ShapeItem> {
        let mut shapes = vec![ShapeItem::fill(
            Rect::new(ITEMS_L, TITLE_T, ITEMS_R, TITLE_T + ROW_H),
            COLOR_BLOCK,
        )];

        if self.has_scroll_bar() {
            let n = self.items.len() as f32;
            let height = (ITEMS_H * PAGE_ROWS as f32 / n).floor();
            let offset = (ITEMS_H * self.cursor.top as f32 / n)
                .floor()
                .min(ITEMS_H - height);
            shapes.push(ShapeItem::fill(
                Rect::new(SCROLL_BAR_L, ITEMS_T, ITEMS_R, ITEMS_B),
                COLOR_BLOCK,
            ));
            shapes.push(ShapeItem::fill(
                Rect::new(SCROLL_BAR_L, ITEMS_T + offset, ITEMS_R, ITEMS_T + offset + height),
                COLOR_MOVABLE,
            ));
        }

        let cursor_r = if self.has_scroll_bar() {
            ITEMS_R - SCROLL_BAR_W - SCROLL_BAR_MARGIN
        } else {
            ITEMS_R
        };
        if let Some((top, _, _)) = self
            .visible_rows()
            .find(|(_, idx, _)| *idx == self.cursor.current)
        {
            shapes.push(ShapeItem::fill(
                Rect::new(ITEMS_L, top, cursor_r, top + ROW_H),
                COLOR_MOVABLE,
            ));
        }
        shapes
    }

    fn draw_titles(&self, render: &mut dyn RenderDriver, font: FontId) -> Result<()> {
        let y = TITLE_T + TEXT_P;
        for (field, x) in SortField::ALL.into_iter().zip([NAME_L, SIZE_L, DATE_L]) {
            let text = if field == self.order.field {
                let sign = if self.order.descending { SORT_DESC } else { SORT_ASC };
                format!("{}{sign}", field.title())
            } else {
                field.title().to_string()
            };
            render.draw_text(font, FONT_SIZE, COLOR_TEXT, x, y, &text)?;
        }
        Ok(())
    }

    fn draw_names(&self, render: &mut dyn RenderDriver, font: FontId) -> Result<()> {
        render.clip_push(Rect::new(NAME_L, ITEMS_T, NAME_CLIP_R, SCREEN_H))?;
        let result = self.visible_rows().try_for_each(|(top, _, item)| {
            render.draw_text(font, FONT_SIZE, COLOR_TEXT, NAME_L, top + TEXT_P, &item.display_name())
        });
        render.clip_pop()?;
        result
    }

    fn draw_columns(&self, render: &mut dyn RenderDriver, font: FontId) -> Result<()> {
        for (top, _, item) in self.visible_rows() {
            let y = top + TEXT_P;
            render.draw_text(font, FONT_SIZE, COLOR_TEXT, SIZE_L, y, &item.size_text)?;
            render.draw_text(font, FONT_SIZE, COLOR_TEXT, DATE_L, y, &item.date_text)?;
        }
        Ok(())
    }
}

impl Panel for FilesPanel {
    type Init = FilesInit;

    fn init(ui: &mut Ui, init: FilesInit) -> Result<Self> {
        let work_dir = init
            .start_dir
            .or_else(|| ui.config().files_dir.clone())
            .unwrap_or_else(|| ui.platform().files_dir());
        log::info!("Browsing {}", work_dir.display());
        Ok(Self {
            work_dir,
            items: Vec::new(),
            cursor: Cursor::default(),
            cursor_stack: Vec::new(),
            order: SortOrder::default(),
            keys: KeyRepeat::new(ui.config().files.repeat()),
            engine: init.engine,
        })
    }

    fn on_show(&mut self, _ui: &mut Ui) {
        self.refill(None, false);
    }

    fn on_hide(&mut self, _ui: &mut Ui) {
        self.items = Vec::new();
        self.keys.reset();
    }

    fn on_draw(&mut self, ui: &mut Ui) -> Result<()> {
        ui.render().clear(Color::BLACK)?;
        ui.render().draw_shapes(&self.shapes())?;
        let Some(font) = ui.font() else {
            return Ok(());
        };
        let render = ui.render();
        self.draw_titles(render, font)?;
        self.draw_names(render, font)?;
        self.draw_columns(render, font)
    }

    fn on_poll(&mut self, ui: &mut Ui) {
        if let Some(fire) = self.keys.poll(ui.frame_time()) {
            self.perform(ui, fire);
        }
    }

    fn on_key(&mut self, ui: &mut Ui, key: Key) {
        if let Some(fire) = self.keys.dispatch(key, ui.frame_time(), &FILES_KEYS) {
            self.perform(ui, fire);
        }
    }
}
