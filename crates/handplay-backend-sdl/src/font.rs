//! SDL2_ttf faces, opened lazily once per pixel size.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use sdl2::ttf::{Font, Sdl2TtfContext};

use handplay_platform::FontId;
use handplay_types::{HandplayError, Result};

/// Size used to check that a face can be opened at all.
const PROBE_SIZE: u16 = 16;

struct Face {
    path: PathBuf,
    sizes: HashMap<u16, Font<'static, 'static>>,
}

pub(crate) struct FontCache {
    ttf: &'static Sdl2TtfContext,
    faces: HashMap<u64, Face>,
    next_id: u64,
}

fn font_err(e: impl ToString) -> HandplayError {
    HandplayError::Render(e.to_string())
}

impl FontCache {
    pub(crate) fn new() -> Result<Self> {
        // Lives for the rest of the process; faces borrow from it.
        let ttf: &'static Sdl2TtfContext = Box::leak(Box::new(sdl2::ttf::init().map_err(font_err)?));
        Ok(Self {
            ttf,
            faces: HashMap::new(),
            next_id: 1,
        })
    }

    pub(crate) fn open(&mut self, path: Option<&Path>) -> Result<FontId> {
        let path = path.ok_or(HandplayError::Unsupported("built-in font"))?;
        let probe = self.ttf.load_font(path, PROBE_SIZE).map_err(font_err)?;
        let id = self.next_id;
        self.next_id += 1;
        self.faces.insert(
            id,
            Face {
                path: path.to_path_buf(),
                sizes: HashMap::from([(PROBE_SIZE, probe)]),
            },
        );
        log::info!("Loaded font {}", path.display());
        Ok(FontId(id))
    }

    pub(crate) fn close(&mut self, font: FontId) {
        self.faces.remove(&font.0);
    }

    /// The face of `font` at `size`, opening it on first use.
    pub(crate) fn sized(&mut self, font: FontId, size: u16) -> Result<&Font<'static, 'static>> {
        let face = self
            .faces
            .get_mut(&font.0)
            .ok_or_else(|| HandplayError::Render(format!("unknown font {}", font.0)))?;
        if !face.sizes.contains_key(&size) {
            let loaded = self.ttf.load_font(&face.path, size).map_err(font_err)?;
            log::debug!("Opened {} at {size}px", face.path.display());
            face.sizes.insert(size, loaded);
        }
        face.sizes
            .get(&size)
            .ok_or_else(|| HandplayError::Render(format!("font size {size} missing")))
    }
}
