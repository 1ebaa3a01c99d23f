//! Directory listing: reading, formatting and sorting entries.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use handplay_types::time::CalendarTime;

/// Shown in the size column for anything that is not a regular file.
pub const UNKNOWN_SIZE: &str = "--";

/// Units for the size column; a size uses the largest unit it fills.
const SIZE_UNITS: [(u64, &str); 4] = [(1, "B"), (1 << 10, "KB"), (1 << 20, "MB"), (1 << 30, "GB")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Dir,
    File,
    Other,
}

/// One directory entry with its column texts.
#[derive(Debug, Clone)]
pub struct PathItem {
    /// Raw entry name, used to build paths.
    pub name: OsString,
    pub kind: ItemKind,
    pub size: u64,
    pub modified: SystemTime,
    pub size_text: String,
    pub date_text: String,
}

impl PathItem {
    pub fn new(name: OsString, kind: ItemKind, size: u64, modified: SystemTime) -> Self {
        let size_text = match kind {
            ItemKind::File => format_size(size),
            _ => UNKNOWN_SIZE.to_string(),
        };
        let date_text = CalendarTime::from_system_time(modified).date_time_text();
        Self {
            name,
            kind,
            size,
            modified,
            size_text,
            date_text,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ItemKind::Dir
    }

    /// Name with control whitespace replaced, for drawing.
    pub fn display_name(&self) -> Cow<'_, str> {
        match self.name.to_string_lossy() {
            Cow::Borrowed(name) => sanitize_name(name),
            Cow::Owned(name) => Cow::Owned(sanitize_name(&name).into_owned()),
        }
    }
}

/// Column the listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    Size,
    Date,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::Name, SortField::Size, SortField::Date];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The field `offset` columns away, clamped to the first and last.
    pub fn offset(self, offset: i32) -> Self {
        let last = Self::ALL.len() as i64 - 1;
        let idx = (self.index() as i64 + i64::from(offset)).clamp(0, last);
        Self::ALL[idx as usize]
    }

    pub fn title(self) -> &'static str {
        match self {
            SortField::Name => "Name",
            SortField::Size => "Size",
            SortField::Date => "Date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOrder {
    pub field: SortField,
    pub descending: bool,
}

impl SortOrder {
    /// Directories first, then the selected field. Only the field
    /// comparison is reversed for a descending order.
    pub fn compare(&self, a: &PathItem, b: &PathItem) -> Ordering {
        b.is_dir().cmp(&a.is_dir()).then_with(|| {
            let ord = match self.field {
                SortField::Name => a.name.cmp(&b.name),
                SortField::Size => a.size.cmp(&b.size),
                SortField::Date => a.modified.cmp(&b.modified),
            };
            if self.descending { ord.reverse() } else { ord }
        })
    }

    pub fn sort(&self, items: &mut [PathItem]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

/// Read the entries of `dir`, without `.` and `..`. Entries whose metadata
/// cannot be read are skipped.
pub fn read_items(dir: &Path) -> io::Result<Vec<PathItem>> {
    let mut items = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::debug!("Stopping listing of {}: {e}", dir.display());
                break;
            }
        };
        let name = entry.file_name();
        if name == "." || name == ".." {
            continue;
        }
        // Follow symlinks so a link to a directory can be entered.
        let meta = match fs::metadata(entry.path()) {
            Ok(m) => m,
            Err(e) => {
                log::debug!("Skipping {}: {e}", name.to_string_lossy());
                continue;
            }
        };
        let kind = if meta.is_dir() {
            ItemKind::Dir
        } else if meta.is_file() {
            ItemKind::File
        } else {
            ItemKind::Other
        };
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        items.push(PathItem::new(name, kind, meta.len(), modified));
    }
    Ok(items)
}

/// Whole units, no space: `512B`, `3KB`, `12MB`, `2GB`.
pub fn format_size(bytes: u64) -> String {
    let (unit, name) = SIZE_UNITS
        .iter()
        .rev()
        .find(|(unit, _)| bytes >= *unit)
        .copied()
        .unwrap_or(SIZE_UNITS[0]);
    format!("{}{name}", bytes / unit)
}

fn is_control_space(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

pub fn sanitize_name(name: &str) -> Cow<'_, str> {
    if name.contains(is_control_space) {
        Cow::Owned(name.replace(is_control_space, " "))
    } else {
        Cow::Borrowed(name)
    }
}
