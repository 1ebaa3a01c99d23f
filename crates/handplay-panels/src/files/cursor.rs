//! Cursor and viewport over a listing of fixed-height rows.

/// Rows visible on one page.
pub const PAGE_ROWS: usize = 14;

/// `top` is the first visible row, `current` the highlighted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub top: usize,
    pub current: usize,
}

impl Cursor {
    pub const fn at(index: usize) -> Self {
        Self {
            top: index,
            current: index,
        }
    }

    /// Move the highlight by `delta` rows, scrolling just enough to keep it
    /// visible. Returns false when nothing changed.
    pub fn move_by(&mut self, delta: i64, count: usize) -> bool {
        if count == 0 || delta == 0 {
            return false;
        }
        let last = count as i64 - 1;
        let new = (self.current as i64 + delta).clamp(0, last) as usize;
        if new == self.current {
            return false;
        }
        self.current = new;
        if self.top > self.current {
            self.top = self.current;
        } else if self.current >= self.top + PAGE_ROWS {
            self.top = self.current + 1 - PAGE_ROWS;
        }
        true
    }

    /// Flip `pages` pages, keeping the highlight at the same row of the
    /// viewport. Flipping forward stops on the last page.
    pub fn page_by(&mut self, pages: i64, count: usize) -> bool {
        if count == 0 || pages == 0 {
            return false;
        }
        let shift = pages * PAGE_ROWS as i64;
        let top = self.top as i64;
        if top + shift >= count as i64 {
            return false;
        }
        let max_top = count.saturating_sub(PAGE_ROWS) as i64;
        let new_top = (top + shift).clamp(0, max_top) as usize;
        if new_top == self.top {
            return false;
        }
        let row = self.current - self.top;
        self.top = new_top;
        self.current = (new_top + row).min(count - 1);
        true
    }

    /// Pull both indices back inside a listing of `count` rows.
    pub fn clamp_to(&mut self, count: usize) {
        let last = count.saturating_sub(1);
        self.current = self.current.min(last);
        self.top = self.top.min(last);
    }
}
