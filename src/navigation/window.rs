//! Sliding window of page buttons.

use std::fmt;

/// Number of consecutive page buttons shown around the current page.
pub const WINDOW_SIZE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Page(u32),
    Ellipsis,
}

/// Page buttons for `current` of `total`.
///
/// The window is centred on the current page where possible. Page 1 and the
/// last page are always reachable directly; a gap to either is shown as an
/// ellipsis.
pub fn page_window(current: u32, total: u32) -> Vec<PageSlot> {
    let total = total.max(1);
    let current = current.clamp(1, total);

    let mut start = current.saturating_sub(WINDOW_SIZE / 2).max(1);
    let end = (start + WINDOW_SIZE - 1).min(total);
    if end == total {
        start = (end + 1).saturating_sub(WINDOW_SIZE).max(1);
    }

    let mut slots = Vec::with_capacity(WINDOW_SIZE as usize + 4);

    if start > 1 {
        slots.push(PageSlot::Page(1));
        if start > 2 {
            slots.push(PageSlot::Ellipsis);
        }
    }

    slots.extend((start..=end).map(PageSlot::Page));

    if end < total {
        if end < total - 1 {
            slots.push(PageSlot::Ellipsis);
        }
        slots.push(PageSlot::Page(total));
    }

    slots
}

/// Plain-text page bar, e.g. `‹ 1 … 4 [5] 6 … 10 ›`.
pub struct PageBar {
    pub current: u32,
    pub total: u32,
}

impl fmt::Display for PageBar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total <= 1 {
            return write!(f, "Page 1 of 1");
        }
        write!(f, "‹")?;
        for slot in page_window(self.current, self.total) {
            match slot {
                PageSlot::Page(n) if n == self.current => write!(f, " [{}]", n)?,
                PageSlot::Page(n) => write!(f, " {}", n)?,
                PageSlot::Ellipsis => write!(f, " …")?,
            }
        }
        write!(f, " ›")
    }
}
