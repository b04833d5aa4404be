//! Page computation: which visible games share the canvas for one dwell.
//!
//! The visible slots are padded with empty placeholders up to a whole
//! number of pages, then rotated left by `page * capacity` so the requested
//! page lands first. A placeholder renders as an empty box.

use crate::game_box::BOXES_PER_COLUMN;
use crate::mode::Mode;

/// How many game boxes one page holds in each mode.
///
/// Sizes are capped at what the layout has room for: two columns of boxes
/// in the compact modes, one column when boxes span the full width or the
/// gamecast panel takes the right half.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageSizes {
    pub basic: usize,
    pub dual: usize,
    pub detailed: usize,
    pub gamecast: usize,
}

impl PageSizes {
    /// Most boxes `mode` can fit on the canvas.
    pub fn layout_limit(mode: Mode) -> usize {
        match mode {
            Mode::Basic | Mode::Dual => 2 * BOXES_PER_COLUMN,
            Mode::Detailed | Mode::Gamecast => BOXES_PER_COLUMN,
        }
    }

    /// Size as configured, before clamping.
    pub fn requested(&self, mode: Mode) -> usize {
        match mode {
            Mode::Basic => self.basic,
            Mode::Dual => self.dual,
            Mode::Detailed => self.detailed,
            Mode::Gamecast => self.gamecast,
        }
    }

    pub fn for_mode(&self, mode: Mode) -> usize {
        self.requested(mode).clamp(1, Self::layout_limit(mode))
    }
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            basic: 5,
            dual: 10,
            detailed: 5,
            gamecast: 5,
        }
    }
}

/// One page worth of boxes. `slots[position]` is the game slot drawn in
/// box `position`, or `None` for an empty box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub count: usize,
    pub slots: Vec<Option<usize>>,
}

impl Page {
    /// Box position of `slot` on this page, if it is shown.
    pub fn position_of(&self, slot: usize) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(slot))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Paginator {
    sizes: PageSizes,
}

impl Paginator {
    pub fn new(sizes: PageSizes) -> Self {
        Self { sizes }
    }

    pub fn capacity(&self, mode: Mode) -> usize {
        self.sizes.for_mode(mode)
    }

    /// `ceil(visible / capacity)`, never less than one.
    pub fn page_count(&self, visible: usize, mode: Mode) -> usize {
        visible.div_ceil(self.capacity(mode)).max(1)
    }

    /// Whether pages need to rotate at all. When every visible game fits on
    /// screen, page 0 is simply redrawn.
    pub fn cycles(&self, visible: usize, mode: Mode) -> bool {
        visible > self.capacity(mode)
    }

    /// Compute page `page_index` (wrapping) from the visible slots in index order.
    pub fn compute_page(&self, visible_slots: &[usize], page_index: usize, mode: Mode) -> Page {
        let capacity = self.capacity(mode);
        let count = self.page_count(visible_slots.len(), mode);
        let index = page_index % count;

        let mut padded: Vec<Option<usize>> = visible_slots.iter().copied().map(Some).collect();
        padded.resize(count * capacity, None);
        padded.rotate_left(index * capacity);
        padded.truncate(capacity);

        Page {
            index,
            count,
            slots: padded,
        }
    }
}
