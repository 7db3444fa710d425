//! Framebuffer and style types for terminal rendering.
//!
//! Every cell carries a depth value; [`FrameBuffer::plot`] only overwrites a
//! cell when the incoming depth is at least the stored one, so sprites can be
//! drawn in any order and still composite back-to-front.

pub use crate::types::Rgb;

/// Minimal per-cell styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    pub fg: Rgb,
    pub bg: Rgb,
    pub bold: bool,
    pub dim: bool,
}

/// Background behind everything.
pub const BACKDROP: Rgb = Rgb::new(18, 18, 26);

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            fg: Rgb::new(220, 220, 220),
            bg: BACKDROP,
            bold: false,
            dim: false,
        }
    }
}

impl CellStyle {
    pub fn into_cell(self, ch: char) -> Cell {
        Cell { ch, style: self }
    }
}

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        CellStyle::default().into_cell(' ')
    }
}

/// 2D framebuffer of styled character cells with a depth channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    depth: Vec<f64>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let len = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); len],
            depth: vec![f64::NEG_INFINITY; len],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize, keeping the allocations when possible.
    pub fn resize(&mut self, width: u16, height: u16) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        let len = (width as usize) * (height as usize);
        self.cells.resize(len, Cell::default());
        self.depth.resize(len, f64::NEG_INFINITY);
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline(always)]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= i32::from(self.width) || y >= i32::from(self.height) {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        self.idx(i32::from(x), i32::from(y)).map(|i| self.cells[i])
    }

    /// Fill every cell and reset the depth channel.
    pub fn clear(&mut self, cell: Cell) {
        self.cells.fill(cell);
        self.depth.fill(f64::NEG_INFINITY);
    }

    /// Depth-tested write. Returns whether the cell was written.
    pub fn plot(&mut self, x: i32, y: i32, ch: char, style: CellStyle, depth: f64) -> bool {
        let Some(i) = self.idx(x, y) else {
            return false;
        };
        if depth < self.depth[i] {
            return false;
        }
        self.cells[i] = Cell { ch, style };
        self.depth[i] = depth;
        true
    }

    /// Depth-tested text, clipped at the right edge.
    pub fn put_str(&mut self, x: i32, y: i32, s: &str, style: CellStyle, depth: f64) {
        for (dx, ch) in s.chars().enumerate() {
            self.plot(x + dx as i32, y, ch, style, depth);
        }
    }
}
