//! TerminalRenderer: pushes a composed framebuffer to the real terminal.
//!
//! Redraws are row-granular: a row is re-emitted only if any of its cells
//! differ from the previously presented frame. A size change forces a full
//! redraw.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, QueueableCommand,
};

use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};

pub struct TerminalRenderer {
    stdout: io::Stdout,
    shown: Vec<Cell>,
    shown_size: Option<(u16, u16)>,
    buf: Vec<u8>,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            shown: Vec::new(),
            shown_size: None,
            buf: Vec::with_capacity(32 * 1024),
        }
    }

    /// Raw mode, alternate screen, mouse capture.
    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        self.buf.queue(event::EnableMouseCapture)?;
        self.buf.queue(cursor::Hide)?;
        self.buf.queue(terminal::DisableLineWrap)?;
        self.flush()
    }

    pub fn exit(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.queue(ResetColor)?;
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(terminal::EnableLineWrap)?;
        self.buf.queue(cursor::Show)?;
        self.buf.queue(event::DisableMouseCapture)?;
        self.buf.queue(terminal::LeaveAlternateScreen)?;
        self.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Forget the presented frame; the next `present` redraws everything.
    pub fn invalidate(&mut self) {
        self.shown_size = None;
    }

    pub fn present(&mut self, fb: &FrameBuffer) -> Result<()> {
        let size = (fb.width(), fb.height());
        let prev = match self.shown_size {
            Some(s) if s == size => Some(self.shown.as_slice()),
            _ => None,
        };

        self.buf.clear();
        if prev.is_none() {
            self.buf.queue(terminal::Clear(terminal::ClearType::All))?;
        }
        let rows = changed_rows(prev, fb);
        if rows.is_empty() {
            return Ok(());
        }
        encode_rows_into(fb, &rows, &mut self.buf)?;
        self.flush()?;

        self.shown.clear();
        self.shown.extend_from_slice(fb.cells());
        self.shown_size = Some(size);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stdout.write_all(&self.buf)?;
        self.stdout.flush()?;
        Ok(())
    }
}

/// Rows of `next` that differ from `prev` (all rows when there is no `prev`).
pub fn changed_rows(prev: Option<&[Cell]>, next: &FrameBuffer) -> Vec<u16> {
    let w = next.width() as usize;
    if w == 0 {
        return Vec::new();
    }
    (0..next.height())
        .filter(|&y| {
            let span = (y as usize) * w..(y as usize + 1) * w;
            prev.map_or(true, |p| p[span.clone()] != next.cells()[span])
        })
        .collect()
}

/// Encode the given rows as crossterm commands, coalescing style changes.
pub fn encode_rows_into(fb: &FrameBuffer, rows: &[u16], out: &mut Vec<u8>) -> Result<()> {
    let mut style: Option<CellStyle> = None;
    for &y in rows {
        out.queue(cursor::MoveTo(0, y))?;
        for x in 0..fb.width() {
            let cell = fb.get(x, y).unwrap_or_default();
            if style != Some(cell.style) {
                queue_style(out, cell.style)?;
                style = Some(cell.style);
            }
            out.queue(Print(cell.ch))?;
        }
    }
    out.queue(ResetColor)?;
    out.queue(SetAttribute(Attribute::Reset))?;
    Ok(())
}

fn queue_style(out: &mut Vec<u8>, style: CellStyle) -> Result<()> {
    out.queue(SetAttribute(Attribute::Reset))?;
    out.queue(SetForegroundColor(to_color(style.fg)))?;
    out.queue(SetBackgroundColor(to_color(style.bg)))?;
    if style.bold {
        out.queue(SetAttribute(Attribute::Bold))?;
    }
    if style.dim {
        out.queue(SetAttribute(Attribute::Dim))?;
    }
    Ok(())
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_touched_rows_are_redrawn() {
        let prev = FrameBuffer::new(4, 3);
        let mut next = prev.clone();
        next.plot(2, 1, 'X', CellStyle::default(), 0.0);
        assert_eq!(changed_rows(Some(prev.cells()), &next), vec![1]);
        assert_eq!(changed_rows(None, &next), vec![0, 1, 2]);
        assert!(changed_rows(Some(next.cells()), &next).is_empty());
    }

    #[test]
    fn encoded_rows_contain_glyphs() {
        let mut fb = FrameBuffer::new(3, 1);
        fb.put_str(0, 0, "a^b", CellStyle::default(), 0.0);
        let mut out = Vec::new();
        encode_rows_into(&fb, &[0], &mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains('a') && text.contains('^') && text.contains('b'));
    }
}
