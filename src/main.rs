//! Isostack terminal viewer (default binary).
//!
//! Loads a layout into a stacked grid, renders it through the terminal
//! backend, and drives the view from the keyboard and mouse.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind, MouseButton, MouseEventKind};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use isostack::core::{parse_layout, GridConfig, Layout, StackedGrid};
use isostack::input::{handle_key_event, should_quit};
use isostack::term::{CellStyle, FrameBuffer, Rgb, TermBackend, TerminalRenderer, Viewport};
use isostack::types::{CellContent, Facing, ObjectKind, StairDirection, TileKind, ViewAction};

/// Interactive viewer for stacked isometric grids.
#[derive(Parser, Debug)]
#[command(name = "isostack")]
#[command(about = "Stacked isometric tile grid viewer", long_about = None)]
struct Cli {
    /// JSON grid config (camelCase keys; missing or invalid keys use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON layout: rows of cell descriptors
    #[arg(long)]
    layout: Option<PathBuf>,
}

const POLL: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = match &cli.config {
        Some(path) => GridConfig::from_json_str(&read(path)?),
        None => GridConfig::default(),
    };
    let layout = load_layout(cli.layout.as_deref(), &config)?;
    info!(
        columns = config.column_count,
        rows = config.row_count,
        max_z = config.max_z,
        "starting viewer"
    );

    let mut term = TerminalRenderer::new();
    term.enter()?;
    let result = run(&mut term, config, &layout, cli.layout.as_deref());
    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// File logging, only when `ISOSTACK_LOG` names a path; the terminal is in raw mode.
fn init_logging() -> Result<()> {
    let Some(path) = std::env::var_os("ISOSTACK_LOG") else {
        return Ok(());
    };
    let file = std::fs::File::create(&path)
        .with_context(|| format!("creating log file {}", Path::new(&path).display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_layout(path: Option<&Path>, config: &GridConfig) -> Result<Layout> {
    match path {
        Some(path) => {
            let json = read(path)?;
            parse_layout(&json).with_context(|| format!("parsing layout {}", path.display()))
        }
        None => Ok(builtin_layout(config)),
    }
}

/// A small hill with a staircase and a few props.
fn builtin_layout(config: &GridConfig) -> Layout {
    let (cols, rows) = (config.column_count, config.row_count);
    let (mx, my) = (cols / 2, rows / 2);
    (0..rows)
        .map(|y| {
            (0..cols)
                .map(|x| {
                    let dist = x.abs_diff(mx).max(y.abs_diff(my));
                    let height = config.max_z.min(3).saturating_sub(dist);
                    let kind = TileKind(1 + ((x + y) % 4) as u16);
                    if x == mx && y + 1 == my {
                        CellContent::Detailed {
                            kind: TileKind::STAIR,
                            height: height.saturating_sub(1),
                            facing: Some(Facing::Stair(StairDirection::SeToNw)),
                            object: None,
                        }
                    } else if (x + 2 * y) % 7 == 0 {
                        CellContent::Detailed {
                            kind,
                            height,
                            facing: None,
                            object: Some(ObjectKind(1 + (x % 4) as u16)),
                        }
                    } else if height == 0 {
                        CellContent::Simple(kind)
                    } else {
                        CellContent::Detailed {
                            kind,
                            height,
                            facing: None,
                            object: None,
                        }
                    }
                })
                .collect()
        })
        .collect()
}

struct Viewer<'a> {
    grid: StackedGrid<TermBackend>,
    cursor: (i32, i32),
    layout: Layout,
    layout_path: Option<&'a Path>,
}

impl Viewer<'_> {
    fn apply(&mut self, action: ViewAction) -> Result<()> {
        debug!(action = action.as_str(), "view action");
        match action {
            ViewAction::CursorLeft => self.move_cursor(-1, 0),
            ViewAction::CursorRight => self.move_cursor(1, 0),
            ViewAction::CursorUp => self.move_cursor(0, -1),
            ViewAction::CursorDown => self.move_cursor(0, 1),
            ViewAction::Raise => {
                let (x, y) = self.cursor;
                let kind = self
                    .grid
                    .lookup(x, y, None)
                    .map_or(TileKind::FILL, |t| t.kind());
                let z = self.top_level().map_or(0, |top| top + 1);
                self.grid.place(x, y, z, CellContent::Simple(kind));
            }
            ViewAction::Lower => {
                if let Some(top) = self.top_level() {
                    self.grid.remove(self.cursor.0, self.cursor.1, top);
                }
            }
            ViewAction::RotateCw => self.grid.rotate_view_cw(),
            ViewAction::RotateCcw => self.grid.rotate_view_ccw(),
            ViewAction::ToggleZTint => self.grid.toggle_z_tint(),
            ViewAction::ToggleXray => self.grid.toggle_xray(),
            ViewAction::Reload => {
                self.layout = load_layout(self.layout_path, self.grid.config())?;
                self.grid.bulk_load(&self.layout);
            }
        }
        self.sync_highlight();
        Ok(())
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let cfg = self.grid.config();
        let max_x = cfg.column_count as i32 - 1;
        let max_y = cfg.row_count as i32 - 1;
        self.cursor = (
            (self.cursor.0 + dx).clamp(0, max_x),
            (self.cursor.1 + dy).clamp(0, max_y),
        );
    }

    fn top_level(&self) -> Option<i32> {
        let (x, y) = self.cursor;
        self.grid
            .column_height(x as u32, y as u32)
            .map(|h| h as i32 - 1)
    }

    fn sync_highlight(&mut self) {
        let (x, y) = self.cursor;
        match self.top_level() {
            Some(z) => {
                self.grid.highlight(x, y, z);
            }
            None => self.grid.clear_highlight(),
        }
    }

    fn click(&mut self, col: u16, row: u16) {
        let p = self.grid.backend().cell_to_screen(col, row);
        let picked = self
            .grid
            .pick_by_screen_point(p.x, p.y)
            .map(|t| (t.x(), t.y(), t.z()));
        if let Some((x, y, z)) = picked {
            debug!(x, y, z, "picked");
            self.cursor = (x as i32, y as i32);
            self.grid.highlight(x as i32, y as i32, z as i32);
        }
    }

    fn compose(&mut self, viewport: Viewport, fb: &mut FrameBuffer) {
        let cfg = *self.grid.config();
        let center = self.grid.transformer().cell_to_screen(
            cfg.column_count / 2,
            cfg.row_count / 2,
            0,
            self.grid.direction(),
        );
        self.grid.backend_mut().center_on(center, viewport);
        self.grid.backend().compose(viewport, fb);

        let tactical = self.grid.tactical();
        let status = format!(
            " view {:<5} cursor {},{} height {} | ztint {} xray {} ghosts {} | arrows/hjkl move  +/- stack  e/r rotate  1/2 overlays  0 reload  q quit",
            self.grid.direction().as_str(),
            self.cursor.0,
            self.cursor.1,
            self.top_level().map_or(0, |z| z + 1),
            on_off(tactical.z_tint_active()),
            on_off(tactical.xray_active()),
            tactical.ghosts().len(),
        );
        let style = CellStyle {
            fg: Rgb::new(230, 230, 230),
            bg: Rgb::new(40, 40, 60),
            bold: false,
            dim: false,
        };
        let last = i32::from(viewport.height) - 1;
        fb.put_str(0, last, &format!("{status:<w$}", w = viewport.width as usize), style, f64::INFINITY);
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

fn run(
    term: &mut TerminalRenderer,
    config: GridConfig,
    layout: &Layout,
    layout_path: Option<&Path>,
) -> Result<()> {
    let mut grid = StackedGrid::new(config, TermBackend::new(&config));
    grid.bulk_load(layout);

    let mut viewer = Viewer {
        grid,
        cursor: ((config.column_count / 2) as i32, (config.row_count / 2) as i32),
        layout: layout.clone(),
        layout_path,
    };
    viewer.sync_highlight();

    let mut fb = FrameBuffer::new(0, 0);
    loop {
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        viewer.compose(Viewport::new(w, h), &mut fb);
        term.present(&fb)?;

        if !event::poll(POLL)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if should_quit(key) {
                    return Ok(());
                }
                if let Some(action) = handle_key_event(key) {
                    viewer.apply(action)?;
                }
            }
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                viewer.click(mouse.column, mouse.row);
            }
            Event::Resize(..) => term.invalidate(),
            _ => {}
        }
    }
}
