//! Render collaborators.
//!
//! The engine never owns a display. A `Renderer` is injected explicitly and is
//! only handed the current grid and agent position when a caller asks for a
//! `RenderMode::Human` frame.

use serde::Serialize;
use std::io::Write;

use crate::engine::Phase;
use crate::error::Result;
use crate::grid::{Cell, GridModel, Position};

pub trait Renderer: Send {
    fn update_agent(&mut self, position: Position);
    fn redraw(&mut self, grid: &GridModel) -> Result<()>;
}

pub enum RenderMode<'a> {
    /// Draw through the injected `Renderer`.
    Human,
    /// ASCII frame returned to the caller.
    Text,
    /// Agent position only.
    Position,
    /// Hand the agent position to a caller-supplied callback.
    Callback(&'a mut dyn FnMut(Position)),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Drawn,
    Text(String),
    Position(Position),
    Delivered,
}

/// Serializable view of the grid and the agent, for UIs and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvSnapshot {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Vec<Cell>>,
    pub agent: Position,
    pub phase: Phase,
    pub step_count: u64,
}

/// One line per row: `#` wall, `.` empty, `S` start, `G` goal, `A` agent.
pub fn render_ascii(grid: &GridModel, agent: Position) -> String {
    let mut out = String::with_capacity(grid.rows() * (grid.cols() + 1));
    for (r, row) in grid.cell_rows().iter().enumerate() {
        if r > 0 {
            out.push('\n');
        }
        for (c, cell) in row.iter().enumerate() {
            if agent == Position::new(r, c) {
                out.push('A');
            } else {
                out.push(cell.glyph());
            }
        }
    }
    out
}

/// Writes ASCII frames to any sink. With `clear_between_frames` it redraws in
/// place on an ANSI terminal.
pub struct TextRenderer<W: Write + Send> {
    out: W,
    agent: Option<Position>,
    clear_between_frames: bool,
    frames: u64,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            agent: None,
            clear_between_frames: false,
            frames: 0,
        }
    }

    pub fn clear_between_frames(mut self, clear: bool) -> Self {
        self.clear_between_frames = clear;
        self
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn update_agent(&mut self, position: Position) {
        self.agent = Some(position);
    }

    fn redraw(&mut self, grid: &GridModel) -> Result<()> {
        if self.clear_between_frames {
            // Clear screen, cursor home.
            self.out.write_all(b"\x1b[2J\x1b[H")?;
        }
        let frame = match self.agent {
            Some(agent) => render_ascii(grid, agent),
            None => grid
                .cell_rows()
                .iter()
                .map(|r| r.iter().map(|c| c.glyph()).collect::<String>())
                .collect::<Vec<_>>()
                .join("\n"),
        };
        writeln!(self.out, "{frame}")?;
        writeln!(self.out)?;
        self.out.flush()?;
        self.frames += 1;
        Ok(())
    }
}
