//! ASCII renderer for terminal viewing.
//!
//! Draws one character per cell: terrain glyphs underneath, units on top at
//! the cell under their sprite centre.

use std::io::Write;

use skirmish_core::prelude::*;

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show the legend and unit counts.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: true,
        }
    }
}

impl AsciiConfig {
    /// Plain text with a legend, for logs and protocol frames.
    #[must_use]
    pub fn plain() -> Self {
        Self {
            show_legend: true,
            use_color: false,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GREEN: &str = "\x1b[32m";
    pub const GRAY: &str = "\x1b[90m";

    pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
}

/// Glyph used for a terrain kind, both when drawing and in scenario files.
#[must_use]
pub const fn terrain_glyph(kind: TerrainKind) -> char {
    match kind {
        TerrainKind::Ground => '.',
        TerrainKind::Bridge => '=',
        TerrainKind::Stone => '#',
        TerrainKind::Water => '~',
    }
}

/// Inverse of [`terrain_glyph`].
#[must_use]
pub const fn terrain_from_glyph(glyph: char) -> Option<TerrainKind> {
    match glyph {
        '.' => Some(TerrainKind::Ground),
        '=' => Some(TerrainKind::Bridge),
        '#' => Some(TerrainKind::Stone),
        '~' => Some(TerrainKind::Water),
        _ => None,
    }
}

fn terrain_color(kind: TerrainKind) -> &'static str {
    match kind {
        TerrainKind::Ground => colors::DIM,
        TerrainKind::Bridge => colors::YELLOW,
        TerrainKind::Stone => colors::GRAY,
        TerrainKind::Water => colors::BLUE,
    }
}

fn unit_glyph(unit: &UnitView) -> char {
    match (unit.faction, unit.selected) {
        (Faction::Player, true) => 'P',
        (Faction::Player, false) => 'p',
        (Faction::Hostile, _) => 'h',
    }
}

fn unit_color(unit: &UnitView) -> &'static str {
    match unit.faction {
        Faction::Player => colors::GREEN,
        Faction::Hostile => colors::RED,
    }
}

/// Render a frame as ASCII art.
pub fn render_ascii(frame: &Frame<'_>, config: &AsciiConfig) -> String {
    let width = frame.terrain.width() as usize;
    let height = frame.terrain.height() as usize;
    let paint = |color: &str| {
        if config.use_color {
            color.to_string()
        } else {
            String::new()
        }
    };

    // Terrain layer
    let mut grid: Vec<Vec<(char, String)>> = vec![vec![(' ', String::new()); width]; height];
    for (coord, kind) in frame.terrain.iter() {
        grid[coord.y as usize][coord.x as usize] =
            (terrain_glyph(kind), paint(terrain_color(kind)));
    }

    // Units, drawn where their sprite centre is
    let mut players = 0;
    let mut hostiles = 0;
    for unit in &frame.units {
        match unit.faction {
            Faction::Player => players += 1,
            Faction::Hostile => hostiles += 1,
        }
        let Some(cell) = frame.metrics.cell_under(unit.pixel) else {
            continue;
        };
        let (x, y) = (cell.x as usize, cell.y as usize);
        if x < width && y < height {
            let color = if unit.selected {
                format!("{}{}", paint(colors::BOLD), paint(unit_color(unit)))
            } else {
                paint(unit_color(unit))
            };
            grid[y][x] = (unit_glyph(unit), color);
        }
    }

    let mut output = String::new();

    // Header
    output.push_str(&format!(
        "{}╔══ Tick: {} │ Phase: {} ══╗{}\n",
        paint(colors::BOLD),
        frame.tick,
        frame.phase,
        paint(colors::RESET)
    ));

    output.push('║');
    output.push_str(&"═".repeat(width));
    output.push_str("║\n");

    for row in &grid {
        output.push('║');
        for (ch, color) in row {
            if color.is_empty() {
                output.push(*ch);
            } else {
                output.push_str(color);
                output.push(*ch);
                output.push_str(colors::RESET);
            }
        }
        output.push_str("║\n");
    }

    output.push('║');
    output.push_str(&"═".repeat(width));
    output.push_str("║\n");

    if config.show_legend {
        output.push_str("p=Player P=Selected h=Hostile .=Ground ==Bridge #=Stone ~=Water\n");
        let selected = frame
            .selected
            .map_or_else(|| "none".to_string(), |id| id.to_string());
        output.push_str(&format!(
            "Player: {players}  Hostile: {hostiles}  Selected: {selected}\n"
        ));
    }

    output
}

/// Renderer that writes each frame as ASCII to a writer.
#[derive(Debug)]
pub struct AsciiRenderer<W: Write> {
    writer: W,
    config: AsciiConfig,
    clear_screen: bool,
}

impl<W: Write> AsciiRenderer<W> {
    /// Create a renderer. With `clear_screen` each frame replaces the last
    /// one on an ANSI terminal.
    pub fn new(writer: W, config: AsciiConfig, clear_screen: bool) -> Self {
        Self {
            writer,
            config,
            clear_screen,
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for AsciiRenderer<W> {
    fn render(&mut self, frame: &Frame<'_>) {
        let text = render_ascii(frame, &self.config);
        let prefix = if self.clear_screen {
            colors::CLEAR_SCREEN
        } else {
            ""
        };
        let written = write!(self.writer, "{prefix}{text}").and_then(|()| self.writer.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, tick = frame.tick, "Failed to write frame");
        }
    }
}
