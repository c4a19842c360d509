//! Render collaborator seam.
//!
//! The core never draws. After a tick has finished mutating state it hands
//! a [`Frame`] to whatever [`Renderer`] the driver supplied.

use serde::Serialize;

use crate::grid::{GridCoord, PixelPos, TileMetrics};
use crate::phase::GamePhase;
use crate::terrain::TerrainGrid;
use crate::units::{Faction, Unit, UnitId};

/// What a renderer needs to know about one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitView {
    /// Identifier.
    pub id: UnitId,
    /// Side, used for colouring.
    pub faction: Faction,
    /// Cell the unit occupies.
    pub grid: GridCoord,
    /// Top-left pixel of the sprite.
    pub pixel: PixelPos,
    /// True while the unit holds an attack order.
    pub attacking: bool,
    /// True if the unit is the current selection.
    pub selected: bool,
}

impl UnitView {
    /// Snapshot of `unit`.
    #[must_use]
    pub fn of(unit: &Unit, selected: Option<UnitId>) -> Self {
        Self {
            id: unit.id,
            faction: unit.faction,
            grid: unit.grid,
            pixel: unit.pixel,
            attacking: unit.is_attacking(),
            selected: selected == Some(unit.id),
        }
    }
}

/// Read-only snapshot of one tick.
#[derive(Debug, Clone, Serialize)]
pub struct Frame<'a> {
    /// Ticks completed so far.
    pub tick: u64,
    /// Phase after the tick.
    pub phase: GamePhase,
    /// Static terrain.
    pub terrain: &'a TerrainGrid,
    /// Units in ascending id order.
    pub units: Vec<UnitView>,
    /// Tile geometry for pixel-space drawing.
    pub metrics: TileMetrics,
    /// Current selection.
    pub selected: Option<UnitId>,
}

/// Draws frames. Implemented by drivers, never by the core.
pub trait Renderer {
    /// Draw one frame.
    fn render(&mut self, frame: &Frame<'_>);
}

/// Discards every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _frame: &Frame<'_>) {}
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render(&mut self, frame: &Frame<'_>) {
        (**self).render(frame);
    }
}
