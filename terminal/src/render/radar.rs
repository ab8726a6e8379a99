use super::traits::GlyphRenderer;
use super::types::{CharGrid, RenderConfig};
use common::{PlayerState, ReplayEvent, TickFrame, Vec3};

/// World-space rectangle mapped onto the radar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadarBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl RadarBounds {
    const PADDING: f32 = 64.0;

    /// Smallest rectangle around every player position in the round, padded.
    pub fn from_frames(frames: &[TickFrame]) -> Option<Self> {
        let mut points = frames
            .iter()
            .flat_map(|f| f.players.iter())
            .map(|p| (p.x, p.y))
            .filter(|(x, y)| x.is_finite() && y.is_finite());

        let (x0, y0) = points.next()?;
        let mut bounds = Self {
            min_x: x0,
            max_x: x0,
            min_y: y0,
            max_y: y0,
        };
        for (x, y) in points {
            bounds.min_x = bounds.min_x.min(x);
            bounds.max_x = bounds.max_x.max(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_y = bounds.max_y.max(y);
        }
        bounds.min_x -= Self::PADDING;
        bounds.max_x += Self::PADDING;
        bounds.min_y -= Self::PADDING;
        bounds.max_y += Self::PADDING;
        Some(bounds)
    }

    /// Logical cell for a world position; +y is drawn upwards.
    pub fn project(&self, x: f32, y: f32, width: usize, height: usize) -> Option<(usize, usize)> {
        if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
            return None;
        }
        let span_x = (self.max_x - self.min_x).max(1.0);
        let span_y = (self.max_y - self.min_y).max(1.0);
        let fx = (x - self.min_x) / span_x;
        let fy = (self.max_y - y) / span_y;
        if !(0.0..=1.0).contains(&fx) || !(0.0..=1.0).contains(&fy) {
            return None;
        }
        let col = (fx * (width - 1) as f32).round() as usize;
        let row = (fy * (height - 1) as f32).round() as usize;
        Some((col, row))
    }
}

pub struct RadarRenderer<R: GlyphRenderer> {
    renderer: R,
}

impl<R: GlyphRenderer> RadarRenderer<R> {
    pub fn new(renderer: R) -> Self {
        Self { renderer }
    }

    /// Draw events first and players on top, dead players before living ones.
    pub fn render(
        &self,
        players: &[PlayerState],
        events: &[&ReplayEvent],
        bounds: &RadarBounds,
        width: usize,
        height: usize,
        config: &RenderConfig,
    ) -> CharGrid {
        let mut grid = CharGrid::new(width, height, config.chars_per_point);

        for event in events {
            let Vec3 { x, y, .. } = event.position();
            if let Some((col, row)) = bounds.project(x, y, width, height) {
                grid.set_logical_point(col, row, &self.renderer.render_event(event));
            }
        }

        let (alive, dead): (Vec<&PlayerState>, Vec<&PlayerState>) =
            players.iter().partition(|p| p.is_alive);
        for player in dead.into_iter().chain(alive) {
            if let Some((col, row)) = bounds.project(player.x, player.y, width, height) {
                grid.set_logical_point(col, row, &self.renderer.render_player(player));
            }
        }

        grid
    }
}
