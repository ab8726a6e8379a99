use super::types::{CharDimensions, CharPattern};
use common::{PlayerState, ReplayEvent};

pub trait GlyphRenderer {
    fn char_dimensions(&self) -> CharDimensions;

    fn render_player(&self, player: &PlayerState) -> CharPattern;

    fn render_event(&self, event: &ReplayEvent) -> CharPattern;

    fn render_empty(&self) -> CharPattern;
}
