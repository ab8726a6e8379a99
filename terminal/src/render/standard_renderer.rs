use super::traits::GlyphRenderer;
use super::types::{CharDimensions, CharPattern};
use common::{GrenadeKind, PlayerState, ReplayEvent, Team};
use ratatui::style::{Color, Modifier, Style};

const ARROWS: [char; 8] = ['→', '↗', '↑', '↖', '←', '↙', '↓', '↘'];

/// Arrow for a view direction. Yaw 0 looks along +x and 90 along +y, which is
/// up on the radar.
pub fn yaw_arrow(yaw: f32) -> char {
    let sector = ((yaw.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    ARROWS[sector]
}

pub fn team_color(team: Team) -> Color {
    match team {
        Team::Terrorist => Color::Yellow,
        Team::CounterTerrorist => Color::Cyan,
        Team::Spectator | Team::Unassigned => Color::Gray,
    }
}

pub struct StandardRenderer {
    char_dims: CharDimensions,
}

impl StandardRenderer {
    pub fn new(char_dims: CharDimensions) -> Self {
        Self { char_dims }
    }

    fn fill(&self, first: char, rest: char, style: Style) -> CharPattern {
        let mut chars = vec![vec![rest; self.char_dims.horizontal]; self.char_dims.vertical];
        if let Some(cell) = chars.first_mut().and_then(|row| row.first_mut()) {
            *cell = first;
        }
        CharPattern::new(chars, style)
    }
}

impl GlyphRenderer for StandardRenderer {
    fn char_dimensions(&self) -> CharDimensions {
        self.char_dims
    }

    fn render_player(&self, player: &PlayerState) -> CharPattern {
        if !player.is_alive {
            let style = Style::default().fg(Color::DarkGray);
            return self.fill('✕', ' ', style);
        }

        let mut style = Style::default().fg(team_color(player.team));
        if player.is_flashed() {
            style = style.bg(Color::White);
        }
        if player.has_bomb {
            style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        }

        let arrow = yaw_arrow(player.yaw);
        if self.char_dims.horizontal >= 2 {
            // Body then facing
            self.fill('●', arrow, style)
        } else {
            self.fill(arrow, arrow, style)
        }
    }

    fn render_event(&self, event: &ReplayEvent) -> CharPattern {
        let (ch, color) = match event {
            ReplayEvent::Kill(_) => ('✝', Color::Red),
            ReplayEvent::BombPlant(_) | ReplayEvent::BombBeginPlant(_) => ('B', Color::LightRed),
            ReplayEvent::BombExplode(_) => ('✸', Color::LightRed),
            ReplayEvent::BombDefuse(_) | ReplayEvent::BombBeginDefuse(_) => ('D', Color::LightBlue),
            ReplayEvent::Grenade(g) => match g.grenade {
                GrenadeKind::Smoke => ('░', Color::Gray),
                GrenadeKind::Flashbang => ('*', Color::White),
                GrenadeKind::HeGrenade => ('o', Color::LightRed),
                GrenadeKind::Molotov => ('^', Color::LightYellow),
                GrenadeKind::Decoy => ('?', Color::DarkGray),
            },
        };
        CharPattern::single(ch, self.char_dims, Style::default().fg(color))
    }

    fn render_empty(&self) -> CharPattern {
        CharPattern::empty(self.char_dims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_follow_yaw() {
        assert_eq!(yaw_arrow(0.0), '→');
        assert_eq!(yaw_arrow(90.0), '↑');
        assert_eq!(yaw_arrow(180.0), '←');
        assert_eq!(yaw_arrow(-90.0), '↓');
        assert_eq!(yaw_arrow(350.0), '→');
        assert_eq!(yaw_arrow(44.0), '↗');
    }
}
