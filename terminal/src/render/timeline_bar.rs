use super::types::{CharDimensions, CharGrid};
use common::EventCategory;
use ratatui::style::{Color, Modifier, Style};
use replay::TimelineMarker;

pub fn marker_color(category: EventCategory) -> Color {
    match category {
        EventCategory::Kill => Color::Red,
        EventCategory::Bomb => Color::LightRed,
        EventCategory::Grenade => Color::Gray,
    }
}

/// Column of a normalized position on a bar `width` characters wide.
pub fn column_for(position: f64, width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    (position.clamp(0.0, 1.0) * (width - 1) as f64).round() as usize
}

/// One-row bar: the played part, the event markers and the play head.
/// Bomb markers win over grenade and kill markers sharing a column.
pub fn render_timeline_bar(markers: &[TimelineMarker], head: f64, width: usize) -> CharGrid {
    let mut grid = CharGrid::new(width, 1, CharDimensions::new(1, 1));
    let head_col = column_for(head, width);

    for col in 0..width {
        let (ch, color) = if col <= head_col {
            ('━', Color::Green)
        } else {
            ('─', Color::DarkGray)
        };
        grid.set_char(col, 0, ch, Style::default().fg(color));
    }

    let mut order: Vec<&TimelineMarker> = markers.iter().collect();
    order.sort_by_key(|m| match m.category {
        EventCategory::Grenade => 0,
        EventCategory::Kill => 1,
        EventCategory::Bomb => 2,
    });
    for marker in order {
        let ch = match marker.category {
            EventCategory::Kill => '✝',
            EventCategory::Bomb => 'B',
            EventCategory::Grenade => '·',
        };
        let col = column_for(marker.position, width);
        grid.set_char(col, 0, ch, Style::default().fg(marker_color(marker.category)));
    }

    if width > 0 {
        grid.set_char(
            head_col,
            0,
            '┃',
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        );
    }
    grid
}
