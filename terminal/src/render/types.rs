use ratatui::style::Style;
use ratatui::text::{Line, Span};

#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub chars_per_point: CharDimensions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharDimensions {
    pub horizontal: usize,
    pub vertical: usize,
}

impl CharDimensions {
    pub fn new(horizontal: usize, vertical: usize) -> Self {
        Self { horizontal, vertical }
    }
}

/// Fixed-size character canvas addressed in logical cells, each of which
/// covers `char_dims` terminal characters.
pub struct CharGrid {
    grid: Vec<Vec<char>>,
    styles: Vec<Vec<Style>>,
    logical_width: usize,
    logical_height: usize,
    char_dims: CharDimensions,
}

impl CharGrid {
    pub fn new(logical_width: usize, logical_height: usize, char_dims: CharDimensions) -> Self {
        let physical_width = logical_width * char_dims.horizontal;
        let physical_height = logical_height * char_dims.vertical;
        Self {
            grid: vec![vec![' '; physical_width]; physical_height],
            styles: vec![vec![Style::default(); physical_width]; physical_height],
            logical_width,
            logical_height,
            char_dims,
        }
    }

    /// Draw a pattern at a logical cell. Out-of-range parts are clipped.
    pub fn set_logical_point(&mut self, x: usize, y: usize, pattern: &CharPattern) {
        let start_x = x * self.char_dims.horizontal;
        let start_y = y * self.char_dims.vertical;

        for (dy, row) in pattern.chars.iter().enumerate() {
            for (dx, &ch) in row.iter().enumerate() {
                let (px, py) = (start_x + dx, start_y + dy);
                if let Some(cell) = self.grid.get_mut(py).and_then(|r| r.get_mut(px)) {
                    *cell = ch;
                    self.styles[py][px] = pattern.style;
                }
            }
        }
    }

    /// Write a single physical character, ignoring the logical cell size.
    pub fn set_char(&mut self, x: usize, y: usize, ch: char, style: Style) {
        if let Some(cell) = self.grid.get_mut(y).and_then(|r| r.get_mut(x)) {
            *cell = ch;
            self.styles[y][x] = style;
        }
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        self.grid.get(y).and_then(|r| r.get(x)).copied()
    }

    pub fn style_at(&self, x: usize, y: usize) -> Option<Style> {
        self.styles.get(y).and_then(|r| r.get(x)).copied()
    }

    pub fn into_lines(self) -> Vec<Vec<char>> {
        self.grid
    }

    pub fn into_styled_lines(self) -> Vec<(Vec<char>, Vec<Style>)> {
        self.grid.into_iter().zip(self.styles).collect()
    }

    /// Styled ratatui lines, one span per run of equally styled characters.
    pub fn into_text_lines(self) -> Vec<Line<'static>> {
        self.into_styled_lines()
            .into_iter()
            .map(|(chars, styles)| {
                let mut spans = Vec::new();
                let mut run = String::new();
                let mut run_style = Style::default();
                for (ch, style) in chars.into_iter().zip(styles) {
                    if style != run_style && !run.is_empty() {
                        spans.push(Span::styled(std::mem::take(&mut run), run_style));
                    }
                    run_style = style;
                    run.push(ch);
                }
                if !run.is_empty() {
                    spans.push(Span::styled(run, run_style));
                }
                Line::from(spans)
            })
            .collect()
    }

    pub fn logical_width(&self) -> usize {
        self.logical_width
    }

    pub fn logical_height(&self) -> usize {
        self.logical_height
    }

    pub fn physical_width(&self) -> usize {
        self.logical_width * self.char_dims.horizontal
    }

    pub fn physical_height(&self) -> usize {
        self.logical_height * self.char_dims.vertical
    }
}

#[derive(Clone, Debug)]
pub struct CharPattern {
    pub chars: Vec<Vec<char>>,
    pub style: Style,
}

impl CharPattern {
    pub fn new(chars: Vec<Vec<char>>, style: Style) -> Self {
        Self { chars, style }
    }

    pub fn single(ch: char, dims: CharDimensions, style: Style) -> Self {
        Self {
            chars: vec![vec![ch; dims.horizontal]; dims.vertical],
            style,
        }
    }

    pub fn empty(dims: CharDimensions) -> Self {
        Self::single(' ', dims, Style::default())
    }
}
