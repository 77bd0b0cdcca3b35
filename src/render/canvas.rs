//! Page display lists and text flow.
//!
//! Layout code draws into a [`Canvas`] using top-left coordinates, the way a
//! reader thinks about a page. Each page keeps an ordered list of [`DrawOp`]s
//! that the encoder later turns into PDF content streams.

use super::color::Rgb;
use super::metrics::{line_height, width_of};

pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Justify,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    StrokeRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    /// One line of text; `y` is the top of the line box.
    Text {
        x: f32,
        y: f32,
        text: String,
        size: f32,
        color: Rgb,
        word_spacing: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
    },
    Link {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        uri: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Styling for a run of text.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub size: f32,
    pub color: Rgb,
    pub align: Align,
    pub underline: bool,
}

impl TextStyle {
    pub fn new(size: f32, color: Rgb) -> Self {
        Self {
            size,
            color,
            align: Align::Left,
            underline: false,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct WrappedLine {
    text: String,
    width: f32,
    gaps: usize,
    /// Last line of its paragraph; never stretched when justifying.
    last: bool,
}

fn finish_line(lines: &mut Vec<WrappedLine>, words: &mut Vec<String>, width: &mut f32) {
    lines.push(WrappedLine {
        text: words.join(" "),
        width: *width,
        gaps: words.len().saturating_sub(1),
        last: false,
    });
    words.clear();
    *width = 0.0;
}

/// Greedy word wrap. Explicit newlines start new paragraphs; words wider
/// than the column are split by character.
fn wrap(text: &str, size: f32, max_width: f32) -> Vec<WrappedLine> {
    let space = width_of(" ", size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current: Vec<String> = Vec::new();
        let mut current_width = 0.0f32;
        let start = lines.len();

        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            loop {
                let word_width = width_of(&word, size);
                let needed = if current.is_empty() {
                    word_width
                } else {
                    current_width + space + word_width
                };

                if needed <= max_width {
                    current_width = needed;
                    current.push(word);
                    break;
                }

                if !current.is_empty() {
                    finish_line(&mut lines, &mut current, &mut current_width);
                    continue;
                }

                // Word alone overflows the column: hard-split it.
                let mut head = String::new();
                let mut rest = word.chars().peekable();
                while let Some(&c) = rest.peek() {
                    let mut candidate = head.clone();
                    candidate.push(c);
                    if !head.is_empty() && width_of(&candidate, size) > max_width {
                        break;
                    }
                    head = candidate;
                    rest.next();
                }
                let tail: String = rest.collect();
                current_width = width_of(&head, size);
                current.push(head);
                if tail.is_empty() {
                    break;
                }
                finish_line(&mut lines, &mut current, &mut current_width);
                word = tail;
            }
        }

        if !current.is_empty() || lines.len() == start {
            finish_line(&mut lines, &mut current, &mut current_width);
        }
        if let Some(last) = lines.last_mut() {
            last.last = true;
        }
    }

    lines
}

#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// Cursor: top of the next line of flowing text.
    pub y: f32,
    pages: Vec<Page>,
}

impl Canvas {
    pub fn a4() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin: MARGIN,
            y: MARGIN,
            pages: vec![Page::default()],
        }
    }

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest y a line or box may reach before it must move to a new page.
    pub fn bottom(&self) -> f32 {
        self.height - self.margin
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn add_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.margin;
    }

    pub fn move_down(&mut self, lines: f32, size: f32) {
        self.y += lines * line_height(size);
    }

    fn push(&mut self, op: DrawOp) {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        self.pages[last].ops.push(op);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.push(DrawOp::StrokeRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn emit_line(&mut self, line: &WrappedLine, x: f32, y: f32, width: f32, style: TextStyle) {
        let offset = match style.align {
            Align::Center => ((width - line.width) / 2.0).max(0.0),
            _ => 0.0,
        };
        let word_spacing = if style.align == Align::Justify && !line.last && line.gaps > 0 {
            ((width - line.width) / line.gaps as f32).max(0.0)
        } else {
            0.0
        };
        let x = x + offset;

        self.push(DrawOp::Text {
            x,
            y,
            text: line.text.clone(),
            size: style.size,
            color: style.color,
            word_spacing,
        });

        if style.underline && !line.text.is_empty() {
            let drawn = line.width + word_spacing * line.gaps as f32;
            let underline_y = y + style.size * 0.85;
            self.push(DrawOp::Line {
                x1: x,
                y1: underline_y,
                x2: x + drawn,
                y2: underline_y,
                color: style.color,
            });
        }
    }

    /// Flow wrapped text from (x, y) within `width`, breaking onto new pages
    /// at the bottom margin. Leaves the cursor below the last line.
    pub fn text(&mut self, text: &str, x: f32, y: f32, width: f32, style: TextStyle) {
        let advance = line_height(style.size);
        self.y = y;
        for line in wrap(text, style.size, width) {
            if self.y + advance > self.bottom() {
                self.add_page();
            }
            let top = self.y;
            self.emit_line(&line, x, top, width, style);
            self.y += advance;
        }
    }

    /// Draw text at a fixed position without page breaks or cursor movement.
    pub fn stamp(&mut self, text: &str, x: f32, y: f32, width: f32, style: TextStyle) {
        let advance = line_height(style.size);
        for (i, line) in wrap(text, style.size, width).iter().enumerate() {
            self.emit_line(line, x, y + i as f32 * advance, width, style);
        }
    }

    /// Text with a clickable area over it. Returns how many lines it wrapped to.
    pub fn link(
        &mut self,
        text: &str,
        uri: &str,
        x: f32,
        y: f32,
        width: f32,
        style: TextStyle,
    ) -> usize {
        self.stamp(text, x, y, width, style);
        let lines = wrap(text, style.size, width);
        let drawn = lines.iter().map(|l| l.width).fold(0.0f32, f32::max);
        self.push(DrawOp::Link {
            x,
            y,
            width: drawn,
            height: line_height(style.size) * lines.len() as f32,
            uri: uri.to_string(),
        });
        lines.len()
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgb = Rgb(0, 0, 0);

    #[test]
    fn test_wrap_respects_width_and_paragraphs() {
        let lines = wrap("one two three four five six seven eight nine ten", 12.0, 80.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 80.0));
        assert!(lines.last().unwrap().last);
        assert!(!lines[0].last);

        let paragraphs = wrap("first\nsecond", 12.0, 500.0);
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs.iter().all(|l| l.last));
    }

    #[test]
    fn test_wrap_splits_overlong_word() {
        let lines = wrap(&"W".repeat(40), 12.0, 100.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 100.0));
        let rejoined: String = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(rejoined, "W".repeat(40));
    }

    #[test]
    fn test_blank_paragraph_keeps_a_line() {
        let lines = wrap("a\n\nb", 12.0, 500.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].text, "");
    }

    #[test]
    fn test_flowing_text_breaks_pages_at_bottom_margin() {
        let mut canvas = Canvas::a4();
        let text = vec!["line"; 120].join("\n");
        canvas.text(&text, 50.0, 110.0, 495.28, TextStyle::new(12.0, INK));
        assert!(canvas.page_count() >= 2);

        let bottom = canvas.bottom();
        for page in canvas.pages() {
            for op in &page.ops {
                if let DrawOp::Text { y, size, .. } = op {
                    assert!(y + line_height(*size) <= bottom + 1e-3);
                }
            }
        }
    }

    #[test]
    fn test_justified_lines_stretch_except_last() {
        let mut canvas = Canvas::a4();
        let text = "lorem ipsum dolor sit amet ".repeat(20);
        canvas.text(&text, 50.0, 50.0, 300.0, TextStyle::new(12.0, INK).align(Align::Justify));
        let spacings: Vec<f32> = canvas.pages()[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { word_spacing, .. } => Some(*word_spacing),
                _ => None,
            })
            .collect();
        assert!(spacings.len() > 2);
        assert_eq!(*spacings.last().unwrap(), 0.0);
        assert!(spacings[..spacings.len() - 1].iter().any(|s| *s > 0.0));
    }

    #[test]
    fn test_stamp_never_adds_pages() {
        let mut canvas = Canvas::a4();
        canvas.stamp("footer", 50.0, A4_HEIGHT - 30.0, 495.28, TextStyle::new(8.0, INK));
        assert_eq!(canvas.page_count(), 1);
        assert_eq!(canvas.y, MARGIN);
    }

    #[test]
    fn test_centered_text_is_offset() {
        let mut canvas = Canvas::a4();
        canvas.stamp("Hi", 50.0, 80.0, 400.0, TextStyle::new(32.0, INK).align(Align::Center));
        match &canvas.pages()[0].ops[0] {
            DrawOp::Text { x, .. } => {
                let expected = 50.0 + (400.0 - width_of("Hi", 32.0)) / 2.0;
                assert!((x - expected).abs() < 1e-3);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_link_adds_underline_and_annotation() {
        let mut canvas = Canvas::a4();
        let style = TextStyle::new(12.0, INK).underline();
        let lines =
            canvas.link("Twitter: https://x.com/a", "https://x.com/a", 50.0, 200.0, 495.28, style);
        assert_eq!(lines, 1);
        let ops = &canvas.pages()[0].ops;
        assert!(ops.iter().any(|op| matches!(op, DrawOp::Line { .. })));
        assert!(ops
            .iter()
            .any(|op| matches!(op, DrawOp::Link { uri, .. } if uri == "https://x.com/a")));
    }
}
