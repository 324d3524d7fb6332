//! Best-fit label layout: finds the largest font size and line breaking of a
//! label that fits inside a square budget.

use std::collections::HashMap;

use tracing::warn;

use crate::config::{self, FontRange};

/// Measures text for a rendering surface.
pub trait TextMetrics {
    /// Width of a single line of text at `size` points.
    fn line_width(&self, size: f32, line: &str) -> f32;

    /// Height of a block of `lines` lines at `size` points.
    fn block_height(&self, size: f32, lines: usize) -> f32 {
        size * lines as f32
    }
}

/// One way of breaking a label's words into lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arrangement {
    lines: Vec<String>,
}

impl Arrangement {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Every arrangement of `words`, each gap being either a space or a line
/// break. The result is sorted by its joined text and free of duplicates, so
/// the order is the same on every call.
pub fn arrangements(words: &[&str]) -> Vec<Arrangement> {
    let Some((first, rest)) = words.split_first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(1 << rest.len().min(16));
    let mut lines = vec![(*first).to_string()];
    branch(rest, &mut lines, &mut out);
    out.sort_by_cached_key(Arrangement::text);
    out.dedup();
    out
}

fn branch(rest: &[&str], lines: &mut Vec<String>, out: &mut Vec<Arrangement>) {
    let Some((word, tail)) = rest.split_first() else {
        out.push(Arrangement {
            lines: lines.clone(),
        });
        return;
    };

    if let Some(last) = lines.last_mut() {
        let len = last.len();
        last.push(' ');
        last.push_str(word);
        branch(tail, lines, out);
        if let Some(last) = lines.last_mut() {
            last.truncate(len);
        }
    }

    lines.push((*word).to_string());
    branch(tail, lines, out);
    lines.pop();
}

/// Splits `text` at the space closest to its middle character. Text without
/// an inner space is returned unchanged.
pub fn cleave(text: &str) -> String {
    let center = text.chars().count() as f32 / 2.0;
    let mut chop = None;
    let mut closest = f32::MAX;

    for (pos, (byte, ch)) in text.char_indices().enumerate() {
        if ch == ' ' && pos > 0 {
            let close = (center - pos as f32).abs();
            if close < closest {
                closest = close;
                chop = Some(byte);
            }
        }
    }

    match chop {
        Some(byte) => format!("{}\n{}", &text[..byte], &text[byte + 1..]),
        None => text.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct MetricsKey {
    size: u32,
    arrangement: usize,
}

/// Measured size of an arrangement at one font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fit {
    pub font_size: u32,
    /// Label text with `\n` at the chosen line breaks.
    pub text: String,
    /// True when nothing fitted and the label was split at its middle.
    pub fallback: bool,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    arrangement: usize,
    size: u32,
    lines: usize,
}

/// Fits one label. Measurements are cached per font size and arrangement for
/// the lifetime of the fitter.
#[derive(Debug)]
pub struct TextFitter {
    label: String,
    arrangements: Vec<Arrangement>,
    extents: HashMap<MetricsKey, Extent>,
}

impl TextFitter {
    pub fn new(label: &str) -> Self {
        let words: Vec<&str> = label.split_whitespace().collect();
        if words.len() > config::visual::LABEL_WORDS_WARN {
            warn!(
                words = words.len(),
                label, "long label, arrangement enumeration may stall"
            );
        }
        Self {
            label: label.to_string(),
            arrangements: arrangements(&words),
            extents: HashMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn arrangements(&self) -> &[Arrangement] {
        &self.arrangements
    }

    pub fn cached_extents(&self) -> usize {
        self.extents.len()
    }

    /// Largest font size, then fewest lines, whose widest line and total
    /// height both fit within `budget`. Equal candidates resolve to the
    /// earliest arrangement. Returns `None` for a label with no words.
    pub fn fit(&mut self, budget: f32, fonts: FontRange, metrics: &impl TextMetrics) -> Option<Fit> {
        if self.arrangements.is_empty() {
            return None;
        }

        let mut best: Option<Candidate> = None;
        for idx in 0..self.arrangements.len() {
            let lines = self.arrangements[idx].line_count();
            for size in fonts.sizes() {
                if let Some(current) = best {
                    if size < current.size || (size == current.size && lines >= current.lines) {
                        break;
                    }
                }
                let extent = self.extent(idx, size, metrics);
                if extent.width <= budget && extent.height <= budget {
                    best = Some(Candidate {
                        arrangement: idx,
                        size,
                        lines,
                    });
                    break;
                }
            }
        }

        Some(match best {
            Some(found) => Fit {
                font_size: found.size,
                text: self.arrangements[found.arrangement].text(),
                fallback: false,
            },
            None => Fit {
                font_size: fonts.min,
                text: cleave(&self.label),
                fallback: true,
            },
        })
    }

    fn extent(&mut self, arrangement: usize, size: u32, metrics: &impl TextMetrics) -> Extent {
        let lines = &self.arrangements[arrangement].lines;
        *self
            .extents
            .entry(MetricsKey { size, arrangement })
            .or_insert_with(|| {
                let points = size as f32;
                let width = lines
                    .iter()
                    .map(|line| metrics.line_width(points, line))
                    .fold(0.0, f32::max);
                Extent {
                    width,
                    height: metrics.block_height(points, lines.len()),
                }
            })
    }
}
