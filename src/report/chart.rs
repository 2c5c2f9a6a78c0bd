//! Minimal raster charts: titles, axes, bars, line series and legends on a
//! white canvas.

use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};
use std::path::Path;

use crate::error::{EtlError, Result};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const INK: Rgb<u8> = Rgb([30, 30, 30]);
pub const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
pub const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const GOLD: Rgb<u8> = Rgb([255, 215, 0]);
pub const SILVER: Rgb<u8> = Rgb([192, 192, 192]);
pub const BRONZE: Rgb<u8> = Rgb([205, 127, 50]);
pub const BLUE: Rgb<u8> = Rgb([31, 119, 180]);
pub const ORANGE: Rgb<u8> = Rgb([255, 127, 14]);
pub const GREEN: Rgb<u8> = Rgb([44, 160, 44]);
pub const RED: Rgb<u8> = Rgb([214, 39, 40]);

const FONT_BYTES: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

const TITLE_SIZE: f32 = 26.0;
const LABEL_SIZE: f32 = 16.0;
const TICK_SIZE: f32 = 13.0;
const GRID_LINES: u32 = 4;

/// Rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Area {
    pub fn inset(&self, margin: u32) -> Area {
        self.margins(margin, margin, margin, margin)
    }

    /// Shrink by a different amount on each side
    pub fn margins(&self, top: u32, right: u32, bottom: u32, left: u32) -> Area {
        Area {
            x: self.x + left as i32,
            y: self.y + top as i32,
            width: self.width.saturating_sub(left + right).max(1),
            height: self.height.saturating_sub(top + bottom).max(1),
        }
    }

    /// Split into `rows` x `cols` equal cells, row-major
    pub fn grid(&self, rows: u32, cols: u32) -> Vec<Area> {
        let cell_w = (self.width / cols.max(1)).max(1);
        let cell_h = (self.height / rows.max(1)).max(1);
        (0..rows)
            .flat_map(|r| {
                (0..cols).map(move |c| Area {
                    x: self.x + (c * cell_w) as i32,
                    y: self.y + (r * cell_h) as i32,
                    width: cell_w,
                    height: cell_h,
                })
            })
            .collect()
    }

    fn left(&self) -> f32 {
        self.x as f32
    }

    fn right(&self) -> f32 {
        (self.x + self.width as i32) as f32
    }

    fn top(&self) -> f32 {
        self.y as f32
    }

    fn bottom(&self) -> f32 {
        (self.y + self.height as i32) as f32
    }
}

/// A line to draw, in data coordinates
#[derive(Debug, Clone)]
pub struct Series {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb<u8>,
}

/// Closed data range, widened when degenerate so scaling never divides by 0
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Range> {
        let mut iter = values.into_iter().filter(|v| v.is_finite());
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if min == max {
            Some(Range {
                min: min - 1.0,
                max: max + 1.0,
            })
        } else {
            Some(Range { min, max })
        }
    }

    /// Position of `value` in the range, 0.0 to 1.0
    pub fn fraction(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

pub struct Plot {
    image: RgbImage,
    font: Font<'static>,
}

impl Plot {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            image: RgbImage::from_pixel(width, height, WHITE),
            font: Font::try_from_bytes(FONT_BYTES).ok_or(EtlError::Font)?,
        })
    }

    pub fn area(&self) -> Area {
        Area {
            x: 0,
            y: 0,
            width: self.image.width(),
            height: self.image.height(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }

    /// Centered heading along the top edge of `area`
    pub fn title(&mut self, area: Area, text: &str) {
        let (w, _) = self.measure(TITLE_SIZE, text);
        let x = area.x + (area.width as i32 - w) / 2;
        self.text(x, area.y + 8, TITLE_SIZE, INK, text);
    }

    /// Label centered under the plot area and a label above its left edge
    pub fn axis_labels(&mut self, area: Area, x_label: &str, y_label: &str) {
        let (w, _) = self.measure(LABEL_SIZE, x_label);
        let x = area.x + (area.width as i32 - w) / 2;
        self.text(x, area.bottom() as i32 + 30, LABEL_SIZE, AXIS, x_label);
        self.text(area.x, area.y - 24, LABEL_SIZE, AXIS, y_label);
    }

    /// Color swatches with names, stacked in the top-right corner of `area`
    pub fn legend(&mut self, area: Area, entries: &[(&str, Rgb<u8>)]) {
        let widest = entries
            .iter()
            .map(|(name, _)| self.measure(LABEL_SIZE, name).0)
            .max()
            .unwrap_or(0);
        let row = 22;
        let x = area.right() as i32 - widest - 40;
        let y = area.y + 8;

        let frame = Area {
            x: x - 8,
            y: y - 6,
            width: (widest + 44) as u32,
            height: (entries.len() as i32 * row + 8) as u32,
        };
        fill(
            &mut self.image,
            frame.left(),
            frame.top(),
            frame.width as f32,
            frame.height as f32,
            WHITE,
        );
        draw_hollow_rect_mut(&mut self.image, to_rect(frame), GRID);

        for (i, (name, color)) in entries.iter().enumerate() {
            let top = y + i as i32 * row;
            fill(&mut self.image, x as f32, top as f32 + 3.0, 14.0, 14.0, *color);
            self.text(x + 22, top, LABEL_SIZE, INK, name);
        }
    }

    /// Frame, horizontal grid lines, and value ticks down the left edge
    pub fn axes(&mut self, area: Area, values: Range) {
        for i in 0..=GRID_LINES {
            let fraction = i as f32 / GRID_LINES as f32;
            let y = area.bottom() - area.height as f32 * fraction;
            if i > 0 && i < GRID_LINES {
                draw_line_segment_mut(&mut self.image, (area.left(), y), (area.right(), y), GRID);
            }
            let value = values.min + (values.max - values.min) * fraction as f64;
            let label = format_value(value);
            let (w, h) = self.measure(TICK_SIZE, &label);
            self.text(area.x - w - 6, y as i32 - h / 2, TICK_SIZE, AXIS, &label);
        }
        draw_hollow_rect_mut(&mut self.image, to_rect(area), AXIS);
    }

    /// Vertical bars, one cluster per category, one bar per series, with
    /// the category name under each cluster.
    ///
    /// `groups[i][j]` is the value of series `j` in category `i`.
    pub fn grouped_bars(
        &mut self,
        area: Area,
        groups: &[Vec<f64>],
        colors: &[Rgb<u8>],
        labels: &[String],
    ) {
        let max = groups.iter().flatten().copied().fold(0.0_f64, f64::max);
        self.axes(area, Range { min: 0.0, max: max.max(1.0) });
        if groups.is_empty() || max <= 0.0 {
            return;
        }

        let slot = area.width as f32 / groups.len() as f32;
        let per_group = groups.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let bar = (slot * 0.8 / per_group as f32).max(1.0);

        for (i, group) in groups.iter().enumerate() {
            let start = area.left() + slot * i as f32 + slot * 0.1;
            for (j, &value) in group.iter().enumerate() {
                let height = (value / max * area.height as f64) as f32;
                let color = colors.get(j % colors.len().max(1)).copied().unwrap_or(BLUE);
                fill(
                    &mut self.image,
                    start + bar * j as f32,
                    area.bottom() - height,
                    bar,
                    height,
                    color,
                );
            }
            if let Some(label) = labels.get(i) {
                let label = self.fit(TICK_SIZE, label, slot as i32 - 4);
                let (w, _) = self.measure(TICK_SIZE, &label);
                let center = area.left() + slot * (i as f32 + 0.5);
                self.text(center as i32 - w / 2, area.bottom() as i32 + 6, TICK_SIZE, INK, &label);
            }
        }
    }

    /// Horizontal bars from the left edge, first value at the top, named in
    /// the gutter left of `area` and annotated with their value
    pub fn horizontal_bars(&mut self, area: Area, values: &[f64], color: Rgb<u8>, labels: &[String]) {
        draw_hollow_rect_mut(&mut self.image, to_rect(area), AXIS);
        let max = values.iter().copied().fold(0.0_f64, f64::max);
        if values.is_empty() || max <= 0.0 {
            return;
        }

        let slot = area.height as f32 / values.len() as f32;
        for (i, &value) in values.iter().enumerate() {
            let width = (value / max * (area.width as f64 - 60.0)) as f32;
            let top = area.top() + slot * i as f32 + slot * 0.1;
            fill(&mut self.image, area.left(), top, width, slot * 0.8, color);

            let middle = (top + slot * 0.4) as i32;
            let amount = format_value(value);
            let (_, h) = self.measure(TICK_SIZE, &amount);
            self.text((area.left() + width) as i32 + 6, middle - h / 2, TICK_SIZE, INK, &amount);

            if let Some(label) = labels.get(i) {
                let label = self.fit(TICK_SIZE, label, area.x - 10);
                let (w, h) = self.measure(TICK_SIZE, &label);
                self.text(area.x - w - 6, middle - h / 2, TICK_SIZE, INK, &label);
            }
        }
    }

    /// Line series sharing one pair of axes, with the first and last x value
    /// under the corners
    pub fn lines(&mut self, area: Area, series: &[Series]) {
        let points = || series.iter().flat_map(|s| s.points.iter());
        let (Some(xs), Some(ys)) = (
            Range::of(points().map(|p| p.0)),
            Range::of(points().map(|p| p.1)),
        ) else {
            draw_hollow_rect_mut(&mut self.image, to_rect(area), AXIS);
            return;
        };
        self.axes(area, ys);

        let first = format_value(xs.min);
        self.text(area.x, area.bottom() as i32 + 6, TICK_SIZE, AXIS, &first);
        let last = format_value(xs.max);
        let (w, _) = self.measure(TICK_SIZE, &last);
        self.text(area.right() as i32 - w, area.bottom() as i32 + 6, TICK_SIZE, AXIS, &last);

        let project = |(x, y): (f64, f64)| -> (f32, f32) {
            (
                area.left() + (xs.fraction(x) * area.width as f64) as f32,
                area.bottom() - (ys.fraction(y) * area.height as f64) as f32,
            )
        };

        for s in series {
            for pair in s.points.windows(2) {
                draw_line_segment_mut(&mut self.image, project(pair[0]), project(pair[1]), s.color);
            }
            for &point in &s.points {
                let (px, py) = project(point);
                fill(&mut self.image, px - 1.5, py - 1.5, 3.0, 3.0, s.color);
            }
        }
    }

    fn text(&mut self, x: i32, y: i32, size: f32, color: Rgb<u8>, text: &str) {
        draw_text_mut(&mut self.image, color, x, y, Scale::uniform(size), &self.font, text);
    }

    fn measure(&self, size: f32, text: &str) -> (i32, i32) {
        text_size(Scale::uniform(size), &self.font, text)
    }

    /// `text`, shortened with an ellipsis until it is at most `max_width`
    /// pixels wide
    fn fit(&self, size: f32, text: &str, max_width: i32) -> String {
        if self.measure(size, text).0 <= max_width {
            return text.to_string();
        }
        let mut chars: Vec<char> = text.chars().collect();
        while !chars.is_empty() {
            chars.pop();
            let candidate: String = chars.iter().collect::<String>() + "…";
            if self.measure(size, &candidate).0 <= max_width {
                return candidate;
            }
        }
        String::new()
    }
}

/// Whole numbers without decimals, everything else to one decimal
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 || value.abs() >= 100.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn to_rect(area: Area) -> Rect {
    Rect::at(area.x, area.y).of_size(area.width.max(1), area.height.max(1))
}

fn fill(image: &mut RgbImage, x: f32, y: f32, width: f32, height: f32, color: Rgb<u8>) {
    let (w, h) = (width.round() as u32, height.round() as u32);
    if w == 0 || h == 0 {
        return;
    }
    let rect = Rect::at(x.round() as i32, y.round() as i32).of_size(w, h);
    draw_filled_rect_mut(image, rect, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink_in(plot: &Plot, area: Area) -> usize {
        (area.x..area.x + area.width as i32)
            .flat_map(|x| (area.y..area.y + area.height as i32).map(move |y| (x, y)))
            .filter(|&(x, y)| *plot.image.get_pixel(x as u32, y as u32) != WHITE)
            .count()
    }

    #[test]
    fn test_range_degenerate_is_widened() {
        let range = Range::of([5.0, 5.0]).unwrap();
        assert_eq!(range.fraction(5.0), 0.5);
        assert!(Range::of(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn test_grid_cells() {
        let cells = Area { x: 0, y: 0, width: 200, height: 100 }.grid(2, 2);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[3], Area { x: 100, y: 50, width: 100, height: 50 });
    }

    #[test]
    fn test_bar_drawn_in_series_color() {
        let mut plot = Plot::new(200, 200).unwrap();
        let area = plot.area().margins(20, 20, 40, 50);
        plot.grouped_bars(area, &[vec![4.0]], &[GOLD], &["Norway".to_string()]);
        // The only bar is the tallest, so it reaches the top of the area
        assert_eq!(*plot.image.get_pixel(125, area.y as u32 + 2), GOLD);
    }

    #[test]
    fn test_category_label_drawn_under_cluster() {
        let mut plot = Plot::new(200, 200).unwrap();
        let area = plot.area().margins(20, 20, 40, 50);
        let below = Area { x: area.x, y: area.y + area.height as i32 + 2, width: area.width, height: 30 };
        plot.grouped_bars(area, &[vec![4.0]], &[GOLD], &[]);
        let unlabeled = ink_in(&plot, below);

        let mut plot = Plot::new(200, 200).unwrap();
        plot.grouped_bars(area, &[vec![4.0]], &[GOLD], &["Norway".to_string()]);
        assert!(ink_in(&plot, below) > unlabeled);
    }

    #[test]
    fn test_title_and_legend_leave_ink() {
        let mut plot = Plot::new(300, 200).unwrap();
        let whole = plot.area();
        plot.title(whole, "Medals");
        assert!(ink_in(&plot, Area { x: 0, y: 0, width: 300, height: 40 }) > 0);

        let area = whole.inset(40);
        plot.legend(area, &[("Gold", GOLD), ("Silver", SILVER)]);
        assert!(ink_in(&plot, Area { x: 150, y: 40, width: 110, height: 60 }) > 0);
    }

    #[test]
    fn test_long_labels_are_shortened() {
        let plot = Plot::new(10, 10).unwrap();
        let label = plot.fit(TICK_SIZE, "Athletics Women's 4 x 100 metres Relay", 60);
        assert!(label.ends_with('…'));
        assert!(plot.measure(TICK_SIZE, &label).0 <= 60);
        assert_eq!(plot.fit(TICK_SIZE, "Judo", 60), "Judo");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(23.46), "23.5");
        assert_eq!(format_value(175.3), "175");
    }

    #[test]
    fn test_empty_series_draws_only_frame() {
        let mut plot = Plot::new(50, 50).unwrap();
        let area = plot.area().inset(5);
        plot.lines(area, &[]);
        assert_eq!(*plot.image.get_pixel(25, 25), WHITE);
    }
}
