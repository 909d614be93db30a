//! Point list behind the coordinate plotter. Rendering belongs to the host's
//! graphing engine; this keeps the entered points and the joined state.

use thiserror::Error;

use crate::config::PLOT_MIN_LINE_POINTS;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlotError {
    #[error("both coordinates must be numbers")]
    InvalidCoordinate,
    #[error("at least {} points are needed to join them", PLOT_MIN_LINE_POINTS)]
    TooFewPoints,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

impl PlotPoint {
    /// Label drawn next to the point, e.g. `(2,-1.5)`.
    pub fn label(&self) -> String {
        format!("({},{})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineChange {
    Joined,
    Split,
}

/// Reads a coordinate the way a browser number prompt would: leading
/// whitespace is skipped and anything after the numeric prefix is ignored.
/// Empty, non-numeric and infinite values are rejected.
pub fn parse_coordinate(text: &str) -> Result<f64, PlotError> {
    let text = text.trim_start();
    let prefix = &text[..numeric_prefix_len(text)];
    prefix
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(PlotError::InvalidCoordinate)
}

fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let digits_from = |mut at: usize| {
        while bytes.get(at).is_some_and(u8::is_ascii_digit) {
            at += 1;
        }
        at
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digits += frac_end - end - 1;
        end = frac_end;
    }
    if digits == 0 {
        return 0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_start = end + 1 + sign;
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }
    end
}

#[derive(Clone, Debug, Default)]
pub struct PointPlot {
    points: Vec<PlotPoint>,
    joined: bool,
}

impl PointPlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[PlotPoint] {
        &self.points
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    /// Appends the point typed into the two coordinate fields. Nothing is
    /// added unless both parse.
    pub fn add(&mut self, x: &str, y: &str) -> Result<PlotPoint, PlotError> {
        let point = PlotPoint {
            x: parse_coordinate(x)?,
            y: parse_coordinate(y)?,
        };
        self.points.push(point);
        log::debug!("plot point {} added ({} total)", point.label(), self.points.len());
        Ok(point)
    }

    /// Joins the points in entry order, or splits them again.
    pub fn toggle_line(&mut self) -> Result<LineChange, PlotError> {
        if self.points.len() < PLOT_MIN_LINE_POINTS {
            return Err(PlotError::TooFewPoints);
        }
        self.joined = !self.joined;
        Ok(if self.joined {
            LineChange::Joined
        } else {
            LineChange::Split
        })
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.joined = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_follow_number_prefix() {
        assert_eq!(parse_coordinate("3"), Ok(3.0));
        assert_eq!(parse_coordinate("  -2.5"), Ok(-2.5));
        assert_eq!(parse_coordinate(".5"), Ok(0.5));
        assert_eq!(parse_coordinate("4cm"), Ok(4.0));
        assert_eq!(parse_coordinate("1e3x"), Ok(1000.0));
        assert_eq!(parse_coordinate("2e"), Ok(2.0));
        assert_eq!(parse_coordinate("7."), Ok(7.0));
    }

    #[test]
    fn non_numbers_are_rejected() {
        for text in ["", "   ", "abc", "-", ".", "+.e5", "inf", "NaN", "1e999"] {
            assert_eq!(parse_coordinate(text), Err(PlotError::InvalidCoordinate), "{text:?}");
        }
    }

    #[test]
    fn invalid_point_leaves_plot_unchanged() {
        let mut plot = PointPlot::new();
        assert_eq!(plot.add("1", "y"), Err(PlotError::InvalidCoordinate));
        assert!(plot.points().is_empty());

        let point = plot.add("2", "-1.5").unwrap();
        assert_eq!(point.label(), "(2,-1.5)");
        assert_eq!(plot.points(), &[point]);
    }

    #[test]
    fn line_needs_two_points() {
        let mut plot = PointPlot::new();
        plot.add("0", "0").unwrap();
        assert_eq!(plot.toggle_line(), Err(PlotError::TooFewPoints));
        assert!(!plot.is_joined());

        plot.add("1", "1").unwrap();
        assert_eq!(plot.toggle_line(), Ok(LineChange::Joined));
        assert!(plot.is_joined());
        assert_eq!(plot.toggle_line(), Ok(LineChange::Split));
        assert!(!plot.is_joined());
    }

    #[test]
    fn reset_forgets_points_and_line() {
        let mut plot = PointPlot::new();
        plot.add("0", "0").unwrap();
        plot.add("3", "4").unwrap();
        plot.toggle_line().unwrap();
        plot.reset();
        assert!(plot.points().is_empty());
        assert!(!plot.is_joined());
        assert_eq!(plot.toggle_line(), Err(PlotError::TooFewPoints));
    }
}
