//! Markup builders for the math editor. The typesetting engine itself is
//! external; these only produce the strings fed to it.

use crate::config::{MATRIX_DEFAULT_SIZE, MATRIX_MAX_SIZE};

/// Wraps the editor's raw text in a display-mode `aligned` block so several
/// lines typeset together. Blank input yields an empty preview.
pub fn preview_markup(raw: &str) -> String {
    let content = raw.replace('\u{a0}', " ");
    let content = content.trim();
    if content.is_empty() {
        return String::new();
    }
    format!("$$ \\begin{{aligned}} {content} \\end{{aligned}} $$")
}

/// Parses a rows/cols field, falling back to the default size and clamping
/// to the supported range.
pub fn parse_dimension(value: &str) -> usize {
    value
        .trim()
        .parse::<usize>()
        .unwrap_or(MATRIX_DEFAULT_SIZE)
        .clamp(1, MATRIX_MAX_SIZE)
}

/// `pmatrix` with a checkerboard of ones and zeros as placeholder cells.
pub fn matrix(rows: usize, cols: usize) -> String {
    let rows = rows.clamp(1, MATRIX_MAX_SIZE);
    let cols = cols.clamp(1, MATRIX_MAX_SIZE);
    let body = (0..rows)
        .map(|row| {
            (0..cols)
                .map(|col| if (row + col) % 2 == 0 { "1" } else { "0" })
                .collect::<Vec<_>>()
                .join(" & ")
        })
        .collect::<Vec<_>>()
        .join(" \\\\ ");
    format!("\\begin{{pmatrix}} {body} \\end{{pmatrix}} ")
}

/// Quick formulas mark their blanks with `?`.
pub fn fill_placeholders(formula: &str) -> String {
    formula.replace('?', "0")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Snippet {
    LineBreak,
    TextNode,
    Boxed,
    Bold,
    Colored,
}

impl Snippet {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "break" => Some(Snippet::LineBreak),
            "text" => Some(Snippet::TextNode),
            "box" => Some(Snippet::Boxed),
            "bold" => Some(Snippet::Bold),
            "color" => Some(Snippet::Colored),
            _ => None,
        }
    }

    pub fn markup(self) -> &'static str {
        match self {
            Snippet::LineBreak => " \\\\ \n ",
            Snippet::TextNode => "\\text{ Resultado: } ",
            Snippet::Boxed => "\\boxed{ Resultado } ",
            Snippet::Bold => "\\mathbf{ Resultado } ",
            Snippet::Colored => "\\color{blue}{ Resultado } ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_has_no_preview() {
        assert_eq!(preview_markup("  \u{a0} \n"), "");
    }

    #[test]
    fn preview_wraps_in_aligned() {
        assert_eq!(
            preview_markup("\u{a0}x^2 = 4 "),
            "$$ \\begin{aligned} x^2 = 4 \\end{aligned} $$"
        );
    }

    #[test]
    fn two_by_three_matrix() {
        assert_eq!(
            matrix(2, 3),
            "\\begin{pmatrix} 1 & 0 & 1 \\\\ 0 & 1 & 0 \\end{pmatrix} "
        );
    }

    #[test]
    fn matrix_dimensions_are_clamped() {
        assert_eq!(parse_dimension(""), 2);
        assert_eq!(parse_dimension("abc"), 2);
        assert_eq!(parse_dimension("0"), 1);
        assert_eq!(parse_dimension("40"), 10);
        assert_eq!(matrix(0, 0), "\\begin{pmatrix} 1 \\end{pmatrix} ");
    }

    #[test]
    fn placeholders_become_zero() {
        assert_eq!(fill_placeholders("\\frac{?}{?}"), "\\frac{0}{0}");
        assert_eq!(fill_placeholders("x^2"), "x^2");
    }

    #[test]
    fn snippet_names() {
        assert_eq!(Snippet::from_name("box"), Some(Snippet::Boxed));
        assert_eq!(Snippet::from_name("nope"), None);
        assert!(Snippet::LineBreak.markup().contains("\\\\"));
    }
}
