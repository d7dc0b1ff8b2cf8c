//! Equation text normalization: comment stripping, blank-line removal,
//! `---` block flattening and lhs/rhs splitting. Purely textual; malformed
//! equations are not rejected here — they surface as parse failures in the
//! model builder.

/// One equation, split on the first `=`.
///
/// The original text is kept for diagnostics: the reporter re-evaluates
/// `lhs - rhs` from it at the final point as an independent sanity check.
/// An equation without `=` is treated as a bare residual (`text = 0`).
#[derive(Clone, Debug, PartialEq)]
pub struct Equation {
    pub text: String,
    pub lhs: String,
    pub rhs: Option<String>,
}

impl Equation {
    pub fn parse(line: &str) -> Equation {
        let text = line.trim().to_string();
        match text.split_once('=') {
            Some((lhs, rhs)) => Equation {
                lhs: lhs.trim().to_string(),
                rhs: Some(rhs.trim().to_string()),
                text,
            },
            None => Equation {
                lhs: text.clone(),
                rhs: None,
                text,
            },
        }
    }
}

/// Removes a `#`-delimited trailing comment and trims the line.
pub fn strip_comment(line: &str) -> &str {
    match line.split_once('#') {
        Some((before, _)) => before.trim(),
        None => line.trim(),
    }
}

/// Splits text into cleaned, non-empty statement lines, preserving order.
pub fn normalize_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_comment)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

/// Flattens `---`-delimited blocks into one ordered equation sequence.
///
/// Blocks are processed independently and concatenated back in source
/// order, matching the batch input format of the surrounding tool.
pub fn flatten_blocks(text: &str) -> Vec<String> {
    text.split("---")
        .flat_map(|block| normalize_lines(block))
        .collect()
}

/// Normalizes a slice of raw equation lines into `Equation`s, dropping
/// comments and empties.
pub fn normalize_equations(lines: &[String]) -> Vec<Equation> {
    lines
        .iter()
        .map(|line| strip_comment(line))
        .filter(|line| !line.is_empty())
        .map(Equation::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("x + y = 3  # sum"), "x + y = 3");
        assert_eq!(strip_comment("# whole line"), "");
        assert_eq!(strip_comment("  x = 1  "), "x = 1");
    }

    #[test]
    fn test_normalize_lines_drops_blanks_and_comments() {
        let text = "a = 1\n\n# comment only\nb = a + 1   # uses a\n";
        assert_eq!(normalize_lines(text), vec!["a = 1", "b = a + 1"]);
    }

    #[test]
    fn test_flatten_blocks_preserves_order() {
        let text = "x + y = 3\nx - y = 1\n---\nz = 5 # separate block\n";
        assert_eq!(
            flatten_blocks(text),
            vec!["x + y = 3", "x - y = 1", "z = 5"]
        );
    }

    #[test]
    fn test_equation_splits_on_first_equals() {
        let eq = Equation::parse("x = y = 1");
        assert_eq!(eq.lhs, "x");
        assert_eq!(eq.rhs.as_deref(), Some("y = 1"));
    }

    #[test]
    fn test_equation_without_equals_is_bare_residual() {
        let eq = Equation::parse("x - 5");
        assert_eq!(eq.lhs, "x - 5");
        assert_eq!(eq.rhs, None);
    }
}
