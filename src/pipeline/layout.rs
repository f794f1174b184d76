//! Line reconstruction from positioned text fragments.
//!
//! A PDF text layer is a bag of fragments, each a string drawn at some
//! position; nothing in it says "this is a line". We rebuild lines by
//! walking fragments in content-stream order and starting a new line
//! whenever the vertical coordinate jumps by more than [`LINE_TOLERANCE`].
//!
//! ```text
//! y=100 "Quarterly"   ┐
//! y=102 "results"     ├─▶ "Quarterly results were"
//! y=100 "were"        ┘
//! y=120 "strong."     ──▶ "strong."
//! ```
//!
//! Fragments without a coordinate never break a line. When the line's
//! reference coordinate is still unknown, the next positioned fragment joins
//! the line and becomes the reference.

/// Maximum vertical distance, in page units, between fragments on one line.
pub const LINE_TOLERANCE: f32 = 5.0;

/// A run of text as laid out on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    pub text: String,
    /// Vertical position in the page's native coordinate space, if known.
    pub y: Option<f32>,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, y: f32) -> Self {
        Self {
            text: text.into(),
            y: y.is_finite().then_some(y),
        }
    }

    pub fn unpositioned(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            y: None,
        }
    }
}

/// Rebuild one page's lines, newline-joined.
pub fn reconstruct_page(fragments: &[TextFragment]) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut reference: Option<f32> = None;

    for fragment in fragments {
        match (fragment.y, reference) {
            (Some(y), Some(r)) if (y - r).abs() > LINE_TOLERANCE => {
                lines.push(current.join(" "));
                current.clear();
                reference = Some(y);
            }
            (Some(y), None) => reference = Some(y),
            _ => {}
        }
        current.push(&fragment.text);
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }

    lines.join("\n")
}

/// Rebuild a whole document: pages separated by a blank line, outer
/// whitespace trimmed. Pages without fragments contribute an empty string.
pub fn reconstruct_document(pages: &[Vec<TextFragment>]) -> String {
    pages
        .iter()
        .map(|page| reconstruct_page(page))
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(text: &str, y: f32) -> TextFragment {
        TextFragment::new(text, y)
    }

    #[test]
    fn close_coordinates_merge_into_one_line() {
        let page = vec![frag("a", 100.0), frag("b", 102.0), frag("c", 100.0)];
        assert_eq!(reconstruct_page(&page), "a b c");
    }

    #[test]
    fn jump_beyond_tolerance_starts_new_line() {
        let page = vec![frag("a", 100.0), frag("b", 102.0), frag("c", 120.0)];
        assert_eq!(reconstruct_page(&page), "a b\nc");
    }

    #[test]
    fn tolerance_is_inclusive() {
        let page = vec![frag("a", 100.0), frag("b", 105.0), frag("c", 94.9)];
        assert_eq!(reconstruct_page(&page), "a b\nc");
    }

    #[test]
    fn reference_is_the_line_start_not_the_last_fragment() {
        // 100 → 104 → 108: 108 is within 5 of 104 but not of 100.
        let page = vec![frag("a", 100.0), frag("b", 104.0), frag("c", 108.0)];
        assert_eq!(reconstruct_page(&page), "a b\nc");
    }

    #[test]
    fn unpositioned_fragments_stay_on_current_line() {
        let page = vec![
            frag("a", 100.0),
            TextFragment::unpositioned("b"),
            frag("c", 300.0),
            TextFragment::unpositioned("d"),
        ];
        assert_eq!(reconstruct_page(&page), "a b\nc d");
    }

    #[test]
    fn unknown_reference_adopts_next_coordinate() {
        let page = vec![
            TextFragment::unpositioned("a"),
            frag("b", 100.0),
            frag("c", 101.0),
            frag("d", 200.0),
        ];
        assert_eq!(reconstruct_page(&page), "a b c\nd");
    }

    #[test]
    fn non_finite_coordinate_is_unpositioned() {
        assert_eq!(TextFragment::new("x", f32::NAN).y, None);
    }

    #[test]
    fn pages_are_separated_by_blank_line_and_trimmed() {
        let pages = vec![
            vec![frag("Title", 700.0), frag("Body", 650.0)],
            vec![],
            vec![frag("End", 700.0)],
        ];
        assert_eq!(reconstruct_document(&pages), "Title\nBody\n\n\n\nEnd");
    }

    #[test]
    fn document_without_text_is_empty() {
        assert_eq!(reconstruct_document(&[vec![], vec![]]), "");
        assert_eq!(reconstruct_document(&[]), "");
    }
}
