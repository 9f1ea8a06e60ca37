//! Normalizes the small HTML-like markup accepted inside text content.
//!
//! Only three entities (`&mdash;`, `&ldquo;`, `&rdquo;`) and two emphasis
//! tags (`<em>`, `<strong>`) are understood, plus `<br>` line breaks. This
//! is deliberately not an HTML parser: tags are matched literally and
//! non-greedily, and anything malformed stays in the output as-is.

/// A contiguous span of text sharing the same bold/italic attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

/// One logical line after `<br>` splitting and tag resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLine {
    pub runs: Vec<StyledRun>,
}

impl NormalizedLine {
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.text.is_empty())
    }
}

const ENTITIES: [(&str, &str); 3] = [
    ("&mdash;", "\u{2014}"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
];

pub fn normalize(raw: &str) -> Vec<NormalizedLine> {
    split_line_breaks(raw)
        .into_iter()
        .map(|line| {
            let decoded = decode_entities(&line);
            NormalizedLine {
                runs: parse_runs(&decoded, false, false, true),
            }
        })
        .collect()
}

/// Splits on `<br>`, `<br/>` and `<br />`, case-insensitively. The markers
/// themselves are consumed; everything else is preserved verbatim.
fn split_line_breaks(raw: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut rest = raw;
    while let Some((offset, len)) = find_line_break(rest) {
        current.push_str(&rest[..offset]);
        lines.push(std::mem::take(&mut current));
        rest = &rest[offset + len..];
    }
    current.push_str(rest);
    lines.push(current);
    lines
}

fn find_line_break(text: &str) -> Option<(usize, usize)> {
    let lower = text.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(found) = lower[search_from..].find("<br") {
        let start = search_from + found;
        let after = &lower[start + 3..];
        let close = if after.starts_with('>') {
            Some(1)
        } else if after.starts_with("/>") {
            Some(2)
        } else if after.starts_with(" />") {
            Some(3)
        } else {
            None
        };
        if let Some(tail) = close {
            return Some((start, 3 + tail));
        }
        search_from = start + 3;
    }
    None
}

fn decode_entities(text: &str) -> String {
    let mut decoded = text.to_string();
    for (entity, replacement) in ENTITIES {
        decoded = decoded.replace(entity, replacement);
    }
    decoded
}

/// Scans one line for `<em>`/`<strong>` pairs. `allow_nesting` permits one
/// level of the other tag inside a matched pair; unmatched tags fall
/// through as literal text.
fn parse_runs(text: &str, bold: bool, italic: bool, allow_nesting: bool) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        let em = find_tag_pair(rest, "em");
        let strong = find_tag_pair(rest, "strong");
        let next = match (em, strong) {
            (Some(e), Some(s)) if e.open_at <= s.open_at => Some(("em", e)),
            (Some(_), Some(s)) => Some(("strong", s)),
            (Some(e), None) => Some(("em", e)),
            (None, Some(s)) => Some(("strong", s)),
            (None, None) => None,
        };
        let Some((tag, pair)) = next else {
            plain.push_str(rest);
            break;
        };

        plain.push_str(&rest[..pair.open_at]);
        if !plain.is_empty() {
            runs.push(StyledRun {
                text: std::mem::take(&mut plain),
                bold,
                italic,
            });
        }

        let inner = &rest[pair.inner_start..pair.inner_end];
        let (inner_bold, inner_italic) = match tag {
            "strong" => (true, italic),
            _ => (bold, true),
        };
        if allow_nesting {
            runs.extend(parse_runs(inner, inner_bold, inner_italic, false));
        } else if !inner.is_empty() {
            runs.push(StyledRun {
                text: inner.to_string(),
                bold: inner_bold,
                italic: inner_italic,
            });
        }
        rest = &rest[pair.close_end..];
    }

    if !plain.is_empty() {
        runs.push(StyledRun {
            text: plain,
            bold,
            italic,
        });
    }
    runs
}

struct TagPair {
    open_at: usize,
    inner_start: usize,
    inner_end: usize,
    close_end: usize,
}

/// First `<tag>…</tag>` pair, non-greedy: the nearest close after the open.
fn find_tag_pair(text: &str, tag: &str) -> Option<TagPair> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let open_at = text.find(&open)?;
    let inner_start = open_at + open.len();
    let close_rel = text[inner_start..].find(&close)?;
    let inner_end = inner_start + close_rel;
    Some(TagPair {
        open_at,
        inner_start,
        inner_end,
        close_end: inner_end + close.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, bold: bool, italic: bool) -> StyledRun {
        StyledRun {
            text: text.to_string(),
            bold,
            italic,
        }
    }

    #[test]
    fn plain_text_is_a_single_run() {
        let lines = normalize("hello world");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].runs, vec![run("hello world", false, false)]);
    }

    #[test]
    fn em_produces_italic_run() {
        let lines = normalize("Hello <em>world</em>");
        assert_eq!(
            lines[0].runs,
            vec![run("Hello ", false, false), run("world", false, true)]
        );
    }

    #[test]
    fn strong_produces_bold_run() {
        let lines = normalize("<strong>loud</strong> quiet");
        assert_eq!(
            lines[0].runs,
            vec![run("loud", true, false), run(" quiet", false, false)]
        );
    }

    #[test]
    fn one_nesting_level_combines_styles() {
        let lines = normalize("<strong>a <em>b</em> c</strong>");
        assert_eq!(
            lines[0].runs,
            vec![
                run("a ", true, false),
                run("b", true, true),
                run(" c", true, false)
            ]
        );
    }

    #[test]
    fn unmatched_tag_stays_literal() {
        let lines = normalize("Hello <em>world");
        assert_eq!(lines[0].runs, vec![run("Hello <em>world", false, false)]);
    }

    #[test]
    fn stray_close_tag_stays_literal() {
        let lines = normalize("oops</strong> here");
        assert_eq!(lines[0].runs, vec![run("oops</strong> here", false, false)]);
    }

    #[test]
    fn tags_match_non_greedily() {
        let lines = normalize("<em>a</em> and <em>b</em>");
        assert_eq!(
            lines[0].runs,
            vec![
                run("a", false, true),
                run(" and ", false, false),
                run("b", false, true)
            ]
        );
    }

    #[test]
    fn br_variants_split_lines() {
        for marker in ["<br>", "<br/>", "<br />", "<BR>", "<Br/>"] {
            let input = format!("one{}two", marker);
            let lines = normalize(&input);
            assert_eq!(lines.len(), 2, "marker {:?}", marker);
            assert_eq!(lines[0].runs, vec![run("one", false, false)]);
            assert_eq!(lines[1].runs, vec![run("two", false, false)]);
        }
    }

    #[test]
    fn entities_are_decoded() {
        let lines = normalize("a &mdash; b &ldquo;quote&rdquo;");
        assert_eq!(
            lines[0].runs,
            vec![run("a \u{2014} b \u{201C}quote\u{201D}", false, false)]
        );
    }

    #[test]
    fn unknown_entities_pass_through() {
        let lines = normalize("5 &lt; 6");
        assert_eq!(lines[0].runs, vec![run("5 &lt; 6", false, false)]);
    }

    #[test]
    fn whitespace_within_a_line_is_preserved() {
        let lines = normalize("  spaced  <em> out </em> ");
        assert_eq!(
            lines[0].runs,
            vec![
                run("  spaced  ", false, false),
                run(" out ", false, true),
                run(" ", false, false)
            ]
        );
    }

    #[test]
    fn empty_line_between_breaks_is_kept() {
        let lines = normalize("a<br><br>b");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].is_empty());
    }
}
