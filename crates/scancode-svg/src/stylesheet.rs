//! Style block regeneration
//!
//! The style text is split into top-level rules by a small brace-counting
//! scanner. Rules the animator generated (`.bar`, `@keyframes wiggle` and
//! `@keyframes wiggle-N`) are dropped and replaced as a whole on every run;
//! anything else in the block is kept in front of them.

use crate::keyframes::SHARED_KEYFRAMES;
use std::ops::Range;

/// A top-level rule: prelude plus balanced `{ ... }` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssRule<'a> {
    /// Text before the opening brace, trimmed
    pub prelude: &'a str,
    /// Byte range from the first prelude character through the closing brace
    pub span: Range<usize>,
}

/// Split `css` into top-level rules.
///
/// Comments and quoted strings are skipped so braces inside them do not
/// count. An opening brace that never balances, a quote not closed on its
/// line and a comment never closed are treated as stray text, and scanning
/// resumes after them.
#[must_use]
pub fn scan_rules(css: &str) -> Vec<CssRule<'_>> {
    scan(css).rules
}

/// True when `css` ends in the middle of a statement (`@import x` without
/// its `;`), so anything appended would be read as part of it
#[must_use]
pub fn has_open_statement(css: &str) -> bool {
    scan(css).open_statement
}

struct Scan<'a> {
    rules: Vec<CssRule<'a>>,
    open_statement: bool,
}

fn scan(css: &str) -> Scan<'_> {
    let bytes = css.as_bytes();
    let mut rules = Vec::new();
    let mut prelude_start = 0;
    // Non-comment text seen since the last `;`, `}` or rule
    let mut open_statement = false;
    let mut i = 0;

    while i < bytes.len() {
        if let Some(end) = skip_comment(bytes, i) {
            i = end;
            prelude_start = end;
            continue;
        }
        match bytes[i] {
            b'"' | b'\'' => {
                open_statement = true;
                i = skip_string(bytes, i).unwrap_or(i + 1);
                continue;
            }
            b';' | b'}' => {
                prelude_start = i + 1;
                open_statement = false;
            }
            b'{' => {
                open_statement = false;
                if let Some(end) = matching_brace(bytes, i) {
                    let raw = &css[prelude_start..i];
                    let start = prelude_start + (raw.len() - raw.trim_start().len());
                    rules.push(CssRule {
                        prelude: raw.trim(),
                        span: start..end,
                    });
                    i = end;
                    prelude_start = end;
                    continue;
                }
                prelude_start = i + 1;
            }
            b if !b.is_ascii_whitespace() => open_statement = true,
            _ => {}
        }
        i += 1;
    }

    Scan {
        rules,
        open_statement,
    }
}

/// Index just past the `}` closing the brace at `open`
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(end) = skip_comment(bytes, i) {
            i = end;
            continue;
        }
        match bytes[i] {
            b'"' | b'\'' => {
                i = skip_string(bytes, i).unwrap_or(i + 1);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// End of a `/* */` comment starting at `i`, if one starts there.
///
/// A `/*` that is never closed is not a comment.
fn skip_comment(bytes: &[u8], i: usize) -> Option<usize> {
    if !bytes[i..].starts_with(b"/*") {
        return None;
    }
    let body = i + 2;
    bytes[body..]
        .windows(2)
        .position(|w| w == b"*/")
        .map(|p| body + p + 2)
}

/// Index just past the string literal opening at `i`.
///
/// A string must close on its own line; `None` means the quote is stray.
fn skip_string(bytes: &[u8], i: usize) -> Option<usize> {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' | b'\r' => return None,
            b if b == quote => return Some(j + 1),
            _ => j += 1,
        }
    }
    None
}

/// True for preludes of rules the animator owns
#[must_use]
pub fn is_generated(prelude: &str) -> bool {
    if prelude == ".bar" {
        return true;
    }
    let Some(rest) = prelude.strip_prefix("@keyframes") else {
        return false;
    };
    if !rest.starts_with(char::is_whitespace) {
        return false;
    }
    let Some(suffix) = rest.trim().strip_prefix(SHARED_KEYFRAMES) else {
        return false;
    };
    suffix.is_empty()
        || suffix
            .strip_prefix('-')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Replace every generated rule in `existing` with `generated`.
///
/// Foreign CSS is kept, trimmed and in order, ahead of the generated block,
/// so feeding the result back in with the same `generated` reproduces it. A
/// trailing statement left open is closed with `;` so the first generated
/// rule keeps its own prelude.
#[must_use]
pub fn regenerate(existing: &str, generated: &str) -> String {
    let mut foreign = Vec::new();
    let mut cursor = 0;
    let mut replaced = 0;

    for rule in scan_rules(existing) {
        if is_generated(rule.prelude) {
            push_trimmed(&mut foreign, &existing[cursor..rule.span.start]);
            cursor = rule.span.end;
            replaced += 1;
        }
    }
    push_trimmed(&mut foreign, &existing[cursor..]);

    if replaced > 0 {
        log::debug!("replacing {replaced} previously generated style rule(s)");
    }

    let mut css = foreign.join("\n");
    if has_open_statement(&css) {
        css.push(';');
    }
    if !css.is_empty() {
        css.push('\n');
    }
    css.push_str(generated);
    css
}

fn push_trimmed<'a>(parts: &mut Vec<&'a str>, text: &'a str) {
    let text = text.trim();
    if !text.is_empty() {
        parts.push(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframes::BASE_RULES;

    #[test]
    fn test_scan_rules_nested_blocks() {
        let css = ".a { fill: red; }\n@keyframes k { 0% { x: 1; } 100% { x: 2; } }\n";
        let rules = scan_rules(css);

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].prelude, ".a");
        assert_eq!(&css[rules[0].span.clone()], ".a { fill: red; }");
        assert_eq!(rules[1].prelude, "@keyframes k");
        assert_eq!(
            &css[rules[1].span.clone()],
            "@keyframes k { 0% { x: 1; } 100% { x: 2; } }"
        );
    }

    #[test]
    fn test_scan_rules_skips_comments_and_strings() {
        let css = "/* { */ .a { content: \"}\"; } @import url(x.css); .b{}";
        let rules = scan_rules(css);

        let preludes: Vec<_> = rules.iter().map(|r| r.prelude).collect();
        assert_eq!(preludes, vec![".a", ".b"]);
        assert_eq!(&css[rules[0].span.clone()], ".a { content: \"}\"; }");
    }

    #[test]
    fn test_scan_rules_unbalanced_brace() {
        let css = ".broken { fill: red;\n.bar { x: 1; }";
        let rules = scan_rules(css);

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].prelude, ".bar");
    }

    #[test]
    fn test_is_generated() {
        assert!(is_generated(".bar"));
        assert!(is_generated("@keyframes wiggle"));
        assert!(is_generated("@keyframes   wiggle-12"));
        assert!(!is_generated("@keyframes wiggle-"));
        assert!(!is_generated("@keyframes wiggle-a"));
        assert!(!is_generated("@keyframes wiggles"));
        assert!(!is_generated("@keyframeswiggle"));
        assert!(!is_generated(".bar-1"));
        assert!(!is_generated(".bar, .x"));
    }

    #[test]
    fn test_regenerate_fresh_block() {
        assert_eq!(regenerate("", BASE_RULES), BASE_RULES);
        assert_eq!(regenerate("\n   \n", BASE_RULES), BASE_RULES);
    }

    #[test]
    fn test_regenerate_replaces_previous_output() {
        let previous = format!("{BASE_RULES}@keyframes wiggle-0 {{\n 0% {{ }}\n}}\n@keyframes wiggle-1 {{ }}\n");
        let generated = format!("{BASE_RULES}@keyframes wiggle-0 {{ new }}\n");

        assert_eq!(regenerate(&previous, &generated), generated);
    }

    #[test]
    fn test_regenerate_keeps_foreign_rules() {
        let existing = format!(".logo {{ fill: #fff; }}\n{BASE_RULES}@keyframes wiggle-3 {{ }}\n.tail {{ opacity: 1; }}");
        let out = regenerate(&existing, BASE_RULES);

        assert_eq!(
            out,
            format!(".logo {{ fill: #fff; }}\n.tail {{ opacity: 1; }}\n{BASE_RULES}")
        );
        assert_eq!(regenerate(&out, BASE_RULES), out);
    }

    #[test]
    fn test_regenerate_is_fixed_point_with_broken_css() {
        let once = regenerate(".broken { fill: red;", BASE_RULES);
        let twice = regenerate(&once, BASE_RULES);

        assert_eq!(once, twice);
        assert!(once.starts_with(".broken { fill: red;\n"));
    }

    #[test]
    fn test_open_statement() {
        assert!(has_open_statement("@import url(font.css)"));
        assert!(has_open_statement(".a { } b /* note */"));
        assert!(has_open_statement("@import 'x"));
        assert!(!has_open_statement("@import url(font.css);"));
        assert!(!has_open_statement(".a { }\n/* note */\n"));
        assert!(!has_open_statement(""));
    }

    #[test]
    fn test_regenerate_closes_open_statement() {
        let once = regenerate("@import url(font.css)", BASE_RULES);

        assert_eq!(once, format!("@import url(font.css);\n{BASE_RULES}"));
        assert_eq!(regenerate(&once, BASE_RULES), once);
    }

    #[test]
    fn test_scan_rules_unclosed_quote_is_stray() {
        let css = ".logo { font-family: 'Circular; }\n.bar { x: 1; }";
        let preludes: Vec<_> = scan_rules(css).iter().map(|r| r.prelude).collect();

        assert_eq!(preludes, vec![".logo", ".bar"]);
    }

    #[test]
    fn test_scan_rules_string_ends_at_line() {
        // The quote cannot reach across the newline into the next rule
        let css = "a { content: \"x }\n.bar { y: 2; }";
        let rules = scan_rules(css);

        assert_eq!(rules.last().map(|r| r.prelude), Some(".bar"));
    }

    #[test]
    fn test_scan_rules_unclosed_comment_is_stray() {
        let css = "/* note\n.bar { x: 1; }";
        let preludes: Vec<_> = scan_rules(css).iter().map(|r| r.prelude).collect();

        assert_eq!(preludes, vec!["/* note\n.bar"]);
        let once = regenerate("/* note", BASE_RULES);
        assert_eq!(regenerate(&once, BASE_RULES), once);
    }

    #[test]
    fn test_regenerate_is_fixed_point_with_unclosed_quote() {
        let once = regenerate(".logo { font-family: 'Circular; }", BASE_RULES);
        let twice = regenerate(&once, BASE_RULES);

        assert_eq!(once, twice);
        assert_eq!(twice.matches("@keyframes wiggle ").count(), 1);
    }
}
