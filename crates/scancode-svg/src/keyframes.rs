//! CSS synthesis for the style block

use crate::bar::{format_number, BarAnimation};
use std::fmt::Write;

/// Shared rules: transform origin for `.bar` and the generic `wiggle` cycle
pub const BASE_RULES: &str = ".bar { transform-box: fill-box; transform-origin: center center; will-change: transform; }\n\
@keyframes wiggle { 0% { transform: scaleY(1); } 25% { transform: scaleY(1.04); } 50% { transform: scaleY(0.98); } 75% { transform: scaleY(1.02); } 100% { transform: scaleY(1); } }\n";

/// Name of the shared keyframes rule
pub const SHARED_KEYFRAMES: &str = "wiggle";

/// `@keyframes wiggle-{i}` for one bar
#[must_use]
pub fn bar_keyframes(bar: &BarAnimation) -> String {
    let mut css = String::with_capacity(320);
    let _ = writeln!(css, "@keyframes {} {{", bar.keyframes_name());
    css.push_str("  0% { transform: translateY(0px) scaleY(1); }\n");
    for stop in &bar.stops {
        let _ = writeln!(
            css,
            " {}% {{ transform: translateY({}) scaleY({}); }}",
            stop.offset,
            stop.translate,
            format_number(stop.scale),
        );
    }
    css.push_str(" 100% { transform: translateY(0px) scaleY(1); }\n}");
    css
}

/// Base rules followed by one keyframes rule per bar, in order
#[must_use]
pub fn generated_css(bars: &[BarAnimation]) -> String {
    let mut css = String::from(BASE_RULES);
    if !bars.is_empty() {
        let rules: Vec<String> = bars.iter().map(bar_keyframes).collect();
        css.push_str(&rules.join("\n"));
        css.push('\n');
    }
    css
}
