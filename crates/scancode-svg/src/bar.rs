//! Per-bar animation parameters and attribute rewriting
//!
//! Each bar wiggles vertically by scaling its height around the keyframe
//! offsets 25 %, 50 % and 75 %. A matching `translateY` keeps the visual
//! center of the bar in place while it scales.

use crate::parser::{Element, Node};
use std::fmt::{self, Write};

/// Class token shared by every animated bar
pub const BAR_CLASS: &str = "bar";

/// Vertical scale at the 25 % stop
pub const SCALE_25: f64 = 1.04;
/// Vertical scale at the 50 % stop
pub const SCALE_50: f64 = 0.98;
/// Vertical scale at the 75 % stop
pub const SCALE_75: f64 = 1.02;

/// Translate that offsets a vertical scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translate {
    /// Distance in px, rounded to 3 decimals
    pub magnitude: f64,
    /// Moves up (negative `translateY`) when the bar grows
    pub upward: bool,
}

impl Translate {
    /// Half the height change produced by `scale`
    #[must_use]
    pub fn compensating(height: f64, scale: f64) -> Self {
        let scaled = round_to(height * scale, 3);
        Self {
            magnitude: round_to((scaled - height).abs() / 2.0, 3),
            upward: scaled > height,
        }
    }
}

impl fmt::Display for Translate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.upward { "-" } else { "" };
        write!(f, "{sign}{}px", format_number(self.magnitude))
    }
}

/// One intermediate keyframe of a bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeStop {
    /// Percentage offset within the cycle
    pub offset: u8,
    /// `scaleY` factor
    pub scale: f64,
    /// Compensating `translateY`
    pub translate: Translate,
}

impl KeyframeStop {
    fn new(offset: u8, height: f64, scale: f64) -> Self {
        Self {
            offset,
            scale,
            translate: Translate::compensating(height, scale),
        }
    }
}

/// Animation parameters derived for one bar
#[derive(Debug, Clone, PartialEq)]
pub struct BarAnimation {
    /// Position in detection order
    pub index: usize,
    /// Original `height` attribute
    pub height: f64,
    /// Original `y` attribute
    pub y: f64,
    /// Start delay in seconds
    pub delay: f64,
    /// Stops at 25 %, 50 % and 75 %
    pub stops: [KeyframeStop; 3],
}

impl BarAnimation {
    /// Derive the parameters for `element` at `index`.
    ///
    /// Returns `None` when `height` or `y` is missing or not numeric; such
    /// rects are left untouched.
    #[must_use]
    pub fn for_element(index: usize, element: &Element, delay_step: f64) -> Option<Self> {
        let height = element.attr_f64("height")?;
        let y = element.attr_f64("y")?;
        let delay = element
            .attr("style")
            .and_then(existing_delay)
            .unwrap_or_else(|| default_delay(index, delay_step));

        Some(Self {
            index,
            height,
            y,
            delay,
            stops: [
                KeyframeStop::new(25, height, SCALE_25),
                KeyframeStop::new(50, height, SCALE_50),
                KeyframeStop::new(75, height, SCALE_75),
            ],
        })
    }

    /// Name of this bar's `@keyframes` rule
    #[must_use]
    pub fn keyframes_name(&self) -> String {
        format!("wiggle-{}", self.index)
    }

    /// Per-bar class token
    #[must_use]
    pub fn class_name(&self) -> String {
        format!("{BAR_CLASS}-{}", self.index)
    }

    /// Rewrite `element` so it runs this animation: drop SMIL height/y
    /// animations, add the bar classes, append the inline animation style.
    pub fn apply_to(&self, element: &mut Element, duration: f64) {
        let removed = remove_size_animations(element);
        if removed > 0 {
            log::debug!("bar {}: removed {removed} SMIL animate element(s)", self.index);
        }

        let mut classes = ClassList::parse(element.attr("class").unwrap_or_default());
        classes.ensure(BAR_CLASS);
        classes.ensure(&self.class_name());
        element.set_attr("class", classes.to_string());

        let style = inline_animation_style(element.attr("style").unwrap_or_default(), self, duration);
        element.set_attr("style", style);
    }
}

/// Stagger delay for a bar without a declared one
#[must_use]
#[allow(clippy::cast_precision_loss)] // bar indices are tiny
pub fn default_delay(index: usize, delay_step: f64) -> f64 {
    round_to(index as f64 * delay_step, 2)
}

/// First `animation-delay:` value (in seconds) declared in an inline style
#[must_use]
pub fn existing_delay(style: &str) -> Option<f64> {
    let (_, rest) = style.split_once("animation-delay:")?;
    let value = rest.split('s').next()?;
    value.trim().parse::<f64>().ok().filter(|d| d.is_finite())
}

/// Inline style for a bar: the kept declarations plus the animation block.
///
/// Earlier `animation-*` declarations are not removed; the appended ones
/// win by declaration order.
#[must_use]
pub fn inline_animation_style(existing: &str, bar: &BarAnimation, duration: f64) -> String {
    let kept = existing.trim().trim_end_matches(';');
    let mut style = String::with_capacity(kept.len() + 224);
    if !kept.is_empty() {
        style.push_str(kept);
        style.push(';');
    }
    let _ = write!(
        style,
        "animation-name:{};animation-duration:{}s;\
         animation-timing-function:ease-in-out;animation-iteration-count:infinite;\
         animation-delay:{}s;animation-direction:alternate;animation-fill-mode:both;",
        bar.keyframes_name(),
        format_number(duration),
        format_number(bar.delay),
    );
    style
}

/// Remove direct `<animate>` children that drive `height` or `y`.
///
/// Whitespace that followed a removed element goes with it. Returns the
/// number of elements removed.
pub fn remove_size_animations(element: &mut Element) -> usize {
    let mut removed = 0;
    let mut drop_tail = false;
    element.children.retain(|node| {
        let tail = std::mem::take(&mut drop_tail);
        match node {
            Node::Element(child) if is_size_animation(child) => {
                removed += 1;
                drop_tail = true;
                false
            }
            Node::Text(_) if tail && node.is_whitespace() => false,
            _ => true,
        }
    });
    removed
}

fn is_size_animation(element: &Element) -> bool {
    element.is_svg("animate") && matches!(element.attr("attributeName"), Some("height" | "y"))
}

/// Whitespace-separated class tokens in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList {
    tokens: Vec<String>,
}

impl ClassList {
    /// Split a `class` attribute value
    #[must_use]
    pub fn parse(value: &str) -> Self {
        Self {
            tokens: value.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Whole-token membership (`bar` does not match `barOther`)
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Append `token` unless already present; true if it was appended
    pub fn ensure(&mut self, token: &str) -> bool {
        if self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }
}

impl fmt::Display for ClassList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// Round to `places` decimals, ties to even on the exact binary value
/// (`0.125` becomes `0.12`)
#[must_use]
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}

/// Render a number for CSS output; integral values keep a `.0` suffix
/// (`2.0`, `0.0`) so previously generated files stay byte-identical.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
