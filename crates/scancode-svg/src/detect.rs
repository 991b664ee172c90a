//! Bar detection
//!
//! Bars are found in two tiers. Rects tagged with the `bar` class token win;
//! only when none are tagged do narrow, short rects (the code's bars, as
//! opposed to its background) get picked up by their dimensions.

use crate::bar::{ClassList, BAR_CLASS};
use crate::options::AnimationOptions;
use crate::parser::{Element, Node};

/// How bars were recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionTier {
    /// Rects carrying the `bar` class token
    Explicit,
    /// Rects small enough to be bars, used when nothing is tagged
    Dimensions,
}

/// Result of bar detection, in document order
#[derive(Debug)]
pub struct Detection<'a> {
    /// Tier that produced the bars
    pub tier: DetectionTier,
    /// Candidate bars
    pub bars: Vec<&'a mut Element>,
}

/// All `<rect>` descendants of `root` in document order
pub fn rects_mut(root: &mut Element) -> Vec<&mut Element> {
    let mut out = Vec::new();
    collect_rects(root, &mut out);
    out
}

fn collect_rects<'a>(element: &'a mut Element, out: &mut Vec<&'a mut Element>) {
    for node in &mut element.children {
        if let Node::Element(child) = node {
            // <rect> is not a container; nothing below it is searched
            if child.is_svg("rect") {
                out.push(child);
            } else {
                collect_rects(child, out);
            }
        }
    }
}

/// True when the `class` attribute contains the `bar` token
#[must_use]
pub fn has_bar_class(element: &Element) -> bool {
    element
        .attr("class")
        .is_some_and(|class| ClassList::parse(class).contains(BAR_CLASS))
}

/// True when both dimensions are numeric and within the bar thresholds
/// (inclusive)
#[must_use]
pub fn fits_bar_dimensions(element: &Element, options: &AnimationOptions) -> bool {
    let (Some(width), Some(height)) = (element.attr_f64("width"), element.attr_f64("height"))
    else {
        return false;
    };
    !(width > options.max_bar_width || height > options.max_bar_height)
}

/// Pick the bars out of `rects`
pub fn detect_bars<'a>(rects: Vec<&'a mut Element>, options: &AnimationOptions) -> Detection<'a> {
    if rects.iter().any(|rect| has_bar_class(rect)) {
        let bars: Vec<_> = rects.into_iter().filter(|rect| has_bar_class(rect)).collect();
        log::debug!("found {} rects with the '{BAR_CLASS}' class", bars.len());
        return Detection {
            tier: DetectionTier::Explicit,
            bars,
        };
    }

    let bars: Vec<_> = rects
        .into_iter()
        .filter(|rect| fits_bar_dimensions(rect, options))
        .collect();
    log::info!(
        "Auto-detected {} bar rects (no '{BAR_CLASS}' class present)",
        bars.len()
    );
    Detection {
        tier: DetectionTier::Dimensions,
        bars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_svg_str;

    fn ids(detection: &Detection<'_>) -> Vec<String> {
        detection
            .bars
            .iter()
            .map(|el| el.attr("id").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_explicit_tier_matches_whole_tokens() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
    <rect id="bg" width="400" height="100"/>
    <rect id="a" class="bar bar-3" width="6" height="20"/>
    <rect id="b" class="barOther" width="6" height="20"/>
    <g><rect id="c" class="x bar" width="6" height="30"/></g>
</svg>"#;
        let mut doc = parse_svg_str(svg).expect("Failed to parse SVG");
        let detection = detect_bars(rects_mut(&mut doc.root), &AnimationOptions::default());

        assert_eq!(detection.tier, DetectionTier::Explicit);
        assert_eq!(ids(&detection), vec!["a", "c"]);
    }

    #[test]
    fn test_dimension_fallback() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg">
    <rect id="bg" width="400" height="100"/>
    <rect id="edge" width="50" height="200"/>
    <rect id="tall" width="10" height="200.5"/>
    <rect id="units" width="10px" height="20"/>
    <rect id="nowidth" height="20"/>
    <rect id="ok" width="6" height="24"/>
</svg>"#;
        let mut doc = parse_svg_str(svg).expect("Failed to parse SVG");
        let detection = detect_bars(rects_mut(&mut doc.root), &AnimationOptions::default());

        assert_eq!(detection.tier, DetectionTier::Dimensions);
        assert_eq!(ids(&detection), vec!["edge", "ok"]);
    }

    #[test]
    fn test_custom_thresholds() {
        let svg = r#"<svg><rect id="a" width="60" height="20"/><rect id="b" width="6" height="20"/></svg>"#;
        let mut doc = parse_svg_str(svg).expect("Failed to parse SVG");
        let options = AnimationOptions {
            max_bar_width: 5.0,
            ..AnimationOptions::default()
        };
        let detection = detect_bars(rects_mut(&mut doc.root), &options);

        assert!(detection.bars.is_empty());
    }

    #[test]
    fn test_no_rects() {
        let mut doc = parse_svg_str("<svg><circle r=\"4\"/></svg>").expect("Failed to parse SVG");
        let detection = detect_bars(rects_mut(&mut doc.root), &AnimationOptions::default());

        assert_eq!(detection.tier, DetectionTier::Dimensions);
        assert!(detection.bars.is_empty());
    }
}
