//! Bar animations for scannable-code SVG images
//!
//! A scan code is a row of vertical bars drawn as `<rect>` elements. This
//! crate finds those bars and gives each one a staggered CSS "wiggle": a
//! `@keyframes wiggle-{i}` rule that scales the bar vertically around its
//! center, plus inline animation properties pointing at it.
//!
//! ## Pipeline
//!
//! 1. **Detect** - rects with the `bar` class token, or, when none are
//!    tagged, rects no larger than 50 x 200
//! 2. **Parametrize** - stagger delay, scale stops and the translate that
//!    keeps each bar centered
//! 3. **Rewrite** - classes, inline style, and a regenerated `<style>` block
//! 4. **Persist** - `<path>.bak` copy of the original, then the new document
//!
//! Running the animator on its own output regenerates the same style block
//! instead of stacking new rules on top of the old ones.
//!
//! ## Examples
//!
//! Animate a file in place:
//!
//! ```rust,no_run
//! use scancode_svg::{animate_svg, AnimationOptions};
//! use std::path::Path;
//!
//! let animated = animate_svg(Path::new("code.svg"), &AnimationOptions::default())?;
//! println!("{} bars, backup at {}", animated.report.bars.len(), animated.backup_path.display());
//! # Ok::<(), scancode_svg::SvgError>(())
//! ```
//!
//! Animate markup held in memory:
//!
//! ```rust
//! use scancode_svg::{animate_svg_str, AnimationOptions};
//!
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect class="bar" y="0" height="20" width="4"/></svg>"#;
//! let (out, report) = animate_svg_str(svg, &AnimationOptions::default())?;
//! assert_eq!(report.bars.len(), 1);
//! assert!(out.contains("@keyframes wiggle-0"));
//! # Ok::<(), scancode_svg::SvgError>(())
//! ```

pub mod animator;
pub mod bar;
pub mod detect;
pub mod error;
pub mod keyframes;
pub mod options;
pub mod parser;
pub mod stylesheet;

// Re-export main types
pub use animator::{
    add_bar_animations, animate_document, animate_svg, animate_svg_str, backup_path,
    AnimatedSvg, AnimationReport, BACKUP_SUFFIX,
};
pub use bar::BarAnimation;
pub use detect::DetectionTier;
pub use error::{Result, SvgError};
pub use options::AnimationOptions;
pub use parser::{parse_svg, parse_svg_str, Element, SvgDocument};
