//! Animation pipeline: detect bars, derive their parameters, rewrite the
//! document and persist it next to a backup of the original.
//!
//! Every call works only on its own path and options. Calls for distinct
//! paths may run concurrently; calls racing on the same path must be
//! serialized by the caller.

use crate::bar::BarAnimation;
use crate::detect::{detect_bars, rects_mut, DetectionTier};
use crate::error::{Result, SvgError};
use crate::keyframes::generated_css;
use crate::options::AnimationOptions;
use crate::parser::{parse_svg, parse_svg_str, Element, Node, SvgDocument};
use crate::stylesheet::regenerate;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to the source path for the pre-mutation copy
pub const BACKUP_SUFFIX: &str = ".bak";

/// What one animation run did
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationReport {
    /// Detection tier that produced the candidates
    pub tier: DetectionTier,
    /// Animated bars in detection order
    pub bars: Vec<BarAnimation>,
    /// Candidates left alone for lack of a numeric `height` or `y`
    pub skipped: usize,
}

impl AnimationReport {
    /// Number of rects detection returned
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> usize {
        self.bars.len() + self.skipped
    }
}

/// Outcome of [`animate_svg`]
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedSvg {
    /// Rewritten file
    pub path: PathBuf,
    /// Copy of the file as it was before this run
    pub backup_path: PathBuf,
    /// Details of the transformation
    pub report: AnimationReport,
}

/// `<path>.bak`
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Animate the bars of an in-memory document.
///
/// Rects without a numeric `height`/`y` keep their detection index (so
/// later bars are numbered the same with or without them) but are not
/// touched. The style block is created as the first child element of the root when
/// missing, and its generated rules are replaced rather than appended to.
pub fn animate_document(doc: &mut SvgDocument, options: &AnimationOptions) -> AnimationReport {
    let detection = detect_bars(rects_mut(&mut doc.root), options);
    let tier = detection.tier;
    let mut bars = Vec::with_capacity(detection.bars.len());
    let mut skipped = 0;

    for (index, element) in detection.bars.into_iter().enumerate() {
        let Some(bar) = BarAnimation::for_element(index, element, options.delay_step) else {
            log::debug!("skipping bar candidate {index}: no numeric height or y");
            skipped += 1;
            continue;
        };
        bar.apply_to(element, options.duration);
        bars.push(bar);
    }

    let css = generated_css(&bars);
    let style = ensure_style_element(&mut doc.root);
    let updated = regenerate(&style.text(), &css);
    style.set_text(&updated);

    AnimationReport {
        tier,
        bars,
        skipped,
    }
}

/// The root's `<style>` child, created if absent as the first child node
/// after the root's leading text
fn ensure_style_element(root: &mut Element) -> &mut Element {
    let existing = root
        .children
        .iter()
        .position(|node| matches!(node, Node::Element(el) if el.is_svg("style")));

    let index = existing.unwrap_or_else(|| {
        let name = root
            .prefix()
            .map_or_else(|| "style".to_string(), |prefix| format!("{prefix}:style"));
        let style = Element::new(name, root.namespace());
        let index = root
            .children
            .iter()
            .position(|node| !matches!(node, Node::Text(_) | Node::CData(_)))
            .unwrap_or(root.children.len());
        root.children.insert(index, Node::Element(style));
        index
    });

    match &mut root.children[index] {
        Node::Element(style) => style,
        _ => unreachable!("style index always refers to an element"),
    }
}

/// Animate SVG markup held in memory
///
/// # Errors
///
/// Returns `SvgError::InvalidOptions` for unusable options, and parse errors
/// for malformed markup.
pub fn animate_svg_str(
    content: &str,
    options: &AnimationOptions,
) -> Result<(String, AnimationReport)> {
    options.validate()?;
    let mut doc = parse_svg_str(content)?;
    let report = animate_document(&mut doc, options);
    Ok((doc.to_svg_string()?, report))
}

/// Animate the SVG at `path` in place.
///
/// The original bytes are copied to `<path>.bak` before the rewritten
/// document replaces them. Nothing is written when the file is missing,
/// cannot be parsed, or the backup copy fails.
///
/// # Errors
///
/// - `SvgError::NotFound` if `path` does not exist
/// - `SvgError::InvalidOptions` for unusable options
/// - `SvgError::XmlError` / `SvgError::InvalidStructure` for malformed markup
/// - `SvgError::Backup` if the backup copy fails
/// - `SvgError::Io` if reading or the final write fails
pub fn animate_svg(path: &Path, options: &AnimationOptions) -> Result<AnimatedSvg> {
    if !path.exists() {
        return Err(SvgError::NotFound(path.to_path_buf()));
    }
    options.validate()?;
    log::info!("Target path: {}", path.display());

    let mut doc = parse_svg(path)?;
    let report = animate_document(&mut doc, options);
    let bytes = doc.to_bytes()?;

    let backup = backup_path(path);
    fs::copy(path, &backup).map_err(|source| SvgError::Backup {
        path: backup.clone(),
        source,
    })?;
    log::info!("Backup file created at {}", backup.display());

    fs::write(path, bytes)?;
    log::info!(
        "Animated SVG written to {} ({} bars)",
        path.display(),
        report.bars.len()
    );

    Ok(AnimatedSvg {
        path: path.to_path_buf(),
        backup_path: backup,
        report,
    })
}

/// Animate `path` with the given duration and stagger step, returning the
/// backup path
///
/// # Errors
///
/// Same as [`animate_svg`].
pub fn add_bar_animations(path: &Path, duration: f64, delay_step: f64) -> Result<PathBuf> {
    let options = AnimationOptions::new()
        .with_duration(duration)
        .with_delay_step(delay_step);
    animate_svg(path, &options).map(|animated| animated.backup_path)
}
