//! End-to-end tests for animating SVG files on disk

use scancode_svg::{
    add_bar_animations, animate_svg, backup_path, parse_svg_str, AnimationOptions,
    DetectionTier, SvgError,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TAGGED: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="640" height="160" viewBox="0 0 400 100">
  <rect x="0" y="0" width="400" height="100" fill="#1DB954"/>
  <rect class="bar" x="100" y="40" width="8" height="20" rx="4" fill="#000"/>
  <rect class="bar" x="112" y="25" width="8" height="50" rx="4" fill="#000"/>
  <rect class="bar" x="124" y="0" width="8" height="100" rx="4" fill="#000" style="animation-delay:0.42s"/>
  <rect class="bar" x="136" y="35" width="8" height="30" rx="4" fill="#000">
    <animate attributeName="height" values="30;40;30" dur="1s" repeatCount="indefinite"/>
    <animate attributeName="y" values="35;30;35" dur="1s" repeatCount="indefinite"/>
  </rect>
  <g transform="translate(20 20)"><path d="M0 0h60v60H0z" fill="#000"/></g>
</svg>
"##;

const UNTAGGED: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 100">
  <rect x="0" y="0" width="400" height="100" fill="#000"/>
  <rect x="100" y="40" width="8" height="20" fill="#fff"/>
  <rect x="112" y="0" width="50" height="200" fill="#fff"/>
  <rect x="124" y="10" width="51" height="80" fill="#fff"/>
  <rect x="136" width="8" height="30" fill="#fff"/>
  <rect x="148" y="20" width="8" height="60" fill="#fff"/>
</svg>"##;

fn write_svg(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test SVG");
    path
}

fn style_text(path: &Path) -> String {
    let content = fs::read_to_string(path).expect("Failed to read output");
    let doc = parse_svg_str(&content).expect("Failed to parse output");
    let style = doc
        .root
        .child_elements()
        .find(|el| el.is_svg("style"))
        .expect("Expected a style element");
    style.text()
}

fn keyframe_names(css: &str) -> Vec<String> {
    css.match_indices("@keyframes ")
        .map(|(i, _)| {
            css[i + "@keyframes ".len()..]
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[test]
fn test_rerun_regenerates_identical_style() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "code.svg", TAGGED);
    let options = AnimationOptions::default();

    animate_svg(&path, &options).expect("first run");
    let first = style_text(&path);
    let first_file = fs::read_to_string(&path).unwrap();

    animate_svg(&path, &options).expect("second run");
    let second = style_text(&path);

    assert_eq!(first, second);
    assert_eq!(keyframe_names(&second).len(), 5);
    // The backup of the second run is the output of the first
    assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), first_file);
}

#[test]
fn test_one_keyframes_rule_per_tagged_bar() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "code.svg", TAGGED);

    let animated = animate_svg(&path, &AnimationOptions::default()).expect("Failed to animate");
    assert_eq!(animated.report.tier, DetectionTier::Explicit);
    assert_eq!(animated.report.bars.len(), 4);

    let names = keyframe_names(&style_text(&path));
    assert_eq!(
        names,
        vec!["wiggle", "wiggle-0", "wiggle-1", "wiggle-2", "wiggle-3"]
    );

    let content = fs::read_to_string(&path).unwrap();
    for i in 0..4 {
        assert!(content.contains(&format!(r#"class="bar bar-{i}""#)));
        assert!(content.contains(&format!("animation-name:wiggle-{i};")));
    }
}

#[test]
fn test_dimension_fallback_selects_small_rects() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "plain.svg", UNTAGGED);

    let animated = animate_svg(&path, &AnimationOptions::default()).expect("Failed to animate");
    let report = &animated.report;

    // 8x20, 50x200 (boundary), 8x30 (no y), 8x60; the 400 and 51 wide rects are background
    assert_eq!(report.tier, DetectionTier::Dimensions);
    assert_eq!(report.candidates(), 4);
    assert_eq!(report.skipped, 1);
    let indices: Vec<_> = report.bars.iter().map(|bar| bar.index).collect();
    assert_eq!(indices, vec![0, 1, 3]);

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(r##"<rect x="0" y="0" width="400" height="100" fill="#000"/>"##));
    assert!(content.contains(r##"<rect x="124" y="10" width="51" height="80" fill="#fff"/>"##));
    assert!(content.contains(r##"<rect x="136" width="8" height="30" fill="#fff"/>"##));
}

#[test]
#[allow(clippy::float_cmp)]
fn test_declared_delay_survives() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "code.svg", TAGGED);

    let animated = animate_svg(&path, &AnimationOptions::default()).expect("Failed to animate");
    let delays: Vec<_> = animated.report.bars.iter().map(|bar| bar.delay).collect();
    assert_eq!(delays, vec![0.0, 0.06, 0.42, 0.18]);

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(
        "style=\"animation-delay:0.42s;animation-name:wiggle-2;animation-duration:2.5s;"
    ));
    assert!(content.contains("animation-delay:0.42s;animation-direction:alternate;"));
}

#[test]
fn test_translate_compensation_in_output() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "code.svg", TAGGED);

    animate_svg(&path, &AnimationOptions::default()).expect("Failed to animate");
    let css = style_text(&path);

    // wiggle-2 is the 100px bar
    let start = css.find("@keyframes wiggle-2 {").expect("wiggle-2");
    let block = &css[start..];
    let block = &block[..=block.find("\n}").expect("end of block") + 1];
    assert!(block.contains(" 25% { transform: translateY(-2.0px) scaleY(1.04); }"));
    assert!(block.contains(" 50% { transform: translateY(1.0px) scaleY(0.98); }"));
    assert!(block.contains(" 75% { transform: translateY(-1.0px) scaleY(1.02); }"));
}

#[test]
fn test_smil_animations_removed() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "code.svg", TAGGED);

    animate_svg(&path, &AnimationOptions::default()).expect("Failed to animate");
    let content = fs::read_to_string(&path).unwrap();

    assert!(!content.contains("<animate"));
    assert!(content.contains(r##"<path d="M0 0h60v60H0z" fill="#000"/>"##));
}

#[test]
fn test_backup_matches_original() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "code.svg", TAGGED);

    let backup = add_bar_animations(&path, 2.5, 0.06).expect("Failed to animate");

    assert_eq!(backup, dir.path().join("code.svg.bak"));
    assert_eq!(fs::read_to_string(&backup).unwrap(), TAGGED);
    assert_ne!(fs::read_to_string(&path).unwrap(), TAGGED);
}

#[test]
fn test_output_keeps_namespaces_and_header() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "code.svg", TAGGED);

    animate_svg(&path, &AnimationOptions::default()).expect("Failed to animate");
    let content = fs::read_to_string(&path).unwrap();

    assert!(content.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<svg "));
    assert!(content.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
    assert!(content.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
}

#[test]
fn test_custom_duration_and_step() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "plain.svg", UNTAGGED);

    add_bar_animations(&path, 4.0, 0.1).expect("Failed to animate");
    let content = fs::read_to_string(&path).unwrap();

    assert!(content.contains("animation-duration:4.0s;"));
    assert!(content.contains("animation-delay:0.3s;"));
}

#[test]
fn test_missing_file_has_no_side_effects() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.svg");

    let result = animate_svg(&path, &AnimationOptions::default());

    assert!(matches!(result, Err(SvgError::NotFound(_))));
    assert!(!backup_path(&path).exists());
    assert!(!path.exists());
}

#[test]
fn test_malformed_file_untouched() {
    let dir = TempDir::new().unwrap();
    let broken = "<svg xmlns=\"http://www.w3.org/2000/svg\"><rect class=\"bar\"></svg>";
    let path = write_svg(&dir, "broken.svg", broken);

    let result = animate_svg(&path, &AnimationOptions::default());

    assert!(matches!(
        result,
        Err(SvgError::XmlError(_) | SvgError::InvalidStructure(_))
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), broken);
    assert!(!backup_path(&path).exists());
}

#[test]
fn test_backup_failure_leaves_original() {
    let dir = TempDir::new().unwrap();
    let path = write_svg(&dir, "code.svg", TAGGED);
    // A directory where the backup file should go makes the copy fail
    fs::create_dir(backup_path(&path)).unwrap();

    let result = animate_svg(&path, &AnimationOptions::default());

    assert!(matches!(result, Err(SvgError::Backup { .. })));
    assert_eq!(fs::read_to_string(&path).unwrap(), TAGGED);
}

#[test]
fn test_distinct_paths_concurrently() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<_> = (0..8)
        .map(|i| write_svg(&dir, &format!("code-{i}.svg"), TAGGED))
        .collect();

    std::thread::scope(|scope| {
        for path in &paths {
            scope.spawn(move || {
                animate_svg(path, &AnimationOptions::default()).expect("Failed to animate");
            });
        }
    });

    let expected = style_text(&paths[0]);
    for path in &paths[1..] {
        assert_eq!(style_text(path), expected);
    }
}
