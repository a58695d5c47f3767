use std::collections::BTreeSet;
use std::path::Path;

use super::model::{PlotMetadata, PlotRecord};
use crate::error::{BrowseError, Result};

/// Directory names under the plots root that are never use cases.
pub const RESERVED_NAMES: &[&str] = &["static", ".", ".."];

/// Only files with this suffix are listed as plots.
pub const PLOT_SUFFIX: &str = ".svg";

/// Sidecar metadata extension (`<stem>.json`).
pub const SIDECAR_EXTENSION: &str = "json";

/// Substring marking a plot whose data contains at least one outlier.
pub const OUTLIER_MARKER: &str = "outlier";

/// Prefix the plot generator puts in front of plots with outliers.
pub const OUTLIER_PREFIX: char = '*';

// ---------------------------------------------------------------------------
// Use cases
// ---------------------------------------------------------------------------

/// Names of every use-case directory under `root`, sorted.
///
/// Reserved and hidden names, plain files and non-UTF-8 names are skipped.
pub fn list_use_cases(root: &Path) -> Result<BTreeSet<String>> {
    let entries = std::fs::read_dir(root).map_err(|e| BrowseError::io(root, e))?;

    let mut use_cases = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| BrowseError::io(root, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') || RESERVED_NAMES.contains(&name.as_str()) {
            continue;
        }
        // Follows symlinks so linked use cases show up too.
        if entry.path().is_dir() {
            use_cases.insert(name);
        }
    }
    Ok(use_cases)
}

/// Fail with [`BrowseError::NotFound`] unless `use_case` is one of the
/// enumerated directories. Matching against the listing also rejects any
/// path-like input (`..`, `a/b`).
pub fn ensure_use_case(root: &Path, use_case: &str) -> Result<()> {
    if list_use_cases(root)?.contains(use_case) {
        Ok(())
    } else {
        Err(BrowseError::NotFound(use_case.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Plots
// ---------------------------------------------------------------------------

/// Every `.svg` plot of `use_case`, sorted by file name.
pub fn list_plots(root: &Path, use_case: &str) -> Result<Vec<PlotRecord>> {
    ensure_use_case(root, use_case)?;

    let dir = root.join(use_case);
    let entries = std::fs::read_dir(&dir).map_err(|e| BrowseError::io(&dir, e))?;

    let mut file_names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BrowseError::io(&dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.ends_with(PLOT_SUFFIX) && entry.path().is_file() {
            file_names.push(name);
        }
    }
    file_names.sort();

    Ok(file_names
        .into_iter()
        .map(|name| build_record(&dir, use_case, name))
        .collect())
}

fn build_record(dir: &Path, use_case: &str, file_name: String) -> PlotRecord {
    let sidecar = read_sidecar(&dir.join(&file_name));

    let has_outlier = sidecar
        .as_ref()
        .and_then(PlotMetadata::has_outlier)
        .unwrap_or_else(|| has_outlier_marker(&file_name));
    let standard_deviation = sidecar
        .as_ref()
        .and_then(PlotMetadata::standard_deviation)
        .unwrap_or_else(|| std_from_file_name(&file_name));
    let zero_spread = sidecar.as_ref().and_then(PlotMetadata::zero_spread);

    PlotRecord {
        image_path: format!("{use_case}/{file_name}"),
        file_name,
        use_case: use_case.to_string(),
        has_outlier,
        standard_deviation,
        zero_spread,
    }
}

/// Whether `file_name` may be served as a plot: a `.svg`, not hidden, and a
/// single path component.
pub fn is_plot_file_name(file_name: &str) -> bool {
    file_name.ends_with(PLOT_SUFFIX)
        && !file_name.starts_with('.')
        && !file_name.contains(['/', '\\'])
}

// ---------------------------------------------------------------------------
// Metadata sources
// ---------------------------------------------------------------------------

/// Read the sidecar of `plot_path`, if there is one.
///
/// A sidecar that cannot be read or parsed is ignored with a warning; the
/// record then falls back to the file name.
pub fn read_sidecar(plot_path: &Path) -> Option<PlotMetadata> {
    let path = plot_path.with_extension(SIDECAR_EXTENSION);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            log::warn!("Ignoring unreadable sidecar {}: {e}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(meta) => Some(meta),
        Err(e) => {
            log::warn!("Ignoring malformed sidecar {}: {e}", path.display());
            None
        }
    }
}

pub fn has_outlier_marker(file_name: &str) -> bool {
    file_name.starts_with(OUTLIER_PREFIX) || file_name.contains(OUTLIER_MARKER)
}

/// Standard deviation encoded in a plot's file name.
///
/// The value is the second-to-last `_`-delimited token of the name
/// (`cpu_0.25_host.svg`). Failing that, the last parenthesised value
/// written by the generator (`*host-a[1](0.53).svg.svg`), then the last token
/// of the stem (`a_outlier_0.5.svg`). Anything else is 0.
pub fn std_from_file_name(file_name: &str) -> f64 {
    let tokens: Vec<&str> = file_name.split('_').collect();
    let second_to_last = tokens.len().checked_sub(2).map(|i| tokens[i]);

    let stem = file_name.strip_suffix(PLOT_SUFFIX).unwrap_or(file_name);
    let parenthesised = stem
        .rfind('(')
        .and_then(|open| stem[open + 1..].split_once(')'))
        .map(|(inner, _)| inner);
    let last_of_stem = stem.rsplit('_').next();

    for token in second_to_last
        .into_iter()
        .chain(parenthesised)
        .chain(last_of_stem)
    {
        if let Ok(value) = token.trim().parse::<f64>() {
            if value.is_finite() {
                return value;
            }
        }
    }

    log::debug!("No standard deviation token in {file_name:?}, using 0.0");
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "<svg/>").unwrap();
    }

    fn plots_root() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for dir in ["foo", "bar", "static", ".cache"] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
        }
        touch(tmp.path(), "index.php");
        tmp
    }

    #[test]
    fn test_use_cases_skip_reserved_hidden_and_files() {
        let tmp = plots_root();
        let names: Vec<String> = list_use_cases(tmp.path()).unwrap().into_iter().collect();
        assert_eq!(names, vec!["bar".to_string(), "foo".to_string()]);
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = list_use_cases(&tmp.path().join("nope")).unwrap_err();
        assert!(matches!(err, BrowseError::Io { .. }));
    }

    #[test]
    fn test_list_plots_only_svg_sorted() {
        let tmp = plots_root();
        let foo = tmp.path().join("foo");
        for name in ["b_0.0.svg", "a_outlier_0.5.svg", "notes.txt", "b_0.0.json", "c.svg.bak"] {
            touch(&foo, name);
        }
        fs::create_dir(foo.join("nested.svg")).unwrap();

        let plots = list_plots(tmp.path(), "foo").unwrap();
        let names: Vec<&str> = plots.iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["a_outlier_0.5.svg", "b_0.0.svg"]);
        assert!(plots.iter().all(|p| p.image_path.ends_with(PLOT_SUFFIX)));
        assert_eq!(plots[0].image_path, "foo/a_outlier_0.5.svg");
        assert_eq!(plots[0].use_case, "foo");
    }

    #[test]
    fn test_unknown_or_reserved_use_case_is_not_found() {
        let tmp = plots_root();
        for name in ["missing", "static", "..", "foo/../bar", ".cache"] {
            let err = list_plots(tmp.path(), name).unwrap_err();
            assert!(matches!(err, BrowseError::NotFound(_)), "{name}");
        }
    }

    #[test]
    fn test_metadata_from_file_name() {
        let tmp = plots_root();
        let foo = tmp.path().join("foo");
        for name in ["a_outlier_0.5.svg", "b_0.0.svg", "*host-a_1.5_x.svg", "garbage.svg"] {
            touch(&foo, name);
        }
        let plots = list_plots(tmp.path(), "foo").unwrap();
        let by_name = |n: &str| plots.iter().find(|p| p.file_name == n).unwrap().clone();

        let a = by_name("a_outlier_0.5.svg");
        assert!(a.has_outlier);
        assert_eq!(a.standard_deviation, 0.5);

        let b = by_name("b_0.0.svg");
        assert!(!b.has_outlier);
        assert!(b.is_zero_std());

        let starred = by_name("*host-a_1.5_x.svg");
        assert!(starred.has_outlier);
        assert_eq!(starred.standard_deviation, 1.5);

        let garbage = by_name("garbage.svg");
        assert!(!garbage.has_outlier);
        assert_eq!(garbage.standard_deviation, 0.0);
    }

    #[test]
    fn test_sidecar_overrides_file_name() {
        let tmp = plots_root();
        let foo = tmp.path().join("foo");
        touch(&foo, "a_outlier_0.5.svg");
        fs::write(foo.join("a_outlier_0.5.json"), r#"{"n_outliers": 0, "one_col": 1}"#).unwrap();
        touch(&foo, "b_0.0.svg");
        fs::write(foo.join("b_0.0.json"), r#"{"n_outliers": 4}"#).unwrap();

        let plots = list_plots(tmp.path(), "foo").unwrap();
        assert!(!plots[0].has_outlier);
        assert_eq!(plots[0].standard_deviation, 0.0);
        // std not in the sidecar: taken from the name.
        assert!(plots[1].has_outlier);
        assert_eq!(plots[1].standard_deviation, 0.0);
    }

    #[test]
    fn test_malformed_sidecar_falls_back() {
        let tmp = plots_root();
        let foo = tmp.path().join("foo");
        touch(&foo, "a_outlier_0.5.svg");
        fs::write(foo.join("a_outlier_0.5.json"), "{not json").unwrap();

        let plots = list_plots(tmp.path(), "foo").unwrap();
        assert!(plots[0].has_outlier);
        assert_eq!(plots[0].standard_deviation, 0.5);
    }

    #[test]
    fn test_std_token_rules() {
        assert_eq!(std_from_file_name("cpu_0.25_host.svg"), 0.25);
        assert_eq!(std_from_file_name("b_0.0.svg"), 0.0);
        assert_eq!(std_from_file_name("x_3e-7.svg"), 3e-7);
        assert_eq!(std_from_file_name("x_nan_y.svg"), 0.0);
        assert_eq!(std_from_file_name("plain.svg"), 0.0);
        assert_eq!(std_from_file_name(""), 0.0);
        assert_eq!(std_from_file_name("*host-a[1](0.53).svg.svg"), 0.53);
        assert_eq!(std_from_file_name("db_host[2](1e-09).svg.svg"), 1e-9);
    }

    #[test]
    fn test_sidecar_one_col_keeps_spread_plot_visible() {
        let tmp = plots_root();
        let foo = tmp.path().join("foo");
        // Generator output with no std in the name.
        touch(&foo, "*host-a[1].svg.svg");
        fs::write(foo.join("*host-a[1].svg.json"), r#"{"n_outliers": 2, "one_col": 0}"#).unwrap();
        touch(&foo, "*host-b[1].svg.svg");
        fs::write(foo.join("*host-b[1].svg.json"), r#"{"n_outliers": 0, "one_col": 1}"#).unwrap();

        let plots = list_plots(tmp.path(), "foo").unwrap();
        assert_eq!(plots[0].file_name, "*host-a[1].svg.svg");
        assert!(plots[0].has_outlier);
        assert_eq!(plots[0].zero_spread, Some(false));
        assert!(!plots[0].is_zero_std());
        assert!(plots[1].is_zero_std());
    }

    #[test]
    fn test_generator_name_with_std_and_sidecar() {
        let tmp = plots_root();
        let foo = tmp.path().join("foo");
        touch(&foo, "*host-a[1](0.53).svg.svg");
        fs::write(
            foo.join("*host-a[1](0.53).svg.json"),
            r#"{"name": "*host-a[1](0.53).svg", "n_outliers": 2, "one_col": 0, "aggregation": "*host-a"}"#,
        )
        .unwrap();

        let plots = list_plots(tmp.path(), "foo").unwrap();
        assert!(plots[0].has_outlier);
        assert_eq!(plots[0].standard_deviation, 0.53);
        assert!(!plots[0].is_zero_std());
    }

    #[test]
    fn test_plot_file_name_guard() {
        assert!(is_plot_file_name("a_outlier_0.5.svg"));
        assert!(is_plot_file_name("*host-a[1](0.53).svg.svg"));
        assert!(!is_plot_file_name("notes.txt"));
        assert!(!is_plot_file_name("a_0.5.json"));
        assert!(!is_plot_file_name(".hidden.svg"));
        assert!(!is_plot_file_name("../foo/a.svg"));
        assert!(!is_plot_file_name("..\\a.svg"));
    }
}
