use serde::{Deserialize, Deserializer, Serialize};

/// Below this value a plot is considered to have zero spread ("one column"
/// histogram).
pub const ZERO_STD_THRESHOLD: f64 = 1e-6;

// ---------------------------------------------------------------------------
// PlotRecord – one image of a use case
// ---------------------------------------------------------------------------

/// Metadata derived for a single `.svg` plot. Never stored; rebuilt from disk
/// on each request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRecord {
    /// Path relative to the plots root: `<use_case>/<file_name>`.
    pub image_path: String,
    pub file_name: String,
    pub use_case: String,
    pub has_outlier: bool,
    pub standard_deviation: f64,
    /// Zero-spread verdict from a sidecar `one_col` flag. Overrides the
    /// threshold test when the sidecar gives no explicit `std`.
    pub zero_spread: Option<bool>,
}

impl PlotRecord {
    /// Whether the plotted data has (numerically) no spread.
    pub fn is_zero_std(&self) -> bool {
        self.zero_spread
            .unwrap_or(self.standard_deviation < ZERO_STD_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// PlotMetadata – optional `<stem>.json` sidecar
// ---------------------------------------------------------------------------

/// Sidecar record written next to each plot by the generator.
///
/// ```json
/// { "name": "host-a[3]", "n_outliers": 2, "one_col": 0, "aggregation": "host-a" }
/// ```
///
/// Only the fields below are read, all optional; whatever is missing falls
/// back to the file name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlotMetadata {
    #[serde(default)]
    pub n_outliers: Option<u64>,
    /// Written as `0`/`1` by the generator, accepted as a bool too.
    #[serde(default, deserialize_with = "flag_from_int_or_bool")]
    pub one_col: Option<bool>,
    #[serde(default)]
    pub std: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrBool {
    Int(i64),
    Bool(bool),
}

fn flag_from_int_or_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<IntOrBool> = Option::deserialize(deserializer)?;
    Ok(raw.map(|v| match v {
        IntOrBool::Int(i) => i != 0,
        IntOrBool::Bool(b) => b,
    }))
}

impl PlotMetadata {
    pub fn has_outlier(&self) -> Option<bool> {
        self.n_outliers.map(|n| n > 0)
    }

    /// An explicit `std` wins; a set `one_col` flag implies zero spread.
    pub fn standard_deviation(&self) -> Option<f64> {
        match (self.std, self.one_col) {
            (Some(std), _) => Some(std),
            (None, Some(true)) => Some(0.0),
            _ => None,
        }
    }

    /// `one_col` verdict, unless an explicit `std` makes it redundant.
    pub fn zero_spread(&self) -> Option<bool> {
        match self.std {
            Some(_) => None,
            None => self.one_col,
        }
    }
}

// ---------------------------------------------------------------------------
// PageResult – one page of filtered records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub records: Vec<PlotRecord>,
    /// Always at least 1, even when nothing matched.
    pub total_pages: usize,
    /// Page actually returned, after clamping.
    pub page_number: usize,
    /// Position of `records[0]` in the filtered sequence.
    pub offset: usize,
}

/// Wire form of a single plot in the `/page` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotEntry {
    pub img: String,
    pub n_outliers: bool,
    pub one_col: bool,
}

impl From<&PlotRecord> for PlotEntry {
    fn from(record: &PlotRecord) -> Self {
        Self {
            img: record.image_path.clone(),
            n_outliers: record.has_outlier,
            one_col: record.is_zero_std(),
        }
    }
}

/// Wire form of the `/page` response. `plots` is keyed by position in the
/// filtered sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse {
    pub n_pages: usize,
    pub plots: std::collections::BTreeMap<usize, PlotEntry>,
}

impl From<&PageResult> for PageResponse {
    fn from(page: &PageResult) -> Self {
        let plots = page
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (page.offset + i, PlotEntry::from(record)))
            .collect();
        Self {
            n_pages: page.total_pages,
            plots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_accepts_integer_and_bool_flags() {
        let meta: PlotMetadata =
            serde_json::from_str(r#"{"name": "x", "n_outliers": 3, "one_col": 1, "aggregation": "x"}"#).unwrap();
        assert_eq!(meta.has_outlier(), Some(true));
        assert_eq!(meta.standard_deviation(), Some(0.0));
        assert_eq!(meta.zero_spread(), Some(true));

        let meta: PlotMetadata = serde_json::from_str(r#"{"one_col": false}"#).unwrap();
        assert_eq!(meta.has_outlier(), None);
        assert_eq!(meta.standard_deviation(), None);
        assert_eq!(meta.zero_spread(), Some(false));
    }

    #[test]
    fn test_explicit_std_wins_over_one_col() {
        let meta: PlotMetadata =
            serde_json::from_str(r#"{"one_col": 1, "std": 2.5, "extra": [1, 2]}"#).unwrap();
        assert_eq!(meta.standard_deviation(), Some(2.5));
        assert_eq!(meta.zero_spread(), None);
    }

    #[test]
    fn test_zero_spread_verdict_overrides_threshold() {
        let mut record = PlotRecord {
            image_path: "sql/*host-a[1].svg".to_string(),
            file_name: "*host-a[1].svg".to_string(),
            use_case: "sql".to_string(),
            has_outlier: true,
            standard_deviation: 0.0,
            zero_spread: Some(false),
        };
        assert!(!record.is_zero_std());
        record.zero_spread = None;
        assert!(record.is_zero_std());
        record.standard_deviation = ZERO_STD_THRESHOLD;
        assert!(!record.is_zero_std());
    }

    #[test]
    fn test_page_response_keys_by_filtered_position() {
        let record = PlotRecord {
            image_path: "foo/a_0.0.svg".to_string(),
            file_name: "a_0.0.svg".to_string(),
            use_case: "foo".to_string(),
            has_outlier: false,
            standard_deviation: 0.0,
            zero_spread: None,
        };
        let page = PageResult {
            records: vec![record],
            total_pages: 3,
            page_number: 2,
            offset: 4,
        };
        let json = serde_json::to_value(PageResponse::from(&page)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "n_pages": 3,
                "plots": { "4": { "img": "foo/a_0.0.svg", "n_outliers": false, "one_col": true } }
            })
        );
    }
}
