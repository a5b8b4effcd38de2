//! Auxiliary preprocessing bundle stored next to the model.
//!
//! The sidecar is a JSON document describing fitted column selectors. Roles
//! are resolved once, at load time, from the attributes each record carries:
//!
//! | attribute | capability |
//! |-----------|------------|
//! | `support` (array of bools) | support mask |
//! | `mean` | per-column means (marks a scaler) |
//! | `scores`, `k`, `mean` | transform |
//!
//! A record with transform and support is a feature selector; one with
//! support and no mean is a variance selector. Anything that goes wrong while
//! reading the sidecar yields an empty bundle, never an error for the caller.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView2, Axis};
use serde_json::{Map, Value};
use thiserror::Error;

const VARIANCE_KEYS: [&str; 3] = ["variance_selector", "var_selector", "variance_select"];
const SELECTOR_KEYS: [&str; 4] = ["feature_selector", "selector", "select_k_best", "SelectKBest"];
const TRANSFORM_ATTRS: [&str; 3] = ["scores", "k", "mean"];

/// Errors while reading the sidecar; always demoted to an empty bundle.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The file could not be opened.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Sidecar path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not JSON.
    #[error("cannot decode {path}: {source}")]
    Decode {
        /// Sidecar path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A fitted column selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelector {
    support: Vec<bool>,
    transform: bool,
}

/// Failure of a strict selector transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("selector fitted on {expected} columns, got {found}")]
pub struct TransformError {
    /// Mask length.
    pub expected: usize,
    /// Columns offered.
    pub found: usize,
}

impl ColumnSelector {
    /// Selector over `support`; `transform` records whether it can transform.
    pub fn new(support: Vec<bool>, transform: bool) -> Self {
        ColumnSelector { support, transform }
    }

    /// The boolean support mask.
    pub fn support(&self) -> &[bool] {
        &self.support
    }

    /// Whether the selector has a transform capability.
    pub fn has_transform(&self) -> bool {
        self.transform
    }

    /// Indices of the selected columns.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.support
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect()
    }

    /// Number of selected columns.
    pub fn n_selected(&self) -> usize {
        self.support.iter().filter(|&&keep| keep).count()
    }

    /// Transform with strict width: the matrix must have exactly as many
    /// columns as the mask.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, TransformError> {
        if x.ncols() != self.support.len() {
            return Err(TransformError {
                expected: self.support.len(),
                found: x.ncols(),
            });
        }
        Ok(x.select(Axis(1), &self.selected_indices()))
    }

    /// Lenient selection by mask: applied only when the selected indices fit
    /// in the matrix.
    pub fn apply_mask(&self, x: ArrayView2<'_, f64>) -> Option<Array2<f64>> {
        let idx = self.selected_indices();
        if idx.len() > x.ncols() || idx.iter().any(|&i| i >= x.ncols()) {
            return None;
        }
        Some(x.select(Axis(1), &idx))
    }
}

/// The role a sidecar entry plays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectorRole {
    /// Variance-threshold style selector.
    VarianceSelector(ColumnSelector),
    /// Feature (k-best style) selector.
    KBestSelector(ColumnSelector),
    /// Present under a known name but unusable.
    Unknown,
    /// Not present.
    #[default]
    Absent,
}

impl SelectorRole {
    /// The selector, when the role carries one.
    pub fn selector(&self) -> Option<&ColumnSelector> {
        match self {
            SelectorRole::VarianceSelector(s) | SelectorRole::KBestSelector(s) => Some(s),
            SelectorRole::Unknown | SelectorRole::Absent => None,
        }
    }
}

/// Normalized sidecar contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetaBundle {
    /// Variance selector role.
    pub variance: SelectorRole,
    /// Feature selector role.
    pub selector: SelectorRole,
}

struct Capabilities {
    support: Option<Vec<bool>>,
    mean: bool,
    transform: bool,
}

fn capabilities(value: &Value) -> Option<Capabilities> {
    let obj = value.as_object()?;
    let support = obj.get("support").and_then(|s| {
        s.as_array()?
            .iter()
            .map(Value::as_bool)
            .collect::<Option<Vec<bool>>>()
    });
    Some(Capabilities {
        support,
        mean: obj.contains_key("mean"),
        transform: TRANSFORM_ATTRS.iter().any(|a| obj.contains_key(*a)),
    })
}

/// A mapping is one estimator record when it names no role and carries a
/// capability attribute itself.
fn is_single_record(obj: &Map<String, Value>) -> bool {
    let names_a_role = VARIANCE_KEYS
        .iter()
        .chain(SELECTOR_KEYS.iter())
        .any(|k| obj.contains_key(*k));
    !names_a_role
        && (obj.contains_key("support") || TRANSFORM_ATTRS.iter().any(|a| obj.contains_key(*a)))
}

fn as_feature_selector(value: &Value) -> Option<ColumnSelector> {
    let caps = capabilities(value)?;
    match caps.support {
        Some(support) if caps.transform => Some(ColumnSelector::new(support, true)),
        _ => None,
    }
}

fn as_variance_selector(value: &Value) -> Option<ColumnSelector> {
    let caps = capabilities(value)?;
    match caps.support {
        Some(support) if !caps.mean => Some(ColumnSelector::new(support, caps.transform)),
        _ => None,
    }
}

/// A value found under a known key: usable when it carries a mask.
fn named_role(value: &Value, wrap: fn(ColumnSelector) -> SelectorRole) -> SelectorRole {
    match capabilities(value) {
        Some(Capabilities {
            support: Some(support),
            transform,
            ..
        }) => wrap(ColumnSelector::new(support, transform)),
        _ => SelectorRole::Unknown,
    }
}

impl MetaBundle {
    /// Bundle with both roles absent.
    pub fn absent() -> Self {
        MetaBundle::default()
    }

    /// Resolve roles from a sidecar document.
    ///
    /// ```
    /// use qsar_predict::meta::{MetaBundle, SelectorRole};
    /// use serde_json::json;
    ///
    /// let doc = json!({
    ///     "scaler": {"mean": [0.0, 0.0], "scale": [1.0, 1.0]},
    ///     "kbest": {"support": [true, false], "scores": [3.0, 0.1], "k": 1}
    /// });
    /// let meta = MetaBundle::from_value(Some(&doc));
    /// assert!(matches!(meta.selector, SelectorRole::KBestSelector(_)));
    /// assert_eq!(meta.variance, SelectorRole::Absent);
    /// ```
    pub fn from_value(doc: Option<&Value>) -> Self {
        let Some(Value::Object(obj)) = doc else {
            return MetaBundle::absent();
        };

        if is_single_record(obj) {
            let value = Value::Object(obj.clone());
            if let Some(sel) = as_feature_selector(&value) {
                return MetaBundle {
                    variance: SelectorRole::Absent,
                    selector: SelectorRole::KBestSelector(sel),
                };
            }
            if let Some(sel) = as_variance_selector(&value) {
                return MetaBundle {
                    variance: SelectorRole::VarianceSelector(sel),
                    selector: SelectorRole::Absent,
                };
            }
            return MetaBundle::absent();
        }

        let mut variance = VARIANCE_KEYS
            .iter()
            .find_map(|k| obj.get(*k))
            .map(|v| named_role(v, SelectorRole::VarianceSelector));
        let named_selector = SELECTOR_KEYS.iter().find_map(|k| obj.get_key_value(*k));
        let mut claimed: Option<&str> = named_selector.map(|(key, _)| key.as_str());
        let mut selector =
            named_selector.map(|(_, v)| named_role(v, SelectorRole::KBestSelector));

        if selector.is_none() {
            for (key, value) in obj {
                if let Some(sel) = as_feature_selector(value) {
                    selector = Some(SelectorRole::KBestSelector(sel));
                    claimed = Some(key.as_str());
                    break;
                }
            }
        }
        if variance.is_none() {
            for (key, value) in obj {
                if claimed == Some(key.as_str()) {
                    continue;
                }
                if let Some(sel) = as_variance_selector(value) {
                    variance = Some(SelectorRole::VarianceSelector(sel));
                    break;
                }
            }
        }

        MetaBundle {
            variance: variance.unwrap_or_default(),
            selector: selector.unwrap_or_default(),
        }
    }

    /// Read and resolve a sidecar file.
    pub fn read(path: &Path) -> Result<Self, MetaError> {
        let file = File::open(path).map_err(|source| MetaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| MetaError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(MetaBundle::from_value(Some(&doc)))
    }

    /// Like [`MetaBundle::read`], demoting every failure to an empty bundle.
    /// A missing file is silent; an unreadable or malformed one is warned about.
    pub fn load_or_absent(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("no preprocessing sidecar at {}", path.display());
            return MetaBundle::absent();
        }
        match MetaBundle::read(path) {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("ignoring preprocessing sidecar: {e}");
                MetaBundle::absent()
            }
        }
    }
}
