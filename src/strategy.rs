//! The ordered fallback chain that reconciles the computed feature layout with
//! the layout the model was trained on.
//!
//! | # | tag | input handed to the model |
//! |---|-----|---------------------------|
//! | 1 | `pipeline_raw` | raw matrix, pipelines only |
//! | 2 | `selectors_only` | raw matrix after the sidecar selectors (never scaled) |
//! | 3 | `sliced_by_selector` | raw columns picked by the feature selector, when it selects exactly the expected width |
//! | 4 | `first_k_columns` | the first `n_features_in` raw columns |
//!
//! The chain stops at the first attempt that yields one prediction per row.
//! Model errors, shape errors and wrong-length outputs are soft failures.

use std::fmt;

use ndarray::{Array1, Array2, ArrayView2, Axis, s};

use crate::meta::MetaBundle;
use crate::models::Regressor;

/// Which step of the chain produced the predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Pipeline model on the raw matrix.
    PipelineRaw,
    /// Sidecar selectors applied, no scaling.
    SelectorsOnly,
    /// Raw columns sliced by the feature selector's support.
    SlicedBySelector,
    /// Leading columns up to the expected width.
    FirstKColumns,
}

impl Strategy {
    /// All steps in the order they are tried.
    pub const ORDER: [Strategy; 4] = [
        Strategy::PipelineRaw,
        Strategy::SelectorsOnly,
        Strategy::SlicedBySelector,
        Strategy::FirstKColumns,
    ];

    /// Stable tag used in logs and summaries.
    pub fn tag(self) -> &'static str {
        match self {
            Strategy::PipelineRaw => "pipeline_raw",
            Strategy::SelectorsOnly => "selectors_only",
            Strategy::SlicedBySelector => "sliced_by_selector",
            Strategy::FirstKColumns => "first_k_columns",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// The model produced one value per row.
    Predicted(Array1<f64>),
    /// The step's preconditions do not hold.
    Inapplicable(String),
    /// The model was called and failed.
    Rejected(String),
}

/// Result of the whole chain.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// A step succeeded.
    Predicted {
        /// One prediction per input row.
        values: Array1<f64>,
        /// The winning step.
        strategy: Strategy,
    },
    /// Every step failed or was inapplicable.
    Failed {
        /// Each step with the reason it did not produce predictions.
        attempts: Vec<(Strategy, String)>,
    },
}

impl PredictionOutcome {
    /// `pipeline_raw`, ..., or `failed`.
    pub fn tag(&self) -> &'static str {
        match self {
            PredictionOutcome::Predicted { strategy, .. } => strategy.tag(),
            PredictionOutcome::Failed { .. } => "failed",
        }
    }
}

fn call_model(model: &dyn Regressor, x: ArrayView2<'_, f64>) -> Attempt {
    match model.predict(x) {
        Ok(values) if values.len() == x.nrows() => Attempt::Predicted(values),
        Ok(values) => Attempt::Rejected(format!(
            "model returned {} predictions for {} rows",
            values.len(),
            x.nrows()
        )),
        Err(e) => Attempt::Rejected(e.to_string()),
    }
}

/// Step 1: pipelines carry their own preprocessing.
pub fn pipeline_raw(model: &dyn Regressor, raw: ArrayView2<'_, f64>) -> Attempt {
    if !model.is_pipeline() {
        return Attempt::Inapplicable("model is not a pipeline".into());
    }
    call_model(model, raw)
}

/// The raw matrix after the sidecar selectors. Scaling is never applied.
pub fn preprocess_with_selectors(raw: ArrayView2<'_, f64>, meta: &MetaBundle) -> Array2<f64> {
    let mut x = raw.to_owned();
    if let Some(variance) = meta.variance.selector() {
        match variance.apply_mask(x.view()) {
            Some(selected) => x = selected,
            None => log::debug!("variance selector does not fit {} columns", x.ncols()),
        }
    }
    if let Some(selector) = meta.selector.selector() {
        if selector.has_transform() {
            match selector.transform(x.view()) {
                Ok(selected) => x = selected,
                Err(e) => log::debug!("feature selector transform skipped: {e}"),
            }
        } else if let Some(selected) = selector.apply_mask(x.view()) {
            x = selected;
        }
    }
    x
}

/// Step 2: predict on the selector-preprocessed matrix.
pub fn selectors_only(
    model: &dyn Regressor,
    raw: ArrayView2<'_, f64>,
    meta: &MetaBundle,
) -> Attempt {
    let x = preprocess_with_selectors(raw, meta);
    call_model(model, x.view())
}

/// Step 3: slice raw columns by the feature selector's support.
pub fn sliced_by_selector(
    model: &dyn Regressor,
    raw: ArrayView2<'_, f64>,
    meta: &MetaBundle,
) -> Attempt {
    let Some(expected) = model.n_features_in() else {
        return Attempt::Inapplicable("model does not record its input width".into());
    };
    let Some(selector) = meta.selector.selector() else {
        return Attempt::Inapplicable("no feature selector".into());
    };
    let idx = selector.selected_indices();
    if idx.len() != expected {
        return Attempt::Inapplicable(format!(
            "selector keeps {} columns, model expects {expected}",
            idx.len()
        ));
    }
    if let Some(&bad) = idx.iter().find(|&&i| i >= raw.ncols()) {
        return Attempt::Rejected(format!(
            "selected column {bad} outside {} columns",
            raw.ncols()
        ));
    }
    let x = raw.select(Axis(1), &idx);
    call_model(model, x.view())
}

/// Step 4: keep the leading `n_features_in` columns.
pub fn first_k_columns(model: &dyn Regressor, raw: ArrayView2<'_, f64>) -> Attempt {
    let Some(expected) = model.n_features_in() else {
        return Attempt::Inapplicable("model does not record its input width".into());
    };
    if raw.ncols() < expected {
        return Attempt::Inapplicable(format!(
            "model expects {expected} columns, only {} computed",
            raw.ncols()
        ));
    }
    call_model(model, raw.slice(s![.., ..expected]))
}

/// Run the chain, stopping at the first step that predicts.
pub fn run_chain(model: &dyn Regressor, raw: ArrayView2<'_, f64>, meta: &MetaBundle) -> PredictionOutcome {
    let mut attempts = Vec::with_capacity(Strategy::ORDER.len());
    for strategy in Strategy::ORDER {
        let attempt = match strategy {
            Strategy::PipelineRaw => pipeline_raw(model, raw),
            Strategy::SelectorsOnly => selectors_only(model, raw, meta),
            Strategy::SlicedBySelector => sliced_by_selector(model, raw, meta),
            Strategy::FirstKColumns => first_k_columns(model, raw),
        };
        match attempt {
            Attempt::Predicted(values) => {
                log::info!("predictions produced by {strategy}");
                return PredictionOutcome::Predicted { values, strategy };
            }
            Attempt::Inapplicable(reason) | Attempt::Rejected(reason) => {
                log::debug!("{strategy}: {reason}");
                attempts.push((strategy, reason));
            }
        }
    }
    PredictionOutcome::Failed { attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::{ColumnSelector, SelectorRole};
    use crate::models::ModelError;
    use ndarray::{array, Array2};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sums each row; accepts only one width and counts its calls.
    struct Stub {
        width: usize,
        declared: Option<usize>,
        pipeline: bool,
        calls: AtomicUsize,
        truncate: bool,
    }

    impl Stub {
        fn new(width: usize) -> Self {
            Stub {
                width,
                declared: Some(width),
                pipeline: false,
                calls: AtomicUsize::new(0),
                truncate: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Regressor for Stub {
        fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if x.ncols() != self.width {
                return Err(ModelError::Shape {
                    expected: self.width,
                    found: x.ncols(),
                });
            }
            let sums = x.sum_axis(Axis(1));
            if self.truncate {
                return Ok(sums.slice(s![..0]).to_owned());
            }
            Ok(sums)
        }

        fn n_features_in(&self) -> Option<usize> {
            self.declared
        }

        fn is_pipeline(&self) -> bool {
            self.pipeline
        }
    }

    fn raw() -> Array2<f64> {
        array![[1.0, 2.0, 3.0, 4.0, 5.0], [10.0, 20.0, 30.0, 40.0, 50.0]]
    }

    fn kbest(support: Vec<bool>) -> MetaBundle {
        MetaBundle {
            variance: SelectorRole::Absent,
            selector: SelectorRole::KBestSelector(ColumnSelector::new(support, true)),
        }
    }

    #[test]
    fn pipeline_on_raw_stops_the_chain() {
        let mut model = Stub::new(5);
        model.pipeline = true;
        let outcome = run_chain(&model, raw().view(), &kbest(vec![true; 5]));
        assert_eq!(
            outcome,
            PredictionOutcome::Predicted {
                values: array![15.0, 150.0],
                strategy: Strategy::PipelineRaw
            }
        );
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn selectors_only_uses_transform() {
        let model = Stub::new(2);
        let meta = kbest(vec![false, true, false, true, false]);
        let outcome = run_chain(&model, raw().view(), &meta);
        assert_eq!(outcome.tag(), "selectors_only");
        if let PredictionOutcome::Predicted { values, .. } = outcome {
            assert_eq!(values, array![6.0, 60.0]);
        }
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn variance_then_transform_on_reduced_matrix() {
        let model = Stub::new(1);
        let meta = MetaBundle {
            variance: SelectorRole::VarianceSelector(ColumnSelector::new(
                vec![true, true, false, true, true],
                false,
            )),
            selector: SelectorRole::KBestSelector(ColumnSelector::new(
                vec![false, false, true, false],
                true,
            )),
        };
        let x = preprocess_with_selectors(raw().view(), &meta);
        assert_eq!(x, array![[4.0], [40.0]]);
        assert_eq!(run_chain(&model, raw().view(), &meta).tag(), "selectors_only");
    }

    #[test]
    fn transform_error_leaves_matrix_unchanged() {
        let meta = kbest(vec![true, false]);
        let x = preprocess_with_selectors(raw().view(), &meta);
        assert_eq!(x, raw());
    }

    #[test]
    fn no_scaling_is_ever_applied() {
        let x = preprocess_with_selectors(raw().view(), &MetaBundle::absent());
        assert_eq!(x, raw());
    }

    #[test]
    fn sliced_by_selector_after_selectors_fail() {
        // The variance mask shrinks the matrix so the strict transform fails,
        // step 2 sees 4 columns and is rejected; step 3 slices raw columns.
        let model = Stub::new(2);
        let meta = MetaBundle {
            variance: SelectorRole::VarianceSelector(ColumnSelector::new(
                vec![true, true, true, true, false],
                false,
            )),
            selector: SelectorRole::KBestSelector(ColumnSelector::new(
                vec![true, false, false, false, true],
                true,
            )),
        };
        let outcome = run_chain(&model, raw().view(), &meta);
        assert_eq!(
            outcome,
            PredictionOutcome::Predicted {
                values: array![6.0, 60.0],
                strategy: Strategy::SlicedBySelector
            }
        );
        assert_eq!(model.calls(), 2);
    }

    #[test]
    fn first_k_columns_is_the_last_resort() {
        let model = Stub::new(3);
        let outcome = run_chain(&model, raw().view(), &MetaBundle::absent());
        assert_eq!(
            outcome,
            PredictionOutcome::Predicted {
                values: array![6.0, 60.0],
                strategy: Strategy::FirstKColumns
            }
        );
        assert_eq!(model.calls(), 2);
    }

    #[test]
    fn out_of_range_selector_index_is_rejected() {
        let model = Stub::new(2);
        let meta = kbest(vec![false, false, false, false, false, true, true]);
        assert!(matches!(
            sliced_by_selector(&model, raw().view(), &meta),
            Attempt::Rejected(_)
        ));
    }

    #[test]
    fn nothing_fits_fails_with_every_reason() {
        let model = Stub::new(9);
        let outcome = run_chain(&model, raw().view(), &MetaBundle::absent());
        assert_eq!(outcome.tag(), "failed");
        match outcome {
            PredictionOutcome::Failed { attempts } => {
                let order: Vec<Strategy> = attempts.iter().map(|(s, _)| *s).collect();
                assert_eq!(order, Strategy::ORDER.to_vec());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn undeclared_width_skips_width_steps() {
        let mut model = Stub::new(3);
        model.declared = None;
        let outcome = run_chain(&model, raw().view(), &kbest(vec![true, true, false, false, false]));
        assert_eq!(outcome.tag(), "failed");
        assert_eq!(model.calls(), 1);
    }

    #[test]
    fn wrong_length_predictions_are_rejected() {
        let mut model = Stub::new(5);
        model.truncate = true;
        assert!(matches!(
            selectors_only(&model, raw().view(), &MetaBundle::absent()),
            Attempt::Rejected(_)
        ));
    }
}
