//! Multi-trial comparison of completion engines.
//!
//! Each trial draws a fresh held-out split of the reference matrix from a
//! trial-specific seed, completes the training part with every contender and
//! scores the completion against both the validation and the training part.
//! Trials are independent, so with the `parallel` feature they run on the
//! rayon thread pool.

use crate::split::{split, HoldoutSplit};
use rand::{rngs::StdRng, SeedableRng};
use recbench_core::{
    engine::{CompletionEngine, FnEngine},
    error::{RecError, Result},
    types::RatingMatrix,
    validation::{ensure_in_range, ensure_non_empty, ensure_positive},
};
use std::{fmt, time::Instant};
use tracing::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Configuration for [`compare`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompareConfig {
    /// Fraction of each user's ratings kept for training
    pub train_fraction: f64,
    /// Number of independent trials
    pub trials: usize,
    /// Base seed; trial `t` uses `seed + t`
    pub seed: u64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            trials: 10,
            seed: 0,
        }
    }
}

impl CompareConfig {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the training fraction.
    pub fn with_train_fraction(mut self, train_fraction: f64) -> Self {
        self.train_fraction = train_fraction;
        self
    }

    /// Sets the number of trials.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks the training fraction and trial count.
    pub fn validate(&self) -> Result<()> {
        ensure_in_range("train_fraction", self.train_fraction, 0.0, 1.0)?;
        ensure_positive("trials", self.trials)
    }

    fn trial_seed(&self, trial: usize) -> u64 {
        self.seed.wrapping_add(trial as u64)
    }
}

/// A labelled engine taking part in a comparison.
pub struct Contender {
    label: String,
    engine: Box<dyn CompletionEngine>,
}

impl Contender {
    /// Wraps `engine` under an explicit label.
    pub fn new<S: Into<String>>(label: S, engine: impl CompletionEngine + 'static) -> Self {
        Self {
            label: label.into(),
            engine: Box::new(engine),
        }
    }

    /// Wraps `engine` under its own name.
    pub fn from_engine(engine: impl CompletionEngine + 'static) -> Self {
        let label = engine.name().to_string();
        Self::new(label, engine)
    }

    /// Wraps a bare completion closure.
    pub fn from_fn<S, F>(label: S, complete: F) -> Self
    where
        S: Into<String>,
        F: Fn(&RatingMatrix) -> Result<RatingMatrix> + Send + Sync + 'static,
    {
        let label = label.into();
        Self::new(label.clone(), FnEngine::new(label, complete))
    }

    /// Label used in the result table.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &dyn CompletionEngine {
        self.engine.as_ref()
    }
}

impl fmt::Debug for Contender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contender")
            .field("label", &self.label)
            .field("engine", &self.engine.name())
            .finish()
    }
}

/// Aggregated results of one contender across all trials.
///
/// Means are taken over successful trials with a finite score. A mean with
/// nothing to average is NaN.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonRow {
    /// Contender label
    pub label: String,
    /// Mean score against the validation split
    pub validation_score: f64,
    /// Mean score against the training split
    pub training_score: f64,
    /// Mean wall-clock completion time in seconds
    pub time_seconds: f64,
    /// Trials in which completion and scoring succeeded
    pub successful_trials: usize,
    /// Trials in which completion or scoring failed
    pub failed_trials: usize,
    /// Message of the most recent failure
    pub last_error: Option<String>,
}

/// Comparison results, one row per contender in input order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComparisonTable {
    /// Rows in contender order
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Finds the row of the contender labelled `label`.
    pub fn row(&self, label: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|row| row.label == label)
    }

    /// Row with the best finite validation score.
    pub fn best_by_validation(&self, lower_is_better: bool) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .filter(|row| row.validation_score.is_finite())
            .min_by(|a, b| {
                let ordering = a.validation_score.total_cmp(&b.validation_score);
                if lower_is_better {
                    ordering
                } else {
                    ordering.reverse()
                }
            })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|row| row.label.len())
            .max()
            .unwrap_or(0)
            .max("engine".len());

        writeln!(
            f,
            "{:<width$}  {:>12}  {:>12}  {:>10}  {:>6}",
            "engine", "validation", "training", "seconds", "failed"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:>12.4}  {:>12.4}  {:>10.4}  {:>6}",
                row.label,
                row.validation_score,
                row.training_score,
                row.time_seconds,
                row.failed_trials
            )?;
        }
        Ok(())
    }
}

enum TrialOutcome {
    Scored {
        validation: f64,
        training: f64,
        seconds: f64,
    },
    Failed(RecError),
}

/// Runs `config.trials` held-out trials of every contender against `truth`.
///
/// `scoring` is called as `scoring(completed, reference)` once with the
/// validation split and once with the training split. A contender whose
/// completion or scoring fails in a trial has that trial counted in
/// [`ComparisonRow::failed_trials`]; the comparison itself only fails on
/// invalid arguments.
///
/// # Example
/// ```
/// use recbench_core::prelude::*;
/// use recbench_engines::Popularity;
/// use recbench_eval::{compare, rmse, CompareConfig, Contender};
///
/// let truth = RatingMatrix::from_row_slice(
///     3,
///     3,
///     &[5.0, 3.0, 4.0, 4.0, 2.0, 2.0, 1.0, 5.0, 4.0],
/// );
/// let contenders = [Contender::from_engine(Popularity::new())];
/// let config = CompareConfig::new().with_trials(3).with_train_fraction(0.5);
///
/// let table = compare(rmse, &truth, &contenders, &config).unwrap();
/// assert_eq!(table.rows.len(), 1);
/// assert_eq!(table.rows[0].successful_trials, 3);
/// ```
pub fn compare<S>(
    scoring: S,
    truth: &RatingMatrix,
    contenders: &[Contender],
    config: &CompareConfig,
) -> Result<ComparisonTable>
where
    S: Fn(&RatingMatrix, &RatingMatrix) -> Result<f64> + Sync,
{
    ensure_non_empty(truth)?;
    config.validate()?;

    let run = |trial: usize| run_trial(&scoring, truth, contenders, config, trial);

    #[cfg(feature = "parallel")]
    let trials = (0..config.trials)
        .into_par_iter()
        .map(run)
        .collect::<Result<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let trials = (0..config.trials).map(run).collect::<Result<Vec<_>>>()?;

    let rows = contenders
        .iter()
        .enumerate()
        .map(|(index, contender)| {
            aggregate(contender.label(), trials.iter().map(|outcomes| &outcomes[index]))
        })
        .collect();

    Ok(ComparisonTable { rows })
}

fn run_trial<S>(
    scoring: &S,
    truth: &RatingMatrix,
    contenders: &[Contender],
    config: &CompareConfig,
    trial: usize,
) -> Result<Vec<TrialOutcome>>
where
    S: Fn(&RatingMatrix, &RatingMatrix) -> Result<f64>,
{
    let mut rng = StdRng::seed_from_u64(config.trial_seed(trial));
    let HoldoutSplit { train, validation } = split(truth, config.train_fraction, &mut rng)?;

    Ok(contenders
        .iter()
        .map(|contender| {
            let outcome = evaluate(scoring, contender.engine(), &train, &validation);
            match &outcome {
                TrialOutcome::Scored {
                    validation,
                    training,
                    seconds,
                } => info!(
                    trial,
                    engine = contender.label(),
                    validation,
                    training,
                    seconds,
                    "Trial scored"
                ),
                TrialOutcome::Failed(error) => {
                    warn!(trial, engine = contender.label(), %error, "Trial failed");
                }
            }
            outcome
        })
        .collect())
}

fn evaluate<S>(
    scoring: &S,
    engine: &dyn CompletionEngine,
    train: &RatingMatrix,
    validation: &RatingMatrix,
) -> TrialOutcome
where
    S: Fn(&RatingMatrix, &RatingMatrix) -> Result<f64>,
{
    let start = Instant::now();
    let completed = match engine.complete(train) {
        Ok(completed) => completed,
        Err(error) => return TrialOutcome::Failed(error),
    };
    let seconds = start.elapsed().as_secs_f64();

    let scores = scoring(&completed, validation)
        .and_then(|held_out| scoring(&completed, train).map(|fitted| (held_out, fitted)));
    match scores {
        Ok((validation, training)) => TrialOutcome::Scored {
            validation,
            training,
            seconds,
        },
        Err(error) => TrialOutcome::Failed(error),
    }
}

fn aggregate<'a, I>(label: &str, outcomes: I) -> ComparisonRow
where
    I: Iterator<Item = &'a TrialOutcome>,
{
    let mut validation = Vec::new();
    let mut training = Vec::new();
    let mut seconds = Vec::new();
    let mut failed_trials = 0;
    let mut last_error = None;

    for outcome in outcomes {
        match outcome {
            TrialOutcome::Scored {
                validation: v,
                training: t,
                seconds: s,
            } => {
                validation.push(*v);
                training.push(*t);
                seconds.push(*s);
            }
            TrialOutcome::Failed(error) => {
                failed_trials += 1;
                last_error = Some(error.to_string());
            }
        }
    }

    ComparisonRow {
        label: label.to_string(),
        validation_score: finite_mean(&validation),
        training_score: finite_mean(&training),
        time_seconds: finite_mean(&seconds),
        successful_trials: seconds.len(),
        failed_trials,
        last_error,
    }
}

fn finite_mean(values: &[f64]) -> f64 {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        f64::NAN
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    }
}
