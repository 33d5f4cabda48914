//! Compares every bundled engine on a synthetic rating matrix.
//!
//! Run with `RUST_LOG=recbench_eval=info` to see per-trial scores, or
//! `RUST_LOG=debug` to follow the ALS sweeps as well.

use rand::prelude::*;
use recbench::prelude::*;
use tracing_subscriber::EnvFilter;

/// Low-rank preferences rounded onto a 1..=5 star scale, 30% observed.
fn synthetic_ratings(n_users: usize, n_items: usize, seed: u64) -> RatingMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let users = DMatrix::from_fn(n_users, 3, |_, _| rng.gen_range(0.0f64..1.0));
    let items = DMatrix::from_fn(n_items, 3, |_, _| rng.gen_range(0.0f64..1.0));
    let affinity = users * items.transpose();
    let max = affinity.max();

    affinity.map(|v| {
        if rng.gen_bool(0.3) {
            (1.0 + 4.0 * v / max).round()
        } else {
            MISSING
        }
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Completion Engine Comparison ===\n");

    let ratings = synthetic_ratings(120, 80, 42);
    println!(
        "{} users x {} items, {} observed ratings\n",
        ratings.nrows(),
        ratings.ncols(),
        ratings.observed_count()
    );

    let contenders = [
        Contender::from_engine(Popularity::new()),
        Contender::from_engine(Neighborhood::user_based(10)),
        Contender::from_engine(Neighborhood::item_based(10)),
        Contender::from_engine(Als::new(AlsConfig::new().with_rank(3).with_iterations(10))),
        Contender::from_engine(Spectral::new(SpectralConfig::new().with_rank(3))),
        Contender::from_engine(Spectral::new(
            SpectralConfig::new()
                .with_rank(3)
                .with_imputation(Imputation::ColumnMean),
        )),
    ];
    let config = CompareConfig::new().with_trials(5).with_seed(7);

    for metric in [Metric::Rmse, Metric::PrecisionAt(5), Metric::RankCorrelation] {
        let table = compare(
            |completed: &RatingMatrix, truth: &RatingMatrix| metric.score(completed, truth),
            &ratings,
            &contenders,
            &config,
        )?;

        println!("{metric:?}");
        println!("{table}");
        if let Some(best) = table.best_by_validation(metric.lower_is_better()) {
            println!("Best: {} ({:.4})\n", best.label, best.validation_score);
        }
    }

    // Single-user recommendations from the neighborhood engine.
    let knn = Neighborhood::user_based(10);
    for user in 0..3 {
        let top = knn.recommend_top_n(&ratings, user, 5, true)?;
        println!("User {user}: best {:?}, top 5 {top:?}", knn.recommend(&ratings, user, true)?);
    }

    Ok(())
}
