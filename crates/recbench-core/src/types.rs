//! Rating-matrix vocabulary.
//!
//! A rating matrix is a dense `n_users x n_items` matrix of `f64`. Row `u` is
//! user `u`, column `j` is item `j`. A cell is either an observed rating
//! (any non-NaN value) or missing, marked with [`MISSING`] (a quiet NaN).
//! Completed matrices share the same shape and carry no missing markers.

pub use nalgebra::{DMatrix, DVector};

/// Dense rating matrix, users as rows and items as columns.
pub type RatingMatrix = DMatrix<f64>;

/// Sentinel marking a cell that was not rated.
pub const MISSING: f64 = f64::NAN;

/// Returns `true` when `value` is an observed rating rather than the missing marker.
#[inline]
pub fn is_observed(value: f64) -> bool {
    !value.is_nan()
}

/// Creates a matrix of the given shape where every cell is missing.
pub fn missing_matrix(n_users: usize, n_items: usize) -> RatingMatrix {
    RatingMatrix::from_element(n_users, n_items, MISSING)
}

/// Which vectors of the rating matrix are compared or iterated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Rows: one vector per user, indexed by item.
    Users,
    /// Columns: one vector per item, indexed by user.
    Items,
}

impl Axis {
    /// Number of vectors along this axis.
    pub fn len(self, ratings: &RatingMatrix) -> usize {
        match self {
            Self::Users => ratings.nrows(),
            Self::Items => ratings.ncols(),
        }
    }

    /// Length of each vector along this axis.
    pub fn span(self, ratings: &RatingMatrix) -> usize {
        match self {
            Self::Users => ratings.ncols(),
            Self::Items => ratings.nrows(),
        }
    }

    /// Entry `position` of vector `index`.
    #[inline]
    pub fn value(self, ratings: &RatingMatrix, index: usize, position: usize) -> f64 {
        match self {
            Self::Users => ratings[(index, position)],
            Self::Items => ratings[(position, index)],
        }
    }

    /// The other axis.
    pub fn transposed(self) -> Self {
        match self {
            Self::Users => Self::Items,
            Self::Items => Self::Users,
        }
    }
}

/// Observation queries on a rating matrix.
pub trait Ratings {
    /// Items rated by `user`, in increasing index order.
    fn observed_items(&self, user: usize) -> Vec<usize>;

    /// Users who rated `item`, in increasing index order.
    fn observed_users(&self, item: usize) -> Vec<usize>;

    /// Mean of the ratings given by `user`, `None` if the user rated nothing.
    fn user_mean(&self, user: usize) -> Option<f64>;

    /// Mean of the ratings received by `item`, `None` if nobody rated it.
    fn item_mean(&self, item: usize) -> Option<f64>;

    /// Whether `(user, item)` carries an observed rating.
    fn is_rated(&self, user: usize, item: usize) -> bool;

    /// Total number of observed cells.
    fn observed_count(&self) -> usize;

    /// Whether the matrix has no missing cell.
    fn is_complete(&self) -> bool;
}

impl Ratings for RatingMatrix {
    fn observed_items(&self, user: usize) -> Vec<usize> {
        (0..self.ncols())
            .filter(|&item| is_observed(self[(user, item)]))
            .collect()
    }

    fn observed_users(&self, item: usize) -> Vec<usize> {
        (0..self.nrows())
            .filter(|&user| is_observed(self[(user, item)]))
            .collect()
    }

    fn user_mean(&self, user: usize) -> Option<f64> {
        observed_mean(self.row(user).iter().copied())
    }

    fn item_mean(&self, item: usize) -> Option<f64> {
        observed_mean(self.column(item).iter().copied())
    }

    #[inline]
    fn is_rated(&self, user: usize, item: usize) -> bool {
        is_observed(self[(user, item)])
    }

    fn observed_count(&self) -> usize {
        self.iter().filter(|value| is_observed(**value)).count()
    }

    fn is_complete(&self) -> bool {
        self.iter().all(|value| is_observed(*value))
    }
}

/// Mean over the observed values of an iterator, ignoring missing markers.
pub fn observed_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .filter(|value| is_observed(*value))
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> RatingMatrix {
        RatingMatrix::from_row_slice(
            3,
            3,
            &[5.0, 3.0, MISSING, 4.0, MISSING, 2.0, MISSING, 5.0, 4.0],
        )
    }

    #[test]
    fn test_observed_indices() {
        let m = sample();
        assert_eq!(m.observed_items(0), vec![0, 1]);
        assert_eq!(m.observed_items(1), vec![0, 2]);
        assert_eq!(m.observed_users(1), vec![0, 2]);
        assert_eq!(m.observed_count(), 6);
        assert!(!m.is_complete());
        assert!(m.is_rated(2, 2));
        assert!(!m.is_rated(2, 0));
    }

    #[test]
    fn test_means() {
        let m = sample();
        assert_relative_eq!(m.user_mean(0).unwrap(), 4.0);
        assert_relative_eq!(m.item_mean(2).unwrap(), 3.0);
        assert_relative_eq!(m.item_mean(0).unwrap(), 4.5);

        let empty_column = missing_matrix(2, 1);
        assert_eq!(empty_column.item_mean(0), None);
        assert_eq!(empty_column.user_mean(1), None);
    }

    #[test]
    fn test_axis_access() {
        let m = sample();
        assert_eq!(Axis::Users.len(&m), 3);
        assert_eq!(Axis::Items.span(&m), 3);
        assert_relative_eq!(Axis::Users.value(&m, 0, 1), 3.0);
        assert_relative_eq!(Axis::Items.value(&m, 1, 0), 3.0);
        assert_eq!(Axis::Users.transposed(), Axis::Items);
    }
}
