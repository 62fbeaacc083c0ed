//! Row shuffling and positional train/validation/test splitting.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Fraction of rows assigned to the training partition.
pub const TRAIN_FRACTION: f64 = 0.70;
/// Cumulative fraction marking the end of the validation partition.
pub const VALIDATION_BOUNDARY_FRACTION: f64 = 0.85;

/// The three dataset partitions, in split order.
#[derive(Debug, Clone)]
pub struct SplitRows {
    pub train: Vec<Vec<f64>>,
    pub validation: Vec<Vec<f64>>,
    pub test: Vec<Vec<f64>>,
}

/// Shuffle rows with a uniform random permutation.
///
/// Without a seed each run produces a different permutation; pass a seed to
/// make the split reproducible.
pub fn shuffle_rows(rows: &mut [Vec<f64>], seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    rows.shuffle(&mut rng);
}

/// Split rows by position at the 70% and 85% cumulative boundaries.
///
/// Boundaries truncate, so a 100-row input yields 70/15/15. The partitions
/// never overlap and their sizes always sum to the input size.
pub fn split_rows(mut rows: Vec<Vec<f64>>) -> SplitRows {
    let total = rows.len();
    let train_end = (TRAIN_FRACTION * total as f64) as usize;
    let validation_end = (VALIDATION_BOUNDARY_FRACTION * total as f64) as usize;
    let test = rows.split_off(validation_end);
    let validation = rows.split_off(train_end);
    SplitRows {
        train: rows,
        validation,
        test,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Vec<f64>> {
        (0..n).map(|i| vec![i as f64]).collect()
    }

    #[test]
    fn hundred_rows_split_70_15_15() {
        let split = split_rows(rows(100));
        assert_eq!(split.train.len(), 70);
        assert_eq!(split.validation.len(), 15);
        assert_eq!(split.test.len(), 15);
    }

    #[test]
    fn partition_sizes_always_sum_to_input() {
        for n in [0, 1, 2, 3, 7, 19, 99, 101] {
            let split = split_rows(rows(n));
            assert_eq!(
                split.train.len() + split.validation.len() + split.test.len(),
                n
            );
        }
    }

    #[test]
    fn partitions_do_not_overlap() {
        let split = split_rows(rows(20));
        let mut seen: Vec<f64> = split
            .train
            .iter()
            .chain(&split.validation)
            .chain(&split.test)
            .map(|row| row[0])
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, (0..20).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let mut a = rows(50);
        let mut b = rows(50);
        shuffle_rows(&mut a, Some(7));
        shuffle_rows(&mut b, Some(7));
        assert_eq!(a, b);
    }
}
