use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tabml_core::{MlError, MlResult, Table};

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Split a table into training and test sets.
///
/// Each row is assigned to the test set independently with probability
/// `test_fraction`, so set sizes are only approximately proportional.
/// Row order is preserved within each side.
///
/// Returns `(train, test)`.
pub fn train_test_split(
    table: &Table,
    test_fraction: f64,
    seed: Option<u64>,
) -> MlResult<(Table, Table)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(MlError::InvalidConfig(format!(
            "test fraction must lie in (0, 1), got {}",
            test_fraction
        )));
    }

    let mut rng = rng_from(seed);
    let mut train_idx = Vec::with_capacity(table.n_rows());
    let mut test_idx = Vec::new();
    for i in 0..table.n_rows() {
        if rng.gen::<f64>() < test_fraction {
            test_idx.push(i);
        } else {
            train_idx.push(i);
        }
    }

    Ok((table.select_rows(&train_idx)?, table.select_rows(&test_idx)?))
}

/// Shuffle `0..n` and cut it into `k` disjoint folds whose sizes differ by at
/// most one.
pub fn k_fold_indices(n: usize, k: usize, seed: Option<u64>) -> MlResult<Vec<Vec<usize>>> {
    if k < 2 {
        return Err(MlError::InvalidConfig(format!(
            "cross-validation needs at least 2 folds, got {}",
            k
        )));
    }
    if n < k {
        return Err(MlError::InvalidConfig(format!(
            "cannot cut {} rows into {} folds",
            n, k
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng_from(seed));

    let base = n / k;
    let remainder = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = if fold < remainder { base + 1 } else { base };
        folds.push(indices[start..start + size].to_vec());
        start += size;
    }
    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabml_core::Column;

    fn numbered(n: usize) -> Table {
        Table::from_columns(vec![(
            "Id".into(),
            Column::Numeric((0..n).map(|i| i as f64).collect()),
        )])
        .unwrap()
    }

    #[test]
    fn test_split_partitions_rows() {
        let table = numbered(50);
        let (train, test) = train_test_split(&table, 0.2, Some(42)).unwrap();
        assert_eq!(train.n_rows() + test.n_rows(), 50);

        let mut all: Vec<f64> = train.numeric("Id").unwrap().to_vec();
        all.extend_from_slice(test.numeric("Id").unwrap());
        all.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_split_proportion_converges() {
        let f = 0.2;
        let small = numbered(100);
        let large = numbered(20_000);
        let mut small_err = 0.0;
        let mut large_err = 0.0;
        for seed in 0..5 {
            let (_, t) = train_test_split(&small, f, Some(seed)).unwrap();
            small_err += (t.n_rows() as f64 / 100.0 - f).abs();
            let (_, t) = train_test_split(&large, f, Some(seed)).unwrap();
            large_err += (t.n_rows() as f64 / 20_000.0 - f).abs();
        }
        assert!(large_err / 5.0 < 0.02, "large-table deviation {}", large_err / 5.0);
        assert!(large_err <= small_err + 1e-9);
    }

    #[test]
    fn test_split_is_seeded() {
        let table = numbered(30);
        let (a, _) = train_test_split(&table, 0.3, Some(7)).unwrap();
        let (b, _) = train_test_split(&table, 0.3, Some(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let table = numbered(10);
        assert!(train_test_split(&table, 0.0, None).is_err());
        assert!(train_test_split(&table, 1.0, None).is_err());
        assert!(train_test_split(&table, f64::NAN, None).is_err());
    }

    #[test]
    fn test_k_fold_disjoint_and_balanced() {
        let folds = k_fold_indices(23, 5, Some(1)).unwrap();
        assert_eq!(folds.len(), 5);
        let sizes: Vec<usize> = folds.iter().map(|f| f.len()).collect();
        assert_eq!(sizes, vec![5, 5, 5, 4, 4]);

        let mut seen: Vec<usize> = folds.concat();
        seen.sort();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());
    }

    #[test]
    fn test_k_fold_validation() {
        assert!(k_fold_indices(10, 1, None).is_err());
        assert!(k_fold_indices(3, 5, None).is_err());
    }
}
