//! Feature standardization and stratified train/test split.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

use crate::{Error, Result};

/// Zero-mean, unit-variance scaler fitted per column
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit column means and population standard deviations.
    ///
    /// Constant columns get a scale of 1 so they map to zero.
    pub fn fit(data: ArrayView2<f64>) -> Result<Self> {
        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::InvalidDataset("cannot fit a scaler on zero rows".to_string()))?;
        let scale = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });
        Ok(Self { mean, scale })
    }

    pub fn transform(&self, data: ArrayView2<f64>) -> Result<Array2<f64>> {
        if data.ncols() != self.mean.len() {
            return Err(Error::InvalidDataset(format!(
                "scaler fitted on {} columns, got {}",
                self.mean.len(),
                data.ncols()
            )));
        }
        Ok((&data - &self.mean) / &self.scale)
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

/// Standardize a feature table with a scaler fitted on the whole table.
///
/// Statistics of rows that later land in the test partition leak into the
/// training features this way.
pub fn standardization(data: ArrayView2<f64>) -> Result<Array2<f64>> {
    StandardScaler::fit(data)?.transform(data)
}

/// Train and test partitions
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<i64>,
    pub y_test: Array1<i64>,
}

/// Stratified split keeping each label's share in both partitions.
///
/// The test partition gets `ceil(test_fraction * n)` rows, allocated to
/// labels by largest remainder. Same seed, same split.
pub fn splitting_data(
    x: ArrayView2<f64>,
    y: ArrayView1<i64>,
    test_fraction: f64,
    seed: u64,
) -> Result<Split> {
    let n = y.len();
    if x.nrows() != n {
        return Err(Error::InvalidDataset(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            n
        )));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::InvalidDataset(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let mut strata: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        strata.entry(label).or_default().push(i);
    }
    for (&label, members) in &strata {
        if members.len() < 2 {
            return Err(Error::InsufficientStratum {
                label,
                count: members.len(),
            });
        }
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    let n_train = n - n_test;
    let n_classes = strata.len();
    if n_test < n_classes || n_train < n_classes {
        return Err(Error::InvalidDataset(format!(
            "{} train / {} test rows cannot hold {} classes",
            n_train, n_test, n_classes
        )));
    }

    let counts: Vec<usize> = strata.values().map(Vec::len).collect();
    let allocation = allocate(&counts, n_test, n);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (members, &take) in strata.values().zip(&allocation) {
        let mut members = members.clone();
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..take]);
        train.extend_from_slice(&members[take..]);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(Split {
        x_train: x.select(Axis(0), &train),
        x_test: x.select(Axis(0), &test),
        y_train: y.select(Axis(0), &train),
        y_test: y.select(Axis(0), &test),
    })
}

/// Largest-remainder allocation of `total` draws over `counts` out of `n`
fn allocate(counts: &[usize], total: usize, n: usize) -> Vec<usize> {
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| total as f64 * c as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    let mut remaining = total - alloc.iter().sum::<usize>();
    for &i in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        if alloc[i] < counts[i] {
            alloc[i] += 1;
            remaining -= 1;
        }
    }
    alloc
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    #[test]
    fn test_standardization_zero_mean_unit_variance() {
        let data = array![[1.0, 10.0, 5.0], [2.0, 20.0, 5.0], [3.0, 30.0, 5.0], [4.0, 40.0, 5.0]];
        let scaled = standardization(data.view()).unwrap();

        for col in scaled.columns() {
            assert!(col.mean().unwrap().abs() < 1e-12);
        }
        assert!((scaled.column(0).std(0.0) - 1.0).abs() < 1e-12);
        assert!(scaled.column(2).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_scaler_statistics() {
        let scaler = StandardScaler::fit(array![[1.0, 7.0], [3.0, 7.0]].view()).unwrap();
        assert_eq!(scaler.mean(), &array![2.0, 7.0]);
        // population std; constant columns keep a unit scale
        assert_eq!(scaler.scale(), &array![1.0, 1.0]);

        let scaler = StandardScaler::fit(array![[0.0], [4.0]].view()).unwrap();
        assert_eq!(scaler.scale(), &array![2.0]);
    }

    #[test]
    fn test_scaler_rejects_wrong_width() {
        let scaler = StandardScaler::fit(array![[1.0, 2.0], [3.0, 4.0]].view()).unwrap();
        assert!(scaler.transform(array![[1.0]].view()).is_err());
        assert!(StandardScaler::fit(Array2::<f64>::zeros((0, 2)).view()).is_err());
    }

    #[test]
    fn test_split_is_stratified_and_deterministic() {
        let x = Array::from_shape_fn((20, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_iter((0..20).map(|i| if i < 15 { 1i64 } else { 0 }));

        let split = splitting_data(x.view(), y.view(), 0.2, 1).unwrap();
        assert_eq!(split.x_test.nrows(), 4);
        assert_eq!(split.x_train.nrows(), 16);
        assert_eq!(split.y_test.iter().filter(|&&l| l == 1).count(), 3);
        assert_eq!(split.y_test.iter().filter(|&&l| l == 0).count(), 1);

        // rows travel with their labels
        for (row, &label) in split.x_train.rows().into_iter().zip(&split.y_train) {
            let i = row[0] as usize / 2;
            assert_eq!(label, y[i]);
        }

        let again = splitting_data(x.view(), y.view(), 0.2, 1).unwrap();
        assert_eq!(split.y_test, again.y_test);
        assert_eq!(split.x_test, again.x_test);
    }

    #[test]
    fn test_singleton_stratum_fails() {
        let x = Array2::<f64>::zeros((5, 1));
        let y = ndarray::arr1(&[1, 1, 0, 0, -1]);
        match splitting_data(x.view(), y.view(), 0.4, 1) {
            Err(Error::InsufficientStratum { label, count }) => {
                assert_eq!((label, count), (-1, 1));
            }
            other => panic!("expected insufficient stratum, got {:?}", other),
        }
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let x = Array2::<f64>::zeros((4, 1));
        let y = ndarray::arr1(&[1, 1, 0, 0]);
        assert!(matches!(
            splitting_data(x.view(), y.view(), 1.0, 1),
            Err(Error::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_allocate_largest_remainder() {
        assert_eq!(allocate(&[15, 5], 4, 20), vec![3, 1]);
        assert_eq!(allocate(&[3, 3, 4], 5, 10), vec![2, 1, 2]);
    }
}
