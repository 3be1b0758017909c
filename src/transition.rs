use crate::classes::{ClassCode, ClassScheme};
use crate::error::{Result, TransitionError};
use log::debug;
use ndarray::Array2;

/// K×K pixel counts between two snapshots, indexed by class code 1..=K.
///
/// `get(to, from)` is the number of pixel positions that held `from` in the
/// earlier grid and `to` in the later one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionMatrix {
    counts: Array2<u64>,
}

impl TransitionMatrix {
    pub fn zeros(k: usize) -> Self {
        Self {
            counts: Array2::zeros((k, k)),
        }
    }

    /// Number of classes K.
    pub fn k(&self) -> usize {
        self.counts.nrows()
    }

    fn index(&self, code: ClassCode) -> Option<usize> {
        if code >= 1 && (code as usize) <= self.k() {
            Some(code as usize - 1)
        } else {
            None
        }
    }

    /// Entry (to, from); zero for codes outside 1..=K.
    pub fn get(&self, to: ClassCode, from: ClassCode) -> u64 {
        match (self.index(to), self.index(from)) {
            (Some(t), Some(f)) => self.counts[[t, f]],
            _ => 0,
        }
    }

    pub fn set(&mut self, to: ClassCode, from: ClassCode, value: u64) {
        if let (Some(t), Some(f)) = (self.index(to), self.index(from)) {
            self.counts[[t, f]] = value;
        }
    }

    /// Pixels that left `from`, i.e. the aligned earlier count of `from`.
    pub fn from_total(&self, from: ClassCode) -> u64 {
        self.index(from)
            .map(|f| self.counts.column(f).sum())
            .unwrap_or(0)
    }

    /// Pixels that arrived in `to`.
    pub fn to_total(&self, to: ClassCode) -> u64 {
        self.index(to).map(|t| self.counts.row(t).sum()).unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.sum()
    }

    /// True when every off-diagonal entry is zero.
    pub fn is_diagonal(&self) -> bool {
        self.counts
            .indexed_iter()
            .all(|((t, f), &v)| t == f || v == 0)
    }

    /// Element-wise sum, for callers that want one matrix over several pairs.
    pub fn add_assign(&mut self, other: &TransitionMatrix) -> Result<()> {
        if self.k() != other.k() {
            return Err(TransitionError::Config(format!(
                "cannot add a {}-class matrix to a {}-class matrix",
                other.k(),
                self.k()
            )));
        }
        self.counts += &other.counts;
        Ok(())
    }

    /// Share of each source class's pixels going to each destination class,
    /// in percent, over the codes the scheme does not exclude.
    pub fn row_percentages(&self, scheme: &ClassScheme) -> Result<Vec<TransitionShares>> {
        let retained = scheme.retained_codes();
        let mut rows = Vec::with_capacity(retained.len());

        for &from in &retained {
            let total: u64 = retained.iter().map(|&to| self.get(to, from)).sum();
            if total == 0 {
                return Err(TransitionError::Numeric(format!(
                    "class {} ({}) has no pixels in the source snapshot",
                    from,
                    scheme.label(from).unwrap_or("unlabelled")
                )));
            }
            let shares = retained
                .iter()
                .map(|&to| (to, 100.0 * self.get(to, from) as f64 / total as f64))
                .collect();
            rows.push(TransitionShares { from, shares });
        }

        Ok(rows)
    }
}

/// Percent of the pixels of `from` that ended in each destination class.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionShares {
    pub from: ClassCode,
    pub shares: Vec<(ClassCode, f64)>,
}

/// Count class transitions between two grids of identical shape.
///
/// Pixels where either grid holds the background code, its own no-data
/// sentinel, or a code outside the scheme contribute nothing.
pub fn accumulate(
    earlier: &Array2<ClassCode>,
    earlier_nodata: ClassCode,
    later: &Array2<ClassCode>,
    later_nodata: ClassCode,
    scheme: &ClassScheme,
) -> Result<TransitionMatrix> {
    if earlier.dim() != later.dim() {
        return Err(TransitionError::geometry(
            "transition matrix",
            format!(
                "grids are not aligned: {:?} vs {:?}",
                earlier.dim(),
                later.dim()
            ),
        ));
    }

    let mut matrix = TransitionMatrix::zeros(scheme.len());
    for (&from, &to) in earlier.iter().zip(later.iter()) {
        if from == earlier_nodata || to == later_nodata {
            continue;
        }
        if let (Some(f), Some(t)) = (matrix.index(from), matrix.index(to)) {
            matrix.counts[[t, f]] += 1;
        }
    }

    debug!(
        "Accumulated {} transitions over {} pixels",
        matrix.total(),
        earlier.len()
    );
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::{count_classes, count_of};
    use ndarray::arr2;

    #[test]
    fn test_two_by_two_scenario() {
        let earlier = arr2(&[[1, 1], [2, 2]]);
        let later = arr2(&[[1, 2], [2, 2]]);
        let m = accumulate(&earlier, 255, &later, 255, &ClassScheme::numbered(2)).unwrap();
        assert_eq!(m.get(1, 1), 1);
        assert_eq!(m.get(2, 1), 1);
        assert_eq!(m.get(2, 2), 2);
        assert_eq!(m.get(1, 2), 0);
        assert_eq!(m.total(), 4);
    }

    #[test]
    fn test_identity_pair_is_diagonal() {
        let grid = arr2(&[[1, 3, 3], [17, 0, 255], [3, 1, 5]]);
        let scheme = ClassScheme::lcz();
        let m = accumulate(&grid, 255, &grid, 255, &scheme).unwrap();
        assert!(m.is_diagonal());
        let counts = count_classes(&grid, 255);
        for code in scheme.codes() {
            assert_eq!(m.get(code, code), count_of(&counts, code));
        }
    }

    #[test]
    fn test_disjoint_classes_give_zero_matrix() {
        // Later grid only holds codes outside the class domain.
        let earlier = arr2(&[[1, 2], [1, 2]]);
        let later = arr2(&[[7, 7], [8, 8]]);
        let m = accumulate(&earlier, 255, &later, 255, &ClassScheme::numbered(4)).unwrap();
        assert_eq!(m, TransitionMatrix::zeros(4));
    }

    #[test]
    fn test_no_pixel_keeps_its_class() {
        let earlier = arr2(&[[1, 2], [1, 2]]);
        let later = arr2(&[[3, 3], [4, 4]]);
        let m = accumulate(&earlier, 255, &later, 255, &ClassScheme::numbered(4)).unwrap();
        assert_eq!(m.get(3, 1), 1);
        for c in 1..=4 {
            assert_eq!(m.get(c, c), 0);
        }
    }

    #[test]
    fn test_nodata_background_and_unknown_codes_are_excluded() {
        let earlier = arr2(&[[0, 1, 255], [1, 99, 2]]);
        let later = arr2(&[[1, 0, 1], [-1, 1, 2]]);
        let m = accumulate(&earlier, 255, &later, -1, &ClassScheme::numbered(2)).unwrap();
        // Only (2 -> 2) survives.
        assert_eq!(m.total(), 1);
        assert_eq!(m.get(2, 2), 1);
    }

    #[test]
    fn test_from_total_equals_aligned_earlier_count() {
        let earlier = arr2(&[[1, 1, 2], [3, 3, 3], [2, 1, 1]]);
        let later = arr2(&[[2, 1, 2], [1, 3, 2], [2, 2, 1]]);
        let scheme = ClassScheme::numbered(3);
        let m = accumulate(&earlier, 255, &later, 255, &scheme).unwrap();
        let counts = count_classes(&earlier, 255);
        for code in scheme.codes() {
            assert_eq!(m.from_total(code), count_of(&counts, code));
        }
        let later_counts = count_classes(&later, 255);
        for code in scheme.codes() {
            assert_eq!(m.to_total(code), count_of(&later_counts, code));
        }
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let a = arr2(&[[1, 2]]);
        let b = arr2(&[[1], [2]]);
        assert!(accumulate(&a, 0, &b, 0, &ClassScheme::numbered(2)).is_err());
    }

    #[test]
    fn test_add_assign_sums_pairs() {
        let scheme = ClassScheme::numbered(2);
        let g1 = arr2(&[[1, 2]]);
        let g2 = arr2(&[[2, 2]]);
        let mut m = accumulate(&g1, 0, &g2, 0, &scheme).unwrap();
        let m2 = accumulate(&g2, 0, &g1, 0, &scheme).unwrap();
        m.add_assign(&m2).unwrap();
        assert_eq!(m.get(2, 1), 1);
        assert_eq!(m.get(1, 2), 1);
        assert_eq!(m.get(2, 2), 2);
        assert!(m.add_assign(&TransitionMatrix::zeros(3)).is_err());
    }

    #[test]
    fn test_row_percentages() {
        let earlier = arr2(&[[1, 1, 1, 1], [2, 2, 3, 3]]);
        let later = arr2(&[[1, 1, 1, 2], [2, 2, 3, 3]]);
        let scheme = ClassScheme::numbered(3);
        let m = accumulate(&earlier, 255, &later, 255, &scheme).unwrap();
        let rows = m.row_percentages(&scheme).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].from, 1);
        assert_eq!(rows[0].shares[0], (1, 75.0));
        assert_eq!(rows[0].shares[1], (2, 25.0));
        assert_eq!(rows[1].shares[1], (2, 100.0));
    }

    #[test]
    fn test_row_percentages_respect_exclusion() {
        let earlier = arr2(&[[1, 1, 2, 3]]);
        let later = arr2(&[[1, 2, 2, 3]]);
        let scheme = ClassScheme::numbered(3).with_excluded(vec![2]);
        let m = accumulate(&earlier, 255, &later, 255, &scheme).unwrap();
        let rows = m.row_percentages(&scheme).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].from, 1);
        // The 1 -> 2 pixel is dropped along with class 2.
        assert_eq!(rows[0].shares, vec![(1, 100.0), (3, 0.0)]);
        assert_eq!(rows[1].from, 3);
    }

    #[test]
    fn test_row_percentages_zero_total_is_numeric_error() {
        let grid = arr2(&[[1, 1]]);
        let scheme = ClassScheme::numbered(2);
        let m = accumulate(&grid, 255, &grid, 255, &scheme).unwrap();
        let err = m.row_percentages(&scheme).unwrap_err();
        assert!(matches!(err, TransitionError::Numeric(_)));
    }
}
