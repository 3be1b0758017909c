use crate::classes::{ClassCode, BACKGROUND};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Pixel count per class code for one snapshot.
pub type ClassCount = BTreeMap<ClassCode, u64>;

/// Count every distinct value in `grid` except `nodata` and the background code.
pub fn count_classes(grid: &Array2<ClassCode>, nodata: ClassCode) -> ClassCount {
    let mut counts = ClassCount::new();
    for &value in grid.iter() {
        if value == nodata || value == BACKGROUND {
            continue;
        }
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Count of `code`, zero when absent.
pub fn count_of(counts: &ClassCount, code: ClassCode) -> u64 {
    counts.get(&code).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_counts_exclude_nodata_and_background() {
        let grid = arr2(&[[1, 2, 255], [0, 2, 17], [1, 1, 255]]);
        let counts = count_classes(&grid, 255);
        assert_eq!(counts.len(), 3);
        assert_eq!(count_of(&counts, 1), 3);
        assert_eq!(count_of(&counts, 2), 2);
        assert_eq!(count_of(&counts, 17), 1);
        assert_eq!(count_of(&counts, 0), 0);
        assert_eq!(count_of(&counts, 255), 0);
    }

    #[test]
    fn test_all_background_is_empty() {
        let grid = Array2::zeros((3, 3));
        assert!(count_classes(&grid, -9999).is_empty());
    }

    #[test]
    fn test_values_outside_the_scheme_are_still_counted() {
        let grid = arr2(&[[42, 42], [3, -9999]]);
        let counts = count_classes(&grid, -9999);
        assert_eq!(count_of(&counts, 42), 2);
        assert_eq!(count_of(&counts, 3), 1);
    }
}
