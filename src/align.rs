use crate::classes::ClassCode;
use crate::error::{Result, TransitionError};
use log::debug;
use ndarray::Array2;

/// Nearest source index for destination index `i` when `dst_len` samples are
/// spread evenly over the `src_len` source positions. Ties go to the lower index.
fn nearest_index(i: usize, src_len: usize, dst_len: usize) -> usize {
    if dst_len <= 1 || src_len <= 1 {
        return 0;
    }
    let num = i * (src_len - 1);
    let den = dst_len - 1;
    let base = num / den;
    if 2 * (num % den) > den {
        base + 1
    } else {
        base
    }
}

/// Resample `grid` to `shape` (rows, cols) by nearest neighbour over
/// normalised coordinates. Class codes are copied, never blended.
pub fn resample_nearest(grid: &Array2<ClassCode>, shape: (usize, usize)) -> Result<Array2<ClassCode>> {
    let (src_rows, src_cols) = grid.dim();
    let (dst_rows, dst_cols) = shape;
    if src_rows == 0 || src_cols == 0 || dst_rows == 0 || dst_cols == 0 {
        return Err(TransitionError::geometry(
            "grid alignment",
            format!(
                "cannot align {}x{} grid to {}x{}",
                src_cols, src_rows, dst_cols, dst_rows
            ),
        ));
    }

    if (src_rows, src_cols) == shape {
        return Ok(grid.clone());
    }

    debug!(
        "Resampling {}x{} grid to {}x{}",
        src_cols, src_rows, dst_cols, dst_rows
    );

    let col_index: Vec<usize> = (0..dst_cols)
        .map(|c| nearest_index(c, src_cols, dst_cols))
        .collect();

    Ok(Array2::from_shape_fn(shape, |(r, c)| {
        grid[[nearest_index(r, src_rows, dst_rows), col_index[c]]]
    }))
}

/// Bring `later` onto the shape of `earlier` so pixels compare position by position.
pub fn align_pair(earlier: &Array2<ClassCode>, later: &Array2<ClassCode>) -> Result<Array2<ClassCode>> {
    if earlier.is_empty() {
        return Err(TransitionError::geometry(
            "grid alignment",
            "reference grid is empty",
        ));
    }
    resample_nearest(later, earlier.dim())
}
