use crate::align;
use crate::classes::ClassScheme;
use crate::config::PipelineConfig;
use crate::count::{count_classes, ClassCount};
use crate::error::{Result, TransitionError};
use crate::export::{self, TransitionTable};
use crate::io::{self, ClassifiedRaster};
use crate::loader::RasterLoader;
use crate::transition::{self, TransitionMatrix};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// A raster in the chronological sequence, labelled by its year.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub label: String,
    pub path: PathBuf,
}

impl Snapshot {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            label: year_label(&path),
            path,
        }
    }
}

/// Label from the trailing numeric token of the file stem, e.g. `LCZ_1995.tif` -> `1995`.
///
/// Falls back to the last `_`-separated token, then to the whole stem.
pub fn year_label(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if !digits.is_empty() {
        return digits;
    }

    match stem.rsplit('_').next() {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => stem,
    }
}

/// Result for one chronologically adjacent pair of snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResult {
    pub first_label: String,
    pub second_label: String,
    pub matrix: TransitionMatrix,
    pub first_counts: ClassCount,
    pub second_counts: ClassCount,
}

impl PairResult {
    pub fn table(&self, scheme: &ClassScheme) -> TransitionTable {
        TransitionTable::new(
            &self.matrix,
            &self.first_counts,
            &self.second_counts,
            scheme,
            &self.first_label,
            &self.second_label,
        )
    }
}

/// Align `later` onto `earlier` and count transitions between them.
pub fn compare(
    earlier: &ClassifiedRaster,
    later: &ClassifiedRaster,
    scheme: &ClassScheme,
) -> Result<TransitionMatrix> {
    let aligned = align::align_pair(&earlier.grid, &later.grid)?;
    transition::accumulate(
        &earlier.grid,
        earlier.nodata,
        &aligned,
        later.nodata,
        scheme,
    )
}

/// Process already-loaded snapshots in order, one pair at a time.
pub fn run_loaded<I>(snapshots: I, scheme: &ClassScheme) -> Result<Vec<PairResult>>
where
    I: IntoIterator<Item = Result<(String, ClassifiedRaster)>>,
{
    let mut previous: Option<(String, ClassifiedRaster, ClassCount)> = None;
    let mut results = Vec::new();

    for snapshot in snapshots {
        let (label, raster) = snapshot?;
        let counts = count_classes(&raster.grid, raster.nodata);
        info!("{}: {} classes present", label, counts.len());

        if let Some((prev_label, prev_raster, prev_counts)) = previous.take() {
            info!("Comparing {} -> {}", prev_label, label);
            let matrix = compare(&prev_raster, &raster, scheme)?;
            results.push(PairResult {
                first_label: prev_label,
                second_label: label.clone(),
                matrix,
                first_counts: prev_counts,
                second_counts: counts.clone(),
            });
        }

        previous = Some((label, raster, counts));
    }

    Ok(results)
}

/// Load every raster with the boundary and compute one result per adjacent pair.
pub fn run(
    rasters: &[PathBuf],
    boundary_path: &Path,
    config: &PipelineConfig,
) -> Result<Vec<PairResult>> {
    config.validate()?;
    if rasters.len() < 2 {
        return Err(TransitionError::Config(format!(
            "at least two rasters are needed, got {}",
            rasters.len()
        )));
    }

    let loader = RasterLoader::new(config)?;
    let boundary = io::read_boundary(boundary_path)?;
    info!(
        "Processing {} snapshots in EPSG:{}",
        rasters.len(),
        loader.reference_epsg()
    );

    let snapshots = rasters.iter().map(|path| -> Result<(String, ClassifiedRaster)> {
        let snapshot = Snapshot::from_path(path);
        let raster = loader.load(&snapshot.path, &boundary)?;
        Ok((snapshot.label, raster))
    });

    run_loaded(snapshots, &config.scheme)
}

/// Element-wise sum of all pair matrices, reported against the first and last snapshot.
pub fn cumulative(results: &[PairResult]) -> Result<Option<PairResult>> {
    let (first, last) = match (results.first(), results.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Ok(None),
    };

    let mut matrix = first.matrix.clone();
    for result in &results[1..] {
        matrix.add_assign(&result.matrix)?;
    }

    Ok(Some(PairResult {
        first_label: first.first_label.clone(),
        second_label: format!("{}_cumulative", last.second_label),
        matrix,
        first_counts: first.first_counts.clone(),
        second_counts: last.second_counts.clone(),
    }))
}

/// Which files [`write_results`] produces besides one transition table per pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Percentage view per pair. Always on when the scheme excludes classes.
    pub percentages: bool,
    /// Table of the summed pair matrices.
    pub cumulative: bool,
}

/// Write every output for `results` into `dir` and return the paths written.
///
/// A pair whose percentage view has an empty source class is logged and gets
/// no percentage file; its transition table is still written.
pub fn write_results(
    dir: &Path,
    results: &[PairResult],
    scheme: &ClassScheme,
    options: OutputOptions,
) -> Result<Vec<PathBuf>> {
    let percentages = options.percentages || !scheme.excluded.is_empty();
    let mut written = Vec::new();

    for result in results {
        written.push(export::write_table(dir, &result.table(scheme))?);
        if !percentages {
            continue;
        }
        match result.matrix.row_percentages(scheme) {
            Ok(rows) => written.push(export::write_percentages(
                dir,
                &result.first_label,
                &result.second_label,
                &rows,
            )?),
            Err(e) => warn!(
                "No percentages for {} -> {}: {}",
                result.first_label, result.second_label, e
            ),
        }
    }

    if options.cumulative {
        if let Some(total) = cumulative(results)? {
            written.push(export::write_table(dir, &total.table(scheme))?);
        }
    }

    Ok(written)
}
