// Library exports for testing and reuse

pub mod align;
pub mod classes;
pub mod cli;
pub mod clip;
pub mod config;
pub mod count;
pub mod crs;
pub mod error;
pub mod export;
pub mod geotransform;
pub mod io;
pub mod loader;
pub mod pipeline;
pub mod reproject;
pub mod transition;

// Re-export commonly used types
pub use classes::{ClassCode, ClassScheme};
pub use config::{NoDataPolicy, PipelineConfig};
pub use count::{count_classes, ClassCount};
pub use error::{Result, TransitionError};
pub use export::{TransitionRecord, TransitionTable};
pub use io::{read_boundary, read_input_raster, ClassifiedRaster, RasterMetadata};
pub use loader::RasterLoader;
pub use pipeline::{run, PairResult, Snapshot};
pub use transition::{accumulate, TransitionMatrix};
