mod polbuff;
pub use polbuff::{
    Attributes, Parameter, Polbuff, PolbuffFile, Stokes, Summary, STOKES_DIRECT, STOKES_INDIRECT,
};
mod grid;
pub use grid::{cell_centers, Axis, Extent};
mod render;
pub use render::{Figure, Format};

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to open polbuff file {path:?}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: hdf5::Error,
    },
    #[error("missing dataset `{0}`")]
    MissingDataset(String),
    #[error("missing attribute `{0}`")]
    MissingAttribute(String),
    #[error("invalid polbuff layout: {0}")]
    Shape(String),
    #[error("failed to read HDF5 data")]
    Hdf5(#[from] hdf5::Error),
    #[error("failed to render figure: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
