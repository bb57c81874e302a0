use super::{Error, Extent, Result};
use crate::grid::cell_centers;
use hdf5::types::H5Type;
use nalgebra::DMatrix;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const STOKES_DIRECT: &str = "stokes_direct";
pub const STOKES_INDIRECT: &str = "stokes_indirect";
const N_CHANNEL: usize = 4;

/// Stokes parameters, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    I,
    Q,
    U,
    V,
}
impl Parameter {
    pub const ALL: [Parameter; N_CHANNEL] =
        [Parameter::I, Parameter::Q, Parameter::U, Parameter::V];
    /// Index of the parameter on the last axis of a Stokes cube
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Stokes parameters cube
///
/// The cube is stored row major with shape `(n_row, n_col, 4)`,
/// the last axis being the (I,Q,U,V) Stokes parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Stokes {
    n_row: usize,
    n_col: usize,
    data: Vec<f64>,
}
impl Stokes {
    /// Creates a cube from its `shape` and row major `data`
    pub fn new(shape: &[usize], data: Vec<f64>) -> Result<Self> {
        match shape {
            &[n_row, n_col, N_CHANNEL] if n_row * n_col * N_CHANNEL == data.len() => Ok(Self {
                n_row,
                n_col,
                data,
            }),
            &[_, _, N_CHANNEL] => Err(Error::Shape(format!(
                "{} values do not fill a {:?} array",
                data.len(),
                shape
            ))),
            _ => Err(Error::Shape(format!(
                "expected a (rows, columns, {N_CHANNEL}) array, found {:?}",
                shape
            ))),
        }
    }
    /// Returns the cube shape
    pub fn shape(&self) -> [usize; 3] {
        [self.n_row, self.n_col, N_CHANNEL]
    }
    /// Returns a Stokes parameter as stored, a `n_row`x`n_col` matrix
    pub fn channel(&self, parameter: Parameter) -> DMatrix<f64> {
        let values: Vec<f64> = self
            .data
            .iter()
            .skip(parameter.index())
            .step_by(N_CHANNEL)
            .cloned()
            .collect();
        DMatrix::from_row_slice(self.n_row, self.n_col, &values)
    }
    /// Returns a Stokes parameter transposed, a `n_col`x`n_row` matrix
    pub fn image(&self, parameter: Parameter) -> DMatrix<f64> {
        self.channel(parameter).transpose()
    }
}

/// Polbuff grid metadata, as found in the file attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attributes {
    pub n_x: i64,
    pub n_y: i64,
    pub x_min: f64,
    pub y_min: f64,
    pub dx: f64,
    pub dy: f64,
}

/// Read-only handle on a polbuff HDF5 file
///
/// The file is closed when the handle is dropped.
pub struct PolbuffFile {
    path: PathBuf,
    file: hdf5::File,
}
impl PolbuffFile {
    /// Opens a polbuff file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = hdf5::File::open(&path).map_err(|source| Error::FileAccess {
            path: path.clone(),
            source,
        })?;
        debug!("opened {:?}", path);
        Ok(Self { path, file })
    }
    /// Reads the Stokes cube `name`
    pub fn stokes(&self, name: &str) -> Result<Stokes> {
        if !self.file.link_exists(name) {
            return Err(Error::MissingDataset(name.to_string()));
        }
        let dataset = self.file.dataset(name)?;
        let shape = dataset.shape();
        let data = dataset.read_raw::<f64>()?;
        debug!("{}: {:?}", name, shape);
        Stokes::new(&shape, data).map_err(|e| match e {
            Error::Shape(msg) => Error::Shape(format!("{name}: {msg}")),
            e => e,
        })
    }
    fn attr<T: H5Type>(&self, name: &str) -> Result<T> {
        if !self.file.attr_names()?.iter().any(|attr| attr == name) {
            return Err(Error::MissingAttribute(name.to_string()));
        }
        Ok(self.file.attr(name)?.read_scalar::<T>()?)
    }
    /// Reads the grid metadata
    pub fn attributes(&self) -> Result<Attributes> {
        Ok(Attributes {
            n_x: self.attr("n_x")?,
            n_y: self.attr("n_y")?,
            x_min: self.attr("x_min")?,
            y_min: self.attr("y_min")?,
            dx: self.attr("dx")?,
            dy: self.attr("dy")?,
        })
    }
    /// Lists the datasets and file attributes
    pub fn summary(&self) -> Result<Summary> {
        let mut datasets = vec![];
        for name in self.file.member_names()? {
            if let Ok(dataset) = self.file.dataset(&name) {
                datasets.push((name, dataset.shape()));
            }
        }
        let mut attributes = vec![];
        for name in self.file.attr_names()? {
            let attr = self.file.attr(&name)?;
            let value = match attr.read_scalar::<f64>() {
                Ok(value) => value.to_string(),
                Err(_) => format!("{:?}", attr.shape()),
            };
            attributes.push((name, value));
        }
        Ok(Summary {
            path: self.path.clone(),
            datasets,
            attributes,
        })
    }
}

/// Content listing of a polbuff file
#[derive(Debug, Clone)]
pub struct Summary {
    pub path: PathBuf,
    /// dataset names and shapes
    pub datasets: Vec<(String, Vec<usize>)>,
    /// attribute names and values
    pub attributes: Vec<(String, String)>,
}
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?}", self.path)?;
        for (name, shape) in &self.datasets {
            writeln!(f, " {} : {:?}", name, shape)?;
        }
        for (name, value) in &self.attributes {
            writeln!(f, " @{} = {}", name, value)?;
        }
        Ok(())
    }
}

fn rows<S>(matrix: &DMatrix<f64>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let rows: Vec<Vec<f64>> = matrix
        .row_iter()
        .map(|row| row.iter().cloned().collect())
        .collect();
    rows.serialize(serializer)
}

/// Polarization buffer
///
/// The Stokes parameters of the direct (`_d`) and indirect, or scattered, (`_i`) photons
/// are given as `n_x`x`n_y` images i.e. the transpose of the stored `(n_y,n_x)` slices.
///
/// `n_y` is set to the value of the `n_x` file attribute and `v_d` is a copy of the
/// U parameter, both as done by the polbuff plotting scripts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polbuff {
    #[serde(rename = "I_d", serialize_with = "rows")]
    pub i_d: DMatrix<f64>,
    #[serde(rename = "Q_d", serialize_with = "rows")]
    pub q_d: DMatrix<f64>,
    #[serde(rename = "U_d", serialize_with = "rows")]
    pub u_d: DMatrix<f64>,
    #[serde(rename = "V_d", serialize_with = "rows")]
    pub v_d: DMatrix<f64>,
    #[serde(rename = "I_i", serialize_with = "rows")]
    pub i_i: DMatrix<f64>,
    #[serde(rename = "Q_i", serialize_with = "rows")]
    pub q_i: DMatrix<f64>,
    #[serde(rename = "U_i", serialize_with = "rows")]
    pub u_i: DMatrix<f64>,
    #[serde(rename = "V_i", serialize_with = "rows")]
    pub v_i: DMatrix<f64>,
    pub x_min: f64,
    pub y_min: f64,
    pub dx: f64,
    pub dy: f64,
    pub n_x: usize,
    pub n_y: usize,
    /// `n_y` file attribute
    #[serde(skip)]
    pub n_y_attr: usize,
}
impl Polbuff {
    /// Loads a polbuff from a HDF5 file
    pub fn from_h5<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = PolbuffFile::open(path)?;
        Self::from_file(&file)
    }
    /// Loads a polbuff from an opened file
    pub fn from_file(file: &PolbuffFile) -> Result<Self> {
        let direct = file.stokes(STOKES_DIRECT)?;
        let indirect = file.stokes(STOKES_INDIRECT)?;
        let attributes = file.attributes()?;
        Self::from_parts(&direct, &indirect, &attributes)
    }
    /// Builds a polbuff from the direct and indirect Stokes cubes and the grid metadata
    pub fn from_parts(
        direct: &Stokes,
        indirect: &Stokes,
        attributes: &Attributes,
    ) -> Result<Self> {
        let count = |name: &str, value: i64| {
            usize::try_from(value).map_err(|_| Error::Shape(format!("negative {name}: {value}")))
        };
        let n_x = count("n_x", attributes.n_x)?;
        let n_y_attr = count("n_y", attributes.n_y)?;
        if n_y_attr != n_x {
            warn!(
                "n_y attribute ({}) differs from n_x ({}), the y axis uses n_x",
                n_y_attr, n_x
            );
        }
        Ok(Self {
            i_d: direct.image(Parameter::I),
            q_d: direct.image(Parameter::Q),
            u_d: direct.image(Parameter::U),
            v_d: direct.image(Parameter::U),
            i_i: indirect.image(Parameter::I),
            q_i: indirect.image(Parameter::Q),
            u_i: indirect.image(Parameter::U),
            v_i: indirect.image(Parameter::V),
            x_min: attributes.x_min,
            y_min: attributes.y_min,
            dx: attributes.dx,
            dy: attributes.dy,
            n_x,
            n_y: n_x,
            n_y_attr,
        })
    }
    /// Returns the cell-centered x coordinates
    pub fn x(&self) -> Vec<f64> {
        cell_centers(self.x_min, self.dx, self.n_x)
    }
    /// Returns the cell-centered y coordinates
    ///
    /// There are `n_x` of them
    pub fn y(&self) -> Vec<f64> {
        cell_centers(self.y_min, self.dy, self.n_x)
    }
    /// Returns the image extent `[x_min, x_max, y_min, y_max]`
    pub fn extent(&self) -> Extent {
        Extent::new(self.x_min, self.dx, self.n_x, self.y_min, self.dy, self.n_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(n_row: usize, n_col: usize) -> Stokes {
        let data = (0..n_row * n_col * N_CHANNEL).map(|x| x as f64).collect();
        Stokes::new(&[n_row, n_col, N_CHANNEL], data).unwrap()
    }

    fn attributes(n_x: i64, n_y: i64) -> Attributes {
        Attributes {
            n_x,
            n_y,
            x_min: -1.,
            y_min: 2.,
            dx: 0.5,
            dy: 0.25,
        }
    }

    #[test]
    fn channel_slices() {
        let stokes = cube(2, 3);
        let q = stokes.channel(Parameter::Q);
        assert_eq!(q.shape(), (2, 3));
        // element (r,c,k) is at (r*3 + c)*4 + k
        assert_eq!(q[(0, 0)], 1.);
        assert_eq!(q[(0, 2)], 9.);
        assert_eq!(q[(1, 0)], 13.);
        assert_eq!(stokes.channel(Parameter::V)[(1, 2)], 23.);
    }

    #[test]
    fn parameters_follow_storage_order() {
        let indices: Vec<usize> = Parameter::ALL.iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let stokes = cube(1, 1);
        for p in Parameter::ALL {
            assert_eq!(stokes.channel(p)[(0, 0)], p.index() as f64);
        }
    }

    #[test]
    fn image_is_the_transposed_channel() {
        let stokes = cube(2, 3);
        for p in Parameter::ALL {
            let image = stokes.image(p);
            assert_eq!(image.shape(), (3, 2));
            assert_eq!(image.transpose(), stokes.channel(p));
        }
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            Stokes::new(&[2, 2, 3], vec![0.; 12]),
            Err(Error::Shape(_))
        ));
        assert!(matches!(
            Stokes::new(&[2, 2], vec![0.; 4]),
            Err(Error::Shape(_))
        ));
        assert!(matches!(
            Stokes::new(&[2, 2, 4], vec![0.; 15]),
            Err(Error::Shape(_))
        ));
        assert!(Stokes::new(&[0, 5, 4], vec![]).is_ok());
    }

    #[test]
    fn v_direct_duplicates_u_direct() {
        let polbuff = Polbuff::from_parts(&cube(2, 2), &cube(2, 2), &attributes(2, 2)).unwrap();
        assert_eq!(polbuff.v_d, polbuff.u_d);
        assert_ne!(polbuff.v_i, polbuff.u_i);
        assert_eq!(polbuff.v_i, cube(2, 2).image(Parameter::V));
    }

    #[test]
    fn n_y_follows_n_x() {
        let polbuff = Polbuff::from_parts(&cube(3, 2), &cube(3, 2), &attributes(2, 3)).unwrap();
        assert_eq!(polbuff.n_y, 2);
        assert_eq!(polbuff.n_y_attr, 3);
        assert_eq!(polbuff.y(), vec![2.125, 2.375]);
        assert_eq!(polbuff.x(), vec![-0.75, -0.25]);
        assert_eq!(polbuff.extent(), Extent([-1., 0., 2., 2.5]));
    }

    #[test]
    fn negative_counts() {
        assert!(matches!(
            Polbuff::from_parts(&cube(1, 1), &cube(1, 1), &attributes(-1, 1)),
            Err(Error::Shape(_))
        ));
        assert!(matches!(
            Polbuff::from_parts(&cube(1, 1), &cube(1, 1), &attributes(1, -1)),
            Err(Error::Shape(_))
        ));
    }
}
