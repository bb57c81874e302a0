#![allow(dead_code)]

use std::path::Path;

/// Synthetic polbuff file content
pub struct Synthetic {
    pub shape: [usize; 3],
    pub direct: Option<Vec<f64>>,
    pub indirect: Option<Vec<f64>>,
    pub int_attrs: Vec<(&'static str, i64)>,
    pub float_attrs: Vec<(&'static str, f64)>,
}

impl Synthetic {
    /// A `n_y`x`n_x` grid where each cell holds `offset + [1, 2, 3, 4]` directly
    /// and `offset + [5, 6, 7, 8]` indirectly, `offset` being the cell flat index times 10
    pub fn new(n_y: usize, n_x: usize) -> Self {
        let cube = |first: f64| -> Vec<f64> {
            (0..n_y * n_x)
                .flat_map(|cell| (0..4).map(move |k| 10. * cell as f64 + first + k as f64))
                .collect()
        };
        Self {
            shape: [n_y, n_x, 4],
            direct: Some(cube(1.)),
            indirect: Some(cube(5.)),
            int_attrs: vec![("n_x", n_x as i64), ("n_y", n_y as i64)],
            float_attrs: vec![("x_min", 0.), ("y_min", 0.), ("dx", 1.), ("dy", 1.)],
        }
    }
    pub fn without_attr(mut self, name: &str) -> Self {
        self.int_attrs.retain(|(attr, _)| *attr != name);
        self.float_attrs.retain(|(attr, _)| *attr != name);
        self
    }
    pub fn float_attr(mut self, name: &'static str, value: f64) -> Self {
        self.float_attrs.retain(|(attr, _)| *attr != name);
        self.float_attrs.push((name, value));
        self
    }
    pub fn write<P: AsRef<Path>>(&self, path: P) -> hdf5::Result<()> {
        let file = hdf5::File::create(path)?;
        for (name, data) in [
            (polbuff::STOKES_DIRECT, &self.direct),
            (polbuff::STOKES_INDIRECT, &self.indirect),
        ] {
            if let Some(data) = data {
                let dataset = file
                    .new_dataset::<f64>()
                    .shape(self.shape.to_vec())
                    .create(name)?;
                dataset.write_raw(data.as_slice())?;
            }
        }
        for (name, value) in &self.int_attrs {
            file.new_attr::<i64>().create(*name)?.write_scalar(value)?;
        }
        for (name, value) in &self.float_attrs {
            file.new_attr::<f64>().create(*name)?.write_scalar(value)?;
        }
        Ok(())
    }
}
