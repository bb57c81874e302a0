use super::{Error, Extent, Polbuff, Result};
use nalgebra::DMatrix;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

const FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const FONT_FAMILY: &str = "DejaVu Sans";

const MARGIN: u32 = 10;
const X_LABEL_AREA: u32 = 30;
const Y_LABEL_AREA: u32 = 45;

/// Registers the bundled font as the plotters "sans-serif" font
fn register_font() -> Result<()> {
    static REGISTERED: OnceLock<std::result::Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            plotters::style::register_font("sans-serif", FontStyle::Normal, FONT)
                .map_err(|e| format!("invalid bundled font: {}", e))
        })
        .clone()
        .map_err(Error::Render)
}

/// Figure file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Svg,
    Png,
}
impl Format {
    /// Infers the format from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => Ok(Format::Pdf),
            Some("svg") => Ok(Format::Svg),
            Some("png") => Ok(Format::Png),
            _ => Err(Error::Render(format!(
                "unsupported figure format: {:?}",
                path
            ))),
        }
    }
}

/// A panel of the figure
struct Panel<'a> {
    title: &'static str,
    image: &'a DMatrix<f64>,
}

/// The 2x2 panels: I (direct), I (indirect), Q (indirect) and U (indirect)
fn panels(polbuff: &Polbuff) -> [Panel<'_>; 4] {
    [
        Panel {
            title: "I (direct)",
            image: &polbuff.i_d,
        },
        Panel {
            title: "I (indirect)",
            image: &polbuff.i_i,
        },
        Panel {
            title: "Q (indirect)",
            image: &polbuff.q_i,
        },
        Panel {
            title: "U (indirect)",
            image: &polbuff.u_i,
        },
    ]
}

/// Linear mapping of an image values into the viridis color map
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorScale {
    lo: f64,
    hi: f64,
}
impl ColorScale {
    /// Spans the finite values of the image, if any
    fn new(image: &DMatrix<f64>) -> Option<Self> {
        image
            .iter()
            .filter(|x| x.is_finite())
            .fold(None, |scale, &x| match scale {
                None => Some(Self { lo: x, hi: x }),
                Some(Self { lo, hi }) => Some(Self {
                    lo: lo.min(x),
                    hi: hi.max(x),
                }),
            })
    }
    fn color(&self, value: f64) -> RGBColor {
        let h = if self.hi > self.lo {
            ((value - self.lo) / (self.hi - self.lo)).clamp(0., 1.)
        } else {
            0.
        };
        ViridisRGB.get_color(h as f32)
    }
}

/// Image cells as (upper left corner, lower right corner, value) in plot coordinates
///
/// The first row of the image is at the top of the extent and the first column on the left,
/// non-finite values are skipped.
fn cells(image: &DMatrix<f64>, extent: &Extent) -> Vec<((f64, f64), (f64, f64), f64)> {
    let (x_axis, y_axis) = (extent.x_axis(), extent.y_axis());
    let (n_row, n_col) = image.shape();
    let width = (extent.right() - extent.left()) / n_col as f64;
    let height = (extent.top() - extent.bottom()) / n_row as f64;
    let mut cells = Vec::with_capacity(n_row * n_col);
    for ((i, j), &value) in (0..n_col)
        .flat_map(|j| (0..n_row).map(move |i| (i, j)))
        .zip(image.iter())
    {
        if !value.is_finite() {
            continue;
        }
        let (x0, x1) = (
            x_axis.plot(extent.left() + width * j as f64),
            x_axis.plot(extent.left() + width * (j + 1) as f64),
        );
        let (y0, y1) = (
            y_axis.plot(extent.top() - height * i as f64),
            y_axis.plot(extent.top() - height * (i + 1) as f64),
        );
        cells.push(((x0.min(x1), y0.max(y1)), (x0.max(x1), y0.min(y1)), value));
    }
    cells
}

/// Largest `(width, height)` inside `available` with `width / height = aspect`
fn fit(available: (u32, u32), aspect: f64) -> (u32, u32) {
    let (width, height) = (available.0 as f64, available.1 as f64);
    if !(aspect.is_finite() && aspect > 0.) {
        return available;
    }
    if width > height * aspect {
        ((height * aspect).round() as u32, available.1)
    } else {
        (available.0, (width / aspect).round() as u32)
    }
}

/// Tick label of a plot coordinate, rounded to hide floating point noise
fn tick_label(value: f64) -> String {
    format!("{}", (value * 1e6).round() / 1e6 + 0.)
}

fn render_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> Error {
    Error::Render(e.to_string())
}

/// Polbuff quick-look figure
///
/// The polbuff images are laid out on a 2x2 grid:
///  - top-left: I (direct)
///  - top-right: I (indirect)
///  - bottom-left: Q (indirect)
///  - bottom-right: U (indirect)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Figure {
    /// width in points
    pub width: u32,
    /// height in points
    pub height: u32,
    /// panel captions
    pub titles: bool,
    /// axes with tick labels
    pub axes: bool,
}
impl Default for Figure {
    /// A 10x10in figure with axes and no titles
    fn default() -> Self {
        Self {
            width: 720,
            height: 720,
            titles: false,
            axes: true,
        }
    }
}
impl Figure {
    fn size(&self) -> Result<(u32, u32)> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Render(format!(
                "empty figure: {}x{}",
                self.width, self.height
            )));
        }
        Ok((self.width, self.height))
    }
    fn draw_panel<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: &Panel,
        extent: &Extent,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let area = if self.titles {
            area.titled(panel.title, ("sans-serif", 16).into_font())?
        } else {
            area.clone()
        };
        let (x_label_area, y_label_area) = if self.axes {
            (X_LABEL_AREA, Y_LABEL_AREA)
        } else {
            (0, 0)
        };
        let (x_axis, y_axis) = (extent.x_axis(), extent.y_axis());
        // one data unit spans as many pixels along x as along y
        let (width, height) = area.dim_in_pixel();
        let available = (
            width.saturating_sub(2 * MARGIN + y_label_area),
            height.saturating_sub(2 * MARGIN + x_label_area),
        );
        let plot = fit(available, x_axis.length() / y_axis.length());
        let (dw, dh) = (
            available.0.saturating_sub(plot.0),
            available.1.saturating_sub(plot.1),
        );
        let mut chart = ChartBuilder::on(&area)
            .margin_left(MARGIN + dw / 2)
            .margin_right(MARGIN + dw - dw / 2)
            .margin_top(MARGIN + dh / 2)
            .margin_bottom(MARGIN + dh - dh / 2)
            .x_label_area_size(x_label_area)
            .y_label_area_size(y_label_area)
            .build_cartesian_2d(x_axis.range.clone(), y_axis.range.clone())?;
        if let Some(scale) = ColorScale::new(panel.image) {
            debug!("{}: [{},{}]", panel.title, scale.lo, scale.hi);
            chart.draw_series(
                cells(panel.image, extent)
                    .into_iter()
                    .map(|(upper_left, lower_right, value)| {
                        Rectangle::new([upper_left, lower_right], scale.color(value).filled())
                    }),
            )?;
        }
        if self.axes {
            let x_label = |value: &f64| tick_label(x_axis.plot(*value));
            let y_label = |value: &f64| tick_label(y_axis.plot(*value));
            let mut mesh = chart.configure_mesh();
            mesh.disable_mesh().x_labels(5).y_labels(5);
            if x_axis.descending {
                mesh.x_label_formatter(&x_label);
            }
            if y_axis.descending {
                mesh.y_label_formatter(&y_label);
            }
            mesh.draw()?;
        }
        Ok(())
    }
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        polbuff: &Polbuff,
    ) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        root.fill(&WHITE)?;
        let extent = polbuff.extent();
        for (area, panel) in root.split_evenly((2, 2)).iter().zip(panels(polbuff).iter()) {
            self.draw_panel(area, panel, &extent)?;
        }
        root.present()
    }
    /// Renders the figure into a SVG document
    pub fn to_svg(&self, polbuff: &Polbuff) -> Result<String> {
        let size = self.size()?;
        register_font()?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            self.draw(&root, polbuff).map_err(render_error)?;
        }
        Ok(svg)
    }
    /// Renders the figure into a PDF document
    pub fn to_pdf(&self, polbuff: &Polbuff) -> Result<Vec<u8>> {
        let svg = self.to_svg(polbuff)?;
        let mut options = usvg::Options::default();
        let fonts = options.fontdb_mut();
        fonts.load_font_data(FONT.to_vec());
        fonts.set_sans_serif_family(FONT_FAMILY);
        let tree =
            usvg::Tree::from_str(&svg, &options).map_err(|e| Error::Render(e.to_string()))?;
        Ok(svg2pdf::to_pdf(
            &tree,
            svg2pdf::ConversionOptions::default(),
            svg2pdf::PageOptions::default(),
        ))
    }
    /// Renders and writes the figure to `path`
    ///
    /// The format is given by the file extension (pdf, svg or png).
    /// The figure is rendered before the file is created, so any rendering failure
    /// leaves an existing file untouched.
    pub fn save<P: AsRef<Path>>(&self, polbuff: &Polbuff, path: P) -> Result<()> {
        let path = path.as_ref();
        let write = |bytes: &[u8]| {
            std::fs::write(path, bytes).map_err(|e| Error::Render(format!("{:?}: {}", path, e)))
        };
        match Format::from_path(path)? {
            Format::Pdf => write(self.to_pdf(polbuff)?.as_slice())?,
            Format::Svg => write(self.to_svg(polbuff)?.as_bytes())?,
            Format::Png => {
                register_font()?;
                // the bitmap is only written to disk on present
                let root = BitMapBackend::new(path, self.size()?).into_drawing_area();
                self.draw(&root, polbuff).map_err(render_error)?;
            }
        }
        info!("figure saved to {:?}", path);
        Ok(())
    }
}
