use polbuff::Polbuff;
use serde::Serialize;
use std::{env, fs::File, path::Path};

/// Polbuff with its coordinates, as loaded by the Python scripts
#[derive(Serialize)]
struct Export<'a> {
    #[serde(flatten)]
    polbuff: &'a Polbuff,
    x: Vec<f64>,
    y: Vec<f64>,
    extent: [f64; 4],
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    for arg in env::args().skip(1) {
        let path = Path::new(&arg);
        println!("{:?}", path);
        let polbuff = Polbuff::from_h5(path)?;
        let export = Export {
            polbuff: &polbuff,
            x: polbuff.x(),
            y: polbuff.y(),
            extent: polbuff.extent().into(),
        };
        serde_pickle::to_writer(
            &mut File::create(path.with_extension("pkl"))?,
            &export,
            Default::default(),
        )?;
    }
    Ok(())
}
