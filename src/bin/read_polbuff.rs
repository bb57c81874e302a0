use polbuff::{Polbuff, PolbuffFile};
use std::env;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut paths: Vec<_> = env::args().skip(1).collect();
    if paths.is_empty() {
        paths.push("polbuff.h5".to_string());
    }
    for path in paths {
        let polbuff = {
            let file = PolbuffFile::open(&path)?;
            print!("{}", file.summary()?);
            Polbuff::from_file(&file)?
        };
        let x = polbuff.x();
        let y = polbuff.y();
        println!(
            " x: [{:?} .. {:?}] ({})",
            x.first(),
            x.last(),
            x.len()
        );
        println!(
            " y: [{:?} .. {:?}] ({})",
            y.first(),
            y.last(),
            y.len()
        );
        println!(" extent: {:?}", <[f64; 4]>::from(polbuff.extent()));
        polbuff
            .i_d
            .row_iter()
            .take(3)
            .for_each(|row| println!("{}", row));
    }
    Ok(())
}
