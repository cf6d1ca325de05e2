//! Image comparison command.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use webp_sweep::{FidelityComparator, SsimComparator, load_source};

#[derive(Serialize)]
struct Comparison<'a> {
    reference: &'a Path,
    test: &'a Path,
    metric: &'a str,
    score: f64,
}

pub fn run(reference: &Path, test: &Path, json: bool) -> Result<()> {
    let a = load_source(reference)?;
    let b = load_source(test)?;

    let comparator = SsimComparator::new();
    let score = comparator.compare(a.pixels(), b.pixels())?;

    if json {
        let out = Comparison {
            reference,
            test,
            metric: comparator.name(),
            score,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}: {:.5}", comparator.name(), score);
    }

    Ok(())
}
