use crate::pipeline::Orchestrator;
use crate::upload::read_merge_batch;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(orchestrator: &Orchestrator, inputs: &[P]) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let uploads = read_merge_batch(inputs, orchestrator.config().max_upload_bytes)?;
    let report = orchestrator.merge(uploads)?;

    println!("{}", report.message());

    Ok(())
}
