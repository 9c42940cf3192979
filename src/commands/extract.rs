use crate::pipeline::Orchestrator;
use crate::upload::Upload;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(orchestrator: &Orchestrator, input: P, pages: &str) -> Result<()> {
    let upload = Upload::from_path(&input, orchestrator.config().max_upload_bytes)?;
    let report = orchestrator.extract(Some(upload), pages)?;

    println!("{}", report.message());

    Ok(())
}
