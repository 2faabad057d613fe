//! Example: Driving the export pipeline without a browser
//!
//! This example runs a full export of a two-page document with the mock
//! engine, which records every engine call and produces placeholder output.
//! Swap `MockLauncher` for `ChromeLauncher` to render for real.

use std::{env, fs};

use drawbatch::{
    DiagramOutcome, Pipeline, RunConfig,
    engine::mock::MockLauncher,
    format::OutputFormat,
};

const DOCUMENT: &str = r#"<mxfile host="drawio">
  <diagram id="overview" name="Overview"><mxGraphModel><root/></mxGraphModel></diagram>
  <diagram id="details" name="Details"><mxGraphModel><root/></mxGraphModel></diagram>
</mxfile>"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let work_dir = env::temp_dir().join("drawbatch-mock-export");
    fs::create_dir_all(&work_dir)?;

    let input = work_dir.join("system.drawio");
    fs::write(&input, DOCUMENT)?;

    // An existing directory as output: files are named after the input.
    let run = RunConfig::new(&input, &work_dir).with_format(OutputFormat::Svg);
    let launcher = MockLauncher::new();

    let summary = Pipeline::new(run, launcher.clone()).run()?;

    for outcome in summary.outcomes() {
        match outcome {
            DiagramOutcome::Written { index, path } => {
                println!("diagram {index} -> {}", path.display());
            }
            DiagramOutcome::WriteFailed { index, error } => {
                println!("diagram {index} failed: {error}");
            }
        }
    }

    println!("\nEngine calls:");
    for call in launcher.calls() {
        println!("  {call:?}");
    }

    Ok(())
}
