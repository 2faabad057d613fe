use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use tempfile::tempdir;

use drawbatch::{
    DrawBatchError,
    engine::mock::{Call, MockLauncher},
    format::OutputFormat,
};
use drawbatch_cli::{Args, run_with_launcher};

/// Demo documents live at the workspace root, not in the crate.
fn demos_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

/// Collects all .drawio files from a directory
fn collect_drawio_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("drawio")
                })
                .collect()
        })
        .unwrap_or_default();

    files.sort();
    files
}

fn args(input: &Path, output: &Path, extra: &[&str]) -> Args {
    let mut argv = vec!["drawbatch".to_string(), "--log-level".to_string(), "off".to_string()];
    argv.extend(extra.iter().map(|s| s.to_string()));
    argv.push(input.to_string_lossy().into_owned());
    argv.push(output.to_string_lossy().into_owned());
    Args::parse_from(argv)
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let demos = collect_drawio_files(&demos_dir());
    assert!(!demos.is_empty(), "No demo documents found in demos/");

    let mut failed = Vec::new();

    for demo in &demos {
        let out_dir = tempdir().expect("Failed to create temp directory");
        let pages = fs::read_to_string(demo).unwrap().matches("<diagram ").count();
        let launcher = MockLauncher::new();

        match run_with_launcher(&args(demo, out_dir.path(), &["-f", "png"]), launcher.clone()) {
            Ok(summary) => {
                assert_eq!(summary.written().count(), pages, "{}", demo.display());
                assert_eq!(launcher.count(&Call::Close), 1);
                for path in summary.written() {
                    assert_eq!(path.parent(), Some(out_dir.path()));
                    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
                    assert!(path.is_file());
                }
            }
            Err(err) => failed.push((demo.clone(), err)),
        }
    }

    if !failed.is_empty() {
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let demos = collect_drawio_files(&demos_dir().join("errors"));
    assert!(!demos.is_empty(), "No error demos found in demos/errors/");

    for demo in &demos {
        let out_dir = tempdir().expect("Failed to create temp directory");
        let launcher = MockLauncher::new();

        let result = run_with_launcher(&args(demo, &out_dir.path().join("out.pdf"), &[]), launcher.clone());

        assert!(
            matches!(result, Err(DrawBatchError::MalformedDocument { .. })),
            "{} did not fail as a malformed document",
            demo.display()
        );
        assert!(launcher.calls().is_empty(), "engine launched for {}", demo.display());
        assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 0);
    }
}

#[test]
fn e2e_single_diagram_selection() {
    let out_dir = tempdir().unwrap();
    let demo = demos_dir().join("architecture.drawio");
    let output = out_dir.path().join("containers.svg");
    let launcher = MockLauncher::new();

    let cli = args(&demo, &output, &["--diagram-id", "1"]);
    assert_eq!(cli.format, OutputFormat::Pdf);
    let summary = run_with_launcher(&cli, launcher.clone()).unwrap();

    assert_eq!(summary.written().collect::<Vec<_>>(), vec![output.as_path()]);
    assert_eq!(launcher.rendered(), vec![1]);

    let svg = fs::read_to_string(&output).unwrap();
    assert!(svg.starts_with("<?xml version=\"1.0\" standalone=\"no\"?>\r\n"));
    assert!(svg.contains("http://www.w3.org/1999/xhtml"));
}

#[test]
fn e2e_unsupported_output_extension() {
    let out_dir = tempdir().unwrap();
    let demo = demos_dir().join("single-page.drawio");
    let launcher = MockLauncher::new();

    let result = run_with_launcher(&args(&demo, &out_dir.path().join("out.tiff"), &[]), launcher.clone());

    assert!(matches!(result, Err(DrawBatchError::UnsupportedFormat(_))));
    assert!(launcher.calls().is_empty());
}
