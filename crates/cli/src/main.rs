use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use snapsort_core::classification::config::ClassifierConfig;
use snapsort_core::classification::policy::ClassificationPolicy;
use snapsort_core::detection::infrastructure::cascade_face_detector::CascadeFaceDetector;
use snapsort_core::detection::infrastructure::model_resolver;
use snapsort_core::imaging::infrastructure::image_file_decoder::ImageFileDecoder;
use snapsort_core::organize::domain::photo_store::PhotoStore;
use snapsort_core::organize::infrastructure::category_folder_store::CategoryFolderStore;
use snapsort_core::pipeline::organize_photos_use_case::OrganizePhotosUseCase;
use snapsort_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use snapsort_core::shared::constants::DEFAULT_OUTPUT_DIR;

/// Sort a folder of photos into document, selfie, people, nature and
/// unknown folders.
#[derive(Parser, Debug)]
#[command(name = "snapsort", version)]
struct Cli {
    /// Folder containing the photos to classify.
    source: PathBuf,

    /// Output folder for the organized photos.
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// JSON file overriding classifier thresholds.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Haar cascade XML to use instead of the cached default.
    #[arg(long)]
    cascade: Option<PathBuf>,

    /// Folder searched for the face cascade before the user cache.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Write per-file results and diagnostics as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Classify and report without copying anything.
    #[arg(long)]
    dry_run: bool,

    /// Face search pyramid step (at least 1.01).
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Raw detections that must agree before a face is accepted.
    #[arg(long)]
    min_neighbors: Option<u32>,

    /// Minimum face-area share for a lone face to count as a selfie.
    #[arg(long)]
    selfie_prominence: Option<f64>,

    /// Combined green and blue share that marks a nature photo.
    #[arg(long)]
    nature_threshold: Option<f64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if !cli.source.is_dir() {
        return Err(format!("Source folder does not exist: {}", cli.source.display()).into());
    }

    let config = load_config(&cli)?;
    let cascade_path = model_resolver::resolve_cascade(
        cli.cascade.as_deref(),
        cli.models_dir.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    let detector = CascadeFaceDetector::from_file(&cascade_path, config.face.clone())?;
    let policy = ClassificationPolicy::new(config, Box::new(detector))?;

    let store: Box<dyn PhotoStore> = if cli.dry_run {
        log::info!("Dry run: no files will be copied");
        Box::new(CategoryFolderStore::dry_run(&cli.output))
    } else {
        Box::new(CategoryFolderStore::create(&cli.output)?)
    };

    let mut use_case = OrganizePhotosUseCase::new(
        Box::new(ImageFileDecoder::new()),
        policy,
        store,
        Box::new(StdoutPipelineLogger::default()),
    );
    let summary = use_case.execute(&cli.source)?;

    println!("\n{}", summary.render());

    if let Some(report) = &cli.report {
        fs::write(report, serde_json::to_string_pretty(summary.files())?)?;
        log::info!("Report written to {}", report.display());
    }
    Ok(())
}

/// Defaults, then the JSON file, then command-line overrides.
fn load_config(cli: &Cli) -> Result<ClassifierConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ClassifierConfig::from_json_file(path)?,
        None => ClassifierConfig::default(),
    };
    apply_overrides(cli, &mut config);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut ClassifierConfig) {
    if let Some(v) = cli.scale_factor {
        config.face.scale_factor = v;
    }
    if let Some(v) = cli.min_neighbors {
        config.face.min_neighbors = v;
    }
    if let Some(v) = cli.selfie_prominence {
        config.person.selfie_prominence = v;
    }
    if let Some(v) = cli.nature_threshold {
        config.nature.combined_threshold = v;
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face cascade... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face cascade... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("snapsort").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["photos"]);
        assert_eq!(cli.source, PathBuf::from("photos"));
        assert_eq!(cli.output, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert!(!cli.dry_run);
        assert!(cli.report.is_none());
        assert!(cli.models_dir.is_none());
    }

    #[test]
    fn test_models_dir_and_cascade_paths() {
        let cli = parse(&["photos", "--models-dir", "share/snapsort", "--cascade", "faces.xml"]);
        assert_eq!(cli.models_dir, Some(PathBuf::from("share/snapsort")));
        assert_eq!(cli.cascade, Some(PathBuf::from("faces.xml")));
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = parse(&[
            "photos",
            "-o",
            "sorted",
            "--min-neighbors",
            "3",
            "--selfie-prominence",
            "0.12",
            "--nature-threshold",
            "0.5",
        ]);
        let mut config = ClassifierConfig::default();
        apply_overrides(&cli, &mut config);
        assert_eq!(cli.output, PathBuf::from("sorted"));
        assert_eq!(config.face.min_neighbors, 3);
        assert_eq!(config.person.selfie_prominence, 0.12);
        assert_eq!(config.nature.combined_threshold, 0.5);
        assert_eq!(config.face.scale_factor, 1.1);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let cli = parse(&["photos", "--selfie-prominence=-0.2"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["snapsort"]).is_err());
    }
}
