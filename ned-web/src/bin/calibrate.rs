//! Calibração offline dos pesos e do limiar de filtragem
//!
//! Uso: `calibrate [--enrich] [--legacy]`
//!
//! Lê o conjunto de `NED_DATASET`. Com `--legacy`, um `-1` no arquivo marca
//! similaridade ausente. Com `--enrich`, recalcula as similaridades temporal e
//! espacial antes de calibrar e grava o conjunto enriquecido em `NED_OUTPUT_DIR`.

use anyhow::Context;
use ned_core::{
    calibration::Calibration,
    config::{NedConfig, SweepGrid},
    dataset::{load_dataset, load_legacy_dataset, save_dataset},
    report::write_report,
    NedEngine,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const ENRICHED_DATASET_FILE: &str = "enriched_dataset.json";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let enrich = args.iter().any(|a| a == "--enrich");
    let legacy = args.iter().any(|a| a == "--legacy");
    let config = NedConfig::from_env();

    let dataset_path = config
        .dataset
        .as_ref()
        .context("NED_DATASET não definido")?;
    let loaded = if legacy {
        load_legacy_dataset(dataset_path)
    } else {
        load_dataset(dataset_path)
    };
    let mut documents = loaded.with_context(|| format!("falha ao ler {}", dataset_path.display()))?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("falha ao criar {}", config.output_dir.display()))?;

    if enrich {
        let engine = NedEngine::load(&config).context("falha ao carregar os recursos")?;
        documents = engine.enrich(&documents);
        let path = config.output_dir.join(ENRICHED_DATASET_FILE);
        save_dataset(&path, &documents)?;
        info!("Conjunto enriquecido salvo em {}", path.display());
    }

    let calibration = Calibration::new(&documents);
    let report = calibration.sweep(&SweepGrid::default())?;

    let best = &report.best;
    info!(
        "Melhor configuração: limiar={:.2} α={:.2} β={:.2} γ={:.2} acurácia={:?} (base: {:?})",
        best.point.threshold,
        best.point.alpha,
        best.point.beta,
        best.point.gamma,
        best.accuracy,
        report.baseline_accuracy
    );
    info!(
        "Remoções: {} corretas, {} incorretas, {} sem referência; {} erros mantidos",
        best.correct_removals, best.incorrect_removals, best.unknown_removals, best.missed_detections
    );
    info!(
        "Remoções incorretas: {:?}% | corretas: {:?}% | erros não detectados: {:?}",
        report.summary.incorrect_removal_pct,
        report.summary.correct_removal_pct,
        report.summary.missed_detection_ratio
    );

    write_report(&config.output_dir, &report)?;
    Ok(())
}
