//! # Relatórios da Calibração
//!
//! - `sweep_results.json`: todas as combinações avaliadas e suas contagens.
//! - `good_examples.txt`: links errados que o filtro removeu.
//! - `bad_examples.txt`: links corretos que o filtro removeu por engano.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::calibration::{Example, SweepReport};
use crate::error::{NedError, Result};

pub const RESULTS_FILE: &str = "sweep_results.json";
pub const GOOD_EXAMPLES_FILE: &str = "good_examples.txt";
pub const BAD_EXAMPLES_FILE: &str = "bad_examples.txt";

/// Um exemplo em texto: um campo por linha, seguido de uma linha em branco extra.
pub fn format_example(example: &Example) -> String {
    format!(
        "Sentence: {}\n\
         Year: {}\n\
         Surface form: {}\n\
         Entity linker linked to: {}\n\
         Human annotator linked to: {}\n\
         Temporal similarity: {}\n\
         Spatial similarity: {}\n\
         Similarity score: {}\n\n\n",
        example.sentence,
        example.year,
        example.surface_form.replace('_', " "),
        example.linked_entity,
        example.reference_entity,
        example.temporal,
        example.spatial,
        example.confidence,
    )
}

pub fn write_examples(path: impl AsRef<Path>, examples: &[Example]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| NedError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for example in examples {
        writer
            .write_all(format_example(example).as_bytes())
            .map_err(|e| NedError::io(path, e))?;
    }
    writer.flush().map_err(|e| NedError::io(path, e))
}

pub fn write_sweep_results(path: impl AsRef<Path>, report: &SweepReport) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| NedError::io(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    Ok(())
}

/// Grava os três arquivos em `dir` (criado se necessário) e retorna seus caminhos.
pub fn write_report(dir: impl AsRef<Path>, report: &SweepReport) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| NedError::io(dir, e))?;

    let results = dir.join(RESULTS_FILE);
    let good = dir.join(GOOD_EXAMPLES_FILE);
    let bad = dir.join(BAD_EXAMPLES_FILE);

    write_sweep_results(&results, report)?;
    write_examples(&good, &report.good_examples)?;
    write_examples(&bad, &report.bad_examples)?;

    info!("Relatórios gravados em {}", dir.display());
    Ok(vec![results, good, bad])
}
