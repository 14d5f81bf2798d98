//! # Calibração por Busca em Grade
//!
//! Avalia todas as combinações (limiar, α, β, γ) da [`SweepGrid`] sobre um
//! conjunto de dados com verdade de referência e escolhe a que maximiza a
//! acurácia dos links que sobrevivem ao filtro.
//!
//! ## Classificação das decisões
//!
//! - **Remoção correta**: o link descartado estava errado.
//! - **Remoção incorreta**: o link descartado estava certo.
//! - **Remoção desconhecida**: não há verdade de referência para o link.
//! - **Detecção perdida**: um link sabidamente errado foi mantido.
//!
//! ## Custo
//!
//! A comparação de cada anotação com a verdade de referência é feita uma única
//! vez, em [`Calibration::new`]. Cada ponto da grade só percorre essa lista
//! pré-computada e devolve um registro de contagens; o conjunto de dados nunca é
//! copiado. Os pontos de um mesmo limiar são avaliados em paralelo (Rayon).

use std::sync::mpsc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{GridPoint, SweepGrid};
use crate::dataset::Document;
use crate::error::{NedError, Result};
use crate::fusion::{decide, score, Decision, FusionWeights};
use crate::ground_truth::{classify_document, GroundTruth, GroundTruthIndex, LinkKey, LinkOutcome, LinkTally};
use crate::similarity::Similarity;

/// Anotação pronta para a calibração: sinais + comparações com a verdade.
#[derive(Debug, Clone)]
struct PreparedAnnotation {
    document: usize,
    annotation: usize,
    confidence: f64,
    temporal: Similarity,
    spatial: Similarity,
    /// Comparação com as âncoras manuais do próprio documento (acurácia).
    outcome: LinkOutcome,
    /// Classificação pelo índice de verdade (remoções).
    truth: Truth,
    /// Mantido, conta como detecção perdida.
    known_wrong: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Truth {
    LinkedCorrectly { reference: String },
    LinkedIncorrectly { reference: String },
    Unknown,
}

impl From<GroundTruth<'_>> for Truth {
    fn from(truth: GroundTruth<'_>) -> Self {
        match truth {
            GroundTruth::LinkedCorrectly { reference } => Truth::LinkedCorrectly {
                reference: reference.to_string(),
            },
            GroundTruth::LinkedIncorrectly { reference } => Truth::LinkedIncorrectly {
                reference: reference.to_string(),
            },
            GroundTruth::Unknown => Truth::Unknown,
        }
    }
}

/// Contagens de um ponto da grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPointResult {
    #[serde(flatten)]
    pub point: GridPoint,
    pub annotations: usize,
    pub unknown_removals: usize,
    pub correct_removals: usize,
    pub incorrect_removals: usize,
    pub missed_detections: usize,
    /// Acurácia dos links mantidos; `None` se nenhum link avaliável sobreviveu.
    pub accuracy: Option<f64>,
}

impl GridPointResult {
    pub fn removals(&self) -> usize {
        self.unknown_removals + self.correct_removals + self.incorrect_removals
    }
}

/// Um link descartado com verdade conhecida, para os relatórios de exemplos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub sentence: String,
    pub year: i64,
    pub surface_form: String,
    pub linked_entity: String,
    pub reference_entity: String,
    pub temporal: Similarity,
    pub spatial: Similarity,
    pub confidence: f64,
}

/// Percentuais sobre as remoções do melhor ponto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemovalSummary {
    /// Remoções de links corretos, em % de todas as remoções.
    pub incorrect_removal_pct: Option<f64>,
    /// Remoções de links errados, em % de todas as remoções.
    pub correct_removal_pct: Option<f64>,
    /// Fração dos links sabidamente errados que foram mantidos.
    pub missed_detection_ratio: Option<f64>,
}

/// Resultado completo de uma calibração.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub grid: SweepGrid,
    /// Acurácia do linker sem filtragem.
    pub baseline: LinkTally,
    pub baseline_accuracy: Option<f64>,
    pub results: Vec<GridPointResult>,
    pub best: GridPointResult,
    /// Links errados descartados no melhor ponto.
    pub good_examples: Vec<Example>,
    /// Links corretos descartados por engano no melhor ponto.
    pub bad_examples: Vec<Example>,
    pub summary: RemovalSummary,
    /// (limiar, acurácia) com α, β e γ fixos nos valores do melhor ponto.
    pub threshold_curve: Vec<(f64, Option<f64>)>,
}

/// Eventos emitidos durante a calibração, para acompanhar o progresso.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SweepEvent {
    Started {
        grid_points: usize,
        annotations: usize,
        baseline_accuracy: Option<f64>,
    },
    /// Todos os pontos de um limiar foram avaliados.
    ThresholdDone {
        threshold: f64,
        evaluated: usize,
        best_accuracy: Option<f64>,
    },
    Done {
        report: Box<SweepReport>,
    },
    Error {
        message: String,
    },
}

/// Conjunto de dados preparado para a busca em grade.
pub struct Calibration<'a> {
    documents: &'a [Document],
    index: GroundTruthIndex,
    prepared: Vec<PreparedAnnotation>,
}

impl<'a> Calibration<'a> {
    /// Constrói o índice de verdade e classifica cada anotação uma única vez.
    pub fn new(documents: &'a [Document]) -> Self {
        let index = GroundTruthIndex::build(documents);

        let mut prepared = Vec::new();
        for (d, doc) in documents.iter().enumerate() {
            let outcomes = classify_document(doc);
            for (a, (ann, outcome)) in doc.linked_annotations().iter().zip(outcomes).enumerate() {
                let key = LinkKey::new(ann, &doc.sentence);
                let truth = index.lookup(&key).into();
                let known_wrong = index.is_known_wrong(&key);
                prepared.push(PreparedAnnotation {
                    document: d,
                    annotation: a,
                    confidence: ann.confidence,
                    temporal: ann.temporal,
                    spatial: ann.spatial,
                    outcome,
                    truth,
                    known_wrong,
                });
            }
        }

        Self {
            documents,
            index,
            prepared,
        }
    }

    pub fn ground_truth(&self) -> &GroundTruthIndex {
        &self.index
    }

    pub fn annotations(&self) -> usize {
        self.prepared.len()
    }

    fn decisions<'s>(
        &'s self,
        point: &GridPoint,
        weights: &'s FusionWeights,
    ) -> impl Iterator<Item = (&'s PreparedAnnotation, Decision)> + 's {
        let threshold = point.threshold;
        self.prepared.iter().map(move |p| {
            let fs = score(p.confidence, p.temporal, p.spatial, weights);
            (p, decide(fs, threshold))
        })
    }

    /// Avalia um ponto da grade.
    pub fn evaluate(&self, point: &GridPoint) -> Result<GridPointResult> {
        let weights = point.weights()?;
        let mut result = GridPointResult {
            point: *point,
            annotations: self.prepared.len(),
            unknown_removals: 0,
            correct_removals: 0,
            incorrect_removals: 0,
            missed_detections: 0,
            accuracy: None,
        };
        let mut kept = LinkTally::default();

        for (p, decision) in self.decisions(point, &weights) {
            match decision {
                Decision::Keep => {
                    kept.record(&p.outcome);
                    if p.known_wrong {
                        result.missed_detections += 1;
                    }
                }
                Decision::Drop => match p.truth {
                    Truth::LinkedCorrectly { .. } => result.incorrect_removals += 1,
                    Truth::LinkedIncorrectly { .. } => result.correct_removals += 1,
                    Truth::Unknown => result.unknown_removals += 1,
                },
            }
        }

        result.accuracy = kept.accuracy();
        Ok(result)
    }

    /// Exemplos de um ponto: (erros capturados, links corretos removidos).
    pub fn examples(&self, point: &GridPoint) -> Result<(Vec<Example>, Vec<Example>)> {
        let weights = point.weights()?;
        let mut good = Vec::new();
        let mut bad = Vec::new();

        for (p, decision) in self.decisions(point, &weights) {
            if decision == Decision::Keep {
                continue;
            }
            match &p.truth {
                Truth::LinkedCorrectly { reference } => bad.push(self.example(p, reference)),
                Truth::LinkedIncorrectly { reference } => good.push(self.example(p, reference)),
                Truth::Unknown => {}
            }
        }
        Ok((good, bad))
    }

    fn example(&self, p: &PreparedAnnotation, reference: &str) -> Example {
        let doc = &self.documents[p.document];
        let ann = &doc.linked_annotations()[p.annotation];
        Example {
            sentence: doc.sentence.clone(),
            year: doc.year,
            surface_form: ann.normalized_surface_form(),
            linked_entity: ann.entity_key().to_string(),
            reference_entity: reference.to_string(),
            temporal: p.temporal,
            spatial: p.spatial,
            confidence: p.confidence,
        }
    }

    /// Executa a busca em grade completa e retorna o relatório.
    pub fn sweep(&self, grid: &SweepGrid) -> Result<SweepReport> {
        grid.validate()?;

        let (tx, rx) = mpsc::channel();
        self.sweep_streaming(grid, tx);

        let mut report = None;
        while let Ok(event) = rx.recv() {
            match event {
                SweepEvent::Done { report: r } => report = Some(*r),
                SweepEvent::Error { message } => return Err(NedError::Configuration(message)),
                _ => {}
            }
        }
        report.ok_or_else(|| NedError::Configuration("calibração terminou sem resultado".into()))
    }

    /// Executa a busca em grade enviando eventos de progresso pelo canal `tx`.
    ///
    /// # Fluxo de Eventos
    /// 1. `Started`
    /// 2. `ThresholdDone` (um por limiar)
    /// 3. `Done` com o relatório, ou `Error` se a grade for inválida
    pub fn sweep_streaming(&self, grid: &SweepGrid, tx: mpsc::Sender<SweepEvent>) {
        if let Err(e) = grid.validate() {
            let _ = tx.send(SweepEvent::Error { message: e.to_string() });
            return;
        }

        let baseline = self.index.baseline();
        info!(
            "Calibrando {} pontos sobre {} anotações (acurácia base: {:?})",
            grid.len(),
            self.prepared.len(),
            baseline.accuracy()
        );
        let _ = tx.send(SweepEvent::Started {
            grid_points: grid.len(),
            annotations: self.prepared.len(),
            baseline_accuracy: baseline.accuracy(),
        });

        let mut results = Vec::with_capacity(grid.len());
        for threshold in grid.thresholds.values() {
            let points = grid.points_for_threshold(threshold);
            let evaluated: Result<Vec<GridPointResult>> =
                points.par_iter().map(|p| self.evaluate(p)).collect();
            let evaluated = match evaluated {
                Ok(v) => v,
                Err(e) => {
                    let _ = tx.send(SweepEvent::Error { message: e.to_string() });
                    return;
                }
            };

            let best_accuracy = best_of(&evaluated).and_then(|r| r.accuracy);
            debug!("Limiar {:.2}: melhor acurácia {:?}", threshold, best_accuracy);
            let _ = tx.send(SweepEvent::ThresholdDone {
                threshold,
                evaluated: evaluated.len(),
                best_accuracy,
            });
            results.extend(evaluated);
        }

        match self.build_report(grid, results) {
            Ok(report) => {
                let _ = tx.send(SweepEvent::Done {
                    report: Box::new(report),
                });
            }
            Err(e) => {
                let _ = tx.send(SweepEvent::Error { message: e.to_string() });
            }
        }
    }

    fn build_report(&self, grid: &SweepGrid, results: Vec<GridPointResult>) -> Result<SweepReport> {
        let best = *best_of(&results)
            .ok_or_else(|| NedError::Configuration("grade sem pontos".into()))?;
        let (good_examples, bad_examples) = self.examples(&best.point)?;

        info!(
            "Melhor configuração: limiar={:.2} alpha={:.2} beta={:.2} gamma={:.2} acurácia={:?}",
            best.point.threshold, best.point.alpha, best.point.beta, best.point.gamma, best.accuracy
        );

        let threshold_curve = results
            .iter()
            .filter(|r| {
                r.point.alpha == best.point.alpha
                    && r.point.beta == best.point.beta
                    && r.point.gamma == best.point.gamma
            })
            .map(|r| (r.point.threshold, r.accuracy))
            .collect();

        let baseline = self.index.baseline();
        Ok(SweepReport {
            grid: *grid,
            baseline,
            baseline_accuracy: baseline.accuracy(),
            summary: summarize(&best, self.index.known_wrong_links()),
            best,
            results,
            good_examples,
            bad_examples,
            threshold_curve,
        })
    }
}

/// Ponto de maior acurácia; em caso de empate vale o primeiro na ordem da grade.
fn best_of(results: &[GridPointResult]) -> Option<&GridPointResult> {
    let mut best: Option<&GridPointResult> = None;
    for r in results {
        let better = match best {
            None => true,
            Some(b) => match (r.accuracy, b.accuracy) {
                (Some(x), Some(y)) => x > y,
                (Some(_), None) => true,
                _ => false,
            },
        };
        if better {
            best = Some(r);
        }
    }
    best
}

fn percentage(part: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64 * 100.0)
}

fn summarize(best: &GridPointResult, known_wrong_links: usize) -> RemovalSummary {
    let removals = best.removals();
    RemovalSummary {
        incorrect_removal_pct: percentage(best.incorrect_removals, removals),
        correct_removal_pct: percentage(best.correct_removals, removals),
        missed_detection_ratio: (known_wrong_links > 0)
            .then(|| best.missed_detections as f64 / known_wrong_links as f64),
    }
}
