//! # Índice de Verdade de Referência
//!
//! Compara as anotações do linker com as anotações manuais de cada documento.
//! Uma anotação automática cuja forma de superfície coincide com uma âncora
//! manual é classificada como correta (mesma entidade) ou incorreta (entidade
//! diferente). As demais não têm verdade conhecida.
//!
//! O índice é construído uma única vez, sobre o conjunto de dados sem filtragem,
//! antes de qualquer calibração.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataset::{Document, LinkerAnnotation};

/// Resultado da comparação de uma anotação automática com as manuais do documento.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// O linker escolheu a mesma entidade que o anotador humano.
    Correct { reference: String },
    /// O linker escolheu outra entidade; `reference` é a escolha humana.
    Incorrect { reference: String },
    /// Nenhuma âncora manual com a mesma forma de superfície.
    Unmatched,
}

/// Classifica cada anotação do linker de um documento, na mesma ordem.
///
/// Havendo âncoras manuais repetidas, vale a primeira.
pub fn classify_document(document: &Document) -> Vec<LinkOutcome> {
    let manual: Vec<(String, &str)> = document
        .annotations
        .iter()
        .map(|a| (a.normalized_anchor(), a.entity_key()))
        .collect();

    document
        .linked_annotations()
        .iter()
        .map(|ann| {
            let term = ann.normalized_surface_form();
            match manual.iter().find(|(anchor, _)| *anchor == term) {
                Some((_, reference)) if *reference == ann.entity_key() => LinkOutcome::Correct {
                    reference: reference.to_string(),
                },
                Some((_, reference)) => LinkOutcome::Incorrect {
                    reference: reference.to_string(),
                },
                None => LinkOutcome::Unmatched,
            }
        })
        .collect()
}

/// Contagem de links corretos e incorretos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTally {
    pub correct: usize,
    pub incorrect: usize,
}

impl LinkTally {
    pub fn record(&mut self, outcome: &LinkOutcome) {
        match outcome {
            LinkOutcome::Correct { .. } => self.correct += 1,
            LinkOutcome::Incorrect { .. } => self.incorrect += 1,
            LinkOutcome::Unmatched => {}
        }
    }

    /// `correct / (correct + incorrect)`, ou `None` se não houver links avaliáveis.
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.correct + self.incorrect;
        if total == 0 {
            None
        } else {
            Some(self.correct as f64 / total as f64)
        }
    }
}

/// Acurácia da desambiguação sobre todos os links de um conjunto de documentos.
pub fn link_accuracy(documents: &[Document]) -> LinkTally {
    let mut tally = LinkTally::default();
    for doc in documents {
        for outcome in classify_document(doc) {
            tally.record(&outcome);
        }
    }
    tally
}

/// Identifica um link: (forma de superfície normalizada, entidade ligada, sentença).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkKey {
    pub surface_form: String,
    pub entity: String,
    pub sentence: String,
}

impl LinkKey {
    pub fn new(annotation: &LinkerAnnotation, sentence: &str) -> Self {
        Self {
            surface_form: annotation.normalized_surface_form(),
            entity: annotation.entity_key().to_string(),
            sentence: sentence.to_string(),
        }
    }
}

/// O que a verdade de referência diz sobre um link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTruth<'a> {
    LinkedCorrectly { reference: &'a str },
    LinkedIncorrectly { reference: &'a str },
    Unknown,
}

/// Links que o linker acertou e errou no conjunto original, com a entidade correta.
#[derive(Debug, Clone, Default)]
pub struct GroundTruthIndex {
    correct: HashMap<LinkKey, String>,
    incorrect: HashMap<LinkKey, String>,
    /// Total de links errados, contando repetições.
    known_wrong_links: usize,
    baseline: LinkTally,
}

impl GroundTruthIndex {
    pub fn build(documents: &[Document]) -> Self {
        let mut index = GroundTruthIndex::default();

        for doc in documents {
            let outcomes = classify_document(doc);
            for (ann, outcome) in doc.linked_annotations().iter().zip(outcomes.iter()) {
                index.baseline.record(outcome);
                match outcome {
                    LinkOutcome::Correct { reference } => {
                        index
                            .correct
                            .entry(LinkKey::new(ann, &doc.sentence))
                            .or_insert_with(|| reference.clone());
                    }
                    LinkOutcome::Incorrect { reference } => {
                        index.known_wrong_links += 1;
                        index
                            .incorrect
                            .entry(LinkKey::new(ann, &doc.sentence))
                            .or_insert_with(|| reference.clone());
                    }
                    LinkOutcome::Unmatched => {}
                }
            }
        }

        index
    }

    /// Consulta um link. Os links corretos têm precedência.
    pub fn lookup(&self, key: &LinkKey) -> GroundTruth<'_> {
        if let Some(reference) = self.correct.get(key) {
            GroundTruth::LinkedCorrectly { reference }
        } else if let Some(reference) = self.incorrect.get(key) {
            GroundTruth::LinkedIncorrectly { reference }
        } else {
            GroundTruth::Unknown
        }
    }

    /// O link foi errado em alguma ocorrência, mesmo que também tenha sido
    /// acertado em outra (a mesma sentença anotada duas vezes).
    pub fn is_known_wrong(&self, key: &LinkKey) -> bool {
        self.incorrect.contains_key(key)
    }

    /// Acurácia do linker no conjunto sem filtragem.
    pub fn baseline(&self) -> LinkTally {
        self.baseline
    }

    pub fn known_wrong_links(&self) -> usize {
        self.known_wrong_links
    }
}
