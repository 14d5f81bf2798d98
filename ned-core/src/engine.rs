//! # Motor de Filtragem
//!
//! Reúne os recursos carregados na inicialização (assinaturas, vetores de
//! palavras, extrator de locais) e oferece as operações usadas pelo servidor e
//! pelo binário de calibração.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::NedConfig;
use crate::dataset::Document;
use crate::embeddings::{WordVectorLookup, WordVectors};
use crate::enrichment::{enrich_spatial, enrich_temporal};
use crate::error::Result;
use crate::fusion::{decide, score, Decision, FusionWeights};
use crate::locations::{GazetteerLocations, LocationExtractor};
use crate::signature::SignatureStore;
use crate::similarity::Similarity;
use crate::spatial::SpatialEngine;
use crate::temporal::TemporalEngine;

/// Sinais calculados para uma entidade em um documento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySignals {
    pub entity: String,
    pub temporal: Similarity,
    pub spatial: Similarity,
    /// Locais encontrados na sentença.
    pub locations: Vec<String>,
}

/// Score fundido e decisão para uma anotação.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredLink {
    pub score: f64,
    pub decision: Decision,
}

/// Decide uma anotação isolada.
pub fn score_link(
    confidence: f64,
    temporal: Similarity,
    spatial: Similarity,
    weights: &FusionWeights,
    threshold: f64,
) -> ScoredLink {
    let fs = score(confidence, temporal, spatial, weights);
    ScoredLink {
        score: fs,
        decision: decide(fs, threshold),
    }
}

/// Motores temporal e espacial + extrator de locais, somente leitura.
#[derive(Clone)]
pub struct NedEngine {
    pub temporal: TemporalEngine,
    pub spatial: SpatialEngine,
    extractor: Arc<dyn LocationExtractor>,
}

impl NedEngine {
    pub fn new(
        store: Arc<SignatureStore>,
        vectors: Arc<dyn WordVectorLookup>,
        extractor: Arc<dyn LocationExtractor>,
    ) -> Self {
        Self {
            temporal: TemporalEngine::new(Arc::clone(&store)),
            spatial: SpatialEngine::new(store, vectors),
            extractor,
        }
    }

    /// Carrega assinaturas, vetores e gazetteer a partir da configuração.
    pub fn load(config: &NedConfig) -> Result<Self> {
        let mut store = SignatureStore::new();
        store.load_temporal(&config.temporal_signatures)?;
        store.load_spatial(&config.spatial_signatures)?;

        let vectors = WordVectors::load_word2vec_text(&config.word_vectors)?;

        let gazetteer = match &config.gazetteer {
            Some(path) => GazetteerLocations::load(path)?,
            None => {
                warn!("Nenhum gazetteer configurado: similaridade espacial ficará indisponível");
                GazetteerLocations::new()
            }
        };

        Ok(Self::new(Arc::new(store), Arc::new(vectors), Arc::new(gazetteer)))
    }

    pub fn locations(&self, sentence: &str) -> Vec<String> {
        self.extractor.locations(sentence)
    }

    /// Similaridades temporal e espacial de uma entidade para uma sentença e um ano.
    pub fn signals(&self, entity: &str, year: i64, sentence: &str) -> EntitySignals {
        let locations = self.locations(sentence);
        EntitySignals {
            entity: entity.to_string(),
            temporal: self.temporal.similarity(entity, year),
            spatial: self.spatial.similarity(entity, &locations, sentence),
            locations,
        }
    }

    /// Enriquecimento temporal seguido do espacial.
    pub fn enrich(&self, documents: &[Document]) -> Vec<Document> {
        let with_temporal = enrich_temporal(documents, &self.temporal);
        enrich_spatial(&with_temporal, &self.spatial, self.extractor.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LinkerAnnotation;
    use crate::signature::{SpatialSignature, TemporalSignature};

    fn engine() -> NedEngine {
        let mut store = SignatureStore::new();
        store.insert_temporal("Berlin_Wall", TemporalSignature::new(vec![1961, 1989], vec![4.0, 9.0]));
        store.insert_spatial(
            "Berlin_Wall",
            SpatialSignature::new(vec!["Berlin".into(), "Germany".into()], vec![7.0, 3.0]),
        );
        let mut vectors = WordVectors::new();
        vectors.insert("berlin", vec![0.9, 0.1]).unwrap();
        vectors.insert("germany", vec![0.7, 0.3]).unwrap();
        let gazetteer: GazetteerLocations = ["Berlin", "Germany"].into_iter().collect();
        NedEngine::new(Arc::new(store), Arc::new(vectors), Arc::new(gazetteer))
    }

    #[test]
    fn test_signals() {
        let signals = engine().signals("Berlin_Wall", 1989, "The wall in Berlin fell");
        assert_eq!(signals.locations, vec!["Berlin"]);
        assert!(signals.temporal.value().unwrap() > 0.5);
        assert!(signals.spatial.value().unwrap() > 0.9);

        let unknown = engine().signals("Nobody", 1989, "No places");
        assert_eq!(unknown.temporal, Similarity::Unavailable);
        assert_eq!(unknown.spatial, Similarity::Unavailable);
    }

    #[test]
    fn test_enrich_fills_both_signals() {
        let mut doc = Document::new("The wall in Berlin fell", 1989);
        doc.linked = Some(vec![LinkerAnnotation::new(
            "http://dbpedia.org/resource/Berlin_Wall",
            "wall",
            0.7,
        )]);
        let enriched = engine().enrich(&[doc]);
        let ann = &enriched[0].linked_annotations()[0];
        assert!(ann.temporal.is_available());
        assert!(ann.spatial.is_available());
    }

    #[test]
    fn test_score_link() {
        let weights = FusionWeights::new(0.3, 0.3, 0.9).unwrap();
        let link = score_link(0.8, Similarity::Available(0.6), Similarity::Unavailable, &weights, 0.5);
        assert!((link.score - 0.6).abs() < 1e-12);
        assert_eq!(link.decision, Decision::Keep);
    }
}
