//! # Motor de Assinaturas Espaciais
//!
//! Representa um conjunto de locais como a média ponderada dos seus embeddings.
//!
//! 1. Cada local ("New York City") é dividido em palavras; o embedding do local é a
//!    média dos vetores das palavras encontradas no vocabulário.
//! 2. O embedding do conjunto é a média ponderada dos embeddings dos locais.
//!
//! Para uma **entidade**, os locais e pesos vêm da assinatura espacial do artigo.
//! Para um **documento**, os locais vêm do extrator de NER e os pesos da frequência
//! das palavras do local na própria sentença.

use std::sync::Arc;

use crate::embeddings::WordVectorLookup;
use crate::error::{NedError, Result};
use crate::signature::SignatureStore;
use crate::similarity::{cosine, Similarity};

/// Embedding de um local: média dos vetores das suas palavras (em minúsculas).
///
/// Retorna `None` se nenhuma palavra estiver no vocabulário.
fn location_embedding(location: &str, vectors: &dyn WordVectorLookup) -> Option<Vec<f64>> {
    let mut sum: Vec<f64> = Vec::new();
    let mut found = 0usize;

    for word in location.split_whitespace() {
        let Some(v) = vectors.vector(&word.to_lowercase()) else {
            continue;
        };
        if sum.is_empty() {
            sum = vec![0.0; v.len()];
        } else if sum.len() != v.len() {
            continue;
        }
        for (acc, x) in sum.iter_mut().zip(v) {
            *acc += x;
        }
        found += 1;
    }

    if found == 0 {
        return None;
    }
    Some(sum.into_iter().map(|x| x / found as f64).collect())
}

/// Média ponderada dos embeddings dos locais.
///
/// Locais sem nenhuma palavra conhecida não contribuem nem com embedding nem com
/// peso. Retorna um vetor vazio se nenhum local produzir embedding (ou se a soma
/// dos pesos dos locais restantes for zero).
pub fn weighted_average_embedding<S: AsRef<str>>(
    locations: &[S],
    weights: &[f64],
    vectors: &dyn WordVectorLookup,
) -> Vec<f64> {
    let mut acc: Vec<f64> = Vec::new();
    let mut total_weight = 0.0;

    for (location, &weight) in locations.iter().zip(weights.iter()) {
        let Some(embedding) = location_embedding(location.as_ref(), vectors) else {
            continue;
        };
        if acc.is_empty() {
            acc = vec![0.0; embedding.len()];
        } else if acc.len() != embedding.len() {
            continue;
        }
        for (a, x) in acc.iter_mut().zip(embedding.iter()) {
            *a += weight * x;
        }
        total_weight += weight;
    }

    if acc.is_empty() || total_weight == 0.0 {
        return Vec::new();
    }
    acc.into_iter().map(|x| x / total_weight).collect()
}

/// Pesos dos locais de um documento.
///
/// Para cada palavra do local conta quantas vezes ela aparece (sem diferenciar
/// maiúsculas) entre as palavras da sentença; contagem zero vira 1. Apenas a
/// contagem da ÚLTIMA palavra do local é mantida.
pub fn document_location_weights<S: AsRef<str>>(locations: &[S], sentence: &str) -> Vec<f64> {
    let sentence_words: Vec<String> = sentence
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    locations
        .iter()
        .map(|location| {
            let mut count = 1usize;
            for word in location.as_ref().split_whitespace() {
                let word = word.to_lowercase();
                count = sentence_words.iter().filter(|w| **w == word).count();
                if count == 0 {
                    count = 1;
                }
            }
            count as f64
        })
        .collect()
}

/// Motor espacial sobre o armazém de assinaturas e um vocabulário de embeddings.
#[derive(Clone)]
pub struct SpatialEngine {
    store: Arc<SignatureStore>,
    vectors: Arc<dyn WordVectorLookup>,
}

impl std::fmt::Debug for SpatialEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialEngine")
            .field("spatial_signatures", &self.store.spatial_len())
            .field("dimension", &self.vectors.dimension())
            .finish()
    }
}

impl SpatialEngine {
    pub fn new(store: Arc<SignatureStore>, vectors: Arc<dyn WordVectorLookup>) -> Self {
        Self { store, vectors }
    }

    pub fn signatures(&self) -> usize {
        self.store.spatial_len()
    }

    /// Embedding da entidade.
    ///
    /// Uma assinatura existente cujos locais são todos desconhecidos produz um
    /// vetor vazio.
    pub fn signature_for_entity(&self, entity: &str) -> Result<Vec<f64>> {
        let signature = self
            .store
            .spatial(entity)
            .ok_or_else(|| NedError::EntityNotFound(entity.to_string()))?;
        Ok(weighted_average_embedding(
            &signature.indices,
            &signature.counts,
            self.vectors.as_ref(),
        ))
    }

    /// Embedding que representa todos os locais mencionados em um documento.
    pub fn embedding_for_document<S: AsRef<str>>(&self, locations: &[S], sentence: &str) -> Vec<f64> {
        let weights = document_location_weights(locations, sentence);
        weighted_average_embedding(locations, &weights, self.vectors.as_ref())
    }

    /// Similaridade entre a entidade e um embedding de documento já calculado.
    pub fn similarity_to(&self, entity: &str, document_embedding: &[f64]) -> Similarity {
        match self.signature_for_entity(entity) {
            Ok(signature) => cosine(&signature, document_embedding).into(),
            Err(_) => Similarity::Unavailable,
        }
    }

    /// Similaridade entre a entidade e os locais mencionados na sentença.
    pub fn similarity<S: AsRef<str>>(&self, entity: &str, locations: &[S], sentence: &str) -> Similarity {
        if locations.is_empty() {
            return Similarity::Unavailable;
        }
        let document = self.embedding_for_document(locations, sentence);
        self.similarity_to(entity, &document)
    }
}
