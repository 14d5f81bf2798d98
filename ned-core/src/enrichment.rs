//! # Enriquecimento do Conjunto de Dados
//!
//! Etapas que anexam às anotações do linker as similaridades temporal e espacial.
//! Cada etapa devolve documentos novos; os originais não são alterados.

use rayon::prelude::*;
use tracing::debug;

use crate::dataset::{Document, LinkerAnnotation};
use crate::locations::LocationExtractor;
use crate::spatial::SpatialEngine;
use crate::temporal::TemporalEngine;

/// Similaridade entre o perfil temporal de cada entidade ligada e o ano do documento.
///
/// Entidades sem assinatura recebem similaridade indisponível.
pub fn enrich_temporal(documents: &[Document], engine: &TemporalEngine) -> Vec<Document> {
    documents
        .par_iter()
        .map(|doc| {
            let Some(linked) = doc.linked.as_ref().filter(|l| !l.is_empty()) else {
                return doc.clone();
            };
            let enriched: Vec<LinkerAnnotation> = linked
                .iter()
                .map(|ann| {
                    let temporal = engine.similarity(ann.entity_key(), doc.year);
                    ann.clone().with_temporal(temporal)
                })
                .collect();
            doc.with_linked(enriched)
        })
        .collect()
}

/// Similaridade entre a assinatura espacial de cada entidade ligada e os locais
/// mencionados na sentença.
///
/// Documentos sem locais mencionados ficam sem similaridade espacial.
pub fn enrich_spatial(
    documents: &[Document],
    engine: &SpatialEngine,
    extractor: &dyn LocationExtractor,
) -> Vec<Document> {
    documents
        .par_iter()
        .map(|doc| {
            let Some(linked) = doc.linked.as_ref().filter(|l| !l.is_empty()) else {
                return doc.clone();
            };
            let locations = extractor.locations(&doc.sentence);
            if locations.is_empty() {
                debug!("Nenhum local em: {}", doc.sentence);
                return doc.clone();
            }

            // O embedding do documento é o mesmo para todas as anotações
            let document_embedding = engine.embedding_for_document(&locations, &doc.sentence);
            let enriched: Vec<LinkerAnnotation> = linked
                .iter()
                .map(|ann| {
                    let spatial = engine.similarity_to(ann.entity_key(), &document_embedding);
                    ann.clone().with_spatial(spatial)
                })
                .collect();
            doc.with_linked(enriched)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::WordVectors;
    use crate::locations::GazetteerLocations;
    use crate::signature::{SignatureStore, SpatialSignature, TemporalSignature};
    use crate::similarity::Similarity;
    use std::sync::Arc;

    fn store() -> Arc<SignatureStore> {
        let mut store = SignatureStore::new();
        store.insert_temporal("Paris", TemporalSignature::new(vec![1990, 1995], vec![3.0, 5.0]));
        store.insert_spatial(
            "Paris",
            SpatialSignature::new(vec!["France".into(), "Paris".into()], vec![2.0, 8.0]),
        );
        Arc::new(store)
    }

    fn document() -> Document {
        let mut doc = Document::new("Paris is the capital of France", 1995);
        doc.linked = Some(vec![
            LinkerAnnotation::new("http://dbpedia.org/resource/Paris", "Paris", 0.9),
            LinkerAnnotation::new("http://dbpedia.org/resource/Paris_Hilton", "Paris", 0.4),
        ]);
        doc
    }

    #[test]
    fn test_enrich_temporal_keeps_original_untouched() {
        let docs = vec![document(), Document::new("Sem anotações", 1900)];
        let engine = TemporalEngine::new(store());
        let enriched = enrich_temporal(&docs, &engine);

        assert_eq!(enriched.len(), 2);
        let anns = enriched[0].linked_annotations();
        assert!(anns[0].temporal.value().unwrap() > 0.0);
        assert_eq!(anns[1].temporal, Similarity::Unavailable);
        assert_eq!(docs[0].linked_annotations()[0].temporal, Similarity::Unavailable);
        assert_eq!(enriched[1], docs[1]);
    }

    #[test]
    fn test_enrich_spatial() {
        let mut vectors = WordVectors::new();
        vectors.insert("paris", vec![1.0, 0.0]).unwrap();
        vectors.insert("france", vec![0.8, 0.2]).unwrap();
        let engine = SpatialEngine::new(store(), Arc::new(vectors));
        let gazetteer: GazetteerLocations = ["Paris", "France"].into_iter().collect();

        let mut no_places = document();
        no_places.sentence = "She arrived yesterday".into();

        let enriched = enrich_spatial(&[document(), no_places], &engine, &gazetteer);
        let anns = enriched[0].linked_annotations();
        assert!(anns[0].spatial.value().unwrap() > 0.9);
        assert_eq!(anns[1].spatial, Similarity::Unavailable);
        assert!(enriched[1]
            .linked_annotations()
            .iter()
            .all(|a| a.spatial == Similarity::Unavailable));
    }
}
