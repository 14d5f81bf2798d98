//! # Conjunto de Dados Anotado
//!
//! Cada documento é uma sentença com um ano, as anotações manuais (verdade de
//! referência) e as anotações automáticas do linker de entidades, possivelmente
//! já enriquecidas com similaridades temporal e espacial.
//!
//! ## Formato JSON
//!
//! ```json
//! [{
//!   "sentence": "...",
//!   "year": 1995,
//!   "annotations": [{"anchor": "Bush", "taIdentRef": "http://dbpedia.org/resource/George_H._W._Bush"}],
//!   "annotations_dbpedia": [{
//!     "URI": "http://dbpedia.org/resource/George_W._Bush",
//!     "surfaceForm": "Bush",
//!     "similarityScore": 0.93,
//!     "temporalSimilarity": 0.41,
//!     "spatialSimilarity": null
//!   }]
//! }]
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{NedError, Result};
use crate::similarity::Similarity;

/// Chave da entidade a partir da URI (último segmento após `/`).
pub fn entity_key_from_uri(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Forma de superfície normalizada: espaços viram `_`, sem bordas, minúsculas.
pub fn normalize_surface_form(surface: &str) -> String {
    surface.replace(' ', "_").trim().to_lowercase()
}

/// Anotação manual (verdade de referência).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldAnnotation {
    pub anchor: String,
    #[serde(rename = "taIdentRef")]
    pub reference: String,
}

impl GoldAnnotation {
    pub fn entity_key(&self) -> &str {
        entity_key_from_uri(&self.reference)
    }

    pub fn normalized_anchor(&self) -> String {
        normalize_surface_form(&self.anchor)
    }
}

/// Anotação candidata produzida pelo linker de entidades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkerAnnotation {
    #[serde(rename = "URI")]
    pub uri: String,
    #[serde(rename = "surfaceForm")]
    pub surface_form: String,
    /// Confiança fornecida pelo linker.
    #[serde(rename = "similarityScore")]
    pub confidence: f64,
    #[serde(rename = "temporalSimilarity", default, skip_serializing_if = "Similarity::is_unavailable")]
    pub temporal: Similarity,
    #[serde(rename = "spatialSimilarity", default, skip_serializing_if = "Similarity::is_unavailable")]
    pub spatial: Similarity,
    /// Demais campos do linker (tipos, offset, ...), preservados na regravação.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LinkerAnnotation {
    pub fn new(uri: impl Into<String>, surface_form: impl Into<String>, confidence: f64) -> Self {
        Self {
            uri: uri.into(),
            surface_form: surface_form.into(),
            confidence,
            temporal: Similarity::Unavailable,
            spatial: Similarity::Unavailable,
            extra: BTreeMap::new(),
        }
    }

    pub fn entity_key(&self) -> &str {
        entity_key_from_uri(&self.uri)
    }

    pub fn normalized_surface_form(&self) -> String {
        normalize_surface_form(&self.surface_form)
    }

    pub fn with_temporal(mut self, temporal: Similarity) -> Self {
        self.temporal = temporal;
        self
    }

    pub fn with_spatial(mut self, spatial: Similarity) -> Self {
        self.spatial = spatial;
        self
    }
}

/// Um documento do conjunto de dados.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub sentence: String,
    pub year: i64,
    #[serde(default)]
    pub annotations: Vec<GoldAnnotation>,
    /// `null` quando o linker não retornou nada.
    #[serde(rename = "annotations_dbpedia", default)]
    pub linked: Option<Vec<LinkerAnnotation>>,
}

impl Document {
    pub fn new(sentence: impl Into<String>, year: i64) -> Self {
        Self {
            sentence: sentence.into(),
            year,
            annotations: Vec::new(),
            linked: None,
        }
    }

    pub fn linked_annotations(&self) -> &[LinkerAnnotation] {
        self.linked.as_deref().unwrap_or(&[])
    }

    /// Cópia do documento com outra lista de anotações do linker.
    pub fn with_linked(&self, linked: Vec<LinkerAnnotation>) -> Self {
        Self {
            linked: Some(linked),
            ..self.clone()
        }
    }

    /// Converte os `-1` de arquivos antigos em similaridade indisponível.
    pub fn clear_legacy_sentinels(&mut self) {
        for ann in self.linked.iter_mut().flatten() {
            ann.temporal = ann.temporal.without_legacy_sentinel();
            ann.spatial = ann.spatial.without_legacy_sentinel();
        }
    }
}

/// Interpreta um conjunto de dados JSON.
///
/// Um documento malformado é descartado com um aviso; o restante é mantido.
/// Apenas um JSON que não seja uma lista é erro.
pub fn parse_dataset(value: Value) -> Result<Vec<Document>> {
    let Value::Array(items) = value else {
        return Err(NedError::DataFormat(
            "o conjunto de dados deve ser uma lista de documentos".into(),
        ));
    };

    let total = items.len();
    let mut documents = Vec::with_capacity(total);
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Document>(item) {
            Ok(doc) => documents.push(doc),
            Err(e) => warn!("Documento {} ignorado: {}", i, e),
        }
    }

    if documents.len() < total {
        warn!("{} de {} documentos malformados", total - documents.len(), total);
    }
    Ok(documents)
}

/// Como [`parse_dataset`], para arquivos antigos que gravavam `-1` no lugar
/// de uma similaridade ausente.
pub fn parse_legacy_dataset(value: Value) -> Result<Vec<Document>> {
    let mut documents = parse_dataset(value)?;
    documents.iter_mut().for_each(Document::clear_legacy_sentinels);
    Ok(documents)
}

/// Carrega um conjunto de dados de um arquivo JSON.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let documents = parse_dataset(read_json(path)?)?;
    info!("{} documentos carregados de {}", documents.len(), path.display());
    Ok(documents)
}

/// Carrega um arquivo antigo, com `-1` como marcador de similaridade ausente.
pub fn load_legacy_dataset(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let documents = parse_legacy_dataset(read_json(path)?)?;
    info!("{} documentos (formato antigo) carregados de {}", documents.len(), path.display());
    Ok(documents)
}

fn read_json(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| NedError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Grava um conjunto de dados (ex: após o enriquecimento).
pub fn save_dataset(path: impl AsRef<Path>, documents: &[Document]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| NedError::io(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), documents)?;
    Ok(())
}
