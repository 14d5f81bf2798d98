//! # Armazém de Assinaturas
//!
//! Guarda as assinaturas pré-computadas de cada entidade (artigo da Wikipedia):
//!
//! - **Temporal**: pares (ano, contagem) — quantas vezes o artigo menciona cada ano.
//! - **Espacial**: pares (local, contagem) — quantas vezes o artigo menciona cada local.
//!
//! O armazém é carregado uma vez na inicialização e depois só é lido. Os motores
//! recebem uma referência compartilhada (`Arc<SignatureStore>`) em vez de
//! consultarem um cache global.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{NedError, Result};

/// Assinatura bruta no formato esparso `{"indices": [...], "counts": [...]}`.
///
/// Para assinaturas temporais `I` é o ano; para espaciais, o nome do local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignature<I> {
    pub indices: Vec<I>,
    pub counts: Vec<f64>,
}

impl<I> RawSignature<I> {
    pub fn new(indices: Vec<I>, counts: Vec<f64>) -> Self {
        Self { indices, counts }
    }

    /// Pares (índice, contagem). Entradas sem par correspondente são ignoradas.
    pub fn entries(&self) -> impl Iterator<Item = (&I, f64)> {
        self.indices.iter().zip(self.counts.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.indices.len().min(self.counts.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type TemporalSignature = RawSignature<i64>;
pub type SpatialSignature = RawSignature<String>;

/// Assinaturas de todas as entidades conhecidas, indexadas pela chave da entidade
/// (o último segmento da URI, ex: `George_W._Bush`).
#[derive(Debug, Clone, Default)]
pub struct SignatureStore {
    temporal: HashMap<String, TemporalSignature>,
    spatial: HashMap<String, SpatialSignature>,
}

impl SignatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Carrega as assinaturas temporais de um arquivo JSON.
    pub fn load_temporal(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        info!("Carregando assinaturas temporais de {}", path.display());
        let signatures: HashMap<String, TemporalSignature> = read_json(path)?;
        let total = signatures.len();
        self.temporal.extend(signatures);
        info!("{} assinaturas temporais carregadas", total);
        Ok(total)
    }

    /// Carrega as assinaturas espaciais de um arquivo JSON.
    pub fn load_spatial(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        info!("Carregando assinaturas espaciais de {}", path.display());
        let signatures: HashMap<String, SpatialSignature> = read_json(path)?;
        let total = signatures.len();
        self.spatial.extend(signatures);
        info!("{} assinaturas espaciais carregadas", total);
        Ok(total)
    }

    pub fn insert_temporal(&mut self, entity: impl Into<String>, signature: TemporalSignature) {
        self.temporal.insert(entity.into(), signature);
    }

    pub fn insert_spatial(&mut self, entity: impl Into<String>, signature: SpatialSignature) {
        self.spatial.insert(entity.into(), signature);
    }

    /// Assinatura temporal da entidade. A ausência é um resultado normal.
    pub fn temporal(&self, entity: &str) -> Option<&TemporalSignature> {
        self.temporal.get(entity)
    }

    pub fn spatial(&self, entity: &str) -> Option<&SpatialSignature> {
        self.spatial.get(entity)
    }

    pub fn temporal_len(&self) -> usize {
        self.temporal.len()
    }

    pub fn spatial_len(&self) -> usize {
        self.spatial.len()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| NedError::io(path, e))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_temporal_and_spatial_independently() {
        let mut temporal = tempfile::NamedTempFile::new().unwrap();
        write!(
            temporal,
            r#"{{"George_W._Bush": {{"indices": [1946, 2001], "counts": [3, 10]}}}}"#
        )
        .unwrap();

        let mut store = SignatureStore::new();
        assert_eq!(store.load_temporal(temporal.path()).unwrap(), 1);
        assert_eq!(store.spatial_len(), 0);

        let sig = store.temporal("George_W._Bush").unwrap();
        assert_eq!(sig.indices, vec![1946, 2001]);
        assert_eq!(sig.counts, vec![3.0, 10.0]);
        assert!(store.temporal("Nobody").is_none());

        let mut spatial = tempfile::NamedTempFile::new().unwrap();
        write!(
            spatial,
            r#"{{"Paris": {{"indices": ["France", "Seine"], "counts": [5, 2]}}}}"#
        )
        .unwrap();
        assert_eq!(store.load_spatial(spatial.path()).unwrap(), 1);
        assert_eq!(store.spatial("Paris").unwrap().len(), 2);
        assert_eq!(store.temporal_len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut store = SignatureStore::new();
        let err = store.load_temporal("/nonexistent/TempSig.json").unwrap_err();
        assert!(matches!(err, NedError::Io { .. }));
    }

    #[test]
    fn test_entries_ignore_unpaired_values() {
        let sig = RawSignature::new(vec![1, 2, 3], vec![1.0, 2.0]);
        assert_eq!(sig.len(), 2);
        assert_eq!(sig.entries().count(), 2);
    }
}
