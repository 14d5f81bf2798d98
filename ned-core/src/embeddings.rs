//! # Vetores de Palavras
//!
//! Acesso a embeddings de palavras (word2vec/GloVe) usados pelo motor espacial.
//! O motor depende apenas do trait [`WordVectorLookup`]; [`WordVectors`] é a
//! implementação em memória carregada de um arquivo no formato texto do word2vec.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{NedError, Result};

/// Palavra → vetor de dimensão fixa. Palavras fora do vocabulário retornam `None`.
pub trait WordVectorLookup: Send + Sync {
    fn vector(&self, word: &str) -> Option<&[f64]>;

    fn dimension(&self) -> usize;
}

/// Vocabulário de embeddings mantido em memória.
#[derive(Debug, Clone, Default)]
pub struct WordVectors {
    vectors: HashMap<String, Vec<f64>>,
    dim: usize,
}

impl WordVectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere ou substitui o vetor de uma palavra.
    ///
    /// A primeira inserção fixa a dimensão; vetores de outra dimensão são rejeitados.
    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f64>) -> Result<()> {
        if vector.is_empty() {
            return Err(NedError::DataFormat("vetor de palavra vazio".into()));
        }
        if self.vectors.is_empty() && self.dim == 0 {
            self.dim = vector.len();
        } else if vector.len() != self.dim {
            return Err(NedError::DataFormat(format!(
                "dimensão incompatível: esperado {}, recebido {}",
                self.dim,
                vector.len()
            )));
        }
        self.vectors.insert(word.into(), vector);
        Ok(())
    }

    /// Carrega um arquivo no formato texto do word2vec.
    ///
    /// A primeira linha pode ser o cabeçalho `<quantidade> <dimensão>` (word2vec) ou
    /// já um vetor (GloVe). Linhas malformadas são ignoradas com um aviso.
    pub fn load_word2vec_text(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Carregando vetores de palavras de {}", path.display());
        let file = File::open(path).map_err(|e| NedError::io(path, e))?;

        let mut vectors = WordVectors::new();
        let mut skipped = 0usize;
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| NedError::io(path, e))?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            let values: std::result::Result<Vec<f64>, _> = parts.map(str::parse::<f64>).collect();

            let values = match values {
                Ok(v) => v,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };

            // Cabeçalho "quantidade dimensão"
            if line_no == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                vectors.dim = values[0] as usize;
                continue;
            }

            if vectors.insert(word, values).is_err() {
                skipped += 1;
            }
        }

        if skipped > 0 {
            warn!("{} linhas malformadas ignoradas em {}", skipped, path.display());
        }
        info!("{} vetores de dimensão {} carregados", vectors.len(), vectors.dim);
        Ok(vectors)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl WordVectorLookup for WordVectors {
    fn vector(&self, word: &str) -> Option<&[f64]> {
        self.vectors.get(word).map(Vec::as_slice)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_with_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2 3").unwrap();
        writeln!(file, "paris 0.1 0.2 0.3").unwrap();
        writeln!(file, "france 0.4 0.5 0.6").unwrap();

        let vectors = WordVectors::load_word2vec_text(file.path()).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.dimension(), 3);
        assert_eq!(vectors.vector("paris"), Some(&[0.1, 0.2, 0.3][..]));
        assert!(vectors.vector("berlin").is_none());
    }

    #[test]
    fn test_load_glove_without_header_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "london 1.0 0.0").unwrap();
        writeln!(file, "broken 1.0 abc").unwrap();
        writeln!(file, "short 1.0").unwrap();
        writeln!(file, "rome 0.0 1.0").unwrap();

        let vectors = WordVectors::load_word2vec_text(file.path()).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.dimension(), 2);
    }

    #[test]
    fn test_insert_rejects_dimension_mismatch() {
        let mut vectors = WordVectors::new();
        vectors.insert("a", vec![1.0, 2.0]).unwrap();
        assert!(vectors.insert("b", vec![1.0]).is_err());
        assert!(vectors.insert("c", vec![]).is_err());
    }
}
