//! # Erros do Sistema
//!
//! Apenas erros de configuração e de I/O são fatais. Sinais ausentes (assinatura
//! inexistente, documento sem locais, vetores degenerados) nunca chegam aqui:
//! eles viram [`crate::similarity::Similarity::Unavailable`] no ponto onde ocorrem.

use std::path::PathBuf;

/// Erros que podem interromper uma carga ou uma calibração.
#[derive(Debug, thiserror::Error)]
pub enum NedError {
    #[error("erro de I/O em {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("erro de serialização: {0}")]
    Json(#[from] serde_json::Error),
    /// Grade vazia, passo não positivo ou pesos que zeram o denominador da fusão.
    #[error("configuração inválida: {0}")]
    Configuration(String),
    /// Registro malformado em um arquivo de entrada.
    #[error("formato de dados inválido: {0}")]
    DataFormat(String),
    #[error("entidade não encontrada: {0}")]
    EntityNotFound(String),
}

impl NedError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        NedError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, NedError>;
