//! # Similaridade de Cosseno
//!
//! Primitiva compartilhada pelos motores temporal e espacial.
//!
//! O valor `-1` não é usado como marcador de "sinal ausente": um cosseno legítimo
//! também pode valer `-1`. A ausência é representada estruturalmente pela
//! variante [`Similarity::Unavailable`].

use serde::{Deserialize, Serialize};

/// O sinal não pôde ser calculado (vetor vazio, norma zero ou dimensões diferentes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sinal indisponível")]
pub struct SignalUnavailable;

/// Similaridade temporal ou espacial associada a uma anotação.
///
/// Em disco é um número opcional: `null` ou campo ausente significam
/// indisponível. Um `-1` gravado é um cosseno legítimo; arquivos antigos que
/// usavam `-1` como marcador passam por [`Similarity::without_legacy_sentinel`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Similarity {
    Available(f64),
    #[default]
    Unavailable,
}

/// Marcador usado pelos arquivos de anotação legados.
const LEGACY_SENTINEL: f64 = -1.0;

impl Similarity {
    pub fn value(&self) -> Option<f64> {
        match self {
            Similarity::Available(v) => Some(*v),
            Similarity::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Similarity::Available(_))
    }

    pub fn is_unavailable(&self) -> bool {
        !self.is_available()
    }

    /// Reinterpreta um valor lido de arquivo antigo, onde `-1` marcava ausência.
    pub fn without_legacy_sentinel(self) -> Self {
        match self {
            Similarity::Available(v) if v == LEGACY_SENTINEL => Similarity::Unavailable,
            other => other,
        }
    }
}

impl From<Result<f64, SignalUnavailable>> for Similarity {
    fn from(result: Result<f64, SignalUnavailable>) -> Self {
        match result {
            Ok(v) => Similarity::Available(v),
            Err(SignalUnavailable) => Similarity::Unavailable,
        }
    }
}

impl From<Option<f64>> for Similarity {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_nan() => Similarity::Unavailable,
            Some(v) => Similarity::Available(v),
            None => Similarity::Unavailable,
        }
    }
}

impl From<Similarity> for Option<f64> {
    fn from(value: Similarity) -> Self {
        value.value()
    }
}

impl std::fmt::Display for Similarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Similarity::Available(v) => write!(f, "{}", v),
            Similarity::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Norma euclidiana (L2).
fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Similaridade de cosseno `1 - distância_cosseno(a, b)`, em `[-1, 1]`.
///
/// Falha com [`SignalUnavailable`] se algum vetor for vazio, tiver norma zero
/// ou se as dimensões forem diferentes.
pub fn cosine(a: &[f64], b: &[f64]) -> Result<f64, SignalUnavailable> {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return Err(SignalUnavailable);
    }

    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 || !norm_a.is_finite() || !norm_b.is_finite() {
        return Err(SignalUnavailable);
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    // Erros de arredondamento podem passar levemente de 1
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}
