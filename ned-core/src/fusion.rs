//! # Fusão de Sinais
//!
//! Combina a confiança do linker (`c`), a similaridade temporal (`t`) e a espacial
//! (`s`) em um score final:
//!
//! ```text
//! fs = (α·t + γ·c + β·s) / (γ + α + β)
//! ```
//!
//! Se `t` estiver indisponível, `α` vale zero no numerador apenas para esta
//! anotação (idem para `s` e `β`). O denominador continua usando os pesos
//! originais. `γ` nunca é zerado: a confiança do linker está sempre presente.

use serde::{Deserialize, Serialize};

use crate::error::{NedError, Result};
use crate::similarity::Similarity;

/// Pesos da fusão: `alpha` (temporal), `beta` (espacial), `gamma` (confiança).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl FusionWeights {
    /// Valida os pesos: todos finitos, não negativos e com soma positiva.
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        let weights = Self { alpha, beta, gamma };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, w) in [("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
            if !w.is_finite() || w < 0.0 {
                return Err(NedError::Configuration(format!(
                    "peso {} deve ser finito e não negativo (recebido {})",
                    name, w
                )));
            }
        }
        if self.denominator() <= 0.0 {
            return Err(NedError::Configuration(
                "alpha, beta e gamma não podem ser todos zero".into(),
            ));
        }
        Ok(())
    }

    fn denominator(&self) -> f64 {
        self.gamma + self.alpha + self.beta
    }
}

/// Decisão sobre um link candidato.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Keep,
    Drop,
}

/// Score final de uma anotação.
pub fn score(confidence: f64, temporal: Similarity, spatial: Similarity, weights: &FusionWeights) -> f64 {
    let (alpha, t) = match temporal {
        Similarity::Available(t) => (weights.alpha, t),
        Similarity::Unavailable => (0.0, 0.0),
    };
    let (beta, s) = match spatial {
        Similarity::Available(s) => (weights.beta, s),
        Similarity::Unavailable => (0.0, 0.0),
    };

    (alpha * t + weights.gamma * confidence + beta * s) / weights.denominator()
}

/// Mantém o link se `fs >= threshold` (limite inclusivo).
pub fn decide(fs: f64, threshold: f64) -> Decision {
    if fs >= threshold {
        Decision::Keep
    } else {
        Decision::Drop
    }
}
