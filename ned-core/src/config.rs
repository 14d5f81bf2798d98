//! # Configuração
//!
//! - [`NedConfig`]: caminhos dos recursos e endereço do servidor, lidos de
//!   variáveis de ambiente com valores padrão.
//! - [`SweepGrid`]: a grade de parâmetros da calibração.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{NedError, Result};
use crate::fusion::FusionWeights;

/// Caminhos e parâmetros de execução.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NedConfig {
    /// `NED_TEMPORAL_SIGNATURES`
    pub temporal_signatures: PathBuf,
    /// `NED_SPATIAL_SIGNATURES`
    pub spatial_signatures: PathBuf,
    /// `NED_WORD_VECTORS` (formato texto do word2vec)
    pub word_vectors: PathBuf,
    /// `NED_GAZETTEER`: um local por linha. Opcional.
    pub gazetteer: Option<PathBuf>,
    /// `NED_DATASET`: conjunto usado pelo binário de calibração.
    pub dataset: Option<PathBuf>,
    /// `NED_OUTPUT_DIR`
    pub output_dir: PathBuf,
    /// `NED_BIND_ADDR`
    pub bind_addr: String,
}

impl Default for NedConfig {
    fn default() -> Self {
        Self {
            temporal_signatures: PathBuf::from("./resources/TempSig.json"),
            spatial_signatures: PathBuf::from("./resources/SpatialSignatures.json"),
            word_vectors: PathBuf::from("./resources/wordEmbeddings/word2vec.6B.50d.txt"),
            gazetteer: None,
            dataset: None,
            output_dir: PathBuf::from("./outputs"),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl NedConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de consulta (útil em testes).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("NED_TEMPORAL_SIGNATURES") {
            config.temporal_signatures = v.into();
        }
        if let Some(v) = get("NED_SPATIAL_SIGNATURES") {
            config.spatial_signatures = v.into();
        }
        if let Some(v) = get("NED_WORD_VECTORS") {
            config.word_vectors = v.into();
        }
        if let Some(v) = get("NED_GAZETTEER") {
            config.gazetteer = Some(v.into());
        }
        if let Some(v) = get("NED_DATASET") {
            config.dataset = Some(v.into());
        }
        if let Some(v) = get("NED_OUTPUT_DIR") {
            config.output_dir = v.into();
        }
        if let Some(v) = get("NED_BIND_ADDR") {
            config.bind_addr = v;
        }
        config
    }
}

const RANGE_TOLERANCE: f64 = 1e-9;
/// Máximo de valores em um eixo da grade.
pub const MAX_AXIS_POINTS: usize = 10_000;
/// Máximo de pontos de uma grade completa.
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// Intervalo semiaberto `[start, stop)` com passo fixo.
///
/// Diferente de `numpy.arange`, o erro de ponto flutuante nunca inclui `stop`:
/// `[0.7, 1.05)` com passo 0.05 tem 7 valores, não 8.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl ParamRange {
    pub fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// Um único valor.
    pub fn single(value: f64) -> Self {
        Self {
            start: value,
            stop: value + 1.0,
            step: 2.0,
        }
    }

    /// Quantidade de valores: `ceil((stop - start) / step)`, com tolerância.
    ///
    /// Satura em `usize::MAX`; [`SweepGrid::validate`] rejeita eixos acima de
    /// [`MAX_AXIS_POINTS`].
    pub fn len(&self) -> usize {
        let n = self.count();
        if n > 0.0 {
            n as usize
        } else {
            0
        }
    }

    fn count(&self) -> f64 {
        if !(self.step > 0.0) || !self.start.is_finite() || !self.stop.is_finite() {
            return 0.0;
        }
        ((self.stop - self.start) / self.step - RANGE_TOLERANCE).ceil()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Valores `start + i·step`.
    pub fn values(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.start + i as f64 * self.step).collect()
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.step > 0.0) {
            return Err(NedError::Configuration(format!(
                "passo de {} deve ser positivo (recebido {})",
                name, self.step
            )));
        }
        if self.is_empty() {
            return Err(NedError::Configuration(format!(
                "intervalo de {} vazio: [{}, {})",
                name, self.start, self.stop
            )));
        }
        if self.count() > MAX_AXIS_POINTS as f64 {
            return Err(NedError::Configuration(format!(
                "intervalo de {} com valores demais (máximo {})",
                name, MAX_AXIS_POINTS
            )));
        }
        Ok(())
    }
}

/// Um ponto da grade de calibração.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub threshold: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl GridPoint {
    pub fn weights(&self) -> Result<FusionWeights> {
        FusionWeights::new(self.alpha, self.beta, self.gamma)
    }
}

/// Grade de calibração: limiar × alpha × beta × gamma.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub thresholds: ParamRange,
    pub alphas: ParamRange,
    pub betas: ParamRange,
    pub gammas: ParamRange,
}

impl Default for SweepGrid {
    /// Intervalos definidos empiricamente.
    fn default() -> Self {
        Self {
            thresholds: ParamRange::new(0.05, 1.0, 0.05),
            alphas: ParamRange::new(0.1, 0.7, 0.05),
            betas: ParamRange::new(0.1, 0.7, 0.05),
            gammas: ParamRange::new(0.7, 1.05, 0.05),
        }
    }
}

impl SweepGrid {
    /// Grade de um único ponto.
    pub fn single(threshold: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            thresholds: ParamRange::single(threshold),
            alphas: ParamRange::single(alpha),
            betas: ParamRange::single(beta),
            gammas: ParamRange::single(gamma),
        }
    }

    /// Rejeita grades vazias e pesos que poderiam zerar o denominador da fusão.
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate("threshold")?;
        self.alphas.validate("alpha")?;
        self.betas.validate("beta")?;
        self.gammas.validate("gamma")?;

        match self.checked_len() {
            Some(n) if n <= MAX_GRID_POINTS => {}
            _ => {
                return Err(NedError::Configuration(format!(
                    "grade com pontos demais (máximo {})",
                    MAX_GRID_POINTS
                )))
            }
        }

        for axis in [&self.alphas, &self.betas, &self.gammas] {
            if axis.values().iter().any(|w| *w < 0.0) {
                return Err(NedError::Configuration("pesos negativos na grade".into()));
            }
        }

        let min = |r: &ParamRange| r.values().into_iter().fold(f64::INFINITY, f64::min);
        if min(&self.alphas) + min(&self.betas) + min(&self.gammas) <= 0.0 {
            return Err(NedError::Configuration(
                "a grade contém alpha = beta = gamma = 0".into(),
            ));
        }
        Ok(())
    }

    /// Total de pontos; satura em `usize::MAX`.
    pub fn len(&self) -> usize {
        self.checked_len().unwrap_or(usize::MAX)
    }

    /// Total de pontos, ou `None` se a multiplicação estourar.
    pub fn checked_len(&self) -> Option<usize> {
        self.thresholds
            .len()
            .checked_mul(self.alphas.len())?
            .checked_mul(self.betas.len())?
            .checked_mul(self.gammas.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Combinações (alpha, beta, gamma) por limiar.
    pub fn weight_combinations(&self) -> usize {
        self.alphas
            .len()
            .saturating_mul(self.betas.len())
            .saturating_mul(self.gammas.len())
    }

    /// Pontos de um limiar, na ordem alpha → beta → gamma.
    pub fn points_for_threshold(&self, threshold: f64) -> Vec<GridPoint> {
        let mut points = Vec::with_capacity(self.weight_combinations());
        for alpha in self.alphas.values() {
            for beta in self.betas.values() {
                for gamma in self.gammas.values() {
                    points.push(GridPoint {
                        threshold,
                        alpha,
                        beta,
                        gamma,
                    });
                }
            }
        }
        points
    }

    /// Todos os pontos, na ordem limiar → alpha → beta → gamma.
    pub fn points(&self) -> Vec<GridPoint> {
        self.thresholds
            .values()
            .into_iter()
            .flat_map(|t| self.points_for_threshold(t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid_matches_arange_lengths() {
        let grid = SweepGrid::default();
        assert_eq!(grid.thresholds.len(), 19);
        assert_eq!(grid.alphas.len(), 12);
        assert_eq!(grid.betas.len(), 12);
        assert_eq!(grid.gammas.len(), 7);
        assert_eq!(grid.len(), 19 * 12 * 12 * 7);
        assert!(grid.validate().is_ok());

        let thresholds = grid.thresholds.values();
        assert!((thresholds[0] - 0.05).abs() < 1e-12);
        assert!((thresholds[18] - 0.95).abs() < 1e-9);
        assert!((grid.gammas.values()[6] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_grid() {
        let grid = SweepGrid::single(0.5, 0.3, 0.3, 0.9);
        let points = grid.points();
        assert_eq!(points.len(), 1);
        assert_eq!(
            points[0],
            GridPoint { threshold: 0.5, alpha: 0.3, beta: 0.3, gamma: 0.9 }
        );
    }

    #[test]
    fn test_grid_order() {
        let grid = SweepGrid {
            thresholds: ParamRange::new(0.1, 0.3, 0.1),
            alphas: ParamRange::new(0.0, 0.2, 0.1),
            betas: ParamRange::single(0.5),
            gammas: ParamRange::single(1.0),
        };
        let points = grid.points();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].alpha, 0.0);
        assert!((points[1].alpha - 0.1).abs() < 1e-12);
        assert!((points[2].threshold - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_grids_rejected() {
        let mut grid = SweepGrid::default();
        grid.thresholds = ParamRange::new(1.0, 0.5, 0.05);
        assert!(matches!(grid.validate(), Err(NedError::Configuration(_))));

        let mut grid = SweepGrid::default();
        grid.alphas.step = 0.0;
        assert!(grid.validate().is_err());

        let zero = SweepGrid::single(0.5, 0.0, 0.0, 0.0);
        assert!(zero.validate().is_err());

        let negative = SweepGrid::single(0.5, -0.1, 0.3, 0.9);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_oversized_grids_rejected() {
        let mut tiny_step = SweepGrid::default();
        tiny_step.thresholds = ParamRange::new(0.0, 1.0, 1e-300);
        assert_eq!(tiny_step.thresholds.len(), usize::MAX);
        assert_eq!(tiny_step.len(), usize::MAX);
        assert!(tiny_step.checked_len().is_none());
        assert!(matches!(tiny_step.validate(), Err(NedError::Configuration(_))));

        // Cada eixo dentro do limite, mas o produto passa do máximo
        let axis = ParamRange::new(0.0, 1.0, 1.0 / MAX_AXIS_POINTS as f64);
        assert!(axis.len() <= MAX_AXIS_POINTS);
        let wide = SweepGrid {
            thresholds: axis,
            alphas: axis,
            betas: ParamRange::single(0.3),
            gammas: ParamRange::single(0.9),
        };
        assert!(wide.len() > MAX_GRID_POINTS);
        assert!(matches!(wide.validate(), Err(NedError::Configuration(_))));

        let at_limit = SweepGrid {
            thresholds: ParamRange::new(0.0, 1.0, 0.01),
            ..wide
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = NedConfig::from_lookup(|key| match key {
            "NED_TEMPORAL_SIGNATURES" => Some("/data/temp.json".to_string()),
            "NED_GAZETTEER" => Some("/data/places.txt".to_string()),
            "NED_BIND_ADDR" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.temporal_signatures, PathBuf::from("/data/temp.json"));
        assert_eq!(config.gazetteer, Some(PathBuf::from("/data/places.txt")));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.output_dir, PathBuf::from("./outputs"));
    }
}
