//! # Motor de Assinaturas Temporais
//!
//! Converte a distribuição esparsa (ano → contagem) de uma entidade em uma série
//! densa e suavizada, e constrói a série equivalente para o ano de um documento.
//! A similaridade temporal é o cosseno entre as duas séries.
//!
//! ## Suavização exponencial (Agarwal et al. 2018)
//!
//! Cada passo aplica `s[0] = x[0]` e `s[i] = α·x[i] + (1-α)·s[i-1]`, descarta os
//! `k` primeiros valores e completa com `k` zeros no final, onde `k` é o número
//! do passo (1 no primeiro, 2 no segundo). Uma entidade muito citada em torno de
//! um ano produz um pico "espalhado" ao redor desse ano.

use std::sync::Arc;

use crate::error::{NedError, Result};
use crate::signature::{SignatureStore, TemporalSignature};
use crate::similarity::{cosine, Similarity};

/// Primeiro ano representado na série densa.
pub const FIRST_YEAR: i64 = 1;
/// Último ano representado na série densa (inclusive).
pub const LAST_YEAR: i64 = 2050;
/// Comprimento fixo de toda série normalizada.
pub const SERIES_LEN: usize = (LAST_YEAR - FIRST_YEAR + 1) as usize;
/// Fator de decaimento da suavização.
pub const SMOOTHING_ALPHA: f64 = 0.2;
/// Número de passos de suavização.
pub const SMOOTHING_PASSES: usize = 2;

/// Um passo de suavização exponencial, deslocado `times` posições para a esquerda.
pub fn smooth_series(series: &[f64], alpha: f64, times: usize) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }

    let mut smoothed = Vec::with_capacity(series.len());
    smoothed.push(series[0]);
    for i in 1..series.len() {
        let prev = smoothed[i - 1];
        smoothed.push(alpha * series[i] + (1.0 - alpha) * prev);
    }

    let times = times.min(smoothed.len());
    let mut shifted: Vec<f64> = smoothed[times..].to_vec();
    shifted.resize(series.len(), 0.0);
    shifted
}

/// Série densa suavizada (comprimento [`SERIES_LEN`]) a partir de uma assinatura esparsa.
///
/// Anos fora de `[FIRST_YEAR, LAST_YEAR]` são descartados. Um ano repetido
/// mantém a última contagem.
pub fn normalize(signature: &TemporalSignature) -> Vec<f64> {
    let mut year_counts = vec![0.0; SERIES_LEN];
    for (&year, count) in signature.entries() {
        if (FIRST_YEAR..=LAST_YEAR).contains(&year) {
            year_counts[(year - FIRST_YEAR) as usize] = count;
        }
    }

    let mut series = year_counts;
    for pass in 0..SMOOTHING_PASSES {
        series = smooth_series(&series, SMOOTHING_ALPHA, pass + 1);
    }
    series
}

/// Série sintética para um ano: um impulso unitário suavizado da mesma forma.
pub fn synthesize_for_year(year: i64) -> Vec<f64> {
    normalize(&TemporalSignature::new(vec![year], vec![1.0]))
}

/// Motor temporal sobre um armazém de assinaturas compartilhado.
#[derive(Debug, Clone)]
pub struct TemporalEngine {
    store: Arc<SignatureStore>,
}

impl TemporalEngine {
    pub fn new(store: Arc<SignatureStore>) -> Self {
        Self { store }
    }

    /// Número de entidades com assinatura temporal.
    pub fn signatures(&self) -> usize {
        self.store.temporal_len()
    }

    /// Série normalizada da entidade.
    pub fn profile(&self, entity: &str) -> Result<Vec<f64>> {
        self.store
            .temporal(entity)
            .map(normalize)
            .ok_or_else(|| NedError::EntityNotFound(entity.to_string()))
    }

    /// Similaridade entre o perfil temporal da entidade e o ano do documento.
    pub fn similarity(&self, entity: &str, year: i64) -> Similarity {
        match self.profile(entity) {
            Ok(profile) => cosine(&profile, &synthesize_for_year(year)).into(),
            Err(_) => Similarity::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_series_single_pass() {
        let smoothed = smooth_series(&[1.0, 0.0, 0.0, 0.0], 0.2, 1);
        let expected = [0.8, 0.64, 0.512, 0.0];
        assert_eq!(smoothed.len(), 4);
        for (a, b) in smoothed.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_smooth_series_shift_longer_than_series() {
        assert_eq!(smooth_series(&[1.0], 0.2, 2), vec![0.0]);
        assert!(smooth_series(&[], 0.2, 1).is_empty());
    }

    #[test]
    fn test_normalize_fixed_length_and_deterministic() {
        let sparse = TemporalSignature::new(vec![1990], vec![4.0]);
        let dense = TemporalSignature::new((1..=2050).collect(), vec![1.0; 2050]);
        let empty = TemporalSignature::new(vec![], vec![]);

        for sig in [&sparse, &dense, &empty] {
            let a = normalize(sig);
            let b = normalize(sig);
            assert_eq!(a.len(), SERIES_LEN);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_normalize_discards_out_of_range_years() {
        let sig = TemporalSignature::new(vec![0, -5, 2051, 3000], vec![1.0, 2.0, 3.0, 4.0]);
        assert!(normalize(&sig).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_normalize_peak_is_smeared_around_year() {
        let series = synthesize_for_year(1900);
        let idx = (1900 - FIRST_YEAR) as usize;
        // Os dois deslocamentos levam o impulso três posições para a esquerda
        assert_eq!(series[idx - 4], 0.0);
        assert!(series[idx - 3] > 0.0);
        assert!(series[idx - 3] > series[idx + 10]);
        assert!(series[idx + 10] > 0.0);
    }

    #[test]
    fn test_synthesized_year_self_similarity() {
        for year in [1, 2, 500, 1995, 2047, 2050] {
            let v = synthesize_for_year(year);
            let sim = cosine(&v, &v).unwrap();
            assert!((sim - 1.0).abs() < 1e-9, "ano {}", year);
        }
    }

    #[test]
    fn test_engine_similarity() {
        let mut store = SignatureStore::new();
        store.insert_temporal("George_W._Bush", TemporalSignature::new(vec![1995, 2001, 2004], vec![2.0, 10.0, 6.0]));
        store.insert_temporal("Napoleon", TemporalSignature::new(vec![1799, 1805, 1815], vec![5.0, 8.0, 9.0]));
        let engine = TemporalEngine::new(Arc::new(store));

        let modern = engine.similarity("George_W._Bush", 2001).value().unwrap();
        let ancient = engine.similarity("Napoleon", 2001).value().unwrap();
        assert!(modern > ancient);
        assert_eq!(engine.similarity("Unknown", 2001), Similarity::Unavailable);
        assert!(matches!(engine.profile("Unknown"), Err(NedError::EntityNotFound(_))));
    }
}
