//! # ned-core — Filtragem de Links de Entidades por Contexto Temporal e Espacial
//!
//! Este crate decide se um link produzido por um linker de entidades (ex: DBpedia
//! Spotlight) deve ser mantido ou descartado em textos históricos, combinando três
//! sinais independentes:
//!
//! 1. **Confiança** do linker.
//! 2. **Similaridade temporal** ([`temporal`]): o perfil de anos da entidade
//!    comparado com o ano do documento.
//! 3. **Similaridade espacial** ([`spatial`]): os locais associados à entidade
//!    comparados com os locais mencionados na sentença.
//!
//! ## Arquitetura
//!
//! 1.  **Assinaturas** ([`signature`]): carregadas uma vez, somente leitura.
//! 2.  **Motores** ([`temporal`], [`spatial`]): produzem vetores comparáveis.
//! 3.  **Similaridade** ([`similarity`]): cosseno, com ausência de sinal explícita.
//! 4.  **Fusão** ([`fusion`]): score ponderado + limiar.
//! 5.  **Calibração** ([`calibration`]): busca em grade dos pesos e do limiar
//!     contra a verdade de referência ([`ground_truth`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use ned_core::fusion::{decide, score, Decision, FusionWeights};
//! use ned_core::similarity::Similarity;
//!
//! let weights = FusionWeights::new(0.3, 0.3, 0.9).unwrap();
//! // Sem locais na sentença: a similaridade espacial fica indisponível
//! let fs = score(0.8, Similarity::Available(0.6), Similarity::Unavailable, &weights);
//! assert!((fs - 0.6).abs() < 1e-9);
//! assert_eq!(decide(fs, 0.5), Decision::Keep);
//! ```

pub mod calibration;
pub mod config;
pub mod dataset;
pub mod embeddings;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod fusion;
pub mod ground_truth;
pub mod locations;
pub mod report;
pub mod signature;
pub mod similarity;
pub mod spatial;
pub mod temporal;

pub use calibration::{Calibration, SweepEvent, SweepReport};
pub use config::{NedConfig, SweepGrid};
pub use dataset::{Document, LinkerAnnotation};
pub use engine::NedEngine;
pub use error::{NedError, Result};
pub use similarity::Similarity;
