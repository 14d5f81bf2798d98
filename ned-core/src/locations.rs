//! # Extração de Locais
//!
//! O motor espacial precisa da lista de locais mencionados em uma sentença. O
//! reconhecedor de entidades que faz isso é um colaborador externo, visto aqui
//! apenas pelo trait [`LocationExtractor`].
//!
//! [`GazetteerLocations`] é a implementação embutida: busca gulosa pelo nome de
//! local mais longo de um gazetteer, palavra a palavra.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::info;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{NedError, Result};

/// Sentença → locais mencionados, na ordem em que aparecem.
///
/// Uma falha do extrator equivale a "nenhum local encontrado".
pub trait LocationExtractor: Send + Sync {
    fn locations(&self, sentence: &str) -> Vec<String>;
}

/// Gazetteer de nomes de locais (uma ou mais palavras).
#[derive(Debug, Clone, Default)]
pub struct GazetteerLocations {
    /// Nomes em minúsculas, já divididos em palavras
    entries: HashSet<Vec<String>>,
    /// Maior número de palavras de um nome
    max_words: usize,
}

impl GazetteerLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_location(&mut self, name: &str) {
        let words: Vec<String> = name.unicode_words().map(str::to_lowercase).collect();
        if words.is_empty() {
            return;
        }
        self.max_words = self.max_words.max(words.len());
        self.entries.insert(words);
    }

    /// Carrega um gazetteer com um local por linha. Linhas vazias e `#` são ignoradas.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| NedError::io(path, e))?;
        let gazetteer: Self = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();
        info!("{} locais carregados de {}", gazetteer.len(), path.display());
        Ok(gazetteer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for GazetteerLocations {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut gazetteer = Self::new();
        for name in iter {
            gazetteer.add_location(name);
        }
        gazetteer
    }
}

impl LocationExtractor for GazetteerLocations {
    fn locations(&self, sentence: &str) -> Vec<String> {
        let words: Vec<&str> = sentence.unicode_words().collect();
        let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();

        let mut found = Vec::new();
        let mut i = 0;
        while i < words.len() {
            let longest = (1..=self.max_words.min(words.len() - i))
                .rev()
                .find(|&n| self.entries.contains(&lower[i..i + n]));

            match longest {
                Some(n) => {
                    found.push(words[i..i + n].join(" "));
                    i += n;
                }
                None => i += 1,
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> GazetteerLocations {
        ["Paris", "New York", "New York City", "France"].into_iter().collect()
    }

    #[test]
    fn test_longest_match_wins() {
        let found = gazetteer().locations("He moved from New York City to Paris, France.");
        assert_eq!(found, vec!["New York City", "Paris", "France"]);
    }

    #[test]
    fn test_case_insensitive_and_keeps_original_text() {
        let found = gazetteer().locations("PARIS and new york");
        assert_eq!(found, vec!["PARIS", "new york"]);
    }

    #[test]
    fn test_no_locations() {
        assert!(gazetteer().locations("Nothing to see here.").is_empty());
        assert!(GazetteerLocations::new().locations("Paris").is_empty());
        assert!(gazetteer().locations("").is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"# locais\nBerlin\n\nRio de Janeiro\n").unwrap();
        let gaz = GazetteerLocations::load(file.path()).unwrap();
        assert_eq!(gaz.len(), 2);
        assert_eq!(gaz.locations("Carnaval no Rio de Janeiro"), vec!["Rio de Janeiro"]);
    }
}
