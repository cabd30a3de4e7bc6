//! Quiz content: the data the shell renders.
//!
//! Content is authored as a JSON catalog and loaded once at startup —
//! the local stand-in for the remote backend's quiz endpoint. The shell
//! never grades answers; it only presents questions and records which
//! choice the player picked.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while loading or validating a content catalog.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path:?}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse content catalog")]
    Parse(#[from] serde_json::Error),
    #[error("content catalog has no quizzes")]
    Empty,
    #[error("quiz {quiz:?} has a question with no choices")]
    ChoicelessQuestion { quiz: String },
}

/// One selectable answer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

/// One question with its choices.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub choices: Vec<Choice>,
}

/// A named set of questions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
}

/// The full authored catalog.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct QuizCatalog {
    pub quizzes: Vec<Quiz>,
}

/// Loaded, validated content shared across scenes.
#[derive(Debug)]
pub struct ContentLibrary {
    catalog: QuizCatalog,
    by_id: HashMap<String, usize>,
}

impl ContentLibrary {
    /// Parse and validate a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let catalog: QuizCatalog = serde_json::from_str(json)?;
        Self::from_catalog(catalog)
    }

    /// Read, parse, and validate a catalog file.
    pub fn from_path(path: &Path) -> Result<Self, ContentError> {
        let json = std::fs::read_to_string(path).map_err(|source| ContentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Validate an already-deserialized catalog.
    pub fn from_catalog(catalog: QuizCatalog) -> Result<Self, ContentError> {
        if catalog.quizzes.is_empty() {
            return Err(ContentError::Empty);
        }
        for quiz in &catalog.quizzes {
            if quiz.questions.iter().any(|q| q.choices.is_empty()) {
                return Err(ContentError::ChoicelessQuestion {
                    quiz: quiz.id.clone(),
                });
            }
        }
        let by_id = catalog
            .quizzes
            .iter()
            .enumerate()
            .map(|(i, quiz)| (quiz.id.clone(), i))
            .collect();
        Ok(Self { catalog, by_id })
    }

    pub fn quizzes(&self) -> &[Quiz] {
        &self.catalog.quizzes
    }

    pub fn quiz(&self, id: &str) -> Option<&Quiz> {
        self.by_id.get(id).map(|&i| &self.catalog.quizzes[i])
    }

    /// The first quiz in the catalog (validation guarantees one exists).
    pub fn first_quiz(&self) -> &Quiz {
        &self.catalog.quizzes[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "quizzes": [
            {
                "id": "fractions-1",
                "title": "Fractions I",
                "questions": [
                    {
                        "id": "q1",
                        "prompt": "What is 1/2 + 1/4?",
                        "choices": [
                            {"id": "a", "text": "3/4"},
                            {"id": "b", "text": "2/6"},
                            {"id": "c", "text": "1/8"}
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn parses_and_indexes_a_catalog() {
        let library = ContentLibrary::from_json(SAMPLE).unwrap();
        assert_eq!(library.quizzes().len(), 1);
        let quiz = library.quiz("fractions-1").unwrap();
        assert_eq!(quiz.title, "Fractions I");
        assert_eq!(quiz.questions[0].choices.len(), 3);
        assert_eq!(library.first_quiz().id, "fractions-1");
    }

    #[test]
    fn empty_catalog_is_rejected() {
        let err = ContentLibrary::from_json(r#"{"quizzes": []}"#).unwrap_err();
        assert!(matches!(err, ContentError::Empty));
    }

    #[test]
    fn choiceless_question_is_rejected() {
        let json = r#"{
            "quizzes": [{
                "id": "bad",
                "title": "Bad",
                "questions": [{"id": "q1", "prompt": "?", "choices": []}]
            }]
        }"#;
        let err = ContentLibrary::from_json(json).unwrap_err();
        assert!(matches!(err, ContentError::ChoicelessQuestion { quiz } if quiz == "bad"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = ContentLibrary::from_json("{not json").unwrap_err();
        assert!(matches!(err, ContentError::Parse(_)));
    }
}
