use crate::libquiz::question::{Answer, AnswerId, Question, QuizSet};
use log::{debug, info, warn};
use reqwest::blocking::{multipart, Client};
use reqwest::StatusCode;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/upload";
pub const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0:?} is not a PDF document")]
    NotPdf(PathBuf),
    #[error("cannot read {0:?}")]
    Io(PathBuf, #[source] io::Error),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("upload failed")]
    Transport(#[from] reqwest::Error),
    #[error("extraction service answered {0}")]
    Status(StatusCode),
    #[error("malformed response from extraction service")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown answer code {0:?}")]
    UnknownAnswerCode(String),
    #[error("cannot read fixture {0:?}")]
    Fixture(PathBuf, #[source] io::Error),
    #[error("fixture {0:?} is not a list of questions")]
    FixtureParse(PathBuf, #[source] serde_json::Error),
}

/// A file staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn open(path: &Path) -> Result<Document, DocumentError> {
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(DocumentError::NotPdf(path.to_path_buf()));
        }

        let bytes = std::fs::read(path).map_err(|e| DocumentError::Io(path.to_path_buf(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        debug!("[Upload] Staged {:?} ({} bytes)", name, bytes.len());
        Ok(Document {
            path: path.to_path_buf(),
            name,
            bytes,
        })
    }
}

pub trait QuestionSource {
    /// Turns `document` into questions. Either the whole set comes back or
    /// an error does; there is no partial result.
    fn submit(&self, document: &Document) -> Result<QuizSet, ExtractionError>;
}

#[derive(Deserialize, Debug)]
struct QuizResponse {
    #[serde(default)]
    message: Option<String>,
    quizzes: Vec<QuizItem>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct QuizItem {
    question: String,
    options: Vec<String>,
    answer: String,
    #[serde(default)]
    reasoning: String,
}

fn answer_index(code: &str) -> Result<usize, ExtractionError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "A" => Ok(0),
        "B" => Ok(1),
        "C" => Ok(2),
        "D" => Ok(3),
        _ => Err(ExtractionError::UnknownAnswerCode(code.to_string())),
    }
}

pub(crate) fn translate(items: Vec<QuizItem>) -> Result<QuizSet, ExtractionError> {
    items
        .into_iter()
        .map(|item| {
            let correct = answer_index(&item.answer)?;
            if item.options.len() != 4 {
                warn!(
                    "[Upload] {:?} has {} options",
                    item.question,
                    item.options.len()
                );
            }
            let answers = item
                .options
                .into_iter()
                .enumerate()
                .map(|(idx, text)| Answer {
                    id: idx as AnswerId,
                    text,
                    is_correct: idx == correct,
                })
                .collect();
            Ok(Question {
                text: item.question,
                answers,
                reasoning: Some(item.reasoning).filter(|r| !r.trim().is_empty()),
            })
        })
        .collect()
}

pub(crate) fn parse_response(body: &[u8]) -> Result<QuizSet, ExtractionError> {
    let response: QuizResponse = serde_json::from_slice(body)?;
    if let Some(message) = &response.message {
        debug!("[Upload] Service says: {}", message);
    }
    translate(response.quizzes)
}

/// Uploads the document to the question-extraction service.
pub struct ExtractionService {
    client: Client,
    endpoint: String,
}

impl ExtractionService {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ExtractionError> {
        // reqwest's blocking client defaults to 30s; no timeout unless asked
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl QuestionSource for ExtractionService {
    fn submit(&self, document: &Document) -> Result<QuizSet, ExtractionError> {
        let now = Instant::now();
        info!("[Upload] Sending {:?} to {}", document.name, self.endpoint);

        let part = multipart::Part::bytes(document.bytes.clone())
            .file_name(document.name.clone())
            .mime_str(PDF_MIME)?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(&self.endpoint).multipart(form).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Status(status));
        }
        let body = response.bytes()?;
        let questions = parse_response(&body)?;

        info!(
            "[Upload] Got {} questions in {} ms.",
            questions.len(),
            now.elapsed().as_millis()
        );
        Ok(questions)
    }
}

/// Serves the same questions for every document.
pub struct FixtureSource {
    questions: QuizSet,
}

impl FixtureSource {
    pub fn new(questions: QuizSet) -> Self {
        Self { questions }
    }

    pub fn sample() -> Self {
        Self::new(crate::libquiz::fixture::sample_questions())
    }

    pub fn from_file(path: &Path) -> Result<Self, ExtractionError> {
        let json =
            std::fs::read_to_string(path).map_err(|e| ExtractionError::Fixture(path.to_path_buf(), e))?;
        let questions: QuizSet = serde_json::from_str(&json)
            .map_err(|e| ExtractionError::FixtureParse(path.to_path_buf(), e))?;
        debug!("[Setup] Loaded {} fixture questions from {:?}", questions.len(), path);
        Ok(Self::new(questions))
    }
}

impl QuestionSource for FixtureSource {
    fn submit(&self, document: &Document) -> Result<QuizSet, ExtractionError> {
        debug!("[Upload] Serving fixture questions for {:?}", document.name);
        Ok(self.questions.clone())
    }
}
