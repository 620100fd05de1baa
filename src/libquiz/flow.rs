//! What the front-ends talk to: the session, the file waiting to be
//! uploaded and the upload in flight.

use crate::libquiz::question::{AnswerId, QuizSet};
use crate::libquiz::session::{transition, Intent, Rejected, SessionState};
use crate::libquiz::source::{Document, DocumentError, ExtractionError, QuestionSource};
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

pub type SharedSource = Arc<dyn QuestionSource + Send + Sync>;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("pick a PDF first")]
    NoFileStaged,
    #[error("an upload is already running")]
    UploadInFlight,
    #[error("upload was cancelled")]
    Superseded,
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Session(#[from] Rejected),
}

/// Hands a staged document to whoever performs the upload.
#[derive(Debug, Clone)]
pub struct UploadTicket {
    id: u64,
    pub document: Document,
}

pub struct QuizFlow {
    source: SharedSource,
    session: SessionState,
    staged: Option<Document>,
    in_flight: Option<u64>,
    next_ticket: u64,
}

impl QuizFlow {
    pub fn new(source: SharedSource) -> Self {
        Self {
            source,
            session: SessionState::default(),
            staged: None,
            in_flight: None,
            next_ticket: 0,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn staged(&self) -> Option<&Document> {
        self.staged.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_some()
    }

    #[cfg(feature = "gui")]
    pub fn source(&self) -> SharedSource {
        Arc::clone(&self.source)
    }

    pub fn select_file(&mut self, path: &Path) -> Result<(), FlowError> {
        if !self.session.is_empty() {
            return Err(Rejected::AlreadyLoaded.into());
        }
        self.staged = Some(Document::open(path)?);
        Ok(())
    }

    pub fn clear_file(&mut self) {
        self.staged = None;
    }

    /// Marks an upload as running and returns what to send. Pair with
    /// [`QuizFlow::finish_upload`].
    pub fn start_upload(&mut self) -> Result<UploadTicket, FlowError> {
        if self.in_flight.is_some() {
            return Err(FlowError::UploadInFlight);
        }
        if !self.session.is_empty() {
            return Err(Rejected::AlreadyLoaded.into());
        }
        let document = self.staged.clone().ok_or(FlowError::NoFileStaged)?;

        let id = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(id);
        info!("[Upload] Started upload #{} of {:?}", id, document.name);
        Ok(UploadTicket { id, document })
    }

    pub fn finish_upload(
        &mut self,
        ticket: &UploadTicket,
        result: Result<QuizSet, ExtractionError>,
    ) -> Result<(), FlowError> {
        if self.in_flight != Some(ticket.id) {
            warn!("[Upload] Dropping result of cancelled upload #{}", ticket.id);
            return Err(FlowError::Superseded);
        }
        self.in_flight = None;

        let questions = result.inspect_err(|e| error!("[Upload] Upload #{} failed: {}", ticket.id, e))?;
        self.session.apply(Intent::Load(questions))?;
        self.staged = None;
        info!("[Upload] Loaded {} questions", self.session.len());
        Ok(())
    }

    /// Forgets the upload behind `ticket` without touching the session or
    /// the staged file, so it can be submitted again.
    pub fn abandon_upload(&mut self, ticket: &UploadTicket) {
        if self.in_flight == Some(ticket.id) {
            warn!("[Upload] Upload #{} abandoned", ticket.id);
            self.in_flight = None;
        }
    }

    /// Uploads the staged file and waits for the questions.
    pub fn submit_upload(&mut self) -> Result<(), FlowError> {
        let ticket = self.start_upload()?;
        let result = self.source.submit(&ticket.document);
        self.finish_upload(&ticket, result)
    }

    pub fn select_answer(&mut self, id: AnswerId) -> Result<(), Rejected> {
        self.session.apply(Intent::SelectAnswer(id))
    }

    /// "Start" before the quiz has begun, "Next" afterwards.
    pub fn next(&mut self) -> Result<(), Rejected> {
        if self.session.started() {
            self.session.apply(Intent::Advance)
        } else {
            self.session.apply(Intent::Begin)
        }
    }

    pub fn go_back(&mut self) -> Result<(), Rejected> {
        self.session.apply(Intent::GoBack)
    }

    pub fn cancel_quiz(&mut self) {
        if let Some(id) = self.in_flight.take() {
            info!("[Upload] Abandoning upload #{}", id);
        }
        self.session = transition(&self.session, Intent::Cancel).unwrap_or_default();
        self.staged = None;
    }
}
