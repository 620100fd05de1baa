use crate::libquiz::flow::{FlowError, QuizFlow, UploadTicket};
use crate::libquiz::question::{AnswerId, QuizSet};
use crate::libquiz::session::Phase;
use crate::libquiz::source::ExtractionError;
use crate::Error;
use eframe::egui;
use eframe::egui::{Button, Color32, RichText, Ui};
use log::{debug, error, warn};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

type UploadResult = Result<QuizSet, ExtractionError>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum UiIntent {
    SelectFile,
    ClearFile,
    SubmitUpload,
    SelectAnswer(AnswerId),
    Next,
    Back,
    Cancel,
}

struct GuiState {
    flow: QuizFlow,
    path_input: String,
    status: Option<String>,
    pending: Option<(UploadTicket, Receiver<UploadResult>)>,
}

impl GuiState {
    fn new(flow: QuizFlow) -> Self {
        let path_input = flow
            .staged()
            .map(|d| d.path.display().to_string())
            .unwrap_or_default();
        Self {
            flow,
            path_input,
            status: None,
            pending: None,
        }
    }

    fn start_upload(&mut self, ctx: &egui::Context) -> Result<(), FlowError> {
        let ticket = self.flow.start_upload()?;
        let source = self.flow.source();
        let document = ticket.document.clone();
        let (tx, rx) = mpsc::channel();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            // receiver is gone if the upload was cancelled meanwhile
            let _ = tx.send(source.submit(&document));
            ctx.request_repaint();
        });
        self.pending = Some((ticket, rx));
        Ok(())
    }

    fn poll_upload(&mut self, ctx: &egui::Context) {
        let Some((ticket, rx)) = self.pending.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => match self.flow.finish_upload(&ticket, result) {
                Ok(()) => self.status = None,
                Err(FlowError::Superseded) => {}
                Err(err) => self.status = Some(format!("Could not generate a quiz: {err}")),
            },
            Err(TryRecvError::Empty) => {
                self.pending = Some((ticket, rx));
                ctx.request_repaint_after(Duration::from_millis(200));
            }
            Err(TryRecvError::Disconnected) => {
                error!("[GUI] Upload worker stopped without an answer");
                self.flow.abandon_upload(&ticket);
                self.status = Some("Upload stopped unexpectedly, try again".to_string());
            }
        }
    }

    fn dispatch(&mut self, intent: UiIntent, ctx: &egui::Context) {
        debug!("[GUI] {:?}", intent);
        let result = match intent {
            UiIntent::SelectFile => self.flow.select_file(Path::new(self.path_input.trim())),
            UiIntent::ClearFile => {
                self.flow.clear_file();
                Ok(())
            }
            UiIntent::SubmitUpload => self.start_upload(ctx),
            UiIntent::SelectAnswer(id) => self.flow.select_answer(id).map_err(FlowError::from),
            UiIntent::Next => self.flow.next().map_err(FlowError::from),
            UiIntent::Back => self.flow.go_back().map_err(FlowError::from),
            UiIntent::Cancel => {
                self.pending = None;
                self.flow.cancel_quiz();
                Ok(())
            }
        };
        match result {
            Ok(()) => self.status = None,
            Err(err) => {
                warn!("[GUI] {:?} refused: {}", intent, err);
                self.status = Some(err.to_string());
            }
        }
    }

    fn draw_status(&self, ui: &mut Ui) {
        if let Some(status) = &self.status {
            ui.label(RichText::new(status).color(Color32::LIGHT_RED));
        }
    }

    fn draw_upload(&mut self, ui: &mut Ui, intents: &mut Vec<UiIntent>) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading(RichText::new("Upload PDF").size(32.0).strong());
            ui.add_space(20.0);

            match self.flow.staged() {
                Some(document) => {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&document.name).strong());
                        if ui.add_enabled(!self.flow.is_uploading(), Button::new("✖")).clicked() {
                            intents.push(UiIntent::ClearFile);
                        }
                    });
                }
                None => {
                    ui.horizontal(|ui| {
                        ui.label("Path:");
                        ui.text_edit_singleline(&mut self.path_input);
                        if ui.button("Select").clicked() {
                            intents.push(UiIntent::SelectFile);
                        }
                    });
                }
            }

            ui.add_space(20.0);
            let can_submit = self.flow.staged().is_some() && !self.flow.is_uploading();
            if ui.add_enabled(can_submit, Button::new("Generate")).clicked() {
                intents.push(UiIntent::SubmitUpload);
            }
            if self.flow.is_uploading() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Generating questions...");
                    if ui.button("Cancel").clicked() {
                        intents.push(UiIntent::Cancel);
                    }
                });
            }
            self.draw_status(ui);
        });
    }

    fn draw_quiz(&self, ctx: &egui::Context, intents: &mut Vec<UiIntent>) {
        let state = self.flow.session();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.add_enabled(state.started(), Button::new("<")).clicked() {
                    intents.push(UiIntent::Back);
                }
                let width = ui.available_width() - 40.0;
                ui.add(
                    egui::ProgressBar::new(state.progress_percent() as f32 / 100.0)
                        .desired_width(width)
                        .show_percentage(),
                );
                if ui.button(RichText::new("✖").color(Color32::LIGHT_RED)).clicked() {
                    intents.push(UiIntent::Cancel);
                }
            });
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(10.0);
                if let (Some(correct), Some(question)) = (state.is_correct(), state.current_question()) {
                    result_box(ui, correct, question.reasoning.as_deref());
                }
                ui.label(format!("Score: {}/{}", state.score(), state.len()));
                let label = if state.started() { "Next" } else { "Start" };
                if ui.button(RichText::new(label).size(18.0)).clicked() {
                    intents.push(UiIntent::Next);
                }
                self.draw_status(ui);
                ui.add_space(10.0);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(30.0);
                if !state.started() {
                    ui.heading(RichText::new("Quiz 👋").size(40.0).strong());
                    return;
                }
                let Some(question) = state.current_question() else {
                    return;
                };
                ui.label(RichText::new(&question.text).size(24.0).strong());
                ui.add_space(20.0);
                for answer in &question.answers {
                    let mut button = Button::new(RichText::new(&answer.text).size(18.0))
                        .min_size(egui::vec2(300.0, 36.0));
                    if state.selected_answer_id() == Some(answer.id) {
                        button = button.fill(Color32::from_rgb(132, 204, 22));
                    }
                    if ui.add(button).clicked() {
                        intents.push(UiIntent::SelectAnswer(answer.id));
                    }
                    ui.add_space(8.0);
                }
            });
        });
    }
}

fn result_box(ui: &mut Ui, correct: bool, reasoning: Option<&str>) {
    let (title, fill, text) = if correct {
        ("Correct", Color32::from_rgb(220, 252, 231), Color32::from_rgb(21, 128, 61))
    } else {
        ("Oops", Color32::from_rgb(254, 226, 226), Color32::from_rgb(185, 28, 28))
    };
    egui::Frame::group(ui.style()).fill(fill).show(ui, |ui| {
        ui.label(RichText::new(title).size(18.0).strong().color(text));
        if let Some(reasoning) = reasoning {
            ui.label(RichText::new(reasoning).color(text));
        }
    });
}

impl eframe::App for GuiState {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_upload(ctx);

        let mut intents = Vec::new();
        if self.flow.session().phase() == Phase::Idle {
            egui::CentralPanel::default().show(ctx, |ui| self.draw_upload(ui, &mut intents));
        } else {
            self.draw_quiz(ctx, &mut intents);
        }
        for intent in intents {
            self.dispatch(intent, ctx);
        }
    }
}

pub fn init_gui(flow: QuizFlow) -> Result<(), Error> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 560.0])
            .with_min_inner_size([400.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "pdfquiz",
        native_options,
        Box::new(move |_cc| Ok(Box::new(GuiState::new(flow)))),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libquiz::source::FixtureSource;
    use std::sync::Arc;

    fn gui_with_sample() -> GuiState {
        GuiState::new(QuizFlow::new(Arc::new(FixtureSource::sample())))
    }

    #[test]
    fn refused_intents_show_a_status() {
        let ctx = egui::Context::default();
        let mut gui = gui_with_sample();
        gui.path_input = "notes.txt".to_string();
        gui.dispatch(UiIntent::SelectFile, &ctx);
        assert!(gui.status.is_some());

        gui.dispatch(UiIntent::SubmitUpload, &ctx);
        assert_eq!(gui.status.as_deref(), Some("pick a PDF first"));

        gui.dispatch(UiIntent::ClearFile, &ctx);
        assert!(gui.status.is_none());
    }

    #[test]
    fn upload_runs_in_the_background() {
        let ctx = egui::Context::default();
        let path = std::env::temp_dir().join("pdfquiz-gui-test.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let mut gui = gui_with_sample();
        gui.path_input = path.display().to_string();
        gui.dispatch(UiIntent::SelectFile, &ctx);
        gui.dispatch(UiIntent::SubmitUpload, &ctx);
        assert!(gui.flow.is_uploading());

        for _ in 0..100 {
            gui.poll_upload(&ctx);
            if gui.pending.is_none() {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(gui.flow.session().phase(), Phase::Ready);
        assert!(gui.status.is_none());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn cancel_drops_the_pending_upload() {
        let ctx = egui::Context::default();
        let path = std::env::temp_dir().join("pdfquiz-gui-cancel-test.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let mut gui = gui_with_sample();
        gui.path_input = path.display().to_string();
        gui.dispatch(UiIntent::SelectFile, &ctx);
        gui.dispatch(UiIntent::SubmitUpload, &ctx);
        gui.dispatch(UiIntent::Cancel, &ctx);

        assert!(gui.pending.is_none());
        assert!(!gui.flow.is_uploading());
        assert_eq!(gui.flow.session().phase(), Phase::Idle);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn next_starts_then_moves_on() {
        let ctx = egui::Context::default();
        let mut gui = gui_with_sample();
        let path = std::env::temp_dir().join("pdfquiz-gui-next-test.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        gui.flow.select_file(&path).unwrap();
        gui.flow.submit_upload().unwrap();

        gui.dispatch(UiIntent::Next, &ctx);
        assert!(gui.flow.session().started());
        gui.dispatch(UiIntent::SelectAnswer(0), &ctx);
        assert_eq!(gui.flow.session().score(), 1);
        gui.dispatch(UiIntent::Next, &ctx);
        assert_eq!(gui.flow.session().current_index(), 1);
        gui.dispatch(UiIntent::Back, &ctx);
        assert_eq!(gui.flow.session().current_index(), 0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn path_field_starts_with_the_full_staged_path() {
        let ctx = egui::Context::default();
        let dir = std::env::temp_dir().join("pdfquiz-gui-path-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lecture.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let mut flow = QuizFlow::new(Arc::new(FixtureSource::sample()));
        flow.select_file(&path).unwrap();
        let mut gui = GuiState::new(flow);
        assert_eq!(gui.path_input, path.display().to_string());

        gui.dispatch(UiIntent::ClearFile, &ctx);
        gui.dispatch(UiIntent::SelectFile, &ctx);
        assert!(gui.status.is_none());
        assert_eq!(gui.flow.staged().map(|d| d.path.clone()), Some(path.clone()));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn lost_worker_keeps_the_staged_file() {
        let ctx = egui::Context::default();
        let path = std::env::temp_dir().join("pdfquiz-gui-lost-worker-test.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let mut gui = gui_with_sample();
        gui.flow.select_file(&path).unwrap();
        let ticket = gui.flow.start_upload().unwrap();
        let (tx, rx) = mpsc::channel::<UploadResult>();
        drop(tx);
        gui.pending = Some((ticket, rx));

        gui.poll_upload(&ctx);
        assert!(gui.pending.is_none());
        assert!(!gui.flow.is_uploading());
        assert!(gui.flow.staged().is_some());
        assert!(gui.status.is_some());

        gui.dispatch(UiIntent::SubmitUpload, &ctx);
        assert!(gui.flow.is_uploading());
        let _ = std::fs::remove_file(path);
    }
}
