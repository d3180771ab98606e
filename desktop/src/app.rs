use crate::storage;
use eframe::egui;
use facts_core::session::PALETTE_SIZE;
use facts_core::{AnswerResult, Frame, QuestionView, Session, SessionConfig, Settings, Stage};
use log::error;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

const STOPWATCH_TICK: Duration = Duration::from_millis(500);

#[derive(Clone, Copy)]
struct Colors {
    background: egui::Color32,
    border: egui::Color32,
    text: egui::Color32,
}

const fn rgb(hex: u32) -> egui::Color32 {
    egui::Color32::from_rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const PALETTE: [Colors; PALETTE_SIZE] = [
    Colors { background: rgb(0xACFF7E), border: rgb(0xEAFFDC), text: rgb(0x155D00) },
    Colors { background: rgb(0xEF99FF), border: rgb(0xFFDFFE), text: rgb(0x9D15D5) },
    Colors { background: rgb(0xFFB23A), border: rgb(0xFFEBD5), text: rgb(0xBD4E00) },
    Colors { background: rgb(0x77D7FF), border: rgb(0xD4FFFD), text: rgb(0x02497C) },
    Colors { background: rgb(0xFFB1B1), border: rgb(0xFFDCDC), text: rgb(0xC40300) },
    Colors { background: rgb(0x3AF5BE), border: rgb(0xCCFFF2), text: rgb(0x036247) },
];

enum Notice {
    TimeExpired,
    ReportFailed(String),
}

pub struct MathFactsApp {
    settings: Settings,
    session: Session,
    notice: Option<Notice>,
}

impl Default for MathFactsApp {
    fn default() -> Self {
        let settings = storage::load_settings_or_default();
        let session = Session::new(SessionConfig::from(&settings));

        Self {
            settings,
            session,
            notice: None,
        }
    }
}

impl MathFactsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self::default()
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            match event {
                egui::Event::Text(text) => {
                    for c in text.chars() {
                        self.session.push_char(c);
                    }
                }
                egui::Event::Key {
                    key: egui::Key::Backspace,
                    pressed: true,
                    ..
                } => {
                    self.session.delete_last();
                }
                egui::Event::Key {
                    key: egui::Key::Enter,
                    pressed: true,
                    ..
                } => {
                    self.session.submit();
                }
                _ => {}
            }
        }
    }

    fn write_report(&mut self, ctx: &egui::Context) {
        match storage::save_report(&self.settings, &self.session.report()) {
            Ok(_) => {
                self.notice = None;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Err(e) => {
                error!("{}", e);
                self.notice = Some(Notice::ReportFailed(e));
            }
        }
    }

    fn title_ui(&mut self, ui: &mut egui::Ui, colors: Colors) {
        ui.vertical_centered(|ui| {
            ui.add_space(30.0);
            ui.label(
                egui::RichText::new("Math Facts")
                    .size(64.0)
                    .strong()
                    .color(colors.text),
            );
            ui.add_space(30.0);

            let choices = self.session.available_choices();
            if choices.is_empty() {
                ui.label(
                    egui::RichText::new("No math facts are enabled.")
                        .size(24.0)
                        .color(colors.text),
                );
                return;
            }

            for choice in choices {
                let button = egui::Button::new(egui::RichText::new(choice.label()).size(24.0))
                    .fill(colors.border);
                if ui.add_sized([260.0, 44.0], button).clicked() {
                    if let Err(e) = self.session.start(choice) {
                        error!("cannot start {}: {}", choice.label(), e);
                    }
                }
                ui.add_space(8.0);
            }
        });
    }

    fn practice_ui(&self, ui: &mut egui::Ui, frame: &Frame, colors: Colors, now: Instant) {
        ui.vertical_centered(|ui| {
            ui.add_space(10.0);
            match &frame.question {
                Some(QuestionView::Arithmetic { top, symbol, bottom }) => {
                    let text = format!("{}\n{}  {}\n{}", top, symbol, bottom, frame.response);
                    ui.label(
                        egui::RichText::new(text)
                            .size(72.0)
                            .monospace()
                            .color(colors.text),
                    );
                }
                Some(QuestionView::Clock {
                    prompt,
                    hour,
                    minute,
                    afternoon,
                }) => {
                    if let Some(afternoon) = afternoon {
                        let cue = if *afternoon { "Afternoon" } else { "Morning" };
                        ui.label(egui::RichText::new(cue).size(24.0).color(colors.text));
                    }
                    paint_clock(ui, *hour, *minute, colors);
                    ui.label(
                        egui::RichText::new(format!("{}\n{}", prompt, frame.response))
                            .size(36.0)
                            .color(colors.text),
                    );
                }
                None => {}
            }

            ui.add_space(10.0);
            match frame.feedback {
                Some(AnswerResult::Correct) => {
                    ui.label(
                        egui::RichText::new("Correct!")
                            .size(32.0)
                            .color(egui::Color32::from_rgb(50, 205, 50)),
                    );
                }
                Some(AnswerResult::Incorrect) => {
                    ui.label(
                        egui::RichText::new("Try again")
                            .size(32.0)
                            .color(egui::Color32::from_rgb(220, 20, 60)),
                    );
                }
                None => {}
            }
        });

        ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
            let remaining = self.session.remaining_at(now).as_secs();
            ui.horizontal(|ui| {
                ui.add(
                    egui::ProgressBar::new(frame.remaining)
                        .desired_width(200.0)
                        .fill(colors.text),
                );
                ui.label(
                    egui::RichText::new(format!(
                        "{}:{:02}  answered {}",
                        remaining / 60,
                        remaining % 60,
                        frame.answered
                    ))
                    .color(colors.text),
                );
            });
        });
    }

    fn notice_ui(&mut self, ctx: &egui::Context) {
        let (title, message) = match &self.notice {
            Some(Notice::TimeExpired) => (
                "Time Expired",
                "The time allotted has expired.".to_string(),
            ),
            Some(Notice::ReportFailed(e)) => ("Write Report Error", e.clone()),
            None => return,
        };

        let mut acknowledged = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    acknowledged = true;
                }
            });

        if acknowledged {
            if matches!(self.notice, Some(Notice::TimeExpired)) {
                self.write_report(ctx);
            } else {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }
}

fn paint_clock(ui: &mut egui::Ui, hour: u8, minute: u8, colors: Colors) {
    let size = ui.available_width().min(ui.available_height() * 0.6).clamp(120.0, 360.0);
    let (response, painter) = ui.allocate_painter(egui::Vec2::splat(size), egui::Sense::hover());
    let center = response.rect.center();
    let radius = size * 0.45;

    painter.circle(
        center,
        radius,
        egui::Color32::WHITE,
        egui::Stroke::new(4.0, colors.text),
    );

    let at = |turns: f32, length: f32| {
        let angle = turns * TAU;
        center + egui::vec2(angle.sin(), -angle.cos()) * length
    };

    for n in 1..=12u8 {
        painter.text(
            at(f32::from(n) / 12.0, radius * 0.82),
            egui::Align2::CENTER_CENTER,
            n.to_string(),
            egui::FontId::proportional(radius * 0.16),
            colors.text,
        );
    }

    let minute_turns = f32::from(minute) / 60.0;
    let hour_turns = (f32::from(hour % 12) + minute_turns) / 12.0;
    painter.line_segment(
        [center, at(hour_turns, radius * 0.5)],
        egui::Stroke::new(8.0, colors.text),
    );
    painter.line_segment(
        [center, at(minute_turns, radius * 0.75)],
        egui::Stroke::new(4.0, colors.text),
    );
    painter.circle_filled(center, 6.0, colors.text);
}

impl eframe::App for MathFactsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if self.session.stage() == Stage::Practice {
            self.handle_input(ctx);
            if self.session.check_end_at(now) {
                self.notice = Some(Notice::TimeExpired);
            }
            ctx.request_repaint_after(STOPWATCH_TICK);
        }

        let frame = self.session.frame_at(now);
        let colors = PALETTE[frame.palette_index % PALETTE.len()];

        egui::CentralPanel::default()
            .frame(
                egui::Frame::default()
                    .fill(colors.background)
                    .stroke(egui::Stroke::new(15.0, colors.border))
                    .inner_margin(30.0),
            )
            .show(ctx, |ui| match frame.stage {
                Stage::Title => self.title_ui(ui, colors),
                Stage::Practice => self.practice_ui(ui, &frame, colors, now),
                Stage::Ended => {}
            });

        self.notice_ui(ctx);
    }
}
