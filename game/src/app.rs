use std::time::Instant;

use egui::{Align2, Color32, FontId, Pos2, Rect, Rounding, Stroke, Vec2};
use lanefall_charter::spectrum::{SpectrumAnalyzer, SpectrumFrame};

use crate::audio::AudioPlayer;
use crate::clock::Transport;
use crate::input::KeyBindings;
use crate::judge::{NoteStatus, Resolution};
use crate::session::{FrameResult, GameSession};

pub const WINDOW_WIDTH: f32 = 400.0;
pub const WINDOW_HEIGHT: f32 = 600.0;

const LANE_WIDTH: f32 = 100.0;
const NOTE_WIDTH: f32 = 80.0;
const NOTE_HEIGHT: f32 = 20.0;
/// Pixels a note falls per second; how far ahead notes become visible.
const NOTE_SPEED: f32 = 300.0;
const HIT_LINE_Y: f32 = 500.0;

/// How long a judgment label stays on screen, in seconds.
const FLASH_DURATION: f32 = 0.5;

const VIS_BAR_HEIGHT: f32 = 80.0;

/// The frame-driven play screen: polls input, ticks the session, analyzes
/// the spectrum and paints, all on the UI thread once per frame.
pub struct LanefallApp {
    session: GameSession,
    spectrum: SpectrumAnalyzer,
    audio: Option<AudioPlayer>,
    bindings: KeyBindings,
    /// Most recent judgment, with the clock time it happened at.
    last_flash: Option<(Resolution, f32)>,
    started: bool,
}

impl LanefallApp {
    pub fn new(session: GameSession, spectrum: SpectrumAnalyzer, audio: Option<AudioPlayer>) -> Self {
        LanefallApp {
            session,
            spectrum,
            audio,
            bindings: KeyBindings::default(),
            last_flash: None,
            started: false,
        }
    }

    /// One iteration of the loop body: input, clock, judge, spectrum.
    /// Rendering happens afterwards in `update`, against this frame's state.
    fn poll_frame(&mut self, ctx: &egui::Context, now: Instant) -> (FrameResult, SpectrumFrame) {
        if !self.started {
            // Audio and clock start on the same frame so they share an anchor
            if let Some(audio) = &self.audio {
                audio.resume();
            }
            self.session.start(now);
            self.started = true;
        }

        let (presses, escape, pause) = ctx.input(|i| {
            (
                self.bindings.pressed_lanes(i),
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::Space),
            )
        });

        if escape {
            return (FrameResult::Quit, SpectrumFrame::default());
        }
        if pause {
            self.session.toggle_pause(now);
            if let Some(audio) = &self.audio {
                match self.session.transport() {
                    Transport::Paused => audio.pause(),
                    Transport::Playing => audio.resume(),
                    _ => {}
                }
            }
        }

        let report = self.session.tick(now, &presses);
        if let Some(res) = report.resolutions.last() {
            self.last_flash = Some((*res, report.time));
        }

        let spectrum = self.spectrum.frame_at(report.time);
        (FrameResult::Continue, spectrum)
    }

    fn draw(&self, ui: &egui::Ui, time: f32, spectrum: &SpectrumFrame) {
        let painter = ui.painter();
        let origin = ui.max_rect().min;
        let at = |x: f32, y: f32| Pos2::new(origin.x + x, origin.y + y);

        painter.rect_filled(ui.max_rect(), Rounding::ZERO, Color32::BLACK);

        self.draw_visualizer(painter, &at, spectrum);
        self.draw_lanes(painter, &at);
        self.draw_notes(painter, &at, time);
        self.draw_hud(painter, &at, time);
    }

    fn draw_lanes(&self, painter: &egui::Painter, at: &dyn Fn(f32, f32) -> Pos2) {
        let lanes = self.session.beatmap().lanes as usize;
        for i in 0..lanes {
            let rect = Rect::from_min_size(
                at(i as f32 * LANE_WIDTH, 0.0),
                Vec2::new(LANE_WIDTH, WINDOW_HEIGHT),
            );
            painter.rect_stroke(rect, Rounding::ZERO, Stroke::new(2.0, Color32::from_gray(40)));
        }

        painter.line_segment(
            [at(0.0, HIT_LINE_Y), at(WINDOW_WIDTH, HIT_LINE_Y)],
            Stroke::new(2.0, Color32::WHITE),
        );
    }

    fn draw_notes(&self, painter: &egui::Painter, at: &dyn Fn(f32, f32) -> Pos2, time: f32) {
        for (i, note) in self.session.beatmap().notes.iter().enumerate() {
            if self.session.note_status(i) != NoteStatus::Pending {
                continue;
            }

            let time_until_hit = note.time - time;
            let y = HIT_LINE_Y - time_until_hit * NOTE_SPEED;
            if !(-NOTE_HEIGHT..WINDOW_HEIGHT + NOTE_HEIGHT).contains(&y) {
                continue;
            }

            let x = note.lane as f32 * LANE_WIDTH + (LANE_WIDTH - NOTE_WIDTH) / 2.0;
            let rect = Rect::from_min_size(at(x, y), Vec2::new(NOTE_WIDTH, NOTE_HEIGHT));
            painter.rect_filled(rect, Rounding::same(3.0), Color32::from_rgb(0, 150, 255));
        }
    }

    fn draw_visualizer(
        &self,
        painter: &egui::Painter,
        at: &dyn Fn(f32, f32) -> Pos2,
        spectrum: &SpectrumFrame,
    ) {
        let bar_width = WINDOW_WIDTH / spectrum.bands.len() as f32;
        for (i, &level) in spectrum.bands.iter().enumerate() {
            let height = level * VIS_BAR_HEIGHT;
            let rect = Rect::from_min_size(
                at(i as f32 * bar_width + 2.0, WINDOW_HEIGHT - height),
                Vec2::new(bar_width - 4.0, height),
            );
            painter.rect_filled(rect, Rounding::ZERO, Color32::from_rgb(90, 40, 160));
        }
    }

    fn draw_hud(&self, painter: &egui::Painter, at: &dyn Fn(f32, f32) -> Pos2, time: f32) {
        let score = self.session.score();
        painter.text(
            at(10.0, 10.0),
            Align2::LEFT_TOP,
            format!("Score: {}  Combo: {}", score.score, score.combo),
            FontId::proportional(20.0),
            Color32::WHITE,
        );

        if let Some((res, flash_time)) = &self.last_flash {
            if time - flash_time < FLASH_DURATION {
                let label = match res.status {
                    NoteStatus::Hit(tier) => tier.label(),
                    NoteStatus::Missed => "MISS",
                    NoteStatus::Pending => "",
                };
                let color = match res.status {
                    NoteStatus::Hit(_) => Color32::from_rgb(120, 220, 120),
                    _ => Color32::from_rgb(220, 90, 90),
                };
                painter.text(
                    at(WINDOW_WIDTH / 2.0, HIT_LINE_Y - 80.0),
                    Align2::CENTER_CENTER,
                    label,
                    FontId::proportional(28.0),
                    color,
                );
            }
        }

        if self.session.transport() == Transport::Paused {
            painter.text(
                at(WINDOW_WIDTH / 2.0, WINDOW_HEIGHT / 2.0),
                Align2::CENTER_CENTER,
                "PAUSED",
                FontId::proportional(32.0),
                Color32::LIGHT_GRAY,
            );
        }

        if self.session.is_over() {
            painter.text(
                at(WINDOW_WIDTH / 2.0, WINDOW_HEIGHT / 2.0 - 40.0),
                Align2::CENTER_CENTER,
                "TRACK COMPLETE",
                FontId::proportional(28.0),
                Color32::WHITE,
            );
            painter.text(
                at(WINDOW_WIDTH / 2.0, WINDOW_HEIGHT / 2.0),
                Align2::CENTER_CENTER,
                format!("Score {}   Max combo {}", score.score, score.max_combo),
                FontId::proportional(20.0),
                Color32::LIGHT_GRAY,
            );
            painter.text(
                at(WINDOW_WIDTH / 2.0, WINDOW_HEIGHT / 2.0 + 30.0),
                Align2::CENTER_CENTER,
                format!(
                    "{} perfect / {} great / {} good / {} miss",
                    score.counts.perfect, score.counts.great, score.counts.good, score.counts.miss
                ),
                FontId::proportional(16.0),
                Color32::LIGHT_GRAY,
            );
        }
    }

    /// Final score line for the caller once the window closes.
    pub fn summary(&self) -> String {
        let score = self.session.score();
        format!(
            "score {} / max combo {}",
            score.score, score.max_combo
        )
    }
}

impl eframe::App for LanefallApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let (result, spectrum) = self.poll_frame(ctx, now);

        if result == FrameResult::Quit {
            if let Some(audio) = &self.audio {
                audio.stop();
            }
            log::info!("session ended: {}", self.summary());
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }

        let time = self.session.current_time(now);
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.draw(ui, time, &spectrum);
            });

        // Animation is clock-driven, so keep repainting every frame
        ctx.request_repaint();
    }
}
