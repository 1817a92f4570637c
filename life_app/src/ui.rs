// ui.rs - egui rendering and input for the sparse engine
// Input only ever reaches the engine through toggle/step/restart calls

use std::time::Duration;

use eframe::egui;
use egui::{Color32, Key, Rect, Stroke, Vec2};
use life_core::{Coord, patterns};

use crate::GameOfLife;

const GRID_PIXELS: f32 = 780.0;
const SPACING: f32 = 0.5;

impl eframe::App for GameOfLife {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pick up steps taken by the ticker since the last frame
        self.drain_diffs();

        // Keyboard bindings
        let (space, up, down, restart) = ctx.input(|i| {
            (
                i.key_pressed(Key::Space),
                i.key_pressed(Key::ArrowUp),
                i.key_pressed(Key::ArrowDown),
                i.key_pressed(Key::R),
            )
        });
        if space { self.toggle_running(); }
        if up { self.speed_up(); }
        if down { self.slow_down(); }
        if restart { self.restart(); }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Sparse Conway's Game of Life");

            // Controls
            ui.horizontal(|ui| {
                let button_text = if self.is_running() { "⏸ Pause" } else { "▶ Start" };
                if ui.button(button_text).clicked() {
                    self.toggle_running();
                }

                if ui.button("⏭ Step").clicked() {
                    self.step_once();
                }

                if ui.button("⏹ Restart").clicked() {
                    self.restart();
                }

                if ui.button("🎲 Random").clicked() {
                    self.apply_random_pattern();
                }

                ui.separator();

                // Pattern dropdown
                ui.label("Pattern:");
                egui::ComboBox::from_id_source("pattern_selector")
                    .selected_text(patterns::PATTERNS[self.selected_pattern].name)
                    .show_ui(ui, |ui| {
                        for (i, pattern) in patterns::PATTERNS.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_pattern, i, pattern.name);
                        }
                    });

                if ui.button("Apply Pattern").clicked() {
                    self.apply_selected_pattern();
                }
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Speed:");
                if ui.button("➖").clicked() {
                    self.slow_down();
                }
                ui.label(format!("{}x", self.rate()));
                if ui.button("➕").clicked() {
                    self.speed_up();
                }

                ui.separator();

                ui.label(if self.is_running() { "Running" } else { "Paused" });
                ui.label(format!("Generation: {}", self.generation));
                ui.label(format!("Live cells: {}", self.population));

                ui.separator();

                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);
            });

            if let Some(status) = &self.status {
                ui.label(status.as_str());
            }

            ui.label("Click cells to toggle them. Space: start/pause, ↑/↓: speed, R: restart.");

            ui.separator();

            // Draw the grid
            let size = self.size.max(1);
            let box_size = (GRID_PIXELS / size as f32 - SPACING).clamp(1.0, 15.0);
            let pitch = box_size + SPACING;

            let start_pos = ui.cursor().min;
            let total_size = Vec2::splat(pitch * size as f32 - SPACING);

            let (response, painter) = ui.allocate_painter(total_size, egui::Sense::click());

            // Fill background
            painter.rect_filled(
                Rect::from_min_size(start_pos, total_size),
                0.0,
                Color32::BLACK,
            );

            for row in 0..size {
                for col in 0..size {
                    let x = start_pos.x + col as f32 * pitch;
                    let y = start_pos.y + row as f32 * pitch;

                    let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));

                    let idx = row as usize * size as usize + col as usize;
                    let cell_color = if self.cells.get(idx).copied().unwrap_or(false) {
                        self.live_color
                    } else {
                        self.dead_color
                    };

                    painter.rect_filled(rect, 1.0, cell_color);
                    if box_size >= 4.0 {
                        painter.rect_stroke(rect, 1.0, Stroke::new(0.2, Color32::from_gray(60)));
                    }
                }
            }

            // Map the click straight to a cell
            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let rel = pos - start_pos;
                    let row = (rel.y / pitch).floor() as i32;
                    let col = (rel.x / pitch).floor() as i32;
                    if (0..size).contains(&row) && (0..size).contains(&col) {
                        self.toggle_cell(Coord::new(row, col));
                    }
                }
            }
        });

        // Keep polling the ticker while running
        if self.is_running() {
            ctx.request_repaint_after(Duration::from_millis(30));
        }
    }
}
