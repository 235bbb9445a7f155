use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use diary_core::{
    calendar::CalendarSystem,
    color::Hsl,
    grid::{GridGeometry, MAX_COLUMNS},
    settings::{HeatmapSettings, SettingsStore},
    DiaryService, Heatmap,
};
use egui::Color32;
use tracing::{debug, info, warn};

const DEFAULT_SETTINGS_FILE: &str = "diary_heatmap.json";
const WATCH_POLL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) settings_path: PathBuf,
    pub(crate) diary_root: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("DIARY_SETTINGS") {
            if !path.trim().is_empty() {
                config.settings_path = PathBuf::from(path.trim());
            }
        }
        if let Ok(root) = std::env::var("DIARY_ROOT") {
            if !root.trim().is_empty() {
                info!(path = %root, "diary root overridden from environment");
                config.diary_root = Some(PathBuf::from(root.trim()));
            }
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_FILE),
            diary_root: None,
        }
    }
}

struct HeatmapApp {
    store: SettingsStore,
    settings: HeatmapSettings,
    path_buffer: String,
    service: Option<DiaryService>,
    heatmap: Heatmap,
    geometry: GridGeometry,
    notice: Option<String>,
    dirty: bool,
}

impl HeatmapApp {
    fn new(config: AppConfig) -> Self {
        let store = SettingsStore::new(&config.settings_path);
        let mut notice = None;
        let mut settings = store.load().unwrap_or_else(|err| {
            warn!(%err, "falling back to default settings");
            notice = Some(format!("{err:#}"));
            HeatmapSettings::default()
        });
        if let Some(root) = config.diary_root {
            settings.diary_path = root;
        }

        let mut app = Self {
            store,
            path_buffer: settings.diary_path.display().to_string(),
            settings,
            service: None,
            heatmap: Heatmap::default(),
            geometry: GridGeometry::from_view_width(0.0),
            notice,
            dirty: true,
        };
        app.open_diary();
        app
    }

    fn open_diary(&mut self) {
        info!(path = %self.settings.diary_path.display(), "opening diary");
        let service = DiaryService::builder()
            .add_root(&self.settings.diary_path)
            .build()
            .and_then(|mut service| {
                service.watch()?;
                Ok(service)
            });
        match service {
            Ok(service) => {
                self.service = Some(service);
                self.dirty = true;
            }
            Err(err) => {
                warn!(%err, "failed to open diary");
                self.notice = Some(format!("{err:#}"));
            }
        }
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.settings) {
            warn!(%err, "failed to save settings");
            self.notice = Some(format!("{err:#}"));
        }
    }

    /// Recomputes the grids when settings, files or the view width changed.
    /// A failed pass keeps the previous grids and raises a notice.
    fn refresh(&mut self, width: f32) {
        let Some(service) = self.service.as_mut() else {
            return;
        };
        if service.take_changes() {
            debug!("diary changed on disk");
            if let Err(err) = service.reload_all() {
                warn!(%err, "reload failed");
                self.notice = Some(format!("{err:#}"));
                return;
            }
            self.dirty = true;
        }

        let geometry = GridGeometry::from_view_width(width);
        if !self.dirty && geometry == self.geometry {
            return;
        }
        self.dirty = false;
        self.geometry = geometry;

        let result = self
            .settings
            .config()
            .map_err(anyhow::Error::from)
            .and_then(|config| service.heatmap(&config, &geometry));
        match result {
            Ok(heatmap) => {
                debug!(years = heatmap.years.len(), "heatmap refreshed");
                self.heatmap = heatmap;
                self.notice = None;
            }
            Err(err) => {
                warn!(%err, "render pass aborted");
                self.notice = Some(format!("{err:#}"));
            }
        }
    }

    fn settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.separator();

        ui.label("Diary path");
        let response = ui.text_edit_singleline(&mut self.path_buffer);
        let typed = PathBuf::from(self.path_buffer.trim());
        if response.lost_focus() && typed != self.settings.diary_path {
            self.settings.diary_path = typed;
            self.persist();
            self.open_diary();
        }
        ui.add_space(8.0);

        let mut changed = false;
        changed |= calendar_combo(ui, "Notes calendar", &mut self.settings.notes_calendar);
        changed |= calendar_combo(ui, "Display calendar", &mut self.settings.display_calendar);
        ui.separator();
        changed |= hsl_editor(ui, "Fewest words", &mut self.settings.min_color);
        ui.add_space(8.0);
        changed |= hsl_editor(ui, "Most words", &mut self.settings.max_color);

        if changed {
            self.persist();
            self.dirty = true;
        }
    }

    fn notice_bar(&mut self, ui: &mut egui::Ui) {
        let mut dismissed = false;
        if let Some(notice) = &self.notice {
            ui.horizontal(|ui| {
                ui.colored_label(ui.visuals().warn_fg_color, notice);
                dismissed = ui.button("Dismiss").clicked();
            });
            ui.separator();
        }
        if dismissed {
            self.notice = None;
        }
    }

    fn draw_years(&self, ui: &mut egui::Ui) {
        if self.heatmap.is_empty() {
            ui.label("No journal entries found.");
            return;
        }
        let background = ui.visuals().faint_bg_color;
        let width = f32::from(MAX_COLUMNS) * self.geometry.pitch;

        for year in &self.heatmap.years {
            ui.heading(year.year_label.to_string());
            let (rect, response) = ui.allocate_exact_size(
                egui::vec2(width, self.geometry.block_height()),
                egui::Sense::hover(),
            );
            let painter = ui.painter_at(rect);
            let hover = response.hover_pos();
            let mut hovered = None;

            for cell in &year.cells {
                let (x, y) = self.geometry.origin(cell.row, cell.column);
                let cell_rect = egui::Rect::from_min_size(
                    rect.min + egui::vec2(x, y),
                    egui::vec2(cell.size, cell.size),
                );
                painter.rect_filled(
                    cell_rect,
                    egui::CornerRadius::same(2),
                    cell_fill(cell.color, background),
                );
                if hover.is_some_and(|pos| cell_rect.contains(pos)) {
                    hovered = Some(cell);
                }
            }

            if let Some(cell) = hovered {
                let _ = response.on_hover_text(format!(
                    "{}: {} words",
                    cell.date,
                    cell.value.unwrap_or(0)
                ));
            }
        }
    }
}

impl eframe::App for HeatmapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("settings")
            .resizable(false)
            .show(ctx, |ui| self.settings_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.notice_bar(ui);
            self.refresh(ui.available_width());
            egui::ScrollArea::vertical().show(ui, |ui| self.draw_years(ui));
        });

        ctx.request_repaint_after(WATCH_POLL);
    }
}

fn calendar_combo(ui: &mut egui::Ui, label: &str, value: &mut String) -> bool {
    let before = value.clone();
    let selected = CalendarSystem::from_setting(label, value)
        .map(CalendarSystem::label)
        .unwrap_or("Unknown");
    egui::ComboBox::from_label(label)
        .selected_text(selected)
        .show_ui(ui, |ui| {
            for calendar in CalendarSystem::ALL {
                ui.selectable_value(&mut *value, calendar.as_str().to_string(), calendar.label());
            }
        });
    *value != before
}

fn hsl_editor(ui: &mut egui::Ui, label: &str, color: &mut Hsl) -> bool {
    ui.label(label);
    let mut changed = false;
    changed |= ui
        .add(egui::Slider::new(&mut color.hue, 0.0..=359.0).text("Hue"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut color.saturation, 0.0..=100.0).text("Saturation"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut color.lightness, 0.0..=100.0).text("Lightness"))
        .changed();
    let (swatch, _) = ui.allocate_exact_size(egui::vec2(48.0, 12.0), egui::Sense::hover());
    ui.painter().rect_filled(
        swatch,
        egui::CornerRadius::same(2),
        cell_fill(Some(*color), Color32::TRANSPARENT),
    );
    changed
}

fn cell_fill(color: Option<Hsl>, background: Color32) -> Color32 {
    match color {
        Some(color) => {
            let [r, g, b] = color.to_rgb();
            Color32::from_rgb(r, g, b)
        }
        None => background,
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    info!(settings = %config.settings_path.display(), "starting diary heatmap");
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 760.0])
            .with_title("Diary heatmap"),
        ..Default::default()
    };
    eframe::run_native(
        "Diary heatmap",
        options,
        Box::new(move |_cc| Ok(Box::new(HeatmapApp::new(config)))),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))
    .context("viewer exited with an error")
}
