use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};

use eframe::egui::{self, Color32, RichText};
use eframe::egui::{FontData, FontDefinitions, FontFamily};
use tracing::{info, warn};

use fragment_analysis::config::Config;
use fragment_analysis::depict::depict_fragments;
use fragment_analysis::rdkit::RdkitBridge;
use fragment_analysis::session::Session;
use fragment_analysis_common::layout::{cell_text, IMAGE_LABEL, RESULT_COLUMNS};
use fragment_analysis_common::{Category, ColumnSelection, FragmentKey};

use crate::io::{default_export_path, export_analysis, load_config};
use crate::model::{ColumnChoice, ExportKind, ThumbData, UiMessage};

const TABLE_EXTENSIONS: &[&str] = &["csv", "tsv", "tab", "txt", "xlsx", "xlsm", "xlsb", "xls", "ods"];

pub struct DesktopApp {
    session: Session,
    config: Config,
    columns: ColumnChoice,
    status: String,
    export_status: String,
    export_kind: ExportKind,
    export_rx: Option<Receiver<UiMessage>>,
    exporting: bool,
    thumbs: HashMap<FragmentKey, egui::TextureHandle>,
    thumb_rx: Receiver<ThumbData>,
    thumb_tx: mpsc::Sender<ThumbData>,
    thumb_inflight: HashSet<FragmentKey>,
    pending_thumbs: Vec<ThumbData>,
}

impl DesktopApp {
    fn open_table(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Table", TABLE_EXTENSIONS)
            .pick_file()
        {
            self.load_from_path(path);
        }
    }

    fn reload_table(&mut self) {
        let Some(path) = self.session.source().map(|p| p.to_path_buf()) else {
            self.status = "No source file loaded".to_string();
            return;
        };
        self.load_from_path(path);
    }

    fn load_from_path(&mut self, path: PathBuf) {
        info!(path = %path.display(), "loading table");
        if self.session.load_file(&path, None) {
            if let Some(table) = self.session.table() {
                self.columns.fit_to(table);
                let missing = self.columns.missing_in(table);
                self.status = if missing.is_empty() {
                    format!("Loaded {} ({} rows)", path.display(), table.len())
                } else {
                    format!(
                        "Loaded {} ({} rows); selected columns not in this table: {}",
                        path.display(),
                        table.len(),
                        missing.join(", ")
                    )
                };
            }
        } else {
            self.status.clear();
        }
    }

    fn run_analyze(&mut self) {
        let (Some(structure), Some(category)) = (&self.columns.structure, &self.columns.category) else {
            return;
        };
        self.session
            .select_columns(ColumnSelection::new(structure.clone(), category.clone()));

        let bridge = RdkitBridge::from_config(&self.config);
        if self.session.analyze(&bridge) {
            if let Some(analysis) = self.session.analysis() {
                self.status = format!(
                    "Analyzed {} rows, {} categories, {} excluded",
                    analysis.total_rows(),
                    analysis.categories.len(),
                    analysis.excluded_rows()
                );
            }
        } else {
            self.status.clear();
        }
    }

    fn run_export(&mut self, kind: ExportKind) {
        let Some(analysis) = self.session.analysis().cloned() else {
            self.export_status = "Nothing to export".to_string();
            return;
        };
        let default_path = default_export_path(self.session.source(), kind);
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(
                default_path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("result_fragments"),
            )
            .save_file()
        else {
            return;
        };

        let config = self.config.clone();
        let (tx, rx) = mpsc::channel();
        self.export_rx = Some(rx);
        self.exporting = true;
        self.export_status = "Export running...".to_string();

        std::thread::spawn(move || {
            let message = match export_analysis(&analysis, kind, &path, &config) {
                Ok(written) => UiMessage::ExportDone {
                    message: format!("Export complete: {} file(s)", written.len()),
                },
                Err(err) => {
                    warn!("export failed: {err:#}");
                    UiMessage::ExportDone {
                        message: format!("Export failed: {err:#}"),
                    }
                }
            };
            let _ = tx.send(message);
        });
    }

    /// 表示中カテゴリのうち未取得のフラグメント画像をまとめて描画する
    fn request_thumbnails(&mut self, fragments: &[FragmentKey]) {
        let missing: Vec<FragmentKey> = fragments
            .iter()
            .filter(|f| !self.thumbs.contains_key(*f) && !self.thumb_inflight.contains(*f))
            .cloned()
            .collect();
        if missing.is_empty() {
            return;
        }
        self.thumb_inflight.extend(missing.iter().cloned());

        let sender = self.thumb_tx.clone();
        let bridge = RdkitBridge::from_config(&self.config);
        let size = self.config.thumbnail_size;

        std::thread::spawn(move || {
            for thumb in depict_fragments(&bridge, &missing, size) {
                let size = thumb.size();
                let _ = sender.send(ThumbData {
                    fragment: thumb.fragment,
                    size,
                    pixels: thumb.image.into_raw(),
                });
            }
        });
    }

    fn process_pending_thumbs(&mut self, ctx: &egui::Context) {
        let pending = std::mem::take(&mut self.pending_thumbs);
        for msg in pending {
            if msg.size[0] == 0 || msg.size[1] == 0 {
                continue;
            }
            let color_image = egui::ColorImage::from_rgba_unmultiplied(msg.size, &msg.pixels);
            let texture = ctx.load_texture(msg.fragment.as_str(), color_image, egui::TextureOptions::default());
            self.thumbs.insert(msg.fragment, texture);
        }
    }

    fn poll_messages(&mut self) {
        while let Ok(msg) = self.thumb_rx.try_recv() {
            self.thumb_inflight.remove(&msg.fragment);
            self.pending_thumbs.push(msg);
        }

        if let Some(rx) = &self.export_rx {
            if let Ok(UiMessage::ExportDone { message }) = rx.try_recv() {
                self.export_status = message;
                self.exporting = false;
                self.export_rx = None;
            }
        }
    }

    fn render_data_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Data");
        let Some(table) = self.session.table() else {
            ui.label("Open a CSV or Excel file to start.");
            return;
        };

        if let Some(source) = self.session.source() {
            ui.label(RichText::new(source.display().to_string()).color(Color32::from_gray(170)));
        }
        ui.label(format!("{} rows × {} columns", table.len(), table.headers().len()));
        ui.separator();

        egui::ScrollArea::horizontal().id_source("preview").show(ui, |ui| {
            egui::Grid::new("preview_grid").striped(true).show(ui, |ui| {
                for header in table.headers() {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();
                for row in table.head(self.config.preview_rows) {
                    for cell in row {
                        ui.label(cell);
                    }
                    ui.end_row();
                }
            });
        });
        ui.separator();

        let headers = table.headers().to_vec();
        column_combo(ui, "Structure column", &mut self.columns.structure, &headers);
        column_combo(ui, "Category column", &mut self.columns.category, &headers);

        ui.add_space(8.0);
        if ui
            .add_enabled(self.columns.is_complete(), egui::Button::new("Analyze"))
            .clicked()
        {
            self.run_analyze();
        }
    }

    fn render_results(&mut self, ui: &mut egui::Ui) {
        let Some(analysis) = self.session.analysis() else {
            ui.label("No results yet.");
            return;
        };
        let categories: Vec<Category> = analysis.categories.iter().map(|c| c.category.clone()).collect();
        let selected = self.session.selected_category().cloned();

        let mut choice = selected.clone();
        egui::ComboBox::from_label("Category")
            .selected_text(selected.as_ref().map(|c| c.label().to_string()).unwrap_or_default())
            .show_ui(ui, |ui| {
                for category in &categories {
                    ui.selectable_value(&mut choice, Some(category.clone()), category.label());
                }
            });
        if choice != selected {
            if let Some(category) = &choice {
                self.session.select_category(category);
            }
        }

        let Some(stats) = self.session.current_stats().cloned() else {
            return;
        };
        ui.label(format!(
            "{} rows, {} valid, {} excluded",
            stats.total_rows, stats.valid_molecules, stats.excluded_rows
        ));
        ui.separator();

        if stats.is_empty() {
            ui.label("No valid molecules in this category.");
            return;
        }

        let fragments: Vec<FragmentKey> = stats.stats.iter().map(|s| s.fragment.clone()).collect();
        self.request_thumbnails(&fragments);

        let thumb = self.config.thumbnail_size as f32;
        egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
            egui::Grid::new("result_grid")
                .striped(true)
                .min_col_width(60.0)
                .show(ui, |ui| {
                    ui.label(RichText::new(IMAGE_LABEL).strong());
                    for column in RESULT_COLUMNS {
                        ui.label(RichText::new(column.label).strong());
                    }
                    ui.end_row();

                    for stat in &stats.stats {
                        let size = egui::vec2(thumb, thumb);
                        if let Some(texture) = self.thumbs.get(&stat.fragment) {
                            ui.add(egui::Image::new(texture).fit_to_exact_size(size));
                        } else {
                            ui.allocate_ui_with_layout(
                                size,
                                egui::Layout::centered_and_justified(egui::Direction::LeftToRight),
                                |ui| {
                                    ui.label("Loading...");
                                },
                            );
                        }
                        for column in RESULT_COLUMNS {
                            ui.label(cell_text(stat, column.key));
                        }
                        ui.end_row();
                    }
                });
        });
    }
}

fn column_combo(ui: &mut egui::Ui, label: &str, value: &mut Option<String>, headers: &[String]) {
    egui::ComboBox::from_label(label)
        .selected_text(value.clone().unwrap_or_default())
        .show_ui(ui, |ui| {
            for header in headers {
                ui.selectable_value(value, Some(header.clone()), header);
            }
        });
}

pub fn configure_fonts(ctx: &egui::Context) {
    let mut fonts = FontDefinitions::default();
    let candidates = [
        r"C:\Windows\Fonts\meiryo.ttc",
        r"C:\Windows\Fonts\msgothic.ttc",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    ];

    for path in candidates {
        if let Ok(data) = std::fs::read(path) {
            fonts.font_data.insert("cjk_fallback".to_string(), FontData::from_owned(data));
            fonts.families
                .entry(FontFamily::Proportional)
                .or_default()
                .push("cjk_fallback".to_string());
            fonts.families
                .entry(FontFamily::Monospace)
                .or_default()
                .push("cjk_fallback".to_string());
            ctx.set_fonts(fonts);
            return;
        }
    }
}

impl Default for DesktopApp {
    fn default() -> Self {
        let (thumb_tx, thumb_rx) = mpsc::channel();
        let (config, status) = match load_config() {
            Ok(config) => (config, String::new()),
            Err(err) => (Config::default(), format!("Config error: {err:#}")),
        };
        Self {
            session: Session::new(),
            config,
            columns: ColumnChoice::default(),
            status,
            export_status: String::new(),
            export_kind: ExportKind::default(),
            export_rx: None,
            exporting: false,
            thumbs: HashMap::new(),
            thumb_rx,
            thumb_tx,
            thumb_inflight: HashSet::new(),
            pending_thumbs: Vec::new(),
        }
    }
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.exporting || !self.thumb_inflight.is_empty() || !self.pending_thumbs.is_empty() {
            ctx.request_repaint();
        }
        self.poll_messages();
        self.process_pending_thumbs(ctx);

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Table").clicked() {
                        self.open_table();
                        ui.close_menu();
                    }
                    let reload_enabled = self.session.source().is_some();
                    if ui.add_enabled(reload_enabled, egui::Button::new("Reload")).clicked() {
                        self.reload_table();
                        ui.close_menu();
                    }
                });

                ui.menu_button("Export", |ui| {
                    ui.radio_value(&mut self.export_kind, ExportKind::Excel, "Excel");
                    ui.radio_value(&mut self.export_kind, ExportKind::Csv, "CSV");
                    ui.radio_value(&mut self.export_kind, ExportKind::Json, "JSON");
                    let export_enabled = self.session.analysis().is_some();
                    if ui
                        .add_enabled(export_enabled && !self.exporting, egui::Button::new("Run Export"))
                        .clicked()
                    {
                        self.run_export(self.export_kind);
                        ui.close_menu();
                    }
                });

                ui.separator();
                if !self.export_status.is_empty() {
                    ui.label(RichText::new(&self.export_status).color(Color32::from_rgb(246, 196, 69)));
                }
                if !self.status.is_empty() {
                    ui.label(RichText::new(&self.status).color(Color32::from_gray(170)));
                }
            });
        });

        egui::SidePanel::left("data").resizable(true).default_width(420.0).show(ctx, |ui| {
            self.render_data_panel(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Fragments");
            if let Some(message) = self.session.error_message() {
                ui.label(RichText::new(message).color(Color32::from_rgb(220, 80, 80)));
            }
            ui.separator();
            self.render_results(ui);
        });
    }
}
