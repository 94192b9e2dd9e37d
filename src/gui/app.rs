//! Choropleth Main Application
//! Main window with control panel and the coordinated map and bar chart.

use crate::charts::{ChoroplethData, MapLayout, StaticChartRenderer};
use crate::config::MapConfig;
use crate::data::{DataLoader, JoinReport};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::thread;

/// Loading result from background thread
enum LoadResult {
    Complete {
        data: Box<ChoroplethData>,
        layout: Box<MapLayout>,
        report: JoinReport,
    },
    Error(String),
}

/// Main application window.
pub struct ChoroplethApp {
    config: MapConfig,
    view: Option<(ChoroplethData, MapLayout)>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl ChoroplethApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: MapConfig) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(config.initial_attribute, config.class_rule),
            chart_viewer: ChartViewer::new(config.chart_size),
            config,
            view: None,
            load_rx: None,
            is_loading: false,
        };
        app.start_loading();
        app
    }

    /// Read the table and both boundary files off the UI thread.
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }
        self.chart_viewer.clear();
        self.control_panel.set_status("Loading data...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || {
            let result = match DataLoader::load_all(&config.data, &config.keys) {
                Ok(loaded) => {
                    let (data, report) = ChoroplethData::from_loaded(
                        loaded,
                        config.initial_attribute,
                        config.class_rule,
                    );
                    let [width, height] = config.map_size;
                    let layout = MapLayout::new(
                        &data.counties,
                        &data.background,
                        &config.projection,
                        width,
                        height,
                    );
                    LoadResult::Complete {
                        data: Box::new(data),
                        layout: Box::new(layout),
                        report,
                    }
                }
                Err(e) => {
                    log::error!("Loading failed: {e}");
                    LoadResult::Error(e.to_string())
                }
            };
            let _ = tx.send(result);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        match rx.try_recv() {
            Ok(LoadResult::Complete {
                data,
                layout,
                report,
            }) => {
                self.control_panel.set_status(&format!(
                    "Loaded {} counties, {} matched",
                    data.counties.len(),
                    report.matched
                ));
                self.control_panel.attribute = data.attribute();
                self.control_panel.rule = data.rule();
                self.view = Some((*data, *layout));
                self.is_loading = false;
            }
            Ok(LoadResult::Error(error)) => {
                self.control_panel.set_status(&format!("Error: {error}"));
                self.is_loading = false;
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel.set_status("Error: loader stopped");
                self.is_loading = false;
            }
        }
    }

    /// Save the map and bar chart of the current attribute as one PNG.
    fn handle_export_png(&mut self) {
        let Some((data, layout)) = &self.view else {
            self.control_panel.set_status("Nothing to export");
            return;
        };

        let file_name = format!("{}.png", data.attribute().column_name().replace(' ', "_"));
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(file_name)
            .save_file()
        else {
            return;
        };

        match StaticChartRenderer::render_report_png(data, layout, self.config.chart_size, &path) {
            Ok(()) => self
                .control_panel
                .set_status(&format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("Export failed: {e}");
                self.control_panel.set_status(&format!("Error: {e}"));
            }
        }
    }
}

impl eframe::App for ChoroplethApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();
        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let data = self.view.as_ref().map(|(data, _)| data);
                    let action = self.control_panel.show(ui, data);

                    match action {
                        ControlPanelAction::SelectAttribute(attribute) => {
                            if let Some((data, _)) = &mut self.view {
                                data.select(attribute);
                            }
                        }
                        ControlPanelAction::SetRule(rule) => {
                            if let Some((data, _)) = &mut self.view {
                                data.set_rule(rule);
                            }
                        }
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - map and bar chart
        egui::CentralPanel::default().show(ctx, |ui| {
            let view = self.view.as_ref().map(|(data, layout)| (data, layout));
            self.chart_viewer.show(ui, view);
        });
    }
}
