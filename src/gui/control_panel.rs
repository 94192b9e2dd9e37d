//! Control Panel Widget
//! Left side panel with the attribute selector, class rule, legend and export.

use crate::charts::{ChartPlotter, ChoroplethData};
use crate::data::Attribute;
use crate::stats::ClassRule;
use egui::{Color32, ComboBox, RichText};

/// Left side control panel.
pub struct ControlPanel {
    pub attribute: Attribute,
    pub rule: ClassRule,
    pub status: String,
}

impl ControlPanel {
    pub fn new(attribute: Attribute, rule: ClassRule) -> Self {
        Self {
            attribute,
            rule,
            status: "Ready".to_string(),
        }
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, data: Option<&ChoroplethData>) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("New Mexico Education")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("County choropleth")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Attribute Section =====
        ui.label(RichText::new("Attribute").size(14.0).strong());
        ui.add_space(5.0);

        ComboBox::from_id_salt("attribute")
            .width(260.0)
            .selected_text(self.attribute.column_name())
            .show_ui(ui, |ui| {
                for attribute in Attribute::ALL {
                    if ui
                        .selectable_label(self.attribute == attribute, attribute.column_name())
                        .clicked()
                    {
                        self.attribute = attribute;
                        action = ControlPanelAction::SelectAttribute(attribute);
                    }
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Class Rule Section =====
        ui.label(RichText::new("Class Boundaries").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            let before = self.rule;
            ui.radio_value(&mut self.rule, ClassRule::Breakpoints, "Breakpoints");
            ui.radio_value(&mut self.rule, ClassRule::Quantile, "Quantile");
            if self.rule != before {
                action = ControlPanelAction::SetRule(self.rule);
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Legend Section =====
        ui.label(RichText::new("Legend").size(14.0).strong());
        ui.add_space(5.0);

        match data {
            Some(data) if !data.classification().is_empty() => {
                ChartPlotter::draw_legend(ui, data);
                ui.add_space(5.0);
                let summary = data.summary();
                ui.label(
                    RichText::new(format!(
                        "{} counties with data, {} without",
                        summary.valid_count, summary.missing_count
                    ))
                    .size(11.0),
                );
                if let Some(gvf) = summary.gvf {
                    ui.label(RichText::new(format!("Goodness of variance fit: {gvf:.3}")).size(11.0));
                }
            }
            Some(_) => {
                ui.label(RichText::new("No values to classify").color(Color32::GRAY));
            }
            None => {
                ui.label(RichText::new("Loading...").color(Color32::GRAY));
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(data.is_some(), |ui| {
                let button = egui::Button::new(RichText::new("Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    SelectAttribute(Attribute),
    SetRule(ClassRule),
    ExportPng,
}
