//! Choropleth Classifier Module
//! Builds 5-class color classifications from natural breaks and maps values
//! to fill colors.

use super::ckmeans::{ckmeans, sum_squared_deviation, within_group_ssd};
use crate::data::{Attribute, Region};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::fmt;
use thiserror::Error;

/// Number of color classes.
pub const CLASS_COUNT: usize = 5;

#[derive(Error, Debug, PartialEq)]
pub enum ClassifyError {
    #[error("No valid values for {0}")]
    EmptyInput(Attribute),
}

/// An sRGB color shared by the map and chart renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Sequential palette, light yellow (low) to dark green (high).
pub const PALETTE: [Color; CLASS_COUNT] = [
    Color::rgb(0xff, 0xff, 0xcc),
    Color::rgb(0xc2, 0xe6, 0x99),
    Color::rgb(0x78, 0xc6, 0x79),
    Color::rgb(0x31, 0xa3, 0x54),
    Color::rgb(0x00, 0x68, 0x37),
];

/// Fill for regions without a usable value.
pub const NO_DATA_COLOR: Color = Color::rgb(0x80, 0x80, 0x80);

/// How a value is assigned to one of the five classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassRule {
    /// `v <= b0` is class 0, `b0 < v <= b1` class 1, ..., `v > b3` class 4.
    #[default]
    Breakpoints,
    /// Thresholds are the 20/40/60/80% quantiles of the four breakpoints;
    /// a value equal to a threshold falls in the upper class.
    Quantile,
}

/// Four breakpoints plus the five-color palette for one attribute.
///
/// An empty classification (no valid input values) sends every lookup to
/// [`NO_DATA_COLOR`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    attribute: Attribute,
    rule: ClassRule,
    breakpoints: Vec<f64>,
    thresholds: Vec<f64>,
    palette: [Color; CLASS_COUNT],
    gvf: Option<f64>,
}

impl Classification {
    /// Cluster the valid values into five natural-breaks groups and keep the
    /// minimum of every group but the first as breakpoints.
    pub fn build(
        values: &[Option<f64>],
        attribute: Attribute,
        rule: ClassRule,
    ) -> Result<Self, ClassifyError> {
        let valid: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if valid.is_empty() {
            return Err(ClassifyError::EmptyInput(attribute));
        }

        let groups = ckmeans(&valid, CLASS_COUNT);
        let mut breakpoints: Vec<f64> = groups
            .iter()
            .skip(1)
            .filter_map(|g| g.first().copied())
            .collect();

        // Fewer than five groups: repeat the top break so the shape stays 4 + 5.
        let pad = breakpoints.last().copied().unwrap_or(groups[0][0]);
        breakpoints.resize(CLASS_COUNT - 1, pad);

        let total = sum_squared_deviation(&valid);
        let gvf = (total > 0.0).then(|| 1.0 - within_group_ssd(&groups) / total);

        let thresholds = match rule {
            ClassRule::Breakpoints => breakpoints.clone(),
            ClassRule::Quantile => (1..CLASS_COUNT)
                .map(|i| quantile_sorted(&breakpoints, i as f64 / CLASS_COUNT as f64))
                .collect(),
        };

        Ok(Self {
            attribute,
            rule,
            breakpoints,
            thresholds,
            palette: PALETTE,
            gvf,
        })
    }

    pub fn empty(attribute: Attribute, rule: ClassRule) -> Self {
        Self {
            attribute,
            rule,
            breakpoints: Vec::new(),
            thresholds: Vec::new(),
            palette: PALETTE,
            gvf: None,
        }
    }

    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    pub fn rule(&self) -> ClassRule {
        self.rule
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn palette(&self) -> &[Color; CLASS_COUNT] {
        &self.palette
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    /// Goodness of variance fit of the natural-breaks partition, when defined.
    pub fn gvf(&self) -> Option<f64> {
        self.gvf
    }

    /// Class of a value, or `None` when the value is missing, not positive,
    /// or the classification is empty.
    pub fn class_index(&self, value: Option<f64>) -> Option<usize> {
        let v = value.filter(|v| v.is_finite() && *v > 0.0)?;
        if self.is_empty() {
            return None;
        }
        let index = match self.rule {
            ClassRule::Breakpoints => self.thresholds.partition_point(|b| *b < v),
            ClassRule::Quantile => self.thresholds.partition_point(|t| *t <= v),
        };
        Some(index)
    }

    pub fn color_for(&self, value: Option<f64>) -> Color {
        self.class_index(value)
            .map_or(NO_DATA_COLOR, |index| self.palette[index])
    }
}

/// Linear-interpolated quantile of ascending values.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    sorted[lower] + (sorted[upper] - sorted[lower]) * (h - lower as f64)
}

/// Build the classification for `attribute` from every region's value.
///
/// Without any valid value this logs the failure and returns an empty
/// classification, so all regions render as "no data".
pub fn build_classification(
    regions: &[Region],
    attribute: Attribute,
    rule: ClassRule,
) -> Classification {
    let values: Vec<Option<f64>> = regions.iter().map(|r| r.value(attribute)).collect();
    match Classification::build(&values, attribute, rule) {
        Ok(classification) => {
            log::debug!(
                "Breakpoints for {}: {:?}",
                attribute,
                classification.breakpoints()
            );
            classification
        }
        Err(e) => {
            log::error!("{e}; rendering every region as no data");
            Classification::empty(attribute, rule)
        }
    }
}

/// Descriptive summary of one attribute alongside its class breaks.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationSummary {
    pub attribute: Attribute,
    pub title: String,
    pub valid_count: usize,
    pub missing_count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub breakpoints: Vec<f64>,
    pub palette: Vec<String>,
    pub gvf: Option<f64>,
}

impl ClassificationSummary {
    pub fn new(regions: &[Region], classification: &Classification) -> Self {
        let attribute = classification.attribute();
        let valid: Vec<f64> = regions
            .iter()
            .filter_map(|r| r.value(attribute))
            .collect();
        let some_if = |v: f64| (!valid.is_empty() && v.is_finite()).then_some(v);

        let median = if valid.is_empty() {
            None
        } else {
            Some(Data::new(valid.clone()).median())
        };

        Self {
            attribute,
            title: attribute.chart_title(),
            valid_count: valid.len(),
            missing_count: regions.len() - valid.len(),
            min: some_if(Statistics::min(valid.iter())),
            max: some_if(Statistics::max(valid.iter())),
            mean: some_if(valid.iter().mean()),
            median,
            std_dev: some_if(valid.iter().std_dev()),
            breakpoints: classification.breakpoints().to_vec(),
            palette: classification.palette().iter().map(Color::to_string).collect(),
            gvf: classification.gvf(),
        }
    }
}

impl fmt::Display for ClassificationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        writeln!(f, "{}", self.title)?;
        writeln!(
            f,
            "  counties: {} with data, {} without",
            self.valid_count, self.missing_count
        )?;
        writeln!(
            f,
            "  min {}  max {}  mean {}  median {}  std {}",
            num(self.min),
            num(self.max),
            num(self.mean),
            num(self.median),
            num(self.std_dev)
        )?;
        let breaks: Vec<String> = self.breakpoints.iter().map(|b| format!("{b:.2}")).collect();
        writeln!(f, "  breaks: [{}]  gvf {}", breaks.join(", "), num(self.gvf))?;
        write!(f, "  palette: {}", self.palette.join(" "))
    }
}

/// Classify all six attributes in parallel.
pub fn classify_all(regions: &[Region], rule: ClassRule) -> Vec<ClassificationSummary> {
    Attribute::ALL
        .par_iter()
        .map(|&attribute| {
            let classification = build_classification(regions, attribute, rule);
            ClassificationSummary::new(regions, &classification)
        })
        .collect()
}
