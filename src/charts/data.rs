//! Choropleth Chart Data
//! Joined regions plus the current selection and classification, shared by
//! the map and bar chart so both color from the same lookup.

use crate::data::{Attribute, AttributeSelection, JoinReport, Joiner, LoadedData, Region};
use crate::stats::{build_classification, ClassRule, Classification, ClassificationSummary, Color};

/// One bar of the coordinated chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarDatum {
    /// Index into [`ChoroplethData::counties`].
    pub region: usize,
    pub name: String,
    pub value: Option<f64>,
    pub color: Color,
}

/// Text of the hover info label.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoLabel {
    pub value: String,
    pub attribute: String,
    pub name: String,
}

/// Enriched counties with the classification for the expressed attribute.
///
/// The join happens once at construction; `select` only rebuilds the
/// classification.
#[derive(Debug, Clone)]
pub struct ChoroplethData {
    pub counties: Vec<Region>,
    pub background: Vec<Region>,
    selection: AttributeSelection,
    classification: Classification,
}

impl ChoroplethData {
    pub fn from_loaded(
        loaded: LoadedData,
        attribute: Attribute,
        rule: ClassRule,
    ) -> (Self, JoinReport) {
        let (counties, report) = Joiner::join(loaded.counties, &loaded.records);
        (
            Self::from_regions(counties, loaded.background, attribute, rule),
            report,
        )
    }

    pub fn from_regions(
        counties: Vec<Region>,
        background: Vec<Region>,
        attribute: Attribute,
        rule: ClassRule,
    ) -> Self {
        let classification = build_classification(&counties, attribute, rule);
        Self {
            counties,
            background,
            selection: AttributeSelection::new(attribute),
            classification,
        }
    }

    pub fn attribute(&self) -> Attribute {
        self.selection.current()
    }

    pub fn rule(&self) -> ClassRule {
        self.classification.rule()
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Express another attribute. The classification is rebuilt wholesale even
    /// when the attribute is unchanged; returns whether it changed.
    pub fn select(&mut self, attribute: Attribute) -> bool {
        let changed = self.selection.select(attribute);
        self.rebuild(self.rule());
        changed
    }

    pub fn set_rule(&mut self, rule: ClassRule) {
        self.rebuild(rule);
    }

    fn rebuild(&mut self, rule: ClassRule) {
        log::info!("Classifying {} ({:?} rule)", self.attribute(), rule);
        self.classification = build_classification(&self.counties, self.attribute(), rule);
    }

    pub fn value(&self, region: usize) -> Option<f64> {
        self.counties.get(region)?.value(self.attribute())
    }

    pub fn fill_for(&self, region: usize) -> Color {
        self.classification.color_for(self.value(region))
    }

    /// Bars sorted by value, highest first; counties without a value go last.
    pub fn bars(&self) -> Vec<BarDatum> {
        let mut bars: Vec<BarDatum> = self
            .counties
            .iter()
            .enumerate()
            .map(|(i, region)| BarDatum {
                region: i,
                name: region.display_name().to_string(),
                value: self.value(i),
                color: self.fill_for(i),
            })
            .collect();
        bars.sort_by(|a, b| match (a.value, b.value) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        bars
    }

    /// Top of the bar chart's value axis: 5% above the largest value.
    pub fn y_max(&self) -> f64 {
        let max = (0..self.counties.len())
            .filter_map(|i| self.value(i))
            .fold(0.0_f64, f64::max);
        if max > 0.0 {
            max * 1.05
        } else {
            1.0
        }
    }

    pub fn label_for(&self, region: usize) -> Option<InfoLabel> {
        let county = self.counties.get(region)?;
        let attribute = self.attribute();
        Some(InfoLabel {
            value: attribute.format_value(self.value(region)),
            attribute: attribute.column_name().to_string(),
            name: county.display_name().to_string(),
        })
    }

    /// Legend rows: palette colors with the value range each covers.
    pub fn legend(&self) -> Vec<(Color, String)> {
        let breaks = self.classification.breakpoints();
        if breaks.is_empty() {
            return Vec::new();
        }
        let fmt = |v: f64| {
            if self.attribute().is_earnings() {
                format!("${v:.0}")
            } else {
                format!("{v:.1}")
            }
        };
        self.classification
            .palette()
            .iter()
            .enumerate()
            .map(|(i, color)| {
                let text = match self.rule() {
                    ClassRule::Breakpoints if i == 0 => format!("≤ {}", fmt(breaks[0])),
                    ClassRule::Breakpoints if i == breaks.len() => {
                        format!("> {}", fmt(breaks[i - 1]))
                    }
                    ClassRule::Breakpoints => format!("{} – {}", fmt(breaks[i - 1]), fmt(breaks[i])),
                    ClassRule::Quantile => format!("class {}", i + 1),
                };
                (*color, text)
            })
            .collect()
    }

    pub fn summary(&self) -> ClassificationSummary {
        ClassificationSummary::new(&self.counties, &self.classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TabularRecord;
    use crate::stats::{NO_DATA_COLOR, PALETTE};
    use geo::MultiPolygon;

    const RATE: Attribute = Attribute::HighschoolGraduationRate;
    const EARN: Attribute = Attribute::CollegeGraduateEarnings;

    fn loaded() -> LoadedData {
        let ids = ["001", "003", "005", "006", "007", "009"];
        let rates = ["90", "", "70", "80", "85", "60"];
        let earnings = ["30000", "45000", "38000", "", "52000", "41000"];
        let records = ids
            .iter()
            .zip(rates.iter().zip(earnings))
            .filter(|(id, _)| **id != "005")
            .map(|(id, (rate, earn))| {
                let mut record = TabularRecord::new(id.trim_start_matches('0'))
                    .with_value(RATE, *rate)
                    .with_value(EARN, earn);
                record.name = Some(format!("County {id}"));
                record
            })
            .collect();
        LoadedData {
            records,
            background: vec![],
            counties: ids
                .iter()
                .map(|id| Region::new(*id, None, MultiPolygon::new(vec![])))
                .collect(),
        }
    }

    fn data() -> ChoroplethData {
        ChoroplethData::from_loaded(loaded(), RATE, ClassRule::Breakpoints).0
    }

    #[test]
    fn join_report_counts_unmatched_county() {
        let (_, report) = ChoroplethData::from_loaded(loaded(), RATE, ClassRule::Breakpoints);
        assert_eq!(report.matched, 5);
        assert_eq!(report.unmatched_regions, 1);
    }

    #[test]
    fn bars_sort_descending_with_missing_last() {
        let bars = data().bars();
        let values: Vec<Option<f64>> = bars.iter().map(|b| b.value).collect();
        assert_eq!(
            values,
            vec![Some(90.0), Some(85.0), Some(80.0), Some(60.0), None, None]
        );
        assert_eq!(bars[0].name, "County 001");
        assert_eq!(bars[4].color, NO_DATA_COLOR);
    }

    #[test]
    fn map_and_bars_share_colors() {
        let data = data();
        for bar in data.bars() {
            assert_eq!(bar.color, data.fill_for(bar.region));
        }
        assert_eq!(data.fill_for(1), NO_DATA_COLOR);
        assert_eq!(data.fill_for(2), NO_DATA_COLOR);
        assert_eq!(data.fill_for(0), PALETTE[2]);
    }

    #[test]
    fn select_rebuilds_classification() {
        let mut data = data();
        let before = data.classification().clone();

        assert!(!data.select(RATE));
        assert_eq!(data.classification(), &before);

        assert!(data.select(EARN));
        assert_eq!(data.attribute(), EARN);
        assert_eq!(data.classification().attribute(), EARN);
        assert_ne!(data.classification().breakpoints(), before.breakpoints());
        assert_eq!(data.bars()[0].value, Some(52000.0));
        assert_eq!(data.label_for(1).unwrap().value, "$45,000");
    }

    #[test]
    fn info_label_reports_missing_values() {
        let label = data().label_for(2).unwrap();
        assert_eq!(label.value, "No data");
        assert_eq!(label.attribute, "Highschool Graduation Rate");
        assert_eq!(label.name, "005");
        assert!(data().label_for(99).is_none());
    }

    #[test]
    fn legend_and_axis() {
        let data = data();
        let legend = data.legend();
        assert_eq!(legend.len(), 5);
        assert!(legend[0].1.starts_with("≤"));
        assert!(legend[4].1.starts_with('>'));
        assert!((data.y_max() - 94.5).abs() < 1e-9);

        let mut quantile = data.clone();
        quantile.set_rule(ClassRule::Quantile);
        assert_eq!(quantile.rule(), ClassRule::Quantile);
        assert_eq!(quantile.legend()[2].1, "class 3");
    }
}
