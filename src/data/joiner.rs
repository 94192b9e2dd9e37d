//! Attribute Joiner
//! Attaches table rows to boundary regions by county identifier.

use super::{Attribute, Region, TabularRecord};
use std::collections::HashMap;

/// Outcome counts of a join, for logging and the CLI summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub matched: usize,
    pub unmatched_regions: usize,
    pub unkeyed_records: usize,
}

/// Merges tabular records into regions.
pub struct Joiner;

impl Joiner {
    /// Copy the six attribute values of each record onto the region with the
    /// same integer identifier.
    ///
    /// Regions without a matching record keep no value for every attribute.
    /// When several records share an identifier the last one wins.
    pub fn join(mut regions: Vec<Region>, records: &[TabularRecord]) -> (Vec<Region>, JoinReport) {
        let mut report = JoinReport::default();

        // Later inserts replace earlier ones: last record wins.
        let mut by_key: HashMap<u32, &TabularRecord> = HashMap::with_capacity(records.len());
        for record in records {
            match record.key() {
                Some(key) => {
                    by_key.insert(key, record);
                }
                None => {
                    log::warn!("Skipping record with unparseable id {:?}", record.county_fp);
                    report.unkeyed_records += 1;
                }
            }
        }

        for region in &mut regions {
            let Some(record) = region.key().and_then(|key| by_key.get(&key)) else {
                log::warn!("No table row for region {}", region.id);
                report.unmatched_regions += 1;
                continue;
            };

            for attr in Attribute::ALL {
                region.attributes.set(attr, record.value(attr));
            }
            if region.attributes.is_empty() {
                log::warn!("Table row for region {} has no values", region.id);
            }
            if region.name.is_none() {
                region.name = record.name.clone();
            }
            report.matched += 1;
        }

        log::info!(
            "Joined {} of {} regions ({} records)",
            report.matched,
            regions.len(),
            records.len()
        );

        (regions, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;

    const ATTR: Attribute = Attribute::HighschoolGraduationRate;

    fn region(id: &str) -> Region {
        Region::new(id, None, MultiPolygon::new(vec![]))
    }

    #[test]
    fn zero_padded_ids_match() {
        let regions = vec![region("001"), region("003"), region("005")];
        let records = vec![
            TabularRecord::new("1").with_value(ATTR, "90"),
            TabularRecord::new("3").with_value(ATTR, ""),
        ];

        let (joined, report) = Joiner::join(regions, &records);

        assert_eq!(joined[0].value(ATTR), Some(90.0));
        assert_eq!(joined[1].value(ATTR), None);
        assert_eq!(joined[2].value(ATTR), None);
        assert!(joined[2].attributes.is_empty());
        assert_eq!(
            report,
            JoinReport {
                matched: 2,
                unmatched_regions: 1,
                unkeyed_records: 0
            }
        );
    }

    #[test]
    fn copies_all_six_attributes() {
        let mut record = TabularRecord::new("07");
        for (i, attr) in Attribute::ALL.into_iter().enumerate() {
            record = record.with_value(attr, format!("{}", (i + 1) * 10));
        }

        let (joined, _) = Joiner::join(vec![region("7")], &[record]);

        for (i, attr) in Attribute::ALL.into_iter().enumerate() {
            assert_eq!(joined[0].value(attr), Some(((i + 1) * 10) as f64));
        }
    }

    #[test]
    fn unparseable_cell_is_no_value_not_zero() {
        let record = TabularRecord::new("9")
            .with_value(ATTR, "suppressed")
            .with_value(Attribute::GraduateDegreeRate, "4.5");

        let (joined, _) = Joiner::join(vec![region("009")], &[record]);

        assert_eq!(joined[0].value(ATTR), None);
        assert_eq!(joined[0].value(Attribute::GraduateDegreeRate), Some(4.5));
    }

    #[test]
    fn last_duplicate_record_wins() {
        let records = vec![
            TabularRecord::new("11").with_value(ATTR, "50"),
            TabularRecord::new("011").with_value(ATTR, "75"),
        ];

        let (joined, _) = Joiner::join(vec![region("11")], &records);

        assert_eq!(joined[0].value(ATTR), Some(75.0));
    }

    #[test]
    fn unkeyed_records_are_counted_and_ignored() {
        let records = vec![TabularRecord::new("Total").with_value(ATTR, "80")];
        let (joined, report) = Joiner::join(vec![region("001")], &records);
        assert_eq!(report.unkeyed_records, 1);
        assert_eq!(joined[0].value(ATTR), None);
    }

    #[test]
    fn record_name_fills_missing_region_name() {
        let mut record = TabularRecord::new("1").with_value(ATTR, "88");
        record.name = Some("Bernalillo".to_string());
        let (joined, _) = Joiner::join(vec![region("001")], &[record]);
        assert_eq!(joined[0].display_name(), "Bernalillo");
    }
}
