//! Region & Record Types
//! Geographic enumeration units and the table rows joined onto them.

use super::Attribute;
use geo::MultiPolygon;

/// Per-region attribute values, one optional number per tracked attribute.
///
/// `None` means "no value": the county had no matching row, or the cell was
/// blank or not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttributeValues([Option<f64>; 6]);

impl AttributeValues {
    pub fn get(&self, attribute: Attribute) -> Option<f64> {
        self.0[attribute.index()]
    }

    pub fn set(&mut self, attribute: Attribute, value: Option<f64>) {
        self.0[attribute.index()] = value;
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

/// One county: identifier, boundary shape and joined attributes.
#[derive(Debug, Clone)]
pub struct Region {
    /// Identifier as it appears in the boundary document (e.g. `"001"`).
    pub id: String,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub attributes: AttributeValues,
}

impl Region {
    pub fn new(id: impl Into<String>, name: Option<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            name,
            geometry,
            attributes: AttributeValues::default(),
        }
    }

    /// Identifier compared as an integer, tolerating zero padding.
    pub fn key(&self) -> Option<u32> {
        parse_county_id(&self.id)
    }

    pub fn value(&self, attribute: Attribute) -> Option<f64> {
        self.attributes.get(attribute)
    }

    /// Name for labels, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// One row of the education table. Attribute cells stay as text until joined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularRecord {
    pub county_fp: String,
    pub name: Option<String>,
    pub raw_values: [Option<String>; 6],
}

impl TabularRecord {
    pub fn new(county_fp: impl Into<String>) -> Self {
        Self {
            county_fp: county_fp.into(),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, attribute: Attribute, raw: impl Into<String>) -> Self {
        self.raw_values[attribute.index()] = Some(raw.into());
        self
    }

    pub fn key(&self) -> Option<u32> {
        parse_county_id(&self.county_fp)
    }

    pub fn raw(&self, attribute: Attribute) -> Option<&str> {
        self.raw_values[attribute.index()].as_deref()
    }

    /// Parsed value of one attribute cell.
    pub fn value(&self, attribute: Attribute) -> Option<f64> {
        self.raw(attribute).and_then(parse_measurement)
    }
}

/// Parse a county identifier the lenient way: surrounding whitespace is
/// ignored and the leading run of digits is read, so `"001"`, `"1"` and
/// `"1.0"` all give `1`.
pub fn parse_county_id(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let digits = trimmed.trim_start_matches('+');
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Parse a numeric cell. Blank, non-numeric and non-finite cells have no value.
pub fn parse_measurement(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn county_ids_compare_as_integers() {
        assert_eq!(parse_county_id("001"), Some(1));
        assert_eq!(parse_county_id(" 35 "), Some(35));
        assert_eq!(parse_county_id("7.0"), Some(7));
        assert_eq!(parse_county_id("+12"), Some(12));
        assert_eq!(parse_county_id(""), None);
        assert_eq!(parse_county_id("abc"), None);
        assert_eq!(parse_county_id("-3"), None);
    }

    #[test]
    fn measurements_reject_blank_and_text() {
        assert_eq!(parse_measurement("90"), Some(90.0));
        assert_eq!(parse_measurement(" 12.5 "), Some(12.5));
        assert_eq!(parse_measurement(""), None);
        assert_eq!(parse_measurement("n/a"), None);
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement("inf"), None);
    }

    #[test]
    fn record_values_parse_per_cell() {
        let record = TabularRecord::new("3")
            .with_value(Attribute::CollegeGraduationRate, "41.2")
            .with_value(Attribute::GraduateDegreeRate, "");
        assert_eq!(record.key(), Some(3));
        assert_eq!(record.value(Attribute::CollegeGraduationRate), Some(41.2));
        assert_eq!(record.value(Attribute::GraduateDegreeRate), None);
        assert_eq!(record.value(Attribute::GradSchoolEarnings), None);
    }

    #[test]
    fn fresh_region_has_no_values() {
        let region = Region::new("005", None, MultiPolygon::new(vec![]));
        assert!(region.attributes.is_empty());
        assert_eq!(region.key(), Some(5));
        assert_eq!(region.display_name(), "005");
    }
}
