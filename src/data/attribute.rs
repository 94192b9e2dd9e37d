//! Tracked Attributes
//! The six education statistics the map can express.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
#[error("Unknown attribute: {0}")]
pub struct UnknownAttribute(pub String);

/// One of the six numeric columns of the education table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    #[serde(rename = "Highschool Graduation Rate")]
    HighschoolGraduationRate,
    #[serde(rename = "Highschool Graduate Median Earnings")]
    HighschoolGraduateEarnings,
    #[serde(rename = "College Graduation Rate")]
    CollegeGraduationRate,
    #[serde(rename = "College Graduate Median Earnings")]
    CollegeGraduateEarnings,
    #[serde(rename = "Graduate Degree Rate")]
    GraduateDegreeRate,
    #[serde(rename = "Grad School Graduate Median Earnings")]
    GradSchoolEarnings,
}

impl Default for Attribute {
    fn default() -> Self {
        Attribute::HighschoolGraduationRate
    }
}

impl Attribute {
    /// All attributes in dropdown order.
    pub const ALL: [Attribute; 6] = [
        Attribute::HighschoolGraduationRate,
        Attribute::HighschoolGraduateEarnings,
        Attribute::CollegeGraduationRate,
        Attribute::CollegeGraduateEarnings,
        Attribute::GraduateDegreeRate,
        Attribute::GradSchoolEarnings,
    ];

    /// Exact CSV column name.
    pub fn column_name(self) -> &'static str {
        match self {
            Attribute::HighschoolGraduationRate => "Highschool Graduation Rate",
            Attribute::HighschoolGraduateEarnings => "Highschool Graduate Median Earnings",
            Attribute::CollegeGraduationRate => "College Graduation Rate",
            Attribute::CollegeGraduateEarnings => "College Graduate Median Earnings",
            Attribute::GraduateDegreeRate => "Graduate Degree Rate",
            Attribute::GradSchoolEarnings => "Grad School Graduate Median Earnings",
        }
    }

    /// Position in [`Attribute::ALL`], used to index per-region value arrays.
    pub fn index(self) -> usize {
        match self {
            Attribute::HighschoolGraduationRate => 0,
            Attribute::HighschoolGraduateEarnings => 1,
            Attribute::CollegeGraduationRate => 2,
            Attribute::CollegeGraduateEarnings => 3,
            Attribute::GraduateDegreeRate => 4,
            Attribute::GradSchoolEarnings => 5,
        }
    }

    pub fn is_earnings(self) -> bool {
        matches!(
            self,
            Attribute::HighschoolGraduateEarnings
                | Attribute::CollegeGraduateEarnings
                | Attribute::GradSchoolEarnings
        )
    }

    /// Chart title used by both the bar chart and the static report.
    pub fn chart_title(self) -> String {
        format!("{} in Each County", self.column_name())
    }

    /// Format a value for the info label (earnings as dollars, rates as percent).
    pub fn format_value(self, value: Option<f64>) -> String {
        match value {
            None => "No data".to_string(),
            Some(v) if self.is_earnings() => format!("${}", group_thousands(v.round() as i64)),
            Some(v) => format!("{:.1}%", v),
        }
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.column_name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

/// The currently expressed attribute.
///
/// Exactly one attribute is active. `select` reports whether the value
/// actually changed; callers rebuild their classification either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeSelection {
    current: Attribute,
}

impl AttributeSelection {
    pub fn new(current: Attribute) -> Self {
        Self { current }
    }

    pub fn current(&self) -> Attribute {
        self.current
    }

    pub fn select(&mut self, attribute: Attribute) -> bool {
        let changed = self.current != attribute;
        self.current = attribute;
        changed
    }
}
