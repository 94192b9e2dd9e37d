//! Data Loader Module
//! Handles CSV table loading with Polars and gathers the boundary documents.

use super::boundary::{BoundaryError, BoundaryLoader, FeatureKeys};
use super::{Attribute, Region, TabularRecord};
use crate::config::{DataPaths, JoinKeys};
use polars::prelude::*;
use std::path::Path;
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV is missing column {0:?}")]
    MissingColumn(String),
    #[error("Failed to load boundaries: {0}")]
    Boundary(#[from] BoundaryError),
    #[error("Loader thread for {0} panicked")]
    WorkerPanicked(&'static str),
}

/// Everything the pipeline needs, available only once all three reads succeed.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub records: Vec<TabularRecord>,
    pub background: Vec<Region>,
    pub counties: Vec<Region>,
}

/// Reads the education table and the boundary layers.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file using Polars.
    ///
    /// Every column is read as text; numeric parsing happens in the join so
    /// blank or malformed cells become "no value" rather than a load error.
    pub fn load_csv(path: &Path, keys: &JoinKeys) -> Result<Vec<TabularRecord>, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        let records = Self::records_from_frame(&df, keys)?;
        log::info!("Loaded {} rows from {}", records.len(), path.display());
        Ok(records)
    }

    /// Convert a text-typed DataFrame into records.
    pub fn records_from_frame(
        df: &DataFrame,
        keys: &JoinKeys,
    ) -> Result<Vec<TabularRecord>, LoaderError> {
        let key_col = Self::text_column(df, &keys.csv_key)?;
        let name_col = match &keys.csv_name {
            Some(name) if df.get_column_names().iter().any(|c| c.as_str() == name.as_str()) => {
                Some(Self::text_column(df, name)?)
            }
            Some(name) => {
                log::warn!("CSV has no name column {name:?}, labels will use ids");
                None
            }
            None => None,
        };
        let value_cols = Attribute::ALL
            .iter()
            .map(|attr| Self::text_column(df, attr.column_name()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let Some(county_fp) = key_col.get(i) else {
                log::warn!("Skipping CSV row {} without {}", i + 1, keys.csv_key);
                continue;
            };

            let mut record = TabularRecord::new(county_fp);
            record.name = name_col
                .as_ref()
                .and_then(|col| col.get(i))
                .map(str::to_string);
            for (slot, col) in record.raw_values.iter_mut().zip(&value_cols) {
                *slot = col.get(i).map(str::to_string);
            }
            records.push(record);
        }

        Ok(records)
    }

    fn text_column(df: &DataFrame, name: &str) -> Result<StringChunked, LoaderError> {
        let column = df
            .column(name)
            .map_err(|_| LoaderError::MissingColumn(name.to_string()))?;
        let text = column.cast(&DataType::String)?;
        Ok(text.as_materialized_series().str()?.clone())
    }

    /// Read the table and both boundary documents concurrently.
    ///
    /// All three must succeed; the first failure aborts the whole load.
    pub fn load_all(paths: &DataPaths, keys: &JoinKeys) -> Result<LoadedData, LoaderError> {
        let county_keys = FeatureKeys {
            id_property: &keys.region_key,
            name_property: keys.region_name.as_deref(),
            object: paths.counties_object.as_deref(),
        };
        let background_keys = FeatureKeys {
            id_property: &keys.region_key,
            name_property: keys.region_name.as_deref(),
            object: paths.background_object.as_deref(),
        };

        let (records, background, counties) = thread::scope(|scope| {
            let csv = scope.spawn(|| Self::load_csv(&paths.csv, keys));
            let background = scope.spawn(|| BoundaryLoader::load(&paths.background, &background_keys));
            let counties = scope.spawn(|| BoundaryLoader::load(&paths.counties, &county_keys));

            (
                csv.join().map_err(|_| LoaderError::WorkerPanicked("csv")),
                background
                    .join()
                    .map_err(|_| LoaderError::WorkerPanicked("background")),
                counties
                    .join()
                    .map_err(|_| LoaderError::WorkerPanicked("counties")),
            )
        });

        Ok(LoadedData {
            records: records??,
            background: background??,
            counties: counties??,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn header() -> String {
        let mut cols = vec!["CountyFP".to_string(), "County".to_string()];
        cols.extend(Attribute::ALL.iter().map(|a| a.column_name().to_string()));
        cols.join(",")
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_rows_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(
            "{}\n001,Bernalillo,90,30000,40,45000,15,60000\n003,Catron,,n/a,20,,3,\n",
            header()
        );
        let path = write_file(&dir, "edu.csv", &body);

        let records = DataLoader::load_csv(&path, &JoinKeys::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].county_fp, "001");
        assert_eq!(records[0].name.as_deref(), Some("Bernalillo"));
        assert_eq!(records[0].value(Attribute::GradSchoolEarnings), Some(60000.0));
        assert_eq!(records[1].value(Attribute::HighschoolGraduationRate), None);
        assert_eq!(records[1].value(Attribute::HighschoolGraduateEarnings), None);
        assert_eq!(records[1].value(Attribute::GraduateDegreeRate), Some(3.0));
    }

    #[test]
    fn missing_attribute_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "edu.csv", "CountyFP,Highschool Graduation Rate\n1,90\n");

        let err = DataLoader::load_csv(&path, &JoinKeys::default()).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn(_)));
    }

    #[test]
    fn load_all_fails_when_any_input_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_file(&dir, "edu.csv", &format!("{}\n1,A,1,2,3,4,5,6\n", header()));
        let topo = write_file(
            &dir,
            "nm.topojson",
            r#"{"type":"Topology","arcs":[[[0,0],[1,0],[1,1],[0,0]]],
                "objects":{"c":{"type":"Polygon","arcs":[[0]],"properties":{"COUNTYFP":"001"}}}}"#,
        );

        let mut paths = DataPaths {
            csv,
            background: topo.clone(),
            counties: topo,
            background_object: None,
            counties_object: None,
        };
        let loaded = DataLoader::load_all(&paths, &JoinKeys::default()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.counties.len(), 1);
        assert_eq!(loaded.background.len(), 1);

        paths.background = dir.path().join("missing.topojson");
        assert!(matches!(
            DataLoader::load_all(&paths, &JoinKeys::default()),
            Err(LoaderError::Boundary(_))
        ));
    }
}
