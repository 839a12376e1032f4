use crate::core::models::series::{ScalarSeries, SeriesColumn};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column '{0}'")]
    MissingColumn(SeriesColumn),
    #[error("Invalid value in column '{column}' on record {record}: '{value}'")]
    InvalidValue {
        column: SeriesColumn,
        record: usize,
        value: String,
    },
}

fn locate(headers: &csv::StringRecord, column: SeriesColumn) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim();
        column.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(h))
    })
}

fn parse_cell(
    record: &csv::StringRecord,
    index: usize,
    column: SeriesColumn,
    record_num: usize,
) -> Result<f64, SeriesError> {
    let raw = record.get(index).unwrap_or("").trim();
    raw.parse().map_err(|_| SeriesError::InvalidValue {
        column,
        record: record_num,
        value: raw.to_string(),
    })
}

/// Reads a scalar series, locating columns by header name rather than position.
pub fn read_series(reader: impl Read) -> Result<ScalarSeries, SeriesError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut required = Vec::with_capacity(SeriesColumn::REQUIRED.len());
    for column in SeriesColumn::REQUIRED {
        let index = locate(&headers, column).ok_or(SeriesError::MissingColumn(column))?;
        required.push(index);
    }
    let heat_capacity_index = locate(&headers, SeriesColumn::HeatCapacity);

    let mut series = ScalarSeries {
        heat_capacity: heat_capacity_index.map(|_| Vec::new()),
        ..Default::default()
    };

    for (record_num, record) in csv_reader.records().enumerate() {
        let record = record?;
        let mut values = [0.0; 5];
        for ((value, &index), column) in values
            .iter_mut()
            .zip(&required)
            .zip(SeriesColumn::REQUIRED)
        {
            *value = parse_cell(&record, index, column, record_num + 1)?;
        }
        series.push_sample(values[0], values[1], values[2], values[3], values[4]);

        if let (Some(index), Some(heat_capacity)) =
            (heat_capacity_index, series.heat_capacity.as_mut())
        {
            heat_capacity.push(parse_cell(
                &record,
                index,
                SeriesColumn::HeatCapacity,
                record_num + 1,
            )?);
        }
    }

    Ok(series)
}

pub fn read_series_from_path(path: &Path) -> Result<ScalarSeries, SeriesError> {
    let file = std::fs::File::open(path)?;
    read_series(std::io::BufReader::new(file))
}

/// Writes a scalar series with the canonical headers.
pub fn write_series(series: &ScalarSeries, writer: impl Write) -> Result<(), SeriesError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut columns = SeriesColumn::REQUIRED.to_vec();
    if series.heat_capacity.is_some() {
        columns.push(SeriesColumn::HeatCapacity);
    }
    csv_writer.write_record(columns.iter().map(|c| c.header()))?;

    for i in 0..series.len() {
        let row = columns.iter().map(|&c| {
            series
                .column(c)
                .and_then(|values| values.get(i))
                .map(|v| v.to_string())
                .unwrap_or_default()
        });
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_series_to_path(series: &ScalarSeries, path: &Path) -> Result<(), SeriesError> {
    let file = std::fs::File::create(path)?;
    write_series(series, std::io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_columns_by_name_in_any_order() {
        let content = "\
temperature,timestep,pressure,kinetic_energy,potential_energy
300.0,0,1.5,0.25,-3.0
310.0,5,1.6,0.26,-3.1
";
        let series = read_series(content.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestep, vec![0.0, 5.0]);
        assert_eq!(series.temperature, vec![300.0, 310.0]);
        assert_eq!(series.potential_energy, vec![-3.0, -3.1]);
        assert!(series.heat_capacity.is_none());
    }

    #[test]
    fn accepts_unit_suffixed_headers() {
        let content = "\
Time (fs),Potential Energy (eV),Kinetic Energy (eV),Pressure (Pa),Temperature (K),Heat Capacity
0,-1.0,0.1,0.0,20.0,5.0
";
        let series = read_series(content.as_bytes()).unwrap();
        assert_eq!(series.kinetic_energy, vec![0.1]);
        assert_eq!(series.heat_capacity, Some(vec![5.0]));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let content = "timestep,potential_energy,kinetic_energy,pressure\n0,1,2,3\n";
        let err = read_series(content.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            SeriesError::MissingColumn(SeriesColumn::Temperature)
        ));
    }

    #[test]
    fn non_numeric_value_reports_column_and_record() {
        let content =
            "timestep,potential_energy,kinetic_energy,pressure,temperature\n0,1,2,3,4\n1,x,2,3,4\n";
        let err = read_series(content.as_bytes()).unwrap_err();
        match err {
            SeriesError::InvalidValue { column, record, .. } => {
                assert_eq!(column, SeriesColumn::PotentialEnergy);
                assert_eq!(record, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn written_series_reads_back_identically() {
        let mut series = ScalarSeries::default();
        series.push_sample(0.0, -2.0, 0.5, 1.0, 300.0);
        series.push_sample(1.0, -2.1, 0.6, 1.1, 301.5);
        series.heat_capacity = Some(vec![10.0, 11.0]);

        let mut buffer = Vec::new();
        write_series(&series, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with(
            "timestep,potential_energy,kinetic_energy,pressure,temperature,heat_capacity"
        ));
        assert_eq!(read_series(text.as_bytes()).unwrap(), series);
    }
}
