//! Download formats for the current result set. All of them are projections:
//! nothing here touches the store or the monitor.

use chrono::NaiveDateTime;
use serde_json::json;

use crate::{
    domain::record::{Flag, Record},
    error::ExportError,
};

use super::{
    monitor::ResultSet,
    text_codec::{self, Field},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(extension: &str) -> Option<ExportFormat> {
        match extension {
            "txt" => Some(ExportFormat::Txt),
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain; charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

pub fn file_name(format: ExportFormat, at: NaiveDateTime) -> String {
    format!(
        "resultados_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub fn render(format: ExportFormat, results: &ResultSet) -> Result<String, ExportError> {
    match format {
        ExportFormat::Txt => Ok(to_txt(results)),
        ExportFormat::Json => Ok(to_json(results)?),
        ExportFormat::Csv => to_csv(&results.results),
    }
}

fn to_txt(results: &ResultSet) -> String {
    let query = results
        .search_params
        .as_ref()
        .map(|params| params.query())
        .unwrap_or_default();
    text_codec::encode_document(&query, &results.results)
}

fn to_json(results: &ResultSet) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "search_params": results.search_params,
        "total_found": results.results.len(),
        "results": results.results,
    }))
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn flag(value: Flag) -> String {
    Option::<bool>::from(value)
        .map(|b| b.to_string())
        .unwrap_or_default()
}

fn csv_cell(record: &Record, field: Field) -> String {
    match field {
        Field::Name => record.name.clone(),
        Field::Category => opt(&record.category),
        Field::Address => opt(&record.address),
        Field::Phone => opt(&record.phone),
        Field::Website => opt(&record.website),
        Field::OpeningHours => opt(&record.opening_hours),
        Field::AverageRating => opt(&record.average_rating),
        Field::ReviewCount => opt(&record.review_count),
        Field::Introduction => opt(&record.introduction),
        Field::StoreShopping => flag(record.store_shopping),
        Field::InStorePickup => flag(record.in_store_pickup),
        Field::Delivery => flag(record.delivery),
    }
}

pub fn to_csv(records: &[Record]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(vec![]);

    writer.write_record(Field::ALL.iter().map(|f| f.key()))?;
    for record in records {
        writer.write_record(Field::ALL.iter().map(|f| csv_cell(record, *f)))?;
    }
    writer.flush()?;

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
