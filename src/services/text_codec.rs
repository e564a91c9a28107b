//! The plain-text batch format shared by the collector (writer) and the
//! server (reader).
//!
//! ```text
//! Nome: Padaria Central
//! Tipo: Padaria
//! ...
//! Entrega: Sim
//! ------------------------------
//!
//! ```

use std::collections::BTreeMap;

use crate::domain::record::{Flag, Record, NAME_NOT_FOUND, NOT_AVAILABLE};

pub const SEPARATOR: &str = "------------------------------";

const YES: &str = "Sim";
const NO: &str = "Não";

/// Record fields in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    Category,
    Address,
    Phone,
    Website,
    OpeningHours,
    AverageRating,
    ReviewCount,
    Introduction,
    StoreShopping,
    InStorePickup,
    Delivery,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Name,
        Field::Category,
        Field::Address,
        Field::Phone,
        Field::Website,
        Field::OpeningHours,
        Field::AverageRating,
        Field::ReviewCount,
        Field::Introduction,
        Field::StoreShopping,
        Field::InStorePickup,
        Field::Delivery,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::Name => "Nome",
            Field::Category => "Tipo",
            Field::Address => "Endereço",
            Field::Phone => "Telefone",
            Field::Website => "Website",
            Field::OpeningHours => "Horário",
            Field::AverageRating => "Avaliação Média",
            Field::ReviewCount => "Contagem de Avaliações",
            Field::Introduction => "Introdução",
            Field::StoreShopping => "Compras na Loja",
            Field::InStorePickup => "Retirada na Loja",
            Field::Delivery => "Entrega",
        }
    }

    /// Structured-data key, as used by the JSON and CSV exports.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Category => "type",
            Field::Address => "address",
            Field::Phone => "phone",
            Field::Website => "website",
            Field::OpeningHours => "opening_hours",
            Field::AverageRating => "average_rating",
            Field::ReviewCount => "review_count",
            Field::Introduction => "introduction",
            Field::StoreShopping => "store_shopping",
            Field::InStorePickup => "in_store_pickup",
            Field::Delivery => "delivery",
        }
    }

    pub fn from_label(label: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.label() == label)
    }
}

/// A decoded value, after coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Float(f64),
    Int(i64),
    Text(String),
}

impl Value {
    pub fn render(&self) -> String {
        match self {
            Value::Bool(true) => YES.to_string(),
            Value::Bool(false) => NO.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Int(i) => i.to_string(),
            Value::Text(s) => single_line(s),
        }
    }

    fn into_text(self) -> String {
        match self {
            Value::Text(s) => s,
            other => other.render(),
        }
    }
}

/// Decoded section: the recognized fields of one record.
pub type Section = BTreeMap<Field, Value>;

/// "Sim"/"Yes" and "Não"/"No" become booleans; otherwise a float when the
/// value contains a '.', then an integer, then the raw string.
pub fn coerce(raw: &str) -> Value {
    match raw {
        "Sim" | "Yes" => return Value::Bool(true),
        "Não" | "No" => return Value::Bool(false),
        _ => {}
    }

    if raw.contains('.') {
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
    } else if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }

    Value::Text(raw.to_string())
}

/// Floats always carry a '.', so they decode back as floats.
fn format_float(f: f64) -> String {
    let s = f.to_string();
    match s.contains('.') || !f.is_finite() {
        true => s,
        false => format!("{}.0", s),
    }
}

/// Line breaks inside a value would split it across lines the decoder
/// can't attribute.
fn single_line(s: &str) -> String {
    match s.contains(['\n', '\r']) {
        true => s.split_whitespace().collect::<Vec<_>>().join(" "),
        false => s.to_string(),
    }
}

fn text(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(single_line)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn flag(value: Flag) -> String {
    match value {
        Flag::Yes => YES.to_string(),
        Flag::No => NO.to_string(),
        Flag::Unknown => NOT_AVAILABLE.to_string(),
    }
}

fn render_field(record: &Record, field: Field) -> String {
    match field {
        Field::Name => single_line(&record.name),
        Field::Category => text(&record.category),
        Field::Address => text(&record.address),
        Field::Phone => text(&record.phone),
        Field::Website => text(&record.website),
        Field::OpeningHours => text(&record.opening_hours),
        Field::AverageRating => record
            .average_rating
            .map(format_float)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        Field::ReviewCount => record
            .review_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        Field::Introduction => text(&record.introduction),
        Field::StoreShopping => flag(record.store_shopping),
        Field::InStorePickup => flag(record.in_store_pickup),
        Field::Delivery => flag(record.delivery),
    }
}

fn write_section(out: &mut String, fields: impl Iterator<Item = (Field, String)>) {
    for (field, value) in fields {
        out.push_str(field.label());
        out.push_str(": ");
        out.push_str(&value);
        out.push('\n');
    }
    out.push_str(SEPARATOR);
    out.push_str("\n\n");
}

pub fn encode(records: &[Record]) -> String {
    let mut out = String::new();
    for record in records {
        write_section(
            &mut out,
            Field::ALL.into_iter().map(|f| (f, render_field(record, f))),
        );
    }
    out
}

/// The results artifact: a header the decoder ignores, then the sections.
pub fn encode_document(query: &str, records: &[Record]) -> String {
    let mut out = format!(
        "Resultados da busca por: {}\nTotal de estabelecimentos coletados: {}\n{}\n\n",
        single_line(query),
        records.len(),
        "=".repeat(40)
    );
    out.push_str(&encode(records));
    out
}

/// Re-encodes decoded sections, keeping only the fields each one had.
pub fn encode_sections(sections: &[Section]) -> String {
    let mut out = String::new();
    for section in sections {
        write_section(&mut out, section.iter().map(|(f, v)| (*f, v.render())));
    }
    out
}

pub fn decode_sections(text: &str) -> Vec<Section> {
    text.split(SEPARATOR)
        .filter(|section| !section.trim().is_empty())
        .map(|section| {
            section
                .trim()
                .lines()
                .filter_map(|line| {
                    let (label, value) = line.trim_end_matches('\r').split_once(": ")?;
                    Field::from_label(label).map(|field| (field, coerce(value)))
                })
                .collect::<Section>()
        })
        .filter(|section| !section.is_empty())
        .collect()
}

fn optional_text(section: &mut Section, field: Field) -> Option<String> {
    section
        .remove(&field)
        .map(Value::into_text)
        .filter(|s| s != NOT_AVAILABLE)
}

fn optional_flag(section: &Section, field: Field) -> Flag {
    match section.get(&field) {
        Some(Value::Bool(b)) => Flag::from(*b),
        _ => Flag::Unknown,
    }
}

pub fn record_from_section(mut section: Section) -> Record {
    let average_rating = match section.get(&Field::AverageRating) {
        Some(Value::Float(f)) => Some(*f),
        Some(Value::Int(i)) => Some(*i as f64),
        _ => None,
    };
    let review_count = match section.get(&Field::ReviewCount) {
        Some(Value::Int(i)) => u32::try_from(*i).ok(),
        Some(Value::Float(f)) if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 => {
            Some(*f as u32)
        }
        _ => None,
    };

    Record {
        name: section
            .remove(&Field::Name)
            .map(Value::into_text)
            .unwrap_or_else(|| NAME_NOT_FOUND.to_string()),
        category: optional_text(&mut section, Field::Category),
        address: optional_text(&mut section, Field::Address),
        phone: optional_text(&mut section, Field::Phone),
        website: optional_text(&mut section, Field::Website),
        opening_hours: optional_text(&mut section, Field::OpeningHours),
        average_rating,
        review_count,
        introduction: optional_text(&mut section, Field::Introduction),
        store_shopping: optional_flag(&section, Field::StoreShopping),
        in_store_pickup: optional_flag(&section, Field::InStorePickup),
        delivery: optional_flag(&section, Field::Delivery),
    }
}

pub fn decode(text: &str) -> Vec<Record> {
    decode_sections(text)
        .into_iter()
        .map(record_from_section)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        coerce, decode, decode_sections, encode, encode_document, encode_sections, Field, Value,
        SEPARATOR,
    };
    use crate::domain::record::{Flag, Record, COLLECTION_ERROR};

    fn full_record() -> Record {
        Record {
            name: "Padaria Central".to_string(),
            category: Some("Padaria".to_string()),
            address: Some("Av. Afonso Pena, 1200".to_string()),
            phone: Some("(67) 3321-0000".to_string()),
            website: Some("padariacentral.com.br".to_string()),
            opening_hours: Some("Aberto ⋅ Fecha às 20:00".to_string()),
            average_rating: Some(4.5),
            review_count: Some(1234),
            introduction: Some("Pães artesanais desde 1980".to_string()),
            store_shopping: Flag::Yes,
            in_store_pickup: Flag::No,
            delivery: Flag::Yes,
        }
    }

    #[test]
    fn encode_writes_labels_in_order() {
        let text = encode(&[full_record()]);
        let labels: Vec<&str> = text
            .lines()
            .filter_map(|l| l.split_once(": ").map(|(label, _)| label))
            .collect();

        assert_eq!(
            labels,
            Field::ALL.iter().map(|f| f.label()).collect::<Vec<_>>()
        );
        assert!(text.contains("Avaliação Média: 4.5\n"));
        assert!(text.contains("Compras na Loja: Sim\n"));
        assert!(text.contains("Retirada na Loja: Não\n"));
        assert!(text.ends_with(&format!("{}\n\n", SEPARATOR)));
    }

    #[test]
    fn coerce_follows_precedence() {
        assert_eq!(coerce("Sim"), Value::Bool(true));
        assert_eq!(coerce("Yes"), Value::Bool(true));
        assert_eq!(coerce("Não"), Value::Bool(false));
        assert_eq!(coerce("No"), Value::Bool(false));
        assert_eq!(coerce("4.5"), Value::Float(4.5));
        assert_eq!(coerce("120"), Value::Int(120));
        assert_eq!(coerce("Av. Brasil"), Value::Text("Av. Brasil".to_string()));
        assert_eq!(coerce("N/A"), Value::Text("N/A".to_string()));
        assert_eq!(coerce("4,5"), Value::Text("4,5".to_string()));
    }

    #[test]
    fn decode_recovers_typed_values() {
        let record = full_record();
        let decoded = decode(&encode(&[record.clone(), Record::failed()]));

        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0], record);
        assert_eq!(decoded[1], Record::failed());
        assert_eq!(decoded[1].name, COLLECTION_ERROR);
    }

    #[test]
    fn whole_number_rating_stays_a_float() {
        let mut record = full_record();
        record.average_rating = Some(5.0);
        let text = encode(&[record]);

        assert!(text.contains("Avaliação Média: 5.0\n"));
        assert_eq!(decode(&text)[0].average_rating, Some(5.0));
    }

    #[test]
    fn numeric_looking_strings_are_reinterpreted() {
        let mut record = full_record();
        record.phone = Some("067991234".to_string());
        record.name = "Sim".to_string();

        let sections = decode_sections(&encode(&[record]));
        assert_eq!(sections[0][&Field::Phone], Value::Int(67991234));
        assert_eq!(sections[0][&Field::Name], Value::Bool(true));

        let back = decode(&encode_sections(&sections));
        assert_eq!(back[0].phone.as_deref(), Some("67991234"));
    }

    #[test]
    fn multiline_values_are_flattened() {
        let mut record = full_record();
        record.opening_hours = Some("segunda-feira\n08:00–18:00\nterça-feira\n08:00–18:00".to_string());

        let decoded = decode(&encode(&[record]));

        assert_eq!(
            decoded[0].opening_hours.as_deref(),
            Some("segunda-feira 08:00–18:00 terça-feira 08:00–18:00")
        );
        assert_eq!(decoded[0].introduction, full_record().introduction);
    }

    #[test]
    fn header_and_trailing_separator_are_ignored() {
        let text = encode_document("padarias em Campo Grande", &[full_record(), full_record()]);

        assert!(text.starts_with("Resultados da busca por: padarias em Campo Grande\n"));
        assert_eq!(decode(&text).len(), 2);
    }

    #[test]
    fn sections_without_known_labels_are_dropped() {
        let text = format!(
            "Foo: bar\n{sep}\n\nNome: Loja\nCidade: Campo Grande\n{sep}\n\n   \n",
            sep = SEPARATOR
        );
        let sections = decode_sections(&text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].len(), 1);
    }

    #[test]
    fn reencoding_sections_keeps_order_and_fields() {
        let text = "Nome: Loja A\nTelefone: N/A\nAvaliação Média: 3.9\nEntrega: Não\n------------------------------\n\n";
        let sections = decode_sections(text);

        assert_eq!(encode_sections(&sections), text);
    }

    #[test]
    fn missing_name_gets_placeholder() {
        let decoded = decode("Endereço: Rua A\n------------------------------\n");

        assert_eq!(decoded[0].name, "Nome não encontrado");
        assert_eq!(decoded[0].address.as_deref(), Some("Rua A"));
        assert_eq!(decoded[0].delivery, Flag::Unknown);
    }
}
