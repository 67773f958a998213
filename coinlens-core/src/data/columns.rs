//! Header-name matching for price tables in English and Spanish.

/// Canonical OHLCV fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// Synonyms per field, matched as case-insensitive substrings. Order matters:
/// a header is claimed by the first field whose synonym it contains.
pub const FIELD_SYNONYMS: [(Field, &[&str]); 6] = [
    (Field::Date, &["fecha", "date", "time", "timestamp"]),
    (
        Field::Close,
        &["close", "último", "ultimo", "last", "price", "precio_cierre"],
    ),
    (Field::Open, &["open", "apertura"]),
    (Field::High, &["high", "máximo", "maximo", "max", "alto"]),
    (Field::Low, &["low", "mínimo", "minimo", "min", "bajo"]),
    (Field::Volume, &["volume", "volumen", "vol"]),
];

/// Column index per canonical field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub open: Option<usize>,
    pub high: Option<usize>,
    pub low: Option<usize>,
    pub close: Option<usize>,
    pub volume: Option<usize>,
}

impl ColumnMap {
    fn slot(&mut self, field: Field) -> &mut Option<usize> {
        match field {
            Field::Date => &mut self.date,
            Field::Open => &mut self.open,
            Field::High => &mut self.high,
            Field::Low => &mut self.low,
            Field::Close => &mut self.close,
            Field::Volume => &mut self.volume,
        }
    }

    /// True if `index` is already claimed by some field.
    pub fn is_mapped(&self, index: usize) -> bool {
        [self.date, self.open, self.high, self.low, self.close, self.volume]
            .contains(&Some(index))
    }
}

/// Strip BOM, quotes and surrounding whitespace from a header cell.
pub fn clean_header(raw: &str) -> String {
    raw.replace('\u{feff}', "").replace('"', "").trim().to_string()
}

/// Classify a single header, or `None` if it matches no synonym.
pub fn classify_header(header: &str) -> Option<Field> {
    let lower = clean_header(header).to_lowercase();
    FIELD_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| lower.contains(s)))
        .map(|(field, _)| *field)
}

/// Map headers to fields; the first column claiming a field keeps it.
pub fn map_columns<S: AsRef<str>>(headers: &[S]) -> ColumnMap {
    let mut map = ColumnMap::default();
    for (i, header) in headers.iter().enumerate() {
        if let Some(field) = classify_header(header.as_ref()) {
            let slot = map.slot(field);
            if slot.is_none() {
                *slot = Some(i);
            }
        }
    }
    map
}
