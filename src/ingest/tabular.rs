/// Bulk import boundary for tabular nest data.
///
/// Spreadsheet and CSV exports arrive with human headers in Turkish or
/// English ("Yuva Sıra No", "Toplam Yumurta Sayısı", "nest_date"). Headers
/// are normalized to lowercase ASCII snake case and mapped onto record
/// fields through an alias table; unknown columns are ignored.
///
/// Rows are validated independently. A row with a missing or non-integer
/// id, an unparseable nest date or an unknown predation status is skipped
/// and counted, never failing the batch.

use crate::logging::{self, Component};
use crate::model::{parse_nest_date, NestError, NestRecord, PredationStatus, PredatorSet};
use crate::store::RecordStore;
use indexmap::IndexMap;

// ============================================================================
// Column normalization
// ============================================================================

/// Header aliases accepted as the nest identifier.
pub const ID_ALIASES: &[&str] = &["id", "yuva_sira_no", "yuva_no", "nest_id"];

/// Lowercases, folds Turkish letters and combining marks to ASCII,
/// turns blanks into underscores and drops `(`, `)` and `.`.
pub fn normalize_column(name: &str) -> String {
    let folded: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'ı' => Some('i'),
            'ğ' => Some('g'),
            'ü' => Some('u'),
            'ş' => Some('s'),
            'ö' => Some('o'),
            'ç' => Some('c'),
            'â' => Some('a'),
            'î' => Some('i'),
            'û' => Some('u'),
            '(' | ')' | '.' => None,
            '\u{0300}'..='\u{036f}' => None,
            c if c.is_whitespace() || c == '-' => Some('_'),
            c => Some(c),
        })
        .collect();

    // "Toplam Denize Uzaklık (m)" leaves a doubled separator behind
    folded
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Year,
    Lat,
    Lon,
    NestDate,
    FirstHatchDate,
    SecondPredationDate,
    DrySand,
    DampSand,
    WetSand,
    SeaDistance,
    Depth,
    Diameter,
    IncubationDays,
    Relocated,
    TemperatureLogger,
    Tag,
    TotalEggs,
    LiveHatchlings,
    DeadHatchlings,
    EarlyEmbryos,
    MidEmbryos,
    LateEmbryos,
    TotalDeadEmbryos,
    EmptyShells,
    PredatedEggs,
    UnfertilizedEggs,
    HatchDay1,
    HatchDay2,
    HatchDay3,
    PredationStatus,
    PredatorSpecies,
}

fn column_for(normalized: &str) -> Option<Column> {
    if ID_ALIASES.contains(&normalized) {
        return Some(Column::Id);
    }
    let column = match normalized {
        "yil" | "year" => Column::Year,
        "lat" | "latitude" | "enlem" => Column::Lat,
        "lon" | "lng" | "longitude" | "boylam" => Column::Lon,
        "yuva_tarihi" | "nest_date" => Column::NestDate,
        "ilk_yavru_cikis_tarihi" | "first_hatch_date" => Column::FirstHatchDate,
        "ikinci_predasyon_tarihi" | "second_predation_date" => Column::SecondPredationDate,
        "kuru_kum_uzakligi" | "dry_sand_distance" => Column::DrySand,
        "yari_islak_kum_uzakligi" | "damp_sand_distance" => Column::DampSand,
        "islak_kum_uzakligi" | "wet_sand_distance" => Column::WetSand,
        "toplam_denize_uzaklik" | "toplam_denize_uzaklik_m" | "sea_distance" => Column::SeaDistance,
        "yuva_derinligi" | "depth" => Column::Depth,
        "yuva_capi" | "diameter" => Column::Diameter,
        "kulucka_suresi_gun" | "kulucka_suresi" | "incubation_days" => Column::IncubationDays,
        "tasinma_durumu" | "relocated" => Column::Relocated,
        "sicaklik_aleti_var_mi" | "temperature_logger" => Column::TemperatureLogger,
        "marka" | "tag" => Column::Tag,
        "toplam_yumurta_sayisi" | "total_eggs" => Column::TotalEggs,
        "yuva_ici_canli_yavru" | "live_hatchlings" => Column::LiveHatchlings,
        "yuva_ici_olu_yavru" | "dead_hatchlings" => Column::DeadHatchlings,
        "erken_donem_embriyo" | "early_embryos" => Column::EarlyEmbryos,
        "orta_donem_embriyo" | "mid_embryos" => Column::MidEmbryos,
        "gec_donem_embriyo" | "late_embryos" => Column::LateEmbryos,
        "toplam_olu_embriyo" | "total_dead_embryos" => Column::TotalDeadEmbryos,
        "bos_kabuk_sayisi" | "empty_shells" => Column::EmptyShells,
        "predasyonlu_yumurta_sayisi" | "predated_eggs" => Column::PredatedEggs,
        "dollenmemis_yumurta_sayisi" | "unfertilized_eggs" => Column::UnfertilizedEggs,
        "yavru_cikis_gun_1" | "hatch_day_1" => Column::HatchDay1,
        "yavru_cikis_gun_2" | "hatch_day_2" => Column::HatchDay2,
        "yavru_cikis_gun_3" | "hatch_day_3" => Column::HatchDay3,
        "predasyon_durumu" | "predation_status" => Column::PredationStatus,
        "predator_canli_listesi" | "predator_species" => Column::PredatorSpecies,
        _ => return None,
    };
    Some(column)
}

// ============================================================================
// Cell parsing
// ============================================================================

/// Cells that spreadsheet exports write for "no value".
fn is_blank(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan") || t.eq_ignore_ascii_case("null") || t == "-"
}

/// Decimal comma is accepted.
fn parse_f64(text: &str) -> Option<f64> {
    if is_blank(text) {
        return None;
    }
    text.trim().replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integers exported as floats ("12.0") are accepted; fractional values are not.
fn parse_i64(text: &str) -> Option<i64> {
    if is_blank(text) {
        return None;
    }
    let t = text.trim();
    t.parse::<i64>().ok().or_else(|| {
        let v = parse_f64(t)?;
        (v.fract() == 0.0 && v.abs() < 9.0e15).then_some(v as i64)
    })
}

fn parse_i32(text: &str) -> Option<i32> {
    parse_i64(text).and_then(|v| i32::try_from(v).ok())
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "evet" | "var" | "yes" | "true" | "1" | "e" => Some(true),
        "hayir" | "hayır" | "yok" | "no" | "false" | "0" | "h" => Some(false),
        _ => None,
    }
}

/// JSON array text or a comma/semicolon separated list.
fn parse_predators(text: &str) -> PredatorSet {
    let t = text.trim();
    if t.starts_with('[') {
        PredatorSet::from_json(t)
    } else {
        PredatorSet::from_tags(t.split([',', ';']))
    }
}

// ============================================================================
// TabularRow
// ============================================================================

/// One imported row: normalized header → raw cell text, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularRow {
    cells: IndexMap<String, String>,
}

impl TabularRow {
    /// Builds a row from `(header, cell)` pairs, normalizing the headers.
    /// When two headers normalize to the same name the first one wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut cells = IndexMap::new();
        for (header, value) in pairs {
            cells
                .entry(normalize_column(header.as_ref()))
                .or_insert_with(|| value.as_ref().to_string());
        }
        Self { cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(&normalize_column(column)).map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Parses the row into a record with `year` and `success_rate` derived.
    ///
    /// Optional numeric cells that do not parse are left empty; the row is
    /// only rejected for a bad identity (id, nest date, year) or an
    /// unknown predation status.
    pub fn to_record(&self) -> Result<NestRecord, NestError> {
        let mut record = NestRecord::default();
        let mut has_id = false;

        for (name, raw) in &self.cells {
            let Some(column) = column_for(name) else {
                continue;
            };
            match column {
                Column::Id => {
                    record.id = parse_i64(raw).ok_or_else(|| {
                        NestError::Validation(format!("nest id '{}' is not an integer", raw.trim()))
                    })?;
                    has_id = true;
                }
                Column::Year => record.year = parse_i32(raw),
                Column::Lat => record.lat = parse_f64(raw),
                Column::Lon => record.lon = parse_f64(raw),
                Column::NestDate => {
                    record.nest_date = Some(parse_nest_date(raw).ok_or_else(|| {
                        NestError::Validation(format!("unparseable nest date '{}'", raw.trim()))
                    })?);
                }
                Column::FirstHatchDate => record.first_hatch_date = parse_nest_date(raw),
                Column::SecondPredationDate => record.second_predation_date = parse_nest_date(raw),
                Column::DrySand => record.dry_sand_distance = parse_f64(raw),
                Column::DampSand => record.damp_sand_distance = parse_f64(raw),
                Column::WetSand => record.wet_sand_distance = parse_f64(raw),
                Column::SeaDistance => record.sea_distance = parse_f64(raw),
                Column::Depth => record.depth = parse_f64(raw),
                Column::Diameter => record.diameter = parse_f64(raw),
                Column::IncubationDays => record.incubation_days = parse_i32(raw),
                Column::Relocated => record.relocated = parse_bool(raw),
                Column::TemperatureLogger => record.temperature_logger = parse_bool(raw),
                Column::Tag => {
                    record.tag = (!is_blank(raw)).then(|| raw.trim().to_string());
                }
                Column::TotalEggs => record.total_eggs = parse_i32(raw),
                Column::LiveHatchlings => record.live_hatchlings = parse_i32(raw),
                Column::DeadHatchlings => record.dead_hatchlings = parse_i32(raw),
                Column::EarlyEmbryos => record.early_embryos = parse_i32(raw),
                Column::MidEmbryos => record.mid_embryos = parse_i32(raw),
                Column::LateEmbryos => record.late_embryos = parse_i32(raw),
                Column::TotalDeadEmbryos => record.total_dead_embryos = parse_i32(raw),
                Column::EmptyShells => record.empty_shells = parse_i32(raw),
                Column::PredatedEggs => record.predated_eggs = parse_i32(raw),
                Column::UnfertilizedEggs => record.unfertilized_eggs = parse_i32(raw),
                Column::HatchDay1 => record.hatch_day_1 = parse_i32(raw),
                Column::HatchDay2 => record.hatch_day_2 = parse_i32(raw),
                Column::HatchDay3 => record.hatch_day_3 = parse_i32(raw),
                Column::PredationStatus => {
                    record.predation_status = if is_blank(raw) {
                        PredationStatus::None
                    } else {
                        raw.parse()?
                    };
                }
                Column::PredatorSpecies => record.predator_species = parse_predators(raw),
            }
        }

        if !has_id {
            return Err(NestError::Validation("row has no nest id column".to_string()));
        }
        record.derive_year()?;
        record.check_ranges()?;
        record.recompute_success_rate();
        Ok(record)
    }
}

// ============================================================================
// Import
// ============================================================================

/// Outcome of one bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records written to the store.
    pub inserted: usize,
    /// Rows rejected before reaching the store.
    pub malformed: usize,
    /// Valid rows whose key was already stored or repeated in the batch.
    pub duplicates: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.malformed + self.duplicates
    }
}

/// Parses every row and hands the valid ones to `store.bulk_insert`.
pub fn import_rows<S>(store: &mut S, rows: &[TabularRow]) -> Result<ImportSummary, NestError>
where
    S: RecordStore + ?Sized,
{
    let mut records = Vec::with_capacity(rows.len());
    let mut malformed = 0;

    for (index, row) in rows.iter().enumerate() {
        match row.to_record() {
            Ok(record) => records.push(record),
            Err(e) => {
                malformed += 1;
                logging::log_failure(
                    Component::Import,
                    None,
                    &format!("row {}", index + 1),
                    &e,
                );
            }
        }
    }

    let parsed = records.len();
    let inserted = store.bulk_insert(records)?;
    let summary = ImportSummary {
        inserted,
        malformed,
        duplicates: parsed - inserted,
    };

    logging::log_batch_summary(Component::Import, summary.total(), inserted, summary.total() - inserted);
    Ok(summary)
}

// ============================================================================
// Tests
// ============================================================================
