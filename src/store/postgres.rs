/// PostgreSQL record store.
///
/// One table, `nests`, with the composite primary key `(id, year)`.
/// Predator tags are stored as a JSON array in a text column; the
/// predation status is stored by its canonical name.
///
/// Connection string comes from `DATABASE_URL` (read from `.env` when
/// present), the same way the other services in this workspace connect.

use super::{prepare_manual, prepare_record, RecordStore};
use crate::logging::{self, Component};
use crate::model::{NestError, NestKey, NestRecord, PredationStatus, PredatorSet};
use postgres::error::SqlState;
use postgres::types::ToSql;
use postgres::{Client, GenericClient, NoTls, Row};
use std::collections::BTreeSet;
use std::env;

// ============================================================================
// Schema
// ============================================================================

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS nests (
        id                      BIGINT NOT NULL,
        year                    INTEGER NOT NULL,
        lat                     DOUBLE PRECISION,
        lon                     DOUBLE PRECISION,
        nest_date               DATE NOT NULL,
        first_hatch_date        DATE,
        second_predation_date   DATE,
        dry_sand_distance       DOUBLE PRECISION,
        damp_sand_distance      DOUBLE PRECISION,
        wet_sand_distance       DOUBLE PRECISION,
        sea_distance            DOUBLE PRECISION,
        depth                   DOUBLE PRECISION,
        diameter                DOUBLE PRECISION,
        incubation_days         INTEGER,
        relocated               BOOLEAN,
        temperature_logger      BOOLEAN,
        tag                     TEXT,
        total_eggs              INTEGER,
        live_hatchlings         INTEGER,
        dead_hatchlings         INTEGER,
        early_embryos           INTEGER,
        mid_embryos             INTEGER,
        late_embryos            INTEGER,
        total_dead_embryos      INTEGER,
        empty_shells            INTEGER,
        predated_eggs           INTEGER,
        unfertilized_eggs       INTEGER,
        hatch_day_1             INTEGER,
        hatch_day_2             INTEGER,
        hatch_day_3             INTEGER,
        success_rate            DOUBLE PRECISION,
        predation_status        TEXT NOT NULL DEFAULT 'none',
        predator_species        TEXT NOT NULL DEFAULT '[]',
        PRIMARY KEY (id, year)
    )
";

const COLUMNS: &str = "id, year, lat, lon, nest_date, first_hatch_date, second_predation_date, \
    dry_sand_distance, damp_sand_distance, wet_sand_distance, sea_distance, depth, diameter, \
    incubation_days, relocated, temperature_logger, tag, \
    total_eggs, live_hatchlings, dead_hatchlings, early_embryos, mid_embryos, late_embryos, \
    total_dead_embryos, empty_shells, predated_eggs, unfertilized_eggs, \
    hatch_day_1, hatch_day_2, hatch_day_3, success_rate, predation_status, predator_species";

const PLACEHOLDERS: &str = "$1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33";

// ============================================================================
// PgStore
// ============================================================================

pub struct PgStore {
    client: Client,
}

impl PgStore {
    pub fn connect(url: &str) -> Result<Self, NestError> {
        let client = Client::connect(url, NoTls)?;
        Ok(Self { client })
    }

    /// Connects using `DATABASE_URL`, loading `.env` first if present.
    pub fn connect_from_env() -> Result<Self, NestError> {
        dotenv::dotenv().ok();
        let url = env::var("DATABASE_URL")
            .map_err(|_| NestError::Config("DATABASE_URL must be set".to_string()))?;
        Self::connect(&url)
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Creates the `nests` table if it does not exist yet.
    pub fn ensure_schema(&mut self) -> Result<(), NestError> {
        self.client.batch_execute(SCHEMA_SQL)?;
        logging::debug(Component::Store, None, "schema ready");
        Ok(())
    }
}

impl RecordStore for PgStore {
    fn exists(&mut self, key: NestKey) -> Result<bool, NestError> {
        let row = self.client.query_opt(
            "SELECT 1 FROM nests WHERE id = $1 AND year = $2",
            &[&key.id, &key.year],
        )?;
        Ok(row.is_some())
    }

    fn insert(&mut self, record: NestRecord) -> Result<NestKey, NestError> {
        let (key, record) = prepare_manual(record).inspect_err(|e| {
            logging::log_failure(Component::Store, None, "insert", e);
        })?;
        let sql = format!("INSERT INTO nests ({}) VALUES ({})", COLUMNS, PLACEHOLDERS);
        match write_record(&mut self.client, &sql, key, &record) {
            Ok(_) => {
                logging::info(Component::Store, Some(key), "nest added");
                Ok(key)
            }
            Err(e) => {
                let err = match e.code() {
                    Some(code) if *code == SqlState::UNIQUE_VIOLATION => NestError::DuplicateKey(key),
                    _ => NestError::Database(e),
                };
                logging::log_failure(Component::Store, Some(key), "insert", &err);
                Err(err)
            }
        }
    }

    fn bulk_insert(&mut self, records: Vec<NestRecord>) -> Result<usize, NestError> {
        let total = records.len();
        let sql = format!(
            "INSERT INTO nests ({}) VALUES ({}) ON CONFLICT (id, year) DO NOTHING",
            COLUMNS, PLACEHOLDERS
        );

        let mut tx = self.client.transaction()?;
        let mut inserted = 0;
        for record in records {
            let (key, record) = match prepare_record(record) {
                Ok(prepared) => prepared,
                Err(e) => {
                    logging::log_failure(Component::Store, None, "bulk insert row", &e);
                    continue;
                }
            };
            if write_record(&mut tx, &sql, key, &record)? == 1 {
                inserted += 1;
            } else {
                logging::debug(Component::Store, Some(key), "already stored; skipped");
            }
        }
        tx.commit()?;

        logging::log_batch_summary(Component::Store, total, inserted, total - inserted);
        Ok(inserted)
    }

    fn update_predation(
        &mut self,
        key: NestKey,
        status: PredationStatus,
        species: PredatorSet,
    ) -> Result<(), NestError> {
        let updated = self.client.execute(
            "UPDATE nests SET predation_status = $1, predator_species = $2
             WHERE id = $3 AND year = $4",
            &[&status.as_str(), &species.to_json(), &key.id, &key.year],
        )?;
        if updated == 0 {
            return Err(NestError::NotFound(key));
        }
        logging::info(
            Component::Store,
            Some(key),
            &format!("predation status set to {}", status),
        );
        Ok(())
    }

    fn bulk_delete(&mut self, keys: &BTreeSet<NestKey>) -> Result<usize, NestError> {
        let mut tx = self.client.transaction()?;
        let mut removed = 0;
        for key in keys {
            removed += tx.execute(
                "DELETE FROM nests WHERE id = $1 AND year = $2",
                &[&key.id, &key.year],
            )?;
        }
        tx.commit()?;

        logging::warn(
            Component::Store,
            None,
            &format!("{} nests deleted ({} requested)", removed, keys.len()),
        );
        Ok(removed as usize)
    }

    fn fetch_all(&mut self) -> Result<Vec<NestRecord>, NestError> {
        let sql = format!("SELECT {} FROM nests ORDER BY year, id", COLUMNS);
        let rows = self.client.query(sql.as_str(), &[])?;
        rows.iter().map(record_from_row).collect()
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn write_record<C: GenericClient>(
    client: &mut C,
    sql: &str,
    key: NestKey,
    r: &NestRecord,
) -> Result<u64, postgres::Error> {
    let status = r.predation_status.as_str();
    let species = r.predator_species.to_json();
    let params: [&(dyn ToSql + Sync); 33] = [
        &key.id,
        &key.year,
        &r.lat,
        &r.lon,
        &r.nest_date,
        &r.first_hatch_date,
        &r.second_predation_date,
        &r.dry_sand_distance,
        &r.damp_sand_distance,
        &r.wet_sand_distance,
        &r.sea_distance,
        &r.depth,
        &r.diameter,
        &r.incubation_days,
        &r.relocated,
        &r.temperature_logger,
        &r.tag,
        &r.total_eggs,
        &r.live_hatchlings,
        &r.dead_hatchlings,
        &r.early_embryos,
        &r.mid_embryos,
        &r.late_embryos,
        &r.total_dead_embryos,
        &r.empty_shells,
        &r.predated_eggs,
        &r.unfertilized_eggs,
        &r.hatch_day_1,
        &r.hatch_day_2,
        &r.hatch_day_3,
        &r.success_rate,
        &status,
        &species,
    ];
    client.execute(sql, &params)
}

fn record_from_row(row: &Row) -> Result<NestRecord, NestError> {
    let status: String = row.try_get("predation_status")?;
    let species: String = row.try_get("predator_species")?;
    Ok(NestRecord {
        id: row.try_get("id")?,
        year: row.try_get("year")?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
        nest_date: row.try_get("nest_date")?,
        first_hatch_date: row.try_get("first_hatch_date")?,
        second_predation_date: row.try_get("second_predation_date")?,
        dry_sand_distance: row.try_get("dry_sand_distance")?,
        damp_sand_distance: row.try_get("damp_sand_distance")?,
        wet_sand_distance: row.try_get("wet_sand_distance")?,
        sea_distance: row.try_get("sea_distance")?,
        depth: row.try_get("depth")?,
        diameter: row.try_get("diameter")?,
        incubation_days: row.try_get("incubation_days")?,
        relocated: row.try_get("relocated")?,
        temperature_logger: row.try_get("temperature_logger")?,
        tag: row.try_get("tag")?,
        total_eggs: row.try_get("total_eggs")?,
        live_hatchlings: row.try_get("live_hatchlings")?,
        dead_hatchlings: row.try_get("dead_hatchlings")?,
        early_embryos: row.try_get("early_embryos")?,
        mid_embryos: row.try_get("mid_embryos")?,
        late_embryos: row.try_get("late_embryos")?,
        total_dead_embryos: row.try_get("total_dead_embryos")?,
        empty_shells: row.try_get("empty_shells")?,
        predated_eggs: row.try_get("predated_eggs")?,
        unfertilized_eggs: row.try_get("unfertilized_eggs")?,
        hatch_day_1: row.try_get("hatch_day_1")?,
        hatch_day_2: row.try_get("hatch_day_2")?,
        hatch_day_3: row.try_get("hatch_day_3")?,
        success_rate: row.try_get("success_rate")?,
        predation_status: PredationStatus::parse(&status).unwrap_or_default(),
        predator_species: PredatorSet::from_json(&species),
    })
}
