use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tariff_models::rate::{
    Agreement, AgreementStatus, Basis, DutyRate, RateCandidate, RateQuery, RateType,
};
use tariff_models::rate_schema::{AgreementRow, RateRow, RATE_TABLE_DDL};
use tracing::debug;

use crate::error::StoreError;
use crate::RateStore;

const SELECT_CANDIDATES: &str = "\
SELECT r.id, r.importer, r.origin, r.hs_code, r.basis, r.rate_type, \
       r.ad_valorem_rate, r.specific_amount, r.specific_unit, \
       r.valid_from, r.valid_to, r.source_ref, \
       a.id, a.name, a.status, a.rvc_threshold \
FROM tariff_rate r LEFT JOIN agreement a ON a.id = r.agreement_id \
WHERE r.importer = ?1 COLLATE NOCASE \
  AND r.hs_code = ?2 \
  AND UPPER(r.basis) = ?3 \
  AND ((?4 IS NULL AND r.origin IS NULL) OR r.origin = ?4 COLLATE NOCASE) \
ORDER BY r.valid_from DESC, r.id ASC";

/// Read-only accessor for the shared SQLite rate tables.
///
/// `rusqlite::Connection` is not `Sync`, so access is serialized through a `Mutex`.
/// The lock is never held across an await point.
pub struct SqliteRateStore {
    conn: Mutex<Connection>,
}

impl SqliteRateStore {
    /// Open a read-only connection to an existing rate database.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database with the schema created. Writable so tests can seed rates.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(RATE_TABLE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("SQLite mutex poisoned: {e}")))
    }

    /// Raw rows matching a query, most recent `valid_from` first.
    pub fn query_rows(&self, query: &RateQuery) -> Result<Vec<RateRow>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(SELECT_CANDIDATES)?;

        let rows = stmt
            .query_map(
                rusqlite::params![
                    query.importer,
                    query.hs_code,
                    query.basis.as_db_str(),
                    query.origin
                ],
                |row| {
                    Ok(RateRow {
                        id: row.get(0)?,
                        importer: row.get(1)?,
                        origin: row.get(2)?,
                        hs_code: row.get(3)?,
                        basis: row.get(4)?,
                        rate_type: row.get(5)?,
                        ad_valorem_rate: row.get(6)?,
                        specific_amount: row.get(7)?,
                        specific_unit: row.get(8)?,
                        valid_from: row.get(9)?,
                        valid_to: row.get(10)?,
                        source_ref: row.get(11)?,
                        agreement_id: row.get(12)?,
                        agreement_name: row.get(13)?,
                        agreement_status: row.get(14)?,
                        rvc_threshold: row.get(15)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Insert an agreement. Rates are owned by an external process in production;
    /// this is for seeding test databases.
    pub fn insert_agreement(&self, row: &AgreementRow) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO agreement (id, name, status, rvc_threshold) \
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![row.id, row.name, row.status, row.rvc_threshold],
        )?;
        Ok(())
    }

    /// Insert a rate row. Agreement columns on `RateRow` are ignored except `agreement_id`.
    pub fn insert_rate(&self, row: &RateRow) -> Result<(), StoreError> {
        self.lock()?.execute(
            "INSERT OR REPLACE INTO tariff_rate \
             (id, importer, origin, hs_code, basis, rate_type, ad_valorem_rate, \
              specific_amount, specific_unit, valid_from, valid_to, agreement_id, source_ref) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
                row.id,
                row.importer,
                row.origin,
                row.hs_code,
                row.basis,
                row.rate_type,
                row.ad_valorem_rate,
                row.specific_amount,
                row.specific_unit,
                row.valid_from,
                row.valid_to,
                row.agreement_id,
                row.source_ref,
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl RateStore for SqliteRateStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find_candidates(&self, query: &RateQuery) -> Result<Vec<RateCandidate>, StoreError> {
        let rows = self.query_rows(query)?;
        debug!(key = %query.cache_key(), rows = rows.len(), "Rate rows fetched");
        rows.into_iter().map(row_to_candidate).collect()
    }
}

/// Decode a raw row into a typed candidate.
///
/// An unrecognised `rate_type` is an invalid rate; any other unparseable column is a decode error.
pub fn row_to_candidate(row: RateRow) -> Result<RateCandidate, StoreError> {
    let id = row.id;
    let rate_type = RateType::from_str(&row.rate_type)
        .map_err(|e| StoreError::InvalidRate(format!("tariff_rate {id}: {e}")))?;
    let basis = Basis::from_str(&row.basis)
        .map_err(|e| StoreError::Decode(format!("tariff_rate {id}: {e}")))?;

    let agreement = match row.agreement_id {
        Some(agreement_id) => Some(Agreement {
            id: Some(agreement_id),
            name: row.agreement_name,
            status: row
                .agreement_status
                .as_deref()
                .map(AgreementStatus::from_str)
                .transpose()
                .map_err(|e| StoreError::Decode(format!("agreement {agreement_id}: {e}")))?,
            rvc_threshold: parse_decimal(id, "rvc_threshold", row.rvc_threshold.as_deref())?,
        }),
        None => None,
    };

    Ok(RateCandidate {
        id: Some(id),
        importer: row.importer,
        origin: row.origin,
        hs_code: row.hs_code,
        basis,
        rate: DutyRate::from_parts(
            rate_type,
            parse_decimal(id, "ad_valorem_rate", row.ad_valorem_rate.as_deref())?,
            parse_decimal(id, "specific_amount", row.specific_amount.as_deref())?,
            row.specific_unit,
        ),
        valid_from: parse_date(id, "valid_from", &row.valid_from)?,
        valid_to: row
            .valid_to
            .as_deref()
            .map(|v| parse_date(id, "valid_to", v))
            .transpose()?,
        agreement,
        source_ref: row.source_ref,
    })
}

fn parse_decimal(id: i64, field: &str, value: Option<&str>) -> Result<Option<Decimal>, StoreError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => Decimal::from_str(v)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("tariff_rate {id}: {field} = {v:?}: {e}"))),
    }
}

fn parse_date(id: i64, field: &str, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| StoreError::Decode(format!("tariff_rate {id}: {field} = {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rate_row(id: i64, basis: &str, origin: Option<&str>, valid_from: &str) -> RateRow {
        RateRow {
            id,
            importer: "US".to_string(),
            origin: origin.map(str::to_string),
            hs_code: "87038010".to_string(),
            basis: basis.to_string(),
            rate_type: "ad_valorem".to_string(),
            ad_valorem_rate: Some("0.055".to_string()),
            valid_from: valid_from.to_string(),
            ..RateRow::default()
        }
    }

    fn seeded_store() -> SqliteRateStore {
        let store = SqliteRateStore::open_in_memory().unwrap();
        store
            .insert_agreement(&AgreementRow {
                id: 7,
                name: "US-Chile FTA".to_string(),
                status: Some("IN_FORCE".to_string()),
                rvc_threshold: Some("30.00".to_string()),
            })
            .unwrap();
        store.insert_rate(&rate_row(1, "MFN", None, "2017-01-01")).unwrap();
        store.insert_rate(&rate_row(2, "mfn", None, "2024-01-01")).unwrap();
        store
            .insert_rate(&RateRow {
                ad_valorem_rate: Some("0.000".to_string()),
                agreement_id: Some(7),
                ..rate_row(3, "PREF", Some("CL"), "2017-01-01")
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn mfn_query_excludes_preferential_rows() {
        let store = seeded_store();
        let rows = store
            .find_candidates(&RateQuery::mfn("us", "87038010"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.basis == Basis::Mfn && r.origin.is_none()));
        // Most recent first
        assert_eq!(rows[0].id, Some(2));
    }

    #[tokio::test]
    async fn pref_query_joins_agreement() {
        let store = seeded_store();
        let rows = store
            .find_candidates(&RateQuery::preferential("US", "cl", "87038010"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        let agreement = rows[0].agreement.as_ref().unwrap();
        assert_eq!(agreement.status, Some(AgreementStatus::InForce));
        assert_eq!(agreement.rvc_threshold, Some(dec!(30.00)));
        assert_eq!(rows[0].rvc_threshold_ratio(), Some(dec!(0.30)));
        assert_eq!(rows[0].rate.ad_valorem_rate(), Some(dec!(0.000)));
    }

    #[tokio::test]
    async fn unknown_rate_type_is_invalid_rate() {
        let store = SqliteRateStore::open_in_memory().unwrap();
        store
            .insert_rate(&RateRow {
                rate_type: "mixed".to_string(),
                ..rate_row(1, "MFN", None, "2020-01-01")
            })
            .unwrap();

        let err = store
            .find_candidates(&RateQuery::mfn("US", "87038010"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidRate(_)));
    }

    #[test]
    fn malformed_columns_are_decode_errors() {
        let bad_date = RateRow {
            valid_from: "01/01/2020".to_string(),
            ..rate_row(1, "MFN", None, "")
        };
        assert!(matches!(row_to_candidate(bad_date), Err(StoreError::Decode(_))));

        let bad_decimal = RateRow {
            ad_valorem_rate: Some("ten percent".to_string()),
            ..rate_row(2, "MFN", None, "2020-01-01")
        };
        assert!(matches!(row_to_candidate(bad_decimal), Err(StoreError::Decode(_))));
    }

    #[test]
    fn specific_columns_map_to_specific_rate() {
        let row = RateRow {
            rate_type: "SPECIFIC".to_string(),
            ad_valorem_rate: None,
            specific_amount: Some("2.50".to_string()),
            specific_unit: Some("kg".to_string()),
            valid_to: Some("2030-12-31".to_string()),
            ..rate_row(4, "MFN", None, "2020-01-01")
        };
        let candidate = row_to_candidate(row).unwrap();
        assert_eq!(candidate.rate, DutyRate::specific(dec!(2.50), "kg"));
        assert_eq!(candidate.valid_to, NaiveDate::from_ymd_opt(2030, 12, 31));
        assert!(candidate.agreement.is_none());
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        assert!(SqliteRateStore::open(path.to_str().unwrap()).is_err());
    }
}
