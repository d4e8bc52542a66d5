/// The SQLite schema the rate store reads from. Rates are maintained by an
/// external owner; this crate only ever reads them.
///
/// Decimal columns are TEXT so values keep their exact scale (`0.055`, `40.00`).
/// Enum columns hold the lowercase/uppercase database strings
/// (`MFN` | `PREF`, `ad_valorem` | `specific` | `compound`,
/// `in_force` | `signed` | `inactive`) and are matched case-insensitively.
pub const RATE_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS agreement (
    id              INTEGER PRIMARY KEY,
    name            TEXT NOT NULL,
    status          TEXT,
    rvc_threshold   TEXT
);
CREATE TABLE IF NOT EXISTS tariff_rate (
    id              INTEGER PRIMARY KEY,
    importer        TEXT NOT NULL,
    origin          TEXT,
    hs_code         TEXT NOT NULL,
    basis           TEXT NOT NULL,
    rate_type       TEXT NOT NULL,
    ad_valorem_rate TEXT,
    specific_amount TEXT,
    specific_unit   TEXT,
    valid_from      TEXT NOT NULL,
    valid_to        TEXT,
    agreement_id    INTEGER REFERENCES agreement(id),
    source_ref      TEXT
);
CREATE INDEX IF NOT EXISTS idx_rate_lookup ON tariff_rate(importer, hs_code, basis);
CREATE INDEX IF NOT EXISTS idx_rate_origin ON tariff_rate(origin);
";

/// A raw `tariff_rate` row joined with its agreement, as read from SQLite.
#[derive(Debug, Clone, Default)]
pub struct RateRow {
    pub id: i64,
    pub importer: String,
    pub origin: Option<String>,
    pub hs_code: String,
    pub basis: String,
    pub rate_type: String,
    pub ad_valorem_rate: Option<String>,
    pub specific_amount: Option<String>,
    pub specific_unit: Option<String>,
    pub valid_from: String,
    pub valid_to: Option<String>,
    pub source_ref: Option<String>,
    pub agreement_id: Option<i64>,
    pub agreement_name: Option<String>,
    pub agreement_status: Option<String>,
    pub rvc_threshold: Option<String>,
}

/// A raw `agreement` row.
#[derive(Debug, Clone, Default)]
pub struct AgreementRow {
    pub id: i64,
    pub name: String,
    pub status: Option<String>,
    pub rvc_threshold: Option<String>,
}
