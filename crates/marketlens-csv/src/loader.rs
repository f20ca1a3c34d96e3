//! Reads the business export and the three platform exports into a [`Dataset`].

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use tracing::{debug, info};

use marketlens_core::config::Config;
use marketlens_core::dataset::Dataset;
use marketlens_core::record::{BusinessDayRecord, Platform, RawAdRecord};

use crate::error::{LoadError, Result};
use crate::parse::{parse_amount, parse_count, parse_date};

pub const BUSINESS_COLUMNS: [&str; 5] = [
    "date",
    "# of orders",
    "new customers",
    "total revenue",
    "gross profit",
];

pub const PLATFORM_COLUMNS: [&str; 8] = [
    "date",
    "tactic",
    "state",
    "campaign",
    "impression",
    "clicks",
    "spend",
    "attributed revenue",
];

/// Locations of the four source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFiles {
    pub business: PathBuf,
    pub facebook: PathBuf,
    pub google: PathBuf,
    pub tiktok: PathBuf,
}

impl SourceFiles {
    /// Default file names (`business.csv`, `Facebook.csv`, ...) inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::from_config(&Config::for_data_dir(dir.as_ref().to_string_lossy()))
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            business: config.business_path(),
            facebook: config.facebook_path(),
            google: config.google_path(),
            tiktok: config.tiktok_path(),
        }
    }

    pub fn platform(&self, platform: Platform) -> &Path {
        match platform {
            Platform::Facebook => &self.facebook,
            Platform::Google => &self.google,
            Platform::TikTok => &self.tiktok,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BusinessRow {
    date: String,
    #[serde(rename = "# of orders")]
    orders: String,
    #[serde(rename = "new customers")]
    new_customers: String,
    #[serde(rename = "total revenue")]
    total_revenue: String,
    #[serde(rename = "gross profit")]
    gross_profit: String,
}

#[derive(Debug, Deserialize)]
struct PlatformRow {
    date: String,
    tactic: String,
    state: String,
    campaign: String,
    impression: String,
    clicks: String,
    spend: String,
    #[serde(rename = "attributed revenue")]
    attributed_revenue: String,
}

/// Per-file parsing context for error reporting.
struct Cells<'a> {
    file: &'a str,
    line: u64,
}

impl Cells<'_> {
    fn date(&self, raw: &str) -> Result<chrono::NaiveDate> {
        parse_date(raw).ok_or_else(|| LoadError::InvalidDate {
            file: self.file.to_string(),
            line: self.line,
            value: raw.to_string(),
        })
    }

    fn count(&self, column: &'static str, raw: &str) -> Result<u64> {
        parse_count(raw).ok_or_else(|| self.invalid(column, raw))
    }

    fn amount(&self, column: &'static str, raw: &str) -> Result<f64> {
        parse_amount(raw).ok_or_else(|| self.invalid(column, raw))
    }

    fn invalid(&self, column: &'static str, raw: &str) -> LoadError {
        LoadError::InvalidValue {
            file: self.file.to_string(),
            line: self.line,
            column,
            value: raw.to_string(),
        }
    }
}

fn csv_error(file: &str) -> impl Fn(csv::Error) -> LoadError + '_ {
    move |source| LoadError::Csv {
        file: file.to_string(),
        source,
    }
}

fn check_columns(file: &str, headers: &StringRecord, required: &[&'static str]) -> Result<()> {
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn {
                file: file.to_string(),
                column,
            });
        }
    }
    Ok(())
}

/// Read every row of `reader` as `T`, after checking the header carries `required`.
fn read_rows<R, T>(file: &str, reader: R, required: &[&'static str]) -> Result<Vec<(u64, T)>>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = csv.headers().map_err(csv_error(file))?.clone();
    check_columns(file, &headers, required)?;

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record.map_err(csv_error(file))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: T = record
            .deserialize(Some(&headers))
            .map_err(csv_error(file))?;
        rows.push((line, row));
    }
    Ok(rows)
}

/// Parse the business export. `file` names the source in errors.
pub fn business_from_reader<R: Read>(file: &str, reader: R) -> Result<Vec<BusinessDayRecord>> {
    read_rows::<R, BusinessRow>(file, reader, &BUSINESS_COLUMNS)?
        .into_iter()
        .map(|(line, row)| {
            let cells = Cells { file, line };
            Ok(BusinessDayRecord {
                date: cells.date(&row.date)?,
                order_count: cells.count("# of orders", &row.orders)?,
                new_customers: cells.count("new customers", &row.new_customers)?,
                total_revenue: cells.amount("total revenue", &row.total_revenue)?,
                gross_profit: cells.amount("gross profit", &row.gross_profit)?,
            })
        })
        .collect()
}

/// Parse one platform export, tagging every row with `platform`.
pub fn platform_from_reader<R: Read>(
    file: &str,
    platform: Platform,
    reader: R,
) -> Result<Vec<RawAdRecord>> {
    read_rows::<R, PlatformRow>(file, reader, &PLATFORM_COLUMNS)?
        .into_iter()
        .map(|(line, row)| {
            let cells = Cells { file, line };
            Ok(RawAdRecord {
                date: cells.date(&row.date)?,
                platform,
                impressions: cells.count("impression", &row.impression)?,
                clicks: cells.count("clicks", &row.clicks)?,
                spend: cells.amount("spend", &row.spend)?,
                attributed_revenue: cells.amount("attributed revenue", &row.attributed_revenue)?,
                tactic: row.tactic,
                state: row.state,
                campaign: row.campaign,
            })
        })
        .collect()
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load and normalize all four sources.
///
/// Platform rows are concatenated Facebook, Google, TikTok, each in file
/// order. Any failure aborts the load; nothing partial is returned.
pub fn load_dataset(files: &SourceFiles) -> Result<Dataset> {
    let business_name = file_name(&files.business);
    let business = business_from_reader(&business_name, open(&files.business)?)?;
    debug!(file = %business_name, rows = business.len(), "Read business source");

    let mut ads = Vec::new();
    for platform in Platform::ALL {
        let path = files.platform(platform);
        let name = file_name(path);
        let rows = platform_from_reader(&name, platform, open(path)?)?;
        debug!(file = %name, platform = %platform, rows = rows.len(), "Read platform source");
        ads.extend(rows);
    }

    let dataset = Dataset::new(business, ads)?;
    let options = dataset.filter_options();
    info!(
        business_days = dataset.business().len(),
        ad_rows = dataset.ads().len(),
        min_date = ?options.min_date,
        max_date = ?options.max_date,
        "Dataset loaded"
    );
    Ok(dataset)
}
