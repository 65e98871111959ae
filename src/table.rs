use chrono::NaiveDate;
use serde::Deserialize;
use serde_with::DeserializeFromStr;

use std::{convert::Infallible, path::Path, str::FromStr};

use crate::{brl::Brl, error::PipelineError};

/// One validated sale, with the derived `profit` attached at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product: String,
    pub sale_value: Brl,
    pub product_cost: Brl,
    pub channel: String,
    /// Customer satisfaction score out of 5.0, when the source row carries
    /// a usable value.
    pub satisfaction: Option<f64>,
    /// `sale_value - product_cost`, computed once per row.
    pub profit: Brl,
}

/// Holds validated sales data, in source row order.
///
/// To load data from a CSV file, use [`SalesTable::from_csv`]. The table is
/// immutable after loading; the analyser and the chart renderer both read
/// from it without modifying it.
#[derive(Debug, Default, Clone)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

/// Defines the CSV format for sales data.
///
/// Monetary and satisfaction fields deserialize through coercing wrappers so
/// that an unparseable value marks the field missing instead of failing the
/// whole file.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Data", alias = "Date")]
    date: NaiveDate,
    #[serde(rename = "Produto", alias = "Product")]
    product: String,
    #[serde(rename = "Valor", alias = "SaleValue")]
    sale_value: CoercedBrl,
    #[serde(rename = "Custo_Produto", alias = "ProductCost")]
    product_cost: CoercedBrl,
    #[serde(rename = "Canal_Venda", alias = "SalesChannel")]
    channel: String,
    #[serde(rename = "Satisfacao_Cliente", alias = "CustomerSatisfaction")]
    satisfaction: CoercedScore,
}

/// A monetary field parsed with coercion: bad input becomes `None`.
#[derive(Debug, DeserializeFromStr)]
struct CoercedBrl(Option<Brl>);

impl FromStr for CoercedBrl {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse().ok()))
    }
}

/// A satisfaction score parsed with coercion: bad input becomes `None`.
#[derive(Debug, DeserializeFromStr)]
struct CoercedScore(Option<f64>);

impl FromStr for CoercedScore {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse().ok().filter(|score: &f64| score.is_finite())))
    }
}

impl SalesTable {
    /// Loads and validates sales data from the CSV file at `path`.
    ///
    /// Rows where either monetary column fails numeric coercion are dropped;
    /// the surviving rows keep their source order, and each carries its
    /// precomputed profit. The result may hold zero rows.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SourceNotFound`] if `path` is not a readable
    /// file, and [`PipelineError::LoadFailure`] for any structural parse
    /// error (bad header, malformed row, unparseable date).
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::SourceNotFound(path.display().to_string()));
        }
        let mut rdr = csv::Reader::from_path(path)
            .map_err(|e| PipelineError::LoadFailure(e.to_string()))?;
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let raw: RawRecord = result.map_err(|e| PipelineError::LoadFailure(e.to_string()))?;
            // Coercion failure on a monetary field drops the row.
            let (CoercedBrl(Some(sale_value)), CoercedBrl(Some(product_cost))) =
                (raw.sale_value, raw.product_cost)
            else {
                continue;
            };
            records.push(SalesRecord {
                date: raw.date,
                product: raw.product,
                sale_value,
                product_cost,
                channel: raw.channel,
                satisfaction: raw.satisfaction.0,
                profit: sale_value - product_cost,
            });
        }
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns sale counts per channel, ordered by descending count.
    ///
    /// Channels with equal counts keep their first-seen order, so the result
    /// is deterministic for a given input ordering. The analyser and the
    /// chart renderer both use this as their single source of channel data.
    #[must_use]
    pub fn channel_counts(&self) -> Vec<(String, usize)> {
        counted_desc(self.records.iter().map(|r| r.channel.as_str()))
    }

    /// Returns sale counts per product, ordered by descending count, ties in
    /// first-seen order.
    #[must_use]
    pub fn product_counts(&self) -> Vec<(String, usize)> {
        counted_desc(self.records.iter().map(|r| r.product.as_str()))
    }
}

/// Counts occurrences in first-seen order, then sorts by descending count.
/// The sort is stable, so equal counts stay in encounter order.
fn counted_desc<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(name, _)| name == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
