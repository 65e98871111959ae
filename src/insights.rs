use std::fmt::{self, Display};

use crate::{brl::Brl, error::PipelineError, table::SalesTable};

/// The aggregate metrics computed once per run from a [`SalesTable`].
///
/// To compute a summary, use [`Insights::from_table`]. To get a printable
/// version, use its [`Display`] implementation; the report composer uses
/// [`Insights::summary_lines`] for the same content without the heading.
#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub total_profit: Brl,
    /// Mode of the product column; the first-encountered product wins ties.
    pub top_product: String,
    /// Sale counts per channel, descending, ties in first-seen order.
    pub sales_by_channel: Vec<(String, usize)>,
    /// Mean satisfaction over rows that carry a usable score, 0.0 when none
    /// do.
    pub average_satisfaction: f64,
    pub total_sales: usize,
}

impl Insights {
    /// Computes the insight summary for `table`.
    ///
    /// Deterministic for identical input ordering: the table preserves
    /// source row order through validation, and all tie-breaking follows
    /// encounter order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] when the table holds no rows.
    /// Calling again on the same table yields the same signal.
    pub fn from_table(table: &SalesTable) -> Result<Self, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let total_profit = table.records().iter().map(|r| r.profit).sum();
        // product_counts is sorted descending with first-seen tie order, so
        // the head is the mode.
        let top_product = table.product_counts().remove(0).0;
        let scores: Vec<f64> = table
            .records()
            .iter()
            .filter_map(|r| r.satisfaction)
            .collect();
        let average_satisfaction = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        Ok(Self {
            total_profit,
            top_product,
            sales_by_channel: table.channel_counts(),
            average_satisfaction,
            total_sales: table.len(),
        })
    }

    /// Returns the summary as report lines, in the fixed report order:
    /// total profit, top product, average satisfaction, channel breakdown.
    #[must_use]
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("- Total Profit: {}", self.total_profit),
            format!("- Top Product: {}", self.top_product),
            format!(
                "- Average Customer Satisfaction: {:.2} / 5.0",
                self.average_satisfaction
            ),
            "- Sales by Channel:".to_string(),
        ];
        for (channel, count) in &self.sales_by_channel {
            lines.push(format!("    - {channel}: {count} sales"));
        }
        lines
    }
}

impl Display for Insights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Key Insights ({} sales):", self.total_sales)?;
        for line in self.summary_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SalesTable;

    #[test]
    fn from_table_fn_computes_fixture_metrics() {
        let table = SalesTable::from_csv("testdata/sales.csv").unwrap();
        let insights = Insights::from_table(&table).unwrap();
        assert_eq!(insights.total_profit, Brl::from_centavos(63_000));
        assert_eq!(insights.top_product, "Notebook");
        assert_eq!(
            insights.sales_by_channel,
            vec![("Online".to_string(), 3), ("Store".to_string(), 2)]
        );
        assert!((insights.average_satisfaction - 4.2).abs() < 1e-9);
        assert_eq!(insights.total_sales, 5);
    }

    #[test]
    fn total_profit_matches_independent_recomputation() {
        let table = SalesTable::from_csv("testdata/sales.csv").unwrap();
        let insights = Insights::from_table(&table).unwrap();
        let recomputed: Brl = table
            .records()
            .iter()
            .map(|r| r.sale_value - r.product_cost)
            .sum();
        assert_eq!(insights.total_profit, recomputed);
    }

    #[test]
    fn from_table_fn_reports_exact_profit_for_two_row_fixture() {
        let table = SalesTable::from_csv("testdata/sales_dirty.csv").unwrap();
        let insights = Insights::from_table(&table).unwrap();
        assert_eq!(insights.total_profit.to_string(), "R$ 210,00");
    }

    #[test]
    fn channel_counts_sum_to_total_sales() {
        let table = SalesTable::from_csv("testdata/sales.csv").unwrap();
        let insights = Insights::from_table(&table).unwrap();
        let counted: usize = insights.sales_by_channel.iter().map(|(_, n)| n).sum();
        assert_eq!(counted, insights.total_sales);
    }

    #[test]
    fn from_table_fn_signals_empty_input_idempotently() {
        let table = SalesTable::from_csv("testdata/sales_invalid.csv").unwrap();
        for _ in 0..2 {
            let err = Insights::from_table(&table).unwrap_err();
            assert!(matches!(err, PipelineError::EmptyInput), "{err}");
        }
    }

    #[test]
    fn top_product_tie_goes_to_first_encountered() {
        // Webcam and Headset both survive once; Webcam appears first.
        let table = SalesTable::from_csv("testdata/sales_dirty.csv").unwrap();
        let insights = Insights::from_table(&table).unwrap();
        assert_eq!(insights.top_product, "Webcam");
    }

    #[test]
    fn average_satisfaction_skips_missing_scores() {
        // Only the Webcam row carries a score (4.0); the Headset row's is
        // empty and must not pull the mean down.
        let table = SalesTable::from_csv("testdata/sales_dirty.csv").unwrap();
        let insights = Insights::from_table(&table).unwrap();
        assert!((insights.average_satisfaction - 4.0).abs() < 1e-9);
    }

    #[test]
    fn summary_lines_fn_keeps_fixed_report_order() {
        let table = SalesTable::from_csv("testdata/sales.csv").unwrap();
        let insights = Insights::from_table(&table).unwrap();
        let lines = insights.summary_lines();
        assert_eq!(lines[0], "- Total Profit: R$ 630,00");
        assert_eq!(lines[1], "- Top Product: Notebook");
        assert_eq!(lines[2], "- Average Customer Satisfaction: 4.20 / 5.0");
        assert_eq!(lines[3], "- Sales by Channel:");
        assert_eq!(lines[4], "    - Online: 3 sales");
        assert_eq!(lines[5], "    - Store: 2 sales");
    }
}
