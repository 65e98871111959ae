use plotters::prelude::*;

use std::path::Path;

use crate::{error::PipelineError, table::SalesTable};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;

/// Bars alternate between these two colours.
const BAR_COLORS: [RGBColor; 2] = [RGBColor(0x4a, 0x90, 0xe2), RGBColor(0xe2, 0x7c, 0x4a)];

/// Renders a bar chart of sale counts per channel to a PNG file at `path`,
/// overwriting any existing file.
///
/// Bars appear in the same descending-frequency order the analyser reports,
/// one per distinct channel, with horizontal category labels.
///
/// # Errors
///
/// Returns [`PipelineError::RenderFailure`] for an empty table or for any
/// drawing or I/O error; no rendering fault propagates as a panic.
pub fn render_channel_chart(
    table: &SalesTable,
    path: impl AsRef<Path>,
) -> Result<(), PipelineError> {
    if table.is_empty() {
        return Err(PipelineError::RenderFailure(
            "no sales records to chart".to_string(),
        ));
    }
    let counts = table.channel_counts();
    draw(&counts, path.as_ref()).map_err(|e| PipelineError::RenderFailure(e.to_string()))
}

fn draw(counts: &[(String, usize)], path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(1) as u32;
    let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Total Sales by Channel", ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d((0..counts.len()).into_segmented(), 0u32..max + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Sales Channel")
        .y_desc("Number of Sales")
        .axis_desc_style(("sans-serif", 18))
        .label_style(("sans-serif", 15))
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => counts
                .get(*i)
                .map(|(channel, _)| channel.clone())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(i, (_, count))| {
        Rectangle::new(
            [
                (SegmentValue::Exact(i), 0),
                (SegmentValue::Exact(i + 1), *count as u32),
            ],
            BAR_COLORS[i % 2].filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}
