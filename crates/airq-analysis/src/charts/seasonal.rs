use plotters::prelude::*;
use std::path::Path;

use super::{DrawResult, FONT, Palette};
use crate::types::{Pollutant, Season, SeasonalAverages};

const BAR_WIDTH: f64 = 0.2;

/// Left edge of a pollutant's bar within its season group.
fn bar_left(season: usize, pollutant: usize) -> f64 {
    let group_width = BAR_WIDTH * Pollutant::ALL.len() as f64;
    season as f64 - group_width / 2.0 + pollutant as f64 * BAR_WIDTH
}

pub(super) fn draw(
    path: &Path,
    size: (u32, u32),
    palette: &Palette,
    title: &str,
    seasonal: &SeasonalAverages,
) -> DrawResult<()> {
    let top = Season::ALL
        .iter()
        .flat_map(|&s| Pollutant::ALL.map(|p| seasonal.get(s, p)))
        .flatten()
        .fold(0.0_f64, f64::max);
    let y_max = if top > 0.0 { top * 1.1 } else { 1.0 };

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&palette.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 30).into_font().color(&palette.text))
        .margin(25)
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(-0.5..3.5, 0.0..y_max)?;

    let season_label = |v: &f64| {
        let i = v.round();
        if (v - i).abs() < 1e-6 && (0.0..4.0).contains(&i) {
            Season::ALL[i as usize].name().to_string()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(4)
        .x_label_formatter(&season_label)
        .y_desc("Avg concentration")
        .label_style((FONT, 16).into_font().color(&palette.text))
        .axis_desc_style((FONT, 18).into_font().color(&palette.text))
        .light_line_style(&palette.text.mix(0.04))
        .bold_line_style(&palette.text.mix(0.12))
        .draw()?;

    for (j, pollutant) in Pollutant::ALL.into_iter().enumerate() {
        let color = palette.color(pollutant);
        let bars = Season::ALL.iter().enumerate().filter_map(|(i, &season)| {
            let value = seasonal.get(season, pollutant)?;
            let left = bar_left(i, j);
            Some(Rectangle::new([(left, 0.0), (left + BAR_WIDTH, value)], color.filled()))
        });
        chart
            .draw_series(bars)?
            .label(pollutant.key().to_uppercase())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 20, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(&palette.background.mix(0.8))
        .border_style(&palette.text.mix(0.3))
        .label_font((FONT, 16).into_font().color(&palette.text))
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_are_centred_on_season() {
        // four bars of width 0.2 span [-0.4, 0.4] around each season
        assert!((bar_left(0, 0) + 0.4).abs() < 1e-12);
        assert!((bar_left(0, 3) + BAR_WIDTH - 0.4).abs() < 1e-12);
        assert!((bar_left(2, 1) - 1.8).abs() < 1e-12);
    }
}
