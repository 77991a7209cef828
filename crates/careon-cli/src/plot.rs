use std::path::Path;

use anyhow::{anyhow, Result};
use careon_lib::chart::{Figure, Series};
use plotters::prelude::*;

fn style_color(rgb: (u8, u8, u8)) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

/// Render a figure to a PNG. The x axis is labelled from `fig.x.ticks` by index.
pub fn draw_figure(path: &Path, fig: &Figure) -> Result<()> {
    let (x_min, x_max, y_min, y_max) = fig
        .bounds()
        .ok_or_else(|| anyhow!("figure has no points to draw"))?;
    // pad so single-point series and flat lines still get a usable range
    let x_max = if x_max > x_min { x_max } else { x_min + 1.0 };
    let y_pad = ((y_max - y_min) * 0.1).max(1.0);

    let backend = BitMapBackend::new(path, (800, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, (y_min - y_pad)..(y_max + y_pad))?;

    let ticks = &fig.x.ticks;
    let x_formatter = |x: &f64| {
        let index = x.round();
        if (x - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        ticks.get(index as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_labels(ticks.len().max(2))
        .x_label_formatter(&x_formatter)
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .draw()?;

    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let color = style_color(line.style.color.rgb());
                let stroke = color.stroke_width(line.style.width.round() as u32);
                let points = line.points.iter().map(|p| (p[0], p[1]));
                let anno = match line.style.dash {
                    Some([size, spacing]) => chart.draw_series(DashedLineSeries::new(
                        points,
                        size.round() as u32,
                        spacing.round() as u32,
                        stroke,
                    ))?,
                    None => chart.draw_series(LineSeries::new(points, stroke))?,
                };
                anno.label(line.name.clone()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3))
                });
            }
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}
