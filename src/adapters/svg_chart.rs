//! Standalone SVG line chart of the mean capital series.

use crate::domain::error::SimError;
use crate::domain::evaluation::EvaluationReport;
use crate::ports::report_port::ReportPort;

pub struct SvgChartAdapter {
    width: f64,
    height: f64,
    padding: f64,
}

impl Default for SvgChartAdapter {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 320.0,
            padding: 50.0,
        }
    }
}

impl SvgChartAdapter {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    fn polyline(&self, series: &[(f64, f64)]) -> String {
        let min = series.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max = series.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let plot_width = self.width - 2.0 * self.padding;
        let plot_height = self.height - 2.0 * self.padding;

        let range = max - min;
        let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
        let scale_x = if series.len() > 1 {
            plot_width / (series.len() - 1) as f64
        } else {
            0.0
        };
        // A flat series sits mid-height instead of on the axis.
        let offset_y = if range > 0.0 { 0.0 } else { plot_height / 2.0 };

        series
            .iter()
            .map(|(x, value)| {
                let px = self.padding + (x - 1.0) * scale_x;
                let py = self.height - self.padding - offset_y - (value - min) * scale_y;
                format!("{:.1},{:.1}", px, py)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ReportPort for SvgChartAdapter {
    fn render(&self, report: &EvaluationReport) -> Result<String, SimError> {
        let series = report.chart_series();
        let (w, h, p) = (self.width, self.height, self.padding);

        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">
  <rect width="100%" height="100%" fill="white"/>
  <line x1="{p:.0}" y1="{p:.0}" x2="{p:.0}" y2="{bottom:.0}" stroke="black"/>
  <line x1="{p:.0}" y1="{bottom:.0}" x2="{right:.0}" y2="{bottom:.0}" stroke="black"/>
  <text x="{cx:.0}" y="{xl:.0}" text-anchor="middle" font-size="12">{x_label}</text>
  <text x="14" y="{cy:.0}" text-anchor="middle" font-size="12" transform="rotate(-90 14 {cy:.0})">{y_label}</text>
"#,
            bottom = h - p,
            right = w - p,
            cx = w / 2.0,
            cy = h / 2.0,
            xl = h - p / 3.0,
            x_label = report.x_label(),
            y_label = report.y_label(),
        );

        if series.is_empty() {
            svg.push_str(&format!(
                "  <text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"middle\" font-size=\"12\">No evaluation data</text>\n",
                w / 2.0,
                h / 2.0
            ));
        } else {
            let values = series.iter().map(|s| s.1);
            let min = values.clone().fold(f64::INFINITY, f64::min);
            let max = values.fold(f64::NEG_INFINITY, f64::max);
            svg.push_str(&format!(
                "  <text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"end\" font-size=\"10\">{:.2}</text>\n",
                p - 4.0,
                p,
                max
            ));
            svg.push_str(&format!(
                "  <text x=\"{:.0}\" y=\"{:.0}\" text-anchor=\"end\" font-size=\"10\">{:.2}</text>\n",
                p - 4.0,
                h - p,
                min
            ));
            svg.push_str(&format!(
                "  <polyline fill=\"none\" stroke=\"steelblue\" stroke-width=\"1.5\" points=\"{}\"/>\n",
                self.polyline(&series)
            ));
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}
