//! 가격 차트 생성
//!
//! 최근 거래일 구간의 종가와 SMA 오버레이를 PNG로 렌더링

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use plotters::prelude::*;
use plotters::style::register_font;

use crate::error::AlertError;
use crate::indicators::RollingSma;
use crate::models::PricePoint;

/// 차트에 표시할 최근 거래일 수
pub const CHART_POINTS: usize = 100;

const CHART_WIDTH: u32 = 1200;
const CHART_HEIGHT: u32 = 600;

/// 캡션/축 라벨용 번들 폰트 (DejaVu Sans)
static SANS_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

/// 번들 폰트를 "sans-serif" 이름으로 프로세스당 1회 등록
fn ensure_font_registered() -> bool {
    *FONT_REGISTERED
        .get_or_init(|| register_font("sans-serif", FontStyle::Normal, SANS_FONT).is_ok())
}

/// SMA 오버레이 색상 (기간 순서대로)
const SMA_PALETTE: [RGBColor; 4] = [
    RGBColor(31, 119, 180),  // 파랑
    RGBColor(255, 165, 0),   // 주황
    RGBColor(44, 160, 44),   // 초록
    RGBColor(214, 39, 40),   // 빨강
];

/// 종가 + SMA 오버레이 차트 생성기
#[derive(Debug, Clone)]
pub struct ChartGenerator {
    symbol: String,
    width: u32,
    height: u32,
}

impl ChartGenerator {
    pub fn new(symbol: impl Into<String>) -> Self {
        ChartGenerator {
            symbol: symbol.into(),
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
        }
    }

    /// 마지막 CHART_POINTS일 구간을 PNG 바이트로 렌더링
    ///
    /// SMA는 전체 입력으로 계산하므로 구간 초반에도 값이 채워진다.
    pub fn render(&self, prices: &[PricePoint], periods: &[usize]) -> Result<Vec<u8>, AlertError> {
        if !ensure_font_registered() {
            return Err(AlertError::ChartError(
                "Bundled chart font failed to load".to_string(),
            ));
        }

        if prices.len() < CHART_POINTS {
            return Err(AlertError::InvalidParameter(format!(
                "Insufficient history for chart: got {} days, need {}",
                prices.len(),
                CHART_POINTS
            )));
        }

        let start = prices.len() - CHART_POINTS;
        let display = &prices[start..];

        let mut y_min = f64::MAX;
        let mut y_max = f64::MIN;
        for point in display {
            y_min = y_min.min(point.close);
            y_max = y_max.max(point.close);
        }

        // 표시 구간에 들어오는 SMA 오버레이 시계열 준비
        let mut overlays: Vec<(usize, Vec<(DateTime<Utc>, f64)>)> = Vec::new();
        for &period in periods {
            let mut rolling = RollingSma::new(period);
            let mut series = Vec::new();

            for (i, point) in prices.iter().enumerate() {
                rolling.push(point.close);
                if i >= start {
                    if let Some(value) = rolling.value() {
                        series.push((point.timestamp, value));
                    }
                }
            }

            for &(_, value) in &series {
                y_min = y_min.min(value);
                y_max = y_max.max(value);
            }

            if !series.is_empty() {
                overlays.push((period, series));
            }
        }

        let pad = ((y_max - y_min) * 0.05).max(1.0);
        let y_range = (y_min - pad)..(y_max + pad);
        let x_range = display[0].timestamp..display[display.len() - 1].timestamp;

        let mut buffer = vec![0u8; (self.width * self.height * 3) as usize];
        {
            let root =
                BitMapBackend::with_buffer(&mut buffer, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AlertError::ChartError(format!("Failed to fill chart: {}", e)))?;

            let mut chart = ChartBuilder::on(&root)
                .caption(
                    format!("{} Price with SMA Overlays", self.symbol),
                    ("sans-serif", 24),
                )
                .margin(10)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d(x_range, y_range)
                .map_err(|e| AlertError::ChartError(format!("Failed to build chart: {}", e)))?;

            chart
                .configure_mesh()
                .x_labels(8)
                .x_label_formatter(&|dt: &DateTime<Utc>| dt.format("%Y-%m-%d").to_string())
                .x_desc("Date")
                .y_desc("Price ($)")
                .draw()
                .map_err(|e| AlertError::ChartError(format!("Failed to draw mesh: {}", e)))?;

            chart
                .draw_series(LineSeries::new(
                    display.iter().map(|p| (p.timestamp, p.close)),
                    BLACK.stroke_width(2),
                ))
                .map_err(|e| AlertError::ChartError(format!("Failed to draw price series: {}", e)))?
                .label(format!("{} Close", self.symbol))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], BLACK.stroke_width(2)));

            for (idx, (period, series)) in overlays.into_iter().enumerate() {
                let color = SMA_PALETTE[idx % SMA_PALETTE.len()];

                chart
                    .draw_series(LineSeries::new(series.into_iter(), color.stroke_width(1)))
                    .map_err(|e| {
                        AlertError::ChartError(format!("Failed to draw SMA series: {}", e))
                    })?
                    .label(format!("SMA {}", period))
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(1))
                    });
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(|e| AlertError::ChartError(format!("Failed to draw legend: {}", e)))?;

            root.present()
                .map_err(|e| AlertError::ChartError(format!("Failed to finalize chart: {}", e)))?;
        }

        let image = image::RgbImage::from_raw(self.width, self.height, buffer)
            .ok_or_else(|| AlertError::ChartError("Chart buffer has unexpected size".to_string()))?;

        let mut png = Vec::new();
        image
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageOutputFormat::Png,
            )
            .map_err(|e| AlertError::ChartError(format!("Failed to encode chart PNG: {}", e)))?;

        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::DEFAULT_PERIODS;
    use chrono::Duration;

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn wavy_series(days: usize) -> Vec<PricePoint> {
        let now = Utc::now();
        (0..days)
            .map(|i| {
                let close = 480.0 + 15.0 * ((i as f64) * 0.21).sin() + (i % 7) as f64;
                PricePoint::new(now - Duration::days((days - i) as i64), close)
            })
            .collect()
    }

    #[test]
    fn test_render_produces_png() {
        let generator = ChartGenerator::new("SPY");
        let prices = wavy_series(130);

        let png = generator.render(&prices, &DEFAULT_PERIODS).unwrap();

        assert!(png.len() > 1000);
        assert_eq!(&png[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_rendered_png_decodes_with_content() {
        // 캡션·축 라벨 경로까지 포함해 패닉 없이 유효한 이미지가 나와야 한다
        let generator = ChartGenerator::new("SPY");
        let prices = wavy_series(130);

        let png = generator.render(&prices, &DEFAULT_PERIODS).unwrap();

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.width(), CHART_WIDTH);
        assert_eq!(decoded.height(), CHART_HEIGHT);
        // 흰 배경만 있는 빈 이미지가 아니어야 한다
        assert!(decoded.pixels().any(|p| p.0 != [255, 255, 255]));
    }

    #[test]
    fn test_render_repeats_across_generators() {
        // 폰트 등록은 프로세스당 1회, 이후 생성기들도 그대로 렌더링된다
        let prices = wavy_series(120);

        assert!(ChartGenerator::new("SPY").render(&prices, &DEFAULT_PERIODS).is_ok());
        assert!(ChartGenerator::new("QQQ").render(&prices, &DEFAULT_PERIODS).is_ok());
    }

    #[test]
    fn test_render_rejects_short_history() {
        let generator = ChartGenerator::new("SPY");
        let prices = wavy_series(99);

        let result = generator.render(&prices, &DEFAULT_PERIODS);

        assert!(matches!(result, Err(AlertError::InvalidParameter(_))));
    }

    #[test]
    fn test_render_accepts_exact_window() {
        let generator = ChartGenerator::new("SPY");
        let prices = wavy_series(CHART_POINTS);

        assert!(generator.render(&prices, &DEFAULT_PERIODS).is_ok());
    }

    #[test]
    fn test_render_flat_series() {
        // 종가가 전부 같아도 y축 패딩 덕에 렌더링이 가능해야 한다
        let now = Utc::now();
        let prices: Vec<PricePoint> = (0..110)
            .map(|i| PricePoint::new(now - Duration::days((110 - i) as i64), 500.0))
            .collect();

        let generator = ChartGenerator::new("SPY");
        assert!(generator.render(&prices, &DEFAULT_PERIODS).is_ok());
    }
}
