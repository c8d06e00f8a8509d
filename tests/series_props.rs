use chrono::{Days, NaiveDate};
use lazyforecast::export::{forecast_columns, historical_columns, to_csv};
use lazyforecast::models::{ForecastPoint, HistoricalPoint};
use lazyforecast::series::{filter_window, merge_series, preview, DateWindow, MergedPoint};
use proptest::prelude::*;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..4_000).prop_map(|d| base_date().checked_add_days(Days::new(d)).unwrap())
}

fn arb_historical() -> impl Strategy<Value = HistoricalPoint> {
    (arb_date(), 0.0f64..10_000.0, 0.0f64..50.0, 0u64..10_000_000_000).prop_map(|(date, close, spread, volume)| {
        HistoricalPoint::new(date, close, close + spread, (close - spread).max(0.0), close, close * 0.99, volume)
    })
}

fn arb_forecast() -> impl Strategy<Value = ForecastPoint> {
    (arb_date(), -1_000.0f64..10_000.0, 0.0f64..100.0)
        .prop_map(|(date, predicted, width)| ForecastPoint::new(date, predicted, predicted - width, predicted + width))
}

fn arb_merged() -> impl Strategy<Value = Vec<MergedPoint>> {
    (
        proptest::collection::vec(arb_historical(), 0..80),
        proptest::collection::vec(arb_forecast(), 0..40),
    )
        .prop_map(|(h, f)| merge_series(&h, &f))
}

/// `sub` apparaît dans `full` dans le même ordre
fn is_subsequence<T: PartialEq>(sub: &[T], full: &[T]) -> bool {
    let mut it = full.iter();
    sub.iter().all(|s| it.any(|f| f == s))
}

proptest! {
    #[test]
    fn merge_keeps_every_point_sorted(
        historical in proptest::collection::vec(arb_historical(), 0..80),
        forecast in proptest::collection::vec(arb_forecast(), 0..40),
    ) {
        let merged = merge_series(&historical, &forecast);

        prop_assert_eq!(merged.len(), historical.len() + forecast.len());
        prop_assert_eq!(merged.iter().filter(|p| p.is_forecast()).count(), forecast.len());

        for pair in merged.windows(2) {
            prop_assert!(pair[0].time_key <= pair[1].time_key);
            // À time key égale, l'historique passe avant le forecast
            if pair[0].time_key == pair[1].time_key {
                prop_assert!(!(pair[0].is_forecast() && !pair[1].is_forecast()));
            }
        }
    }

    #[test]
    fn window_is_idempotent_subsequence(
        merged in arb_merged(),
        reference_end in arb_date(),
        span in prop::sample::select(vec![30u32, 60, 120]),
    ) {
        let window = DateWindow::new(reference_end, span);
        let once = filter_window(&merged, &window);
        let twice = filter_window(&once, &window);

        prop_assert!(is_subsequence(&once, &merged));
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.iter().all(|p| p.date >= window.cutoff));
        prop_assert_eq!(
            once.len(),
            merged.iter().filter(|p| p.date >= window.cutoff).count()
        );
    }

    #[test]
    fn wider_window_contains_narrower(merged in arb_merged(), reference_end in arb_date()) {
        let narrow = filter_window(&merged, &DateWindow::new(reference_end, 30));
        let wide = filter_window(&merged, &DateWindow::new(reference_end, 120));

        prop_assert!(is_subsequence(&narrow, &wide));
    }

    #[test]
    fn preview_is_prefix(points in proptest::collection::vec(arb_historical(), 0..20), k in 0usize..10) {
        let shown = preview(&points, k);

        prop_assert_eq!(shown.len(), k.min(points.len()));
        prop_assert_eq!(shown, &points[..shown.len()]);
    }

    #[test]
    fn historical_csv_round_trip(points in proptest::collection::vec(arb_historical(), 1..30)) {
        let text = to_csv(&points, &historical_columns()).unwrap();
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(text.as_bytes());

        let headers = reader.headers().unwrap().clone();
        prop_assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"]);

        let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
        prop_assert_eq!(records.len(), points.len());

        for (record, point) in records.iter().zip(&points) {
            let expected_date = point.date.format("%Y-%m-%d").to_string();
            prop_assert_eq!(&record[0], expected_date.as_str());

            let prices = [point.open, point.high, point.low, point.close, point.adj_close];
            for (field, value) in record.iter().skip(1).zip(prices) {
                let rounded: f64 = format!("{:.2}", value).parse().unwrap();
                prop_assert_eq!(field.parse::<f64>().unwrap(), rounded);
                prop_assert_eq!(field.split('.').nth(1).map(str::len), Some(2));
            }

            prop_assert_eq!(record[6].parse::<u64>().unwrap(), point.volume);
        }
    }

    #[test]
    fn forecast_csv_round_trip(points in proptest::collection::vec(arb_forecast(), 1..30)) {
        let text = to_csv(&points, &forecast_columns()).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();

        prop_assert_eq!(records.len(), points.len());
        for (record, point) in records.iter().zip(&points) {
            let expected_date = point.date.format("%Y-%m-%d").to_string();
            prop_assert_eq!(&record[0], expected_date.as_str());
            for (field, value) in record.iter().skip(1).zip([point.predicted, point.lower_bound, point.upper_bound]) {
                let rounded: f64 = format!("{:.2}", value).parse().unwrap();
                prop_assert_eq!(field.parse::<f64>().unwrap(), rounded);
            }
        }
    }
}
