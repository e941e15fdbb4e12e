use std::collections::BTreeMap;

use serde::Serialize;
use time::Date;

use stockpick_core::{MarketDataSet, PriceSeries, Ticker};

/// Pairwise Pearson correlation of daily log returns.
///
/// `values[i][j]` is the correlation between tickers `i` and `j` in
/// `tickers` order. Pairs with fewer than two common observations, or
/// where one side is constant, are `None`. The diagonal is `Some(1.0)`
/// whenever the ticker has any return observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub tickers: Vec<Ticker>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &Ticker, b: &Ticker) -> Option<f64> {
        let i = self.tickers.iter().position(|t| t == a)?;
        let j = self.tickers.iter().position(|t| t == b)?;
        self.values[i][j]
    }
}

/// Compute the return correlation matrix for every ticker in the dataset.
///
/// Returns are aligned per pair by an inner join on the return date (the
/// date of the latter close in each consecutive pair), so tickers with
/// differing trading calendars compare only where both traded.
pub fn correlation_matrix(dataset: &MarketDataSet) -> CorrelationMatrix {
    let returns: Vec<(Ticker, BTreeMap<Date, f64>)> = dataset
        .series()
        .map(|series| (series.ticker().clone(), dated_log_returns(series)))
        .collect();

    let n = returns.len();
    let mut values = vec![vec![None; n]; n];

    for i in 0..n {
        if !returns[i].1.is_empty() {
            values[i][i] = Some(1.0);
        }
        for j in (i + 1)..n {
            let value = pearson_on_common_dates(&returns[i].1, &returns[j].1);
            values[i][j] = value;
            values[j][i] = value;
        }
    }

    CorrelationMatrix {
        tickers: returns.into_iter().map(|(ticker, _)| ticker).collect(),
        values,
    }
}

fn dated_log_returns(series: &PriceSeries) -> BTreeMap<Date, f64> {
    series
        .bars()
        .windows(2)
        .map(|pair| (pair[1].date, (pair[1].close / pair[0].close).ln()))
        .collect()
}

fn pearson_on_common_dates(
    a: &BTreeMap<Date, f64>,
    b: &BTreeMap<Date, f64>,
) -> Option<f64> {
    let common: Vec<(f64, f64)> = a
        .iter()
        .filter_map(|(date, &ra)| b.get(date).map(|&rb| (ra, rb)))
        .collect();
    if common.len() < 2 {
        return None;
    }

    let n = common.len() as f64;
    let mean_a = common.iter().map(|(ra, _)| ra).sum::<f64>() / n;
    let mean_b = common.iter().map(|(_, rb)| rb).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (ra, rb) in &common {
        let da = ra - mean_a;
        let db = rb - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some(cov / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockpick_core::{DailyBar, DateRange, FetchFailure, PriceSeries};

    fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let ticker = Ticker::parse(symbol).expect("ticker");
        let mut date = stockpick_core::parse_iso_date("2024-01-01").expect("date");
        let bars = closes
            .iter()
            .map(|&close| {
                let bar = DailyBar::new(
                    date,
                    close,
                    close * 1.01 + 0.01,
                    (close * 0.99).max(0.0),
                    close,
                    None,
                )
                .expect("bar");
                date = stockpick_core::next_weekday(date);
                bar
            })
            .collect();
        PriceSeries::new(ticker, bars).expect("series")
    }

    fn dataset_of(series_list: Vec<PriceSeries>) -> MarketDataSet {
        let range = DateRange::parse("2024-01-01", "2024-12-31").expect("range");
        MarketDataSet {
            range,
            tickers: series_list
                .into_iter()
                .map(|s| {
                    let info = stockpick_core::TickerInfo::new(
                        s.ticker().clone(),
                        s.ticker().as_str(),
                        None,
                        "USD",
                        None,
                        None,
                        None,
                        None,
                        None,
                    )
                    .expect("info");
                    stockpick_core::TickerData { info, series: s }
                })
                .collect(),
            failures: Vec::<FetchFailure>::new(),
            cache_hits: 0,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn identical_series_correlate_perfectly() {
        let closes = [100.0, 101.0, 99.5, 103.0, 102.0];
        let dataset = dataset_of(vec![series("A", &closes), series("B", &closes)]);
        let matrix = correlation_matrix(&dataset);

        let a = Ticker::parse("A").expect("ticker");
        let b = Ticker::parse("B").expect("ticker");
        let value = matrix.get(&a, &b).expect("correlated");
        assert!((value - 1.0).abs() < 1e-9);
        assert_eq!(matrix.get(&a, &a), Some(1.0));
    }

    #[test]
    fn mirrored_series_correlate_negatively() {
        let up = [100.0, 101.0, 102.0, 101.5, 103.0];
        let down = [100.0, 99.0, 98.0, 98.5, 97.0];
        let dataset = dataset_of(vec![series("UP", &up), series("DOWN", &down)]);
        let matrix = correlation_matrix(&dataset);

        let value = matrix
            .get(
                &Ticker::parse("UP").expect("ticker"),
                &Ticker::parse("DOWN").expect("ticker"),
            )
            .expect("correlated");
        assert!(value < -0.8);
    }

    #[test]
    fn constant_series_has_no_defined_correlation() {
        let dataset = dataset_of(vec![
            series("FLAT", &[50.0; 5]),
            series("MOVE", &[100.0, 101.0, 99.0, 102.0, 100.5]),
        ]);
        let matrix = correlation_matrix(&dataset);

        assert_eq!(
            matrix.get(
                &Ticker::parse("FLAT").expect("ticker"),
                &Ticker::parse("MOVE").expect("ticker"),
            ),
            None
        );
    }

    #[test]
    fn matrix_is_symmetric() {
        let dataset = dataset_of(vec![
            series("A", &[100.0, 102.0, 101.0, 104.0]),
            series("B", &[50.0, 49.0, 51.0, 50.5]),
        ]);
        let matrix = correlation_matrix(&dataset);
        assert_eq!(matrix.values[0][1], matrix.values[1][0]);
    }
}
