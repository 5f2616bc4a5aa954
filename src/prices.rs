//! Hourly price series handling
//!
//! This module turns the raw daily price lists fetched from the pricing API
//! into an ordered, timestamp-anchored window and answers the one question
//! the control loop cares about: is the current hour among the N cheapest?

use chrono::{Days, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Raw hourly price lists as published by the pricing collaborator.
///
/// The driver retains the last successfully fetched forecast between
/// refreshes; a failed refresh leaves the previous forecast in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceForecast {
    /// Today's hourly prices, index 0 = hour 00
    pub today: Vec<f64>,

    /// Tomorrow's hourly prices; empty until the provider publishes them
    /// (typically in the afternoon)
    pub tomorrow: Vec<f64>,
}

impl PriceForecast {
    /// Whether the forecast carries no usable data at all
    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.tomorrow.is_empty()
    }
}

/// One hourly price slot anchored to a calendar hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    /// Start of the hour this price applies to (minutes and seconds zeroed)
    pub starts_at: NaiveDateTime,

    /// Price for the hour in the provider's cost unit
    pub total: f64,
}

/// Ordered two-day window of hourly price samples
#[derive(Debug, Clone, Default)]
pub struct PriceWindow {
    samples: Vec<PriceSample>,
}

impl PriceWindow {
    /// Build a window from a raw forecast, anchored to the date of `now`.
    ///
    /// Today entries take the calendar date of `now`, tomorrow entries the
    /// next calendar date, with the list index as the hour of day. Each
    /// source list contributes disjoint hours, so no dedup is needed. Empty
    /// input lists yield an empty window.
    pub fn normalize(forecast: &PriceForecast, now: NaiveDateTime) -> Self {
        let today = now.date();
        let mut samples: Vec<PriceSample> = forecast
            .today
            .iter()
            .enumerate()
            .filter_map(|(hour, &total)| {
                let starts_at = today.and_hms_opt(hour as u32, 0, 0)?;
                Some(PriceSample { starts_at, total })
            })
            .collect();

        if let Some(next_day) = today.checked_add_days(Days::new(1)) {
            samples.extend(forecast.tomorrow.iter().enumerate().filter_map(
                |(hour, &total)| {
                    let starts_at = next_day.and_hms_opt(hour as u32, 0, 0)?;
                    Some(PriceSample { starts_at, total })
                },
            ));
        }

        Self { samples }
    }

    /// All samples in time order
    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    /// Number of samples in the window
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The `n` cheapest samples, `n` clamped to the available sample count.
    ///
    /// The sort is stable, so equal-priced samples keep their original time
    /// order and the selection is deterministic.
    pub fn cheapest_hours(&self, n: u32) -> Vec<PriceSample> {
        let mut sorted = self.samples.clone();
        sorted.sort_by(|a, b| {
            a.total
                .partial_cmp(&b.total)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted.truncate((n as usize).min(sorted.len()));
        sorted
    }

    /// Whether the hour containing `now` is one of the `n` cheapest.
    ///
    /// Returns false for an empty window, for `n == 0`, and when the current
    /// hour has no matching sample (e.g. the clock has moved past the
    /// window's coverage). Pure query, safe to call every cycle.
    pub fn is_cheap_hour(&self, now: NaiveDateTime, n: u32) -> bool {
        let Some(current_hour) = truncate_to_hour(now) else {
            return false;
        };
        self.cheapest_hours(n)
            .iter()
            .any(|sample| sample.starts_at == current_hour)
    }
}

/// Zero out minutes, seconds and sub-seconds
fn truncate_to_hour(now: NaiveDateTime) -> Option<NaiveDateTime> {
    now.date().and_hms_opt(now.hour(), 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn normalize_anchors_today_and_tomorrow() {
        let forecast = PriceForecast {
            today: vec![1.0, 2.0],
            tomorrow: vec![3.0],
        };
        let window = PriceWindow::normalize(&forecast, at(10, 14, 37));

        assert_eq!(window.len(), 3);
        assert_eq!(window.samples()[0].starts_at, at(10, 0, 0));
        assert_eq!(window.samples()[1].starts_at, at(10, 1, 0));
        assert_eq!(window.samples()[2].starts_at, at(11, 0, 0));
        assert_eq!(window.samples()[2].total, 3.0);
    }

    #[test]
    fn normalize_empty_inputs_yield_empty_window() {
        let window = PriceWindow::normalize(&PriceForecast::default(), at(10, 8, 0));
        assert!(window.is_empty());
    }

    #[test]
    fn normalize_is_time_ordered() {
        let forecast = PriceForecast {
            today: (0..24).map(|h| h as f64).collect(),
            tomorrow: (0..24).map(|h| h as f64).collect(),
        };
        let window = PriceWindow::normalize(&forecast, at(10, 0, 0));
        assert_eq!(window.len(), 48);
        for pair in window.samples().windows(2) {
            assert!(pair[0].starts_at < pair[1].starts_at);
        }
    }

    #[test]
    fn cheapest_hours_selects_lowest_prices() {
        let forecast = PriceForecast {
            today: vec![10.0, 4.0, 8.0, 2.0, 6.0],
            tomorrow: vec![],
        };
        let window = PriceWindow::normalize(&forecast, at(10, 0, 0));
        let selected = window.cheapest_hours(2);

        assert_eq!(selected.len(), 2);
        let max_selected = selected.iter().map(|s| s.total).fold(f64::MIN, f64::max);
        for sample in window.samples() {
            if !selected.iter().any(|s| s.starts_at == sample.starts_at) {
                assert!(sample.total >= max_selected);
            }
        }
    }

    #[test]
    fn cheapest_hours_clamps_to_available_samples() {
        let forecast = PriceForecast {
            today: vec![5.0, 6.0],
            tomorrow: vec![],
        };
        let window = PriceWindow::normalize(&forecast, at(10, 0, 0));
        assert_eq!(window.cheapest_hours(10).len(), 2);
    }

    #[test]
    fn cheapest_hours_tie_break_is_stable() {
        let forecast = PriceForecast {
            today: vec![5.0, 5.0, 5.0, 5.0],
            tomorrow: vec![],
        };
        let window = PriceWindow::normalize(&forecast, at(10, 0, 0));
        let selected = window.cheapest_hours(2);
        // Equal prices keep their original time order
        assert_eq!(selected[0].starts_at, at(10, 0, 0));
        assert_eq!(selected[1].starts_at, at(10, 1, 0));
    }

    #[test]
    fn is_cheap_hour_matches_current_hour() {
        let forecast = PriceForecast {
            today: vec![10.0, 10.0, 10.0, 5.0, 10.0],
            tomorrow: vec![],
        };
        let window = PriceWindow::normalize(&forecast, at(10, 3, 0));

        assert!(window.is_cheap_hour(at(10, 3, 42), 1));
        assert!(!window.is_cheap_hour(at(10, 2, 0), 1));
    }

    #[test]
    fn is_cheap_hour_false_for_empty_window_or_zero_n() {
        let empty = PriceWindow::default();
        assert!(!empty.is_cheap_hour(at(10, 3, 0), 3));

        let forecast = PriceForecast {
            today: vec![1.0, 2.0],
            tomorrow: vec![],
        };
        let window = PriceWindow::normalize(&forecast, at(10, 0, 0));
        assert!(!window.is_cheap_hour(at(10, 0, 0), 0));
    }

    #[test]
    fn is_cheap_hour_false_outside_coverage() {
        let forecast = PriceForecast {
            today: vec![1.0, 2.0, 3.0],
            tomorrow: vec![],
        };
        let window = PriceWindow::normalize(&forecast, at(10, 0, 0));
        // Hour 7 has no sample in the window
        assert!(!window.is_cheap_hour(at(10, 7, 0), 3));
    }

    #[test]
    fn tomorrow_absent_yields_today_only_window() {
        let forecast = PriceForecast {
            today: (0..24).map(|h| if h == 5 { 1.0 } else { 9.0 }).collect(),
            tomorrow: vec![],
        };
        let window = PriceWindow::normalize(&forecast, at(10, 5, 30));
        assert_eq!(window.len(), 24);
        assert!(window.is_cheap_hour(at(10, 5, 30), 1));
    }
}
