//! RSI (Relative Strength Index).
//!
//! Gains and losses are smoothed with the non-adjusted EMA (k = 2/(n+1)) rather
//! than Wilder's running mean:
//! - delta[0] = 0, delta[i] = C[i] - C[i-1]
//! - avg_gain = EMA(max(delta, 0)), avg_loss = EMA(max(-delta, 0))
//! - RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//!
//! avg_loss == 0 gives 100 when there were gains and `None` when the series
//! never moved. The first n outputs are always `None`, and a series shorter
//! than n+1 points yields `None` everywhere.

use tracing::debug;

use crate::domain::indicator::ema::ema;

pub fn calculate_rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || prices.len() < period + 1 {
        debug!(
            period,
            points = prices.len(),
            "insufficient data points for RSI"
        );
        return vec![None; prices.len()];
    }

    let mut gains = Vec::with_capacity(prices.len());
    let mut losses = Vec::with_capacity(prices.len());
    gains.push(0.0);
    losses.push(0.0);

    for pair in prices.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gains = ema(&gains, period);
    let avg_losses = ema(&losses, period);

    avg_gains
        .iter()
        .zip(&avg_losses)
        .enumerate()
        .map(|(i, (&avg_gain, &avg_loss))| {
            if i < period {
                None
            } else {
                relative_strength_index(avg_gain, avg_loss)
            }
        })
        .collect()
}

fn relative_strength_index(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { Some(100.0) } else { None }
    } else {
        Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_insufficient_points_all_none() {
        let out = calculate_rsi(&[1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(out, vec![None; 4]);
    }

    #[test]
    fn rsi_zero_period_all_none() {
        let out = calculate_rsi(&[1.0, 2.0, 3.0], 0);
        assert_eq!(out, vec![None; 3]);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + (i % 5) as f64 * 2.0).collect();
        let out = calculate_rsi(&prices, 14);
        for (i, value) in out.iter().enumerate().take(14) {
            assert!(value.is_none(), "index {} should be None", i);
        }
        assert!(out[14].is_some());
    }

    #[test]
    fn rsi_hand_computed_values() {
        // k = 2/3; gains 0,2,0,3 and losses 0,0,1,0
        // avg_gain[2] = 4/9, avg_loss[2] = 2/3 -> RS = 2/3 -> 40
        // avg_gain[3] = 58/27, avg_loss[3] = 2/9 -> RS = 29/3 -> 90.625
        let out = calculate_rsi(&[100.0, 102.0, 101.0, 104.0], 2);
        assert!(out[0].is_none());
        assert!(out[1].is_none());
        assert_relative_eq!(out[2].unwrap(), 40.0, epsilon = 1e-9);
        assert_relative_eq!(out[3].unwrap(), 90.625, epsilon = 1e-9);
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let out = calculate_rsi(&prices, 6);
        assert_relative_eq!(out[14].unwrap(), 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let out = calculate_rsi(&prices, 6);
        assert_relative_eq!(out[14].unwrap(), 0.0);
    }

    #[test]
    fn rsi_flat_series_undefined() {
        let out = calculate_rsi(&[50.0; 10], 3);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_descending_series_hits_zero() {
        let prices = [100.0, 95.0, 90.0, 85.0, 80.0, 75.0, 70.0];
        let out = calculate_rsi(&prices, 4);
        assert_eq!(&out[..4], &[None, None, None, None]);
        for value in &out[4..] {
            assert_relative_eq!(value.unwrap(), 0.0);
        }
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=40)
            .map(|i| 100.0 + ((i * 7) % 11) as f64 - 5.0)
            .collect();
        for period in [6, 12, 24] {
            for value in calculate_rsi(&prices, period).into_iter().flatten() {
                assert!((0.0..=100.0).contains(&value), "RSI {} out of range", value);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_rsi_bounded_and_warmup_null(
            prices in prop::collection::vec(1.0f64..1000.0, 0..80),
            period in 1usize..30,
        ) {
            let out = calculate_rsi(&prices, period);
            prop_assert_eq!(out.len(), prices.len());
            for (i, value) in out.iter().enumerate() {
                if i < period {
                    prop_assert!(value.is_none());
                }
                if let Some(v) = value {
                    prop_assert!((0.0..=100.0).contains(v));
                }
            }
        }
    }
}
