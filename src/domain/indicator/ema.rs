//! Exponential Moving Average.
//!
//! Non-adjusted recursion: k = 2/(span+1), EMA[0] = X[0],
//! EMA[i] = X[i]*k + EMA[i-1]*(1-k). No warmup suppression happens here;
//! callers null out the leading values their indicator considers undefined.

pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let Some((&first, rest)) = values.split_first() else {
        return Vec::new();
    };

    let k = smoothing_factor(span);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = first;
    out.push(prev);

    for &x in rest {
        prev = x * k + prev * (1.0 - k);
        out.push(prev);
    }

    out
}
