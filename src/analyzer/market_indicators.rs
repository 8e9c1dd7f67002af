// Windowed indicators over a price series, oldest point first.
//
// Every function returns one value per point that has a full window behind it,
// so the last element always corresponds to the newest price.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBand {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

pub struct MarketIndicators;

impl MarketIndicators {
    /// Calculates the moving average of a slice of data with the given window size.
    pub fn moving_average(data: &[f64], window_size: usize) -> Vec<f64> {
        if window_size == 0 || data.len() < window_size {
            return Vec::new();
        }
        data.windows(window_size)
            .map(|window| window.iter().sum::<f64>() / window_size as f64)
            .collect()
    }

    /// Recursive exponential moving average seeded with the first value,
    /// `alpha = 2 / (span + 1)`. Points before the `span`-th are withheld.
    pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
        if span == 0 || data.len() < span {
            return Vec::new();
        }
        let alpha = 2.0 / (span as f64 + 1.0);
        Self::smooth(data, alpha).split_off(span - 1)
    }

    fn smooth(data: &[f64], alpha: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(data.len());
        let mut prev: Option<f64> = None;
        for &x in data {
            let next = match prev {
                Some(p) => alpha * x + (1.0 - alpha) * p,
                None => x,
            };
            out.push(next);
            prev = Some(next);
        }
        out
    }

    /// Relative Strength Index with Wilder smoothing (`alpha = 1 / window`).
    ///
    /// Gains and losses start at zero for the first point. The value is 100 when
    /// the smoothed loss is zero.
    pub fn compute_rsi(prices: &[f64], window: usize) -> Vec<f64> {
        if window == 0 || prices.len() < window {
            return Vec::new();
        }

        let mut gains = Vec::with_capacity(prices.len());
        let mut losses = Vec::with_capacity(prices.len());
        gains.push(0.0);
        losses.push(0.0);
        for w in prices.windows(2) {
            let delta = w[1] - w[0];
            gains.push(delta.max(0.0));
            losses.push((-delta).max(0.0));
        }

        let alpha = 1.0 / window as f64;
        let avg_gain = Self::smooth(&gains, alpha);
        let avg_loss = Self::smooth(&losses, alpha);

        avg_gain
            .iter()
            .zip(avg_loss.iter())
            .skip(window - 1)
            .map(|(&g, &l)| {
                if l == 0.0 {
                    100.0
                } else {
                    let rs = g / l;
                    100.0 - (100.0 / (1.0 + rs))
                }
            })
            .collect()
    }

    /// MACD line: fast EMA minus slow EMA, from the point where both are defined.
    /// Empty until the series holds `slow` points.
    pub fn macd(prices: &[f64], fast: usize, slow: usize) -> Vec<f64> {
        let fast_ema = Self::ema(prices, fast);
        let slow_ema = Self::ema(prices, slow);
        let offset = fast_ema.len().saturating_sub(slow_ema.len());
        fast_ema[offset..]
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect()
    }

    /// Bollinger bands: rolling mean with `dev` population standard deviations either side.
    pub fn bollinger(prices: &[f64], window: usize, dev: f64) -> Vec<BollingerBand> {
        if window == 0 || prices.len() < window {
            return Vec::new();
        }
        prices
            .windows(window)
            .map(|w| {
                let mid = w.iter().sum::<f64>() / window as f64;
                let variance = w.iter().map(|p| (p - mid).powi(2)).sum::<f64>() / window as f64;
                let spread = dev * variance.sqrt();
                BollingerBand {
                    upper: mid + spread,
                    mid,
                    lower: mid - spread,
                }
            })
            .collect()
    }
}
