/// Value-axis domain for a bar chart.
///
/// Bars always start at zero, so the domain includes 0. The far end gets
/// extra room so value labels above the bars stay inside the plot.
pub fn value_domain(values: &[f64]) -> (f64, f64) {
    let mut min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min > 0.0 { min = 0.0; }
    if max < 0.0 { max = 0.0; }

    pad_range(min, max)
}

fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min, max + 1.0)
    } else {
        let padding = (max - min) * 0.1;
        let lo = if min < 0.0 { min - padding } else { min };
        let hi = if max > 0.0 { max + padding } else { max };
        (lo, hi)
    }
}

/// Roughly `target` evenly spaced ticks on 1/2/5 multiples covering `lo..=hi`.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    if !(hi > lo) || target == 0 {
        return vec![lo];
    }
    let raw = (hi - lo) / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

/// Tick text without float noise: `2`, `0.5`, `1250`
pub fn format_tick(value: f64) -> String {
    let rounded = (value * 1e6).round() / 1e6;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_domain_includes_zero() {
        let (lo, hi) = value_domain(&[5.0, 10.0]);
        assert_eq!(lo, 0.0);
        assert!(hi > 10.0);
    }

    #[test]
    fn test_value_domain_negative() {
        let (lo, hi) = value_domain(&[-4.0, -2.0]);
        assert!(lo < -4.0);
        assert_eq!(hi, 0.0);
    }

    #[test]
    fn test_value_domain_single_zero() {
        assert_eq!(value_domain(&[0.0]), (0.0, 1.0));
        assert_eq!(value_domain(&[]), (0.0, 1.0));
    }

    #[test]
    fn test_nice_ticks() {
        assert_eq!(nice_ticks(0.0, 10.0, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(nice_ticks(0.0, 1.1, 5), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(2.0), "2");
        assert_eq!(format_tick(0.5), "0.5");
        assert_eq!(format_tick(0.1 + 0.2), "0.3");
    }
}
