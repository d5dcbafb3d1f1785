//! Descriptive and inferential statistics for the analysis reports.
//!
//! Self-contained ports of the routines the report commands consume:
//! descriptives, one-way ANOVA with an incomplete-beta p approximation,
//! product-moment and rank correlation, and simple linear regression.
//! Degenerate inputs yield `None` rather than NaN.

/// Descriptive statistics over a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Descriptive {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1 denominator); 0 for n < 2.
    pub sd: f64,
    /// Standard error of the mean; 0 for n < 2.
    pub se: f64,
    pub min: f64,
    pub max: f64,
}

/// Computes descriptives; `None` for an empty sample.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "sample sizes are small")]
pub fn describe(values: &[f64]) -> Option<Descriptive> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let nf = n as f64;
    let mean = values.iter().sum::<f64>() / nf;
    let (sd, se) = if n > 1 {
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (nf - 1.0);
        let sd = variance.sqrt();
        (sd, sd / nf.sqrt())
    } else {
        (0.0, 0.0)
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(Descriptive {
        n,
        mean,
        sd,
        se,
        min,
        max,
    })
}

/// One-way ANOVA decomposition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anova {
    pub f: f64,
    pub p: f64,
    pub ss_between: f64,
    pub ss_within: f64,
    pub df_between: usize,
    pub df_within: usize,
    /// Eta-squared effect size: SS_between / SS_total.
    pub eta_squared: f64,
}

impl Anova {
    /// Conventional effect-size label for eta-squared.
    #[must_use]
    pub fn effect_size_label(&self) -> &'static str {
        if self.eta_squared < 0.01 {
            "negligible"
        } else if self.eta_squared < 0.06 {
            "small"
        } else if self.eta_squared < 0.14 {
            "medium"
        } else {
            "large"
        }
    }
}

/// One-way ANOVA over two or more groups.
///
/// Returns `None` when a group is empty or there are not enough
/// observations for within-group degrees of freedom.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "sample sizes are small")]
pub fn one_way_anova(groups: &[Vec<f64>]) -> Option<Anova> {
    let k = groups.len();
    if k < 2 || groups.iter().any(Vec::is_empty) {
        return None;
    }
    let n_total: usize = groups.iter().map(Vec::len).sum();
    if n_total <= k {
        return None;
    }

    let grand_sum: f64 = groups.iter().flatten().sum();
    let grand_mean = grand_sum / n_total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let gn = group.len() as f64;
        let group_mean = group.iter().sum::<f64>() / gn;
        ss_between += gn * (group_mean - grand_mean).powi(2);
        ss_within += group.iter().map(|x| (x - group_mean).powi(2)).sum::<f64>();
    }

    let df_between = k - 1;
    let df_within = n_total - k;
    let msb = ss_between / df_between as f64;
    let msw = ss_within / df_within as f64;
    let f = if msw > 0.0 { msb / msw } else { 0.0 };
    let p = f_to_p(f, df_between as f64, df_within as f64);

    let ss_total = ss_between + ss_within;
    let eta_squared = if ss_total > 0.0 {
        ss_between / ss_total
    } else {
        0.0
    };

    Some(Anova {
        f,
        p,
        ss_between,
        ss_within,
        df_between,
        df_within,
        eta_squared,
    })
}

/// A correlation with its two-tailed significance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p: f64,
    pub n: usize,
}

/// Pearson product-moment correlation over paired observations.
///
/// Pairs with either value missing are excluded by the caller; `None`
/// for fewer than 3 pairs or a zero-variance side.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "sample sizes are small")]
pub fn pearson(x: &[f64], y: &[f64]) -> Option<Correlation> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    let x = &x[..n];
    let y = &y[..n];
    let nf = n as f64;

    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let cov: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum::<f64>()
        / (nf - 1.0);
    let var_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum::<f64>() / (nf - 1.0);
    let var_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum::<f64>() / (nf - 1.0);

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    let p = if r.abs() >= 1.0 {
        0.0
    } else {
        let df = nf - 2.0;
        let t = r * (df / (1.0 - r * r)).sqrt();
        2.0 * (1.0 - t_cdf(t.abs(), df))
    };

    Some(Correlation { r, p, n })
}

/// Spearman rank correlation: Pearson over rank transforms.
#[must_use]
pub fn spearman(x: &[f64], y: &[f64]) -> Option<Correlation> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    pearson(&rank(&x[..n]), &rank(&y[..n]))
}

/// Ordinal ranks starting at 1. Ties take their positional rank.
#[expect(clippy::cast_precision_loss, reason = "sample sizes are small")]
fn rank(values: &[f64]) -> Vec<f64> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    for (position, &index) in indices.iter().enumerate() {
        ranks[index] = (position + 1) as f64;
    }
    ranks
}

/// Simple linear regression fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub se_slope: f64,
    pub t: f64,
    pub p: f64,
    pub n: usize,
}

/// Least-squares regression of y on x.
///
/// `None` for fewer than 3 pairs or constant x.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "sample sizes are small")]
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<Regression> {
    let n = x.len().min(y.len());
    if n < 3 {
        return None;
    }
    let x = &x[..n];
    let y = &y[..n];
    let nf = n as f64;

    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let sxx: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    if sxx <= 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(xi, yi)| (yi - (slope * xi + intercept)).powi(2))
        .sum();
    let ss_tot: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    };

    let mse = ss_res / (nf - 2.0);
    let se_slope = (mse / sxx).sqrt();
    let (t, p) = if se_slope > 0.0 {
        let t = slope / se_slope;
        (t, 2.0 * (1.0 - t_cdf(t.abs(), nf - 2.0)))
    } else {
        // Perfect fit: an exact slope has vanishing standard error.
        (0.0, 0.0)
    };

    Some(Regression {
        slope,
        intercept,
        r_squared,
        se_slope,
        t,
        p,
        n,
    })
}

/// Significance marker for report tables.
#[must_use]
pub fn significance_marker(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        ""
    }
}

// ===== Distribution helpers =====

/// Upper-tail p for an F statistic via the regularized incomplete beta.
#[must_use]
pub fn f_to_p(f: f64, df1: f64, df2: f64) -> f64 {
    if f <= 0.0 {
        return 1.0;
    }
    let x = df1 * f / (df1 * f + df2);
    1.0 - regularized_incomplete_beta(df1 / 2.0, df2 / 2.0, x)
}

/// CDF of Student's t at `t >= 0` via the incomplete beta.
fn t_cdf(t: f64, df: f64) -> f64 {
    let x = df / (df + t * t);
    1.0 - 0.5 * regularized_incomplete_beta(df / 2.0, 0.5, x)
}

/// Lanczos approximation of `ln Gamma(z)`.
fn log_gamma(z: f64) -> f64 {
    if z < 0.5 {
        // Reflection formula.
        return (std::f64::consts::PI / (std::f64::consts::PI * z).sin()).ln() - log_gamma(1.0 - z);
    }
    const COEFFS: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        1.208_650_973_866_179e-3,
        -5.395_239_384_953e-6,
    ];
    let z = z - 1.0;
    let mut x = 1.000_000_000_190_015;
    for (i, c) in COEFFS.iter().enumerate() {
        x += c / (z + (i + 1) as f64);
    }
    let t = z + 5.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (z + 0.5) * t.ln() - t + x.ln()
}

/// Regularized incomplete beta `I_x(a, b)` by continued fraction.
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    // Use the symmetry relation where the continued fraction converges faster.
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(b, a, 1.0 - x);
    }

    let log_beta = log_gamma(a) + log_gamma(b) - log_gamma(a + b);
    let front = (a * x.ln() + b * (1.0 - x).ln() - log_beta).exp() / a;

    const TINY: f64 = 1e-30;
    const EPS: f64 = 1e-10;

    let mut f = 1.0;
    let mut c = 1.0;
    let mut d = 0.0;

    for m in 0..200 {
        let numerator = if m == 0 {
            1.0
        } else if m % 2 == 1 {
            let k = f64::from((m - 1) / 2);
            -(a + k) * (a + b + k) * x / ((a + 2.0 * k) * (a + 2.0 * k + 1.0))
        } else {
            let k = f64::from(m / 2);
            k * (b - k) * x / ((a + 2.0 * k - 1.0) * (a + 2.0 * k))
        };

        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        d = 1.0 / d;
        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }
        let delta = c * d;
        f *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    front * f
}
