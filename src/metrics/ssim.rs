//! Windowed structural similarity (SSIM) on the luminance plane.
//!
//! Local statistics come from a uniform `window`×`window` box that slides one
//! pixel at a time. Variances and covariance use the sample normalisation
//! `N / (N - 1)`. The image score is the mean of the per-window index over
//! every position where the window fits entirely inside the image, so no
//! border padding is involved.
//!
//! Box sums are accumulated in integers (column sums updated row by row, then
//! a horizontal slide), which keeps the memory footprint at one image row and
//! makes identical inputs score exactly `1.0`.

use imgref::ImgRef;

use super::{FidelityComparator, ensure_same_dimensions};
use crate::error::{Error, Result};
use crate::image::ImageData;

/// Default window edge length.
pub const DEFAULT_WINDOW: usize = 11;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// SSIM comparator with a uniform window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsimComparator {
    window: usize,
}

impl Default for SsimComparator {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}

impl SsimComparator {
    /// Comparator with the default 11×11 window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Comparator with a custom window. The window must be odd and at least 3.
    pub fn with_window(window: usize) -> Result<Self> {
        if window < 3 || window % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "SSIM window must be odd and >= 3, got {window}"
            )));
        }
        Ok(Self { window })
    }

    /// Window edge length.
    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    /// SSIM between two 8-bit luminance planes of equal size.
    pub fn ssim_luma(&self, reference: ImgRef<'_, u8>, test: ImgRef<'_, u8>) -> Result<f64> {
        let (width, height) = (reference.width(), reference.height());
        if (width, height) != (test.width(), test.height()) {
            return Err(Error::DimensionMismatch {
                expected: (width, height),
                actual: (test.width(), test.height()),
            });
        }
        let win = self.window;
        if width < win || height < win {
            return Err(Error::MetricCalculation {
                metric: "SSIM".to_string(),
                reason: format!("{width}x{height} is smaller than the {win}x{win} window"),
            });
        }

        let ref_rows: Vec<&[u8]> = reference.rows().collect();
        let test_rows: Vec<&[u8]> = test.rows().collect();

        let mut columns = vec![Sums::default(); width];
        for (a, b) in ref_rows.iter().zip(&test_rows).take(win) {
            accumulate_row(&mut columns, a, b, true);
        }

        let stats = WindowStats::new(win);
        let mut total = 0.0_f64;
        let mut count = 0_usize;

        for top in 0..=height - win {
            if top > 0 {
                let bottom = top + win - 1;
                accumulate_row(&mut columns, ref_rows[top - 1], test_rows[top - 1], false);
                accumulate_row(&mut columns, ref_rows[bottom], test_rows[bottom], true);
            }

            let mut window_sums = Sums::default();
            for col in &columns[..win] {
                window_sums.add(col);
            }
            total += stats.index(&window_sums);
            count += 1;

            for left in 1..=width - win {
                window_sums.sub(&columns[left - 1]);
                window_sums.add(&columns[left + win - 1]);
                total += stats.index(&window_sums);
                count += 1;
            }
        }

        Ok((total / count as f64).clamp(0.0, 1.0))
    }
}

impl FidelityComparator for SsimComparator {
    fn name(&self) -> &str {
        "SSIM"
    }

    fn compare(&self, reference: &ImageData, test: &ImageData) -> Result<f64> {
        ensure_same_dimensions(reference, test)?;
        let reference = reference.to_luma();
        let test = test.to_luma();
        self.ssim_luma(reference.as_ref(), test.as_ref())
    }
}

/// Running sums of x, y, x², y² and xy.
#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    x: u64,
    y: u64,
    xx: u64,
    yy: u64,
    xy: u64,
}

impl Sums {
    #[inline]
    fn add(&mut self, other: &Self) {
        self.x += other.x;
        self.y += other.y;
        self.xx += other.xx;
        self.yy += other.yy;
        self.xy += other.xy;
    }

    #[inline]
    fn sub(&mut self, other: &Self) {
        self.x -= other.x;
        self.y -= other.y;
        self.xx -= other.xx;
        self.yy -= other.yy;
        self.xy -= other.xy;
    }
}

fn accumulate_row(columns: &mut [Sums], reference: &[u8], test: &[u8], add: bool) {
    for ((col, &a), &b) in columns.iter_mut().zip(reference).zip(test) {
        let (a, b) = (u64::from(a), u64::from(b));
        let px = Sums {
            x: a,
            y: b,
            xx: a * a,
            yy: b * b,
            xy: a * b,
        };
        if add {
            col.add(&px);
        } else {
            col.sub(&px);
        }
    }
}

/// Per-window SSIM from box sums.
struct WindowStats {
    n: f64,
    cov_norm: f64,
    c1: f64,
    c2: f64,
}

impl WindowStats {
    fn new(window: usize) -> Self {
        let n = (window * window) as f64;
        Self {
            n,
            cov_norm: n / (n - 1.0),
            c1: (K1 * DATA_RANGE).powi(2),
            c2: (K2 * DATA_RANGE).powi(2),
        }
    }

    #[inline]
    fn index(&self, sums: &Sums) -> f64 {
        let ux = sums.x as f64 / self.n;
        let uy = sums.y as f64 / self.n;
        let uxx = sums.xx as f64 / self.n;
        let uyy = sums.yy as f64 / self.n;
        let uxy = sums.xy as f64 / self.n;

        let vx = self.cov_norm * (uxx - ux * ux);
        let vy = self.cov_norm * (uyy - uy * uy);
        let vxy = self.cov_norm * (uxy - ux * uy);

        let a1 = 2.0 * ux * uy + self.c1;
        let a2 = 2.0 * vxy + self.c2;
        let b1 = ux * ux + uy * uy + self.c1;
        let b2 = vx + vy + self.c2;

        (a1 * a2) / (b1 * b2)
    }
}
