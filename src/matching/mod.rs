//! Exhaustive template matching.
//!
//! [`match_template`] slides the template over every offset where it fits
//! entirely inside the source and scores each offset with one of six
//! metrics. [`locate`] picks the best offset; [`find_matches`] returns several
//! ranked, spatially separated matches.
//!
//! Sums are accumulated in `f64` and stored as `f32`. Multi-channel rasters
//! are scored by summing over channels.

mod candidates;
mod plan;

use std::fmt;
use std::str::FromStr;

use crate::image::{Channels, RasterF32, RasterU8, Rect};
use crate::trace::{trace_event, trace_span};
use crate::util::par::fill_rows;
use crate::util::{RasterError, RasterResult};
use candidates::{nms_2d, Peak, TopK};
use plan::TemplatePlan;

const DENOM_EPS: f64 = 1e-9;

/// Similarity metric for template matching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchMethod {
    /// Sum of squared differences; lower is better.
    SqDiff,
    /// Squared differences over `sqrt(sum T² * sum I²)`; lower is better.
    SqDiffNormed,
    /// Raw cross-correlation.
    CCorr,
    /// Cross-correlation over `sqrt(sum T² * sum I²)`.
    CCorrNormed,
    /// Correlation of mean-removed template and window.
    CCoeff,
    /// Zero-mean normalized cross-correlation in `[-1, 1]`.
    #[default]
    CCoeffNormed,
}

impl MatchMethod {
    /// Every method, in declaration order.
    pub const ALL: [MatchMethod; 6] = [
        MatchMethod::SqDiff,
        MatchMethod::SqDiffNormed,
        MatchMethod::CCorr,
        MatchMethod::CCorrNormed,
        MatchMethod::CCoeff,
        MatchMethod::CCoeffNormed,
    ];

    /// True when lower scores are better.
    pub fn minimizes(self) -> bool {
        matches!(self, MatchMethod::SqDiff | MatchMethod::SqDiffNormed)
    }

    /// Canonical name, as accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            MatchMethod::SqDiff => "sqdiff",
            MatchMethod::SqDiffNormed => "sqdiff_normed",
            MatchMethod::CCorr => "ccorr",
            MatchMethod::CCorrNormed => "ccorr_normed",
            MatchMethod::CCoeff => "ccoeff",
            MatchMethod::CCoeffNormed => "ccoeff_normed",
        }
    }

    fn rank_key(self, score: f32) -> f32 {
        if self.minimizes() {
            -score
        } else {
            score
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatchMethod {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match key.strip_prefix("tm").unwrap_or(&key) {
            "sqdiff" => Ok(MatchMethod::SqDiff),
            "sqdiffnormed" => Ok(MatchMethod::SqDiffNormed),
            "ccorr" => Ok(MatchMethod::CCorr),
            "ccorrnormed" => Ok(MatchMethod::CCorrNormed),
            "ccoeff" => Ok(MatchMethod::CCoeff),
            "ccoeffnormed" => Ok(MatchMethod::CCoeffNormed),
            _ => Err(RasterError::unsupported("method", "unknown template matching method")),
        }
    }
}

/// A located match: top-left offset, score and the covered rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub x: usize,
    pub y: usize,
    pub score: f32,
    pub bbox: Rect,
}

impl MatchResult {
    fn new(x: usize, y: usize, score: f32, tpl_width: usize, tpl_height: usize) -> Self {
        Self {
            x,
            y,
            score,
            bbox: Rect {
                x,
                y,
                width: tpl_width,
                height: tpl_height,
            },
        }
    }
}

/// Scores every offset where `tpl` fits inside `src`.
///
/// The score map is single-channel with size `(W - w + 1) x (H - h + 1)`;
/// entry `(x, y)` scores the template's top-left corner placed at `(x, y)`.
pub fn match_template(
    src: &RasterU8,
    tpl: &RasterU8,
    method: MatchMethod,
) -> RasterResult<RasterF32> {
    if src.channels() != tpl.channels() {
        return Err(RasterError::unsupported(
            "template",
            "template and source channel counts differ",
        ));
    }
    if tpl.width() > src.width() || tpl.height() > src.height() {
        return Err(RasterError::TemplateTooLarge {
            tpl_width: tpl.width(),
            tpl_height: tpl.height(),
            img_width: src.width(),
            img_height: src.height(),
        });
    }
    let _span = trace_span!(
        "match_template",
        method = method.name(),
        tpl_width = tpl.width(),
        tpl_height = tpl.height()
    )
    .entered();

    let plan = TemplatePlan::new(tpl);
    let out_w = src.width() - tpl.width() + 1;
    let out_h = src.height() - tpl.height() + 1;
    let mut scores = vec![0.0f32; out_w * out_h];
    fill_rows(&mut scores, out_w, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = score_at(src, &plan, method, x, y) as f32;
        }
    });
    Ok(RasterF32::from_parts(scores, out_w, out_h, Channels::Gray))
}

fn score_at(src: &RasterU8, plan: &TemplatePlan, method: MatchMethod, x: usize, y: usize) -> f64 {
    let cn = plan.channels();
    let tw = plan.width();
    let row_elems = tw * cn;
    let src_row_len = src.row_len();
    let data = src.data();
    let tpl = plan.values();
    let tpl_zm = plan.zero_mean();

    let mut sq_diff = 0.0f64;
    let mut cross = 0.0f64;
    let mut cross_zm = 0.0f64;
    let mut win_sq = 0.0f64;
    let mut win_sum = [0.0f64; 3];

    for ty in 0..plan.height() {
        let start = (y + ty) * src_row_len + x * cn;
        let window = &data[start..start + row_elems];
        let base = ty * row_elems;
        for (i, &v) in window.iter().enumerate() {
            let iv = f64::from(v);
            let tv = tpl[base + i];
            let d = tv - iv;
            sq_diff += d * d;
            cross += tv * iv;
            cross_zm += tpl_zm[base + i] * iv;
            win_sq += iv * iv;
            win_sum[i % cn] += iv;
        }
    }

    let count = (tw * plan.height()) as f64;
    match method {
        MatchMethod::SqDiff => sq_diff,
        MatchMethod::CCorr => cross,
        MatchMethod::CCoeff => cross_zm,
        MatchMethod::SqDiffNormed => {
            let denom = (plan.sum_sq() * win_sq).sqrt();
            if denom <= DENOM_EPS {
                if sq_diff <= DENOM_EPS {
                    0.0
                } else {
                    1.0
                }
            } else {
                sq_diff / denom
            }
        }
        MatchMethod::CCorrNormed => {
            let denom = (plan.sum_sq() * win_sq).sqrt();
            if denom <= DENOM_EPS {
                0.0
            } else {
                (cross / denom).min(1.0)
            }
        }
        MatchMethod::CCoeffNormed => {
            let win_sum_sq: f64 = win_sum[..cn].iter().map(|s| s * s).sum();
            let win_var = (win_sq - win_sum_sq / count).max(0.0);
            let denom = (plan.zero_mean_sum_sq() * win_var).sqrt();
            if denom <= DENOM_EPS {
                0.0
            } else {
                (cross_zm / denom).clamp(-1.0, 1.0)
            }
        }
    }
}

fn ensure_score_map(score_map: &RasterF32, tpl_width: usize, tpl_height: usize) -> RasterResult<()> {
    score_map.ensure_gray("score_map")?;
    if tpl_width == 0 || tpl_height == 0 {
        return Err(RasterError::InvalidInput {
            reason: "template dimensions must be positive",
        });
    }
    Ok(())
}

/// Selects the best offset of a score map: the minimum for the
/// squared-difference metrics, the maximum otherwise. Ties resolve to the
/// first offset in row-major order.
pub fn locate(
    score_map: &RasterF32,
    method: MatchMethod,
    tpl_width: usize,
    tpl_height: usize,
) -> RasterResult<MatchResult> {
    ensure_score_map(score_map, tpl_width, tpl_height)?;
    let w = score_map.width();
    let mut best_idx = 0usize;
    let mut best_key = method.rank_key(score_map.data()[0]);
    for (idx, &score) in score_map.data().iter().enumerate().skip(1) {
        let key = method.rank_key(score);
        if key > best_key {
            best_key = key;
            best_idx = idx;
        }
    }
    let score = score_map.data()[best_idx];
    trace_event!("best_match", score = score, x = best_idx % w, y = best_idx / w);
    Ok(MatchResult::new(best_idx % w, best_idx / w, score, tpl_width, tpl_height))
}

/// Scores and locates the single best match.
pub fn find_template(
    src: &RasterU8,
    tpl: &RasterU8,
    method: MatchMethod,
) -> RasterResult<(RasterF32, MatchResult)> {
    let scores = match_template(src, tpl, method)?;
    let best = locate(&scores, method, tpl.width(), tpl.height())?;
    Ok((scores, best))
}

/// Returns up to `max_matches` ranked matches.
///
/// Candidates are the local extrema of the score map (3x3 neighborhood,
/// oriented by the metric). They are ranked best first and greedily
/// suppressed when within `nms_radius` (Chebyshev) of a better kept match.
pub fn find_matches(
    score_map: &RasterF32,
    method: MatchMethod,
    tpl_width: usize,
    tpl_height: usize,
    max_matches: usize,
    nms_radius: usize,
) -> RasterResult<Vec<MatchResult>> {
    ensure_score_map(score_map, tpl_width, tpl_height)?;
    if max_matches == 0 {
        return Ok(Vec::new());
    }

    // Greedy suppression keeps the k-th match after visiting at most
    // k * (2r + 1)^2 candidates, so the best that many are sufficient.
    let window = radius_window(nms_radius);
    let capacity = max_matches
        .saturating_mul(window)
        .min(score_map.data().len());
    let mut topk = TopK::new(capacity);

    let w = score_map.width();
    let h = score_map.height();
    let data = score_map.data();
    let key_at = |x: usize, y: usize| method.rank_key(data[y * w + x]);
    for y in 0..h {
        for x in 0..w {
            let key = key_at(x, y);
            let is_peak = (y.saturating_sub(1)..(y + 2).min(h)).all(|ny| {
                (x.saturating_sub(1)..(x + 2).min(w)).all(|nx| key_at(nx, ny) <= key)
            });
            if is_peak {
                topk.push(Peak {
                    x,
                    y,
                    score: data[y * w + x],
                    key,
                });
            }
        }
    }

    let mut peaks = topk.into_sorted_desc();
    let kept = nms_2d(&mut peaks, nms_radius, max_matches);
    trace_event!("matches_found", count = kept.len());
    Ok(kept
        .into_iter()
        .map(|p| MatchResult::new(p.x, p.y, p.score, tpl_width, tpl_height))
        .collect())
}

fn radius_window(radius: usize) -> usize {
    let side = radius.saturating_mul(2).saturating_add(1);
    side.saturating_mul(side)
}

#[cfg(test)]
mod tests {
    use super::{find_matches, find_template, locate, match_template, MatchMethod};
    use crate::image::{RasterF32, RasterU8};
    use crate::util::RasterError;

    fn patterned(width: usize, height: usize) -> RasterU8 {
        let data = (0..width * height)
            .map(|i| ((i * 37 + (i / width) * 11) % 251) as u8)
            .collect();
        RasterU8::gray(data, width, height).unwrap()
    }

    fn crop(src: &RasterU8, x0: usize, y0: usize, w: usize, h: usize) -> RasterU8 {
        let mut data = Vec::with_capacity(w * h);
        for y in y0..y0 + h {
            data.extend_from_slice(&src.row(y).unwrap()[x0..x0 + w]);
        }
        RasterU8::gray(data, w, h).unwrap()
    }

    #[test]
    fn exact_copy_scores_perfectly() {
        let src = patterned(16, 14);
        let tpl = crop(&src, 3, 5, 4, 4);

        let (scores, best) = find_template(&src, &tpl, MatchMethod::SqDiff).unwrap();
        assert_eq!((scores.width(), scores.height()), (13, 11));
        assert_eq!((best.x, best.y), (3, 5));
        assert_eq!(best.score, 0.0);

        let (_, best) = find_template(&src, &tpl, MatchMethod::CCoeffNormed).unwrap();
        assert_eq!((best.x, best.y), (3, 5));
        assert!((best.score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn template_larger_than_source_fails() {
        let src = RasterU8::gray(vec![0; 9], 3, 3).unwrap();
        let tpl = RasterU8::gray(vec![0; 8], 4, 2).unwrap();
        let err = match_template(&src, &tpl, MatchMethod::CCorr).unwrap_err();
        assert_eq!(
            err,
            RasterError::TemplateTooLarge {
                tpl_width: 4,
                tpl_height: 2,
                img_width: 3,
                img_height: 3
            }
        );
    }

    #[test]
    fn flat_windows_score_zero_for_normalized_correlation() {
        let src = RasterU8::gray(vec![0; 25], 5, 5).unwrap();
        let tpl = RasterU8::gray(vec![0; 4], 2, 2).unwrap();
        for method in [MatchMethod::CCorrNormed, MatchMethod::CCoeffNormed, MatchMethod::SqDiffNormed] {
            let scores = match_template(&src, &tpl, method).unwrap();
            assert!(scores.data().iter().all(|&s| s == 0.0), "{method:?}");
        }
    }

    #[test]
    fn locate_breaks_ties_in_row_major_order() {
        let map = RasterF32::gray(vec![0.1, 0.9, 0.9, 0.9], 2, 2).unwrap();
        let best = locate(&map, MatchMethod::CCorr, 3, 3).unwrap();
        assert_eq!((best.x, best.y), (1, 0));
        assert_eq!(best.bbox.width, 3);
        let best = locate(&map, MatchMethod::SqDiff, 3, 3).unwrap();
        assert_eq!((best.x, best.y), (0, 0));
    }

    #[test]
    fn find_matches_returns_separated_peaks() {
        let mut data = vec![0.0f32; 20 * 10];
        data[2 * 20 + 3] = 0.9;
        data[2 * 20 + 4] = 0.8;
        data[7 * 20 + 15] = 0.7;
        let map = RasterF32::gray(data, 20, 10).unwrap();
        let found = find_matches(&map, MatchMethod::CCoeffNormed, 4, 4, 5, 2).unwrap();
        let positions: Vec<_> = found.iter().map(|m| (m.x, m.y)).collect();
        assert_eq!(positions[..2], [(3, 2), (15, 7)]);
        assert!(find_matches(&map, MatchMethod::CCoeffNormed, 4, 4, 0, 2)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn method_names_parse() {
        for method in MatchMethod::ALL {
            assert_eq!(method.name().parse::<MatchMethod>().unwrap(), method);
        }
        assert_eq!("TM_CCORR_NORMED".parse::<MatchMethod>().unwrap(), MatchMethod::CCorrNormed);
        assert!("nearest".parse::<MatchMethod>().is_err());
    }
}
