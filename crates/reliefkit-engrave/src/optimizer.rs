//! Toolpath travel optimization.
//!
//! Reorders (and where helpful, reverses) cut segments to shorten
//! non-cutting travel between them. Per-segment depth and power are never
//! touched. The number of improvement sweeps follows the requested
//! optimization level.

use crate::planner::OptimizationLevel;
use crate::strategy::Polyline;

/// Squared distance between two points.
#[inline]
fn d2(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    dx * dx + dy * dy
}

#[inline]
fn head(seg: &Polyline) -> (f32, f32) {
    (seg[0].x, seg[0].y)
}

#[inline]
fn tail(seg: &Polyline) -> (f32, f32) {
    let p = seg[seg.len() - 1];
    (p.x, p.y)
}

/// Total non-cutting travel over an ordered segment list, starting from the
/// machine origin.
pub fn travel_distance(segments: &[Polyline]) -> f32 {
    let mut cursor = (0.0, 0.0);
    let mut total = 0.0;
    for seg in segments.iter().filter(|s| !s.is_empty()) {
        total += d2(cursor, head(seg)).sqrt();
        cursor = tail(seg);
    }
    total
}

/// Reorder segments to minimize travel: greedy nearest-neighbor chaining,
/// then bounded 2-opt sweeps at the higher optimization levels.
pub fn optimize(segments: Vec<Polyline>, level: OptimizationLevel) -> Vec<Polyline> {
    let mut remaining: Vec<Polyline> = segments.into_iter().filter(|s| !s.is_empty()).collect();
    if remaining.len() < 2 {
        return remaining;
    }

    let mut ordered: Vec<Polyline> = Vec::with_capacity(remaining.len());
    let mut cursor = (0.0f32, 0.0f32);
    while !remaining.is_empty() {
        let mut best = (0usize, false, f32::MAX);
        for (i, seg) in remaining.iter().enumerate() {
            let forward = d2(cursor, head(seg));
            if forward < best.2 {
                best = (i, false, forward);
            }
            let reversed = d2(cursor, tail(seg));
            if reversed < best.2 {
                best = (i, true, reversed);
            }
        }
        let mut seg = remaining.swap_remove(best.0);
        if best.1 {
            seg.reverse();
        }
        cursor = tail(&seg);
        ordered.push(seg);
    }

    let sweeps = match level {
        OptimizationLevel::Speed => 0,
        OptimizationLevel::Balanced => 1,
        OptimizationLevel::Quality => 4,
    };
    for _ in 0..sweeps {
        if !two_opt_sweep(&mut ordered) {
            break;
        }
    }
    ordered
}

/// One 2-opt improvement sweep: reverse a block of segments when doing so
/// shortens the two travel links it touches. Returns whether anything
/// improved.
fn two_opt_sweep(ordered: &mut [Polyline]) -> bool {
    let n = ordered.len();
    let mut improved = false;

    for i in 0..n {
        for j in (i + 1)..n {
            let before = if i == 0 {
                (0.0, 0.0)
            } else {
                tail(&ordered[i - 1])
            };
            let old_in = d2(before, head(&ordered[i])).sqrt();
            let new_in = d2(before, tail(&ordered[j])).sqrt();

            let (old_out, new_out) = if j + 1 < n {
                let after = head(&ordered[j + 1]);
                (
                    d2(tail(&ordered[j]), after).sqrt(),
                    d2(head(&ordered[i]), after).sqrt(),
                )
            } else {
                (0.0, 0.0)
            };

            if new_in + new_out + 1e-6 < old_in + old_out {
                ordered[i..=j].reverse();
                for seg in &mut ordered[i..=j] {
                    seg.reverse();
                }
                improved = true;
            }
        }
    }
    improved
}

#[cfg(test)]
mod tests {
    use super::*;
    use reliefkit_core::MotionPoint;

    fn segment(points: &[(f32, f32)]) -> Polyline {
        points
            .iter()
            .map(|&(x, y)| MotionPoint {
                x,
                y,
                z: -0.5,
                power: 50.0,
            })
            .collect()
    }

    #[test]
    fn test_nearest_neighbor_orders_by_proximity() {
        let far = segment(&[(100.0, 100.0), (110.0, 100.0)]);
        let near = segment(&[(1.0, 1.0), (5.0, 1.0)]);
        let out = optimize(vec![far.clone(), near.clone()], OptimizationLevel::Speed);
        assert_eq!(out[0], near);
        assert_eq!(out[1], far);
    }

    #[test]
    fn test_segments_may_reverse_but_keep_points() {
        let seg = segment(&[(10.0, 0.0), (0.0, 0.0)]);
        let out = optimize(
            vec![seg.clone(), segment(&[(20.0, 0.0), (30.0, 0.0)])],
            OptimizationLevel::Speed,
        );
        // First segment flips so its near end leads
        assert_eq!(out[0][0].x, 0.0);
        let total: usize = out.iter().map(|s| s.len()).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_quality_never_worse_than_speed() {
        let segs = vec![
            segment(&[(0.0, 0.0), (1.0, 0.0)]),
            segment(&[(50.0, 0.0), (51.0, 0.0)]),
            segment(&[(2.0, 0.0), (3.0, 0.0)]),
            segment(&[(52.0, 0.0), (53.0, 0.0)]),
        ];
        let fast = optimize(segs.clone(), OptimizationLevel::Speed);
        let quality = optimize(segs, OptimizationLevel::Quality);
        assert!(travel_distance(&quality) <= travel_distance(&fast) + 1e-4);
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        let out = optimize(
            vec![Vec::new(), segment(&[(1.0, 1.0), (2.0, 1.0)])],
            OptimizationLevel::Balanced,
        );
        assert_eq!(out.len(), 1);
    }
}
