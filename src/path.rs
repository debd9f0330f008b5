use crate::transform::Point;

/// Cubic bezier curve shared by edge rendering and edge hit testing.
///
/// Both sides must build their curves through [`CubicBezier::from_endpoints`],
/// otherwise the clickable region drifts away from the drawn curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Point, // Start point
    pub p1: Point, // Control point 1
    pub p2: Point, // Control point 2
    pub p3: Point, // End point
}

/// Horizontal control-point offset for an edge from `start` to `end`.
pub fn control_offset(start: Point, end: Point, min_offset: f32) -> f32 {
    ((end.x - start.x).abs() * 0.5).max(min_offset)
}

impl CubicBezier {
    /// Flow-chart style S-curve: control points extend horizontally from both
    /// endpoints, so the curve leaves and enters ports with a horizontal tangent.
    ///
    /// # Arguments
    /// * `start` - Output port center
    /// * `end` - Input port center
    /// * `min_offset` - Minimum control point offset
    pub fn from_endpoints(start: Point, end: Point, min_offset: f32) -> Self {
        let offset = control_offset(start, end, min_offset);
        CubicBezier {
            p0: start,
            p1: Point::new(start.x + offset, start.y),
            p2: Point::new(end.x - offset, end.y),
            p3: end,
        }
    }

    /// Evaluate the bezier curve at parameter t (0.0 to 1.0)
    pub fn eval(&self, t: f32) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * self.p0.x
            + 3.0 * mt2 * t * self.p1.x
            + 3.0 * mt * t2 * self.p2.x
            + t3 * self.p3.x;
        let y = mt3 * self.p0.y
            + 3.0 * mt2 * t * self.p1.y
            + 3.0 * mt * t2 * self.p2.y
            + t3 * self.p3.y;

        Point::new(x, y)
    }

    /// `num_samples + 1` evenly spaced (in t) points, endpoints included.
    pub fn samples(&self, num_samples: usize) -> impl Iterator<Item = Point> + '_ {
        let n = if num_samples == 0 { 20 } else { num_samples };
        (0..=n).map(move |i| self.eval(i as f32 / n as f32))
    }

    /// Split at `t` with de Casteljau and keep the `[0, t]` half.
    pub fn split_front(&self, t: f32) -> CubicBezier {
        let q0 = self.p0.lerp(self.p1, t);
        let q1 = self.p1.lerp(self.p2, t);
        let q2 = self.p2.lerp(self.p3, t);
        let r0 = q0.lerp(q1, t);
        let r1 = q1.lerp(q2, t);
        let s = r0.lerp(r1, t);
        CubicBezier {
            p0: self.p0,
            p1: q0,
            p2: r0,
            p3: s,
        }
    }

    /// SVG path command for this curve.
    pub fn to_svg(&self) -> String {
        format!(
            "M {} {} C {} {} {} {} {} {}",
            self.p0.x, self.p0.y, self.p1.x, self.p1.y, self.p2.x, self.p2.y, self.p3.x, self.p3.y
        )
    }
}

/// Point on the edge curve from `start` to `end` at parameter `t`.
pub fn bezier_point_at(t: f32, start: Point, end: Point, min_offset: f32) -> Point {
    CubicBezier::from_endpoints(start, end, min_offset).eval(t.clamp(0.0, 1.0))
}

/// Generate SVG path command for an edge between two port centers
///
/// # Returns
/// SVG path command string (e.g., "M 10 20 C 60 20 90 80 140 80")
pub fn generate_bezier_path(start: Point, end: Point, min_offset: f32) -> String {
    CubicBezier::from_endpoints(start, end, min_offset).to_svg()
}

/// Generate SVG path command for the `[0, progress]` part of an edge.
///
/// Used to animate data flowing along an edge while its source node runs.
pub fn generate_partial_bezier_path(
    start: Point,
    end: Point,
    min_offset: f32,
    progress: f32,
) -> String {
    let t = progress.clamp(0.0, 1.0);

    if t <= 0.0 {
        return format!("M {} {} L {} {}", start.x, start.y, start.x, start.y);
    }

    let bezier = CubicBezier::from_endpoints(start, end, min_offset);
    if t >= 1.0 {
        return bezier.to_svg();
    }

    bezier.split_front(t).to_svg()
}

/// Preview curve for an in-progress connection drag.
///
/// The curve always runs output -> input, so when the drag started on an input
/// port the cursor is treated as the output end.
pub fn connection_preview_path(
    anchor: Point,
    cursor: Point,
    anchor_is_output: bool,
    min_offset: f32,
) -> String {
    if anchor_is_output {
        generate_bezier_path(anchor, cursor, min_offset)
    } else {
        generate_bezier_path(cursor, anchor, min_offset)
    }
}

/// Minimum distance from `point` to any of the curve's sample points.
///
/// # Arguments
/// * `point` - The point to measure distance from
/// * `bezier` - The bezier curve
/// * `num_samples` - Number of samples along the curve (0 means the default of 20)
pub fn distance_to_bezier(point: Point, bezier: &CubicBezier, num_samples: usize) -> f32 {
    bezier
        .samples(num_samples)
        .map(|sample| sample.distance_sq(point))
        .fold(f32::MAX, f32::min)
        .sqrt()
}
