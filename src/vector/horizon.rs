use glam::DVec2;

/// Screen-space geometry of the visible hemisphere's rim.
///
/// When the globe overflows the screen diagonal the clip circle shrinks
/// to the circle through the canvas corners; runs terminated there are
/// finished off by the viewport clipper.
#[derive(Debug, Clone, Copy)]
pub struct HorizonGeometry {
    pub center: DVec2,
    clip_radius: f64,
    clip_radius_sq: f64,
}

impl HorizonGeometry {
    pub fn new(width: usize, height: usize, radius: f64) -> Self {
        Self::with_point_limit(width, height, radius, -1.0)
    }

    /// Geometry whose clip circle is tightened by a layer's z cutoff on
    /// top of the screen-corner bound. A negative cutoff asks for the
    /// screen bound alone.
    pub fn with_point_limit(width: usize, height: usize, radius: f64, point_limit: f64) -> Self {
        let center = DVec2::new(width as f64 / 2.0, height as f64 / 2.0);
        let img_radius_sq = center.x * center.x + center.y * center.y;
        let r_sq = radius * radius;
        let screen_limit = if img_radius_sq < r_sq {
            (1.0 - img_radius_sq / r_sq).sqrt()
        } else {
            0.0
        };
        let z_point_limit = if point_limit < 0.0 {
            screen_limit
        } else {
            point_limit.min(screen_limit)
        };
        let clip_radius_sq = r_sq * (1.0 - z_point_limit * z_point_limit);
        Self {
            center,
            clip_radius: clip_radius_sq.sqrt(),
            clip_radius_sq,
        }
    }

    pub fn clip_radius(&self) -> f64 {
        self.clip_radius
    }
}

/// Point where the segment from `last` to `current` meets the clip
/// circle. Falls back to dropping the crossing-side endpoint onto the
/// circle when the chord misses it numerically.
pub(crate) fn horizon_point(
    g: &HorizonGeometry,
    last: DVec2,
    current: DVec2,
    entering: bool,
) -> DVec2 {
    let d = current - last;
    let f = last - g.center;
    let a = d.dot(d);
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - g.clip_radius_sq;
    let disc = b * b - 4.0 * a * c;
    if a > 1e-12 && disc >= 0.0 {
        let sq = disc.sqrt();
        for t in [(-b - sq) / (2.0 * a), (-b + sq) / (2.0 * a)] {
            if (-1e-9..=1.0 + 1e-9).contains(&t) {
                return last + d * t.clamp(0.0, 1.0);
            }
        }
    }
    let side = if entering { current } else { last };
    let xa = (side.x - g.center.x).clamp(-g.clip_radius, g.clip_radius);
    let ya_mag = (g.clip_radius_sq - xa * xa).max(0.0).sqrt();
    let ya = if side.y - g.center.y < 0.0 { -ya_mag } else { ya_mag };
    g.center + DVec2::new(xa, ya)
}

/// Bridge the hidden gap of a ring along the clip circle in one-degree
/// steps, taking the shorter angular direction.
fn append_arc(g: &HorizonGeometry, ring: &mut Vec<DVec2>, a: DVec2, b: DVec2) {
    ring.push(a);
    let va = a - g.center;
    let vb = b - g.center;
    let alpha = va.y.atan2(va.x).to_degrees();
    let beta = vb.y.atan2(vb.x).to_degrees();
    let mut diff = beta - alpha;
    if diff != 0.0 {
        if diff.abs() > 180.0 {
            diff = -diff.signum() * (360.0 - diff.abs());
        }
        let steps = diff.abs() as i32;
        let sgn = diff.signum();
        for it in 1..steps {
            let angle = (alpha + sgn * f64::from(it)).to_radians();
            ring.push(g.center + g.clip_radius * DVec2::new(angle.cos(), angle.sin()));
        }
    }
    ring.push(b);
}

/// Clip one projected polyline against the visible hemisphere.
///
/// Input points are (screen position, camera-space z); a point is on the
/// visible side iff z >= 0. Closed rings come back as a single polygon
/// with the hidden stretches replaced by horizon arcs; open polylines
/// split into one output per visible run, terminated at the horizon.
pub fn clip_polyline<I>(g: &HorizonGeometry, points: I, closed: bool) -> Vec<Vec<DVec2>>
where
    I: IntoIterator<Item = (DVec2, f64)>,
{
    if closed {
        clip_ring(g, points)
    } else {
        clip_runs(g, points)
    }
}

fn clip_runs<I>(g: &HorizonGeometry, points: I) -> Vec<Vec<DVec2>>
where
    I: IntoIterator<Item = (DVec2, f64)>,
{
    let mut runs: Vec<Vec<DVec2>> = Vec::new();
    let mut run: Vec<DVec2> = Vec::new();
    let mut last: Option<(DVec2, bool)> = None;
    for (point, z) in points {
        let visible = z >= 0.0;
        if let Some((last_point, last_visible)) = last {
            if visible != last_visible {
                let hp = horizon_point(g, last_point, point, visible);
                if last_visible {
                    run.push(hp);
                    if run.len() >= 2 {
                        runs.push(std::mem::take(&mut run));
                    } else {
                        run.clear();
                    }
                } else {
                    run.clear();
                    run.push(hp);
                }
            }
        }
        if visible {
            run.push(point);
        }
        last = Some((point, visible));
    }
    if run.len() >= 2 {
        runs.push(run);
    }
    runs
}

fn clip_ring<I>(g: &HorizonGeometry, points: I) -> Vec<Vec<DVec2>>
where
    I: IntoIterator<Item = (DVec2, f64)>,
{
    let mut ring: Vec<DVec2> = Vec::new();
    // Exit point waiting for its matching re-entry, and the entry seen
    // before any exit (resolved when the ring wraps around).
    let mut pending_exit: Option<DVec2> = None;
    let mut first_entry: Option<DVec2> = None;
    let mut first: Option<(DVec2, bool)> = None;
    let mut last: Option<(DVec2, bool)> = None;

    let mut step = |ring: &mut Vec<DVec2>,
                    pending_exit: &mut Option<DVec2>,
                    first_entry: &mut Option<DVec2>,
                    last_point: DVec2,
                    last_visible: bool,
                    point: DVec2,
                    visible: bool| {
        if visible == last_visible {
            return;
        }
        let hp = horizon_point(g, last_point, point, visible);
        if visible {
            match pending_exit.take() {
                Some(exit) => append_arc(g, ring, exit, hp),
                None => *first_entry = Some(hp),
            }
        } else {
            *pending_exit = Some(hp);
        }
    };

    for (point, z) in points {
        let visible = z >= 0.0;
        if let Some((last_point, last_visible)) = last {
            step(
                &mut ring,
                &mut pending_exit,
                &mut first_entry,
                last_point,
                last_visible,
                point,
                visible,
            );
        } else {
            first = Some((point, visible));
        }
        if visible {
            ring.push(point);
        }
        last = Some((point, visible));
    }

    // Close the ring: the wrap segment can cross the horizon too.
    if let (Some((last_point, last_visible)), Some((first_point, first_visible))) = (last, first)
    {
        step(
            &mut ring,
            &mut pending_exit,
            &mut first_entry,
            last_point,
            last_visible,
            first_point,
            first_visible,
        );
    }
    if let (Some(exit), Some(entry)) = (pending_exit, first_entry) {
        append_arc(g, &mut ring, exit, entry);
    }

    if ring.len() >= 2 {
        vec![ring]
    } else {
        Vec::new()
    }
}
