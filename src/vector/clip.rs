use glam::DVec2;

/// Clips screen-space polylines against the canvas rectangle.
///
/// The plane is split into nine sectors by extending the rectangle's
/// edges, with sector 4 the visible one:
///
/// ```text
///  0 | 1 | 2
/// ---+---+---
///  3 | 4 | 5
/// ---+---+---
///  6 | 7 | 8
/// ```
///
/// Segments that enter or leave sector 4 get cut at the border. Closed
/// rings additionally pin offscreen travel to the corners it passes, so
/// the clipped outline hugs the screen instead of collapsing.
pub struct RectClipper {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl RectClipper {
    pub fn new(width: usize, height: usize) -> Self {
        // One pixel of slack on the leading edges keeps lines that hug
        // the border from flickering as the globe moves.
        Self {
            left: -1.0,
            top: -1.0,
            right: width as f64,
            bottom: height as f64,
        }
    }

    fn sector(&self, p: DVec2) -> u8 {
        let x = if p.x < self.left {
            0
        } else if p.x > self.right {
            2
        } else {
            1
        };
        let y = if p.y < self.top {
            0
        } else if p.y > self.bottom {
            6
        } else {
            3
        };
        x + y
    }

    /// Border crossing of the segment `last -> current`, where exactly one
    /// endpoint sits in the offscreen sector given.
    ///
    /// Corner sectors compute both candidate crossings and clamp each
    /// towards the corner. Exactly one coordinate ends up clamped, which
    /// leaves the crossing through the nearer edge.
    fn border_point(&self, last: DVec2, current: DVec2, offscreen: u8) -> DVec2 {
        let m = (current.y - last.y) / (current.x - last.x);
        let x_at = |edge_y: f64| last.x + (edge_y - last.y) / m;
        let y_at = |edge_x: f64| m * (edge_x - last.x) + last.y;

        match offscreen {
            0 => DVec2::new(x_at(self.top).max(self.left), y_at(self.left).max(self.top)),
            1 => DVec2::new(x_at(self.top), self.top),
            2 => DVec2::new(
                x_at(self.top).min(self.right),
                y_at(self.right).max(self.top),
            ),
            3 => DVec2::new(self.left, y_at(self.left)),
            5 => DVec2::new(self.right, y_at(self.right)),
            6 => DVec2::new(
                x_at(self.bottom).max(self.left),
                y_at(self.left).min(self.bottom),
            ),
            7 => DVec2::new(x_at(self.bottom), self.bottom),
            _ => DVec2::new(
                x_at(self.bottom).min(self.right),
                y_at(self.right).min(self.bottom),
            ),
        }
    }

    /// Handles a segment whose endpoints are both offscreen. A ring that
    /// travels around the outside of the screen must still wrap around the
    /// corners it passes, otherwise the clipped outline folds across the
    /// visible area.
    fn manage_off_screen(
        &self,
        last: DVec2,
        current: DVec2,
        last_sector: u8,
        current_sector: u8,
        last_border: DVec2,
        clipped: &mut Vec<DVec2>,
    ) {
        let mut divisor = current.x - last.x;
        if divisor.abs() < 1e-6 {
            divisor = 1e-6_f64.copysign(divisor);
        }
        let m = (current.y - last.y) / divisor;
        let x_at = |edge_y: f64| last.x + (edge_y - last.y) / m;
        let y_at = |edge_x: f64| m * (edge_x - last.x) + last.y;

        match (last_sector, current_sector) {
            (_, 0) => clipped.push(DVec2::new(self.left, self.top)),
            (_, 2) => clipped.push(DVec2::new(self.right, self.top)),
            (_, 6) => clipped.push(DVec2::new(self.left, self.bottom)),
            (_, 8) => clipped.push(DVec2::new(self.right, self.bottom)),
            (3, 1) | (1, 3) => self.span(
                self.top,
                self.left,
                x_at(self.top),
                y_at(self.left),
                last_border,
                clipped,
            ),
            (5, 1) | (1, 5) => self.span(
                self.top,
                self.right,
                x_at(self.top),
                y_at(self.right),
                last_border,
                clipped,
            ),
            (3, 7) | (7, 3) => self.span(
                self.bottom,
                self.left,
                x_at(self.bottom),
                y_at(self.left),
                last_border,
                clipped,
            ),
            (5, 7) | (7, 5) => self.span(
                self.bottom,
                self.right,
                x_at(self.bottom),
                y_at(self.right),
                last_border,
                clipped,
            ),
            // Jumps across the screen in one step (3 to 5, 1 to 7) are
            // beyond repair at this stage and get dropped.
            _ => {}
        }
    }

    /// Emits the crossings of a segment moving between two neighboring
    /// offscreen edge sectors. When the segment passes outside the shared
    /// corner only the corner itself is emitted; otherwise both edge
    /// crossings are, ordered to continue from the previous border point.
    fn span(
        &self,
        h_edge: f64,
        v_edge: f64,
        xa: f64,
        ya: f64,
        last_border: DVec2,
        clipped: &mut Vec<DVec2>,
    ) {
        let x_past = if v_edge == self.left {
            xa < self.left
        } else {
            xa > self.right
        };
        let y_past = if h_edge == self.top {
            ya < self.top
        } else {
            ya > self.bottom
        };
        if x_past && y_past {
            clipped.push(DVec2::new(v_edge, h_edge));
        } else if last_border.x == v_edge {
            clipped.push(DVec2::new(v_edge, ya));
            clipped.push(DVec2::new(xa, h_edge));
        } else {
            clipped.push(DVec2::new(xa, h_edge));
            clipped.push(DVec2::new(v_edge, ya));
        }
    }

    /// Clips a closed ring into a single outline. The closing segment is
    /// left to the draw call, which seals last back to first.
    pub fn clip_ring(&self, points: &[DVec2]) -> Vec<DVec2> {
        let mut clipped = Vec::new();
        let mut last = DVec2::ZERO;
        let mut last_sector = 4;
        let mut last_border = DVec2::new(self.left, self.top);

        for (i, &current) in points.iter().enumerate() {
            let current_sector = self.sector(current);
            if i == 0 {
                last = current;
                last_sector = current_sector;
            }
            if current_sector != last_sector {
                if current_sector == 4 || last_sector == 4 {
                    let offscreen = if current_sector == 4 {
                        last_sector
                    } else {
                        current_sector
                    };
                    let border = self.border_point(last, current, offscreen);
                    clipped.push(border);
                    last_border = border;
                } else {
                    self.manage_off_screen(
                        last,
                        current,
                        last_sector,
                        current_sector,
                        last_border,
                        &mut clipped,
                    );
                }
                last_sector = current_sector;
            }
            if current_sector == 4 {
                clipped.push(current);
            }
            last = current;
        }

        if clipped.len() > 2 {
            clipped
        } else {
            Vec::new()
        }
    }

    /// Clips an open polyline into its visible runs. Each run starts and
    /// ends either at an original point or at the border crossing where
    /// the line entered or left the screen.
    pub fn clip_runs(&self, points: &[DVec2]) -> Vec<Vec<DVec2>> {
        let mut runs = Vec::new();
        let mut run: Vec<DVec2> = Vec::new();
        let mut last = DVec2::ZERO;
        let mut last_sector = 4;

        for (i, &current) in points.iter().enumerate() {
            let current_sector = self.sector(current);
            if i == 0 {
                last = current;
                last_sector = current_sector;
            }
            if current_sector != last_sector && (current_sector == 4 || last_sector == 4) {
                let offscreen = if current_sector == 4 {
                    last_sector
                } else {
                    current_sector
                };
                let border = self.border_point(last, current, offscreen);
                run.push(border);
                if current_sector != 4 {
                    if run.len() > 1 {
                        runs.push(std::mem::take(&mut run));
                    } else {
                        run.clear();
                    }
                }
            }
            last_sector = current_sector;
            if current_sector == 4 {
                run.push(current);
            }
            last = current;
        }
        if run.len() > 1 {
            runs.push(run);
        }
        runs
    }
}
