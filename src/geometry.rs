//! Geometry kernel: integer points, the orientation predicate, and the
//! Jarvis March (gift-wrapping) convex hull.
//!
//! Everything here is exact integer arithmetic. Coordinates are `i32`,
//! intermediate products are accumulated in `i128` so that the cross product
//! of two coordinate differences can never overflow.

use std::cmp::Ordering;
use std::fmt;

/// Fewest points that can form a hull with non-zero area.
pub const MIN_HULL_POINTS: usize = 3;

/// A point on the integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Turn direction of the path `a -> b -> c` with the y axis pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Signed turn of `a -> b -> c`.
///
/// Positive for a clockwise turn, negative for a counter-clockwise turn,
/// zero when the three points are collinear.
pub fn cross(a: Point, b: Point, c: Point) -> i128 {
    let (ax, ay) = (a.x as i128, a.y as i128);
    let (bx, by) = (b.x as i128, b.y as i128);
    let (cx, cy) = (c.x as i128, c.y as i128);
    (by - ay) * (cx - bx) - (bx - ax) * (cy - by)
}

/// Classify the turn `a -> b -> c`.
pub fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    match cross(a, b, c).cmp(&0) {
        Ordering::Equal => Orientation::Collinear,
        Ordering::Greater => Orientation::Clockwise,
        Ordering::Less => Orientation::CounterClockwise,
    }
}

/// Compute the convex hull of `points` with the Jarvis March.
///
/// The hull starts at the leftmost point (lowest y among ties) and proceeds
/// counter-clockwise. The first point is not repeated at the end. Points
/// lying on a hull edge are part of the result, nearest first, and every
/// coordinate appears at most once.
///
/// Inputs with fewer than three points, or whose points are all collinear
/// (including all identical), have no area and produce an empty hull.
pub fn jarvis_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < MIN_HULL_POINTS {
        return Vec::new();
    }

    let anchor = anchor_index(points);
    if is_flat(points, points[anchor]) {
        return Vec::new();
    }

    let mut hull = Vec::new();
    let mut current = anchor;

    // `current` is always a strict corner of the hull, so every step
    // advances to the next corner and the walk ends back at the anchor.
    loop {
        hull.push(points[current]);

        let Some(next) = most_clockwise(points, current) else {
            break;
        };

        push_edge_points(points, points[current], points[next], &mut hull);

        if points[next] == points[anchor] {
            break;
        }
        current = next;
    }

    hull
}

/// Index of the minimum-x point, minimum y breaking ties. The first such
/// index wins when the point is duplicated.
pub fn anchor_index(points: &[Point]) -> usize {
    let mut best = 0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let b = points[best];
        if p.x < b.x || (p.x == b.x && p.y < b.y) {
            best = i;
        }
    }
    best
}

/// True when no three points of the set span a non-zero area.
fn is_flat(points: &[Point], anchor: Point) -> bool {
    let Some(&other) = points.iter().find(|&&p| p != anchor) else {
        return true;
    };
    points
        .iter()
        .all(|&p| orientation(anchor, other, p) == Orientation::Collinear)
}

/// Pick the candidate every other point lies on the left of, as seen from
/// `points[current]`.
///
/// The running pick starts at the first point after `current` (wrapping)
/// that does not coincide with it. A candidate replaces the pick when it is
/// strictly more clockwise, or when it is collinear and farther along the
/// same ray.
fn most_clockwise(points: &[Point], current: usize) -> Option<usize> {
    let n = points.len();
    let origin = points[current];

    let mut pick = (1..n)
        .map(|step| (current + step) % n)
        .find(|&i| points[i] != origin)?;

    for (i, &candidate) in points.iter().enumerate() {
        if candidate == origin {
            continue;
        }
        match orientation(origin, candidate, points[pick]) {
            Orientation::CounterClockwise => pick = i,
            Orientation::Collinear if farther_on_ray(origin, candidate, points[pick]) => pick = i,
            _ => {}
        }
    }

    Some(pick)
}

/// Append the points strictly between `from` and `to`, nearest first.
fn push_edge_points(points: &[Point], from: Point, to: Point, hull: &mut Vec<Point>) {
    let reach = distance_sq(from, to);
    let mut between: Vec<Point> = points
        .iter()
        .copied()
        .filter(|&p| {
            p != from
                && orientation(from, p, to) == Orientation::Collinear
                && dot(from, p, to) > 0
                && distance_sq(from, p) < reach
        })
        .collect();

    between.sort_by_key(|&p| distance_sq(from, p));
    between.dedup();
    hull.extend(between);
}

/// True when `candidate` lies on the ray `origin -> pick`, beyond `pick`.
fn farther_on_ray(origin: Point, candidate: Point, pick: Point) -> bool {
    dot(origin, candidate, pick) > 0 && distance_sq(origin, candidate) > distance_sq(origin, pick)
}

fn dot(origin: Point, a: Point, b: Point) -> i128 {
    let ax = a.x as i128 - origin.x as i128;
    let ay = a.y as i128 - origin.y as i128;
    let bx = b.x as i128 - origin.x as i128;
    let by = b.y as i128 - origin.y as i128;
    ax * bx + ay * by
}

fn distance_sq(a: Point, b: Point) -> i128 {
    let dx = b.x as i128 - a.x as i128;
    let dy = b.y as i128 - a.y as i128;
    dx * dx + dy * dy
}
