//! Route polyline and the path follower that drives the viewpoint along it.

use std::time::Duration;

use glam::Vec3;
use rail_shooter_core::{RouteBounds, RoutePosition};

const POSITION_EPSILON: f32 = 1e-4;
const LENGTH_EPSILON: f32 = 1e-6;

/// Polyline the viewpoint travels along, addressed by fractional point index.
#[derive(Clone, Debug, Default)]
pub struct Route {
    waypoints: Vec<Vec3>,
}

impl Route {
    /// Creates a route through the provided control points.
    #[must_use]
    pub(crate) fn new(waypoints: Vec<Vec3>) -> Self {
        Self { waypoints }
    }

    /// Control points of the route in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    /// Addressable range of the route.
    #[must_use]
    pub fn bounds(&self) -> RouteBounds {
        RouteBounds::new(u32::try_from(self.waypoints.len()).unwrap_or(u32::MAX))
    }

    /// World-space point at the provided route position, clamped to the route.
    #[must_use]
    pub fn sample(&self, position: RoutePosition) -> Vec3 {
        match self.waypoints.len() {
            0 => Vec3::ZERO,
            1 => self.waypoints[0],
            count => {
                let last = (count - 1) as f32;
                let t = if position.get().is_finite() {
                    position.get().clamp(0.0, last)
                } else {
                    0.0
                };
                let index = (t.floor() as usize).min(count - 2);
                let fraction = t - index as f32;
                self.waypoints[index].lerp(self.waypoints[index + 1], fraction)
            }
        }
    }

    fn segment_length(&self, index: usize) -> f32 {
        match (self.waypoints.get(index), self.waypoints.get(index + 1)) {
            (Some(start), Some(end)) => start.distance(*end),
            _ => 0.0,
        }
    }

    fn clamp(&self, position: RoutePosition) -> RoutePosition {
        let last = self.bounds().terminal().get();
        let value = position.get();
        if value.is_finite() {
            RoutePosition::new(value.clamp(0.0, last))
        } else {
            RoutePosition::START
        }
    }
}

/// Moves the viewpoint between two route positions and reports arrival once.
#[derive(Clone, Debug, Default)]
pub(crate) struct PathFollower {
    position: RoutePosition,
    destination: RoutePosition,
    speed: f32,
    following: bool,
}

impl PathFollower {
    pub(crate) fn position(&self) -> RoutePosition {
        self.position
    }

    pub(crate) fn is_following(&self) -> bool {
        self.following
    }

    /// Resets the follower to the start of the route without an active traversal.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Restarts traversal on the `[from, to]` range at the provided speed.
    pub(crate) fn restart(
        &mut self,
        route: &Route,
        from: RoutePosition,
        to: RoutePosition,
        speed: f32,
    ) -> (RoutePosition, RoutePosition) {
        self.position = route.clamp(from);
        self.destination = route.clamp(to);
        self.speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
        self.following = true;
        (self.position, self.destination)
    }

    /// Advances along the route, returning the destination when it is reached.
    ///
    /// The arrival is reported on the tick the destination is reached and the
    /// follower then stops, so every traversal reports at most one arrival.
    pub(crate) fn advance(&mut self, route: &Route, dt: Duration) -> Option<RoutePosition> {
        if !self.following {
            return None;
        }

        if route.waypoints().len() < 2 {
            return Some(self.arrive());
        }

        let mut budget = self.speed * dt.as_secs_f32();
        loop {
            let current = self.position.get();
            let target = self.destination.get();
            if (current - target).abs() <= POSITION_EPSILON {
                return Some(self.arrive());
            }

            if budget <= 0.0 {
                return None;
            }

            let forward = target > current;
            let boundary = if forward {
                (current.floor() + 1.0).min(target)
            } else {
                let below = if current.fract() == 0.0 {
                    current - 1.0
                } else {
                    current.floor()
                };
                below.max(target)
            };

            let segment = current.min(boundary).floor() as usize;
            let length = route.segment_length(segment);
            let span = (boundary - current).abs();
            if length <= LENGTH_EPSILON {
                self.position = RoutePosition::new(boundary);
                continue;
            }

            let distance = span * length;
            if budget >= distance {
                budget -= distance;
                self.position = RoutePosition::new(boundary);
                continue;
            }

            let step = budget / length;
            let next = if forward { current + step } else { current - step };
            self.position = RoutePosition::new(next);
            return None;
        }
    }

    fn arrive(&mut self) -> RoutePosition {
        self.position = self.destination;
        self.following = false;
        self.destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_route() -> Route {
        Route::new(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 20.0),
        ])
    }

    #[test]
    fn sample_interpolates_between_points() {
        let route = straight_route();
        assert_eq!(route.sample(RoutePosition::new(0.5)), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(route.sample(RoutePosition::new(1.5)), Vec3::new(10.0, 0.0, 10.0));
        assert_eq!(route.sample(RoutePosition::new(9.0)), Vec3::new(10.0, 0.0, 20.0));
    }

    #[test]
    fn follower_reports_arrival_once() {
        let route = straight_route();
        let mut follower = PathFollower::default();
        let _ = follower.restart(&route, RoutePosition::START, RoutePosition::new(1.0), 10.0);

        assert_eq!(follower.advance(&route, Duration::from_millis(500)), None);
        assert!((follower.position().get() - 0.5).abs() < 1e-4);
        assert_eq!(
            follower.advance(&route, Duration::from_millis(500)),
            Some(RoutePosition::new(1.0))
        );
        assert!(!follower.is_following());
        assert_eq!(follower.advance(&route, Duration::from_secs(1)), None);
    }

    #[test]
    fn follower_respects_segment_lengths() {
        let route = straight_route();
        let mut follower = PathFollower::default();
        let _ = follower.restart(&route, RoutePosition::START, RoutePosition::new(2.0), 10.0);

        // 10 units cover the first segment, the next 10 units are half of the second.
        assert_eq!(follower.advance(&route, Duration::from_secs(2)), None);
        assert!((follower.position().get() - 1.5).abs() < 1e-4);
        assert_eq!(
            follower.advance(&route, Duration::from_secs(1)),
            Some(RoutePosition::new(2.0))
        );
    }

    #[test]
    fn follower_travels_backwards() {
        let route = straight_route();
        let mut follower = PathFollower::default();
        let _ = follower.restart(&route, RoutePosition::new(2.0), RoutePosition::new(0.5), 100.0);

        assert_eq!(
            follower.advance(&route, Duration::from_secs(1)),
            Some(RoutePosition::new(0.5))
        );
    }

    #[test]
    fn zero_length_traversal_arrives_on_next_advance() {
        let route = straight_route();
        let mut follower = PathFollower::default();
        let _ = follower.restart(&route, RoutePosition::new(1.0), RoutePosition::new(1.0), 0.0);

        assert_eq!(
            follower.advance(&route, Duration::ZERO),
            Some(RoutePosition::new(1.0))
        );
    }

    #[test]
    fn restart_clamps_range_to_route() {
        let route = straight_route();
        let mut follower = PathFollower::default();
        let (from, to) =
            follower.restart(&route, RoutePosition::new(-4.0), RoutePosition::new(12.0), 1.0);
        assert_eq!(from, RoutePosition::START);
        assert_eq!(to, RoutePosition::new(2.0));
    }
}
