use serde::{Deserialize, Serialize};

use crate::geom::{Point3, smoothstep};

/// A named camera placement supplied by the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Viewpoint {
    pub position: [f64; 3],
    pub target: [f64; 3],
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraPose {
    pub position: [f64; 3],
    pub target: [f64; 3],
}

/// Looping traversal over a list of viewpoints.
///
/// The parameter counts viewpoints: `2.5` sits halfway between viewpoint 2 and
/// viewpoint 3, eased with smoothstep.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPath {
    viewpoints: Vec<Viewpoint>,
    parameter: f64,
    speed: f64,
    animating: bool,
}

impl CameraPath {
    #[must_use]
    pub fn new(viewpoints: Vec<Viewpoint>, speed: f64) -> Self {
        Self {
            viewpoints,
            parameter: 0.0,
            speed: if speed.is_finite() { speed } else { 0.0 },
            animating: false,
        }
    }

    pub fn set_viewpoints(&mut self, viewpoints: Vec<Viewpoint>) {
        self.viewpoints = viewpoints;
        self.parameter = 0.0;
        self.animating = false;
    }

    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.speed = speed;
        }
    }

    #[must_use]
    pub fn viewpoints(&self) -> &[Viewpoint] {
        &self.viewpoints
    }

    #[must_use]
    pub fn parameter(&self) -> f64 {
        self.parameter
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Stop any traversal and rest on viewpoint `index`.
    pub fn jump_to(&mut self, index: usize) -> Option<CameraPose> {
        if index >= self.viewpoints.len() {
            return None;
        }
        self.parameter = index as f64;
        self.animating = false;
        self.pose()
    }

    pub fn start(&mut self) {
        self.animating = !self.viewpoints.is_empty();
    }

    pub fn stop(&mut self) {
        self.animating = false;
    }

    /// Advance the traversal by `dt` seconds. Returns whether the pose moved.
    pub fn tick(&mut self, dt: f64) -> bool {
        if !self.animating || self.viewpoints.len() < 2 || dt <= 0.0 {
            return false;
        }
        let n = self.viewpoints.len() as f64;
        self.parameter = (self.parameter + dt * self.speed).rem_euclid(n);
        true
    }

    #[must_use]
    pub fn pose(&self) -> Option<CameraPose> {
        let n = self.viewpoints.len();
        if n == 0 {
            return None;
        }
        let base = self.parameter.floor();
        let i = (base as usize) % n;
        let next = (i + 1) % n;
        let t = smoothstep(self.parameter - base);
        let (a, b) = (&self.viewpoints[i], &self.viewpoints[next]);
        Some(CameraPose {
            position: lerp3(a.position, b.position, t),
            target: lerp3(a.target, b.target, t),
        })
    }
}

fn lerp3(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    let p = Point3::from(a).lerp(Point3::from(b), t);
    [p.x, p.y, p.z]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewpoint(x: f64) -> Viewpoint {
        Viewpoint {
            position: [x, 0.0, 10.0],
            target: [x, 0.0, 0.0],
            label: format!("view {x}"),
            kind: "overview".to_string(),
        }
    }

    fn path() -> CameraPath {
        CameraPath::new(vec![viewpoint(0.0), viewpoint(4.0), viewpoint(8.0)], 0.5)
    }

    #[test]
    fn jump_rests_on_viewpoint() {
        let mut cam = path();
        let pose = cam.jump_to(1).unwrap();
        assert_eq!(pose.position, [4.0, 0.0, 10.0]);
        assert!(cam.jump_to(3).is_none());
    }

    #[test]
    fn tick_eases_between_viewpoints() {
        let mut cam = path();
        assert!(!cam.tick(1.0));
        cam.start();
        assert!(cam.tick(1.0));
        let pose = cam.pose().unwrap();
        assert!((pose.position[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn traversal_loops() {
        let mut cam = path();
        cam.start();
        cam.tick(6.5);
        assert!((cam.parameter() - 0.25).abs() < 1e-12);
        cam.jump_to(2);
        assert!(!cam.is_animating());
    }

    #[test]
    fn empty_path_has_no_pose() {
        let cam = CameraPath::new(Vec::new(), 1.0);
        assert!(cam.pose().is_none());
    }
}
