//! Orbit camera for the demo scene.

/// The four eye positions the camera cycles through, each looking at
/// the origin from a compass direction.
const EYE_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 4.0, 8.0],
    [8.0, 4.0, 0.0],
    [0.0, 4.0, -8.0],
    [-8.0, 4.0, 0.0],
];

/// Steps the camera around the scene one quarter turn at a time.
#[derive(Debug, Default)]
pub struct ViewCycle {
    position: usize,
}

impl ViewCycle {
    /// Starts at the south viewpoint.
    #[must_use]
    pub const fn new() -> Self {
        Self { position: 0 }
    }

    /// Advances one position counter-clockwise.
    pub fn next(&mut self) {
        self.position = (self.position + 1) % EYE_POSITIONS.len();
    }

    /// Advances one position clockwise.
    pub fn prev(&mut self) {
        self.position = self
            .position
            .checked_sub(1)
            .unwrap_or(EYE_POSITIONS.len() - 1);
    }

    /// The current eye position.
    #[must_use]
    pub const fn eye(&self) -> [f32; 3] {
        EYE_POSITIONS[self.position]
    }

    /// View matrix from the current eye towards the origin.
    #[must_use]
    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        look_at(self.eye(), [0.0, 0.0, 0.0], [0.0, 1.0, 0.0])
    }
}

// =============================================================================
// MATH HELPERS
// =============================================================================
fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}
fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}
fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
fn normalize(v: [f32; 3]) -> [f32; 3] {
    let l = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if l < 1e-10 {
        return [0.0, 1.0, 0.0];
    }
    [v[0] / l, v[1] / l, v[2] / l]
}

/// Right-handed view matrix, column major.
#[must_use]
pub fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> [[f32; 4]; 4] {
    let f = normalize(sub(target, eye));
    let r = normalize(cross(f, up));
    let u = cross(r, f);

    [
        [r[0], u[0], -f[0], 0.0],
        [r[1], u[1], -f[1], 0.0],
        [r[2], u[2], -f[2], 0.0],
        [-dot(r, eye), -dot(u, eye), dot(f, eye), 1.0],
    ]
}

/// Perspective projection with a 0..1 depth range. `fov` is the
/// vertical field of view in radians.
#[must_use]
pub fn perspective(fov: f32, aspect: f32, near: f32, far: f32) -> [[f32; 4]; 4] {
    let f = 1.0 / (fov / 2.0).tan();
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, far / (near - far), -1.0],
        [0.0, 0.0, (near * far) / (near - far), 0.0],
    ]
}

/// `a * b`, column major.
#[must_use]
pub fn multiply_matrices(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }
    result
}

/// Translation matrix, column major.
#[must_use]
pub const fn translate(offset: [f32; 3]) -> [[f32; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [offset[0], offset[1], offset[2], 1.0],
    ]
}

/// Rotation about the Y axis, column major. `angle` in radians.
#[must_use]
pub fn rotate_y(angle: f32) -> [[f32; 4]; 4] {
    let (s, c) = angle.sin_cos();
    [
        [c, 0.0, -s, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [s, 0.0, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(m: [[f32; 4]; 4], p: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0; 3];
        for row in 0..3 {
            out[row] = m[0][row] * p[0] + m[1][row] * p[1] + m[2][row] * p[2] + m[3][row];
        }
        out
    }

    #[test]
    fn test_view_cycle_wraps_both_ways() {
        let mut cycle = ViewCycle::new();
        assert_eq!(cycle.eye(), [0.0, 4.0, 8.0]);

        cycle.next();
        assert_eq!(cycle.eye(), [8.0, 4.0, 0.0]);

        cycle.prev();
        cycle.prev();
        assert_eq!(cycle.eye(), [-8.0, 4.0, 0.0]);

        for _ in 0..4 {
            cycle.next();
        }
        assert_eq!(cycle.eye(), [-8.0, 4.0, 0.0]);
    }

    #[test]
    fn test_look_at_moves_eye_to_origin() {
        let view = look_at([0.0, 4.0, 8.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let at_eye = transform(view, [0.0, 4.0, 8.0]);
        for axis in at_eye {
            assert!(axis.abs() < 1e-5);
        }

        // The target ends up straight ahead on -Z.
        let at_target = transform(view, [0.0, 0.0, 0.0]);
        assert!(at_target[0].abs() < 1e-5);
        assert!(at_target[1].abs() < 1e-5);
        assert!(at_target[2] < 0.0);
    }

    #[test]
    fn test_translate_then_rotate_composition() {
        let m = multiply_matrices(translate([1.0, 0.0, 3.0]), rotate_y(90.0f32.to_radians()));

        // rotate_y(90 deg) takes +X to -Z, then the translation applies.
        let p = transform(m, [1.0, 0.0, 0.0]);
        assert!((p[0] - 1.0).abs() < 1e-5);
        assert!(p[1].abs() < 1e-5);
        assert!((p[2] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective(75.0f32.to_radians(), 640.0 / 480.0, 1.0, 100.0);

        // Near plane maps to depth 0, far plane to depth 1, after the
        // perspective divide.
        let near = [0.0f32, 0.0, -1.0, 1.0];
        let far = [0.0f32, 0.0, -100.0, 1.0];
        let apply = |p: [f32; 4]| {
            let mut out = [0.0f32; 4];
            for row in 0..4 {
                for col in 0..4 {
                    out[row] += proj[col][row] * p[col];
                }
            }
            out[2] / out[3]
        };
        assert!(apply(near).abs() < 1e-5);
        assert!((apply(far) - 1.0).abs() < 1e-5);
    }
}
