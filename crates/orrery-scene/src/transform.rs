//! Model-view matrix stack with scope guards.
//!
//! `push` hands out a [`MatrixScope`] that pops when dropped, so every
//! push is paired with exactly one pop.

use std::ops::{Deref, DerefMut};

use nalgebra::{Matrix4, Rotation3, Unit, Vector3};

#[derive(Clone, Debug)]
pub struct MatrixStack {
    // Never empty; the last entry is the current matrix.
    stack: Vec<Matrix4<f64>>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixStack {
    pub fn new() -> Self {
        Self {
            stack: vec![Matrix4::identity()],
        }
    }

    #[inline]
    pub fn top(&self) -> &Matrix4<f64> {
        // Invariant: the base entry is never popped.
        &self.stack[self.stack.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Matrix4<f64> {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    /// Number of open scopes.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    pub fn load(&mut self, m: Matrix4<f64>) {
        *self.top_mut() = m;
    }

    pub fn load_identity(&mut self) {
        self.load(Matrix4::identity());
    }

    /// Post-multiply the current matrix (`top = top * m`).
    pub fn multiply(&mut self, m: &Matrix4<f64>) {
        let top = self.top_mut();
        *top *= m;
    }

    pub fn translate(&mut self, x: f64, y: f64, z: f64) {
        self.multiply(&Matrix4::new_translation(&Vector3::new(x, y, z)));
    }

    /// Rotate by `degrees` about `axis` (need not be normalized).
    pub fn rotate_degrees(&mut self, degrees: f64, axis: Vector3<f64>) {
        let axis = Unit::new_normalize(axis);
        let rot = Rotation3::from_axis_angle(&axis, degrees.to_radians());
        self.multiply(&rot.to_homogeneous());
    }

    pub fn rotate_z_degrees(&mut self, degrees: f64) {
        self.rotate_degrees(degrees, Vector3::z());
    }

    /// Save the current matrix; it is restored when the scope drops.
    pub fn push(&mut self) -> MatrixScope<'_> {
        let top = *self.top();
        self.stack.push(top);
        MatrixScope { stack: self }
    }
}

/// Open push on a [`MatrixStack`]; pops on drop.
pub struct MatrixScope<'a> {
    stack: &'a mut MatrixStack,
}

impl Deref for MatrixScope<'_> {
    type Target = MatrixStack;

    fn deref(&self) -> &MatrixStack {
        self.stack
    }
}

impl DerefMut for MatrixScope<'_> {
    fn deref_mut(&mut self) -> &mut MatrixStack {
        self.stack
    }
}

impl Drop for MatrixScope<'_> {
    fn drop(&mut self) {
        self.stack.stack.pop();
    }
}
