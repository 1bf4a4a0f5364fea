//! Wireframe debug geometry drawn in a marker's local frame.

use std::f32::consts::PI;

use nalgebra::Matrix4;

use crate::{Color, LineSegment, Renderer};

/// X (red), Y (green) and Z (blue) axes of length `size` from the origin.
pub fn axis_lines(size: f32) -> [LineSegment; 3] {
    let o = [0.0, 0.0, 0.0];
    [
        LineSegment {
            from: o,
            to: [size, 0.0, 0.0],
            color: Color::RED,
        },
        LineSegment {
            from: o,
            to: [0.0, size, 0.0],
            color: Color::GREEN,
        },
        LineSegment {
            from: o,
            to: [0.0, 0.0, size],
            color: Color::BLUE,
        },
    ]
}

fn line_loop(points: &[[f32; 3]], color: Color, out: &mut Vec<LineSegment>) {
    if points.len() < 2 {
        return;
    }
    for (i, &from) in points.iter().enumerate() {
        let to = points[(i + 1) % points.len()];
        out.push(LineSegment { from, to, color });
    }
}

/// Outline of an axis-aligned cube of side `size` centred at the origin,
/// one closed loop per face.
pub fn wire_cube_lines(size: f32, color: Color) -> Vec<LineSegment> {
    const FACES: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [3, 2, 6, 7],
        [7, 6, 5, 4],
        [4, 5, 1, 0],
        [5, 6, 2, 1],
        [7, 4, 0, 3],
    ];
    let h = size / 2.0;
    let v: [[f32; 3]; 8] = [
        [-h, -h, -h],
        [-h, -h, h],
        [-h, h, h],
        [-h, h, -h],
        [h, -h, -h],
        [h, -h, h],
        [h, h, h],
        [h, h, -h],
    ];

    let mut out = Vec::with_capacity(24);
    for face in FACES.iter().rev() {
        line_loop(&face.map(|i| v[i]), color, &mut out);
    }
    out
}

/// Wire cone standing on the XY plane: `slices` generatrices sampled at
/// `stacks` heights, plus the base circle.
pub fn wire_cone_lines(base: f32, height: f32, slices: u32, stacks: u32, color: Color) -> Vec<LineSegment> {
    let mut out = Vec::new();
    if slices == 0 || stacks == 0 {
        return out;
    }

    for i in 0..slices {
        let angle = 2.0 * PI * i as f32 / slices as f32;
        let (sin, cos) = angle.sin_cos();
        let side: Vec<[f32; 3]> = (0..stacks)
            .map(|j| {
                let t = j as f32 / stacks as f32;
                let r = base * (1.0 - t);
                [r * cos, r * sin, height * t]
            })
            .collect();
        line_loop(&side, color, &mut out);
    }

    let rim: Vec<[f32; 3]> = (0..slices)
        .map(|i| {
            let angle = 2.0 * PI * i as f32 / slices as f32;
            [base * angle.cos(), base * angle.sin(), 0.0]
        })
        .collect();
    line_loop(&rim, color, &mut out);
    out
}

pub fn draw_axis<R: Renderer + ?Sized>(renderer: &mut R, model_view: &Matrix4<f64>, size: f32) {
    renderer.draw_lines(model_view, &axis_lines(size));
}

pub fn draw_wire_cube<R: Renderer + ?Sized>(
    renderer: &mut R,
    model_view: &Matrix4<f64>,
    size: f32,
    color: Color,
) {
    renderer.draw_lines(model_view, &wire_cube_lines(size, color));
}

pub fn draw_wire_cone<R: Renderer + ?Sized>(
    renderer: &mut R,
    model_view: &Matrix4<f64>,
    base: f32,
    height: f32,
    slices: u32,
    stacks: u32,
) {
    let lines = wire_cone_lines(base, height, slices, stacks, Color::WHITE);
    if !lines.is_empty() {
        renderer.draw_lines(model_view, &lines);
    }
}
