//! Fixed line geometry drawn by the renderer.

/// A line endpoint with an 8-bit RGBA color (normalized on the GPU).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct LineVertex {
    pub(crate) position: [f32; 3],
    pub(crate) color: [u8; 4],
}

const AXIS_LENGTH: f32 = 200.0;

/// Three axis lines from the origin, drawn as a line list.
#[rustfmt::skip]
pub(crate) const AXIS_LINES: [LineVertex; 6] = [
    // Z axis, red
    LineVertex { position: [0.0, 0.0, 0.0],         color: [250, 0, 0, 255] },
    LineVertex { position: [0.0, 0.0, AXIS_LENGTH], color: [250, 0, 0, 255] },
    // Y axis, blue
    LineVertex { position: [0.0, 0.0, 0.0],         color: [0, 0, 250, 255] },
    LineVertex { position: [0.0, AXIS_LENGTH, 0.0], color: [0, 0, 250, 255] },
    // X axis, green
    LineVertex { position: [0.0, 0.0, 0.0],         color: [0, 250, 0, 255] },
    LineVertex { position: [AXIS_LENGTH, 0.0, 0.0], color: [0, 250, 0, 255] },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<LineVertex>(), 16);
        assert_eq!(bytemuck::cast_slice::<_, u8>(&AXIS_LINES).len(), 6 * 16);
    }

    #[test]
    fn every_line_starts_at_origin() {
        for pair in AXIS_LINES.chunks(2) {
            assert_eq!(pair[0].position, [0.0; 3]);
            assert_eq!(pair[0].color, pair[1].color);
            let length: f32 = pair[1].position.iter().map(|c| c * c).sum::<f32>().sqrt();
            assert_eq!(length, AXIS_LENGTH);
        }
    }
}
