//! Procedural room environment used as the scene's reflection map.
//!
//! Generated once at scene construction: a small cube map with a bright
//! ceiling panel, neutral walls and a darker floor, enough to give glossy
//! materials something to reflect.

use wgpu::util::DeviceExt;

pub const ROOM_FACE_SIZE: u32 = 16;
const FACE_COUNT: u32 = 6;

const WALL: [u8; 4] = [150, 150, 150, 255];
const FLOOR: [u8; 4] = [70, 70, 70, 255];
const CEILING: [u8; 4] = [200, 200, 200, 255];
const LIGHT_PANEL: [u8; 4] = [255, 255, 255, 255];

/// Cube face order matches wgpu: +X, -X, +Y, -Y, +Z, -Z.
pub fn room_faces(size: u32) -> Vec<u8> {
    let size = size.max(1);
    let mut texels = Vec::with_capacity((size * size * FACE_COUNT * 4) as usize);
    for face in 0..FACE_COUNT {
        for y in 0..size {
            for x in 0..size {
                let texel = match face {
                    2 if is_centre_panel(x, y, size) => LIGHT_PANEL,
                    2 => CEILING,
                    3 => FLOOR,
                    _ => WALL,
                };
                texels.extend_from_slice(&texel);
            }
        }
    }
    texels
}

fn is_centre_panel(x: u32, y: u32, size: u32) -> bool {
    let lo = size / 4;
    let hi = size - lo;
    (lo..hi).contains(&x) && (lo..hi).contains(&y)
}

pub struct RoomEnvironment {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RoomEnvironment {
    pub fn build(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texels = room_faces(ROOM_FACE_SIZE);
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("Room Environment"),
                size: wgpu::Extent3d {
                    width: ROOM_FACE_SIZE,
                    height: ROOM_FACE_SIZE,
                    depth_or_array_layers: FACE_COUNT,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &texels,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Room Environment View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        log::debug!("Room environment generated ({ROOM_FACE_SIZE}px faces)");
        Self { texture, view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texel(data: &[u8], size: u32, face: u32, x: u32, y: u32) -> [u8; 4] {
        let i = (((face * size + y) * size + x) * 4) as usize;
        [data[i], data[i + 1], data[i + 2], data[i + 3]]
    }

    #[test]
    fn faces_cover_all_six_sides() {
        let data = room_faces(8);
        assert_eq!(data.len(), 8 * 8 * 6 * 4);
    }

    #[test]
    fn ceiling_has_light_panel_and_floor_is_darker() {
        let data = room_faces(8);
        assert_eq!(texel(&data, 8, 2, 4, 4), LIGHT_PANEL);
        assert_eq!(texel(&data, 8, 2, 0, 0), CEILING);
        assert_eq!(texel(&data, 8, 3, 4, 4), FLOOR);
        assert_eq!(texel(&data, 8, 0, 4, 4), WALL);
    }

    #[test]
    fn zero_size_is_promoted_to_one_texel() {
        assert_eq!(room_faces(0).len(), 6 * 4);
    }
}
