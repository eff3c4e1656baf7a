//! glTF asset loader.
//!
//! Counts items the way a loading manager does: the model document itself
//! plus every external buffer and image it references. Inline `data:` URIs
//! travel inside the document and are not separate items. Loading runs on a
//! worker thread; every callback is posted back to the event loop as a
//! [`ViewerEvent`] so the lifecycle only ever sees them on the UI thread.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use glam::{Mat4, Vec3};
use gltf::json::Value;
use vitrine_core::{AssetLoadError, AssetLoader, LoadEvent};
use vitrine_render::ModelBounds;
use winit::event_loop::EventLoopProxy;

use crate::ViewerEvent;

#[derive(Debug)]
pub struct LoadedModel {
    pub source_id: String,
    pub resource_count: usize,
    pub byte_len: usize,
    /// Union of the POSITION accessor bounds of every primitive, in mesh space.
    pub bounds: Option<ModelBounds>,
    pub rotation_y: f32,
}

impl LoadedModel {
    /// Placement of the bounding proxy, including the current turntable rotation.
    pub fn proxy_transform(&self) -> Mat4 {
        self.bounds.unwrap_or_default().proxy_transform(self.rotation_y)
    }
}

/// External buffers and images referenced by the document, in declaration order.
fn external_uris(document: &gltf::Document) -> Vec<String> {
    let buffers = document.buffers().filter_map(|buffer| match buffer.source() {
        gltf::buffer::Source::Uri(uri) => Some(uri),
        gltf::buffer::Source::Bin => None,
    });
    let images = document.images().filter_map(|image| match image.source() {
        gltf::image::Source::Uri { uri, .. } => Some(uri),
        gltf::image::Source::View { .. } => None,
    });
    buffers
        .chain(images)
        .filter(|uri| !uri.starts_with("data:"))
        .map(str::to_string)
        .collect()
}

fn vec3_from(value: &Value) -> Option<Vec3> {
    match value.as_array()?.as_slice() {
        [x, y, z] => Some(Vec3::new(
            x.as_f64()? as f32,
            y.as_f64()? as f32,
            z.as_f64()? as f32,
        )),
        _ => None,
    }
}

fn position_bounds(document: &gltf::Document) -> Option<ModelBounds> {
    document
        .meshes()
        .flat_map(|mesh| mesh.primitives())
        .filter_map(|primitive| {
            let positions = primitive.get(&gltf::Semantic::Positions)?;
            let min = vec3_from(&positions.min()?)?;
            let max = vec3_from(&positions.max()?)?;
            Some(ModelBounds::new(min, max))
        })
        .reduce(ModelBounds::union)
}

/// Load `source_id` relative to `root`, reporting through `emit`. Emits zero
/// or more progress events followed by exactly one `Complete` or `Error`.
pub fn load_blocking(root: &Path, source_id: &str, emit: &mut impl FnMut(LoadEvent<LoadedModel>)) {
    match load_items(root, source_id, emit) {
        Ok(model) => emit(LoadEvent::Complete(model)),
        Err(err) => emit(LoadEvent::Error(err)),
    }
}

fn load_items(
    root: &Path,
    source_id: &str,
    emit: &mut impl FnMut(LoadEvent<LoadedModel>),
) -> Result<LoadedModel, AssetLoadError> {
    let path = root.join(source_id);
    let document = fs::read(&path)
        .map_err(|e| AssetLoadError::new(source_id, format!("{}: {e}", path.display())))?;

    // Handles both the JSON and the binary container form.
    let gltf =
        gltf::Gltf::from_slice(&document).map_err(|e| AssetLoadError::new(source_id, e))?;
    let uris = external_uris(&gltf);
    let bounds = position_bounds(&gltf);

    let total = (uris.len() + 1) as u32;
    let mut byte_len = document.len();
    emit(LoadEvent::Progress { loaded: 1, total });

    let base_dir = path.parent().unwrap_or(root);
    for (index, uri) in uris.iter().enumerate() {
        let resource_path = base_dir.join(uri);
        let bytes = fs::read(&resource_path).map_err(|e| {
            AssetLoadError::new(source_id, format!("{}: {e}", resource_path.display()))
        })?;
        byte_len += bytes.len();
        emit(LoadEvent::Progress {
            loaded: index as u32 + 2,
            total,
        });
    }

    Ok(LoadedModel {
        source_id: source_id.to_string(),
        resource_count: uris.len(),
        byte_len,
        bounds,
        rotation_y: 0.0,
    })
}

pub struct GltfLoader {
    root: PathBuf,
    proxy: EventLoopProxy<ViewerEvent>,
}

impl GltfLoader {
    pub fn new(root: PathBuf, proxy: EventLoopProxy<ViewerEvent>) -> Self {
        Self { root, proxy }
    }
}

impl AssetLoader for GltfLoader {
    fn load(&mut self, source_id: &str) -> Result<(), AssetLoadError> {
        let root = self.root.clone();
        let source = source_id.to_string();
        let proxy = self.proxy.clone();

        thread::Builder::new()
            .name("vitrine-loader".to_string())
            .spawn(move || {
                load_blocking(&root, &source, &mut |event| {
                    if proxy.send_event(ViewerEvent::Load(event)).is_err() {
                        log::debug!("Event loop closed; dropping load event for '{source}'");
                    }
                });
            })
            .map_err(|e| AssetLoadError::new(source_id, e))?;
        Ok(())
    }
}
