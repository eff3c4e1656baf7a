pub mod loading_overlay;

pub use loading_overlay::{IndicatorGeometry, LoadingOverlay, OverlayLayers};
