//! OGC WMS client-side protocol support.
//!
//! Supports:
//! - Building WMS 1.3.0 GetCapabilities, GetMap and GetLegendGraphic requests
//! - Extracting a layer's time dimension and styles from a capabilities document

pub mod capabilities;
pub mod request;

pub use capabilities::{find_layer, time_dimension, LayerCapabilities};
pub use request::{capabilities_request, legend_request, MapRequest, ResourceRequest, WMS_VERSION};
