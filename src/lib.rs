//! HTTP service that renders JSON text-and-styling descriptions into
//! SVG, PNG, or JPEG images. Built for placeholder/OG-image generation.
//!
//! The pipeline: a validated request is merged into immutable
//! [`params::ResolvedParams`], each text block's markup is normalized
//! ([`markup`]), its position computed ([`layout`]), and the result drawn
//! as a vector document ([`render`]) that is rasterized on demand.

pub mod fonts;
pub mod layout;
pub mod logging;
pub mod markup;
pub mod params;
pub mod render;
pub mod server;
pub mod settings;
