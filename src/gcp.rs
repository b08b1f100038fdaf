//! Ground control points

/// Ground Control Point (GCP) used to georeference a raster.
///
/// Ties the pixel/line position `(pixel, line)` of an image to the
/// georeferenced location `(x, y, z)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gcp {
    pub id: String,
    pub info: Option<String>,
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Gcp {
    /// A GCP with an empty id and zero elevation.
    pub fn new(pixel: f64, line: f64, x: f64, y: f64) -> Self {
        Gcp {
            id: String::new(),
            info: None,
            pixel,
            line,
            x,
            y,
            z: 0.0,
        }
    }

    /// Same GCP with the given `id`.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Bounding ranges of a GCP set, in pixel/line and georeferenced space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GcpExtent {
    pub min_pixel: f64,
    pub max_pixel: f64,
    pub min_line: f64,
    pub max_line: f64,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Ranges narrower than this are treated as degenerate.
pub(crate) const EXTENT_EPSILON: f64 = 1.0e-12;

impl GcpExtent {
    /// `None` for an empty slice.
    pub fn of(gcps: &[Gcp]) -> Option<Self> {
        let first = gcps.first()?;
        let mut extent = GcpExtent {
            min_pixel: first.pixel,
            max_pixel: first.pixel,
            min_line: first.line,
            max_line: first.line,
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
        };
        for gcp in &gcps[1..] {
            extent.min_pixel = extent.min_pixel.min(gcp.pixel);
            extent.max_pixel = extent.max_pixel.max(gcp.pixel);
            extent.min_line = extent.min_line.min(gcp.line);
            extent.max_line = extent.max_line.max(gcp.line);
            extent.min_x = extent.min_x.min(gcp.x);
            extent.max_x = extent.max_x.max(gcp.x);
            extent.min_y = extent.min_y.min(gcp.y);
            extent.max_y = extent.max_y.max(gcp.y);
        }
        Some(extent)
    }

    /// Whether any of the four ranges is narrower than [`EXTENT_EPSILON`].
    pub fn is_degenerate(&self) -> bool {
        (self.max_pixel - self.min_pixel).abs() < EXTENT_EPSILON
            || (self.max_line - self.min_line).abs() < EXTENT_EPSILON
            || (self.max_x - self.min_x).abs() < EXTENT_EPSILON
            || (self.max_y - self.min_y).abs() < EXTENT_EPSILON
    }
}
