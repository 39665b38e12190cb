use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

/// Corner, center and size of an element's bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSet {
    #[serde(alias = "topLeft")]
    pub top_left: Coordinates,
    #[serde(alias = "topRight")]
    pub top_right: Coordinates,
    #[serde(alias = "bottomLeft")]
    pub bottom_left: Coordinates,
    #[serde(alias = "bottomRight")]
    pub bottom_right: Coordinates,
    pub center: Coordinates,
    pub width: f64,
    pub height: f64,
}

impl CoordinateSet {
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            top_left: Coordinates { x, y },
            top_right: Coordinates { x: x + width, y },
            bottom_left: Coordinates { x, y: y + height },
            bottom_right: Coordinates {
                x: x + width,
                y: y + height,
            },
            center: Coordinates {
                x: x + width / 2.0,
                y: y + height / 2.0,
            },
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportInfo {
    #[serde(default, alias = "scrollX", skip_serializing_if = "Option::is_none")]
    pub scroll_x: Option<f64>,
    #[serde(default, alias = "scrollY", skip_serializing_if = "Option::is_none")]
    pub scroll_y: Option<f64>,
    pub width: u32,
    pub height: u32,
}

impl ViewportInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            scroll_x: None,
            scroll_y: None,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_set_from_rect() {
        let set = CoordinateSet::from_rect(10.0, 20.0, 100.0, 40.0);
        assert_eq!(set.center, Coordinates { x: 60.0, y: 40.0 });
        assert_eq!(set.bottom_right, Coordinates { x: 110.0, y: 60.0 });
    }

    #[test]
    fn test_coordinate_set_accepts_extractor_names() {
        let json = serde_json::json!({
            "topLeft": {"x": 0, "y": 0},
            "topRight": {"x": 4, "y": 0},
            "bottomLeft": {"x": 0, "y": 2},
            "bottomRight": {"x": 4, "y": 2},
            "center": {"x": 2, "y": 1},
            "width": 4,
            "height": 2
        });
        let set: CoordinateSet = serde_json::from_value(json).unwrap();
        assert_eq!(set, CoordinateSet::from_rect(0.0, 0.0, 4.0, 2.0));
    }
}
