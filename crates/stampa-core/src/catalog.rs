//! Typed descriptors for external asset catalogs.
//!
//! The engine consumes fonts, gallery shapes and product side definitions
//! from outside services; these are the payload shapes it expects.

use serde::{Deserialize, Serialize};

/// A font offered by the font catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontAsset {
    pub family: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub weight: String,
    pub url: String,
}

/// A gallery shape or clipart asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeAsset {
    pub name: String,
    pub category: String,
    /// Usable as a clipping mask for image elements.
    #[serde(default)]
    pub is_mask: bool,
    pub file_url: String,
    pub file_type: String,
}

/// A printable side of a product, as the product catalog defines it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSide {
    pub id: String,
    pub name: String,
    pub width: f64,
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_asset_defaults() {
        let json = r#"{
            "name": "star-burst",
            "category": "badges",
            "file_url": "https://assets.example/star-burst.svg",
            "file_type": "svg"
        }"#;
        let asset: ShapeAsset = serde_json::from_str(json).unwrap();
        assert!(!asset.is_mask);
        assert_eq!(asset.category, "badges");
    }

    #[test]
    fn test_product_side_round_trip() {
        let side = ProductSide {
            id: "front".into(),
            name: "Front".into(),
            width: 400.0,
            height: 600.0,
        };
        let json = serde_json::to_string(&side).unwrap();
        assert_eq!(serde_json::from_str::<ProductSide>(&json).unwrap(), side);
    }
}
