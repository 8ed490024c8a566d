//! Numeric and categorical classification of an attribute column into colors.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use super::colormap::{Color, ColorRamp};
use crate::geo::feature::{AttributeValue, ColumnKind, Feature, FeatureCollection};

/// Number of most frequent categories that get their own color
pub const DEFAULT_TOP_K: usize = 5;

/// Continuous classification over a numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericClassification {
    pub column: String,
    /// None when every value is missing
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub ramp: ColorRamp,
}

impl NumericClassification {
    /// Compute min/max over the non-missing values
    pub fn from_values<I>(column: &str, values: I, ramp: ColorRamp) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;
        for v in values.into_iter().flatten() {
            min = Some(min.map_or(v, |m| m.min(v)));
            max = Some(max.map_or(v, |m| m.max(v)));
        }
        Self {
            column: column.to_string(),
            min,
            max,
            ramp,
        }
    }

    /// Color for a value; missing values get `default`
    pub fn color_for(&self, value: Option<f64>, default: Color) -> Color {
        match (value, self.min, self.max) {
            (Some(v), Some(min), Some(max)) => self.ramp.map(v, min, max),
            _ => default,
        }
    }
}

/// The bucket a feature falls into under a categorical classification.
///
/// Serialized adjacently tagged: `{"kind": "value", "value": "Europe"}` or
/// `{"kind": "other"}`, so a literal "Other" category stays distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CategoryKey {
    Value(String),
    /// Everything outside the top K, including missing values
    Other,
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKey::Value(v) => f.write_str(v),
            CategoryKey::Other => f.write_str("Other"),
        }
    }
}

/// One row of the category → color mapping
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryEntry {
    pub key: CategoryKey,
    pub color: Color,
    /// Number of features in this bucket
    pub count: usize,
}

/// Top-K-plus-Other classification over a categorical column.
///
/// `entries` always holds `min(distinct, K) + 1` rows, ranked by frequency
/// with the Other bucket last.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalClassification {
    pub column: String,
    pub entries: Vec<CategoryEntry>,
}

impl CategoricalClassification {
    /// Rank values by frequency (ties keep first-appearance order) and
    /// assign ramp colors, cycling the ramp when it is too short.
    pub fn from_values<I>(column: &str, values: I, ramp: &ColorRamp, top_k: usize) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut missing = 0usize;
        for (idx, value) in values.into_iter().enumerate() {
            match value {
                Some(v) => counts.entry(v).or_insert((0, idx)).0 += 1,
                None => missing += 1,
            }
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(value, (count, first))| (value, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let top = ranked.len().min(top_k);
        let colors = ramp.cycled(top + 1);

        let other_count = missing + ranked[top..].iter().map(|r| r.1).sum::<usize>();

        let mut entries: Vec<CategoryEntry> = ranked
            .into_iter()
            .take(top)
            .zip(colors.iter())
            .map(|((value, count, _), color)| CategoryEntry {
                key: CategoryKey::Value(value),
                color: *color,
                count,
            })
            .collect();
        entries.push(CategoryEntry {
            key: CategoryKey::Other,
            color: colors[top],
            count: other_count,
        });

        Self {
            column: column.to_string(),
            entries,
        }
    }

    /// Bucket a raw attribute value
    pub fn bucket(&self, value: Option<&AttributeValue>) -> CategoryKey {
        match value.and_then(|v| v.category_label()) {
            Some(label) => {
                let in_top = self
                    .entries
                    .iter()
                    .any(|e| matches!(&e.key, CategoryKey::Value(v) if *v == label));
                if in_top {
                    CategoryKey::Value(label)
                } else {
                    CategoryKey::Other
                }
            }
            None => CategoryKey::Other,
        }
    }

    pub fn color_of(&self, key: &CategoryKey) -> Option<Color> {
        self.entries.iter().find(|e| &e.key == key).map(|e| e.color)
    }

    /// Color for a raw attribute value
    pub fn color_for(&self, value: Option<&AttributeValue>, default: Color) -> Color {
        self.color_of(&self.bucket(value)).unwrap_or(default)
    }
}

/// Classification metadata for a styled column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Classification {
    Numeric(NumericClassification),
    Categorical(CategoricalClassification),
}

impl Classification {
    pub fn column(&self) -> &str {
        match self {
            Classification::Numeric(n) => &n.column,
            Classification::Categorical(c) => &c.column,
        }
    }

    /// Color for one feature, falling back to `default` for missing values
    pub fn color_for(&self, feature: &Feature, default: Color) -> Color {
        match self {
            Classification::Numeric(n) => n.color_for(
                feature.property(self.column()).and_then(|v| v.as_f64()),
                default,
            ),
            Classification::Categorical(c) => c.color_for(feature.property(self.column()), default),
        }
    }
}

/// Classify a column of a feature collection.
///
/// Returns None when no feature carries the column; styling then falls
/// back to the default fill.
pub fn classify(
    collection: &FeatureCollection,
    column: &str,
    ramp: &ColorRamp,
    top_k: usize,
) -> Option<Classification> {
    let kind = match collection.column_kind(column) {
        Some(kind) => kind,
        None => {
            warn!(column = column, "Column not found, skipping classification");
            return None;
        }
    };

    let classification = match kind {
        ColumnKind::Numeric => {
            let values = collection
                .features
                .iter()
                .map(|f| f.property(column).and_then(|v| v.as_f64()));
            let numeric = NumericClassification::from_values(column, values, ramp.clone());
            debug!(
                column = column,
                min = ?numeric.min,
                max = ?numeric.max,
                "Numeric classification"
            );
            Classification::Numeric(numeric)
        }
        ColumnKind::Categorical => {
            let values = collection
                .features
                .iter()
                .map(|f| f.property(column).and_then(|v| v.category_label()));
            let categorical = CategoricalClassification::from_values(column, values, ramp, top_k);
            debug!(
                column = column,
                categories = categorical.entries.len(),
                "Categorical classification"
            );
            Classification::Categorical(categorical)
        }
    };

    Some(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormaps::schemes::ColorScheme;
    use crate::geo::crs::Crs;
    use geo_types::{point, Geometry};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn feature_with(name: &str, value: AttributeValue) -> Feature {
        Feature::new(Geometry::Point(point!(x: 0.0, y: 0.0))).with_property(name, value)
    }

    #[test]
    fn test_numeric_min_max_ignores_missing() {
        let ramp = ColorScheme::Viridis.ramp();
        let n = NumericClassification::from_values(
            "v",
            vec![Some(100.0), None, Some(200.0), Some(150.0)],
            ramp.clone(),
        );
        assert_eq!(n.min, Some(100.0));
        assert_eq!(n.max, Some(200.0));
        assert_eq!(n.color_for(Some(100.0), Color::WHITE), ramp.first());
        assert_eq!(n.color_for(Some(200.0), Color::WHITE), ramp.last());
        assert_eq!(n.color_for(None, Color::WHITE), Color::WHITE);
    }

    #[test]
    fn test_numeric_all_missing_uses_default() {
        let n = NumericClassification::from_values("v", vec![None, None], ColorScheme::Blues.ramp());
        assert_eq!(n.min, None);
        assert_eq!(n.color_for(Some(1.0), Color::BLACK), Color::BLACK);
    }

    #[test]
    fn test_numeric_constant_column() {
        let ramp = ColorScheme::Reds.ramp();
        let n = NumericClassification::from_values("v", vec![Some(7.0), Some(7.0)], ramp.clone());
        assert_eq!(n.color_for(Some(7.0), Color::BLACK), ramp.first());
    }

    #[test]
    fn test_categorical_top_k_plus_other() {
        let ramp = ColorScheme::Viridis.ramp();
        let values = ["a", "b", "a", "c", "d", "e", "f", "g", "a", "b"]
            .iter()
            .map(|s| Some(s.to_string()));
        let c = CategoricalClassification::from_values("kind", values, &ramp, 5);

        assert_eq!(c.entries.len(), 6);
        assert_eq!(c.entries[0].key, CategoryKey::Value("a".to_string()));
        assert_eq!(c.entries[0].count, 3);
        assert_eq!(c.entries[1].key, CategoryKey::Value("b".to_string()));
        // Ties keep first appearance: c, d, e
        assert_eq!(c.entries[2].key, CategoryKey::Value("c".to_string()));
        assert_eq!(c.entries[4].key, CategoryKey::Value("e".to_string()));
        assert_eq!(c.entries[5].key, CategoryKey::Other);
        assert_eq!(c.entries[5].count, 2);

        // Viridis has 4 stops, so 6 colors cycle back to the start
        let colors = ramp.cycled(6);
        for (entry, color) in c.entries.iter().zip(colors) {
            assert_eq!(entry.color, color);
        }
    }

    #[test]
    fn test_categorical_fewer_than_k() {
        let ramp = ColorScheme::Blues.ramp();
        let values = vec![Some("x".to_string()), None, Some("y".to_string())];
        let c = CategoricalClassification::from_values("kind", values, &ramp, 5);
        assert_eq!(c.entries.len(), 3);
        assert_eq!(c.entries[2].key, CategoryKey::Other);
        assert_eq!(c.entries[2].count, 1);
        assert_eq!(c.entries[2].color, ramp.stops()[2]);
    }

    #[test]
    fn test_literal_other_value_does_not_collide() {
        let ramp = ColorScheme::Blues.ramp();
        let values = vec![Some("Other".to_string()), Some("x".to_string())];
        let c = CategoricalClassification::from_values("kind", values, &ramp, 5);
        assert_eq!(c.entries.len(), 3);
        assert_eq!(
            c.bucket(Some(&AttributeValue::from("Other"))),
            CategoryKey::Value("Other".to_string())
        );
    }

    #[test]
    fn test_other_bucket_serializes_as_tagged_key() {
        let ramp = ColorScheme::Blues.ramp();
        let values = vec![Some("Other".to_string()), None];
        let c = CategoricalClassification::from_values("kind", values, &ramp, 5);

        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["entries"][0]["key"], json!({"kind": "value", "value": "Other"}));
        assert_eq!(json["entries"][1]["key"], json!({"kind": "other"}));
        assert_eq!(json["entries"][1]["count"], json!(1));
    }

    #[test]
    fn test_every_feature_maps_to_an_entry() {
        let kinds = ["road", "rail", "road", "path", "canal", "road", "ferry", "trail", "lane"];
        let mut features: Vec<Feature> = kinds
            .iter()
            .map(|k| feature_with("kind", AttributeValue::from(*k)))
            .collect();
        features.push(feature_with("kind", AttributeValue::Null));
        let fc = FeatureCollection::new(features, Crs::WGS84);

        let classification = classify(&fc, "kind", &ColorScheme::Warm.ramp(), DEFAULT_TOP_K).unwrap();
        let cat = match &classification {
            Classification::Categorical(c) => c,
            other => panic!("expected categorical, got {:?}", other),
        };

        let distinct = 7;
        assert_eq!(cat.entries.len(), distinct.min(DEFAULT_TOP_K) + 1);
        for f in &fc.features {
            let key = cat.bucket(f.property("kind"));
            assert!(cat.color_of(&key).is_some(), "no entry for {}", key);
        }
    }

    #[test]
    fn test_classify_dispatches_on_column_kind() {
        let fc = FeatureCollection::new(
            vec![
                feature_with("v", AttributeValue::Number(1.0)),
                feature_with("v", AttributeValue::Number(3.0)),
            ],
            Crs::WGS84,
        );
        let ramp = ColorScheme::Blues.ramp();
        assert!(matches!(
            classify(&fc, "v", &ramp, 5),
            Some(Classification::Numeric(_))
        ));
        assert!(classify(&fc, "absent", &ramp, 5).is_none());
    }
}
