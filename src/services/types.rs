//! Request and response bodies exchanged with the backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::{Config, RenderMode};
use crate::geo::Polygon;

/// Body of `POST /api/agent/run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRunRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub area_hectares: f64,
    pub mode: RenderMode,
}

impl AgentRunRequest {
    pub fn from_config(config: &Config) -> Self {
        Self {
            latitude: config.latitude,
            longitude: config.longitude,
            area_hectares: config.area_hectares,
            mode: config.mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    pub analysis_data: Option<Value>,
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub polygon_geojson: Polygon,
    pub panel_tilt_deg: f64,
    pub panel_azimuth_deg: f64,
    pub row_spacing_m: f64,
    pub module_width_m: f64,
    pub module_height_m: f64,
    pub module_power_wc: f64,
    pub system_loss_pct: f64,
    pub albedo: f64,
}

impl AnalysisRequest {
    /// Fills module and array parameters from the configured defaults.
    pub fn for_zone(config: &Config, polygon: Polygon, azimuth_deg: f64) -> Self {
        let p = &config.panels;
        Self {
            latitude: config.latitude,
            longitude: config.longitude,
            polygon_geojson: polygon,
            panel_tilt_deg: p.tilt_deg,
            panel_azimuth_deg: azimuth_deg,
            row_spacing_m: p.row_spacing_m,
            module_width_m: p.module_width_m,
            module_height_m: p.module_height_m,
            module_power_wc: p.module_power_wc,
            system_loss_pct: p.system_loss_pct,
            albedo: p.albedo,
        }
    }
}

/// Analysis payload produced by `analyze` or by the agent's `analysis` frame.
///
/// Every section is optional so that a partial payload still decodes; fields
/// this client does not model are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_info: Option<SiteInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solar_data: Option<SolarData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_info: Option<YieldInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_analysis: Option<ShadowAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmaps: Option<Heatmaps>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    /// Panel footprints from the layout, in backend order.
    pub fn panel_footprints(&self) -> Vec<&Polygon> {
        self.layout
            .as_ref()
            .map(|l| l.panels_geojson.features.iter().map(|f| &f.geometry).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub longitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub altitude_m: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub timezone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub polygon_area_m2: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub terrain_classification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarData {
    #[serde(deserialize_with = "null_as_default")]
    pub annual_ghi_kwh_m2: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub annual_dni_kwh_m2: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub optimal_tilt_deg: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub avg_temp_c: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub avg_wind_speed_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub panels_geojson: PanelCollection,
    #[serde(deserialize_with = "null_as_default")]
    pub n_panels: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub n_rows: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub row_spacing_m: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_module_area_m2: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub ground_coverage_ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelCollection {
    #[serde(deserialize_with = "null_as_default")]
    pub features: Vec<PanelFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelFeature {
    pub geometry: Polygon,
    #[serde(default)]
    pub properties: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub installed_capacity_kwc: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub installed_capacity_mwc: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub annual_yield_kwh: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub specific_yield_kwh_kwp: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub performance_ratio: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub lcoe_eur_mwh: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub co2_avoided_tons_yr: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowAnalysis {
    #[serde(deserialize_with = "null_as_default")]
    pub annual_shadow_loss_pct: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub winter_solstice_shadow_loss_pct: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub summer_solstice_shadow_loss_pct: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub shadow_matrix: String,
    #[serde(deserialize_with = "null_as_default")]
    pub optimal_spacing_m: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub shadow_timestamps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heatmaps {
    #[serde(deserialize_with = "null_as_default")]
    pub summer: HeatmapSeason,
    #[serde(deserialize_with = "null_as_default")]
    pub winter: HeatmapSeason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapSeason {
    #[serde(deserialize_with = "null_as_default")]
    pub grid: Vec<Vec<f64>>,
    #[serde(deserialize_with = "null_as_default")]
    pub bounds: BTreeMap<String, f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub resolution_m: f64,
}

/// Result of the agent's 3D generation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelResult {
    #[serde(deserialize_with = "null_as_default")]
    pub render_image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub model_glb_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub thumbnail_url: String,
}

/// Reads an explicit `null` as the field's default, the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_analysis_decodes() {
        let value = json!({
            "site_info": { "latitude": 23.7, "longitude": -15.9 },
            "layout": {
                "n_panels": 2,
                "panels_geojson": { "type": "FeatureCollection", "features": [
                    { "type": "Feature", "properties": { "row": 0, "col": 0 },
                      "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]] } }
                ]}
            },
            "summary": { "annual_yield_mwh": 12.5 }
        });
        let result: AnalysisResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.site_info.as_ref().unwrap().latitude, 23.7);
        assert_eq!(result.panel_footprints().len(), 1);
        assert!(result.yield_info.is_none());
        assert!(result.extra.contains_key("summary"));
    }

    #[test]
    fn test_render_mode_wire_name() {
        let req = AgentRunRequest {
            latitude: 1.0,
            longitude: 2.0,
            area_hectares: 5.0,
            mode: RenderMode::Demo,
        };
        assert_eq!(serde_json::to_value(&req).unwrap()["mode"], "demo");
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let value = json!({
            "site_info": { "latitude": 23.7, "timezone": null, "terrain_classification": null },
            "yield_info": { "annual_yield_kwh": 9.0, "lcoe_eur_mwh": null },
            "layout": { "panels_geojson": { "features": null }, "n_panels": null },
            "shadow_analysis": { "shadow_timestamps": null }
        });
        let result: AnalysisResult = serde_json::from_value(value).unwrap();
        let site = result.site_info.as_ref().unwrap();
        assert_eq!(site.timezone, "");
        assert_eq!(site.latitude, 23.7);
        assert_eq!(result.yield_info.as_ref().unwrap().lcoe_eur_mwh, 0.0);
        assert!(result.panel_footprints().is_empty());
        assert!(result.shadow_analysis.unwrap().shadow_timestamps.is_empty());
    }
}
