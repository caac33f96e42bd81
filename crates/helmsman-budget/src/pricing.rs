//! Pricing table and cost estimation.
//!
//! The estimator is a pure function over a pricing table snapshot: no
//! I/O, deterministic for the same inputs. Unknown resource types price
//! at zero with zero confidence so that budget checks degrade gracefully
//! instead of blocking unknown operations outright.

use std::collections::HashMap;

use helmsman_core::Intent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Billing hours per month used to project hourly prices.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Specification of one resource to be priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// The resource type (e.g., "vm", "vm_gpu", "database").
    pub resource_type: String,

    /// Number of instances.
    pub count: u32,

    /// Target region, if any.
    pub region: Option<String>,

    /// Additional attributes, opaque to the estimator.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ResourceSpec {
    /// Create a spec for `count` instances of a resource type.
    pub fn new(resource_type: impl Into<String>, count: u32) -> Self {
        Self {
            resource_type: resource_type.into(),
            count,
            region: None,
            attributes: Map::new(),
        }
    }

    /// Set the target region.
    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Derive resource specs from an intent.
    ///
    /// An explicit `resources` parameter array wins; otherwise the
    /// operation name is interpreted (`provision_vm` with `count` and
    /// `gpu` parameters, `create_bucket`, and so on).
    pub fn from_intent(intent: &Intent) -> Vec<ResourceSpec> {
        if let Some(Value::Array(entries)) = intent.parameter("resources") {
            return entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect();
        }

        let resource_type = match intent
            .operation
            .strip_prefix("provision_")
            .or_else(|| intent.operation.strip_prefix("create_"))
        {
            Some(suffix) => suffix.to_string(),
            None => return Vec::new(),
        };

        let gpu = intent
            .parameter("gpu")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let resource_type = if resource_type == "vm" && gpu {
            "vm_gpu".to_string()
        } else {
            resource_type
        };

        let count = intent.parameter_u64("count").unwrap_or(1) as u32;
        let region = intent.parameter_str("region").map(|s| s.to_string());

        vec![ResourceSpec {
            resource_type,
            count,
            region,
            attributes: Map::new(),
        }]
    }
}

/// Price of one resource type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourcePrice {
    /// Recurring hourly price per instance.
    pub hourly: f64,

    /// One-time setup price per instance.
    pub one_time: f64,
}

/// Static pricing table, read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingTable {
    /// Price per resource type.
    pub prices: HashMap<String, ResourcePrice>,

    /// Regional price multipliers. A missing region falls back to 1.0.
    pub regional_multipliers: HashMap<String, f64>,
}

impl PricingTable {
    /// Baseline table covering the common resource types.
    pub fn builtin() -> Self {
        let mut prices = HashMap::new();
        prices.insert("vm".into(), ResourcePrice { hourly: 0.0416, one_time: 0.0 });
        prices.insert("vm_gpu".into(), ResourcePrice { hourly: 0.90, one_time: 0.0 });
        prices.insert("database".into(), ResourcePrice { hourly: 0.068, one_time: 0.0 });
        prices.insert("load_balancer".into(), ResourcePrice { hourly: 0.025, one_time: 0.0 });
        prices.insert("kubernetes_cluster".into(), ResourcePrice { hourly: 0.10, one_time: 0.0 });
        prices.insert("bucket".into(), ResourcePrice { hourly: 0.0, one_time: 0.0 });
        prices.insert("storage_gb".into(), ResourcePrice { hourly: 0.000032, one_time: 0.0 });
        prices.insert("static_ip".into(), ResourcePrice { hourly: 0.005, one_time: 0.0 });

        let mut regional_multipliers = HashMap::new();
        regional_multipliers.insert("us-east-1".into(), 1.0);
        regional_multipliers.insert("us-west-2".into(), 1.02);
        regional_multipliers.insert("eu-west-1".into(), 1.05);
        regional_multipliers.insert("ap-southeast-1".into(), 1.15);
        regional_multipliers.insert("sa-east-1".into(), 1.25);

        Self {
            prices,
            regional_multipliers,
        }
    }

    /// Multiplier for a region, falling back to the baseline 1.0.
    pub fn multiplier(&self, region: Option<&str>) -> f64 {
        region
            .and_then(|r| self.regional_multipliers.get(r))
            .copied()
            .unwrap_or(1.0)
    }
}

/// One line of an estimate's breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostLine {
    /// The resource type priced by this line.
    pub resource_type: String,

    /// Number of instances.
    pub count: u32,

    /// Hourly cost of the line.
    pub hourly: f64,

    /// Monthly cost of the line.
    pub monthly: f64,

    /// False if the resource type was absent from the pricing table.
    pub known: bool,
}

/// The result of a cost estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Total recurring hourly cost.
    pub hourly: f64,

    /// Total recurring monthly cost.
    pub monthly: f64,

    /// Total one-time cost.
    pub one_time: f64,

    /// Fraction of lines the table could price (0.0 to 1.0).
    pub confidence: f64,

    /// Per-resource breakdown.
    pub breakdown: Vec<CostLine>,
}

impl CostEstimate {
    /// A zero estimate with zero confidence.
    pub fn zero() -> Self {
        Self {
            hourly: 0.0,
            monthly: 0.0,
            one_time: 0.0,
            confidence: 0.0,
            breakdown: Vec::new(),
        }
    }
}

/// Pure cost estimator over a pricing table snapshot.
#[derive(Debug, Clone)]
pub struct CostEstimator {
    table: PricingTable,
}

impl CostEstimator {
    /// Create an estimator over the given table.
    pub fn new(table: PricingTable) -> Self {
        Self { table }
    }

    /// Estimate the cost of the given resource specs in a region.
    ///
    /// Multi-resource specs sum linearly (no volume discounts). A spec's
    /// own region overrides the call-level region for its line.
    pub fn estimate(&self, specs: &[ResourceSpec], region: Option<&str>) -> CostEstimate {
        if specs.is_empty() {
            return CostEstimate::zero();
        }

        let mut breakdown = Vec::with_capacity(specs.len());
        let mut hourly = 0.0;
        let mut one_time = 0.0;
        let mut known_lines = 0usize;

        for spec in specs {
            let line_region = spec.region.as_deref().or(region);
            let multiplier = self.table.multiplier(line_region);

            let line = match self.table.prices.get(&spec.resource_type) {
                Some(price) => {
                    known_lines += 1;
                    let line_hourly = price.hourly * spec.count as f64 * multiplier;
                    one_time += price.one_time * spec.count as f64;
                    CostLine {
                        resource_type: spec.resource_type.clone(),
                        count: spec.count,
                        hourly: line_hourly,
                        monthly: line_hourly * HOURS_PER_MONTH,
                        known: true,
                    }
                }
                None => CostLine {
                    resource_type: spec.resource_type.clone(),
                    count: spec.count,
                    hourly: 0.0,
                    monthly: 0.0,
                    known: false,
                },
            };

            hourly += line.hourly;
            breakdown.push(line);
        }

        CostEstimate {
            hourly,
            monthly: hourly * HOURS_PER_MONTH,
            one_time,
            confidence: known_lines as f64 / specs.len() as f64,
            breakdown,
        }
    }
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(PricingTable::builtin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_resource_estimate() {
        let estimator = CostEstimator::default();
        let estimate = estimator.estimate(&[ResourceSpec::new("vm", 3)], None);

        assert!((estimate.hourly - 3.0 * 0.0416).abs() < 1e-9);
        assert!((estimate.monthly - estimate.hourly * HOURS_PER_MONTH).abs() < 1e-9);
        assert_eq!(estimate.confidence, 1.0);
        assert_eq!(estimate.breakdown.len(), 1);
        assert!(estimate.breakdown[0].known);
    }

    #[test]
    fn test_unknown_resource_is_zero_confidence_not_error() {
        let estimator = CostEstimator::default();
        let estimate = estimator.estimate(&[ResourceSpec::new("quantum_annealer", 1)], None);

        assert_eq!(estimate.monthly, 0.0);
        assert_eq!(estimate.confidence, 0.0);
        assert!(!estimate.breakdown[0].known);
    }

    #[test]
    fn test_mixed_specs_sum_linearly_with_partial_confidence() {
        let estimator = CostEstimator::default();
        let estimate = estimator.estimate(
            &[
                ResourceSpec::new("vm", 2),
                ResourceSpec::new("quantum_annealer", 1),
            ],
            None,
        );

        assert!((estimate.hourly - 2.0 * 0.0416).abs() < 1e-9);
        assert_eq!(estimate.confidence, 0.5);
    }

    #[test]
    fn test_missing_regional_multiplier_falls_back_to_baseline() {
        let estimator = CostEstimator::default();
        let baseline = estimator.estimate(&[ResourceSpec::new("vm", 1)], None);
        let unknown_region = estimator.estimate(&[ResourceSpec::new("vm", 1)], Some("mars-north-1"));
        assert_eq!(baseline.hourly, unknown_region.hourly);
    }

    #[test]
    fn test_regional_multiplier_applies() {
        let estimator = CostEstimator::default();
        let base = estimator.estimate(&[ResourceSpec::new("vm", 1)], Some("us-east-1"));
        let sa = estimator.estimate(&[ResourceSpec::new("vm", 1)], Some("sa-east-1"));
        assert!((sa.hourly - base.hourly * 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_estimator_is_deterministic() {
        let estimator = CostEstimator::default();
        let specs = vec![ResourceSpec::new("vm_gpu", 2), ResourceSpec::new("database", 1)];
        let a = estimator.estimate(&specs, Some("eu-west-1"));
        let b = estimator.estimate(&specs, Some("eu-west-1"));
        assert_eq!(a.monthly, b.monthly);
        assert_eq!(a.confidence, b.confidence);
    }

    #[test]
    fn test_specs_from_intent_operation() {
        let intent = Intent::builder()
            .operation("provision_vm")
            .parameter("count", 3)
            .parameter("gpu", true)
            .parameter("region", "eu-west-1")
            .build()
            .unwrap();

        let specs = ResourceSpec::from_intent(&intent);
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].resource_type, "vm_gpu");
        assert_eq!(specs[0].count, 3);
        assert_eq!(specs[0].region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_specs_from_explicit_resources_parameter() {
        let intent = Intent::builder()
            .operation("deploy_stack")
            .parameter(
                "resources",
                serde_json::json!([
                    {"resource_type": "vm", "count": 2},
                    {"resource_type": "load_balancer", "count": 1}
                ]),
            )
            .build()
            .unwrap();

        let specs = ResourceSpec::from_intent(&intent);
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[1].resource_type, "load_balancer");
    }

    #[test]
    fn test_specs_from_unrecognized_operation_is_empty() {
        let intent = Intent::builder().operation("restart_vm").build().unwrap();
        assert!(ResourceSpec::from_intent(&intent).is_empty());
    }
}
