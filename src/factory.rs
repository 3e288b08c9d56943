use serde::{Deserialize, Serialize};

use entente_domain::{Deadline, Domain, UtilityFunction};
use entente_strategy::{BidPolicyConfig, ConcessionConfig};

use crate::engine::Engine;

/// Full engine configuration. Every field has a default, so drivers can
/// supply only the knobs they care about.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub name: String,
    /// Seed for the sampling steps. `None` draws from entropy; tests pin
    /// it for reproducible action sequences.
    pub seed: Option<u64>,
    /// Multiplier applied to the base threshold at session start.
    pub opening_markup: f64,
    pub concession: ConcessionConfig,
    pub bidding: BidPolicyConfig,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            name: "entente".to_string(),
            seed: None,
            opening_markup: 1.125,
            concession: Default::default(),
            bidding: Default::default(),
        }
    }
}

/// Builds an engine from yaml parameters, the way session drivers load
/// negotiator definitions from their config files.
pub fn create_engine(
    domain: Domain,
    utility: Box<dyn UtilityFunction>,
    deadline: Deadline,
    params: serde_yaml::Value,
    history: Option<serde_json::Value>,
) -> anyhow::Result<Engine> {
    let config: EngineConfig = serde_yaml::from_value(params)?;
    Ok(Engine::new(domain, utility, deadline, config, history)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NegotiationParty;
    use entente_domain::Offer;

    fn domain() -> Domain {
        Domain::new(vec![("price".into(), vec!["low".into(), "high".into()])]).unwrap()
    }

    fn scoring(offer: &Offer) -> f64 {
        match offer.value(&"price".into()).map(|value| value.as_str()) {
            Some("high") => 1.0,
            _ => 0.2,
        }
    }

    #[test]
    fn engine_config_roundtrips_through_yaml() {
        let config = EngineConfig {
            seed: Some(7),
            ..Default::default()
        };
        let serialized = serde_yaml::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_yaml::from_str(&serialized).unwrap();
        assert_eq!(parsed.seed, Some(7));
        assert_eq!(parsed.name, config.name);
    }

    #[test]
    fn create_engine_accepts_partial_config() {
        let params = serde_yaml::from_str(
            r#"
            name: tester
            seed: 13
            concession:
              base_threshold: 0.7
            "#,
        )
        .unwrap();
        let engine = create_engine(
            domain(),
            Box::new(scoring),
            Deadline::Rounds(50),
            params,
            None,
        )
        .unwrap();
        assert!(engine.describe().starts_with("tester"));
    }

    #[test]
    fn create_engine_rejects_malformed_config() {
        let params = serde_yaml::from_str("seed: not-a-number\n").unwrap();
        assert!(create_engine(
            domain(),
            Box::new(scoring),
            Deadline::Rounds(50),
            params,
            None,
        )
        .is_err());
    }
}
