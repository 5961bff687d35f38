mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	AttributeRecall, Config, Fusion, ItemSeedExpansion, NeighborRecall, Recall, RecallCache,
	Retrieval, STRATEGY_NAMES, Service, Snapshot, UserSeedExpansion,
};

use std::{fs, path::Path};

const SCORE_MAPPINGS: [&str; 4] = ["off", "ranking", "balanced", "exploration"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	validate_recall(&cfg.recall)?;
	validate_fusion(&cfg.fusion)?;
	validate_retrieval(&cfg.retrieval)?;

	Ok(())
}

fn validate_recall(recall: &Recall) -> Result<()> {
	if recall.max_concurrency == 0 {
		return Err(Error::Validation {
			message: "recall.max_concurrency must be greater than zero.".to_string(),
		});
	}
	if recall.strategy_timeout_ms == Some(0) {
		return Err(Error::Validation {
			message: "recall.strategy_timeout_ms must be greater than zero when set.".to_string(),
		});
	}
	if !SCORE_MAPPINGS.contains(&recall.score_mapping.as_str()) {
		return Err(Error::Validation {
			message:
				"recall.score_mapping must be one of off, ranking, balanced, or exploration."
					.to_string(),
		});
	}
	if recall.strategies.is_empty() {
		return Err(Error::Validation {
			message: "recall.strategies must be non-empty.".to_string(),
		});
	}

	validate_strategy_names("recall.strategies", &recall.strategies)?;

	for (scene, names) in &recall.scenes {
		validate_strategy_names(&format!("recall.scenes.{scene}"), names)?;
	}
	for (name, weight) in &recall.weights {
		validate_strategy_names("recall.weights", std::slice::from_ref(name))?;

		if !weight.is_finite() || *weight < 0.0 {
			return Err(Error::Validation {
				message: format!("recall.weights.{name} must be a finite number zero or greater."),
			});
		}
	}

	let expansions = [
		("recall.i2i", recall.i2i.seed_limit, recall.i2i.per_seed_limit),
		("recall.u2i2i", recall.u2i2i.seed_limit, recall.u2i2i.per_seed_limit),
	];

	for (label, seed_limit, per_seed_limit) in expansions {
		if seed_limit == 0 {
			return Err(Error::Validation {
				message: format!("{label}.seed_limit must be greater than zero."),
			});
		}
		if per_seed_limit == 0 {
			return Err(Error::Validation {
				message: format!("{label}.per_seed_limit must be greater than zero."),
			});
		}
	}

	if recall.u2a2i.attribute_limit == 0 {
		return Err(Error::Validation {
			message: "recall.u2a2i.attribute_limit must be greater than zero.".to_string(),
		});
	}
	if recall.u2u.neighbor_limit == 0 {
		return Err(Error::Validation {
			message: "recall.u2u.neighbor_limit must be greater than zero.".to_string(),
		});
	}
	if recall.cache.enabled {
		if recall.cache.ttl_seconds == 0 {
			return Err(Error::Validation {
				message: "recall.cache.ttl_seconds must be greater than zero.".to_string(),
			});
		}

		validate_strategy_names("recall.cache.strategies", &recall.cache.strategies)?;
	}

	Ok(())
}

fn validate_fusion(fusion: &Fusion) -> Result<()> {
	validate_unit_interval("fusion.freshness_weight", fusion.freshness_weight)?;
	validate_unit_interval("fusion.default_freshness", fusion.default_freshness)?;
	validate_positive("fusion.half_life_hours", fusion.half_life_hours)?;

	Ok(())
}

fn validate_retrieval(retrieval: &Retrieval) -> Result<()> {
	for (label, weight) in [
		("retrieval.lexical_weight", retrieval.lexical_weight),
		("retrieval.vector_weight", retrieval.vector_weight),
	] {
		if !weight.is_finite() || weight < 0.0 {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number zero or greater."),
			});
		}
	}

	for (label, value) in [
		("retrieval.lexical_top_k", retrieval.lexical_top_k),
		("retrieval.vector_top_k", retrieval.vector_top_k),
		("retrieval.fusion_top_k", retrieval.fusion_top_k),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if !retrieval.similarity_threshold.is_finite()
		|| !(-1.0..=1.0).contains(&retrieval.similarity_threshold)
	{
		return Err(Error::Validation {
			message: "retrieval.similarity_threshold must be in the range -1.0-1.0.".to_string(),
		});
	}

	validate_unit_interval("retrieval.freshness_weight", retrieval.freshness_weight)?;
	validate_positive("retrieval.half_life_hours", retrieval.half_life_hours)?;

	Ok(())
}

fn validate_strategy_names(label: &str, names: &[String]) -> Result<()> {
	for name in names {
		if !STRATEGY_NAMES.contains(&name.as_str()) {
			return Err(Error::Validation {
				message: format!(
					"{label} contains unknown strategy {name:?}; expected one of {}.",
					STRATEGY_NAMES.join(", ")
				),
			});
		}
	}

	Ok(())
}

fn validate_unit_interval(label: &str, value: f64) -> Result<()> {
	if !value.is_finite() || !(0.0..=1.0).contains(&value) {
		return Err(Error::Validation {
			message: format!("{label} must be in the range 0.0-1.0."),
		});
	}

	Ok(())
}

fn validate_positive(label: &str, value: f64) -> Result<()> {
	if !value.is_finite() || value <= 0.0 {
		return Err(Error::Validation {
			message: format!("{label} must be a finite number greater than zero."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.recall.score_mapping = cfg.recall.score_mapping.trim().to_ascii_lowercase();

	for name in cfg
		.recall
		.strategies
		.iter_mut()
		.chain(cfg.recall.cache.strategies.iter_mut())
		.chain(cfg.recall.scenes.values_mut().flatten())
	{
		*name = name.trim().to_ascii_lowercase();
	}

	cfg.recall.weights = cfg
		.recall
		.weights
		.drain()
		.map(|(name, weight)| (name.trim().to_ascii_lowercase(), weight))
		.collect();

	let mut seen = Vec::with_capacity(cfg.recall.strategies.len());

	cfg.recall.strategies.retain(|name| {
		if seen.contains(name) {
			return false;
		}

		seen.push(name.clone());

		true
	});
}
