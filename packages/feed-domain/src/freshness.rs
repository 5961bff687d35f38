//! Exponential freshness decay shared by recall fusion and hybrid retrieval.
//!
//! `freshness = exp(-λ · Δhours)` with `λ = ln(2) / half_life_hours`, so an item exactly one
//! half-life old scores 0.5. Items published at or after the reference instant score 1.0.

use time::OffsetDateTime;

/// Lower bound on the per-hour decay rate.
pub const MIN_DECAY_LAMBDA: f64 = 1e-9;

const SECONDS_PER_HOUR: f64 = 3_600.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreshnessDecay {
	lambda_per_hour: f64,
}
impl FreshnessDecay {
	pub fn from_half_life_hours(half_life_hours: f64) -> Self {
		let lambda = if half_life_hours.is_finite() && half_life_hours > 0.0 {
			std::f64::consts::LN_2 / half_life_hours
		} else {
			MIN_DECAY_LAMBDA
		};

		Self { lambda_per_hour: lambda.max(MIN_DECAY_LAMBDA) }
	}

	pub fn lambda_per_hour(&self) -> f64 {
		self.lambda_per_hour
	}

	pub fn score(&self, published_at: OffsetDateTime, reference: OffsetDateTime) -> f64 {
		let delta_hours = ((reference - published_at).as_seconds_f64() / SECONDS_PER_HOUR).max(0.0);
		let score = (-self.lambda_per_hour * delta_hours).exp();

		if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 }
	}
}

/// `raw · (1 − weight) + freshness · weight`, with the weight clamped to `[0, 1]`.
pub fn blend_freshness(raw: f64, freshness: f64, weight: f64) -> f64 {
	let weight = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };

	raw * (1.0 - weight) + freshness * weight
}
