use std::str::FromStr;

/// Piecewise mapping of a `[0, 1]` channel score into `[0.5, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoreMapping {
	#[default]
	Off,
	/// Compresses the low end and stretches the head.
	Ranking,
	Balanced,
	/// Gives the low half of the input range half of the output range.
	Exploration,
}
impl ScoreMapping {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Off => "off",
			Self::Ranking => "ranking",
			Self::Balanced => "balanced",
			Self::Exploration => "exploration",
		}
	}

	pub fn map(self, score: f64) -> f64 {
		if self == Self::Off {
			return score;
		}

		let x = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };

		match self {
			Self::Off => score,
			Self::Ranking =>
				if x < 0.3 {
					0.5 + 0.1 * (x / 0.3)
				} else if x < 0.7 {
					0.6 + 0.2 * ((x - 0.3) / 0.4)
				} else {
					0.8 + 0.2 * ((x - 0.7) / 0.3)
				},
			Self::Balanced => 0.5 + 0.5 * x,
			Self::Exploration =>
				if x < 0.5 {
					0.5 + 0.25 * (x / 0.5)
				} else {
					0.75 + 0.25 * ((x - 0.5) / 0.5)
				},
		}
	}
}
impl FromStr for ScoreMapping {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.trim().to_ascii_lowercase().as_str() {
			"off" => Ok(Self::Off),
			"ranking" => Ok(Self::Ranking),
			"balanced" => Ok(Self::Balanced),
			"exploration" => Ok(Self::Exploration),
			other => Err(format!("unknown score mapping {other:?}")),
		}
	}
}
