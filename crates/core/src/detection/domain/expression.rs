use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl Expression {
    pub const ALL: [Expression; 7] = [
        Expression::Neutral,
        Expression::Happy,
        Expression::Sad,
        Expression::Angry,
        Expression::Fearful,
        Expression::Disgusted,
        Expression::Surprised,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Expression::Neutral => "neutral",
            Expression::Happy => "happy",
            Expression::Sad => "sad",
            Expression::Angry => "angry",
            Expression::Fearful => "fearful",
            Expression::Disgusted => "disgusted",
            Expression::Surprised => "surprised",
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpressionScore {
    pub expression: Expression,
    pub score: f64,
}

/// Confidence per expression label for one face.
///
/// Scores are clamped to `[0, 1]` and kept in [`Expression::ALL`] order.
/// Empty when no expression model ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionScores {
    scores: Vec<ExpressionScore>,
}

impl ExpressionScores {
    /// Later duplicates of a label overwrite earlier ones.
    pub fn new(scores: impl IntoIterator<Item = (Expression, f64)>) -> Self {
        let mut by_label = [None; Expression::ALL.len()];
        for (expression, score) in scores {
            by_label[expression as usize] = Some(score.clamp(0.0, 1.0));
        }
        let scores = Expression::ALL
            .iter()
            .zip(by_label)
            .filter_map(|(&expression, score)| {
                score.map(|score| ExpressionScore { expression, score })
            })
            .collect();
        Self { scores }
    }

    /// Softmax over raw model outputs.
    pub fn from_logits(logits: &[(Expression, f32)]) -> Self {
        if logits.is_empty() {
            return Self::default();
        }
        let max = logits
            .iter()
            .map(|&(_, l)| l)
            .fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f64> = logits.iter().map(|&(_, l)| ((l - max) as f64).exp()).collect();
        let sum: f64 = exps.iter().sum();
        Self::new(
            logits
                .iter()
                .zip(exps)
                .map(|(&(expression, _), e)| (expression, e / sum)),
        )
    }

    pub fn get(&self, expression: Expression) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.expression == expression)
            .map(|s| s.score)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExpressionScore> {
        self.scores.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn dominant(&self) -> Option<ExpressionScore> {
        self.scores
            .iter()
            .copied()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }

    /// Scores strictly above `min_score`, highest first.
    pub fn above(&self, min_score: f64) -> Vec<ExpressionScore> {
        let mut kept: Vec<ExpressionScore> = self
            .scores
            .iter()
            .copied()
            .filter(|s| s.score > min_score)
            .collect();
        kept.sort_by(|a, b| b.score.total_cmp(&a.score));
        kept
    }
}
