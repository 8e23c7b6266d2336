use std::fmt;

/// Matrice de confusion d'une partition d'évaluation.
///
/// A row counts as positive when its score reaches the decision threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Confusion {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl Confusion {
    /// Tally one scored row against its label (1 = target speaker).
    pub fn record(&mut self, score: f32, label: f32, threshold: f32) {
        let predicted = score >= threshold;
        let actual = label >= 0.5;
        match (predicted, actual) {
            (true, true) => self.true_positive += 1,
            (false, false) => self.true_negative += 1,
            (true, false) => self.false_positive += 1,
            (false, true) => self.false_negative += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    /// Share of positive predictions that are correct, `None` without any.
    #[must_use]
    pub fn positive_success(&self) -> Option<f64> {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// Share of negative predictions that are correct, `None` without any.
    #[must_use]
    pub fn negative_success(&self) -> Option<f64> {
        ratio(self.true_negative, self.true_negative + self.false_negative)
    }

    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.true_positive + self.true_negative, self.total())
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| 100.0 * num as f64 / den as f64)
}

struct Percent(Option<f64>);

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "{p:.2}%"),
            None => f.write_str("n/a"),
        }
    }
}

impl fmt::Display for Confusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Évaluation sur {} lignes (VP {}, VN {}, FP {}, FN {})",
            self.total(),
            self.true_positive,
            self.true_negative,
            self.false_positive,
            self.false_negative
        )?;
        writeln!(f, "  Succès positifs : {}", Percent(self.positive_success()))?;
        writeln!(f, "  Succès négatifs : {}", Percent(self.negative_success()))?;
        write!(f, "  Succès global   : {}", Percent(self.accuracy()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_and_rates() {
        let mut c = Confusion::default();
        c.record(0.9, 1.0, 0.5);
        c.record(0.6, 0.0, 0.5);
        c.record(0.1, 0.0, 0.5);
        c.record(0.2, 1.0, 0.5);
        c.record(0.5, 1.0, 0.5);
        assert_eq!(
            c,
            Confusion {
                true_positive: 2,
                true_negative: 1,
                false_positive: 1,
                false_negative: 1,
            }
        );
        assert!((c.positive_success().unwrap_or_default() - 200.0 / 3.0).abs() < 1e-9);
        assert!((c.negative_success().unwrap_or_default() - 50.0).abs() < 1e-9);
        assert!((c.accuracy().unwrap_or_default() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn empty_rates_render_as_na() {
        let mut c = Confusion::default();
        c.record(0.0, 0.0, 0.5);
        assert_eq!(c.positive_success(), None);
        let text = c.to_string();
        assert!(text.contains("Succès positifs : n/a"));
        assert!(text.contains("Succès négatifs : 100.00%"));
    }
}
