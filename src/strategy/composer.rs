use super::{fmt_stat, Comparison, MetricPair, Narrative};
use crate::config::LOW_CONFIDENCE_MATCHES;
use crate::types::{AdviceSource, BlockKind, StrategyBlock};

fn summary_line(label: &str, pair: MetricPair) -> String {
    format!("{label}: {} → {}", fmt_stat(pair.actual), fmt_stat(pair.predicted))
}

/// Assemble the strategy blocks in display order: summary, strategy (narrative
/// when available, else bulleted rule-based advice), then the low-confidence
/// warning when `matches` is under the universal floor.
pub fn compose(
    cmp: &Comparison,
    matches: u32,
    advice: &[String],
    narrative: &Narrative,
) -> Vec<StrategyBlock> {
    let mut blocks = Vec::with_capacity(3);

    blocks.push(StrategyBlock {
        kind: BlockKind::Summary,
        source: None,
        text: [
            "Performance Summary:".to_string(),
            summary_line("Runs", cmp.runs),
            summary_line("Strike Rate", cmp.strike_rate),
            summary_line("Wickets", cmp.wickets),
            summary_line("Economy", cmp.economy),
        ]
        .join("\n"),
    });

    let (source, body) = match narrative.text() {
        Some(text) => (AdviceSource::Narrative, text.to_string()),
        None => (
            AdviceSource::RuleBased,
            advice.iter().map(|a| format!("• {a}")).collect::<Vec<_>>().join("\n"),
        ),
    };
    blocks.push(StrategyBlock {
        kind: BlockKind::Strategy,
        source: Some(source),
        text: format!("Strategy:\n{body}"),
    });

    if matches < LOW_CONFIDENCE_MATCHES {
        blocks.push(StrategyBlock {
            kind: BlockKind::Warning,
            source: None,
            text: format!(
                "Warning: Predictions are low-confidence; gather at least {LOW_CONFIDENCE_MATCHES} matches for reliable advice."
            ),
        });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Unavailable;

    fn cmp() -> Comparison {
        Comparison {
            runs: MetricPair::new(500.0, 45.0),
            strike_rate: MetricPair::new(104.17, 90.0),
            wickets: MetricPair::new(0.0, 0.0),
            economy: MetricPair::new(0.0, 0.0),
        }
    }

    fn advice() -> Vec<String> {
        vec!["Convert starts into 50s and 100s.".to_string(), "Maintain composure under pressure.".to_string()]
    }

    #[test]
    fn summary_comes_first_and_lists_all_metrics() {
        let blocks = compose(&cmp(), 12, &advice(), &Narrative::Unavailable(Unavailable::Empty));
        assert_eq!(blocks[0].kind, BlockKind::Summary);
        let text = &blocks[0].text;
        assert!(text.contains("Runs: 500 → 45"));
        assert!(text.contains("Strike Rate: 104.17 → 90"));
        assert!(text.contains("Wickets: 0 → 0"));
        assert!(text.contains("Economy: 0 → 0"));
    }

    #[test]
    fn narrative_wins_over_rule_based_advice() {
        let narrative = Narrative::Generated("• Attack the powerplay".to_string());
        let blocks = compose(&cmp(), 12, &advice(), &narrative);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].kind, BlockKind::Strategy);
        assert_eq!(blocks[1].source, Some(AdviceSource::Narrative));
        assert!(blocks[1].text.contains("Attack the powerplay"));
        assert!(!blocks[1].text.contains("Convert starts"));
    }

    #[test]
    fn unavailable_narrative_falls_back_to_bullets() {
        let narrative = Narrative::Unavailable(Unavailable::Transport("refused".to_string()));
        let blocks = compose(&cmp(), 12, &advice(), &narrative);
        assert_eq!(blocks[1].source, Some(AdviceSource::RuleBased));
        assert_eq!(
            blocks[1].text,
            "Strategy:\n• Convert starts into 50s and 100s.\n• Maintain composure under pressure."
        );
    }

    #[test]
    fn warning_appended_below_ten_matches() {
        let n = Narrative::Unavailable(Unavailable::MissingCredential);
        let blocks = compose(&cmp(), 9, &advice(), &n);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[2].kind, BlockKind::Warning);
        assert!(blocks[2].text.contains("at least 10 matches"));

        assert_eq!(compose(&cmp(), 10, &advice(), &n).len(), 2);
    }

    // The warning floor stays at 10 for every format, even though T20 needs 15
    // matches to be eligible at all; a T20 strategy therefore never warns.
    #[test]
    fn low_confidence_floor_is_ten_for_every_format() {
        let n = Narrative::Unavailable(Unavailable::MissingCredential);
        assert_eq!(LOW_CONFIDENCE_MATCHES, 10);
        let blocks = compose(&cmp(), 15, &advice(), &n);
        assert!(blocks.iter().all(|b| b.kind != BlockKind::Warning));
    }

    #[test]
    fn identical_inputs_compose_identically() {
        let n = Narrative::Unavailable(Unavailable::MissingCredential);
        assert_eq!(compose(&cmp(), 5, &advice(), &n), compose(&cmp(), 5, &advice(), &n));
    }
}
