use rand::seq::SliceRandom;
use rand::Rng;

use super::{fmt_stat, Comparison};
use crate::config::{FALLBACK_TIP_COUNT, TREND_THRESHOLD};
use crate::types::{Format, Role};

pub const BATTING_TIPS: [&str; 10] = [
    "Focus on strike rotation and placement.",
    "Work on shot selection to increase scoring rate.",
    "Convert starts into 50s and 100s.",
    "Adapt batting style according to match situation.",
    "Practice running between wickets for quick singles.",
    "Maintain composure under pressure.",
    "Enhance timing and footwork for aggressive shots.",
    "Target gaps in field for easy boundaries.",
    "Play risk-free shots early in innings.",
    "Work on improving backfoot play against short balls.",
];

pub const BOWLING_TIPS: [&str; 10] = [
    "Practice wicket-taking variations: slower balls, bouncers, cutters.",
    "Focus on hitting the right length consistently.",
    "Analyze batsmen weaknesses and target accordingly.",
    "Improve yorkers and slower deliveries.",
    "Work on consistent line and length under pressure.",
    "Mix up pace to disrupt batsman rhythm.",
    "Focus on economy in powerplay overs.",
    "Develop new variations for surprise deliveries.",
    "Practice bowling long spells without losing accuracy.",
    "Use field placements effectively to support bowling plan.",
];

/// Static format tips: (batting, bowling).
fn format_tip_table(format: Format) -> (&'static [&'static str], &'static [&'static str]) {
    match format {
        Format::T20 => (
            &[
                "Focus on power-hitting and high strike rate.",
                "Aggressive running between wickets is essential.",
                "Fielding and agility are very important in T20.",
                "Practice finishing matches under pressure.",
                "Use innovative shots like scoops and ramps.",
                "Exploit powerplays with aggressive batting.",
                "Keep fitness high for fast-paced matches.",
                "Adapt to small boundaries and short pitches.",
            ],
            &[
                "Bowling in death overs is crucial.",
                "Work on yorkers and slower balls for death overs.",
                "Focus on economy in powerplay overs.",
                "Use variations to outsmart batters.",
            ],
        ),
        Format::Odi => (
            &[
                "Build innings with balance of aggression and stability.",
                "Rotate strike regularly to keep scoreboard ticking.",
                "Pace the innings according to match situation.",
                "Adapt to powerplays and death overs effectively.",
                "Practice partnerships to anchor innings.",
            ],
            &[
                "Bowling accuracy over longer spells is important.",
                "Focus on field placement strategies.",
                "Work on maintaining focus for 50 overs.",
                "Develop stamina for long bowling spells.",
            ],
        ),
        Format::Test => (
            &[
                "Focus on patience and long innings.",
                "Concentration and mental toughness are crucial.",
                "Play each session with clear plan and shot selection.",
                "Focus on defensive technique to survive spells.",
                "Build partnerships to stabilize innings.",
            ],
            &[
                "Bowling consistency and stamina are key.",
                "Set small session targets for wickets.",
                "Plan bowling changes to exploit fatigue.",
                "Analyze pitch conditions deeply.",
                "Work on endurance for multi-day performance.",
            ],
        ),
    }
}

/// Format tips surfaced for a role: batting half, bowling half, or both.
pub fn format_tips(format: Format, role: Role) -> Vec<&'static str> {
    let (batting, bowling) = format_tip_table(format);
    let mut tips = Vec::new();
    if role.bats() {
        tips.extend_from_slice(batting);
    }
    if role.bowls() {
        tips.extend_from_slice(bowling);
    }
    tips
}

/// Relative change from actual to predicted. A zero actual always yields 1,
/// whatever the prediction.
pub fn rel_diff(pred: f64, actual: f64) -> f64 {
    if actual == 0.0 {
        1.0
    } else {
        (pred - actual) / actual
    }
}

fn batting_trends(cmp: &Comparison) -> Vec<String> {
    let mut out = Vec::new();
    let sr = cmp.strike_rate;
    let sr_diff = sr.rel_diff();
    if sr_diff < -TREND_THRESHOLD {
        out.push(format!(
            "Your strike rate ({}) is projected to drop to {}. Focus on aggressive shot selection and quicker singles.",
            fmt_stat(sr.actual),
            fmt_stat(sr.predicted),
        ));
    } else if sr_diff == 0.0 {
        out.push(format!(
            "Your strike rate is expected to remain steady at {}. Maintain consistency with current approach.",
            fmt_stat(sr.actual),
        ));
    }

    let runs = cmp.runs;
    let runs_diff = runs.rel_diff();
    if runs_diff < -TREND_THRESHOLD {
        out.push(format!(
            "Your runs are predicted to fall from {} to {}. Work on converting starts into big scores.",
            fmt_stat(runs.actual),
            fmt_stat(runs.predicted),
        ));
    } else if runs_diff == 0.0 {
        out.push(format!(
            "Your run tally is projected to remain stable at {}. Keep building innings the same way.",
            fmt_stat(runs.actual),
        ));
    }
    out
}

fn bowling_trends(cmp: &Comparison) -> Vec<String> {
    let mut out = Vec::new();
    let wk = cmp.wickets;
    let wk_diff = wk.rel_diff();
    if wk_diff < -TREND_THRESHOLD {
        out.push(format!(
            "Your wicket count ({}) is predicted to decline to {}. Focus on wicket-taking variations.",
            fmt_stat(wk.actual),
            fmt_stat(wk.predicted),
        ));
    } else if wk_diff == 0.0 {
        out.push(format!(
            "Your wicket-taking ability is consistent at {}. Keep focusing on line and length.",
            fmt_stat(wk.actual),
        ));
    }

    // Higher economy is worse, so the regression fires on a rise.
    let econ = cmp.economy;
    let econ_diff = econ.rel_diff();
    if econ_diff > TREND_THRESHOLD {
        out.push(format!(
            "Your economy rate is expected to rise from {} to {}. Focus on accuracy and line.",
            fmt_stat(econ.actual),
            fmt_stat(econ.predicted),
        ));
    } else if econ_diff == 0.0 {
        out.push(format!(
            "Your economy is stable at {}. Maintain this disciplined bowling.",
            fmt_stat(econ.actual),
        ));
    }
    out
}

fn pick_fallback<R: Rng + ?Sized>(pool: &[&str], rng: &mut R) -> Vec<String> {
    pool.choose_multiple(rng, FALLBACK_TIP_COUNT)
        .map(|s| s.to_string())
        .collect()
}

/// Rule-based advice for one player: per role branch, trend messages or (if none
/// fired) random fallback tips, followed by the format tips for the role.
///
/// The fallback decision is made independently for each branch. An all-rounder
/// whose batting trends fired but whose bowling trends did not still gets two
/// bowling tips: bowling fallback does not require the batting branch to come
/// up empty as well.
pub fn advise<R: Rng + ?Sized>(cmp: &Comparison, role: Role, format: Format, rng: &mut R) -> Vec<String> {
    let mut advice = Vec::new();

    if role.bats() {
        let trends = batting_trends(cmp);
        if trends.is_empty() {
            advice.extend(pick_fallback(&BATTING_TIPS, rng));
        } else {
            advice.extend(trends);
        }
    }

    if role.bowls() {
        let trends = bowling_trends(cmp);
        if trends.is_empty() {
            advice.extend(pick_fallback(&BOWLING_TIPS, rng));
        } else {
            advice.extend(trends);
        }
    }

    advice.extend(format_tips(format, role).into_iter().map(str::to_string));
    advice
}
