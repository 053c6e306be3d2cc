//! Query routing.
//!
//! An explicit ordered list of (predicate, action) pairs evaluated in
//! sequence over the lower-cased query, taking the first match. Ordering
//! encodes priority, which makes some later rules unreachable; the trailing
//! bare-"pipeline" rule is kept verbatim even though the earlier pipeline
//! keyword rule subsumes it. Predicates are substring containment tests,
//! optionally with any-of semantics — no tokenization, no stemming, no
//! scoring.

use crate::chart::{sector_chart, ChartSpec};
use crate::columns::RoleMap;
use crate::insights::{
    concentration_risk, deal_count, leadership_update, month_wise_revenue, pipeline_summary,
    pipeline_value, quarter_revenue, revenue_summary, sector_dominance,
    sector_revenue_breakdown, Quarter,
};
use polars::prelude::DataFrame;
use tracing::debug;

/// One chat turn's output: markdown text plus an optional chart artifact
/// delivered as a side channel, not as part of the text.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub chart: Option<ChartSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    SectorRevenueBreakdown,
    MonthWiseRevenue,
    QuarterRevenue(Quarter),
    SectorDominanceWithChart,
    ConcentrationRisk,
    PipelineSummary,
    RevenueSummary,
    LeadershipUpdate,
    DealCount,
    PipelineValue,
    Help,
}

struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    action: Action,
}

/// The documented rule order. First match wins.
fn rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "sector revenue breakdown",
            matches: |q| q.contains("sector") && q.contains("revenue"),
            action: Action::SectorRevenueBreakdown,
        },
        Rule {
            name: "month-wise revenue",
            matches: |q| q.contains("month"),
            action: Action::MonthWiseRevenue,
        },
        Rule {
            name: "q1 revenue",
            matches: |q| q.contains("q1"),
            action: Action::QuarterRevenue(Quarter::Q1),
        },
        Rule {
            name: "q2 revenue",
            matches: |q| q.contains("q2"),
            action: Action::QuarterRevenue(Quarter::Q2),
        },
        Rule {
            name: "q3 revenue",
            matches: |q| q.contains("q3"),
            action: Action::QuarterRevenue(Quarter::Q3),
        },
        Rule {
            name: "q4 revenue",
            matches: |q| q.contains("q4") || q.contains("this quarter"),
            action: Action::QuarterRevenue(Quarter::Q4),
        },
        Rule {
            name: "diversification",
            matches: |q| contains_any(q, &["diversified", "exposure", "breakdown"]),
            action: Action::SectorDominanceWithChart,
        },
        Rule {
            name: "top sector",
            matches: |q| contains_any(q, &["dominates", "top sector"]),
            action: Action::SectorDominanceWithChart,
        },
        Rule {
            name: "concentration risk",
            matches: |q| contains_any(q, &["risk", "concentration", "dependency"]),
            action: Action::ConcentrationRisk,
        },
        Rule {
            name: "pipeline summary",
            matches: |q| contains_any(q, &["pipeline", "deal", "opportunity"]),
            action: Action::PipelineSummary,
        },
        Rule {
            name: "revenue summary",
            matches: |q| contains_any(q, &["revenue", "financial", "billing"]),
            action: Action::RevenueSummary,
        },
        Rule {
            name: "leadership update",
            matches: |q| contains_any(q, &["leadership", "update", "snapshot", "board"]),
            action: Action::LeadershipUpdate,
        },
        Rule {
            name: "deal count",
            matches: |q| q.contains("how many") && q.contains("deal"),
            action: Action::DealCount,
        },
        Rule {
            name: "pipeline value",
            matches: |q| q.contains("total size") || q.contains("total value"),
            action: Action::PipelineValue,
        },
        // Unreachable: subsumed by the pipeline-keyword rule above. Kept to
        // match the documented rule table verbatim.
        Rule {
            name: "pipeline (legacy)",
            matches: |q| q.contains("pipeline"),
            action: Action::PipelineSummary,
        },
    ]
}

const HELP_MESSAGE: &str = "Please ask about pipeline, sector exposure, revenue breakdown, \
                            month, quarter, or leadership update.";

/// Route one user query against the two cleaned tables and their role maps.
pub fn route(
    query: &str,
    work: &DataFrame,
    deals: &DataFrame,
    work_roles: &RoleMap,
    deal_roles: &RoleMap,
) -> Answer {
    let q = query.to_lowercase();

    let action = rules()
        .into_iter()
        .find(|rule| (rule.matches)(&q))
        .map(|rule| {
            debug!("Query matched rule '{}'", rule.name);
            rule.action
        })
        .unwrap_or(Action::Help);

    match action {
        Action::SectorRevenueBreakdown => text(sector_revenue_breakdown(work, work_roles)),
        Action::MonthWiseRevenue => text(month_wise_revenue(work, work_roles)),
        Action::QuarterRevenue(quarter) => text(quarter_revenue(work, quarter, work_roles)),
        Action::SectorDominanceWithChart => Answer {
            text: sector_dominance(deals, deal_roles),
            chart: sector_chart(deals, deal_roles),
        },
        Action::ConcentrationRisk => text(concentration_risk(deals, deal_roles)),
        Action::PipelineSummary => text(pipeline_summary(deals, deal_roles)),
        Action::RevenueSummary => text(revenue_summary(work, work_roles)),
        Action::LeadershipUpdate => text(leadership_update(work, deals, work_roles, deal_roles)),
        Action::DealCount => text(deal_count(deals)),
        Action::PipelineValue => text(pipeline_value(deals, deal_roles)),
        Action::Help => text(HELP_MESSAGE.to_string()),
    }
}

fn text(text: String) -> Answer {
    Answer { text, chart: None }
}

fn contains_any(query: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| query.contains(kw))
}
