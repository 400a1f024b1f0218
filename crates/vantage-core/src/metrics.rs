//! Dashboard metrics aggregation
//!
//! One pass over an in-memory snapshot of campaigns and clients produces the
//! full dashboard payload: KPI totals, platform rollups, chart series, client
//! rankings, and campaign trend alerts. Every invocation recomputes from
//! scratch, with no caching or incremental state, which keeps the math
//! trivially correct at the few-hundred-row scale this tool operates at.

use crate::models::{
    BudgetRevenuePoint, Campaign, CampaignStatus, Client, ClientMetrics, DashboardMetrics,
    PlatformRollup, RoiPoint, TrendAlerts,
};
use crate::roi::{campaign_roi, roi};

/// Sentinel platform label for campaigns with no platform set
pub const UNKNOWN_PLATFORM: &str = "Unknown";

/// Compute the full dashboard snapshot from one consistent fetch
pub fn aggregate(campaigns: &[Campaign], clients: &[Client]) -> DashboardMetrics {
    let total_budget: f64 = campaigns.iter().map(|c| c.budget).sum();
    let total_revenue: f64 = campaigns.iter().map(|c| c.effective_revenue()).sum();

    let rois: Vec<f64> = campaigns.iter().map(campaign_roi).collect();
    let average_roi = mean(&rois);

    let active_campaigns = campaigns
        .iter()
        .filter(|c| c.status == CampaignStatus::Ongoing)
        .count() as i64;

    let ranked = rank_clients(clients, campaigns);
    let top_clients: Vec<ClientMetrics> = ranked.iter().take(2).cloned().collect();
    let declining_clients: Vec<ClientMetrics> =
        ranked[ranked.len().saturating_sub(2)..].to_vec();

    DashboardMetrics {
        total_campaigns: campaigns.len() as i64,
        active_campaigns,
        total_budget,
        total_revenue,
        average_roi,
        platform_rollups: platform_rollups(campaigns),
        roi_series: roi_series(campaigns),
        budget_revenue_series: budget_revenue_series(campaigns),
        top_clients,
        declining_clients,
        trends: trend_alerts(campaigns),
    }
}

/// Enrich one client with its campaign aggregates
///
/// `campaigns` may be any superset; rows are filtered by `client_id`.
pub fn client_metrics(client: &Client, campaigns: &[Campaign]) -> ClientMetrics {
    let own: Vec<Campaign> = campaigns
        .iter()
        .filter(|c| c.client_id == client.id)
        .cloned()
        .collect();

    let total_budget: f64 = own.iter().map(|c| c.budget).sum();
    let total_revenue: f64 = own.iter().map(|c| c.effective_revenue()).sum();
    let rois: Vec<f64> = own.iter().map(campaign_roi).collect();
    let average_roi = mean(&rois);

    ClientMetrics {
        client: client.clone(),
        campaigns: own,
        total_budget,
        total_revenue,
        average_roi,
    }
}

/// All clients enriched and sorted by mean ROI, best first
///
/// The sort is stable: clients with equal mean ROI keep their input order, so
/// repeated runs over the same snapshot rank identically. With fewer than four
/// clients the top-2 and bottom-2 slices taken from this ranking overlap;
/// that mirrors the dashboard's behavior and is deliberate.
pub fn rank_clients(clients: &[Client], campaigns: &[Campaign]) -> Vec<ClientMetrics> {
    let mut ranked: Vec<ClientMetrics> = clients
        .iter()
        .map(|client| client_metrics(client, campaigns))
        .collect();
    ranked.sort_by(|a, b| b.average_roi.total_cmp(&a.average_roi));
    ranked
}

/// Sum budget and revenue per platform label, in first-seen order
///
/// Campaigns without a platform fold into the "Unknown" bucket. Labels match
/// case-sensitively: "Meta" and "meta" are distinct rows.
pub fn platform_rollups(campaigns: &[Campaign]) -> Vec<PlatformRollup> {
    let mut rollups: Vec<PlatformRollup> = Vec::new();

    for campaign in campaigns {
        let label = campaign.platform.as_deref().unwrap_or(UNKNOWN_PLATFORM);
        let entry = match rollups.iter_mut().find(|r| r.platform == label) {
            Some(existing) => existing,
            None => {
                rollups.push(PlatformRollup {
                    platform: label.to_string(),
                    budget: 0.0,
                    revenue: 0.0,
                    roi: 0.0,
                });
                rollups.last_mut().unwrap()
            }
        };
        entry.budget += campaign.budget;
        entry.revenue += campaign.effective_revenue();
    }

    for rollup in &mut rollups {
        rollup.roi = roi(rollup.budget, Some(rollup.revenue));
    }

    rollups
}

/// Per-campaign ROI chart points, positional fallback labels for unnamed rows
pub fn roi_series(campaigns: &[Campaign]) -> Vec<RoiPoint> {
    campaigns
        .iter()
        .enumerate()
        .map(|(i, c)| RoiPoint {
            name: chart_label(c, i),
            roi: campaign_roi(c),
        })
        .collect()
}

/// Per-campaign budget/revenue chart points
pub fn budget_revenue_series(campaigns: &[Campaign]) -> Vec<BudgetRevenuePoint> {
    campaigns
        .iter()
        .enumerate()
        .map(|(i, c)| BudgetRevenuePoint {
            name: chart_label(c, i),
            budget: c.budget,
            revenue: c.effective_revenue(),
        })
        .collect()
}

/// Top-2 and bottom-2 campaigns by individual ROI, plus the summary paragraph
pub fn trend_alerts(campaigns: &[Campaign]) -> TrendAlerts {
    let mut by_roi: Vec<RoiPoint> = campaigns
        .iter()
        .map(|c| RoiPoint {
            name: c.name.clone(),
            roi: campaign_roi(c),
        })
        .collect();

    by_roi.sort_by(|a, b| b.roi.total_cmp(&a.roi));
    let top_trending: Vec<RoiPoint> = by_roi.iter().take(2).cloned().collect();

    by_roi.sort_by(|a, b| a.roi.total_cmp(&b.roi));
    let declining: Vec<RoiPoint> = by_roi.iter().take(2).cloned().collect();

    let top_names: Vec<&str> = top_trending.iter().map(|p| p.name.as_str()).collect();
    let low_names: Vec<&str> = declining.iter().map(|p| p.name.as_str()).collect();
    let summary = format!(
        "Top campaigns: {} are performing well. \nHowever, {} show underperformance. Focus on improving creative strategy.",
        top_names.join(", "),
        low_names.join(", ")
    );

    TrendAlerts {
        top_trending,
        declining,
        summary,
    }
}

fn chart_label(campaign: &Campaign, index: usize) -> String {
    if campaign.name.is_empty() {
        format!("Campaign {}", index + 1)
    } else {
        campaign.name.clone()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
