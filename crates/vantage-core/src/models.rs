//! Domain models for Vantage

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ========== Client Models ==========

/// An agency client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub membership: MembershipTier,
    pub is_active: bool,
    /// Email of the identity that created this client; None for unowned rows
    pub owner_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A new client to be created (before DB insertion)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub membership: MembershipTier,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl NewClient {
    /// Reject rows that would fail the required-field rule before any write
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Client name is required".into()));
        }
        if self.email.trim().is_empty() {
            return Err(Error::Validation("Client email is required".into()));
        }
        Ok(())
    }
}

/// Field-level client update; None leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub membership: Option<MembershipTier>,
    pub is_active: Option<bool>,
}

/// Client membership tiers (display ordering only, no numeric weight)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MembershipTier {
    #[default]
    Silver,
    Gold,
    Diamond,
}

impl MembershipTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Diamond => "Diamond",
        }
    }
}

impl std::str::FromStr for MembershipTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silver" => Ok(Self::Silver),
            "gold" => Ok(Self::Gold),
            "diamond" => Ok(Self::Diamond),
            _ => Err(format!("Unknown membership tier: {}", s)),
        }
    }
}

impl std::fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Campaign Models ==========

/// A marketing campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    /// Ad platform label (Meta, Google, TikTok, ...); None rolls up as "Unknown"
    pub platform: Option<String>,
    pub budget: f64,
    /// Final revenue; None while the campaign is ongoing
    pub revenue: Option<f64>,
    pub status: CampaignStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub client_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Revenue with the ongoing-campaign convention applied (None counts as 0)
    pub fn effective_revenue(&self) -> f64 {
        self.revenue.unwrap_or(0.0)
    }

    pub fn is_ongoing(&self) -> bool {
        self.status == CampaignStatus::Ongoing
    }
}

/// A new campaign to be created (before DB insertion)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub status: CampaignStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub client_id: i64,
}

impl NewCampaign {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Campaign name is required".into()));
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(Error::Validation(
                "Campaign budget must be a non-negative amount".into(),
            ));
        }
        if let Some(revenue) = self.revenue {
            if !revenue.is_finite() {
                return Err(Error::Validation("Campaign revenue must be a number".into()));
            }
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(Error::Validation(
                    "Campaign end date must not be before its start date".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Full-replace campaign update (edit-and-resubmit cycle)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCampaign {
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub revenue: Option<f64>,
    pub status: CampaignStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub client_id: i64,
}

impl UpdateCampaign {
    pub fn validate(&self) -> Result<()> {
        NewCampaign {
            name: self.name.clone(),
            platform: self.platform.clone(),
            budget: self.budget,
            revenue: self.revenue,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
            client_id: self.client_id,
        }
        .validate()
    }
}

/// Campaign lifecycle status
///
/// The single canonical representation: an ongoing campaign has no finalized
/// revenue figure yet; completing it records one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CampaignStatus {
    #[default]
    Ongoing,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "Ongoing",
            Self::Completed => "Completed",
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown campaign status: {}", s)),
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A campaign row joined with its client's name, for list views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignWithClient {
    pub id: i64,
    pub name: String,
    pub platform: Option<String>,
    pub budget: f64,
    pub revenue: Option<f64>,
    pub status: CampaignStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub client_id: i64,
    pub client_name: String,
    pub created_at: DateTime<Utc>,
}

// ========== Viewer Models ==========

/// Role resolved for an authenticated identity
///
/// Admins see every client; owners see only clients whose owner_email
/// matches their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerRole {
    Admin,
    Owner,
}

impl ViewerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl std::fmt::Display for ViewerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated identity with its resolved role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewer {
    pub email: String,
    pub role: ViewerRole,
}

impl Viewer {
    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: ViewerRole::Admin,
        }
    }

    pub fn owner(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: ViewerRole::Owner,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ViewerRole::Admin
    }
}

// ========== Dashboard Metrics Models ==========

/// One point of the per-campaign ROI chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiPoint {
    pub name: String,
    pub roi: f64,
}

/// One point of the budget-vs-revenue comparison chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRevenuePoint {
    pub name: String,
    pub budget: f64,
    pub revenue: f64,
}

/// Budget and revenue sums for one platform label
///
/// The ROI here is computed from the summed totals, not averaged over the
/// member campaigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRollup {
    pub platform: String,
    pub budget: f64,
    pub revenue: f64,
    pub roi: f64,
}

/// A client enriched with its campaign aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMetrics {
    pub client: Client,
    pub campaigns: Vec<Campaign>,
    pub total_budget: f64,
    pub total_revenue: f64,
    /// Mean of per-campaign ROIs, NOT total_revenue / total_budget
    pub average_roi: f64,
}

/// Best/worst campaigns by ROI plus the templated performance summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAlerts {
    pub top_trending: Vec<RoiPoint>,
    pub declining: Vec<RoiPoint>,
    pub summary: String,
}

/// Full dashboard snapshot derived from one fetch of campaigns + clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_campaigns: i64,
    pub active_campaigns: i64,
    pub total_budget: f64,
    pub total_revenue: f64,
    pub average_roi: f64,
    pub platform_rollups: Vec<PlatformRollup>,
    pub roi_series: Vec<RoiPoint>,
    pub budget_revenue_series: Vec<BudgetRevenuePoint>,
    pub top_clients: Vec<ClientMetrics>,
    pub declining_clients: Vec<ClientMetrics>,
    pub trends: TrendAlerts,
}

// ========== Audit Models ==========

/// One audit log entry recording an API or CLI action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    /// Acting identity (email), or "-" for unauthenticated contexts
    pub user_email: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_campaign_status_roundtrip() {
        assert_eq!(CampaignStatus::Ongoing.as_str(), "Ongoing");
        assert_eq!(CampaignStatus::Completed.as_str(), "Completed");
        assert_eq!(
            CampaignStatus::from_str("ongoing").unwrap(),
            CampaignStatus::Ongoing
        );
        assert_eq!(
            CampaignStatus::from_str("Completed").unwrap(),
            CampaignStatus::Completed
        );
        assert!(CampaignStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_membership_tier_parse() {
        assert_eq!(
            MembershipTier::from_str("gold").unwrap(),
            MembershipTier::Gold
        );
        assert_eq!(MembershipTier::default(), MembershipTier::Silver);
        assert!(MembershipTier::from_str("platinum").is_err());
    }

    #[test]
    fn test_effective_revenue_ongoing() {
        let campaign = Campaign {
            id: 1,
            name: "Spring Launch".into(),
            platform: Some("Meta".into()),
            budget: 1000.0,
            revenue: None,
            status: CampaignStatus::Ongoing,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: None,
            client_id: 1,
            created_at: Utc::now(),
        };
        assert_eq!(campaign.effective_revenue(), 0.0);
        assert!(campaign.is_ongoing());
    }

    #[test]
    fn test_new_campaign_validation() {
        let base = NewCampaign {
            name: "Q2 Retargeting".into(),
            platform: Some("Google".into()),
            budget: 500.0,
            revenue: None,
            status: CampaignStatus::Ongoing,
            start_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            end_date: None,
            client_id: 1,
        };
        assert!(base.validate().is_ok());

        let mut unnamed = base.clone();
        unnamed.name = "  ".into();
        assert!(unnamed.validate().is_err());

        let mut negative = base.clone();
        negative.budget = -10.0;
        assert!(negative.validate().is_err());

        let mut backwards = base.clone();
        backwards.end_date = Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn test_viewer_roles() {
        let admin = Viewer::admin("ops@agency.test");
        assert!(admin.is_admin());
        let owner = Viewer::owner("am@agency.test");
        assert!(!owner.is_admin());
        assert_eq!(owner.role.as_str(), "owner");
    }
}
