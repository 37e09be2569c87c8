//! Subscription tiers, their limits and the features they unlock.
//!
//! The tier table is static: limits and marketing copy are compiled in, while prices and the
//! payment processor's price identifiers come from [`crate::config::PlansConfig`] so they can be
//! changed per deployment.
//!
//! Admission checks compare the tenant's *current* usage against the limit before an insert, so
//! a count equal to the limit is already rejected:
//!
//! ```
//! use formflow::plans::{can_create_form, Plan};
//!
//! assert!(can_create_form(Plan::Free, 2));
//! assert!(!can_create_form(Plan::Free, 3));
//! assert!(can_create_form(Plan::Mission, 10_000));
//! ```

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use utoipa::ToSchema;

use crate::config::{PlanPricing, PlansConfig};

/// Subscription tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Starter,
    Mission,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Free, Plan::Starter, Plan::Mission];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Starter => "starter",
            Plan::Mission => "mission",
        }
    }

    /// Usage limits for this tier
    pub fn limits(&self) -> PlanLimits {
        match self {
            Plan::Free => PlanLimits {
                forms: Limit::Limited(3),
                responses_per_month: Limit::Limited(100),
                seats: 1,
            },
            Plan::Starter => PlanLimits {
                forms: Limit::Limited(15),
                responses_per_month: Limit::Limited(1000),
                seats: 3,
            },
            Plan::Mission => PlanLimits {
                forms: Limit::Unlimited,
                responses_per_month: Limit::Unlimited,
                seats: 10,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plan::Free => "Free",
            Plan::Starter => "Starter",
            Plan::Mission => "Mission",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Plan::Free => "Get started at no cost",
            Plan::Starter => "For growing non-profits",
            Plan::Mission => "For established non-profits",
        }
    }

    /// Marketing bullet points shown on the pricing page
    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Plan::Free => &["Up to 3 forms", "100 responses/month", "1 seat", "Basic reporting"],
            Plan::Starter => &[
                "Up to 15 forms",
                "1,000 responses/month",
                "3 seats",
                "Advanced reporting",
                "CSV export",
                "Email notifications",
            ],
            Plan::Mission => &[
                "Unlimited forms",
                "Unlimited responses",
                "10 seats",
                "Custom branding",
                "Priority support",
                "Impact reports",
                "All Starter features",
            ],
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "mission" => Ok(Self::Mission),
            _ => Err(format!("Unknown plan: {}", s)),
        }
    }
}

/// How often a paid subscription is billed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BillingCycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("Unknown billing cycle: {}", s)),
        }
    }
}

/// A usage ceiling. Serialized as a number, or `null` when unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Limited(u32),
    Unlimited,
}

impl Limit {
    /// Whether one more unit may be added on top of `current`
    pub fn admits(&self, current: i64) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::Limited(max) => current < i64::from(*max),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Limited(n) => write!(f, "{n}"),
            Limit::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Limited(n) => serializer.serialize_u32(*n),
            Limit::Unlimited => serializer.serialize_none(),
        }
    }
}

/// Per-tier usage limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlanLimits {
    /// Maximum number of active forms (null = unlimited)
    #[schema(value_type = Option<u32>)]
    pub forms: Limit,
    /// Maximum number of submissions per calendar month (null = unlimited)
    #[schema(value_type = Option<u32>)]
    pub responses_per_month: Limit,
    /// Seats including the account owner
    pub seats: u32,
}

pub fn can_create_form(plan: Plan, current_form_count: i64) -> bool {
    plan.limits().forms.admits(current_form_count)
}

pub fn can_receive_response(plan: Plan, responses_this_month: i64) -> bool {
    plan.limits().responses_per_month.admits(responses_this_month)
}

pub fn can_add_team_member(plan: Plan, current_seat_count: i64) -> bool {
    current_seat_count < i64::from(plan.limits().seats)
}

/// Capabilities gated by tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    CustomBranding,
    FileUploads,
    CsvExport,
    PrioritySupport,
}

impl Feature {
    pub const ALL: [Feature; 4] = [Feature::CustomBranding, Feature::FileUploads, Feature::CsvExport, Feature::PrioritySupport];

    /// Tiers that include this feature
    pub fn tiers(&self) -> &'static [Plan] {
        match self {
            Feature::CustomBranding => &[Plan::Mission],
            Feature::FileUploads => &[Plan::Starter, Plan::Mission],
            Feature::CsvExport => &[Plan::Starter, Plan::Mission],
            Feature::PrioritySupport => &[Plan::Mission],
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::CustomBranding => "Custom branding",
            Feature::FileUploads => "File uploads",
            Feature::CsvExport => "CSV export",
            Feature::PrioritySupport => "Priority support",
        };
        write!(f, "{name}")
    }
}

pub fn is_feature_available(plan: Plan, feature: Feature) -> bool {
    feature.tiers().contains(&plan)
}

/// "Free" for zero, otherwise whole dollars per month, e.g. `$15/mo`
pub fn format_price(cents: u32) -> String {
    if cents == 0 {
        return "Free".to_string();
    }
    format!("${:.0}/mo", (f64::from(cents) / 100.0).round())
}

/// Monthly equivalent of a yearly price with cents, e.g. `$12.50/mo`
pub fn yearly_monthly_equivalent(yearly_cents: u32) -> String {
    if yearly_cents == 0 {
        return "Free".to_string();
    }
    let monthly_cents = (f64::from(yearly_cents) / 12.0).round();
    format!("${:.2}/mo", monthly_cents / 100.0)
}

/// Everything the pricing page renders for one tier
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanDisplayInfo {
    pub plan: Plan,
    pub name: &'static str,
    pub description: &'static str,
    /// Price in cents for the selected billing cycle
    pub price: u32,
    pub display_price: String,
    /// Percentage saved by paying yearly
    pub yearly_discount: u32,
    pub features: Vec<&'static str>,
    pub limits: PlanLimits,
    pub billing_label: &'static str,
}

pub fn display_info(plan: Plan, cycle: BillingCycle, pricing: &PlansConfig) -> PlanDisplayInfo {
    let prices = pricing.pricing(plan);
    let is_yearly = cycle == BillingCycle::Yearly;

    PlanDisplayInfo {
        plan,
        name: plan.name(),
        description: plan.description(),
        price: if is_yearly { prices.yearly_price } else { prices.monthly_price },
        display_price: if is_yearly {
            yearly_monthly_equivalent(prices.yearly_price)
        } else {
            format_price(prices.monthly_price)
        },
        yearly_discount: prices.yearly_discount,
        features: plan.features().to_vec(),
        limits: plan.limits(),
        billing_label: if is_yearly { "billed annually" } else { "billed monthly" },
    }
}

impl PlansConfig {
    /// Pricing for a tier; the free tier is always zero
    pub fn pricing(&self, plan: Plan) -> PlanPricing {
        match plan {
            Plan::Free => PlanPricing::default(),
            Plan::Starter => self.starter.clone(),
            Plan::Mission => self.mission.clone(),
        }
    }

    /// Payment processor price identifier for a paid tier and cycle
    pub fn price_id(&self, plan: Plan, cycle: BillingCycle) -> Option<&str> {
        let pricing = match plan {
            Plan::Free => return None,
            Plan::Starter => &self.starter,
            Plan::Mission => &self.mission,
        };
        match cycle {
            BillingCycle::Monthly => pricing.monthly_price_id.as_deref(),
            BillingCycle::Yearly => pricing.yearly_price_id.as_deref(),
        }
        .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_limit_boundaries() {
        assert!(can_create_form(Plan::Free, 0));
        assert!(can_create_form(Plan::Free, 2));
        assert!(!can_create_form(Plan::Free, 3));
        assert!(!can_create_form(Plan::Free, 4));

        assert!(can_create_form(Plan::Starter, 14));
        assert!(!can_create_form(Plan::Starter, 15));

        assert!(can_create_form(Plan::Mission, 0));
        assert!(can_create_form(Plan::Mission, i64::from(u32::MAX)));
    }

    #[test]
    fn test_response_limit_boundaries() {
        assert!(can_receive_response(Plan::Free, 99));
        assert!(!can_receive_response(Plan::Free, 100));
        assert!(can_receive_response(Plan::Starter, 999));
        assert!(!can_receive_response(Plan::Starter, 1000));
        assert!(can_receive_response(Plan::Mission, 1_000_000));
    }

    #[test]
    fn test_seat_limit_boundaries() {
        // The owner occupies the only free seat
        assert!(!can_add_team_member(Plan::Free, 1));
        assert!(can_add_team_member(Plan::Free, 0));
        assert!(can_add_team_member(Plan::Starter, 2));
        assert!(!can_add_team_member(Plan::Starter, 3));
        assert!(can_add_team_member(Plan::Mission, 9));
        assert!(!can_add_team_member(Plan::Mission, 10));
    }

    #[test]
    fn test_feature_map() {
        assert!(!is_feature_available(Plan::Free, Feature::CsvExport));
        assert!(is_feature_available(Plan::Starter, Feature::CsvExport));
        assert!(is_feature_available(Plan::Mission, Feature::CsvExport));

        assert!(!is_feature_available(Plan::Starter, Feature::CustomBranding));
        assert!(is_feature_available(Plan::Mission, Feature::CustomBranding));

        assert!(is_feature_available(Plan::Starter, Feature::FileUploads));
        assert!(!is_feature_available(Plan::Starter, Feature::PrioritySupport));

        for feature in Feature::ALL {
            assert!(!is_feature_available(Plan::Free, feature), "{feature} should not be free");
            assert!(is_feature_available(Plan::Mission, feature), "{feature} should be in mission");
        }
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0), "Free");
        assert_eq!(format_price(1500), "$15/mo");
        assert_eq!(format_price(999), "$10/mo");
    }

    #[test]
    fn test_yearly_monthly_equivalent() {
        assert_eq!(yearly_monthly_equivalent(0), "Free");
        assert_eq!(yearly_monthly_equivalent(14400), "$12.00/mo");
        assert_eq!(yearly_monthly_equivalent(15000), "$12.50/mo");
    }

    #[test]
    fn test_display_info() {
        let pricing = PlansConfig {
            starter: PlanPricing {
                monthly_price: 1500,
                yearly_price: 14400,
                yearly_discount: 20,
                monthly_price_id: Some("price_starter_m".to_string()),
                yearly_price_id: Some("price_starter_y".to_string()),
            },
            ..Default::default()
        };

        let monthly = display_info(Plan::Starter, BillingCycle::Monthly, &pricing);
        assert_eq!(monthly.name, "Starter");
        assert_eq!(monthly.price, 1500);
        assert_eq!(monthly.display_price, "$15/mo");
        assert_eq!(monthly.billing_label, "billed monthly");
        assert_eq!(monthly.limits.forms, Limit::Limited(15));

        let yearly = display_info(Plan::Starter, BillingCycle::Yearly, &pricing);
        assert_eq!(yearly.price, 14400);
        assert_eq!(yearly.display_price, "$12.00/mo");
        assert_eq!(yearly.billing_label, "billed annually");
        assert_eq!(yearly.yearly_discount, 20);

        let free = display_info(Plan::Free, BillingCycle::Yearly, &pricing);
        assert_eq!(free.display_price, "Free");
        assert_eq!(free.features, vec!["Up to 3 forms", "100 responses/month", "1 seat", "Basic reporting"]);
    }

    #[test]
    fn test_price_ids() {
        let pricing = PlansConfig {
            starter: PlanPricing {
                monthly_price_id: Some("price_starter_m".to_string()),
                yearly_price_id: Some(String::new()),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(pricing.price_id(Plan::Starter, BillingCycle::Monthly), Some("price_starter_m"));
        assert_eq!(pricing.price_id(Plan::Starter, BillingCycle::Yearly), None);
        assert_eq!(pricing.price_id(Plan::Free, BillingCycle::Monthly), None);
        assert_eq!(pricing.price_id(Plan::Mission, BillingCycle::Monthly), None);
    }

    #[test]
    fn test_unlimited_serializes_as_null() {
        let json = serde_json::to_value(Plan::Mission.limits()).unwrap();
        assert_eq!(json["forms"], serde_json::Value::Null);
        assert_eq!(json["seats"], 10);

        let json = serde_json::to_value(Plan::Free.limits()).unwrap();
        assert_eq!(json["responses_per_month"], 100);
    }

    #[test]
    fn test_plan_parsing() {
        assert_eq!("starter".parse::<Plan>().unwrap(), Plan::Starter);
        assert!("enterprise".parse::<Plan>().is_err());
        assert_eq!("yearly".parse::<BillingCycle>().unwrap(), BillingCycle::Yearly);
    }
}
