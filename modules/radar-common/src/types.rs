use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of ten fixed segments of the AI hardware supply chain an event or
/// theme belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintLayer {
    ComputeSilicon,
    Memory,
    AdvPackaging,
    SubstratesFilms,
    PcbMaterials,
    InterconnectNetworking,
    PowerDeliveryEquip,
    ThermalCooling,
    DatacenterBuildPermit,
    FuelOnsitePower,
}

impl ConstraintLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComputeSilicon => "COMPUTE_SILICON",
            Self::Memory => "MEMORY",
            Self::AdvPackaging => "ADV_PACKAGING",
            Self::SubstratesFilms => "SUBSTRATES_FILMS",
            Self::PcbMaterials => "PCB_MATERIALS",
            Self::InterconnectNetworking => "INTERCONNECT_NETWORKING",
            Self::PowerDeliveryEquip => "POWER_DELIVERY_EQUIP",
            Self::ThermalCooling => "THERMAL_COOLING",
            Self::DatacenterBuildPermit => "DATACENTER_BUILD_PERMIT",
            Self::FuelOnsitePower => "FUEL_ONSITE_POWER",
        }
    }
}

impl std::fmt::Display for ConstraintLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConstraintLayer {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPUTE_SILICON" => Ok(Self::ComputeSilicon),
            "MEMORY" => Ok(Self::Memory),
            "ADV_PACKAGING" => Ok(Self::AdvPackaging),
            "SUBSTRATES_FILMS" => Ok(Self::SubstratesFilms),
            "PCB_MATERIALS" => Ok(Self::PcbMaterials),
            "INTERCONNECT_NETWORKING" => Ok(Self::InterconnectNetworking),
            "POWER_DELIVERY_EQUIP" => Ok(Self::PowerDeliveryEquip),
            "THERMAL_COOLING" => Ok(Self::ThermalCooling),
            "DATACENTER_BUILD_PERMIT" => Ok(Self::DatacenterBuildPermit),
            "FUEL_ONSITE_POWER" => Ok(Self::FuelOnsitePower),
            other => Err(format!("unknown constraint layer: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    LeadTimeExtended,
    Allocation,
    PriceIncrease,
    CapexAnnounced,
    CapacityOnline,
    QualificationDelay,
    YieldIssue,
    Disruption,
    PolicyRestriction,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeadTimeExtended => "LEAD_TIME_EXTENDED",
            Self::Allocation => "ALLOCATION",
            Self::PriceIncrease => "PRICE_INCREASE",
            Self::CapexAnnounced => "CAPEX_ANNOUNCED",
            Self::CapacityOnline => "CAPACITY_ONLINE",
            Self::QualificationDelay => "QUALIFICATION_DELAY",
            Self::YieldIssue => "YIELD_ISSUE",
            Self::Disruption => "DISRUPTION",
            Self::PolicyRestriction => "POLICY_RESTRICTION",
        }
    }

    /// The subset of event types the allocation score component counts (spec 4.10).
    pub fn counts_toward_allocation(&self) -> bool {
        matches!(self, Self::Allocation | Self::LeadTimeExtended)
    }

    /// The subset an inflection alert fires on (spec 4.12).
    pub fn is_inflection_candidate(&self) -> bool {
        matches!(
            self,
            Self::Allocation | Self::LeadTimeExtended | Self::Disruption | Self::PolicyRestriction
        )
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEAD_TIME_EXTENDED" => Ok(Self::LeadTimeExtended),
            "ALLOCATION" => Ok(Self::Allocation),
            "PRICE_INCREASE" => Ok(Self::PriceIncrease),
            "CAPEX_ANNOUNCED" => Ok(Self::CapexAnnounced),
            "CAPACITY_ONLINE" => Ok(Self::CapacityOnline),
            "QUALIFICATION_DELAY" => Ok(Self::QualificationDelay),
            "YIELD_ISSUE" => Ok(Self::YieldIssue),
            "DISRUPTION" => Ok(Self::Disruption),
            "POLICY_RESTRICTION" => Ok(Self::PolicyRestriction),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Tightening,
    Easing,
    Mixed,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tightening => "TIGHTENING",
            Self::Easing => "EASING",
            Self::Mixed => "MIXED",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TIGHTENING" => Ok(Self::Tightening),
            "EASING" => Ok(Self::Easing),
            "MIXED" => Ok(Self::Mixed),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityRole {
    Supplier,
    Buyer,
    DemandDriver,
    Oem,
    Regulator,
    Location,
}

impl EntityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supplier => "SUPPLIER",
            Self::Buyer => "BUYER",
            Self::DemandDriver => "DEMAND_DRIVER",
            Self::Oem => "OEM",
            Self::Regulator => "REGULATOR",
            Self::Location => "LOCATION",
        }
    }
}

impl std::fmt::Display for EntityRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUPPLIER" => Ok(Self::Supplier),
            "BUYER" => Ok(Self::Buyer),
            "DEMAND_DRIVER" => Ok(Self::DemandDriver),
            "OEM" => Ok(Self::Oem),
            "REGULATOR" => Ok(Self::Regulator),
            "LOCATION" => Ok(Self::Location),
            other => Err(format!("unknown entity role: {other}")),
        }
    }
}

/// Closed entity-type domain. LLM-generated types outside this set fall back
/// to `Company` via [`EntityType::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Company,
    Facility,
    Product,
    Component,
    Material,
    ProcessTech,
    BuyerClass,
    Geo,
    PolicyProgram,
    Index,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "COMPANY",
            Self::Facility => "FACILITY",
            Self::Product => "PRODUCT",
            Self::Component => "COMPONENT",
            Self::Material => "MATERIAL",
            Self::ProcessTech => "PROCESS_TECH",
            Self::BuyerClass => "BUYER_CLASS",
            Self::Geo => "GEO",
            Self::PolicyProgram => "POLICY_PROGRAM",
            Self::Index => "INDEX",
        }
    }

    /// Maps a raw, possibly LLM-generated type string to a valid domain
    /// type. Unknown and catch-all aliases fall back to `Company`.
    pub fn normalize(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "company" => Self::Company,
            "facility" => Self::Facility,
            "product" => Self::Product,
            "component" => Self::Component,
            "material" => Self::Material,
            "process_tech" => Self::ProcessTech,
            "buyer_class" => Self::BuyerClass,
            "geo" | "location" => Self::Geo,
            "policy_program" | "agency" | "regulator" => Self::PolicyProgram,
            "index" => Self::Index,
            "industry" | "generic" => Self::BuyerClass,
            _ => Self::Company,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPANY" => Ok(Self::Company),
            "FACILITY" => Ok(Self::Facility),
            "PRODUCT" => Ok(Self::Product),
            "COMPONENT" => Ok(Self::Component),
            "MATERIAL" => Ok(Self::Material),
            "PROCESS_TECH" => Ok(Self::ProcessTech),
            "BUYER_CLASS" => Ok(Self::BuyerClass),
            "GEO" => Ok(Self::Geo),
            "POLICY_PROGRAM" => Ok(Self::PolicyProgram),
            "INDEX" => Ok(Self::Index),
            other => Err(format!("unknown entity type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Collected,
    Normalized,
    Linked,
    Extracted,
    Done,
    Skipped,
    Error,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collected => "COLLECTED",
            Self::Normalized => "NORMALIZED",
            Self::Linked => "LINKED",
            Self::Extracted => "EXTRACTED",
            Self::Done => "DONE",
            Self::Skipped => "SKIPPED",
            Self::Error => "ERROR",
        }
    }

    /// `true` once an item can no longer advance through the stage order.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Error)
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PipelineStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COLLECTED" => Ok(Self::Collected),
            "NORMALIZED" => Ok(Self::Normalized),
            "LINKED" => Ok(Self::Linked),
            "EXTRACTED" => Ok(Self::Extracted),
            "DONE" => Ok(Self::Done),
            "SKIPPED" => Ok(Self::Skipped),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("unknown pipeline status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThemeStatus {
    Candidate,
    Active,
    Mature,
    Fading,
}

impl ThemeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candidate => "CANDIDATE",
            Self::Active => "ACTIVE",
            Self::Mature => "MATURE",
            Self::Fading => "FADING",
        }
    }

    /// The next status in the forward-only promotion chain, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Candidate => Some(Self::Active),
            Self::Active => Some(Self::Mature),
            Self::Mature => Some(Self::Fading),
            Self::Fading => None,
        }
    }
}

impl std::fmt::Display for ThemeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThemeStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CANDIDATE" => Ok(Self::Candidate),
            "ACTIVE" => Ok(Self::Active),
            "MATURE" => Ok(Self::Mature),
            "FADING" => Ok(Self::Fading),
            other => Err(format!("unknown theme status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceStatus {
    Discovered,
    Provisional,
    Confirmed,
    Disabled,
}

impl SourceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "DISCOVERED",
            Self::Provisional => "PROVISIONAL",
            Self::Confirmed => "CONFIRMED",
            Self::Disabled => "DISABLED",
        }
    }
}

impl std::fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DISCOVERED" => Ok(Self::Discovered),
            "PROVISIONAL" => Ok(Self::Provisional),
            "CONFIRMED" => Ok(Self::Confirmed),
            "DISABLED" => Ok(Self::Disabled),
            other => Err(format!("unknown source status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    Discovered,
    Provisional,
    Confirmed,
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "DISCOVERED",
            Self::Provisional => "PROVISIONAL",
            Self::Confirmed => "CONFIRMED",
        }
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DISCOVERED" => Ok(Self::Discovered),
            "PROVISIONAL" => Ok(Self::Provisional),
            "CONFIRMED" => Ok(Self::Confirmed),
            other => Err(format!("unknown entity status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchMethod {
    Feed,
    Html,
    Headless,
    Pdf,
    WebSearch,
}

impl FetchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Html => "html",
            Self::Headless => "headless",
            Self::Pdf => "pdf",
            Self::WebSearch => "web_search",
        }
    }
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FetchMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feed" => Ok(Self::Feed),
            "html" => Ok(Self::Html),
            "headless" => Ok(Self::Headless),
            "pdf" => Ok(Self::Pdf),
            "web_search" => Ok(Self::WebSearch),
            other => Err(format!("unknown fetch method: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    NewCandidate,
    Inflection,
    ActionableBriefing,
    DailyDigest,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewCandidate => "NEW_CANDIDATE",
            Self::Inflection => "INFLECTION",
            Self::ActionableBriefing => "ACTIONABLE_BRIEFING",
            Self::DailyDigest => "DAILY_DIGEST",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Structured payload types shared by the extractor and the store ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EntityRef {
    pub entity_id: String,
    pub role: EntityRole,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ObjectRef {
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LeadTimeWeeks {
    pub from: Option<f64>,
    pub to: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Magnitude {
    #[serde(default)]
    pub lead_time_weeks: Option<LeadTimeWeeks>,
    #[serde(default)]
    pub price_change_pct: Option<f64>,
    #[serde(default)]
    pub capex_usd: Option<i64>,
    #[serde(default)]
    pub capacity_delta: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Timing {
    #[serde(default)]
    pub happened_at: Option<String>,
    #[serde(default)]
    pub reported_at: Option<String>,
    #[serde(default)]
    pub expected_relief_window: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Evidence {
    pub source_id: String,
    pub source_url: String,
    #[serde(default = "default_tier")]
    pub source_tier: i16,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub translation_used: bool,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub snippets: Vec<String>,
}

fn default_tier() -> i16 {
    2
}
fn default_language() -> String {
    "en".to_string()
}
fn default_confidence() -> f64 {
    0.5
}

/// A single extracted constraint event, as produced by the LLM and validated
/// before persistence. Mirrors the `events` table row shape minus identity
/// and timestamp columns, which the store assigns.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintEvent {
    pub event_type: EventType,
    pub constraint_layer: ConstraintLayer,
    #[serde(default)]
    pub secondary_layer: Option<ConstraintLayer>,
    pub direction: Direction,
    #[serde(default)]
    pub entities: Vec<EntityRef>,
    #[serde(default)]
    pub objects: Vec<ObjectRef>,
    #[serde(default)]
    pub magnitude: Magnitude,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub evidence: Option<Evidence>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionResult {
    #[serde(default)]
    pub events: Vec<ConstraintEvent>,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

/// Structured thesis written by the LLM once a theme reaches `ACTIVE` or
/// `MATURE`. `who_benefits` keys are `ringA` / `ringB` / `ringC`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ThemeThesis {
    pub one_liner: String,
    #[serde(default)]
    pub why_now: Vec<String>,
    #[serde(default)]
    pub mechanism: Vec<String>,
    #[serde(default)]
    pub who_benefits: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub who_suffers: Vec<String>,
    #[serde(default)]
    pub leading_indicators: Vec<String>,
    #[serde(default)]
    pub invalidation_triggers: Vec<String>,
    #[serde(default)]
    pub relief_timeline: Option<String>,
}

impl ThemeThesis {
    /// Whether this thesis clears the actionable-briefing bar (spec 4.12):
    /// non-empty invalidation triggers and a stated relief timeline.
    pub fn is_actionable(&self) -> bool {
        !self.invalidation_triggers.is_empty()
            && self.relief_timeline.as_deref().is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_layer_round_trips_through_str() {
        for layer in [
            ConstraintLayer::ComputeSilicon,
            ConstraintLayer::AdvPackaging,
            ConstraintLayer::FuelOnsitePower,
        ] {
            let parsed: ConstraintLayer = layer.as_str().parse().unwrap();
            assert_eq!(parsed, layer);
        }
    }

    #[test]
    fn entity_type_normalizes_llm_catchalls_to_company() {
        assert_eq!(EntityType::normalize("org"), EntityType::Company);
        assert_eq!(EntityType::normalize("unknown"), EntityType::Company);
        assert_eq!(EntityType::normalize("REGULATOR"), EntityType::PolicyProgram);
        assert_eq!(EntityType::normalize("location"), EntityType::Geo);
    }

    #[test]
    fn theme_status_promotes_forward_only() {
        assert_eq!(ThemeStatus::Candidate.next(), Some(ThemeStatus::Active));
        assert_eq!(ThemeStatus::Fading.next(), None);
    }

    #[test]
    fn pipeline_status_terminal_states() {
        assert!(PipelineStatus::Done.is_terminal());
        assert!(PipelineStatus::Error.is_terminal());
        assert!(!PipelineStatus::Linked.is_terminal());
    }

    #[test]
    fn thesis_actionable_requires_both_fields() {
        let mut thesis = ThemeThesis {
            one_liner: "x".into(),
            ..Default::default()
        };
        assert!(!thesis.is_actionable());
        thesis.invalidation_triggers.push("price cut".into());
        thesis.relief_timeline = Some("2-3 quarters".into());
        assert!(thesis.is_actionable());
    }
}
