//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::percentage::Percentage;

/// Sentinel id of the synthetic root organisation.
pub const ROOT_ID: &str = "root";

/// Opaque, immutable entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for a newly created entity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Role or ownership relationship kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffiliationType {
    WalletSignatory,
    Shareholder,
    IndirectShareholder,
    Director,
    AuthorisedSignatory,
    User,
    HaystackClient,
}

impl AffiliationType {
    pub const ALL: [AffiliationType; 7] = [
        AffiliationType::WalletSignatory,
        AffiliationType::Shareholder,
        AffiliationType::IndirectShareholder,
        AffiliationType::Director,
        AffiliationType::AuthorisedSignatory,
        AffiliationType::User,
        AffiliationType::HaystackClient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AffiliationType::WalletSignatory => "WALLET_SIGNATORY",
            AffiliationType::Shareholder => "SHAREHOLDER",
            AffiliationType::IndirectShareholder => "INDIRECT_SHAREHOLDER",
            AffiliationType::Director => "DIRECTOR",
            AffiliationType::AuthorisedSignatory => "AUTHORISED_SIGNATORY",
            AffiliationType::User => "USER",
            AffiliationType::HaystackClient => "HAYSTACK_CLIENT",
        }
    }
}

impl fmt::Display for AffiliationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AffiliationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        AffiliationType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| format!("unknown affiliation type: {s}"))
    }
}

/// A typed role or ownership link attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affiliation {
    #[serde(rename = "type")]
    pub kind: AffiliationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shareholding: Option<Percentage>,
    /// Only meaningful for `INDIRECT_SHAREHOLDER`: whose equity this is a share of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_entity: Option<EntityId>,
}

impl Affiliation {
    /// Plain role without shareholding (director, signatory, user, ...).
    pub fn role(kind: AffiliationType) -> Self {
        Self {
            kind,
            shareholding: None,
            parent_entity: None,
        }
    }

    /// Direct ownership of the root organisation.
    pub fn shareholder(shareholding: Option<Percentage>) -> Self {
        Self {
            kind: AffiliationType::Shareholder,
            shareholding,
            parent_entity: None,
        }
    }

    /// Ownership of `parent`'s equity.
    pub fn indirect(parent: EntityId, shareholding: Option<Percentage>) -> Self {
        Self {
            kind: AffiliationType::IndirectShareholder,
            shareholding,
            parent_entity: Some(parent),
        }
    }

    /// Two affiliations occupy the same slot when they have the same kind and,
    /// for indirect holdings, the same parent.
    pub fn same_slot(&self, other: &Affiliation) -> bool {
        self.kind == other.kind
            && (self.kind != AffiliationType::IndirectShareholder
                || self.parent_entity == other.parent_entity)
    }
}

/// Workspace access level granted to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRights {
    #[default]
    Viewer,
    Reviewer,
    Admin,
}

impl FromStr for AccessRights {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(AccessRights::Viewer),
            "reviewer" => Ok(AccessRights::Reviewer),
            "admin" => Ok(AccessRights::Admin),
            other => Err(format!("unknown access rights: {other}")),
        }
    }
}

/// Fields only present while an individual holds the `USER` affiliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccess {
    pub mobile_number: String,
    pub access_rights: AccessRights,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Individual {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub place_of_birth: String,
    pub nationality: String,
    pub id_number: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub postcode: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_access: Option<UserAccess>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Corporate {
    /// Legal name
    pub name: String,
    pub trading_name: String,
    pub company_number: String,
    pub legal_entity_type: String,
    pub country_of_incorporation: String,
    pub date_of_incorporation: Option<NaiveDate>,
}

/// Variant-specific fields, discriminated by the `kind` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityDetails {
    Individual(Individual),
    Corporate(Corporate),
}

/// An individual or corporate participating in the role and ownership graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(flatten)]
    pub details: EntityDetails,
    #[serde(default)]
    pub affiliation: Vec<Affiliation>,
}

impl Entity {
    pub fn is_individual(&self) -> bool {
        matches!(self.details, EntityDetails::Individual(_))
    }

    pub fn is_corporate(&self) -> bool {
        matches!(self.details, EntityDetails::Corporate(_))
    }

    pub fn as_individual(&self) -> Option<&Individual> {
        match &self.details {
            EntityDetails::Individual(individual) => Some(individual),
            EntityDetails::Corporate(_) => None,
        }
    }

    pub fn as_corporate(&self) -> Option<&Corporate> {
        match &self.details {
            EntityDetails::Corporate(corporate) => Some(corporate),
            EntityDetails::Individual(_) => None,
        }
    }

    /// "First Last" for individuals, legal name for corporates.
    pub fn display_name(&self) -> String {
        match &self.details {
            EntityDetails::Individual(i) => [i.first_name.as_str(), i.last_name.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            EntityDetails::Corporate(c) => c.name.clone(),
        }
    }

    pub fn has_affiliation(&self, kind: AffiliationType) -> bool {
        self.affiliation.iter().any(|a| a.kind == kind)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id)
    }
}

/// Create an individual with a freshly generated id.
pub fn create_individual(details: Individual, affiliation: Vec<Affiliation>) -> Entity {
    Entity {
        id: EntityId::generate(),
        details: EntityDetails::Individual(details),
        affiliation,
    }
}

/// Create a corporate with a freshly generated id.
pub fn create_corporate(details: Corporate, affiliation: Vec<Affiliation>) -> Entity {
    Entity {
        id: EntityId::generate(),
        details: EntityDetails::Corporate(details),
        affiliation,
    }
}

/// Which variant a dialog creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Individual,
    Corporate,
}

impl EntityKind {
    pub fn of(entity: &Entity) -> Self {
        if entity.is_individual() {
            EntityKind::Individual
        } else {
            EntityKind::Corporate
        }
    }
}
