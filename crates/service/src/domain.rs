//! Business view of users, pickup points, receptions and products.
//!
//! Closed enumerations parse from their wire value (plus the Russian aliases
//! accepted for cities and product types) and always serialize the canonical
//! English value.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Input value outside one of the closed enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Moderator,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Employee, Role::Moderator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Moderator => "moderator",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(Role::Employee),
            "moderator" => Ok(Role::Moderator),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    #[serde(alias = "Москва")]
    Moscow,
    #[serde(alias = "Санкт-Петербург")]
    SaintPetersburg,
    #[serde(alias = "Казань")]
    Kazan,
}

impl City {
    pub const ALL: [City; 3] = [City::Moscow, City::SaintPetersburg, City::Kazan];

    pub fn as_str(&self) -> &'static str {
        match self {
            City::Moscow => "Moscow",
            City::SaintPetersburg => "SaintPetersburg",
            City::Kazan => "Kazan",
        }
    }
}

impl FromStr for City {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Moscow" | "Москва" => Ok(City::Moscow),
            "SaintPetersburg" | "Санкт-Петербург" => Ok(City::SaintPetersburg),
            "Kazan" | "Казань" => Ok(City::Kazan),
            other => Err(UnknownVariant::new("city", other)),
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[serde(alias = "электроника")]
    Electronics,
    #[serde(alias = "одежда")]
    Clothing,
    #[serde(alias = "обувь")]
    Footwear,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [ProductType::Electronics, ProductType::Clothing, ProductType::Footwear];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Electronics => "electronics",
            ProductType::Clothing => "clothing",
            ProductType::Footwear => "footwear",
        }
    }
}

impl FromStr for ProductType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "electronics" | "электроника" => Ok(ProductType::Electronics),
            "clothing" | "одежда" => Ok(ProductType::Clothing),
            "footwear" | "обувь" => Ok(ProductType::Footwear),
            other => Err(UnknownVariant::new("product type", other)),
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reception lifecycle; `InProgress -> Close` is the only transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceptionStatus {
    InProgress,
    Close,
}

impl ReceptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceptionStatus::InProgress => "in_progress",
            ReceptionStatus::Close => "close",
        }
    }
}

impl FromStr for ReceptionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(ReceptionStatus::InProgress),
            "close" => Ok(ReceptionStatus::Close),
            other => Err(UnknownVariant::new("reception status", other)),
        }
    }
}

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Domain user as returned to callers; never carries the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Stored user including the argon2 digest.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl UserRecord {
    pub fn into_public(self) -> User {
        User { id: self.id, email: self.email, role: self.role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pvz {
    pub id: Uuid,
    #[serde(rename = "registrationDate")]
    pub registration_date: DateTime<Utc>,
    pub city: City,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reception {
    pub id: Uuid,
    #[serde(rename = "dateTime")]
    pub date_time: DateTime<Utc>,
    #[serde(rename = "pvzId")]
    pub pvz_id: Uuid,
    pub status: ReceptionStatus,
    /// Per-pvz creation order, assigned by storage.
    #[serde(skip)]
    pub seq: i64,
}

impl Reception {
    pub fn is_open(&self) -> bool {
        self.status == ReceptionStatus::InProgress
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    #[serde(rename = "dateTime")]
    pub date_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(rename = "receptionId")]
    pub reception_id: Uuid,
    /// Per-reception creation order, assigned by storage.
    #[serde(skip)]
    pub seq: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionWithProducts {
    pub reception: Reception,
    pub products: Vec<Product>,
}

/// One entry of the pickup-point listing with its full reception tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvzListItem {
    pub pvz: Pvz,
    pub receptions: Vec<ReceptionWithProducts>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn russian_aliases_parse_to_canonical_values() {
        assert_eq!("Москва".parse::<City>().unwrap(), City::Moscow);
        assert_eq!("Санкт-Петербург".parse::<City>().unwrap(), City::SaintPetersburg);
        assert_eq!("обувь".parse::<ProductType>().unwrap(), ProductType::Footwear);
        let json = serde_json::to_string(&"Казань".parse::<City>().unwrap()).unwrap();
        assert_eq!(json, "\"Kazan\"");
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = "Novosibirsk".parse::<City>().unwrap_err();
        assert_eq!(err.to_string(), "unknown city: Novosibirsk");
        assert!("admin".parse::<Role>().is_err());
        assert!("food".parse::<ProductType>().is_err());
        assert!("Employee".parse::<Role>().is_err());
    }

    #[test]
    fn wire_field_names() {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            date_time: now,
            product_type: ProductType::Clothing,
            reception_id: Uuid::new_v4(),
            seq: 7,
        };
        let v = serde_json::to_value(&product).unwrap();
        assert_eq!(v["type"], "clothing");
        assert!(v.get("receptionId").is_some());
        assert!(v.get("dateTime").is_some());
        assert!(v.get("seq").is_none());

        let reception = Reception {
            id: Uuid::new_v4(),
            date_time: now,
            pvz_id: Uuid::new_v4(),
            status: ReceptionStatus::InProgress,
            seq: 1,
        };
        let v = serde_json::to_value(&reception).unwrap();
        assert_eq!(v["status"], "in_progress");
        assert!(v.get("pvzId").is_some());
    }

    #[test]
    fn public_user_drops_digest() {
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: "a@b.c".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Moderator,
        };
        let v = serde_json::to_value(record.into_public()).unwrap();
        assert_eq!(v["role"], "moderator");
        assert!(v.get("password_hash").is_none());
        assert_eq!(v.as_object().unwrap().len(), 3);
    }
}
