//! Status enums for marketplace entities.

use serde::{Deserialize, Serialize};

/// Review state of a seller-submitted product listing.
///
/// Sellers create listings in `Pending`; a master approves or rejects them.
/// Listings created by a master are approved immediately. Older documents
/// carry no status at all and are treated as approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Whether customers can see the listing.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Account role, carried in the `user_type` claim of the access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// A customer: browses, keeps a bag and wishlist, places orders.
    #[default]
    User,
    /// Creates and edits its own product listings.
    Seller,
    /// Approves or rejects seller listings.
    Master,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Seller => write!(f, "seller"),
            Self::Master => write!(f, "master"),
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" | "customer" => Ok(Self::User),
            "seller" => Ok(Self::Seller),
            "master" => Ok(Self::Master),
            _ => Err(format!("invalid user type: {s}")),
        }
    }
}

/// Lifecycle of a QR pickup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    /// Any status this client does not know about yet.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_status_serde() {
        let status: ApprovalStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, ApprovalStatus::Pending);
        assert!(!status.is_public());
        assert!(ApprovalStatus::default().is_public());
    }

    #[test]
    fn test_user_type_round_trip_display() {
        for t in [UserType::User, UserType::Seller, UserType::Master] {
            assert_eq!(t.to_string().parse::<UserType>().unwrap(), t);
        }
        assert_eq!("Customer".parse::<UserType>().unwrap(), UserType::User);
        assert!("admin".parse::<UserType>().is_err());
    }

    #[test]
    fn test_unknown_order_status() {
        let status: OrderStatus = serde_json::from_str("\"out_for_pickup\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
    }
}
