//! Customer records
//!
//! The fee engine only needs CAA membership from a customer; the rest of
//! customer management is CRUD handled elsewhere. Placeholder customers
//! are synthesized when a walk-in fuel order has no linked account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::CustomerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    /// Auto-created for orders without a linked customer
    pub is_placeholder: bool,
    pub is_caa_member: bool,
    /// Unique when present
    pub caa_member_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CustomerId::new_v7(),
            name: name.into(),
            email: email.into(),
            is_placeholder: false,
            is_caa_member: false,
            caa_member_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Synthesizes a placeholder customer for an unlinked fuel order
    ///
    /// Named after the tail number, with a deliberately undeliverable
    /// address so the record can never receive real correspondence.
    pub fn placeholder_for_tail(tail_number: &str) -> Self {
        let mut customer = Self::new(
            tail_number.to_string(),
            format!("{}@placeholder.invalid", tail_number.to_lowercase()),
        );
        customer.is_placeholder = true;
        customer
    }

    pub fn with_caa_membership(mut self, member_id: impl Into<String>) -> Self {
        self.is_caa_member = true;
        self.caa_member_id = Some(member_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_uses_tail_number_and_invalid_domain() {
        let customer = Customer::placeholder_for_tail("N123AB");

        assert_eq!(customer.name, "N123AB");
        assert_eq!(customer.email, "n123ab@placeholder.invalid");
        assert!(customer.is_placeholder);
        assert!(!customer.is_caa_member);
    }

    #[test]
    fn caa_membership_builder() {
        let customer = Customer::new("Acme Aviation", "ops@acme.test")
            .with_caa_membership("CAA-0042");

        assert!(customer.is_caa_member);
        assert_eq!(customer.caa_member_id.as_deref(), Some("CAA-0042"));
    }
}
