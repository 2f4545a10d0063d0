//! Per-request claim lookup table.
//!
//! [`ClaimSet`] turns the raw claim list of an authenticated identity into a
//! map keyed by claim type.  The first occurrence of a claim type wins and
//! existing keys are never overwritten; the `sub` and `Authorization`
//! shortcuts are only synthesized when absent.

use std::collections::HashMap;
use stratus_kernel::gateway::{
    AUTHORIZATION_CLAIM, Claim, GatewayRequest, NAME_IDENTIFIER_CLAIM, SUBJECT_CLAIM,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    values: HashMap<String, String>,
}

impl ClaimSet {
    /// Build from a raw claim list.
    ///
    /// When no `sub` claim is present, it is derived from the canonical
    /// subject-identifier claim (if that one exists).
    pub fn from_claims(claims: &[Claim]) -> Self {
        let mut set = Self::default();
        for claim in claims {
            set.insert_absent(&claim.claim_type, &claim.value);
        }
        if !set.contains(SUBJECT_CLAIM) {
            if let Some(subject) = claims
                .iter()
                .find(|c| c.claim_type == NAME_IDENTIFIER_CLAIM)
            {
                set.insert_absent(SUBJECT_CLAIM, &subject.value);
            }
        }
        set
    }

    /// Expose the inbound `Authorization` header as a claim, unless a claim
    /// of that type already exists.
    pub fn with_authorization_from(mut self, request: &GatewayRequest) -> Self {
        if let Some(header) = request.header("authorization") {
            self.insert_absent(AUTHORIZATION_CLAIM, header);
        }
        self
    }

    pub fn get(&self, claim_type: &str) -> Option<&str> {
        self.values.get(claim_type).map(String::as_str)
    }

    pub fn contains(&self, claim_type: &str) -> bool {
        self.values.contains_key(claim_type)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert_absent(&mut self, claim_type: &str, value: &str) {
        self.values
            .entry(claim_type.to_string())
            .or_insert_with(|| value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_kernel::gateway::HttpMethod;

    #[test]
    fn first_claim_of_a_type_wins() {
        let set = ClaimSet::from_claims(&[
            Claim::new("role", "admin"),
            Claim::new("role", "reader"),
            Claim::new("sub", "alice"),
        ]);
        assert_eq!(set.get("role"), Some("admin"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn existing_sub_is_not_overwritten() {
        let set = ClaimSet::from_claims(&[
            Claim::new(NAME_IDENTIFIER_CLAIM, "from-name-id"),
            Claim::new("sub", "alice"),
        ]);
        assert_eq!(set.get("sub"), Some("alice"));
    }

    #[test]
    fn sub_synthesized_from_name_identifier() {
        let set = ClaimSet::from_claims(&[Claim::new(NAME_IDENTIFIER_CLAIM, "bob")]);
        assert_eq!(set.get("sub"), Some("bob"));
        assert_eq!(set.get(NAME_IDENTIFIER_CLAIM), Some("bob"));
    }

    #[test]
    fn no_subject_source_means_no_sub() {
        let set = ClaimSet::from_claims(&[Claim::new("email", "a@b.c")]);
        assert!(!set.contains("sub"));
    }

    #[test]
    fn authorization_header_added_only_when_absent() {
        let request = GatewayRequest::new("r", HttpMethod::Get, "/")
            .with_header("Authorization", "Bearer abc");

        let set = ClaimSet::from_claims(&[]).with_authorization_from(&request);
        assert_eq!(set.get("Authorization"), Some("Bearer abc"));

        let set = ClaimSet::from_claims(&[Claim::new("Authorization", "claimed")])
            .with_authorization_from(&request);
        assert_eq!(set.get("Authorization"), Some("claimed"));
    }

    #[test]
    fn missing_authorization_header_adds_nothing() {
        let request = GatewayRequest::new("r", HttpMethod::Get, "/");
        let set = ClaimSet::from_claims(&[]).with_authorization_from(&request);
        assert!(set.is_empty());
    }
}
