use std::fmt;

use crate::ApiError;

/// Parties that appear in `did:ledup:<role>:<id>` identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Provider,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => write!(f, "producer"),
            Role::Provider => write!(f, "provider"),
            Role::Consumer => write!(f, "consumer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Did {
    pub role: Role,
    pub id: String,
}

impl Did {
    pub fn parse(value: &str) -> Option<Did> {
        let mut parts = value.trim().splitn(4, ':');
        if parts.next()? != "did" || parts.next()? != "ledup" {
            return None;
        }
        let role = match parts.next()? {
            "producer" => Role::Producer,
            "provider" => Role::Provider,
            "consumer" => Role::Consumer,
            _ => return None,
        };
        let id = parts.next()?;
        if id.is_empty() {
            return None;
        }
        Some(Did {
            role,
            id: id.to_string(),
        })
    }
}

/// The DID check behind every route that acts for a party
pub fn require_role(field: &str, value: &str, role: Role) -> Result<Did, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{} is required", field)));
    }
    let did = Did::parse(value)
        .ok_or_else(|| ApiError::Auth(format!("{} is not a valid DID: {}", field, value)))?;
    if did.role != role {
        return Err(ApiError::Auth(format!(
            "{} must have the {} role, found {}",
            field, role, did.role
        )));
    }
    Ok(did)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let did = Did::parse("did:ledup:producer:1").unwrap();
        assert_eq!(did.role, Role::Producer);
        assert_eq!(did.id, "1");
        // Ids may themselves contain colons
        assert_eq!(Did::parse("did:ledup:provider:org:7").unwrap().id, "org:7");
        assert!(Did::parse("did:other:producer:1").is_none());
        assert!(Did::parse("did:ledup:admin:1").is_none());
        assert!(Did::parse("did:ledup:producer:").is_none());
    }

    #[test]
    fn test_require_role() {
        assert!(require_role("ownerDid", "did:ledup:producer:1", Role::Producer).is_ok());
        assert!(matches!(
            require_role("ownerDid", "did:ledup:provider:1", Role::Producer),
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            require_role("ownerDid", "", Role::Producer),
            Err(ApiError::Validation(_))
        ));
    }
}
