//! Public/private visibility over ACL grants
//!
//! Only two states exist. Any grant set that does not give READ to the
//! all-users group reads back as private.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Marker contained in the grantee URI of the all-users group
pub const ALL_USERS_MARKER: &str = "global/AllUsers";

/// Grantee URI the service uses for the all-users group
const ALL_USERS_URI: &str = "http://cam.qcloud.com/groups/global/AllUsers";

/// Object visibility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub const fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(Error::InvalidVisibility(format!(
                "\"{other}\", expected \"public\" or \"private\""
            ))),
        }
    }
}

/// Canned ACL token understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CannedAcl {
    PublicRead,
    Private,
}

impl CannedAcl {
    /// Token as sent in the `x-cos-acl` header
    pub const fn as_str(self) -> &'static str {
        match self {
            CannedAcl::PublicRead => "public-read",
            CannedAcl::Private => "private",
        }
    }
}

impl fmt::Display for CannedAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ACL entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Permission name, e.g. `READ` or `FULL_CONTROL`
    pub permission: String,

    /// Group URI for group grantees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grantee_uri: Option<String>,

    /// Account id for canonical-user grantees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grantee_id: Option<String>,
}

impl Grant {
    fn grants_public_read(&self) -> bool {
        self.permission == "READ"
            && self
                .grantee_uri
                .as_deref()
                .is_some_and(|uri| uri.contains(ALL_USERS_MARKER))
    }
}

/// Map a visibility onto the ACL sent with uploads and ACL updates
pub const fn to_acl(visibility: Visibility) -> CannedAcl {
    match visibility {
        Visibility::Public => CannedAcl::PublicRead,
        Visibility::Private => CannedAcl::Private,
    }
}

/// Derive visibility from an object's grants
pub fn from_grants(grants: &[Grant]) -> Visibility {
    if grants.iter().any(Grant::grants_public_read) {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

/// Grants a canned ACL stands for, with the owner as `owner_id`
pub fn implied_grants(acl: CannedAcl, owner_id: &str) -> Vec<Grant> {
    let mut grants = vec![Grant {
        permission: "FULL_CONTROL".into(),
        grantee_uri: None,
        grantee_id: Some(owner_id.to_string()),
    }];

    if acl == CannedAcl::PublicRead {
        grants.push(Grant {
            permission: "READ".into(),
            grantee_uri: Some(ALL_USERS_URI.into()),
            grantee_id: None,
        });
    }

    grants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_grant(permission: &str, uri: &str) -> Grant {
        Grant {
            permission: permission.into(),
            grantee_uri: Some(uri.into()),
            grantee_id: None,
        }
    }

    #[test]
    fn test_to_acl() {
        assert_eq!(to_acl(Visibility::Public).as_str(), "public-read");
        assert_eq!(to_acl(Visibility::Private).as_str(), "private");
    }

    #[test]
    fn test_public_read_grant() {
        let grants = vec![
            implied_grants(CannedAcl::Private, "owner").remove(0),
            group_grant("READ", "http://cam.qcloud.com/groups/global/AllUsers"),
        ];
        assert_eq!(from_grants(&grants), Visibility::Public);
    }

    #[test]
    fn test_s3_style_all_users_uri() {
        let grants = vec![group_grant(
            "READ",
            "http://acs.amazonaws.com/groups/global/AllUsers",
        )];
        assert_eq!(from_grants(&grants), Visibility::Public);
    }

    #[test]
    fn test_other_grants_collapse_to_private() {
        assert_eq!(from_grants(&[]), Visibility::Private);

        let write_only = vec![group_grant("WRITE", "http://cam.qcloud.com/groups/global/AllUsers")];
        assert_eq!(from_grants(&write_only), Visibility::Private);

        let authenticated = vec![group_grant(
            "READ",
            "http://cam.qcloud.com/groups/global/AuthenticatedUsers",
        )];
        assert_eq!(from_grants(&authenticated), Visibility::Private);

        let user_read = vec![Grant {
            permission: "READ".into(),
            grantee_uri: None,
            grantee_id: Some("qcs::cam::uin/100000000001:uin/100000000001".into()),
        }];
        assert_eq!(from_grants(&user_read), Visibility::Private);
    }

    #[test]
    fn test_acl_round_trip() {
        for visibility in [Visibility::Public, Visibility::Private] {
            let grants = implied_grants(to_acl(visibility), "owner");
            assert_eq!(from_grants(&grants), visibility);
        }
    }

    #[test]
    fn test_visibility_parse_and_display() {
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!(" PRIVATE ".parse::<Visibility>().unwrap(), Visibility::Private);
        assert!("internal".parse::<Visibility>().is_err());
        assert_eq!(Visibility::Public.to_string(), "public");
    }
}
