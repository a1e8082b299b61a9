//! Graph vocabulary for the identity model.
//!
//! Node labels and relationship types are fixed literals. They are the only
//! parts of a Cypher statement that are not passed as parameters, so every
//! label and type written to the store must come from these enums.
//!
//! ```cypher
//! (:Client)-[:IN_REALM]->(:Realm)
//! (:Role:ClientRole)-[:BELONGS_TO_CLIENT]->(:Client)
//! (:Group)-[:IS_SUBGROUP_OF]->(:Group)
//! (:User)-[:MEMBER_OF]->(:Group)
//! (:Role)-[:COMPOSED_OF]->(:Role)
//! ```

use std::fmt;

/// Node labels written by the loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeLabel {
    Realm,
    Client,
    ProtocolMapper,
    Role,
    RealmRole,
    ClientRole,
    Group,
    User,
    ClientScope,
    IdentityProvider,
    IdpMapper,
    AuthenticationFlow,
    AuthenticationExecution,
    Component,
}

impl NodeLabel {
    /// All labels, in loader order.
    pub const ALL: [NodeLabel; 14] = [
        NodeLabel::Realm,
        NodeLabel::Client,
        NodeLabel::ProtocolMapper,
        NodeLabel::Role,
        NodeLabel::RealmRole,
        NodeLabel::ClientRole,
        NodeLabel::Group,
        NodeLabel::User,
        NodeLabel::ClientScope,
        NodeLabel::IdentityProvider,
        NodeLabel::IdpMapper,
        NodeLabel::AuthenticationFlow,
        NodeLabel::AuthenticationExecution,
        NodeLabel::Component,
    ];

    /// The Neo4j node label.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Realm => "Realm",
            NodeLabel::Client => "Client",
            NodeLabel::ProtocolMapper => "ProtocolMapper",
            NodeLabel::Role => "Role",
            NodeLabel::RealmRole => "RealmRole",
            NodeLabel::ClientRole => "ClientRole",
            NodeLabel::Group => "Group",
            NodeLabel::User => "User",
            NodeLabel::ClientScope => "ClientScope",
            NodeLabel::IdentityProvider => "IdentityProvider",
            NodeLabel::IdpMapper => "IdpMapper",
            NodeLabel::AuthenticationFlow => "AuthenticationFlow",
            NodeLabel::AuthenticationExecution => "AuthenticationExecution",
            NodeLabel::Component => "Component",
        }
    }

    /// Natural key properties of the label, as used by uniqueness constraints.
    pub fn natural_key(&self) -> &'static [&'static str] {
        match self {
            NodeLabel::Realm => &["name"],
            NodeLabel::Client => &["internal_id"],
            NodeLabel::ProtocolMapper => &["id", "name"],
            NodeLabel::Role => &["id"],
            NodeLabel::RealmRole => &["realm", "name"],
            NodeLabel::ClientRole => &["client", "name"],
            NodeLabel::Group => &["id"],
            NodeLabel::User => &["id"],
            NodeLabel::ClientScope => &["id", "name"],
            NodeLabel::IdentityProvider => &["internalId", "alias"],
            NodeLabel::IdpMapper => &["id", "name"],
            NodeLabel::AuthenticationFlow => &["id", "alias"],
            NodeLabel::AuthenticationExecution => &["id"],
            NodeLabel::Component => &["id"],
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types written by the loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelType {
    InRealm,
    BelongsToRealm,
    BelongsToClient,
    IsSubgroupOf,
    HasRole,
    ComposedOf,
    HasMapper,
    HasExecution,
    DefaultScope,
    OptionalScope,
    MemberOf,
}

impl RelType {
    /// The Neo4j relationship type.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::InRealm => "IN_REALM",
            RelType::BelongsToRealm => "BELONGS_TO_REALM",
            RelType::BelongsToClient => "BELONGS_TO_CLIENT",
            RelType::IsSubgroupOf => "IS_SUBGROUP_OF",
            RelType::HasRole => "HAS_ROLE",
            RelType::ComposedOf => "COMPOSED_OF",
            RelType::HasMapper => "HAS_MAPPER",
            RelType::HasExecution => "HAS_EXECUTION",
            RelType::DefaultScope => "DEFAULT_SCOPE",
            RelType::OptionalScope => "OPTIONAL_SCOPE",
            RelType::MemberOf => "MEMBER_OF",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
