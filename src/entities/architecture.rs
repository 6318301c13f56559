//! Architecture entities extracted from a diagram

use serde::{Deserialize, Serialize};

use super::{null_to_default, provider_or_generic};

/// Component category offered to the model during extraction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    User,
    Client,
    WebServer,
    ApplicationServer,
    ApiGateway,
    LoadBalancer,
    Database,
    Cache,
    MessageQueue,
    Storage,
    Cdn,
    Dns,
    Firewall,
    Waf,
    IdentityProvider,
    ServerlessFunction,
    Container,
    Microservice,
    ThirdPartyService,
    Network,
    Vpn,
    Monitoring,
    Logging,
    CiCd,
    #[default]
    Other,
    /// A label the model produced outside the fixed list, kept verbatim
    Unlisted(String),
}

impl ComponentKind {
    /// The fixed category list, in the order it is presented to the model
    pub const CATALOG: &'static [ComponentKind] = &[
        ComponentKind::User,
        ComponentKind::Client,
        ComponentKind::WebServer,
        ComponentKind::ApplicationServer,
        ComponentKind::ApiGateway,
        ComponentKind::LoadBalancer,
        ComponentKind::Database,
        ComponentKind::Cache,
        ComponentKind::MessageQueue,
        ComponentKind::Storage,
        ComponentKind::Cdn,
        ComponentKind::Dns,
        ComponentKind::Firewall,
        ComponentKind::Waf,
        ComponentKind::IdentityProvider,
        ComponentKind::ServerlessFunction,
        ComponentKind::Container,
        ComponentKind::Microservice,
        ComponentKind::ThirdPartyService,
        ComponentKind::Network,
        ComponentKind::Vpn,
        ComponentKind::Monitoring,
        ComponentKind::Logging,
        ComponentKind::CiCd,
        ComponentKind::Other,
    ];

    pub fn label(&self) -> &str {
        match self {
            ComponentKind::User => "User",
            ComponentKind::Client => "Client",
            ComponentKind::WebServer => "Web Server",
            ComponentKind::ApplicationServer => "Application Server",
            ComponentKind::ApiGateway => "API Gateway",
            ComponentKind::LoadBalancer => "Load Balancer",
            ComponentKind::Database => "Database",
            ComponentKind::Cache => "Cache",
            ComponentKind::MessageQueue => "Message Queue",
            ComponentKind::Storage => "Storage",
            ComponentKind::Cdn => "CDN",
            ComponentKind::Dns => "DNS",
            ComponentKind::Firewall => "Firewall",
            ComponentKind::Waf => "WAF",
            ComponentKind::IdentityProvider => "Identity Provider",
            ComponentKind::ServerlessFunction => "Serverless Function",
            ComponentKind::Container => "Container",
            ComponentKind::Microservice => "Microservice",
            ComponentKind::ThirdPartyService => "Third-Party Service",
            ComponentKind::Network => "Network",
            ComponentKind::Vpn => "VPN",
            ComponentKind::Monitoring => "Monitoring",
            ComponentKind::Logging => "Logging",
            ComponentKind::CiCd => "CI/CD",
            ComponentKind::Other => "Other",
            ComponentKind::Unlisted(label) => label,
        }
    }

    /// Whether this kind came from the fixed list
    pub fn is_listed(&self) -> bool {
        !matches!(self, ComponentKind::Unlisted(_))
    }
}

impl From<String> for ComponentKind {
    fn from(label: String) -> Self {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return ComponentKind::Other;
        }
        ComponentKind::CATALOG
            .iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| ComponentKind::Unlisted(trimmed.to_string()))
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Unlisted(label) => label,
            other => other.label().to_string(),
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A directed data flow from one component to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Name of the receiving component
    #[serde(default, deserialize_with = "null_to_default")]
    pub target: String,

    /// What travels over the connection
    #[serde(default, deserialize_with = "null_to_default")]
    pub data_flow: String,
}

/// A node of the analyzed architecture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, deserialize_with = "null_to_default")]
    pub name: String,

    #[serde(rename = "type", default, deserialize_with = "null_to_default")]
    pub kind: ComponentKind,

    /// Cloud service name, or "Generic" when not identifiable
    #[serde(
        default = "generic_provider",
        deserialize_with = "provider_or_generic"
    )]
    pub provider: String,

    #[serde(default, deserialize_with = "null_to_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_to_default")]
    pub connections: Vec<Connection>,
}

fn generic_provider() -> String {
    super::GENERIC_PROVIDER.to_string()
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            provider: generic_provider(),
            description: String::new(),
            connections: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_connection(mut self, target: impl Into<String>, data_flow: impl Into<String>) -> Self {
        self.connections.push(Connection {
            target: target.into(),
            data_flow: data_flow.into(),
        });
        self
    }
}

/// Components and summary extracted from one diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureDocument {
    #[serde(default, deserialize_with = "null_to_default")]
    pub components: Vec<Component>,

    #[serde(default, deserialize_with = "null_to_default")]
    pub architecture_summary: String,
}

impl ArchitectureDocument {
    pub fn connection_count(&self) -> usize {
        self.components.iter().map(|c| c.connections.len()).sum()
    }

    /// Components that declare at least one outgoing connection
    pub fn connected_components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(|c| !c.connections.is_empty())
    }
}
