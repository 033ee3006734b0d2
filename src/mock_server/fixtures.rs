//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic test data.

use std::collections::HashMap;

use crate::{
    AuthInfo, CreateFeedRequest, Org, Platform, ProductRequest, User, UserStatus, Workspace,
};

/// ID of the default fixture workspace.
pub const DEFAULT_WORKSPACE_ID: &str = "846e294a-a007-47ac-9fc2-fac07eab240e";

/// ID of the secondary fixture workspace.
pub const LAB_WORKSPACE_ID: &str = "2d4d4f48-5b40-4a2d-9a2e-3c1f0b8f6e71";

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    // =========================================================================
    // Product Fixtures
    // =========================================================================

    /// Create a product request with only a part number.
    pub fn minimal_product(part_number: &str) -> ProductRequest {
        ProductRequest::new(part_number)
    }

    /// Create a product request in a family.
    pub fn product(part_number: &str, name: &str, family: &str) -> ProductRequest {
        ProductRequest {
            name: Some(name.to_string()),
            family: Some(family.to_string()),
            keywords: Some(vec!["fixture".to_string()]),
            properties: Some(HashMap::from([("vendor".to_string(), "NI".to_string())])),
            ..ProductRequest::new(part_number)
        }
    }

    // =========================================================================
    // Auth Fixtures
    // =========================================================================

    /// Create a workspace.
    pub fn workspace(id: &str, name: &str, default: bool) -> Workspace {
        Workspace {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            enabled: Some(true),
            default: Some(default),
        }
    }

    /// Identity with a default and a "Lab" workspace.
    pub fn auth_info() -> AuthInfo {
        AuthInfo {
            user: Some(User {
                id: Some("user-1".to_string()),
                first_name: Some("Test".to_string()),
                last_name: Some("User".to_string()),
                email: Some("test.user@example.com".to_string()),
                status: Some(UserStatus::Active),
                ..Default::default()
            }),
            org: Some(Org {
                id: Some("org-1".to_string()),
                name: Some("Test Org".to_string()),
                owner_id: Some("user-1".to_string()),
            }),
            workspaces: vec![
                Self::workspace(DEFAULT_WORKSPACE_ID, "Default", true),
                Self::workspace(LAB_WORKSPACE_ID, "Lab", false),
            ],
            policies: Vec::new(),
            properties: HashMap::new(),
        }
    }

    // =========================================================================
    // Feed Fixtures
    // =========================================================================

    /// Create a feed request in the default workspace.
    pub fn feed(name: &str, platform: Platform) -> CreateFeedRequest {
        CreateFeedRequest {
            description: Some(format!("{name} fixture")),
            ..CreateFeedRequest::new(name, platform)
        }
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    /// Create a default test scenario.
    ///
    /// Three "cRIO" products, one "PXI" product, one Windows feed and the
    /// [`auth_info`](Self::auth_info) identity.
    pub fn default_scenario() -> DefaultScenario {
        DefaultScenario {
            products: vec![
                Self::product("156502A-11L", "cRIO-9030", "cRIO"),
                Self::product("156502A-12L", "cRIO-9035", "cRIO"),
                Self::product("156502A-13L", "cRIO-9045", "cRIO"),
                Self::product("785014-01", "PXIe-1092", "PXI"),
            ],
            feeds: vec![Self::feed("Existing Windows feed", Platform::Windows)],
            auth: Self::auth_info(),
        }
    }
}

/// A complete test scenario with related data.
pub struct DefaultScenario {
    pub products: Vec<ProductRequest>,
    pub feeds: Vec<CreateFeedRequest>,
    pub auth: AuthInfo,
}

impl DefaultScenario {
    /// Number of products in the given family.
    pub fn family_count(&self, family: &str) -> usize {
        self.products
            .iter()
            .filter(|p| p.family.as_deref() == Some(family))
            .count()
    }
}
