//! Error types for inventory-core

/// Result type for inventory-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during inventory resolution
///
/// Every variant is fatal: resolution aborts on the first malformed input and
/// no partial machine map is returned, since provisioning from partial data
/// risks inconsistent environments.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `site_hosts` entry is not a mapping or lacks a `canonical` host
    #[error(
        "Invalid `site_hosts` entry for site `{site}` of project `{project}`: \
         each entry must be a mapping with a `canonical` key\n\
         \n\
         Expected shape:\n\
         \x20 site_hosts:\n\
         \x20   - canonical: example.dev\n\
         \x20     redirects:\n\
         \x20       - www.example.dev"
    )]
    SiteHosts { project: String, site: String },

    /// A `web.development` host entry has an unusable shape
    #[error(
        "Invalid `web.development` entry for group `{group}`: expected a string \
         address, a non-empty list of strings, or a non-empty list of mappings"
    )]
    HostValue { group: String },

    /// A target project has no site-variable document
    #[error("No site variables found for project `{project}`")]
    ProjectVars { project: String },

    /// The inventory document itself is malformed
    #[error("Malformed inventory document: {message}")]
    Inventory { message: String },
}

impl Error {
    /// Create an inventory-document error with the given message
    pub fn inventory(message: impl Into<String>) -> Self {
        Self::Inventory {
            message: message.into(),
        }
    }
}
