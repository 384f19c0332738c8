//! Inventory resolution core for the multi-host development environment
//!
//! Resolves final per-machine configuration from a declarative, hierarchical
//! inventory: named groups (projects, environments, roles) related by
//! parent/child edges, each carrying partial variable sets combined through
//! inheritance and pattern-based targeting. The output is, per machine, a
//! fully resolved variable bundle (network address, filesystem paths, site
//! hostnames, multisite flags) ready for the provisioning step.
//!
//! # Architecture
//!
//! The crate is a pure library: all inputs arrive as already-parsed values
//! and no operation performs I/O. Components, leaf-first:
//!
//! ```text
//!          ResolutionSession (assembler)
//!               |                 |
//!        VariableResolver    SelectionFilter
//!           |        |
//!     PatternMatcher DeepMerge
//!           |
//!       GroupGraph
//! ```
//!
//! - [`merge`]: recursive mapping merge, later contributions win
//! - [`graph`]: ancestor/descendant relations over the group adjacency
//! - [`pattern`]: ordered literal/wildcard/regex pattern evaluation
//! - [`resolver`]: layered (pattern, variables) contribution folding
//! - [`inventory`] / [`machine`]: input data model and the resolved record
//! - [`assembler`]: per-machine orchestration with a per-project memo cache
//! - [`selection`]: invocation-based machine subset and boot order

pub mod assembler;
pub mod error;
pub mod graph;
pub mod inventory;
pub mod machine;
pub mod merge;
pub mod pattern;
pub mod resolver;
pub mod selection;

pub use assembler::{MachineMap, Resolution, ResolutionSession, VariableLayers};
pub use error::{Error, Result};
pub use graph::{GroupGraph, ROOT_GROUPS};
pub use inventory::{GroupDef, HostValue, Inventory, SiteVarsDoc};
pub use machine::{Machine, SitePathMap, SitePaths, substitute_project, substitute_site};
pub use merge::deep_merge;
pub use pattern::matching_groups;
pub use resolver::{Contribution, combine_for_groups, resolve_for_groups};
pub use selection::{Invocation, select};
