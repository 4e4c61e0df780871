//! Solution file model for pjmigrate
//!
//! Reads Visual Studio solution files into a structured model, edits member
//! projects in place and writes them back. Blocks the caller never touched are
//! written exactly as they were read.
//!
//! # Example
//!
//! ```no_run
//! use pjm_solution::SolutionFile;
//! use std::path::Path;
//!
//! let mut sln = SolutionFile::read("App.sln")?;
//! sln.add_project(Path::new("src/Lib/Lib.csproj"))?;
//! sln.write()?;
//! # Ok::<(), pjm_solution::SolutionError>(())
//! ```

pub mod edit;
pub mod error;
pub mod file;
pub mod header;
pub mod model;
mod parser;
pub mod path;
mod writer;

pub use edit::{EditOutcome, NESTED_PROJECTS, PROJECT_CONFIGURATIONS, SOLUTION_CONFIGURATIONS};
pub use error::{SolutionError, SolutionResult};
pub use file::{
    LineEnding, SolutionFile, CURRENT_MINIMUM_TOOL_VERSION, CURRENT_PRODUCT_DESCRIPTION,
    CURRENT_TOOL_VERSION,
};
pub use header::{SolutionHeader, ToolVersion};
pub use model::{ProjectEntry, ProjectId, ProjectTypeId, PropertySet, Section, SectionPosition};
pub use path::{container_relative, normalize, resolve_member, MemberPath};
