pub mod commit_parser;
pub mod generator;
pub mod output;
pub mod range_resolver;
pub mod renderer;
pub mod structured;

pub use commit_parser::{CommitParser, ParsedCommit};
pub use generator::{ChangelogGenerator, GeneratedChangelog, NO_CHANGES};
pub use output::{format_output, ChangelogDocument, OutputFormat};
pub use range_resolver::{RangeResolver, TagPair};
pub use renderer::{ChangelogRenderer, CommitType, COMMIT_TYPES};
pub use structured::{parse_to_structured, StructuredChangelog, StructuredEntry};
