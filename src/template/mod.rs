//! Word template processing: markup parsing, field binding and row expansion.

mod artifact;
pub mod binding;
mod context;
mod default;
mod inspect;
mod parse;
mod processor;
mod render;
pub mod syntax;

pub use artifact::{CompiledPart, CompiledTemplate};
pub use binding::{Binding, BindingCheck, BindingTable, RegionBinding};
pub use context::{ContextValue, Record, TemplateContext, format_learning_objectives};
pub use default::{DEFAULT_TITLE, default_package, default_template, default_template_body};
pub use inspect::{Location, PlaceholderInfo, RegionInfo, TemplateInfo, TemplateLint};
pub use parse::{ParsedPart, RowRegion, Segment, parse_part};
pub use processor::{
    ProcessorConfig, RenderedDocument, TemplateProcessor, TemplateProcessorBuilder, TemplateSource,
};
pub use render::{MissingOptionalFieldWarning, RegionRows, RenderReport};
