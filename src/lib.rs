//! # Jiaoan - Teaching-Design Validation and Word Template Rendering
//!
//! **Jiaoan** turns the JSON a large language model writes for a lesson plan
//! (教案) into a finished Word document. It owns the two parts of that job that
//! must not go wrong: checking the model's payload against the teaching-design
//! schema, and binding the checked data into a `.docx` template, including the
//! table rows that repeat once per learning activity.
//!
//! ## Core Workflow
//!
//! 1.  **Prompt**: Build the instructions for the model with [`prompt::generation_prompt`].
//!     The JSON skeleton inside it is generated from the same field catalogue the
//!     validator uses.
//! 2.  **Validate**: Pass the model's response to [`schema::validate`] (or
//!     [`TeachingDesignData::from_json_str`](schema::TeachingDesignData::from_json_str)).
//!     Every problem is reported in one [`ValidationErrors`](error::ValidationErrors) value.
//! 3.  **Render**: Load a template once with [`TemplateProcessor::builder`](template::TemplateProcessor::builder)
//!     and render any number of validated payloads against it. Each list element
//!     becomes exactly one table row, in input order.
//! 4.  **Persist**: [`RenderedDocument::write_to`](template::RenderedDocument::write_to)
//!     writes through a temporary file, so a failed request never leaves a partial
//!     document behind.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jiaoan::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let response = std::fs::read_to_string("response.json")?;
//!
//!     // Validate: all field errors come back together.
//!     let data = match TeachingDesignData::from_json_str(&response) {
//!         Ok(data) => data,
//!         Err(GenerateError::Invalid(errors)) => {
//!             for error in &errors {
//!                 eprintln!("{}", error);
//!             }
//!             return Ok(());
//!         }
//!         Err(e) => return Err(e.into()),
//!     };
//!
//!     // Parse the template once, then render.
//!     let processor = TemplateProcessor::builder(Path::new("templates/teaching_design.docx"))
//!         .strict(false)
//!         .build()?;
//!     let document = processor.render(&data)?;
//!
//!     for warning in &document.report().warnings {
//!         println!("note: {}", warning);
//!     }
//!     document.write_to(Path::new("outputs").join(unique_output_name(data.lesson_name())))?;
//!     Ok(())
//! }
//! ```

pub mod docx;
pub mod error;
pub mod pipeline;
pub mod prelude;
pub mod prompt;
pub mod schema;
pub mod template;

#[cfg(feature = "python-bindings")]
mod python;
