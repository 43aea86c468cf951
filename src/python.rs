use crate::error::{FieldError, GenerateError, TemplateError};
use crate::prompt;
use crate::schema;
use crate::template::{RenderReport, TemplateProcessor};
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

impl<'py> IntoPyObject<'py> for FieldError {
    type Target = PyDict;
    type Output = Bound<'py, Self::Target>;
    type Error = PyErr;

    fn into_pyobject(self, py: Python<'py>) -> Result<Self::Output, Self::Error> {
        let dict = PyDict::new(py);
        dict.set_item("path", self.path.to_string())?;
        match self.index() {
            Some(index) => dict.set_item("index", index)?,
            None => dict.set_item("index", py.None())?,
        }
        match self.field_name() {
            Some(field) => dict.set_item("field", field)?,
            None => dict.set_item("field", py.None())?,
        }
        dict.set_item("message", self.kind.to_string())?;
        Ok(dict)
    }
}

impl<'py> IntoPyObject<'py> for RenderReport {
    type Target = PyDict;
    type Output = Bound<'py, Self::Target>;
    type Error = PyErr;

    fn into_pyobject(self, py: Python<'py>) -> Result<Self::Output, Self::Error> {
        let dict = PyDict::new(py);
        let warnings: Vec<String> = self.warnings.iter().map(|w| w.to_string()).collect();
        dict.set_item("warnings", warnings)?;
        let rows = PyDict::new(py);
        for region in &self.rows {
            rows.set_item(&region.list, region.count)?;
        }
        dict.set_item("rows", rows)?;
        Ok(dict)
    }
}

fn parse_json(payload_json: &str) -> PyResult<serde_json::Value> {
    prompt::extract_payload(payload_json)
        .map_err(|e| PyErr::new::<PyValueError, _>(e.to_string()))
}

/// Validates a teaching-design payload.
///
/// Args:
///     payload_json (str): The model response or a bare JSON object.
///
/// Returns:
///     list[dict]: One entry per problem with the keys "path", "index",
///         "field" and "message". The list is empty when the payload is valid.
///
/// Raises:
///     ValueError: If no JSON object can be read from the input.
#[pyfunction]
fn validate<'py>(py: Python<'py>, payload_json: &str) -> PyResult<Bound<'py, PyList>> {
    let payload = parse_json(payload_json)?;
    let errors = match schema::validate(&payload) {
        Ok(_) => Vec::new(),
        Err(errors) => errors.into_vec(),
    };
    PyList::new(py, errors)
}

/// Builds the generation prompt for an uploaded document's text.
#[pyfunction]
fn generation_prompt(material: &str, template_text: &str) -> String {
    prompt::generation_prompt(material, template_text)
}

/// A Word template loaded once and rendered many times.
#[pyclass(name = "TemplateProcessor", frozen)]
struct TemplateProcessorPy {
    processor: TemplateProcessor,
}

#[pymethods]
impl TemplateProcessorPy {
    /// Loads and parses a `.docx` template.
    ///
    /// Args:
    ///     template_path (str): Path to the template document.
    ///     strict (bool): Fail on placeholders without a value instead of
    ///         rendering them empty.
    ///
    /// Raises:
    ///     IOError: If the template cannot be found or read.
    ///     ValueError: If the template markup is malformed.
    #[new]
    #[pyo3(signature = (template_path, strict = false))]
    fn new(template_path: &str, strict: bool) -> PyResult<Self> {
        let processor = TemplateProcessor::builder(std::path::Path::new(template_path))
            .strict(strict)
            .build()
            .map_err(|e| match e {
                TemplateError::NotFound(_) | TemplateError::Io { .. } => {
                    PyErr::new::<PyIOError, _>(e.to_string())
                }
                _ => PyErr::new::<PyValueError, _>(e.to_string()),
            })?;
        Ok(Self { processor })
    }

    /// Validates `payload_json`, renders it and writes the result to `output_path`.
    ///
    /// Returns:
    ///     dict: "warnings" (list[str]) and "rows" (dict of list name to row count).
    ///
    /// Raises:
    ///     ValueError: If the payload is not valid; the message lists every problem.
    ///     RuntimeError: If rendering or writing fails.
    fn render(&self, payload_json: &str, output_path: &str) -> PyResult<RenderReport> {
        let payload = parse_json(payload_json)?;
        let document = crate::pipeline::generate(&payload, &self.processor).map_err(|e| match e {
            GenerateError::Invalid(_) | GenerateError::Payload(_) => {
                PyErr::new::<PyValueError, _>(e.to_string())
            }
            GenerateError::Template(_) => PyErr::new::<PyRuntimeError, _>(e.to_string()),
        })?;
        document
            .write_to(output_path)
            .map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))?;
        Ok(document.report().clone())
    }

    /// Placeholder names used outside repeated rows.
    fn placeholders(&self) -> Vec<String> {
        self.processor
            .info()
            .scalar_placeholders()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Teaching-design validation and Word template rendering.
#[pymodule]
fn jiaoan(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(validate, m)?)?;
    m.add_function(wrap_pyfunction!(generation_prompt, m)?)?;
    m.add_class::<TemplateProcessorPy>()?;
    Ok(())
}
