use std::collections::BTreeMap;
use std::sync::Arc;

use fileroute_stage::{
    CollectingChannel, CollectingDiagnosticSink, EnumDiagnosticLevel, EnumFieldType,
    EnumFieldValue, EnumFileOperation, FileOperationExecutor, Record, RecordShape, SpecExecution,
    SpecField, SpecStageOptions, StageError, TransformStage,
};
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyBytes, PyFloat, PyInt, PyString};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "fileroute.stage.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

type TypeFieldSpec = (String, String, Option<usize>);

#[pyclass(name = "FileOperationResult")]
#[derive(Debug, Clone)]
struct PyFileOperationResult {
    #[pyo3(get)]
    if_success: bool,
    #[pyo3(get)]
    status: String,
    #[pyo3(get)]
    error_create_dirs: Option<String>,
}

impl From<SpecExecution> for PyFileOperationResult {
    fn from(spec_execution: SpecExecution) -> Self {
        Self {
            if_success: spec_execution.outcome.is_success(),
            status: spec_execution.outcome.status().to_string(),
            error_create_dirs: spec_execution.error_create_dirs,
        }
    }
}

#[pymethods]
impl PyFileOperationResult {
    fn __repr__(&self) -> String {
        format!(
            "FileOperationResult(if_success={}, status={:?})",
            self.if_success, self.status
        )
    }
}

fn parse_field_type(value: &str) -> PyResult<EnumFieldType> {
    match value {
        "bool" => Ok(EnumFieldType::Bool),
        "int64" => Ok(EnumFieldType::Int64),
        "double" => Ok(EnumFieldType::Double),
        "string" => Ok(EnumFieldType::String),
        "wstring" => Ok(EnumFieldType::WString),
        "date" => Ok(EnumFieldType::Date),
        "datetime" => Ok(EnumFieldType::DateTime),
        "blob" => Ok(EnumFieldType::Blob),
        _ => Err(PyValueError::new_err(format!(
            "Invalid field type: `{value}`. Expected one of: ['bool', 'int64', 'double', 'string', 'wstring', 'date', 'datetime', 'blob']"
        ))),
    }
}

fn map_stage_error(exception: StageError) -> PyErr {
    match exception {
        StageError::MissingIncomingConnection
        | StageError::ConnectionAlreadyEstablished
        | StageError::InvalidState { .. } => PyRuntimeError::new_err(exception.to_string()),
        _ => PyValueError::new_err(exception.to_string()),
    }
}

fn value_from_py(value: &Bound<'_, PyAny>) -> PyResult<EnumFieldValue> {
    if value.is_none() {
        return Ok(EnumFieldValue::Null);
    }
    // bool before int: Python bools are ints.
    if let Ok(v) = value.downcast::<PyBool>() {
        return Ok(EnumFieldValue::Bool(v.is_true()));
    }
    if let Ok(v) = value.downcast::<PyBytes>() {
        return Ok(EnumFieldValue::Bytes(v.as_bytes().to_vec()));
    }
    if value.is_instance_of::<PyString>() {
        return Ok(EnumFieldValue::Text(value.extract::<String>()?));
    }
    if value.is_instance_of::<PyInt>() {
        return Ok(EnumFieldValue::Int(value.extract::<i64>()?));
    }
    if let Ok(v) = value.downcast::<PyFloat>() {
        return Ok(EnumFieldValue::Double(v.value()));
    }
    Err(PyTypeError::new_err(format!(
        "Unsupported field value type: {}",
        value.get_type().name()?
    )))
}

fn value_to_py(py: Python<'_>, value: &EnumFieldValue) -> PyObject {
    match value {
        EnumFieldValue::Null => py.None(),
        EnumFieldValue::Bool(v) => PyBool::new(py, *v).to_owned().into_any().unbind(),
        EnumFieldValue::Int(v) => {
            let Ok(obj) = (*v).into_pyobject(py);
            obj.into_any().unbind()
        }
        EnumFieldValue::Double(v) => PyFloat::new(py, *v).into_any().unbind(),
        EnumFieldValue::Text(v) => PyString::new(py, v).into_any().unbind(),
        EnumFieldValue::Bytes(v) => PyBytes::new(py, v).into_any().unbind(),
    }
}

fn records_to_py(py: Python<'_>, l_records: Vec<Record>) -> Vec<Vec<PyObject>> {
    l_records
        .into_iter()
        .map(|record| {
            record
                .values()
                .iter()
                .map(|value| value_to_py(py, value))
                .collect()
        })
        .collect()
}

fn shape_to_py(shape: &RecordShape) -> Vec<TypeFieldSpec> {
    shape
        .fields()
        .iter()
        .map(|field| {
            (
                field.name.clone(),
                field.field_type.as_str().to_string(),
                field.size,
            )
        })
        .collect()
}

#[pyfunction(name = "execute_file_operation")]
#[pyo3(signature = (path_source, path_destination, if_move = false, if_create_dirs = false))]
fn execute_file_operation_py(
    py: Python<'_>,
    path_source: Option<String>,
    path_destination: Option<String>,
    if_move: bool,
    if_create_dirs: bool,
) -> Option<PyFileOperationResult> {
    let enum_operation = if if_move {
        EnumFileOperation::Move
    } else {
        EnumFileOperation::Copy
    };
    let executor = FileOperationExecutor::new(enum_operation, if_create_dirs);
    py.allow_threads(|| executor.execute(path_source.as_deref(), path_destination.as_deref()))
        .map(PyFileOperationResult::from)
}

/// Host adapter: each method is one host callback.
#[pyclass(name = "FileRouteStage", unsendable)]
struct PyFileRouteStage {
    stage: TransformStage,
    output: CollectingChannel,
    error_output: CollectingChannel,
    sink: CollectingDiagnosticSink,
    shape_in: Option<Arc<RecordShape>>,
}

#[pymethods]
impl PyFileRouteStage {
    #[new]
    #[pyo3(signature = (field_source, field_destination, if_move = false, if_create_dirs = false))]
    fn new(
        field_source: String,
        field_destination: String,
        if_move: bool,
        if_create_dirs: bool,
    ) -> Self {
        let spec_options = SpecStageOptions {
            field_source,
            field_destination,
            if_move,
            if_create_dirs,
        };
        let output = CollectingChannel::new();
        let error_output = CollectingChannel::new();
        let sink = CollectingDiagnosticSink::new();
        let stage = TransformStage::new(
            spec_options,
            output.clone(),
            error_output.clone(),
            sink.clone(),
        );
        Self {
            stage,
            output,
            error_output,
            sink,
            shape_in: None,
        }
    }

    fn add_incoming_connection(&mut self) -> PyResult<()> {
        self.stage
            .add_incoming_connection()
            .map_err(map_stage_error)
    }

    /// Negotiate the input shape from `(name, type, size)` tuples.
    ///
    /// Returns `False` when the stage is not ready; see `messages` for why.
    fn init(&mut self, fields: Vec<TypeFieldSpec>) -> PyResult<bool> {
        let mut l_fields = Vec::with_capacity(fields.len());
        for (name, field_type, size) in fields {
            l_fields.push(SpecField::new(name, parse_field_type(&field_type)?, size));
        }
        let shape_in = Arc::new(
            RecordShape::new(l_fields).map_err(|e| PyValueError::new_err(e.to_string()))?,
        );
        let if_ready = self.stage.init_input(Arc::clone(&shape_in)).is_ok();
        if if_ready {
            self.shape_in = Some(shape_in);
        }
        Ok(if_ready)
    }

    /// Returns `"Output"`, `"ErrorOutput"`, or `None` for a dropped record.
    fn push_record(&mut self, values: Vec<Bound<'_, PyAny>>) -> PyResult<Option<&'static str>> {
        let Some(shape_in) = &self.shape_in else {
            return Err(map_stage_error(StageError::InvalidState {
                operation: "push record",
                state: self.stage.state(),
            }));
        };
        let l_values = values
            .iter()
            .map(value_from_py)
            .collect::<PyResult<Vec<_>>>()?;
        let record = Record::new(Arc::clone(shape_in), l_values)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let enum_anchor = self.stage.push_record(&record).map_err(map_stage_error)?;
        Ok(enum_anchor.map(|v| v.as_str()))
    }

    fn push_all_records(&mut self) -> bool {
        self.stage.push_all_records().is_ok()
    }

    fn update_progress(&mut self, percent: f64) {
        self.stage.update_progress(percent);
    }

    fn close(&mut self) {
        self.stage.close();
    }

    fn take_output(&self, py: Python<'_>) -> Vec<Vec<PyObject>> {
        records_to_py(py, self.output.take_records())
    }

    fn take_error_output(&self, py: Python<'_>) -> Vec<Vec<PyObject>> {
        records_to_py(py, self.error_output.take_records())
    }

    #[getter]
    fn state(&self) -> &'static str {
        self.stage.state().as_str()
    }

    #[getter]
    fn output_fields(&self) -> Option<Vec<TypeFieldSpec>> {
        self.stage.output_shape().map(|shape| shape_to_py(&shape))
    }

    #[getter]
    fn messages(&self) -> Vec<(String, String)> {
        self.sink
            .messages()
            .into_iter()
            .map(|(level, msg)| {
                let level = match level {
                    EnumDiagnosticLevel::Info => "info",
                    EnumDiagnosticLevel::Warning => "warning",
                    EnumDiagnosticLevel::Error => "error",
                };
                (level.to_string(), msg)
            })
            .collect()
    }

    #[getter]
    fn progress(&self) -> Vec<f64> {
        self.output.progress_values()
    }

    fn report(&self) -> BTreeMap<String, u64> {
        self.stage.report().to_dict()
    }

    fn __str__(&self) -> String {
        self.stage.report().to_string()
    }
}

#[pymodule]
fn _fileroute_stage_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyFileOperationResult>()?;
    module.add_class::<PyFileRouteStage>()?;
    module.add_function(wrap_pyfunction!(execute_file_operation_py, module)?)?;
    module.add("FIELD_NAME_FILE_RESULT", fileroute_stage::conf::C_FIELD_NAME_FILE_RESULT)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
