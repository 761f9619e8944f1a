//! Python bindings for php-unmarshal-core.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict};

use php_unmarshal_core::{
    json::record_to_json_string, unmarshal_with_config, ConsumeConfig, Consumer, DynamicField,
    DynamicRecord, FieldKind, Schema, Value,
};

pyo3::create_exception!(php_unmarshal, PhpUnmarshalError, pyo3::exceptions::PyException);

/// Convert a decoded value to a Python object.
fn value_to_python(py: Python<'_>, value: &Value) -> PyObject {
    match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.to_object(py),
        Value::Int(i) => i.to_object(py),
        Value::Float(f) => f.to_object(py),
        Value::Text(s) => {
            let text: &str = s;
            text.to_object(py)
        }
    }
}

/// Convert a dynamic record to a Python dict, keyed by field name.
fn record_to_python(py: Python<'_>, record: &DynamicRecord) -> PyResult<PyObject> {
    let dict = PyDict::new_bound(py);
    for (name, field) in record.iter() {
        let value = match field {
            DynamicField::Int(i) => i.to_object(py),
            DynamicField::Uint(u) => u.to_object(py),
            DynamicField::Float(f) => f.to_object(py),
            DynamicField::Bool(b) => b.to_object(py),
            DynamicField::Text(s) => s.to_object(py),
            DynamicField::Any(v) => value_to_python(py, v),
            DynamicField::Record(r) => record_to_python(py, r)?,
        };
        dict.set_item(name, value)?;
    }
    Ok(dict.to_object(py))
}

/// Build a schema from a `{name: kind}` dict, where kind is a kind name or a
/// nested dict.
fn schema_from_python(fields: &Bound<'_, PyDict>) -> PyResult<Schema> {
    let mut schema = Schema::new();
    for (key, kind) in fields.iter() {
        let name: String = key.extract()?;
        let kind = if let Ok(nested) = kind.downcast::<PyDict>() {
            FieldKind::Record(schema_from_python(nested)?)
        } else {
            let kind_name: String = kind.extract()?;
            FieldKind::from_name(&kind_name).ok_or_else(|| {
                PyValueError::new_err(format!(
                    "unknown field kind {:?} for {:?} (expected int, uint, float, bool, str, any or a dict)",
                    kind_name, name
                ))
            })?
        };
        schema = schema.field(name, kind);
    }
    Ok(schema)
}

fn config(strict_utf8: bool) -> ConsumeConfig {
    ConsumeConfig {
        strict_utf8,
        ..Default::default()
    }
}

/// Decode the scalar node at `offset`.
///
/// Args:
///     data: Bytes containing PHP serialized data
///     offset: Byte offset of the node (default: 0)
///     strict_utf8: Reject string payloads that are not valid UTF-8 (default: False)
///
/// Returns:
///     A `(value, next_offset)` tuple; value is None, bool, int, float or str
///
/// Raises:
///     PhpUnmarshalError: If the data cannot be decoded
///
/// Example:
///     >>> from php_unmarshal import loads
///     >>> loads(b'i:42;s:2:"hi";')
///     (42, 5)
///     >>> loads(b'i:42;s:2:"hi";', 5)
///     ('hi', 14)
#[pyfunction]
#[pyo3(signature = (data, offset=0, *, strict_utf8=false))]
fn loads(py: Python<'_>, data: &[u8], offset: usize, strict_utf8: bool) -> PyResult<(PyObject, usize)> {
    let (value, next) = Consumer::with_config(data, config(strict_utf8))
        .consume_next(offset)
        .map_err(|e| PhpUnmarshalError::new_err(format!("{}", e)))?;

    Ok((value_to_python(py, &value), next))
}

/// Decode the object node at `offset` into a dict shaped by `fields`.
///
/// Args:
///     data: Bytes containing PHP serialized data
///     fields: Dict mapping field names to kinds ("int", "uint", "float",
///         "bool", "str", "any") or to a nested dict for nested objects.
///         Wire keys are matched after uppercasing their first letter, so
///         field names should start with an uppercase letter.
///     offset: Byte offset of the object node (default: 0)
///     strict_utf8: Reject string payloads that are not valid UTF-8 (default: False)
///
/// Returns:
///     A `(dict, next_offset)` tuple. Declared fields absent from the data keep
///     their zero value; keys not declared in `fields` are dropped.
///
/// Raises:
///     PhpUnmarshalError: If the data cannot be decoded
///
/// Example:
///     >>> from php_unmarshal import loads_object
///     >>> loads_object(b'O:6:"Person":2:{s:4:"name";s:3:"Bob";s:3:"age";i:30;}',
///     ...              {"Name": "str", "Age": "int"})
///     ({'Name': 'Bob', 'Age': 30}, 53)
#[pyfunction]
#[pyo3(signature = (data, fields, offset=0, *, strict_utf8=false))]
fn loads_object(
    py: Python<'_>,
    data: &[u8],
    fields: &Bound<'_, PyDict>,
    offset: usize,
    strict_utf8: bool,
) -> PyResult<(PyObject, usize)> {
    let mut record = schema_from_python(fields)?.instantiate();
    let next = Consumer::with_config(data, config(strict_utf8))
        .consume_object(offset, &mut record)
        .map_err(|e| PhpUnmarshalError::new_err(format!("{}", e)))?;

    Ok((record_to_python(py, &record)?, next))
}

/// Decode an object payload directly to a JSON string.
///
/// DB-escaped input (wrapped in quotes with doubled inner quotes) is unescaped
/// first.
///
/// Args:
///     data: Bytes containing PHP serialized data
///     fields: Field schema, as for `loads_object`
///     strict_utf8: Reject string payloads that are not valid UTF-8 (default: False)
///
/// Returns:
///     A JSON object string with one member per declared field
///
/// Raises:
///     PhpUnmarshalError: If the data cannot be decoded
///
/// Example:
///     >>> from php_unmarshal import loads_json
///     >>> loads_json(b'O:1:"P":1:{s:3:"age";i:30;}', {"Age": "int"})
///     '{"Age":30}'
#[pyfunction]
#[pyo3(signature = (data, fields, *, strict_utf8=false))]
fn loads_json(data: &[u8], fields: &Bound<'_, PyDict>, strict_utf8: bool) -> PyResult<String> {
    let mut record = schema_from_python(fields)?.instantiate();
    unmarshal_with_config(data, &mut record, config(strict_utf8))
        .map_err(|e| PhpUnmarshalError::new_err(format!("{}", e)))?;

    record_to_json_string(&record).map_err(|e| PhpUnmarshalError::new_err(format!("{}", e)))
}

/// Check if data looks like PHP serialized format this module can decode.
///
/// This is a quick check that doesn't fully validate the data.
///
/// Example:
///     >>> from php_unmarshal import is_serialized
///     >>> is_serialized(b'O:1:"A":0:{}')
///     True
///     >>> is_serialized(b'not serialized')
///     False
#[pyfunction]
fn is_serialized(data: &[u8]) -> bool {
    php_unmarshal_core::is_serialized(data)
}

/// Unescape DB-exported payloads (quotes doubled as `""`).
///
/// Example:
///     >>> from php_unmarshal import preprocess
///     >>> preprocess(b'"s:1:""a"";"')
///     b's:1:"a";'
#[pyfunction]
fn preprocess<'py>(py: Python<'py>, data: &[u8]) -> Bound<'py, PyBytes> {
    let result = php_unmarshal_core::preprocess(data);
    PyBytes::new_bound(py, &result)
}

/// Get the version of the library.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// PHP unmarshal module for Python.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("PhpUnmarshalError", m.py().get_type_bound::<PhpUnmarshalError>())?;
    m.add_function(wrap_pyfunction!(loads, m)?)?;
    m.add_function(wrap_pyfunction!(loads_object, m)?)?;
    m.add_function(wrap_pyfunction!(loads_json, m)?)?;
    m.add_function(wrap_pyfunction!(is_serialized, m)?)?;
    m.add_function(wrap_pyfunction!(preprocess, m)?)?;
    m.add_function(wrap_pyfunction!(version, m)?)?;
    Ok(())
}
