//! Python bindings.
//!
//! Exposes a small surface to Python: a `Runtime` that creates refs and
//! effects, a `Ref` with a `value` property, and the `Runner` returned by
//! `Runtime.effect`. Python dicts are converted to keyed objects on the way
//! in; objects come back out as dict snapshots.
//!
//! An exception raised by an effect callable is re-raised from whichever
//! Python call ran it: `Runtime.effect` for the first run, `Runner.run`, or
//! the `Ref.value` assignment whose notification re-ran it. Only the first
//! exception of such a call is raised; the effect keeps its edges either way.

use std::sync::Arc;

use parking_lot::Mutex;
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyString};

use crate::reactive::{Ref, Runner, Runtime};
use crate::value::{Object, Value};

fn to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    // bool is a subclass of int: check it first.
    if obj.is_instance_of::<PyBool>() {
        return Ok(Value::Bool(obj.extract::<bool>()?));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(Value::Int(obj.extract::<i64>()?));
    }
    if obj.is_instance_of::<PyFloat>() {
        return Ok(Value::Float(obj.extract::<f64>()?));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(Value::Str(obj.extract::<String>()?));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        let object = Object::new();
        for (key, item) in dict.iter() {
            object.set(key.extract::<String>()?, to_value(&item)?);
        }
        return Ok(Value::Object(object));
    }
    Err(PyTypeError::new_err(
        "expected None, bool, int, float, str or dict",
    ))
}

fn from_value(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.to_object(py),
        Value::Int(i) => i.to_object(py),
        Value::Float(f) => f.to_object(py),
        Value::Str(s) => s.to_object(py),
        Value::Object(object) => object_to_dict(py, object)?,
        Value::Reactive(reactive) => object_to_dict(py, &reactive.to_raw())?,
    })
}

fn object_to_dict(py: Python<'_>, object: &Object) -> PyResult<PyObject> {
    let dict = PyDict::new_bound(py);
    for (key, item) in object.entries() {
        dict.set_item(key, from_value(py, &item)?)?;
    }
    Ok(dict.into_any().unbind())
}

/// First exception raised by an effect callable since the last check.
#[derive(Clone, Default)]
struct Failures {
    first: Arc<Mutex<Option<PyErr>>>,
}

impl Failures {
    fn record(&self, err: PyErr) {
        self.first.lock().get_or_insert(err);
    }

    /// Raise the recorded exception, if any, clearing it.
    fn check(&self) -> PyResult<()> {
        match self.first.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Python-exposed runtime.
#[pyclass(name = "Runtime")]
pub struct PyRuntime {
    runtime: Runtime,
    failures: Failures,
}

#[pymethods]
impl PyRuntime {
    #[new]
    fn new() -> Self {
        Self {
            runtime: Runtime::new(),
            failures: Failures::default(),
        }
    }

    /// Create a boxed reactive value.
    #[pyo3(name = "ref")]
    fn ref_value(&self, value: &Bound<'_, PyAny>) -> PyResult<PyValueRef> {
        Ok(PyValueRef {
            inner: self.runtime.ref_value(to_value(value)?),
            failures: self.failures.clone(),
        })
    }

    /// Register a callable as an effect and run it once.
    ///
    /// Raises whatever the first run raised. The effect stays registered.
    fn effect(&self, callable: PyObject) -> PyResult<PyRunner> {
        let failures = self.failures.clone();
        let runner = self.runtime.effect(move || {
            Python::with_gil(|py| {
                if let Err(err) = callable.call0(py) {
                    tracing::debug!(error = %err, "effect callable raised");
                    failures.record(err);
                }
            });
        });
        self.failures.check()?;
        Ok(PyRunner {
            runner,
            failures: self.failures.clone(),
        })
    }

    fn is_tracking(&self) -> bool {
        self.runtime.is_tracking()
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.runtime)
    }
}

/// Python-exposed boxed value.
#[pyclass(name = "Ref")]
pub struct PyValueRef {
    inner: Ref,
    failures: Failures,
}

#[pymethods]
impl PyValueRef {
    #[getter]
    fn value(&self, py: Python<'_>) -> PyResult<PyObject> {
        from_value(py, &self.inner.get())
    }

    /// Raises the first exception of any effect the assignment re-ran.
    #[setter]
    fn set_value(&self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.inner.set(to_value(value)?);
        self.failures.check()
    }

    fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.inner)
    }
}

/// Python-exposed effect runner.
#[pyclass(name = "Runner")]
pub struct PyRunner {
    runner: Runner<()>,
    failures: Failures,
}

#[pymethods]
impl PyRunner {
    /// Re-run the effect, raising what the callable raised.
    fn run(&self) -> PyResult<()> {
        self.runner.run();
        self.failures.check()
    }

    /// Deactivate the effect.
    fn stop(&self) {
        self.runner.effect().deactivate();
    }

    #[getter]
    fn active(&self) -> bool {
        self.runner.effect().is_active()
    }
}

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyRuntime>()?;
    m.add_class::<PyValueRef>()?;
    m.add_class::<PyRunner>()?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
