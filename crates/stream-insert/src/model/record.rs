//! Structured values that can be saved as rows.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::model::{RecordShape, Value};

/// A structured (record-typed) value.
///
/// Implementors describe their type once through [`Record::shape`] and
/// hand out their field values in the same order. Schema inference works
/// from the shape alone; the values are only read when the row is saved.
///
/// ```rust
/// use stream_insert::model::{FieldKind, FieldType, Record, RecordShape, Value};
///
/// #[derive(Debug)]
/// struct Reading {
///     sensor: String,
///     celsius: f64,
/// }
///
/// impl Record for Reading {
///     fn shape(&self) -> RecordShape {
///         RecordShape::new("Reading")
///             .field("sensor", FieldKind::Scalar(FieldType::String))
///             .field("celsius", FieldKind::Scalar(FieldType::Float64))
///     }
///
///     fn values(&self) -> Vec<Value> {
///         vec![self.sensor.clone().into(), self.celsius.into()]
///     }
/// }
/// ```
pub trait Record: fmt::Debug {
    /// The type-level shape. Must be equal for all values of one type.
    fn shape(&self) -> RecordShape;

    /// Field values, one per field of [`Record::shape`], in the same order.
    ///
    /// Nested records are given as `Value::Record` keyed by field name.
    fn values(&self) -> Vec<Value>;
}

impl<T: Record + ?Sized> Record for &T {
    fn shape(&self) -> RecordShape {
        (**self).shape()
    }

    fn values(&self) -> Vec<Value> {
        (**self).values()
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn shape(&self) -> RecordShape {
        (**self).shape()
    }

    fn values(&self) -> Vec<Value> {
        (**self).values()
    }
}

impl<T: Record + ?Sized> Record for Rc<T> {
    fn shape(&self) -> RecordShape {
        (**self).shape()
    }

    fn values(&self) -> Vec<Value> {
        (**self).values()
    }
}

impl<T: Record + ?Sized> Record for Arc<T> {
    fn shape(&self) -> RecordShape {
        (**self).shape()
    }

    fn values(&self) -> Vec<Value> {
        (**self).values()
    }
}
