//! Signal / Trace records
//!
//! Records are immutable once built. Optional metadata lives in
//! [`Properties`]: a fixed set of recognized fields plus an open extension
//! map, flattened into the record on the wire.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Sanitize, Value};

/// Signal kind, emitted under the `type` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// Single observation
    Point,
    /// Measured quantity
    Metric,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Metric => "metric",
        }
    }
}

/// Wire names of the recognized property fields
pub const RESERVED_PROPERTY_KEYS: &[&str] = &[
    "actor",
    "context",
    "context_schema",
    "location",
    "location_infra",
    "payload_schema",
    "source",
    "trigger",
    "time",
    "type",
    "signal_name",
    "payload",
    "data",
];

/// Optional metadata attached to a signal or trace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Properties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_infra: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Value>,
    /// Explicit observation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SignalKind>,
    /// Forward-compatible extension fields
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(mut self, actor: impl Into<Value>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn context(mut self, context: impl Into<Value>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn context_schema(mut self, schema: impl Into<String>) -> Self {
        self.context_schema = Some(schema.into());
        self
    }

    pub fn location(mut self, location: impl Into<Value>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn location_infra(mut self, location: impl Into<Value>) -> Self {
        self.location_infra = Some(location.into());
        self
    }

    pub fn payload_schema(mut self, schema: impl Into<String>) -> Self {
        self.payload_schema = Some(schema.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn trigger(mut self, trigger: impl Into<Value>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    pub fn time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn kind(mut self, kind: SignalKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attach an extension field.
    ///
    /// Keys that collide with a recognized field are ignored so the wire
    /// object never carries duplicate keys.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !RESERVED_PROPERTY_KEYS.contains(&key.as_str()) {
            self.extra.insert(key, value.into());
        }
        self
    }

    pub fn extras(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}

impl Sanitize for Properties {
    fn sanitize(&self) -> Self {
        Self {
            actor: self.actor.sanitize(),
            context: self.context.sanitize(),
            context_schema: self.context_schema.clone(),
            location: self.location.sanitize(),
            location_infra: self.location_infra.sanitize(),
            payload_schema: self.payload_schema.clone(),
            source: self.source.clone(),
            trigger: self.trigger.sanitize(),
            time: self.time,
            kind: self.kind,
            extra: self
                .extra
                .iter()
                .map(|(k, v)| (k.clone(), v.sanitize()))
                .collect(),
        }
    }
}

/// A single named observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    #[serde(rename = "signal_name")]
    name: String,
    payload: Value,
    #[serde(flatten)]
    properties: Properties,
}

impl Signal {
    pub fn new(name: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
            properties: Properties::default(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn kind(&self) -> Option<SignalKind> {
        self.properties.kind
    }
}

impl Sanitize for Signal {
    fn sanitize(&self) -> Self {
        Self {
            name: self.name.clone(),
            payload: self.payload.sanitize(),
            properties: self.properties.sanitize(),
        }
    }
}

/// Content of a trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TraceData {
    /// Constituent signals
    Signals(Vec<Signal>),
    /// Arbitrary payload
    Value(Value),
}

impl From<Vec<Signal>> for TraceData {
    fn from(signals: Vec<Signal>) -> Self {
        Self::Signals(signals)
    }
}

impl From<Value> for TraceData {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<serde_json::Value> for TraceData {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value.into())
    }
}

impl Sanitize for TraceData {
    fn sanitize(&self) -> Self {
        match self {
            Self::Signals(signals) => Self::Signals(signals.sanitize()),
            Self::Value(value) => Self::Value(value.sanitize()),
        }
    }
}

/// A correlated group of observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    data: TraceData,
    #[serde(rename = "signal_name", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    #[serde(flatten)]
    properties: Properties,
}

impl Trace {
    pub fn new(data: impl Into<TraceData>) -> Self {
        Self {
            data: data.into(),
            name: None,
            payload: None,
            properties: Properties::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn data(&self) -> &TraceData {
        &self.data
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl Sanitize for Trace {
    fn sanitize(&self) -> Self {
        Self {
            data: self.data.sanitize(),
            name: self.name.clone(),
            payload: self.payload.sanitize(),
            properties: self.properties.sanitize(),
        }
    }
}

/// Item stored in a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Signal(Signal),
    Trace(Trace),
}

impl Record {
    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Signal(_) => "signal",
            Self::Trace(_) => "trace",
        }
    }

    pub fn properties(&self) -> &Properties {
        match self {
            Self::Signal(signal) => signal.properties(),
            Self::Trace(trace) => trace.properties(),
        }
    }

    pub fn as_signal(&self) -> Option<&Signal> {
        match self {
            Self::Signal(signal) => Some(signal),
            Self::Trace(_) => None,
        }
    }

    pub fn as_trace(&self) -> Option<&Trace> {
        match self {
            Self::Trace(trace) => Some(trace),
            Self::Signal(_) => None,
        }
    }
}

impl From<Signal> for Record {
    fn from(signal: Signal) -> Self {
        Self::Signal(signal)
    }
}

impl From<Trace> for Record {
    fn from(trace: Trace) -> Self {
        Self::Trace(trace)
    }
}

impl Sanitize for Record {
    fn sanitize(&self) -> Self {
        match self {
            Self::Signal(signal) => Self::Signal(signal.sanitize()),
            Self::Trace(trace) => Self::Trace(trace.sanitize()),
        }
    }
}
