pub mod ledger;

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use derive_more::{Display as DeriveDisplay, Error};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::domain::{DataAccessError, Entity, Event, Id};

/// 書き込み時に期待するストリームの状態
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExpectedRevision {
    NoStream,
    StreamExists,
}

/// ストリームに記録されたイベント
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedEvent {
    pub stream_id: String,
    pub event_type: String,
    pub data: Value,
}

/// 記録前のイベント
#[derive(Clone, Debug, PartialEq)]
pub struct EventData {
    pub event_type: String,
    pub data: Value,
}

#[derive(Debug, DeriveDisplay, Error)]
pub enum StreamError {
    #[display(fmt = "Stream {} not found", _0)]
    ResourceNotFound(#[error(not(source))] String),
    #[display(fmt = "Stream {} expected {:?}", stream, expected)]
    WrongExpectedVersion {
        stream: String,
        expected: ExpectedRevision,
    },
}

impl From<StreamError> for DataAccessError {
    fn from(value: StreamError) -> Self {
        match value {
            StreamError::ResourceNotFound(_) => Self::ReadError(Box::new(value)),
            StreamError::WrongExpectedVersion { .. } => Self::WriteError(Box::new(value)),
        }
    }
}

/// プロセス内に保持するイベントストア
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventStore {
    streams: HashMap<String, Vec<RecordedEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_to_stream<I>(
        &mut self,
        stream_id: &str,
        expected: ExpectedRevision,
        events: I,
    ) -> Result<u64, StreamError>
    where
        I: IntoIterator<Item = EventData>,
    {
        let exists = self.streams.contains_key(stream_id);
        if exists != (expected == ExpectedRevision::StreamExists) {
            return Err(StreamError::WrongExpectedVersion {
                stream: stream_id.to_owned(),
                expected,
            });
        }
        let stream = self.streams.entry(stream_id.to_owned()).or_default();
        stream.extend(events.into_iter().map(|event| RecordedEvent {
            stream_id: stream_id.to_owned(),
            event_type: event.event_type,
            data: event.data,
        }));
        Ok(stream.len() as u64)
    }

    pub fn read_stream(&self, stream_id: &str) -> Result<&[RecordedEvent], StreamError> {
        self.streams
            .get(stream_id)
            .map(Vec::as_slice)
            .ok_or_else(|| StreamError::ResourceNotFound(stream_id.to_owned()))
    }

    pub fn delete_stream(&mut self, stream_id: &str) -> Result<(), StreamError> {
        self.streams
            .remove(stream_id)
            .map(|_| ())
            .ok_or_else(|| StreamError::ResourceNotFound(stream_id.to_owned()))
    }
}

#[derive(Debug)]
pub struct EventConvertError;

impl std::error::Error for EventConvertError {}

impl Display for EventConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to convert event")
    }
}

impl From<serde_json::Error> for EventConvertError {
    fn from(_value: serde_json::Error) -> Self {
        EventConvertError
    }
}

impl From<EventConvertError> for DataAccessError {
    fn from(value: EventConvertError) -> Self {
        DataAccessError::ClientSideError(Box::new(value))
    }
}

fn entity_id<I, T>(stream_id: &str) -> Option<I>
where
    I: Id<Inner = T>,
    T: FromStr,
{
    stream_id
        .split_once('-')
        .and_then(|(_, id)| id.parse::<T>().ok())
        .map(I::from)
}

fn stream_name<E: Entity>(id: E::Id) -> String {
    E::entity_name().to_owned() + "-" + &id.to_string()
}

fn from_event<E: Event>(event: E) -> Result<EventData, EventConvertError> {
    let root = serde_json::to_value(event)?;
    let (event_type, mut data) = root
        .as_object()
        .and_then(|object| object.iter().next())
        .map(|(key, value)| (key.clone(), value.clone()))
        .ok_or(EventConvertError)?;
    data.as_object_mut().ok_or(EventConvertError)?.remove("id");
    Ok(EventData { event_type, data })
}

fn try_from_recorded_event<E, I>(event: &RecordedEvent) -> Result<E, EventConvertError>
where
    E: DeserializeOwned + Event<Id = I>,
    I: Id,
{
    let id = entity_id::<I, I::Inner>(&event.stream_id).ok_or(EventConvertError)?;
    let mut data = event.data.clone();
    data.as_object_mut()
        .ok_or(EventConvertError)?
        .insert("id".to_owned(), json!(id));
    let mut root = serde_json::Map::new();
    root.insert(event.event_type.clone(), data);
    Ok(serde_json::from_value(Value::Object(root))?)
}
